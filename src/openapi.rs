use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "FarmConnect API",
        version = "1.0.0",
        description = r#"
# FarmConnect Marketplace API

Connects Ghanaian farmers directly with buyers: produce catalog, carts
with frozen prices, orders with delivery tracking, mobile-money
payments, warehouse stock ledgers and a two-level farmer verification
pipeline.

## Authentication

Register or log in to receive a JWT, then pass it on every protected
endpoint:

```
Authorization: Bearer <your-jwt-token>
```

Role gating: product writes require a verified farmer, order status
updates the delivery role, warehouse endpoints the warehouse role and
`/admin` the admin role. Admins pass every role check.

## Envelope

Success responses wrap their payload as `{ "success": true, "data": … }`.
Lists nest `{ items, page, limit, total, pages }` inside `data`. Errors
return `{ "success": false, "error": { code, message } }` with a stable
machine-readable `code`.
        "#,
        contact(name = "FarmConnect", email = "support@farmconnect.africa"),
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration, login and profile"),
        (name = "Products", description = "Produce catalog"),
        (name = "Cart", description = "Shopping cart with frozen prices"),
        (name = "Orders", description = "Order placement and tracking"),
        (name = "Payments", description = "Mobile-money payments"),
        (name = "Farmers", description = "Farmer-side sales"),
        (name = "Verification", description = "Farmer verification pipeline"),
        (name = "Warehouse", description = "Warehouses and stock ledger"),
        (name = "Reviews", description = "Product reviews and ratings"),
        (name = "Notifications", description = "In-app notifications"),
        (name = "Admin", description = "Moderation and dashboards"),
        (name = "Health", description = "Liveness and readiness probes")
    ),
    paths(
        // Auth
        crate::handlers::auth::register,
        crate::handlers::auth::login,
        crate::handlers::auth::me,
        crate::handlers::auth::update_me,
        crate::handlers::auth::change_password,
        crate::handlers::auth::list_addresses,
        crate::handlers::auth::add_address,
        crate::handlers::auth::remove_address,

        // Products
        crate::handlers::products::list_products,
        crate::handlers::products::get_product,
        crate::handlers::products::get_product_by_slug,
        crate::handlers::products::create_product,
        crate::handlers::products::update_product,
        crate::handlers::products::delete_product,

        // Cart
        crate::handlers::cart::get_cart,
        crate::handlers::cart::add_item,
        crate::handlers::cart::update_item,
        crate::handlers::cart::remove_item,
        crate::handlers::cart::clear_cart,
        crate::handlers::cart::validate_cart,

        // Orders
        crate::handlers::orders::create_order,
        crate::handlers::orders::list_orders,
        crate::handlers::orders::get_order,
        crate::handlers::orders::cancel_order,
        crate::handlers::orders::update_order_status,
        crate::handlers::orders::get_tracking,

        // Payments
        crate::handlers::payments::initiate_payment,
        crate::handlers::payments::payment_callback,
        crate::handlers::payments::list_order_payments,
        crate::handlers::payments::refund_payment,

        // Farmers and verification
        crate::handlers::farmers::list_farmer_orders,
        crate::handlers::farmers::initiate_verification,
        crate::handlers::farmers::verification_status,
        crate::handlers::farmers::submit_verification_step,
        crate::handlers::farmers::send_otp,
        crate::handlers::farmers::verify_otp,
        crate::handlers::farmers::submit_verification,

        // Warehouse
        crate::handlers::warehouse::list_warehouses,
        crate::handlers::warehouse::create_warehouse,
        crate::handlers::warehouse::get_inventory,
        crate::handlers::warehouse::add_inventory,
        crate::handlers::warehouse::remove_inventory,
        crate::handlers::warehouse::list_movements,

        // Reviews
        crate::handlers::reviews::list_reviews,
        crate::handlers::reviews::submit_review,

        // Notifications
        crate::handlers::notifications::list_notifications,
        crate::handlers::notifications::mark_read,
        crate::handlers::notifications::mark_all_read,

        // Admin
        crate::handlers::admin::dashboard,
        crate::handlers::admin::list_users,
        crate::handlers::admin::set_user_active,
        crate::handlers::admin::list_pending_verifications,
        crate::handlers::admin::review_verification,

        // Health
        crate::handlers::health::liveness,
        crate::handlers::health::readiness,
    ),
    components(
        schemas(
            crate::handlers::common::ApiResponse<serde_json::Value>,
            crate::common::Paginated<serde_json::Value>,
            crate::errors::ErrorResponse,
            crate::errors::ErrorBody,
        )
    )
)]
pub struct ApiDoc;

/// Registers the bearer scheme the `security(("Bearer" = []))`
/// annotations refer to.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "Bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_covers_the_surface() {
        let openapi = ApiDoc::openapi();
        let json = serde_json::to_string(&openapi).unwrap();
        assert!(json.contains("FarmConnect API"));
        assert!(json.contains("/api/v1/products"));
        assert!(json.contains("/api/v1/farmers/verify/submit"));
        assert!(json.contains("Bearer"));
    }
}
