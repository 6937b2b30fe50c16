use crate::{
    entities::{cart, cart_item, product},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AddToCartInput {
    pub product_id: Uuid,
    #[validate(range(min = 1, max = 10_000))]
    pub quantity: i32,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateCartItemInput {
    /// New absolute quantity; zero removes the line
    #[validate(range(min = 0, max = 10_000))]
    pub quantity: i32,
}

/// A cart line joined with its product for display.
#[derive(Debug, Serialize, ToSchema)]
pub struct CartItemView {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    /// Price frozen when the line was added
    pub unit_price: Decimal,
    pub line_total: Decimal,
    pub image_url: Option<String>,
}

/// The cart as returned to clients: lines plus a subtotal computed from
/// the frozen prices.
#[derive(Debug, Serialize, ToSchema)]
pub struct CartView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub items: Vec<CartItemView>,
    pub subtotal: Decimal,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Issue codes reported by cart validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CartIssueCode {
    PriceChanged,
    InsufficientStock,
    ProductUnavailable,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartIssue {
    pub cart_item_id: Uuid,
    pub product_id: Uuid,
    pub code: CartIssueCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frozen_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live_price: Option<Decimal>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartValidation {
    pub valid: bool,
    pub issues: Vec<CartIssue>,
}

/// One cart per user, created on first touch.
///
/// Prices are frozen into the line when a product is added and never
/// silently refreshed; [`CartService::validate`] reports drift and stock
/// problems without mutating anything.
pub struct CartService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CartService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// The user's cart with lines and subtotal, creating the cart row if
    /// this is the first touch.
    #[instrument(skip(self))]
    pub async fn get_cart(&self, user_id: Uuid) -> Result<CartView, ServiceError> {
        let cart = self.get_or_create(user_id).await?;
        self.build_view(&*self.db, cart).await
    }

    /// Adds a product, freezing its current price into the line. Adding the
    /// same product again increases the quantity and keeps the frozen price.
    #[instrument(skip(self, input), fields(product_id = %input.product_id))]
    pub async fn add_item(
        &self,
        user_id: Uuid,
        input: AddToCartInput,
    ) -> Result<CartView, ServiceError> {
        input.validate()?;

        let txn = self.db.begin().await?;
        let cart = self.get_or_create_in(&txn, user_id).await?;

        let product = product::Entity::find_by_id(input.product_id)
            .one(&txn)
            .await?
            .filter(|p| p.deleted_at.is_none())
            .ok_or_else(|| ServiceError::NotFound(format!("Product {}", input.product_id)))?;
        if !product.is_listable() {
            return Err(ServiceError::ValidationError(format!(
                "Product '{}' is not available",
                product.name
            )));
        }

        let existing = cart_item::Entity::find()
            .filter(cart_item::Column::CartId.eq(cart.id))
            .filter(cart_item::Column::ProductId.eq(product.id))
            .one(&txn)
            .await?;

        match existing {
            Some(line) => {
                let quantity = line.quantity + input.quantity;
                let mut active: cart_item::ActiveModel = line.into();
                active.quantity = Set(quantity);
                active.updated_at = Set(Some(Utc::now()));
                active.update(&txn).await?;
            }
            None => {
                cart_item::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    cart_id: Set(cart.id),
                    product_id: Set(product.id),
                    quantity: Set(input.quantity),
                    unit_price: Set(product.price),
                    created_at: Set(Utc::now()),
                    updated_at: Set(None),
                }
                .insert(&txn)
                .await?;
            }
        }

        let cart = self.touch(&txn, cart).await?;
        let view = self.build_view(&txn, cart).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartItemAdded {
                cart_id: view.id,
                product_id: input.product_id,
            })
            .await;
        info!(cart_id = %view.id, product_id = %input.product_id, "Cart item added");
        Ok(view)
    }

    /// Sets a line to an absolute quantity; zero deletes the line.
    #[instrument(skip(self, input))]
    pub async fn update_item_quantity(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        input: UpdateCartItemInput,
    ) -> Result<CartView, ServiceError> {
        input.validate()?;

        let txn = self.db.begin().await?;
        let cart = self.load_cart_in(&txn, user_id).await?;
        let line = cart_item::Entity::find_by_id(item_id)
            .filter(cart_item::Column::CartId.eq(cart.id))
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Cart item {}", item_id)))?;
        let product_id = line.product_id;

        if input.quantity == 0 {
            line.delete(&txn).await?;
        } else {
            let mut active: cart_item::ActiveModel = line.into();
            active.quantity = Set(input.quantity);
            active.updated_at = Set(Some(Utc::now()));
            active.update(&txn).await?;
        }

        let cart = self.touch(&txn, cart).await?;
        let view = self.build_view(&txn, cart).await?;
        txn.commit().await?;

        if input.quantity == 0 {
            self.event_sender
                .send_or_log(Event::CartItemRemoved {
                    cart_id: view.id,
                    product_id,
                })
                .await;
        } else {
            self.event_sender
                .send_or_log(Event::CartItemUpdated {
                    cart_id: view.id,
                    product_id,
                    quantity: input.quantity,
                })
                .await;
        }
        Ok(view)
    }

    #[instrument(skip(self))]
    pub async fn remove_item(&self, user_id: Uuid, item_id: Uuid) -> Result<CartView, ServiceError> {
        let txn = self.db.begin().await?;
        let cart = self.load_cart_in(&txn, user_id).await?;
        let line = cart_item::Entity::find_by_id(item_id)
            .filter(cart_item::Column::CartId.eq(cart.id))
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Cart item {}", item_id)))?;
        let product_id = line.product_id;
        line.delete(&txn).await?;

        let cart = self.touch(&txn, cart).await?;
        let view = self.build_view(&txn, cart).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartItemRemoved {
                cart_id: view.id,
                product_id,
            })
            .await;
        info!(cart_id = %view.id, product_id = %product_id, "Cart item removed");
        Ok(view)
    }

    /// Empties the cart. The cart row itself stays.
    #[instrument(skip(self))]
    pub async fn clear(&self, user_id: Uuid) -> Result<CartView, ServiceError> {
        let txn = self.db.begin().await?;
        let cart = self.load_cart_in(&txn, user_id).await?;
        cart_item::Entity::delete_many()
            .filter(cart_item::Column::CartId.eq(cart.id))
            .exec(&txn)
            .await?;

        let cart = self.touch(&txn, cart).await?;
        let view = self.build_view(&txn, cart).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartCleared(view.id))
            .await;
        info!(cart_id = %view.id, "Cart cleared");
        Ok(view)
    }

    /// Reports per-line problems against the live catalog without touching
    /// the cart: price drift, missing stock, unavailable products.
    #[instrument(skip(self))]
    pub async fn validate_cart(&self, user_id: Uuid) -> Result<CartValidation, ServiceError> {
        let cart = self.get_or_create(user_id).await?;
        let lines = cart_item::Entity::find()
            .filter(cart_item::Column::CartId.eq(cart.id))
            .find_also_related(product::Entity)
            .all(&*self.db)
            .await?;

        let mut issues = Vec::new();
        for (line, product) in lines {
            let product = match product.filter(|p| p.is_listable()) {
                Some(p) => p,
                None => {
                    issues.push(CartIssue {
                        cart_item_id: line.id,
                        product_id: line.product_id,
                        code: CartIssueCode::ProductUnavailable,
                        message: "Product is no longer available".to_string(),
                        frozen_price: None,
                        live_price: None,
                    });
                    continue;
                }
            };

            if product.price != line.unit_price {
                issues.push(CartIssue {
                    cart_item_id: line.id,
                    product_id: product.id,
                    code: CartIssueCode::PriceChanged,
                    message: format!(
                        "Price of '{}' changed from {} to {}",
                        product.name, line.unit_price, product.price
                    ),
                    frozen_price: Some(line.unit_price),
                    live_price: Some(product.price),
                });
            }
            if line.quantity > product.quantity_available {
                issues.push(CartIssue {
                    cart_item_id: line.id,
                    product_id: product.id,
                    code: CartIssueCode::InsufficientStock,
                    message: format!(
                        "Only {} of '{}' left",
                        product.quantity_available, product.name
                    ),
                    frozen_price: None,
                    live_price: None,
                });
            }
        }

        Ok(CartValidation {
            valid: issues.is_empty(),
            issues,
        })
    }

    async fn get_or_create(&self, user_id: Uuid) -> Result<cart::Model, ServiceError> {
        self.get_or_create_in(&*self.db, user_id).await
    }

    async fn get_or_create_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: Uuid,
    ) -> Result<cart::Model, ServiceError> {
        if let Some(found) = cart::Entity::find()
            .filter(cart::Column::UserId.eq(user_id))
            .one(conn)
            .await?
        {
            return Ok(found);
        }
        let created = cart::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(conn)
        .await?;
        info!(cart_id = %created.id, user_id = %user_id, "Cart created");
        Ok(created)
    }

    async fn load_cart_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: Uuid,
    ) -> Result<cart::Model, ServiceError> {
        cart::Entity::find()
            .filter(cart::Column::UserId.eq(user_id))
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Cart for user {}", user_id)))
    }

    async fn touch<C: ConnectionTrait>(
        &self,
        conn: &C,
        cart: cart::Model,
    ) -> Result<cart::Model, ServiceError> {
        let mut active: cart::ActiveModel = cart.into();
        active.updated_at = Set(Some(Utc::now()));
        Ok(active.update(conn).await?)
    }

    async fn build_view<C: ConnectionTrait>(
        &self,
        conn: &C,
        cart: cart::Model,
    ) -> Result<CartView, ServiceError> {
        let lines = cart_item::Entity::find()
            .filter(cart_item::Column::CartId.eq(cart.id))
            .find_also_related(product::Entity)
            .order_by_asc(cart_item::Column::CreatedAt)
            .all(conn)
            .await?;

        let mut items = Vec::with_capacity(lines.len());
        let mut subtotal = Decimal::ZERO;
        for (line, product) in lines {
            let line_total = line.line_total();
            subtotal += line_total;
            let (product_name, image_url) = match product {
                Some(p) => (p.name, p.image_url),
                None => ("(removed)".to_string(), None),
            };
            items.push(CartItemView {
                id: line.id,
                product_id: line.product_id,
                product_name,
                quantity: line.quantity,
                unit_price: line.unit_price,
                line_total,
                image_url,
            });
        }

        Ok(CartView {
            id: cart.id,
            user_id: cart.user_id,
            items,
            subtotal,
            updated_at: cart.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_input_rejects_zero_quantity() {
        let input = AddToCartInput {
            product_id: Uuid::new_v4(),
            quantity: 0,
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn update_input_allows_zero_for_removal() {
        let input = UpdateCartItemInput { quantity: 0 };
        assert!(input.validate().is_ok());
    }

    #[test]
    fn issue_codes_serialize_screaming_snake() {
        assert_eq!(
            serde_json::to_string(&CartIssueCode::PriceChanged).unwrap(),
            "\"PRICE_CHANGED\""
        );
        assert_eq!(
            serde_json::to_string(&CartIssueCode::ProductUnavailable).unwrap(),
            "\"PRODUCT_UNAVAILABLE\""
        );
    }
}
