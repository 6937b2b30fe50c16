use crate::{
    common::Paginated,
    config::AppConfig,
    entities::{
        address, cart, cart_item, farmer_profile,
        order::{self, OrderStatus, PaymentMethod, PaymentStatus},
        order_item, order_tracking, product,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::notifications,
    validation,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateOrderInput {
    /// Saved address the order ships to; snapshotted into the order row
    pub address_id: Uuid,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateOrderStatusInput {
    pub status: OrderStatus,
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

/// An order with its lines, as returned by the read endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: order::Model,
    pub items: Vec<order_item::Model>,
}

/// One order line from the selling farmer's point of view.
#[derive(Debug, Serialize, ToSchema)]
pub struct FarmerOrderLine {
    #[serde(flatten)]
    pub item: order_item::Model,
    pub order_number: String,
    pub order_status: OrderStatus,
}

/// Order placement, cancellation and status tracking.
///
/// `create_order` runs as one transaction; stock is taken with a
/// conditional decrement so the non-negative invariant survives
/// concurrent placement regardless of isolation level. Cancellation is
/// the compensating transaction and only exists for orders that have not
/// entered fulfilment.
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    config: Arc<AppConfig>,
}

impl OrderService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            db,
            event_sender,
            config,
        }
    }

    /// Places an order from the user's cart.
    ///
    /// Totals come from the frozen cart prices, not the live catalog. On
    /// success the cart is emptied; on any failure nothing is written.
    #[instrument(skip(self, input), fields(address_id = %input.address_id))]
    pub async fn create_order(
        &self,
        user_id: Uuid,
        input: CreateOrderInput,
    ) -> Result<OrderDetails, ServiceError> {
        input.validate()?;
        let now = Utc::now();

        let txn = self.db.begin().await?;

        let cart = cart::Entity::find()
            .filter(cart::Column::UserId.eq(user_id))
            .one(&txn)
            .await?
            .ok_or(ServiceError::EmptyCart)?;
        let lines = cart_item::Entity::find()
            .filter(cart_item::Column::CartId.eq(cart.id))
            .all(&txn)
            .await?;
        if lines.is_empty() {
            return Err(ServiceError::EmptyCart);
        }

        let ship_to = address::Entity::find_by_id(input.address_id)
            .filter(address::Column::UserId.eq(user_id))
            .one(&txn)
            .await?
            .filter(|a| a.is_active)
            .ok_or(ServiceError::InvalidAddress)?;

        let product_ids: Vec<Uuid> = lines.iter().map(|l| l.product_id).collect();
        let products: HashMap<Uuid, product::Model> = product::Entity::find()
            .filter(product::Column::Id.is_in(product_ids))
            .all(&txn)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let mut subtotal = Decimal::ZERO;
        for line in &lines {
            let product = products
                .get(&line.product_id)
                .filter(|p| p.deleted_at.is_none())
                .ok_or_else(|| {
                    ServiceError::ValidationError(
                        "A product in the cart is no longer available".to_string(),
                    )
                })?;
            if line.quantity > product.quantity_available {
                return Err(ServiceError::InsufficientStock {
                    product: product.name.clone(),
                });
            }
            subtotal += line.line_total();
        }

        let delivery_fee = self.delivery_fee();
        let total_amount = subtotal + delivery_fee;
        let order_number = generate_order_number();

        let placed = order::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_number: Set(order_number.clone()),
            user_id: Set(user_id),
            status: Set(OrderStatus::Pending),
            payment_status: Set(PaymentStatus::Pending),
            payment_method: Set(input.payment_method),
            delivery_region: Set(ship_to.region.clone()),
            delivery_city: Set(ship_to.city.clone()),
            delivery_street: Set(ship_to.street.clone()),
            delivery_details: Set(ship_to.details.clone()),
            contact_phone: Set(ship_to.contact_phone.clone()),
            subtotal: Set(subtotal),
            delivery_fee: Set(delivery_fee),
            total_amount: Set(total_amount),
            currency: Set(self.config.currency.clone()),
            paid_at: Set(None),
            cancelled_at: Set(None),
            created_at: Set(now),
            updated_at: Set(None),
        }
        .insert(&txn)
        .await?;

        let mut items = Vec::with_capacity(lines.len());
        for line in &lines {
            // Checked above; products cannot have vanished inside the txn.
            let product = products.get(&line.product_id).ok_or_else(|| {
                ServiceError::InternalError("product set changed mid-transaction".to_string())
            })?;

            // The filter makes the decrement conditional: losing a race for
            // the last units affects zero rows and aborts the order instead
            // of driving the quantity negative.
            let res = product::Entity::update_many()
                .col_expr(
                    product::Column::QuantityAvailable,
                    Expr::col(product::Column::QuantityAvailable).sub(line.quantity),
                )
                .col_expr(
                    product::Column::SoldCount,
                    Expr::col(product::Column::SoldCount).add(line.quantity),
                )
                .col_expr(product::Column::UpdatedAt, Expr::value(now))
                .filter(product::Column::Id.eq(line.product_id))
                .filter(product::Column::QuantityAvailable.gte(line.quantity))
                .exec(&txn)
                .await?;
            if res.rows_affected == 0 {
                warn!(
                    product_id = %line.product_id,
                    requested = line.quantity,
                    "Conditional stock decrement matched no rows"
                );
                return Err(ServiceError::InsufficientStock {
                    product: product.name.clone(),
                });
            }

            farmer_profile::Entity::update_many()
                .col_expr(
                    farmer_profile::Column::TotalSales,
                    Expr::col(farmer_profile::Column::TotalSales).add(line.quantity),
                )
                .col_expr(farmer_profile::Column::UpdatedAt, Expr::value(now))
                .filter(farmer_profile::Column::UserId.eq(product.farmer_id))
                .exec(&txn)
                .await?;

            let item = order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(placed.id),
                product_id: Set(line.product_id),
                farmer_id: Set(product.farmer_id),
                product_name: Set(product.name.clone()),
                quantity: Set(line.quantity),
                unit_price: Set(line.unit_price),
                line_total: Set(line.line_total()),
                created_at: Set(now),
            }
            .insert(&txn)
            .await?;
            items.push(item);
        }

        self.append_tracking(&txn, placed.id, OrderStatus::Pending, "Order placed")
            .await?;

        cart_item::Entity::delete_many()
            .filter(cart_item::Column::CartId.eq(cart.id))
            .exec(&txn)
            .await?;

        notifications::record(
            &txn,
            user_id,
            "Order placed",
            format!(
                "Order {} placed for {} {}",
                placed.order_number, placed.currency, placed.total_amount
            ),
        )
        .await?;

        txn.commit().await?;
        self.event_sender
            .send_or_log(Event::OrderCreated(placed.id))
            .await;
        info!(
            order_id = %placed.id,
            order_number = %placed.order_number,
            total = %placed.total_amount,
            "Order created"
        );
        Ok(OrderDetails {
            order: placed,
            items,
        })
    }

    /// Buyer cancellation, only while the order is `Pending` or `Confirmed`.
    ///
    /// Restores every product's quantity and walks back the sold counters
    /// (floored at zero) in one compensating transaction.
    #[instrument(skip(self))]
    pub async fn cancel_order(
        &self,
        user_id: Uuid,
        order_id: Uuid,
    ) -> Result<OrderDetails, ServiceError> {
        let now = Utc::now();
        let txn = self.db.begin().await?;

        let found = order::Entity::find_by_id(order_id)
            .filter(order::Column::UserId.eq(user_id))
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {}", order_id)))?;
        if !found.status.is_cancellable() {
            return Err(ServiceError::InvalidOrderStatus {
                status: found.status.to_string(),
            });
        }

        let items = order_item::Entity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .all(&txn)
            .await?;

        for item in &items {
            if let Some(p) = product::Entity::find_by_id(item.product_id).one(&txn).await? {
                let mut active: product::ActiveModel = p.clone().into();
                active.quantity_available = Set(p.quantity_available + item.quantity);
                active.sold_count = Set((p.sold_count - item.quantity).max(0));
                active.updated_at = Set(Some(now));
                active.update(&txn).await?;
            }

            if let Some(fp) = farmer_profile::Entity::find()
                .filter(farmer_profile::Column::UserId.eq(item.farmer_id))
                .one(&txn)
                .await?
            {
                let mut active: farmer_profile::ActiveModel = fp.clone().into();
                active.total_sales = Set((fp.total_sales - item.quantity).max(0));
                active.updated_at = Set(Some(now));
                active.update(&txn).await?;
            }
        }

        let mut active: order::ActiveModel = found.into();
        active.status = Set(OrderStatus::Cancelled);
        active.cancelled_at = Set(Some(now));
        active.updated_at = Set(Some(now));
        let cancelled = active.update(&txn).await?;

        self.append_tracking(&txn, order_id, OrderStatus::Cancelled, "Cancelled by buyer")
            .await?;
        notifications::record(
            &txn,
            user_id,
            "Order cancelled",
            format!("Order {} was cancelled", cancelled.order_number),
        )
        .await?;

        txn.commit().await?;
        self.event_sender
            .send_or_log(Event::OrderCancelled(order_id))
            .await;
        info!(order_id = %order_id, "Order cancelled");
        Ok(OrderDetails {
            order: cancelled,
            items,
        })
    }

    /// Moves an order along its lifecycle. Legality comes solely from
    /// [`OrderStatus::can_transition_to`]; anything else is rejected.
    #[instrument(skip(self, input), fields(status = %input.status))]
    pub async fn update_status(
        &self,
        order_id: Uuid,
        input: UpdateOrderStatusInput,
    ) -> Result<order::Model, ServiceError> {
        input.validate()?;
        let now = Utc::now();
        let txn = self.db.begin().await?;

        let found = order::Entity::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {}", order_id)))?;
        let from = found.status;
        if !from.can_transition_to(input.status) {
            return Err(ServiceError::InvalidTransition {
                from: from.to_string(),
                to: input.status.to_string(),
            });
        }

        let user_id = found.user_id;
        let order_number = found.order_number.clone();
        let mut active: order::ActiveModel = found.into();
        active.status = Set(input.status);
        if input.status == OrderStatus::Cancelled {
            active.cancelled_at = Set(Some(now));
        }
        active.updated_at = Set(Some(now));
        let updated = active.update(&txn).await?;

        let note = input.note.unwrap_or_else(|| default_note(input.status));
        self.append_tracking(&txn, order_id, input.status, &note)
            .await?;
        notifications::record(
            &txn,
            user_id,
            "Order update",
            format!("Order {} is now {}", order_number, input.status),
        )
        .await?;

        txn.commit().await?;
        self.event_sender
            .send_or_log(Event::OrderStatusChanged {
                order_id,
                old_status: from.to_string(),
                new_status: input.status.to_string(),
            })
            .await;
        info!(order_id = %order_id, from = %from, to = %input.status, "Order status changed");
        Ok(updated)
    }

    /// Order with items, visible to its owner and to admins.
    #[instrument(skip(self))]
    pub async fn get_order(
        &self,
        order_id: Uuid,
        requester: Uuid,
        is_admin: bool,
    ) -> Result<OrderDetails, ServiceError> {
        let found = order::Entity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {}", order_id)))?;
        if !is_admin && found.user_id != requester {
            return Err(ServiceError::NotFound(format!("Order {}", order_id)));
        }
        let items = order_item::Entity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .all(&*self.db)
            .await?;
        Ok(OrderDetails {
            order: found,
            items,
        })
    }

    /// The user's orders, newest first.
    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        user_id: Uuid,
        page: u64,
        limit: u64,
    ) -> Result<Paginated<order::Model>, ServiceError> {
        let paginator = order::Entity::find()
            .filter(order::Column::UserId.eq(user_id))
            .order_by_desc(order::Column::CreatedAt)
            .paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page - 1).await?;
        Ok(Paginated::new(items, page, limit, total))
    }

    /// Order lines that sell this farmer's products, newest first.
    #[instrument(skip(self))]
    pub async fn list_farmer_orders(
        &self,
        farmer_id: Uuid,
        page: u64,
        limit: u64,
    ) -> Result<Paginated<FarmerOrderLine>, ServiceError> {
        let paginator = order_item::Entity::find()
            .filter(order_item::Column::FarmerId.eq(farmer_id))
            .find_also_related(order::Entity)
            .order_by_desc(order_item::Column::CreatedAt)
            .paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page - 1).await?;

        let items = rows
            .into_iter()
            .map(|(item, parent)| {
                let (order_number, order_status) = match parent {
                    Some(o) => (o.order_number, o.status),
                    None => (String::new(), OrderStatus::Pending),
                };
                FarmerOrderLine {
                    item,
                    order_number,
                    order_status,
                }
            })
            .collect();
        Ok(Paginated::new(items, page, limit, total))
    }

    /// Status history, oldest first.
    #[instrument(skip(self))]
    pub async fn get_tracking(
        &self,
        order_id: Uuid,
        requester: Uuid,
        is_admin: bool,
    ) -> Result<Vec<order_tracking::Model>, ServiceError> {
        let found = order::Entity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {}", order_id)))?;
        if !is_admin && found.user_id != requester {
            return Err(ServiceError::NotFound(format!("Order {}", order_id)));
        }
        let rows = order_tracking::Entity::find()
            .filter(order_tracking::Column::OrderId.eq(order_id))
            .order_by_asc(order_tracking::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        Ok(rows)
    }

    async fn append_tracking<C: ConnectionTrait>(
        &self,
        conn: &C,
        order_id: Uuid,
        status: OrderStatus,
        note: &str,
    ) -> Result<(), ServiceError> {
        order_tracking::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order_id),
            status: Set(status),
            note: Set(Some(note.to_string())),
            created_at: Set(Utc::now()),
        }
        .insert(conn)
        .await?;
        Ok(())
    }

    fn delivery_fee(&self) -> Decimal {
        Decimal::from_f64_retain(self.config.delivery_fee)
            .unwrap_or_default()
            .round_dp(2)
    }
}

fn default_note(status: OrderStatus) -> String {
    match status {
        OrderStatus::Confirmed => "Order confirmed".to_string(),
        OrderStatus::Processing => "Order is being prepared".to_string(),
        OrderStatus::Dispatched => "Order handed to delivery".to_string(),
        OrderStatus::Delivered => format!("Delivered at {}", Utc::now().to_rfc3339()),
        OrderStatus::Cancelled => "Order cancelled".to_string(),
        OrderStatus::Returned => "Order returned".to_string(),
        OrderStatus::Pending => "Order placed".to_string(),
    }
}

/// `FC-<base36 millis>-<random suffix>`. Uniqueness is probabilistic and
/// deliberately unchecked against existing rows.
fn generate_order_number() -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    format!(
        "FC-{}-{}",
        to_base36(millis),
        validation::random_reference_suffix(4)
    )
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base36_round_trips_known_values() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "Z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(36 * 36 + 1), "101");
    }

    #[test]
    fn order_numbers_carry_prefix_and_suffix() {
        let number = generate_order_number();
        let parts: Vec<&str> = number.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "FC");
        assert!(!parts[1].is_empty());
        assert_eq!(parts[2].len(), 4);
        assert!(parts[2]
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn consecutive_order_numbers_differ() {
        let a = generate_order_number();
        let b = generate_order_number();
        assert_ne!(a, b);
    }
}
