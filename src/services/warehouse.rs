use crate::{
    common::Paginated,
    entities::{
        product::{self, ProductUnit},
        stock_movement::{self, MovementDirection},
        warehouse, warehouse_inventory,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateWarehouseInput {
    #[validate(length(min = 2, max = 120))]
    pub name: String,
    #[validate(length(min = 2, max = 80))]
    pub region: String,
    pub city: Option<String>,
}

/// Quantity change against one product at one warehouse.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct StockChangeInput {
    pub product_id: Uuid,
    #[validate(range(min = 1, max = 1_000_000))]
    pub quantity: i32,
    #[validate(length(max = 280))]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InventoryLine {
    pub product_id: Uuid,
    pub product_name: String,
    pub unit: ProductUnit,
    pub quantity_on_hand: i32,
    pub unit_price: Decimal,
    pub line_value: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WarehouseInventoryView {
    pub warehouse: warehouse::Model,
    pub lines: Vec<InventoryLine>,
}

/// What a stock change left behind: the ledger entry plus the quantities
/// it produced.
#[derive(Debug, Serialize, ToSchema)]
pub struct StockChangeReceipt {
    pub movement: stock_movement::Model,
    pub quantity_on_hand: i32,
    pub total_stock_value: Decimal,
}

/// Warehouse stock, kept as an append-only movement ledger plus a
/// per-product on-hand quantity.
///
/// Every mutation appends a `stock_movements` row and recomputes the
/// warehouse's denormalized `total_stock_value` in the same transaction,
/// so the ledger, the on-hand counts and the value never drift apart.
pub struct WarehouseService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl WarehouseService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, input))]
    pub async fn create(
        &self,
        input: CreateWarehouseInput,
    ) -> Result<warehouse::Model, ServiceError> {
        input.validate()?;
        let now = Utc::now();
        let created = warehouse::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name.trim().to_string()),
            region: Set(input.region.trim().to_string()),
            city: Set(input.city.map(|c| c.trim().to_string())),
            total_stock_value: Set(Decimal::ZERO),
            created_at: Set(now),
            updated_at: Set(None),
        }
        .insert(&*self.db)
        .await?;
        info!(warehouse_id = %created.id, name = %created.name, "Warehouse created");
        Ok(created)
    }

    pub async fn list(&self) -> Result<Vec<warehouse::Model>, ServiceError> {
        let rows = warehouse::Entity::find()
            .order_by_asc(warehouse::Column::Name)
            .all(&*self.db)
            .await?;
        Ok(rows)
    }

    /// On-hand stock per product at one warehouse, priced at live catalog
    /// prices.
    #[instrument(skip(self))]
    pub async fn get_inventory(
        &self,
        warehouse_id: Uuid,
    ) -> Result<WarehouseInventoryView, ServiceError> {
        let found = warehouse::Entity::find_by_id(warehouse_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Warehouse {}", warehouse_id)))?;

        let rows = warehouse_inventory::Entity::find()
            .filter(warehouse_inventory::Column::WarehouseId.eq(warehouse_id))
            .find_also_related(product::Entity)
            .all(&*self.db)
            .await?;

        let mut lines = Vec::with_capacity(rows.len());
        for (inv, prod) in rows {
            let Some(prod) = prod else { continue };
            let quantity = Decimal::from(inv.quantity_on_hand);
            lines.push(InventoryLine {
                product_id: prod.id,
                product_name: prod.name,
                unit: prod.unit,
                quantity_on_hand: inv.quantity_on_hand,
                unit_price: prod.price,
                line_value: (quantity * prod.price).round_dp(2),
            });
        }
        lines.sort_by(|a, b| a.product_name.cmp(&b.product_name));

        Ok(WarehouseInventoryView {
            warehouse: found,
            lines,
        })
    }

    /// Books stock in: insert-or-increment the on-hand row, append an
    /// inbound ledger entry, recompute the warehouse value.
    #[instrument(skip(self, input), fields(warehouse_id = %warehouse_id))]
    pub async fn add_inventory(
        &self,
        warehouse_id: Uuid,
        recorded_by: Uuid,
        input: StockChangeInput,
    ) -> Result<StockChangeReceipt, ServiceError> {
        input.validate()?;
        let now = Utc::now();
        let txn = self.db.begin().await?;

        warehouse::Entity::find_by_id(warehouse_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Warehouse {}", warehouse_id)))?;
        let prod = product::Entity::find_by_id(input.product_id)
            .one(&txn)
            .await?
            .filter(|p| p.deleted_at.is_none())
            .ok_or_else(|| ServiceError::NotFound(format!("Product {}", input.product_id)))?;

        let existing = warehouse_inventory::Entity::find()
            .filter(warehouse_inventory::Column::WarehouseId.eq(warehouse_id))
            .filter(warehouse_inventory::Column::ProductId.eq(input.product_id))
            .one(&txn)
            .await?;
        let quantity_on_hand = match existing {
            Some(row) => {
                let new_quantity = row.quantity_on_hand + input.quantity;
                warehouse_inventory::Entity::update_many()
                    .col_expr(
                        warehouse_inventory::Column::QuantityOnHand,
                        Expr::col(warehouse_inventory::Column::QuantityOnHand)
                            .add(input.quantity),
                    )
                    .col_expr(warehouse_inventory::Column::UpdatedAt, Expr::value(now))
                    .filter(warehouse_inventory::Column::Id.eq(row.id))
                    .exec(&txn)
                    .await?;
                new_quantity
            }
            None => {
                warehouse_inventory::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    warehouse_id: Set(warehouse_id),
                    product_id: Set(input.product_id),
                    quantity_on_hand: Set(input.quantity),
                    created_at: Set(now),
                    updated_at: Set(None),
                }
                .insert(&txn)
                .await?;
                input.quantity
            }
        };

        let movement = self
            .append_movement(
                &txn,
                warehouse_id,
                input.product_id,
                MovementDirection::Inbound,
                input.quantity,
                input.reason,
                recorded_by,
            )
            .await?;
        let total_stock_value = self.recompute_value(&txn, warehouse_id).await?;

        txn.commit().await?;
        self.event_sender
            .send_or_log(Event::StockMovementRecorded {
                warehouse_id,
                product_id: prod.id,
                direction: MovementDirection::Inbound.to_string(),
                quantity: input.quantity,
            })
            .await;
        Ok(StockChangeReceipt {
            movement,
            quantity_on_hand,
            total_stock_value,
        })
    }

    /// Books stock out. The decrement is conditional on the row still
    /// covering it, so concurrent removals cannot take the quantity
    /// negative.
    #[instrument(skip(self, input), fields(warehouse_id = %warehouse_id))]
    pub async fn remove_inventory(
        &self,
        warehouse_id: Uuid,
        recorded_by: Uuid,
        input: StockChangeInput,
    ) -> Result<StockChangeReceipt, ServiceError> {
        input.validate()?;
        let now = Utc::now();
        let txn = self.db.begin().await?;

        warehouse::Entity::find_by_id(warehouse_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Warehouse {}", warehouse_id)))?;

        let row = warehouse_inventory::Entity::find()
            .filter(warehouse_inventory::Column::WarehouseId.eq(warehouse_id))
            .filter(warehouse_inventory::Column::ProductId.eq(input.product_id))
            .one(&txn)
            .await?
            .ok_or(ServiceError::InsufficientInventory)?;

        let res = warehouse_inventory::Entity::update_many()
            .col_expr(
                warehouse_inventory::Column::QuantityOnHand,
                Expr::col(warehouse_inventory::Column::QuantityOnHand).sub(input.quantity),
            )
            .col_expr(warehouse_inventory::Column::UpdatedAt, Expr::value(now))
            .filter(warehouse_inventory::Column::Id.eq(row.id))
            .filter(warehouse_inventory::Column::QuantityOnHand.gte(input.quantity))
            .exec(&txn)
            .await?;
        if res.rows_affected == 0 {
            return Err(ServiceError::InsufficientInventory);
        }

        // Re-read inside the transaction; the pre-update value may be
        // stale under concurrent removals.
        let on_hand = warehouse_inventory::Entity::find_by_id(row.id)
            .one(&txn)
            .await?
            .map(|r| r.quantity_on_hand)
            .unwrap_or(0);

        let movement = self
            .append_movement(
                &txn,
                warehouse_id,
                input.product_id,
                MovementDirection::Outbound,
                input.quantity,
                input.reason,
                recorded_by,
            )
            .await?;
        let total_stock_value = self.recompute_value(&txn, warehouse_id).await?;

        txn.commit().await?;
        self.event_sender
            .send_or_log(Event::StockMovementRecorded {
                warehouse_id,
                product_id: input.product_id,
                direction: MovementDirection::Outbound.to_string(),
                quantity: input.quantity,
            })
            .await;
        Ok(StockChangeReceipt {
            movement,
            quantity_on_hand: on_hand,
            total_stock_value,
        })
    }

    /// The ledger for one warehouse, newest first.
    #[instrument(skip(self))]
    pub async fn list_movements(
        &self,
        warehouse_id: Uuid,
        page: u64,
        limit: u64,
    ) -> Result<Paginated<stock_movement::Model>, ServiceError> {
        warehouse::Entity::find_by_id(warehouse_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Warehouse {}", warehouse_id)))?;

        let query = stock_movement::Entity::find()
            .filter(stock_movement::Column::WarehouseId.eq(warehouse_id))
            .order_by_desc(stock_movement::Column::CreatedAt);
        let paginator = query.paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page - 1).await?;
        Ok(Paginated::new(items, page, limit, total))
    }

    #[allow(clippy::too_many_arguments)]
    async fn append_movement<C: ConnectionTrait>(
        &self,
        conn: &C,
        warehouse_id: Uuid,
        product_id: Uuid,
        direction: MovementDirection,
        quantity: i32,
        reason: Option<String>,
        recorded_by: Uuid,
    ) -> Result<stock_movement::Model, ServiceError> {
        let movement = stock_movement::ActiveModel {
            id: Set(Uuid::new_v4()),
            warehouse_id: Set(warehouse_id),
            product_id: Set(product_id),
            direction: Set(direction),
            quantity: Set(quantity),
            reason: Set(reason),
            recorded_by: Set(recorded_by),
            created_at: Set(Utc::now()),
        }
        .insert(conn)
        .await?;
        Ok(movement)
    }

    /// Re-derives `total_stock_value` from the on-hand rows and live
    /// product prices and writes it back.
    async fn recompute_value<C: ConnectionTrait>(
        &self,
        conn: &C,
        warehouse_id: Uuid,
    ) -> Result<Decimal, ServiceError> {
        let rows = warehouse_inventory::Entity::find()
            .filter(warehouse_inventory::Column::WarehouseId.eq(warehouse_id))
            .find_also_related(product::Entity)
            .all(conn)
            .await?;
        let mut total = Decimal::ZERO;
        for (inv, prod) in rows {
            if let Some(prod) = prod {
                total += Decimal::from(inv.quantity_on_hand) * prod.price;
            }
        }
        let total = total.round_dp(2);

        warehouse::Entity::update_many()
            .col_expr(warehouse::Column::TotalStockValue, Expr::value(total))
            .col_expr(warehouse::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(warehouse::Column::Id.eq(warehouse_id))
            .exec(conn)
            .await?;
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn stock_change_rejects_zero_quantity() {
        let input = StockChangeInput {
            product_id: Uuid::new_v4(),
            quantity: 0,
            reason: None,
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn stock_change_accepts_positive_quantity() {
        let input = StockChangeInput {
            product_id: Uuid::new_v4(),
            quantity: 40,
            reason: Some("Harvest intake".to_string()),
        };
        assert!(input.validate().is_ok());
    }

    #[test]
    fn line_value_is_quantity_times_price() {
        let quantity = Decimal::from(12);
        let price = dec!(8.25);
        assert_eq!((quantity * price).round_dp(2), dec!(99.00));
    }
}
