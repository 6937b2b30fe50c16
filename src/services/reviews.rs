use crate::{
    common::Paginated,
    entities::{farmer_profile, product, review},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ReviewInput {
    #[validate(range(min = 1, max = 5))]
    pub rating: i32,
    #[validate(length(max = 1000))]
    pub comment: Option<String>,
}

/// Product reviews and the denormalized rating aggregates they feed.
///
/// One review per (product, buyer); a second submission overwrites the
/// first. Aggregates on the product and on the farmer profile are always
/// recomputed from the stored rows inside the same transaction, so an
/// overwrite can move an average down as well as up.
pub struct ReviewService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl ReviewService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Creates or overwrites the buyer's review of a product, then
    /// recomputes the product and farmer aggregates.
    #[instrument(skip(self, input), fields(product_id = %product_id))]
    pub async fn upsert_review(
        &self,
        buyer_id: Uuid,
        product_id: Uuid,
        input: ReviewInput,
    ) -> Result<review::Model, ServiceError> {
        input.validate()?;
        let now = Utc::now();
        let txn = self.db.begin().await?;

        let prod = product::Entity::find_by_id(product_id)
            .one(&txn)
            .await?
            .filter(|p| p.deleted_at.is_none())
            .ok_or_else(|| ServiceError::NotFound(format!("Product {}", product_id)))?;

        let existing = review::Entity::find()
            .filter(review::Column::ProductId.eq(product_id))
            .filter(review::Column::BuyerId.eq(buyer_id))
            .one(&txn)
            .await?;
        let rating = input.rating;
        let saved = match existing {
            Some(row) => {
                let mut active: review::ActiveModel = row.into();
                active.rating = Set(input.rating);
                active.comment = Set(input.comment);
                active.updated_at = Set(Some(now));
                active.update(&txn).await?
            }
            None => {
                review::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    product_id: Set(product_id),
                    buyer_id: Set(buyer_id),
                    rating: Set(input.rating),
                    comment: Set(input.comment),
                    created_at: Set(now),
                    updated_at: Set(None),
                }
                .insert(&txn)
                .await?
            }
        };

        self.recompute_product(&txn, product_id).await?;
        self.recompute_farmer(&txn, prod.farmer_id).await?;

        txn.commit().await?;
        self.event_sender
            .send_or_log(Event::ReviewSubmitted {
                product_id,
                buyer_id,
                rating,
            })
            .await;
        info!(product_id = %product_id, rating, "Review saved");
        Ok(saved)
    }

    /// Reviews for one product, newest first.
    #[instrument(skip(self))]
    pub async fn list_for_product(
        &self,
        product_id: Uuid,
        page: u64,
        limit: u64,
    ) -> Result<Paginated<review::Model>, ServiceError> {
        product::Entity::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .filter(|p| p.deleted_at.is_none())
            .ok_or_else(|| ServiceError::NotFound(format!("Product {}", product_id)))?;

        let query = review::Entity::find()
            .filter(review::Column::ProductId.eq(product_id))
            .order_by_desc(review::Column::CreatedAt);
        let paginator = query.paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page - 1).await?;
        Ok(Paginated::new(items, page, limit, total))
    }

    async fn recompute_product<C: ConnectionTrait>(
        &self,
        conn: &C,
        product_id: Uuid,
    ) -> Result<(), ServiceError> {
        let ratings: Vec<i32> = review::Entity::find()
            .select_only()
            .column(review::Column::Rating)
            .filter(review::Column::ProductId.eq(product_id))
            .into_tuple()
            .all(conn)
            .await?;
        let (rating, count) = average(&ratings);

        product::Entity::update_many()
            .col_expr(product::Column::Rating, Expr::value(rating))
            .col_expr(product::Column::RatingCount, Expr::value(count))
            .col_expr(product::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(product::Column::Id.eq(product_id))
            .exec(conn)
            .await?;
        Ok(())
    }

    async fn recompute_farmer<C: ConnectionTrait>(
        &self,
        conn: &C,
        farmer_id: Uuid,
    ) -> Result<(), ServiceError> {
        let ratings: Vec<i32> = review::Entity::find()
            .select_only()
            .column(review::Column::Rating)
            .inner_join(product::Entity)
            .filter(product::Column::FarmerId.eq(farmer_id))
            .into_tuple()
            .all(conn)
            .await?;
        let (rating, count) = average(&ratings);

        farmer_profile::Entity::update_many()
            .col_expr(farmer_profile::Column::Rating, Expr::value(rating))
            .col_expr(farmer_profile::Column::RatingCount, Expr::value(count))
            .col_expr(farmer_profile::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(farmer_profile::Column::UserId.eq(farmer_id))
            .exec(conn)
            .await?;
        Ok(())
    }
}

/// Mean rating rounded to two decimals, zero when there are no rows.
fn average(ratings: &[i32]) -> (Decimal, i32) {
    if ratings.is_empty() {
        return (Decimal::ZERO, 0);
    }
    let sum: i64 = ratings.iter().map(|r| *r as i64).sum();
    let avg = (Decimal::from(sum) / Decimal::from(ratings.len() as i64)).round_dp(2);
    (avg, ratings.len() as i32)
}
