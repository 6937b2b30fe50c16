use crate::{
    entities::{
        product::{self, ProductUnit},
        user::{self, VerificationStatus},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    validation,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::common::Paginated;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateProductInput {
    #[validate(length(min = 2, max = 120))]
    pub name: String,
    #[validate(length(min = 2, max = 60))]
    pub category: String,
    #[validate(length(max = 4000))]
    pub description: Option<String>,
    pub price: Decimal,
    pub unit: ProductUnit,
    #[validate(range(min = 0))]
    pub quantity_available: i32,
    #[validate(url)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProductInput {
    #[validate(length(min = 2, max = 120))]
    pub name: Option<String>,
    #[validate(length(min = 2, max = 60))]
    pub category: Option<String>,
    #[validate(length(max = 4000))]
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub unit: Option<ProductUnit>,
    #[validate(url)]
    pub image_url: Option<String>,
    /// Delist/relist the product without deleting it
    pub is_active: Option<bool>,
    /// Explicit restock; the catalog never changes quantity any other way
    #[validate(range(min = 0))]
    pub quantity_available: Option<i32>,
}

/// Catalog listing filters, all optional.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductFilter {
    pub category: Option<String>,
    /// Matched against name and description
    pub search: Option<String>,
    pub farmer_id: Option<Uuid>,
}

/// Product catalog CRUD.
///
/// Listings only ever show active, non-deleted products. Stock quantities
/// are owned by order placement and cancellation; the only catalog paths
/// that touch them are product creation and explicit restock.
pub struct ProductsService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl ProductsService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Creates a listing for the given farmer. The slug is derived from the
    /// name with a random suffix, so re-listing the same name never collides.
    ///
    /// Only verified farmers can list. The check reads the users row rather
    /// than the token, so an approval takes effect without re-login.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(
        &self,
        farmer_id: Uuid,
        input: CreateProductInput,
    ) -> Result<product::Model, ServiceError> {
        input.validate()?;
        if input.price <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Price must be greater than zero".to_string(),
            ));
        }

        let farmer = user::Entity::find_by_id(farmer_id)
            .one(&*self.db)
            .await?
            .filter(|u| u.deleted_at.is_none())
            .ok_or_else(|| ServiceError::NotFound(format!("User {}", farmer_id)))?;
        if farmer.verification_status != VerificationStatus::Approved {
            return Err(ServiceError::Forbidden(
                "Farm verification must be approved before listing produce".to_string(),
            ));
        }

        let saved = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            farmer_id: Set(farmer_id),
            name: Set(input.name.trim().to_string()),
            slug: Set(validation::slugify(&input.name)),
            category: Set(input.category.trim().to_lowercase()),
            description: Set(input.description),
            price: Set(input.price),
            unit: Set(input.unit),
            quantity_available: Set(input.quantity_available),
            sold_count: Set(0),
            rating: Set(Decimal::ZERO),
            rating_count: Set(0),
            image_url: Set(input.image_url),
            is_active: Set(true),
            deleted_at: Set(None),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(&*self.db)
        .await?;

        self.event_sender
            .send_or_log(Event::ProductCreated(saved.id))
            .await;
        info!(product_id = %saved.id, farmer_id = %farmer_id, "Product created");
        Ok(saved)
    }

    /// Updates the farmer's own listing. A `quantity_available` value here
    /// is an explicit restock to an absolute amount.
    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        farmer_id: Uuid,
        product_id: Uuid,
        input: UpdateProductInput,
    ) -> Result<product::Model, ServiceError> {
        input.validate()?;
        if let Some(price) = input.price {
            if price <= Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "Price must be greater than zero".to_string(),
                ));
            }
        }

        let found = self.load_owned(farmer_id, product_id).await?;
        let mut active: product::ActiveModel = found.into();
        if let Some(name) = &input.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(category) = &input.category {
            active.category = Set(category.trim().to_lowercase());
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description));
        }
        if let Some(price) = input.price {
            active.price = Set(price);
        }
        if let Some(unit) = input.unit {
            active.unit = Set(unit);
        }
        if let Some(image_url) = input.image_url {
            active.image_url = Set(Some(image_url));
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        if let Some(quantity) = input.quantity_available {
            active.quantity_available = Set(quantity);
        }
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ProductUpdated(updated.id))
            .await;
        info!(product_id = %updated.id, "Product updated");
        Ok(updated)
    }

    /// Soft delete. The row stays for order history; listings and carts
    /// stop seeing it.
    #[instrument(skip(self))]
    pub async fn delete(&self, farmer_id: Uuid, product_id: Uuid) -> Result<(), ServiceError> {
        let found = self.load_owned(farmer_id, product_id).await?;
        let mut active: product::ActiveModel = found.into();
        active.deleted_at = Set(Some(Utc::now()));
        active.is_active = Set(false);
        active.updated_at = Set(Some(Utc::now()));
        active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ProductDeleted(product_id))
            .await;
        info!(product_id = %product_id, "Product soft-deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get(&self, product_id: Uuid) -> Result<product::Model, ServiceError> {
        let found = product::Entity::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .filter(|p| p.deleted_at.is_none())
            .ok_or_else(|| ServiceError::NotFound(format!("Product {}", product_id)))?;
        Ok(found)
    }

    #[instrument(skip(self))]
    pub async fn get_by_slug(&self, slug: &str) -> Result<product::Model, ServiceError> {
        let found = product::Entity::find()
            .filter(product::Column::Slug.eq(slug))
            .one(&*self.db)
            .await?
            .filter(|p| p.deleted_at.is_none())
            .ok_or_else(|| ServiceError::NotFound(format!("Product '{}'", slug)))?;
        Ok(found)
    }

    /// Active listings, newest first, with optional category, text and
    /// farmer filters.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: ProductFilter,
        page: u64,
        limit: u64,
    ) -> Result<Paginated<product::Model>, ServiceError> {
        let mut query = product::Entity::find()
            .filter(product::Column::IsActive.eq(true))
            .filter(product::Column::DeletedAt.is_null());

        if let Some(category) = &filter.category {
            let category = category.trim().to_lowercase();
            if !category.is_empty() {
                query = query.filter(product::Column::Category.eq(category));
            }
        }
        if let Some(search) = &filter.search {
            let term = search.trim();
            if !term.is_empty() {
                query = query.filter(
                    product::Column::Name
                        .contains(term)
                        .or(product::Column::Description.contains(term)),
                );
            }
        }
        if let Some(farmer_id) = filter.farmer_id {
            query = query.filter(product::Column::FarmerId.eq(farmer_id));
        }

        let paginator = query
            .order_by_desc(product::Column::CreatedAt)
            .paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page - 1).await?;

        Ok(Paginated::new(items, page, limit, total))
    }

    async fn load_owned(
        &self,
        farmer_id: Uuid,
        product_id: Uuid,
    ) -> Result<product::Model, ServiceError> {
        let found = product::Entity::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .filter(|p| p.deleted_at.is_none())
            .ok_or_else(|| ServiceError::NotFound(format!("Product {}", product_id)))?;
        if found.farmer_id != farmer_id {
            return Err(ServiceError::Forbidden(
                "Product belongs to another farmer".to_string(),
            ));
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn base_input() -> CreateProductInput {
        CreateProductInput {
            name: "Yellow Maize".into(),
            category: "Grains".into(),
            description: None,
            price: dec!(8.50),
            unit: ProductUnit::Bag,
            quantity_available: 40,
            image_url: None,
        }
    }

    #[test]
    fn create_input_accepts_valid_payload() {
        assert!(base_input().validate().is_ok());
    }

    #[test]
    fn create_input_rejects_negative_quantity() {
        let mut input = base_input();
        input.quantity_available = -1;
        assert!(input.validate().is_err());
    }

    #[test]
    fn create_input_rejects_bad_image_url() {
        let mut input = base_input();
        input.image_url = Some("not a url".into());
        assert!(input.validate().is_err());
    }

    #[test]
    fn update_input_rejects_negative_restock() {
        let input = UpdateProductInput {
            quantity_available: Some(-5),
            ..Default::default()
        };
        assert!(input.validate().is_err());
    }
}
