// Accounts and identity
pub mod accounts;
pub mod verification;

// Catalog and shopping
pub mod cart;
pub mod products;
pub mod reviews;

// Fulfilment
pub mod orders;
pub mod payments;
pub mod warehouse;

// Cross-cutting
pub mod admin;
pub mod notifications;

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{config::AppConfig, events::EventSender};

/// Container holding one instance of every service, constructed once at
/// startup with shared dependencies and cloned into the router state.
#[derive(Clone)]
pub struct AppServices {
    pub accounts: Arc<accounts::AccountsService>,
    pub products: Arc<products::ProductsService>,
    pub cart: Arc<cart::CartService>,
    pub orders: Arc<orders::OrderService>,
    pub payments: Arc<payments::PaymentService>,
    pub warehouse: Arc<warehouse::WarehouseService>,
    pub verification: Arc<verification::VerificationService>,
    pub reviews: Arc<reviews::ReviewService>,
    pub notifications: Arc<notifications::NotificationService>,
    pub admin: Arc<admin::AdminService>,
}

impl AppServices {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            accounts: Arc::new(accounts::AccountsService::new(
                db.clone(),
                event_sender.clone(),
                config.clone(),
            )),
            products: Arc::new(products::ProductsService::new(
                db.clone(),
                event_sender.clone(),
            )),
            cart: Arc::new(cart::CartService::new(db.clone(), event_sender.clone())),
            orders: Arc::new(orders::OrderService::new(
                db.clone(),
                event_sender.clone(),
                config.clone(),
            )),
            payments: Arc::new(payments::PaymentService::new(
                db.clone(),
                event_sender.clone(),
                config.clone(),
            )),
            warehouse: Arc::new(warehouse::WarehouseService::new(
                db.clone(),
                event_sender.clone(),
            )),
            verification: Arc::new(verification::VerificationService::new(
                db.clone(),
                event_sender.clone(),
                config.clone(),
            )),
            reviews: Arc::new(reviews::ReviewService::new(db.clone(), event_sender.clone())),
            notifications: Arc::new(notifications::NotificationService::new(db.clone())),
            admin: Arc::new(admin::AdminService::new(
                db,
                event_sender,
                config.currency.clone(),
            )),
        }
    }
}
