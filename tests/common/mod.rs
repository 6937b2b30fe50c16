//! Shared harness for the integration tests: a full application router
//! backed by a throwaway SQLite database, plus seeding helpers for the
//! accounts and catalog rows most tests need.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Method, Request},
    response::Response,
    Router,
};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

use farmconnect_api::{
    auth::{AuthConfig, AuthService},
    config::AppConfig,
    db,
    entities::{
        address, product,
        product::ProductUnit,
        user::{self, UserRole, VerificationStatus},
    },
    events::{self, EventSender},
    services::{
        accounts::{NewAddressInput, RegisterInput},
        products::CreateProductInput,
        AppServices,
    },
    AppState,
};

/// Password used for every seeded account.
pub const TEST_PASSWORD: &str = "Str0ng!Passw0rd";

/// Webhook secret wired into the test configuration so callback tests
/// can produce valid signatures.
pub const WEBHOOK_SECRET: &str = "integration-test-webhook-secret";

/// Helper harness for spinning up an application backed by a private
/// SQLite database file. Each instance gets its own file so tests can
/// run in parallel.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    db_file: PathBuf,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let db_file = std::env::temp_dir().join(format!(
            "farmconnect_test_{}.db",
            Uuid::new_v4().simple()
        ));
        let _ = std::fs::remove_file(&db_file);

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_file.display()),
            "integration_test_jwt_secret_0123456789_0123456789_0123456789_0123".to_string(),
            3600,
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        // A single connection keeps SQLite happy under the transaction
        // patterns the services use.
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.payment_webhook_secret = Some(WEBHOOK_SECRET.to_string());

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let config = Arc::new(cfg);

        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = Arc::new(EventSender::new(event_tx));
        let event_task = tokio::spawn(events::process_events(event_rx));

        let auth = Arc::new(AuthService::new(AuthConfig::from_app_config(&config)));
        let services = AppServices::new(db_arc.clone(), event_sender, config.clone());

        let state = AppState {
            db: db_arc,
            config,
            auth,
            services,
        };
        let router = farmconnect_api::app(state.clone());

        Self {
            router,
            state,
            db_file,
            _event_task: event_task,
        }
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(bearer) = token {
            builder = builder.header("authorization", format!("Bearer {}", bearer));
        }

        let payload = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let request = builder.body(payload).expect("test request should build");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router should answer the test request")
    }

    /// Convenience helper for authenticated JSON requests.
    pub async fn request_authenticated(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: &str,
    ) -> Response {
        self.request(method, uri, body, Some(token)).await
    }

    /// Raw-body request with arbitrary headers, for the webhook endpoint
    /// where the signature covers the exact bytes sent.
    pub async fn request_raw(
        &self,
        method: Method,
        uri: &str,
        body: Vec<u8>,
        headers: &[(&str, &str)],
    ) -> Response {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = builder
            .body(Body::from(body))
            .expect("test request should build");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router should answer the test request")
    }

    /// Registers an account through the service layer and returns it with
    /// a bearer token.
    pub async fn signup(&self, role: UserRole, email: &str) -> (user::Model, String) {
        let account = self
            .state
            .services
            .accounts
            .register(RegisterInput {
                email: email.to_string(),
                password: TEST_PASSWORD.to_string(),
                phone: unique_phone(),
                full_name: "Test Account".to_string(),
                role,
            })
            .await
            .expect("seed account");
        let token = self.issue_token(&account);
        (account, token)
    }

    pub fn issue_token(&self, account: &user::Model) -> String {
        self.state
            .auth
            .issue_token(account)
            .expect("issue token for seeded account")
            .access_token
    }

    /// A buyer, approved at registration.
    pub async fn buyer(&self) -> (user::Model, String) {
        self.signup(UserRole::Buyer, &unique_email("buyer")).await
    }

    /// A farmer fresh out of registration, still unverified.
    pub async fn unverified_farmer(&self) -> (user::Model, String) {
        self.signup(UserRole::Farmer, &unique_email("farmer")).await
    }

    /// A farmer whose verification has been approved, so they can list
    /// produce.
    pub async fn verified_farmer(&self) -> (user::Model, String) {
        let (account, _) = self.unverified_farmer().await;
        let account = self
            .set_verification(account, VerificationStatus::Approved)
            .await;
        let token = self.issue_token(&account);
        (account, token)
    }

    /// An admin. Admin accounts cannot self-register, so the role is
    /// applied directly to the row.
    pub async fn admin(&self) -> (user::Model, String) {
        let (account, _) = self.signup(UserRole::Buyer, &unique_email("admin")).await;
        let mut active: user::ActiveModel = account.into();
        active.role = Set(UserRole::Admin);
        let account = active
            .update(&*self.state.db)
            .await
            .expect("promote seeded account to admin");
        let token = self.issue_token(&account);
        (account, token)
    }

    pub async fn delivery_user(&self) -> (user::Model, String) {
        self.signup(UserRole::Delivery, &unique_email("delivery"))
            .await
    }

    pub async fn warehouse_user(&self) -> (user::Model, String) {
        self.signup(UserRole::Warehouse, &unique_email("warehouse"))
            .await
    }

    pub async fn set_verification(
        &self,
        account: user::Model,
        status: VerificationStatus,
    ) -> user::Model {
        let mut active: user::ActiveModel = account.into();
        active.verification_status = Set(status);
        active
            .update(&*self.state.db)
            .await
            .expect("update seeded account verification status")
    }

    /// Seeds a catalog listing owned by the given (verified) farmer.
    pub async fn seed_product(
        &self,
        farmer_id: Uuid,
        name: &str,
        price: Decimal,
        quantity: i32,
    ) -> product::Model {
        self.state
            .services
            .products
            .create(
                farmer_id,
                CreateProductInput {
                    name: name.to_string(),
                    category: "vegetables".to_string(),
                    description: Some("Seeded for integration tests".to_string()),
                    price,
                    unit: ProductUnit::Kg,
                    quantity_available: quantity,
                    image_url: None,
                },
            )
            .await
            .expect("seed product")
    }

    /// Seeds a delivery address for the given account.
    pub async fn seed_address(&self, user_id: Uuid) -> address::Model {
        self.state
            .services
            .accounts
            .add_address(
                user_id,
                NewAddressInput {
                    label: "Home".to_string(),
                    region: "Greater Accra".to_string(),
                    city: "Accra".to_string(),
                    street: "12 Oxford Street, Osu".to_string(),
                    details: None,
                    contact_phone: "0241234567".to_string(),
                },
            )
            .await
            .expect("seed address")
    }

    /// Re-reads a product row, for asserting stock effects.
    pub async fn product_row(&self, product_id: Uuid) -> product::Model {
        use sea_orm::EntityTrait;
        product::Entity::find_by_id(product_id)
            .one(&*self.state.db)
            .await
            .expect("query product row")
            .expect("product row exists")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
        let _ = std::fs::remove_file(&self.db_file);
        // SQLite leaves journal files next to the database
        for suffix in ["-wal", "-shm"] {
            let mut name = self.db_file.clone().into_os_string();
            name.push(suffix);
            let _ = std::fs::remove_file(PathBuf::from(name));
        }
    }
}

/// Parses a response body as JSON.
pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

pub fn unique_email(prefix: &str) -> String {
    format!("{}-{}@farmconnect.test", prefix, Uuid::new_v4().simple())
}

/// A syntactically valid, almost certainly unique Ghana phone number.
pub fn unique_phone() -> String {
    format!("+2332{:08}", rand::random::<u32>() % 100_000_000)
}
