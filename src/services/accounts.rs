use crate::{
    config::AppConfig,
    entities::{
        address, farmer_profile,
        user::{self, UserRole, VerificationStatus},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    validation,
};
use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Registration payload. Email, password and phone get the stricter
/// domain checks inside the service on top of the derive-level ones.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterInput {
    #[validate(length(min = 3, max = 255))]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[validate(length(min = 9, max = 16))]
    pub phone: String,
    #[validate(length(min = 2, max = 120))]
    pub full_name: String,
    pub role: UserRole,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginInput {
    #[validate(length(min = 3, max = 255))]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileInput {
    #[validate(length(min = 2, max = 120))]
    pub full_name: Option<String>,
    #[validate(length(min = 9, max = 16))]
    pub phone: Option<String>,
    /// Farmer-profile fields, ignored for non-farmer accounts
    #[validate(length(max = 120))]
    pub farm_name: Option<String>,
    #[validate(length(max = 80))]
    pub region: Option<String>,
    #[validate(length(max = 2000))]
    pub bio: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordInput {
    #[validate(length(min = 1, max = 128))]
    pub current_password: String,
    #[validate(length(min = 8, max = 128))]
    pub new_password: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NewAddressInput {
    #[validate(length(min = 1, max = 40))]
    pub label: String,
    #[validate(length(min = 2, max = 80))]
    pub region: String,
    #[validate(length(min = 1, max = 80))]
    pub city: String,
    #[validate(length(min = 1, max = 200))]
    pub street: String,
    #[validate(length(max = 500))]
    pub details: Option<String>,
    #[validate(length(min = 9, max = 16))]
    pub contact_phone: String,
}

/// Account profile as returned by `GET /auth/me`.
#[derive(Debug, Serialize, ToSchema)]
pub struct Profile {
    #[serde(flatten)]
    pub user: user::Model,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub farmer_profile: Option<farmer_profile::Model>,
}

/// Registration, login and profile management.
///
/// Login failures feed a per-account lockout persisted on the users row:
/// `failed_login_attempts` counts consecutive misses and the configured
/// threshold sets `locked_until`, after which every attempt is rejected
/// until the window passes.
pub struct AccountsService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    config: Arc<AppConfig>,
}

impl AccountsService {
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

    /// Registers a new account.
    ///
    /// Farmers start `Unverified` with an empty farmer profile row and must
    /// walk the verification flow before selling; every other role is
    /// approved on the spot.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: RegisterInput) -> Result<user::Model, ServiceError> {
        input.validate()?;

        let email = input.email.trim().to_lowercase();
        if !validation::is_valid_email(&email) {
            return Err(ServiceError::ValidationError(
                "Invalid email address".to_string(),
            ));
        }
        validation::validate_password_strength(&input.password)
            .map_err(|msg| ServiceError::ValidationError(msg.to_string()))?;
        let phone = validation::normalize_phone(&input.phone).ok_or_else(|| {
            ServiceError::ValidationError(
                "Phone must be a Ghana number (0XXXXXXXXX or +233XXXXXXXXX)".to_string(),
            )
        })?;
        if input.role == UserRole::Admin {
            return Err(ServiceError::ValidationError(
                "Admin accounts cannot be self-registered".to_string(),
            ));
        }

        let password_hash = self.hash_password(&input.password)?;
        let verification_status = if input.role == UserRole::Farmer {
            VerificationStatus::Unverified
        } else {
            VerificationStatus::Approved
        };

        let txn = self.db.begin().await?;

        let existing = user::Entity::find()
            .filter(user::Column::Email.eq(&email))
            .one(&txn)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::EmailInUse);
        }

        let new_user = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email),
            phone: Set(phone),
            full_name: Set(input.full_name.trim().to_string()),
            password_hash: Set(password_hash),
            role: Set(input.role),
            verification_status: Set(verification_status),
            failed_login_attempts: Set(0),
            locked_until: Set(None),
            deleted_at: Set(None),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        };
        let saved = new_user.insert(&txn).await?;

        if saved.role == UserRole::Farmer {
            farmer_profile::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(saved.id),
                farm_name: Set(None),
                region: Set(None),
                bio: Set(None),
                rating: Set(Decimal::ZERO),
                rating_count: Set(0),
                total_sales: Set(0),
                created_at: Set(Utc::now()),
                updated_at: Set(None),
            }
            .insert(&txn)
            .await?;
        }

        txn.commit().await?;
        self.event_sender
            .send_or_log(Event::UserRegistered(saved.id))
            .await;

        info!(user_id = %saved.id, role = %saved.role, "Registered new account");
        Ok(saved)
    }

    /// Authenticates by email and password.
    ///
    /// The lockout window is checked before the password, so a locked
    /// account answers 429 even to the correct credentials. Soft-deleted
    /// accounts are indistinguishable from bad credentials.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginInput) -> Result<user::Model, ServiceError> {
        input.validate()?;
        let email = input.email.trim().to_lowercase();

        let found = user::Entity::find()
            .filter(user::Column::Email.eq(&email))
            .one(&*self.db)
            .await?
            .ok_or(ServiceError::InvalidCredentials)?;
        if found.deleted_at.is_some() {
            return Err(ServiceError::InvalidCredentials);
        }

        let now = Utc::now();
        if let Some(locked_until) = found.locked_until {
            if locked_until > now {
                let retry_after_secs = (locked_until - now).num_seconds().max(1);
                warn!(user_id = %found.id, "Login attempt on locked account");
                return Err(ServiceError::AccountLocked { retry_after_secs });
            }
        }

        if self.verify_password(&input.password, &found.password_hash)? {
            if found.failed_login_attempts > 0 || found.locked_until.is_some() {
                let mut active: user::ActiveModel = found.clone().into();
                active.failed_login_attempts = Set(0);
                active.locked_until = Set(None);
                active.updated_at = Set(Some(now));
                let cleared = active.update(&*self.db).await?;
                info!(user_id = %cleared.id, "Login succeeded, lockout counters reset");
                return Ok(cleared);
            }
            info!(user_id = %found.id, "Login succeeded");
            return Ok(found);
        }

        let attempts = found.failed_login_attempts + 1;
        let mut active: user::ActiveModel = found.clone().into();
        active.failed_login_attempts = Set(attempts);
        active.updated_at = Set(Some(now));
        if attempts >= self.config.login_max_attempts as i32 {
            let lockout = Duration::seconds(self.config.login_lockout_secs as i64);
            active.locked_until = Set(Some(now + lockout));
            warn!(
                user_id = %found.id,
                attempts, "Account locked after repeated login failures"
            );
        }
        active.update(&*self.db).await?;

        Err(ServiceError::InvalidCredentials)
    }

    /// Current account, with the farmer profile attached for farmers.
    #[instrument(skip(self))]
    pub async fn get_profile(&self, user_id: Uuid) -> Result<Profile, ServiceError> {
        let found = self.load_active_user(user_id).await?;
        let farmer_profile = if found.role == UserRole::Farmer {
            farmer_profile::Entity::find()
                .filter(farmer_profile::Column::UserId.eq(user_id))
                .one(&*self.db)
                .await?
        } else {
            None
        };
        Ok(Profile {
            user: found,
            farmer_profile,
        })
    }

    #[instrument(skip(self, input))]
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        input: UpdateProfileInput,
    ) -> Result<Profile, ServiceError> {
        input.validate()?;
        let found = self.load_active_user(user_id).await?;

        let phone = match &input.phone {
            Some(raw) => Some(validation::normalize_phone(raw).ok_or_else(|| {
                ServiceError::ValidationError(
                    "Phone must be a Ghana number (0XXXXXXXXX or +233XXXXXXXXX)".to_string(),
                )
            })?),
            None => None,
        };

        let txn = self.db.begin().await?;

        let role = found.role;
        let mut active: user::ActiveModel = found.into();
        if let Some(full_name) = &input.full_name {
            active.full_name = Set(full_name.trim().to_string());
        }
        if let Some(phone) = phone {
            active.phone = Set(phone);
        }
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(&txn).await?;

        let mut farmer_row = None;
        if role == UserRole::Farmer {
            let profile = farmer_profile::Entity::find()
                .filter(farmer_profile::Column::UserId.eq(user_id))
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Farmer profile for user {}", user_id))
                })?;
            let mut active: farmer_profile::ActiveModel = profile.into();
            if let Some(farm_name) = &input.farm_name {
                active.farm_name = Set(Some(farm_name.trim().to_string()));
            }
            if let Some(region) = &input.region {
                active.region = Set(Some(region.trim().to_string()));
            }
            if let Some(bio) = &input.bio {
                active.bio = Set(Some(bio.trim().to_string()));
            }
            active.updated_at = Set(Some(Utc::now()));
            farmer_row = Some(active.update(&txn).await?);
        }

        txn.commit().await?;
        info!(user_id = %user_id, "Profile updated");
        Ok(Profile {
            user: updated,
            farmer_profile: farmer_row,
        })
    }

    /// Rotates the password after verifying the current one.
    #[instrument(skip(self, input))]
    pub async fn change_password(
        &self,
        user_id: Uuid,
        input: ChangePasswordInput,
    ) -> Result<(), ServiceError> {
        input.validate()?;
        validation::validate_password_strength(&input.new_password)
            .map_err(|msg| ServiceError::ValidationError(msg.to_string()))?;

        let found = self.load_active_user(user_id).await?;
        if !self.verify_password(&input.current_password, &found.password_hash)? {
            return Err(ServiceError::InvalidCredentials);
        }

        let password_hash = self.hash_password(&input.new_password)?;
        let mut active: user::ActiveModel = found.into();
        active.password_hash = Set(password_hash);
        active.updated_at = Set(Some(Utc::now()));
        active.update(&*self.db).await?;

        info!(user_id = %user_id, "Password changed");
        Ok(())
    }

    #[instrument(skip(self, input))]
    pub async fn add_address(
        &self,
        user_id: Uuid,
        input: NewAddressInput,
    ) -> Result<address::Model, ServiceError> {
        input.validate()?;
        let contact_phone = validation::normalize_phone(&input.contact_phone).ok_or_else(|| {
            ServiceError::ValidationError(
                "Contact phone must be a Ghana number (0XXXXXXXXX or +233XXXXXXXXX)".to_string(),
            )
        })?;
        self.load_active_user(user_id).await?;

        let saved = address::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            label: Set(input.label.trim().to_string()),
            region: Set(input.region.trim().to_string()),
            city: Set(input.city.trim().to_string()),
            street: Set(input.street.trim().to_string()),
            details: Set(input.details.map(|d| d.trim().to_string())),
            contact_phone: Set(contact_phone),
            is_active: Set(true),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(&*self.db)
        .await?;

        info!(user_id = %user_id, address_id = %saved.id, "Address added");
        Ok(saved)
    }

    /// Active addresses, newest first.
    #[instrument(skip(self))]
    pub async fn list_addresses(&self, user_id: Uuid) -> Result<Vec<address::Model>, ServiceError> {
        let rows = address::Entity::find()
            .filter(address::Column::UserId.eq(user_id))
            .filter(address::Column::IsActive.eq(true))
            .order_by_desc(address::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        Ok(rows)
    }

    /// Deactivates an address. Orders already placed keep their snapshot.
    #[instrument(skip(self))]
    pub async fn deactivate_address(
        &self,
        user_id: Uuid,
        address_id: Uuid,
    ) -> Result<(), ServiceError> {
        let found = address::Entity::find_by_id(address_id)
            .filter(address::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Address {}", address_id)))?;

        let mut active: address::ActiveModel = found.into();
        active.is_active = Set(false);
        active.updated_at = Set(Some(Utc::now()));
        active.update(&*self.db).await?;

        info!(user_id = %user_id, address_id = %address_id, "Address deactivated");
        Ok(())
    }

    async fn load_active_user(&self, user_id: Uuid) -> Result<user::Model, ServiceError> {
        let found = user::Entity::find_by_id(user_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User {}", user_id)))?;
        if found.deleted_at.is_some() {
            return Err(ServiceError::NotFound(format!("User {}", user_id)));
        }
        Ok(found)
    }

    fn hash_password(&self, password: &str) -> Result<String, ServiceError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| ServiceError::HashError(e.to_string()))
    }

    fn verify_password(&self, password: &str, hash: &str) -> Result<bool, ServiceError> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| ServiceError::HashError(format!("stored hash invalid: {}", e)))?;
        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(ServiceError::HashError(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventSender;
    use tokio::sync::mpsc;

    fn service() -> AccountsService {
        let (tx, _rx) = mpsc::channel(8);
        let config = AppConfig::new(
            "sqlite::memory:".into(),
            "x".repeat(64),
            3600,
            "127.0.0.1".into(),
            0,
            "development".into(),
        );
        AccountsService::new(
            Arc::new(DatabaseConnection::default()),
            Arc::new(EventSender::new(tx)),
            Arc::new(config),
        )
    }

    #[test]
    fn password_round_trip() {
        let svc = service();
        let hash = svc.hash_password("correct horse 1").unwrap();
        assert!(svc.verify_password("correct horse 1", &hash).unwrap());
        assert!(!svc.verify_password("wrong horse 1", &hash).unwrap());
    }

    #[test]
    fn malformed_stored_hash_is_an_error_not_a_mismatch() {
        let svc = service();
        assert!(matches!(
            svc.verify_password("pw", "not-a-phc-hash"),
            Err(ServiceError::HashError(_))
        ));
    }

    #[test]
    fn register_input_rejects_short_password_at_derive_level() {
        let input = RegisterInput {
            email: "ama@example.com".into(),
            password: "short".into(),
            phone: "0241234567".into(),
            full_name: "Ama Mensah".into(),
            role: UserRole::Buyer,
        };
        assert!(input.validate().is_err());
    }
}
