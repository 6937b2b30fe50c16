use crate::{
    auth::rate_limit::{OtpRateLimitConfig, OtpRateLimiter},
    common::Paginated,
    config::AppConfig,
    entities::{
        farmer_verification::{self, LevelStatus, VERIFICATION_STEPS},
        user::{self, UserRole, VerificationStatus},
        verification_otp,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::notifications,
    validation,
};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct IdentityStep {
    #[validate(length(min = 2, max = 120))]
    pub full_name: String,
    #[validate(length(min = 2, max = 40))]
    pub id_type: String,
    #[validate(length(min = 3, max = 40))]
    pub id_number: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct FarmDetailsStep {
    #[validate(length(min = 2, max = 120))]
    pub farm_name: String,
    #[validate(length(min = 2, max = 80))]
    pub farm_region: String,
    #[validate(length(max = 80))]
    pub farm_district: Option<String>,
    pub farm_size_acres: Option<Decimal>,
    #[validate(length(max = 280))]
    pub primary_crops: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BankingStep {
    #[validate(length(max = 80))]
    pub bank_name: Option<String>,
    #[validate(length(max = 40))]
    pub bank_account_number: Option<String>,
    #[validate(length(max = 120))]
    pub bank_account_name: Option<String>,
    pub mobile_money_number: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct DocumentsStep {
    #[validate(url)]
    pub id_front_url: String,
    #[validate(url)]
    pub id_back_url: Option<String>,
    #[validate(url)]
    pub selfie_url: String,
    #[validate(url)]
    pub farm_photo_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct PhoneStep {
    pub verification_phone: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ConsentsStep {
    pub consent_terms: bool,
    pub consent_data_sharing: bool,
    #[serde(default)]
    pub consent_farm_visit: bool,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct VerifyOtpInput {
    #[validate(length(equal = 6))]
    pub code: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ReviewDecisionInput {
    pub approve: bool,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

/// Issued-code acknowledgement. The code itself travels over the SMS
/// stub (the log), never the API.
#[derive(Debug, Serialize, ToSchema)]
pub struct OtpIssued {
    pub phone: String,
    pub expires_at: DateTime<Utc>,
}

/// Six-step farmer onboarding.
///
/// Steps 0 through 5 are validated and persisted independently; a
/// resubmitted step rewrites only its own field group. `submit` runs the
/// automated level-1 checks, and a separate admin review decides level 2.
pub struct VerificationService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    config: Arc<AppConfig>,
    otp_limiter: Arc<OtpRateLimiter>,
}

impl VerificationService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        config: Arc<AppConfig>,
    ) -> Self {
        let otp_limiter = Arc::new(OtpRateLimiter::new(OtpRateLimitConfig {
            max_sends: config.otp_send_max,
            window: StdDuration::from_secs(config.otp_send_window_secs),
        }));
        Self {
            db,
            event_sender,
            config,
            otp_limiter,
        }
    }

    /// Limiter handle for the background eviction task.
    pub fn otp_limiter(&self) -> Arc<OtpRateLimiter> {
        Arc::clone(&self.otp_limiter)
    }

    /// Creates the farmer's verification record, or returns the existing
    /// one unchanged.
    #[instrument(skip(self))]
    pub async fn initiate(
        &self,
        user_id: Uuid,
    ) -> Result<farmer_verification::Model, ServiceError> {
        let found = user::Entity::find_by_id(user_id)
            .one(&*self.db)
            .await?
            .filter(|u| u.deleted_at.is_none())
            .ok_or_else(|| ServiceError::NotFound(format!("User {}", user_id)))?;
        if found.role != UserRole::Farmer {
            return Err(ServiceError::Forbidden(
                "Only farmers go through verification".to_string(),
            ));
        }

        if let Some(existing) = self.find_record(user_id).await? {
            return Ok(existing);
        }

        let record = farmer_verification::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            current_step: Set(0),
            full_name: Set(None),
            id_type: Set(None),
            id_number: Set(None),
            farm_name: Set(None),
            farm_region: Set(None),
            farm_district: Set(None),
            farm_size_acres: Set(None),
            primary_crops: Set(None),
            bank_name: Set(None),
            bank_account_number: Set(None),
            bank_account_name: Set(None),
            mobile_money_number: Set(None),
            id_front_url: Set(None),
            id_back_url: Set(None),
            selfie_url: Set(None),
            farm_photo_url: Set(None),
            verification_phone: Set(None),
            phone_verified: Set(false),
            consent_terms: Set(false),
            consent_data_sharing: Set(false),
            consent_farm_visit: Set(false),
            level_1_status: Set(LevelStatus::NotStarted),
            id_check_passed: Set(None),
            phone_check_passed: Set(None),
            submitted_at: Set(None),
            level_2_status: Set(LevelStatus::NotStarted),
            reviewer_id: Set(None),
            review_notes: Set(None),
            reviewed_at: Set(None),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(&*self.db)
        .await?;
        info!(user_id = %user_id, "Verification record created");
        Ok(record)
    }

    /// Current verification state for the farmer.
    pub async fn status(
        &self,
        user_id: Uuid,
    ) -> Result<farmer_verification::Model, ServiceError> {
        self.find_record(user_id).await?.ok_or_else(|| {
            ServiceError::NotFound(format!("Verification record for user {}", user_id))
        })
    }

    /// Validates and persists one step's field group.
    ///
    /// `current_step` only ever advances; resubmitting an earlier step
    /// overwrites its fields and leaves the cursor alone.
    #[instrument(skip(self, payload), fields(user_id = %user_id, step))]
    pub async fn submit_step(
        &self,
        user_id: Uuid,
        step: i32,
        payload: serde_json::Value,
    ) -> Result<farmer_verification::Model, ServiceError> {
        if !(0..VERIFICATION_STEPS).contains(&step) {
            return Err(ServiceError::ValidationError(format!(
                "Verification step must be between 0 and {}",
                VERIFICATION_STEPS - 1
            )));
        }

        let record = self.require_record(user_id).await?;
        if record.level_2_status == LevelStatus::Approved {
            return Err(ServiceError::VerificationState(
                "Verification is already approved".to_string(),
            ));
        }

        let mut active: farmer_verification::ActiveModel = record.clone().into();
        match step {
            0 => {
                let input: IdentityStep = parse_step(payload)?;
                input.validate()?;
                if input.id_type == "ghana_card"
                    && !validation::is_valid_ghana_card(&input.id_number)
                {
                    return Err(ServiceError::ValidationError(
                        "ID number must match the Ghana Card format GHA-XXXXXXXXX-X".to_string(),
                    ));
                }
                active.full_name = Set(Some(input.full_name.trim().to_string()));
                active.id_type = Set(Some(input.id_type));
                active.id_number = Set(Some(input.id_number.trim().to_string()));
            }
            1 => {
                let input: FarmDetailsStep = parse_step(payload)?;
                input.validate()?;
                if let Some(acres) = input.farm_size_acres {
                    if acres <= Decimal::ZERO {
                        return Err(ServiceError::ValidationError(
                            "Farm size must be positive".to_string(),
                        ));
                    }
                }
                active.farm_name = Set(Some(input.farm_name.trim().to_string()));
                active.farm_region = Set(Some(input.farm_region.trim().to_string()));
                active.farm_district = Set(input.farm_district);
                active.farm_size_acres = Set(input.farm_size_acres);
                active.primary_crops = Set(input.primary_crops);
            }
            2 => {
                let input: BankingStep = parse_step(payload)?;
                input.validate()?;
                let has_bank = input.bank_name.is_some();
                if has_bank
                    && (input.bank_account_number.is_none() || input.bank_account_name.is_none())
                {
                    return Err(ServiceError::ValidationError(
                        "Bank name requires an account number and account name".to_string(),
                    ));
                }
                let momo = match input.mobile_money_number.as_deref() {
                    Some(raw) => Some(validation::normalize_phone(raw).ok_or_else(|| {
                        ServiceError::ValidationError(
                            "Mobile money number must be a Ghana number".to_string(),
                        )
                    })?),
                    None => None,
                };
                if !has_bank && momo.is_none() {
                    return Err(ServiceError::ValidationError(
                        "Provide bank details or a mobile money number".to_string(),
                    ));
                }
                active.bank_name = Set(input.bank_name);
                active.bank_account_number = Set(input.bank_account_number);
                active.bank_account_name = Set(input.bank_account_name);
                active.mobile_money_number = Set(momo);
            }
            3 => {
                let input: DocumentsStep = parse_step(payload)?;
                input.validate()?;
                active.id_front_url = Set(Some(input.id_front_url));
                active.id_back_url = Set(input.id_back_url);
                active.selfie_url = Set(Some(input.selfie_url));
                active.farm_photo_url = Set(input.farm_photo_url);
            }
            4 => {
                let input: PhoneStep = parse_step(payload)?;
                let phone =
                    validation::normalize_phone(&input.verification_phone).ok_or_else(|| {
                        ServiceError::ValidationError(
                            "Verification phone must be a Ghana number".to_string(),
                        )
                    })?;
                // A new phone invalidates any earlier OTP confirmation.
                if record.verification_phone.as_deref() != Some(phone.as_str()) {
                    active.phone_verified = Set(false);
                }
                active.verification_phone = Set(Some(phone));
            }
            _ => {
                let input: ConsentsStep = parse_step(payload)?;
                if !input.consent_terms || !input.consent_data_sharing {
                    return Err(ServiceError::ValidationError(
                        "Terms and data sharing consents are required".to_string(),
                    ));
                }
                active.consent_terms = Set(input.consent_terms);
                active.consent_data_sharing = Set(input.consent_data_sharing);
                active.consent_farm_visit = Set(input.consent_farm_visit);
            }
        }

        if step + 1 > record.current_step {
            active.current_step = Set(step + 1);
        }
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(&*self.db).await?;
        info!(user_id = %user_id, step, "Verification step saved");
        Ok(updated)
    }

    /// Issues a 6-digit code for the stored verification phone and
    /// supersedes any earlier unconsumed codes.
    #[instrument(skip(self))]
    pub async fn send_otp(&self, user_id: Uuid) -> Result<OtpIssued, ServiceError> {
        let record = self.require_record(user_id).await?;
        let phone = record.verification_phone.clone().ok_or_else(|| {
            ServiceError::VerificationState(
                "Submit the phone verification step before requesting a code".to_string(),
            )
        })?;

        self.otp_limiter.check(&user_id.to_string()).await?;

        let now = Utc::now();
        let code = validation::generate_otp();
        let expires_at = now + Duration::seconds(self.config.otp_ttl_secs as i64);

        let txn = self.db.begin().await?;
        verification_otp::Entity::update_many()
            .col_expr(verification_otp::Column::ConsumedAt, Expr::value(now))
            .filter(verification_otp::Column::UserId.eq(user_id))
            .filter(verification_otp::Column::ConsumedAt.is_null())
            .exec(&txn)
            .await?;
        verification_otp::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            phone: Set(phone.clone()),
            code: Set(code.clone()),
            expires_at: Set(expires_at),
            attempts: Set(0),
            max_attempts: Set(self.config.otp_max_attempts),
            consumed_at: Set(None),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;

        // SMS stub. The code reaches the farmer through the provider in a
        // real deployment; here the log line stands in for it.
        info!(user_id = %user_id, phone = %phone, code = %code, "OTP issued (SMS stubbed)");
        self.event_sender.send_or_log(Event::OtpSent(user_id)).await;
        Ok(OtpIssued { phone, expires_at })
    }

    /// Checks a code against the newest unconsumed one.
    ///
    /// Expiry and attempt exhaustion are reported before correctness, so
    /// a stale or burned code never reveals whether the guess was right.
    #[instrument(skip(self, input))]
    pub async fn verify_otp(
        &self,
        user_id: Uuid,
        input: VerifyOtpInput,
    ) -> Result<farmer_verification::Model, ServiceError> {
        input.validate()?;
        let record = self.require_record(user_id).await?;

        let current = verification_otp::Entity::find()
            .filter(verification_otp::Column::UserId.eq(user_id))
            .filter(verification_otp::Column::ConsumedAt.is_null())
            .order_by_desc(verification_otp::Column::CreatedAt)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::VerificationState(
                    "No verification code has been sent".to_string(),
                )
            })?;

        let now = Utc::now();
        if current.is_expired(now) {
            return Err(ServiceError::OtpExpired);
        }
        if current.attempts_exhausted() {
            return Err(ServiceError::OtpMaxAttempts);
        }
        if current.code != input.code {
            let attempts = current.attempts + 1;
            let mut active: verification_otp::ActiveModel = current.into();
            active.attempts = Set(attempts);
            active.update(&*self.db).await?;
            warn!(user_id = %user_id, attempts, "Wrong OTP code");
            return Err(ServiceError::OtpInvalid);
        }

        let txn = self.db.begin().await?;
        let mut otp_active: verification_otp::ActiveModel = current.into();
        otp_active.consumed_at = Set(Some(now));
        otp_active.update(&txn).await?;

        let mut active: farmer_verification::ActiveModel = record.into();
        active.phone_verified = Set(true);
        active.updated_at = Set(Some(now));
        let updated = active.update(&txn).await?;
        txn.commit().await?;

        self.otp_limiter.reset(&user_id.to_string()).await;
        self.event_sender
            .send_or_log(Event::PhoneVerified(user_id))
            .await;
        info!(user_id = %user_id, "Phone verified");
        Ok(updated)
    }

    /// Final submission: presence checks, then the automated level-1
    /// verdict. Approval parks the account as `Pending` for human review.
    #[instrument(skip(self))]
    pub async fn submit(
        &self,
        user_id: Uuid,
    ) -> Result<farmer_verification::Model, ServiceError> {
        let record = self.require_record(user_id).await?;
        if record.level_1_status == LevelStatus::Approved {
            return Err(ServiceError::VerificationState(
                "Verification has already been submitted".to_string(),
            ));
        }

        let mut missing = Vec::new();
        if record.full_name.is_none() {
            missing.push("full name");
        }
        if record.id_number.is_none() {
            missing.push("ID number");
        }
        if record.verification_phone.is_none() {
            missing.push("verification phone");
        }
        if !record.consent_terms {
            missing.push("terms consent");
        }
        if !record.consent_data_sharing {
            missing.push("data sharing consent");
        }
        if !record.consent_farm_visit {
            missing.push("farm visit consent");
        }
        if !missing.is_empty() {
            return Err(ServiceError::ValidationError(format!(
                "Verification incomplete: missing {}",
                missing.join(", ")
            )));
        }

        let id_check_passed = match record.id_type.as_deref() {
            Some("ghana_card") => record
                .id_number
                .as_deref()
                .map(validation::is_valid_ghana_card)
                .unwrap_or(false),
            Some(_) => record.id_number.as_deref().is_some_and(|n| n.len() >= 5),
            None => false,
        };
        let phone_check_passed = record.phone_verified;
        let approved = id_check_passed && phone_check_passed;

        let now = Utc::now();
        let txn = self.db.begin().await?;

        let mut active: farmer_verification::ActiveModel = record.into();
        active.level_1_status = Set(if approved {
            LevelStatus::Approved
        } else {
            LevelStatus::Rejected
        });
        active.id_check_passed = Set(Some(id_check_passed));
        active.phone_check_passed = Set(Some(phone_check_passed));
        active.submitted_at = Set(Some(now));
        active.updated_at = Set(Some(now));
        let updated = active.update(&txn).await?;

        if approved {
            user::Entity::update_many()
                .col_expr(
                    user::Column::VerificationStatus,
                    Expr::value(VerificationStatus::Pending),
                )
                .col_expr(user::Column::UpdatedAt, Expr::value(now))
                .filter(user::Column::Id.eq(user_id))
                .exec(&txn)
                .await?;
            notifications::record(
                &txn,
                user_id,
                "Verification submitted",
                "Automated checks passed. Your application is awaiting review.".to_string(),
            )
            .await?;
        } else {
            notifications::record(
                &txn,
                user_id,
                "Verification checks failed",
                "Automated checks did not pass. Correct your details and submit again."
                    .to_string(),
            )
            .await?;
        }

        txn.commit().await?;
        self.event_sender
            .send_or_log(Event::VerificationSubmitted(user_id))
            .await;
        info!(user_id = %user_id, approved, "Verification submitted");
        Ok(updated)
    }

    /// Admin level-2 decision. Requires the automated checks to have
    /// passed and stamps the reviewer on the record.
    #[instrument(skip(self, input), fields(verification_id = %verification_id))]
    pub async fn review(
        &self,
        reviewer_id: Uuid,
        verification_id: Uuid,
        input: ReviewDecisionInput,
    ) -> Result<farmer_verification::Model, ServiceError> {
        input.validate()?;
        let now = Utc::now();
        let txn = self.db.begin().await?;

        let record = farmer_verification::Entity::find_by_id(verification_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Verification record {}", verification_id))
            })?;
        if record.level_1_status != LevelStatus::Approved {
            return Err(ServiceError::VerificationState(
                "Automated checks have not passed yet".to_string(),
            ));
        }
        if record.level_2_status != LevelStatus::NotStarted {
            return Err(ServiceError::VerificationState(
                "Verification has already been reviewed".to_string(),
            ));
        }

        let user_id = record.user_id;
        let decision = if input.approve {
            LevelStatus::Approved
        } else {
            LevelStatus::Rejected
        };
        let mut active: farmer_verification::ActiveModel = record.into();
        active.level_2_status = Set(decision);
        active.reviewer_id = Set(Some(reviewer_id));
        active.review_notes = Set(input.notes);
        active.reviewed_at = Set(Some(now));
        active.updated_at = Set(Some(now));
        let updated = active.update(&txn).await?;

        let user_status = if input.approve {
            VerificationStatus::Approved
        } else {
            VerificationStatus::Rejected
        };
        user::Entity::update_many()
            .col_expr(user::Column::VerificationStatus, Expr::value(user_status))
            .col_expr(user::Column::UpdatedAt, Expr::value(now))
            .filter(user::Column::Id.eq(user_id))
            .exec(&txn)
            .await?;

        let (title, body) = if input.approve {
            (
                "Verification approved",
                "Your farm is verified. You can now list produce.".to_string(),
            )
        } else {
            (
                "Verification rejected",
                "Your application was not approved. Check the review notes and try again."
                    .to_string(),
            )
        };
        notifications::record(&txn, user_id, title, body).await?;

        txn.commit().await?;
        self.event_sender
            .send_or_log(Event::VerificationReviewed {
                user_id,
                approved: input.approve,
            })
            .await;
        info!(
            verification_id = %verification_id,
            approved = input.approve,
            "Verification reviewed"
        );
        Ok(updated)
    }

    /// Applications that passed level 1 and still await a decision,
    /// oldest submission first.
    #[instrument(skip(self))]
    pub async fn pending_queue(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<Paginated<farmer_verification::Model>, ServiceError> {
        let query = farmer_verification::Entity::find()
            .filter(farmer_verification::Column::Level1Status.eq(LevelStatus::Approved))
            .filter(farmer_verification::Column::Level2Status.eq(LevelStatus::NotStarted))
            .order_by_asc(farmer_verification::Column::SubmittedAt);
        let paginator = query.paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page - 1).await?;
        Ok(Paginated::new(items, page, limit, total))
    }

    async fn find_record(
        &self,
        user_id: Uuid,
    ) -> Result<Option<farmer_verification::Model>, ServiceError> {
        let record = farmer_verification::Entity::find()
            .filter(farmer_verification::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?;
        Ok(record)
    }

    async fn require_record(
        &self,
        user_id: Uuid,
    ) -> Result<farmer_verification::Model, ServiceError> {
        self.find_record(user_id).await?.ok_or_else(|| {
            ServiceError::VerificationState(
                "Verification has not been initiated".to_string(),
            )
        })
    }
}

fn parse_step<T: serde::de::DeserializeOwned>(payload: serde_json::Value) -> Result<T, ServiceError> {
    serde_json::from_value(payload)
        .map_err(|e| ServiceError::ValidationError(format!("Invalid step payload: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn identity_step_parses_from_json() {
        let payload = json!({
            "full_name": "Ama Mensah",
            "id_type": "ghana_card",
            "id_number": "GHA-123456789-1"
        });
        let step: IdentityStep = parse_step(payload).unwrap();
        assert!(step.validate().is_ok());
        assert!(validation::is_valid_ghana_card(&step.id_number));
    }

    #[test]
    fn malformed_step_payload_is_a_validation_error() {
        let payload = json!({ "full_name": 42 });
        let err = parse_step::<IdentityStep>(payload).unwrap_err();
        assert!(matches!(err, ServiceError::ValidationError(_)));
    }

    #[test]
    fn consents_step_defaults_farm_visit_to_false() {
        let payload = json!({
            "consent_terms": true,
            "consent_data_sharing": true
        });
        let step: ConsentsStep = parse_step(payload).unwrap();
        assert!(!step.consent_farm_visit);
    }

    #[test]
    fn otp_input_requires_six_characters() {
        let input = VerifyOtpInput {
            code: "12345".to_string(),
        };
        assert!(input.validate().is_err());
        let input = VerifyOtpInput {
            code: "123456".to_string(),
        };
        assert!(input.validate().is_ok());
    }
}
