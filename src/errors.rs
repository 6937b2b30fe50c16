use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

fn current_request_id() -> Option<String> {
    crate::request_id::current_request_id().map(|rid| rid.as_str().to_string())
}

/// Error payload nested inside the uniform response envelope.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "code": "INSUFFICIENT_STOCK",
    "message": "Insufficient stock for 'Yellow Maize 50kg'",
    "details": null
}))]
pub struct ErrorBody {
    /// Stable machine-readable code. Clients branch on this, never on `message`.
    #[schema(example = "INSUFFICIENT_STOCK")]
    pub code: String,
    /// Human-readable description
    #[schema(example = "Insufficient stock for 'Yellow Maize 50kg'")]
    pub message: String,
    /// Additional detail (per-field validation errors, offending items)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Envelope returned for every failed request.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "success": false,
    "error": {
        "code": "NOT_FOUND",
        "message": "Order 550e8400-e29b-41d4-a716-446655440000 not found"
    },
    "request_id": "req-abc123xyz",
    "timestamp": "2025-08-25T10:30:00.000Z"
}))]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorBody,
    /// Unique request identifier for support and debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "req-abc123xyz")]
    pub request_id: Option<String>,
    /// ISO 8601 timestamp when the error occurred
    #[schema(example = "2025-08-25T10:30:00.000Z")]
    pub timestamp: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::error::DbErr),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    ValidationError(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid authentication token")]
    InvalidToken,

    #[error("Authentication token has expired")]
    TokenExpired,

    #[error("Invalid webhook signature")]
    InvalidSignature,

    #[error("{0}")]
    Forbidden(String),

    #[error("An account with this email already exists")]
    EmailInUse,

    #[error("{0}")]
    Conflict(String),

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Address not found or not usable for delivery")]
    InvalidAddress,

    #[error("Insufficient stock for '{product}'")]
    InsufficientStock { product: String },

    #[error("Order in status '{status}' cannot be cancelled")]
    InvalidOrderStatus { status: String },

    #[error("Cannot move from '{from}' to '{to}'")]
    InvalidTransition { from: String, to: String },

    #[error("Insufficient warehouse inventory for this removal")]
    InsufficientInventory,

    #[error("Verification code has expired")]
    OtpExpired,

    #[error("Maximum verification attempts exceeded, request a new code")]
    OtpMaxAttempts,

    #[error("Incorrect verification code")]
    OtpInvalid,

    #[error("{0}")]
    VerificationState(String),

    #[error("Account temporarily locked, try again later")]
    AccountLocked { retry_after_secs: i64 },

    #[error("Too many code requests, try again later")]
    OtpRateLimited { retry_after_secs: i64 },

    #[error("Event error: {0}")]
    EventError(String),

    #[error("Hash error: {0}")]
    HashError(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Internal error: {0}")]
    Other(#[from] anyhow::Error),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl ServiceError {
    /// HTTP status for this error. Single source of truth for the mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ValidationError(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_)
            | Self::InvalidCredentials
            | Self::InvalidToken
            | Self::TokenExpired
            | Self::InvalidSignature => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::EmailInUse | Self::Conflict(_) => StatusCode::CONFLICT,
            Self::EmptyCart
            | Self::InvalidAddress
            | Self::InsufficientStock { .. }
            | Self::InvalidOrderStatus { .. }
            | Self::InvalidTransition { .. }
            | Self::InsufficientInventory
            | Self::OtpExpired
            | Self::OtpMaxAttempts
            | Self::OtpInvalid
            | Self::VerificationState(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::AccountLocked { .. } | Self::OtpRateLimited { .. } => {
                StatusCode::TOO_MANY_REQUESTS
            }
            Self::DatabaseError(_)
            | Self::EventError(_)
            | Self::HashError(_)
            | Self::InternalError(_)
            | Self::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code carried in the envelope. Clients and tests
    /// branch on these, never on message strings.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::InvalidSignature => "INVALID_SIGNATURE",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::EmailInUse => "EMAIL_IN_USE",
            Self::Conflict(_) => "CONFLICT",
            Self::EmptyCart => "EMPTY_CART",
            Self::InvalidAddress => "INVALID_ADDRESS",
            Self::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            Self::InvalidOrderStatus { .. } => "INVALID_ORDER_STATUS",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::InsufficientInventory => "INSUFFICIENT_INVENTORY",
            Self::OtpExpired => "OTP_EXPIRED",
            Self::OtpMaxAttempts => "OTP_MAX_ATTEMPTS",
            Self::OtpInvalid => "OTP_INVALID",
            Self::VerificationState(_) => "VERIFICATION_STATE",
            Self::AccountLocked { .. } => "ACCOUNT_LOCKED",
            Self::OtpRateLimited { .. } => "OTP_RATE_LIMITED",
            Self::EventError(_) | Self::HashError(_) | Self::InternalError(_) | Self::Other(_) => {
                "INTERNAL_ERROR"
            }
        }
    }

    /// Message suitable for HTTP responses. Internal errors collapse to a
    /// generic message so implementation details never leak.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".to_string(),
            Self::EventError(_) | Self::HashError(_) | Self::InternalError(_) | Self::Other(_) => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        }
    }

    fn retry_after_secs(&self) -> Option<i64> {
        match self {
            Self::AccountLocked { retry_after_secs }
            | Self::OtpRateLimited { retry_after_secs } => Some((*retry_after_secs).max(1)),
            _ => None,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let err = ErrorResponse {
            success: false,
            error: ErrorBody {
                code: self.error_code().to_string(),
                message: self.response_message(),
                details: None,
            },
            request_id: current_request_id(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        let mut response = (status, Json(err)).into_response();
        if let Some(secs) = self.retry_after_secs() {
            if let Ok(value) = secs.to_string().parse() {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}
