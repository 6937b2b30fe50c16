/*!
 * # Authentication and Authorization
 *
 * JWT-based authentication for the FarmConnect API. The
 * [`AuthService`] issues and validates HS256 tokens carrying the
 * user's role and verification status, and the middleware in this
 * module guards routes by requiring a valid token (and optionally a
 * specific role).
 *
 * Handlers read the authenticated caller from request extensions as
 * an [`AuthUser`].
 */

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::Response,
    Router,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::entities::user::{self, UserRole, VerificationStatus};
use crate::errors::ServiceError;

pub mod rate_limit;

/// JWT claims embedded in every access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Role at the time the token was issued
    pub role: UserRole,
    /// Verification status at the time the token was issued
    pub verification: VerificationStatus,
    /// JWT ID (unique per token)
    pub jti: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
    /// Not valid before (Unix timestamp)
    pub nbf: i64,
    /// Issuer
    pub iss: String,
    /// Audience
    pub aud: String,
}

/// Authentication configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Secret key for signing tokens
    pub jwt_secret: String,
    /// Token lifetime
    pub token_expiration: Duration,
    /// Issuer claim
    pub issuer: String,
    /// Audience claim
    pub audience: String,
}

impl AuthConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            jwt_secret: config.jwt_secret.clone(),
            token_expiration: Duration::from_secs(config.jwt_expiration as u64),
            issuer: config.auth_issuer.clone(),
            audience: config.auth_audience.clone(),
        }
    }
}

/// An access token handed back to a client after login or signup.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct IssuedToken {
    pub access_token: String,
    pub token_type: String,
    /// Seconds until the token expires
    pub expires_in: u64,
}

/// Issues and validates access tokens.
#[derive(Clone)]
pub struct AuthService {
    config: AuthConfig,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Issue an access token for the given user.
    pub fn issue_token(&self, user: &user::Model) -> Result<IssuedToken, ServiceError> {
        let now = Utc::now().timestamp();
        let expiration = self.config.token_expiration.as_secs();

        let claims = Claims {
            sub: user.id.to_string(),
            role: user.role,
            verification: user.verification_status,
            jti: Uuid::new_v4().to_string(),
            iat: now,
            exp: now + expiration as i64,
            nbf: now,
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| ServiceError::InternalError(format!("Failed to sign token: {}", e)))?;

        Ok(IssuedToken {
            access_token: token,
            token_type: "Bearer".to_string(),
            expires_in: expiration,
        })
    }

    /// Validate a token and return its claims. Checks signature, expiry,
    /// issuer and audience.
    pub fn validate_token(&self, token: &str) -> Result<Claims, ServiceError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_audience(&[&self.config.audience]);

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => ServiceError::TokenExpired,
            _ => ServiceError::InvalidToken,
        })?;

        Ok(token_data.claims)
    }
}

/// The authenticated caller, inserted into request extensions by
/// [`auth_middleware`].
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: UserRole,
    pub verification_status: VerificationStatus,
    /// JWT ID of the presented token
    pub token_id: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Whether the caller holds the given role. Admins pass every
    /// role check.
    pub fn has_role(&self, role: UserRole) -> bool {
        self.role == role || self.is_admin()
    }
}

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| ServiceError::Unauthorized("Authentication required".to_string()))
    }
}

/// Extract and validate the bearer token from request headers.
async fn extract_auth_from_headers(
    auth_service: &AuthService,
    headers: &HeaderMap,
) -> Result<AuthUser, ServiceError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(ServiceError::Unauthorized(
            "Missing authorization header".to_string(),
        ))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(ServiceError::Unauthorized(
            "Invalid authorization header format".to_string(),
        ))?;

    let claims = auth_service.validate_token(token)?;

    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| ServiceError::InvalidToken)?;

    Ok(AuthUser {
        id: user_id,
        role: claims.role,
        verification_status: claims.verification,
        token_id: claims.jti,
    })
}

/// Middleware that requires a valid access token.
///
/// Expects an `Arc<AuthService>` in request extensions, placed there
/// by an `Extension` layer at router construction.
pub async fn auth_middleware(
    mut request: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ServiceError> {
    let auth_service = request
        .extensions()
        .get::<Arc<AuthService>>()
        .cloned()
        .ok_or_else(|| {
            ServiceError::InternalError("Auth service not configured".to_string())
        })?;

    let auth_user = extract_auth_from_headers(&auth_service, request.headers()).await?;

    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

/// Middleware that requires a specific role. Must run after
/// [`auth_middleware`]; admins pass every role check.
pub async fn role_middleware(
    State(required_role): State<UserRole>,
    request: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ServiceError> {
    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or(ServiceError::Unauthorized(
            "Authentication required".to_string(),
        ))?;

    if !auth_user.has_role(required_role) {
        return Err(ServiceError::Forbidden(format!(
            "Requires {} role",
            required_role
        )));
    }

    Ok(next.run(request).await)
}

/// Router extensions for protecting route groups.
pub trait AuthRouterExt<S> {
    /// Require a valid access token on every route.
    fn with_auth(self) -> Self;

    /// Require a valid access token and the given role on every
    /// route.
    fn with_role(self, role: UserRole) -> Self;
}

impl<S> AuthRouterExt<S> for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_auth(self) -> Self {
        self.layer(axum::middleware::from_fn(auth_middleware))
    }

    fn with_role(self, role: UserRole) -> Self {
        // Layers run outermost-last, so adding auth after the role
        // layer makes auth run first.
        self.layer(axum::middleware::from_fn_with_state(role, role_middleware))
            .with_auth()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_service() -> AuthService {
        AuthService::new(AuthConfig {
            jwt_secret: "test-secret-key-for-farmconnect-auth".to_string(),
            token_expiration: Duration::from_secs(3600),
            issuer: "farmconnect-api".to_string(),
            audience: "farmconnect-clients".to_string(),
        })
    }

    fn test_user(role: UserRole) -> user::Model {
        user::Model {
            id: Uuid::new_v4(),
            email: "ama@example.com".to_string(),
            phone: "+233201234567".to_string(),
            full_name: "Ama Mensah".to_string(),
            password_hash: "hash".to_string(),
            role,
            verification_status: VerificationStatus::Unverified,
            failed_login_attempts: 0,
            locked_until: None,
            deleted_at: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn issued_token_round_trips() {
        let service = test_service();
        let user = test_user(UserRole::Farmer);

        let issued = service.issue_token(&user).unwrap();
        assert_eq!(issued.token_type, "Bearer");
        assert_eq!(issued.expires_in, 3600);

        let claims = service.validate_token(&issued.access_token).unwrap();
        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.role, UserRole::Farmer);
        assert_eq!(claims.verification, VerificationStatus::Unverified);
        assert_eq!(claims.iss, "farmconnect-api");
    }

    #[test]
    fn garbage_token_is_rejected() {
        let service = test_service();
        let err = service.validate_token("not-a-jwt").unwrap_err();
        assert!(matches!(err, ServiceError::InvalidToken));
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let service = test_service();
        let other = AuthService::new(AuthConfig {
            jwt_secret: "a-completely-different-secret-key".to_string(),
            token_expiration: Duration::from_secs(3600),
            issuer: "farmconnect-api".to_string(),
            audience: "farmconnect-clients".to_string(),
        });

        let issued = other.issue_token(&test_user(UserRole::Buyer)).unwrap();
        let err = service.validate_token(&issued.access_token).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidToken));
    }

    #[test]
    fn admin_passes_any_role_check() {
        let admin = AuthUser {
            id: Uuid::new_v4(),
            role: UserRole::Admin,
            verification_status: VerificationStatus::Approved,
            token_id: "jti".to_string(),
        };
        assert!(admin.has_role(UserRole::Farmer));
        assert!(admin.has_role(UserRole::Warehouse));

        let buyer = AuthUser {
            id: Uuid::new_v4(),
            role: UserRole::Buyer,
            verification_status: VerificationStatus::Unverified,
            token_id: "jti".to_string(),
        };
        assert!(buyer.has_role(UserRole::Buyer));
        assert!(!buyer.has_role(UserRole::Farmer));
    }
}
