use std::sync::Arc;

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    middleware,
    routing::post,
    Json, Router,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use once_cell::sync::Lazy;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use tripdesk_core::pii::{mask_email, Masked};
use tripdesk_core::repository::AdminRepository;
use tripdesk_core::validation::validate_credentials;
use tripdesk_core::{Admin, CoreError, ValidationErrors};

use crate::error::AppError;
use crate::middleware::{login_rate_limit_middleware, AdminClaims};
use crate::state::{AppState, AuthConfig};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Email and password are required")]
    MissingCredentials(ValidationErrors),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Invalid or expired token")]
    InvalidToken,
    #[error("Token encoding failed: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error("Password hashing failed: {0}")]
    Hash(String),
    #[error(transparent)]
    Store(#[from] CoreError),
}

// Verified against when the email is unknown so both rejections cost the same.
static DUMMY_HASH: Lazy<Option<String>> = Lazy::new(|| hash_password("tripdesk-dummy-password").ok());

/// Produces a PHC string suitable for the `admins.password` column.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AuthError::Hash(e.to_string()))
}

/// Checks `password` against a stored PHC string. Cost parameters come from the hash itself.
pub fn verify_password(stored: &str, password: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(stored).map_err(|e| AuthError::Hash(e.to_string()))?;
    Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
}

pub struct AuthService {
    admins: Arc<dyn AdminRepository>,
    secret: Masked<String>,
    token_ttl: Duration,
}

impl AuthService {
    pub fn new(admins: Arc<dyn AdminRepository>, config: AuthConfig) -> Self {
        Lazy::force(&DUMMY_HASH);
        Self {
            admins,
            secret: config.secret,
            token_ttl: Duration::seconds(config.expiration as i64),
        }
    }

    /// Exchanges admin credentials for a signed token.
    ///
    /// Unknown email and wrong password are indistinguishable to the caller.
    pub async fn login(&self, email: &str, password: &str) -> Result<String, AuthError> {
        validate_credentials(email, password).map_err(AuthError::MissingCredentials)?;
        let email = email.trim();

        let admin = self.admins.find_by_email(email).await?;
        let stored = admin.as_ref().map(|a| a.password_hash.clone());
        let password = password.to_owned();

        let matches = tokio::task::spawn_blocking(move || match stored {
            Some(hash) => verify_password(&hash, &password),
            None => match DUMMY_HASH.as_deref() {
                Some(dummy) => verify_password(dummy, &password).map(|_| false),
                None => Ok(false),
            },
        })
        .await
        .map_err(|e| AuthError::Hash(e.to_string()))??;

        match admin {
            Some(admin) if matches => {
                info!(admin_id = admin.id, "Admin logged in");
                self.issue(&admin)
            }
            _ => {
                warn!(email = %mask_email(email), "Rejected admin login");
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    pub fn issue(&self, admin: &Admin) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = AdminClaims {
            sub: admin.id.to_string(),
            admin_id: admin.id,
            admin_email: admin.email.clone(),
            iat: now.timestamp() as usize,
            exp: (now + self.token_ttl).timestamp() as usize,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.expose().as_bytes()),
        )?;
        Ok(token)
    }

    /// Accepts only tokens signed with this service's secret and not yet expired.
    /// No clock leeway: a token is rejected from the second its `exp` passes.
    pub fn verify(&self, token: &str) -> Result<AdminClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<AdminClaims>(
            token,
            &DecodingKey::from_secret(self.secret.expose().as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| {
            debug!("Rejected admin token: {}", e);
            AuthError::InvalidToken
        })
    }
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Serialize)]
struct AuthResponse {
    token: String,
}

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/login", post(login))
        .route_layer(middleware::from_fn_with_state(state, login_rate_limit_middleware))
}

async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AppError> {
    let Json(req) = payload.map_err(|e| {
        debug!("Malformed login body: {}", e);
        AppError::validation("Email and password are required")
    })?;

    let token = state.auth.login(&req.email, &req.password).await?;
    Ok(Json(AuthResponse { token }))
}
