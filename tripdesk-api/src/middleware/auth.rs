use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AdminClaims {
    pub sub: String,
    pub admin_id: i64,
    pub admin_email: String,
    pub iat: usize,
    pub exp: usize,
}

/// Rejects requests without a valid admin bearer token and exposes the
/// decoded claims to handlers through the request extensions.
pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::AuthenticationError("Missing bearer token".into()))?;

    let claims = state.auth.verify(token)?;
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
