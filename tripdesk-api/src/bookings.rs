use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use chrono::Utc;
use tracing::debug;
use tripdesk_core::{Booking, BookingInput, CoreError};

use crate::{error::AppError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route("/bookings", post(create_booking))
}

async fn create_booking(
    State(state): State<AppState>,
    payload: Result<Json<BookingInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let Json(input) = payload.map_err(|e| {
        debug!("Malformed booking body: {}", e);
        AppError::validation("Invalid booking data")
    })?;

    let today = Utc::now().date_naive();
    let booking = state.intake.submit(&input, today).await.map_err(|e| match e {
        CoreError::Persistence(detail) => AppError::OperationFailed { public: "Booking failed", detail },
        other => other.into(),
    })?;

    Ok((StatusCode::CREATED, Json(booking)))
}
