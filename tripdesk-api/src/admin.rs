use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, put},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info};
use tripdesk_admin::{export, DashboardSummary, ExportFormat, FilterMode, SortDirection, SortKey, SortSpec, ViewState};
use tripdesk_core::validation::validate_patch;
use tripdesk_core::{Booking, BookingPatch};

use crate::error::AppError;
use crate::middleware::{admin_auth_middleware, AdminClaims};
use crate::state::AppState;

// ============================================================================
// Routes
// ============================================================================

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/bookings", get(list_bookings))
        .route("/admin/bookings/export", get(export_bookings))
        .route("/admin/bookings/{id}", put(update_booking).delete(delete_booking))
        .route("/admin/summary", get(summary))
        .route_layer(middleware::from_fn_with_state(state, admin_auth_middleware))
}

// ============================================================================
// Handlers
// ============================================================================

fn booking_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, AppError> {
    path.map(|Path(id)| id).map_err(|e| {
        debug!("Bad booking id: {}", e);
        AppError::validation("Invalid booking id")
    })
}

/// All bookings, newest first.
async fn list_bookings(State(state): State<AppState>) -> Result<Json<Vec<Booking>>, AppError> {
    let rows = state.bookings.list_all().await?;
    Ok(Json(rows))
}

async fn update_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<AdminClaims>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<BookingPatch>, JsonRejection>,
) -> Result<Json<Booking>, AppError> {
    let id = booking_id(path)?;
    let Json(patch) = payload.map_err(|e| {
        debug!("Malformed patch body: {}", e);
        AppError::validation("Invalid booking data")
    })?;
    let patch = validate_patch(&patch).map_err(|fields| AppError::invalid_fields("Invalid booking data", fields))?;

    let updated = state.bookings.update(id, &patch).await?;
    info!(booking_id = id, admin_id = claims.admin_id, "Booking updated");
    Ok(Json(updated))
}

async fn delete_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<AdminClaims>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let id = booking_id(path)?;
    state.bookings.delete(id).await?;
    info!(booking_id = id, admin_id = claims.admin_id, "Booking deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct ExportQuery {
    #[serde(default = "default_format")]
    format: ExportFormat,
    #[serde(default)]
    filter: FilterMode,
    #[serde(default)]
    search: String,
    sort: Option<SortKey>,
    dir: Option<SortDirection>,
}

fn default_format() -> ExportFormat {
    ExportFormat::Csv
}

/// Exports every row the given view selects, ignoring pagination.
async fn export_bookings(
    State(state): State<AppState>,
    query: Result<Query<ExportQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(q) = query.map_err(|e| AppError::validation(format!("Invalid export parameters: {}", e.body_text())))?;

    let view = ViewState {
        filter: q.filter,
        search: q.search,
        sort: q.sort.map(|key| SortSpec { key, direction: q.dir.unwrap_or_default() }),
        page: 1,
    };

    let rows = state.bookings.list_all().await?;
    let selected = view.apply(&rows, Utc::now().date_naive());
    let doc = export(&selected, q.format)?;
    info!(rows = selected.len(), format = ?doc.format, "Bookings exported");

    Ok((
        [
            (header::CONTENT_TYPE, doc.content_type.to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", doc.file_name)),
        ],
        doc.bytes,
    ))
}

async fn summary(State(state): State<AppState>) -> Result<Json<DashboardSummary>, AppError> {
    let rows = state.bookings.list_all().await?;
    Ok(Json(DashboardSummary::from_rows(&rows, Utc::now().date_naive())))
}
