use async_trait::async_trait;

use crate::booking::{Admin, Booking, BookingDraft, BookingPatch};
use crate::CoreResult;

/// Typed access to the bookings table.
///
/// Each operation is atomic for a single row. Implementations must bind
/// parameters rather than interpolate input into queries, and must surface
/// timeouts as `CoreError::Persistence` instead of blocking.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Inserts a draft, returning the row with its assigned `id` and `created_at`.
    async fn insert(&self, draft: &BookingDraft) -> CoreResult<Booking>;

    /// The full collection, newest first.
    async fn list_all(&self) -> CoreResult<Vec<Booking>>;

    /// Applies only the supplied fields. `CoreError::NotFound` if no row has `id`.
    async fn update(&self, id: i64, patch: &BookingPatch) -> CoreResult<Booking>;

    /// Removes the row. A second delete of the same id yields `CoreError::NotFound`.
    async fn delete(&self, id: i64) -> CoreResult<()>;
}

/// Read-only access to pre-provisioned administrators.
#[async_trait]
pub trait AdminRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> CoreResult<Option<Admin>>;
}
