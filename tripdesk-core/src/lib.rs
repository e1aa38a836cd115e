pub mod booking;
pub mod validation;
pub mod repository;
pub mod notify;
pub mod intake;
pub mod memory;
pub mod pii;

pub use booking::{Admin, Booking, BookingDraft, BookingInput, BookingPatch, Numeric};
pub use validation::ValidationErrors;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationFailed(ValidationErrors),
    #[error("Booking not found: {0}")]
    NotFound(i64),
    #[error("Persistence error: {0}")]
    Persistence(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
