use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{error, info};

use crate::booking::{Booking, BookingInput};
use crate::notify::Notifier;
use crate::repository::BookingRepository;
use crate::validation::validate_booking;
use crate::{CoreError, CoreResult};

/// Orchestrates a new booking: validate, persist, then hand off a confirmation.
pub struct IntakeService {
    repo: Arc<dyn BookingRepository>,
    notifier: Arc<dyn Notifier>,
}

impl IntakeService {
    pub fn new(repo: Arc<dyn BookingRepository>, notifier: Arc<dyn Notifier>) -> Self {
        Self { repo, notifier }
    }

    /// Submits a raw booking as of `today`.
    ///
    /// A validation failure touches neither the store nor the notifier; a
    /// persistence failure skips the notifier. The notification is handed
    /// off without waiting, so its outcome never affects the result.
    pub async fn submit(&self, input: &BookingInput, today: NaiveDate) -> CoreResult<Booking> {
        let draft = validate_booking(input, today).map_err(CoreError::ValidationFailed)?;

        let booking = self.repo.insert(&draft).await.map_err(|e| {
            error!("Failed to insert booking: {}", e);
            e
        })?;

        info!(booking_id = booking.id, place = %booking.place_name, "Booking created");
        self.notifier.notify(&booking);

        Ok(booking)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::Numeric;
    use crate::memory::{InMemoryBookingRepository, RecordingNotifier};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn input() -> BookingInput {
        BookingInput {
            name: Some("Asha Rao".into()),
            email: Some("a@x.com".into()),
            phone: None,
            location: Some("Pune".into()),
            travel_date: Some("2027-01-01".into()),
            people: Some(Numeric::Int(2)),
            place_name: Some("Coorg".into()),
            price: Some(Numeric::Int(12000)),
        }
    }

    fn service() -> (IntakeService, Arc<InMemoryBookingRepository>, Arc<RecordingNotifier>) {
        let repo = Arc::new(InMemoryBookingRepository::new());
        let notifier = Arc::new(RecordingNotifier::default());
        (IntakeService::new(repo.clone(), notifier.clone()), repo, notifier)
    }

    #[tokio::test]
    async fn test_submit_persists_and_notifies() {
        let (svc, repo, notifier) = service();

        let booking = svc.submit(&input(), today()).await.unwrap();

        let rows = repo.list_all().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0], booking);
        assert_eq!(booking.name, "Asha Rao");
        assert_eq!(booking.people, 2);
        assert_eq!(notifier.sent(), vec![booking]);
    }

    #[tokio::test]
    async fn test_invalid_input_has_no_side_effects() {
        let (svc, repo, notifier) = service();
        let mut bad = input();
        bad.people = Some(Numeric::Int(0));

        let result = svc.submit(&bad, today()).await;

        assert!(matches!(result, Err(CoreError::ValidationFailed(_))));
        assert_eq!(repo.insert_calls(), 0);
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_persistence_failure_skips_notification() {
        let (svc, repo, notifier) = service();
        repo.fail_writes(true);

        let result = svc.submit(&input(), today()).await;

        assert!(matches!(result, Err(CoreError::Persistence(_))));
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_ids_are_unique_across_submissions() {
        let (svc, _repo, _notifier) = service();
        let a = svc.submit(&input(), today()).await.unwrap();
        let b = svc.submit(&input(), today()).await.unwrap();
        assert_ne!(a.id, b.id);
    }
}
