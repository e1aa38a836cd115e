use crate::booking::Booking;

/// Outbound confirmation channel for persisted bookings.
///
/// `notify` must return immediately: delivery happens elsewhere and its
/// failure never reaches the caller.
pub trait Notifier: Send + Sync {
    fn notify(&self, booking: &Booking);
}

/// Drops every notification.
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, booking: &Booking) {
        tracing::debug!(booking_id = booking.id, "Notification disabled, dropping");
    }
}
