use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use tripdesk_core::notify::Notifier;
use tripdesk_core::Booking;

use crate::mailer::{reference, Mailer};

/// Queues confirmations for the mail worker without ever blocking the request.
#[derive(Clone)]
pub struct MailDispatcher {
    tx: mpsc::Sender<Booking>,
}

impl Notifier for MailDispatcher {
    fn notify(&self, booking: &Booking) {
        if let Err(e) = self.tx.try_send(booking.clone()) {
            warn!(booking_id = booking.id, "Dropping confirmation mail: {}", e);
        }
    }
}

/// Starts the confirmation mail worker. It runs until every dispatcher is dropped.
pub fn spawn_mail_worker(mailer: Arc<dyn Mailer>, capacity: usize) -> (MailDispatcher, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(capacity);
    let handle = tokio::spawn(run_mail_worker(rx, mailer));
    (MailDispatcher { tx }, handle)
}

async fn run_mail_worker(mut rx: mpsc::Receiver<Booking>, mailer: Arc<dyn Mailer>) {
    info!("Mail worker started");
    while let Some(booking) = rx.recv().await {
        match mailer.send_confirmation(&booking).await {
            Ok(()) => info!(booking_id = booking.id, "Confirmation sent for {}", reference(&booking)),
            Err(e) => error!(booking_id = booking.id, "Failed to send confirmation: {}", e),
        }
    }
    info!("Mail worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{NaiveDate, Utc};
    use std::sync::Mutex;
    use tokio::sync::Notify;

    use crate::mailer::MailError;

    #[derive(Default)]
    struct Captured {
        sent: Mutex<Vec<i64>>,
        gate: Notify,
    }

    #[async_trait]
    impl Mailer for Captured {
        async fn send_confirmation(&self, booking: &Booking) -> Result<(), MailError> {
            self.gate.notified().await;
            self.sent.lock().unwrap().push(booking.id);
            Ok(())
        }
    }

    fn booking(id: i64) -> Booking {
        Booking {
            id,
            name: "Asha Rao".into(),
            email: "a@x.com".into(),
            phone: None,
            location: "Pune".into(),
            travel_date: NaiveDate::from_ymd_opt(2027, 1, 1).unwrap(),
            people: 2,
            place_name: "Coorg".into(),
            price: 12000.0,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_notify_returns_before_delivery() {
        let mailer = Arc::new(Captured::default());
        let (dispatcher, handle) = spawn_mail_worker(mailer.clone(), 4);

        dispatcher.notify(&booking(1));
        assert!(mailer.sent.lock().unwrap().is_empty());

        mailer.gate.notify_one();
        drop(dispatcher);
        handle.await.unwrap();
        assert_eq!(*mailer.sent.lock().unwrap(), vec![1]);
    }

    /// Fails every booking whose id is in `reject`; records the rest.
    #[derive(Default)]
    struct Flaky {
        reject: Vec<i64>,
        attempts: Mutex<Vec<i64>>,
        delivered: Mutex<Vec<i64>>,
    }

    #[async_trait]
    impl Mailer for Flaky {
        async fn send_confirmation(&self, booking: &Booking) -> Result<(), MailError> {
            self.attempts.lock().unwrap().push(booking.id);
            if self.reject.contains(&booking.id) {
                let bad: Result<lettre::Address, _> = "not an address".parse();
                return Err(MailError::Address(bad.unwrap_err()));
            }
            self.delivered.lock().unwrap().push(booking.id);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_failed_send_is_swallowed_and_worker_keeps_going() {
        let mailer = Arc::new(Flaky { reject: vec![1], ..Default::default() });
        let (dispatcher, handle) = spawn_mail_worker(mailer.clone(), 4);

        dispatcher.notify(&booking(1));
        dispatcher.notify(&booking(2));
        drop(dispatcher);
        handle.await.unwrap();

        assert_eq!(*mailer.attempts.lock().unwrap(), vec![1, 2]);
        assert_eq!(*mailer.delivered.lock().unwrap(), vec![2]);
    }

    #[tokio::test]
    async fn test_full_queue_drops_instead_of_blocking() {
        let (tx, mut rx) = mpsc::channel(1);
        let dispatcher = MailDispatcher { tx };
        dispatcher.notify(&booking(1));
        dispatcher.notify(&booking(2));

        assert_eq!(rx.try_recv().unwrap().id, 1);
        assert!(rx.try_recv().is_err());
    }
}
