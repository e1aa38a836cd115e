//! In-process repositories and a recording notifier.
//!
//! Used by tests across the workspace and for running the API without a
//! database. Failure switches let tests exercise the persistence error paths.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use crate::booking::{Admin, Booking, BookingDraft, BookingPatch};
use crate::notify::Notifier;
use crate::repository::{AdminRepository, BookingRepository};
use crate::{CoreError, CoreResult};

fn guard<T>(m: &Mutex<T>) -> CoreResult<MutexGuard<'_, T>> {
    m.lock().map_err(|_| CoreError::Persistence("in-memory store poisoned".into()))
}

#[derive(Default)]
struct Table {
    next_id: i64,
    rows: Vec<Booking>,
    deleted: Vec<i64>,
}

#[derive(Default)]
pub struct InMemoryBookingRepository {
    table: Mutex<Table>,
    fail_writes: AtomicBool,
    fail_deletes: AtomicBool,
    insert_calls: AtomicUsize,
    delete_calls: AtomicUsize,
}

impl InMemoryBookingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds rows as if they had been inserted earlier. Ids are kept as given.
    pub fn with_rows(rows: Vec<Booking>) -> Self {
        let next_id = rows.iter().map(|b| b.id).max().unwrap_or(0);
        Self {
            table: Mutex::new(Table { next_id, rows, deleted: Vec::new() }),
            ..Self::default()
        }
    }

    /// Makes `insert` and `update` fail with a persistence error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    /// Ids removed by successful deletes, in call order.
    pub fn deleted_ids(&self) -> Vec<i64> {
        self.table.lock().map(|t| t.deleted.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.table.lock().map(|t| t.rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BookingRepository for InMemoryBookingRepository {
    async fn insert(&self, draft: &BookingDraft) -> CoreResult<Booking> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CoreError::Persistence("insert rejected".into()));
        }
        let mut table = guard(&self.table)?;
        table.next_id += 1;
        let booking = Booking {
            id: table.next_id,
            name: draft.name.clone(),
            email: draft.email.clone(),
            phone: draft.phone.clone(),
            location: draft.location.clone(),
            travel_date: draft.travel_date,
            people: draft.people,
            place_name: draft.place_name.clone(),
            price: draft.price,
            created_at: Utc::now(),
        };
        table.rows.push(booking.clone());
        Ok(booking)
    }

    async fn list_all(&self) -> CoreResult<Vec<Booking>> {
        let table = guard(&self.table)?;
        let mut rows = table.rows.clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn update(&self, id: i64, patch: &BookingPatch) -> CoreResult<Booking> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CoreError::Persistence("update rejected".into()));
        }
        let mut table = guard(&self.table)?;
        let row = table.rows.iter_mut().find(|b| b.id == id).ok_or(CoreError::NotFound(id))?;
        row.apply_patch(patch);
        Ok(row.clone())
    }

    async fn delete(&self, id: i64) -> CoreResult<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(CoreError::Persistence("delete rejected".into()));
        }
        let mut table = guard(&self.table)?;
        let before = table.rows.len();
        table.rows.retain(|b| b.id != id);
        if table.rows.len() == before {
            return Err(CoreError::NotFound(id));
        }
        table.deleted.push(id);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryAdminRepository {
    admins: Vec<Admin>,
    lookups: AtomicUsize,
}

impl InMemoryAdminRepository {
    pub fn new(admins: Vec<Admin>) -> Self {
        Self { admins, lookups: AtomicUsize::new(0) }
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AdminRepository for InMemoryAdminRepository {
    async fn find_by_email(&self, email: &str) -> CoreResult<Option<Admin>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.admins.iter().find(|a| a.email == email).cloned())
    }
}

/// Keeps every booking it is asked to announce.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Booking>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Booking> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, booking: &Booking) {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(booking.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn draft(name: &str) -> BookingDraft {
        BookingDraft {
            name: name.into(),
            email: "a@x.com".into(),
            phone: None,
            location: "Pune".into(),
            travel_date: NaiveDate::from_ymd_opt(2027, 1, 1).unwrap(),
            people: 1,
            place_name: "Hampi".into(),
            price: 8500.0,
        }
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let repo = InMemoryBookingRepository::new();
        let first = repo.insert(&draft("First")).await.unwrap();
        let second = repo.insert(&draft("Second")).await.unwrap();
        assert_ne!(first.id, second.id);

        let rows = repo.list_all().await.unwrap();
        assert_eq!(rows[0].id, second.id);
        assert_eq!(rows[1].id, first.id);
    }

    #[tokio::test]
    async fn test_second_delete_is_not_found() {
        let repo = InMemoryBookingRepository::new();
        let b = repo.insert(&draft("Only")).await.unwrap();
        repo.delete(b.id).await.unwrap();
        assert!(matches!(repo.delete(b.id).await, Err(CoreError::NotFound(id)) if id == b.id));
        assert_eq!(repo.deleted_ids(), vec![b.id]);
    }

    #[tokio::test]
    async fn test_update_unknown_id() {
        let repo = InMemoryBookingRepository::new();
        let patch = BookingPatch { people: Some(3), ..Default::default() };
        assert!(matches!(repo.update(99, &patch).await, Err(CoreError::NotFound(99))));
    }
}
