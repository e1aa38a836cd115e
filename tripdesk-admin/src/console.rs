use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use tripdesk_core::repository::BookingRepository;
use tripdesk_core::validation::validate_patch;
use tripdesk_core::{Booking, BookingPatch, CoreError, ValidationErrors};

use crate::export::{export, ExportDocument, ExportError, ExportFormat};
use crate::summary::DashboardSummary;
use crate::view::{PageView, ViewState};

/// How long a deleted row can be restored before the store delete fires.
pub const UNDO_WINDOW: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    #[error("Booking {0} is not in the current collection")]
    NotInView(i64),
    #[error("Invalid edit: {0}")]
    Invalid(ValidationErrors),
    #[error(transparent)]
    Store(#[from] CoreError),
}

struct PendingRemoval {
    booking: Booking,
    timer: JoinHandle<()>,
}

type PendingMap = Arc<Mutex<HashMap<i64, PendingRemoval>>>;

/// One operator's working copy of the booking collection.
///
/// All view interactions run against the snapshot taken by `load`/`refresh`.
/// Deletes are optimistic: the row leaves the snapshot at once and the store
/// delete is deferred by the undo window. The pending map is the single
/// authority on whether that deferred delete may still run: whichever of
/// `undo` or the timer removes the entry first wins.
pub struct AdminConsole {
    repo: Arc<dyn BookingRepository>,
    rows: Vec<Booking>,
    /// Position of each id in the snapshot, used to restore undone rows in place.
    ordinals: HashMap<i64, usize>,
    view: ViewState,
    pending: PendingMap,
    undo_window: Duration,
}

impl AdminConsole {
    pub async fn load(repo: Arc<dyn BookingRepository>) -> Result<Self, ConsoleError> {
        let rows = repo.list_all().await?;
        Ok(Self::with_rows(repo, rows))
    }

    pub fn with_rows(repo: Arc<dyn BookingRepository>, rows: Vec<Booking>) -> Self {
        let ordinals = rows.iter().enumerate().map(|(i, b)| (b.id, i)).collect();
        Self {
            repo,
            rows,
            ordinals,
            view: ViewState::default(),
            pending: Arc::new(Mutex::new(HashMap::new())),
            undo_window: UNDO_WINDOW,
        }
    }

    pub fn with_undo_window(mut self, window: Duration) -> Self {
        self.undo_window = window;
        self
    }

    /// Re-reads the store. Rows still pending removal stay hidden.
    pub async fn refresh(&mut self) -> Result<(), ConsoleError> {
        let fresh = self.repo.list_all().await?;
        let pending = self.pending.lock().await;
        self.ordinals = fresh.iter().enumerate().map(|(i, b)| (b.id, i)).collect();
        self.rows = fresh.into_iter().filter(|b| !pending.contains_key(&b.id)).collect();
        Ok(())
    }

    pub fn rows(&self) -> &[Booking] {
        &self.rows
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut ViewState {
        &mut self.view
    }

    pub fn visible(&self, today: NaiveDate) -> PageView<'_> {
        self.view.visible(&self.rows, today)
    }

    /// Exports the filtered, searched and sorted rows, ignoring pagination.
    pub fn export(&self, format: ExportFormat, today: NaiveDate) -> Result<ExportDocument, ExportError> {
        export(&self.view.apply(&self.rows, today), format)
    }

    pub fn summary(&self, today: NaiveDate) -> DashboardSummary {
        DashboardSummary::from_rows(&self.rows, today)
    }

    pub async fn is_pending(&self, id: i64) -> bool {
        self.pending.lock().await.contains_key(&id)
    }

    pub async fn pending_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.pending.lock().await.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Removes `id` from the snapshot and schedules the store delete.
    ///
    /// Returns `Ok(false)` when the row is already pending removal.
    pub async fn delete(&mut self, id: i64) -> Result<bool, ConsoleError> {
        let mut pending = self.pending.lock().await;
        if pending.contains_key(&id) {
            return Ok(false);
        }
        let pos = self.rows.iter().position(|b| b.id == id).ok_or(ConsoleError::NotInView(id))?;
        let booking = self.rows.remove(pos);

        let timer = tokio::spawn(commit_after(
            Arc::clone(&self.pending),
            Arc::clone(&self.repo),
            id,
            self.undo_window,
        ));
        pending.insert(id, PendingRemoval { booking, timer });
        info!(booking_id = id, "Booking marked for removal");
        Ok(true)
    }

    /// Deletes every id in `ids` that is currently visible. Returns how many were scheduled.
    pub async fn delete_many(&mut self, ids: &[i64]) -> usize {
        let mut scheduled = 0;
        for &id in ids {
            match self.delete(id).await {
                Ok(true) => scheduled += 1,
                Ok(false) => {}
                Err(e) => warn!(booking_id = id, "Skipping delete: {}", e),
            }
        }
        scheduled
    }

    /// Restores a pending row to its original relative position and cancels
    /// the store delete. Returns `false` if the window already closed.
    pub async fn undo(&mut self, id: i64) -> bool {
        let Some(entry) = self.pending.lock().await.remove(&id) else {
            return false;
        };
        entry.timer.abort();

        let ordinal = self.ordinals.get(&id).copied().unwrap_or(usize::MAX);
        let pos = self
            .rows
            .iter()
            .position(|b| self.ordinals.get(&b.id).copied().unwrap_or(usize::MAX) > ordinal)
            .unwrap_or(self.rows.len());
        self.rows.insert(pos, entry.booking);
        info!(booking_id = id, "Booking removal undone");
        true
    }

    /// Sends `patch` to the store and, only on success, applies exactly the
    /// submitted fields to the local row.
    pub async fn edit(&mut self, id: i64, patch: &BookingPatch) -> Result<&Booking, ConsoleError> {
        let patch = validate_patch(patch).map_err(ConsoleError::Invalid)?;
        let pos = self.rows.iter().position(|b| b.id == id).ok_or(ConsoleError::NotInView(id))?;

        if let Err(e) = self.repo.update(id, &patch).await {
            warn!(booking_id = id, "Edit failed: {}", e);
            return Err(e.into());
        }

        self.rows[pos].apply_patch(&patch);
        Ok(&self.rows[pos])
    }
}

async fn commit_after(
    pending: PendingMap,
    repo: Arc<dyn BookingRepository>,
    id: i64,
    window: Duration,
) {
    tokio::time::sleep(window).await;

    if pending.lock().await.remove(&id).is_none() {
        return;
    }

    match repo.delete(id).await {
        Ok(()) => info!(booking_id = id, "Booking deleted"),
        // The row is already gone from the operator's view; nothing to restore.
        Err(e) => error!(booking_id = id, "Deferred delete failed: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tripdesk_core::memory::InMemoryBookingRepository;

    fn booking(id: i64, name: &str) -> Booking {
        Booking {
            id,
            name: name.into(),
            email: format!("{}@mail.com", name.to_lowercase()),
            phone: None,
            location: "Mysuru".into(),
            travel_date: NaiveDate::from_ymd_opt(2026, 11, 1).unwrap(),
            people: 2,
            place_name: "Chikmagalur".into(),
            price: 11000.0,
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, id as u32).unwrap(),
        }
    }

    async fn console() -> (AdminConsole, Arc<InMemoryBookingRepository>) {
        let repo = Arc::new(InMemoryBookingRepository::with_rows(vec![
            booking(1, "Anu"),
            booking(2, "Bala"),
            booking(3, "Chitra"),
            booking(4, "Deepak"),
        ]));
        let console = AdminConsole::load(repo.clone()).await.unwrap();
        (console, repo)
    }

    fn ids(console: &AdminConsole) -> Vec<i64> {
        console.rows().iter().map(|b| b.id).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_undo_within_window_restores_and_skips_store() {
        let (mut console, repo) = console().await;
        let before = ids(&console);

        assert!(console.delete(3).await.unwrap());
        assert!(!ids(&console).contains(&3));
        assert!(console.is_pending(3).await);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(console.undo(3).await);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(ids(&console), before);
        assert_eq!(repo.delete_calls(), 0);
        assert!(!console.is_pending(3).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_elapses_and_store_delete_fires_once() {
        let (mut console, repo) = console().await;

        console.delete(2).await.unwrap();
        tokio::time::sleep(Duration::from_secs(6)).await;
        tokio::task::yield_now().await;

        assert_eq!(repo.delete_calls(), 1);
        assert_eq!(repo.deleted_ids(), vec![2]);
        assert!(!ids(&console).contains(&2));
        assert!(!console.undo(2).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_redelete_of_pending_row_is_noop() {
        let (mut console, repo) = console().await;

        assert!(console.delete(1).await.unwrap());
        assert!(!console.delete(1).await.unwrap());

        tokio::time::sleep(Duration::from_secs(6)).await;
        tokio::task::yield_now().await;
        assert_eq!(repo.delete_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_store_delete_does_not_restore_row() {
        let (mut console, repo) = console().await;
        repo.fail_deletes(true);

        console.delete(4).await.unwrap();
        tokio::time::sleep(Duration::from_secs(6)).await;
        tokio::task::yield_now().await;

        assert_eq!(repo.delete_calls(), 1);
        assert!(!ids(&console).contains(&4));
        assert!(!console.is_pending(4).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_multi_delete_undo_restores_original_positions() {
        let (mut console, repo) = console().await;
        let before = ids(&console);

        assert_eq!(console.delete_many(&[2, 3, 99]).await, 2);
        assert_eq!(console.pending_ids().await, vec![2, 3]);

        // Undo in reverse order; positions still come out right.
        assert!(console.undo(3).await);
        assert!(console.undo(2).await);
        assert_eq!(ids(&console), before);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(repo.delete_calls(), 0);
    }

    #[tokio::test]
    async fn test_delete_unknown_row() {
        let (mut console, _repo) = console().await;
        assert!(matches!(console.delete(42).await, Err(ConsoleError::NotInView(42))));
    }

    #[tokio::test]
    async fn test_edit_patches_only_submitted_fields() {
        let (mut console, repo) = console().await;
        let original = console.rows().iter().find(|b| b.id == 2).cloned().unwrap();

        let patch = BookingPatch { people: Some(5), price: Some(13000.0), ..Default::default() };
        let updated = console.edit(2, &patch).await.unwrap().clone();

        assert_eq!(updated.people, 5);
        assert_eq!(updated.price, 13000.0);
        assert_eq!(updated.name, original.name);
        assert_eq!(updated.travel_date, original.travel_date);

        let stored = repo.list_all().await.unwrap().into_iter().find(|b| b.id == 2).unwrap();
        assert_eq!(stored.people, 5);
    }

    #[tokio::test]
    async fn test_failed_edit_leaves_collection_unchanged() {
        let (mut console, repo) = console().await;
        let before = console.rows().to_vec();
        repo.fail_writes(true);

        let patch = BookingPatch { name: Some("Someone Else".into()), ..Default::default() };
        let result = console.edit(1, &patch).await;

        assert!(matches!(result, Err(ConsoleError::Store(CoreError::Persistence(_)))));
        assert_eq!(console.rows(), before.as_slice());
    }

    #[tokio::test]
    async fn test_invalid_edit_rejected_locally() {
        let (mut console, _repo) = console().await;
        let patch = BookingPatch { people: Some(0), ..Default::default() };
        assert!(matches!(console.edit(1, &patch).await, Err(ConsoleError::Invalid(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_keeps_pending_rows_hidden() {
        let (mut console, _repo) = console().await;
        console.delete(1).await.unwrap();
        console.refresh().await.unwrap();
        assert!(!ids(&console).contains(&1));
        assert_eq!(console.rows().len(), 3);
    }

    #[tokio::test]
    async fn test_export_ignores_pagination_and_keeps_state() {
        let (mut console, _repo) = console().await;
        console.view_mut().set_search("chitra");
        let view_before = console.view().clone();

        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let doc = console.export(ExportFormat::Csv, today).unwrap();
        let text = String::from_utf8(doc.bytes).unwrap();

        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("Chitra"));
        assert_eq!(console.view(), &view_before);
        assert_eq!(console.rows().len(), 4);
    }
}
