//! Debounced live sync of a report's index fields.
//!
//! One slot per sync: scheduling aborts the pending task and spawns a new
//! one, so only the last update before a quiet period is written.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use super::{ChangeFeed, ReportEvent, SyncError, SyncResult};
use crate::db::Database;
use crate::models::{Editor, Report, ReportData, ReportIndex, VehicleId};

/// Live state to merge into the stored report.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveUpdate {
    pub vehicle_id: VehicleId,
    pub branch: String,
    pub editor: Editor,
    pub index: ReportIndex,
    pub data: ReportData,
}

type UpdateCell = Arc<Mutex<Option<LiveUpdate>>>;

struct Pending {
    handle: JoinHandle<()>,
    update: UpdateCell,
}

pub struct IndexSync {
    db: Arc<Mutex<Database>>,
    debounce: Duration,
    runtime: Handle,
    feed: Option<ChangeFeed>,
    slot: Mutex<Option<Pending>>,
}

fn write_update(db: &Database, feed: Option<&ChangeFeed>, update: LiveUpdate) -> SyncResult<Report> {
    let report = db.sync_live_fields(
        &update.vehicle_id,
        &update.branch,
        &update.editor,
        &update.index,
        &update.data,
    )?;

    tracing::debug!(
        vehicle_id = %report.vehicle_id,
        report_number = %report.report_number,
        "synced live index fields"
    );
    if let Some(feed) = feed {
        feed.publish(ReportEvent::Synced {
            vehicle_id: report.vehicle_id.clone(),
            report_number: report.report_number.clone(),
        });
    }
    Ok(report)
}

impl IndexSync {
    pub fn new(db: Arc<Mutex<Database>>, debounce: Duration, runtime: Handle) -> Self {
        Self {
            db,
            debounce,
            runtime,
            feed: None,
            slot: Mutex::new(None),
        }
    }

    /// Builder: announce each write on a change feed.
    pub fn with_feed(mut self, feed: ChangeFeed) -> Self {
        self.feed = Some(feed);
        self
    }

    /// Write `update` after the quiet period, superseding anything pending.
    pub fn schedule(&self, update: LiveUpdate) -> SyncResult<()> {
        let mut slot = self.slot.lock().map_err(|_| SyncError::Poisoned)?;
        if let Some(previous) = slot.take() {
            previous.handle.abort();
            tracing::trace!(vehicle_id = %update.vehicle_id, "superseded pending index sync");
        }

        let cell: UpdateCell = Arc::new(Mutex::new(Some(update)));
        let task_cell = Arc::clone(&cell);
        let db = Arc::clone(&self.db);
        let feed = self.feed.clone();
        let debounce = self.debounce;

        let handle = self.runtime.spawn(async move {
            tokio::time::sleep(debounce).await;
            let Ok(db) = db.lock() else {
                tracing::warn!("index sync skipped: database lock poisoned");
                return;
            };
            // Taken under the database lock so a cancel or save that got
            // there first leaves nothing to write
            let update = match task_cell.lock() {
                Ok(mut guard) => guard.take(),
                Err(_) => None,
            };
            if let Some(update) = update {
                if let Err(e) = write_update(&db, feed.as_ref(), update) {
                    tracing::warn!(error = %e, "index sync failed");
                }
            }
        });

        *slot = Some(Pending {
            handle,
            update: cell,
        });
        Ok(())
    }

    fn take_pending(&self) -> SyncResult<Option<LiveUpdate>> {
        let mut slot = self.slot.lock().map_err(|_| SyncError::Poisoned)?;
        let Some(pending) = slot.take() else {
            return Ok(None);
        };
        pending.handle.abort();
        let update = pending
            .update
            .lock()
            .map_err(|_| SyncError::Poisoned)?
            .take();
        Ok(update)
    }

    /// Write the pending update now. `None` if nothing was waiting.
    pub fn flush(&self) -> SyncResult<Option<Report>> {
        let db = self.db.lock().map_err(|_| SyncError::Poisoned)?;
        match self.take_pending()? {
            Some(update) => write_update(&db, self.feed.as_ref(), update).map(Some),
            None => Ok(None),
        }
    }

    /// Drop the pending update. Returns whether one was waiting.
    pub fn cancel(&self) -> SyncResult<bool> {
        Ok(self.take_pending()?.is_some())
    }

    /// Whether an update is waiting for its quiet period.
    pub fn is_pending(&self) -> bool {
        self.slot
            .lock()
            .ok()
            .and_then(|slot| {
                slot.as_ref()
                    .and_then(|p| p.update.lock().ok().map(|u| u.is_some()))
            })
            .unwrap_or(false)
    }
}

impl Drop for IndexSync {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.slot.lock() {
            if let Some(pending) = slot.take() {
                pending.handle.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReportValue;

    fn update(make: &str) -> LiveUpdate {
        let mut data = ReportData::new();
        data.insert("make".into(), ReportValue::from(make));
        LiveUpdate {
            vehicle_id: VehicleId::normalize("KA01AB1234").unwrap(),
            branch: "CDH".into(),
            editor: Editor::default(),
            index: ReportIndex::normalized("eng1", "ch1", "CDH25467---", ""),
            data,
        }
    }

    fn setup() -> (Arc<Mutex<Database>>, IndexSync) {
        let db = Arc::new(Mutex::new(Database::open_in_memory().unwrap()));
        let sync = IndexSync::new(Arc::clone(&db), Duration::from_millis(1000), Handle::current());
        (db, sync)
    }

    fn stored_make(db: &Arc<Mutex<Database>>) -> Option<String> {
        db.lock()
            .unwrap()
            .get_report("KA01AB1234")
            .unwrap()
            .map(|r| r.report_data["make"].as_display())
    }

    #[tokio::test(start_paused = true)]
    async fn test_quiet_period_writes_last_update() {
        let (db, sync) = setup();

        sync.schedule(update("Tata")).unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;
        sync.schedule(update("Toyota")).unwrap();
        tokio::time::sleep(Duration::from_millis(900)).await;

        // 1400ms since the first edit, 900ms since the last
        assert!(stored_make(&db).is_none());
        assert!(sync.is_pending());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(stored_make(&db).as_deref(), Some("Toyota"));
        assert!(!sync.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_writes_now() {
        let (db, sync) = setup();

        sync.schedule(update("Kia")).unwrap();
        let report = sync.flush().unwrap().unwrap();
        assert_eq!(report.engine_number, "ENG1");
        assert_eq!(stored_make(&db).as_deref(), Some("Kia"));

        // Nothing left to write
        assert!(sync.flush().unwrap().is_none());
        tokio::time::sleep(Duration::from_millis(2000)).await;
        assert_eq!(stored_make(&db).as_deref(), Some("Kia"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drops_update() {
        let (db, sync) = setup();

        sync.schedule(update("Honda")).unwrap();
        assert!(sync.cancel().unwrap());
        assert!(!sync.cancel().unwrap());

        tokio::time::sleep(Duration::from_millis(2000)).await;
        assert!(stored_make(&db).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_feed_announces_sync() {
        let (_db, sync) = setup();
        let feed = ChangeFeed::default();
        let mut events = feed.subscribe();
        let sync = sync.with_feed(feed);

        sync.schedule(update("Tata")).unwrap();
        tokio::time::sleep(Duration::from_millis(1100)).await;

        match events.recv().await.unwrap() {
            ReportEvent::Synced {
                vehicle_id,
                report_number,
            } => {
                assert_eq!(vehicle_id, "KA01AB1234");
                assert_eq!(report_number, "CDH25467---");
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cancel_wins_while_database_is_busy() {
        let db = Arc::new(Mutex::new(Database::open_in_memory().unwrap()));
        let sync = IndexSync::new(Arc::clone(&db), Duration::from_millis(10), Handle::current());

        let guard = db.lock().unwrap();
        sync.schedule(update("Tata")).unwrap();
        // The quiet period ends while the lock is held elsewhere
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(sync.cancel().unwrap());
        drop(guard);

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(stored_make(&db).is_none());
    }
}
