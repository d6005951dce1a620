//! Valuation Core Library
//!
//! Vehicle valuation reports bound to versioned layouts, with derived
//! report numbers and an append-only save history.
//!
//! # Architecture
//!
//! ```text
//!   LayoutStore ──current / by id──┐
//!                                  ▼
//!   stored Report ──────────▶ ReportSession ──edit/blur──▶ render rules
//!                                  │   │                  (auto-fill, money)
//!                                  │   └──▶ numbering::derive_live
//!                                  │            (provisional number)
//!                   debounced      │
//!   IndexSync ◀────────────────────┤
//!   (index fields)                 │ save
//!                                  ▼
//!                    ┌─────────────────────────────┐
//!                    │ ReportSaver (one IMMEDIATE  │
//!                    │ transaction)                │
//!                    │  layout → report → number   │
//!                    │  → write → history          │
//!                    └──────────────┬──────────────┘
//!                                   ▼
//!                              ChangeFeed
//! ```
//!
//! # Core Principle
//!
//! **A saved report always renders with the layout it was saved with.**
//! Layouts are immutable once published; history is append-only.
//!
//! # Modules
//!
//! - [`db`]: SQLite document store (layouts, reports, history, users, blobs)
//! - [`models`]: Domain types (Layout, LayoutField, Report, ReportHistory, etc.)
//! - [`layout`]: Layout Store, load-time repair, default layout, editor draft
//! - [`numbering`]: Report number derivation
//! - [`render`]: Projection and field interaction rules
//! - [`report`]: Editing sessions and the save transaction
//! - [`sync`]: Debounced index sync and change feed
//! - [`auth`]: Explicit authorization context
//! - [`config`]: Runtime configuration

pub mod auth;
pub mod config;
pub mod db;
pub mod layout;
pub mod models;
pub mod numbering;
pub mod render;
pub mod report;
pub mod sync;

// Re-export commonly used types
pub use auth::AuthorizationContext;
pub use config::ValuationConfig;
pub use db::Database;
pub use layout::{LayoutDraft, LayoutStore};
pub use models::{
    FieldKind, FieldPart, ImageData, Layout, LayoutField, Report, ReportData, ReportHistory,
    ReportValue, VehicleId,
};
pub use numbering::{BranchCode, ReportNumber};
pub use render::{project, Projection};
pub use report::{ReportSaver, ReportSession, SaveRequest, SavedReport};
pub use sync::{ChangeFeed, IndexSync, ReportEvent};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum ValuationError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0} is required")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Sync error: {0}")]
    Sync(String),
}

impl From<db::DbError> for ValuationError {
    fn from(e: db::DbError) -> Self {
        match e {
            db::DbError::NotFound(what) => ValuationError::NotFound(what),
            other => ValuationError::Database(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for ValuationError {
    fn from(e: serde_json::Error) -> Self {
        ValuationError::Serialization(e.to_string())
    }
}

impl From<layout::LayoutError> for ValuationError {
    fn from(e: layout::LayoutError) -> Self {
        use layout::LayoutError;
        match e {
            LayoutError::Database(e) => e.into(),
            LayoutError::NotFound(id) => ValuationError::NotFound(id),
            LayoutError::Unauthorized(who) => ValuationError::Unauthorized(who),
            other @ (LayoutError::Invalid(_) | LayoutError::Locked(_)) => {
                ValuationError::InvalidInput(other.to_string())
            }
        }
    }
}

impl From<report::ReportError> for ValuationError {
    fn from(e: report::ReportError) -> Self {
        use report::ReportError;
        match e {
            ReportError::Database(e) => e.into(),
            ReportError::Layout(e) => e.into(),
            ReportError::Validation { field } => ValuationError::Validation(field),
            ReportError::Unauthorized(who) => ValuationError::Unauthorized(who),
            other @ (ReportError::Numbering(_)
            | ReportError::InvalidVehicle(_)
            | ReportError::InvalidBranch(_)) => ValuationError::InvalidInput(other.to_string()),
        }
    }
}

impl From<sync::SyncError> for ValuationError {
    fn from(e: sync::SyncError) -> Self {
        ValuationError::Sync(e.to_string())
    }
}

impl From<config::ConfigError> for ValuationError {
    fn from(e: config::ConfigError) -> Self {
        ValuationError::InvalidInput(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for ValuationError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        ValuationError::Database(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open the store described by a config file (or defaults), with
/// environment overrides applied.
#[uniffi::export]
pub fn open_valuation_core(
    config_path: Option<String>,
) -> Result<Arc<ValuationCore>, ValuationError> {
    let config = match config_path {
        Some(path) => ValuationConfig::load(path)?,
        None => ValuationConfig::default(),
    }
    .apply_env()?;
    let db = Database::open(&config.database_path)?;
    ValuationCore::build(db, config)
}

/// Create an in-memory store (for testing).
#[uniffi::export]
pub fn open_valuation_core_in_memory(
    admin_emails: Vec<String>,
) -> Result<Arc<ValuationCore>, ValuationError> {
    let config = ValuationConfig {
        admin_emails,
        ..ValuationConfig::default()
    };
    ValuationCore::build(Database::open_in_memory()?, config)
}

/// Spell an amount the way the words auto-fill does. Empty when the input
/// holds no usable number.
#[uniffi::export]
pub fn amount_in_words(amount: String) -> String {
    match render::amount_to_words(&amount) {
        render::WordsOutcome::Words(words) => words,
        render::WordsOutcome::Clear | render::WordsOutcome::Unchanged => String::new(),
    }
}

// =========================================================================
// Main API Object
// =========================================================================

/// A report open for editing, with its own debounced sync slot.
struct OpenReport {
    session: ReportSession,
    sync: IndexSync,
}

/// Thread-safe store wrapper for FFI.
#[derive(uniffi::Object)]
pub struct ValuationCore {
    db: Arc<Mutex<Database>>,
    config: ValuationConfig,
    feed: ChangeFeed,
    open_reports: Mutex<HashMap<String, OpenReport>>,
    runtime: tokio::runtime::Runtime,
}

impl ValuationCore {
    fn build(db: Database, config: ValuationConfig) -> Result<Arc<Self>, ValuationError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("valuation-sync")
            .enable_time()
            .build()
            .map_err(|e| ValuationError::Sync(e.to_string()))?;

        Ok(Arc::new(Self {
            db: Arc::new(Mutex::new(db)),
            config,
            feed: ChangeFeed::default(),
            open_reports: Mutex::new(HashMap::new()),
            runtime,
        }))
    }

    fn authorize(
        &self,
        db: &Database,
        user_email: &str,
    ) -> Result<AuthorizationContext, ValuationError> {
        Ok(AuthorizationContext::resolve(db, user_email, &self.config)?)
    }

    fn today() -> chrono::NaiveDate {
        chrono::Local::now().date_naive()
    }

    fn view(session: &ReportSession) -> Result<FfiReportView, ValuationError> {
        Ok(FfiReportView {
            vehicle_id: session.vehicle_id().to_string(),
            report_number: session.report_number().to_string(),
            projection_json: serde_json::to_string(&session.projection())?,
        })
    }
}

#[uniffi::export]
impl ValuationCore {
    // =========================================================================
    // Layout Operations
    // =========================================================================

    /// Publish a new layout version from a JSON array of fields.
    pub fn publish_layout(
        &self,
        user_email: String,
        fields_json: String,
    ) -> Result<FfiLayoutSummary, ValuationError> {
        let fields: Vec<LayoutField> = serde_json::from_str(&fields_json)?;
        let db = self.db.lock()?;
        let auth = self.authorize(&db, &user_email)?;
        let layout = LayoutStore::new(&db).publish(&auth, &fields)?;
        Ok(FfiLayoutSummary {
            id: layout.id,
            version: layout.version,
            field_count: layout.fields.len() as u32,
            created_at: layout.created_at,
        })
    }

    /// Current layout as JSON (the built-in default if none is published).
    pub fn get_current_layout(&self) -> Result<String, ValuationError> {
        let db = self.db.lock()?;
        let layout = LayoutStore::new(&db).current_or_default()?;
        Ok(serde_json::to_string(&layout)?)
    }

    /// A layout version as JSON.
    pub fn get_layout(&self, layout_id: String) -> Result<String, ValuationError> {
        let db = self.db.lock()?;
        let layout = LayoutStore::new(&db).by_id(&layout_id)?;
        Ok(serde_json::to_string(&layout)?)
    }

    /// Published versions, newest first.
    pub fn list_layout_versions(&self) -> Result<Vec<FfiLayoutSummary>, ValuationError> {
        let db = self.db.lock()?;
        let versions = LayoutStore::new(&db).list_versions()?;
        Ok(versions.into_iter().map(|v| v.into()).collect())
    }

    // =========================================================================
    // Report Operations
    // =========================================================================

    /// Open a report for editing. Vehicles without registration are keyed by
    /// chassis number.
    pub fn open_report(
        &self,
        user_email: String,
        registration_number: String,
        chassis_number: String,
    ) -> Result<FfiReportView, ValuationError> {
        let vehicle_id = VehicleId::normalize(&registration_number)
            .or_else(|| VehicleId::unregistered(&self.config.unregistered_prefix, &chassis_number))
            .ok_or_else(|| {
                ValuationError::InvalidInput("registration or chassis number required".into())
            })?;

        let mut open_reports = self.open_reports.lock()?;
        if let Some(open) = open_reports.get(vehicle_id.as_str()) {
            return Self::view(&open.session);
        }

        let db = self.db.lock()?;
        let auth = self.authorize(&db, &user_email)?;
        let branch = auth.require_branch()?.clone();
        let store = LayoutStore::new(&db);
        let grade_field = &self.config.condition_grade_field;

        let session = match db.get_report(vehicle_id.as_str())? {
            Some(report) => {
                let layout = store.resolve_for_report(report.layout_id.as_deref())?;
                ReportSession::resume(layout, &report, branch, Self::today(), grade_field)?
            }
            None => {
                let layout = store.current_or_default()?;
                ReportSession::new(vehicle_id.clone(), layout, branch, Self::today(), grade_field)
            }
        };
        drop(db);

        let view = Self::view(&session)?;
        let sync = IndexSync::new(
            Arc::clone(&self.db),
            Duration::from_millis(self.config.sync_debounce_ms),
            self.runtime.handle().clone(),
        )
        .with_feed(self.feed.clone());
        open_reports.insert(vehicle_id.to_string(), OpenReport { session, sync });
        Ok(view)
    }

    /// Apply an edit to an open report and schedule the live index sync.
    pub fn edit_field(
        &self,
        user_email: String,
        vehicle_id: String,
        field_id: String,
        value: String,
    ) -> Result<FfiReportView, ValuationError> {
        let editor = {
            let db = self.db.lock()?;
            let auth = self.authorize(&db, &user_email)?;
            if !auth.can_edit_reports() {
                return Err(ValuationError::Unauthorized(user_email));
            }
            auth.editor()
        };

        let mut open_reports = self.open_reports.lock()?;
        let open = open_reports
            .get_mut(&vehicle_id)
            .ok_or_else(|| ValuationError::NotFound(vehicle_id.clone()))?;

        let fixed_part = open
            .session
            .layout()
            .field(&field_id)
            .and_then(|field| field.value.as_ref());
        if let Some(part) = fixed_part {
            if !render::is_allowed_choice(part, &value) {
                return Err(ValuationError::InvalidInput(format!(
                    "{:?} is not a choice for {}",
                    value, field_id
                )));
            }
        }

        let today = Self::today();
        if open.session.today() != today {
            open.session.set_today(today);
        }
        open.session.edit(&field_id, value);
        open.sync.schedule(open.session.live_update(editor))?;
        Self::view(&open.session)
    }

    /// Attach an uploaded image to an Image field.
    pub fn set_image(
        &self,
        vehicle_id: String,
        field_id: String,
        bytes: Vec<u8>,
        content_type: String,
    ) -> Result<FfiReportView, ValuationError> {
        let image = self.db.lock()?.put_blob(&bytes, &content_type)?;
        let mut open_reports = self.open_reports.lock()?;
        let open = open_reports
            .get_mut(&vehicle_id)
            .ok_or_else(|| ValuationError::NotFound(vehicle_id.clone()))?;
        open.session.edit(&field_id, image);
        Self::view(&open.session)
    }

    /// Ranked choices for a value part as the user types.
    pub fn suggest_choices(
        &self,
        vehicle_id: String,
        field_id: String,
        input: String,
        limit: u32,
    ) -> Result<Vec<String>, ValuationError> {
        let open_reports = self.open_reports.lock()?;
        let open = open_reports
            .get(&vehicle_id)
            .ok_or_else(|| ValuationError::NotFound(vehicle_id.clone()))?;
        Ok(open
            .session
            .layout()
            .field(&field_id)
            .and_then(|field| field.value.as_ref())
            .map(|part| render::suggest_choices(part, &input, limit as usize))
            .unwrap_or_default())
    }

    /// Normalize a field when it loses focus. Returns the value now shown.
    pub fn blur_field(&self, vehicle_id: String, field_id: String) -> Result<String, ValuationError> {
        let mut open_reports = self.open_reports.lock()?;
        let open = open_reports
            .get_mut(&vehicle_id)
            .ok_or_else(|| ValuationError::NotFound(vehicle_id.clone()))?;
        Ok(open.session.blur(&field_id))
    }

    /// Finalize and save an open report.
    pub fn save_report(
        &self,
        user_email: String,
        vehicle_id: String,
    ) -> Result<FfiSavedReport, ValuationError> {
        let mut open_reports = self.open_reports.lock()?;
        let open = open_reports
            .get_mut(&vehicle_id)
            .ok_or_else(|| ValuationError::NotFound(vehicle_id.clone()))?;

        let db = self.db.lock()?;
        let auth = self.authorize(&db, &user_email)?;
        let saver = ReportSaver::new(&db, &self.config.condition_grade_field)
            .with_feed(self.feed.clone());
        let saved = saver.save(
            &auth,
            SaveRequest {
                vehicle_id: open.session.vehicle_id().clone(),
                data: open.session.data().clone(),
                layout_id: Some(open.session.layout().id.clone()),
                today: Self::today(),
            },
        )?;

        // The save wrote everything the pending sync would have. A failed
        // save leaves it pending for the next flush.
        open.sync.cancel()?;
        open.session.apply_saved(&saved.report);
        Ok(FfiSavedReport {
            vehicle_id: saved.report.vehicle_id,
            report_number: saved.report.report_number,
            history_id: saved.history_id,
            layout_id: saved.report.layout_id.unwrap_or_default(),
        })
    }

    /// Flush pending edits and release an open report.
    pub fn close_report(&self, vehicle_id: String) -> Result<(), ValuationError> {
        let open = self.open_reports.lock()?.remove(&vehicle_id);
        if let Some(open) = open {
            open.sync.flush()?;
        }
        Ok(())
    }

    /// Saved history of a vehicle, newest first.
    pub fn list_history(&self, vehicle_id: String) -> Result<Vec<FfiHistoryEntry>, ValuationError> {
        let db = self.db.lock()?;
        let entries = db.list_history(&vehicle_id)?;
        Ok(entries.into_iter().map(|e| e.into()).collect())
    }

    /// A history snapshot rendered with the layout it was saved with.
    pub fn render_history_entry(&self, history_id: String) -> Result<String, ValuationError> {
        let db = self.db.lock()?;
        let entry = db
            .get_history_entry(&history_id)?
            .ok_or_else(|| ValuationError::NotFound(history_id.clone()))?;
        let layout =
            LayoutStore::new(&db).resolve_for_report(entry.report.layout_id.as_deref())?;
        Ok(serde_json::to_string(&project(&layout, &entry.report.report_data))?)
    }

    /// Exact lookup by vehicle id, engine, chassis or report number.
    pub fn find_reports(&self, query: String) -> Result<Vec<FfiReportSummary>, ValuationError> {
        let db = self.db.lock()?;
        let reports = db.find_reports_by_identifier(&query)?;
        Ok(reports.into_iter().map(|r| r.into()).collect())
    }

    /// Remove a live report (admins only). History is kept.
    pub fn delete_report(&self, user_email: String, vehicle_id: String) -> Result<bool, ValuationError> {
        let db = self.db.lock()?;
        let auth = self.authorize(&db, &user_email)?;
        if !auth.admin {
            return Err(ValuationError::Unauthorized(user_email));
        }
        tracing::info!(vehicle_id = %vehicle_id, by = %auth.email, "deleting report");
        Ok(db.delete_report(&vehicle_id)?)
    }

    // =========================================================================
    // Staff Operations
    // =========================================================================

    /// Grant a staff member report access for a branch (admins only).
    pub fn authorize_user(
        &self,
        admin_email: String,
        email: String,
        branch: String,
    ) -> Result<(), ValuationError> {
        let db = self.db.lock()?;
        let auth = self.authorize(&db, &admin_email)?;
        if !auth.admin {
            return Err(ValuationError::Unauthorized(admin_email));
        }
        let branch = BranchCode::parse(&branch)
            .ok_or_else(|| ValuationError::InvalidInput(format!("branch code {:?}", branch)))?;
        db.upsert_authorized_user(&models::AuthorizedUser {
            email: email.trim().to_lowercase(),
            branch: branch.to_string(),
        })?;
        tracing::info!(email = %email, branch = %branch, by = %auth.email, "authorized user");
        Ok(())
    }

    // =========================================================================
    // Blob Operations
    // =========================================================================

    /// Store image bytes; returns the retrievable URL.
    pub fn put_image(&self, bytes: Vec<u8>, content_type: String) -> Result<String, ValuationError> {
        let db = self.db.lock()?;
        Ok(db.put_blob(&bytes, &content_type)?.url)
    }

    /// Image bytes for a `blob://` URL.
    pub fn get_image(&self, url: String) -> Result<Option<Vec<u8>>, ValuationError> {
        let db = self.db.lock()?;
        Ok(db.get_blob(&url)?.map(|blob| blob.bytes))
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe layout summary.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiLayoutSummary {
    pub id: String,
    pub version: u32,
    pub field_count: u32,
    pub created_at: String,
}

impl From<models::LayoutSummary> for FfiLayoutSummary {
    fn from(summary: models::LayoutSummary) -> Self {
        Self {
            id: summary.id,
            version: summary.version,
            field_count: summary.field_count as u32,
            created_at: summary.created_at,
        }
    }
}

/// FFI-safe view of an open report.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiReportView {
    pub vehicle_id: String,
    pub report_number: String,
    /// Serialized [`Projection`]
    pub projection_json: String,
}

/// FFI-safe save result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSavedReport {
    pub vehicle_id: String,
    pub report_number: String,
    pub history_id: String,
    pub layout_id: String,
}

/// FFI-safe history entry.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiHistoryEntry {
    pub history_id: String,
    pub saved_at: String,
    pub report_number: String,
    pub saved_by: String,
}

impl From<ReportHistory> for FfiHistoryEntry {
    fn from(entry: ReportHistory) -> Self {
        Self {
            history_id: entry.history_id,
            saved_at: entry.saved_at,
            report_number: entry.report.report_number,
            saved_by: entry.report.user_email,
        }
    }
}

/// FFI-safe report listing entry.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiReportSummary {
    pub vehicle_id: String,
    pub branch: String,
    pub report_number: String,
    pub engine_number: String,
    pub chassis_number: String,
    pub updated_at: String,
}

impl From<Report> for FfiReportSummary {
    fn from(report: Report) -> Self {
        Self {
            vehicle_id: report.vehicle_id,
            branch: report.branch,
            report_number: report.report_number,
            engine_number: report.engine_number,
            chassis_number: report.chassis_number,
            updated_at: report.updated_at,
        }
    }
}
