//! SQLite schema definition.

/// Complete database schema for the valuation store.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Layouts (Immutable after creation)
-- ============================================================================

CREATE TABLE IF NOT EXISTS layouts (
    id TEXT PRIMARY KEY,
    version INTEGER NOT NULL UNIQUE,
    fields TEXT NOT NULL DEFAULT '[]',           -- JSON array of LayoutField
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TRIGGER IF NOT EXISTS layouts_no_update BEFORE UPDATE ON layouts
BEGIN
    SELECT RAISE(ABORT, 'Layouts are immutable');
END;

CREATE TRIGGER IF NOT EXISTS layouts_no_delete BEFORE DELETE ON layouts
BEGIN
    SELECT RAISE(ABORT, 'Layouts are never deleted');
END;

-- Current layout pointer (single row, updated atomically)
CREATE TABLE IF NOT EXISTS layout_config (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    version INTEGER NOT NULL DEFAULT 0,
    current_id TEXT REFERENCES layouts(id),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

INSERT OR IGNORE INTO layout_config (id, version, current_id)
VALUES (1, 0, NULL);

-- ============================================================================
-- Reports (Live - Mutable)
-- ============================================================================

CREATE TABLE IF NOT EXISTS reports (
    vehicle_id TEXT PRIMARY KEY,                 -- normalized registration
    branch TEXT NOT NULL DEFAULT '',
    engine_number TEXT NOT NULL DEFAULT '',
    chassis_number TEXT NOT NULL DEFAULT '',
    report_number TEXT NOT NULL DEFAULT '',
    report_date TEXT NOT NULL DEFAULT '',
    user_id TEXT NOT NULL DEFAULT '',
    user_name TEXT NOT NULL DEFAULT '',
    user_email TEXT NOT NULL DEFAULT '',
    report_data TEXT NOT NULL DEFAULT '{}',      -- JSON object fieldId -> value
    layout_id TEXT,                              -- layout used at last save
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_reports_number ON reports(report_number);
CREATE INDEX IF NOT EXISTS idx_reports_engine ON reports(engine_number);
CREATE INDEX IF NOT EXISTS idx_reports_chassis ON reports(chassis_number);
CREATE INDEX IF NOT EXISTS idx_reports_branch ON reports(branch);

-- ============================================================================
-- Report History (Append-Only)
-- ============================================================================

CREATE TABLE IF NOT EXISTS report_history (
    history_id TEXT PRIMARY KEY,
    vehicle_id TEXT NOT NULL,                    -- kept even if the report is removed
    report_number TEXT NOT NULL,
    saved_by TEXT NOT NULL DEFAULT '',
    snapshot TEXT NOT NULL,                      -- JSON Report
    saved_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_history_vehicle ON report_history(vehicle_id, saved_at);

CREATE TRIGGER IF NOT EXISTS report_history_no_update BEFORE UPDATE ON report_history
BEGIN
    SELECT RAISE(ABORT, 'History entries are append-only');
END;

CREATE TRIGGER IF NOT EXISTS report_history_no_delete BEFORE DELETE ON report_history
BEGIN
    SELECT RAISE(ABORT, 'History entries are append-only');
END;

-- ============================================================================
-- Authorized Users (consumed, not owned)
-- ============================================================================

CREATE TABLE IF NOT EXISTS authorized_users (
    email_key TEXT PRIMARY KEY,                  -- email with '.' and '@' replaced by '_'
    email TEXT NOT NULL,
    branch TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- ============================================================================
-- Blob Store (content-addressed images)
-- ============================================================================

CREATE TABLE IF NOT EXISTS blobs (
    blob_id TEXT PRIMARY KEY,                    -- SHA-256 of content
    content_type TEXT NOT NULL,
    bytes BLOB NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;
