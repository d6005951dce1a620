//! Report history (append-only) database operations.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbResult};
use crate::models::{Report, ReportHistory};

impl Database {
    /// Append a history snapshot.
    pub fn insert_history(&self, entry: &ReportHistory) -> DbResult<()> {
        let snapshot = serde_json::to_string(&entry.report)?;
        self.conn.execute(
            r#"
            INSERT INTO report_history (
                history_id, vehicle_id, report_number, saved_by, snapshot, saved_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                entry.history_id,
                entry.report.vehicle_id,
                entry.report.report_number,
                entry.report.user_email,
                snapshot,
                entry.saved_at,
            ],
        )?;
        Ok(())
    }

    /// List a vehicle's history, newest first.
    pub fn list_history(&self, vehicle_id: &str) -> DbResult<Vec<ReportHistory>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT history_id, snapshot, saved_at
            FROM report_history
            WHERE vehicle_id = ?
            ORDER BY saved_at DESC, rowid DESC
            "#,
        )?;

        let rows = stmt.query_map([vehicle_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (history_id, snapshot, saved_at) = row?;
            entries.push(ReportHistory {
                history_id,
                saved_at,
                report: serde_json::from_str::<Report>(&snapshot)?,
            });
        }
        Ok(entries)
    }

    /// Get one history entry.
    pub fn get_history_entry(&self, history_id: &str) -> DbResult<Option<ReportHistory>> {
        let row = self
            .conn
            .query_row(
                "SELECT history_id, snapshot, saved_at FROM report_history WHERE history_id = ?",
                [history_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;

        match row {
            Some((history_id, snapshot, saved_at)) => Ok(Some(ReportHistory {
                history_id,
                saved_at,
                report: serde_json::from_str(&snapshot)?,
            })),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ReportValue, VehicleId};

    fn make_report(number: &str) -> Report {
        let mut report = Report::new(&VehicleId::normalize("KA01").unwrap(), "CDH");
        report.report_number = number.into();
        report
            .report_data
            .insert("make".into(), ReportValue::from("Tata"));
        report
    }

    #[test]
    fn test_insert_and_list_history() {
        let db = Database::open_in_memory().unwrap();

        let first = ReportHistory::snapshot(&make_report("CDH25467001"));
        db.insert_history(&first).unwrap();
        let second = ReportHistory::snapshot(&make_report("CDH25463001"));
        db.insert_history(&second).unwrap();

        let entries = db.list_history("KA01").unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].history_id, second.history_id);
        assert_eq!(entries[1].report.report_number, "CDH25467001");
        assert!(db.list_history("OTHER").unwrap().is_empty());
    }

    #[test]
    fn test_get_history_entry_is_exact_snapshot() {
        let db = Database::open_in_memory().unwrap();
        let entry = ReportHistory::snapshot(&make_report("CDH25467001"));
        db.insert_history(&entry).unwrap();

        let loaded = db.get_history_entry(&entry.history_id).unwrap().unwrap();
        assert_eq!(loaded, entry);
        assert!(db.get_history_entry("missing").unwrap().is_none());
    }

    #[test]
    fn test_history_survives_report_delete() {
        let db = Database::open_in_memory().unwrap();
        let report = make_report("CDH25467001");
        db.upsert_report(&report).unwrap();
        db.insert_history(&ReportHistory::snapshot(&report)).unwrap();

        db.delete_report("KA01").unwrap();
        assert_eq!(db.list_history("KA01").unwrap().len(), 1);
    }
}
