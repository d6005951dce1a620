//! Report database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::models::{
    normalize_identifier, Editor, Report, ReportData, ReportIndex, ReportValue, VehicleId,
};
use crate::numbering::ReportNumber;
use crate::report::REPORT_NUMBER_KEY;

fn is_issued(number: &str) -> bool {
    ReportNumber::parse(number).is_some_and(|n| n.is_issued())
}

const REPORT_COLUMNS: &str = r#"
    vehicle_id, branch, engine_number, chassis_number, report_number,
    report_date, user_id, user_name, user_email, report_data, layout_id,
    created_at, updated_at
"#;

impl Database {
    /// Insert or fully replace a report.
    pub fn upsert_report(&self, report: &Report) -> DbResult<()> {
        let report_data_json = serde_json::to_string(&report.report_data)?;

        self.conn.execute(
            r#"
            INSERT INTO reports (
                vehicle_id, branch, engine_number, chassis_number, report_number,
                report_date, user_id, user_name, user_email, report_data, layout_id,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            ON CONFLICT(vehicle_id) DO UPDATE SET
                branch = excluded.branch,
                engine_number = excluded.engine_number,
                chassis_number = excluded.chassis_number,
                report_number = excluded.report_number,
                report_date = excluded.report_date,
                user_id = excluded.user_id,
                user_name = excluded.user_name,
                user_email = excluded.user_email,
                report_data = excluded.report_data,
                layout_id = excluded.layout_id,
                updated_at = excluded.updated_at
            "#,
            params![
                report.vehicle_id,
                report.branch,
                report.engine_number,
                report.chassis_number,
                report.report_number,
                report.report_date,
                report.user_id,
                report.user_name,
                report.user_email,
                report_data_json,
                report.layout_id,
                report.created_at,
                report.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Get a report by vehicle ID.
    pub fn get_report(&self, vehicle_id: &str) -> DbResult<Option<Report>> {
        let sql = format!("SELECT {} FROM reports WHERE vehicle_id = ?", REPORT_COLUMNS);
        self.conn
            .query_row(&sql, [vehicle_id], ReportRow::from_row)
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Merge live edits into a report, creating it if needed.
    ///
    /// Data keys are merged over the stored dictionary; the index fields,
    /// branch and editor are overwritten. The saved `layout_id` is left alone,
    /// and so is an issued report number when the update only carries a
    /// provisional one.
    pub fn sync_live_fields(
        &self,
        vehicle_id: &VehicleId,
        branch: &str,
        editor: &Editor,
        index: &ReportIndex,
        data: &ReportData,
    ) -> DbResult<Report> {
        let tx = self.immediate_transaction()?;

        let mut report = match self.get_report(vehicle_id.as_str())? {
            Some(existing) => existing,
            None => Report::new(vehicle_id, branch),
        };
        let stored_number = report.report_number.clone();

        for (key, value) in data {
            report.report_data.insert(key.clone(), value.clone());
        }
        report.branch = branch.to_string();
        report.apply_index(index);
        // An issued number is only ever replaced by another issued number
        if is_issued(&stored_number) && !is_issued(&index.report_number) {
            report.report_number = stored_number.clone();
            report
                .report_data
                .insert(REPORT_NUMBER_KEY.to_string(), ReportValue::Text(stored_number));
        }
        report.user_id = editor.user_id.clone();
        report.user_name = editor.user_name.clone();
        report.user_email = editor.user_email.clone();
        report.touch();

        self.upsert_report(&report)?;
        tx.commit()?;
        Ok(report)
    }

    /// Highest sequence issued under `prefix` (branch + date code), 0 if none.
    ///
    /// Live reports and history snapshots are both consulted, so a number
    /// held by a deleted report is never handed out again. Provisional `---`
    /// suffixes and numbers for other days never match.
    pub fn highest_issued_sequence(&self, prefix: &str) -> DbResult<u32> {
        let highest: u32 = self.conn.query_row(
            r#"
            SELECT COALESCE(MAX(CAST(substr(report_number, ?1 + 2) AS INTEGER)), 0)
            FROM (
                SELECT report_number FROM reports
                UNION ALL
                SELECT report_number FROM report_history
            )
            WHERE substr(report_number, 1, ?1) = ?2
              AND length(report_number) = ?1 + 4
              AND substr(report_number, ?1 + 1) GLOB '[0-9][0-9][0-9][0-9]'
            "#,
            params![prefix.len() as i64, prefix],
            |row| row.get(0),
        )?;
        Ok(highest)
    }

    /// Find reports whose vehicle id, engine, chassis or report number
    /// matches the query exactly (after normalization).
    pub fn find_reports_by_identifier(&self, query: &str) -> DbResult<Vec<Report>> {
        let needle = normalize_identifier(query);
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            r#"
            SELECT {} FROM reports
            WHERE vehicle_id = ?1 OR engine_number = ?1
               OR chassis_number = ?1 OR report_number = ?1
            ORDER BY updated_at DESC
            "#,
            REPORT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([needle], ReportRow::from_row)?;

        let mut reports = Vec::new();
        for row in rows {
            reports.push(row?.try_into()?);
        }
        Ok(reports)
    }

    /// Delete a report (administrative). History is kept.
    pub fn delete_report(&self, vehicle_id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM reports WHERE vehicle_id = ?", [vehicle_id])?;
        Ok(rows_affected > 0)
    }
}

/// Intermediate row struct for database mapping.
struct ReportRow {
    vehicle_id: String,
    branch: String,
    engine_number: String,
    chassis_number: String,
    report_number: String,
    report_date: String,
    user_id: String,
    user_name: String,
    user_email: String,
    report_data: String,
    layout_id: Option<String>,
    created_at: String,
    updated_at: String,
}

impl ReportRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            vehicle_id: row.get(0)?,
            branch: row.get(1)?,
            engine_number: row.get(2)?,
            chassis_number: row.get(3)?,
            report_number: row.get(4)?,
            report_date: row.get(5)?,
            user_id: row.get(6)?,
            user_name: row.get(7)?,
            user_email: row.get(8)?,
            report_data: row.get(9)?,
            layout_id: row.get(10)?,
            created_at: row.get(11)?,
            updated_at: row.get(12)?,
        })
    }
}

impl TryFrom<ReportRow> for Report {
    type Error = DbError;

    fn try_from(row: ReportRow) -> Result<Self, Self::Error> {
        let report_data: ReportData = serde_json::from_str(&row.report_data)?;

        Ok(Report {
            vehicle_id: row.vehicle_id,
            branch: row.branch,
            engine_number: row.engine_number,
            chassis_number: row.chassis_number,
            report_number: row.report_number,
            report_date: row.report_date,
            user_id: row.user_id,
            user_name: row.user_name,
            user_email: row.user_email,
            report_data,
            layout_id: row.layout_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
