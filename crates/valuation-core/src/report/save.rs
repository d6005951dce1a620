//! Finalize-on-save.

use chrono::NaiveDate;

use super::{index_fields, ReportError, ReportResult, REPORT_NUMBER_KEY};
use crate::auth::AuthorizationContext;
use crate::db::Database;
use crate::layout::LayoutStore;
use crate::models::{Layout, Report, ReportData, ReportHistory, ReportValue, VehicleId};
use crate::numbering::{grade_digit_for, plan_finalize, NumberingError};
use crate::sync::{ChangeFeed, ReportEvent};

/// What the client submits on save.
#[derive(Debug, Clone)]
pub struct SaveRequest {
    pub vehicle_id: VehicleId,
    pub data: ReportData,
    /// Layout the client rendered with; `None` means the current layout
    pub layout_id: Option<String>,
    pub today: NaiveDate,
}

/// Result of a save.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedReport {
    pub report: Report,
    pub history_id: String,
}

/// Runs the save transaction.
pub struct ReportSaver<'a> {
    db: &'a Database,
    grade_field_id: String,
    feed: Option<ChangeFeed>,
}

impl<'a> ReportSaver<'a> {
    pub fn new(db: &'a Database, grade_field_id: &str) -> Self {
        Self {
            db,
            grade_field_id: grade_field_id.to_string(),
            feed: None,
        }
    }

    /// Builder: announce saves on a change feed.
    pub fn with_feed(mut self, feed: ChangeFeed) -> Self {
        self.feed = Some(feed);
        self
    }

    /// Selected grade digit, or a validation error naming the grade field.
    fn grade_digit(&self, layout: &Layout, data: &ReportData) -> ReportResult<char> {
        let Some(field) = layout.grade_field(&self.grade_field_id) else {
            return Err(ReportError::Validation {
                field: self.grade_field_id.clone(),
            });
        };
        let missing = || ReportError::Validation {
            field: if field.label_text().trim().is_empty() {
                field.field_id.clone()
            } else {
                field.label_text().trim().to_string()
            },
        };

        let grade = data
            .get(&field.field_id)
            .and_then(ReportValue::as_text)
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .ok_or_else(missing)?;
        Ok(grade_digit_for(layout, &self.grade_field_id, grade))
    }

    /// Save a report: resolve the layout, read the stored report, finalize
    /// the number, write the report and append a history snapshot, all in one
    /// transaction. Nothing is written if any step fails.
    pub fn save(
        &self,
        auth: &AuthorizationContext,
        request: SaveRequest,
    ) -> ReportResult<SavedReport> {
        if !auth.can_edit_reports() {
            return Err(ReportError::Unauthorized(auth.email.clone()));
        }
        let branch = auth.require_branch()?;
        let vehicle_id = request.vehicle_id.as_str();

        let tx = self.db.immediate_transaction()?;

        let layout = LayoutStore::new(self.db).resolve_for_report(request.layout_id.as_deref())?;
        let existing = self.db.get_report(vehicle_id)?;

        let digit = self.grade_digit(&layout, &request.data)?;
        let current_number = existing
            .as_ref()
            .map(|r| r.report_number.as_str())
            .unwrap_or_default();
        let plan = plan_finalize(current_number, branch, request.today, Some(digit))
            .map_err(|e| match e {
                NumberingError::MissingGrade => ReportError::Validation {
                    field: self.grade_field_id.clone(),
                },
                other => other.into(),
            })?;

        let highest_issued = match plan.allocation_prefix() {
            Some(prefix) => {
                let highest = self.db.highest_issued_sequence(&prefix)?;
                tracing::debug!(prefix = %prefix, highest, "found highest issued sequence");
                highest
            }
            None => 0,
        };
        let number = plan.complete(highest_issued)?.to_string();

        let mut report = existing.unwrap_or_else(|| Report::new(&request.vehicle_id, branch.as_str()));
        report.report_data = request.data;
        report
            .report_data
            .insert(REPORT_NUMBER_KEY.to_string(), ReportValue::Text(number.clone()));
        report.branch = branch.to_string();
        report.apply_index(&index_fields(&layout, &report.report_data, &number));
        if report.report_date.is_empty() {
            report.report_date = request.today.format("%Y-%m-%d").to_string();
        }
        let editor = auth.editor();
        report.user_id = editor.user_id;
        report.user_name = editor.user_name;
        report.user_email = editor.user_email;
        report.layout_id = Some(layout.id.clone());
        report.touch();

        self.db.upsert_report(&report)?;
        let history = ReportHistory::snapshot(&report);
        self.db.insert_history(&history)?;

        tx.commit().map_err(crate::db::DbError::from)?;

        tracing::info!(
            vehicle_id = %report.vehicle_id,
            report_number = %report.report_number,
            layout_id = %layout.id,
            history_id = %history.history_id,
            "saved report"
        );
        if let Some(feed) = &self.feed {
            feed.publish(ReportEvent::Saved {
                vehicle_id: report.vehicle_id.clone(),
                report_number: report.report_number.clone(),
                history_id: history.history_id.clone(),
            });
        }

        Ok(SavedReport {
            report,
            history_id: history.history_id,
        })
    }
}
