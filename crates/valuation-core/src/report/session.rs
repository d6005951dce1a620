//! In-memory editing state for one vehicle's report.

use chrono::NaiveDate;

use super::{index_fields, ReportError, ReportResult, REGISTRATION_KEY, REPORT_NUMBER_KEY};
use crate::models::{Editor, Layout, Report, ReportData, ReportIndex, ReportValue, VehicleId};
use crate::numbering::{derive_live, grade_digit_for, BranchCode};
use crate::render::{on_field_blur, on_field_edit, project, Projection};
use crate::sync::LiveUpdate;

/// A report being edited against one layout.
///
/// Every edit reruns the live number derivation so the provisional number
/// follows the condition grade and the date.
#[derive(Debug, Clone)]
pub struct ReportSession {
    vehicle_id: VehicleId,
    layout: Layout,
    data: ReportData,
    branch: BranchCode,
    today: NaiveDate,
    grade_field_id: String,
    report_number: String,
}

impl ReportSession {
    /// Start a new, empty report for a vehicle.
    pub fn new(
        vehicle_id: VehicleId,
        layout: Layout,
        branch: BranchCode,
        today: NaiveDate,
        grade_field_id: &str,
    ) -> Self {
        let mut data = ReportData::new();
        data.insert(
            REGISTRATION_KEY.to_string(),
            ReportValue::Text(vehicle_id.to_string()),
        );
        let mut session = Self {
            vehicle_id,
            layout,
            data,
            branch,
            today,
            grade_field_id: grade_field_id.to_string(),
            report_number: String::new(),
        };
        session.refresh_number();
        session
    }

    /// Continue editing a stored report.
    pub fn resume(
        layout: Layout,
        report: &Report,
        branch: BranchCode,
        today: NaiveDate,
        grade_field_id: &str,
    ) -> ReportResult<Self> {
        let vehicle_id = VehicleId::normalize(&report.vehicle_id)
            .ok_or_else(|| ReportError::InvalidVehicle(report.vehicle_id.clone()))?;
        let mut session = Self {
            vehicle_id,
            layout,
            data: report.report_data.clone(),
            branch,
            today,
            grade_field_id: grade_field_id.to_string(),
            report_number: report.report_number.clone(),
        };
        session.refresh_number();
        Ok(session)
    }

    pub fn vehicle_id(&self) -> &VehicleId {
        &self.vehicle_id
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn data(&self) -> &ReportData {
        &self.data
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn report_number(&self) -> &str {
        &self.report_number
    }

    /// Selected condition grade, if not blank.
    pub fn grade(&self) -> Option<String> {
        let field = self.layout.grade_field(&self.grade_field_id)?;
        self.data
            .get(&field.field_id)
            .and_then(ReportValue::as_text)
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .map(str::to_string)
    }

    fn grade_digit(&self) -> Option<char> {
        self.grade()
            .map(|grade| grade_digit_for(&self.layout, &self.grade_field_id, &grade))
    }

    fn refresh_number(&mut self) {
        self.report_number = derive_live(
            &self.report_number,
            &self.branch,
            self.today,
            self.grade_digit(),
        );
        if !self.report_number.is_empty() {
            self.data.insert(
                REPORT_NUMBER_KEY.to_string(),
                ReportValue::Text(self.report_number.clone()),
            );
        }
    }

    /// Apply an edit, run auto-fill, and re-derive the number.
    pub fn edit(&mut self, field_id: &str, value: impl Into<ReportValue>) {
        self.data = on_field_edit(&self.layout, &self.data, field_id, value.into());
        self.refresh_number();
    }

    /// Normalize a field's value on blur. Returns the value now shown.
    pub fn blur(&mut self, field_id: &str) -> String {
        let current = match self.data.get(field_id) {
            Some(ReportValue::Text(text)) => text.clone(),
            _ => return String::new(),
        };
        let normalized = on_field_blur(&self.layout, field_id, &current);
        if normalized != current {
            self.edit(field_id, normalized.clone());
        }
        normalized
    }

    /// Move the session to another day (date rollover).
    pub fn set_today(&mut self, today: NaiveDate) {
        self.today = today;
        self.refresh_number();
    }

    pub fn projection(&self) -> Projection {
        project(&self.layout, &self.data)
    }

    pub fn index(&self) -> ReportIndex {
        index_fields(&self.layout, &self.data, &self.report_number)
    }

    /// Snapshot for the debounced index sync.
    pub fn live_update(&self, editor: Editor) -> LiveUpdate {
        LiveUpdate {
            vehicle_id: self.vehicle_id.clone(),
            branch: self.branch.to_string(),
            editor,
            index: self.index(),
            data: self.data.clone(),
        }
    }

    /// Adopt the result of a save.
    pub fn apply_saved(&mut self, report: &Report) {
        self.data = report.report_data.clone();
        self.report_number = report.report_number.clone();
    }
}
