//! Denormalized identity fields pulled out of report data.

use crate::models::{Layout, ReportData, ReportIndex};
use crate::render::find_identifier;

/// Data key the report number is displayed under.
pub const REPORT_NUMBER_KEY: &str = "reportNumber";

/// Data key the vehicle registration is displayed under.
pub const REGISTRATION_KEY: &str = "registrationNumber";

const ENGINE: &[&str] = &["engineNumber", "engine"];
const CHASSIS: &[&str] = &["chassisNumber", "chassis"];
const REPORT_DATE: &[&str] = &["reportDate", "date"];

/// Index fields for a report, normalized for lookup.
pub fn index_fields(layout: &Layout, data: &ReportData, report_number: &str) -> ReportIndex {
    ReportIndex::normalized(
        &find_identifier(layout, data, ENGINE),
        &find_identifier(layout, data, CHASSIS),
        report_number,
        &find_identifier(layout, data, REPORT_DATE),
    )
}
