//! Report models: live vehicle reports and their history snapshots.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Reference to an uploaded image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageData {
    /// Retrievable URL (empty for an unfilled slot)
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl ImageData {
    /// Whether this is the empty placeholder.
    pub fn is_empty(&self) -> bool {
        self.url.is_empty()
    }
}

/// A value in the report data dictionary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ReportValue {
    Text(String),
    Image(ImageData),
}

impl ReportValue {
    /// String form used when the value lands in a text slot.
    pub fn as_display(&self) -> String {
        match self {
            ReportValue::Text(s) => s.clone(),
            ReportValue::Image(image) => image.url.clone(),
        }
    }

    /// Text content, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ReportValue::Text(s) => Some(s),
            ReportValue::Image(_) => None,
        }
    }
}

impl From<&str> for ReportValue {
    fn from(s: &str) -> Self {
        ReportValue::Text(s.to_string())
    }
}

impl From<String> for ReportValue {
    fn from(s: String) -> Self {
        ReportValue::Text(s)
    }
}

impl From<ImageData> for ReportValue {
    fn from(image: ImageData) -> Self {
        ReportValue::Image(image)
    }
}

/// The report data dictionary (fieldId -> value), ordered for stable JSON.
pub type ReportData = BTreeMap<String, ReportValue>;

/// Trim and uppercase an identifier for indexing.
pub fn normalize_identifier(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Normalized vehicle key (uppercased, trimmed, no inner whitespace).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct VehicleId(String);

impl VehicleId {
    /// Normalize a registration number. Returns `None` when blank.
    pub fn normalize(raw: &str) -> Option<Self> {
        let cleaned: String = raw
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_uppercase();
        if cleaned.is_empty() {
            None
        } else {
            Some(Self(cleaned))
        }
    }

    /// Key for a vehicle without registration, derived from its chassis number.
    pub fn unregistered(prefix: &str, chassis_number: &str) -> Option<Self> {
        let chassis = Self::normalize(chassis_number)?;
        Some(Self(format!("{}{}", prefix.to_uppercase(), chassis.0)))
    }

    /// Whether this key follows the unregistered-vehicle convention.
    pub fn is_unregistered(&self, prefix: &str) -> bool {
        self.0.starts_with(&prefix.to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Denormalized identity fields kept alongside the raw data for lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ReportIndex {
    pub engine_number: String,
    pub chassis_number: String,
    pub report_number: String,
    pub report_date: String,
}

impl ReportIndex {
    /// Build an index with every identifier trimmed and uppercased.
    pub fn normalized(
        engine_number: &str,
        chassis_number: &str,
        report_number: &str,
        report_date: &str,
    ) -> Self {
        Self {
            engine_number: normalize_identifier(engine_number),
            chassis_number: normalize_identifier(chassis_number),
            report_number: normalize_identifier(report_number),
            report_date: normalize_identifier(report_date),
        }
    }
}

/// The live, mutable record for one vehicle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Normalized vehicle key (also the document id)
    pub vehicle_id: String,
    /// Branch that owns the report
    pub branch: String,
    /// Denormalized, uppercased index fields
    pub engine_number: String,
    pub chassis_number: String,
    pub report_number: String,
    pub report_date: String,
    /// Last editor
    pub user_id: String,
    pub user_name: String,
    pub user_email: String,
    /// Raw field data
    pub report_data: ReportData,
    /// Layout in effect when last saved
    pub layout_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Report {
    /// Create an empty report for a vehicle.
    pub fn new(vehicle_id: &VehicleId, branch: &str) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            vehicle_id: vehicle_id.as_str().to_string(),
            branch: branch.to_string(),
            engine_number: String::new(),
            chassis_number: String::new(),
            report_number: String::new(),
            report_date: String::new(),
            user_id: String::new(),
            user_name: String::new(),
            user_email: String::new(),
            report_data: ReportData::new(),
            layout_id: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Touch the updated_at timestamp.
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }

    /// Copy denormalized index fields onto the header.
    pub fn apply_index(&mut self, index: &ReportIndex) {
        self.engine_number = index.engine_number.clone();
        self.chassis_number = index.chassis_number.clone();
        self.report_number = index.report_number.clone();
        self.report_date = index.report_date.clone();
    }

    /// Current index fields.
    pub fn index(&self) -> ReportIndex {
        ReportIndex {
            engine_number: self.engine_number.clone(),
            chassis_number: self.chassis_number.clone(),
            report_number: self.report_number.clone(),
            report_date: self.report_date.clone(),
        }
    }
}

/// Immutable snapshot of a report at an explicit save.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportHistory {
    pub history_id: String,
    pub saved_at: String,
    /// Full report state at save time
    pub report: Report,
}

impl ReportHistory {
    /// Snapshot a report now.
    pub fn snapshot(report: &Report) -> Self {
        Self {
            history_id: uuid::Uuid::new_v4().to_string(),
            saved_at: chrono::Utc::now().to_rfc3339(),
            report: report.clone(),
        }
    }
}
