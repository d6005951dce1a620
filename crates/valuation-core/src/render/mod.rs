//! Report Renderer/Binder.
//!
//! Projects a report's data dictionary through a layout version into three
//! parallel render lists, and applies the per-field interaction rules.
//!
//! ```text
//!   Layout.fields ──┬─ Text ───────▶ label entry + value entry
//!                   ├─ StaticText ─▶ label entry
//!                   └─ Image ──────▶ image entry
//!   data keys without a field ─────▶ unbound_keys
//! ```

mod choices;
mod edit;
mod identify;
mod words;

pub use choices::*;
pub use edit::*;
pub use identify::*;
pub use words::*;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::models::{
    is_identity_key, FieldKind, FieldPart, ImageData, Layout, ReportData, ReportValue,
};

/// Static caption of a Text or StaticText field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LabelEntry {
    pub id: String,
    pub field_id: String,
    pub text: String,
    pub part: FieldPart,
}

/// Editable value of a Text field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValueEntry {
    pub id: String,
    pub field_id: String,
    pub value: String,
    pub part: FieldPart,
    /// Driven by the number deriver, not typed
    pub read_only: bool,
}

/// Image slot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageEntry {
    pub id: String,
    pub field_id: String,
    pub image: ImageData,
    pub part: FieldPart,
}

/// Render-ready lists, each in layout field order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Projection {
    pub labels: Vec<LabelEntry>,
    pub values: Vec<ValueEntry>,
    pub images: Vec<ImageEntry>,
    /// Data keys no field in this layout binds
    pub unbound_keys: Vec<String>,
}

fn image_value(value: Option<&ReportValue>) -> ImageData {
    match value {
        Some(ReportValue::Image(image)) => image.clone(),
        Some(ReportValue::Text(url)) if !url.trim().is_empty() => ImageData {
            url: url.clone(),
            content_type: None,
        },
        _ => ImageData::default(),
    }
}

/// Bind data to a layout.
pub fn project(layout: &Layout, data: &ReportData) -> Projection {
    let mut projection = Projection::default();

    for field in &layout.fields {
        match field.kind {
            FieldKind::Text | FieldKind::StaticText => {
                projection.labels.push(LabelEntry {
                    id: field.id.clone(),
                    field_id: field.field_id.clone(),
                    text: field.label_text().to_string(),
                    part: field.label.clone().unwrap_or_default(),
                });
            }
            FieldKind::Image => {}
        }

        match field.kind {
            FieldKind::Text => projection.values.push(ValueEntry {
                id: field.id.clone(),
                field_id: field.field_id.clone(),
                value: data
                    .get(&field.field_id)
                    .map(ReportValue::as_display)
                    .unwrap_or_default(),
                part: field.value.clone().unwrap_or_default(),
                read_only: is_identity_key(&field.field_id),
            }),
            FieldKind::Image => projection.images.push(ImageEntry {
                id: field.id.clone(),
                field_id: field.field_id.clone(),
                image: image_value(data.get(&field.field_id)),
                part: field.placeholder.clone().unwrap_or_default(),
            }),
            FieldKind::StaticText => {}
        }
    }

    let bound: HashSet<&str> = layout.fields.iter().map(|f| f.field_id.as_str()).collect();
    projection.unbound_keys = data
        .keys()
        .filter(|key| !bound.contains(key.as_str()))
        .cloned()
        .collect();
    if !projection.unbound_keys.is_empty() {
        tracing::debug!(
            layout_id = %layout.id,
            keys = ?projection.unbound_keys,
            "report data has keys the layout does not bind"
        );
    }

    projection
}
