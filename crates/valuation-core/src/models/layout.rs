//! Layout models: versioned field templates with millimeter geometry.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Field ids that are always display-only and structurally locked.
pub const IDENTITY_FIELD_IDS: &[&str] = &["reportNumber", "registrationNumber", "valuationCode"];

/// Check whether a data key is one of the protected identity keys.
///
/// Matches the fixed identity ids case-insensitively, plus any key containing
/// `reportnum` in any casing.
pub fn is_identity_key(key: &str) -> bool {
    let lower = key.to_lowercase();
    lower.contains("reportnum")
        || IDENTITY_FIELD_IDS
            .iter()
            .any(|id| id.to_lowercase() == lower)
}

/// What a layout field renders as.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum FieldKind {
    /// Static label plus an editable value
    #[default]
    Text,
    /// Image slot rendered from the placeholder part
    Image,
    /// Static label only
    StaticText,
}

/// Horizontal text alignment inside a part's box.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Input discipline for a value part.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum InputMode {
    /// Anything goes
    #[default]
    FreeText,
    /// Only listed choices are accepted
    FixedChoice,
    /// Choices are offered but free text is allowed
    SuggestedChoice,
}

/// Default text color for every part.
pub const DEFAULT_COLOR: &str = "#000000";

/// Default font size (points) for every part.
pub const DEFAULT_FONT_SIZE: f64 = 12.0;

/// One positioned part of a field (label, value or placeholder).
///
/// Every property carries a default so legacy documents missing keys still
/// deserialize.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct FieldPart {
    /// Left edge in mm
    pub x: f64,
    /// Top edge in mm
    pub y: f64,
    /// Width in mm
    pub width: f64,
    /// Height in mm
    pub height: f64,
    pub bold: bool,
    pub color: String,
    pub font_size: f64,
    pub align: TextAlign,
    /// Static text (label caption or placeholder caption)
    pub text: String,
    /// Input discipline (value parts only)
    pub input_mode: InputMode,
    /// Ordered choices (value parts only)
    pub options: Vec<String>,
    /// Choice -> numeric weight used by report number derivation
    pub option_weights: BTreeMap<String, f64>,
}

impl Default for FieldPart {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            bold: false,
            color: DEFAULT_COLOR.to_string(),
            font_size: DEFAULT_FONT_SIZE,
            align: TextAlign::Left,
            text: String::new(),
            input_mode: InputMode::FreeText,
            options: Vec::new(),
            option_weights: BTreeMap::new(),
        }
    }
}

impl FieldPart {
    /// Create a part at the given position and size.
    pub fn at(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            ..Self::default()
        }
    }

    /// Builder: set the static text.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Builder: set choices and input mode.
    pub fn with_choices(mut self, mode: InputMode, options: &[&str]) -> Self {
        self.input_mode = mode;
        self.options = options.iter().map(|o| o.to_string()).collect();
        self
    }

    /// Builder: attach a weight to a choice.
    pub fn with_weight(mut self, choice: &str, weight: f64) -> Self {
        self.option_weights.insert(choice.to_string(), weight);
        self
    }

    /// Builder: bold text.
    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }
}

/// Declarative auto-fill rule on a target field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AutoFillRule {
    /// Write the English words for the source field's amount
    NumberToWords {
        #[serde(rename = "sourceFieldId")]
        source_field_id: String,
    },
}

impl AutoFillRule {
    /// Field id this rule listens to.
    pub fn source_field_id(&self) -> &str {
        match self {
            AutoFillRule::NumberToWords { source_field_id } => source_field_id,
        }
    }
}

/// One logical form field in a layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LayoutField {
    /// Stable identifier within the layout
    pub id: String,
    /// Key into the report data dictionary
    #[serde(default)]
    pub field_id: String,
    #[serde(default)]
    pub kind: FieldKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<FieldPart>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<FieldPart>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<FieldPart>,
    #[serde(default)]
    pub is_locked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_fill: Option<AutoFillRule>,
}

impl LayoutField {
    /// Text field with a label and an editable value part.
    pub fn text(id: &str, field_id: &str, label: FieldPart, value: FieldPart) -> Self {
        Self {
            id: id.to_string(),
            field_id: field_id.to_string(),
            kind: FieldKind::Text,
            label: Some(label),
            value: Some(value),
            placeholder: None,
            is_locked: false,
            auto_fill: None,
        }
    }

    /// Static caption with no value.
    pub fn static_text(id: &str, field_id: &str, label: FieldPart) -> Self {
        Self {
            id: id.to_string(),
            field_id: field_id.to_string(),
            kind: FieldKind::StaticText,
            label: Some(label),
            value: None,
            placeholder: None,
            is_locked: false,
            auto_fill: None,
        }
    }

    /// Image slot.
    pub fn image(id: &str, field_id: &str, placeholder: FieldPart) -> Self {
        Self {
            id: id.to_string(),
            field_id: field_id.to_string(),
            kind: FieldKind::Image,
            label: None,
            value: None,
            placeholder: Some(placeholder),
            is_locked: false,
            auto_fill: None,
        }
    }

    /// Builder: attach an auto-fill rule.
    pub fn with_auto_fill(mut self, rule: AutoFillRule) -> Self {
        self.auto_fill = Some(rule);
        self
    }

    /// Builder: lock the field.
    pub fn locked(mut self) -> Self {
        self.is_locked = true;
        self
    }

    /// Identity fields are locked regardless of the stored flag.
    pub fn is_effectively_locked(&self) -> bool {
        self.is_locked || is_identity_key(&self.field_id)
    }

    /// Static label text, empty if the field has no label part.
    pub fn label_text(&self) -> &str {
        self.label.as_ref().map(|l| l.text.as_str()).unwrap_or("")
    }

    /// Configured weight for a choice on this field's value part.
    pub fn option_weight(&self, choice: &str) -> Option<f64> {
        self.value
            .as_ref()
            .and_then(|v| v.option_weights.get(choice))
            .copied()
    }

    /// Whether this field's value part maps any choice to a weight.
    pub fn has_option_weights(&self) -> bool {
        self.value
            .as_ref()
            .map(|v| !v.option_weights.is_empty())
            .unwrap_or(false)
    }
}

/// An immutable, versioned sequence of layout fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    pub id: String,
    pub version: u32,
    pub fields: Vec<LayoutField>,
    pub created_at: String,
}

impl Layout {
    /// Look up a field by its data key.
    pub fn field(&self, field_id: &str) -> Option<&LayoutField> {
        self.fields.iter().find(|f| f.field_id == field_id)
    }

    /// Fields whose auto-fill rule listens to `source_field_id`.
    pub fn auto_fill_targets<'a>(
        &'a self,
        source_field_id: &'a str,
    ) -> impl Iterator<Item = &'a LayoutField> + 'a {
        self.fields.iter().filter(move |f| {
            f.auto_fill
                .as_ref()
                .map(|rule| rule.source_field_id() == source_field_id)
                .unwrap_or(false)
        })
    }

    /// Whether some field auto-fills from `field_id`.
    pub fn is_auto_fill_source(&self, field_id: &str) -> bool {
        self.auto_fill_targets(field_id).next().is_some()
    }

    /// The condition-grade field: the preferred id if present, otherwise the
    /// first Text field whose choices carry weights.
    pub fn grade_field(&self, preferred_field_id: &str) -> Option<&LayoutField> {
        self.field(preferred_field_id).or_else(|| {
            self.fields
                .iter()
                .find(|f| f.kind == FieldKind::Text && f.has_option_weights())
        })
    }
}

/// Singleton pointer to the current layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct LayoutPointer {
    /// Highest version published so far
    pub version: u32,
    /// Id of the current layout, `None` before the first publish
    pub current_id: Option<String>,
}

/// Listing entry for published layout versions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSummary {
    pub id: String,
    pub version: u32,
    pub field_count: usize,
    pub created_at: String,
}
