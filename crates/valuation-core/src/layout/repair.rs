//! Layout validation and load-time repair.
//!
//! Stored layouts are never rejected at load; historical reports must stay
//! renderable. Slots that do not match the field kind are dropped or filled,
//! and parts with unusable typography get the documented defaults.

use std::collections::HashSet;

use super::{LayoutError, LayoutResult};
use crate::models::{FieldKind, FieldPart, Layout, LayoutField, DEFAULT_COLOR, DEFAULT_FONT_SIZE};

/// Repair a part in place. Returns the names of the properties that were reset.
fn repair_part(part: &mut FieldPart) -> Vec<&'static str> {
    let mut fixed = Vec::new();

    for (name, value) in [
        ("x", &mut part.x),
        ("y", &mut part.y),
        ("width", &mut part.width),
        ("height", &mut part.height),
    ] {
        if !value.is_finite() {
            *value = 0.0;
            fixed.push(name);
        }
    }
    if !part.font_size.is_finite() || part.font_size <= 0.0 {
        part.font_size = DEFAULT_FONT_SIZE;
        fixed.push("fontSize");
    }
    if part.color.trim().is_empty() {
        part.color = DEFAULT_COLOR.to_string();
        fixed.push("color");
    }

    fixed
}

fn ensure(slot: &mut Option<FieldPart>, name: &'static str, fixed: &mut Vec<&'static str>) {
    if slot.is_none() {
        *slot = Some(FieldPart::default());
        fixed.push(name);
    }
}

fn clear(slot: &mut Option<FieldPart>, name: &'static str, fixed: &mut Vec<&'static str>) {
    if slot.take().is_some() {
        fixed.push(name);
    }
}

/// Make a field's populated slots agree with its kind and default any
/// unusable part properties. Returns what was changed.
pub fn repair_field(field: &mut LayoutField) -> Vec<&'static str> {
    let mut fixed = Vec::new();

    match field.kind {
        FieldKind::Text => {
            ensure(&mut field.label, "label", &mut fixed);
            ensure(&mut field.value, "value", &mut fixed);
            clear(&mut field.placeholder, "placeholder", &mut fixed);
        }
        FieldKind::StaticText => {
            ensure(&mut field.label, "label", &mut fixed);
            clear(&mut field.value, "value", &mut fixed);
            clear(&mut field.placeholder, "placeholder", &mut fixed);
        }
        FieldKind::Image => {
            clear(&mut field.label, "label", &mut fixed);
            clear(&mut field.value, "value", &mut fixed);
            ensure(&mut field.placeholder, "placeholder", &mut fixed);
        }
    }

    for part in [&mut field.label, &mut field.value, &mut field.placeholder]
        .into_iter()
        .flatten()
    {
        fixed.extend(repair_part(part));
    }

    if field.kind != FieldKind::Text && field.auto_fill.take().is_some() {
        fixed.push("autoFill");
    }

    fixed
}

/// Repair every field of a loaded layout, logging each change.
pub fn repair_layout(mut layout: Layout) -> Layout {
    for field in &mut layout.fields {
        let fixed = repair_field(field);
        if !fixed.is_empty() {
            tracing::warn!(
                layout_id = %layout.id,
                field_id = %field.field_id,
                repaired = ?fixed,
                "repaired layout field at load"
            );
        }
    }
    layout
}

/// Validate fields for publishing and return the repaired copy.
///
/// Empty or duplicate `id`/`fieldId` values are rejected; slot mismatches
/// are repaired.
pub fn validate_fields(fields: &[LayoutField]) -> LayoutResult<Vec<LayoutField>> {
    let mut ids = HashSet::new();
    let mut field_ids = HashSet::new();
    let mut repaired = Vec::with_capacity(fields.len());

    for (index, field) in fields.iter().enumerate() {
        if field.id.trim().is_empty() {
            return Err(LayoutError::Invalid(format!("field {} has an empty id", index)));
        }
        if field.field_id.trim().is_empty() {
            return Err(LayoutError::Invalid(format!(
                "field {} has an empty fieldId",
                field.id
            )));
        }
        if !ids.insert(field.id.as_str()) {
            return Err(LayoutError::Invalid(format!("duplicate id {}", field.id)));
        }
        if !field_ids.insert(field.field_id.as_str()) {
            return Err(LayoutError::Invalid(format!(
                "duplicate fieldId {}",
                field.field_id
            )));
        }

        let mut field = field.clone();
        let fixed = repair_field(&mut field);
        if !fixed.is_empty() {
            tracing::debug!(field_id = %field.field_id, repaired = ?fixed, "repaired field before publish");
        }
        repaired.push(field);
    }

    Ok(repaired)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AutoFillRule;

    fn text(id: &str, field_id: &str) -> LayoutField {
        LayoutField::text(id, field_id, FieldPart::default(), FieldPart::default())
    }

    #[test]
    fn test_image_keeps_only_placeholder() {
        let mut field = text("f1", "photo");
        field.kind = FieldKind::Image;

        let fixed = repair_field(&mut field);
        assert_eq!(fixed, vec!["label", "value", "placeholder"]);
        assert!(field.label.is_none());
        assert!(field.value.is_none());
        assert!(field.placeholder.is_some());
    }

    #[test]
    fn test_text_gets_label_and_value() {
        let mut field = LayoutField::image("f1", "make", FieldPart::default());
        field.kind = FieldKind::Text;

        repair_field(&mut field);
        assert!(field.label.is_some());
        assert!(field.value.is_some());
        assert!(field.placeholder.is_none());
    }

    #[test]
    fn test_static_text_drops_value_and_auto_fill() {
        let mut field = text("f1", "heading").with_auto_fill(AutoFillRule::NumberToWords {
            source_field_id: "x".into(),
        });
        field.kind = FieldKind::StaticText;

        let fixed = repair_field(&mut field);
        assert!(fixed.contains(&"value"));
        assert!(fixed.contains(&"autoFill"));
        assert!(field.value.is_none());
    }

    #[test]
    fn test_bad_part_properties_defaulted() {
        let mut part = FieldPart::default();
        part.x = f64::NAN;
        part.font_size = 0.0;
        part.color = " ".into();
        let mut field = LayoutField::text("f1", "make", part, FieldPart::default());

        let fixed = repair_field(&mut field);
        assert_eq!(fixed, vec!["x", "fontSize", "color"]);
        let label = field.label.unwrap();
        assert_eq!(label.x, 0.0);
        assert_eq!(label.font_size, DEFAULT_FONT_SIZE);
        assert_eq!(label.color, DEFAULT_COLOR);
    }

    #[test]
    fn test_well_formed_field_untouched() {
        let mut field = text("f1", "make");
        assert!(repair_field(&mut field).is_empty());
    }

    #[test]
    fn test_validate_rejects_empty_and_duplicates() {
        assert!(matches!(
            validate_fields(&[text("f1", " ")]),
            Err(LayoutError::Invalid(_))
        ));
        assert!(matches!(
            validate_fields(&[text("", "make")]),
            Err(LayoutError::Invalid(_))
        ));
        assert!(matches!(
            validate_fields(&[text("f1", "make"), text("f2", "make")]),
            Err(LayoutError::Invalid(_))
        ));
        assert!(matches!(
            validate_fields(&[text("f1", "make"), text("f1", "model")]),
            Err(LayoutError::Invalid(_))
        ));
    }

    #[test]
    fn test_validate_repairs_slots() {
        let mut field = text("f1", "photo");
        field.kind = FieldKind::Image;

        let fields = validate_fields(&[field]).unwrap();
        assert!(fields[0].value.is_none());
        assert!(fields[0].placeholder.is_some());
    }
}
