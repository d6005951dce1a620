//! Editable working copy of a layout.
//!
//! A draft is mutable; publishing it through [`LayoutStore`](super::LayoutStore)
//! creates a new immutable version.

use super::{repair_field, LayoutError, LayoutResult};
use crate::models::{AutoFillRule, FieldKind, FieldPart, Layout, LayoutField};

/// Which part of a field an edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartSlot {
    Label,
    Value,
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LayoutDraft {
    fields: Vec<LayoutField>,
}

impl LayoutDraft {
    pub fn new(fields: Vec<LayoutField>) -> Self {
        Self { fields }
    }

    /// Start from an existing version.
    pub fn from_layout(layout: &Layout) -> Self {
        Self::new(layout.fields.clone())
    }

    pub fn fields(&self) -> &[LayoutField] {
        &self.fields
    }

    pub fn into_fields(self) -> Vec<LayoutField> {
        self.fields
    }

    fn position(&self, id: &str) -> LayoutResult<usize> {
        self.fields
            .iter()
            .position(|f| f.id == id)
            .ok_or_else(|| LayoutError::NotFound(id.to_string()))
    }

    fn unlocked_mut(&mut self, id: &str) -> LayoutResult<&mut LayoutField> {
        let index = self.position(id)?;
        let field = &mut self.fields[index];
        if field.is_effectively_locked() {
            return Err(LayoutError::Locked(id.to_string()));
        }
        Ok(field)
    }

    fn check_field_id_free(&self, field_id: &str) -> LayoutResult<()> {
        if field_id.trim().is_empty() {
            return Err(LayoutError::Invalid("fieldId must not be empty".into()));
        }
        if self.fields.iter().any(|f| f.field_id == field_id) {
            return Err(LayoutError::Invalid(format!("duplicate fieldId {}", field_id)));
        }
        Ok(())
    }

    /// Append a new field with default parts. Returns its generated id.
    pub fn add_field(&mut self, kind: FieldKind, field_id: &str) -> LayoutResult<String> {
        self.check_field_id_free(field_id)?;

        let mut field = LayoutField::text("", field_id, FieldPart::default(), FieldPart::default());
        field.id = uuid::Uuid::new_v4().to_string();
        field.kind = kind;
        if kind != FieldKind::Image {
            field.label = Some(FieldPart::default().with_text(field_id));
        }
        repair_field(&mut field);

        let id = field.id.clone();
        self.fields.push(field);
        Ok(id)
    }

    /// Remove an unlocked field.
    pub fn remove_field(&mut self, id: &str) -> LayoutResult<LayoutField> {
        self.unlocked_mut(id)?;
        let index = self.position(id)?;
        Ok(self.fields.remove(index))
    }

    /// Rename the data key of an unlocked field.
    pub fn set_field_id(&mut self, id: &str, field_id: &str) -> LayoutResult<()> {
        self.unlocked_mut(id)?;
        self.check_field_id_free(field_id)?;
        let field = self.unlocked_mut(id)?;
        field.field_id = field_id.to_string();
        Ok(())
    }

    /// Change the kind of an unlocked field, adjusting its slots.
    pub fn set_kind(&mut self, id: &str, kind: FieldKind) -> LayoutResult<()> {
        let field = self.unlocked_mut(id)?;
        field.kind = kind;
        repair_field(field);
        Ok(())
    }

    /// Lock or unlock a field. Identity fields stay locked regardless.
    pub fn set_locked(&mut self, id: &str, locked: bool) -> LayoutResult<()> {
        let index = self.position(id)?;
        self.fields[index].is_locked = locked;
        Ok(())
    }

    /// Attach or clear an auto-fill rule on a Text field.
    pub fn set_auto_fill(&mut self, id: &str, rule: Option<AutoFillRule>) -> LayoutResult<()> {
        let index = self.position(id)?;
        let field = &mut self.fields[index];
        if rule.is_some() && field.kind != FieldKind::Text {
            return Err(LayoutError::Invalid(format!("{} is not a text field", id)));
        }
        field.auto_fill = rule;
        Ok(())
    }

    /// Mutable access to one part for typography and choice edits.
    /// Allowed on locked fields.
    pub fn part_mut(&mut self, id: &str, slot: PartSlot) -> LayoutResult<&mut FieldPart> {
        let index = self.position(id)?;
        let field = &mut self.fields[index];
        let part = match slot {
            PartSlot::Label => field.label.as_mut(),
            PartSlot::Value => field.value.as_mut(),
            PartSlot::Placeholder => field.placeholder.as_mut(),
        };
        part.ok_or_else(|| LayoutError::Invalid(format!("{} has no {:?} part", id, slot)))
    }

    /// Move and resize a part (millimeters).
    pub fn move_part(
        &mut self,
        id: &str,
        slot: PartSlot,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> LayoutResult<()> {
        if ![x, y, width, height].iter().all(|v| v.is_finite()) {
            return Err(LayoutError::Invalid("geometry must be finite".into()));
        }
        let part = self.part_mut(id, slot)?;
        part.x = x;
        part.y = y;
        part.width = width.max(0.0);
        part.height = height.max(0.0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::default_layout;

    fn draft() -> LayoutDraft {
        LayoutDraft::from_layout(&default_layout())
    }

    fn id_of(draft: &LayoutDraft, field_id: &str) -> String {
        draft
            .fields()
            .iter()
            .find(|f| f.field_id == field_id)
            .unwrap()
            .id
            .clone()
    }

    #[test]
    fn test_add_field() {
        let mut draft = draft();
        let before = draft.fields().len();

        let id = draft.add_field(FieldKind::Image, "rearPhoto").unwrap();
        assert_eq!(id.len(), 36);
        assert_eq!(draft.fields().len(), before + 1);

        let added = draft.fields().last().unwrap();
        assert!(added.placeholder.is_some());
        assert!(added.label.is_none());

        assert!(matches!(
            draft.add_field(FieldKind::Text, "make"),
            Err(LayoutError::Invalid(_))
        ));
        assert!(matches!(
            draft.add_field(FieldKind::Text, ""),
            Err(LayoutError::Invalid(_))
        ));
    }

    #[test]
    fn test_locked_fields_resist_structural_edits() {
        let mut draft = draft();

        // Identity field: locked without the flag
        let number = id_of(&draft, "reportNumber");
        assert!(matches!(draft.remove_field(&number), Err(LayoutError::Locked(_))));
        assert!(matches!(
            draft.set_field_id(&number, "refNo"),
            Err(LayoutError::Locked(_))
        ));
        draft.set_locked(&number, false).unwrap();
        assert!(matches!(
            draft.set_kind(&number, FieldKind::StaticText),
            Err(LayoutError::Locked(_))
        ));

        // Flagged field
        let grade = id_of(&draft, "conditionGrade");
        assert!(matches!(draft.remove_field(&grade), Err(LayoutError::Locked(_))));

        // Geometry is still editable
        draft
            .move_part(&number, PartSlot::Value, 80.0, 30.0, 60.0, 7.0)
            .unwrap();
        assert_eq!(draft.part_mut(&number, PartSlot::Value).unwrap().x, 80.0);
    }

    #[test]
    fn test_unlock_then_remove() {
        let mut draft = draft();
        let grade = id_of(&draft, "conditionGrade");

        draft.set_locked(&grade, false).unwrap();
        let removed = draft.remove_field(&grade).unwrap();
        assert_eq!(removed.field_id, "conditionGrade");
    }

    #[test]
    fn test_set_field_id_and_kind() {
        let mut draft = draft();
        let model = id_of(&draft, "model");

        assert!(matches!(
            draft.set_field_id(&model, "make"),
            Err(LayoutError::Invalid(_))
        ));
        draft.set_field_id(&model, "variant").unwrap();
        draft.set_kind(&model, FieldKind::StaticText).unwrap();

        let field = draft.fields().iter().find(|f| f.id == model).unwrap();
        assert_eq!(field.field_id, "variant");
        assert!(field.value.is_none());
        assert!(matches!(
            draft.part_mut(&model, PartSlot::Value),
            Err(LayoutError::Invalid(_))
        ));
    }

    #[test]
    fn test_missing_field() {
        let mut draft = draft();
        assert!(matches!(draft.remove_field("nope"), Err(LayoutError::NotFound(_))));
        assert!(matches!(
            draft.move_part("nope", PartSlot::Label, 0.0, 0.0, 1.0, 1.0),
            Err(LayoutError::NotFound(_))
        ));
    }

    #[test]
    fn test_auto_fill_only_on_text() {
        let mut draft = draft();
        let photo = id_of(&draft, "vehiclePhoto");
        let rule = AutoFillRule::NumberToWords {
            source_field_id: "marketValueNum".into(),
        };
        assert!(matches!(
            draft.set_auto_fill(&photo, Some(rule)),
            Err(LayoutError::Invalid(_))
        ));
        draft.set_auto_fill(&photo, None).unwrap();
    }
}
