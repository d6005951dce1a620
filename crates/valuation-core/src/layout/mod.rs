//! Layout Store: immutable, versioned field layouts.
//!
//! Publishing writes a new version and moves the `current` pointer in one
//! transaction. Loading never fails on legacy shapes; fields are repaired,
//! and a missing layout falls back to the built-in default.

mod defaults;
mod editor;
mod repair;

pub use defaults::*;
pub use editor::*;
pub use repair::*;

use crate::auth::AuthorizationContext;
use crate::db::{Database, DbError};
use crate::models::{Layout, LayoutField, LayoutSummary};
use thiserror::Error;

/// Layout errors.
#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Layout not found: {0}")]
    NotFound(String),

    #[error("Invalid layout: {0}")]
    Invalid(String),

    #[error("Field is locked: {0}")]
    Locked(String),

    #[error("Not allowed to publish layouts: {0}")]
    Unauthorized(String),
}

pub type LayoutResult<T> = Result<T, LayoutError>;

/// Read and publish layouts.
pub struct LayoutStore<'a> {
    db: &'a Database,
}

impl<'a> LayoutStore<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Validate and publish a new version; it becomes current.
    ///
    /// Reports already saved keep referencing the version they were saved with.
    pub fn publish(
        &self,
        auth: &AuthorizationContext,
        fields: &[LayoutField],
    ) -> LayoutResult<Layout> {
        if !auth.can_publish_layouts() {
            return Err(LayoutError::Unauthorized(auth.email.clone()));
        }

        let fields = validate_fields(fields)?;
        let layout = self.db.publish_layout(&fields)?;

        tracing::info!(
            layout_id = %layout.id,
            version = layout.version,
            fields = layout.fields.len(),
            by = %auth.email,
            "published layout"
        );
        Ok(layout)
    }

    /// The current layout, `None` before the first publish.
    ///
    /// A pointer to a missing document is `NotFound`.
    pub fn current(&self) -> LayoutResult<Option<Layout>> {
        let pointer = self.db.get_layout_pointer()?;
        match pointer.current_id {
            None => Ok(None),
            Some(id) => self.by_id(&id).map(Some),
        }
    }

    /// Load a version by id, repaired for rendering.
    pub fn by_id(&self, id: &str) -> LayoutResult<Layout> {
        if id == DEFAULT_LAYOUT_ID {
            return Ok(default_layout());
        }
        self.db
            .get_layout(id)?
            .map(repair_layout)
            .ok_or_else(|| LayoutError::NotFound(id.to_string()))
    }

    /// The current layout, or the built-in default when none is usable.
    pub fn current_or_default(&self) -> LayoutResult<Layout> {
        match self.current() {
            Ok(Some(layout)) => Ok(layout),
            Ok(None) => {
                tracing::debug!("no published layout, using default");
                Ok(default_layout())
            }
            Err(LayoutError::NotFound(id)) => {
                tracing::warn!(layout_id = %id, "current layout missing, using default");
                Ok(default_layout())
            }
            Err(e) => Err(e),
        }
    }

    /// The layout a saved report was rendered with.
    ///
    /// Unsaved reports, and reports whose layout cannot be found, use the
    /// current layout.
    pub fn resolve_for_report(&self, layout_id: Option<&str>) -> LayoutResult<Layout> {
        let Some(id) = layout_id else {
            return self.current_or_default();
        };
        match self.by_id(id) {
            Ok(layout) => Ok(layout),
            Err(LayoutError::NotFound(_)) => {
                tracing::warn!(layout_id = %id, "report layout missing, falling back to current");
                self.current_or_default()
            }
            Err(e) => Err(e),
        }
    }

    /// Published versions, newest first.
    pub fn list_versions(&self) -> LayoutResult<Vec<LayoutSummary>> {
        Ok(self.db.list_layout_versions()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldPart;

    fn admin() -> AuthorizationContext {
        AuthorizationContext {
            email: "boss@valuers.in".into(),
            display_name: "Boss".into(),
            branch: None,
            admin: true,
        }
    }

    fn fields() -> Vec<LayoutField> {
        vec![LayoutField::text(
            "f1",
            "make",
            FieldPart::at(10.0, 10.0, 40.0, 6.0).with_text("Make"),
            FieldPart::at(55.0, 10.0, 80.0, 6.0),
        )]
    }

    #[test]
    fn test_publish_and_load_current() {
        let db = Database::open_in_memory().unwrap();
        let store = LayoutStore::new(&db);

        assert!(store.current().unwrap().is_none());

        let published = store.publish(&admin(), &fields()).unwrap();
        let current = store.current().unwrap().unwrap();
        assert_eq!(current, published);
        assert_eq!(store.by_id(&published.id).unwrap(), published);
    }

    #[test]
    fn test_publish_requires_capability() {
        let db = Database::open_in_memory().unwrap();
        let store = LayoutStore::new(&db);
        let clerk = AuthorizationContext {
            admin: false,
            ..admin()
        };

        assert!(matches!(
            store.publish(&clerk, &fields()),
            Err(LayoutError::Unauthorized(_))
        ));
        assert!(store.list_versions().unwrap().is_empty());
    }

    #[test]
    fn test_publish_rejects_invalid() {
        let db = Database::open_in_memory().unwrap();
        let store = LayoutStore::new(&db);
        let mut bad = fields();
        bad.push(bad[0].clone());

        assert!(matches!(
            store.publish(&admin(), &bad),
            Err(LayoutError::Invalid(_))
        ));
        assert_eq!(db.get_layout_pointer().unwrap().version, 0);
    }

    #[test]
    fn test_current_or_default() {
        let db = Database::open_in_memory().unwrap();
        let store = LayoutStore::new(&db);

        assert_eq!(store.current_or_default().unwrap().id, DEFAULT_LAYOUT_ID);

        // Dangling pointer
        db.conn().execute_batch("PRAGMA foreign_keys = OFF").unwrap();
        db.conn()
            .execute("UPDATE layout_config SET current_id = 'gone'", [])
            .unwrap();
        assert!(matches!(store.current(), Err(LayoutError::NotFound(_))));
        assert_eq!(store.current_or_default().unwrap().id, DEFAULT_LAYOUT_ID);
    }

    #[test]
    fn test_resolve_for_report() {
        let db = Database::open_in_memory().unwrap();
        let store = LayoutStore::new(&db);
        let v1 = store.publish(&admin(), &fields()).unwrap();
        let v2 = store.publish(&admin(), &[]).unwrap();

        assert_eq!(store.resolve_for_report(Some(&v1.id)).unwrap().id, v1.id);
        assert_eq!(store.resolve_for_report(None).unwrap().id, v2.id);
        assert_eq!(store.resolve_for_report(Some("missing")).unwrap().id, v2.id);
        assert_eq!(
            store.resolve_for_report(Some(DEFAULT_LAYOUT_ID)).unwrap().id,
            DEFAULT_LAYOUT_ID
        );
    }

    #[test]
    fn test_legacy_layout_repaired_on_load() {
        let db = Database::open_in_memory().unwrap();
        db.conn()
            .execute(
                "INSERT INTO layouts (id, version, fields) VALUES ('legacy', 1, ?)",
                [r#"[{"id": "p", "fieldId": "photo", "kind": "Image", "label": {"x": 3}}]"#],
            )
            .unwrap();

        let layout = LayoutStore::new(&db).by_id("legacy").unwrap();
        let photo = &layout.fields[0];
        assert!(photo.label.is_none());
        assert_eq!(photo.placeholder.as_ref().unwrap().color, "#000000");
    }
}
