//! Layout database operations.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::models::{Layout, LayoutField, LayoutPointer, LayoutSummary};

impl Database {
    /// Publish a new immutable layout version and point `current` at it.
    ///
    /// Runs as one immediate transaction: read pointer, increment version,
    /// insert layout, update pointer.
    pub fn publish_layout(&self, fields: &[LayoutField]) -> DbResult<Layout> {
        let tx = self.immediate_transaction()?;

        let pointer = self.get_layout_pointer()?;
        let stored_max: u32 = self.conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM layouts",
            [],
            |row| row.get(0),
        )?;

        let layout = Layout {
            id: uuid::Uuid::new_v4().to_string(),
            version: pointer.version.max(stored_max) + 1,
            fields: fields.to_vec(),
            created_at: chrono::Utc::now().to_rfc3339(),
        };

        self.insert_layout(&layout)?;
        self.set_layout_pointer(layout.version, &layout.id)?;

        tx.commit()?;
        Ok(layout)
    }

    /// Insert a layout document.
    fn insert_layout(&self, layout: &Layout) -> DbResult<()> {
        let fields_json = serde_json::to_string(&layout.fields)?;
        self.conn.execute(
            "INSERT INTO layouts (id, version, fields, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![layout.id, layout.version, fields_json, layout.created_at],
        )?;
        Ok(())
    }

    /// Get a layout by ID.
    pub fn get_layout(&self, id: &str) -> DbResult<Option<Layout>> {
        self.conn
            .query_row(
                "SELECT id, version, fields, created_at FROM layouts WHERE id = ?",
                [id],
                |row| {
                    Ok(LayoutRow {
                        id: row.get(0)?,
                        version: row.get(1)?,
                        fields: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                },
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Get the current layout pointer.
    pub fn get_layout_pointer(&self) -> DbResult<LayoutPointer> {
        self.conn
            .query_row(
                "SELECT version, current_id FROM layout_config WHERE id = 1",
                [],
                |row| {
                    Ok(LayoutPointer {
                        version: row.get(0)?,
                        current_id: row.get(1)?,
                    })
                },
            )
            .map_err(Into::into)
    }

    /// Move the current pointer.
    fn set_layout_pointer(&self, version: u32, current_id: &str) -> DbResult<()> {
        self.conn.execute(
            r#"
            UPDATE layout_config
            SET version = ?, current_id = ?, updated_at = datetime('now')
            WHERE id = 1
            "#,
            params![version, current_id],
        )?;
        Ok(())
    }

    /// List published versions, newest first.
    pub fn list_layout_versions(&self) -> DbResult<Vec<LayoutSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, version, fields, created_at FROM layouts ORDER BY version DESC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(LayoutRow {
                id: row.get(0)?,
                version: row.get(1)?,
                fields: row.get(2)?,
                created_at: row.get(3)?,
            })
        })?;

        let mut summaries = Vec::new();
        for row in rows {
            let layout: Layout = row?.try_into()?;
            summaries.push(LayoutSummary {
                id: layout.id,
                version: layout.version,
                field_count: layout.fields.len(),
                created_at: layout.created_at,
            });
        }
        Ok(summaries)
    }
}

/// Intermediate row struct for database mapping.
struct LayoutRow {
    id: String,
    version: u32,
    fields: String,
    created_at: String,
}

impl TryFrom<LayoutRow> for Layout {
    type Error = DbError;

    fn try_from(row: LayoutRow) -> Result<Self, Self::Error> {
        Ok(Layout {
            fields: decode_fields(&row.id, &row.fields)?,
            id: row.id,
            version: row.version,
            created_at: row.created_at,
        })
    }
}

/// Decode stored fields one by one so a single unreadable entry does not make
/// the whole layout unrenderable.
fn decode_fields(layout_id: &str, raw: &str) -> DbResult<Vec<LayoutField>> {
    let values: Vec<serde_json::Value> = serde_json::from_str(raw)?;
    let mut fields = Vec::with_capacity(values.len());
    for (index, value) in values.into_iter().enumerate() {
        match serde_json::from_value::<LayoutField>(value) {
            Ok(field) => fields.push(field),
            Err(e) => {
                tracing::warn!(layout_id, index, error = %e, "skipping unreadable layout field");
            }
        }
    }
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldPart;

    fn sample_fields() -> Vec<LayoutField> {
        vec![LayoutField::text(
            "f1",
            "make",
            FieldPart::at(10.0, 20.0, 30.0, 6.0).with_text("Make"),
            FieldPart::at(45.0, 20.0, 60.0, 6.0),
        )]
    }

    #[test]
    fn test_publish_increments_version() {
        let db = Database::open_in_memory().unwrap();

        let first = db.publish_layout(&sample_fields()).unwrap();
        let second = db.publish_layout(&sample_fields()).unwrap();

        assert_eq!(first.version, 1);
        assert_eq!(second.version, 2);

        let pointer = db.get_layout_pointer().unwrap();
        assert_eq!(pointer.version, 2);
        assert_eq!(pointer.current_id, Some(second.id.clone()));
    }

    #[test]
    fn test_get_layout_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let published = db.publish_layout(&sample_fields()).unwrap();

        let loaded = db.get_layout(&published.id).unwrap().unwrap();
        assert_eq!(loaded, published);
        assert!(db.get_layout("missing").unwrap().is_none());
    }

    #[test]
    fn test_empty_pointer() {
        let db = Database::open_in_memory().unwrap();
        let pointer = db.get_layout_pointer().unwrap();
        assert_eq!(pointer.version, 0);
        assert!(pointer.current_id.is_none());
    }

    #[test]
    fn test_unreadable_field_skipped() {
        let db = Database::open_in_memory().unwrap();
        db.conn()
            .execute(
                "INSERT INTO layouts (id, version, fields) VALUES ('legacy', 1, ?)",
                [r#"[{"id": "a", "fieldId": "make"}, {"id": "b", "kind": "Barcode"}]"#],
            )
            .unwrap();

        let layout = db.get_layout("legacy").unwrap().unwrap();
        assert_eq!(layout.fields.len(), 1);
        assert_eq!(layout.fields[0].field_id, "make");
    }

    #[test]
    fn test_list_versions_newest_first() {
        let db = Database::open_in_memory().unwrap();
        db.publish_layout(&sample_fields()).unwrap();
        db.publish_layout(&[]).unwrap();

        let versions = db.list_layout_versions().unwrap();
        assert_eq!(versions.len(), 2);
        assert_eq!(versions[0].version, 2);
        assert_eq!(versions[0].field_count, 0);
        assert_eq!(versions[1].field_count, 1);
    }
}
