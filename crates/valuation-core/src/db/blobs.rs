//! Content-addressed blob store for report images.

use rusqlite::{params, OptionalExtension};
use sha2::{Digest, Sha256};

use super::{Database, DbResult};
use crate::models::ImageData;

/// URL scheme for stored blobs.
pub const BLOB_URL_SCHEME: &str = "blob://";

/// A stored blob.
#[derive(Debug, Clone, PartialEq)]
pub struct Blob {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Database {
    /// Store image bytes and return a retrievable reference.
    ///
    /// Identical content is stored once.
    pub fn put_blob(&self, bytes: &[u8], content_type: &str) -> DbResult<ImageData> {
        let blob_id = hex::encode(Sha256::digest(bytes));

        self.conn.execute(
            "INSERT OR IGNORE INTO blobs (blob_id, content_type, bytes) VALUES (?1, ?2, ?3)",
            params![blob_id, content_type, bytes],
        )?;

        Ok(ImageData {
            url: format!("{}{}", BLOB_URL_SCHEME, blob_id),
            content_type: Some(content_type.to_string()),
        })
    }

    /// Resolve a `blob://` URL back to its bytes.
    pub fn get_blob(&self, url: &str) -> DbResult<Option<Blob>> {
        let Some(blob_id) = url.strip_prefix(BLOB_URL_SCHEME) else {
            return Ok(None);
        };

        self.conn
            .query_row(
                "SELECT content_type, bytes FROM blobs WHERE blob_id = ?",
                [blob_id],
                |row| {
                    Ok(Blob {
                        content_type: row.get(0)?,
                        bytes: row.get(1)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }
}
