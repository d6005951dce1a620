//! Authorized user database operations.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbResult};
use crate::models::{email_key, AuthorizedUser};

impl Database {
    /// Add or update an authorized user.
    pub fn upsert_authorized_user(&self, user: &AuthorizedUser) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO authorized_users (email_key, email, branch)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(email_key) DO UPDATE SET
                email = excluded.email,
                branch = excluded.branch
            "#,
            params![
                email_key(&user.email),
                user.email.trim().to_lowercase(),
                user.branch.trim().to_uppercase(),
            ],
        )?;
        Ok(())
    }

    /// Look up an authorized user by email.
    pub fn get_authorized_user(&self, email: &str) -> DbResult<Option<AuthorizedUser>> {
        self.conn
            .query_row(
                "SELECT email, branch FROM authorized_users WHERE email_key = ?",
                [email_key(email)],
                |row| {
                    Ok(AuthorizedUser {
                        email: row.get(0)?,
                        branch: row.get(1)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    /// List all authorized users.
    pub fn list_authorized_users(&self) -> DbResult<Vec<AuthorizedUser>> {
        let mut stmt = self
            .conn
            .prepare("SELECT email, branch FROM authorized_users ORDER BY email")?;
        let rows = stmt.query_map([], |row| {
            Ok(AuthorizedUser {
                email: row.get(0)?,
                branch: row.get(1)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_and_get_user() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_authorized_user(&AuthorizedUser {
            email: "Ravi.K@Valuers.in".into(),
            branch: "cdh".into(),
        })
        .unwrap();

        let user = db.get_authorized_user("ravi.k@valuers.in").unwrap().unwrap();
        assert_eq!(user.email, "ravi.k@valuers.in");
        assert_eq!(user.branch, "CDH");

        db.upsert_authorized_user(&AuthorizedUser {
            email: "ravi.k@valuers.in".into(),
            branch: "MUM".into(),
        })
        .unwrap();
        let users = db.list_authorized_users().unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].branch, "MUM");
    }

    #[test]
    fn test_unknown_user() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.get_authorized_user("nobody@x.in").unwrap().is_none());
    }
}
