//! Explicit authorization context.
//!
//! Capabilities are resolved once per session from the configured admin
//! allow-list and the `authorized_users` table, then passed to every
//! operation that needs them.

use crate::config::ValuationConfig;
use crate::db::Database;
use crate::models::{email_key, Editor};
use crate::numbering::BranchCode;
use crate::report::{ReportError, ReportResult};

/// Who is acting and what they may do.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorizationContext {
    pub email: String,
    pub display_name: String,
    /// Branch the user files reports under
    pub branch: Option<BranchCode>,
    pub admin: bool,
}

impl AuthorizationContext {
    /// Resolve the context for a signed-in email.
    ///
    /// Admins get every capability and pick up a branch if they also have an
    /// authorized-user entry. Everyone else must have one.
    pub fn resolve(db: &Database, email: &str, config: &ValuationConfig) -> ReportResult<Self> {
        let email = email.trim().to_lowercase();
        if email.is_empty() {
            return Err(ReportError::Unauthorized("no signed-in user".into()));
        }

        let admin = config.is_admin(&email);
        let entry = db.get_authorized_user(&email)?;

        let branch = match &entry {
            Some(user) => Some(
                BranchCode::parse(&user.branch)
                    .ok_or_else(|| ReportError::InvalidBranch(user.branch.clone()))?,
            ),
            None if admin => None,
            None => {
                tracing::warn!(email = %email, "sign-in by unauthorized user");
                return Err(ReportError::Unauthorized(email));
            }
        };

        Ok(Self {
            display_name: email.split('@').next().unwrap_or_default().to_string(),
            email,
            branch,
            admin,
        })
    }

    /// Builder: set the name stamped on saved reports.
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    /// Builder: file under a specific branch (admins acting for a branch).
    pub fn with_branch(mut self, branch: BranchCode) -> Self {
        self.branch = Some(branch);
        self
    }

    pub fn can_publish_layouts(&self) -> bool {
        self.admin
    }

    pub fn can_edit_reports(&self) -> bool {
        self.admin || self.branch.is_some()
    }

    /// Branch to number reports under.
    pub fn require_branch(&self) -> ReportResult<&BranchCode> {
        self.branch
            .as_ref()
            .ok_or_else(|| ReportError::Unauthorized(format!("{} has no branch", self.email)))
    }

    /// Attribution stamped on reports and history.
    pub fn editor(&self) -> Editor {
        Editor {
            user_id: email_key(&self.email),
            user_name: self.display_name.clone(),
            user_email: self.email.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AuthorizedUser;

    fn setup() -> (Database, ValuationConfig) {
        let db = Database::open_in_memory().unwrap();
        db.upsert_authorized_user(&AuthorizedUser {
            email: "ravi@valuers.in".into(),
            branch: "CDH".into(),
        })
        .unwrap();

        let config = ValuationConfig {
            admin_emails: vec!["boss@valuers.in".into()],
            ..ValuationConfig::default()
        };
        (db, config)
    }

    #[test]
    fn test_staff_inherits_branch() {
        let (db, config) = setup();
        let ctx = AuthorizationContext::resolve(&db, " Ravi@Valuers.in", &config).unwrap();

        assert_eq!(ctx.require_branch().unwrap().as_str(), "CDH");
        assert!(ctx.can_edit_reports());
        assert!(!ctx.can_publish_layouts());
        assert_eq!(ctx.editor().user_id, "ravi_valuers_in");
        assert_eq!(ctx.editor().user_name, "ravi");
    }

    #[test]
    fn test_admin_without_branch() {
        let (db, config) = setup();
        let ctx = AuthorizationContext::resolve(&db, "boss@valuers.in", &config).unwrap();

        assert!(ctx.can_publish_layouts());
        assert!(ctx.can_edit_reports());
        assert!(matches!(ctx.require_branch(), Err(ReportError::Unauthorized(_))));

        let ctx = ctx.with_branch(BranchCode::parse("mum").unwrap());
        assert_eq!(ctx.require_branch().unwrap().as_str(), "MUM");
    }

    #[test]
    fn test_unknown_user_rejected() {
        let (db, config) = setup();
        let result = AuthorizationContext::resolve(&db, "stranger@gmail.com", &config);
        assert!(matches!(result, Err(ReportError::Unauthorized(_))));

        let result = AuthorizationContext::resolve(&db, "  ", &config);
        assert!(matches!(result, Err(ReportError::Unauthorized(_))));
    }

    #[test]
    fn test_bad_branch_in_table() {
        let (db, config) = setup();
        db.upsert_authorized_user(&AuthorizedUser {
            email: "odd@valuers.in".into(),
            branch: "C1".into(),
        })
        .unwrap();

        let result = AuthorizationContext::resolve(&db, "odd@valuers.in", &config);
        assert!(matches!(result, Err(ReportError::InvalidBranch(_))));
    }
}
