//! Authorized staff records.

use serde::{Deserialize, Serialize};

/// A staff member allowed to create reports, tied to a branch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizedUser {
    pub email: String,
    /// Three-letter branch code
    pub branch: String,
}

/// Who made a change, stamped onto reports and history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Editor {
    pub user_id: String,
    pub user_name: String,
    pub user_email: String,
}

/// Storage key for an email: `.` and `@` become `_`.
pub fn email_key(email: &str) -> String {
    email
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == '.' || c == '@' { '_' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_key() {
        assert_eq!(email_key("ravi.k@valuers.in"), "ravi_k_valuers_in");
        assert_eq!(email_key(" Ravi.K@Valuers.in "), "ravi_k_valuers_in");
    }
}
