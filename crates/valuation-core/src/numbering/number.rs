//! Report number value type.

use std::fmt;

/// Sequence placeholder carried by provisional numbers.
pub const PLACEHOLDER_SEQUENCE: &str = "---";

/// Marker stored before any number could be derived.
pub const PENDING_MARKER: &str = "PENDING";

/// Largest sequence that fits in three digits.
pub const MAX_SEQUENCE: u32 = 999;

/// Three-letter uppercase branch code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BranchCode(String);

impl BranchCode {
    /// Parse a branch code, uppercasing it. `None` unless exactly three ASCII letters.
    pub fn parse(raw: &str) -> Option<Self> {
        let code = raw.trim().to_uppercase();
        if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
            Some(Self(code))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BranchCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A parsed report number: branch, date code, grade digit and sequence.
///
/// `sequence` is `None` for provisional numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportNumber {
    pub branch: BranchCode,
    pub date_code: String,
    pub grade: char,
    pub sequence: Option<u32>,
}

impl ReportNumber {
    /// Provisional number with the placeholder sequence.
    pub fn provisional(branch: &BranchCode, date_code: &str, grade: char) -> Self {
        Self {
            branch: branch.clone(),
            date_code: date_code.to_string(),
            grade,
            sequence: None,
        }
    }

    /// Parse a stored number. Returns `None` for anything not in the
    /// `BBB` + date code + grade + (`---` | three digits) shape.
    pub fn parse(raw: &str) -> Option<Self> {
        let s = raw.trim();
        if !s.is_ascii() || s.len() < 10 || s.len() > 12 {
            return None;
        }

        let branch = BranchCode::parse(&s[..3])?;
        if &s[..3] != branch.as_str() {
            return None;
        }

        let tail = &s[s.len() - 3..];
        let sequence = if tail == PLACEHOLDER_SEQUENCE {
            None
        } else if tail.chars().all(|c| c.is_ascii_digit()) {
            Some(tail.parse().ok()?)
        } else {
            return None;
        };

        let grade = s[s.len() - 4..].chars().next()?;
        if !grade.is_ascii_digit() {
            return None;
        }

        let date_code = &s[3..s.len() - 4];
        if !date_code.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }

        Some(Self {
            branch,
            date_code: date_code.to_string(),
            grade,
            sequence,
        })
    }

    /// Whether a permanent sequence has been allocated.
    pub fn is_issued(&self) -> bool {
        self.sequence.is_some()
    }

    /// Branch + date code: the scope sequences are counted in.
    pub fn prefix(&self) -> String {
        format!("{}{}", self.branch, self.date_code)
    }

    /// Same number with a different grade digit.
    pub fn with_grade(&self, grade: char) -> Self {
        Self {
            grade,
            ..self.clone()
        }
    }

    /// Same number with an allocated sequence.
    pub fn with_sequence(&self, sequence: u32) -> Self {
        Self {
            sequence: Some(sequence),
            ..self.clone()
        }
    }
}

impl fmt::Display for ReportNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.branch, self.date_code, self.grade)?;
        match self.sequence {
            Some(seq) => write!(f, "{:03}", seq),
            None => f.write_str(PLACEHOLDER_SEQUENCE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_branch_code() {
        assert_eq!(BranchCode::parse(" cdh ").unwrap().as_str(), "CDH");
        assert!(BranchCode::parse("CD").is_none());
        assert!(BranchCode::parse("CD1").is_none());
        assert!(BranchCode::parse("CDHX").is_none());
    }

    #[test]
    fn test_parse_issued() {
        let number = ReportNumber::parse("CDH25467001").unwrap();
        assert_eq!(number.branch.as_str(), "CDH");
        assert_eq!(number.date_code, "2546");
        assert_eq!(number.grade, '7');
        assert_eq!(number.sequence, Some(1));
        assert_eq!(number.to_string(), "CDH25467001");
    }

    #[test]
    fn test_parse_provisional() {
        let number = ReportNumber::parse("CDH253655---").unwrap();
        assert_eq!(number.date_code, "25365");
        assert_eq!(number.grade, '5');
        assert!(!number.is_issued());
        assert_eq!(number.to_string(), "CDH253655---");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(ReportNumber::parse("").is_none());
        assert!(ReportNumber::parse(PENDING_MARKER).is_none());
        assert!(ReportNumber::parse("cdh25467001").is_none());
        assert!(ReportNumber::parse("CDH2546X001").is_none());
        assert!(ReportNumber::parse("CDH25467-01").is_none());
        assert!(ReportNumber::parse("CDH2546700123").is_none());
    }

    #[test]
    fn test_with_grade_keeps_sequence() {
        let number = ReportNumber::parse("CDH25467001").unwrap();
        assert_eq!(number.with_grade('3').to_string(), "CDH25463001");
        assert_eq!(number.prefix(), "CDH2546");
    }
}
