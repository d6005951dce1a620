//! Report number derivation.
//!
//! A report number is `BBB` (branch) + date code (`YY` + day of year) + one
//! grade digit + a three-digit sequence. Before a report is saved the sequence
//! is the `---` placeholder:
//!
//! ```text
//!   Unissued ──grade selected──▶ Provisional ──save──▶ Issued
//!                                  │    ▲                 │
//!                  grade change ───┘    │                 ├── same-day save: grade digit only
//!                  date rollover ───────┘                 └── other-day save: re-allocate
//! ```
//!
//! Everything here is pure; sequence counting is supplied by the caller.

mod date_code;
mod grade;
mod number;

pub use date_code::*;
pub use grade::*;
pub use number::*;

use chrono::NaiveDate;
use thiserror::Error;

/// Numbering errors.
#[derive(Error, Debug, PartialEq)]
pub enum NumberingError {
    #[error("A condition grade is required before a report number can be issued")]
    MissingGrade,

    #[error("Sequence exhausted for {0}")]
    SequenceExhausted(String),
}

pub type NumberingResult<T> = Result<T, NumberingError>;

/// Lifecycle state of a stored report number relative to a given day.
#[derive(Debug, Clone, PartialEq)]
pub enum NumberState {
    /// Empty, pending marker, or unparseable
    Unissued,
    /// Placeholder sequence, dated today
    Provisional(ReportNumber),
    /// Allocated sequence, dated today
    Issued(ReportNumber),
    /// Well-formed but dated another day
    Stale(ReportNumber),
}

/// Classify a stored number against today's date code.
pub fn classify(existing: &str, today_code: &str) -> NumberState {
    match ReportNumber::parse(existing) {
        None => NumberState::Unissued,
        Some(number) if number.date_code != today_code => NumberState::Stale(number),
        Some(number) if number.is_issued() => NumberState::Issued(number),
        Some(number) => NumberState::Provisional(number),
    }
}

/// Provisional number for a branch, day and grade digit.
pub fn derive_provisional(branch: &BranchCode, date: NaiveDate, grade: char) -> String {
    ReportNumber::provisional(branch, &date_code(date), grade).to_string()
}

/// Recompute the number after a form edit (no save).
///
/// `grade` is `None` while no condition grade is selected. Issued numbers for
/// today track the grade digit; stale issued numbers wait for the next save.
pub fn derive_live(
    existing: &str,
    branch: &BranchCode,
    today: NaiveDate,
    grade: Option<char>,
) -> String {
    let today_code = date_code(today);
    match classify(existing, &today_code) {
        NumberState::Unissued => match grade {
            Some(digit) => derive_provisional(branch, today, digit),
            None => existing.to_string(),
        },
        NumberState::Provisional(number) if number.branch == *branch => number
            .with_grade(grade.unwrap_or(DEFAULT_GRADE_DIGIT))
            .to_string(),
        NumberState::Issued(number) => number
            .with_grade(grade.unwrap_or(number.grade))
            .to_string(),
        NumberState::Stale(number) if number.is_issued() => number.to_string(),
        NumberState::Provisional(_) | NumberState::Stale(_) => {
            derive_provisional(branch, today, grade.unwrap_or(DEFAULT_GRADE_DIGIT))
        }
    }
}

/// What a save must do with the number.
#[derive(Debug, Clone, PartialEq)]
pub enum FinalizePlan {
    /// Already issued today: keep the sequence, refresh the grade digit
    Keep(ReportNumber),
    /// Needs a fresh sequence counted within `number.prefix()`
    Allocate(ReportNumber),
}

impl FinalizePlan {
    /// Prefix whose issued numbers must be counted, if allocating.
    pub fn allocation_prefix(&self) -> Option<String> {
        match self {
            FinalizePlan::Keep(_) => None,
            FinalizePlan::Allocate(number) => Some(number.prefix()),
        }
    }

    /// Produce the issued number. `highest_issued` is the largest sequence
    /// ever issued within the prefix (0 if none); it is ignored when keeping.
    pub fn complete(self, highest_issued: u32) -> NumberingResult<ReportNumber> {
        match self {
            FinalizePlan::Keep(number) => Ok(number),
            FinalizePlan::Allocate(number) => {
                let sequence = highest_issued + 1;
                if sequence > MAX_SEQUENCE {
                    return Err(NumberingError::SequenceExhausted(number.prefix()));
                }
                Ok(number.with_sequence(sequence))
            }
        }
    }
}

/// Decide how a save finalizes the number.
///
/// `grade` is `None` when the condition grade is blank, which blocks the save.
pub fn plan_finalize(
    existing: &str,
    branch: &BranchCode,
    today: NaiveDate,
    grade: Option<char>,
) -> NumberingResult<FinalizePlan> {
    let digit = grade.ok_or(NumberingError::MissingGrade)?;
    let today_code = date_code(today);

    Ok(match classify(existing, &today_code) {
        NumberState::Issued(number) => FinalizePlan::Keep(number.with_grade(digit)),
        _ => FinalizePlan::Allocate(ReportNumber::provisional(branch, &today_code, digit)),
    })
}
