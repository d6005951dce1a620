//! Condition grade -> single digit.

use crate::models::Layout;

/// Digit used when no grade weight is configured or no grade is selected.
pub const DEFAULT_GRADE_DIGIT: char = '5';

/// First character of the weight's decimal form, or the default.
///
/// Weights of 10 and above contribute only their leading digit (12 -> '1').
pub fn grade_digit(weight: Option<f64>) -> char {
    weight
        .filter(|w| w.is_finite())
        .and_then(|w| w.to_string().chars().next())
        .filter(|c| c.is_ascii_digit())
        .unwrap_or(DEFAULT_GRADE_DIGIT)
}

/// Digit for the grade currently selected in a layout's grade field.
pub fn grade_digit_for(layout: &Layout, grade_field_id: &str, grade: &str) -> char {
    let grade = grade.trim();
    if grade.is_empty() {
        return DEFAULT_GRADE_DIGIT;
    }
    let weight = layout
        .grade_field(grade_field_id)
        .and_then(|field| field.option_weight(grade));
    grade_digit(weight)
}
