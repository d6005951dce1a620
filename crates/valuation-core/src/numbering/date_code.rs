//! Date codes: two-digit year followed by the unpadded day of the year.

use chrono::{Datelike, NaiveDate};

/// Date code for a calendar day, e.g. 2025-02-15 -> `"2546"`.
///
/// The day of the year is not zero-padded, so codes are 3 to 5 characters
/// and report numbers 10 to 12. Issued numbers already carry this shape.
pub fn date_code(date: NaiveDate) -> String {
    format!("{:02}{}", date.year().rem_euclid(100), date.ordinal())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_date_code() {
        assert_eq!(date_code(day(2025, 2, 15)), "2546");
        assert_eq!(date_code(day(2025, 1, 1)), "251");
        assert_eq!(date_code(day(2025, 12, 31)), "25365");
        assert_eq!(date_code(day(2024, 12, 31)), "24366");
        assert_eq!(date_code(day(2009, 4, 10)), "09100");
    }
}
