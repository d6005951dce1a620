//! Field interaction rules: edits with auto-fill, and blur formatting.

use super::words::{amount_to_words, WordsOutcome};
use crate::models::{is_identity_key, AutoFillRule, Layout, ReportData, ReportValue};

const MONEY_HINTS: [&str; 4] = ["value", "amount", "price", "rs"];

/// Apply one edit and run the auto-fill rules listening to the field.
///
/// Identity keys are display-only; edits to them return the data unchanged.
pub fn on_field_edit(
    layout: &Layout,
    data: &ReportData,
    field_id: &str,
    value: ReportValue,
) -> ReportData {
    let mut updated = data.clone();
    if is_identity_key(field_id) {
        tracing::debug!(field_id, "ignored edit to identity field");
        return updated;
    }

    let source_text = value.as_text().map(str::to_owned);
    updated.insert(field_id.to_string(), value);

    let Some(source_text) = source_text else {
        return updated;
    };
    for target in layout.auto_fill_targets(field_id) {
        let Some(rule) = &target.auto_fill else {
            continue;
        };
        match rule {
            AutoFillRule::NumberToWords { .. } => match amount_to_words(&source_text) {
                WordsOutcome::Words(words) => {
                    updated.insert(target.field_id.clone(), ReportValue::Text(words));
                }
                WordsOutcome::Clear => {
                    updated.insert(target.field_id.clone(), ReportValue::Text(String::new()));
                }
                WordsOutcome::Unchanged => {}
            },
        }
    }

    updated
}

/// Whether a field holds a money amount: its key mentions one, or another
/// field spells it out in words.
pub fn is_money_field(layout: &Layout, field_id: &str) -> bool {
    let lower = field_id.to_lowercase();
    MONEY_HINTS.iter().any(|hint| lower.contains(hint)) || layout.is_auto_fill_source(field_id)
}

/// Normalize a value when its input loses focus.
///
/// Money fields get two decimals (`1000` -> `1000.00`, `1000.5` -> `1000.50`).
/// Anything else, and non-numeric money input, passes through.
pub fn on_field_blur(layout: &Layout, field_id: &str, value: &str) -> String {
    if !is_money_field(layout, field_id) {
        return value.to_string();
    }
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return value.to_string();
    }

    if trimmed.chars().all(|c| c.is_ascii_digit()) {
        return format!("{}.00", trimmed);
    }
    match trimmed.parse::<f64>() {
        Ok(amount) if amount.is_finite() => format!("{:.2}", amount),
        _ => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::default_layout;
    use proptest::prelude::*;

    fn text(data: &ReportData, key: &str) -> String {
        data.get(key).map(|v| v.as_display()).unwrap_or_default()
    }

    #[test]
    fn test_edit_writes_value() {
        let layout = default_layout();
        let data = on_field_edit(&layout, &ReportData::new(), "make", "Tata".into());
        assert_eq!(text(&data, "make"), "Tata");
    }

    #[test]
    fn test_identity_field_immune() {
        let layout = default_layout();
        let mut data = ReportData::new();
        data.insert("reportNumber".into(), "CDH25467---".into());

        let updated = on_field_edit(&layout, &data, "reportNumber", "HACKED".into());
        assert_eq!(text(&updated, "reportNumber"), "CDH25467---");

        let updated = on_field_edit(&layout, &data, "legacyReportNum", "HACKED".into());
        assert!(!updated.contains_key("legacyReportNum"));
    }

    #[test]
    fn test_auto_fill_words() {
        let layout = default_layout();
        let data = on_field_edit(&layout, &ReportData::new(), "marketValueNum", "1500000".into());
        assert_eq!(
            text(&data, "marketValueWords"),
            "ONE MILLION FIVE HUNDRED THOUSAND RUPEES ONLY"
        );

        let cleared = on_field_edit(&layout, &data, "marketValueNum", "".into());
        assert_eq!(text(&cleared, "marketValueWords"), "");

        let kept = on_field_edit(&layout, &data, "marketValueNum", "1.2.3".into());
        assert_eq!(text(&kept, "marketValueWords"), text(&data, "marketValueWords"));
        assert_eq!(text(&kept, "marketValueNum"), "1.2.3");
    }

    #[test]
    fn test_blur_money_formatting() {
        let layout = default_layout();
        assert_eq!(on_field_blur(&layout, "marketValueNum", "1000"), "1000.00");
        assert_eq!(on_field_blur(&layout, "marketValueNum", "1000.5"), "1000.50");
        assert_eq!(on_field_blur(&layout, "marketValueNum", " 42 "), "42.00");
        assert_eq!(on_field_blur(&layout, "marketValueNum", "n/a"), "n/a");
        assert_eq!(on_field_blur(&layout, "marketValueNum", "  "), "  ");
        assert_eq!(on_field_blur(&layout, "insuredAmount", "7.456"), "7.46");
        assert_eq!(on_field_blur(&layout, "RsPaid", "7"), "7.00");
    }

    #[test]
    fn test_blur_non_money_untouched() {
        let layout = default_layout();
        assert_eq!(on_field_blur(&layout, "model", "1000"), "1000");
    }

    #[test]
    fn test_blur_auto_fill_source_is_money() {
        let mut layout = default_layout();
        for field in &mut layout.fields {
            if field.field_id == "marketValueWords" {
                field.auto_fill = Some(AutoFillRule::NumberToWords {
                    source_field_id: "quote".into(),
                });
            }
        }
        assert_eq!(on_field_blur(&layout, "quote", "12"), "12.00");
    }

    proptest! {
        #[test]
        fn prop_edit_idempotent(key in "[a-zA-Z]{1,12}", value in ".{0,20}") {
            let layout = default_layout();
            let once = on_field_edit(&layout, &ReportData::new(), &key, value.clone().into());
            let twice = on_field_edit(&layout, &once, &key, value.into());
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_words_idempotent(amount in 0u64..10_000_000_000) {
            let layout = default_layout();
            let value = amount.to_string();
            let once = on_field_edit(&layout, &ReportData::new(), "marketValueNum", value.clone().into());
            let twice = on_field_edit(&layout, &once, "marketValueNum", value.into());
            prop_assert_eq!(once, twice);
        }
    }
}
