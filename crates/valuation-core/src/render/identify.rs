//! Resolve a semantic value whose key differs between layout versions.

use crate::models::{FieldKind, Layout, ReportData};

fn non_empty(data: &ReportData, key: &str) -> Option<String> {
    data.get(key)
        .map(|v| v.as_display())
        .filter(|v| !v.trim().is_empty())
}

/// Find a value by name fragments (e.g. `["engine"]`).
///
/// Tries, in order: each fragment as an exact data key; the value of a Text
/// field whose label mentions a fragment; any data key containing a
/// fragment. Matching is case-insensitive after the first tier. Returns an
/// empty string when nothing matches.
pub fn find_identifier(layout: &Layout, data: &ReportData, fragments: &[&str]) -> String {
    for fragment in fragments {
        if let Some(value) = non_empty(data, fragment) {
            return value;
        }
    }

    let lowered: Vec<String> = fragments.iter().map(|f| f.to_lowercase()).collect();

    for field in layout.fields.iter().filter(|f| f.kind == FieldKind::Text) {
        let label = field.label_text().to_lowercase();
        if lowered.iter().any(|f| label.contains(f.as_str())) {
            if let Some(value) = non_empty(data, &field.field_id) {
                return value;
            }
        }
    }

    for key in data.keys() {
        let key_lower = key.to_lowercase();
        if lowered.iter().any(|f| key_lower.contains(f.as_str())) {
            if let Some(value) = non_empty(data, key) {
                return value;
            }
        }
    }

    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FieldPart, LayoutField, ReportValue};

    fn layout() -> Layout {
        Layout {
            id: "l".into(),
            version: 1,
            fields: vec![LayoutField::text(
                "f1",
                "f_17",
                FieldPart::default().with_text("Engine No."),
                FieldPart::default(),
            )],
            created_at: String::new(),
        }
    }

    fn data(pairs: &[(&str, &str)]) -> ReportData {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), ReportValue::from(*v)))
            .collect()
    }

    #[test]
    fn test_exact_key_wins() {
        let data = data(&[("engine", "E1"), ("f_17", "E2"), ("oldEngineNo", "E3")]);
        assert_eq!(find_identifier(&layout(), &data, &["engine"]), "E1");
    }

    #[test]
    fn test_label_match() {
        let data = data(&[("f_17", "E2"), ("oldEngineNo", "E3")]);
        assert_eq!(find_identifier(&layout(), &data, &["engine"]), "E2");
    }

    #[test]
    fn test_key_substring() {
        let data = data(&[("oldEngineNo", "E3")]);
        assert_eq!(find_identifier(&layout(), &data, &["engine"]), "E3");
    }

    #[test]
    fn test_blank_values_skipped() {
        let data = data(&[("engine", " "), ("f_17", ""), ("engineNumber", "E4")]);
        assert_eq!(find_identifier(&layout(), &data, &["engine"]), "E4");
        assert_eq!(find_identifier(&layout(), &data, &["chassis"]), "");
    }
}
