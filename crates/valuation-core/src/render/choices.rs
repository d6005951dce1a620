//! Choice lists on value parts.

use strsim::jaro_winkler;

use crate::models::{FieldPart, InputMode};

/// Rank a part's choices against typed input.
///
/// Prefix matches come first in list order, then the remaining choices by
/// Jaro-Winkler similarity. Blank input returns the list as configured.
pub fn suggest_choices(part: &FieldPart, input: &str, limit: usize) -> Vec<String> {
    let needle = input.trim().to_lowercase();
    if needle.is_empty() {
        return part.options.iter().take(limit).cloned().collect();
    }

    let (prefixed, mut others): (Vec<&String>, Vec<&String>) = part
        .options
        .iter()
        .partition(|option| option.to_lowercase().starts_with(&needle));

    others.sort_by(|a, b| {
        let sa = jaro_winkler(&a.to_lowercase(), &needle);
        let sb = jaro_winkler(&b.to_lowercase(), &needle);
        sb.partial_cmp(&sa).unwrap_or(std::cmp::Ordering::Equal)
    });

    prefixed
        .into_iter()
        .chain(others)
        .take(limit)
        .cloned()
        .collect()
}

/// Fixed-choice parts only accept listed choices (or blank).
pub fn is_allowed_choice(part: &FieldPart, value: &str) -> bool {
    let value = value.trim();
    match part.input_mode {
        InputMode::FixedChoice => value.is_empty() || part.options.iter().any(|o| o == value),
        InputMode::FreeText | InputMode::SuggestedChoice => true,
    }
}
