//! Amounts in English words, short scale.

const ONES: [&str; 20] = [
    "", "ONE", "TWO", "THREE", "FOUR", "FIVE", "SIX", "SEVEN", "EIGHT", "NINE", "TEN",
    "ELEVEN", "TWELVE", "THIRTEEN", "FOURTEEN", "FIFTEEN", "SIXTEEN", "SEVENTEEN",
    "EIGHTEEN", "NINETEEN",
];

const TENS: [&str; 10] = [
    "", "", "TWENTY", "THIRTY", "FORTY", "FIFTY", "SIXTY", "SEVENTY", "EIGHTY", "NINETY",
];

const SCALES: [(u128, &str); 3] = [
    (1_000_000_000, "BILLION"),
    (1_000_000, "MILLION"),
    (1_000, "THOUSAND"),
];

const SUFFIX: &str = "RUPEES ONLY";

fn below_thousand(n: u128, words: &mut Vec<&'static str>) {
    let n = n as usize;
    if n >= 100 {
        words.push(ONES[n / 100]);
        words.push("HUNDRED");
    }
    let rest = n % 100;
    if rest >= 20 {
        words.push(TENS[rest / 10]);
        if rest % 10 != 0 {
            words.push(ONES[rest % 10]);
        }
    } else if rest > 0 {
        words.push(ONES[rest]);
    }
}

/// Words for a positive integer. Counts of billions above 999 recurse.
fn integer_words(mut n: u128, words: &mut Vec<&'static str>) {
    for (scale, name) in SCALES {
        if n >= scale {
            let count = n / scale;
            if scale == SCALES[0].0 {
                integer_words(count, words);
            } else {
                below_thousand(count, words);
            }
            words.push(name);
            n %= scale;
        }
    }
    below_thousand(n, words);
}

/// Integer amount in uppercase words, suffixed with `RUPEES ONLY`.
pub fn number_to_words(n: u128) -> String {
    if n == 0 {
        return format!("ZERO {}", SUFFIX);
    }
    let mut words = Vec::new();
    integer_words(n, &mut words);
    words.push(SUFFIX);
    words.join(" ")
}

/// Result of turning free-form input into words.
#[derive(Debug, Clone, PartialEq)]
pub enum WordsOutcome {
    /// Write these words to the target field
    Words(String),
    /// Nothing numeric was typed: clear the target
    Clear,
    /// Unparseable: leave the target as it is
    Unchanged,
}

/// Strip everything but digits and dots, parse as a decimal and spell the
/// integer part.
pub fn amount_to_words(raw: &str) -> WordsOutcome {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if cleaned.is_empty() {
        return WordsOutcome::Clear;
    }
    if cleaned.parse::<f64>().is_err() {
        return WordsOutcome::Unchanged;
    }

    let integer_part = cleaned.split('.').next().unwrap_or_default();
    if integer_part.is_empty() {
        return WordsOutcome::Words(number_to_words(0));
    }
    match integer_part.parse::<u128>() {
        Ok(n) => WordsOutcome::Words(number_to_words(n)),
        Err(_) => WordsOutcome::Unchanged,
    }
}
