//! Final-answer cleanup.
//!
//! Benchmark answers are compared by exact string match, so conversational
//! lead-ins and wrapping quotes have to go, and numbers need a stable text
//! form.

/// Lead-ins stripped from text answers. Case-sensitive, first match wins.
pub const ANSWER_PREFIXES: &[&str] = &[
    "The answer is ",
    "Answer: ",
    "Final answer: ",
    "The result is ",
    "To answer this question: ",
    "Based on the information provided, ",
    "According to the information: ",
];

/// Values at or above this magnitude are shown as currency.
const CURRENCY_THRESHOLD: f64 = 1000.0;

/// An answer before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum RawAnswer {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl From<i64> for RawAnswer {
    fn from(value: i64) -> Self {
        RawAnswer::Integer(value)
    }
}

impl From<f64> for RawAnswer {
    fn from(value: f64) -> Self {
        RawAnswer::Float(value)
    }
}

impl From<String> for RawAnswer {
    fn from(value: String) -> Self {
        RawAnswer::Text(value)
    }
}

impl From<&str> for RawAnswer {
    fn from(value: &str) -> Self {
        RawAnswer::Text(value.to_string())
    }
}

/// Normalize an answer into the exact string that gets submitted.
///
/// Text is never reinterpreted as a number: `"1234.5"` stays `"1234.5"`.
pub fn normalize_answer(answer: impl Into<RawAnswer>) -> String {
    match answer.into() {
        RawAnswer::Integer(n) => n.to_string(),
        RawAnswer::Float(x) => format_float(x),
        RawAnswer::Text(text) => clean_text(&text).to_string(),
    }
}

fn format_float(x: f64) -> String {
    if !x.is_finite() {
        return x.to_string();
    }
    if x.fract() == 0.0 {
        // -0.0 would otherwise print as "-0"
        return if x == 0.0 { "0".to_string() } else { format!("{:.0}", x) };
    }
    if x.abs() >= CURRENCY_THRESHOLD {
        return format_currency(x);
    }
    x.to_string()
}

/// `1234.5` → `$1,234.50`, `-1234.5` → `$-1,234.50`.
fn format_currency(x: f64) -> String {
    let fixed = format!("{:.2}", x.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if x < 0.0 { "-" } else { "" };
    format!("${}{}.{}", sign, grouped, cents)
}

fn clean_text(text: &str) -> &str {
    let mut answer = text.trim();

    if let Some(rest) = ANSWER_PREFIXES
        .iter()
        .find_map(|prefix| answer.strip_prefix(prefix))
    {
        answer = rest.trim();
    }

    for quote in ['"', '\''] {
        if let Some(inner) = answer
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner.trim();
        }
    }

    answer
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_numbers() {
        assert_eq!(normalize_answer(42_i64), "42");
        assert_eq!(normalize_answer(-7_i64), "-7");
        assert_eq!(normalize_answer(123.0), "123");
        assert_eq!(normalize_answer(0.0), "0");
        assert_eq!(normalize_answer(-0.0), "0");
        assert_eq!(normalize_answer(123.45), "123.45");
        assert_eq!(normalize_answer(999.99), "999.99");
        assert_eq!(normalize_answer(1234.56), "$1,234.56");
        assert_eq!(normalize_answer(1234567.891), "$1,234,567.89");
        assert_eq!(normalize_answer(-1234.5), "$-1,234.50");
        assert_eq!(normalize_answer(2000.0), "2000");
        assert_eq!(normalize_answer(f64::NAN), "NaN");
    }

    #[test]
    fn test_prefixes() {
        assert_eq!(normalize_answer("The answer is Paris"), "Paris");
        assert_eq!(normalize_answer("  Final answer:   42  "), "42");
        assert_eq!(normalize_answer("Based on the information provided, blue"), "blue");
        // Exact, case-sensitive leading match only
        assert_eq!(normalize_answer("the answer is Paris"), "the answer is Paris");
        assert_eq!(normalize_answer("I think The answer is Paris"), "I think The answer is Paris");
        assert_eq!(normalize_answer("The answer is"), "The answer is");
        // Only the first matching prefix is removed
        assert_eq!(normalize_answer("Answer: Final answer: x"), "Final answer: x");
    }

    #[test]
    fn test_quotes() {
        assert_eq!(normalize_answer("\"Paris\""), "Paris");
        assert_eq!(normalize_answer("' spaced '"), "spaced");
        assert_eq!(normalize_answer("Answer: \"right\""), "right");
        assert_eq!(normalize_answer("\"\"double\"\""), "\"double\"");
        assert_eq!(normalize_answer("\"mismatched'"), "\"mismatched'");
        assert_eq!(normalize_answer("\""), "\"");
        assert_eq!(normalize_answer("\"\""), "");
    }

    #[test]
    fn test_text_is_not_reformatted() {
        assert_eq!(normalize_answer("1234.56"), "1234.56");
        assert_eq!(normalize_answer("89706.00"), "89706.00");
    }

    #[test]
    fn test_idempotent_on_normalized_answers() {
        for raw in [
            "The answer is Paris",
            "  'Wharvton'  ",
            "cornstarch, lemon juice, sugar",
            "The answer is",
            "\"",
        ] {
            let once = normalize_answer(raw);
            assert_eq!(normalize_answer(once.as_str()), once, "input: {raw:?}");
        }
        for value in [123.0, 1234.56, 0.5] {
            let once = normalize_answer(value);
            assert_eq!(normalize_answer(once.as_str()), once);
        }
    }

    #[test]
    fn test_single_pass_strips_only_the_first_layer() {
        let once = normalize_answer("Answer: The answer is x");
        assert_eq!(once, "The answer is x");
        assert_eq!(normalize_answer(once.as_str()), "x");

        let once = normalize_answer("\"'quoted'\"");
        assert_eq!(once, "'quoted'");
        assert_eq!(normalize_answer(once.as_str()), "quoted");
    }
}
