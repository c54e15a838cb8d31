//! Field rules: coercion plus range and format constraints.

use chrono::{NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::FieldValue;
use crate::domain::foundation::ValidationError;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s.]+$").expect("static email regex"));

const ISO_DATE: &str = "%Y-%m-%d";

/// A text pattern that must match the whole answer.
///
/// Compiled once, anchored at both ends, and kept alongside the source it
/// was written as so catalogs serialize back unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TextPattern {
    source: String,
    regex: Regex,
}

impl TextPattern {
    pub fn new(source: impl Into<String>) -> Result<Self, regex::Error> {
        let source = source.into();
        let regex = Regex::new(&format!("^(?:{})$", source))?;
        Ok(Self { source, regex })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl PartialEq for TextPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl TryFrom<String> for TextPattern {
    type Error = regex::Error;

    fn try_from(source: String) -> Result<Self, Self::Error> {
        Self::new(source)
    }
}

impl From<TextPattern> for String {
    fn from(pattern: TextPattern) -> Self {
        pattern.source
    }
}

/// How raw text for one field is checked and coerced.
///
/// Deserializes from the dialogue catalog, e.g.
/// `{ type: integer, min: 0, max: 120 }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldRule {
    /// Free text, length counted in characters.
    Text {
        #[serde(default)]
        min_len: Option<usize>,
        #[serde(default)]
        max_len: Option<usize>,
        /// Regular expression the whole answer must match.
        #[serde(default)]
        pattern: Option<TextPattern>,
    },
    Integer {
        #[serde(default)]
        min: Option<i64>,
        #[serde(default)]
        max: Option<i64>,
    },
    /// Decimal number; a comma is accepted as decimal separator.
    Number {
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
    },
    /// Calendar date in `format`; ISO `YYYY-MM-DD` is always accepted too.
    Date {
        #[serde(default = "default_date_format")]
        format: String,
        #[serde(default = "default_allow_future")]
        allow_future: bool,
    },
    /// One of a fixed set of options, matched case-insensitively.
    Choice { options: Vec<String> },
    Boolean,
    Email,
    Phone,
}

fn default_date_format() -> String {
    "%d/%m/%Y".to_string()
}

fn default_allow_future() -> bool {
    true
}

impl FieldRule {
    /// Plain text with no constraints.
    pub fn text() -> Self {
        FieldRule::Text {
            min_len: None,
            max_len: None,
            pattern: None,
        }
    }

    /// Integer within an inclusive range.
    pub fn integer_between(min: i64, max: i64) -> Self {
        FieldRule::Integer {
            min: Some(min),
            max: Some(max),
        }
    }

    /// Checks that the rule's ranges are ordered. Patterns are checked when
    /// they are built.
    pub fn check_definition(&self) -> Result<(), String> {
        match self {
            FieldRule::Text {
                min_len, max_len, ..
            } => match (min_len, max_len) {
                (Some(min), Some(max)) if min > max => {
                    Err(format!("min_len {} exceeds max_len {}", min, max))
                }
                _ => Ok(()),
            },
            FieldRule::Integer {
                min: Some(min),
                max: Some(max),
            } if min > max => Err(format!("min {} exceeds max {}", min, max)),
            FieldRule::Number {
                min: Some(min),
                max: Some(max),
            } if min > max => Err(format!("min {} exceeds max {}", min, max)),
            FieldRule::Choice { options } if options.is_empty() => {
                Err("choice needs at least one option".to_string())
            }
            _ => Ok(()),
        }
    }

    /// Coerces trimmed, non-empty `raw` into a value for `field`.
    pub(super) fn apply(&self, field: &str, raw: &str) -> Result<FieldValue, ValidationError> {
        match self {
            FieldRule::Text {
                min_len,
                max_len,
                pattern,
            } => check_text(field, raw, *min_len, *max_len, pattern.as_ref()),
            FieldRule::Integer { min, max } => check_integer(field, raw, *min, *max),
            FieldRule::Number { min, max } => check_number(field, raw, *min, *max),
            FieldRule::Date {
                format,
                allow_future,
            } => check_date(field, raw, format, *allow_future),
            FieldRule::Choice { options } => check_choice(field, raw, options),
            FieldRule::Boolean => check_boolean(field, raw),
            FieldRule::Email => check_email(field, raw),
            FieldRule::Phone => check_phone(field, raw),
        }
    }
}

fn check_text(
    field: &str,
    raw: &str,
    min_len: Option<usize>,
    max_len: Option<usize>,
    pattern: Option<&TextPattern>,
) -> Result<FieldValue, ValidationError> {
    let len = raw.chars().count();
    if let Some(min) = min_len {
        if len < min {
            return Err(ValidationError::new(
                field,
                format!("must be at least {} characters long", min),
            ));
        }
    }
    if let Some(max) = max_len {
        if len > max {
            return Err(ValidationError::new(
                field,
                format!("must be at most {} characters long", max),
            ));
        }
    }
    if pattern.is_some_and(|pattern| !pattern.is_match(raw)) {
        return Err(ValidationError::invalid_format(
            field,
            "does not match the expected format",
        ));
    }
    Ok(FieldValue::Text(raw.to_string()))
}

fn bounds_error<T: std::fmt::Display>(
    field: &str,
    min: Option<T>,
    max: Option<T>,
) -> ValidationError {
    match (min, max) {
        (Some(min), Some(max)) => ValidationError::out_of_range(field, min, max),
        (Some(min), None) => ValidationError::new(field, format!("must be at least {}", min)),
        (None, Some(max)) => ValidationError::new(field, format!("must be at most {}", max)),
        (None, None) => ValidationError::new(field, "is out of range"),
    }
}

fn check_integer(
    field: &str,
    raw: &str,
    min: Option<i64>,
    max: Option<i64>,
) -> Result<FieldValue, ValidationError> {
    let n: i64 = raw
        .parse()
        .map_err(|_| ValidationError::invalid_format(field, "not a valid integer"))?;
    if min.is_some_and(|min| n < min) || max.is_some_and(|max| n > max) {
        return Err(bounds_error(field, min, max));
    }
    Ok(FieldValue::Integer(n))
}

fn check_number(
    field: &str,
    raw: &str,
    min: Option<f64>,
    max: Option<f64>,
) -> Result<FieldValue, ValidationError> {
    let n: f64 = raw
        .replace(',', ".")
        .parse()
        .ok()
        .filter(|n: &f64| n.is_finite())
        .ok_or_else(|| ValidationError::invalid_format(field, "not a valid number"))?;
    if min.is_some_and(|min| n < min) || max.is_some_and(|max| n > max) {
        return Err(bounds_error(field, min, max));
    }
    Ok(FieldValue::Number(n))
}

fn human_date_format(format: &str) -> String {
    format
        .replace("%Y", "YYYY")
        .replace("%m", "MM")
        .replace("%d", "DD")
}

fn check_date(
    field: &str,
    raw: &str,
    format: &str,
    allow_future: bool,
) -> Result<FieldValue, ValidationError> {
    let date = NaiveDate::parse_from_str(raw, format)
        .or_else(|_| NaiveDate::parse_from_str(raw, ISO_DATE))
        .map_err(|_| {
            ValidationError::invalid_format(
                field,
                format!("not a valid date (use {})", human_date_format(format)),
            )
        })?;
    if !allow_future && date > Utc::now().date_naive() {
        return Err(ValidationError::new(field, "cannot be in the future"));
    }
    Ok(FieldValue::Date(date))
}

fn check_choice(field: &str, raw: &str, options: &[String]) -> Result<FieldValue, ValidationError> {
    let wanted = raw.to_lowercase();
    options
        .iter()
        .find(|option| option.to_lowercase() == wanted)
        .map(|option| FieldValue::Text(option.clone()))
        .ok_or_else(|| {
            ValidationError::new(field, format!("must be one of: {}", options.join(", ")))
        })
}

fn check_boolean(field: &str, raw: &str) -> Result<FieldValue, ValidationError> {
    match raw.to_lowercase().as_str() {
        "yes" | "y" | "true" | "si" | "sí" | "1" => Ok(FieldValue::Boolean(true)),
        "no" | "n" | "false" | "0" => Ok(FieldValue::Boolean(false)),
        _ => Err(ValidationError::invalid_format(field, "answer yes or no")),
    }
}

fn check_email(field: &str, raw: &str) -> Result<FieldValue, ValidationError> {
    let email = raw.to_lowercase();
    if EMAIL_PATTERN.is_match(&email) {
        Ok(FieldValue::Text(email))
    } else {
        Err(ValidationError::invalid_format(
            field,
            "not a valid email address",
        ))
    }
}

fn check_phone(field: &str, raw: &str) -> Result<FieldValue, ValidationError> {
    let invalid = || ValidationError::invalid_format(field, "not a valid phone number");

    let (plus, rest) = match raw.strip_prefix('+') {
        Some(rest) => ("+", rest),
        None => ("", raw),
    };
    let mut digits = String::with_capacity(rest.len());
    for c in rest.chars() {
        match c {
            '0'..='9' => digits.push(c),
            ' ' | '-' | '.' | '(' | ')' => {}
            _ => return Err(invalid()),
        }
    }
    if !(7..=15).contains(&digits.len()) {
        return Err(invalid());
    }
    Ok(FieldValue::Text(format!("{}{}", plus, digits)))
}

#[cfg(test)]
mod tests {
    use super::*;

    mod definition {
        use super::*;

        #[test]
        fn deserializes_integer_rule_from_yaml() {
            let rule: FieldRule = serde_yaml::from_str("type: integer\nmin: 0\nmax: 120\n").unwrap();
            assert_eq!(rule, FieldRule::integer_between(0, 120));
        }

        #[test]
        fn date_rule_defaults_to_day_month_year() {
            let rule: FieldRule = serde_yaml::from_str("type: date\n").unwrap();
            assert_eq!(
                rule,
                FieldRule::Date {
                    format: "%d/%m/%Y".to_string(),
                    allow_future: true
                }
            );
        }

        #[test]
        fn rejects_invalid_pattern() {
            assert!(TextPattern::new("([a-z").is_err());
            let parsed: Result<FieldRule, _> = serde_yaml::from_str("type: text\npattern: '([a-z'\n");
            assert!(parsed.is_err());
        }

        #[test]
        fn pattern_keeps_its_source_through_yaml() {
            let rule: FieldRule = serde_yaml::from_str("type: text\npattern: '\\d{5}'\n").unwrap();
            let FieldRule::Text {
                pattern: Some(pattern),
                ..
            } = &rule
            else {
                panic!("expected a text rule with a pattern");
            };
            assert_eq!(pattern.as_str(), r"\d{5}");
            assert!(serde_yaml::to_string(&rule).unwrap().contains(r"\d{5}"));
        }

        #[test]
        fn rejects_inverted_ranges() {
            assert!(FieldRule::integer_between(10, 1).check_definition().is_err());
        }

        #[test]
        fn rejects_empty_choice() {
            let rule = FieldRule::Choice { options: vec![] };
            assert!(rule.check_definition().is_err());
        }
    }

    mod coercion {
        use super::*;

        #[test]
        fn integer_reports_not_a_valid_integer() {
            let err = FieldRule::integer_between(0, 120)
                .apply("age", "not a number")
                .unwrap_err();
            assert_eq!(err.reason, "not a valid integer");
        }

        #[test]
        fn integer_out_of_range() {
            let err = FieldRule::integer_between(0, 120).apply("age", "130").unwrap_err();
            assert_eq!(err.reason, "must be between 0 and 120");
        }

        #[test]
        fn integer_min_only() {
            let rule = FieldRule::Integer {
                min: Some(1),
                max: None,
            };
            assert_eq!(rule.apply("qty", "0").unwrap_err().reason, "must be at least 1");
        }

        #[test]
        fn number_accepts_comma_decimal() {
            let rule = FieldRule::Number {
                min: Some(0.0),
                max: None,
            };
            assert_eq!(rule.apply("kg", "12,5").unwrap(), FieldValue::Number(12.5));
        }

        #[test]
        fn number_rejects_infinity() {
            let rule = FieldRule::Number {
                min: None,
                max: None,
            };
            assert!(rule.apply("kg", "inf").is_err());
        }

        #[test]
        fn date_accepts_configured_format_and_iso() {
            let rule = FieldRule::Date {
                format: "%d/%m/%Y".to_string(),
                allow_future: true,
            };
            let expected = FieldValue::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
            assert_eq!(rule.apply("day", "01/03/2024").unwrap(), expected);
            assert_eq!(rule.apply("day", "2024-03-01").unwrap(), expected);
        }

        #[test]
        fn date_reason_mentions_expected_format() {
            let rule = FieldRule::Date {
                format: "%d/%m/%Y".to_string(),
                allow_future: true,
            };
            let err = rule.apply("day", "yesterday").unwrap_err();
            assert_eq!(err.reason, "not a valid date (use DD/MM/YYYY)");
        }

        #[test]
        fn date_rejects_future_when_disallowed() {
            let rule = FieldRule::Date {
                format: ISO_DATE.to_string(),
                allow_future: false,
            };
            let err = rule.apply("day", "2999-01-01").unwrap_err();
            assert_eq!(err.reason, "cannot be in the future");
        }

        #[test]
        fn choice_returns_canonical_option() {
            let rule = FieldRule::Choice {
                options: vec!["Olive".to_string(), "Almond".to_string()],
            };
            assert_eq!(rule.apply("crop", "olive").unwrap(), FieldValue::from("Olive"));
            assert_eq!(
                rule.apply("crop", "grape").unwrap_err().reason,
                "must be one of: Olive, Almond"
            );
        }

        #[test]
        fn boolean_understands_spanish_yes() {
            assert_eq!(
                FieldRule::Boolean.apply("paid", "Sí").unwrap(),
                FieldValue::Boolean(true)
            );
        }

        #[test]
        fn email_is_lowercased() {
            assert_eq!(
                FieldRule::Email.apply("email", "Ana@Example.COM").unwrap(),
                FieldValue::from("ana@example.com")
            );
            assert!(FieldRule::Email.apply("email", "ana@").is_err());
        }

        #[test]
        fn phone_is_normalized() {
            assert_eq!(
                FieldRule::Phone.apply("phone", "+34 600-123 456").unwrap(),
                FieldValue::from("+34600123456")
            );
            assert!(FieldRule::Phone.apply("phone", "12ab").is_err());
            assert!(FieldRule::Phone.apply("phone", "123").is_err());
        }

        #[test]
        fn text_length_limits() {
            let rule = FieldRule::Text {
                min_len: Some(2),
                max_len: Some(4),
                pattern: None,
            };
            assert_eq!(
                rule.apply("code", "a").unwrap_err().reason,
                "must be at least 2 characters long"
            );
            assert_eq!(
                rule.apply("code", "abcde").unwrap_err().reason,
                "must be at most 4 characters long"
            );
            assert!(rule.apply("code", "ñañá").is_ok());
        }

        #[test]
        fn text_pattern_must_match_whole_answer_when_anchored() {
            let rule = FieldRule::Text {
                min_len: None,
                max_len: None,
                pattern: Some(TextPattern::new(r"^[A-Z]{3}-\d+$").unwrap()),
            };
            assert!(rule.apply("plot", "ABC-12").is_ok());
            assert!(rule.apply("plot", "abc-12").is_err());
        }

        #[test]
        fn unanchored_pattern_still_matches_whole_answer() {
            let rule = FieldRule::Text {
                min_len: None,
                max_len: None,
                pattern: Some(TextPattern::new(r"\d{5}|[A-Z]{2}").unwrap()),
            };
            assert!(rule.apply("zip", "28013").is_ok());
            assert!(rule.apply("zip", "MD").is_ok());
            assert_eq!(
                rule.apply("zip", "abc123456789xyz").unwrap_err().reason,
                "does not match the expected format"
            );
            assert!(rule.apply("zip", "MD1").is_err());
        }
    }
}
