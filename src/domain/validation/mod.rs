//! Validation layer - typed checks for raw user input.
//!
//! Every answer a user types goes through [`check`] before it reaches the
//! dialogue state or the persistence gateway. Checking is pure and
//! idempotent: re-checking [`FieldValue::as_input`] of a valid value gives
//! back the same value.

mod field;
mod rule;
mod value;

pub use field::FieldSpec;
pub use rule::{FieldRule, TextPattern};
pub use value::FieldValue;

use crate::domain::foundation::ValidationError;

/// Checks `raw` against `spec`, returning the coerced value.
///
/// Surrounding whitespace is ignored; an empty answer is always rejected
/// (optional fields are skipped explicitly, not by sending nothing).
pub fn check(spec: &FieldSpec, raw: &str) -> Result<FieldValue, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::empty_field(&spec.name));
    }
    spec.rule.apply(&spec.name, trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn age() -> FieldSpec {
        FieldSpec::new("age", FieldRule::integer_between(0, 120), "How old are you?")
    }

    #[test]
    fn trims_before_checking() {
        assert_eq!(check(&age(), "  30 \n").unwrap(), FieldValue::Integer(30));
    }

    #[test]
    fn empty_input_is_required_error() {
        let err = check(&age(), "   ").unwrap_err();
        assert_eq!(err.field, "age");
        assert_eq!(err.reason, "a value is required");
    }

    #[test]
    fn same_invalid_input_gives_same_error() {
        assert_eq!(check(&age(), "abc"), check(&age(), "abc"));
    }

    mod proptests {
        use super::*;
        use chrono::NaiveDate;
        use proptest::prelude::*;

        fn date_spec() -> FieldSpec {
            FieldSpec::new(
                "day",
                FieldRule::Date {
                    format: "%d/%m/%Y".to_string(),
                    allow_future: true,
                },
                "Which day?",
            )
        }

        proptest! {
            #[test]
            fn integer_check_is_idempotent(raw in "-?[0-9]{1,4}|[a-z ]{0,6}") {
                let spec = age();
                if let Ok(value) = check(&spec, &raw) {
                    prop_assert_eq!(check(&spec, &value.as_input()), Ok(value));
                }
            }

            #[test]
            fn text_check_is_idempotent(raw in "\\PC{0,30}") {
                let spec = FieldSpec::new("name", FieldRule::text(), "Name?");
                if let Ok(value) = check(&spec, &raw) {
                    prop_assert_eq!(check(&spec, &value.as_input()), Ok(value));
                }
            }

            #[test]
            fn date_check_is_idempotent(days in 0i64..40_000) {
                let spec = date_spec();
                let date = NaiveDate::from_ymd_opt(1950, 1, 1).unwrap()
                    + chrono::Duration::days(days);
                let raw = date.format("%d/%m/%Y").to_string();
                let value = check(&spec, &raw).unwrap();
                prop_assert_eq!(check(&spec, &value.as_input()), Ok(value));
            }

            #[test]
            fn phone_check_is_idempotent(raw in "\\+?[0-9 ()-]{7,20}") {
                let spec = FieldSpec::new("phone", FieldRule::Phone, "Phone?");
                if let Ok(value) = check(&spec, &raw) {
                    prop_assert_eq!(check(&spec, &value.as_input()), Ok(value));
                }
            }
        }
    }
}
