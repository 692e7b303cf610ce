//! Canonical edit values and local format rules

use std::str::FromStr;
use std::sync::LazyLock;

use chrono::DateTime;
use chrono::NaiveDate;
use chrono::Utc;
use regex::Regex;
use rust_decimal::Decimal;

use crate::model::FieldType;
use crate::model::Value;

static PHONE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\(?([0-9]{3})\)?[-. ]?([0-9]{3})[-. ]?([0-9]{4})$").expect("Invalid phone pattern")
});

/// Separator between the picks of a multi-select value.
pub const MULTI_SELECT_SEPARATOR: &str = ";";

/// Converts a raw edited value into the canonical value for its field type.
///
/// Blank strings become `Null` for every type. Returns `None` when the value
/// cannot represent the type (e.g. `"abc"` for an integer field).
pub fn canonicalize(field_type: FieldType, raw: Value) -> Option<Value> {
    let raw = match raw {
        Value::String(s) if s.trim().is_empty() => return Some(Value::Null),
        Value::Null => return Some(Value::Null),
        other => other,
    };

    match field_type {
        FieldType::Boolean => match raw {
            Value::Bool(b) => Some(Value::Bool(b)),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Some(Value::Bool(true)),
                "false" => Some(Value::Bool(false)),
                _ => None,
            },
            _ => None,
        },
        t if t.is_integer() => match raw {
            Value::Int(n) => Some(Value::Int(n)),
            Value::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Some(Value::Int(f as i64)),
            Value::Decimal(d) if d.fract().is_zero() => i64::try_from(d).ok().map(Value::Int),
            Value::String(s) => s.trim().parse::<i64>().ok().map(Value::Int),
            _ => None,
        },
        t if t.is_decimal() => match raw {
            Value::Decimal(d) => Some(Value::Decimal(d.normalize())),
            Value::Int(n) => Some(Value::Decimal(Decimal::from(n))),
            Value::Float(f) => Decimal::try_from(f).ok().map(|d| Value::Decimal(d.normalize())),
            Value::String(s) => Decimal::from_str(s.trim())
                .ok()
                .map(|d| Value::Decimal(d.normalize())),
            _ => None,
        },
        FieldType::Date => match raw {
            Value::Date(d) => Some(Value::Date(d)),
            Value::DateTime(dt) => Some(Value::Date(dt.date_naive())),
            Value::String(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .ok()
                .map(Value::Date),
            _ => None,
        },
        FieldType::DateTime => match raw {
            Value::DateTime(dt) => Some(Value::DateTime(dt)),
            Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
                .ok()
                .map(|dt| Value::DateTime(dt.with_timezone(&Utc))),
            _ => None,
        },
        FieldType::MultiPicklist => match raw {
            Value::List(items) => {
                let picks: Option<Vec<String>> = items.iter().map(Value::to_text).collect();
                picks.map(|p| Value::String(p.join(MULTI_SELECT_SEPARATOR)))
            }
            Value::String(s) => Some(Value::String(s)),
            _ => None,
        },
        _ => match raw {
            Value::String(s) => Some(Value::String(s)),
            Value::Json(_) | Value::List(_) => None,
            scalar => scalar.to_text().map(Value::String),
        },
    }
}

/// Runs the field-specific format rule, if the type has one.
///
/// `Null` always passes; clearing a field is not a format error.
pub fn is_valid(field_type: FieldType, value: &Value) -> bool {
    let Some(text) = value.as_str() else {
        return true;
    };
    match field_type {
        FieldType::Phone => PHONE_PATTERN.is_match(text.trim()),
        FieldType::Email => email_address::EmailAddress::is_valid(text.trim()),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_rule() {
        for ok in ["(555) 123-4567", "555-123-4567", "555.123.4567", "5551234567"] {
            assert!(is_valid(FieldType::Phone, &Value::from(ok)), "{ok}");
        }
        for bad in ["abc", "555-1234", "+1 555 123 4567"] {
            assert!(!is_valid(FieldType::Phone, &Value::from(bad)), "{bad}");
        }
        assert!(is_valid(FieldType::Phone, &Value::Null));
    }

    #[test]
    fn test_email_rule() {
        assert!(is_valid(FieldType::Email, &Value::from("ada@example.com")));
        assert!(!is_valid(FieldType::Email, &Value::from("not an email")));
    }

    #[test]
    fn test_canonicalize_numbers() {
        assert_eq!(
            canonicalize(FieldType::Integer, Value::from(" 42 ")),
            Some(Value::Int(42))
        );
        assert_eq!(canonicalize(FieldType::Integer, Value::from("4.5")), None);
        assert_eq!(
            canonicalize(FieldType::Currency, Value::from("10.50")),
            Some(Value::Decimal(Decimal::from_str("10.5").unwrap()))
        );
        assert_eq!(
            canonicalize(FieldType::Percent, Value::Int(3)),
            Some(Value::Decimal(Decimal::from(3)))
        );
    }

    #[test]
    fn test_canonicalize_blank_is_null() {
        assert_eq!(canonicalize(FieldType::Date, Value::from("  ")), Some(Value::Null));
        assert_eq!(canonicalize(FieldType::Boolean, Value::Null), Some(Value::Null));
    }

    #[test]
    fn test_canonicalize_dates_and_flags() {
        assert_eq!(
            canonicalize(FieldType::Date, Value::from("2024-02-29")),
            Some(Value::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()))
        );
        assert_eq!(canonicalize(FieldType::Date, Value::from("2023-02-29")), None);
        assert!(matches!(
            canonicalize(FieldType::DateTime, Value::from("2024-01-01T10:00:00+02:00")),
            Some(Value::DateTime(_))
        ));
        assert_eq!(
            canonicalize(FieldType::Boolean, Value::from("TRUE")),
            Some(Value::Bool(true))
        );
    }

    #[test]
    fn test_canonicalize_multi_select_and_text() {
        assert_eq!(
            canonicalize(
                FieldType::MultiPicklist,
                Value::List(vec![Value::from("A"), Value::from("B")])
            ),
            Some(Value::from("A;B"))
        );
        assert_eq!(
            canonicalize(FieldType::String, Value::Int(7)),
            Some(Value::from("7"))
        );
    }
}
