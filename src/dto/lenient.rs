//! Deserializers that accept JSON numbers or numeric strings.
//!
//! Anything that does not parse becomes `None`, so the invoice builder can
//! answer with a validation message instead of a serde error.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub fn decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(decimal_from_value))
}

pub fn integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(integer_from_value))
}

pub fn decimal_from_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) => parse_decimal(s.trim()),
        _ => None,
    }
}

pub fn integer_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .map(|f| f as i64)
        }),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| parse_decimal(s).filter(|d| d.fract().is_zero()).and_then(|d| i64::try_from(d).ok()))
        }
        _ => None,
    }
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    if s.is_empty() {
        return None;
    }
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_and_numeric_strings_parse() {
        assert_eq!(decimal_from_value(&json!(12.5)), Some(Decimal::new(125, 1)));
        assert_eq!(decimal_from_value(&json!(" 1200.75 ")), Some(Decimal::new(120075, 2)));
        assert_eq!(integer_from_value(&json!("42")), Some(42));
        assert_eq!(integer_from_value(&json!(7.0)), Some(7));
    }

    #[test]
    fn garbage_becomes_none() {
        assert_eq!(decimal_from_value(&json!("abc")), None);
        assert_eq!(decimal_from_value(&json!(null)), None);
        assert_eq!(decimal_from_value(&json!("")), None);
        assert_eq!(integer_from_value(&json!(1.5)), None);
        assert_eq!(integer_from_value(&json!({"id": 1})), None);
    }
}
