//! Evaluator for filter trees against JSON records.

mod select;

pub use select::Selection;

use serde_json::Value;
use std::borrow::Cow;
use std::cmp::Ordering;
use thiserror::Error;
use time::format_description::{self, OwnedFormatItem};
use time::{Date, PrimitiveDateTime};

use crate::config::EvalConfig;
use crate::dsl::{Atom, Filter, Logic, Operator, PATH_DELIMITER};

#[derive(Debug, Error)]
pub enum EvalError {
    #[error("cannot resolve field path `{path}`: {cause}")]
    UnresolvedField { path: String, cause: String },

    #[error("unsupported operator `{0}`")]
    UnsupportedOperator(String),

    #[error("operator `in` expects a list, got `{0}`")]
    InvalidInOperand(String),

    #[error("illegal date `{value}`, required format is `{format}`")]
    InvalidDate { value: String, format: String },

    #[error("invalid date format `{format}`: {source}")]
    DateFormat {
        format: String,
        #[source]
        source: time::error::InvalidFormatDescription,
    },
}

/// Tests filter trees against JSON records.
///
/// Dotted field paths walk nested objects. Dates are recognized with the
/// configured format and only matter for ordering comparisons.
#[derive(Debug)]
pub struct Evaluator {
    date_format: OwnedFormatItem,
    date_pattern: String,
}

impl Evaluator {
    pub fn new(config: &EvalConfig) -> Result<Self, EvalError> {
        let date_format = format_description::parse_owned::<1>(&config.date_format).map_err(
            |source| EvalError::DateFormat {
                format: config.date_format.clone(),
                source,
            },
        )?;

        Ok(Self {
            date_format,
            date_pattern: config.date_format.clone(),
        })
    }

    /// Evaluate `filter` against `record`.
    ///
    /// Groups short-circuit; an empty AND holds and an empty OR does not.
    pub fn test(&self, filter: &Filter, record: &Value) -> Result<bool, EvalError> {
        match filter {
            Filter::Group {
                logic: Logic::And,
                children,
            } => {
                for child in children {
                    if !self.test(child, record)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Filter::Group {
                logic: Logic::Or,
                children,
            } => {
                for child in children {
                    if self.test(child, record)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Filter::Leaf {
                field,
                operator,
                value,
            } => {
                let actual = resolve(record, field)?;
                self.compare(operator, actual, value)
            }
        }
    }

    fn compare(
        &self,
        operator: &str,
        actual: Option<&Value>,
        expected: &Atom,
    ) -> Result<bool, EvalError> {
        let op: Operator = operator
            .parse()
            .map_err(|_| EvalError::UnsupportedOperator(operator.to_string()))?;

        // Like SQL, a missing value only satisfies `isnull` and `neq`.
        let Some(actual) = actual else {
            return Ok(matches!(op, Operator::IsNull | Operator::NotEqual));
        };

        let rhs = expected.to_string();
        let result = match op {
            Operator::IsNull => false,
            Operator::IsNotNull => true,
            Operator::Equal => equals(actual, expected),
            Operator::NotEqual => !equals(actual, expected),
            Operator::IsEmpty => actual.as_str() == Some(""),
            Operator::IsNotEmpty => actual.as_str() != Some(""),
            Operator::Contains => text(actual).contains(rhs.as_str()),
            Operator::NotContains => !text(actual).contains(rhs.as_str()),
            Operator::StartsWith => text(actual).starts_with(rhs.as_str()),
            Operator::EndsWith => text(actual).ends_with(rhs.as_str()),
            Operator::GreaterThan => {
                matches!(self.order(actual, expected)?, Some(Ordering::Greater))
            }
            Operator::GreaterThanOrEqual => matches!(
                self.order(actual, expected)?,
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Operator::LessThan => matches!(self.order(actual, expected)?, Some(Ordering::Less)),
            Operator::LessThanOrEqual => matches!(
                self.order(actual, expected)?,
                Some(Ordering::Less | Ordering::Equal)
            ),
            Operator::In => match expected {
                Atom::List(items) => items.iter().any(|item| equals(actual, item)),
                Atom::Text(items) => items
                    .split(',')
                    .any(|item| equals(actual, &Atom::from(item))),
                other => return Err(EvalError::InvalidInOperand(other.to_string())),
            },
        };

        Ok(result)
    }

    /// Order `actual` against `expected`: as dates when the record holds a
    /// date string, as numbers when both sides are numeric, else as text.
    fn order(&self, actual: &Value, expected: &Atom) -> Result<Option<Ordering>, EvalError> {
        let rhs = expected.to_string();

        if let Some(lhs) = actual.as_str().and_then(|s| self.parse_date(s)) {
            let rhs = self.parse_date(&rhs).ok_or_else(|| EvalError::InvalidDate {
                value: rhs.clone(),
                format: self.date_pattern.clone(),
            })?;
            return Ok(Some(lhs.cmp(&rhs)));
        }

        if let (Some(lhs), Some(rhs)) = (integer(actual), integer_atom(expected)) {
            return Ok(Some(lhs.cmp(&rhs)));
        }
        if let (Some(lhs), Some(rhs)) = (actual.as_f64(), numeric(expected)) {
            return Ok(lhs.partial_cmp(&rhs));
        }

        Ok(Some(text(actual).as_ref().cmp(rhs.as_str())))
    }

    fn parse_date(&self, value: &str) -> Option<PrimitiveDateTime> {
        PrimitiveDateTime::parse(value, &self.date_format)
            .ok()
            .or_else(|| Date::parse(value, &self.date_format).ok().map(Date::midnight))
    }
}

/// Walk a dotted path. Missing keys and explicit nulls both resolve to `None`.
fn resolve<'r>(record: &'r Value, path: &str) -> Result<Option<&'r Value>, EvalError> {
    let mut current = record;

    for segment in path.split(PATH_DELIMITER) {
        current = match current {
            Value::Object(map) => match map.get(segment) {
                Some(next) => next,
                None => return Ok(None),
            },
            Value::Null => return Ok(None),
            other => {
                return Err(EvalError::UnresolvedField {
                    path: path.to_string(),
                    cause: format!("cannot read `{segment}` from {}", kind(other)),
                });
            }
        };
    }

    Ok(match current {
        Value::Null => None,
        value => Some(value),
    })
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// String form of a record value; strings are taken without quotes.
fn text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s),
        other => Cow::Owned(other.to_string()),
    }
}

/// Exact value of an integral JSON number, signed or unsigned.
fn integer(value: &Value) -> Option<i128> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(i128::from)
            .or_else(|| n.as_u64().map(i128::from)),
        _ => None,
    }
}

fn integer_atom(atom: &Atom) -> Option<i128> {
    match atom {
        Atom::Integer(i) => Some(i128::from(*i)),
        Atom::Text(s) => s.parse().ok(),
        _ => None,
    }
}

fn numeric(atom: &Atom) -> Option<f64> {
    match atom {
        Atom::Integer(i) => Some(*i as f64),
        Atom::Float(x) => Some(*x),
        Atom::Text(s) => s.parse().ok(),
        _ => None,
    }
}

fn equals(actual: &Value, expected: &Atom) -> bool {
    // Integers above 2^53 are not exact as f64.
    if let (Some(lhs), Some(rhs)) = (integer(actual), integer_atom(expected)) {
        return lhs == rhs;
    }

    match (actual, expected) {
        (Value::Number(n), _) => match (n.as_f64(), numeric(expected)) {
            (Some(lhs), Some(rhs)) => (lhs - rhs).abs() < f64::EPSILON,
            _ => false,
        },
        (Value::Bool(b), Atom::Bool(expected)) => b == expected,
        (Value::Bool(b), Atom::Text(s)) => s.parse::<bool>().ok() == Some(*b),
        (Value::Array(items), Atom::List(expected)) => {
            items.len() == expected.len()
                && items.iter().zip(expected).all(|(a, e)| equals(a, e))
        }
        (Value::String(s), Atom::Text(expected)) => s == expected,
        (actual, expected) => text(actual) == expected.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::parse;
    use serde_json::json;

    fn evaluator() -> Evaluator {
        Evaluator::new(&EvalConfig::default()).unwrap()
    }

    fn check(filter: &str, record: &Value) -> bool {
        let filter = parse(filter).unwrap().unwrap();
        evaluator().test(&filter, record).unwrap()
    }

    #[test]
    fn test_equality() {
        let record = json!({"name": "Foo", "lanes": 2, "open": true});
        assert!(check("name~eq~Foo", &record));
        assert!(!check("name~eq~Bar", &record));
        assert!(check("name~neq~Bar", &record));
        assert!(check("lanes~eq~2", &record));
        assert!(check("lanes~eq~2.0", &record));
        assert!(check("open~eq~true", &record));
        assert!(!check("open~eq~yes", &record));
    }

    #[test]
    fn test_typed_values() {
        let eval = evaluator();
        let record = json!({"lanes": 2, "speed": 50.5});
        assert!(eval.test(&Filter::leaf("lanes", "eq", 2i64), &record).unwrap());
        assert!(eval.test(&Filter::leaf("speed", "gt", 50.0), &record).unwrap());
        assert!(!eval.test(&Filter::leaf("lanes", "eq", true), &record).unwrap());
    }

    #[test]
    fn test_null_checks() {
        let record = json!({"name": "Foo", "ref": null});
        assert!(check("ref~isnull~x", &record));
        assert!(check("missing~isnull~x", &record));
        assert!(check("name~isnotnull~x", &record));
        assert!(!check("ref~eq~x", &record));
        assert!(check("ref~neq~x", &record));
        assert!(!check("ref~contains~x", &record));
        assert!(!check("ref~doesnotcontain~x", &record));
    }

    #[test]
    fn test_empty_checks() {
        let record = json!({"a": "", "b": "x"});
        assert!(check("a~isempty~_", &record));
        assert!(!check("b~isempty~_", &record));
        assert!(check("b~isnotempty~_", &record));
        assert!(!check("a~isnotempty~_", &record));
    }

    #[test]
    fn test_string_operators() {
        let record = json!({"highway": "motorway_link"});
        assert!(check("highway~contains~way", &record));
        assert!(check("highway~doesnotcontain~trunk", &record));
        assert!(check("highway~startswith~motor", &record));
        assert!(check("highway~endswith~_link", &record));
        assert!(!check("highway~endswith~motor", &record));
    }

    #[test]
    fn test_numeric_ordering() {
        let record = json!({"lanes": 10});
        assert!(check("lanes~gt~9", &record));
        assert!(check("lanes~gte~10", &record));
        assert!(check("lanes~lt~11", &record));
        assert!(check("lanes~lte~10", &record));
        // Numeric, not lexicographic.
        assert!(!check("lanes~lt~9", &record));
    }

    #[test]
    fn test_large_integers_compare_exactly() {
        let record = json!({"id": 10000000000000000u64, "big": u64::MAX});
        assert!(!check("id~eq~10000000000000001", &record));
        assert!(check("id~eq~10000000000000000", &record));
        assert!(check("id~neq~10000000000000001", &record));
        assert!(check("id~lt~10000000000000001", &record));
        assert!(check("id~in~1,10000000000000000", &record));
        assert!(check("big~eq~18446744073709551615", &record));
        assert!(check("big~gt~18446744073709551614", &record));

        let eval = evaluator();
        let typed = Filter::leaf("id", "eq", 10000000000000001i64);
        assert!(!eval.test(&typed, &record).unwrap());
    }

    #[test]
    fn test_string_ordering() {
        let record = json!({"code": "b"});
        assert!(check("code~gt~a", &record));
        assert!(check("code~lt~c", &record));
    }

    #[test]
    fn test_date_ordering() {
        let record = json!({"created": "2024-03-01 12:30:00"});
        assert!(check("created~gt~2024-02-28 23:59:59", &record));
        assert!(check("created~lte~2024-03-01 12:30:00", &record));
        assert!(!check("created~lt~2024-01-01 00:00:00", &record));
    }

    #[test]
    fn test_date_format_from_config() {
        let eval = Evaluator::new(&EvalConfig {
            date_format: "[day].[month].[year]".into(),
        })
        .unwrap();
        let record = json!({"due": "05.01.2025"});
        let filter = parse("due~lt~10.01.2025").unwrap().unwrap();
        assert!(eval.test(&filter, &record).unwrap());
    }

    #[test]
    fn test_invalid_date_value() {
        let record = json!({"created": "2024-03-01 12:30:00"});
        let filter = parse("created~gt~yesterday").unwrap().unwrap();
        let err = evaluator().test(&filter, &record).unwrap_err();
        assert!(matches!(err, EvalError::InvalidDate { ref value, .. } if value == "yesterday"));
    }

    #[test]
    fn test_invalid_date_format() {
        let err = Evaluator::new(&EvalConfig {
            date_format: "[nonsense]".into(),
        })
        .unwrap_err();
        assert!(matches!(err, EvalError::DateFormat { .. }));
    }

    #[test]
    fn test_in_operator() {
        let eval = evaluator();
        let record = json!({"highway": "primary", "lanes": 3});
        assert!(check("highway~in~primary,secondary", &record));
        assert!(!check("highway~in~trunk,secondary", &record));

        let listed = Filter::leaf("lanes", "in", vec![2i64, 3i64]);
        assert!(eval.test(&listed, &record).unwrap());

        let scalar = Filter::leaf("lanes", "in", 3i64);
        assert!(matches!(
            eval.test(&scalar, &record),
            Err(EvalError::InvalidInOperand(_))
        ));
    }

    #[test]
    fn test_nested_path() {
        let record = json!({"owner": {"address": {"city": "Paris"}}, "tag": "x"});
        assert!(check("owner.address.city~eq~Paris", &record));
        assert!(check("owner.phone~isnull~_", &record));

        let filter = parse("tag.inner~eq~x").unwrap().unwrap();
        let err = evaluator().test(&filter, &record).unwrap_err();
        match err {
            EvalError::UnresolvedField { path, cause } => {
                assert_eq!(path, "tag.inner");
                assert!(cause.contains("a string"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unsupported_operator() {
        let filter = parse("a~like~x").unwrap().unwrap();
        let err = evaluator().test(&filter, &json!({"a": "x"})).unwrap_err();
        assert!(matches!(err, EvalError::UnsupportedOperator(ref op) if op == "like"));
    }

    #[test]
    fn test_groups() {
        let record = json!({"a": "a", "b": "bb"});
        assert!(check("a~eq~a~and~(b~eq~b~or~b~eq~bb)", &record));
        assert!(!check("a~eq~x~and~(b~eq~b~or~b~eq~bb)", &record));
        assert!(check("a~eq~x~or~b~eq~bb", &record));
    }

    #[test]
    fn test_short_circuit_skips_bad_operator() {
        let record = json!({"a": "a"});
        assert!(!check("a~eq~x~and~a~like~y", &record));
        assert!(check("a~eq~a~or~a~like~y", &record));
    }

    #[test]
    fn test_empty_groups() {
        let eval = evaluator();
        let record = json!({});
        assert!(eval.test(&Filter::and([]), &record).unwrap());
        assert!(!eval.test(&Filter::or([]), &record).unwrap());
    }
}
