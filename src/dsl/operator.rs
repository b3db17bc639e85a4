//! Comparison operator tokens understood by evaluation backends.

use std::fmt;
use std::str::FromStr;

/// A recognized operator token.
///
/// The parser does not check operators; a leaf keeps whatever token it was
/// given and the backend rejects the ones it cannot evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Equal,              // eq
    NotEqual,           // neq
    IsNull,             // isnull
    IsNotNull,          // isnotnull
    IsEmpty,            // isempty
    IsNotEmpty,         // isnotempty
    Contains,           // contains
    NotContains,        // doesnotcontain
    StartsWith,         // startswith
    EndsWith,           // endswith
    GreaterThan,        // gt
    LessThan,           // lt
    GreaterThanOrEqual, // gte
    LessThanOrEqual,    // lte
    In,                 // in
}

impl Operator {
    pub const ALL: [Operator; 15] = [
        Operator::Equal,
        Operator::NotEqual,
        Operator::IsNull,
        Operator::IsNotNull,
        Operator::IsEmpty,
        Operator::IsNotEmpty,
        Operator::Contains,
        Operator::NotContains,
        Operator::StartsWith,
        Operator::EndsWith,
        Operator::GreaterThan,
        Operator::LessThan,
        Operator::GreaterThanOrEqual,
        Operator::LessThanOrEqual,
        Operator::In,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equal => "eq",
            Operator::NotEqual => "neq",
            Operator::IsNull => "isnull",
            Operator::IsNotNull => "isnotnull",
            Operator::IsEmpty => "isempty",
            Operator::IsNotEmpty => "isnotempty",
            Operator::Contains => "contains",
            Operator::NotContains => "doesnotcontain",
            Operator::StartsWith => "startswith",
            Operator::EndsWith => "endswith",
            Operator::GreaterThan => "gt",
            Operator::LessThan => "lt",
            Operator::GreaterThanOrEqual => "gte",
            Operator::LessThanOrEqual => "lte",
            Operator::In => "in",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Operator::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == value)
            .ok_or_else(|| format!("unknown operator: {value}"))
    }
}
