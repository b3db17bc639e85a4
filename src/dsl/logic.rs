//! Logic connectives and the token delimiter.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Separates every token of a filter string.
pub const DELIMITER: char = '~';

/// How the children of a group are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Logic {
    And,
    Or,
}

impl Logic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Logic::And => "and",
            Logic::Or => "or",
        }
    }

    /// Recognize a connective token. Matching is exact.
    pub fn from_token(token: &str) -> Option<Logic> {
        match token {
            "and" => Some(Logic::And),
            "or" => Some(Logic::Or),
            _ => None,
        }
    }
}

impl fmt::Display for Logic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
