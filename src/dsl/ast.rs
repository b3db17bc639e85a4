//! Expression tree for filter strings.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::logic::Logic;

/// Opens a nested group in text form.
pub const LEFT_BRACKET: char = '(';
/// Closes a nested group in text form.
pub const RIGHT_BRACKET: char = ')';
/// Separates the segments of a nested field path such as `owner.name`.
pub const PATH_DELIMITER: char = '.';

/// Root filter expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    /// Single comparison: `field~operator~value`
    Leaf {
        field: String,
        operator: String,
        value: Atom,
    },

    /// Children combined by one logic: `a~eq~1~and~b~eq~2`
    Group { logic: Logic, children: Vec<Filter> },
}

/// The right-hand side of a leaf.
///
/// Parsed leaves always hold `Text`. The other variants only come from
/// programmatic construction; the core never interprets them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Atom {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    List(Vec<Atom>),
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atom::Bool(b) => write!(f, "{b}"),
            Atom::Integer(i) => write!(f, "{i}"),
            Atom::Float(x) => write!(f, "{x}"),
            Atom::Text(s) => f.write_str(s),
            Atom::List(items) => {
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

impl From<&str> for Atom {
    fn from(value: &str) -> Self {
        Atom::Text(value.to_string())
    }
}

impl From<String> for Atom {
    fn from(value: String) -> Self {
        Atom::Text(value)
    }
}

impl From<i64> for Atom {
    fn from(value: i64) -> Self {
        Atom::Integer(value)
    }
}

impl From<f64> for Atom {
    fn from(value: f64) -> Self {
        Atom::Float(value)
    }
}

impl From<bool> for Atom {
    fn from(value: bool) -> Self {
        Atom::Bool(value)
    }
}

impl<T: Into<Atom>> From<Vec<T>> for Atom {
    fn from(values: Vec<T>) -> Self {
        Atom::List(values.into_iter().map(Into::into).collect())
    }
}

impl Filter {
    /// Build a single comparison.
    pub fn leaf(
        field: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<Atom>,
    ) -> Self {
        Filter::Leaf {
            field: field.into(),
            operator: operator.into(),
            value: value.into(),
        }
    }

    /// Combine `children` with AND.
    ///
    /// An empty iterator yields an empty group, which renders as `""` and
    /// evaluates to true.
    pub fn and(children: impl IntoIterator<Item = Filter>) -> Self {
        Filter::group(Logic::And, children)
    }

    /// Combine `children` with OR.
    ///
    /// An empty iterator yields an empty group, which renders as `""` and
    /// evaluates to false.
    pub fn or(children: impl IntoIterator<Item = Filter>) -> Self {
        Filter::group(Logic::Or, children)
    }

    pub fn group(logic: Logic, children: impl IntoIterator<Item = Filter>) -> Self {
        Filter::Group {
            logic,
            children: children.into_iter().collect(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Filter::Leaf { .. })
    }

    /// Collapse groups holding a single child into that child.
    ///
    /// This is the shape the parser produces, so `parse(render(f))` equals
    /// `f.simplify()` for any tree of text leaves.
    pub fn simplify(self) -> Self {
        match self {
            Filter::Group { logic, children } => {
                let mut children: Vec<Filter> =
                    children.into_iter().map(Filter::simplify).collect();
                if children.len() == 1 {
                    if let Some(only) = children.pop() {
                        return only;
                    }
                }
                Filter::Group { logic, children }
            }
            leaf => leaf,
        }
    }

    /// Number of leaves in the tree.
    pub fn leaf_count(&self) -> usize {
        match self {
            Filter::Leaf { .. } => 1,
            Filter::Group { children, .. } => children.iter().map(Filter::leaf_count).sum(),
        }
    }
}
