//! Canonical string form of a filter tree.

use std::fmt;

use super::ast::{Filter, LEFT_BRACKET, RIGHT_BRACKET};
use super::logic::DELIMITER;

/// Render a tree back to its filter string. An absent tree renders as `""`.
pub fn render(filter: Option<&Filter>) -> String {
    filter.map(Filter::to_string).unwrap_or_default()
}

fn write_filter(f: &mut fmt::Formatter<'_>, filter: &Filter, top_level: bool) -> fmt::Result {
    match filter {
        Filter::Leaf {
            field,
            operator,
            value,
        } => write!(f, "{field}{DELIMITER}{operator}{DELIMITER}{value}"),
        Filter::Group { children, .. } if children.is_empty() => Ok(()),
        // A lone child needs no brackets; parsing would drop them anyway.
        Filter::Group { children, .. } if children.len() == 1 => {
            write_filter(f, &children[0], top_level)
        }
        Filter::Group { logic, children } => {
            if !top_level {
                write!(f, "{LEFT_BRACKET}")?;
            }
            for (idx, child) in children.iter().enumerate() {
                if idx > 0 {
                    write!(f, "{DELIMITER}{logic}{DELIMITER}")?;
                }
                write_filter(f, child, false)?;
            }
            if !top_level {
                write!(f, "{RIGHT_BRACKET}")?;
            }
            Ok(())
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_filter(f, self, true)
    }
}
