//! Flat filter strings.
//!
//! Syntax (tokens separated by `~`):
//!   field~op~value                  - single comparison
//!   a~eq~1~and~b~eq~2               - AND
//!   a~eq~1~or~b~eq~2                - OR
//!   a~eq~1~and~(b~eq~2~or~b~eq~3)   - grouping, brackets glued to tokens
//!   owner.name~eq~x                 - nested field path (opaque to the parser)
//!
//! One bracket level uses one logic; `a~and~b~or~c` style mixing is an
//! error rather than a precedence question.

mod ast;
mod error;
mod lexer;
mod logic;
mod operator;
mod parser;
mod render;

pub use ast::*;
pub use error::GrammarError;
pub use lexer::tokenize;
pub use logic::{DELIMITER, Logic};
pub use operator::Operator;
pub use parser::{parse, parse_opt, parse_range};
pub use render::render;
