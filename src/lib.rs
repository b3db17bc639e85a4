//! Flat `field~op~value` filter strings: parsing, rendering and evaluation
//! against JSON records.

pub mod config;
pub mod dsl;
pub mod eval;

pub use dsl::{Filter, GrammarError, parse, render};
pub use eval::{EvalError, Evaluator, Selection};
