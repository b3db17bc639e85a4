//! Where-clause accumulation over a record set.

use rayon::prelude::*;
use serde_json::Value;
use std::collections::HashSet;

use super::{EvalError, Evaluator};
use crate::dsl::{Atom, Filter, GrammarError, parse};

/// A set of where-clauses combined with AND.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    filters: Vec<Filter>,
    distinct: bool,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a clause from a filter string. Empty strings add nothing.
    pub fn where_str(mut self, input: &str) -> Result<Self, GrammarError> {
        if let Some(filter) = parse(input)? {
            self.filters.push(filter);
        }
        Ok(self)
    }

    pub fn where_filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn where_leaf(
        self,
        field: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<Atom>,
    ) -> Self {
        self.where_filter(Filter::leaf(field, operator, value))
    }

    /// Drop repeated records from the result.
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// All clauses as one tree, `None` when there are none.
    pub fn filter(&self) -> Option<Filter> {
        match self.filters.as_slice() {
            [] => None,
            [only] => Some(only.clone()),
            many => Some(Filter::and(many.iter().cloned())),
        }
    }

    pub fn matches(&self, evaluator: &Evaluator, record: &Value) -> Result<bool, EvalError> {
        for filter in &self.filters {
            if !evaluator.test(filter, record)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Matching records in input order. Records are tested in parallel.
    pub fn apply<'r>(
        &self,
        evaluator: &Evaluator,
        records: &'r [Value],
    ) -> Result<Vec<&'r Value>, EvalError> {
        let tested: Vec<Option<&Value>> = records
            .par_iter()
            .map(|record| {
                self.matches(evaluator, record)
                    .map(|matched| matched.then_some(record))
            })
            .collect::<Result<_, EvalError>>()?;

        let mut seen = HashSet::new();
        let selected: Vec<&Value> = tested
            .into_iter()
            .flatten()
            .filter(|record| !self.distinct || seen.insert(record.to_string()))
            .collect();

        tracing::debug!(
            total = records.len(),
            selected = selected.len(),
            clauses = self.filters.len(),
            "selection applied"
        );
        Ok(selected)
    }
}
