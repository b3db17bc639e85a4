use thiserror::Error;

/// Malformed filter string.
///
/// `span` is the offending token range joined back with the delimiter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    #[error("illegal token count {count} in `{span}`: expected a multiple of 4 plus 3")]
    TokenCount { span: String, count: usize },

    #[error("empty token at position {position}")]
    EmptyToken { position: usize },

    #[error("unbalanced brackets in `{span}`")]
    UnbalancedBrackets { span: String },

    #[error("illegal or mixed logic `{token}` in one level of `{span}`")]
    MixedLogic { token: String, span: String },

    #[error("incomplete condition `{span}`")]
    EmptyCondition { span: String },

    #[error("in `{span}`: {source}")]
    Nested {
        span: String,
        #[source]
        source: Box<GrammarError>,
    },
}

impl GrammarError {
    /// The innermost error, skipping `Nested` wrappers.
    pub fn root_cause(&self) -> &GrammarError {
        match self {
            GrammarError::Nested { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
