//! Tokenizer for filter strings.

use winnow::combinator::separated;
use winnow::prelude::*;
use winnow::token::take_till;

use super::error::GrammarError;
use super::logic::DELIMITER;

// Manually define PResult for resilience against winnow version changes
type PResult<T> = Result<T, winnow::error::ErrMode<winnow::error::ContextError>>;

/// Everything up to the next delimiter. May be empty.
fn lex_token<'i>(input: &mut &'i str) -> PResult<&'i str> {
    take_till(0.., DELIMITER).parse_next(input)
}

fn lex_tokens<'i>(input: &mut &'i str) -> PResult<Vec<&'i str>> {
    separated(1.., lex_token, DELIMITER).parse_next(input)
}

/// Split a filter string into its tokens, in order.
///
/// The caller handles empty input; here every token must be non-empty, so
/// `a~~b` and a trailing delimiter are rejected.
pub fn tokenize(input: &str) -> Result<Vec<&str>, GrammarError> {
    let mut remaining = input;
    // The first token may be empty, so this only fails on a winnow bug.
    let tokens =
        lex_tokens(&mut remaining).map_err(|_| GrammarError::EmptyToken { position: 0 })?;

    if let Some(position) = tokens.iter().position(|t| t.is_empty()) {
        return Err(GrammarError::EmptyToken { position });
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_tokens() {
        let tokens = tokenize("highway~eq~primary").unwrap();
        assert_eq!(tokens, vec!["highway", "eq", "primary"]);
    }

    #[test]
    fn test_brackets_stay_attached() {
        let tokens = tokenize("a~eq~a~and~(b~eq~b~or~b~eq~bb)").unwrap();
        assert_eq!(
            tokens,
            vec!["a", "eq", "a", "and", "(b", "eq", "b", "or", "b", "eq", "bb)"]
        );
    }

    #[test]
    fn test_single_token() {
        assert_eq!(tokenize("a").unwrap(), vec!["a"]);
    }

    #[test]
    fn test_whitespace_is_kept() {
        assert_eq!(tokenize("a b~eq~ c").unwrap(), vec!["a b", "eq", " c"]);
    }

    #[test]
    fn test_empty_tokens_rejected() {
        assert_eq!(
            tokenize("a~~b"),
            Err(GrammarError::EmptyToken { position: 1 })
        );
        assert_eq!(
            tokenize("a~eq~"),
            Err(GrammarError::EmptyToken { position: 2 })
        );
        assert_eq!(tokenize("~"), Err(GrammarError::EmptyToken { position: 0 }));
    }
}
