//! Parser for the filter DSL.
//!
//! Grammar (in rough EBNF, `~` between every token):
//!
//! filter  = group (LOGIC group)*
//! group   = "(" filter ")" | leaf
//! leaf    = FIELD OPERATOR VALUE
//! LOGIC   = "and" | "or"
//!
//! Brackets are glued to the neighbouring token (`(a~eq~1~or~b~eq~2)`), so
//! every range decomposes into 3-token leaves joined by 1-token connectives
//! and always holds `4n + 3` tokens. All connectives of one bracket level
//! must be the same; there is no precedence between `and` and `or`.

use std::str::FromStr;

use super::ast::{Filter, LEFT_BRACKET, RIGHT_BRACKET};
use super::error::GrammarError;
use super::lexer::tokenize;
use super::logic::{DELIMITER, Logic};

/// An inclusive window over the token array.
///
/// Bracket markers stripped from the window's first and last token are
/// tracked as trim counts instead of rewriting the tokens, so nested
/// windows can share one array.
#[derive(Debug, Clone, Copy)]
struct Span<'t, 'i> {
    tokens: &'t [&'i str],
    start: usize,
    end: usize,
    head_trim: usize,
    tail_trim: usize,
}

impl<'t, 'i> Span<'t, 'i> {
    fn new(tokens: &'t [&'i str], start: usize, end: usize) -> Self {
        Span {
            tokens,
            start,
            end,
            head_trim: 0,
            tail_trim: 0,
        }
    }

    fn len(&self) -> usize {
        self.end + 1 - self.start
    }

    /// Token at `idx` as seen from this window.
    fn token(&self, idx: usize) -> &'i str {
        let mut token = self.tokens[idx];
        if idx == self.start {
            token = &token[self.head_trim.min(token.len())..];
        }
        if idx == self.end {
            token = &token[..token.len().saturating_sub(self.tail_trim)];
        }
        token
    }

    /// Sub-window; edges shared with this window keep their trims.
    fn sub(&self, start: usize, end: usize) -> Self {
        Span {
            tokens: self.tokens,
            start,
            end,
            head_trim: if start == self.start { self.head_trim } else { 0 },
            tail_trim: if end == self.end { self.tail_trim } else { 0 },
        }
    }

    /// Same window with one more bracket marker removed at each edge.
    fn stripped(&self) -> Self {
        Span {
            head_trim: self.head_trim + 1,
            tail_trim: self.tail_trim + 1,
            ..*self
        }
    }

    fn text(&self) -> String {
        let mut out = String::new();
        for idx in self.start..=self.end {
            if idx > self.start {
                out.push(DELIMITER);
            }
            out.push_str(self.token(idx));
        }
        out
    }
}

fn leading_run(token: &str, marker: char) -> usize {
    token.chars().take_while(|&c| c == marker).count()
}

fn trailing_run(token: &str, marker: char) -> usize {
    token.chars().rev().take_while(|&c| c == marker).count()
}

/// Find the token closing the bracket opened at `open`.
///
/// Walks one leaf slot (4 tokens) at a time, counting the `(` run at the
/// start of each slot's field and the `)` run at the end of its value. The
/// group ends at the first slot where both counts agree. Markers anywhere
/// else in a token are plain text. Closing more brackets than were opened
/// is an error, so the closing slot always ends with `)`.
fn find_right_bracket(span: &Span, open: usize) -> Result<usize, GrammarError> {
    let mut left = 0;
    let mut right = 0;
    let mut j = open;

    while j + 2 <= span.end {
        left += leading_run(span.token(j), LEFT_BRACKET);
        right += trailing_run(span.token(j + 2), RIGHT_BRACKET);
        if right > left {
            return Err(GrammarError::UnbalancedBrackets {
                span: span.sub(open, j + 2).text(),
            });
        }
        if left == right {
            return Ok(j + 2);
        }
        j += 4;
    }

    Err(GrammarError::UnbalancedBrackets {
        span: span.sub(open, span.end).text(),
    })
}

/// True when the bracket opening the window is closed by its last token.
///
/// `(a~eq~a)~and~(b~eq~b)` starts and ends with brackets, but they belong to
/// different groups and must not be stripped.
fn wraps_whole(span: &Span) -> Result<bool, GrammarError> {
    if !span.token(span.start).starts_with(LEFT_BRACKET)
        || !span.token(span.end).ends_with(RIGHT_BRACKET)
    {
        return Ok(false);
    }
    Ok(find_right_bracket(span, span.start)? == span.end)
}

fn parse_leaf(span: &Span, at: usize) -> Result<Filter, GrammarError> {
    let field = span.token(at);
    let operator = span.token(at + 1);
    let value = span.token(at + 2);

    if field.is_empty() || operator.is_empty() || value.is_empty() {
        return Err(GrammarError::EmptyCondition {
            span: span.sub(at, at + 2).text(),
        });
    }
    if value.ends_with(RIGHT_BRACKET) {
        return Err(GrammarError::UnbalancedBrackets {
            span: span.sub(at, at + 2).text(),
        });
    }

    Ok(Filter::leaf(field, operator, value))
}

fn parse_span(span: Span) -> Result<Filter, GrammarError> {
    let count = span.len();
    if count % 4 != 3 {
        return Err(GrammarError::TokenCount {
            span: span.text(),
            count,
        });
    }

    let span = if wraps_whole(&span)? {
        span.stripped()
    } else {
        span
    };
    tracing::trace!(tokens = %span.text(), "parsing span");

    let mut children = Vec::new();
    let mut logic: Option<Logic> = None;
    let mut i = span.start;

    while i + 2 <= span.end {
        // `last` is the final token of the group starting at `i`.
        let last = if span.token(i).starts_with(LEFT_BRACKET) {
            let j = find_right_bracket(&span, i)?;
            let child = parse_span(span.sub(i, j)).map_err(|source| GrammarError::Nested {
                span: span.text(),
                source: Box::new(source),
            })?;
            children.push(child);
            j
        } else {
            children.push(parse_leaf(&span, i)?);
            i + 2
        };

        let connective = last + 1;
        if connective <= span.end {
            let token = span.token(connective);
            match (Logic::from_token(token), logic) {
                (Some(found), None) => logic = Some(found),
                (Some(found), Some(fixed)) if found == fixed => {}
                _ => {
                    return Err(GrammarError::MixedLogic {
                        token: token.to_string(),
                        span: span.text(),
                    });
                }
            }
        }
        i = connective + 1;
    }

    match logic {
        Some(logic) => Ok(Filter::Group { logic, children }),
        None => children.pop().ok_or_else(|| GrammarError::EmptyCondition {
            span: span.text(),
        }),
    }
}

/// Parse the inclusive token range `start..=end`.
pub fn parse_range(tokens: &[&str], start: usize, end: usize) -> Result<Filter, GrammarError> {
    if start > end || end >= tokens.len() {
        return Err(GrammarError::TokenCount {
            span: String::new(),
            count: 0,
        });
    }
    parse_span(Span::new(tokens, start, end))
}

/// Parse a filter string into a tree.
///
/// Empty input means "no filter" and yields `Ok(None)`.
pub fn parse(input: &str) -> Result<Option<Filter>, GrammarError> {
    if input.is_empty() {
        return Ok(None);
    }

    let tokens = tokenize(input)?;
    let filter = parse_range(&tokens, 0, tokens.len() - 1)?;
    tracing::debug!(input, leaves = filter.leaf_count(), "parsed filter");
    Ok(Some(filter))
}

/// Like [`parse`], treating a missing input as empty.
pub fn parse_opt(input: Option<&str>) -> Result<Option<Filter>, GrammarError> {
    input.map_or(Ok(None), parse)
}

impl FromStr for Filter {
    type Err = GrammarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)?.ok_or_else(|| GrammarError::EmptyCondition {
            span: String::new(),
        })
    }
}
