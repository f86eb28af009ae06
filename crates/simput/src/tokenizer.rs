//! quote-aware token splitting
//!
//! Splits a raw line into whitespace-separated tokens where single and double
//! quotes group text (quotes are kept, stripping them is up to the caller)
//! and a comment character outside quotes ends the line. The preprocessor
//! uses this to validate `@INCLUDE` arguments.
use crate::context::Context;
use crate::error::TokenizerError;

/// Characters that make the rest of a line (or the whole line) a comment
pub const COMMENT_CHARS: [char; 2] = ['!', '#'];

pub fn tokenize(line: &str) -> Result<Vec<String>, TokenizerError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<(char, usize)> = None;

    for (colnr, ch) in line.char_indices() {
        match quote {
            Some((quote_char, _)) => {
                current.push(ch);
                if ch == quote_char {
                    quote = None;
                }
            }
            None if ch == '\'' || ch == '"' => {
                quote = Some((ch, colnr));
                current.push(ch);
            }
            None if COMMENT_CHARS.contains(&ch) => break,
            None if ch.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            None => current.push(ch),
        }
    }

    if let Some((_, start)) = quote {
        return Err(TokenizerError::UnterminatedQuote {
            ctx: Context::for_line(line).with_cols(start, line.len().saturating_sub(1)),
        });
    }

    if !current.is_empty() {
        tokens.push(current);
    }

    Ok(tokens)
}
