//! Lexer implementation using logos, plus the indentation layout pass

mod token;

pub use token::Token;

use crate::ast::Span;
use crate::error::{ExtractionError, Result};
use logos::Logos;

/// Tokenize source code into a layout-aware token stream.
///
/// Raw line breaks are folded into logical `Newline` tokens and leading
/// whitespace becomes `Indent` / `Dedent`. Line breaks inside brackets are
/// insignificant. The first logical line sets the base indentation, so an
/// indented snippet (a method cut out of a class) lexes like top-level code.
pub fn tokenize(source: &str) -> Result<Vec<(Token, Span)>> {
    let mut tokens = Vec::new();
    let mut indents: Vec<usize> = Vec::new();
    let mut depth = 0usize;
    let mut at_line_start = true;
    let mut line_start = 0usize;
    let mut lexer = Token::lexer(source);

    while let Some(result) = lexer.next() {
        let span = Span::new(lexer.span().start, lexer.span().end);
        let token = match result {
            Ok(token) => token,
            Err(_) => {
                return Err(ExtractionError::parse(
                    format!("unexpected character: {:?}", lexer.slice()),
                    span,
                ));
            }
        };

        if token == Token::Newline {
            if depth == 0 {
                if !at_line_start {
                    tokens.push((Token::Newline, span));
                }
                at_line_start = true;
                line_start = span.end;
            }
            continue;
        }

        if at_line_start && depth == 0 {
            let column = span.start - line_start;
            match indents.last().copied() {
                None => indents.push(column),
                Some(top) if column > top => {
                    indents.push(column);
                    tokens.push((Token::Indent, Span::new(span.start, span.start)));
                }
                Some(top) if column < top => {
                    while indents.last().is_some_and(|&level| column < level) {
                        indents.pop();
                        tokens.push((Token::Dedent, Span::new(span.start, span.start)));
                    }
                    if indents.last() != Some(&column) {
                        return Err(ExtractionError::parse(
                            "unindent does not match any outer indentation level",
                            span,
                        ));
                    }
                }
                Some(_) => {}
            }
            at_line_start = false;
        }

        if token.opens_group() {
            depth += 1;
        } else if token.closes_group() {
            depth = depth.saturating_sub(1);
        }
        tokens.push((token, span));
    }

    let eof = Span::new(source.len(), source.len());
    if !at_line_start {
        tokens.push((Token::Newline, eof));
    }
    // The base level pushed by the first line closes nothing.
    for _ in indents.iter().skip(1) {
        tokens.push((Token::Dedent, eof));
    }

    Ok(tokens)
}
