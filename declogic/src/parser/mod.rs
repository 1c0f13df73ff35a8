//! Parser implementation using lalrpop

use crate::ast::{Module, Span};
use crate::error::{ExtractionError, Result};
use crate::lexer::Token;

#[cfg(test)]
mod tests;

lalrpop_util::lalrpop_mod!(
    #[allow(clippy::all)]
    grammar,
    "/parser/grammar.rs"
);

/// Parse a layout-aware token stream into a module AST
pub fn parse(source: &str, tokens: Vec<(Token, Span)>) -> Result<Module> {
    let token_iter = tokens
        .into_iter()
        .map(|(tok, span)| (span.start, tok, span.end));

    grammar::FileParser::new().parse(token_iter).map_err(|e| {
        use lalrpop_util::ParseError;

        let eof = Span::new(source.len(), source.len());
        match e {
            ParseError::InvalidToken { location } => {
                ExtractionError::parse("invalid token", Span::new(location, location + 1))
            }
            ParseError::UnrecognizedEof { location, expected } => ExtractionError::parse(
                format!("unexpected end of input, expected one of {}", expected.join(", ")),
                Span::new(location, location).merge(eof),
            ),
            ParseError::UnrecognizedToken {
                token: (start, tok, end),
                expected,
            } => ExtractionError::parse(
                format!("unexpected `{tok}`, expected one of {}", expected.join(", ")),
                Span::new(start, end),
            ),
            ParseError::ExtraToken {
                token: (start, tok, end),
            } => ExtractionError::parse(format!("extra token `{tok}`"), Span::new(start, end)),
            ParseError::User { error } => ExtractionError::parse(error, Span::new(0, 1)),
        }
    })
}

/// Tokenize and parse in one step
pub fn parse_source(source: &str) -> Result<Module> {
    let tokens = crate::lexer::tokenize(source)?;
    parse(source, tokens)
}
