//! Error types and reporting

use crate::ast::Span;
use serde::Serialize;
use thiserror::Error;

/// Result type alias for the extraction stage
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Stage-level failure while turning source text into an IR model
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum ExtractionError {
    #[error("parse error at {span}: {message}")]
    ParseError { message: String, span: Span },

    #[error("{}", not_found_message(name.as_deref()))]
    NotFound { name: Option<String> },

    #[error("ambiguous target: {} functions found ({}); pass a function name", candidates.len(), candidates.join(", "))]
    AmbiguousTarget { candidates: Vec<String> },

    /// Only raised by strict builds
    #[error("function `{function}` has a path at {span} that falls through without returning")]
    FallThrough { function: String, span: Span },
}

fn not_found_message(name: Option<&str>) -> String {
    match name {
        Some(name) => format!("function `{name}` not found"),
        None => "no function definition found".to_string(),
    }
}

impl ExtractionError {
    pub fn parse(message: impl Into<String>, span: Span) -> Self {
        Self::ParseError {
            message: message.into(),
            span,
        }
    }

    pub fn not_found(name: Option<&str>) -> Self {
        Self::NotFound {
            name: name.map(str::to_string),
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            Self::ParseError { span, .. } | Self::FallThrough { span, .. } => Some(*span),
            Self::NotFound { .. } | Self::AmbiguousTarget { .. } => None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::ParseError { .. } => "Parse",
            Self::NotFound { .. } => "Not found",
            Self::AmbiguousTarget { .. } => "Ambiguous target",
            Self::FallThrough { .. } => "Fall-through",
        }
    }
}

/// Report error with ariadne
pub fn report_error(filename: &str, source: &str, error: &ExtractionError) {
    use ariadne::{Color, Label, Report, ReportKind, Source};

    let kind = error.kind();
    let span = error.span().unwrap_or_default();
    let mut report = Report::build(ReportKind::Error, (filename, span.start..span.end))
        .with_message(format!("{kind} error"));
    if error.span().is_some() {
        report = report.with_label(
            Label::new((filename, span.start..span.end))
                .with_message(error.to_string())
                .with_color(Color::Red),
        );
    } else {
        report = report.with_note(error.to_string());
    }

    if report.finish().eprint((filename, Source::from(source))).is_err() {
        eprintln!("{kind} error: {error}");
    }
}
