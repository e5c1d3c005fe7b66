use std::fmt;

use crate::{
    parser::{ParseError, ParseErrorKind},
    scanner::{ScanError, ScanErrorKind},
    token::TokenType,
};

/// Where on its line a diagnostic points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    AtEnd,
    AtLexeme(String),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AtEnd => write!(f, "at end"),
            Self::AtLexeme(lexeme) => write!(f, "at '{}'", lexeme),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    Lexical(ScanErrorKind),
    Syntax(ParseErrorKind),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub line: u32,
    pub location: Option<Location>,
    pub message: String,
    pub kind: DiagnosticKind,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(
                f,
                "[line {}] Error {}: {}",
                self.line, location, self.message
            ),
            None => write!(f, "[line {}] Error: {}", self.line, self.message),
        }
    }
}

impl From<&ScanError> for Diagnostic {
    fn from(error: &ScanError) -> Self {
        Diagnostic {
            line: error.line(),
            location: None,
            message: error.kind().to_string(),
            kind: DiagnosticKind::Lexical(error.kind().clone()),
        }
    }
}

impl From<&ParseError> for Diagnostic {
    fn from(error: &ParseError) -> Self {
        let token = error.token();
        let location = if token.token_type == TokenType::Eof {
            Location::AtEnd
        } else {
            Location::AtLexeme(token.lexeme.clone())
        };

        Diagnostic {
            line: token.line,
            location: Some(location),
            message: error.kind().to_string(),
            kind: DiagnosticKind::Syntax(error.kind().clone()),
        }
    }
}

/// Sink for the problems found while scanning and parsing one source text.
///
/// Implementations must never fail; a report only records that something
/// went wrong so the caller can decide what to do once the run is over.
pub trait Reporter {
    fn report(&mut self, diagnostic: Diagnostic);

    fn had_error(&self) -> bool;
}

/// Collects diagnostics in the order they were reported.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    diagnostics: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

impl Reporter for Diagnostics {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    fn had_error(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}
