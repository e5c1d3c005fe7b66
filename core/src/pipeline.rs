use crate::{
    ast::Expression,
    diagnostics::{Diagnostic, Diagnostics, Reporter},
    parser::Parser,
    scanner::Scanner,
    token::Token,
};

/// Outcome of running the front end over one source text.
#[derive(Debug, Clone)]
pub struct Processed {
    pub expression: Option<Expression>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Processed {
    /// True when any diagnostic was recorded, even if a tree was produced.
    pub fn had_error(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// Scans `source` into tokens, reporting lexical errors into a fresh
/// [`Diagnostics`].
pub fn scan(source: &str) -> (Vec<Token>, Diagnostics) {
    let mut diagnostics = Diagnostics::new();
    let tokens = Scanner::new(source, &mut diagnostics).scan_tokens();
    (tokens, diagnostics)
}

/// Scans and parses `source` as a single expression.
///
/// Every call owns its own scanner, parser and diagnostics, so successive
/// or concurrent runs never observe each other's errors.
pub fn process(source: &str) -> Processed {
    let (tokens, mut diagnostics) = scan(source);
    let expression = process_tokens(&tokens, &mut diagnostics);

    Processed {
        expression,
        diagnostics: diagnostics.into_vec(),
    }
}

/// Parses an already scanned token sequence, reporting into `reporter`.
pub fn process_tokens(tokens: &[Token], reporter: &mut dyn Reporter) -> Option<Expression> {
    Parser::new(tokens, reporter).parse().ok()
}
