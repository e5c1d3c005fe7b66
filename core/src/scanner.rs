use thiserror::Error;

use crate::diagnostics::{Diagnostic, Reporter};
use crate::token::{Token, TokenType};
use crate::types::Literal;

pub type ScanResult<T> = std::result::Result<T, ScanError>;

/// Turns source text into tokens in a single forward pass.
///
/// The scanner walks the source one `char` at a time; `start` and `current`
/// are byte offsets, so lexemes are plain slices of the source.
pub struct Scanner<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    reporter: &'a mut dyn Reporter,
    start: usize,
    current: usize,
    line: u32,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str, reporter: &'a mut dyn Reporter) -> Self {
        Scanner {
            source,
            tokens: Vec::new(),
            reporter,
            start: 0,
            current: 0,
            line: 1,
        }
    }

    /// Scans the whole source. Errors are handed to the reporter and never
    /// stop the scan, so the result always ends with a single `Eof` token.
    pub fn scan_tokens(mut self) -> Vec<Token> {
        while !self.is_at_end() {
            self.start = self.current;
            if let Err(err) = self.scan_token() {
                self.reporter.report(Diagnostic::from(&err));
            }
        }

        self.tokens.push(Token::eof(self.line));
        self.tokens
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn scan_token(&mut self) -> ScanResult<()> {
        let Some(c) = self.advance() else {
            return Ok(());
        };

        match c {
            // Single character tokens
            '(' => self.add_token(TokenType::LeftParen),
            ')' => self.add_token(TokenType::RightParen),
            '{' => self.add_token(TokenType::LeftBrace),
            '}' => self.add_token(TokenType::RightBrace),
            ',' => self.add_token(TokenType::Comma),
            '.' => self.add_token(TokenType::Dot),
            '-' => self.add_token(TokenType::Minus),
            '+' => self.add_token(TokenType::Plus),
            ';' => self.add_token(TokenType::Semicolon),
            '*' => self.add_token(TokenType::Star),

            // One or two character tokens
            '!' => self.add_operator('=', TokenType::BangEqual, TokenType::Bang),
            '=' => self.add_operator('=', TokenType::EqualEqual, TokenType::Equal),
            '<' => self.add_operator('=', TokenType::LessEqual, TokenType::Less),
            '>' => self.add_operator('=', TokenType::GreaterEqual, TokenType::Greater),

            // Comments
            '/' => {
                if self.matches('/') {
                    // A comment goes until the end of the line
                    while self.peek().is_some_and(|c| c != '\n') {
                        self.advance();
                    }
                } else {
                    self.add_token(TokenType::Slash);
                }
            }

            // Ignore whitespace, a '\r' before '\n' included
            ' ' | '\r' | '\t' => {}

            '\n' => self.line += 1,

            '"' => return self.string(),

            c if c.is_ascii_digit() => self.number(),
            c if Scanner::is_alpha(c) => self.identifier(),

            _ => return Err(ScanError::new(self.line, ScanErrorKind::UnexpectedCharacter)),
        }

        Ok(())
    }

    fn number(&mut self) {
        self.skip_digits();

        // A dot only belongs to the number when a digit follows it
        if self.peek() == Some('.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            self.skip_digits();
        }

        // A run of ASCII digits with an optional fraction always parses
        let value = self.lexeme().parse::<f64>().unwrap_or_default();
        self.add_literal_token(TokenType::Number, Literal::Number(value));
    }

    fn skip_digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
    }

    fn identifier(&mut self) {
        while self.peek().is_some_and(Scanner::is_alphanumeric) {
            self.advance();
        }

        let token_type = TokenType::keyword(self.lexeme()).unwrap_or(TokenType::Identifier);
        self.add_token(token_type);
    }

    fn string(&mut self) -> ScanResult<()> {
        while let Some(c) = self.peek() {
            if c == '"' {
                break;
            }

            if c == '\n' {
                self.line += 1;
            }

            self.advance();
        }

        if self.is_at_end() {
            return Err(ScanError::new(self.line, ScanErrorKind::UnterminatedString));
        }

        // Consume the closing "
        self.advance();

        // Trim surrounding quotes, both one byte wide
        let value = self.source[self.start + 1..self.current - 1].to_string();
        self.add_literal_token(TokenType::String, Literal::String(value));

        Ok(())
    }

    fn is_alpha(c: char) -> bool {
        c.is_ascii_alphabetic() || c == '_'
    }

    fn is_alphanumeric(c: char) -> bool {
        c.is_ascii_alphanumeric() || c == '_'
    }

    fn peek(&self) -> Option<char> {
        self.source[self.current..].chars().next()
    }

    fn peek_next(&self) -> Option<char> {
        self.source[self.current..].chars().nth(1)
    }

    fn matches(&mut self, expected: char) -> bool {
        if self.peek() != Some(expected) {
            return false;
        }

        self.current += expected.len_utf8();
        true
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.current += c.len_utf8();
        Some(c)
    }

    fn lexeme(&self) -> &'a str {
        &self.source[self.start..self.current]
    }

    fn add_operator(&mut self, second: char, matched: TokenType, single: TokenType) {
        let token_type = if self.matches(second) { matched } else { single };
        self.add_token(token_type);
    }

    fn add_token(&mut self, token_type: TokenType) {
        let lexeme = self.lexeme().to_string();
        self.tokens.push(Token::new(token_type, lexeme, None, self.line));
    }

    fn add_literal_token(&mut self, token_type: TokenType, literal: Literal) {
        let lexeme = self.lexeme().to_string();
        self.tokens.push(Token::new(token_type, lexeme, Some(literal), self.line));
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanError {
    line: u32,
    kind: ScanErrorKind,
}

impl ScanError {
    pub fn new(line: u32, kind: ScanErrorKind) -> Self {
        ScanError { line, kind }
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn kind(&self) -> &ScanErrorKind {
        &self.kind
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanErrorKind {
    #[error("unexpected character.")]
    UnexpectedCharacter,
    #[error("Unterminated string.")]
    UnterminatedString,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{DiagnosticKind, Diagnostics};

    fn scan(source: &str) -> (Vec<Token>, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let tokens = Scanner::new(source, &mut diagnostics).scan_tokens();
        (tokens, diagnostics)
    }

    fn types(tokens: &[Token]) -> Vec<TokenType> {
        tokens.iter().map(|token| token.token_type).collect()
    }

    #[test]
    fn test_empty_source_yields_only_eof() {
        let (tokens, diagnostics) = scan("");

        assert_eq!(types(&tokens), vec![TokenType::Eof]);
        assert_eq!(tokens[0].line, 1);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_punctuation() {
        let (tokens, _) = scan("(){},.-+;*/");

        assert_eq!(
            types(&tokens),
            vec![
                TokenType::LeftParen,
                TokenType::RightParen,
                TokenType::LeftBrace,
                TokenType::RightBrace,
                TokenType::Comma,
                TokenType::Dot,
                TokenType::Minus,
                TokenType::Plus,
                TokenType::Semicolon,
                TokenType::Star,
                TokenType::Slash,
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn test_two_character_operators_are_greedy() {
        let (tokens, _) = scan("!= ! == = <= < >= >");

        assert_eq!(
            types(&tokens),
            vec![
                TokenType::BangEqual,
                TokenType::Bang,
                TokenType::EqualEqual,
                TokenType::Equal,
                TokenType::LessEqual,
                TokenType::Less,
                TokenType::GreaterEqual,
                TokenType::Greater,
                TokenType::Eof,
            ]
        );
        assert_eq!(tokens[0].lexeme, "!=");
    }

    #[test]
    fn test_operator_at_end_of_input() {
        let (tokens, _) = scan("!");

        assert_eq!(types(&tokens), vec![TokenType::Bang, TokenType::Eof]);
    }

    #[test]
    fn test_line_comment_is_skipped() {
        let (tokens, _) = scan("1 // the rest is ignored (\n2");

        assert_eq!(
            types(&tokens),
            vec![TokenType::Number, TokenType::Number, TokenType::Eof]
        );
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn test_numbers() {
        let (tokens, _) = scan("42 2.75");

        assert_eq!(tokens[0].literal, Some(Literal::Number(42.0)));
        assert_eq!(tokens[0].lexeme, "42");
        assert_eq!(tokens[1].literal, Some(Literal::Number(2.75)));
        assert_eq!(tokens[1].lexeme, "2.75");
    }

    #[test]
    fn test_trailing_dot_is_not_part_of_number() {
        let (tokens, diagnostics) = scan("123.");

        assert_eq!(
            types(&tokens),
            vec![TokenType::Number, TokenType::Dot, TokenType::Eof]
        );
        assert_eq!(tokens[0].lexeme, "123");
        assert_eq!(tokens[0].literal, Some(Literal::Number(123.0)));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_leading_dot_is_not_part_of_number() {
        let (tokens, _) = scan(".5");

        assert_eq!(
            types(&tokens),
            vec![TokenType::Dot, TokenType::Number, TokenType::Eof]
        );
    }

    #[test]
    fn test_string_literal() {
        let (tokens, _) = scan(r#""hello world""#);

        assert_eq!(tokens[0].token_type, TokenType::String);
        assert_eq!(tokens[0].lexeme, r#""hello world""#);
        assert_eq!(
            tokens[0].literal,
            Some(Literal::String("hello world".to_string()))
        );
    }

    #[test]
    fn test_multiline_string_counts_lines() {
        let (tokens, _) = scan("\"a\nb\"\n1");

        assert_eq!(tokens[0].literal, Some(Literal::String("a\nb".to_string())));
        assert_eq!(tokens[0].line, 2);
        assert_eq!(tokens[1].line, 3);
    }

    #[test]
    fn test_unterminated_string() {
        let (tokens, diagnostics) = scan("\"abc");

        assert_eq!(types(&tokens), vec![TokenType::Eof]);
        assert_eq!(diagnostics.len(), 1);

        let diagnostic = diagnostics.iter().next().unwrap();
        assert_eq!(
            diagnostic.kind,
            DiagnosticKind::Lexical(ScanErrorKind::UnterminatedString)
        );
        assert_eq!(diagnostic.message, "Unterminated string.");
    }

    #[test]
    fn test_unexpected_character_does_not_stop_scanning() {
        let (tokens, diagnostics) = scan("1 @ 2");

        assert_eq!(
            types(&tokens),
            vec![TokenType::Number, TokenType::Number, TokenType::Eof]
        );
        assert_eq!(diagnostics.len(), 1);

        let diagnostic = diagnostics.iter().next().unwrap();
        assert_eq!(
            diagnostic.kind,
            DiagnosticKind::Lexical(ScanErrorKind::UnexpectedCharacter)
        );
        assert_eq!(diagnostic.to_string(), "[line 1] Error: unexpected character.");
    }

    #[test]
    fn test_every_bad_character_is_reported() {
        let (tokens, diagnostics) = scan("@#\n$");

        assert_eq!(types(&tokens), vec![TokenType::Eof]);
        let lines: Vec<u32> = diagnostics.iter().map(|d| d.line).collect();
        assert_eq!(lines, vec![1, 1, 2]);
    }

    #[test]
    fn test_keywords_and_identifiers() {
        let (tokens, _) = scan(
            "and class else false for fun if nil or print return super this true var while \
             orchid _under score9",
        );

        assert_eq!(
            types(&tokens),
            vec![
                TokenType::And,
                TokenType::Class,
                TokenType::Else,
                TokenType::False,
                TokenType::For,
                TokenType::Fun,
                TokenType::If,
                TokenType::Nil,
                TokenType::Or,
                TokenType::Print,
                TokenType::Return,
                TokenType::Super,
                TokenType::This,
                TokenType::True,
                TokenType::Var,
                TokenType::While,
                TokenType::Identifier,
                TokenType::Identifier,
                TokenType::Identifier,
                TokenType::Eof,
            ]
        );
        assert_eq!(tokens[16].lexeme, "orchid");
        assert!(tokens.iter().take(16).all(|token| token.literal.is_none()));
    }

    #[test]
    fn test_lines_are_tracked_across_crlf() {
        let (tokens, _) = scan("1\r\n2\n\n3");

        let lines: Vec<u32> = tokens.iter().map(|token| token.line).collect();
        assert_eq!(lines, vec![1, 2, 4, 4]);
    }

    #[test]
    fn test_non_ascii_character_is_a_single_error() {
        let (tokens, diagnostics) = scan("1 é 2");

        assert_eq!(
            types(&tokens),
            vec![TokenType::Number, TokenType::Number, TokenType::Eof]
        );
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_combining_mark_inside_string_is_kept() {
        let (tokens, diagnostics) = scan("\"\u{301}abc\" 1");

        assert_eq!(
            types(&tokens),
            vec![TokenType::String, TokenType::Number, TokenType::Eof]
        );
        assert_eq!(
            tokens[0].literal,
            Some(Literal::String("\u{301}abc".to_string()))
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_combining_mark_after_digit_keeps_the_number() {
        let (tokens, diagnostics) = scan("1\u{301} + 2");

        assert_eq!(
            types(&tokens),
            vec![
                TokenType::Number,
                TokenType::Plus,
                TokenType::Number,
                TokenType::Eof
            ]
        );
        assert_eq!(tokens[0].lexeme, "1");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics.iter().next().unwrap().kind,
            DiagnosticKind::Lexical(ScanErrorKind::UnexpectedCharacter)
        );
    }

    #[test]
    fn test_multibyte_text_in_string_and_comment() {
        let (tokens, diagnostics) = scan("\"héllo wörld\" // ünïcode\n");

        assert_eq!(types(&tokens), vec![TokenType::String, TokenType::Eof]);
        assert_eq!(tokens[0].lexeme, "\"héllo wörld\"");
        assert_eq!(tokens[1].line, 2);
        assert!(diagnostics.is_empty());
    }
}
