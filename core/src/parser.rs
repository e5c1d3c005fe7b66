use thiserror::Error;

use crate::{
    ast::Expression,
    diagnostics::{Diagnostic, Reporter},
    token::{Token, TokenType},
    types::Literal,
};

pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Height of the tallest tree the parser builds. Every grouping, unary and
/// binary node adds a level; going past it is a syntax error.
pub const MAX_DEPTH: usize = 256;

/// Recursive descent parser for expressions.
///
/// Each grammar rule is one method, ordered from the loosest binding
/// operator to the tightest:
///
/// ```text
/// expression     -> equality ;
/// equality       -> comparison ( ( "!=" | "==" ) comparison )* ;
/// comparison     -> term ( ( ">" | ">=" | "<" | "<=" ) term )* ;
/// term           -> factor ( ( "-" | "+" ) factor )* ;
/// factor         -> unary ( ( "/" | "*" ) unary )* ;
/// unary          -> ( "!" | "-" ) unary | primary ;
/// primary        -> NUMBER | STRING | "false" | "true" | "nil"
///                 | "(" expression ")" ;
/// ```
pub struct Parser<'a> {
    tokens: &'a [Token],
    reporter: &'a mut dyn Reporter,
    current: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    /// `tokens` must end with an `Eof` token, as produced by the scanner.
    pub fn new(tokens: &'a [Token], reporter: &'a mut dyn Reporter) -> Self {
        Parser {
            tokens,
            reporter,
            current: 0,
            depth: 0,
        }
    }

    /// Parses one expression starting at the current token.
    ///
    /// The first syntax error aborts the attempt: it is reported and
    /// returned, and no partial tree is produced. Tokens after a complete
    /// expression are left unconsumed.
    pub fn parse(&mut self) -> ParseResult<Expression> {
        self.expression()
            .map(|node| node.expression)
            .inspect_err(|err| {
                self.reporter.report(Diagnostic::from(err));
            })
    }

    /// Discards tokens until the parser sits at a statement boundary: just
    /// past a `;`, or in front of a keyword that opens a statement.
    pub fn synchronize(&mut self) {
        self.advance();

        while !self.is_at_end() {
            if self.previous().token_type == TokenType::Semicolon {
                return;
            }

            if self.peek().token_type.starts_statement() {
                return;
            }

            self.advance();
        }
    }

    pub fn is_at_end(&self) -> bool {
        self.peek().token_type == TokenType::Eof
    }

    fn expression(&mut self) -> ParseResult<Node> {
        self.equality()
    }

    fn equality(&mut self) -> ParseResult<Node> {
        self.binary(&[TokenType::BangEqual, TokenType::EqualEqual], Self::comparison)
    }

    fn comparison(&mut self) -> ParseResult<Node> {
        self.binary(
            &[
                TokenType::Greater,
                TokenType::GreaterEqual,
                TokenType::Less,
                TokenType::LessEqual,
            ],
            Self::term,
        )
    }

    fn term(&mut self) -> ParseResult<Node> {
        self.binary(&[TokenType::Minus, TokenType::Plus], Self::factor)
    }

    fn factor(&mut self) -> ParseResult<Node> {
        self.binary(&[TokenType::Slash, TokenType::Star], Self::unary)
    }

    /// Folds `operand (operator operand)*` into a left-nested chain.
    fn binary(
        &mut self,
        operators: &[TokenType],
        operand: fn(&mut Self) -> ParseResult<Node>,
    ) -> ParseResult<Node> {
        let mut left = operand(self)?;

        while self.matches(operators) {
            let operator = self.previous();
            let right = operand(self)?;
            let height = left.height.max(right.height);
            left = Node::wrap(
                Expression::binary(left.expression, operator.clone(), right.expression),
                height,
                operator,
            )?;
        }

        Ok(left)
    }

    fn unary(&mut self) -> ParseResult<Node> {
        if self.matches(&[TokenType::Bang, TokenType::Minus]) {
            let operator = self.previous();
            let right = self.nested(Self::unary)?;
            return Node::wrap(
                Expression::unary(operator.clone(), right.expression),
                right.height,
                operator,
            );
        }

        self.primary()
    }

    fn primary(&mut self) -> ParseResult<Node> {
        if self.matches(&[TokenType::False]) {
            return Ok(Node::leaf(Literal::Boolean(false)));
        }

        if self.matches(&[TokenType::True]) {
            return Ok(Node::leaf(Literal::Boolean(true)));
        }

        if self.matches(&[TokenType::Nil]) {
            return Ok(Node::leaf(Literal::Nil));
        }

        if self.matches(&[TokenType::Number, TokenType::String]) {
            let token = self.previous();
            return match &token.literal {
                Some(literal) => Ok(Node::leaf(literal.clone())),
                None => Err(ParseError::new(token.clone(), ParseErrorKind::ExpectedExpression)),
            };
        }

        if self.matches(&[TokenType::LeftParen]) {
            let paren = self.previous();
            let inner = self.nested(Self::expression)?;
            self.consume(TokenType::RightParen, "Expect ')' after expression.")?;
            return Node::wrap(Expression::grouping(inner.expression), inner.height, paren);
        }

        Err(ParseError::new(self.peek().clone(), ParseErrorKind::ExpectedExpression))
    }

    /// Runs `rule` one level deeper, refusing to go past [`MAX_DEPTH`] so
    /// that deeply nested input cannot exhaust the stack.
    fn nested(&mut self, rule: fn(&mut Self) -> ParseResult<Node>) -> ParseResult<Node> {
        if self.depth >= MAX_DEPTH {
            return Err(ParseError::new(self.peek().clone(), ParseErrorKind::TooDeep));
        }

        self.depth += 1;
        let result = rule(self);
        self.depth -= 1;
        result
    }

    fn matches(&mut self, token_types: &[TokenType]) -> bool {
        for &token_type in token_types.iter() {
            if self.check(token_type) {
                self.advance();
                return true;
            }
        }

        false
    }

    fn check(&self, token_type: TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }

        self.peek().token_type == token_type
    }

    fn peek(&self) -> &'a Token {
        // Reading past the end of a stream that lacks its Eof sentinel
        // behaves as if the sentinel were there.
        self.tokens.get(self.current).unwrap_or(&EOF)
    }

    fn advance(&mut self) -> &'a Token {
        if !self.is_at_end() {
            self.current += 1;
        }

        self.previous()
    }

    fn previous(&self) -> &'a Token {
        let tokens: &'a [Token] = self.tokens;
        self.current
            .checked_sub(1)
            .and_then(|index| tokens.get(index))
            .unwrap_or_else(|| self.peek())
    }

    fn consume(&mut self, token_type: TokenType, message: &'static str) -> ParseResult<&'a Token> {
        if self.check(token_type) {
            return Ok(self.advance());
        }

        let kind = ParseErrorKind::ExpectedToken {
            expected: token_type,
            message,
        };
        Err(ParseError::new(self.peek().clone(), kind))
    }
}

/// A freshly parsed subtree and the number of levels it spans.
struct Node {
    expression: Expression,
    height: usize,
}

impl Node {
    fn leaf(literal: Literal) -> Self {
        Node {
            expression: Expression::literal(literal),
            height: 1,
        }
    }

    /// Puts `expression` one level above a child of height `child_height`,
    /// blaming `at` when that would exceed [`MAX_DEPTH`].
    fn wrap(expression: Expression, child_height: usize, at: &Token) -> ParseResult<Self> {
        let height = child_height + 1;
        if height > MAX_DEPTH {
            return Err(ParseError::new(at.clone(), ParseErrorKind::TooDeep));
        }

        Ok(Node { expression, height })
    }
}

static EOF: Token = Token {
    token_type: TokenType::Eof,
    lexeme: String::new(),
    literal: None,
    line: 1,
};

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    token: Token,
    kind: ParseErrorKind,
}

impl ParseError {
    pub fn new(token: Token, kind: ParseErrorKind) -> Self {
        ParseError { token, kind }
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn kind(&self) -> &ParseErrorKind {
        &self.kind
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("Expect expression.")]
    ExpectedExpression,
    #[error("{message}")]
    ExpectedToken {
        expected: TokenType,
        message: &'static str,
    },
    #[error("Expression nests too deeply.")]
    TooDeep,
}
