use crate::token::Token;
use crate::types::Literal;

/// An operation over expression trees, with one method per node variant.
///
/// Nodes carry no behaviour of their own; printing, evaluation and any
/// analysis pass live in implementations of this trait.
pub trait ExpressionVisitor {
    type Result;

    fn visit_binary_expr(
        &mut self,
        left: &Expression,
        operator: &Token,
        right: &Expression,
    ) -> Self::Result;

    fn visit_grouping_expr(&mut self, expr: &Expression) -> Self::Result;

    fn visit_literal_expr(&mut self, literal: &Literal) -> Self::Result;

    fn visit_unary_expr(&mut self, operator: &Token, expr: &Expression) -> Self::Result;
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Binary {
        left: Box<Expression>,
        operator: Token,
        right: Box<Expression>,
    },
    Grouping {
        expr: Box<Expression>,
    },
    Literal {
        literal: Literal,
    },
    Unary {
        operator: Token,
        expr: Box<Expression>,
    },
}

impl Expression {
    pub fn binary(left: Expression, operator: Token, right: Expression) -> Self {
        Expression::Binary {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        }
    }

    pub fn grouping(expr: Expression) -> Self {
        Expression::Grouping {
            expr: Box::new(expr),
        }
    }

    pub fn literal(literal: Literal) -> Self {
        Expression::Literal { literal }
    }

    pub fn unary(operator: Token, expr: Expression) -> Self {
        Expression::Unary {
            operator,
            expr: Box::new(expr),
        }
    }

    pub fn accept<V: ExpressionVisitor>(&self, visitor: &mut V) -> V::Result {
        match self {
            Self::Binary {
                left,
                operator,
                right,
            } => visitor.visit_binary_expr(left, operator, right),
            Self::Grouping { expr } => visitor.visit_grouping_expr(expr),
            Self::Literal { literal } => visitor.visit_literal_expr(literal),
            Self::Unary { operator, expr } => visitor.visit_unary_expr(operator, expr),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenType;

    /// Counts nodes and measures the deepest path, without caring what the
    /// operators are.
    struct Shape;

    impl ExpressionVisitor for Shape {
        type Result = (usize, usize);

        fn visit_binary_expr(
            &mut self,
            left: &Expression,
            _operator: &Token,
            right: &Expression,
        ) -> Self::Result {
            let (left_nodes, left_depth) = left.accept(self);
            let (right_nodes, right_depth) = right.accept(self);
            (left_nodes + right_nodes + 1, left_depth.max(right_depth) + 1)
        }

        fn visit_grouping_expr(&mut self, expr: &Expression) -> Self::Result {
            let (nodes, depth) = expr.accept(self);
            (nodes + 1, depth + 1)
        }

        fn visit_literal_expr(&mut self, _literal: &Literal) -> Self::Result {
            (1, 1)
        }

        fn visit_unary_expr(&mut self, _operator: &Token, expr: &Expression) -> Self::Result {
            let (nodes, depth) = expr.accept(self);
            (nodes + 1, depth + 1)
        }
    }

    #[test]
    fn test_accept_dispatches_to_each_variant() {
        let minus = Token::new(TokenType::Minus, "-".to_string(), None, 1);
        let star = Token::new(TokenType::Star, "*".to_string(), None, 1);
        let expression = Expression::binary(
            Expression::unary(minus, Expression::literal(Literal::Number(1.0))),
            star,
            Expression::grouping(Expression::literal(Literal::Nil)),
        );

        assert_eq!(expression.accept(&mut Shape), (5, 3));
    }
}
