use crate::{
    ast::{Expression, ExpressionVisitor},
    token::Token,
    types::Literal,
};

/// Renders an expression as a fully parenthesized prefix string, e.g.
/// `(* (- 123) (group 45.67))`.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print(&mut self, e: &Expression) -> String {
        e.accept(self)
    }

    fn parenthesize(&mut self, name: &str, exprs: &[&Expression]) -> String {
        let mut builder = format!("({}", name);
        for expr in exprs {
            builder.push(' ');
            builder.push_str(&expr.accept(self));
        }
        builder.push(')');
        builder
    }
}

impl ExpressionVisitor for AstPrinter {
    type Result = String;

    fn visit_binary_expr(
        &mut self,
        left: &Expression,
        operator: &Token,
        right: &Expression,
    ) -> Self::Result {
        self.parenthesize(&operator.lexeme, &[left, right])
    }

    fn visit_grouping_expr(&mut self, expr: &Expression) -> Self::Result {
        self.parenthesize("group", &[expr])
    }

    fn visit_literal_expr(&mut self, literal: &Literal) -> Self::Result {
        literal.to_string()
    }

    fn visit_unary_expr(&mut self, operator: &Token, expr: &Expression) -> Self::Result {
        self.parenthesize(&operator.lexeme, &[expr])
    }
}
