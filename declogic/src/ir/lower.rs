//! Lowering from syntax to IR conditions and literals

use crate::ast::{BoolOp, CmpOp, Expr, Spanned, UnaryOp};

use super::{BoolExpr, CompareOp, Literal, Value};

/// Lowering context; keeps the source so unsupported syntax can be carried
/// as its original text
pub(super) struct LowerCtx<'a> {
    source: &'a str,
}

impl<'a> LowerCtx<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source }
    }

    pub fn condition(&self, expr: &Spanned<Expr>) -> BoolExpr {
        match &expr.node {
            Expr::Bool(b) => BoolExpr::Literal(*b),
            Expr::Name(name) => BoolExpr::Var(name.clone()),
            Expr::BoolOp { op, left, right } => {
                let parts = [self.condition(left), self.condition(right)];
                match op {
                    BoolOp::And => BoolExpr::and(parts),
                    BoolOp::Or => BoolExpr::or(parts),
                }
            }
            Expr::Not(inner) => BoolExpr::not(self.condition(inner)),
            Expr::Compare { left, ops } => self
                .comparison_chain(left, ops)
                .unwrap_or_else(|| self.opaque(expr)),
            _ => self.opaque(expr),
        }
    }

    /// `a < b < c` lowers to `a < b and b < c`; any link that is not
    /// name-versus-constant makes the whole chain opaque
    fn comparison_chain(&self, left: &Spanned<Expr>, ops: &[(CmpOp, Spanned<Expr>)]) -> Option<BoolExpr> {
        let mut links = Vec::with_capacity(ops.len());
        let mut lhs = left;
        for (op, rhs) in ops {
            links.push(self.comparison(lhs, *op, rhs)?);
            lhs = rhs;
        }
        Some(BoolExpr::and(links))
    }

    fn comparison(&self, lhs: &Spanned<Expr>, op: CmpOp, rhs: &Spanned<Expr>) -> Option<BoolExpr> {
        let op = match op {
            CmpOp::Lt => CompareOp::Lt,
            CmpOp::Le => CompareOp::Le,
            CmpOp::Gt => CompareOp::Gt,
            CmpOp::Ge => CompareOp::Ge,
            CmpOp::Eq => CompareOp::Eq,
            CmpOp::Ne => CompareOp::Ne,
            // identity is only equality for the `None` singleton
            CmpOp::Is if is_none(lhs) || is_none(rhs) => CompareOp::Eq,
            CmpOp::IsNot if is_none(lhs) || is_none(rhs) => CompareOp::Ne,
            _ => return None,
        };
        match (&lhs.node, constant(rhs), constant(lhs), &rhs.node) {
            (Expr::Name(name), Some(value), _, _) => Some(BoolExpr::cmp(name.clone(), op, value)),
            (_, _, Some(value), Expr::Name(name)) => Some(BoolExpr::cmp(name.clone(), op.mirror(), value)),
            _ => None,
        }
    }

    /// Return literal; a bare `return` is `None`
    pub fn literal(&self, expr: Option<&Spanned<Expr>>) -> Literal {
        match expr {
            None => Literal::none(),
            Some(expr) => match constant(expr) {
                Some(value) => Literal::Value(value),
                None => Literal::Opaque(self.text(expr)),
            },
        }
    }

    fn opaque(&self, expr: &Spanned<Expr>) -> BoolExpr {
        BoolExpr::Opaque(self.text(expr))
    }

    fn text(&self, expr: &Spanned<Expr>) -> String {
        expr.span.slice(self.source).trim().to_string()
    }
}

/// Constant value of a literal expression, including negated integers
pub(super) fn constant(expr: &Spanned<Expr>) -> Option<Value> {
    match &expr.node {
        Expr::None => Some(Value::None),
        Expr::Bool(b) => Some(Value::Bool(*b)),
        Expr::Int(n) => Some(Value::Int(*n)),
        Expr::Str(s) => Some(Value::Str(s.clone())),
        Expr::Unary {
            op: UnaryOp::Neg,
            operand,
        } => match operand.node {
            Expr::Int(n) => n.checked_neg().map(Value::Int),
            _ => None,
        },
        Expr::Unary {
            op: UnaryOp::Pos,
            operand,
        } => match operand.node {
            Expr::Int(n) => Some(Value::Int(n)),
            _ => None,
        },
        _ => None,
    }
}

fn is_none(expr: &Spanned<Expr>) -> bool {
    matches!(expr.node, Expr::None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Stmt;
    use crate::parser::parse_source;

    /// Lower the condition of the first `if` in `def f(...)`
    fn lower_if(source: &str) -> BoolExpr {
        let module = parse_source(source).unwrap();
        let f = module.functions()[0];
        let Stmt::If(chain) = &f.body[0].node else {
            panic!("expected if statement");
        };
        LowerCtx::new(source).condition(&chain.branches[0].cond)
    }

    #[test]
    fn test_lower_supported_subset() {
        let cond = lower_if("def f(a, b, x):\n    if a and not b or x >= 3:\n        return 1\n");
        assert_eq!(
            cond,
            BoolExpr::or([
                BoolExpr::and([BoolExpr::var("a"), BoolExpr::not(BoolExpr::var("b"))]),
                BoolExpr::cmp("x", CompareOp::Ge, 3),
            ])
        );
    }

    #[test]
    fn test_lower_constant_on_left_is_mirrored() {
        let cond = lower_if("def f(x):\n    if 10 < x:\n        return 1\n");
        assert_eq!(cond, BoolExpr::cmp("x", CompareOp::Gt, 10));
    }

    #[test]
    fn test_lower_chain_and_negative_constant() {
        let cond = lower_if("def f(x):\n    if -5 <= x < 5:\n        return 1\n");
        assert_eq!(
            cond,
            BoolExpr::and([
                BoolExpr::cmp("x", CompareOp::Ge, -5),
                BoolExpr::cmp("x", CompareOp::Lt, 5),
            ])
        );
    }

    #[test]
    fn test_lower_is_none() {
        let cond = lower_if("def f(x):\n    if x is not None:\n        return 1\n");
        assert_eq!(cond, BoolExpr::cmp("x", CompareOp::Ne, Value::None));
    }

    #[test]
    fn test_lower_unsupported_keeps_source_text() {
        let cond = lower_if("def f(xs):\n    if len(xs) > 3 and xs[0] in (1, 2):\n        return 1\n");
        assert_eq!(
            cond,
            BoolExpr::and([
                BoolExpr::Opaque("len(xs) > 3".into()),
                BoolExpr::Opaque("xs[0] in (1, 2)".into()),
            ])
        );
        let cond = lower_if("def f(a, b):\n    if a < b:\n        return 1\n");
        assert_eq!(cond, BoolExpr::Opaque("a < b".into()));
    }

    #[test]
    fn test_lower_literals() {
        let source = "def f():\n    return -7\n";
        let module = parse_source(source).unwrap();
        let Stmt::Return(value) = &module.functions()[0].body[0].node else {
            panic!("expected return");
        };
        let ctx = LowerCtx::new(source);
        assert_eq!(ctx.literal(value.as_ref()), Literal::int(-7));
        assert_eq!(ctx.literal(None), Literal::none());
    }
}
