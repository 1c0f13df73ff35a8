//! Expression AST nodes

use super::Spanned;
use serde::{Deserialize, Serialize};

/// Expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Name reference
    Name(String),
    /// Integer literal
    Int(i64),
    /// Float literal
    Float(f64),
    /// String literal (adjacent literals already concatenated)
    Str(String),
    /// f-string or bytes literal, as written
    PrefixedStr(String),
    /// `True` / `False`
    Bool(bool),
    /// `None`
    None,

    /// `a and b` / `a or b`
    BoolOp {
        op: BoolOp,
        left: Box<Spanned<Expr>>,
        right: Box<Spanned<Expr>>,
    },

    /// `not e`
    Not(Box<Spanned<Expr>>),

    /// Comparison chain: `a < b <= c`
    Compare {
        left: Box<Spanned<Expr>>,
        ops: Vec<(CmpOp, Spanned<Expr>)>,
    },

    /// Arithmetic
    Binary {
        left: Box<Spanned<Expr>>,
        op: BinOp,
        right: Box<Spanned<Expr>>,
    },

    /// Unary `-e` / `+e`
    Unary {
        op: UnaryOp,
        operand: Box<Spanned<Expr>>,
    },

    /// Call: `f(a, key=b)`
    Call {
        func: Box<Spanned<Expr>>,
        args: Vec<Argument>,
    },

    /// Attribute access: `a.b`
    Attribute {
        value: Box<Spanned<Expr>>,
        attr: String,
    },

    /// Subscript: `a[i]`
    Subscript {
        value: Box<Spanned<Expr>>,
        index: Box<Spanned<Expr>>,
    },

    /// `(a, b)`
    Tuple(Vec<Spanned<Expr>>),

    /// `[a, b]`
    List(Vec<Spanned<Expr>>),

    /// Conditional expression: `body if test else orelse`
    IfExp {
        body: Box<Spanned<Expr>>,
        test: Box<Spanned<Expr>>,
        orelse: Box<Spanned<Expr>>,
    },
}

/// Call argument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Argument {
    Positional(Spanned<Expr>),
    Keyword { name: String, value: Spanned<Expr> },
}

/// Short-circuit boolean operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoolOp {
    And,
    Or,
}

/// Comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CmpOp {
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    In,
    NotIn,
    Is,
    IsNot,
}

/// Arithmetic operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

/// Unary arithmetic operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Pos,
}

impl std::fmt::Display for CmpOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CmpOp::Lt => "<",
            CmpOp::Gt => ">",
            CmpOp::Le => "<=",
            CmpOp::Ge => ">=",
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
            CmpOp::In => "in",
            CmpOp::NotIn => "not in",
            CmpOp::Is => "is",
            CmpOp::IsNot => "is not",
        };
        f.write_str(s)
    }
}
