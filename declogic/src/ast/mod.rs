//! Abstract Syntax Tree for the analyzed Python-style source

mod expr;
mod span;

pub use expr::*;
pub use span::*;

use serde::{Deserialize, Serialize};

/// A parsed source file: a sequence of top-level statements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub items: Vec<Spanned<Stmt>>,
}

/// Indented statement block
pub type Block = Vec<Spanned<Stmt>>;

/// Statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    FunctionDef(FunctionDef),
    ClassDef(ClassDef),
    If(IfStmt),
    /// `return` with optional value
    Return(Option<Spanned<Expr>>),
    Pass,
    Break,
    Continue,
    /// Expression statement (calls, docstrings)
    Expr(Spanned<Expr>),
    /// `target = value` and augmented forms
    Assign {
        target: Spanned<Expr>,
        op: AssignOp,
        value: Spanned<Expr>,
    },
    For {
        targets: Vec<Spanned<String>>,
        iter: Spanned<Expr>,
        body: Block,
    },
    While {
        cond: Spanned<Expr>,
        body: Block,
    },
}

/// Function definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: Spanned<String>,
    pub params: Vec<Param>,
    pub returns: Option<Spanned<Expr>>,
    pub body: Block,
    pub span: Span,
}

/// Function parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: Spanned<String>,
    pub annotation: Option<Spanned<Expr>>,
    pub default: Option<Spanned<Expr>>,
}

/// Class definition; only its methods matter to the analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDef {
    pub name: Spanned<String>,
    pub bases: Vec<Spanned<Expr>>,
    pub body: Block,
}

/// `if` / `elif`* / `else`? chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfStmt {
    /// The `if` branch followed by every `elif`, in source order
    pub branches: Vec<IfBranch>,
    pub orelse: Option<Block>,
}

/// One guarded branch of an if chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfBranch {
    pub cond: Spanned<Expr>,
    pub body: Block,
}

/// Assignment operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
}

impl Module {
    /// Every function definition in the module, including methods of
    /// top-level classes, in source order.
    pub fn functions(&self) -> Vec<&FunctionDef> {
        fn collect<'a>(block: &'a [Spanned<Stmt>], out: &mut Vec<&'a FunctionDef>) {
            for stmt in block {
                match &stmt.node {
                    Stmt::FunctionDef(f) => out.push(f),
                    Stmt::ClassDef(c) => collect(&c.body, out),
                    _ => {}
                }
            }
        }

        let mut out = Vec::new();
        collect(&self.items, &mut out);
        out
    }
}
