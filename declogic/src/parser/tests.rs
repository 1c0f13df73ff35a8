//! Parser tests for the accepted Python subset

use crate::ast::{Argument, BoolOp, CmpOp, Expr, Module, Stmt, UnaryOp};
use crate::parser::parse_source;

/// Helper to parse and expect success
fn parse_ok(source: &str) -> Module {
    parse_source(source).expect("Parse should succeed")
}

/// Helper to check if parsing fails
fn parse_fails(source: &str) -> bool {
    parse_source(source).is_err()
}

/// Body of the first function in the module
fn first_body(module: &Module) -> &[crate::ast::Spanned<Stmt>] {
    &module.functions()[0].body
}

/// Expression returned by the `index`-th statement of the first function
fn returned_expr(module: &Module, index: usize) -> &Expr {
    match &first_body(module)[index].node {
        Stmt::Return(Some(e)) => &e.node,
        other => panic!("expected return with value, got {:?}", other),
    }
}

// ============================================
// Function definitions
// ============================================

#[test]
fn test_parse_simple_function() {
    let module = parse_ok("def answer():\n    return 42\n");
    let funcs = module.functions();
    assert_eq!(funcs.len(), 1);
    assert_eq!(funcs[0].name.node, "answer");
    assert!(funcs[0].params.is_empty());
    assert_eq!(returned_expr(&module, 0), &Expr::Int(42));
}

#[test]
fn test_parse_parameters_with_annotations_and_defaults() {
    let module = parse_ok("def f(cpu: int, is_question: bool = False, mode=\"a\") -> int:\n    return 0\n");
    let f = module.functions()[0];
    let names: Vec<_> = f.params.iter().map(|p| p.name.node.as_str()).collect();
    assert_eq!(names, vec!["cpu", "is_question", "mode"]);
    assert_eq!(f.params[0].annotation.as_ref().map(|a| &a.node), Some(&Expr::Name("int".to_string())));
    assert_eq!(f.params[1].default.as_ref().map(|d| &d.node), Some(&Expr::Bool(false)));
    assert_eq!(f.params[2].default.as_ref().map(|d| &d.node), Some(&Expr::Str("a".to_string())));
    assert!(f.returns.is_some());
}

#[test]
fn test_parse_trailing_comma_in_parameters() {
    let module = parse_ok("def f(\n    a,\n    b,\n):\n    return a\n");
    assert_eq!(module.functions()[0].params.len(), 2);
}

#[test]
fn test_parse_decorated_function_and_methods() {
    let source = "\
class Router:
    @staticmethod
    def route(self, is_admin):
        return 1

    def other(self):
        pass
";
    let module = parse_ok(source);
    let names: Vec<_> = module.functions().iter().map(|f| f.name.node.clone()).collect();
    assert_eq!(names, vec!["route", "other"]);
}

#[test]
fn test_parse_docstring_is_expression_statement() {
    let module = parse_ok("def f():\n    \"\"\"Docs.\"\"\"\n    return 1\n");
    assert!(matches!(&first_body(&module)[0].node, Stmt::Expr(e) if e.node == Expr::Str("Docs.".to_string())));
}

// ============================================
// Conditionals
// ============================================

#[test]
fn test_parse_if_elif_else_chain() {
    let source = "\
def f(x):
    if x > 10:
        return 2
    elif x > 5:
        return 1
    else:
        return 0
";
    let module = parse_ok(source);
    match &first_body(&module)[0].node {
        Stmt::If(chain) => {
            assert_eq!(chain.branches.len(), 2);
            assert!(chain.orelse.is_some());
        }
        other => panic!("expected if, got {:?}", other),
    }
}

#[test]
fn test_parse_one_line_suite() {
    let module = parse_ok("def f(x):\n    if x: return 1\n    return 0\n");
    match &first_body(&module)[0].node {
        Stmt::If(chain) => assert_eq!(chain.branches[0].body.len(), 1),
        other => panic!("expected if, got {:?}", other),
    }
}

#[test]
fn test_parse_nested_if() {
    let source = "\
def f(a, b):
    if a:
        if b:
            return 1
        return 2
    return 3
";
    let module = parse_ok(source);
    let Stmt::If(outer) = &first_body(&module)[0].node else {
        panic!("expected if");
    };
    assert_eq!(outer.branches[0].body.len(), 2);
    assert!(matches!(outer.branches[0].body[0].node, Stmt::If(_)));
}

// ============================================
// Expressions
// ============================================

#[test]
fn test_parse_boolean_precedence() {
    // `not` binds tighter than `and`, which binds tighter than `or`
    let module = parse_ok("def f(a, b, c):\n    return not a and b or c\n");
    let Expr::BoolOp { op: BoolOp::Or, left, .. } = returned_expr(&module, 0) else {
        panic!("expected or at the root");
    };
    let Expr::BoolOp { op: BoolOp::And, left: inner, .. } = &left.node else {
        panic!("expected and under or");
    };
    assert!(matches!(inner.node, Expr::Not(_)));
}

#[test]
fn test_parse_chained_comparison() {
    let module = parse_ok("def f(x):\n    return 0 < x <= 10\n");
    let Expr::Compare { left, ops } = returned_expr(&module, 0) else {
        panic!("expected comparison");
    };
    assert_eq!(left.node, Expr::Int(0));
    let kinds: Vec<_> = ops.iter().map(|(op, _)| *op).collect();
    assert_eq!(kinds, vec![CmpOp::Lt, CmpOp::Le]);
}

#[test]
fn test_parse_negated_membership_and_identity() {
    let module = parse_ok("def f(x, y):\n    return x not in y\n    return x is not None\n");
    let Expr::Compare { ops, .. } = returned_expr(&module, 0) else {
        panic!("expected comparison");
    };
    assert_eq!(ops[0].0, CmpOp::NotIn);
    let Expr::Compare { ops, .. } = returned_expr(&module, 1) else {
        panic!("expected comparison");
    };
    assert_eq!(ops[0].0, CmpOp::IsNot);
    assert_eq!(ops[0].1.node, Expr::None);
}

#[test]
fn test_parse_negative_literal() {
    let module = parse_ok("def f():\n    return -1\n");
    assert!(matches!(
        returned_expr(&module, 0),
        Expr::Unary { op: UnaryOp::Neg, operand } if operand.node == Expr::Int(1)
    ));
}

#[test]
fn test_parse_calls_attributes_and_subscripts() {
    let module = parse_ok("def f(req):\n    return req.headers[\"x\"].get(key=1)\n");
    let Expr::Call { func, args } = returned_expr(&module, 0) else {
        panic!("expected call");
    };
    assert!(matches!(&func.node, Expr::Attribute { attr, .. } if attr == "get"));
    assert!(matches!(&args[0], Argument::Keyword { name, .. } if name == "key"));
}

#[test]
fn test_parse_conditional_expression() {
    let module = parse_ok("def f(a):\n    return 1 if a else 2\n");
    assert!(matches!(returned_expr(&module, 0), Expr::IfExp { .. }));
}

#[test]
fn test_parse_tuples_lists_and_parentheses() {
    let module = parse_ok("def f(a):\n    return (a, 1)\n    return [1, 2,]\n    return (a)\n");
    assert!(matches!(returned_expr(&module, 0), Expr::Tuple(items) if items.len() == 2));
    assert!(matches!(returned_expr(&module, 1), Expr::List(items) if items.len() == 2));
    assert_eq!(returned_expr(&module, 2), &Expr::Name("a".to_string()));
}

#[test]
fn test_parse_expression_spans_cover_source_text() {
    let source = "def f(cpu):\n    if cpu < 95:\n        return 1\n";
    let module = parse_ok(source);
    let Stmt::If(chain) = &first_body(&module)[0].node else {
        panic!("expected if");
    };
    assert_eq!(chain.branches[0].cond.span.slice(source), "cpu < 95");
}

// ============================================
// Other statements
// ============================================

#[test]
fn test_parse_assignments_and_loops() {
    let source = "\
def f(items):
    total = 0
    total += 1
    for i, item in items:
        pass
    while total < 3:
        break
    return total
";
    let module = parse_ok(source);
    let body = first_body(&module);
    assert!(matches!(body[0].node, Stmt::Assign { .. }));
    assert!(matches!(body[2].node, Stmt::For { ref targets, .. } if targets.len() == 2));
    assert!(matches!(body[3].node, Stmt::While { .. }));
}

#[test]
fn test_parse_bare_return() {
    let module = parse_ok("def f():\n    return\n");
    assert!(matches!(first_body(&module)[0].node, Stmt::Return(None)));
}

// ============================================
// Errors
// ============================================

#[test]
fn test_parse_missing_colon_fails() {
    assert!(parse_fails("def f(x)\n    return x\n"));
}

#[test]
fn test_parse_missing_body_fails() {
    assert!(parse_fails("def f(x):\n"));
}

#[test]
fn test_parse_unbalanced_parenthesis_fails() {
    assert!(parse_fails("def f(x):\n    return (x\n"));
}

#[test]
fn test_parse_error_reports_span() {
    let err = parse_source("def f(x):\n    return x +\n").unwrap_err();
    let span = err.span().expect("parse errors carry a span");
    assert!(span.start >= "def f(x):\n    return x".len());
}
