// Tests for the guard-injection pass

use pretty_assertions::assert_eq;

use super::*;
use crate::ast::{
    fix_missing_positions, Expr, ExprKind, Literal, Module, NameContext, Stmt, StmtKind,
};

fn guards() -> GuardInjection {
    GuardInjection::new()
        .register("json.loads", "json.JSONDecodeError", Literal::None)
        .register("requests.get", "requests.RequestException", Literal::None)
}

fn risky_assign() -> Stmt {
    Stmt::assign(
        Expr::name_store("user_data"),
        Expr::call(
            Expr::dotted("json.loads"),
            vec![Expr::name("raw_json")],
            vec![],
        ),
    )
}

/// Destructure the single handler of a Try statement.
fn try_parts(stmt: &Stmt) -> (&Vec<Stmt>, &crate::ast::ExceptHandler) {
    match &stmt.kind {
        StmtKind::Try {
            body,
            handlers,
            orelse,
            finalbody,
        } => {
            assert!(orelse.is_empty());
            assert!(finalbody.is_empty());
            assert_eq!(handlers.len(), 1);
            (body, &handlers[0])
        }
        other => panic!("unexpected kind: {other:?}"),
    }
}

#[test]
fn risky_assignment_is_wrapped_with_fallback_and_diagnostic() {
    let module = Module::new(vec![risky_assign()]);
    let module = guards().apply(module);

    assert_eq!(module.body.len(), 1);
    let (body, handler) = try_parts(&module.body[0]);

    // Guarded body is the original assignment.
    match &body[0].kind {
        StmtKind::Assign { targets, value } => {
            assert!(targets[0].is_name("user_data"));
            match &value.kind {
                ExprKind::Call { func, .. } => {
                    assert_eq!(func.dotted_path().as_deref(), Some("json.loads"));
                }
                other => panic!("unexpected kind: {other:?}"),
            }
        }
        other => panic!("unexpected kind: {other:?}"),
    }

    // Handler catches the configured exception as `e`.
    assert_eq!(
        handler.exception.as_ref().and_then(|e| e.dotted_path()).as_deref(),
        Some("json.JSONDecodeError")
    );
    assert_eq!(handler.name.as_deref(), Some("e"));

    // Diagnostic first, then the fallback re-assignment.
    assert_eq!(handler.body.len(), 2);
    match &handler.body[0].kind {
        StmtKind::Expr { value } => match &value.kind {
            ExprKind::Call { func, args, .. } => {
                assert!(func.is_name("print"));
                match &args[0].kind {
                    ExprKind::JoinedStr { values } => {
                        match &values[0].kind {
                            ExprKind::Constant { value } => assert_eq!(
                                value,
                                &Literal::Str("Error in json.loads: ".to_string())
                            ),
                            other => panic!("unexpected kind: {other:?}"),
                        }
                        match &values[1].kind {
                            ExprKind::FormattedValue { value } => assert!(value.is_name("e")),
                            other => panic!("unexpected kind: {other:?}"),
                        }
                    }
                    other => panic!("unexpected kind: {other:?}"),
                }
            }
            other => panic!("unexpected kind: {other:?}"),
        },
        other => panic!("unexpected kind: {other:?}"),
    }
    match &handler.body[1].kind {
        StmtKind::Assign { targets, value } => {
            assert!(targets[0].is_name("user_data"));
            assert!(matches!(
                &targets[0].kind,
                ExprKind::Name { ctx: NameContext::Store, .. }
            ));
            assert_eq!(
                value.kind,
                ExprKind::Constant { value: Literal::None }
            );
        }
        other => panic!("unexpected kind: {other:?}"),
    }
}

#[test]
fn risky_expression_statement_gets_diagnostic_only() {
    let module = Module::new(vec![Stmt::expr(Expr::call(
        Expr::dotted("requests.get"),
        vec![Expr::name("url")],
        vec![],
    ))]);
    let module = guards().apply(module);

    let (body, handler) = try_parts(&module.body[0]);
    assert!(matches!(body[0].kind, StmtKind::Expr { .. }));
    assert_eq!(handler.body.len(), 1);
    assert_eq!(
        handler.exception.as_ref().and_then(|e| e.dotted_path()).as_deref(),
        Some("requests.RequestException")
    );
}

#[test]
fn unregistered_calls_pass_through() {
    let module = Module::new(vec![Stmt::expr(Expr::call(
        Expr::dotted("response.raise_for_status"),
        vec![],
        vec![],
    ))]);

    let guarded = guards().apply(module.clone());

    let mut expected = module;
    fix_missing_positions(&mut expected);
    assert_eq!(guarded, expected);
}

#[test]
fn complex_assignment_targets_pass_through() {
    let tuple_target = Stmt::new(StmtKind::Assign {
        targets: vec![Expr::new(ExprKind::Tuple {
            elts: vec![Expr::name_store("a"), Expr::name_store("b")],
            ctx: NameContext::Store,
        })],
        value: Expr::call(Expr::dotted("json.loads"), vec![Expr::name("raw")], vec![]),
    });
    let attribute_target = Stmt::new(StmtKind::Assign {
        targets: vec![Expr::new(ExprKind::Attribute {
            value: Box::new(Expr::name("self")),
            attr: "data".to_string(),
            ctx: NameContext::Store,
        })],
        value: Expr::call(Expr::dotted("json.loads"), vec![Expr::name("raw")], vec![]),
    });
    let multi_target = Stmt::new(StmtKind::Assign {
        targets: vec![Expr::name_store("a"), Expr::name_store("b")],
        value: Expr::call(Expr::dotted("json.loads"), vec![Expr::name("raw")], vec![]),
    });
    let module = Module::new(vec![tuple_target, attribute_target, multi_target]);

    let guarded = guards().apply(module.clone());

    let mut expected = module;
    fix_missing_positions(&mut expected);
    assert_eq!(guarded, expected);
}

#[test]
fn guards_statements_inside_function_bodies() {
    let module = Module::new(vec![Stmt::new(StmtKind::FunctionDef {
        name: "parse_user_data".to_string(),
        params: vec!["raw_json".to_string()],
        body: vec![
            risky_assign(),
            Stmt::new(StmtKind::Return {
                value: Some(Expr::name("user_data")),
            }),
        ],
    })]);

    let module = guards().apply(module);

    match &module.body[0].kind {
        StmtKind::FunctionDef { body, .. } => {
            assert!(matches!(body[0].kind, StmtKind::Try { .. }));
            assert!(matches!(body[1].kind, StmtKind::Return { .. }));
        }
        other => panic!("unexpected kind: {other:?}"),
    }
}

#[test]
fn guarded_output_carries_positions() {
    let mut module = Module::new(vec![risky_assign()]);
    module.body[0].span = Some(crate::ast::Span::new(6, 4));

    let module = guards().apply(module);

    let (_, handler) = try_parts(&module.body[0]);
    assert_eq!(module.body[0].span, Some(crate::ast::Span::new(6, 4)));
    assert_eq!(handler.body[0].span, Some(crate::ast::Span::new(6, 4)));
}
