// Tests for the structural codec

use pretty_assertions::assert_eq;
use serde_json::json;

use super::*;
use crate::ast::fix_missing_positions;

/// A module exercising every node kind the codec knows.
fn rich_module() -> Module {
    let handler = ExceptHandler {
        exception: Some(Expr::dotted("json.JSONDecodeError")),
        name: Some("e".to_string()),
        body: vec![Stmt::expr(Expr::call(
            Expr::name("print"),
            vec![Expr::new(ExprKind::JoinedStr {
                values: vec![
                    Expr::string("failed: "),
                    Expr::new(ExprKind::FormattedValue {
                        value: Box::new(Expr::name("e")),
                    }),
                ],
            })],
            vec![],
        ))],
        span: None,
    };

    Module::new(vec![
        Stmt::new(StmtKind::FunctionDef {
            name: "process".to_string(),
            params: vec!["data".to_string(), "config".to_string()],
            body: vec![
                Stmt::assign(
                    Expr::name_store("total"),
                    Expr::binop(Expr::name("data"), BinaryOp::Mult, Expr::int(2)),
                ),
                Stmt::new(StmtKind::If {
                    test: Expr::name("config"),
                    body: vec![Stmt::new(StmtKind::Return {
                        value: Some(Expr::name("total")),
                    })],
                    orelse: vec![Stmt::new(StmtKind::Return { value: None })],
                }),
            ],
        }),
        Stmt::new(StmtKind::For {
            target: Expr::name_store("i"),
            iter: Expr::call(Expr::name("range"), vec![Expr::int(3)], vec![]),
            body: vec![
                Stmt::expr(Expr::call(
                    Expr::name("emit"),
                    vec![Expr::name("i")],
                    vec![Keyword::new(
                        "extra",
                        Expr::new(ExprKind::Dict {
                            keys: vec![Expr::string("tag")],
                            values: vec![Expr::constant(Literal::Bool(true))],
                        }),
                    )],
                )),
                Stmt::new(StmtKind::If {
                    test: Expr::constant(Literal::Bool(false)),
                    body: vec![Stmt::new(StmtKind::Break)],
                    orelse: vec![Stmt::new(StmtKind::Continue)],
                }),
            ],
            orelse: vec![Stmt::new(StmtKind::Pass)],
        }),
        Stmt::new(StmtKind::Try {
            body: vec![Stmt::assign(
                Expr::name_store("user"),
                Expr::call(
                    Expr::dotted("json.loads"),
                    vec![Expr::name("raw")],
                    vec![],
                ),
            )],
            handlers: vec![handler],
            orelse: vec![],
            finalbody: vec![Stmt::expr(Expr::constant(Literal::Float(0.5)))],
        }),
        Stmt::new(StmtKind::Assign {
            targets: vec![Expr::new(ExprKind::Tuple {
                elts: vec![Expr::name_store("a"), Expr::name_store("b")],
                ctx: NameContext::Store,
            })],
            value: Expr::new(ExprKind::List {
                elts: vec![Expr::constant(Literal::None), Expr::string("x")],
                ctx: NameContext::Load,
            }),
        }),
    ])
}

#[test]
fn round_trip_preserves_structure() {
    let mut module = rich_module();
    fix_missing_positions(&mut module);

    let encoded = encode(&module);
    let decoded = decode(&encoded).expect("round trip should decode");

    assert_eq!(decoded, module);
}

#[test]
fn round_trip_without_positions_preserves_structure() {
    // Positions are auxiliary: a tree that never had them still round-trips,
    // just without spans on the way back.
    let module = rich_module();

    let encoded = encode(&module);
    let decoded = decode(&encoded).expect("round trip should decode");

    assert_eq!(decoded, module);
}

#[test]
fn encode_emits_node_type_and_position_keys() {
    let mut module = Module::new(vec![Stmt::expr(Expr::int(7))]);
    fix_missing_positions(&mut module);

    let encoded = encode(&module);
    let stmt = &encoded["body"][0];

    assert_eq!(stmt["node_type"], json!("Expr"));
    assert_eq!(stmt["lineno"], json!(1));
    assert_eq!(stmt["col_offset"], json!(0));
    assert_eq!(stmt["value"]["node_type"], json!("Constant"));
    assert_eq!(stmt["value"]["value"], json!(7));
}

#[test]
fn decode_fails_on_missing_node_type() {
    let mapping = json!({ "body": [] });
    assert_eq!(decode(&mapping), Err(ReconstructionError::MissingNodeType));
}

#[test]
fn decode_fails_on_unknown_node_type() {
    let mapping = json!({
        "node_type": "Module",
        "body": [ { "node_type": "Teleport", "dest": "moon" } ]
    });
    assert_eq!(
        decode(&mapping),
        Err(ReconstructionError::UnknownNodeType("Teleport".to_string()))
    );
}

#[test]
fn decode_fails_on_expression_in_statement_position() {
    let mapping = json!({
        "node_type": "Module",
        "body": [ { "node_type": "Name", "id": "x", "ctx": { "node_type": "Load" } } ]
    });
    assert_eq!(
        decode(&mapping),
        Err(ReconstructionError::MisplacedKind {
            context: "statement",
            kind: "Name".to_string(),
        })
    );
}

#[test]
fn decode_fails_on_missing_required_field() {
    let mapping = json!({
        "node_type": "Module",
        "body": [ { "node_type": "Assign", "targets": [] } ]
    });
    assert_eq!(
        decode(&mapping),
        Err(ReconstructionError::MissingField {
            kind: "Assign",
            field: "value",
        })
    );
}

#[test]
fn decode_fails_on_unexpected_extra_field() {
    let mapping = json!({
        "node_type": "Module",
        "body": [ { "node_type": "Pass", "color": "red" } ]
    });
    assert_eq!(
        decode(&mapping),
        Err(ReconstructionError::UnexpectedField {
            kind: "Pass",
            field: "color".to_string(),
        })
    );
}

#[test]
fn decode_accepts_position_keys_without_requiring_them() {
    let with_positions = json!({
        "node_type": "Module",
        "body": [ { "node_type": "Pass", "lineno": 4, "col_offset": 2 } ]
    });
    let module = decode(&with_positions).expect("positions are allowed");
    assert_eq!(module.body[0].span, Some(Span::new(4, 2)));

    let without_positions = json!({
        "node_type": "Module",
        "body": [ { "node_type": "Pass" } ]
    });
    let module = decode(&without_positions).expect("positions are optional");
    assert_eq!(module.body[0].span, None);
}

#[test]
fn decode_fails_on_malformed_field_shape() {
    let mapping = json!({
        "node_type": "Module",
        "body": [ { "node_type": "FunctionDef", "name": "f", "params": "oops", "body": [] } ]
    });
    assert_eq!(
        decode(&mapping),
        Err(ReconstructionError::FieldShape {
            kind: "FunctionDef",
            field: "params",
            expected: "an array of strings",
        })
    );
}

#[test]
fn decode_fails_on_non_mapping_root() {
    assert_eq!(
        decode(&json!([1, 2, 3])),
        Err(ReconstructionError::ExpectedMapping("an array"))
    );
}

#[test]
fn literal_payloads_round_trip_through_scalars() {
    let literals = vec![
        Literal::Int(-3),
        Literal::Float(2.25),
        Literal::Str("hi".to_string()),
        Literal::Bool(false),
        Literal::None,
    ];
    let module = Module::new(
        literals
            .iter()
            .cloned()
            .map(|lit| Stmt::expr(Expr::constant(lit)))
            .collect(),
    );

    let decoded = decode(&encode(&module)).expect("scalars should round trip");
    assert_eq!(decoded, module);
}

#[test]
fn node_schema_covers_known_kinds_only() {
    assert_eq!(node_schema("For"), Some(&["target", "iter", "body", "orelse"][..]));
    assert_eq!(node_schema("Load"), Some(&[][..]));
    assert_eq!(node_schema("Teleport"), None);
}
