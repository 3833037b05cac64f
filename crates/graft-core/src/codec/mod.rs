// Structural codec: bidirectional mapping between the typed program tree
// and a generic string-keyed mapping (serde_json::Value), used to move
// trees across a serialization boundary without losing the ability to
// reconstruct the exact typed tree.
//
// Every node encodes to an object whose reserved "node_type" key holds the
// kind tag, plus one entry per field in declaration order. Positions ride
// along as the reserved auxiliary keys "lineno" and "col_offset"; they are
// reattached on decode when present but never required.
//
// Decode is strict: a missing required field or any key beyond the schema
// and the reserved set is a ReconstructionError. Lenient matching would
// silently drop information, so the field schema is the single source of
// truth for what a mapping may contain.

pub mod edits;

#[cfg(test)]
mod codec_tests;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::ast::{
    BinaryOp, ExceptHandler, Expr, ExprKind, Keyword, Literal, Module, NameContext, Span, Stmt,
    StmtKind,
};

/// Reserved keys consumed by the codec itself, allowed on every node.
const RESERVED_KEYS: [&str; 3] = ["node_type", "lineno", "col_offset"];

/// Statement kind tags, used to intern incoming tags for error reporting.
const STMT_KINDS: [&str; 10] = [
    "FunctionDef",
    "Assign",
    "Return",
    "Expr",
    "For",
    "If",
    "Try",
    "Pass",
    "Break",
    "Continue",
];

/// Expression kind tags.
const EXPR_KINDS: [&str; 10] = [
    "Name",
    "Constant",
    "Call",
    "Attribute",
    "BinOp",
    "Dict",
    "List",
    "Tuple",
    "JoinedStr",
    "FormattedValue",
];

/// Error raised when a generic mapping cannot be reconstructed into a tree.
#[derive(Debug, Error, PartialEq)]
pub enum ReconstructionError {
    #[error("mapping has no node_type key")]
    MissingNodeType,

    #[error("unknown node_type '{0}'")]
    UnknownNodeType(String),

    #[error("node_type '{kind}' cannot appear in {context} position")]
    MisplacedKind { context: &'static str, kind: String },

    #[error("{kind} node is missing required field '{field}'")]
    MissingField { kind: &'static str, field: &'static str },

    #[error("{kind} node has unexpected field '{field}'")]
    UnexpectedField { kind: &'static str, field: String },

    #[error("{kind} field '{field}' has the wrong shape, expected {expected}")]
    FieldShape {
        kind: &'static str,
        field: &'static str,
        expected: &'static str,
    },

    #[error("expected a node mapping, found {0}")]
    ExpectedMapping(&'static str),
}

/// Required field names per kind tag, in declaration order.
///
/// This is the schema decode validates against; `None` means the tag is not
/// part of the node vocabulary at all.
pub fn node_schema(kind: &str) -> Option<&'static [&'static str]> {
    let fields: &'static [&'static str] = match kind {
        "Module" => &["body"],
        "FunctionDef" => &["name", "params", "body"],
        "Assign" => &["targets", "value"],
        "Return" => &["value"],
        "Expr" => &["value"],
        "For" => &["target", "iter", "body", "orelse"],
        "If" => &["test", "body", "orelse"],
        "Try" => &["body", "handlers", "orelse", "finalbody"],
        "Pass" | "Break" | "Continue" => &[],
        "ExceptHandler" => &["exception", "name", "body"],
        "Name" => &["id", "ctx"],
        "Constant" => &["value"],
        "Call" => &["func", "args", "keywords"],
        "Attribute" => &["value", "attr", "ctx"],
        "BinOp" => &["left", "op", "right"],
        "Dict" => &["keys", "values"],
        "List" | "Tuple" => &["elts", "ctx"],
        "JoinedStr" => &["values"],
        "FormattedValue" => &["value"],
        "Keyword" => &["arg", "value"],
        "Load" | "Store" => &[],
        "Add" | "Sub" | "Mult" | "Div" | "Mod" => &[],
        _ => return None,
    };
    Some(fields)
}

// ============================================================================
// Encode
// ============================================================================

/// Encode a tree into its generic mapping form. Total over well-formed trees.
pub fn encode(module: &Module) -> Value {
    let mut map = node_map("Module", None);
    map.insert(
        "body".to_string(),
        Value::Array(module.body.iter().map(encode_stmt).collect()),
    );
    Value::Object(map)
}

fn node_map(kind: &str, span: Option<Span>) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("node_type".to_string(), Value::String(kind.to_string()));
    if let Some(span) = span {
        map.insert("lineno".to_string(), Value::from(span.line));
        map.insert("col_offset".to_string(), Value::from(span.column));
    }
    map
}

fn encode_stmt(stmt: &Stmt) -> Value {
    let (kind, fields): (&str, Vec<(&str, Value)>) = match &stmt.kind {
        StmtKind::FunctionDef { name, params, body } => (
            "FunctionDef",
            vec![
                ("name", Value::String(name.clone())),
                (
                    "params",
                    Value::Array(params.iter().map(|p| Value::String(p.clone())).collect()),
                ),
                ("body", encode_block(body)),
            ],
        ),
        StmtKind::Assign { targets, value } => (
            "Assign",
            vec![
                (
                    "targets",
                    Value::Array(targets.iter().map(encode_expr).collect()),
                ),
                ("value", encode_expr(value)),
            ],
        ),
        StmtKind::Return { value } => (
            "Return",
            vec![(
                "value",
                value.as_ref().map(encode_expr).unwrap_or(Value::Null),
            )],
        ),
        StmtKind::Expr { value } => ("Expr", vec![("value", encode_expr(value))]),
        StmtKind::For {
            target,
            iter,
            body,
            orelse,
        } => (
            "For",
            vec![
                ("target", encode_expr(target)),
                ("iter", encode_expr(iter)),
                ("body", encode_block(body)),
                ("orelse", encode_block(orelse)),
            ],
        ),
        StmtKind::If { test, body, orelse } => (
            "If",
            vec![
                ("test", encode_expr(test)),
                ("body", encode_block(body)),
                ("orelse", encode_block(orelse)),
            ],
        ),
        StmtKind::Try {
            body,
            handlers,
            orelse,
            finalbody,
        } => (
            "Try",
            vec![
                ("body", encode_block(body)),
                (
                    "handlers",
                    Value::Array(handlers.iter().map(encode_handler).collect()),
                ),
                ("orelse", encode_block(orelse)),
                ("finalbody", encode_block(finalbody)),
            ],
        ),
        StmtKind::Pass => ("Pass", vec![]),
        StmtKind::Break => ("Break", vec![]),
        StmtKind::Continue => ("Continue", vec![]),
    };

    let mut map = node_map(kind, stmt.span);
    for (field, value) in fields {
        map.insert(field.to_string(), value);
    }
    Value::Object(map)
}

fn encode_block(block: &[Stmt]) -> Value {
    Value::Array(block.iter().map(encode_stmt).collect())
}

fn encode_handler(handler: &ExceptHandler) -> Value {
    let mut map = node_map("ExceptHandler", handler.span);
    map.insert(
        "exception".to_string(),
        handler
            .exception
            .as_ref()
            .map(encode_expr)
            .unwrap_or(Value::Null),
    );
    map.insert(
        "name".to_string(),
        handler
            .name
            .as_ref()
            .map(|n| Value::String(n.clone()))
            .unwrap_or(Value::Null),
    );
    map.insert("body".to_string(), encode_block(&handler.body));
    Value::Object(map)
}

fn encode_expr(expr: &Expr) -> Value {
    let (kind, fields): (&str, Vec<(&str, Value)>) = match &expr.kind {
        ExprKind::Name { id, ctx } => (
            "Name",
            vec![
                ("id", Value::String(id.clone())),
                ("ctx", encode_ctx(*ctx)),
            ],
        ),
        ExprKind::Constant { value } => ("Constant", vec![("value", encode_literal(value))]),
        ExprKind::Call {
            func,
            args,
            keywords,
        } => (
            "Call",
            vec![
                ("func", encode_expr(func)),
                ("args", Value::Array(args.iter().map(encode_expr).collect())),
                (
                    "keywords",
                    Value::Array(keywords.iter().map(encode_keyword).collect()),
                ),
            ],
        ),
        ExprKind::Attribute { value, attr, ctx } => (
            "Attribute",
            vec![
                ("value", encode_expr(value)),
                ("attr", Value::String(attr.clone())),
                ("ctx", encode_ctx(*ctx)),
            ],
        ),
        ExprKind::BinOp { left, op, right } => (
            "BinOp",
            vec![
                ("left", encode_expr(left)),
                ("op", encode_op(*op)),
                ("right", encode_expr(right)),
            ],
        ),
        ExprKind::Dict { keys, values } => (
            "Dict",
            vec![
                ("keys", Value::Array(keys.iter().map(encode_expr).collect())),
                (
                    "values",
                    Value::Array(values.iter().map(encode_expr).collect()),
                ),
            ],
        ),
        ExprKind::List { elts, ctx } => (
            "List",
            vec![
                ("elts", Value::Array(elts.iter().map(encode_expr).collect())),
                ("ctx", encode_ctx(*ctx)),
            ],
        ),
        ExprKind::Tuple { elts, ctx } => (
            "Tuple",
            vec![
                ("elts", Value::Array(elts.iter().map(encode_expr).collect())),
                ("ctx", encode_ctx(*ctx)),
            ],
        ),
        ExprKind::JoinedStr { values } => (
            "JoinedStr",
            vec![(
                "values",
                Value::Array(values.iter().map(encode_expr).collect()),
            )],
        ),
        ExprKind::FormattedValue { value } => {
            ("FormattedValue", vec![("value", encode_expr(value))])
        }
    };

    let mut map = node_map(kind, expr.span);
    for (field, value) in fields {
        map.insert(field.to_string(), value);
    }
    Value::Object(map)
}

fn encode_keyword(keyword: &Keyword) -> Value {
    let mut map = node_map("Keyword", None);
    map.insert(
        "arg".to_string(),
        keyword
            .arg
            .as_ref()
            .map(|a| Value::String(a.clone()))
            .unwrap_or(Value::Null),
    );
    map.insert("value".to_string(), encode_expr(&keyword.value));
    Value::Object(map)
}

fn encode_ctx(ctx: NameContext) -> Value {
    let kind = match ctx {
        NameContext::Load => "Load",
        NameContext::Store => "Store",
    };
    Value::Object(node_map(kind, None))
}

fn encode_op(op: BinaryOp) -> Value {
    let kind = match op {
        BinaryOp::Add => "Add",
        BinaryOp::Sub => "Sub",
        BinaryOp::Mult => "Mult",
        BinaryOp::Div => "Div",
        BinaryOp::Mod => "Mod",
    };
    Value::Object(node_map(kind, None))
}

fn encode_literal(literal: &Literal) -> Value {
    match literal {
        Literal::Int(n) => Value::from(*n),
        Literal::Float(f) => Value::from(*f),
        Literal::Str(s) => Value::String(s.clone()),
        Literal::Bool(b) => Value::Bool(*b),
        Literal::None => Value::Null,
    }
}

// ============================================================================
// Decode
// ============================================================================

/// Reconstruct a tree from its generic mapping form.
pub fn decode(value: &Value) -> Result<Module, ReconstructionError> {
    let mut fields = NodeFields::open(value, "Module", "module")?;
    let module = Module {
        body: decode_block(fields.take("body")?, "Module", "body")?,
    };
    fields.finish()?;
    Ok(module)
}

/// Tracks which keys of a node mapping have been consumed, so that
/// `finish()` can enforce the strict no-extra-fields policy.
struct NodeFields<'a> {
    kind: &'static str,
    map: &'a Map<String, Value>,
    taken: Vec<&'static str>,
}

impl<'a> NodeFields<'a> {
    /// Open a node mapping, checking that its tag is `expected`.
    fn open(
        value: &'a Value,
        expected: &'static str,
        context: &'static str,
    ) -> Result<Self, ReconstructionError> {
        let (tag, map) = read_tag(value)?;
        if tag != expected {
            return Err(misplaced(context, tag));
        }
        Ok(NodeFields::new(expected, map))
    }

    fn new(kind: &'static str, map: &'a Map<String, Value>) -> Self {
        NodeFields {
            kind,
            map,
            taken: Vec::new(),
        }
    }

    fn take(&mut self, field: &'static str) -> Result<&'a Value, ReconstructionError> {
        self.taken.push(field);
        self.map.get(field).ok_or(ReconstructionError::MissingField {
            kind: self.kind,
            field,
        })
    }

    /// Position metadata, reattached when the auxiliary keys are present.
    fn span(&self) -> Option<Span> {
        let line = self.map.get("lineno").and_then(Value::as_u64)?;
        let column = self
            .map
            .get("col_offset")
            .and_then(Value::as_u64)
            .unwrap_or(0);
        Some(Span::new(line as u32, column as u32))
    }

    /// Strict-field policy: every key must be reserved or consumed.
    fn finish(self) -> Result<(), ReconstructionError> {
        for key in self.map.keys() {
            if RESERVED_KEYS.contains(&key.as_str()) {
                continue;
            }
            if !self.taken.contains(&key.as_str()) {
                return Err(ReconstructionError::UnexpectedField {
                    kind: self.kind,
                    field: key.clone(),
                });
            }
        }
        Ok(())
    }
}

fn read_tag(value: &Value) -> Result<(&str, &Map<String, Value>), ReconstructionError> {
    let map = value
        .as_object()
        .ok_or_else(|| ReconstructionError::ExpectedMapping(json_type_name(value)))?;
    let tag = map
        .get("node_type")
        .ok_or(ReconstructionError::MissingNodeType)?
        .as_str()
        .ok_or(ReconstructionError::MissingNodeType)?;
    Ok((tag, map))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Classify a tag that is valid somewhere but not in this position.
fn misplaced(context: &'static str, tag: &str) -> ReconstructionError {
    if node_schema(tag).is_some() {
        ReconstructionError::MisplacedKind {
            context,
            kind: tag.to_string(),
        }
    } else {
        ReconstructionError::UnknownNodeType(tag.to_string())
    }
}

fn decode_block(
    value: &Value,
    kind: &'static str,
    field: &'static str,
) -> Result<Vec<Stmt>, ReconstructionError> {
    value
        .as_array()
        .ok_or(ReconstructionError::FieldShape {
            kind,
            field,
            expected: "an array of statements",
        })?
        .iter()
        .map(decode_stmt)
        .collect()
}

fn decode_expr_list(
    value: &Value,
    kind: &'static str,
    field: &'static str,
) -> Result<Vec<Expr>, ReconstructionError> {
    value
        .as_array()
        .ok_or(ReconstructionError::FieldShape {
            kind,
            field,
            expected: "an array of expressions",
        })?
        .iter()
        .map(decode_expr)
        .collect()
}

fn decode_string(
    value: &Value,
    kind: &'static str,
    field: &'static str,
) -> Result<String, ReconstructionError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or(ReconstructionError::FieldShape {
            kind,
            field,
            expected: "a string",
        })
}

/// Per-kind statement constructor table.
pub fn decode_stmt(value: &Value) -> Result<Stmt, ReconstructionError> {
    let (tag, map) = read_tag(value)?;
    let Some(kind_tag) = STMT_KINDS.iter().copied().find(|k| *k == tag) else {
        return Err(misplaced("statement", tag));
    };
    let mut fields = NodeFields::new(kind_tag, map);
    let span = fields.span();

    let kind = match kind_tag {
        "FunctionDef" => {
            let params = fields
                .take("params")?
                .as_array()
                .ok_or(ReconstructionError::FieldShape {
                    kind: "FunctionDef",
                    field: "params",
                    expected: "an array of strings",
                })?
                .iter()
                .map(|p| decode_string(p, "FunctionDef", "params"))
                .collect::<Result<Vec<_>, _>>()?;
            StmtKind::FunctionDef {
                name: decode_string(fields.take("name")?, "FunctionDef", "name")?,
                params,
                body: decode_block(fields.take("body")?, "FunctionDef", "body")?,
            }
        }
        "Assign" => StmtKind::Assign {
            targets: decode_expr_list(fields.take("targets")?, "Assign", "targets")?,
            value: decode_expr(fields.take("value")?)?,
        },
        "Return" => StmtKind::Return {
            value: match fields.take("value")? {
                Value::Null => None,
                value => Some(decode_expr(value)?),
            },
        },
        "Expr" => StmtKind::Expr {
            value: decode_expr(fields.take("value")?)?,
        },
        "For" => StmtKind::For {
            target: decode_expr(fields.take("target")?)?,
            iter: decode_expr(fields.take("iter")?)?,
            body: decode_block(fields.take("body")?, "For", "body")?,
            orelse: decode_block(fields.take("orelse")?, "For", "orelse")?,
        },
        "If" => StmtKind::If {
            test: decode_expr(fields.take("test")?)?,
            body: decode_block(fields.take("body")?, "If", "body")?,
            orelse: decode_block(fields.take("orelse")?, "If", "orelse")?,
        },
        "Try" => {
            let handlers = fields
                .take("handlers")?
                .as_array()
                .ok_or(ReconstructionError::FieldShape {
                    kind: "Try",
                    field: "handlers",
                    expected: "an array of handlers",
                })?
                .iter()
                .map(decode_handler)
                .collect::<Result<Vec<_>, _>>()?;
            StmtKind::Try {
                body: decode_block(fields.take("body")?, "Try", "body")?,
                handlers,
                orelse: decode_block(fields.take("orelse")?, "Try", "orelse")?,
                finalbody: decode_block(fields.take("finalbody")?, "Try", "finalbody")?,
            }
        }
        "Pass" => StmtKind::Pass,
        "Break" => StmtKind::Break,
        _ => StmtKind::Continue,
    };

    fields.finish()?;
    Ok(Stmt { kind, span })
}

fn decode_handler(value: &Value) -> Result<ExceptHandler, ReconstructionError> {
    let mut fields = NodeFields::open(value, "ExceptHandler", "handler")?;
    let span = fields.span();
    let handler = ExceptHandler {
        exception: match fields.take("exception")? {
            Value::Null => None,
            value => Some(decode_expr(value)?),
        },
        name: match fields.take("name")? {
            Value::Null => None,
            value => Some(decode_string(value, "ExceptHandler", "name")?),
        },
        body: decode_block(fields.take("body")?, "ExceptHandler", "body")?,
        span,
    };
    fields.finish()?;
    Ok(handler)
}

/// Per-kind expression constructor table.
pub fn decode_expr(value: &Value) -> Result<Expr, ReconstructionError> {
    let (tag, map) = read_tag(value)?;
    let Some(kind_tag) = EXPR_KINDS.iter().copied().find(|k| *k == tag) else {
        return Err(misplaced("expression", tag));
    };
    let mut fields = NodeFields::new(kind_tag, map);
    let span = fields.span();

    let kind = match kind_tag {
        "Name" => ExprKind::Name {
            id: decode_string(fields.take("id")?, "Name", "id")?,
            ctx: decode_ctx(fields.take("ctx")?)?,
        },
        "Constant" => ExprKind::Constant {
            value: decode_literal(fields.take("value")?)?,
        },
        "Call" => {
            let keywords = fields
                .take("keywords")?
                .as_array()
                .ok_or(ReconstructionError::FieldShape {
                    kind: "Call",
                    field: "keywords",
                    expected: "an array of keywords",
                })?
                .iter()
                .map(decode_keyword)
                .collect::<Result<Vec<_>, _>>()?;
            ExprKind::Call {
                func: Box::new(decode_expr(fields.take("func")?)?),
                args: decode_expr_list(fields.take("args")?, "Call", "args")?,
                keywords,
            }
        }
        "Attribute" => ExprKind::Attribute {
            value: Box::new(decode_expr(fields.take("value")?)?),
            attr: decode_string(fields.take("attr")?, "Attribute", "attr")?,
            ctx: decode_ctx(fields.take("ctx")?)?,
        },
        "BinOp" => ExprKind::BinOp {
            left: Box::new(decode_expr(fields.take("left")?)?),
            op: decode_op(fields.take("op")?)?,
            right: Box::new(decode_expr(fields.take("right")?)?),
        },
        "Dict" => ExprKind::Dict {
            keys: decode_expr_list(fields.take("keys")?, "Dict", "keys")?,
            values: decode_expr_list(fields.take("values")?, "Dict", "values")?,
        },
        "List" => ExprKind::List {
            elts: decode_expr_list(fields.take("elts")?, "List", "elts")?,
            ctx: decode_ctx(fields.take("ctx")?)?,
        },
        "Tuple" => ExprKind::Tuple {
            elts: decode_expr_list(fields.take("elts")?, "Tuple", "elts")?,
            ctx: decode_ctx(fields.take("ctx")?)?,
        },
        "JoinedStr" => ExprKind::JoinedStr {
            values: decode_expr_list(fields.take("values")?, "JoinedStr", "values")?,
        },
        _ => ExprKind::FormattedValue {
            value: Box::new(decode_expr(fields.take("value")?)?),
        },
    };

    fields.finish()?;
    Ok(Expr { kind, span })
}

fn decode_keyword(value: &Value) -> Result<Keyword, ReconstructionError> {
    let mut fields = NodeFields::open(value, "Keyword", "keyword")?;
    let keyword = Keyword {
        arg: match fields.take("arg")? {
            Value::Null => None,
            value => Some(decode_string(value, "Keyword", "arg")?),
        },
        value: decode_expr(fields.take("value")?)?,
    };
    fields.finish()?;
    Ok(keyword)
}

fn decode_ctx(value: &Value) -> Result<NameContext, ReconstructionError> {
    let (tag, _) = read_tag(value)?;
    match tag {
        "Load" => Ok(NameContext::Load),
        "Store" => Ok(NameContext::Store),
        other => Err(misplaced("name context", other)),
    }
}

fn decode_op(value: &Value) -> Result<BinaryOp, ReconstructionError> {
    let (tag, _) = read_tag(value)?;
    match tag {
        "Add" => Ok(BinaryOp::Add),
        "Sub" => Ok(BinaryOp::Sub),
        "Mult" => Ok(BinaryOp::Mult),
        "Div" => Ok(BinaryOp::Div),
        "Mod" => Ok(BinaryOp::Mod),
        other => Err(misplaced("operator", other)),
    }
}

fn decode_literal(value: &Value) -> Result<Literal, ReconstructionError> {
    match value {
        Value::Null => Ok(Literal::None),
        Value::Bool(b) => Ok(Literal::Bool(*b)),
        Value::Number(n) => Ok(if let Some(i) = n.as_i64() {
            Literal::Int(i)
        } else {
            Literal::Float(n.as_f64().unwrap_or(f64::NAN))
        }),
        Value::String(s) => Ok(Literal::Str(s.clone())),
        Value::Array(_) | Value::Object(_) => Err(ReconstructionError::FieldShape {
            kind: "Constant",
            field: "value",
            expected: "a scalar",
        }),
    }
}
