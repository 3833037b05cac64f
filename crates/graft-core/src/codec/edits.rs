// Structural edits applied directly to the encoded mapping form.
//
// Consumers on the far side of the serialization boundary rewrite trees
// without reconstructing them: each edit is a full pre-order walk over the
// generic mapping, matching on the "node_type" key and recursing into every
// array-valued and object-valued field regardless of match. That recursion
// discipline is what makes edits compose and apply at every depth.

use serde_json::{json, Value};

/// Rename a function: its definition, bare-name call sites, and every other
/// reference to the name.
pub fn rename_function(value: &mut Value, old_name: &str, new_name: &str) {
    if let Value::Object(map) = value {
        match map.get("node_type").and_then(Value::as_str) {
            Some("FunctionDef") => {
                if map.get("name").and_then(Value::as_str) == Some(old_name) {
                    map.insert("name".to_string(), Value::String(new_name.to_string()));
                }
            }
            Some("Call") => {
                // Only a bare-name callee is a direct call site; attribute
                // callees name a different binding.
                if let Some(Value::Object(func)) = map.get_mut("func") {
                    if func.get("node_type").and_then(Value::as_str) == Some("Name")
                        && func.get("id").and_then(Value::as_str) == Some(old_name)
                    {
                        func.insert("id".to_string(), Value::String(new_name.to_string()));
                    }
                }
            }
            Some("Name") => {
                if map.get("id").and_then(Value::as_str) == Some(old_name) {
                    map.insert("id".to_string(), Value::String(new_name.to_string()));
                }
            }
            _ => {}
        }
    }
    for child in children_mut(value) {
        rename_function(child, old_name, new_name);
    }
}

/// Insert a `print("<prefix>: <function name>")` statement at the head of
/// every function body.
pub fn add_logging(value: &mut Value, prefix: &str) {
    if let Value::Object(map) = value {
        if map.get("node_type").and_then(Value::as_str) == Some("FunctionDef") {
            let func_name = map
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string();
            let log_stmt = log_statement(&format!("{prefix}: {func_name}"));
            if let Some(Value::Array(body)) = map.get_mut("body") {
                body.insert(0, log_stmt);
            }
        }
    }
    for child in children_mut(value) {
        add_logging(child, prefix);
    }
}

/// Replace every constant whose payload equals `old` with `new`.
///
/// Scalar comparison is JSON equality, so `1` and `1.0` stay distinct.
pub fn replace_constants(value: &mut Value, old: &Value, new: &Value) {
    if let Value::Object(map) = value {
        if map.get("node_type").and_then(Value::as_str) == Some("Constant")
            && map.get("value") == Some(old)
        {
            map.insert("value".to_string(), new.clone());
        }
    }
    for child in children_mut(value) {
        replace_constants(child, old, new);
    }
}

/// Statement-list fields that can hold removable statements.
const STMT_LIST_FIELDS: [&str; 3] = ["body", "orelse", "finalbody"];

/// Remove every statement of the given kind from every statement list.
pub fn remove_statements(value: &mut Value, stmt_type: &str) {
    if let Value::Object(map) = value {
        for field in STMT_LIST_FIELDS {
            if let Some(Value::Array(stmts)) = map.get_mut(field) {
                stmts.retain(|stmt| {
                    stmt.get("node_type").and_then(Value::as_str) != Some(stmt_type)
                });
            }
        }
    }
    for child in children_mut(value) {
        remove_statements(child, stmt_type);
    }
}

/// Every direct child value that could contain nested nodes.
fn children_mut(value: &mut Value) -> Vec<&mut Value> {
    match value {
        Value::Object(map) => map.values_mut().collect(),
        Value::Array(items) => items.iter_mut().collect(),
        _ => Vec::new(),
    }
}

/// A decodable `print(message)` expression statement.
fn log_statement(message: &str) -> Value {
    json!({
        "node_type": "Expr",
        "value": {
            "node_type": "Call",
            "func": { "node_type": "Name", "id": "print", "ctx": { "node_type": "Load" } },
            "args": [ { "node_type": "Constant", "value": message } ],
            "keywords": []
        }
    })
}
