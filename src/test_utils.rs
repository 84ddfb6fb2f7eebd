//! Fixture loaders and a small evaluator for generated documents.
//!
//! The evaluator understands the subset of Jsonnet the generators emit:
//! named calls, `std.prune`, `std.isArray`, `self.<fn>` calls and the three
//! tf-libsonnet core functions used to inject blocks. It lets tests check
//! what a generated function evaluates to without a Jsonnet toolchain.

use crate::document::{Key, Node};
use crate::schema::{read_tf_schema_from_file, Block, ProviderSchema, TerraformSchemaExport};
use serde_json::Map;
use std::collections::BTreeMap;

pub const FIXTURE_SCHEMA_PATH: &str = "./tests/fixtures/test-provider-schema.json";
pub const FIXTURE_PROVIDER_ADDR: &str = "registry.terraform.io/acme/test";

pub fn load_fixture_schema() -> TerraformSchemaExport {
    read_tf_schema_from_file(FIXTURE_SCHEMA_PATH).expect("fixture schema must parse")
}

pub fn load_fixture_provider() -> ProviderSchema {
    load_fixture_schema()
        .provider_schemas
        .remove(FIXTURE_PROVIDER_ADDR)
        .expect("fixture provider must exist")
}

/// Block of a fixture resource (`kind == "resource"`) or data source.
pub fn load_fixture_block(kind: &str, name: &str) -> Block {
    let mut provider = load_fixture_provider();
    let items = match kind {
        "resource" => &mut provider.resource_schemas,
        _ => &mut provider.data_source_schemas,
    };
    items.remove(name).expect("fixture block must exist").block
}

/// An evaluated Jsonnet value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Str(String),
    Array(Vec<Value>),
    Object(Vec<Field>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub name: String,
    pub value: Value,
    /// Declared with `+:`.
    pub merge: bool,
    pub hidden: bool,
}

impl Field {
    fn visible(name: String, value: Value) -> Self {
        Self {
            name,
            value,
            merge: false,
            hidden: false,
        }
    }
}

impl Value {
    pub fn from_json(value: &serde_json::Value) -> Value {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => Value::Number(n.clone()),
            serde_json::Value::String(s) => Value::Str(s.clone()),
            serde_json::Value::Array(items) => {
                Value::Array(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| Field::visible(k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Manifests the value, dropping hidden fields.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Value::Number(n.clone()),
            Value::Str(s) => serde_json::Value::String(s.clone()),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Object(fields) => {
                let mut out = Map::new();
                for f in fields.iter().filter(|f| !f.hidden) {
                    out.insert(f.name.clone(), f.value.to_json());
                }
                serde_json::Value::Object(out)
            }
        }
    }

    fn is_empty_collection(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Array(items) => items.is_empty(),
            Value::Object(fields) => fields.iter().all(|f| f.hidden),
            _ => false,
        }
    }
}

/// `base + overlay`, honouring `+:` fields of the overlay.
pub fn compose(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base), Value::Object(overlay)) => {
            for field in overlay {
                match base.iter().position(|f| f.name == field.name) {
                    Some(i) if field.merge => {
                        let existing = std::mem::replace(&mut base[i].value, Value::Null);
                        base[i].value = compose(existing, field.value);
                    }
                    Some(i) => base[i] = field,
                    None => base.push(field),
                }
            }
            Value::Object(base)
        }
        (Value::Array(mut base), Value::Array(overlay)) => {
            base.extend(overlay);
            Value::Array(base)
        }
        (Value::Str(base), Value::Str(overlay)) => Value::Str(base + &overlay),
        (_, overlay) => overlay,
    }
}

fn prune(value: Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(prune)
                .filter(|v| !v.is_empty_collection())
                .collect(),
        ),
        Value::Object(fields) => Value::Object(
            fields
                .into_iter()
                .filter(|f| !f.hidden)
                .map(|f| Field::visible(f.name, prune(f.value)))
                .filter(|f| !f.value.is_empty_collection())
                .collect(),
        ),
        v => v,
    }
}

fn merge_field(name: impl Into<String>, value: Value) -> Field {
    Field {
        name: name.into(),
        value,
        merge: true,
        hidden: false,
    }
}

pub type EvalResult<T> = std::result::Result<T, String>;

struct Env<'a> {
    /// Object the running function is a field of.
    this: &'a Node,
    vars: BTreeMap<String, Value>,
}

/// Calls the function at `path` inside `root` with named arguments.
pub fn call_function(
    root: &Node,
    path: &[&str],
    args: &[(&str, serde_json::Value)],
) -> EvalResult<Value> {
    let args = args
        .iter()
        .map(|(k, v)| (k.to_string(), Value::from_json(v)))
        .collect();
    call_path(root, path, args)
}

fn call_path(root: &Node, path: &[&str], args: Vec<(String, Value)>) -> EvalResult<Value> {
    let (fn_name, parents) = path
        .split_last()
        .ok_or_else(|| "empty function path".to_string())?;
    let mut this = root;
    for p in parents {
        this = this
            .field(p)
            .ok_or_else(|| format!("no field {} in object", p))?;
    }
    let func = this
        .field(fn_name)
        .ok_or_else(|| format!("no function {}", fn_name))?;
    let (params, body) = match func.unwrap_markers() {
        Node::Function { args, body, .. } => (args, body),
        _ => return Err(format!("{} is not a function", fn_name)),
    };

    let mut env = Env {
        this,
        vars: BTreeMap::new(),
    };
    let mut args: BTreeMap<String, Value> = args.into_iter().collect();
    for param in params {
        let name = param.name();
        let value = match args.remove(name) {
            Some(v) => v,
            None if param.is_required() => {
                return Err(format!("missing argument {} for {}", name, fn_name))
            }
            None => eval(param.unwrap_markers(), &env)?,
        };
        env.vars.insert(name.to_string(), value);
    }
    if let Some(unknown) = args.keys().next() {
        return Err(format!("function {} has no parameter {}", fn_name, unknown));
    }
    eval(body, &env)
}

fn lookup(env: &Env<'_>, target: &str) -> EvalResult<Value> {
    env.vars
        .get(target)
        .cloned()
        .ok_or_else(|| format!("unknown variable {}", target))
}

fn eval(node: &Node, env: &Env<'_>) -> EvalResult<Value> {
    match node {
        Node::Null { .. } => Ok(Value::Null),
        Node::String { value, .. } => Ok(Value::Str(value.clone())),
        Node::Reference { target, .. } => lookup(env, target),
        Node::List { items, .. } => Ok(Value::Array(
            items
                .iter()
                .map(|i| eval(i, env))
                .collect::<EvalResult<_>>()?,
        )),
        Node::Object { fields, .. } => {
            let mut out = Vec::with_capacity(fields.len());
            for field in fields {
                let name = match field.unwrap_markers() {
                    Node::Object {
                        key: Key::Computed(target),
                        ..
                    } => match lookup(env, target)? {
                        Value::Str(s) => s,
                        other => return Err(format!("field name must be a string: {:?}", other)),
                    },
                    inner => inner.name().to_string(),
                };
                if matches!(field.unwrap_markers(), Node::Function { .. }) {
                    continue;
                }
                out.push(Field {
                    name,
                    value: eval(field.unwrap_markers(), env)?,
                    merge: field.is_merge(),
                    hidden: field.is_hidden(),
                });
            }
            Ok(Value::Object(out))
        }
        Node::Conditional {
            cond,
            then,
            otherwise,
            ..
        } => match eval(cond, env)? {
            Value::Bool(true) => eval(then, env),
            Value::Bool(false) => eval(otherwise, env),
            other => Err(format!("condition must be a boolean: {:?}", other)),
        },
        Node::Call { func, args, .. } => {
            let mut values = Vec::with_capacity(args.len());
            for a in args {
                values.push((a.name().to_string(), eval(a.unwrap_markers(), env)?));
            }
            call_builtin(func, values, env)
        }
        Node::Local(inner) | Node::Merge(inner) | Node::Required(inner) | Node::Hidden(inner) => {
            eval(inner, env)
        }
        Node::Import { path, .. } => Err(format!("imports are not supported: {}", path)),
        Node::Function { name, .. } => Err(format!("function {} used as a value", name)),
    }
}

fn take(args: &mut Vec<(String, Value)>, name: &str) -> Value {
    match args.iter().position(|(k, _)| k == name) {
        Some(i) => args.remove(i).1,
        None => Value::Null,
    }
}

fn take_str(args: &mut Vec<(String, Value)>, name: &str) -> EvalResult<String> {
    match take(args, name) {
        Value::Str(s) => Ok(s),
        other => Err(format!("argument {} must be a string: {:?}", name, other)),
    }
}

fn call_builtin(func: &str, mut args: Vec<(String, Value)>, env: &Env<'_>) -> EvalResult<Value> {
    if let Some(fn_name) = func.strip_prefix("self.") {
        return call_path(env.this, &[fn_name], args);
    }
    match func {
        "std.prune" => Ok(prune(take(&mut args, "a"))),
        "std.isArray" => Ok(Value::Bool(matches!(
            take(&mut args, "v"),
            Value::Array(_)
        ))),
        "tf.withResource" | "tf.withData" => {
            let root = if func == "tf.withResource" {
                "resource"
            } else {
                "data"
            };
            let typ = take_str(&mut args, "type")?;
            let label = take_str(&mut args, "label")?;
            let attrs = take(&mut args, "attrs");
            let meta = match take(&mut args, "_meta") {
                Value::Null => Value::Object(vec![]),
                meta => meta,
            };
            let block = compose(attrs, meta);
            Ok(Value::Object(vec![merge_field(
                root,
                Value::Object(vec![merge_field(
                    typ,
                    Value::Object(vec![Field::visible(label, block)]),
                )]),
            )]))
        }
        "tf.withProvider" => {
            let name = take_str(&mut args, "name")?;
            let mut attrs = take(&mut args, "attrs");
            let alias = take(&mut args, "alias");
            if alias != Value::Null {
                attrs = compose(attrs, Value::Object(vec![Field::visible("alias".into(), alias)]));
            }
            let mut fields = vec![merge_field(
                "provider",
                Value::Object(vec![merge_field(name.clone(), Value::Array(vec![attrs]))]),
            )];
            let src = take(&mut args, "src");
            let version = take(&mut args, "version");
            if src != Value::Null || version != Value::Null {
                let req = prune(Value::Object(vec![
                    Field::visible("source".into(), src),
                    Field::visible("version".into(), version),
                ]));
                fields.push(merge_field(
                    "terraform",
                    Value::Object(vec![merge_field(
                        "required_providers",
                        Value::Object(vec![Field::visible(name, req)]),
                    )]),
                ));
            }
            Ok(Value::Object(fields))
        }
        other => Err(format!("unsupported function {}", other)),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_prune() {
        let v = Value::from_json(&json!({"a": null, "b": {"c": null}, "d": [], "e": "x", "f": [null, 1]}));
        assert_eq!(prune(v).to_json(), json!({"e": "x", "f": [1]}));
    }

    #[test]
    fn test_compose() {
        let base = Value::from_json(&json!({"a": {"b": 1}, "c": [1]}));
        let overlay = Value::Object(vec![
            merge_field("a", Value::from_json(&json!({"d": 2}))),
            merge_field("c", Value::from_json(&json!([2]))),
        ]);
        assert_eq!(
            compose(base, overlay).to_json(),
            json!({"a": {"b": 1, "d": 2}, "c": [1, 2]})
        );
    }

    #[test]
    fn test_missing_required_argument() {
        let root = Node::object(
            "",
            vec![Node::function(
                "f",
                vec![Node::required(Node::string("x", ""))],
                Node::reference("", "x"),
            )],
        );
        assert!(call_function(&root, &["f"], &[]).is_err());
        assert_eq!(
            call_function(&root, &["f"], &[("x", json!("v"))]).unwrap(),
            Value::Str("v".into())
        );
        assert!(call_function(&root, &["f"], &[("x", json!(1)), ("y", json!(2))]).is_err());
    }
}
