// Runtime value system for RuleScript
// Represents values during execution (distinct from the AST, which
// represents parsed code)

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use crate::ast::Stmt;
use crate::runtime::environment::SharedNamespace;
use crate::runtime::error::{RuntimeError, RuntimeResult};

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    Dict(IndexMap<String, Value>),
    Function(Function),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "none",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Dict(_) => "dict",
            Value::Function(_) => "function",
        }
    }

    /// Convert to the JSON tree used by the protocol encodings. Functions
    /// have no serialized form and may not appear in rule fields.
    pub fn to_json(&self) -> RuntimeResult<JsonValue> {
        Ok(match self {
            Value::None => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Int(i) => JsonValue::Number((*i).into()),
            Value::Str(s) => JsonValue::String(s.clone()),
            Value::List(items) | Value::Tuple(items) => {
                let converted: RuntimeResult<Vec<JsonValue>> =
                    items.iter().map(Value::to_json).collect();
                JsonValue::Array(converted?)
            }
            Value::Dict(map) => {
                let mut object = serde_json::Map::new();
                for (key, value) in map {
                    object.insert(key.clone(), value.to_json()?);
                }
                JsonValue::Object(object)
            }
            Value::Function(function) => {
                return Err(RuntimeError::TypeError {
                    expected: "a serializable value".to_string(),
                    actual: format!("{:?}", function),
                    operation: "encoding rule fields".to_string(),
                });
            }
        })
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "none"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::List(items) => {
                let rendered: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", rendered.join(", "))
            }
            Value::Tuple(items) => {
                let rendered: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "({})", rendered.join(", "))
            }
            Value::Dict(map) => {
                let rendered: Vec<String> =
                    map.iter().map(|(k, v)| format!("{:?}: {}", k, v)).collect();
                write!(f, "{{{}}}", rendered.join(", "))
            }
            Value::Function(function) => write!(f, "{:?}", function),
        }
    }
}

#[derive(Clone)]
pub enum Function {
    Builtin(Builtin),
    Closure(Rc<Closure>),
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Function::Builtin(b) => write!(f, "#<builtin {}>", b.name()),
            Function::Closure(c) => write!(f, "#<function {}>", c.name),
        }
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Function::Builtin(a), Function::Builtin(b)) => a == b,
            (Function::Closure(a), Function::Closure(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// The engine-provided operations available to build-file code.
#[derive(Debug, Clone, PartialEq)]
pub enum Builtin {
    Glob,
    SubdirGlob,
    GetBasePath,
    AddRule,
    AddDeps,
    /// Seeded per execution unit, bound to that unit's implicit includes.
    IncludeDefs { implicit_includes: Vec<String> },
}

impl Builtin {
    pub fn name(&self) -> &'static str {
        match self {
            Builtin::Glob => "glob",
            Builtin::SubdirGlob => "subdir_glob",
            Builtin::GetBasePath => "get_base_path",
            Builtin::AddRule => "add_rule",
            Builtin::AddDeps => "add_deps",
            Builtin::IncludeDefs { .. } => "include_defs",
        }
    }
}

/// A user-defined function. It closes over the namespace *object* of the
/// unit that defined it, so bindings merged into that namespace later are
/// visible to subsequent calls.
pub struct Closure {
    pub name: String,
    pub params: Vec<ClosureParam>,
    pub body: Vec<Stmt>,
    pub globals: SharedNamespace,
}

/// A parameter with its default already evaluated.
#[derive(Clone)]
pub struct ClosureParam {
    pub name: String,
    pub default: Option<Value>,
}
