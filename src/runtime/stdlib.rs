// The builtin vocabulary exposed to build-file code.
//
// Builtins live in an engine-level table rather than in unit namespaces:
// they are never exported by a merge, and a unit overriding one by
// assignment shadows it without touching the table. Each builtin resolves
// "the current context" through the active-context stack at call time.

use std::collections::HashMap;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::glob::{self, GlobRequest};
use crate::runtime::error::{RuntimeError, RuntimeResult};
use crate::runtime::evaluator::CallArgs;
use crate::runtime::processor::{BuildFileProcessor, RULE_BASE_PATH_KEY};
use crate::runtime::values::{Builtin, Function, Value};

pub(crate) fn default_builtins() -> HashMap<String, Value> {
    let mut builtins = HashMap::new();
    for builtin in [
        Builtin::Glob,
        Builtin::SubdirGlob,
        Builtin::GetBasePath,
        Builtin::AddRule,
        Builtin::AddDeps,
    ] {
        builtins.insert(
            builtin.name().to_string(),
            Value::Function(Function::Builtin(builtin)),
        );
    }
    builtins
}

impl BuildFileProcessor {
    pub(crate) fn call_builtin(&mut self, builtin: Builtin, args: CallArgs) -> RuntimeResult<Value> {
        match builtin {
            Builtin::Glob => self.builtin_glob(args),
            Builtin::SubdirGlob => self.builtin_subdir_glob(args),
            Builtin::GetBasePath => self.builtin_get_base_path(args),
            Builtin::AddRule => self.builtin_add_rule(args),
            Builtin::AddDeps => self.builtin_add_deps(args),
            Builtin::IncludeDefs { implicit_includes } => {
                let mut slots = bind_args("include_defs", &["name"], args)?;
                let name = required_string(slots[0].take(), "include_defs", "name")?;
                self.include_defs(&name, &implicit_includes)?;
                Ok(Value::None)
            }
        }
    }

    fn builtin_glob(&mut self, args: CallArgs) -> RuntimeResult<Value> {
        let mut slots = bind_args("glob", &["includes", "excludes", "include_dotfiles"], args)?;
        let includes = string_list(
            require(slots[0].take(), "glob", "includes")?,
            "glob() includes",
        )?;
        let excludes = match slots[1].take() {
            Some(value) => string_list(value, "glob() excludes")?,
            None => Vec::new(),
        };
        let include_dotfiles = optional_bool(slots[2].take(), "glob() include_dotfiles")?;

        let context = self.current_context("glob")?;
        let (base_path, dirname, allow_empty, index) = {
            let context_ref = context.borrow();
            let file = context_ref.as_file("glob")?;
            (
                file.base_path.clone(),
                file.dirname.clone(),
                file.allow_empty_globs,
                Rc::clone(&file.index),
            )
        };

        let mut index_ref = index.borrow_mut();
        let files = glob::resolve(
            &GlobRequest { includes: &includes, excludes: &excludes, include_dotfiles },
            &base_path,
            &dirname,
            allow_empty,
            &mut index_ref,
        )?;
        Ok(Value::List(files.into_iter().map(Value::Str).collect()))
    }

    fn builtin_subdir_glob(&mut self, args: CallArgs) -> RuntimeResult<Value> {
        let mut slots = bind_args("subdir_glob", &["glob_specs", "excludes", "prefix"], args)?;
        let spec = glob_spec_list(require(slots[0].take(), "subdir_glob", "glob_specs")?)?;
        let excludes = match slots[1].take() {
            Some(value) => string_list(value, "subdir_glob() excludes")?,
            None => Vec::new(),
        };
        let prefix = match slots[2].take() {
            None | Some(Value::None) => None,
            Some(Value::Str(prefix)) => Some(prefix),
            Some(other) => {
                return Err(RuntimeError::TypeError {
                    expected: "a string".to_string(),
                    actual: other.type_name().to_string(),
                    operation: "subdir_glob() prefix".to_string(),
                });
            }
        };

        let context = self.current_context("subdir_glob")?;
        let (base_path, dirname, allow_empty, index) = {
            let context_ref = context.borrow();
            let file = context_ref.as_file("subdir_glob")?;
            (
                file.base_path.clone(),
                file.dirname.clone(),
                file.allow_empty_globs,
                Rc::clone(&file.index),
            )
        };

        let mut index_ref = index.borrow_mut();
        let mapped = glob::subdir_glob(
            &spec,
            &excludes,
            prefix.as_deref(),
            &base_path,
            &dirname,
            allow_empty,
            &mut index_ref,
        )?;
        let mut result = IndexMap::new();
        for (key, value) in mapped {
            result.insert(key, Value::Str(value));
        }
        Ok(Value::Dict(result))
    }

    fn builtin_get_base_path(&mut self, args: CallArgs) -> RuntimeResult<Value> {
        bind_args("get_base_path", &[], args)?;
        let context = self.current_context("get_base_path")?;
        let context_ref = context.borrow();
        let file = context_ref.as_file("get_base_path")?;
        Ok(Value::Str(file.base_path.clone()))
    }

    fn builtin_add_rule(&mut self, args: CallArgs) -> RuntimeResult<Value> {
        let mut slots = bind_args("add_rule", &["rule"], args)?;
        let mut rule = match require(slots[0].take(), "add_rule", "rule")? {
            Value::Dict(rule) => rule,
            other => {
                return Err(RuntimeError::TypeError {
                    expected: "a dict of rule fields".to_string(),
                    actual: other.type_name().to_string(),
                    operation: "add_rule".to_string(),
                });
            }
        };

        let name = match rule.get("name") {
            Some(Value::Str(name)) => name.clone(),
            Some(other) => {
                return Err(RuntimeError::TypeError {
                    expected: "a string 'name' field".to_string(),
                    actual: other.type_name().to_string(),
                    operation: "add_rule".to_string(),
                });
            }
            None => {
                return Err(RuntimeError::MissingRuleName {
                    record: Value::Dict(rule).to_string(),
                });
            }
        };

        let context = self.current_context("add_rule")?;
        let mut context_ref = context.borrow_mut();
        let file = context_ref.as_file_mut("add_rule")?;
        if let Some(existing) = file.rules.get(&name) {
            return Err(RuntimeError::DuplicateRule {
                new: Value::Dict(rule).to_string(),
                existing: Value::Dict(existing.clone()).to_string(),
            });
        }
        rule.insert(
            RULE_BASE_PATH_KEY.to_string(),
            Value::Str(file.base_path.clone()),
        );
        file.rules.insert(name, rule);
        Ok(Value::None)
    }

    fn builtin_add_deps(&mut self, args: CallArgs) -> RuntimeResult<Value> {
        let mut slots = bind_args("add_deps", &["name", "deps"], args)?;
        let name = required_string(slots[0].take(), "add_deps", "name")?;
        let deps = match slots[1].take() {
            Some(Value::List(deps)) => deps,
            Some(other) => {
                return Err(RuntimeError::TypeError {
                    expected: "a list".to_string(),
                    actual: other.type_name().to_string(),
                    operation: "add_deps() deps".to_string(),
                });
            }
            None => Vec::new(),
        };

        let context = self.current_context("add_deps")?;
        let mut context_ref = context.borrow_mut();
        let file = context_ref.as_file_mut("add_deps")?;
        let rule = file
            .rules
            .get_mut(&name)
            .ok_or_else(|| RuntimeError::UnknownRule(name.clone()))?;
        match rule.get_mut("deps") {
            Some(Value::List(existing)) => {
                existing.extend(deps);
                Ok(Value::None)
            }
            Some(other) => Err(RuntimeError::TypeError {
                expected: "a list".to_string(),
                actual: other.type_name().to_string(),
                operation: "add_deps() existing deps".to_string(),
            }),
            None => Err(RuntimeError::MissingDepsField(name)),
        }
    }
}

/// Map positional and keyword arguments onto named parameter slots.
fn bind_args(
    function: &str,
    params: &[&str],
    args: CallArgs,
) -> RuntimeResult<Vec<Option<Value>>> {
    if args.positional.len() > params.len() {
        return Err(RuntimeError::ArityMismatch {
            function: function.to_string(),
            expected: format!("at most {}", params.len()),
            actual: args.positional.len(),
        });
    }
    let mut slots: Vec<Option<Value>> = vec![None; params.len()];
    for (index, value) in args.positional.into_iter().enumerate() {
        slots[index] = Some(value);
    }
    for (name, value) in args.keywords {
        let Some(index) = params.iter().position(|param| *param == name.as_str()) else {
            return Err(RuntimeError::UnexpectedKeyword {
                function: function.to_string(),
                name,
            });
        };
        if slots[index].is_some() {
            return Err(RuntimeError::DuplicateArgument {
                function: function.to_string(),
                name,
            });
        }
        slots[index] = Some(value);
    }
    Ok(slots)
}

fn require(slot: Option<Value>, function: &str, name: &str) -> RuntimeResult<Value> {
    slot.ok_or_else(|| RuntimeError::MissingArgument {
        function: function.to_string(),
        name: name.to_string(),
    })
}

fn required_string(slot: Option<Value>, function: &str, name: &str) -> RuntimeResult<String> {
    match require(slot, function, name)? {
        Value::Str(value) => Ok(value),
        other => Err(RuntimeError::TypeError {
            expected: "a string".to_string(),
            actual: other.type_name().to_string(),
            operation: format!("{}() {}", function, name),
        }),
    }
}

fn optional_bool(slot: Option<Value>, operation: &str) -> RuntimeResult<bool> {
    match slot {
        None => Ok(false),
        Some(Value::Bool(value)) => Ok(value),
        Some(other) => Err(RuntimeError::TypeError {
            expected: "a boolean".to_string(),
            actual: other.type_name().to_string(),
            operation: operation.to_string(),
        }),
    }
}

/// A glob argument must be a list (or tuple) of pattern strings; passing a
/// single bare string is the classic caller mistake and fails fast.
fn string_list(value: Value, operation: &str) -> RuntimeResult<Vec<String>> {
    let items = match value {
        Value::List(items) | Value::Tuple(items) => items,
        Value::Str(_) => {
            return Err(RuntimeError::TypeError {
                expected: "a list of strings".to_string(),
                actual: "a single string".to_string(),
                operation: operation.to_string(),
            });
        }
        other => {
            return Err(RuntimeError::TypeError {
                expected: "a list of strings".to_string(),
                actual: other.type_name().to_string(),
                operation: operation.to_string(),
            });
        }
    };
    let mut patterns = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::Str(pattern) => patterns.push(pattern),
            other => {
                return Err(RuntimeError::TypeError {
                    expected: "a list of strings".to_string(),
                    actual: format!("a list containing {}", other.type_name()),
                    operation: operation.to_string(),
                });
            }
        }
    }
    Ok(patterns)
}

/// `subdir_glob` takes a list of `(subdirectory, pattern)` pairs.
fn glob_spec_list(value: Value) -> RuntimeResult<Vec<(String, String)>> {
    let operation = "subdir_glob() glob_specs";
    let items = match value {
        Value::List(items) | Value::Tuple(items) => items,
        other => {
            return Err(RuntimeError::TypeError {
                expected: "a list of (subdirectory, pattern) pairs".to_string(),
                actual: other.type_name().to_string(),
                operation: operation.to_string(),
            });
        }
    };
    let mut spec = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::Tuple(pair) | Value::List(pair) if pair.len() == 2 => {
                let mut pair = pair.into_iter();
                let subdirectory = pair.next();
                let pattern = pair.next();
                match (subdirectory, pattern) {
                    (Some(Value::Str(subdirectory)), Some(Value::Str(pattern))) => {
                        spec.push((subdirectory, pattern));
                    }
                    _ => {
                        return Err(RuntimeError::TypeError {
                            expected: "a (subdirectory, pattern) pair of strings".to_string(),
                            actual: "a pair with non-string members".to_string(),
                            operation: operation.to_string(),
                        });
                    }
                }
            }
            other => {
                return Err(RuntimeError::TypeError {
                    expected: "a (subdirectory, pattern) pair".to_string(),
                    actual: other.type_name().to_string(),
                    operation: operation.to_string(),
                });
            }
        }
    }
    Ok(spec)
}
