// Namespaces: one mutable binding table per executing file or include

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::runtime::error::{RuntimeError, RuntimeResult};
use crate::runtime::values::Value;

/// Names that are never copied between namespaces by a merge.
const RESERVED: &[&str] = &["include_defs"];

/// A unit may narrow its exports to exactly the names listed here.
pub const EXPORT_ALLOW_LIST: &str = "__all__";

/// The top-level bindings of one build file or include.
#[derive(Debug, Default)]
pub struct Namespace {
    bindings: HashMap<String, Value>,
}

/// Namespaces are shared: closures keep a handle to the namespace of their
/// defining unit, and merges mutate it in place.
pub type SharedNamespace = Rc<RefCell<Namespace>>;

impl Namespace {
    pub fn new() -> Self {
        Namespace { bindings: HashMap::new() }
    }

    pub fn shared() -> SharedNamespace {
        Rc::new(RefCell::new(Namespace::new()))
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.bindings.get(name).cloned()
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.bindings.insert(name.into(), value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// The names this unit exports: the `__all__` allow-list verbatim when
    /// declared, otherwise every binding not prefixed with an underscore.
    /// Reserved engine names are never exported.
    pub fn export_names(&self) -> RuntimeResult<Vec<String>> {
        if let Some(allow_list) = self.bindings.get(EXPORT_ALLOW_LIST) {
            let items = match allow_list {
                Value::List(items) => items,
                other => {
                    return Err(RuntimeError::TypeError {
                        expected: "a list of strings".to_string(),
                        actual: other.type_name().to_string(),
                        operation: EXPORT_ALLOW_LIST.to_string(),
                    });
                }
            };
            let mut names = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::Str(name) if !RESERVED.contains(&name.as_str()) => {
                        names.push(name.clone());
                    }
                    Value::Str(_) => {}
                    other => {
                        return Err(RuntimeError::TypeError {
                            expected: "a list of strings".to_string(),
                            actual: other.type_name().to_string(),
                            operation: EXPORT_ALLOW_LIST.to_string(),
                        });
                    }
                }
            }
            Ok(names)
        } else {
            Ok(self
                .bindings
                .keys()
                .filter(|name| !name.starts_with('_') && !RESERVED.contains(&name.as_str()))
                .cloned()
                .collect())
        }
    }
}

/// Copy one unit's exported bindings into a destination namespace. Existing
/// destination bindings survive unless the source defines the same name.
pub fn merge_exports(source: &SharedNamespace, destination: &SharedNamespace) -> RuntimeResult<()> {
    if Rc::ptr_eq(source, destination) {
        return Ok(());
    }
    let source_ref = source.borrow();
    let names = source_ref.export_names()?;
    let mut destination_ref = destination.borrow_mut();
    for name in names {
        let value = source_ref
            .get(&name)
            .ok_or_else(|| RuntimeError::UndefinedName(name.clone()))?;
        destination_ref.set(name, value);
    }
    Ok(())
}
