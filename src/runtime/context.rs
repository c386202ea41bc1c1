// Execution contexts: one per build file or include being processed

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::index::SharedIndexState;
use crate::runtime::error::{RuntimeError, RuntimeResult};
use crate::runtime::values::Value;

pub type SharedContext = Rc<RefCell<BuildContext>>;

/// The environment of the file currently being evaluated. Both variants
/// accumulate transitively referenced include paths; only a build file
/// carries a rule table and glob configuration.
#[derive(Debug)]
pub enum BuildContext {
    File(FileContext),
    Include(IncludeContext),
}

#[derive(Debug)]
pub struct FileContext {
    /// Slash-separated path of the build file's directory relative to the
    /// project root; empty for the root itself. No trailing slash.
    pub base_path: String,
    /// Absolute directory containing the build file.
    pub dirname: PathBuf,
    pub allow_empty_globs: bool,
    /// Shared handle to the process-wide remote index state.
    pub index: SharedIndexState,
    /// Registered rules, keyed by their unique `name` field.
    pub rules: IndexMap<String, IndexMap<String, Value>>,
    /// Absolute paths of every include pulled in, transitively.
    pub includes: BTreeSet<String>,
}

#[derive(Debug, Default)]
pub struct IncludeContext {
    pub includes: BTreeSet<String>,
}

impl BuildContext {
    pub fn includes(&self) -> &BTreeSet<String> {
        match self {
            BuildContext::File(file) => &file.includes,
            BuildContext::Include(include) => &include.includes,
        }
    }

    pub fn includes_mut(&mut self) -> &mut BTreeSet<String> {
        match self {
            BuildContext::File(file) => &mut file.includes,
            BuildContext::Include(include) => &mut include.includes,
        }
    }

    /// The file context, or the caller error for operations that are not
    /// valid at the top level of an include.
    pub fn as_file(&self, operation: &str) -> RuntimeResult<&FileContext> {
        match self {
            BuildContext::File(file) => Ok(file),
            BuildContext::Include(_) => {
                Err(RuntimeError::NotABuildFile { operation: operation.to_string() })
            }
        }
    }

    pub fn as_file_mut(&mut self, operation: &str) -> RuntimeResult<&mut FileContext> {
        match self {
            BuildContext::File(file) => Ok(file),
            BuildContext::Include(_) => {
                Err(RuntimeError::NotABuildFile { operation: operation.to_string() })
            }
        }
    }
}
