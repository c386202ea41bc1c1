// Scope/include resolution engine.
//
// Executes build files and includes, maintains the active-context stack and
// the stack of executing user-code units, merges include exports into the
// correct namespace, and memoizes every processed file for the lifetime of
// the process.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::debug;

use crate::index::{IndexState, SharedIndexState};
use crate::parser;
use crate::runtime::context::{BuildContext, FileContext, IncludeContext, SharedContext};
use crate::runtime::environment::{merge_exports, Namespace, SharedNamespace};
use crate::runtime::error::{RuntimeError, RuntimeResult};
use crate::runtime::stdlib;
use crate::runtime::values::{Builtin, Function, Value};

/// Field the engine stamps onto every registered rule so the consumer knows
/// which build file the rule came from.
pub const RULE_BASE_PATH_KEY: &str = "buck.base_path";

/// Key of the synthetic trailer record listing a build file's transitive
/// includes.
pub const INCLUDES_KEY: &str = "__includes";

const INCLUDE_DEFS: &str = "include_defs";

/// Marker prefix of project-root-relative include specifiers.
const INCLUDE_MARKER: &str = "//";

pub struct BuildFileProcessor {
    pub(crate) project_root: PathBuf,
    pub(crate) build_file_name: String,
    pub(crate) allow_empty_globs: bool,
    pub(crate) implicit_includes: Vec<String>,
    pub(crate) index: SharedIndexState,
    /// Engine-level builtin table. Deliberately not copied into unit
    /// namespaces: builtins are never exported by a merge, and a unit's
    /// override of a builtin shadows this table without touching it.
    pub(crate) builtins: HashMap<String, Value>,
    /// Innermost entry is "the current context"; builtins resolve their
    /// context through this stack at call time.
    pub(crate) context_stack: Vec<SharedContext>,
    /// Namespaces of the user-code units currently executing, innermost
    /// last. Distinct from the context stack: a function call pushes its
    /// defining unit here but pushes no context.
    pub(crate) unit_stack: Vec<SharedNamespace>,
    /// Paths currently being processed, for cycle detection.
    pub(crate) loading: Vec<PathBuf>,
    /// Processed-file cache; entries live for the whole process.
    pub(crate) cache: HashMap<PathBuf, (SharedContext, SharedNamespace)>,
}

impl BuildFileProcessor {
    pub fn new(
        project_root: PathBuf,
        build_file_name: impl Into<String>,
        allow_empty_globs: bool,
        implicit_includes: Vec<String>,
        index: IndexState,
    ) -> Self {
        BuildFileProcessor {
            project_root,
            build_file_name: build_file_name.into(),
            allow_empty_globs,
            implicit_includes,
            index: index.shared(),
            builtins: stdlib::default_builtins(),
            context_stack: Vec::new(),
            unit_stack: Vec::new(),
            loading: Vec::new(),
            cache: HashMap::new(),
        }
    }

    /// Process one build file, returning its rule records plus the
    /// synthetic `__includes` trailer. `path` may be absolute or relative
    /// to the project root; the trailer reproduces it as supplied.
    pub fn process_build_file(&mut self, path: &str) -> RuntimeResult<Vec<Value>> {
        let absolute = {
            let p = Path::new(path);
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                self.project_root.join(p)
            }
        };
        let relative = absolute
            .strip_prefix(&self.project_root)
            .map_err(|_| RuntimeError::OutsideProjectRoot(path.to_string()))?;
        let relative = relative.to_string_lossy().replace('\\', "/");
        let base_path = match relative.strip_suffix(&format!("/{}", self.build_file_name)) {
            Some(stripped) => stripped.to_string(),
            None if relative == self.build_file_name => String::new(),
            None => Path::new(&relative)
                .parent()
                .map(|p| p.to_string_lossy().replace('\\', "/"))
                .unwrap_or_default(),
        };
        let dirname = absolute
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.project_root.clone());

        let context = Rc::new(std::cell::RefCell::new(BuildContext::File(FileContext {
            base_path,
            dirname,
            allow_empty_globs: self.allow_empty_globs,
            index: Rc::clone(&self.index),
            rules: IndexMap::new(),
            includes: BTreeSet::new(),
        })));
        let implicit_includes = self.implicit_includes.clone();
        let (context, _namespace) = self.process(context, &absolute, &implicit_includes)?;

        let context_ref = context.borrow();
        let file = context_ref.as_file("process_build_file")?;
        let mut values: Vec<Value> = file
            .rules
            .values()
            .map(|rule| Value::Dict(rule.clone()))
            .collect();
        let mut includes_list = vec![Value::Str(path.to_string())];
        includes_list.extend(file.includes.iter().map(|p| Value::Str(p.clone())));
        let mut trailer = IndexMap::new();
        trailer.insert(INCLUDES_KEY.to_string(), Value::List(includes_list));
        values.push(Value::Dict(trailer));
        Ok(values)
    }

    /// Process a build file or include at the given path. Each distinct
    /// path executes at most once per process; later calls return the
    /// cached context and namespace unchanged, whatever their
    /// `implicit_includes` argument.
    fn process(
        &mut self,
        context: SharedContext,
        path: &Path,
        implicit_includes: &[String],
    ) -> RuntimeResult<(SharedContext, SharedNamespace)> {
        if let Some((cached_context, cached_namespace)) = self.cache.get(path) {
            debug!(path = %path.display(), "processed-file cache hit");
            return Ok((Rc::clone(cached_context), Rc::clone(cached_namespace)));
        }
        if self.loading.iter().any(|p| p.as_path() == path) {
            return Err(RuntimeError::CircularInclude(path.display().to_string()));
        }

        // The stacks must be restored even when evaluation fails, or every
        // later request would observe a stale "current context".
        self.loading.push(path.to_path_buf());
        self.context_stack.push(Rc::clone(&context));
        let result = self.process_uncached(&context, path, implicit_includes);
        self.context_stack.pop();
        self.loading.pop();
        let namespace = result?;

        self.cache
            .insert(path.to_path_buf(), (Rc::clone(&context), Rc::clone(&namespace)));
        Ok((context, namespace))
    }

    fn process_uncached(
        &mut self,
        context: &SharedContext,
        path: &Path,
        implicit_includes: &[String],
    ) -> RuntimeResult<SharedNamespace> {
        let namespace = Namespace::shared();
        // `include_defs` is seeded per unit, bound to this call's implicit
        // includes so nested explicit includes get them applied too.
        namespace.borrow_mut().set(
            INCLUDE_DEFS,
            Value::Function(Function::Builtin(Builtin::IncludeDefs {
                implicit_includes: implicit_includes.to_vec(),
            })),
        );

        for include in implicit_includes {
            let include_path = self.resolve_include_path(include)?;
            let (inner_context, inner_namespace) = self.process_include(&include_path, &[])?;
            merge_exports(&inner_namespace, &namespace)?;
            let mut context_ref = context.borrow_mut();
            context_ref
                .includes_mut()
                .insert(include_path.to_string_lossy().into_owned());
            let inner_ref = inner_context.borrow();
            for referenced in inner_ref.includes() {
                context_ref.includes_mut().insert(referenced.clone());
            }
        }

        let source = std::fs::read_to_string(path).map_err(|e| RuntimeError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let program = parser::parse_program(&source).map_err(|e| RuntimeError::Parse {
            path: path.display().to_string(),
            source: Box::new(e),
        })?;

        self.unit_stack.push(Rc::clone(&namespace));
        let result = self.exec_unit(&program, &namespace);
        self.unit_stack.pop();
        result?;

        Ok(namespace)
    }

    fn process_include(
        &mut self,
        path: &Path,
        implicit_includes: &[String],
    ) -> RuntimeResult<(SharedContext, SharedNamespace)> {
        let context = Rc::new(std::cell::RefCell::new(BuildContext::Include(
            IncludeContext::default(),
        )));
        self.process(context, path, implicit_includes)
    }

    /// Resolve an include specifier (`//path/to/defs`) to an absolute path.
    fn resolve_include_path(&self, name: &str) -> RuntimeResult<PathBuf> {
        let relative = name
            .strip_prefix(INCLUDE_MARKER)
            .ok_or_else(|| RuntimeError::MalformedInclude(name.to_string()))?;
        Ok(self.project_root.join(relative))
    }

    /// Pull the named include into the nearest executing user-code unit.
    ///
    /// The merge target is the namespace of the unit whose code is running
    /// right now, not the file at the top of the context stack: when a
    /// function defined in include A calls this, A's own namespace receives
    /// the bindings, and a file that merely called A's function does not.
    pub(crate) fn include_defs(
        &mut self,
        name: &str,
        implicit_includes: &[String],
    ) -> RuntimeResult<()> {
        let path = self.resolve_include_path(name)?;
        let (inner_context, inner_namespace) = self.process_include(&path, implicit_includes)?;

        let target = self.unit_stack.last().cloned().ok_or_else(|| {
            RuntimeError::Internal("include_defs called with no executing unit".to_string())
        })?;
        merge_exports(&inner_namespace, &target)?;

        let context = self.current_context(INCLUDE_DEFS)?;
        let mut context_ref = context.borrow_mut();
        context_ref
            .includes_mut()
            .insert(path.to_string_lossy().into_owned());
        let inner_ref = inner_context.borrow();
        for referenced in inner_ref.includes() {
            context_ref.includes_mut().insert(referenced.clone());
        }
        Ok(())
    }

    /// The context at the top of the active-context stack.
    pub(crate) fn current_context(&self, operation: &str) -> RuntimeResult<SharedContext> {
        self.context_stack.last().cloned().ok_or_else(|| {
            RuntimeError::Internal(format!("`{}` called with no active build context", operation))
        })
    }
}
