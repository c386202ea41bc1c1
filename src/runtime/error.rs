// Error handling for the RuleScript runtime

use thiserror::Error;

use crate::parser::errors::ParseError;

pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Runtime errors raised while evaluating a build file or include. Apart
/// from remote file-index failures (handled inside the glob engine), every
/// error is fatal to the file being processed.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("name '{0}' is not defined")]
    UndefinedName(String),

    #[error("'{0}' is not callable")]
    NotCallable(String),

    #[error("{operation}: expected {expected}, got {actual}")]
    TypeError {
        expected: String,
        actual: String,
        operation: String,
    },

    #[error("{function}() takes {expected} arguments but {actual} were given")]
    ArityMismatch {
        function: String,
        expected: String,
        actual: usize,
    },

    #[error("{function}() got an unexpected keyword argument '{name}'")]
    UnexpectedKeyword { function: String, name: String },

    #[error("{function}() got multiple values for argument '{name}'")]
    DuplicateArgument { function: String, name: String },

    #[error("{function}() missing required argument '{name}'")]
    MissingArgument { function: String, name: String },

    #[error("'return' outside of a function body")]
    ReturnOutsideFunction,

    #[error("cannot use `{operation}()` at the top level of an included file")]
    NotABuildFile { operation: String },

    #[error("rules must contain the field 'name'; found {record}")]
    MissingRuleName { record: String },

    #[error("duplicate rule definition found: {new} and {existing}")]
    DuplicateRule { new: String, existing: String },

    #[error("invoked 'add_deps' on non-existent rule '{0}'")]
    UnknownRule(String),

    #[error("invoked 'add_deps' on rule '{0}' that has no 'deps' field")]
    MissingDepsField(String),

    #[error("include path '{0}' must begin with //")]
    MalformedInclude(String),

    #[error("circular include detected at '{0}'")]
    CircularInclude(String),

    #[error("build file '{0}' is not under the project root")]
    OutsideProjectRoot(String),

    #[error(
        "glob(includes={includes:?}, excludes={excludes:?}, include_dotfiles={include_dotfiles}) \
         returned no results (allow_empty_globs is disabled)"
    )]
    EmptyGlob {
        includes: Vec<String>,
        excludes: Vec<String>,
        include_dotfiles: bool,
    },

    #[error("conflicting files in subdir_glob: '{key}' maps to both '{first}' and '{second}'")]
    ConflictingGlobKeys {
        key: String,
        first: String,
        second: String,
    },

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: Box<ParseError>,
    },

    #[error("failed to encode rules: {0}")]
    Encode(String),

    #[error("protocol I/O error: {0}")]
    ProtocolIo(#[source] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}
