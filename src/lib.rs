// RuleScript build-file evaluation engine.
//
// Turns declarative build files into structured rule records: resolves
// includes with precise namespace semantics, expands file globs through a
// remote index or a local walk, and streams encoded results to the parent
// process.

pub mod ast;
pub mod glob;
pub mod index;
pub mod parser;
pub mod protocol;
pub mod runtime;

pub use parser::errors::ParseError;
pub use parser::parse_program;
pub use runtime::processor::BuildFileProcessor;
pub use runtime::{RuntimeError, RuntimeResult, Value};
