// Runtime for RuleScript build files

pub mod context;
pub mod environment;
pub mod error;
pub mod evaluator;
pub mod processor;
pub mod stdlib;
pub mod values;

pub use error::{RuntimeError, RuntimeResult};
pub use processor::BuildFileProcessor;
pub use values::Value;
