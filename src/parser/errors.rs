// Parse error types

use thiserror::Error;

use super::Rule;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("{0}")]
    Syntax(Box<pest::error::Error<Rule>>),

    #[error("invalid integer literal `{text}`")]
    InvalidInteger { text: String },

    #[error("invalid escape sequence `\\{sequence}` in string literal")]
    InvalidEscape { sequence: String },

    #[error("unexpected grammar node: expected {expected}, found {found}")]
    UnexpectedNode { expected: String, found: String },

    #[error("missing grammar node: {node}")]
    MissingNode { node: String },
}

impl From<pest::error::Error<Rule>> for ParseError {
    fn from(e: pest::error::Error<Rule>) -> Self {
        ParseError::Syntax(Box::new(e))
    }
}
