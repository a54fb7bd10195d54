use thiserror::Error;

/// Why a call site could not be bound to its callee.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BindError {
    #[error("function '{name}' not found")]
    UnknownCallee { name: String, namespace: String },
    #[error("unknown parameter '{0}'")]
    UnknownParameter(String),
    #[error("too many arguments")]
    TooManyArguments,
    #[error("missing required parameter '{0}'")]
    MissingRequiredParameter(String),
    #[error("type mismatch for argument '{parameter}': expected {expected}, got {got}")]
    TypeMismatch {
        parameter: String,
        expected: String,
        got: String,
    },
    #[error("can't understand this expression: {0}")]
    UnparsableExpression(String),
}

/// Result of an `ExpressionParser` that could not produce an expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseFailure {
    #[error("unparsable expression")]
    Unparsable,
    #[error("incompatible expression of type {got}")]
    Incompatible { got: String },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("in call to '{callee}': {source}")]
    Call {
        callee: String,
        #[source]
        source: BindError,
    },
    #[error("Runtime error: {0}")]
    Runtime(String),
    #[error("cannot convert '{value}' to {to}")]
    Conversion { value: String, to: String },
    #[error("recursion limit of {0} calls exceeded")]
    RecursionLimit(usize),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
