//! Argument-list tokenizer and call binder for script function calls.
//!
//! A call site such as `substr("hello", length: 3, start: 1)` goes through
//! three stages:
//!
//! | Stage | Entry point | Result |
//! |---|---|---|
//! | tokenize | [`tokenize`] | raw arguments, tagged named or positional |
//! | bind | [`CallReference::bind`] | parameter → expression, cached per call site |
//! | execute | [`CallReference::execute`] | the callee's value(s), shaped by its return arity |
//!
//! [`Evaluator`] wires the stages to a [`Registry`] of callees and a concrete
//! [`Parser`]; the built-in callees live in [`functions`].

pub mod ast;
pub mod call;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod expr;
pub mod functions;
pub mod lexer;
pub mod parser;
pub mod value;

pub use ast::{ArgumentKind, Parameter, RawArgument, Returned, Signature};
pub use call::{bind_arguments, Binding, BoundArguments, CallReference};
pub use config::Config;
pub use error::{BindError, Error, ParseFailure, Result};
pub use evaluator::{Context, Evaluator, Registry};
pub use expr::Expression;
pub use functions::{Arguments, Callable, Function};
pub use lexer::tokenize;
pub use parser::{ExpressionParser, Parser};
pub use value::{TypeTag, Value};

/// An evaluator with every built-in function registered.
pub fn standard(config: Config) -> Evaluator {
    let eval = Evaluator::new(config);
    functions::register_all(eval.registry());
    eval
}
