use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::debug;

use crate::ast::{ArgumentKind, Parameter, RawArgument, Returned, Signature};
use crate::error::{BindError, Error, ParseFailure, Result};
use crate::evaluator::{Context, Registry};
use crate::expr::Expression;
use crate::functions::{Arguments, Function};
use crate::lexer;
use crate::parser::ExpressionParser;

/// One parameter and the expression supplied for it.
#[derive(Debug, Clone)]
pub struct Binding {
    pub parameter: Parameter,
    pub expression: Arc<dyn Expression>,
}

/// Validated mapping from parameters to argument expressions, in source order.
#[derive(Debug, Clone, Default)]
pub struct BoundArguments {
    bindings: Vec<Binding>,
}

impl BoundArguments {
    pub fn get(&self, parameter: &str) -> Option<&Arc<dyn Expression>> {
        self.bindings
            .iter()
            .find(|b| b.parameter.name == parameter)
            .map(|b| &b.expression)
    }

    pub fn contains(&self, parameter: &str) -> bool {
        self.get(parameter).is_some()
    }

    /// Parameter names in the order their arguments were written.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bindings.iter().map(|b| b.parameter.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.iter()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Match raw arguments against a signature's parameters.
///
/// Arguments are taken in source order.  A named argument claims the parameter
/// of that name; a positional one claims the earliest parameter not yet
/// claimed.  Claimed parameters leave the pool, so no parameter is bound twice.
pub fn bind_arguments(
    arguments: &[RawArgument],
    signature: &Signature,
    parser: &dyn ExpressionParser,
) -> std::result::Result<BoundArguments, BindError> {
    let mut pool: Vec<&Parameter> = signature.parameters.iter().collect();
    let mut bound = BoundArguments::default();

    for argument in arguments {
        let parameter = match argument.kind {
            ArgumentKind::Named => {
                let name = argument.name.as_deref().unwrap_or_default();
                let index = pool
                    .iter()
                    .position(|p| p.name == name)
                    .ok_or_else(|| BindError::UnknownParameter(name.to_string()))?;
                pool.remove(index)
            }
            ArgumentKind::Positional => {
                if pool.is_empty() {
                    return Err(BindError::TooManyArguments);
                }
                pool.remove(0)
            }
        };

        let expression = parser
            .parse(&argument.text, parameter.ty)
            .map_err(|failure| match failure {
                ParseFailure::Unparsable => BindError::UnparsableExpression(argument.text.clone()),
                ParseFailure::Incompatible { got } => BindError::TypeMismatch {
                    parameter: parameter.name.clone(),
                    expected: parameter.describe(),
                    got,
                },
            })?;

        if parameter.single && !expression.is_single() {
            return Err(BindError::TypeMismatch {
                parameter: parameter.name.clone(),
                expected: parameter.describe(),
                got: expression.return_type().describe(false),
            });
        }

        bound.bindings.push(Binding {
            parameter: parameter.clone(),
            expression,
        });
    }

    if let Some(missing) = pool.iter().find(|p| !p.optional) {
        return Err(BindError::MissingRequiredParameter(missing.name.clone()));
    }

    Ok(bound)
}

/// A call site: the callee's name and the raw arguments written for it.
///
/// The callee and the bound arguments are each resolved once and then reused
/// by every execution.  Both caches are first-writer-wins cells; a failed
/// resolution is not cached, so a callee registered later is picked up by the
/// next execution.  The bound arguments are never checked again against the
/// callee's signature.
#[derive(Debug)]
pub struct CallReference {
    namespace: String,
    name: String,
    arguments: Vec<RawArgument>,
    function: OnceCell<Arc<Function>>,
    bound: OnceCell<BoundArguments>,
}

impl CallReference {
    pub fn new(namespace: &str, name: &str, arguments: Vec<RawArgument>) -> Self {
        Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
            arguments,
            function: OnceCell::new(),
            bound: OnceCell::new(),
        }
    }

    /// Build a call site from the text between the call's parentheses.
    pub fn parse(namespace: &str, name: &str, raw_arguments: &str) -> Self {
        Self::new(namespace, name, lexer::tokenize(raw_arguments))
    }

    pub fn is_resolved(&self) -> bool {
        self.function.get().is_some()
    }

    pub fn bound_arguments(&self) -> Option<&BoundArguments> {
        self.bound.get()
    }

    /// Find the callee, retrying on every attempt until it first succeeds.
    pub fn resolve(&self, registry: &Registry) -> std::result::Result<&Arc<Function>, BindError> {
        self.function.get_or_try_init(|| {
            match registry.lookup(&self.name, &self.namespace) {
                Some(function) => {
                    debug!(name = %self.name, namespace = %self.namespace, "resolved callee");
                    Ok(function)
                }
                None => {
                    debug!(name = %self.name, namespace = %self.namespace, "callee not registered yet");
                    Err(BindError::UnknownCallee {
                        name: self.name.clone(),
                        namespace: self.namespace.clone(),
                    })
                }
            }
        })
    }

    /// Bind this call's arguments to `signature`, or return the earlier binding.
    pub fn bind(
        &self,
        signature: &Signature,
        parser: &dyn ExpressionParser,
    ) -> std::result::Result<&BoundArguments, BindError> {
        self.bound.get_or_try_init(|| {
            let bound = bind_arguments(&self.arguments, signature, parser)?;
            let parameters: Vec<&str> = bound.names().collect();
            debug!(name = %self.name, ?parameters, "bound arguments");
            Ok(bound)
        })
    }

    /// Resolve and bind without running anything.
    pub fn validate(&self, registry: &Registry, parser: &dyn ExpressionParser) -> Result<()> {
        let function = self.resolve(registry).map_err(|e| self.error(e))?;
        self.bind(function.signature(), parser)
            .map_err(|e| self.error(e))?;
        Ok(())
    }

    /// Evaluate the bound arguments in `ctx` and invoke the callee in a fresh
    /// context.  The result follows the callee's declared return arity.
    pub fn execute(&self, ctx: &Context, parser: &dyn ExpressionParser) -> Result<Option<Returned>> {
        let function = self
            .resolve(ctx.registry())
            .map_err(|e| self.error(e))?
            .clone();
        let bound = self
            .bind(function.signature(), parser)
            .map_err(|e| self.error(e))?;

        let mut args = Arguments::default();
        for binding in bound.iter() {
            let mut values = binding.expression.evaluate(ctx)?;
            if binding.parameter.single {
                values.truncate(1);
            }
            args.insert(binding.parameter.name.clone(), values);
        }

        let mut frame = ctx.child()?;
        debug!(name = %self.name, depth = frame.depth(), "invoking");
        let values = function.invoke(&args, &mut frame)?;
        Ok(function.signature().shape(values))
    }

    fn error(&self, source: BindError) -> Error {
        Error::Call {
            callee: self.name.clone(),
            source,
        }
    }
}
