use std::fmt;
use std::sync::Arc;

use crate::ast::{Parameter, Signature};
use crate::error::{Error, Result};
use crate::evaluator::{Context, Registry};
use crate::value::{TypeTag, Value};

// ---------------------------------------------------------------------------
// Core trait
// ---------------------------------------------------------------------------

/// Implement this trait to add a new callee.
///
/// # Calling convention
/// - `args` — every bound parameter, already evaluated in the caller's context.
///   Optional parameters the call did not mention are absent.
/// - `ctx`  — a fresh context for this invocation only.
///
/// The returned values are the call's result; the caller applies the
/// signature's return arity to them.  Nothing is stored on the callee, so the
/// same callable may be invoked recursively or from several threads.
pub trait Callable: Send + Sync {
    fn invoke(&self, args: &Arguments, ctx: &mut Context) -> Result<Vec<Value>>;
}

impl<F> Callable for F
where
    F: Fn(&Arguments, &mut Context) -> Result<Vec<Value>> + Send + Sync,
{
    fn invoke(&self, args: &Arguments, ctx: &mut Context) -> Result<Vec<Value>> {
        self(args, ctx)
    }
}

// ---------------------------------------------------------------------------
// Argument bundle
// ---------------------------------------------------------------------------

/// Evaluated arguments of one invocation, keyed by parameter name in binding order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    entries: Vec<(String, Vec<Value>)>,
}

impl Arguments {
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<Value>) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = values,
            None => self.entries.push((name, values)),
        }
    }

    /// All values of a parameter; empty when it was not bound.
    pub fn get(&self, name: &str) -> &[Value] {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn single(&self, name: &str) -> Option<&Value> {
        self.get(name).first()
    }

    pub fn has(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The single value of `name` as a number, or a runtime error naming `callee`.
    pub fn number(&self, callee: &str, name: &str) -> Result<f64> {
        match self.single(name) {
            Some(v) => v.as_number().ok_or_else(|| {
                Error::Runtime(format!("{}: '{}' is not a number", callee, v))
            }),
            None => Err(Error::Runtime(format!("{}: missing value for '{}'", callee, name))),
        }
    }

    /// The single value of `name` as text, or a runtime error naming `callee`.
    pub fn text(&self, callee: &str, name: &str) -> Result<String> {
        self.single(name)
            .map(|v| v.to_string())
            .ok_or_else(|| Error::Runtime(format!("{}: missing value for '{}'", callee, name)))
    }
}

// ---------------------------------------------------------------------------
// Function = signature + callable
// ---------------------------------------------------------------------------

/// A registered callee.
#[derive(Clone)]
pub struct Function {
    signature: Signature,
    callable: Arc<dyn Callable>,
}

impl Function {
    pub fn new(signature: Signature, callable: impl Callable + 'static) -> Self {
        Self {
            signature,
            callable: Arc::new(callable),
        }
    }

    pub fn builder(name: &str, return_type: TypeTag) -> Builder {
        Builder {
            signature: Signature {
                namespace: String::new(),
                name: name.to_string(),
                parameters: Vec::new(),
                return_type: Some(return_type),
                single: true,
            },
        }
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn name(&self) -> &str {
        &self.signature.name
    }

    pub fn invoke(&self, args: &Arguments, ctx: &mut Context) -> Result<Vec<Value>> {
        self.callable.invoke(args, ctx)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

/// Declares a native function's signature.
///
/// ```ignore
/// Function::builder("floor", TypeTag::Number)
///     .parameter("n", TypeTag::Number)
///     .build(|args, _ctx| Ok(vec![Value::Number(args.number("floor", "n")?.floor())]));
/// ```
pub struct Builder {
    signature: Signature,
}

impl Builder {
    pub fn namespace(mut self, namespace: &str) -> Self {
        self.signature.namespace = namespace.to_string();
        self
    }

    pub fn parameter(mut self, name: &str, ty: TypeTag) -> Self {
        self.signature.parameters.push(Parameter::new(name, ty));
        self
    }

    pub fn optional_parameter(mut self, name: &str, ty: TypeTag) -> Self {
        self.signature
            .parameters
            .push(Parameter::new(name, ty).optional());
        self
    }

    pub fn list_parameter(mut self, name: &str, ty: TypeTag) -> Self {
        self.signature.parameters.push(Parameter::new(name, ty).list());
        self
    }

    pub fn returns_list(mut self) -> Self {
        self.signature.single = false;
        self
    }

    pub fn no_return(mut self) -> Self {
        self.signature.return_type = None;
        self
    }

    pub fn build<F>(self, body: F) -> Function
    where
        F: Fn(&Arguments, &mut Context) -> Result<Vec<Value>> + Send + Sync + 'static,
    {
        Function::new(self.signature, body)
    }
}

// ---------------------------------------------------------------------------
// Built-in functions
// These are native callees available to every script.
// ---------------------------------------------------------------------------

pub mod count;  // count
pub mod join;   // join
pub mod length; // length
pub mod math;   // math, floor
pub mod random; // random
pub mod range;  // range
pub mod strpos; // strpos — find substring position
pub mod substr; // substr — extract substring by index + length

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

/// Register every built-in into the global namespace.
pub fn register_all(registry: &Registry) {
    count::register(registry);
    join::register(registry);
    length::register(registry);
    math::register(registry);
    random::register(registry);
    range::register(registry);
    strpos::register(registry);
    substr::register(registry);
}
