use std::fmt;
use std::sync::Arc;

use crate::call::CallReference;
use crate::error::{Error, Result};
use crate::evaluator::{Context, Registry};
use crate::parser::Parser;
use crate::value::{TypeTag, Value};

/// A parsed, evaluable argument expression.
pub trait Expression: fmt::Debug + Send + Sync {
    fn evaluate(&self, ctx: &Context) -> Result<Vec<Value>>;

    /// Static type; `Any` when only known at run time.
    fn return_type(&self) -> TypeTag;

    fn is_single(&self) -> bool {
        true
    }

    /// Resolve and bind every call inside this expression without running it.
    fn validate(&self, _registry: &Registry) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug)]
pub struct Literal(pub Value);

impl Expression for Literal {
    fn evaluate(&self, _ctx: &Context) -> Result<Vec<Value>> {
        Ok(vec![self.0.clone()])
    }

    fn return_type(&self) -> TypeTag {
        self.0.type_tag()
    }
}

/// `"…{name}…"`: a string with variable references.
#[derive(Debug)]
pub struct Template(pub String);

impl Expression for Template {
    fn evaluate(&self, ctx: &Context) -> Result<Vec<Value>> {
        Ok(vec![Value::Text(ctx.interpolate(&self.0))])
    }

    fn return_type(&self) -> TypeTag {
        TypeTag::Text
    }
}

/// `{name}` or `{name::*}`.
#[derive(Debug)]
pub struct Variable {
    pub name: String,
    pub list: bool,
}

impl Expression for Variable {
    fn evaluate(&self, ctx: &Context) -> Result<Vec<Value>> {
        let values = ctx.var(&self.name);
        if self.list {
            Ok(values.to_vec())
        } else {
            Ok(values.iter().take(1).cloned().collect())
        }
    }

    fn return_type(&self) -> TypeTag {
        TypeTag::Any
    }

    fn is_single(&self) -> bool {
        !self.list
    }
}

/// `(a, b, …)`
#[derive(Debug)]
pub struct List {
    pub items: Vec<Arc<dyn Expression>>,
    pub ty: TypeTag,
}

impl Expression for List {
    fn evaluate(&self, ctx: &Context) -> Result<Vec<Value>> {
        let mut values = Vec::new();
        for item in &self.items {
            values.extend(item.evaluate(ctx)?);
        }
        Ok(values)
    }

    fn return_type(&self) -> TypeTag {
        self.ty
    }

    fn is_single(&self) -> bool {
        false
    }

    fn validate(&self, registry: &Registry) -> Result<()> {
        self.items.iter().try_for_each(|item| item.validate(registry))
    }
}

/// Converts every value of `inner` to `to` at evaluation time.
#[derive(Debug)]
pub struct Converted {
    pub inner: Arc<dyn Expression>,
    pub to: TypeTag,
}

impl Expression for Converted {
    fn evaluate(&self, ctx: &Context) -> Result<Vec<Value>> {
        self.inner
            .evaluate(ctx)?
            .into_iter()
            .map(|v| {
                v.convert(self.to).ok_or_else(|| Error::Conversion {
                    value: v.to_string(),
                    to: self.to.to_string(),
                })
            })
            .collect()
    }

    fn return_type(&self) -> TypeTag {
        self.to
    }

    fn is_single(&self) -> bool {
        self.inner.is_single()
    }

    fn validate(&self, registry: &Registry) -> Result<()> {
        self.inner.validate(registry)
    }
}

/// `name(args)`: a nested call whose result feeds the enclosing expression.
#[derive(Debug)]
pub struct FunctionCall {
    pub call: Arc<CallReference>,
    pub parser: Parser,
    pub ty: TypeTag,
    pub single: bool,
}

impl Expression for FunctionCall {
    fn evaluate(&self, ctx: &Context) -> Result<Vec<Value>> {
        let returned = self.call.execute(ctx, &self.parser)?;
        Ok(returned.map(|r| r.into_values()).unwrap_or_default())
    }

    fn return_type(&self) -> TypeTag {
        self.ty
    }

    fn is_single(&self) -> bool {
        self.single
    }

    fn validate(&self, registry: &Registry) -> Result<()> {
        self.call.validate(registry, &self.parser)?;
        match self.call.bound_arguments() {
            Some(bound) => bound
                .iter()
                .try_for_each(|binding| binding.expression.validate(registry)),
            None => Ok(()),
        }
    }
}
