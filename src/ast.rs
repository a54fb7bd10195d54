use crate::value::{TypeTag, Value};

/// Whether a raw argument was written as `name: expr` or just `expr`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentKind {
    Named,
    Positional,
}

/// One comma-separated, unparsed segment of a call's argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawArgument {
    pub kind: ArgumentKind,
    /// Present only for `Named` arguments.
    pub name: Option<String>,
    /// Trimmed source text of the argument's expression.
    pub text: String,
}

impl RawArgument {
    pub fn named(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind: ArgumentKind::Named,
            name: Some(name.into()),
            text: text.into(),
        }
    }

    pub fn positional(text: impl Into<String>) -> Self {
        Self {
            kind: ArgumentKind::Positional,
            name: None,
            text: text.into(),
        }
    }
}

/// A declared parameter of a callee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub ty: TypeTag,
    /// `false` for list parameters, which receive every value of their expression.
    pub single: bool,
    pub optional: bool,
}

impl Parameter {
    pub fn new(name: impl Into<String>, ty: TypeTag) -> Self {
        Self {
            name: name.into(),
            ty,
            single: true,
            optional: false,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn list(mut self) -> Self {
        self.single = false;
        self
    }

    pub fn describe(&self) -> String {
        self.ty.describe(self.single)
    }
}

/// The declared shape of a callee: its parameters in order and its return value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub namespace: String,
    pub name: String,
    pub parameters: Vec<Parameter>,
    /// `None` when the callee returns nothing.
    pub return_type: Option<TypeTag>,
    pub single: bool,
}

impl Signature {
    /// Apply the return arity policy to the values a callee produced.
    pub fn shape(&self, values: Vec<Value>) -> Option<Returned> {
        self.return_type?;
        if self.single {
            values.into_iter().next().map(Returned::Single)
        } else {
            Some(Returned::List(values))
        }
    }
}

/// What a call hands back to its caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Returned {
    Single(Value),
    List(Vec<Value>),
}

impl Returned {
    pub fn into_values(self) -> Vec<Value> {
        match self {
            Returned::Single(v) => vec![v],
            Returned::List(vs) => vs,
        }
    }
}
