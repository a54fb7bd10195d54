use std::fmt;

/// Static type of a parameter, a return value or an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// Accepts every value; also the type of expressions only known at run time.
    Any,
    Text,
    Number,
    Boolean,
}

impl TypeTag {
    pub fn name(self) -> &'static str {
        match self {
            TypeTag::Any => "object",
            TypeTag::Text => "text",
            TypeTag::Number => "number",
            TypeTag::Boolean => "boolean",
        }
    }

    /// Name used in messages, pluralised for list-valued slots.
    pub fn describe(self, single: bool) -> String {
        if single {
            self.name().to_string()
        } else {
            format!("{}s", self.name())
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "object" | "any" => Some(TypeTag::Any),
            "text" | "string" => Some(TypeTag::Text),
            "number" => Some(TypeTag::Number),
            "boolean" => Some(TypeTag::Boolean),
            _ => None,
        }
    }

    /// Whether an expression of type `got` can be used where `self` is expected
    /// without a conversion that may fail.
    pub fn accepts(self, got: TypeTag) -> bool {
        self == TypeTag::Any || got == TypeTag::Any || self == got || self == TypeTag::Text
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Number(f64),
    Boolean(bool),
}

impl Value {
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Value::Text(_) => TypeTag::Text,
            Value::Number(_) => TypeTag::Number,
            Value::Boolean(_) => TypeTag::Boolean,
        }
    }

    /// Guess the type of an untyped literal: number, then boolean, then text.
    pub fn infer(raw: &str) -> Value {
        let raw = raw.trim();
        if let Some(n) = parse_finite(raw) {
            return Value::Number(n);
        }
        match raw {
            "true" => Value::Boolean(true),
            "false" => Value::Boolean(false),
            _ => Value::Text(raw.to_string()),
        }
    }

    pub fn convert(&self, to: TypeTag) -> Option<Value> {
        match (self, to) {
            (v, TypeTag::Any) => Some(v.clone()),
            (v, TypeTag::Text) => Some(Value::Text(v.to_string())),
            (Value::Number(n), TypeTag::Number) => Some(Value::Number(*n)),
            (Value::Text(s), TypeTag::Number) => parse_finite(s.trim()).map(Value::Number),
            (Value::Boolean(b), TypeTag::Boolean) => Some(Value::Boolean(*b)),
            (Value::Text(s), TypeTag::Boolean) => match s.trim() {
                "true" => Some(Value::Boolean(true)),
                "false" => Some(Value::Boolean(false)),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

}

/// `NaN` and the infinities are not numbers a script can write.
fn parse_finite(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|n| n.is_finite())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            // Integers print without a fractional part.
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Value::Number(n) => write!(f, "{}", n),
            Value::Boolean(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}
