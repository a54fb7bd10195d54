/// `substr` — extract a substring.
///
/// Arguments: `text`, `start` (0-based char index) and an optional `length`
/// (number of chars, default: to the end).
///
/// ```text
/// substr("AAAaaa", 0, 3)   # AAA
/// substr("AAAaaa", 4)      # aa
/// ```
use crate::error::{Error, Result};
use crate::evaluator::Registry;
use crate::functions::Function;
use crate::value::{TypeTag, Value};

fn index(value: f64, what: &str) -> Result<usize> {
    if value < 0.0 || value.fract() != 0.0 {
        return Err(Error::Runtime(format!(
            "substr: '{}' is not a valid {}",
            Value::Number(value),
            what
        )));
    }
    Ok(value as usize)
}

pub fn register(registry: &Registry) {
    registry.register(
        Function::builder("substr", TypeTag::Text)
            .parameter("text", TypeTag::Text)
            .parameter("start", TypeTag::Number)
            .optional_parameter("length", TypeTag::Number)
            .build(|args, _ctx| {
                let chars: Vec<char> = args.text("substr", "text")?.chars().collect();
                let start = index(args.number("substr", "start")?, "start index")?.min(chars.len());
                let end = if args.has("length") {
                    let length = index(args.number("substr", "length")?, "length")?;
                    start.saturating_add(length).min(chars.len())
                } else {
                    chars.len()
                };

                Ok(vec![Value::Text(chars[start..end].iter().collect())])
            }),
    );
}
