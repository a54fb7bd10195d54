/// `strpos` — find the first occurrence of a needle inside a text.
///
/// Returns the 0-based character index, or `-1` when not found.
///
/// ```text
/// strpos("hello world", "world")       # 6
/// strpos(needle: "xyz", text: "hello") # -1
/// ```
use crate::evaluator::Registry;
use crate::functions::Function;
use crate::value::{TypeTag, Value};

pub fn register(registry: &Registry) {
    registry.register(
        Function::builder("strpos", TypeTag::Number)
            .parameter("text", TypeTag::Text)
            .parameter("needle", TypeTag::Text)
            .build(|args, _ctx| {
                let text = args.text("strpos", "text")?;
                let needle = args.text("strpos", "needle")?;

                let result = text
                    .find(needle.as_str())
                    // Convert byte offset → char offset (Unicode-safe).
                    .map(|byte_pos| text[..byte_pos].chars().count() as f64)
                    .unwrap_or(-1.0);

                Ok(vec![Value::Number(result)])
            }),
    );
}
