/// `length` — return the character count of a text.
///
/// ```text
/// length("hallo")   # 5
/// ```
use crate::evaluator::Registry;
use crate::functions::Function;
use crate::value::{TypeTag, Value};

pub fn register(registry: &Registry) {
    registry.register(
        Function::builder("length", TypeTag::Number)
            .parameter("text", TypeTag::Text)
            .build(|args, _ctx| {
                let text = args.text("length", "text")?;
                Ok(vec![Value::Number(text.chars().count() as f64)])
            }),
    );
}
