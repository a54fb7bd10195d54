/// `join` — concatenate texts with a delimiter (a single space by default).
///
/// ```text
/// join(("a", "b", "c"), "-")   # a-b-c
/// join({words::*})
/// ```
use crate::evaluator::Registry;
use crate::functions::Function;
use crate::value::{TypeTag, Value};

pub fn register(registry: &Registry) {
    registry.register(
        Function::builder("join", TypeTag::Text)
            .list_parameter("values", TypeTag::Text)
            .optional_parameter("delimiter", TypeTag::Text)
            .build(|args, _ctx| {
                let delimiter = args
                    .single("delimiter")
                    .map(Value::to_string)
                    .unwrap_or_else(|| " ".to_string());
                let parts: Vec<String> = args.get("values").iter().map(Value::to_string).collect();
                Ok(vec![Value::Text(parts.join(&delimiter))])
            }),
    );
}
