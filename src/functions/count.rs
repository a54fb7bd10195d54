/// `count` — return the number of values passed.
///
/// ```text
/// count(("one", "two", "three"))   # 3
/// count({list::*})
/// ```
use crate::evaluator::Registry;
use crate::functions::Function;
use crate::value::{TypeTag, Value};

pub fn register(registry: &Registry) {
    registry.register(
        Function::builder("count", TypeTag::Number)
            .list_parameter("values", TypeTag::Any)
            .build(|args, _ctx| Ok(vec![Value::Number(args.get("values").len() as f64)])),
    );
}
