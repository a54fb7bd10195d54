/// `range` — the integers from `start` to `end`, both inclusive.
///
/// Counts down when `end < start`.
///
/// ```text
/// range(1, 4)   # 1, 2, 3, 4
/// range(2, 0)   # 2, 1, 0
/// ```
use crate::error::Error;
use crate::evaluator::Registry;
use crate::functions::Function;
use crate::value::{TypeTag, Value};

/// Longest range produced in one call.
const MAX_LEN: f64 = 1_000_000.0;

pub fn register(registry: &Registry) {
    registry.register(
        Function::builder("range", TypeTag::Number)
            .parameter("start", TypeTag::Number)
            .parameter("end", TypeTag::Number)
            .returns_list()
            .build(|args, _ctx| {
                let start = args.number("range", "start")?.round();
                let end = args.number("range", "end")?.round();
                if !start.is_finite() || !end.is_finite() || (end - start).abs() >= MAX_LEN {
                    return Err(Error::Runtime(format!(
                        "range: {} to {} is too long",
                        Value::Number(start),
                        Value::Number(end)
                    )));
                }

                let step = if end >= start { 1.0 } else { -1.0 };
                let len = (end - start).abs() as usize + 1;
                Ok((0..len)
                    .map(|i| Value::Number(start + step * i as f64))
                    .collect())
            }),
    );
}
