/// `random` — generate a random integer.
///
/// ```text
/// random()               # 0 .. i64::MAX
/// random(10)             # 0 .. 10  (inclusive)
/// random(min: 1, max: 6) # 1 .. 6   (inclusive, like a die)
/// ```
use rand::Rng;

use crate::error::{Error, Result};
use crate::evaluator::Registry;
use crate::functions::{Arguments, Function};
use crate::value::{TypeTag, Value};

fn bound(args: &Arguments, name: &str, default: i64) -> Result<i64> {
    if !args.has(name) {
        return Ok(default);
    }
    let value = args.number("random", name)?;
    if value.fract() != 0.0 {
        return Err(Error::Runtime(format!(
            "random: '{}' is not a valid integer",
            Value::Number(value)
        )));
    }
    Ok(value as i64)
}

pub fn register(registry: &Registry) {
    registry.register(
        Function::builder("random", TypeTag::Number)
            .optional_parameter("max", TypeTag::Number)
            .optional_parameter("min", TypeTag::Number)
            .build(|args, _ctx| {
                let max = bound(args, "max", i64::MAX)?;
                let min = bound(args, "min", 0)?;

                if min > max {
                    return Err(Error::Runtime(format!(
                        "random: min ({}) is greater than max ({})",
                        min, max
                    )));
                }

                let value = rand::thread_rng().gen_range(min..=max);
                Ok(vec![Value::Number(value as f64)])
            }),
    );
}
