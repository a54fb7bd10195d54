/// `math` — evaluate a basic arithmetic expression.
///
/// Supports `+`, `-`, `*`, `/`, `%`, unary `-`, and parentheses.
///
/// ```text
/// math("3+3")          # 6
/// math("(10-2)*3")     # 24
/// floor(2.7)           # 2
/// ```
use std::iter::Peekable;
use std::str::Chars;

use crate::error::Error;
use crate::evaluator::Registry;
use crate::functions::Function;
use crate::value::{TypeTag, Value};

pub fn register(registry: &Registry) {
    registry.register(
        Function::builder("math", TypeTag::Number)
            .parameter("expression", TypeTag::Text)
            .build(|args, _ctx| {
                let expr = args.text("math", "expression")?;
                let value = eval_expr(&expr).map_err(|e| Error::Runtime(format!("math: {}", e)))?;
                Ok(vec![Value::Number(value)])
            }),
    );
    registry.register(
        Function::builder("floor", TypeTag::Number)
            .parameter("n", TypeTag::Number)
            .build(|args, _ctx| Ok(vec![Value::Number(args.number("floor", "n")?.floor())])),
    );
}

// ---------------------------------------------------------------------------
// Recursive-descent arithmetic
// ---------------------------------------------------------------------------

type Arith<T> = std::result::Result<T, String>;

/// Deepest parenthesis nesting accepted in one expression.
const MAX_NESTING: usize = 128;

fn eval_expr(s: &str) -> Arith<f64> {
    let mut cursor = Cursor {
        chars: s.chars().peekable(),
        nesting: 0,
    };
    let value = cursor.sum()?;
    match cursor.peek() {
        Some(c) => Err(format!("unexpected character '{}'", c)),
        None => Ok(value),
    }
}

struct Cursor<'a> {
    chars: Peekable<Chars<'a>>,
    nesting: usize,
}

impl Cursor<'_> {
    /// Next non-whitespace character, not consumed.
    fn peek(&mut self) -> Option<char> {
        while self.chars.next_if(|c| c.is_whitespace()).is_some() {}
        self.chars.peek().copied()
    }

    fn sum(&mut self) -> Arith<f64> {
        let mut acc = self.product()?;
        while let Some(op @ ('+' | '-')) = self.peek() {
            self.chars.next();
            let rhs = self.product()?;
            acc = if op == '+' { acc + rhs } else { acc - rhs };
        }
        Ok(acc)
    }

    fn product(&mut self) -> Arith<f64> {
        let mut acc = self.unary()?;
        while let Some(op @ ('*' | '/' | '%')) = self.peek() {
            self.chars.next();
            let rhs = self.unary()?;
            acc = match op {
                '*' => acc * rhs,
                _ if rhs == 0.0 => {
                    let what = if op == '/' { "division" } else { "modulo" };
                    return Err(format!("{} by zero", what));
                }
                '/' => acc / rhs,
                _ => acc % rhs,
            };
        }
        Ok(acc)
    }

    fn unary(&mut self) -> Arith<f64> {
        match self.peek() {
            Some('-') => {
                self.chars.next();
                Ok(-self.primary()?)
            }
            Some('+') => {
                self.chars.next();
                self.primary()
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Arith<f64> {
        if self.peek() == Some('(') {
            self.chars.next();
            if self.nesting == MAX_NESTING {
                return Err(format!("more than {} nested parentheses", MAX_NESTING));
            }
            self.nesting += 1;
            let value = self.sum()?;
            self.nesting -= 1;
            return match self.peek() {
                Some(')') => {
                    self.chars.next();
                    Ok(value)
                }
                other => Err(format!("expected ')', got {:?}", other)),
            };
        }

        let mut literal = String::new();
        while let Some(c) = self.chars.next_if(|c| c.is_ascii_digit() || *c == '.') {
            literal.push(c);
        }
        if literal.is_empty() {
            return Err(match self.peek() {
                Some(c) => format!("expected number, got '{}'", c),
                None => "expected number, got end of expression".to_string(),
            });
        }
        literal
            .parse()
            .map_err(|_| format!("invalid number literal '{}'", literal))
    }
}
