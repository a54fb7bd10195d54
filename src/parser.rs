use std::fmt;
use std::sync::Arc;

use crate::ast::ArgumentKind;
use crate::call::CallReference;
use crate::error::ParseFailure;
use crate::evaluator::Registry;
use crate::expr::{Converted, Expression, FunctionCall, List, Literal, Template, Variable};
use crate::lexer;
use crate::value::{TypeTag, Value};

/// Turns the text of one argument into an expression of the requested type.
pub trait ExpressionParser {
    fn parse(
        &self,
        text: &str,
        target: TypeTag,
    ) -> std::result::Result<Arc<dyn Expression>, ParseFailure>;
}

/// Parser for literals, variables, lists and nested calls.
///
/// Grammar:
/// ```text
/// expr   = string | number | 'true' | 'false' | var | list | call
/// string = '"' ( char | '""' )* '"'          # {name} inside is interpolated
/// var    = '{' NAME ( '::*' )? '}'
/// list   = '(' arguments ')'                 # one item is plain grouping
/// call   = IDENT '(' arguments ')'
/// ```
#[derive(Clone)]
pub struct Parser {
    registry: Arc<Registry>,
    namespace: String,
}

impl Parser {
    pub fn new(registry: Arc<Registry>, namespace: &str) -> Self {
        Self {
            registry,
            namespace: namespace.to_string(),
        }
    }

    fn parse_untyped(
        &self,
        text: &str,
        target: TypeTag,
    ) -> std::result::Result<Arc<dyn Expression>, ParseFailure> {
        if text.is_empty() {
            return Err(ParseFailure::Unparsable);
        }

        if let Some(s) = parse_string(text) {
            if s.contains('{') {
                return Ok(Arc::new(Template(s)));
            }
            return Ok(Arc::new(Literal(Value::Text(s))));
        }

        match text {
            "true" => return Ok(Arc::new(Literal(Value::Boolean(true)))),
            "false" => return Ok(Arc::new(Literal(Value::Boolean(false)))),
            _ => {}
        }

        if text.starts_with(|c: char| c.is_ascii_digit() || c == '-' || c == '+' || c == '.') {
            match text.parse::<f64>() {
                Ok(n) if n.is_finite() => return Ok(Arc::new(Literal(Value::Number(n)))),
                _ => {}
            }
        }

        if text.starts_with('{') && closes_at_end(text) {
            let inner = &text[1..text.len() - 1];
            let (name, list) = match inner.strip_suffix("::*") {
                Some(name) => (name, true),
                None => (inner, false),
            };
            if !name.is_empty() && !name.contains(['{', '}', '"']) {
                return Ok(Arc::new(Variable {
                    name: name.to_string(),
                    list,
                }));
            }
            return Err(ParseFailure::Unparsable);
        }

        if text.starts_with('(') && closes_at_end(text) {
            return self.parse_list(&text[1..text.len() - 1], target);
        }

        if let Some(open) = text.find('(') {
            let name = &text[..open];
            if is_identifier(name) && closes_at_end(&text[open..]) {
                return Ok(self.parse_call(name, &text[open + 1..text.len() - 1]));
            }
        }

        Err(ParseFailure::Unparsable)
    }

    fn parse_list(
        &self,
        inner: &str,
        target: TypeTag,
    ) -> std::result::Result<Arc<dyn Expression>, ParseFailure> {
        let arguments = lexer::tokenize(inner);
        if arguments.iter().any(|a| a.kind == ArgumentKind::Named) {
            return Err(ParseFailure::Unparsable);
        }

        // `(x)` only groups.
        if let [only] = arguments.as_slice() {
            return self.parse(&only.text, target);
        }

        let mut items = Vec::with_capacity(arguments.len());
        for argument in &arguments {
            items.push(self.parse(&argument.text, target)?);
        }

        let mut types = items.iter().map(|item| item.return_type());
        let ty = match types.next() {
            Some(first) if types.all(|t| t == first) => first,
            Some(_) => TypeTag::Any,
            None => target,
        };
        Ok(Arc::new(List { items, ty }))
    }

    fn parse_call(&self, name: &str, args: &str) -> Arc<dyn Expression> {
        let call = CallReference::parse(&self.namespace, name, args);
        // A callee that is not registered yet is checked when it first runs.
        let (ty, single) = match self.registry.lookup(name, &self.namespace) {
            Some(function) => {
                let signature = function.signature();
                (signature.return_type, signature.single)
            }
            None => (Some(TypeTag::Any), true),
        };
        Arc::new(FunctionCall {
            call: Arc::new(call),
            parser: self.clone(),
            ty: ty.unwrap_or(TypeTag::Any),
            single,
        }) as Arc<dyn Expression>
    }

    fn returns_nothing(&self, name: &str) -> bool {
        self.registry
            .lookup(name, &self.namespace)
            .is_some_and(|f| f.signature().return_type.is_none())
    }
}

impl ExpressionParser for Parser {
    fn parse(
        &self,
        text: &str,
        target: TypeTag,
    ) -> std::result::Result<Arc<dyn Expression>, ParseFailure> {
        let text = text.trim();
        let expression = self.parse_untyped(text, target)?;

        // A call to a function without a return value only works as a bare statement.
        if target != TypeTag::Any {
            if let Some(open) = text.find('(') {
                if is_identifier(&text[..open]) && self.returns_nothing(&text[..open]) {
                    return Err(ParseFailure::Incompatible {
                        got: "nothing".to_string(),
                    });
                }
            }
        }

        coerce(expression, target)
    }
}

impl fmt::Debug for Parser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Check `expression` against `target`, wrapping it in a run-time conversion
/// when the types differ but are compatible.
fn coerce(
    expression: Arc<dyn Expression>,
    target: TypeTag,
) -> std::result::Result<Arc<dyn Expression>, ParseFailure> {
    let got = expression.return_type();
    if !target.accepts(got) {
        return Err(ParseFailure::Incompatible {
            got: got.describe(expression.is_single()),
        });
    }
    if target == TypeTag::Any || got == target {
        Ok(expression)
    } else {
        Ok(Arc::new(Converted {
            inner: expression,
            to: target,
        }))
    }
}

/// Decode a whole-text string literal; `""` inside stands for one quote.
fn parse_string(text: &str) -> Option<String> {
    let inner = text.strip_prefix('"')?.strip_suffix('"')?;
    let mut s = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '"' {
            // A lone quote ends the literal early: `"a" + "b"` is not one string.
            if chars.next_if_eq(&'"').is_none() {
                return None;
            }
        }
        s.push(c);
    }
    Some(s)
}

/// Whether the bracket opening `text` is closed by its last character.
fn closes_at_end(text: &str) -> bool {
    let mut depth = 0i32;
    let mut in_string = false;
    let last = text.len() - text.chars().last().map_or(0, char::len_utf8);
    for (i, c) in text.char_indices() {
        match c {
            '"' => in_string = !in_string,
            '(' | '{' if !in_string => depth += 1,
            ')' | '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return i == last;
                }
            }
            _ => {}
        }
    }
    false
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c == '_' || c.is_alphabetic())
        && chars.all(|c| c == '_' || c.is_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::Context;
    use crate::functions::Function;

    fn parser() -> Parser {
        let registry = Arc::new(Registry::new());
        registry.register(
            Function::builder("two", TypeTag::Number).build(|_, _| Ok(vec![Value::Number(2.0)])),
        );
        registry.register(Function::builder("noop", TypeTag::Any).no_return().build(|_, _| Ok(vec![])));
        Parser::new(registry, "")
    }

    fn eval(p: &Parser, text: &str, target: TypeTag) -> Vec<Value> {
        let ctx = Context::new(p.registry.clone(), 16);
        p.parse(text, target).unwrap().evaluate(&ctx).unwrap()
    }

    #[test]
    fn literals() {
        let p = parser();
        assert_eq!(eval(&p, "5", TypeTag::Number), vec![Value::Number(5.0)]);
        assert_eq!(eval(&p, "-1.5", TypeTag::Any), vec![Value::Number(-1.5)]);
        assert_eq!(eval(&p, "true", TypeTag::Boolean), vec![Value::Boolean(true)]);
        assert_eq!(
            eval(&p, "\"say \"\"hi\"\"\"", TypeTag::Text),
            vec![Value::from("say \"hi\"")]
        );
    }

    #[test]
    fn numbers_convert_to_text() {
        let p = parser();
        assert_eq!(eval(&p, "5", TypeTag::Text), vec![Value::from("5")]);
    }

    #[test]
    fn text_is_not_a_number() {
        let p = parser();
        assert_eq!(
            p.parse("\"5\"", TypeTag::Number).unwrap_err(),
            ParseFailure::Incompatible { got: "text".to_string() }
        );
    }

    #[test]
    fn garbage_is_unparsable() {
        let p = parser();
        for text in ["", "hello world", "\"a\" \"b\"", "(1, 2", "{}", "inf"] {
            assert_eq!(
                p.parse(text, TypeTag::Any).unwrap_err(),
                ParseFailure::Unparsable,
                "{}",
                text
            );
        }
    }

    #[test]
    fn lists_and_grouping() {
        let p = parser();
        let list = p.parse("(1, 2, two())", TypeTag::Number).unwrap();
        assert!(!list.is_single());
        assert_eq!(list.return_type(), TypeTag::Number);
        assert_eq!(
            eval(&p, "(1, 2, two())", TypeTag::Number),
            vec![Value::Number(1.0), Value::Number(2.0), Value::Number(2.0)]
        );
        assert!(p.parse("(7)", TypeTag::Number).unwrap().is_single());
        assert_eq!(p.parse("(a: 1, 2)", TypeTag::Any).unwrap_err(), ParseFailure::Unparsable);
    }

    #[test]
    fn calls_are_typed_by_their_signature() {
        let p = parser();
        assert_eq!(
            p.parse("two()", TypeTag::Boolean).unwrap_err(),
            ParseFailure::Incompatible { got: "number".to_string() }
        );
        assert_eq!(
            p.parse("noop()", TypeTag::Number).unwrap_err(),
            ParseFailure::Incompatible { got: "nothing".to_string() }
        );
        assert_eq!(
            p.parse("((noop()))", TypeTag::Number).unwrap_err(),
            ParseFailure::Incompatible { got: "nothing".to_string() }
        );
        assert!(p.parse("(noop())", TypeTag::Any).is_ok());
        assert_eq!(p.parse("later(1)", TypeTag::Number).unwrap().return_type(), TypeTag::Number);
    }

    #[test]
    fn bracket_matching() {
        assert!(closes_at_end("(a, (b))"));
        assert!(!closes_at_end("(a)(b)"));
        assert!(closes_at_end("(\")\")"));
        assert!(!closes_at_end("(a"));
    }
}
