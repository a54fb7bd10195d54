use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use argbind::{
    standard, BindError, CallReference, Config, Context, Error, Evaluator, ExpressionParser,
    Function, Parser, Registry, Returned, TypeTag, Value,
};
use pretty_assertions::assert_eq;

fn eval() -> Evaluator {
    standard(Config::default())
}

fn numbers(ns: &[f64]) -> Vec<Value> {
    ns.iter().map(|n| Value::Number(*n)).collect()
}

/// `sum_to(n)` = n + sum_to(n - 1), re-entering one shared call site.
fn register_sum_to(registry: &Registry) {
    let recurse = Arc::new(CallReference::parse("", "sum_to", r#"math("{n} - 1")"#));
    registry.register(
        Function::builder("sum_to", TypeTag::Number)
            .parameter("n", TypeTag::Number)
            .build(move |args, ctx| {
                let n = args.number("sum_to", "n")?;
                if n <= 0.0 {
                    return Ok(vec![Value::Number(0.0)]);
                }
                ctx.set_var("n", vec![Value::Number(n)]);
                let parser = Parser::new(ctx.registry().clone(), "");
                let rest = match recurse.execute(ctx, &parser)? {
                    Some(Returned::Single(Value::Number(rest))) => rest,
                    other => return Err(Error::Runtime(format!("unexpected {:?}", other))),
                };
                Ok(vec![Value::Number(n + rest)])
            }),
    );
}

#[test]
fn builtins_with_named_and_positional_arguments() {
    let eval = eval();
    assert_eq!(
        eval.evaluate(r#"substr("hello", length: 3, start: 1)"#).unwrap(),
        vec![Value::from("ell")]
    );
    assert_eq!(
        eval.evaluate(r#"strpos(needle: "lo", text: "hello")"#).unwrap(),
        numbers(&[3.0])
    );
    assert_eq!(eval.evaluate(r#"length("a, b: c")"#).unwrap(), numbers(&[7.0]));
    assert_eq!(eval.evaluate(r#"math("(10-2)*3")"#).unwrap(), numbers(&[24.0]));
    assert_eq!(eval.evaluate("floor(2.7)").unwrap(), numbers(&[2.0]));
}

#[test]
fn nested_calls_and_lists() {
    let eval = eval();
    assert_eq!(eval.evaluate("range(1, 4)").unwrap(), numbers(&[1.0, 2.0, 3.0, 4.0]));
    assert_eq!(eval.evaluate("range(2, 0)").unwrap(), numbers(&[2.0, 1.0, 0.0]));
    assert_eq!(eval.evaluate("count(range(1, 4))").unwrap(), numbers(&[4.0]));
    assert_eq!(
        eval.evaluate(r#"join(range(1, 3), "-")"#).unwrap(),
        vec![Value::from("1-2-3")]
    );
    assert_eq!(
        eval.evaluate(r#"join(("a", length("bc"), true))"#).unwrap(),
        vec![Value::from("a 2 true")]
    );
}

#[test]
fn variables_feed_arguments() {
    let mut eval = eval();
    eval.set_var("word", vec![Value::from("hello")]);
    eval.set_var("xs", numbers(&[1.0, 2.0, 3.0]));
    eval.set_var("n", numbers(&[4.0]));
    assert_eq!(eval.evaluate("length({word})").unwrap(), numbers(&[5.0]));
    assert_eq!(eval.evaluate("count({xs::*})").unwrap(), numbers(&[3.0]));
    assert_eq!(
        eval.evaluate(r#"join({xs::*}, delimiter: "+")"#).unwrap(),
        vec![Value::from("1+2+3")]
    );
    assert_eq!(eval.evaluate(r#"math("{n} * 2")"#).unwrap(), numbers(&[8.0]));
}

#[test]
fn variable_that_does_not_convert_fails_at_run_time() {
    let mut eval = eval();
    eval.set_var("word", vec![Value::from("hello")]);
    assert!(matches!(
        eval.evaluate("floor({word})"),
        Err(Error::Conversion { .. })
    ));
}

#[test]
fn bind_errors_name_the_callee() {
    let eval = eval();
    let err = eval.evaluate("floor(x: 1)").unwrap_err();
    assert_eq!(err.to_string(), "in call to 'floor': unknown parameter 'x'");
    assert!(matches!(
        eval.evaluate("length(range(1, 3))"),
        Err(Error::Call {
            source: BindError::TypeMismatch { .. },
            ..
        })
    ));
    assert!(matches!(
        eval.evaluate("floor(1, 2)"),
        Err(Error::Call {
            source: BindError::TooManyArguments,
            ..
        })
    ));
}

#[test]
fn grouped_call_without_return_value_fails_binding() {
    let eval = eval();
    eval.register(
        Function::builder("nothing", TypeTag::Any)
            .no_return()
            .build(|_, _| Ok(vec![])),
    );
    match eval.evaluate("floor((nothing()))") {
        Err(Error::Call { callee, source }) => {
            assert_eq!(callee, "floor");
            assert_eq!(
                source,
                BindError::TypeMismatch {
                    parameter: "n".to_string(),
                    expected: "number".to_string(),
                    got: "nothing".to_string(),
                }
            );
        }
        other => panic!("expected a type mismatch, got {:?}", other),
    }
}

#[test]
fn non_finite_text_does_not_become_a_number() {
    let mut eval = eval();
    eval.set_var("x", vec![Value::from("NaN")]);
    assert!(matches!(eval.evaluate("floor({x})"), Err(Error::Conversion { .. })));
    assert!(matches!(eval.evaluate("range({x}, 3)"), Err(Error::Conversion { .. })));
}

#[test]
fn check_binds_calls_without_running_them() {
    let eval = eval();
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = runs.clone();
    eval.register(
        Function::builder("tick", TypeTag::Number)
            .parameter("n", TypeTag::Number)
            .build(move |args, _ctx| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(vec![Value::Number(args.number("tick", "n")?)])
            }),
    );

    eval.check("tick(floor(tick(n: 2)))").unwrap();
    assert_eq!(runs.load(Ordering::SeqCst), 0);

    assert!(matches!(
        eval.check("tick(x: 1)"),
        Err(Error::Call { source: BindError::UnknownParameter(_), .. })
    ));
    match eval.check("tick(missing(1))") {
        Err(Error::Call { callee, source: BindError::UnknownCallee { name, .. } }) => {
            assert_eq!(callee, "missing");
            assert_eq!(name, "missing");
        }
        other => panic!("expected unknown callee, got {:?}", other),
    }
    match eval.check("(1, floor(length(1, 2)))") {
        Err(Error::Call { callee, source }) => {
            assert_eq!(callee, "length");
            assert_eq!(source, BindError::TooManyArguments);
        }
        other => panic!("expected too many arguments, got {:?}", other),
    }

    assert_eq!(eval.check_script("# header\ntick(1)\n\nfloor(2)\n").unwrap(), 2);
    assert!(matches!(
        eval.check_script("tick(1)\ntick(\"a\" \"b\")"),
        Err(Error::Call { source: BindError::UnparsableExpression(_), .. })
    ));
    assert_eq!(runs.load(Ordering::SeqCst), 0);
}

#[test]
fn callee_registered_after_parse_resolves_on_next_execution() {
    let eval = eval();
    let expression = eval.parser().parse("later(2)", TypeTag::Number).unwrap();

    match expression.evaluate(eval.context()) {
        Err(Error::Call {
            source: BindError::UnknownCallee { name, .. },
            ..
        }) => assert_eq!(name, "later"),
        other => panic!("expected unknown callee, got {:?}", other),
    }

    eval.register(
        Function::builder("later", TypeTag::Number)
            .parameter("n", TypeTag::Number)
            .build(|args, _ctx| Ok(vec![Value::Number(args.number("later", "n")? * 10.0)])),
    );
    assert_eq!(expression.evaluate(eval.context()).unwrap(), numbers(&[20.0]));
}

#[test]
fn return_arity_follows_signature() {
    let eval = eval();
    eval.register(
        Function::builder("first", TypeTag::Number)
            .list_parameter("xs", TypeTag::Number)
            .build(|args, _ctx| Ok(args.get("xs").to_vec())),
    );
    eval.register(
        Function::builder("all", TypeTag::Number)
            .list_parameter("xs", TypeTag::Number)
            .returns_list()
            .build(|args, _ctx| Ok(args.get("xs").to_vec())),
    );
    eval.register(
        Function::builder("nothing", TypeTag::Any)
            .no_return()
            .build(|_args, _ctx| Ok(vec![Value::Number(1.0)])),
    );

    let parser = eval.parser();
    let ctx = eval.context();
    let run = |text: &str| CallReference::parse("", text, "(4, 5)").execute(ctx, parser).unwrap();
    assert_eq!(run("first"), Some(Returned::Single(Value::Number(4.0))));
    assert_eq!(run("all"), Some(Returned::List(numbers(&[4.0, 5.0]))));
    assert_eq!(
        CallReference::parse("", "first", "()").execute(ctx, parser).unwrap(),
        None
    );
    assert_eq!(
        CallReference::parse("", "nothing", "").execute(ctx, parser).unwrap(),
        None
    );
}

#[test]
fn sequential_invocations_do_not_leak_results() {
    let eval = eval();
    eval.register(
        Function::builder("echo", TypeTag::Number)
            .optional_parameter("x", TypeTag::Number)
            .build(|args, _ctx| Ok(args.get("x").to_vec())),
    );
    assert_eq!(eval.evaluate("echo(5)").unwrap(), numbers(&[5.0]));
    assert_eq!(eval.evaluate("echo()").unwrap(), Vec::<Value>::new());
    assert_eq!(eval.evaluate("echo(x: 7)").unwrap(), numbers(&[7.0]));
}

#[test]
fn recursive_call_site_keeps_each_frame_separate() {
    let eval = eval();
    register_sum_to(eval.registry());
    assert_eq!(eval.evaluate("sum_to(5)").unwrap(), numbers(&[15.0]));
    // The shared call site is already bound; a second run must start fresh.
    assert_eq!(eval.evaluate("sum_to(3)").unwrap(), numbers(&[6.0]));
}

#[test]
fn runaway_recursion_hits_the_depth_limit() {
    let eval = standard(Config {
        max_depth: 6,
        ..Config::default()
    });
    register_sum_to(eval.registry());
    assert!(matches!(
        eval.evaluate("sum_to(50)"),
        Err(Error::RecursionLimit(6))
    ));
}

#[test]
fn each_invocation_gets_a_fresh_context() {
    let mut eval = eval();
    eval.set_var("secret", vec![Value::from("caller")]);
    eval.register(
        Function::builder("peek", TypeTag::Number)
            .build(|_args, ctx| Ok(vec![Value::Number(ctx.var("secret").len() as f64)])),
    );
    assert_eq!(eval.evaluate("peek()").unwrap(), numbers(&[0.0]));
}

#[test]
fn call_site_shared_across_threads() {
    let registry = Arc::new(Registry::new());
    argbind::functions::register_all(&registry);
    let invocations = Arc::new(AtomicUsize::new(0));
    let counter = invocations.clone();
    registry.register(
        Function::builder("size", TypeTag::Number)
            .parameter("text", TypeTag::Text)
            .build(move |args, _ctx| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(vec![Value::Number(args.text("size", "text")?.len() as f64)])
            }),
    );

    let call = CallReference::parse("", "size", "{word}");
    let parser = Parser::new(registry.clone(), "");
    thread::scope(|s| {
        for i in 0..8 {
            let (call, parser, registry) = (&call, &parser, &registry);
            s.spawn(move || {
                let mut ctx = Context::new(registry.clone(), 16);
                ctx.set_var("word", vec![Value::Text("x".repeat(i))]);
                assert_eq!(
                    call.execute(&ctx, parser).unwrap(),
                    Some(Returned::Single(Value::Number(i as f64)))
                );
            });
        }
    });
    assert_eq!(invocations.load(Ordering::SeqCst), 8);
    assert!(call.is_resolved());
}

#[test]
fn run_script_prints_one_line_per_expression() {
    let eval = eval();
    let script = r#"
# comments and blank lines are skipped

range(1, 3)
join(("a", "b"), ", ")
strpos("hello", "z")
"#;
    assert_eq!(
        eval.run_script(script).unwrap(),
        vec!["1, 2, 3".to_string(), "a, b".to_string(), "-1".to_string()]
    );
}

#[test]
fn run_script_reports_line_of_parse_error() {
    let eval = eval();
    match eval.run_script("floor(1)\nnot an expression") {
        Err(Error::Parse(msg)) => assert!(msg.starts_with("line 2:"), "{}", msg),
        other => panic!("expected parse error, got {:?}", other),
    }
}

#[test]
fn random_respects_bounds() {
    let eval = eval();
    for _ in 0..20 {
        let value = eval.evaluate("random(min: 1, max: 6)").unwrap()[0]
            .as_number()
            .unwrap();
        assert!((1.0..=6.0).contains(&value));
    }
    assert!(matches!(
        eval.evaluate("random(1, 6)"),
        Err(Error::Runtime(_))
    ));
}
