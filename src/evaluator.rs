use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::expr::Expression;
use crate::functions::Function;
use crate::parser::{ExpressionParser, Parser};
use crate::value::{TypeTag, Value};

// ---------------------------------------------------------------------------
// Callee registry
// ---------------------------------------------------------------------------

/// Maps `(namespace, name)` to a callee.
///
/// Shared between every context and call site of one evaluator.  Functions may
/// be registered after call sites naming them were parsed; those call sites
/// resolve on their next execution.
#[derive(Default)]
pub struct Registry {
    functions: RwLock<HashMap<(String, String), Arc<Function>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function under its signature's namespace, replacing any
    /// function of the same name there.
    pub fn register(&self, function: Function) -> Arc<Function> {
        let key = (
            function.signature().namespace.clone(),
            function.signature().name.clone(),
        );
        let function = Arc::new(function);
        if self.functions.write().insert(key, function.clone()).is_some() {
            debug!(name = function.name(), "replaced registered function");
        }
        function
    }

    /// Look a function up in `namespace`, then in the global namespace.
    pub fn lookup(&self, name: &str, namespace: &str) -> Option<Arc<Function>> {
        let functions = self.functions.read();
        functions
            .get(&(namespace.to_string(), name.to_string()))
            .or_else(|| functions.get(&(String::new(), name.to_string())))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.functions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.read().is_empty()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let functions = self.functions.read();
        let mut names: Vec<String> = functions
            .keys()
            .map(|(ns, name)| if ns.is_empty() { name.clone() } else { format!("{}::{}", ns, name) })
            .collect();
        names.sort();
        f.debug_struct("Registry").field("functions", &names).finish()
    }
}

// ---------------------------------------------------------------------------
// Execution context
// ---------------------------------------------------------------------------

/// The state one expression is evaluated in: a variable scope plus the
/// registry that calls resolve against.
#[derive(Debug, Clone)]
pub struct Context {
    registry: Arc<Registry>,
    variables: HashMap<String, Vec<Value>>,
    depth: usize,
    max_depth: usize,
}

impl Context {
    pub fn new(registry: Arc<Registry>, max_depth: usize) -> Self {
        Self {
            registry,
            variables: HashMap::new(),
            depth: 0,
            max_depth,
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Number of calls between this context and the top level.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// A fresh context for one invocation: same registry, empty scope.
    pub fn child(&self) -> Result<Context> {
        let depth = self.depth + 1;
        if depth > self.max_depth {
            return Err(Error::RecursionLimit(self.max_depth));
        }
        Ok(Context {
            registry: self.registry.clone(),
            variables: HashMap::new(),
            depth,
            max_depth: self.max_depth,
        })
    }

    pub fn set_var(&mut self, name: &str, values: Vec<Value>) {
        self.variables.insert(name.to_string(), values);
    }

    /// Values of a variable; empty when it is not set.
    pub fn var(&self, name: &str) -> &[Value] {
        self.variables.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Replace every `{name}` in `s` with the variable's values joined by a
    /// single space.  An unclosed `{` is kept literally.
    pub fn interpolate(&self, s: &str) -> String {
        let mut result = String::with_capacity(s.len());
        let mut chars = s.chars();

        while let Some(c) = chars.next() {
            if c != '{' {
                result.push(c);
                continue;
            }
            let mut var_name = String::new();
            let mut closed = false;
            let mut depth = 1usize;
            for ch in chars.by_ref() {
                match ch {
                    '{' => {
                        depth += 1;
                        var_name.push('{');
                    }
                    '}' => {
                        depth -= 1;
                        if depth == 0 {
                            closed = true;
                            break;
                        }
                        var_name.push('}');
                    }
                    _ => var_name.push(ch),
                }
            }
            if closed {
                // Nested references name the variable indirectly: {x{i}}.
                let name = if var_name.contains('{') {
                    self.interpolate(&var_name)
                } else {
                    var_name
                };
                let name = name.strip_suffix("::*").unwrap_or(&name);
                let parts: Vec<String> = self.var(name).iter().map(Value::to_string).collect();
                result.push_str(&parts.join(" "));
            } else {
                result.push('{');
                result.push_str(&var_name);
            }
        }

        result
    }
}

// ---------------------------------------------------------------------------
// Evaluator
// ---------------------------------------------------------------------------

/// The runtime environment: function registry, top-level variables and the
/// expression parser bound to the configured namespace.
pub struct Evaluator {
    registry: Arc<Registry>,
    context: Context,
    parser: Parser,
}

impl Evaluator {
    pub fn new(config: Config) -> Self {
        let registry = Arc::new(Registry::new());
        Self {
            context: Context::new(registry.clone(), config.max_depth),
            parser: Parser::new(registry.clone(), &config.namespace),
            registry,
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn register(&self, function: Function) -> Arc<Function> {
        self.registry.register(function)
    }

    pub fn parser(&self) -> &Parser {
        &self.parser
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn set_var(&mut self, name: &str, values: Vec<Value>) {
        self.context.set_var(name, values);
    }

    /// Parse and evaluate one expression in the top-level context.
    pub fn evaluate(&self, text: &str) -> Result<Vec<Value>> {
        self.parse(text)?.evaluate(&self.context)
    }

    /// Parse one expression and resolve and bind every call in it, without
    /// invoking anything.
    pub fn check(&self, text: &str) -> Result<()> {
        self.parse(text)?.validate(&self.registry)
    }

    /// Evaluate a script of one expression per line.
    ///
    /// Blank lines and lines starting with `#` are skipped.  Each evaluated
    /// line produces one output line: its values joined with `", "`.
    pub fn run_script(&self, source: &str) -> Result<Vec<String>> {
        script_lines(source)
            .map(|(lineno, line)| {
                let values = self.evaluate(line).map_err(|e| at_line(lineno, e))?;
                let parts: Vec<String> = values.iter().map(Value::to_string).collect();
                Ok(parts.join(", "))
            })
            .collect()
    }

    /// [`check`](Self::check) every line of a script; returns how many
    /// expressions were checked.
    pub fn check_script(&self, source: &str) -> Result<usize> {
        let mut checked = 0;
        for (lineno, line) in script_lines(source) {
            self.check(line).map_err(|e| at_line(lineno, e))?;
            checked += 1;
        }
        Ok(checked)
    }

    fn parse(&self, text: &str) -> Result<Arc<dyn Expression>> {
        self.parser
            .parse(text, TypeTag::Any)
            .map_err(|failure| Error::Parse(format!("{}: {}", failure, text.trim())))
    }
}

/// Non-blank, non-comment lines with their 1-based numbers.
fn script_lines(source: &str) -> impl Iterator<Item = (usize, &str)> {
    source
        .lines()
        .enumerate()
        .map(|(i, raw)| (i + 1, raw.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
}

fn at_line(lineno: usize, e: Error) -> Error {
    match e {
        Error::Parse(msg) => Error::Parse(format!("line {}: {}", lineno, msg)),
        other => other,
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
