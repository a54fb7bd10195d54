/// Evaluator settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Deepest allowed chain of nested invocations.
    pub max_depth: usize,
    /// Namespace call sites resolve in before falling back to the global one.
    pub namespace: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: 256,
            namespace: String::new(),
        }
    }
}
