use tracing::trace;

use crate::ast::{ArgumentKind, RawArgument};

/// Where the scanner is inside the current argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Still reading a leading identifier run that may turn out to be a name.
    ScanningName,
    /// The argument has no name; everything belongs to the expression.
    ScanningPositionalExpr,
    /// A `name:` prefix was consumed; the rest is the expression.
    ScanningNamedExpr,
}

impl State {
    fn kind(self) -> ArgumentKind {
        match self {
            State::ScanningNamedExpr => ArgumentKind::Named,
            _ => ArgumentKind::Positional,
        }
    }
}

struct Scanner {
    state: State,
    /// Open brackets, braces and quotes.  Signed so unbalanced closers never underflow.
    nesting: i32,
    in_string: bool,
    name: String,
    expr: String,
    arguments: Vec<RawArgument>,
}

impl Scanner {
    fn new() -> Self {
        Self {
            state: State::ScanningName,
            nesting: 0,
            in_string: false,
            name: String::new(),
            expr: String::new(),
            arguments: Vec::new(),
        }
    }

    /// Handle quotes, brackets and top-level commas.
    /// Returns `false` when `c` is an ordinary character.
    fn structural(&mut self, c: char) -> bool {
        match c {
            '"' => {
                if self.in_string {
                    self.nesting -= 1;
                } else {
                    self.nesting += 1;
                }
                self.in_string = !self.in_string;
                self.expr.push(c);
            }
            '(' | '{' => {
                self.nesting += 1;
                self.expr.push(c);
            }
            ')' | '}' => {
                self.nesting -= 1;
                self.expr.push(c);
            }
            ',' if self.nesting == 0 && !self.in_string => self.emit(),
            _ => return false,
        }
        true
    }

    fn step(&mut self, c: char) {
        if self.state == State::ScanningName {
            if c == '_' || c.is_alphanumeric() {
                self.name.push(c);
                self.expr.push(c);
                return;
            }
            // Leading whitespace is trimmed on emission, so it may precede a name.
            if c.is_whitespace() && self.name.is_empty() {
                self.expr.push(c);
                return;
            }
            if c == ':' && self.nesting == 0 && !self.name.is_empty() {
                self.expr.clear();
                self.state = State::ScanningNamedExpr;
                return;
            }
            // Anything else decides it: the run so far starts a positional expression.
            self.name.clear();
            self.state = State::ScanningPositionalExpr;
        }

        if !self.structural(c) {
            self.expr.push(c);
        }
    }

    fn emit(&mut self) {
        let kind = self.state.kind();
        let name = match kind {
            ArgumentKind::Named => Some(self.name.trim().to_string()),
            ArgumentKind::Positional => None,
        };
        self.arguments.push(RawArgument {
            kind,
            name,
            text: self.expr.trim().to_string(),
        });
        self.name.clear();
        self.expr.clear();
        self.state = State::ScanningName;
    }
}

/// Split a raw argument-list string into its arguments.
///
/// Commas split only outside quotes and brackets; a leading identifier run
/// followed by a top-level `:` names the argument.  Never fails: unbalanced
/// quotes or brackets give a best-effort split and surface later when the
/// argument text is parsed.
pub fn tokenize(raw: &str) -> Vec<RawArgument> {
    if raw.is_empty() {
        return Vec::new();
    }

    let mut scanner = Scanner::new();
    for c in raw.chars() {
        scanner.step(c);
    }
    scanner.emit();

    trace!(input = raw, arguments = scanner.arguments.len(), "tokenized argument list");
    scanner.arguments
}
