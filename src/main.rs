use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use argbind::{Config, TypeTag, Value};
use clap::Parser;
use tracing::{debug, info};

/// Evaluate one call expression per line and print each result.
#[derive(Debug, Parser)]
#[command(name = "argbind", version)]
struct Cli {
    /// Script to run; read from stdin when omitted.
    file: Option<PathBuf>,

    /// Namespace call sites resolve in before the global one.
    #[arg(long, default_value = "")]
    namespace: String,

    /// Deepest allowed chain of nested calls.
    #[arg(long, default_value_t = 256)]
    max_depth: usize,

    /// Pre-set a variable: `--var name=value` infers number, boolean or text;
    /// `--var name:type=value` converts to the named type.
    #[arg(long = "var", value_name = "NAME[:TYPE]=VALUE", value_parser = parse_var)]
    vars: Vec<(String, Value)>,

    /// Resolve and bind every call without running anything.
    #[arg(long)]
    check: bool,

    /// More logging (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors.
    #[arg(short, long)]
    quiet: bool,
}

fn parse_var(s: &str) -> Result<(String, Value), String> {
    let (target, raw) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", s))?;
    let (name, value) = match target.split_once(':') {
        Some((name, ty)) => {
            let ty = TypeTag::from_name(ty).ok_or_else(|| format!("unknown type '{}'", ty))?;
            let value = Value::from(raw)
                .convert(ty)
                .ok_or_else(|| format!("'{}' is not a {}", raw, ty))?;
            (name, value)
        }
        None => (target, Value::infer(raw)),
    };
    if name.is_empty() {
        return Err("variable name is empty".to_string());
    }
    Ok((name.to_string(), value))
}

fn setup_logging(verbose: u8, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn read_source(file: Option<&PathBuf>) -> argbind::Result<String> {
    match file {
        Some(path) => Ok(fs::read_to_string(path)?),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

fn run(cli: Cli) -> argbind::Result<()> {
    let source = read_source(cli.file.as_ref())?;

    let mut eval = argbind::standard(Config {
        max_depth: cli.max_depth,
        namespace: cli.namespace,
    });
    for (name, value) in cli.vars {
        debug!(%name, %value, "preset variable");
        eval.set_var(&name, vec![value]);
    }

    if cli.check {
        let checked = eval.check_script(&source)?;
        info!(checked, "all calls bind");
        return Ok(());
    }

    for line in eval.run_script(&source)? {
        println!("{}", line);
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    if let Err(e) = run(cli) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
