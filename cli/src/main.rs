use std::{
    env,
    io::{self, IsTerminal},
    path::PathBuf,
    process,
};

use anyhow::Context;
use clap::{error::ErrorKind, ArgAction, CommandFactory, Parser, ValueEnum};
use console::style;
use tracing_subscriber::EnvFilter;
use wpcc_ast_core::{collect_php_files, run_scan, Rule, RuleConfig, TextOptions};

/// WPCC AST check entry point.
#[derive(Debug, Parser)]
#[command(
    name = "wpcc-ast-check",
    version,
    about = "Static analysis for PHP code using AST inspection.",
    after_help = "Example:\n  wpcc-ast-check --paths ./includes --rule return-array-shape"
)]
struct Args {
    /// Comma-separated list of files or directories to scan (required).
    #[arg(long, value_delimiter = ',', value_name = "PATH[,PATH]")]
    paths: Vec<String>,

    /// Rule to apply.
    #[arg(long, default_value = "return-array-shape", value_parser = parse_rule)]
    rule: Rule,

    /// Path to a JSON (or YAML) config file with rule settings.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    output: OutputFormat,

    /// Increase log verbosity on stderr (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

fn parse_rule(value: &str) -> Result<Rule, String> {
    value.parse()
}

fn main() -> anyhow::Result<()> {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            err.print()?;
            process::exit(code);
        }
    };
    init_tracing(args.verbose);

    let paths: Vec<String> = args
        .paths
        .iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();
    if paths.is_empty() {
        Args::command().print_help()?;
        println!();
        process::exit(1);
    }

    let set = collect_php_files(&paths);
    for missing in &set.missing {
        eprintln!(
            "{} Path not found: {}",
            style("Warning:").yellow().for_stderr(),
            missing.display()
        );
    }
    if set.files.is_empty() {
        eprintln!("{} No PHP files found to scan.", style("Error:").red().for_stderr());
        process::exit(1);
    }

    let config = RuleConfig::load(args.config.as_deref());
    let report = run_scan(args.rule, &set.files, &config).context("Failed to run AST scan")?;

    match args.output {
        OutputFormat::Json => {
            let json = report.to_json().context("Failed to serialize report")?;
            println!("{json}");
        }
        OutputFormat::Text => {
            let options = TextOptions {
                color: io::stdout().is_terminal() && env::var_os("NO_COLOR").is_none(),
                base_dir: env::current_dir().ok(),
            };
            print!("{}", report.render_text(&options));
        }
    }

    process::exit(report.exit_code());
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(io::stderr().is_terminal())
        .with_writer(io::stderr)
        .init();
}
