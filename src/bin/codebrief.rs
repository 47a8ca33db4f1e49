//! Codebrief CLI - Summarize a full-stack source tree.

use std::path::PathBuf;

use clap::{ArgAction, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use codebrief::builder::Digest;
use codebrief::errors::{exit_code, DigestError};
use codebrief::report::Report;
use codebrief::tokens::{Encoding, TokenEstimate};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "codebrief")]
#[command(about = "Summarize a full-stack codebase into a report and per-role code listings")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Root directory to summarize
    #[arg(long, default_value = ".")]
    path: PathBuf,

    /// Only report directories up to this depth below the root
    #[arg(long)]
    depth: Option<usize>,

    /// Additional directory names to exclude
    #[arg(long, num_args = 0..)]
    exclude_dirs: Vec<String>,

    /// File names to exclude
    #[arg(long, num_args = 0..)]
    exclude_files: Vec<String>,

    /// Directory names marking frontend code (replaces the defaults)
    #[arg(long, num_args = 0..)]
    frontend_dirs: Vec<String>,

    /// Directory names marking backend code (replaces the defaults)
    #[arg(long, num_args = 0..)]
    backend_dirs: Vec<String>,

    /// Match .gitignore lines as plain substrings instead of globs
    #[arg(long)]
    literal_ignore: bool,

    /// Print the report without copying it to the clipboard
    #[arg(long)]
    no_clipboard: bool,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Print a token estimate of the report and listings to stderr
    #[arg(long)]
    tokens: bool,

    /// Token encoding for --tokens
    #[arg(long, default_value = "cl100k")]
    encoding: EncodingArg,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Clone, ValueEnum)]
enum EncodingArg {
    Cl100k,
    O200k,
}

impl From<EncodingArg> for Encoding {
    fn from(arg: EncodingArg) -> Self {
        match arg {
            EncodingArg::Cl100k => Encoding::Cl100kBase,
            EncodingArg::O200k => Encoding::O200kBase,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    if let Some(Commands::Completions { shell }) = &cli.command {
        generate(*shell, &mut Cli::command(), "codebrief", &mut std::io::stdout());
        return;
    }

    init_logging(cli.verbose);
    let json_output = cli.json;

    if let Err(e) = run(cli) {
        if json_output {
            #[derive(Serialize)]
            struct ErrorOutput {
                error: String,
            }

            let payload = ErrorOutput {
                error: e.to_string(),
            };

            let json = serde_json::to_string(&payload)
                .unwrap_or_else(|_| "{\"error\":\"serialization failed\"}".to_string());
            eprintln!("{json}");
        } else {
            eprintln!("error: {}", e);
        }
        std::process::exit(exit_code(&e));
    }
}

/// Install the stderr log subscriber. `RUST_LOG` wins over `-v`.
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<(), DigestError> {
    let mut digest = Digest::new(&cli.path)
        .exclude_dirs(cli.exclude_dirs)
        .exclude_files(cli.exclude_files)
        .frontend_dirs(cli.frontend_dirs)
        .backend_dirs(cli.backend_dirs)
        .literal_ignore(cli.literal_ignore);
    if let Some(depth) = cli.depth {
        digest = digest.max_depth(depth);
    }

    let report = digest.run()?;

    if cli.tokens {
        let estimate = TokenEstimate::for_report(&report, cli.encoding.into());
        eprint!("{}", estimate.render());
    }

    if cli.json {
        println!("{}", report.to_json()?);
        return Ok(());
    }

    for artifact in &report.artifacts {
        println!("Generated {}", artifact.display());
    }

    if cli.no_clipboard {
        println!("{}", report.text);
    } else {
        deliver_via_clipboard(&report);
    }

    Ok(())
}

/// Copy the report to the clipboard, echoing it either way.
fn deliver_via_clipboard(report: &Report) {
    match copy_to_clipboard(&report.text) {
        Ok(()) => {
            println!("Summary copied to clipboard!");
            println!("{}", report.text);
        }
        Err(err) => {
            tracing::warn!(%err, "clipboard unavailable");
            println!("Clipboard functionality unavailable. Output:\n");
            println!("{}", report.text);
        }
    }
}

fn copy_to_clipboard(text: &str) -> Result<(), arboard::Error> {
    let mut clipboard = arboard::Clipboard::new()?;
    clipboard.set_text(text.to_string())
}
