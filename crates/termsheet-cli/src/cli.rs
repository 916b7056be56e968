//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "termsheet",
    version,
    about = "Term sheet form engine harness",
    long_about = "Inspect the term sheet form schema, validate saved values and replay\n\
                  scripted edit sessions against a virtual clock."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format.
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Include field values in log output.
    #[arg(long = "log-values", global = true)]
    pub log_values: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// List the fields and rules of the form schema.
    Schema(SchemaArgs),

    /// Validate a values file or a saved draft.
    Check(CheckArgs),

    /// Replay an edit script and print every event it causes.
    Replay(ReplayArgs),
}

#[derive(Args)]
pub struct FormArgs {
    /// Form schema file (default: the built-in term sheet).
    #[arg(long = "schema", value_name = "PATH")]
    pub schema: Option<PathBuf>,

    /// Engine configuration file (TOML).
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct SchemaArgs {
    #[command(flatten)]
    pub form: FormArgs,
}

#[derive(Args)]
pub struct CheckArgs {
    /// JSON object of field values, or a draft file.
    #[arg(value_name = "VALUES")]
    pub values: PathBuf,

    #[command(flatten)]
    pub form: FormArgs,
}

#[derive(Args)]
pub struct ReplayArgs {
    /// Edit script (TOML).
    #[arg(value_name = "SCRIPT")]
    pub script: PathBuf,

    /// Write the generated document here when the script generates one.
    #[arg(long = "document-out", value_name = "PATH")]
    pub document_out: Option<PathBuf>,

    #[command(flatten)]
    pub form: FormArgs,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
