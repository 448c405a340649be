//! CLI command definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use toolwarden_infrastructure::ProviderKind;

/// CLI arguments for toolwarden
#[derive(Parser, Debug)]
#[command(name = "toolwarden")]
#[command(author, version, about = "Supervise model tool calls before they run")]
#[command(long_about = r#"
toolwarden runs every tool call a model requests through chains of
supervisors. Rejected calls are sent back to the model with feedback.

Configuration files are loaded from (in priority order):
1. TOOLWARDEN_* environment variables
2. --config <path>          Explicit config file
3. ./toolwarden.toml        Project-level config
4. ~/.config/toolwarden/config.toml   Global config

Example:
  toolwarden config
  toolwarden review --response reply.json --deny delete_file --allow get_weather
  toolwarden -vv review --response reply.json --request request.json --provider anthropic
"#)]
pub struct Cli {
    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Write diagnostic logs to this file instead of stderr
    #[arg(long, value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show configuration sources and the effective settings
    Config,

    /// Supervise a recorded model response and print the final response
    Review(ReviewArgs),
}

#[derive(clap::Args, Debug)]
pub struct ReviewArgs {
    /// Provider-native response JSON
    #[arg(long, value_name = "FILE")]
    pub response: PathBuf,

    /// Request payload that produced the response (messages + params)
    #[arg(long, value_name = "FILE")]
    pub request: Option<PathBuf>,

    /// Wire format of the response (defaults to [provider] kind)
    #[arg(long, value_name = "PROVIDER")]
    pub provider: Option<ProviderKind>,

    /// Tool supervised by an approve-everything chain (repeatable)
    #[arg(long, value_name = "TOOL")]
    pub allow: Vec<String>,

    /// Tool supervised by a reject-everything chain (repeatable)
    #[arg(long, value_name = "TOOL")]
    pub deny: Vec<String>,
}
