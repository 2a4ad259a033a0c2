//! CLI command definitions for the `syard` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod chat;
pub mod health;
pub mod providers;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Route chat traffic across AI providers.
#[derive(Parser)]
#[command(name = "syard", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config.toml (defaults to $SWITCHYARD_CONFIG, then ~/.switchyard/config.toml).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Export tracing spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the provider catalog with rate-limit budgets.
    #[command(alias = "ls")]
    Providers {
        /// Only show active providers.
        #[arg(long)]
        active: bool,
    },

    /// Probe provider endpoints and report health.
    Health {
        /// Provider id to check (all providers when omitted).
        provider: Option<String>,
    },

    /// Start an interactive chat routed through the gateway.
    Chat {
        /// Provider id (defaults to the first active provider).
        #[arg(long, short)]
        provider: Option<String>,

        /// Model id (defaults to the provider's first model).
        #[arg(long, short)]
        model: Option<String>,
    },

    /// Start the REST API server.
    Serve {
        /// Port to listen on (defaults to server.port from config).
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (defaults to server.host from config).
        #[arg(long)]
        host: Option<String>,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
