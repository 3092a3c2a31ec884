//! CLI module
//!
//! Provides subcommands for running the service:
//! - `serve`: HTTP server (default mode)
//! - `query`: one-shot search from the command line

pub mod query;
pub mod serve;

use clap::{Parser, Subcommand};

/// Semantic search gateway - cached query orchestration over embedded collections
#[derive(Parser)]
#[command(name = "semsearch-gateway")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP server
    Serve,

    /// Run a single query and print the result as JSON
    Query(query::QueryArgs),
}
