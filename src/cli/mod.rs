//! CLI module for the user directory
//!
//! Subcommands:
//! - `serve`: run the directory API server
//! - `migrate`: apply or revert the database schema, separate from serving

pub mod migrate;
pub mod serve;

use clap::{Parser, Subcommand};

/// User Directory - validated, de-duplicated registry of user identities
#[derive(Parser)]
#[command(name = "user-directory")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the API server
    Serve,

    /// Apply the database schema migrations
    Migrate(migrate::MigrateArgs),
}
