// Credvault — CLI Module
//
// Command-line interface using clap derive macros.
// Subcommands: user, list, get, create, update, delete.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::execute;

/// Credvault — a local credential vault with field-level encryption.
#[derive(Parser, Debug)]
#[command(name = "credvault")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the vault database (overrides CREDVAULT_DB).
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Field encryption key, 16, 24 or 32 bytes (overrides CREDVAULT_KEY).
    /// Prefer the environment variable to keep the key out of shell history.
    #[arg(long, global = true)]
    pub key: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage vault users.
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// List the records a user owns (sensitive fields stay encrypted).
    List {
        /// Name of the owning user.
        #[arg(long)]
        user: String,
    },

    /// Show one record with its sensitive fields decrypted.
    Get {
        /// The UUID of the record.
        id: String,

        /// Name of the calling user.
        #[arg(long)]
        user: String,
    },

    /// Create a record from a JSON form.
    Create {
        /// Record type: secure_note, login, card or identity.
        #[arg(value_name = "TYPE")]
        kind: String,

        /// Name of the owning user.
        #[arg(long)]
        user: String,

        /// JSON object with the record fields, e.g. '{"name":"github","username":"me"}'.
        #[arg(long)]
        form: String,
    },

    /// Apply a partial JSON form to an existing record.
    Update {
        /// The UUID of the record.
        id: String,

        /// Name of the calling user.
        #[arg(long)]
        user: String,

        /// JSON object with only the fields to change.
        #[arg(long)]
        form: String,
    },

    /// Delete a record.
    Delete {
        /// The UUID of the record.
        id: String,

        /// Name of the calling user.
        #[arg(long)]
        user: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum UserAction {
    /// Register a new user.
    Add { name: String },

    /// Show a registered user.
    Show { name: String },
}
