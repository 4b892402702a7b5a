use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use keyledger_core::VERSION;

/// Keyledger - versioned key/value ledgers for runtime configuration
#[derive(Parser)]
#[command(name = "keyledger")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the ledger database
    #[arg(short, long, global = true, env = "KEYLEDGER_DB")]
    pub db: Option<String>,

    #[command(subcommand)]
    pub command: Commands,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the database and write a config file
    Init(InitArgs),

    /// Set one key, creating the ledger if needed
    Set(SetArgs),

    /// Apply a JSON document of key/value pairs
    Import(ImportArgs),

    /// Print the active entries of a ledger as JSON
    Export(ExportArgs),

    /// Show active values
    Get(GetArgs),

    /// Show every version of a key
    History(HistoryArgs),

    /// Count active entries (-1 if the ledger does not exist)
    Size {
        /// Ledger name
        #[arg(value_name = "LEDGER")]
        ledger: String,
    },

    /// Check whether an active key or value exists
    Contains(ContainsArgs),

    /// Hard-delete entries for keys
    Delete(DeleteArgs),

    /// Hard-delete every entry whose value is null
    PurgeNulls {
        /// Ledger name
        #[arg(value_name = "LEDGER")]
        ledger: String,
    },

    /// Hard-delete every entry, keeping the ledger
    Purge {
        /// Ledger name
        #[arg(value_name = "LEDGER")]
        ledger: String,
    },

    /// Delete a ledger and all its entries
    Drop {
        /// Ledger name
        #[arg(value_name = "LEDGER")]
        ledger: String,
    },

    /// List ledgers
    List(ListArgs),

    /// Check database integrity
    Check,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_name = "SHELL")]
        shell: Shell,
    },
}

/// Arguments for the `init` command
#[derive(Args)]
pub struct InitArgs {
    /// Path where the database will be created
    #[arg(value_name = "PATH")]
    pub path: Option<String>,

    /// Config path override
    #[arg(long)]
    pub config_path: Option<String>,

    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `set` command
#[derive(Args)]
pub struct SetArgs {
    /// Ledger name
    #[arg(value_name = "LEDGER")]
    pub ledger: String,

    /// Entry key
    #[arg(value_name = "KEY")]
    pub key: String,

    /// Entry value
    #[arg(value_name = "VALUE", required_unless_present = "null")]
    pub value: Option<String>,

    /// Store a null value
    #[arg(long, conflicts_with = "value")]
    pub null: bool,

    /// Describe the key's purpose
    #[arg(long)]
    pub description: Option<String>,

    /// External change/audit identifier
    #[arg(long)]
    pub change_id: Option<String>,

    /// Set or replace the ledger description
    #[arg(long)]
    pub ledger_description: Option<String>,

    /// Output the new entry as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `import` command
#[derive(Args)]
pub struct ImportArgs {
    /// Ledger name
    #[arg(value_name = "LEDGER")]
    pub ledger: String,

    /// JSON file to read ("-" or omitted for stdin)
    #[arg(value_name = "FILE")]
    pub file: Option<String>,

    /// Set or replace the ledger description
    #[arg(long)]
    pub ledger_description: Option<String>,
}

/// Arguments for the `export` command
#[derive(Args)]
pub struct ExportArgs {
    /// Ledger name
    #[arg(value_name = "LEDGER")]
    pub ledger: String,

    /// Pretty-print the JSON
    #[arg(long)]
    pub pretty: bool,

    /// Compact JSON even if the config asks for pretty output
    #[arg(long, conflicts_with = "pretty")]
    pub compact: bool,
}

/// Arguments for the `get` command
#[derive(Args)]
pub struct GetArgs {
    /// Ledger name
    #[arg(value_name = "LEDGER")]
    pub ledger: String,

    /// Only show this key
    #[arg(value_name = "KEY")]
    pub key: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Output format (table, plain)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<String>,
}

/// Arguments for the `history` command
#[derive(Args)]
pub struct HistoryArgs {
    /// Ledger name
    #[arg(value_name = "LEDGER")]
    pub ledger: String,

    /// Entry key
    #[arg(value_name = "KEY")]
    pub key: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Output format (table, plain)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<String>,
}

/// Arguments for the `contains` command
#[derive(Args)]
pub struct ContainsArgs {
    /// Ledger name
    #[arg(value_name = "LEDGER")]
    pub ledger: String,

    /// Active key to look for
    #[arg(long, required_unless_present_any = ["value", "null_value"])]
    pub key: Option<String>,

    /// Active value to look for
    #[arg(long, conflicts_with_all = ["key", "null_value"])]
    pub value: Option<String>,

    /// Look for an active null value
    #[arg(long, conflicts_with = "key")]
    pub null_value: bool,
}

/// Arguments for the `delete` command
#[derive(Args)]
pub struct DeleteArgs {
    /// Ledger name
    #[arg(value_name = "LEDGER")]
    pub ledger: String,

    /// Keys to delete
    #[arg(value_name = "KEY", required = true)]
    pub keys: Vec<String>,

    /// Delete every version, not just the active entry
    #[arg(long)]
    pub all_versions: bool,
}

/// Arguments for the `list` command
#[derive(Args)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Output format (table, plain)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<String>,
}
