//! Output formatting helpers for the CLI.
//!
//! JSON for scripting, tables or plain lines for people.

mod json;
mod text;

pub use json::{entries_json, entry_json, summaries_json};
pub use text::{print_active_map, print_entries, print_summaries};
