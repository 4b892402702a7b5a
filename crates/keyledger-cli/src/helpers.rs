//! Input and parsing helpers for the CLI.

use std::io::{self, IsTerminal, Read};

/// Output format for list-style commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Plain,
}

/// Parse the `--format` flag; defaults to a table on a terminal.
pub fn parse_output_format(value: Option<&str>) -> anyhow::Result<OutputFormat> {
    match value {
        None => Ok(if io::stdout().is_terminal() {
            OutputFormat::Table
        } else {
            OutputFormat::Plain
        }),
        Some("table") => Ok(OutputFormat::Table),
        Some("plain") => Ok(OutputFormat::Plain),
        Some(other) => Err(anyhow::anyhow!(
            "Invalid format: {} (use table or plain)",
            other
        )),
    }
}

/// Read a JSON document from a file, or stdin for `None` / `"-"`.
pub fn read_document(file: Option<&str>) -> anyhow::Result<String> {
    match file {
        Some(path) if path != "-" => std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path, e)),
        _ => {
            let stdin = io::stdin();
            if stdin.is_terminal() {
                return Err(anyhow::anyhow!(
                    "No input file given and stdin is a terminal.\nHint: Pass a FILE or pipe JSON into `keyledger import`."
                ));
            }
            let mut buffer = String::new();
            stdin.lock().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}

/// Display form of a nullable value.
pub fn display_value(value: Option<&str>) -> &str {
    value.unwrap_or("<null>")
}
