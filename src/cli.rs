use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Answer inventory queries from a live spreadsheet",
    long_about = None
)]
pub struct Cli {
    #[command(flatten)]
    pub source: SourceArgs,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the chat bot until the process is stopped
    Serve,
    /// List the distinct product categories
    Categories,
    /// Print the per-location model counts for one category
    Report(ReportArgs),
    /// Check whether a username is registered
    CheckUser(CheckUserArgs),
}

#[derive(Debug, Args)]
pub struct SourceArgs {
    /// YAML configuration file (defaults apply when omitted)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
    /// Read the inventory from a local CSV export instead of the spreadsheet
    #[arg(long, global = true)]
    pub csv: Option<PathBuf>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, global = true, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the CSV file (defaults to utf-8)
    #[arg(long = "input-encoding", global = true)]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Category to report on (case and surrounding whitespace are ignored)
    #[arg(long)]
    pub category: String,
    /// Print an aligned table instead of the chat message text
    #[arg(long)]
    pub table: bool,
}

#[derive(Debug, Args)]
pub struct CheckUserArgs {
    /// Username exactly as stored in the Username column
    pub username: String,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
