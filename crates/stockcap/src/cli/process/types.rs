//! CLI enum types for the process command.

use clap::ValueEnum;
use stockcap_core::OutputFormat as CoreOutputFormat;

/// Formats for the optional per-image records file.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum RecordsFormat {
    /// Single JSON array
    #[default]
    Json,
    /// One JSON object per line (newline-delimited)
    Jsonl,
}

impl From<RecordsFormat> for CoreOutputFormat {
    fn from(format: RecordsFormat) -> Self {
        match format {
            RecordsFormat::Json => CoreOutputFormat::Json,
            RecordsFormat::Jsonl => CoreOutputFormat::JsonLines,
        }
    }
}

impl std::fmt::Display for RecordsFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordsFormat::Json => write!(f, "json"),
            RecordsFormat::Jsonl => write!(f, "jsonl"),
        }
    }
}
