use chrono::{DateTime, Utc};
use clap::ValueEnum;
use console::style;
use serde::Serialize;

use crate::error::{Result, StructuredError, SubstrateError};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable formatted output with colors (default)
    #[default]
    Human,
    /// Pretty-printed JSON
    Json,
    /// Newline-delimited JSON (one object per line)
    Jsonl,
    /// Plain text without colors or formatting
    Plain,
    /// Tab-separated values (for shell scripting)
    Tsv,
}

impl OutputFormat {
    /// Check if this format should use colors
    #[must_use]
    pub const fn use_colors(&self) -> bool {
        matches!(self, Self::Human)
    }

    /// Check if this format is machine-readable
    #[must_use]
    pub const fn is_machine_readable(&self) -> bool {
        matches!(self, Self::Json | Self::Jsonl | Self::Tsv)
    }
}

/// Envelope for error output in machine-readable modes.
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: bool,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    #[serde(flatten)]
    pub detail: StructuredError,
}

#[must_use]
pub fn error_response(err: &SubstrateError) -> ErrorResponse {
    ErrorResponse {
        error: true,
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        detail: err.to_structured(),
    }
}

pub fn emit_json<T: Serialize>(value: &T) -> Result<()> {
    let payload = serde_json::to_string_pretty(value)?;
    println!("{payload}");
    Ok(())
}

/// Emit a serializable value; `Jsonl` is compact, everything else pretty.
pub fn emit_machine<T: Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Jsonl {
        println!("{}", serde_json::to_string(value)?);
        Ok(())
    } else {
        emit_json(value)
    }
}

/// Emit TSV output with headers
pub fn emit_tsv<T, F>(headers: &[&str], items: &[T], row_fn: F)
where
    F: Fn(&T) -> Vec<String>,
{
    println!("{}", headers.join("\t"));
    for item in items {
        println!("{}", row_fn(item).join("\t"));
    }
}

pub struct HumanLayout {
    lines: Vec<String>,
    key_width: usize,
}

impl Default for HumanLayout {
    fn default() -> Self {
        Self::new()
    }
}

impl HumanLayout {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            lines: Vec::new(),
            key_width: 14,
        }
    }

    pub fn title(&mut self, text: &str) -> &mut Self {
        self.lines.push(style(text).bold().to_string());
        self.lines.push(String::new());
        self
    }

    pub fn section(&mut self, text: &str) -> &mut Self {
        self.lines.push(style(text).bold().to_string());
        self.lines.push("-".repeat(text.len().max(3)));
        self
    }

    pub fn kv(&mut self, key: &str, value: &str) -> &mut Self {
        let padded = format!("{key:width$}", width = self.key_width);
        self.lines
            .push(format!("{} {value}", style(padded).dim()));
        self
    }

    pub fn bullet(&mut self, text: &str) -> &mut Self {
        self.lines.push(format!("  - {text}"));
        self
    }

    pub fn ok(&mut self, text: &str) -> &mut Self {
        self.lines.push(format!("{} {text}", style("✓").green()));
        self
    }

    pub fn fail(&mut self, text: &str) -> &mut Self {
        self.lines.push(format!("{} {text}", style("✗").red()));
        self
    }

    pub fn warn(&mut self, text: &str) -> &mut Self {
        self.lines.push(format!("{} {text}", style("!").yellow()));
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.lines.push(String::new());
        self
    }

    pub fn push_line(&mut self, line: impl Into<String>) -> &mut Self {
        self.lines.push(line.into());
        self
    }

    #[must_use]
    pub fn build(self) -> String {
        self.lines.join("\n")
    }
}

pub fn emit_human(layout: HumanLayout) {
    println!("{}", layout.build());
}

/// Render an optional timestamp, `never` when absent.
#[must_use]
pub fn or_never(value: Option<&str>) -> String {
    value.map_or_else(|| "never".to_string(), str::to_string)
}
