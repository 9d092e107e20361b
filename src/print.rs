// Output rendering. Command results go to stdout as JSON so they can be
// piped into other tools; logs and spinners stay on stderr.

use crate::error::Result;
use clap::ValueEnum;
use serde_json::Value;
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One compact JSON document per result
    Json,
    /// Indented JSON
    #[default]
    Pretty,
}

pub trait Reporter {
    fn print(&self, data: &Value) -> Result<()>;
}

pub fn render(data: &Value, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string(data)?,
        OutputFormat::Pretty => serde_json::to_string_pretty(data)?,
    })
}

/// Reporter writing to stdout.
#[derive(Debug, Clone, Copy)]
pub struct ConsolePrinter {
    pub format: OutputFormat,
}

impl Reporter for ConsolePrinter {
    fn print(&self, data: &Value) -> Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{}", render(data, self.format)?)?;
        Ok(())
    }
}
