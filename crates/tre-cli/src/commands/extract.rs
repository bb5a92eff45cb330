//! Extract command for pulling a date out of task text.

use std::io::Write;

use anyhow::{Result, bail};
use chrono::NaiveDate;
use clap::Args;

use crate::Config;

#[derive(Debug, Args)]
pub struct ExtractArgs {
    /// Task text. Multiple words are joined with single spaces.
    #[arg(required = true, num_args = 1..)]
    pub text: Vec<String>,

    /// Reference date for relative phrases (defaults to config, then today).
    #[arg(long)]
    pub today: Option<NaiveDate>,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn run<W: Write>(writer: &mut W, args: &ExtractArgs, config: &Config) -> Result<()> {
    let text = args.text.join(" ");
    if text.trim().is_empty() {
        bail!("text cannot be empty");
    }

    let today = args.today.unwrap_or_else(|| config.reference_date());
    let extraction = tre_core::extract(&text, today);
    tracing::debug!(%today, found = extraction.date.is_some(), "extracted task text");

    if args.json || config.json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&extraction)?)?;
        return Ok(());
    }

    match extraction.date {
        Some(date) => writeln!(writer, "Date: {date} ({})", date.format("%A"))?,
        None => writeln!(writer, "Date: none")?,
    }
    writeln!(writer, "Text: {}", extraction.residual)?;
    Ok(())
}
