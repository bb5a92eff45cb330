//! Expand command for listing the occurrences of a recurring event.
//!
//! The rule flags are assembled into the same loosely typed shape the data
//! layer stores, so an unknown frequency behaves exactly as it would for a
//! persisted rule: it expands to nothing.

use std::io::Write;

use anyhow::{Context, Result, bail};
use chrono::{Datelike, NaiveDate};
use clap::{Args, ValueEnum};
use tre_core::recurrence::StoredWeekday;
use tre_core::types::parse_weekday;
use tre_core::{Occurrence, RecurrenceRule, StoredRecurrenceRule, Window};

use super::util::{DateOnly, parse_datetime};
use crate::Config;

/// Calendar view to expand into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum View {
    Day,
    Week,
    Month,
}

#[derive(Debug, Args)]
pub struct ExpandArgs {
    /// Start of the base event (YYYY-MM-DDTHH:MM[:SS]).
    #[arg(long)]
    pub start: String,

    /// End of the base event (YYYY-MM-DDTHH:MM[:SS]).
    #[arg(long)]
    pub end: String,

    /// Recurrence frequency: none, daily, weekly, biweekly, monthly, yearly.
    #[arg(long, default_value = "none")]
    pub frequency: String,

    /// Step multiplier.
    #[arg(long)]
    pub interval: Option<u32>,

    /// Last day an occurrence may start on (YYYY-MM-DD).
    #[arg(long)]
    pub until: Option<String>,

    /// Weekday restriction, comma separated (e.g. mon,wed).
    #[arg(long, value_delimiter = ',')]
    pub days: Option<Vec<String>>,

    /// Window start (date or datetime).
    #[arg(long, requires = "to", conflicts_with = "view")]
    pub from: Option<String>,

    /// Window end (date or datetime; a bare date includes the whole day).
    #[arg(long, requires = "from", conflicts_with = "view")]
    pub to: Option<String>,

    /// Expand into the day, week or month view containing --on.
    #[arg(long, value_enum)]
    pub view: Option<View>,

    /// Date the view is centered on (defaults to the reference date).
    #[arg(long, requires = "view")]
    pub on: Option<NaiveDate>,

    /// First day of the week for --view week.
    #[arg(long, default_value = "monday")]
    pub week_start: String,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

impl ExpandArgs {
    fn base(&self) -> Result<Occurrence> {
        let start = parse_datetime(&self.start, DateOnly::StartOfDay).context("invalid --start")?;
        let end = parse_datetime(&self.end, DateOnly::StartOfDay).context("invalid --end")?;
        Ok(Occurrence::new(start, end))
    }

    fn rule(&self) -> RecurrenceRule {
        let stored = StoredRecurrenceRule {
            frequency: Some(self.frequency.clone()),
            interval: self.interval,
            days_of_week: self
                .days
                .as_ref()
                .map(|days| days.iter().cloned().map(StoredWeekday::Name).collect()),
            end_date: self.until.clone(),
        };
        RecurrenceRule::from(stored)
    }

    fn window(&self, config: &Config) -> Result<Window> {
        if let Some(view) = self.view {
            let on = self.on.unwrap_or_else(|| config.reference_date());
            let window = match view {
                View::Day => Window::day(on)?,
                View::Week => Window::week(on, parse_weekday(&self.week_start)?)?,
                View::Month => Window::month(on.year(), on.month())?,
            };
            return Ok(window);
        }

        let (Some(from), Some(to)) = (&self.from, &self.to) else {
            bail!("specify a window with --from and --to, or with --view");
        };
        let start = parse_datetime(from, DateOnly::StartOfDay).context("invalid --from")?;
        let end = parse_datetime(to, DateOnly::EndOfDay).context("invalid --to")?;
        Ok(Window::new(start, end)?)
    }
}

pub fn run<W: Write>(writer: &mut W, args: &ExpandArgs, config: &Config) -> Result<()> {
    let base = args.base()?;
    let rule = args.rule();
    let window = args.window(config)?;

    let occurrences = tre_core::expand_with(&base, Some(&rule), &window, &config.expand_options());
    tracing::debug!(
        frequency = %rule.frequency,
        count = occurrences.len(),
        "expanded recurrence"
    );

    if args.json || config.json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&occurrences)?)?;
        return Ok(());
    }

    if occurrences.is_empty() {
        writeln!(writer, "No occurrences.")?;
        return Ok(());
    }

    writeln!(writer, "Occurrences: {}", occurrences.len())?;
    for occurrence in &occurrences {
        writeln!(
            writer,
            "- {} -> {}",
            occurrence.start.format("%Y-%m-%d %a %H:%M"),
            occurrence.end.format("%Y-%m-%d %a %H:%M")
        )?;
    }
    Ok(())
}
