//! Implements InputPort. Inquire-based interactive prompts.
//!
//! The trigger surface: quick range presets or a custom range, one
//! aggregation request per pick, and a rendered summary. Range validation
//! happens here, before the orchestrator is ever invoked.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Datelike, Days, Local, Months, NaiveDate};
use indicatif::{ProgressBar, ProgressStyle};
use inquire::{Select, Text};

use crate::domain::{AggregateResult, DateRange, DomainError};
use crate::ports::InputPort;
use crate::usecases::AggregateService;

const MENU_THIS_MONTH: &str = "This month";
const MENU_LAST_MONTH: &str = "Last month";
const MENU_LAST_3_MONTHS: &str = "Last 3 months";
const MENU_CUSTOM: &str = "Custom range";
const MENU_QUIT: &str = "Quit";

/// TUI adapter. Inquire prompts around the aggregation service.
pub struct TuiInputPort {
    service: Arc<AggregateService>,
}

impl TuiInputPort {
    pub fn new(service: Arc<AggregateService>) -> Self {
        Self { service }
    }

    /// Returns `None` when the user quits.
    fn prompt_range(&self) -> Result<Option<DateRange>, DomainError> {
        let options = vec![
            MENU_THIS_MONTH,
            MENU_LAST_MONTH,
            MENU_LAST_3_MONTHS,
            MENU_CUSTOM,
            MENU_QUIT,
        ];
        let choice = Select::new("Aggregate card usage for:", options)
            .prompt()
            .map_err(|e| DomainError::Config(e.to_string()))?;

        let today = Local::now().date_naive();
        let range = match choice {
            MENU_THIS_MONTH => month_range(today, 0),
            MENU_LAST_MONTH => month_range(today, 1),
            MENU_LAST_3_MONTHS => trailing_months_range(today, 3),
            MENU_CUSTOM => self.prompt_custom()?,
            _ => return Ok(None),
        };
        Ok(Some(range))
    }

    fn prompt_custom(&self) -> Result<DateRange, DomainError> {
        loop {
            let start = prompt_date("Start date (YYYY-MM-DD):")?;
            let end = prompt_date("End date (YYYY-MM-DD):")?;
            match DateRange::new(start, end) {
                Ok(range) => return Ok(range),
                Err(e) => eprintln!("{}", e),
            }
        }
    }
}

#[async_trait]
impl InputPort for TuiInputPort {
    async fn run(&self) -> Result<(), DomainError> {
        loop {
            let Some(range) = self.prompt_range()? else {
                return Ok(());
            };

            let spinner = aggregation_spinner();
            let outcome = self.service.aggregate(&range).await;
            spinner.finish_and_clear();

            match outcome {
                Ok(result) => render_result(&range, &result),
                // Only could-not-even-start failures arrive here; partial
                // data comes back as a normal result.
                Err(e) => eprintln!("aggregation failed: {}", e),
            }
        }
    }
}

fn prompt_date(message: &str) -> Result<NaiveDate, DomainError> {
    loop {
        let raw = Text::new(message)
            .prompt()
            .map_err(|e| DomainError::Config(e.to_string()))?;
        match NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
            Ok(date) => return Ok(date),
            Err(_) => eprintln!("enter a date as YYYY-MM-DD, e.g. 2025-06-01"),
        }
    }
}

/// First day of the month `back` months before `today`'s month.
fn first_of_month(today: NaiveDate, back: u32) -> NaiveDate {
    let first = today.with_day(1).unwrap_or(today);
    first.checked_sub_months(Months::new(back)).unwrap_or(first)
}

/// Last day of `date`'s month.
fn last_of_month(date: NaiveDate) -> NaiveDate {
    let first = date.with_day(1).unwrap_or(date);
    first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.checked_sub_days(Days::new(1)))
        .unwrap_or(date)
}

/// The full calendar month `back` months ago (0 = current month).
fn month_range(today: NaiveDate, back: u32) -> DateRange {
    let start = first_of_month(today, back);
    DateRange {
        start,
        end: last_of_month(start),
    }
}

/// From the first day of the month `months - 1` back through the last day
/// of the current month.
fn trailing_months_range(today: NaiveDate, months: u32) -> DateRange {
    DateRange {
        start: first_of_month(today, months.saturating_sub(1)),
        end: last_of_month(today),
    }
}

fn aggregation_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message("aggregating notifications...");
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

fn render_result(range: &DateRange, result: &AggregateResult) {
    println!();
    println!("{} 〜 {}", range.start, range.end);
    println!(
        "total ¥{}  ({}件)",
        format_yen(result.total_amount),
        result.count
    );
    for record in &result.details {
        println!(
            "  {}  ¥{:>11}  {}",
            record.date,
            format_yen(record.amount),
            record.merchant
        );
    }
    println!();
}

/// Digit-grouped yen amount (12345 → "12,345").
fn format_yen(amount: u64) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}
