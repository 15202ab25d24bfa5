use crate::config::types::RegistrationConfig;
use crate::lifecycle::status::EventWindow;
use chrono::{DateTime, Duration, Utc};
use console::style;
use dialoguer::{Confirm, Select};
use thiserror::Error;
use tracing::info;

/// Booking slots are laid on a 30-minute grid
const SLOT_MINUTES: i64 = 30;

#[derive(Debug, Error, PartialEq)]
pub enum SelectionError {
    #[error("end time must be after start time")]
    EndNotAfterStart,

    #[error("selected duration must be at least 30 minutes")]
    TooShort,

    #[error("end time does not land on the 30-minute booking grid")]
    OffGrid,
}

#[derive(Debug, Error)]
pub enum DialogError {
    #[error("prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingSelection {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationOutcome {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_minutes: i64,
    pub amount: u32,
}

/// Slot boundaries inside the event window, 30 minutes apart, inclusive of
/// both ends.
pub fn slot_grid(window: &EventWindow) -> Vec<DateTime<Utc>> {
    let mut options = Vec::new();
    let mut current = window.start_time;
    while current <= window.end_time {
        options.push(current);
        current += Duration::minutes(SLOT_MINUTES);
    }
    options
}

pub fn duration_minutes(selection: &BookingSelection) -> i64 {
    (selection.end - selection.start).num_minutes()
}

/// Price for a viewing duration: one unit per started 30-minute block.
pub fn price(duration_minutes: i64, unit_price: u32) -> u32 {
    if duration_minutes <= 0 {
        return 0;
    }
    let blocks = (duration_minutes + SLOT_MINUTES - 1) / SLOT_MINUTES;
    blocks as u32 * unit_price
}

/// A selection is valid iff the end is after the start, the duration is at
/// least one slot, and the end lands on the booking grid.
pub fn validate_selection(
    window: &EventWindow,
    selection: &BookingSelection,
) -> Result<(), SelectionError> {
    if selection.end <= selection.start {
        return Err(SelectionError::EndNotAfterStart);
    }
    if duration_minutes(selection) < SLOT_MINUTES {
        return Err(SelectionError::TooShort);
    }
    let on_grid = slot_grid(window)
        .into_iter()
        .filter(|slot| *slot > selection.start)
        .any(|slot| slot == selection.end);
    if !on_grid {
        return Err(SelectionError::OffGrid);
    }
    Ok(())
}

fn format_slot(time: &DateTime<Utc>) -> String {
    format!(
        "{} - {}",
        time.format("%I:%M %p"),
        time.format("%a, %b %-d, %Y")
    )
}

fn format_duration(minutes: i64) -> String {
    let hours = minutes / 60;
    let mins = minutes % 60;
    if hours > 0 && mins > 0 {
        format!("{}h {}m", hours, mins)
    } else if hours > 0 {
        format!("{}h", hours)
    } else {
        format!("{}m", mins)
    }
}

/// Interactive booking dialog for the pending branch: pick a start and end
/// slot, review duration and price, confirm. Returns None when the viewer
/// cancels or the selection is invalid.
///
/// Payment processing is a stub; completion only logs the booking.
pub fn run_dialog(
    window: &EventWindow,
    config: &RegistrationConfig,
) -> Result<Option<RegistrationOutcome>, DialogError> {
    let slots = slot_grid(window);

    println!(
        "Event schedule: {} to {}",
        window.start_time.format("%c"),
        window.end_time.format("%c")
    );

    let start_labels: Vec<String> = slots.iter().map(format_slot).collect();
    let start_idx = Select::new()
        .with_prompt("Start time")
        .items(&start_labels)
        .default(0)
        .interact()?;
    let start = slots[start_idx];

    let end_options: Vec<DateTime<Utc>> =
        slots.iter().copied().filter(|slot| *slot > start).collect();
    if end_options.is_empty() {
        println!(
            "{}",
            style("No valid end time for that start. End time must be at least 30 minutes after start time.")
                .yellow()
        );
        return Ok(None);
    }

    let end_labels: Vec<String> = end_options.iter().map(format_slot).collect();
    let end_idx = Select::new()
        .with_prompt("End time")
        .items(&end_labels)
        .default(0)
        .interact()?;
    let end = end_options[end_idx];

    let selection = BookingSelection { start, end };
    if let Err(e) = validate_selection(window, &selection) {
        // Grid-derived pickers should not produce this, but the register
        // action stays disabled on an invalid selection regardless
        println!("{}", style(format!("Invalid selection: {}", e)).yellow());
        return Ok(None);
    }

    let minutes = duration_minutes(&selection);
    let amount = price(minutes, config.unit_price);

    println!("Duration: {}", format_duration(minutes));
    println!("Total amount: {}{}", config.currency, amount);

    let confirmed = Confirm::new()
        .with_prompt(format!("Pay {}{}?", config.currency, amount))
        .default(true)
        .interact()?;

    if !confirmed {
        return Ok(None);
    }

    let outcome = RegistrationOutcome {
        start,
        end,
        duration_minutes: minutes,
        amount,
    };

    info!(
        start = %outcome.start,
        end = %outcome.end,
        duration_minutes = outcome.duration_minutes,
        amount = outcome.amount,
        "Registration confirmed"
    );

    Ok(Some(outcome))
}
