use crate::config::load_config;
use crate::lifecycle::status::{EventStatus, EventWindow};
use crate::registration::run_dialog;
use chrono::Utc;
use console::style;
use std::path::PathBuf;

/// The registration action offered by the pending branch: open the booking
/// dialog, compute the price, and hand off to the payment stub.
pub fn register(config_path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = match config_path {
        Some(path) => path,
        None => {
            eprintln!("Error: config not found");
            eprintln!("Use --config <path> to specify a config file, or run 'streamgate config init' to generate one.");
            std::process::exit(1);
        }
    };

    let config = load_config(&config_path)?;
    let window = EventWindow::new(config.event.start_time, config.event.end_time)?;

    match window.status_at(Utc::now()) {
        EventStatus::Pending => {}
        EventStatus::Live => {
            println!("The event is already live; registration is closed.");
            return Ok(());
        }
        EventStatus::Concluded => {
            println!("The event has concluded; registration is closed.");
            return Ok(());
        }
    }

    match run_dialog(&window, &config.registration)? {
        Some(outcome) => {
            // Payment processing is out of scope; the booking only logs
            println!(
                "Payment processing for {} to {} ({} minutes) - {}{} - Coming soon!",
                outcome.start.format("%I:%M %p"),
                outcome.end.format("%I:%M %p"),
                outcome.duration_minutes,
                config.registration.currency,
                outcome.amount,
            );
        }
        None => {
            println!("{}", style("Registration cancelled.").dim());
        }
    }

    Ok(())
}
