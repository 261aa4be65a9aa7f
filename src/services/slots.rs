use std::collections::HashSet;

use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Serialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::Ledger;

/// The half-hour grid for a ledger: every bookable slot on any date, in
/// order. 16 slots for grooming, 20 for doctor visits.
pub fn generate_slots(ledger: Ledger) -> Vec<String> {
    let (open, close) = ledger.hours();
    let mut slots = Vec::with_capacity(((close - open) * 2) as usize);
    for hour in open..close {
        slots.push(format!("{hour:02}:00"));
        slots.push(format!("{hour:02}:30"));
    }
    slots
}

#[derive(Debug, Clone, Serialize)]
pub struct SlotAvailability {
    pub time_slot: String,
    pub available: bool,
}

/// Marks each grid slot taken/free against the active bookings on `date`.
/// Past dates are accepted and simply show whatever is booked on them.
pub fn get_availability(
    conn: &Connection,
    ledger: Ledger,
    date: &str,
) -> Result<Vec<SlotAvailability>, AppError> {
    if NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
        return Err(AppError::Validation(
            "date is required (YYYY-MM-DD)".to_string(),
        ));
    }

    let taken: HashSet<String> = queries::taken_slots(conn, ledger, date)?
        .into_iter()
        .collect();

    Ok(generate_slots(ledger)
        .into_iter()
        .map(|slot| SlotAvailability {
            available: !taken.contains(&slot),
            time_slot: slot,
        })
        .collect())
}
