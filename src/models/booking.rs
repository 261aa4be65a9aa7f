use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// The two appointment ledgers. Each is its own conflict namespace with its
/// own service vocabulary and operating window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ledger {
    Grooming,
    Doctor,
}

impl Ledger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Ledger::Grooming => "grooming",
            Ledger::Doctor => "doctor",
        }
    }

    pub fn services(&self) -> &'static [&'static str] {
        match self {
            Ledger::Grooming => &["bath", "full_groom", "nail_trim", "teeth_cleaning"],
            Ledger::Doctor => &["checkup", "consultation", "emergency", "follow_up"],
        }
    }

    /// Opening and closing hour of the half-hour slot grid. The last slot
    /// starts half an hour before closing.
    pub fn hours(&self) -> (u32, u32) {
        match self {
            Ledger::Grooming => (9, 17),
            Ledger::Doctor => (9, 19),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "confirmed" => BookingStatus::Confirmed,
            "cancelled" => BookingStatus::Cancelled,
            "completed" => BookingStatus::Completed,
            _ => BookingStatus::Pending,
        }
    }

    /// Terminal states admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Cancelled | BookingStatus::Completed)
    }

    /// A booking in this status occupies its slot.
    pub fn is_active(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Booking {
    pub id: i64,
    pub ledger: Ledger,
    pub user_id: String,
    pub pet_id: i64,
    pub service: String,
    pub appointment_date: String,
    pub time_slot: String,
    pub price: f64,
    pub status: BookingStatus,
    pub veterinarian_name: Option<String>,
    pub clinic_name: Option<String>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
