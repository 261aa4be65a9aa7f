//! Best-effort local mirror of bookings, the durable-storage side of the web
//! client. It papers over two failure modes on the booking boundary: a create
//! whose response was lost after the server persisted the row, and a cancel
//! that 404s because the row was already removed by another path.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::models::{Booking, Ledger};
use crate::services::slots::{self, SlotAvailability};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MirrorEntry {
    pub id: i64,
    pub ledger: Ledger,
    pub pet_id: i64,
    pub service: String,
    pub appointment_date: String,
    pub time_slot: String,
    /// False while the entry only exists locally. Unconfirmed entries are
    /// provisional and must never be presented as authoritative bookings.
    pub confirmed: bool,
}

impl MirrorEntry {
    pub fn from_booking(booking: &Booking, confirmed: bool) -> Self {
        Self {
            id: booking.id,
            ledger: booking.ledger,
            pet_id: booking.pet_id,
            service: booking.service.clone(),
            appointment_date: booking.appointment_date.clone(),
            time_slot: booking.time_slot.clone(),
            confirmed,
        }
    }

    fn natural_key(&self) -> (Ledger, i64, &str, &str, &str) {
        (
            self.ledger,
            self.pet_id,
            self.appointment_date.as_str(),
            self.time_slot.as_str(),
            self.service.as_str(),
        )
    }

    /// Same booking, by server identity or by natural key. The natural key
    /// catches optimistic entries that never learned their server id.
    pub fn matches(&self, other: &MirrorEntry) -> bool {
        self.id == other.id || self.natural_key() == other.natural_key()
    }
}

/// Reconciles a server listing with locally remembered entries. Server
/// entries always win; a local entry survives only when nothing on the server
/// matches it; an optimistic entry (a create whose response was never
/// trusted) is prepended under the same rule.
pub fn merge(
    server: &[MirrorEntry],
    local: &[MirrorEntry],
    optimistic: Option<&MirrorEntry>,
) -> Vec<MirrorEntry> {
    let mut merged: Vec<MirrorEntry> = Vec::with_capacity(server.len() + local.len() + 1);

    for entry in server.iter().chain(local) {
        if !merged.iter().any(|m| m.matches(entry)) {
            merged.push(entry.clone());
        }
    }

    if let Some(entry) = optimistic {
        if !merged.iter().any(|m| m.matches(entry)) {
            merged.insert(0, entry.clone());
        }
    }

    merged
}

/// JSON-file-backed entry store, the localStorage analogue.
pub struct BookingMirror {
    path: PathBuf,
}

impl BookingMirror {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// A missing or corrupt file reads as empty; the mirror is best-effort
    /// and never the source of truth.
    pub fn load(&self) -> Vec<MirrorEntry> {
        fs::read_to_string(&self.path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Append-or-replace by id.
    pub fn remember(&self, entry: MirrorEntry) -> anyhow::Result<()> {
        let mut entries = self.load();
        entries.retain(|e| e.id != entry.id);
        entries.push(entry);
        self.store(&entries)
    }

    /// Drops every entry matching `probe` by id or natural key. Callers run
    /// this on cancel even when the server 404s: the row is gone either way.
    pub fn forget(&self, probe: &MirrorEntry) -> anyhow::Result<usize> {
        let entries = self.load();
        let kept: Vec<MirrorEntry> = entries
            .iter()
            .filter(|e| !e.matches(probe))
            .cloned()
            .collect();
        let removed = entries.len() - kept.len();
        if removed > 0 {
            self.store(&kept)?;
        }
        Ok(removed)
    }

    fn store(&self, entries: &[MirrorEntry]) -> anyhow::Result<()> {
        fs::write(&self.path, serde_json::to_string(entries)?)?;
        Ok(())
    }
}

/// The documented availability gap: when the resolver fails, callers fall
/// back to showing the whole grid as bookable. Under failure, "no data" is
/// indistinguishable from "fully available".
pub fn fallback_all_available(ledger: Ledger) -> Vec<SlotAvailability> {
    slots::generate_slots(ledger)
        .into_iter()
        .map(|slot| SlotAvailability {
            time_slot: slot,
            available: true,
        })
        .collect()
}
