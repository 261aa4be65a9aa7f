use chrono::NaiveDate;
use rusqlite::Connection;

use crate::db::queries::{self, InsertBooking};
use crate::errors::AppError;
use crate::models::{Booking, BookingStatus, Ledger};
use crate::services::slots;

pub struct NewBooking {
    pub pet_id: i64,
    pub service: String,
    pub appointment_date: String,
    pub time_slot: String,
    pub price: f64,
    pub veterinarian_name: Option<String>,
    pub clinic_name: Option<String>,
    pub notes: Option<String>,
}

/// Books a slot. New rows always land in `confirmed`; there is no approval
/// step that would produce `pending`.
pub fn create_booking(
    conn: &Connection,
    ledger: Ledger,
    user_id: &str,
    req: &NewBooking,
) -> Result<Booking, AppError> {
    if !ledger.services().contains(&req.service.as_str()) {
        return Err(AppError::Validation(format!(
            "unknown {} service: {}",
            ledger.as_str(),
            req.service
        )));
    }
    if NaiveDate::parse_from_str(&req.appointment_date, "%Y-%m-%d").is_err() {
        return Err(AppError::Validation(
            "appointment_date must be YYYY-MM-DD".to_string(),
        ));
    }
    if !slots::generate_slots(ledger).contains(&req.time_slot) {
        return Err(AppError::Validation(format!(
            "time slot {} is outside the {} schedule",
            req.time_slot,
            ledger.as_str()
        )));
    }
    if req.price <= 0.0 {
        return Err(AppError::Validation("price must be positive".to_string()));
    }

    if !queries::is_owned_active_pet(conn, req.pet_id, user_id)? {
        return Err(AppError::NotFound("pet not found".to_string()));
    }

    // Friendly pre-check; the partial unique index on active (ledger, date,
    // slot) rows is the authoritative guard, so a lost race surfaces as a
    // constraint violation below rather than a double booking.
    if queries::slot_taken(conn, ledger, &req.appointment_date, &req.time_slot)? {
        return Err(AppError::Conflict(
            "selected time slot is not available".to_string(),
        ));
    }

    let insert = InsertBooking {
        pet_id: req.pet_id,
        service: &req.service,
        appointment_date: &req.appointment_date,
        time_slot: &req.time_slot,
        price: req.price,
        status: BookingStatus::Confirmed,
        veterinarian_name: req.veterinarian_name.as_deref(),
        clinic_name: req.clinic_name.as_deref(),
        notes: req.notes.as_deref(),
    };

    let id = match queries::insert_booking(conn, ledger, user_id, &insert) {
        Ok(id) => id,
        Err(e) if is_unique_violation(&e) => {
            return Err(AppError::Conflict(
                "selected time slot is not available".to_string(),
            ))
        }
        Err(e) => return Err(e.into()),
    };

    queries::get_booking(conn, ledger, id, user_id)?
        .ok_or_else(|| AppError::NotFound("booking not found".to_string()))
}

pub fn get_booking(
    conn: &Connection,
    ledger: Ledger,
    user_id: &str,
    id: i64,
) -> Result<Booking, AppError> {
    queries::get_booking(conn, ledger, id, user_id)?
        .ok_or_else(|| AppError::NotFound("booking not found".to_string()))
}

pub fn list_bookings(
    conn: &Connection,
    ledger: Ledger,
    user_id: &str,
) -> Result<Vec<Booking>, AppError> {
    Ok(queries::list_bookings(conn, ledger, user_id)?)
}

/// confirmed/pending → cancelled. Terminal rows are left alone.
pub fn cancel_booking(
    conn: &Connection,
    ledger: Ledger,
    user_id: &str,
    id: i64,
) -> Result<Booking, AppError> {
    let booking = queries::get_booking(conn, ledger, id, user_id)?
        .ok_or_else(|| AppError::NotFound("booking not found".to_string()))?;

    if booking.status.is_terminal() {
        return Err(AppError::InvalidState(format!(
            "cannot cancel a {} booking",
            booking.status.as_str()
        )));
    }

    queries::update_booking_status(conn, ledger, id, user_id, BookingStatus::Cancelled)?;

    queries::get_booking(conn, ledger, id, user_id)?
        .ok_or_else(|| AppError::NotFound("booking not found".to_string()))
}

fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<rusqlite::Error>()
        .and_then(|e| e.sqlite_error_code())
        == Some(rusqlite::ErrorCode::ConstraintViolation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::services::slots::get_availability;

    fn setup_db() -> Connection {
        let conn = db::init_db(":memory:").unwrap();
        for (user, email) in [("u1", "alice@example.com"), ("u2", "bob@example.com")] {
            conn.execute(
                "INSERT INTO users (id, email, password_hash, name) VALUES (?1, ?2, 'x', 'T')",
                rusqlite::params![user, email],
            )
            .unwrap();
        }
        // pet 1 → u1, pet 2 → u2
        conn.execute(
            "INSERT INTO pets (user_id, name, species) VALUES ('u1', 'Rex', 'dog')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO pets (user_id, name, species) VALUES ('u2', 'Mia', 'cat')",
            [],
        )
        .unwrap();
        conn
    }

    fn bath_at(slot: &str) -> NewBooking {
        NewBooking {
            pet_id: 1,
            service: "bath".to_string(),
            appointment_date: "2025-06-01".to_string(),
            time_slot: slot.to_string(),
            price: 29.0,
            veterinarian_name: None,
            clinic_name: None,
            notes: None,
        }
    }

    #[test]
    fn test_create_yields_confirmed_booking() {
        let conn = setup_db();
        let booking = create_booking(&conn, Ledger::Grooming, "u1", &bath_at("09:00")).unwrap();

        assert!(booking.id > 0);
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.service, "bath");
        assert_eq!(booking.updated_at, booking.created_at);
    }

    #[test]
    fn test_create_marks_slot_unavailable() {
        let conn = setup_db();
        create_booking(&conn, Ledger::Grooming, "u1", &bath_at("09:00")).unwrap();

        let avail = get_availability(&conn, Ledger::Grooming, "2025-06-01").unwrap();
        for slot in &avail {
            assert_eq!(slot.available, slot.time_slot != "09:00");
        }
    }

    #[test]
    fn test_double_booking_conflicts() {
        let conn = setup_db();
        create_booking(&conn, Ledger::Grooming, "u1", &bath_at("09:00")).unwrap();

        let err = create_booking(&conn, Ledger::Grooming, "u1", &bath_at("09:00")).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn test_unique_index_catches_lost_race() {
        // Bypass the pre-check and insert directly, as a racing writer would.
        let conn = setup_db();
        create_booking(&conn, Ledger::Grooming, "u1", &bath_at("09:00")).unwrap();

        let insert = InsertBooking {
            pet_id: 1,
            service: "bath",
            appointment_date: "2025-06-01",
            time_slot: "09:00",
            price: 29.0,
            status: BookingStatus::Confirmed,
            veterinarian_name: None,
            clinic_name: None,
            notes: None,
        };
        let err = queries::insert_booking(&conn, Ledger::Grooming, "u1", &insert).unwrap_err();
        assert!(is_unique_violation(&err));
    }

    #[test]
    fn test_cancel_frees_slot_for_rebooking() {
        let conn = setup_db();
        let booking = create_booking(&conn, Ledger::Grooming, "u1", &bath_at("09:00")).unwrap();

        let err = create_booking(&conn, Ledger::Grooming, "u2", &NewBooking {
            pet_id: 2,
            ..bath_at("09:00")
        })
        .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        cancel_booking(&conn, Ledger::Grooming, "u1", booking.id).unwrap();

        let rebooked = create_booking(&conn, Ledger::Grooming, "u2", &NewBooking {
            pet_id: 2,
            ..bath_at("09:00")
        })
        .unwrap();
        assert_eq!(rebooked.status, BookingStatus::Confirmed);
    }

    #[test]
    fn test_cancel_is_not_idempotent() {
        let conn = setup_db();
        let booking = create_booking(&conn, Ledger::Grooming, "u1", &bath_at("09:00")).unwrap();

        let cancelled = cancel_booking(&conn, Ledger::Grooming, "u1", booking.id).unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);

        let err = cancel_booking(&conn, Ledger::Grooming, "u1", booking.id).unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
    }

    #[test]
    fn test_cancel_unknown_id_not_found() {
        let conn = setup_db();
        let err = cancel_booking(&conn, Ledger::Grooming, "u1", 999).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_foreign_pet_rejected_even_for_free_slot() {
        let conn = setup_db();
        // pet 2 belongs to u2
        let err = create_booking(&conn, Ledger::Grooming, "u1", &NewBooking {
            pet_id: 2,
            ..bath_at("09:00")
        })
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_wrong_vocabulary_rejected() {
        let conn = setup_db();
        // a doctor visit type on the grooming ledger
        let err = create_booking(&conn, Ledger::Grooming, "u1", &NewBooking {
            service: "checkup".to_string(),
            ..bath_at("09:00")
        })
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_off_grid_slot_rejected() {
        let conn = setup_db();
        for slot in ["09:15", "17:00", "08:30", "9:00"] {
            let err = create_booking(&conn, Ledger::Grooming, "u1", &bath_at(slot)).unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "slot {slot}");
        }
        // 17:30 is on the doctor grid but off the grooming one
        assert!(create_booking(&conn, Ledger::Grooming, "u1", &bath_at("17:30")).is_err());
    }

    #[test]
    fn test_bad_date_and_price_rejected() {
        let conn = setup_db();

        let err = create_booking(&conn, Ledger::Grooming, "u1", &NewBooking {
            appointment_date: "01/06/2025".to_string(),
            ..bath_at("09:00")
        })
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = create_booking(&conn, Ledger::Grooming, "u1", &NewBooking {
            price: 0.0,
            ..bath_at("09:00")
        })
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_owner_scoped_get() {
        let conn = setup_db();
        let booking = create_booking(&conn, Ledger::Grooming, "u1", &bath_at("09:00")).unwrap();

        assert!(get_booking(&conn, Ledger::Grooming, "u1", booking.id).is_ok());
        let err = get_booking(&conn, Ledger::Grooming, "u2", booking.id).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_doctor_scenario_full_lifecycle() {
        let conn = setup_db();
        // doctor pet for u1
        conn.execute(
            "INSERT INTO pets (user_id, name, species) VALUES ('u1', 'Taro', 'dog')",
            [],
        )
        .unwrap();

        let booking = create_booking(&conn, Ledger::Doctor, "u1", &NewBooking {
            pet_id: 3,
            service: "checkup".to_string(),
            appointment_date: "2025-07-10".to_string(),
            time_slot: "10:30".to_string(),
            price: 35.0,
            veterinarian_name: Some("Dr. Lin".to_string()),
            clinic_name: None,
            notes: None,
        })
        .unwrap();

        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.updated_at, booking.created_at);

        let avail = get_availability(&conn, Ledger::Doctor, "2025-07-10").unwrap();
        assert!(avail.iter().any(|s| s.time_slot == "10:30" && !s.available));

        let cancelled = cancel_booking(&conn, Ledger::Doctor, "u1", booking.id).unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);

        let err = cancel_booking(&conn, Ledger::Doctor, "u1", booking.id).unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));

        let avail = get_availability(&conn, Ledger::Doctor, "2025-07-10").unwrap();
        assert!(avail.iter().any(|s| s.time_slot == "10:30" && s.available));
    }

    #[test]
    fn test_list_orders_newest_first() {
        let conn = setup_db();
        create_booking(&conn, Ledger::Grooming, "u1", &NewBooking {
            appointment_date: "2025-06-01".to_string(),
            ..bath_at("09:00")
        })
        .unwrap();
        create_booking(&conn, Ledger::Grooming, "u1", &NewBooking {
            appointment_date: "2025-06-02".to_string(),
            ..bath_at("09:00")
        })
        .unwrap();

        let bookings = list_bookings(&conn, Ledger::Grooming, "u1").unwrap();
        assert_eq!(bookings.len(), 2);
        assert_eq!(bookings[0].appointment_date, "2025-06-02");
    }
}
