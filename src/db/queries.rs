use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection};

use crate::models::health::{CreateDietPlan, CreateHealthRecord, CreateVaccination};
use crate::models::pet::CreatePet;
use crate::models::user::UpdateProfile;
use crate::models::{
    Booking, BookingStatus, DietPlan, HealthRecord, Ledger, Pet, UpcomingItem, User, Vaccination,
};

const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn now_str() -> String {
    Utc::now().naive_utc().format(TS_FORMAT).to_string()
}

fn parse_ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, TS_FORMAT).unwrap_or_else(|_| Utc::now().naive_utc())
}

// ── Users ──

pub fn create_user(conn: &Connection, user: &User, password_hash: &str) -> anyhow::Result<()> {
    let created_at = user.created_at.format(TS_FORMAT).to_string();
    let updated_at = user.updated_at.format(TS_FORMAT).to_string();

    conn.execute(
        "INSERT INTO users (id, email, password_hash, name, phone, address, city, state, zip_code,
                            emergency_contact_name, emergency_contact_phone, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            user.id,
            user.email,
            password_hash,
            user.name,
            user.phone,
            user.address,
            user.city,
            user.state,
            user.zip_code,
            user.emergency_contact_name,
            user.emergency_contact_phone,
            created_at,
            updated_at,
        ],
    )?;
    Ok(())
}

pub fn get_user_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<User>> {
    let result = conn.query_row(
        "SELECT id, email, name, phone, address, city, state, zip_code,
                emergency_contact_name, emergency_contact_phone, created_at, updated_at
         FROM users WHERE id = ?1",
        params![id],
        |row| Ok(parse_user_row(row)),
    );

    match result {
        Ok(user) => Ok(Some(user?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Login path: fetches the stored password hash alongside the profile.
pub fn get_user_auth_by_email(
    conn: &Connection,
    email: &str,
) -> anyhow::Result<Option<(User, String)>> {
    let result = conn.query_row(
        "SELECT id, email, name, phone, address, city, state, zip_code,
                emergency_contact_name, emergency_contact_phone, created_at, updated_at,
                password_hash
         FROM users WHERE email = ?1",
        params![email],
        |row| {
            let hash: String = row.get(12)?;
            Ok((parse_user_row(row), hash))
        },
    );

    match result {
        Ok((user, hash)) => Ok(Some((user?, hash))),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn email_exists(conn: &Connection, email: &str) -> anyhow::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE email = ?1",
        params![email],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn update_user_profile(
    conn: &Connection,
    user_id: &str,
    update: &UpdateProfile,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE users SET name = ?1, phone = ?2, address = ?3, city = ?4, state = ?5,
                          zip_code = ?6, emergency_contact_name = ?7, emergency_contact_phone = ?8,
                          updated_at = ?9
         WHERE id = ?10",
        params![
            update.name,
            update.phone,
            update.address,
            update.city,
            update.state,
            update.zip_code,
            update.emergency_contact_name,
            update.emergency_contact_phone,
            now_str(),
            user_id,
        ],
    )?;
    Ok(count > 0)
}

fn parse_user_row(row: &rusqlite::Row) -> anyhow::Result<User> {
    let created_at_str: String = row.get(10)?;
    let updated_at_str: String = row.get(11)?;

    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        phone: row.get(3)?,
        address: row.get(4)?,
        city: row.get(5)?,
        state: row.get(6)?,
        zip_code: row.get(7)?,
        emergency_contact_name: row.get(8)?,
        emergency_contact_phone: row.get(9)?,
        created_at: parse_ts(&created_at_str),
        updated_at: parse_ts(&updated_at_str),
    })
}

// ── Pets ──

pub fn insert_pet(conn: &Connection, user_id: &str, pet: &CreatePet) -> anyhow::Result<i64> {
    let now = now_str();
    conn.execute(
        "INSERT INTO pets (user_id, name, species, breed, birth_date, weight, gender, photo_url,
                           microchip_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
        params![
            user_id,
            pet.name,
            pet.species,
            pet.breed,
            pet.birth_date,
            pet.weight,
            pet.gender,
            pet.photo_url,
            pet.microchip_id,
            now,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_pet(conn: &Connection, pet_id: i64, user_id: &str) -> anyhow::Result<Option<Pet>> {
    let result = conn.query_row(
        "SELECT id, user_id, name, species, breed, birth_date, weight, gender, photo_url,
                microchip_id, is_active, created_at, updated_at
         FROM pets WHERE id = ?1 AND user_id = ?2 AND is_active = 1",
        params![pet_id, user_id],
        |row| Ok(parse_pet_row(row)),
    );

    match result {
        Ok(pet) => Ok(Some(pet?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_pets(conn: &Connection, user_id: &str) -> anyhow::Result<Vec<Pet>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, name, species, breed, birth_date, weight, gender, photo_url,
                microchip_id, is_active, created_at, updated_at
         FROM pets WHERE user_id = ?1 AND is_active = 1 ORDER BY created_at DESC, id DESC",
    )?;

    let rows = stmt.query_map(params![user_id], |row| Ok(parse_pet_row(row)))?;

    let mut pets = vec![];
    for row in rows {
        pets.push(row??);
    }
    Ok(pets)
}

pub fn is_owned_active_pet(conn: &Connection, pet_id: i64, user_id: &str) -> anyhow::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM pets WHERE id = ?1 AND user_id = ?2 AND is_active = 1",
        params![pet_id, user_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn parse_pet_row(row: &rusqlite::Row) -> anyhow::Result<Pet> {
    let created_at_str: String = row.get(11)?;
    let updated_at_str: String = row.get(12)?;

    Ok(Pet {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        species: row.get(3)?,
        breed: row.get(4)?,
        birth_date: row.get(5)?,
        weight: row.get(6)?,
        gender: row.get(7)?,
        photo_url: row.get(8)?,
        microchip_id: row.get(9)?,
        is_active: row.get::<_, i32>(10)? != 0,
        created_at: parse_ts(&created_at_str),
        updated_at: parse_ts(&updated_at_str),
    })
}

// ── Health Records ──

pub fn insert_health_record(
    conn: &Connection,
    pet_id: i64,
    user_id: &str,
    record: &CreateHealthRecord,
) -> anyhow::Result<i64> {
    let now = now_str();
    // next_due_date is seeded from the scheduled date; recurring records get
    // it advanced by an out-of-scope completion flow.
    conn.execute(
        "INSERT INTO health_records (pet_id, user_id, record_type, title, description,
                                     date_scheduled, veterinarian_name, clinic_name, notes, cost,
                                     is_recurring, recurrence_interval_days, next_due_date,
                                     created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?14)",
        params![
            pet_id,
            user_id,
            record.record_type,
            record.title,
            record.description,
            record.date_scheduled,
            record.veterinarian_name,
            record.clinic_name,
            record.notes,
            record.cost,
            record.is_recurring as i32,
            record.recurrence_interval_days,
            record.date_scheduled,
            now,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_health_record(conn: &Connection, id: i64) -> anyhow::Result<Option<HealthRecord>> {
    let result = conn.query_row(
        &format!("{HEALTH_RECORD_SELECT} WHERE id = ?1"),
        params![id],
        |row| Ok(parse_health_record_row(row)),
    );

    match result {
        Ok(record) => Ok(Some(record?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_health_records(
    conn: &Connection,
    pet_id: i64,
    user_id: &str,
) -> anyhow::Result<Vec<HealthRecord>> {
    let mut stmt = conn.prepare(&format!(
        "{HEALTH_RECORD_SELECT}
         WHERE pet_id = ?1 AND user_id = ?2
         ORDER BY
           CASE WHEN next_due_date IS NOT NULL THEN next_due_date ELSE date_scheduled END ASC,
           created_at DESC",
    ))?;

    let rows = stmt.query_map(params![pet_id, user_id], |row| {
        Ok(parse_health_record_row(row))
    })?;

    let mut records = vec![];
    for row in rows {
        records.push(row??);
    }
    Ok(records)
}

const HEALTH_RECORD_SELECT: &str =
    "SELECT id, pet_id, user_id, record_type, title, description, date_scheduled, date_completed,
            veterinarian_name, clinic_name, notes, cost, is_completed, is_recurring,
            recurrence_interval_days, next_due_date, created_at, updated_at
     FROM health_records";

fn parse_health_record_row(row: &rusqlite::Row) -> anyhow::Result<HealthRecord> {
    let created_at_str: String = row.get(16)?;
    let updated_at_str: String = row.get(17)?;

    Ok(HealthRecord {
        id: row.get(0)?,
        pet_id: row.get(1)?,
        user_id: row.get(2)?,
        record_type: row.get(3)?,
        title: row.get(4)?,
        description: row.get(5)?,
        date_scheduled: row.get(6)?,
        date_completed: row.get(7)?,
        veterinarian_name: row.get(8)?,
        clinic_name: row.get(9)?,
        notes: row.get(10)?,
        cost: row.get(11)?,
        is_completed: row.get::<_, i32>(12)? != 0,
        is_recurring: row.get::<_, i32>(13)? != 0,
        recurrence_interval_days: row.get(14)?,
        next_due_date: row.get(15)?,
        created_at: parse_ts(&created_at_str),
        updated_at: parse_ts(&updated_at_str),
    })
}

// ── Vaccinations ──

pub fn insert_vaccination(
    conn: &Connection,
    pet_id: i64,
    user_id: &str,
    vaccination: &CreateVaccination,
) -> anyhow::Result<i64> {
    let now = now_str();
    conn.execute(
        "INSERT INTO vaccinations (pet_id, user_id, vaccine_name, date_administered, next_due_date,
                                   veterinarian_name, clinic_name, batch_number, notes,
                                   is_core_vaccine, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
        params![
            pet_id,
            user_id,
            vaccination.vaccine_name,
            vaccination.date_administered,
            vaccination.next_due_date,
            vaccination.veterinarian_name,
            vaccination.clinic_name,
            vaccination.batch_number,
            vaccination.notes,
            vaccination.is_core_vaccine as i32,
            now,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_vaccination(conn: &Connection, id: i64) -> anyhow::Result<Option<Vaccination>> {
    let result = conn.query_row(
        &format!("{VACCINATION_SELECT} WHERE id = ?1"),
        params![id],
        |row| Ok(parse_vaccination_row(row)),
    );

    match result {
        Ok(v) => Ok(Some(v?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_vaccinations(
    conn: &Connection,
    pet_id: i64,
    user_id: &str,
) -> anyhow::Result<Vec<Vaccination>> {
    let mut stmt = conn.prepare(&format!(
        "{VACCINATION_SELECT}
         WHERE pet_id = ?1 AND user_id = ?2
         ORDER BY next_due_date ASC, date_administered DESC",
    ))?;

    let rows = stmt.query_map(params![pet_id, user_id], |row| {
        Ok(parse_vaccination_row(row))
    })?;

    let mut vaccinations = vec![];
    for row in rows {
        vaccinations.push(row??);
    }
    Ok(vaccinations)
}

const VACCINATION_SELECT: &str =
    "SELECT id, pet_id, user_id, vaccine_name, date_administered, next_due_date,
            veterinarian_name, clinic_name, batch_number, notes, is_core_vaccine,
            created_at, updated_at
     FROM vaccinations";

fn parse_vaccination_row(row: &rusqlite::Row) -> anyhow::Result<Vaccination> {
    let created_at_str: String = row.get(11)?;
    let updated_at_str: String = row.get(12)?;

    Ok(Vaccination {
        id: row.get(0)?,
        pet_id: row.get(1)?,
        user_id: row.get(2)?,
        vaccine_name: row.get(3)?,
        date_administered: row.get(4)?,
        next_due_date: row.get(5)?,
        veterinarian_name: row.get(6)?,
        clinic_name: row.get(7)?,
        batch_number: row.get(8)?,
        notes: row.get(9)?,
        is_core_vaccine: row.get::<_, i32>(10)? != 0,
        created_at: parse_ts(&created_at_str),
        updated_at: parse_ts(&updated_at_str),
    })
}

// ── Diet Plans ──

pub fn insert_diet_plan(
    conn: &Connection,
    pet_id: i64,
    user_id: &str,
    plan: &CreateDietPlan,
) -> anyhow::Result<i64> {
    let feeding_times_json = plan
        .feeding_times
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    let now = now_str();
    conn.execute(
        "INSERT INTO diet_plans (pet_id, user_id, food_brand, food_type, daily_amount,
                                 feeding_times, special_instructions, start_date, end_date,
                                 created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
        params![
            pet_id,
            user_id,
            plan.food_brand,
            plan.food_type,
            plan.daily_amount,
            feeding_times_json,
            plan.special_instructions,
            plan.start_date,
            plan.end_date,
            now,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_diet_plan(conn: &Connection, id: i64) -> anyhow::Result<Option<DietPlan>> {
    let result = conn.query_row(
        &format!("{DIET_PLAN_SELECT} WHERE id = ?1"),
        params![id],
        |row| Ok(parse_diet_plan_row(row)),
    );

    match result {
        Ok(plan) => Ok(Some(plan?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_diet_plans(
    conn: &Connection,
    pet_id: i64,
    user_id: &str,
) -> anyhow::Result<Vec<DietPlan>> {
    let mut stmt = conn.prepare(&format!(
        "{DIET_PLAN_SELECT}
         WHERE pet_id = ?1 AND user_id = ?2
         ORDER BY is_active DESC, created_at DESC",
    ))?;

    let rows = stmt.query_map(params![pet_id, user_id], |row| Ok(parse_diet_plan_row(row)))?;

    let mut plans = vec![];
    for row in rows {
        plans.push(row??);
    }
    Ok(plans)
}

const DIET_PLAN_SELECT: &str =
    "SELECT id, pet_id, user_id, food_brand, food_type, daily_amount, feeding_times,
            special_instructions, start_date, end_date, is_active, created_at, updated_at
     FROM diet_plans";

fn parse_diet_plan_row(row: &rusqlite::Row) -> anyhow::Result<DietPlan> {
    let created_at_str: String = row.get(11)?;
    let updated_at_str: String = row.get(12)?;

    Ok(DietPlan {
        id: row.get(0)?,
        pet_id: row.get(1)?,
        user_id: row.get(2)?,
        food_brand: row.get(3)?,
        food_type: row.get(4)?,
        daily_amount: row.get(5)?,
        feeding_times: row.get(6)?,
        special_instructions: row.get(7)?,
        start_date: row.get(8)?,
        end_date: row.get(9)?,
        is_active: row.get::<_, i32>(10)? != 0,
        created_at: parse_ts(&created_at_str),
        updated_at: parse_ts(&updated_at_str),
    })
}

// ── Bookings ──

pub struct InsertBooking<'a> {
    pub pet_id: i64,
    pub service: &'a str,
    pub appointment_date: &'a str,
    pub time_slot: &'a str,
    pub price: f64,
    pub status: BookingStatus,
    pub veterinarian_name: Option<&'a str>,
    pub clinic_name: Option<&'a str>,
    pub notes: Option<&'a str>,
}

pub fn insert_booking(
    conn: &Connection,
    ledger: Ledger,
    user_id: &str,
    booking: &InsertBooking,
) -> anyhow::Result<i64> {
    let now = now_str();
    conn.execute(
        "INSERT INTO bookings (ledger, user_id, pet_id, service, appointment_date, time_slot,
                               price, status, veterinarian_name, clinic_name, notes,
                               created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)",
        params![
            ledger.as_str(),
            user_id,
            booking.pet_id,
            booking.service,
            booking.appointment_date,
            booking.time_slot,
            booking.price,
            booking.status.as_str(),
            booking.veterinarian_name,
            booking.clinic_name,
            booking.notes,
            now,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_booking(
    conn: &Connection,
    ledger: Ledger,
    id: i64,
    user_id: &str,
) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        &format!("{BOOKING_SELECT} WHERE ledger = ?1 AND id = ?2 AND user_id = ?3"),
        params![ledger.as_str(), id, user_id],
        |row| Ok(parse_booking_row(row, ledger)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_bookings(
    conn: &Connection,
    ledger: Ledger,
    user_id: &str,
) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "{BOOKING_SELECT}
         WHERE ledger = ?1 AND user_id = ?2
         ORDER BY appointment_date DESC, time_slot DESC",
    ))?;

    let rows = stmt.query_map(params![ledger.as_str(), user_id], |row| {
        Ok(parse_booking_row(row, ledger))
    })?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

/// Slots occupied by an active booking on `date`, any user.
pub fn taken_slots(conn: &Connection, ledger: Ledger, date: &str) -> anyhow::Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT time_slot FROM bookings
         WHERE ledger = ?1 AND appointment_date = ?2 AND status IN ('pending', 'confirmed')",
    )?;

    let rows = stmt.query_map(params![ledger.as_str(), date], |row| row.get(0))?;

    let mut slots = vec![];
    for row in rows {
        slots.push(row?);
    }
    Ok(slots)
}

pub fn slot_taken(
    conn: &Connection,
    ledger: Ledger,
    date: &str,
    time_slot: &str,
) -> anyhow::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM bookings
         WHERE ledger = ?1 AND appointment_date = ?2 AND time_slot = ?3
           AND status IN ('pending', 'confirmed')",
        params![ledger.as_str(), date, time_slot],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn update_booking_status(
    conn: &Connection,
    ledger: Ledger,
    id: i64,
    user_id: &str,
    status: BookingStatus,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET status = ?1, updated_at = ?2
         WHERE ledger = ?3 AND id = ?4 AND user_id = ?5",
        params![status.as_str(), now_str(), ledger.as_str(), id, user_id],
    )?;
    Ok(count > 0)
}

const BOOKING_SELECT: &str =
    "SELECT id, user_id, pet_id, service, appointment_date, time_slot, price, status,
            veterinarian_name, clinic_name, notes, created_at, updated_at
     FROM bookings";

fn parse_booking_row(row: &rusqlite::Row, ledger: Ledger) -> anyhow::Result<Booking> {
    let status_str: String = row.get(7)?;
    let created_at_str: String = row.get(11)?;
    let updated_at_str: String = row.get(12)?;

    Ok(Booking {
        id: row.get(0)?,
        ledger,
        user_id: row.get(1)?,
        pet_id: row.get(2)?,
        service: row.get(3)?,
        appointment_date: row.get(4)?,
        time_slot: row.get(5)?,
        price: row.get(6)?,
        status: BookingStatus::parse(&status_str),
        veterinarian_name: row.get(8)?,
        clinic_name: row.get(9)?,
        notes: row.get(10)?,
        created_at: parse_ts(&created_at_str),
        updated_at: parse_ts(&updated_at_str),
    })
}

// ── Dashboard ──

pub fn upcoming_items(conn: &Connection, user_id: &str) -> anyhow::Result<Vec<UpcomingItem>> {
    let mut stmt = conn.prepare(
        "SELECT hr.id, hr.title, hr.record_type, hr.next_due_date AS due_date,
                p.name AS pet_name, p.id AS pet_id
         FROM health_records hr
         JOIN pets p ON hr.pet_id = p.id
         WHERE hr.user_id = ?1
           AND p.is_active = 1
           AND hr.is_completed = 0
           AND hr.next_due_date IS NOT NULL
           AND date(hr.next_due_date) <= date('now', '+30 days')

         UNION ALL

         SELECT v.id, v.vaccine_name AS title, 'vaccination' AS record_type,
                v.next_due_date AS due_date, p.name AS pet_name, p.id AS pet_id
         FROM vaccinations v
         JOIN pets p ON v.pet_id = p.id
         WHERE v.user_id = ?1
           AND p.is_active = 1
           AND v.next_due_date IS NOT NULL
           AND date(v.next_due_date) <= date('now', '+30 days')

         ORDER BY due_date ASC
         LIMIT 10",
    )?;

    let rows = stmt.query_map(params![user_id], |row| {
        Ok(UpcomingItem {
            id: row.get(0)?,
            title: row.get(1)?,
            record_type: row.get(2)?,
            due_date: row.get(3)?,
            pet_name: row.get(4)?,
            pet_id: row.get(5)?,
        })
    })?;

    let mut items = vec![];
    for row in rows {
        items.push(row?);
    }
    Ok(items)
}

pub fn count_active_pets(conn: &Connection, user_id: &str) -> anyhow::Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM pets WHERE user_id = ?1 AND is_active = 1",
        params![user_id],
        |row| row.get(0),
    )?;
    Ok(count)
}
