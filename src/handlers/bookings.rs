use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::{Booking, Ledger};
use crate::services::auth;
use crate::services::booking::{self, NewBooking};
use crate::services::slots::{self, SlotAvailability};
use crate::state::AppState;

// ── Availability (public: bookers browse the grid before signing in) ──

#[derive(Deserialize)]
pub struct AvailabilityQuery {
    pub date: Option<String>,
}

#[derive(Serialize)]
pub struct AvailabilityResponse {
    pub date: String,
    pub availability: Vec<SlotAvailability>,
}

async fn availability(
    state: Arc<AppState>,
    ledger: Ledger,
    query: AvailabilityQuery,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let date = query
        .date
        .ok_or_else(|| AppError::Validation("date is required (YYYY-MM-DD)".to_string()))?;

    let db = state.db.lock().unwrap();
    let availability = slots::get_availability(&db, ledger, &date)?;

    Ok(Json(AvailabilityResponse { date, availability }))
}

// GET /api/groomings/availability
pub async fn grooming_availability(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    availability(state, Ledger::Grooming, query).await
}

// GET /api/doctor-appointments/availability
pub async fn doctor_availability(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    availability(state, Ledger::Doctor, query).await
}

// ── Shared ledger operations ──

async fn create(
    state: Arc<AppState>,
    headers: HeaderMap,
    ledger: Ledger,
    req: NewBooking,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let db = state.db.lock().unwrap();
    let user = auth::authenticate(&db, &headers, &state.config.token_secret)?;

    let created = booking::create_booking(&db, ledger, &user.id, &req)?;
    tracing::info!(
        ledger = ledger.as_str(),
        booking_id = created.id,
        date = %created.appointment_date,
        slot = %created.time_slot,
        "booking created"
    );

    Ok((StatusCode::CREATED, Json(created)))
}

async fn list(
    state: Arc<AppState>,
    headers: HeaderMap,
    ledger: Ledger,
) -> Result<Json<Vec<Booking>>, AppError> {
    let db = state.db.lock().unwrap();
    let user = auth::authenticate(&db, &headers, &state.config.token_secret)?;

    Ok(Json(booking::list_bookings(&db, ledger, &user.id)?))
}

async fn get(
    state: Arc<AppState>,
    headers: HeaderMap,
    ledger: Ledger,
    id: i64,
) -> Result<Json<Booking>, AppError> {
    let db = state.db.lock().unwrap();
    let user = auth::authenticate(&db, &headers, &state.config.token_secret)?;

    Ok(Json(booking::get_booking(&db, ledger, &user.id, id)?))
}

async fn cancel(
    state: Arc<AppState>,
    headers: HeaderMap,
    ledger: Ledger,
    id: i64,
) -> Result<Json<Booking>, AppError> {
    let db = state.db.lock().unwrap();
    let user = auth::authenticate(&db, &headers, &state.config.token_secret)?;

    let cancelled = booking::cancel_booking(&db, ledger, &user.id, id)?;
    tracing::info!(
        ledger = ledger.as_str(),
        booking_id = cancelled.id,
        "booking cancelled"
    );

    Ok(Json(cancelled))
}

// ── Grooming ──

#[derive(Deserialize)]
pub struct CreateGroomingRequest {
    pub pet_id: i64,
    pub service_type: String,
    pub appointment_date: String,
    pub time_slot: String,
    pub price: f64,
    pub notes: Option<String>,
}

// POST /api/groomings
pub async fn create_grooming(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateGroomingRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let req = NewBooking {
        pet_id: body.pet_id,
        service: body.service_type,
        appointment_date: body.appointment_date,
        time_slot: body.time_slot,
        price: body.price,
        veterinarian_name: None,
        clinic_name: None,
        notes: body.notes,
    };
    create(state, headers, Ledger::Grooming, req).await
}

// GET /api/groomings
pub async fn list_groomings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Booking>>, AppError> {
    list(state, headers, Ledger::Grooming).await
}

// GET /api/groomings/:id
pub async fn get_grooming(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Booking>, AppError> {
    get(state, headers, Ledger::Grooming, id).await
}

// PATCH /api/groomings/:id/cancel
pub async fn cancel_grooming(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Booking>, AppError> {
    cancel(state, headers, Ledger::Grooming, id).await
}

// ── Doctor appointments ──

#[derive(Deserialize)]
pub struct CreateDoctorRequest {
    pub pet_id: i64,
    pub visit_type: String,
    pub appointment_date: String,
    pub time_slot: String,
    pub price: f64,
    pub veterinarian_name: Option<String>,
    pub clinic_name: Option<String>,
    pub notes: Option<String>,
}

// POST /api/doctor-appointments
pub async fn create_doctor_appointment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateDoctorRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let req = NewBooking {
        pet_id: body.pet_id,
        service: body.visit_type,
        appointment_date: body.appointment_date,
        time_slot: body.time_slot,
        price: body.price,
        veterinarian_name: body.veterinarian_name,
        clinic_name: body.clinic_name,
        notes: body.notes,
    };
    create(state, headers, Ledger::Doctor, req).await
}

// GET /api/doctor-appointments
pub async fn list_doctor_appointments(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Booking>>, AppError> {
    list(state, headers, Ledger::Doctor).await
}

// GET /api/doctor-appointments/:id
pub async fn get_doctor_appointment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Booking>, AppError> {
    get(state, headers, Ledger::Doctor, id).await
}

// PATCH /api/doctor-appointments/:id/cancel
pub async fn cancel_doctor_appointment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Booking>, AppError> {
    cancel(state, headers, Ledger::Doctor, id).await
}
