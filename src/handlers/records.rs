use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use rusqlite::Connection;
use serde::Serialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::health::{
    CreateDietPlan, CreateHealthRecord, CreateVaccination, RECORD_TYPES,
};
use crate::models::{DietPlan, HealthRecord, UpcomingItem, Vaccination};
use crate::services::auth;
use crate::state::AppState;

/// Every record route is scoped through the pet: a pet that is absent,
/// inactive, or someone else's reads as not found.
fn require_owned_pet(conn: &Connection, pet_id: i64, user_id: &str) -> Result<(), AppError> {
    if !queries::is_owned_active_pet(conn, pet_id, user_id)? {
        return Err(AppError::NotFound("pet not found".to_string()));
    }
    Ok(())
}

// ── Health records ──

// GET /api/pets/:id/health-records
pub async fn list_health_records(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(pet_id): Path<i64>,
) -> Result<Json<Vec<HealthRecord>>, AppError> {
    let db = state.db.lock().unwrap();
    let user = auth::authenticate(&db, &headers, &state.config.token_secret)?;
    require_owned_pet(&db, pet_id, &user.id)?;

    Ok(Json(queries::list_health_records(&db, pet_id, &user.id)?))
}

// POST /api/pets/:id/health-records
pub async fn create_health_record(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(pet_id): Path<i64>,
    Json(body): Json<CreateHealthRecord>,
) -> Result<(StatusCode, Json<HealthRecord>), AppError> {
    if !RECORD_TYPES.contains(&body.record_type.as_str()) {
        return Err(AppError::Validation(format!(
            "unknown record type: {}",
            body.record_type
        )));
    }
    if body.title.trim().is_empty() {
        return Err(AppError::Validation("title is required".to_string()));
    }
    if body.cost.is_some_and(|c| c <= 0.0) {
        return Err(AppError::Validation("cost must be positive".to_string()));
    }
    if body.recurrence_interval_days.is_some_and(|d| d <= 0) {
        return Err(AppError::Validation(
            "recurrence interval must be positive".to_string(),
        ));
    }

    let db = state.db.lock().unwrap();
    let user = auth::authenticate(&db, &headers, &state.config.token_secret)?;
    require_owned_pet(&db, pet_id, &user.id)?;

    let id = queries::insert_health_record(&db, pet_id, &user.id, &body)?;
    let record = queries::get_health_record(&db, id)?
        .ok_or_else(|| AppError::NotFound("health record not found".to_string()))?;

    Ok((StatusCode::CREATED, Json(record)))
}

// ── Vaccinations ──

// GET /api/pets/:id/vaccinations
pub async fn list_vaccinations(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(pet_id): Path<i64>,
) -> Result<Json<Vec<Vaccination>>, AppError> {
    let db = state.db.lock().unwrap();
    let user = auth::authenticate(&db, &headers, &state.config.token_secret)?;
    require_owned_pet(&db, pet_id, &user.id)?;

    Ok(Json(queries::list_vaccinations(&db, pet_id, &user.id)?))
}

// POST /api/pets/:id/vaccinations
pub async fn create_vaccination(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(pet_id): Path<i64>,
    Json(body): Json<CreateVaccination>,
) -> Result<(StatusCode, Json<Vaccination>), AppError> {
    if body.vaccine_name.trim().is_empty() {
        return Err(AppError::Validation("vaccine name is required".to_string()));
    }

    let db = state.db.lock().unwrap();
    let user = auth::authenticate(&db, &headers, &state.config.token_secret)?;
    require_owned_pet(&db, pet_id, &user.id)?;

    let id = queries::insert_vaccination(&db, pet_id, &user.id, &body)?;
    let vaccination = queries::get_vaccination(&db, id)?
        .ok_or_else(|| AppError::NotFound("vaccination not found".to_string()))?;

    Ok((StatusCode::CREATED, Json(vaccination)))
}

// ── Diet plans ──

// GET /api/pets/:id/diet-plans
pub async fn list_diet_plans(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(pet_id): Path<i64>,
) -> Result<Json<Vec<DietPlan>>, AppError> {
    let db = state.db.lock().unwrap();
    let user = auth::authenticate(&db, &headers, &state.config.token_secret)?;
    require_owned_pet(&db, pet_id, &user.id)?;

    Ok(Json(queries::list_diet_plans(&db, pet_id, &user.id)?))
}

// POST /api/pets/:id/diet-plans
pub async fn create_diet_plan(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(pet_id): Path<i64>,
    Json(body): Json<CreateDietPlan>,
) -> Result<(StatusCode, Json<DietPlan>), AppError> {
    let db = state.db.lock().unwrap();
    let user = auth::authenticate(&db, &headers, &state.config.token_secret)?;
    require_owned_pet(&db, pet_id, &user.id)?;

    let id = queries::insert_diet_plan(&db, pet_id, &user.id, &body)?;
    let plan = queries::get_diet_plan(&db, id)?
        .ok_or_else(|| AppError::NotFound("diet plan not found".to_string()))?;

    Ok((StatusCode::CREATED, Json(plan)))
}

// ── Dashboard ──

#[derive(Serialize)]
pub struct DashboardResponse {
    pub upcoming_items: Vec<UpcomingItem>,
    pub pet_count: i64,
}

// GET /api/dashboard
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<DashboardResponse>, AppError> {
    let db = state.db.lock().unwrap();
    let user = auth::authenticate(&db, &headers, &state.config.token_secret)?;

    Ok(Json(DashboardResponse {
        upcoming_items: queries::upcoming_items(&db, &user.id)?,
        pet_count: queries::count_active_pets(&db, &user.id)?,
    }))
}
