use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::pet::{CreatePet, GENDERS};
use crate::models::Pet;
use crate::services::auth;
use crate::state::AppState;

// GET /api/pets
pub async fn list_pets(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Pet>>, AppError> {
    let db = state.db.lock().unwrap();
    let user = auth::authenticate(&db, &headers, &state.config.token_secret)?;

    Ok(Json(queries::list_pets(&db, &user.id)?))
}

// POST /api/pets
pub async fn create_pet(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreatePet>,
) -> Result<(StatusCode, Json<Pet>), AppError> {
    if body.name.trim().is_empty() {
        return Err(AppError::Validation("pet name is required".to_string()));
    }
    if body.species.trim().is_empty() {
        return Err(AppError::Validation("species is required".to_string()));
    }
    if let Some(gender) = body.gender.as_deref() {
        if !GENDERS.contains(&gender) {
            return Err(AppError::Validation(format!("unknown gender: {gender}")));
        }
    }
    if let Some(weight) = body.weight {
        if weight <= 0.0 {
            return Err(AppError::Validation("weight must be positive".to_string()));
        }
    }

    let db = state.db.lock().unwrap();
    let user = auth::authenticate(&db, &headers, &state.config.token_secret)?;

    let id = queries::insert_pet(&db, &user.id, &body)?;
    let pet = queries::get_pet(&db, id, &user.id)?
        .ok_or_else(|| AppError::NotFound("pet not found".to_string()))?;

    Ok((StatusCode::CREATED, Json(pet)))
}

// GET /api/pets/:id
pub async fn get_pet(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Pet>, AppError> {
    let db = state.db.lock().unwrap();
    let user = auth::authenticate(&db, &headers, &state.config.token_secret)?;

    let pet = queries::get_pet(&db, id, &user.id)?
        .ok_or_else(|| AppError::NotFound("pet not found".to_string()))?;
    Ok(Json(pet))
}
