use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::user::UpdateProfile;
use crate::models::User;
use crate::services::auth;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

// POST /api/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let email = body.email.trim().to_lowercase();
    if !email.contains('@') {
        return Err(AppError::Validation(
            "please enter a valid email address".to_string(),
        ));
    }
    if body.name.trim().is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }

    let password_errors = auth::validate_password_strength(&body.password);
    if !password_errors.is_empty() {
        return Err(AppError::Validation(password_errors.join("; ")));
    }

    let db = state.db.lock().unwrap();

    if queries::email_exists(&db, &email)? {
        return Err(AppError::Conflict(
            "user with this email already exists".to_string(),
        ));
    }

    let now = Utc::now().naive_utc();
    let user = User {
        id: Uuid::new_v4().to_string(),
        email,
        name: body.name,
        phone: body.phone,
        address: body.address,
        city: body.city,
        state: body.state,
        zip_code: body.zip_code,
        emergency_contact_name: body.emergency_contact_name,
        emergency_contact_phone: body.emergency_contact_phone,
        created_at: now,
        updated_at: now,
    };
    queries::create_user(&db, &user, &auth::hash_password(&body.password))?;

    // Re-read so the response carries the timestamps as stored.
    let user = queries::get_user_by_id(&db, &user.id)?
        .ok_or_else(|| AppError::NotFound("user not found".to_string()))?;
    let token = auth::mint_token(
        &user.id,
        &state.config.token_secret,
        state.config.token_ttl_hours,
    );

    Ok((StatusCode::CREATED, Json(AuthResponse { user, token })))
}

// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let email = body.email.trim().to_lowercase();

    let db = state.db.lock().unwrap();

    // Unknown email and wrong password are deliberately indistinguishable.
    let (user, stored_hash) =
        queries::get_user_auth_by_email(&db, &email)?.ok_or(AppError::Unauthorized)?;
    if !auth::verify_password(&body.password, &stored_hash) {
        return Err(AppError::Unauthorized);
    }

    let token = auth::mint_token(
        &user.id,
        &state.config.token_secret,
        state.config.token_ttl_hours,
    );

    Ok(Json(AuthResponse { user, token }))
}

// GET /api/auth/me
pub async fn me(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<User>, AppError> {
    let db = state.db.lock().unwrap();
    let user = auth::authenticate(&db, &headers, &state.config.token_secret)?;
    Ok(Json(user))
}

// PUT /api/auth/profile
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<UpdateProfile>,
) -> Result<Json<User>, AppError> {
    if body.name.trim().is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }

    let db = state.db.lock().unwrap();
    let user = auth::authenticate(&db, &headers, &state.config.token_secret)?;

    queries::update_user_profile(&db, &user.id, &body)?;

    let updated = queries::get_user_by_id(&db, &user.id)?
        .ok_or_else(|| AppError::NotFound("user not found".to_string()))?;
    Ok(Json(updated))
}
