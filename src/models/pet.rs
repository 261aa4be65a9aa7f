use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pet {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    pub species: String,
    pub breed: Option<String>,
    pub birth_date: Option<String>,
    pub weight: Option<f64>,
    pub gender: Option<String>,
    pub photo_url: Option<String>,
    pub microchip_id: Option<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

pub const GENDERS: &[&str] = &["male", "female", "unknown"];

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePet {
    pub name: String,
    pub species: String,
    pub breed: Option<String>,
    pub birth_date: Option<String>,
    pub weight: Option<f64>,
    pub gender: Option<String>,
    pub photo_url: Option<String>,
    pub microchip_id: Option<String>,
}

