use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub const RECORD_TYPES: &[&str] = &["checkup", "vaccination", "grooming", "medication", "diet"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthRecord {
    pub id: i64,
    pub pet_id: i64,
    pub user_id: String,
    pub record_type: String,
    pub title: String,
    pub description: Option<String>,
    pub date_scheduled: Option<String>,
    pub date_completed: Option<String>,
    pub veterinarian_name: Option<String>,
    pub clinic_name: Option<String>,
    pub notes: Option<String>,
    pub cost: Option<f64>,
    pub is_completed: bool,
    pub is_recurring: bool,
    pub recurrence_interval_days: Option<i64>,
    pub next_due_date: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vaccination {
    pub id: i64,
    pub pet_id: i64,
    pub user_id: String,
    pub vaccine_name: String,
    pub date_administered: Option<String>,
    pub next_due_date: Option<String>,
    pub veterinarian_name: Option<String>,
    pub clinic_name: Option<String>,
    pub batch_number: Option<String>,
    pub notes: Option<String>,
    pub is_core_vaccine: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// feeding_times is a JSON array stored as text, written once at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DietPlan {
    pub id: i64,
    pub pet_id: i64,
    pub user_id: String,
    pub food_brand: Option<String>,
    pub food_type: Option<String>,
    pub daily_amount: Option<String>,
    pub feeding_times: Option<String>,
    pub special_instructions: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateHealthRecord {
    pub record_type: String,
    pub title: String,
    pub description: Option<String>,
    pub date_scheduled: Option<String>,
    pub veterinarian_name: Option<String>,
    pub clinic_name: Option<String>,
    pub notes: Option<String>,
    pub cost: Option<f64>,
    #[serde(default)]
    pub is_recurring: bool,
    pub recurrence_interval_days: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateVaccination {
    pub vaccine_name: String,
    pub date_administered: Option<String>,
    pub next_due_date: Option<String>,
    pub veterinarian_name: Option<String>,
    pub clinic_name: Option<String>,
    pub batch_number: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub is_core_vaccine: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateDietPlan {
    pub food_brand: Option<String>,
    pub food_type: Option<String>,
    pub daily_amount: Option<String>,
    pub feeding_times: Option<Vec<String>>,
    pub special_instructions: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// One row of the dashboard's due-soon feed, drawn from health records and
/// vaccinations alike.
#[derive(Debug, Clone, Serialize)]
pub struct UpcomingItem {
    pub id: i64,
    pub title: String,
    pub record_type: String,
    pub due_date: Option<String>,
    pub pet_name: String,
    pub pet_id: i64,
}
