use std::sync::{Arc, Mutex};

use axum::routing::{get, patch, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use pawpal::config::AppConfig;
use pawpal::db;
use pawpal::handlers;
use pawpal::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    if config.token_secret == "changeme" {
        tracing::warn!("TOKEN_SECRET not set, using the development default");
    }

    let conn = db::init_db(&config.database_url)?;

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/me", get(handlers::auth::me))
        .route("/api/auth/profile", put(handlers::auth::update_profile))
        .route(
            "/api/pets",
            get(handlers::pets::list_pets).post(handlers::pets::create_pet),
        )
        .route("/api/pets/:id", get(handlers::pets::get_pet))
        .route(
            "/api/pets/:id/health-records",
            get(handlers::records::list_health_records)
                .post(handlers::records::create_health_record),
        )
        .route(
            "/api/pets/:id/vaccinations",
            get(handlers::records::list_vaccinations).post(handlers::records::create_vaccination),
        )
        .route(
            "/api/pets/:id/diet-plans",
            get(handlers::records::list_diet_plans).post(handlers::records::create_diet_plan),
        )
        .route("/api/dashboard", get(handlers::records::dashboard))
        // The availability read paths are the one deliberately unauthenticated
        // part of the API: prospective bookers see the grid before signing in.
        .route(
            "/api/groomings/availability",
            get(handlers::bookings::grooming_availability),
        )
        .route(
            "/api/groomings",
            get(handlers::bookings::list_groomings).post(handlers::bookings::create_grooming),
        )
        .route("/api/groomings/:id", get(handlers::bookings::get_grooming))
        .route(
            "/api/groomings/:id/cancel",
            patch(handlers::bookings::cancel_grooming),
        )
        .route(
            "/api/doctor-appointments/availability",
            get(handlers::bookings::doctor_availability),
        )
        .route(
            "/api/doctor-appointments",
            get(handlers::bookings::list_doctor_appointments)
                .post(handlers::bookings::create_doctor_appointment),
        )
        .route(
            "/api/doctor-appointments/:id",
            get(handlers::bookings::get_doctor_appointment),
        )
        .route(
            "/api/doctor-appointments/:id/cancel",
            patch(handlers::bookings::cancel_doctor_appointment),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
