pub mod courses;
pub mod students;

use axum::routing::post;
use axum::{Router, extract::State, http::StatusCode, routing::get};

use crate::error::AppError;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/", get(courses::index))
        .route("/cursos", get(courses::index))
        .route("/cursos/new", post(courses::create))
        .route("/cursos/{id}", get(courses::show))
        .route("/cursos/{id}/edit", get(courses::edit))
        .route("/cursos/{id}/update", post(courses::update))
        .route("/cursos/{id}/delete", post(courses::delete))
        .route("/estudiantes/new", get(students::new_form))
        .route("/estudiantes/create", post(students::create))
        .route("/estudiantes/{id}/edit", get(students::edit))
        .route("/estudiantes/{id}/update", post(students::update))
        .route("/estudiantes/{id}/delete", post(students::delete))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(state.db.pool()).await?;
    Ok(StatusCode::OK)
}
