use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            AppError::Database(e) => {
                error!("database error: {}", e);
                "Database error occurred"
            }
            AppError::Template(e) => {
                error!("template error: {}", e);
                "Page could not be rendered"
            }
        };

        let status = StatusCode::INTERNAL_SERVER_ERROR;
        let body = Html(format!(
            "<!DOCTYPE html><html><body><h1>{}</h1><p>{}</p><a href=\"/cursos\">Volver</a></body></html>",
            status, message
        ));

        (status, body).into_response()
    }
}
