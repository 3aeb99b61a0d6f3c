use axum::Form;
use axum::extract::{Path, State};
use axum::response::Response;
use tracing::{error, info};

use crate::db::repository;
use crate::error::AppError;
use crate::flash::{Flashed, Notices};
use crate::models::CourseForm;
use crate::state::AppState;
use crate::views::{CoursePage, CoursesPage, EditCoursePage, render};

pub async fn index(
    State(state): State<AppState>,
    Flashed(notices): Flashed,
) -> Result<Response, AppError> {
    let cursos = repository::fetch_courses(&state.db).await?;
    render(&CoursesPage {
        notices: notices.into_vec(),
        cursos,
    })
}

pub async fn create(
    State(state): State<AppState>,
    Form(form): Form<CourseForm>,
) -> Result<Response, AppError> {
    if let Err(notices) = form.validate() {
        return Ok(notices.redirect("/cursos"));
    }

    let id = repository::insert_course(&state.db, &form).await?;
    info!(id, "course created");
    Ok(Notices::success("Curso creado con éxito!").redirect("/cursos"))
}

pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Flashed(notices): Flashed,
) -> Result<Response, AppError> {
    match repository::fetch_course_with_students(&state.db, id).await? {
        Some(curso) => render(&CoursePage {
            notices: notices.into_vec(),
            curso,
        }),
        None => Ok(Notices::error("Curso no encontrado.").redirect("/cursos")),
    }
}

pub async fn edit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Flashed(notices): Flashed,
) -> Result<Response, AppError> {
    match repository::fetch_course_with_students(&state.db, id).await? {
        Some(curso) => render(&EditCoursePage {
            notices: notices.into_vec(),
            curso,
        }),
        None => Ok(Notices::error("Curso no encontrado para editar.").redirect("/cursos")),
    }
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(form): Form<CourseForm>,
) -> Result<Response, AppError> {
    if let Err(notices) = form.validate() {
        return Ok(notices.redirect(&format!("/cursos/{}/edit", id)));
    }

    if !repository::update_course(&state.db, id, &form).await? {
        return Ok(Notices::error("Curso no encontrado.").redirect("/cursos"));
    }
    info!(id, "course updated");
    Ok(Notices::success("Curso actualizado con éxito!").redirect(&format!("/cursos/{}", id)))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    let notices = match repository::delete_course(&state.db, id).await {
        Ok(true) => {
            info!(id, "course deleted");
            Notices::success("Curso eliminado con éxito!")
        }
        Ok(false) => Notices::error("Error al eliminar el curso."),
        Err(e) => {
            error!("failed to delete course {}: {}", id, e);
            Notices::error("Error al eliminar el curso.")
        }
    };
    notices.redirect("/cursos")
}
