use axum::Form;
use axum::extract::{Path, State};
use axum::response::Response;
use tracing::{error, info};

use crate::db::repository;
use crate::error::AppError;
use crate::flash::{Flashed, Notices};
use crate::models::StudentForm;
use crate::state::AppState;
use crate::views::{EditStudentPage, NewStudentPage, render};

pub async fn new_form(
    State(state): State<AppState>,
    Flashed(notices): Flashed,
) -> Result<Response, AppError> {
    let cursos = repository::fetch_courses(&state.db).await?;
    render(&NewStudentPage {
        notices: notices.into_vec(),
        cursos,
        form: StudentForm::default(),
        selected: 0,
    })
}

pub async fn create(
    State(state): State<AppState>,
    Form(form): Form<StudentForm>,
) -> Result<Response, AppError> {
    let taken = repository::email_taken(&state.db, &form.email, 0).await?;
    let student = match form.validate(taken) {
        Ok(student) => student,
        Err(notices) => {
            let cursos = repository::fetch_courses(&state.db).await?;
            let selected = form.selected_course().unwrap_or(0);
            return render(&NewStudentPage {
                notices: notices.into_vec(),
                cursos,
                form,
                selected,
            });
        }
    };

    let id = repository::insert_student(&state.db, &student).await?;
    info!(id, curso_id = student.curso_id, "student created");
    Ok(Notices::success("Estudiante creado con éxito!").redirect("/cursos"))
}

pub async fn edit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Flashed(notices): Flashed,
) -> Result<Response, AppError> {
    let Some(student) = repository::find_student_by_id(&state.db, id).await? else {
        return Ok(Notices::error("Estudiante no encontrado para editar.").redirect("/cursos"));
    };

    let cursos = repository::fetch_courses(&state.db).await?;
    render(&EditStudentPage {
        notices: notices.into_vec(),
        estudiante_id: student.id,
        cursos,
        form: StudentForm::from(&student),
        selected: student.curso_id,
    })
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(form): Form<StudentForm>,
) -> Result<Response, AppError> {
    if repository::find_student_by_id(&state.db, id).await?.is_none() {
        return Ok(Notices::error("Estudiante no encontrado.").redirect("/cursos"));
    }

    let taken = repository::email_taken(&state.db, &form.email, id).await?;
    let student = match form.validate(taken) {
        Ok(student) => student,
        Err(notices) => {
            let cursos = repository::fetch_courses(&state.db).await?;
            let selected = form.selected_course().unwrap_or(0);
            return render(&EditStudentPage {
                notices: notices.into_vec(),
                estudiante_id: id,
                cursos,
                form,
                selected,
            });
        }
    };

    if !repository::update_student(&state.db, id, &student).await? {
        return Ok(Notices::error("Estudiante no encontrado.").redirect("/cursos"));
    }
    info!(id, curso_id = student.curso_id, "student updated");
    Ok(Notices::success("Estudiante actualizado con éxito!")
        .redirect(&format!("/cursos/{}", student.curso_id)))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let Some(student) = repository::find_student_by_id(&state.db, id).await? else {
        return Ok(Notices::error("Estudiante no encontrado.").redirect("/cursos"));
    };

    let notices = match repository::delete_student(&state.db, id).await {
        Ok(true) => {
            info!(id, "student deleted");
            Notices::success("Estudiante eliminado con éxito!")
        }
        Ok(false) => Notices::error("Error al eliminar el estudiante."),
        Err(e) => {
            error!("failed to delete student {}: {}", id, e);
            Notices::error("Error al eliminar el estudiante.")
        }
    };

    // the owning course may already be gone
    if repository::course_exists(&state.db, student.curso_id).await? {
        Ok(notices.redirect(&format!("/cursos/{}", student.curso_id)))
    } else {
        Ok(notices.redirect("/cursos"))
    }
}
