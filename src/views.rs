use askama::Template;
use axum::http::header::SET_COOKIE;
use axum::response::{AppendHeaders, Html, IntoResponse, Response};

use crate::error::AppError;
use crate::flash::{Notice, clear_cookie};
use crate::models::{Course, StudentForm};

#[derive(Template)]
#[template(path = "cursos.html")]
pub struct CoursesPage {
    pub notices: Vec<Notice>,
    pub cursos: Vec<Course>,
}

#[derive(Template)]
#[template(path = "mostrar_curso.html")]
pub struct CoursePage {
    pub notices: Vec<Notice>,
    pub curso: Course,
}

#[derive(Template)]
#[template(path = "editar_curso.html")]
pub struct EditCoursePage {
    pub notices: Vec<Notice>,
    pub curso: Course,
}

#[derive(Template)]
#[template(path = "nuevo_estudiante.html")]
pub struct NewStudentPage {
    pub notices: Vec<Notice>,
    pub cursos: Vec<Course>,
    pub form: StudentForm,
    /// Course preselected in the dropdown, 0 for none.
    pub selected: i64,
}

#[derive(Template)]
#[template(path = "editar_estudiante.html")]
pub struct EditStudentPage {
    pub notices: Vec<Notice>,
    pub estudiante_id: i64,
    pub cursos: Vec<Course>,
    pub form: StudentForm,
    pub selected: i64,
}

/// Renders a page and expires the flash cookie whose notices it just showed.
pub fn render<T: Template>(page: &T) -> Result<Response, AppError> {
    let body = page.render()?;
    Ok((AppendHeaders([(SET_COOKIE, clear_cookie())]), Html(body)).into_response())
}
