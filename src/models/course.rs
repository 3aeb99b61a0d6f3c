use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::flash::{Category, Notices};
use crate::models::Student;

pub const MIN_NAME_LEN: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Course {
    pub id: i64,
    pub nombre: String,
    pub descripcion: String,
    pub created_at: String,
    pub updated_at: String,
    /// Only populated by `fetch_course_with_students`.
    #[sqlx(skip)]
    #[serde(default)]
    pub estudiantes: Vec<Student>,
}

/// Body of the create and update course forms.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CourseForm {
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub descripcion: String,
}

impl CourseForm {
    pub fn validate(&self) -> Result<(), Notices> {
        let mut notices = Notices::new();
        if self.nombre.chars().count() < MIN_NAME_LEN {
            notices.push(
                Category::CourseField,
                "El nombre del curso debe tener al menos 3 caracteres.",
            );
        }

        if notices.is_empty() { Ok(()) } else { Err(notices) }
    }
}
