use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::flash::{Category, Notices};

pub const MIN_NAME_LEN: usize = 2;

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9.+_-]+@[a-zA-Z0-9._-]+\.[a-zA-Z]+$").expect("email pattern compiles")
});

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Student {
    pub id: i64,
    pub nombre: String,
    pub apellido: String,
    pub email: String,
    pub curso_id: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// Raw student form as submitted. Every field is kept as text so that a
/// failed submission can be echoed back unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudentForm {
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub apellido: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub curso_id: String,
}

/// A student form that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStudent {
    pub nombre: String,
    pub apellido: String,
    pub email: String,
    pub curso_id: i64,
}

impl StudentForm {
    pub fn selected_course(&self) -> Option<i64> {
        self.curso_id.trim().parse::<i64>().ok()
    }

    /// Runs every check and reports each failure. `email_taken` is whether
    /// some *other* student already owns `self.email`.
    pub fn validate(&self, email_taken: bool) -> Result<NewStudent, Notices> {
        let mut notices = Notices::new();

        if self.nombre.chars().count() < MIN_NAME_LEN {
            notices.push(
                Category::StudentField,
                "El nombre del estudiante debe tener al menos 2 caracteres.",
            );
        }
        if self.apellido.chars().count() < MIN_NAME_LEN {
            notices.push(
                Category::StudentField,
                "El apellido del estudiante debe tener al menos 2 caracteres.",
            );
        }
        if !is_valid_email(&self.email) {
            notices.push(Category::StudentField, "Email inválido.");
        }
        if email_taken {
            notices.push(Category::StudentField, "El email ya está registrado.");
        }
        let curso_id = self.selected_course();
        if curso_id.is_none() {
            notices.push(
                Category::StudentField,
                "Debe seleccionar un curso para el estudiante.",
            );
        }

        match curso_id {
            Some(curso_id) if notices.is_empty() => Ok(NewStudent {
                nombre: self.nombre.clone(),
                apellido: self.apellido.clone(),
                email: self.email.clone(),
                curso_id,
            }),
            _ => Err(notices),
        }
    }
}

impl From<&Student> for StudentForm {
    fn from(student: &Student) -> Self {
        Self {
            nombre: student.nombre.clone(),
            apellido: student.apellido.clone(),
            email: student.email.clone(),
            curso_id: student.curso_id.to_string(),
        }
    }
}
