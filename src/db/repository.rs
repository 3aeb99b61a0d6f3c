use chrono::Utc;
use sqlx::FromRow;
use sqlx::sqlite::SqliteRow;

use crate::db::{Database, Statement};
use crate::models::{Course, CourseForm, NewStudent, Student};

fn now() -> String {
    Utc::now().to_rfc3339()
}

fn map_rows<T>(rows: Vec<SqliteRow>) -> Result<Vec<T>, sqlx::Error>
where
    T: for<'r> FromRow<'r, SqliteRow>,
{
    rows.iter().map(|row| T::from_row(row)).collect()
}

pub async fn fetch_courses(db: &Database) -> Result<Vec<Course>, sqlx::Error> {
    let rows = db
        .run(Statement::select(
            r#"
            SELECT id, nombre, descripcion, created_at, updated_at
            FROM cursos
            ORDER BY nombre COLLATE es_ci ASC
            "#,
        ))
        .await?
        .into_rows();

    map_rows(rows)
}

pub async fn insert_course(db: &Database, form: &CourseForm) -> Result<i64, sqlx::Error> {
    let now = now();
    let outcome = db
        .run(
            Statement::insert(
                r#"
                INSERT INTO cursos (nombre, descripcion, created_at, updated_at)
                VALUES (?1, ?2, ?3, ?3)
                "#,
            )
            .bind(form.nombre.as_str())
            .bind(form.descripcion.as_str())
            .bind(now),
        )
        .await?;

    outcome.inserted_id().ok_or(sqlx::Error::RowNotFound)
}

pub async fn course_exists(db: &Database, id: i64) -> Result<bool, sqlx::Error> {
    let rows = db
        .run(Statement::select("SELECT id FROM cursos WHERE id = ?1").bind(id))
        .await?
        .into_rows();
    Ok(!rows.is_empty())
}

/// One row of `cursos LEFT JOIN estudiantes`; the student half is NULL when
/// the course has nobody enrolled.
#[derive(Debug, FromRow)]
struct CourseStudentRow {
    id: i64,
    nombre: String,
    descripcion: String,
    created_at: String,
    updated_at: String,
    estudiante_id: Option<i64>,
    estudiante_nombre: Option<String>,
    estudiante_apellido: Option<String>,
    estudiante_email: Option<String>,
    estudiante_created_at: Option<String>,
    estudiante_updated_at: Option<String>,
}

impl CourseStudentRow {
    fn student(&self) -> Option<Student> {
        let id = self.estudiante_id?;
        Some(Student {
            id,
            nombre: self.estudiante_nombre.clone().unwrap_or_default(),
            apellido: self.estudiante_apellido.clone().unwrap_or_default(),
            email: self.estudiante_email.clone().unwrap_or_default(),
            curso_id: self.id,
            created_at: self.estudiante_created_at.clone().unwrap_or_default(),
            updated_at: self.estudiante_updated_at.clone().unwrap_or_default(),
        })
    }
}

pub async fn fetch_course_with_students(
    db: &Database,
    id: i64,
) -> Result<Option<Course>, sqlx::Error> {
    let rows = db
        .run(
            Statement::select(
                r#"
                SELECT
                    c.id, c.nombre, c.descripcion, c.created_at, c.updated_at,
                    e.id AS estudiante_id,
                    e.nombre AS estudiante_nombre,
                    e.apellido AS estudiante_apellido,
                    e.email AS estudiante_email,
                    e.created_at AS estudiante_created_at,
                    e.updated_at AS estudiante_updated_at
                FROM cursos c
                LEFT JOIN estudiantes e ON c.id = e.curso_id
                WHERE c.id = ?1
                ORDER BY e.apellido COLLATE es_ci ASC, e.nombre COLLATE es_ci ASC
                "#,
            )
            .bind(id),
        )
        .await?
        .into_rows();

    let rows: Vec<CourseStudentRow> = map_rows(rows)?;
    let Some(first) = rows.first() else {
        return Ok(None);
    };

    let mut course = Course {
        id: first.id,
        nombre: first.nombre.clone(),
        descripcion: first.descripcion.clone(),
        created_at: first.created_at.clone(),
        updated_at: first.updated_at.clone(),
        estudiantes: Vec::new(),
    };
    course.estudiantes = rows.iter().filter_map(CourseStudentRow::student).collect();

    Ok(Some(course))
}

pub async fn update_course(db: &Database, id: i64, form: &CourseForm) -> Result<bool, sqlx::Error> {
    let outcome = db
        .run(
            Statement::modify(
                r#"
                UPDATE cursos
                SET nombre = ?1,
                    descripcion = ?2,
                    updated_at = ?3
                WHERE id = ?4
                "#,
            )
            .bind(form.nombre.as_str())
            .bind(form.descripcion.as_str())
            .bind(now())
            .bind(id),
        )
        .await?;

    Ok(outcome.succeeded())
}

/// Students of the course are left in place.
pub async fn delete_course(db: &Database, id: i64) -> Result<bool, sqlx::Error> {
    let outcome = db
        .run(Statement::modify("DELETE FROM cursos WHERE id = ?1").bind(id))
        .await?;
    Ok(outcome.succeeded())
}

pub async fn insert_student(db: &Database, student: &NewStudent) -> Result<i64, sqlx::Error> {
    let now = now();
    let outcome = db
        .run(
            Statement::insert(
                r#"
                INSERT INTO estudiantes
                    (nombre, apellido, email, curso_id, created_at, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?5)
                "#,
            )
            .bind(student.nombre.as_str())
            .bind(student.apellido.as_str())
            .bind(student.email.as_str())
            .bind(student.curso_id)
            .bind(now),
        )
        .await?;

    outcome.inserted_id().ok_or(sqlx::Error::RowNotFound)
}

pub async fn find_student_by_id(db: &Database, id: i64) -> Result<Option<Student>, sqlx::Error> {
    let rows = db
        .run(
            Statement::select(
                r#"
                SELECT id, nombre, apellido, email, curso_id, created_at, updated_at
                FROM estudiantes
                WHERE id = ?1
                "#,
            )
            .bind(id),
        )
        .await?
        .into_rows();

    rows.first().map(|row| Student::from_row(row)).transpose()
}

pub async fn update_student(
    db: &Database,
    id: i64,
    student: &NewStudent,
) -> Result<bool, sqlx::Error> {
    let outcome = db
        .run(
            Statement::modify(
                r#"
                UPDATE estudiantes
                SET nombre = ?1,
                    apellido = ?2,
                    email = ?3,
                    curso_id = ?4,
                    updated_at = ?5
                WHERE id = ?6
                "#,
            )
            .bind(student.nombre.as_str())
            .bind(student.apellido.as_str())
            .bind(student.email.as_str())
            .bind(student.curso_id)
            .bind(now())
            .bind(id),
        )
        .await?;

    Ok(outcome.succeeded())
}

pub async fn delete_student(db: &Database, id: i64) -> Result<bool, sqlx::Error> {
    let outcome = db
        .run(Statement::modify("DELETE FROM estudiantes WHERE id = ?1").bind(id))
        .await?;
    Ok(outcome.succeeded())
}

/// Whether a student other than `except_id` already uses `email`, ignoring case.
/// Pass `0` when creating.
pub async fn email_taken(db: &Database, email: &str, except_id: i64) -> Result<bool, sqlx::Error> {
    let rows = db
        .run(
            Statement::select(
                "SELECT id FROM estudiantes WHERE email = ?1 COLLATE NOCASE AND id != ?2 LIMIT 1",
            )
            .bind(email)
            .bind(except_id),
        )
        .await?
        .into_rows();

    Ok(!rows.is_empty())
}
