use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
use axum::http::{Request, Response, StatusCode};
use cursos::api::router;
use cursos::db::{Database, repository};
use cursos::models::{CourseForm, NewStudent};
use cursos::state::AppState;
use tower::ServiceExt;

async fn setup() -> (Router, Database) {
    let db = Database::connect_url("sqlite::memory:", 1)
        .await
        .expect("Failed to create database");
    db.migrate().await.expect("Failed to run migrations");
    let app = router(AppState { db: db.clone() });
    (app, db)
}

async fn add_course(db: &Database, nombre: &str) -> i64 {
    let form = CourseForm {
        nombre: nombre.to_string(),
        descripcion: String::new(),
    };
    repository::insert_course(db, &form).await.unwrap()
}

async fn add_student(db: &Database, email: &str, curso_id: i64) -> i64 {
    let student = NewStudent {
        nombre: "Ana".to_string(),
        apellido: "Lopez".to_string(),
        email: email.to_string(),
        curso_id,
    };
    repository::insert_student(db, &student).await.unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(response: &Response<Body>) -> &str {
    response.headers()[LOCATION].to_str().unwrap()
}

/// `name=value` part of the flash cookie set by a redirect.
fn flash_cookie(response: &Response<Body>) -> String {
    let raw = response.headers()[SET_COOKIE].to_str().unwrap();
    raw.split(';').next().unwrap().to_string()
}

/// Follows a redirect carrying its flash cookie and returns the page body.
async fn follow(app: &Router, response: &Response<Body>) -> String {
    let request = Request::builder()
        .uri(location(response))
        .header(COOKIE, flash_cookie(response))
        .body(Body::empty())
        .unwrap();
    let page = app.clone().oneshot(request).await.unwrap();
    assert_eq!(page.status(), StatusCode::OK);
    body_text(page).await
}

#[tokio::test]
async fn health_is_ok() {
    let (app, _db) = setup().await;
    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn index_is_served_on_both_paths() {
    let (app, db) = setup().await;
    add_course(&db, "Historia").await;

    for uri in ["/", "/cursos"] {
        let response = app.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("Historia"));
    }
}

#[tokio::test]
async fn creating_a_course_redirects_with_success_notice() {
    let (app, db) = setup().await;

    let response = app
        .clone()
        .oneshot(post_form(
            "/cursos/new",
            "nombre=Matem%C3%A1ticas&descripcion=%C3%81lgebra+b%C3%A1sica",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/cursos");

    let page = follow(&app, &response).await;
    assert!(page.contains("Curso creado con éxito!"));
    assert!(page.contains("Matemáticas"));

    let cursos = repository::fetch_courses(&db).await.unwrap();
    assert_eq!(cursos.len(), 1);
    assert_eq!(cursos[0].descripcion, "Álgebra básica");
}

#[tokio::test]
async fn short_course_name_is_rejected_without_writing() {
    let (app, db) = setup().await;

    let response = app
        .clone()
        .oneshot(post_form("/cursos/new", "nombre=Ab&descripcion=x"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/cursos");

    let page = follow(&app, &response).await;
    assert!(page.contains("El nombre del curso debe tener al menos 3 caracteres."));
    assert!(repository::fetch_courses(&db).await.unwrap().is_empty());
}

#[tokio::test]
async fn rendered_page_clears_the_flash_cookie() {
    let (app, _db) = setup().await;
    let response = app.oneshot(get("/cursos")).await.unwrap();
    let cookie = response.headers()[SET_COOKIE].to_str().unwrap();
    assert!(cookie.starts_with("flash=;"));
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn missing_course_redirects_to_list() {
    let (app, _db) = setup().await;

    let response = app.clone().oneshot(get("/cursos/99")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/cursos");
    assert!(follow(&app, &response).await.contains("Curso no encontrado."));

    let response = app.clone().oneshot(get("/cursos/99/edit")).await.unwrap();
    assert_eq!(location(&response), "/cursos");
    assert!(
        follow(&app, &response)
            .await
            .contains("Curso no encontrado para editar.")
    );
}

#[tokio::test]
async fn course_page_lists_its_students() {
    let (app, db) = setup().await;
    let empty = add_course(&db, "Arte").await;
    let full = add_course(&db, "Historia").await;
    add_student(&db, "ana@example.com", full).await;

    let page = body_text(
        app.clone()
            .oneshot(get(&format!("/cursos/{}", empty)))
            .await
            .unwrap(),
    )
    .await;
    assert!(page.contains("Este curso no tiene estudiantes."));

    let page = body_text(
        app.clone()
            .oneshot(get(&format!("/cursos/{}", full)))
            .await
            .unwrap(),
    )
    .await;
    assert!(page.contains("ana@example.com"));
}

#[tokio::test]
async fn course_update_validates_then_redirects_to_detail() {
    let (app, db) = setup().await;
    let id = add_course(&db, "Histora").await;

    let response = app
        .clone()
        .oneshot(post_form(&format!("/cursos/{}/update", id), "nombre=H&descripcion="))
        .await
        .unwrap();
    assert_eq!(location(&response), format!("/cursos/{}/edit", id));
    let unchanged = repository::fetch_course_with_students(&db, id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(unchanged.nombre, "Histora");

    let response = app
        .clone()
        .oneshot(post_form(
            &format!("/cursos/{}/update", id),
            "nombre=Historia&descripcion=Siglo+XX",
        ))
        .await
        .unwrap();
    assert_eq!(location(&response), format!("/cursos/{}", id));
    assert!(follow(&app, &response).await.contains("Curso actualizado con éxito!"));

    let curso = repository::fetch_course_with_students(&db, id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(curso.nombre, "Historia");
    assert_eq!(curso.descripcion, "Siglo XX");
}

#[tokio::test]
async fn deleting_a_course_keeps_students_and_reports() {
    let (app, db) = setup().await;
    let id = add_course(&db, "Historia").await;
    let student = add_student(&db, "ana@example.com", id).await;

    let response = app
        .clone()
        .oneshot(post_form(&format!("/cursos/{}/delete", id), ""))
        .await
        .unwrap();
    assert_eq!(location(&response), "/cursos");
    assert!(follow(&app, &response).await.contains("Curso eliminado con éxito!"));
    assert!(repository::find_student_by_id(&db, student).await.unwrap().is_some());

    let response = app
        .clone()
        .oneshot(post_form(&format!("/cursos/{}/delete", id), ""))
        .await
        .unwrap();
    assert!(follow(&app, &response).await.contains("Error al eliminar el curso."));
}

#[tokio::test]
async fn new_student_form_offers_courses() {
    let (app, db) = setup().await;
    let id = add_course(&db, "Historia").await;

    let response = app.oneshot(get("/estudiantes/new")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let page = body_text(response).await;
    assert!(page.contains(&format!("value=\"{}\"", id)));
    assert!(page.contains("Historia"));
}

#[tokio::test]
async fn creating_a_student_redirects_to_courses() {
    let (app, db) = setup().await;
    let curso_id = add_course(&db, "Historia").await;

    let body = format!(
        "nombre=Ana&apellido=Lopez&email=ana%40example.com&curso_id={}",
        curso_id
    );
    let response = app
        .clone()
        .oneshot(post_form("/estudiantes/create", &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/cursos");
    assert!(follow(&app, &response).await.contains("Estudiante creado con éxito!"));

    let curso = repository::fetch_course_with_students(&db, curso_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(curso.estudiantes.len(), 1);
    assert_eq!(curso.estudiantes[0].email, "ana@example.com");
}

#[tokio::test]
async fn duplicate_email_rerenders_form_and_writes_nothing() {
    let (app, db) = setup().await;
    let curso_id = add_course(&db, "Historia").await;
    add_student(&db, "ana@example.com", curso_id).await;

    let body = format!(
        "nombre=Ana&apellido=Lopez&email=ana%40example.com&curso_id={}",
        curso_id
    );
    let response = app
        .clone()
        .oneshot(post_form("/estudiantes/create", &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let page = body_text(response).await;
    assert!(page.contains("El email ya está registrado."));
    assert!(page.contains("value=\"Lopez\""));

    let curso = repository::fetch_course_with_students(&db, curso_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(curso.estudiantes.len(), 1);
}

#[tokio::test]
async fn invalid_student_reports_every_problem() {
    let (app, _db) = setup().await;

    let response = app
        .oneshot(post_form(
            "/estudiantes/create",
            "nombre=A&apellido=B&email=nope&curso_id=",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let page = body_text(response).await;
    assert!(page.contains("El nombre del estudiante debe tener al menos 2 caracteres."));
    assert!(page.contains("El apellido del estudiante debe tener al menos 2 caracteres."));
    assert!(page.contains("Email inválido."));
    assert!(page.contains("Debe seleccionar un curso para el estudiante."));
}

#[tokio::test]
async fn student_update_with_own_email_succeeds() {
    let (app, db) = setup().await;
    let first = add_course(&db, "Historia").await;
    let second = add_course(&db, "Arte").await;
    let id = add_student(&db, "ana@example.com", first).await;

    let body = format!(
        "nombre=Ana&apellido=Lopez&email=ana%40example.com&curso_id={}",
        second
    );
    let response = app
        .clone()
        .oneshot(post_form(&format!("/estudiantes/{}/update", id), &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/cursos/{}", second));
    assert!(
        follow(&app, &response)
            .await
            .contains("Estudiante actualizado con éxito!")
    );

    let student = repository::find_student_by_id(&db, id).await.unwrap().unwrap();
    assert_eq!(student.curso_id, second);
}

#[tokio::test]
async fn student_update_into_taken_email_rerenders() {
    let (app, db) = setup().await;
    let curso_id = add_course(&db, "Historia").await;
    add_student(&db, "ana@example.com", curso_id).await;
    let luis = add_student(&db, "luis@example.com", curso_id).await;

    let body = format!(
        "nombre=Luis&apellido=Rojas&email=ana%40example.com&curso_id={}",
        curso_id
    );
    let response = app
        .oneshot(post_form(&format!("/estudiantes/{}/update", luis), &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("El email ya está registrado."));

    let student = repository::find_student_by_id(&db, luis).await.unwrap().unwrap();
    assert_eq!(student.email, "luis@example.com");
}

#[tokio::test]
async fn updating_a_missing_student_redirects_to_list() {
    let (app, db) = setup().await;
    let curso_id = add_course(&db, "Historia").await;

    let body = format!(
        "nombre=Ana&apellido=Lopez&email=ana%40example.com&curso_id={}",
        curso_id
    );
    let response = app
        .clone()
        .oneshot(post_form("/estudiantes/404/update", &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/cursos");
    assert!(follow(&app, &response).await.contains("Estudiante no encontrado."));
}

#[tokio::test]
async fn duplicate_email_in_other_case_is_rejected() {
    let (app, db) = setup().await;
    let curso_id = add_course(&db, "Historia").await;
    add_student(&db, "ana@example.com", curso_id).await;

    let body = format!(
        "nombre=Ana&apellido=Lopez&email=Ana%40Example.com&curso_id={}",
        curso_id
    );
    let response = app
        .oneshot(post_form("/estudiantes/create", &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("El email ya está registrado."));
}

#[tokio::test]
async fn edit_form_prefills_student() {
    let (app, db) = setup().await;
    let curso_id = add_course(&db, "Historia").await;
    let id = add_student(&db, "ana@example.com", curso_id).await;

    let response = app
        .clone()
        .oneshot(get(&format!("/estudiantes/{}/edit", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let page = body_text(response).await;
    assert!(page.contains("value=\"ana@example.com\""));
    assert!(page.contains(&format!("value=\"{}\" selected", curso_id)));

    let response = app.clone().oneshot(get("/estudiantes/77/edit")).await.unwrap();
    assert_eq!(location(&response), "/cursos");
    assert!(
        follow(&app, &response)
            .await
            .contains("Estudiante no encontrado para editar.")
    );
}

#[tokio::test]
async fn deleting_a_student_returns_to_their_course() {
    let (app, db) = setup().await;
    let curso_id = add_course(&db, "Historia").await;
    let id = add_student(&db, "ana@example.com", curso_id).await;

    let response = app
        .clone()
        .oneshot(post_form(&format!("/estudiantes/{}/delete", id), ""))
        .await
        .unwrap();
    assert_eq!(location(&response), format!("/cursos/{}", curso_id));
    assert!(follow(&app, &response).await.contains("Estudiante eliminado con éxito!"));
    assert!(repository::find_student_by_id(&db, id).await.unwrap().is_none());

    let response = app
        .clone()
        .oneshot(post_form(&format!("/estudiantes/{}/delete", id), ""))
        .await
        .unwrap();
    assert_eq!(location(&response), "/cursos");
    assert!(follow(&app, &response).await.contains("Estudiante no encontrado."));
}

#[tokio::test]
async fn deleting_an_orphaned_student_returns_to_list() {
    let (app, db) = setup().await;
    let curso_id = add_course(&db, "Historia").await;
    let id = add_student(&db, "ana@example.com", curso_id).await;
    repository::delete_course(&db, curso_id).await.unwrap();

    let response = app
        .oneshot(post_form(&format!("/estudiantes/{}/delete", id), ""))
        .await
        .unwrap();
    assert_eq!(location(&response), "/cursos");
}
