// tests/common/mod.rs

#![allow(dead_code)]

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;
use tryout_client::{
    api::ApiClient,
    models::{
        attempt::{Attempt, AttemptStatus},
        question::ServerQuestion,
        tryout::{Package, Tryout},
    },
    utils::token::TokenStore,
};

pub const TEST_TOKEN: &str = "test-token";
pub const TRYOUT_ID: &str = "TO 2025/MTK";

/// In-memory backend state, shared with the test body.
pub struct Backend {
    pub attempts: Vec<Attempt>,
    pub questions: Vec<ServerQuestion>,
    pub tryouts: Vec<Tryout>,
    pub packages: Vec<Package>,
    pub owned_package_ids: Vec<String>,
    pub photo: String,
    /// When set, every PATCH to an attempt fails with 500.
    pub fail_patches: bool,
    /// Bodies of every accepted attempt PATCH, in arrival order.
    pub patches: Vec<serde_json::Value>,
    pub codes_sent: usize,
}

pub type SharedBackend = Arc<Mutex<Backend>>;

pub struct TestApp {
    pub address: String,
    pub backend: SharedBackend,
    pub client: ApiClient,
    token_dir: tempfile::TempDir,
}

impl TestApp {
    pub fn set_fail_patches(&self, fail: bool) {
        self.backend.lock().unwrap().fail_patches = fail;
    }

    pub fn stored_attempt(&self, number: i64) -> Attempt {
        self.backend
            .lock()
            .unwrap()
            .attempts
            .iter()
            .find(|a| a.attempt_number == number)
            .cloned()
            .expect("attempt exists")
    }

    /// Client without a stored token.
    pub fn anonymous_client(&self) -> ApiClient {
        let path = self.token_dir.path().join("nobody");
        ApiClient::new(&self.address, TokenStore::new(path), Duration::from_secs(5))
            .expect("client builds")
    }
}

pub fn question(id: i64, key: &str) -> ServerQuestion {
    ServerQuestion {
        id,
        question_text: format!("Soal nomor {} $$x^{}$$", id, id),
        option_a: Some("satu".to_string()),
        option_b: Some("dua".to_string()),
        option_c: Some("tiga".to_string()),
        option_d: Some("empat".to_string()),
        answer_key: Some(key.to_string()),
        explanation: Some(format!("Pembahasan {}", id)),
        ..ServerQuestion::default()
    }
}

pub fn ongoing_attempt(number: i64, question_order: &str, answer_order: &str) -> Attempt {
    Attempt {
        id: number,
        user_id: 1,
        tryout_id: TRYOUT_ID.to_string(),
        attempt_number: number,
        grade: None,
        status: AttemptStatus::Ongoing,
        question_order: question_order.to_string(),
        answer_order: answer_order.to_string(),
        start_time: Some(Utc::now()),
        submitted_at: None,
        duration_minutes: Some(90),
    }
}

fn tryout(id: &str, paket_id: &str) -> Tryout {
    Tryout {
        id: id.to_string(),
        name: format!("Tryout {}", id),
        description: String::new(),
        created_at: None,
        paket_id: paket_id.to_string(),
        pdf_url: None,
        duration_minutes: Some(90),
        materials: Vec::new(),
        attempts_allowed: None,
        time_limit: None,
        grading_method: None,
    }
}

fn package(id: &str) -> Package {
    Package {
        id: id.to_string(),
        name: format!("Paket {}", id),
        price: "150000.00".to_string(),
        image: None,
        detail1: Some("30 soal".to_string()),
        detail2: None,
        detail3: None,
        detail4: None,
        detail5: None,
    }
}

/// Spawns the fake backend on a random port with a logged-in client.
pub async fn spawn_app() -> TestApp {
    // 1. Seed the backend
    let backend = Arc::new(Mutex::new(Backend {
        attempts: vec![ongoing_attempt(1, "5,2,1,3", "a,-f,-,-")],
        questions: vec![question(1, "c"), question(2, "2"), question(3, "d"), question(5, "a")],
        tryouts: vec![tryout(TRYOUT_ID, "P1"), tryout("TO-2", "P2")],
        packages: vec![package("P1"), package("P2"), package("P3")],
        owned_package_ids: vec!["P1".to_string()],
        photo: "foto1".to_string(),
        fail_patches: false,
        patches: Vec::new(),
        codes_sent: 0,
    }));

    // 2. Build the router
    let app = Router::new()
        .route("/quizattempt/start", post(start_attempt))
        .route("/quizattempt/{tryout_id}", get(list_attempts))
        .route(
            "/quizattempt/{tryout_id}/{attempt_number}",
            get(get_attempt).patch(update_attempt),
        )
        .route("/questions", get(list_questions))
        .route("/pdf-proxy", get(pdf_proxy))
        .route("/tryouts", get(list_tryouts))
        .route("/tryouts/{id}", get(get_tryout))
        .route("/pakets", get(list_packages))
        .route("/user-pakets", get(list_owned_packages))
        .route("/user", get(get_user))
        .route("/user/foto", patch(update_photo))
        .route("/user/send-code", post(send_code))
        .route("/user/verify-code", patch(verify_code))
        .route("/register", post(register))
        .layer(TraceLayer::new_for_http())
        .with_state(backend.clone());

    // 3. Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    // 4. Spawn the server in the background
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // 5. Logged-in client
    let token_dir = tempfile::tempdir().expect("tempdir");
    let tokens = TokenStore::new(token_dir.path().join("token"));
    tokens.save(TEST_TOKEN).expect("token saved");
    let client =
        ApiClient::new(&address, tokens, Duration::from_secs(5)).expect("client builds");

    TestApp {
        address,
        backend,
        client,
        token_dir,
    }
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn authorize(headers: &HeaderMap) -> Result<(), Response> {
    let expected = format!("Bearer {}", TEST_TOKEN);
    match headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => Ok(()),
        _ => Err(error(StatusCode::UNAUTHORIZED, "Missing or invalid token")),
    }
}

#[derive(Deserialize)]
struct StartBody {
    tryout_id: String,
}

async fn start_attempt(
    State(backend): State<SharedBackend>,
    headers: HeaderMap,
    Json(body): Json<StartBody>,
) -> Response {
    if let Err(res) = authorize(&headers) {
        return res;
    }
    let mut backend = backend.lock().unwrap();
    let number = backend
        .attempts
        .iter()
        .filter(|a| a.tryout_id == body.tryout_id)
        .count() as i64
        + 1;
    let mut attempt = ongoing_attempt(number, "1,2,3,5", "-,-,-,-");
    attempt.tryout_id = body.tryout_id;
    backend.attempts.push(attempt.clone());
    (StatusCode::CREATED, Json(attempt)).into_response()
}

async fn list_attempts(
    State(backend): State<SharedBackend>,
    headers: HeaderMap,
    Path(tryout_id): Path<String>,
) -> Response {
    if let Err(res) = authorize(&headers) {
        return res;
    }
    let backend = backend.lock().unwrap();
    let attempts: Vec<Attempt> = backend
        .attempts
        .iter()
        .filter(|a| a.tryout_id == tryout_id)
        .cloned()
        .collect();
    Json(attempts).into_response()
}

async fn get_attempt(
    State(backend): State<SharedBackend>,
    headers: HeaderMap,
    Path((tryout_id, number)): Path<(String, i64)>,
) -> Response {
    if let Err(res) = authorize(&headers) {
        return res;
    }
    let backend = backend.lock().unwrap();
    match backend
        .attempts
        .iter()
        .find(|a| a.tryout_id == tryout_id && a.attempt_number == number)
    {
        Some(attempt) => Json(attempt.clone()).into_response(),
        None => error(StatusCode::NOT_FOUND, "Attempt not found"),
    }
}

#[derive(Deserialize)]
struct PatchBody {
    answer_order: Option<String>,
    status: Option<AttemptStatus>,
    submitted_at: Option<chrono::DateTime<Utc>>,
    grade: Option<String>,
}

async fn update_attempt(
    State(backend): State<SharedBackend>,
    headers: HeaderMap,
    Path((tryout_id, number)): Path<(String, i64)>,
    Json(raw): Json<serde_json::Value>,
) -> Response {
    if let Err(res) = authorize(&headers) {
        return res;
    }
    let mut backend = backend.lock().unwrap();
    if backend.fail_patches {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "database unavailable");
    }

    let body: PatchBody = match serde_json::from_value(raw.clone()) {
        Ok(body) => body,
        Err(_) => return error(StatusCode::BAD_REQUEST, "Invalid body"),
    };
    backend.patches.push(raw);

    let Some(attempt) = backend
        .attempts
        .iter_mut()
        .find(|a| a.tryout_id == tryout_id && a.attempt_number == number)
    else {
        return error(StatusCode::NOT_FOUND, "Attempt not found");
    };

    if let Some(order) = body.answer_order {
        attempt.answer_order = order;
    }
    if let Some(status) = body.status {
        attempt.status = status;
    }
    if body.submitted_at.is_some() {
        attempt.submitted_at = body.submitted_at;
    }
    if body.grade.is_some() {
        attempt.grade = body.grade;
    }
    Json(attempt.clone()).into_response()
}

#[derive(Deserialize)]
struct TryoutQuery {
    #[serde(rename = "tryoutId")]
    tryout_id: Option<String>,
}

async fn list_questions(
    State(backend): State<SharedBackend>,
    headers: HeaderMap,
    Query(query): Query<TryoutQuery>,
) -> Response {
    if let Err(res) = authorize(&headers) {
        return res;
    }
    if query.tryout_id.as_deref() != Some(TRYOUT_ID) {
        return Json(Vec::<ServerQuestion>::new()).into_response();
    }
    Json(backend.lock().unwrap().questions.clone()).into_response()
}

async fn pdf_proxy(headers: HeaderMap, Query(query): Query<TryoutQuery>) -> Response {
    if let Err(res) = authorize(&headers) {
        return res;
    }
    match query.tryout_id.as_deref() {
        Some(TRYOUT_ID) => (
            [(header::CONTENT_TYPE, "application/pdf")],
            b"%PDF-1.4\n%fake\n".to_vec(),
        )
            .into_response(),
        Some(_) => (
            [(header::CONTENT_TYPE, "text/html")],
            "<html>not found</html>",
        )
            .into_response(),
        None => error(StatusCode::BAD_REQUEST, "tryoutId is required"),
    }
}

async fn list_tryouts(State(backend): State<SharedBackend>, headers: HeaderMap) -> Response {
    if let Err(res) = authorize(&headers) {
        return res;
    }
    Json(backend.lock().unwrap().tryouts.clone()).into_response()
}

async fn get_tryout(
    State(backend): State<SharedBackend>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(res) = authorize(&headers) {
        return res;
    }
    let backend = backend.lock().unwrap();
    match backend.tryouts.iter().find(|t| t.id == id) {
        Some(tryout) => Json(tryout.clone()).into_response(),
        None => error(StatusCode::NOT_FOUND, "Tryout not found"),
    }
}

async fn list_packages(State(backend): State<SharedBackend>) -> Response {
    Json(backend.lock().unwrap().packages.clone()).into_response()
}

async fn list_owned_packages(State(backend): State<SharedBackend>, headers: HeaderMap) -> Response {
    if let Err(res) = authorize(&headers) {
        return res;
    }
    let backend = backend.lock().unwrap();
    let owned: Vec<serde_json::Value> = backend
        .packages
        .iter()
        .filter(|p| backend.owned_package_ids.contains(&p.id))
        .map(|p| {
            json!({
                "id": p.id,
                "name": p.name,
                "price": 150000,
                "closed_at": "2030-01-01T00:00:00Z"
            })
        })
        .collect();
    Json(owned).into_response()
}

async fn get_user(State(backend): State<SharedBackend>, headers: HeaderMap) -> Response {
    if let Err(res) = authorize(&headers) {
        return res;
    }
    let photo = backend.lock().unwrap().photo.clone();
    Json(json!({ "email": "siswa@example.com", "foto": photo })).into_response()
}

#[derive(Deserialize)]
struct PhotoBody {
    foto: String,
}

async fn update_photo(
    State(backend): State<SharedBackend>,
    headers: HeaderMap,
    Json(body): Json<PhotoBody>,
) -> Response {
    if let Err(res) = authorize(&headers) {
        return res;
    }
    backend.lock().unwrap().photo = body.foto;
    Json(json!({ "message": "Photo updated" })).into_response()
}

async fn send_code(State(backend): State<SharedBackend>, headers: HeaderMap) -> Response {
    if let Err(res) = authorize(&headers) {
        return res;
    }
    backend.lock().unwrap().codes_sent += 1;
    Json(json!({ "message": "Code sent" })).into_response()
}

#[derive(Deserialize)]
struct VerifyBody {
    code: String,
    #[serde(rename = "newPassword")]
    new_password: String,
}

async fn verify_code(headers: HeaderMap, Json(body): Json<VerifyBody>) -> Response {
    if let Err(res) = authorize(&headers) {
        return res;
    }
    if body.code != "123456" || body.new_password.len() < 8 {
        return error(StatusCode::BAD_REQUEST, "Invalid verification code");
    }
    Json(json!({ "message": "Password changed" })).into_response()
}

#[derive(Deserialize)]
struct RegisterBody {
    email: String,
    password: String,
}

async fn register(Json(body): Json<RegisterBody>) -> Response {
    if body.email == "taken@example.com" {
        return error(StatusCode::CONFLICT, "Email already registered");
    }
    let _ = body.password;
    (StatusCode::CREATED, Json(json!({ "message": "Registered" }))).into_response()
}
