#![allow(dead_code)]

use axum::{
    Json, Router,
    extract::{Path, Query, Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::sync::Mutex;

pub const TOKEN: &str = "test-token";

#[derive(Debug, Clone)]
pub struct StoredHabit {
    pub id: u64,
    pub name: String,
    pub color: Option<String>,
    pub completed: Vec<NaiveDate>,
}

#[derive(Debug, Default)]
pub struct BackendData {
    pub habits: Vec<StoredHabit>,
    pub next_id: u64,
    pub fail_toggles: bool,
    pub fail_deletes: bool,
    pub list_calls: usize,
    /// `METHOD path?query` of every request, as received.
    pub requests: Vec<String>,
}

/// In-process stand-in for the habit REST backend.
#[derive(Clone, Default)]
pub struct FakeBackend {
    pub data: Arc<Mutex<BackendData>>,
}

impl FakeBackend {
    pub async fn add_habit(&self, name: &str, completed: &[NaiveDate]) -> u64 {
        let mut data = self.data.lock().await;
        data.next_id += 1;
        let id = data.next_id;
        data.habits.push(StoredHabit {
            id,
            name: name.to_string(),
            color: None,
            completed: completed.to_vec(),
        });
        id
    }

    pub async fn set_fail_toggles(&self, fail: bool) {
        self.data.lock().await.fail_toggles = fail;
    }

    pub async fn set_fail_deletes(&self, fail: bool) {
        self.data.lock().await.fail_deletes = fail;
    }

    pub async fn is_completed(&self, id: u64, date: NaiveDate) -> bool {
        self.data
            .lock()
            .await
            .habits
            .iter()
            .any(|h| h.id == id && h.completed.contains(&date))
    }

    pub async fn requests(&self) -> Vec<String> {
        self.data.lock().await.requests.clone()
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/api/habits", get(list_habits).post(create_habit))
            .route("/api/habits/:id", axum::routing::put(update_habit).delete(delete_habit))
            .route("/api/habits/:id/toggle", post(toggle_habit))
            .route("/api/stats/weekly", get(weekly_stats))
            .route("/api/stats/trend", get(trend))
            .route("/api/stats/contribution", get(contribution))
            .route("/api/login", post(login))
            .route("/api/user", get(user))
            .layer(middleware::from_fn_with_state(self.clone(), record))
            .with_state(self.clone())
    }

    /// Serves the backend on a random local port and returns its API base URL.
    pub async fn spawn(&self) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake backend");
        let addr = listener.local_addr().unwrap();
        let app = self.router();
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("fake backend crashed");
        });
        format!("http://{addr}/api")
    }
}

async fn record(State(backend): State<FakeBackend>, request: Request, next: Next) -> Response {
    let line = format!("{} {}", request.method(), request.uri());
    backend.data.lock().await.requests.push(line);
    next.run(request).await
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {TOKEN}"))
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Unauthenticated." }))).into_response()
}

fn habit_json(habit: &StoredHabit, range: Option<(NaiveDate, NaiveDate)>) -> Value {
    let logs: Vec<Value> = habit
        .completed
        .iter()
        .filter(|d| range.is_none_or(|(start, end)| start <= **d && **d <= end))
        .map(|d| json!({ "date": d, "status": "completed" }))
        .collect();
    json!({ "id": habit.id, "name": habit.name, "color": habit.color, "logs": logs })
}

#[derive(Deserialize)]
struct RangeQuery {
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
}

async fn list_habits(
    State(backend): State<FakeBackend>,
    headers: HeaderMap,
    Query(range): Query<RangeQuery>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut data = backend.data.lock().await;
    data.list_calls += 1;
    let range = range.start_date.zip(range.end_date);
    let habits: Vec<Value> = data.habits.iter().map(|h| habit_json(h, range)).collect();
    Json(habits).into_response()
}

#[derive(Deserialize)]
struct HabitBody {
    name: String,
    color: Option<String>,
}

async fn create_habit(
    State(backend): State<FakeBackend>,
    headers: HeaderMap,
    Json(body): Json<HabitBody>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    if body.name.to_lowercase().contains("forbidden") {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "message": "The name field is invalid." })),
        )
            .into_response();
    }
    let mut data = backend.data.lock().await;
    data.next_id += 1;
    let habit = StoredHabit {
        id: data.next_id,
        name: body.name,
        color: body.color,
        completed: vec![],
    };
    let response = habit_json(&habit, None);
    data.habits.push(habit);
    (StatusCode::CREATED, Json(response)).into_response()
}

async fn update_habit(
    State(backend): State<FakeBackend>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(body): Json<HabitBody>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut data = backend.data.lock().await;
    match data.habits.iter_mut().find(|h| h.id == id) {
        Some(habit) => {
            habit.name = body.name;
            habit.color = body.color;
            Json(habit_json(habit, None)).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn delete_habit(
    State(backend): State<FakeBackend>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut data = backend.data.lock().await;
    if data.fail_deletes {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    let before = data.habits.len();
    data.habits.retain(|h| h.id != id);
    if data.habits.len() == before {
        return (StatusCode::NOT_FOUND, Json(json!({ "message": "Habit not found." })))
            .into_response();
    }
    StatusCode::NO_CONTENT.into_response()
}

#[derive(Deserialize)]
struct ToggleBody {
    date: NaiveDate,
}

async fn toggle_habit(
    State(backend): State<FakeBackend>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(body): Json<ToggleBody>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut data = backend.data.lock().await;
    if data.fail_toggles {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "Server Error" })),
        )
            .into_response();
    }
    let Some(habit) = data.habits.iter_mut().find(|h| h.id == id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    if let Some(pos) = habit.completed.iter().position(|d| *d == body.date) {
        habit.completed.remove(pos);
    } else {
        habit.completed.push(body.date);
        habit.completed.sort();
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn weekly_stats(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!({
        "weekly_completions": 12,
        "consistent_days": 4,
        "current_streak": 3,
        "distribution": [{ "name": "Read", "value": 5, "color": "#10b981" }],
        "start_date": "2024-04-29",
        "end_date": "2024-05-05"
    }))
    .into_response()
}

async fn trend(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let points: Vec<Value> = (1..=9)
        .map(|d| json!({ "date": format!("2024-05-0{d}"), "percentage": d * 10 }))
        .collect();
    Json(points).into_response()
}

async fn contribution(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!({ "contributions": [{ "date": "2024-05-01", "count": 2 }] })).into_response()
}

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

async fn login(Json(body): Json<LoginBody>) -> Response {
    if body.email == "sam@example.com" && body.password == "secret" {
        Json(json!({ "token": TOKEN })).into_response()
    } else {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "message": "These credentials do not match our records." })),
        )
            .into_response()
    }
}

async fn user(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!({ "id": 1, "name": "Sam", "email": "sam@example.com" })).into_response()
}
