use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/login", get(handlers::login_page).post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route("/auth/google", get(handlers::google))
        .route("/auth/callback", get(handlers::auth_callback))
        .route("/dashboard", get(handlers::dashboard))
        .route("/week/prev", post(handlers::week_prev))
        .route("/week/next", post(handlers::week_next))
        .route("/week/today", post(handlers::week_today))
        .route("/habits", post(handlers::create_habit))
        .route("/habits/:id", post(handlers::update_habit))
        .route("/habits/:id/delete", post(handlers::delete_habit))
        .route("/habits/:id/toggle", post(handlers::toggle_form))
        .route("/api/grid", get(handlers::get_grid))
        .route("/api/week", post(handlers::change_week))
        .route("/api/habits/:id/toggle", post(handlers::toggle))
        .route("/api/stats", get(handlers::get_stats))
        .with_state(state)
}
