use crate::errors::{AppError, ClientError};
use crate::grid::GridView;
use crate::models::{
    CallbackQuery, Credentials, HabitForm, HabitId, LoginForm, LoginPageQuery, Registration,
    ToggleRequest, ToggleResponse, WeekRequest,
};
use crate::state::AppState;
use crate::stats::{DashboardStats, load_dashboard_stats};
use crate::ui::{render_dashboard, render_login};
use axum::{
    Form, Json,
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use tracing::{info, warn};

pub async fn index(State(state): State<AppState>) -> Redirect {
    if state.session.token().await.is_some() {
        Redirect::to("/dashboard")
    } else {
        Redirect::to("/login")
    }
}

pub async fn login_page(Query(query): Query<LoginPageQuery>) -> Html<String> {
    let register = query.mode.as_deref() == Some("register");
    Html(render_login(register, None))
}

pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let register = form.mode.as_deref() == Some("register");
    if register && form.password != form.password_confirmation {
        return Ok(Html(render_login(true, Some("Passwords do not match"))).into_response());
    }

    let result = if register {
        let registration = Registration {
            name: form.name,
            email: form.email,
            password: form.password,
            password_confirmation: form.password_confirmation,
        };
        state.api.register(&registration).await
    } else {
        let credentials = Credentials {
            email: form.email,
            password: form.password,
        };
        state.api.login(&credentials).await
    };

    match result {
        Ok(auth) => {
            state.session.store(auth.token).await?;
            state.grid.jump_to_today().await;
            Ok(Redirect::to("/dashboard").into_response())
        }
        Err(err) => {
            warn!("login failed: {err}");
            let message = login_error_message(&err);
            Ok(Html(render_login(register, Some(&message))).into_response())
        }
    }
}

fn login_error_message(err: &ClientError) -> String {
    match err {
        ClientError::Validation(message)
        | ClientError::NotFound(message)
        | ClientError::Server { message, .. } => message.clone(),
        ClientError::Auth => "Invalid credentials".into(),
        ClientError::Transport(_) | ClientError::Decode(_) => "Something went wrong".into(),
    }
}

pub async fn google(State(state): State<AppState>) -> Redirect {
    Redirect::to(&state.google_redirect)
}

pub async fn auth_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Result<Redirect, AppError> {
    match query.token.filter(|token| !token.is_empty()) {
        Some(token) => {
            state.session.store(token).await?;
            Ok(Redirect::to("/dashboard"))
        }
        None => Ok(Redirect::to("/login")),
    }
}

pub async fn logout(State(state): State<AppState>) -> Result<Redirect, AppError> {
    state.session.clear().await?;
    info!("logged out");
    Ok(Redirect::to("/login"))
}

pub async fn dashboard(State(state): State<AppState>) -> Result<Response, AppError> {
    if state.session.token().await.is_none() {
        return Ok(Redirect::to("/login").into_response());
    }

    let user = state.api.current_user().await?;
    let mut status = state.take_flash().await;
    if let Err(err) = state.grid.refresh().await {
        if err.is_auth() {
            return Err(err.into());
        }
        status.get_or_insert_with(|| "Could not refresh habits, showing the last loaded week.".into());
    }

    let stats = load_dashboard_stats(state.api.as_ref(), state.grid.today()).await?;
    let view = state.grid.view().await;
    Ok(Html(render_dashboard(&view, &user, &stats, status.as_deref())).into_response())
}

pub async fn week_prev(State(state): State<AppState>) -> Result<Redirect, AppError> {
    state.grid.navigate(-1).await?;
    Ok(Redirect::to("/dashboard"))
}

pub async fn week_next(State(state): State<AppState>) -> Result<Redirect, AppError> {
    state.grid.navigate(1).await?;
    Ok(Redirect::to("/dashboard"))
}

pub async fn week_today(State(state): State<AppState>) -> Redirect {
    state.grid.jump_to_today().await;
    Redirect::to("/dashboard")
}

pub async fn create_habit(
    State(state): State<AppState>,
    Form(form): Form<HabitForm>,
) -> Result<Redirect, AppError> {
    let result = state
        .grid
        .create_habit(&form.name, form.color.as_deref())
        .await;
    after_form_action(&state, result.map(drop), "Failed to save habit").await
}

pub async fn update_habit(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<HabitForm>,
) -> Result<Redirect, AppError> {
    let result = state
        .grid
        .update_habit(&habit_id(&id)?, &form.name, form.color.as_deref())
        .await;
    after_form_action(&state, result.map(drop), "Failed to save habit").await
}

pub async fn delete_habit(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Redirect, AppError> {
    let result = state.grid.delete_habit(&habit_id(&id)?).await;
    after_form_action(&state, result, "Failed to delete habit").await
}

pub async fn toggle_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(request): Form<ToggleRequest>,
) -> Result<Redirect, AppError> {
    let result = state
        .grid
        .toggle_completion(&habit_id(&id)?, request.date)
        .await;
    after_form_action(&state, result.map(drop), "Failed to update habit").await
}

fn habit_id(raw: &str) -> Result<HabitId, AppError> {
    HabitId::parse(raw).ok_or_else(|| AppError::bad_request(format!("invalid habit id: {raw}")))
}

async fn after_form_action(
    state: &AppState,
    result: Result<(), ClientError>,
    failure: &str,
) -> Result<Redirect, AppError> {
    match result {
        Ok(()) => Ok(Redirect::to("/dashboard")),
        Err(ClientError::Auth) => Err(AppError::login_required()),
        Err(ClientError::Validation(message)) => {
            state.set_flash(format!("{failure}: {message}")).await;
            Ok(Redirect::to("/dashboard"))
        }
        Err(_) => {
            state.set_flash(failure).await;
            Ok(Redirect::to("/dashboard"))
        }
    }
}

pub async fn get_grid(State(state): State<AppState>) -> Result<Json<GridView>, AppError> {
    refresh_keeping_stale(&state).await?;
    Ok(Json(state.grid.view().await))
}

pub async fn toggle(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ToggleRequest>,
) -> Result<Json<ToggleResponse>, AppError> {
    let outcome = state
        .grid
        .toggle_completion(&habit_id(&id)?, request.date)
        .await?;
    Ok(Json(ToggleResponse {
        outcome,
        grid: state.grid.view().await,
    }))
}

pub async fn change_week(
    State(state): State<AppState>,
    Json(request): Json<WeekRequest>,
) -> Result<Json<GridView>, AppError> {
    if request.today {
        state.grid.jump_to_today().await;
    } else if request.offset != 0 {
        state.grid.navigate(request.offset).await?;
    }
    refresh_keeping_stale(&state).await?;
    Ok(Json(state.grid.view().await))
}

pub async fn get_stats(State(state): State<AppState>) -> Result<Json<DashboardStats>, AppError> {
    let stats = load_dashboard_stats(state.api.as_ref(), state.grid.today()).await?;
    Ok(Json(stats))
}

/// Refreshes the grid; only an expired session is an error, anything else
/// leaves the last snapshot on display.
async fn refresh_keeping_stale(state: &AppState) -> Result<(), AppError> {
    match state.grid.refresh().await {
        Err(ClientError::Auth) => Err(AppError::login_required()),
        _ => Ok(()),
    }
}
