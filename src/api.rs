//! Client for the remote habit backend.
//!
//! [`HabitApi`] is the seam the grid controller and the web handlers talk
//! through; [`HttpHabitApi`] is the `reqwest` implementation used in
//! production. Responses are mapped onto [`ClientError`] so callers can tell
//! recoverable failures from an expired session.

use crate::errors::ClientError;
use crate::models::{
    AuthToken, ContributionResponse, Credentials, Habit, HabitDraft, HabitId, Registration,
    ToggleBody, TrendPoint, User, WeeklyStats,
};
use crate::storage::SessionStore;
use crate::window::{Window, date_key};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url, header};
use serde::{Deserialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::{debug, warn};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HabitApi: Send + Sync {
    async fn list_habits(&self, window: Window) -> Result<Vec<Habit>, ClientError>;
    async fn create_habit(&self, draft: &HabitDraft) -> Result<Habit, ClientError>;
    async fn update_habit(&self, id: &HabitId, draft: &HabitDraft) -> Result<Habit, ClientError>;
    async fn delete_habit(&self, id: &HabitId) -> Result<(), ClientError>;
    async fn toggle_habit(&self, id: &HabitId, date: NaiveDate) -> Result<(), ClientError>;

    async fn weekly_stats(&self) -> Result<WeeklyStats, ClientError>;
    async fn trend(&self) -> Result<Vec<TrendPoint>, ClientError>;
    async fn contributions(&self) -> Result<ContributionResponse, ClientError>;

    async fn login(&self, credentials: &Credentials) -> Result<AuthToken, ClientError>;
    async fn register(&self, registration: &Registration) -> Result<AuthToken, ClientError>;
    async fn current_user(&self) -> Result<User, ClientError>;
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

pub struct HttpHabitApi {
    client: Client,
    base_url: Url,
    session: SessionStore,
}

impl HttpHabitApi {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        session: SessionStore,
    ) -> Result<Self, ClientError> {
        let base_url = base_url.into();
        let base_url = Url::parse(&base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| ClientError::Transport(format!("invalid backend url: {base_url}")))?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            session,
        })
    }

    /// Appends `segments` to the base path, percent-encoding each one so an
    /// id can never add path segments or a query.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        self.client
            .request(method, self.url(segments))
            .header(header::ACCEPT, "application/json")
    }

    async fn authorized(
        &self,
        method: Method,
        segments: &[&str],
    ) -> Result<RequestBuilder, ClientError> {
        let token = self.session.token().await.ok_or(ClientError::Auth)?;
        Ok(self.request(method, segments).bearer_auth(token))
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, ClientError> {
        let response = builder.send().await?;
        let status = response.status();
        debug!(%status, url = %response.url(), "backend response");
        if status.is_success() {
            return Ok(response);
        }

        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            if let Err(err) = self.session.clear().await {
                warn!("failed to clear expired session: {err}");
            }
            return Err(ClientError::Auth);
        }

        let message = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.message)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());

        Err(match status {
            StatusCode::NOT_FOUND => ClientError::NotFound(message),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                ClientError::Validation(message)
            }
            _ => ClientError::Server {
                status: status.as_u16(),
                message,
            },
        })
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = self.send(builder).await?;
        response
            .json()
            .await
            .map_err(|err| ClientError::Decode(err.to_string()))
    }
}

#[async_trait]
impl HabitApi for HttpHabitApi {
    async fn list_habits(&self, window: Window) -> Result<Vec<Habit>, ClientError> {
        let builder = self.authorized(Method::GET, &["habits"]).await?.query(&[
            ("start_date", date_key(window.start)),
            ("end_date", date_key(window.end)),
        ]);
        self.send_json(builder).await
    }

    async fn create_habit(&self, draft: &HabitDraft) -> Result<Habit, ClientError> {
        let builder = self.authorized(Method::POST, &["habits"]).await?.json(draft);
        self.send_json(builder).await
    }

    async fn update_habit(&self, id: &HabitId, draft: &HabitDraft) -> Result<Habit, ClientError> {
        let builder = self
            .authorized(Method::PUT, &["habits", id.as_str()])
            .await?
            .json(draft);
        self.send_json(builder).await
    }

    async fn delete_habit(&self, id: &HabitId) -> Result<(), ClientError> {
        let builder = self
            .authorized(Method::DELETE, &["habits", id.as_str()])
            .await?;
        self.send(builder).await.map(drop)
    }

    async fn toggle_habit(&self, id: &HabitId, date: NaiveDate) -> Result<(), ClientError> {
        let builder = self
            .authorized(Method::POST, &["habits", id.as_str(), "toggle"])
            .await?
            .json(&ToggleBody { date });
        self.send(builder).await.map(drop)
    }

    async fn weekly_stats(&self) -> Result<WeeklyStats, ClientError> {
        let builder = self.authorized(Method::GET, &["stats", "weekly"]).await?;
        self.send_json(builder).await
    }

    async fn trend(&self) -> Result<Vec<TrendPoint>, ClientError> {
        let builder = self.authorized(Method::GET, &["stats", "trend"]).await?;
        self.send_json(builder).await
    }

    async fn contributions(&self) -> Result<ContributionResponse, ClientError> {
        let builder = self.authorized(Method::GET, &["stats", "contribution"]).await?;
        self.send_json(builder).await
    }

    async fn login(&self, credentials: &Credentials) -> Result<AuthToken, ClientError> {
        let builder = self.request(Method::POST, &["login"]).json(credentials);
        self.send_json(builder).await
    }

    async fn register(&self, registration: &Registration) -> Result<AuthToken, ClientError> {
        let builder = self.request(Method::POST, &["register"]).json(registration);
        self.send_json(builder).await
    }

    async fn current_user(&self) -> Result<User, ClientError> {
        let builder = self.authorized(Method::GET, &["user"]).await?;
        self.send_json(builder).await
    }
}
