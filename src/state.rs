use crate::api::HabitApi;
use crate::grid::{Clock, WeeklyGridController};
use crate::storage::SessionStore;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub grid: Arc<WeeklyGridController>,
    pub api: Arc<dyn HabitApi>,
    pub session: SessionStore,
    pub google_redirect: Arc<str>,
    /// One-shot message shown on the next dashboard render.
    pub flash: Arc<Mutex<Option<String>>>,
}

impl AppState {
    pub fn new(
        api: Arc<dyn HabitApi>,
        clock: Arc<dyn Clock>,
        session: SessionStore,
        google_redirect: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            grid: Arc::new(WeeklyGridController::new(Arc::clone(&api), clock)),
            api,
            session,
            google_redirect: google_redirect.into(),
            flash: Arc::new(Mutex::new(None)),
        }
    }

    pub async fn set_flash(&self, message: impl Into<String>) {
        *self.flash.lock().await = Some(message.into());
    }

    pub async fn take_flash(&self) -> Option<String> {
        self.flash.lock().await.take()
    }
}
