pub mod api;
pub mod app;
pub mod config;
pub mod errors;
pub mod grid;
pub mod handlers;
pub mod models;
pub mod state;
pub mod stats;
pub mod storage;
pub mod ui;
pub mod window;

pub use api::{HabitApi, HttpHabitApi};
pub use app::router;
pub use config::Config;
pub use grid::{Clock, LocalClock, ToggleOutcome, WeeklyGridController};
pub use state::AppState;
pub use storage::SessionStore;
pub use window::{Window, compute_window};
