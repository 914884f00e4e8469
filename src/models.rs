use crate::errors::ClientError;
use crate::grid::{GridView, ToggleOutcome};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

pub const DEFAULT_COLOR: &str = "#4f46e5";
pub const MAX_NAME_LEN: usize = 255;

pub const PALETTE: [&str; 11] = [
    "#ef4444", "#f97316", "#f59e0b", "#84cc16", "#10b981", "#06b6d4", "#3b82f6", "#6366f1",
    "#8b5cf6", "#d946ef", "#f43f5e",
];

/// Backend identifier for a habit. Numeric ids are kept in their decimal form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HabitId(String);

impl HabitId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Accepts ids made of ASCII letters, digits, `-` and `_`, the only
    /// shapes the backend hands out.
    pub fn parse(raw: &str) -> Option<Self> {
        let plain = !raw.is_empty()
            && raw
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
        plain.then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HabitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for HabitId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for HabitId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Number(u64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Number(id) => Self(id.to_string()),
            RawId::Text(id) => Self(id),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
    Completed,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub date: NaiveDate,
    pub status: LogStatus,
}

impl LogRecord {
    pub fn completed(date: NaiveDate) -> Self {
        Self {
            date,
            status: LogStatus::Completed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Habit {
    pub id: HabitId,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub logs: Vec<LogRecord>,
}

impl Habit {
    pub fn color_or_default(&self) -> &str {
        swatch(self.color.as_deref())
    }

    pub fn is_completed_on(&self, day: NaiveDate) -> bool {
        self.logs.iter().any(|log| log.date == day)
    }

    /// Removes the log for `day` if one exists, otherwise records a completion.
    /// Returns the new completion state.
    pub fn flip(&mut self, day: NaiveDate) -> bool {
        if self.is_completed_on(day) {
            self.logs.retain(|log| log.date != day);
            false
        } else {
            let at = self.logs.partition_point(|log| log.date < day);
            self.logs.insert(at, LogRecord::completed(day));
            true
        }
    }
}

/// Validated create/edit payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HabitDraft {
    pub name: String,
    pub color: String,
}

impl HabitDraft {
    pub fn new(name: &str, color: Option<&str>) -> Result<Self, ClientError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ClientError::Validation("name must not be empty".into()));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(ClientError::Validation(format!(
                "name must be at most {MAX_NAME_LEN} characters"
            )));
        }

        let color = match color.map(str::trim).filter(|c| !c.is_empty()) {
            None => DEFAULT_COLOR.to_string(),
            Some(c) if is_hex_color(c) => c.to_ascii_lowercase(),
            Some(c) => {
                return Err(ClientError::Validation(format!(
                    "color must be a #rrggbb hex value, got '{c}'"
                )));
            }
        };

        Ok(Self {
            name: name.to_string(),
            color,
        })
    }
}

/// `color` when it is a `#rrggbb` value, otherwise the default.
pub fn swatch(color: Option<&str>) -> &str {
    color.filter(|c| is_hex_color(c)).unwrap_or(DEFAULT_COLOR)
}

fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}

#[derive(Debug, Serialize)]
pub struct ToggleBody {
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionSlice {
    pub name: String,
    pub value: u64,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyStats {
    pub weekly_completions: u64,
    pub consistent_days: u64,
    pub current_streak: u64,
    #[serde(default)]
    pub distribution: Vec<DistributionSlice>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub date: NaiveDate,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ContributionResponse {
    #[serde(default)]
    pub contributions: Vec<Contribution>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: HabitId,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthToken {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct WeekRequest {
    #[serde(default)]
    pub offset: i64,
    #[serde(default)]
    pub today: bool,
}

#[derive(Debug, Deserialize)]
pub struct HabitForm {
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub password_confirmation: String,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginPageQuery {
    pub mode: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub outcome: ToggleOutcome,
    pub grid: GridView,
}
