use crate::api::HabitApi;
use crate::errors::ClientError;
use crate::models::{ContributionResponse, Habit, TrendPoint, WeeklyStats};
use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::Serialize;
use std::collections::HashMap;
use tracing::warn;

const RECAP_DAYS: usize = 7;

/// Percentage of habits completed on `day`, rounded half away from zero.
pub fn compute_daily_score(day: NaiveDate, habits: &[Habit]) -> u8 {
    let total = habits.len() as u64;
    if total == 0 {
        return 0;
    }
    let completed = habits.iter().filter(|h| h.is_completed_on(day)).count() as u64;
    ((completed * 100 + total / 2) / total) as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreTier {
    Low,
    Medium,
    High,
}

impl ScoreTier {
    pub fn for_score(score: u8) -> Self {
        match score {
            80.. => Self::High,
            40.. => Self::Medium,
            _ => Self::Low,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub count: u32,
    pub level: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthLabel {
    pub name: String,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContributionCalendar {
    pub year: i32,
    pub days: Vec<CalendarDay>,
    pub months: Vec<MonthLabel>,
}

pub fn contribution_level(count: u32) -> u8 {
    count.min(3) as u8
}

/// Year of daily cells ending at `today`, starting on the Sunday on or before
/// the same date one year earlier.
pub fn contribution_calendar(today: NaiveDate, data: &ContributionResponse) -> ContributionCalendar {
    let counts: HashMap<NaiveDate, u32> = data
        .contributions
        .iter()
        .map(|item| (item.date, item.count))
        .collect();

    let year_ago = today
        .checked_sub_months(Months::new(12))
        .unwrap_or(today - Duration::days(365));
    let start = year_ago - Duration::days(year_ago.weekday().num_days_from_sunday() as i64);

    let mut days = Vec::new();
    let mut months = Vec::new();
    let mut current_month = None;
    let mut date = start;
    while date <= today {
        let index = days.len();
        if date.weekday().num_days_from_sunday() == 0 && current_month != Some(date.month()) {
            months.push(MonthLabel {
                name: date.format("%b").to_string(),
                column: index / 7,
            });
            current_month = Some(date.month());
        }

        let count = counts.get(&date).copied().unwrap_or(0);
        days.push(CalendarDay {
            date,
            count,
            level: contribution_level(count),
        });
        date += Duration::days(1);
    }

    ContributionCalendar {
        year: today.year(),
        days,
        months,
    }
}

pub fn recap_trend(points: &[TrendPoint]) -> &[TrendPoint] {
    &points[points.len().saturating_sub(RECAP_DAYS)..]
}

pub fn latest_percentage(points: &[TrendPoint]) -> f64 {
    points.last().map_or(0.0, |point| point.percentage)
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardStats {
    pub weekly: Option<WeeklyStats>,
    pub trend: Vec<TrendPoint>,
    pub recap_trend: Vec<TrendPoint>,
    pub latest_percentage: f64,
    pub contributions: Option<ContributionCalendar>,
}

/// Fetches every stats panel. A panel that fails to load is left empty;
/// an expired session aborts the whole load.
pub async fn load_dashboard_stats(
    api: &dyn HabitApi,
    today: NaiveDate,
) -> Result<DashboardStats, ClientError> {
    let (weekly, trend, contributions) =
        tokio::join!(api.weekly_stats(), api.trend(), api.contributions());

    let weekly = recover("weekly stats", weekly)?;
    let trend = recover("trend", trend)?.unwrap_or_default();
    let contributions = recover("contributions", contributions)?
        .map(|data| contribution_calendar(today, &data));

    Ok(DashboardStats {
        recap_trend: recap_trend(&trend).to_vec(),
        latest_percentage: latest_percentage(&trend),
        weekly,
        trend,
        contributions,
    })
}

fn recover<T>(panel: &str, result: Result<T, ClientError>) -> Result<Option<T>, ClientError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(ClientError::Auth) => Err(ClientError::Auth),
        Err(err) => {
            warn!("failed to load {panel}: {err}");
            Ok(None)
        }
    }
}
