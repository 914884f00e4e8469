use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

pub const DAYS_PER_WINDOW: i64 = 7;

/// Monday-to-Sunday span of days shown by the weekly grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Window {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Window {
    /// The week holding `anchor`, or `None` when that week runs past the
    /// calendar's representable range.
    pub fn try_containing(anchor: NaiveDate) -> Option<Self> {
        let start = week_start(anchor)?;
        let end = start.checked_add_signed(Duration::days(DAYS_PER_WINDOW - 1))?;
        Some(Self { start, end })
    }

    /// Like [`Window::try_containing`], but a date in a week cut off by the
    /// calendar's range falls back to the nearest complete week.
    pub fn containing(anchor: NaiveDate) -> Self {
        Self::try_containing(anchor)
            .or_else(|| nearest_complete(anchor, -1))
            .or_else(|| nearest_complete(anchor, 1))
            .unwrap_or(Self {
                start: anchor,
                end: anchor,
            })
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let start = self.start;
        (0..DAYS_PER_WINDOW).filter_map(move |offset| start.checked_add_signed(Duration::days(offset)))
    }

    pub fn shift(&self, weeks: i64) -> Option<Self> {
        shift_anchor(self.start, weeks).and_then(Self::try_containing)
    }

    pub fn label(&self) -> String {
        format!(
            "{} - {}",
            self.start.format("%b %-d"),
            self.end.format("%b %-d, %Y")
        )
    }

    pub fn week_label(&self) -> String {
        let iso = self.start.iso_week();
        format!("{}-W{:02}", iso.year(), iso.week())
    }
}

pub fn compute_window(anchor: NaiveDate) -> Window {
    Window::containing(anchor)
}

/// Moves an anchor by whole weeks, keeping its weekday. `None` when the
/// target week is not representable.
pub fn shift_anchor(anchor: NaiveDate, weeks: i64) -> Option<NaiveDate> {
    let shifted = anchor.checked_add_signed(Duration::try_weeks(weeks)?)?;
    Window::try_containing(shifted).map(|_| shifted)
}

pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn week_start(date: NaiveDate) -> Option<NaiveDate> {
    date.checked_sub_signed(Duration::days(date.weekday().num_days_from_monday() as i64))
}

fn nearest_complete(anchor: NaiveDate, weeks: i64) -> Option<Window> {
    anchor
        .checked_add_signed(Duration::weeks(weeks))
        .and_then(Window::try_containing)
}
