//! Weekly habit grid: window selection, snapshot loading and optimistic
//! completion toggles reconciled against the backend.
//!
//! [`GridState`] holds everything that changes and is only touched through
//! synchronous transitions. [`WeeklyGridController`] drives it, locking the
//! state around each transition and never across a backend call. Every load
//! carries the window it was requested for and a sequence number. A response
//! is dropped when the user has since moved to another week, or when a newer
//! load, a navigation or a local edit happened after it was issued.

use crate::api::HabitApi;
use crate::errors::{ClientError, NavigationError};
use crate::models::{Habit, HabitDraft, HabitId};
use crate::stats::{ScoreTier, compute_daily_score};
use crate::window::{Window, compute_window, shift_anchor};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

pub struct LocalClock;

impl Clock for LocalClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Lifecycle of a single toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationPhase {
    Idle,
    OptimisticallyApplied,
    Confirmed,
    Reverting,
}

impl MutationPhase {
    pub fn can_transition_to(self, next: MutationPhase) -> bool {
        use MutationPhase::*;
        matches!(
            (self, next),
            (Idle, OptimisticallyApplied)
                | (OptimisticallyApplied, Confirmed)
                | (OptimisticallyApplied, Reverting)
                | (Reverting, Idle)
        )
    }
}

pub type MutationId = u64;
pub type LoadId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleOutcome {
    /// The day was not today; nothing changed.
    Skipped,
    Confirmed,
    /// The backend rejected the toggle and the window was re-fetched.
    Reconciled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub window: Window,
    pub habits: Vec<Habit>,
}

#[derive(Debug)]
pub struct GridState {
    anchor: NaiveDate,
    snapshot: Option<Snapshot>,
    next_mutation: MutationId,
    mutations: BTreeMap<MutationId, MutationPhase>,
    next_load: LoadId,
    installed_load: Option<LoadId>,
    /// Loads issued before this one predate the latest navigation or edit.
    fresh_from: LoadId,
}

impl GridState {
    pub fn new(anchor: NaiveDate) -> Self {
        Self {
            anchor,
            snapshot: None,
            next_mutation: 0,
            mutations: BTreeMap::new(),
            next_load: 0,
            installed_load: None,
            fresh_from: 0,
        }
    }

    pub fn anchor(&self) -> NaiveDate {
        self.anchor
    }

    pub fn window(&self) -> Window {
        compute_window(self.anchor)
    }

    /// Moves the anchor by whole weeks. The anchor is left alone when the
    /// target week is outside the calendar.
    pub fn navigate(&mut self, weeks: i64) -> Result<Window, NavigationError> {
        let anchor = shift_anchor(self.anchor, weeks).ok_or(NavigationError {
            anchor: self.anchor,
            weeks,
        })?;
        Ok(self.jump_to(anchor))
    }

    pub fn jump_to(&mut self, anchor: NaiveDate) -> Window {
        self.anchor = anchor;
        self.invalidate_loads();
        self.window()
    }

    /// Hands out the sequence number for a new load.
    pub fn begin_load(&mut self) -> LoadId {
        let id = self.next_load;
        self.next_load += 1;
        id
    }

    fn invalidate_loads(&mut self) {
        self.fresh_from = self.next_load;
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    pub fn habits(&self) -> &[Habit] {
        self.snapshot.as_ref().map_or(&[], |s| s.habits.as_slice())
    }

    /// True while the held snapshot belongs to a different window.
    pub fn is_stale(&self) -> bool {
        self.snapshot
            .as_ref()
            .is_none_or(|snapshot| snapshot.window != self.window())
    }

    /// Installs a snapshot fetched for `window` by `load`. Returns false and
    /// leaves the state untouched when `window` is no longer displayed, or
    /// when the load is older than the installed one or than the latest
    /// navigation or local edit.
    pub fn apply_snapshot(&mut self, load: LoadId, window: Window, habits: Vec<Habit>) -> bool {
        if window != self.window()
            || load < self.fresh_from
            || self.installed_load.is_some_and(|installed| load <= installed)
        {
            return false;
        }
        self.installed_load = Some(load);
        let habits = habits
            .into_iter()
            .map(|habit| normalize(habit, window))
            .collect();
        self.snapshot = Some(Snapshot { window, habits });
        true
    }

    /// Flips completion for `(habit_id, day)` in the local snapshot. Returns
    /// false when the snapshot does not hold that habit or day.
    pub fn flip_completion(&mut self, habit_id: &HabitId, day: NaiveDate) -> bool {
        let Some(snapshot) = self.snapshot.as_mut() else {
            return false;
        };
        if !snapshot.window.contains(day) {
            return false;
        }
        let Some(habit) = snapshot.habits.iter_mut().find(|h| &h.id == habit_id) else {
            return false;
        };
        habit.flip(day);
        self.invalidate_loads();
        true
    }

    pub fn remove_habit(&mut self, habit_id: &HabitId) -> Option<Habit> {
        let snapshot = self.snapshot.as_mut()?;
        let index = snapshot.habits.iter().position(|h| &h.id == habit_id)?;
        let removed = snapshot.habits.remove(index);
        self.invalidate_loads();
        Some(removed)
    }

    pub fn begin_mutation(&mut self) -> MutationId {
        let id = self.next_mutation;
        self.next_mutation += 1;
        self.mutations.insert(id, MutationPhase::Idle);
        id
    }

    pub fn advance(&mut self, id: MutationId, next: MutationPhase) -> bool {
        match self.mutations.get_mut(&id) {
            Some(phase) if phase.can_transition_to(next) => {
                *phase = next;
                true
            }
            Some(phase) => {
                warn!(mutation = id, from = ?phase, to = ?next, "rejected mutation transition");
                false
            }
            None => false,
        }
    }

    pub fn finish_mutation(&mut self, id: MutationId) -> Option<MutationPhase> {
        self.mutations.remove(&id)
    }

    pub fn mutation_phase(&self, id: MutationId) -> Option<MutationPhase> {
        self.mutations.get(&id).copied()
    }

    pub fn in_flight(&self) -> usize {
        self.mutations.len()
    }

    pub fn daily_score(&self, day: NaiveDate) -> u8 {
        compute_daily_score(day, self.habits())
    }

    pub fn view(&self, today: NaiveDate) -> GridView {
        let window = self.window();
        let habits = self.habits();

        let days = window
            .days()
            .map(|date| {
                let score = compute_daily_score(date, habits);
                DayColumn {
                    date,
                    weekday: date.format("%a").to_string(),
                    day_of_month: date.format("%-d").to_string(),
                    is_today: date == today,
                    score,
                    tier: ScoreTier::for_score(score),
                }
            })
            .collect();

        let rows = habits
            .iter()
            .map(|habit| HabitRow {
                id: habit.id.clone(),
                name: habit.name.clone(),
                color: habit.color_or_default().to_string(),
                cells: window
                    .days()
                    .map(|date| GridCell {
                        date,
                        completed: habit.is_completed_on(date),
                        editable: date == today,
                    })
                    .collect(),
            })
            .collect();

        GridView {
            window,
            label: window.label(),
            today,
            loading: self.is_stale(),
            days,
            rows,
        }
    }
}

/// Sorts logs, drops duplicates per date and anything outside `window`.
fn normalize(mut habit: Habit, window: Window) -> Habit {
    habit.logs.retain(|log| window.contains(log.date));
    habit.logs.sort_by_key(|log| log.date);
    habit.logs.dedup_by_key(|log| log.date);
    habit
}

#[derive(Debug, Clone, Serialize)]
pub struct DayColumn {
    pub date: NaiveDate,
    pub weekday: String,
    pub day_of_month: String,
    pub is_today: bool,
    pub score: u8,
    pub tier: ScoreTier,
}

#[derive(Debug, Clone, Serialize)]
pub struct GridCell {
    pub date: NaiveDate,
    pub completed: bool,
    pub editable: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct HabitRow {
    pub id: HabitId,
    pub name: String,
    pub color: String,
    pub cells: Vec<GridCell>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GridView {
    pub window: Window,
    pub label: String,
    pub today: NaiveDate,
    pub loading: bool,
    pub days: Vec<DayColumn>,
    pub rows: Vec<HabitRow>,
}

pub struct WeeklyGridController {
    api: Arc<dyn HabitApi>,
    clock: Arc<dyn Clock>,
    state: Mutex<GridState>,
}

impl WeeklyGridController {
    pub fn new(api: Arc<dyn HabitApi>, clock: Arc<dyn Clock>) -> Self {
        let anchor = clock.today();
        Self {
            api,
            clock,
            state: Mutex::new(GridState::new(anchor)),
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub async fn window(&self) -> Window {
        self.state.lock().await.window()
    }

    pub async fn habits(&self) -> Vec<Habit> {
        self.state.lock().await.habits().to_vec()
    }

    pub async fn view(&self) -> GridView {
        self.state.lock().await.view(self.today())
    }

    pub async fn daily_score(&self, day: NaiveDate) -> u8 {
        self.state.lock().await.daily_score(day)
    }

    pub async fn in_flight(&self) -> usize {
        self.state.lock().await.in_flight()
    }

    pub async fn navigate(&self, weeks: i64) -> Result<Window, NavigationError> {
        let window = self.state.lock().await.navigate(weeks)?;
        info!(start = %window.start, end = %window.end, "navigated");
        Ok(window)
    }

    pub async fn jump_to_today(&self) -> Window {
        let today = self.today();
        self.state.lock().await.jump_to(today)
    }

    /// Fetches `window` and installs it unless it was superseded while in
    /// flight. On failure the previous snapshot stays in place.
    pub async fn load_window(&self, window: Window) -> Result<Vec<Habit>, ClientError> {
        let load = self.state.lock().await.begin_load();
        match self.api.list_habits(window).await {
            Ok(habits) => {
                let applied = self
                    .state
                    .lock()
                    .await
                    .apply_snapshot(load, window, habits.clone());
                if applied {
                    debug!(start = %window.start, load, habits = habits.len(), "window loaded");
                } else {
                    debug!(start = %window.start, load, "discarding superseded snapshot");
                }
                Ok(habits)
            }
            Err(err) => {
                warn!(start = %window.start, "failed to load window: {err}");
                Err(err)
            }
        }
    }

    pub async fn refresh(&self) -> Result<Vec<Habit>, ClientError> {
        let window = self.window().await;
        self.load_window(window).await
    }

    pub async fn toggle_completion(
        &self,
        habit_id: &HabitId,
        day: NaiveDate,
    ) -> Result<ToggleOutcome, ClientError> {
        if day != self.today() {
            debug!(%habit_id, %day, "ignoring toggle outside today");
            return Ok(ToggleOutcome::Skipped);
        }

        let (mutation, flipped) = {
            let mut state = self.state.lock().await;
            let mutation = state.begin_mutation();
            let flipped = state.flip_completion(habit_id, day);
            state.advance(mutation, MutationPhase::OptimisticallyApplied);
            (mutation, flipped)
        };

        let err = match self.api.toggle_habit(habit_id, day).await {
            Ok(()) => {
                {
                    let mut state = self.state.lock().await;
                    state.advance(mutation, MutationPhase::Confirmed);
                    state.finish_mutation(mutation);
                }
                if !flipped {
                    // the displayed snapshot did not hold this habit/day
                    self.refresh_quietly().await;
                }
                return Ok(ToggleOutcome::Confirmed);
            }
            Err(err) => err,
        };

        warn!(%habit_id, %day, "toggle failed: {err}");
        self.state
            .lock()
            .await
            .advance(mutation, MutationPhase::Reverting);

        let result = if err.is_auth() {
            Err(err)
        } else {
            match self.refresh().await {
                Ok(_) => Ok(ToggleOutcome::Reconciled),
                Err(refetch_err) => Err(refetch_err),
            }
        };

        let mut state = self.state.lock().await;
        if result.is_err() && flipped {
            state.flip_completion(habit_id, day);
        }
        state.advance(mutation, MutationPhase::Idle);
        state.finish_mutation(mutation);
        result
    }

    pub async fn create_habit(&self, name: &str, color: Option<&str>) -> Result<Habit, ClientError> {
        let draft = HabitDraft::new(name, color)?;
        let habit = self.api.create_habit(&draft).await?;
        info!(id = %habit.id, "habit created");
        self.refresh_quietly().await;
        Ok(habit)
    }

    pub async fn update_habit(
        &self,
        habit_id: &HabitId,
        name: &str,
        color: Option<&str>,
    ) -> Result<Habit, ClientError> {
        let draft = HabitDraft::new(name, color)?;
        let habit = self.api.update_habit(habit_id, &draft).await?;
        info!(id = %habit.id, "habit updated");
        self.refresh_quietly().await;
        Ok(habit)
    }

    /// Removes the habit from view right away. A failed delete re-fetches the
    /// window and is returned to the caller.
    pub async fn delete_habit(&self, habit_id: &HabitId) -> Result<(), ClientError> {
        self.state.lock().await.remove_habit(habit_id);

        match self.api.delete_habit(habit_id).await {
            Ok(()) => {
                info!(%habit_id, "habit deleted");
                Ok(())
            }
            Err(err) => {
                warn!(%habit_id, "delete failed: {err}");
                if !err.is_auth() {
                    self.refresh_quietly().await;
                }
                Err(err)
            }
        }
    }

    async fn refresh_quietly(&self) {
        // load_window already logs the failure
        let _ = self.refresh().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockHabitApi;
    use crate::models::LogRecord;
    use mockall::predicate::eq;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn habit(id: &str, completed: &[NaiveDate]) -> Habit {
        Habit {
            id: HabitId::new(id),
            name: format!("habit {id}"),
            color: None,
            logs: completed.iter().copied().map(LogRecord::completed).collect(),
        }
    }

    fn controller(api: MockHabitApi, today: NaiveDate) -> WeeklyGridController {
        WeeklyGridController::new(Arc::new(api), Arc::new(FixedClock(today)))
    }

    #[test]
    fn mutation_phases_follow_the_state_machine() {
        use MutationPhase::*;
        assert!(Idle.can_transition_to(OptimisticallyApplied));
        assert!(OptimisticallyApplied.can_transition_to(Confirmed));
        assert!(OptimisticallyApplied.can_transition_to(Reverting));
        assert!(Reverting.can_transition_to(Idle));

        assert!(!Idle.can_transition_to(Confirmed));
        assert!(!Confirmed.can_transition_to(Reverting));
        assert!(!Reverting.can_transition_to(Confirmed));

        let mut state = GridState::new(day(1));
        let id = state.begin_mutation();
        assert!(!state.advance(id, Confirmed));
        assert!(state.advance(id, OptimisticallyApplied));
        assert_eq!(state.mutation_phase(id), Some(OptimisticallyApplied));
        assert_eq!(state.finish_mutation(id), Some(OptimisticallyApplied));
        assert_eq!(state.in_flight(), 0);
    }

    #[test]
    fn late_snapshot_for_abandoned_window_is_dropped() {
        let mut state = GridState::new(day(1));
        let first = state.window();
        let load = state.begin_load();
        assert!(state.apply_snapshot(load, first, vec![habit("1", &[day(1)])]));

        let late = state.begin_load();
        let next = state.navigate(1).unwrap();
        assert!(state.is_stale());
        assert!(!state.apply_snapshot(late, first, vec![habit("1", &[]), habit("2", &[])]));
        assert_eq!(state.habits().len(), 1);

        let load = state.begin_load();
        assert!(state.apply_snapshot(load, next, vec![habit("1", &[])]));
        assert!(!state.is_stale());
    }

    #[test]
    fn older_load_for_a_revisited_window_is_dropped() {
        let mut state = GridState::new(day(1));
        let first = state.window();
        let stale = state.begin_load();

        state.navigate(1).unwrap();
        assert_eq!(state.navigate(-1).unwrap(), first);
        let fresh = state.begin_load();

        assert!(state.apply_snapshot(fresh, first, vec![habit("1", &[day(1)])]));
        assert!(!state.apply_snapshot(stale, first, vec![habit("1", &[])]));
        assert!(state.habits()[0].is_completed_on(day(1)));

        let older = state.begin_load();
        let newer = state.begin_load();
        assert!(state.apply_snapshot(newer, first, vec![habit("1", &[])]));
        assert!(!state.apply_snapshot(older, first, vec![habit("1", &[day(1)])]));
        assert!(!state.habits()[0].is_completed_on(day(1)));
    }

    #[test]
    fn refresh_issued_before_a_flip_cannot_undo_it() {
        let mut state = GridState::new(day(1));
        let window = state.window();
        let load = state.begin_load();
        state.apply_snapshot(load, window, vec![habit("1", &[])]);

        let refresh = state.begin_load();
        assert!(state.flip_completion(&HabitId::new("1"), day(1)));
        assert!(!state.apply_snapshot(refresh, window, vec![habit("1", &[])]));
        assert!(state.habits()[0].is_completed_on(day(1)));

        let reconcile = state.begin_load();
        assert!(state.apply_snapshot(reconcile, window, vec![habit("1", &[])]));
        assert!(!state.habits()[0].is_completed_on(day(1)));
    }

    #[test]
    fn navigation_past_the_calendar_is_refused() {
        let mut state = GridState::new(day(1));
        let window = state.window();
        for weeks in [100_000_000, -100_000_000, i64::MAX, i64::MIN] {
            let err = state.navigate(weeks).unwrap_err();
            assert_eq!(err.weeks, weeks);
            assert_eq!(state.window(), window);
        }
        assert_eq!(state.view(day(1)).days.len(), 7);
    }

    #[test]
    fn view_near_the_end_of_the_calendar_is_complete() {
        for offset in 0..7 {
            let state = GridState::new(NaiveDate::MAX - chrono::Duration::days(offset));
            let view = state.view(day(1));
            assert_eq!(view.days.len(), 7);
        }
    }

    #[test]
    fn snapshots_are_normalized_to_the_window() {
        let mut state = GridState::new(day(1));
        let window = state.window();
        let mut raw = habit("1", &[day(3), day(1), day(1), day(20)]);
        raw.logs.push(LogRecord::completed(day(2)));
        let load = state.begin_load();
        state.apply_snapshot(load, window, vec![raw]);

        let dates: Vec<_> = state.habits()[0].logs.iter().map(|l| l.date).collect();
        assert_eq!(dates, vec![day(1), day(2), day(3)]);
    }

    #[test]
    fn view_marks_today_editable_and_scores_days() {
        let mut state = GridState::new(day(1));
        let window = state.window();
        let load = state.begin_load();
        state.apply_snapshot(
            load,
            window,
            vec![habit("1", &[day(1)]), habit("2", &[day(1), day(2)]), habit("3", &[])],
        );

        let view = state.view(day(1));
        assert_eq!(view.label, "Apr 29 - May 5, 2024");
        assert_eq!(view.days.len(), 7);
        assert!(!view.loading);

        let wednesday = &view.days[2];
        assert!(wednesday.is_today);
        assert_eq!(wednesday.weekday, "Wed");
        assert_eq!(wednesday.score, 67);
        assert_eq!(wednesday.tier, ScoreTier::Medium);
        assert_eq!(view.days[3].score, 33);

        let row = &view.rows[0];
        assert_eq!(row.color, crate::models::DEFAULT_COLOR);
        let editable: Vec<_> = row.cells.iter().map(|c| c.editable).collect();
        assert_eq!(editable, vec![false, false, true, false, false, false, false]);
        assert!(row.cells[2].completed);
    }

    #[tokio::test]
    async fn load_failure_keeps_previous_snapshot() {
        let mut api = MockHabitApi::new();
        let mut calls = 0;
        api.expect_list_habits().times(2).returning(move |_| {
            calls += 1;
            if calls == 1 {
                Ok(vec![habit("1", &[day(1)])])
            } else {
                Err(ClientError::Transport("connection refused".into()))
            }
        });
        let grid = controller(api, day(1));

        grid.refresh().await.unwrap();
        let err = grid.refresh().await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
        assert_eq!(grid.habits().await, vec![habit("1", &[day(1)])]);
    }

    #[tokio::test]
    async fn toggle_outside_today_is_a_noop() {
        let mut api = MockHabitApi::new();
        api.expect_list_habits()
            .returning(|_| Ok(vec![habit("1", &[day(1)])]));
        api.expect_toggle_habit().never();
        let grid = controller(api, day(2));

        grid.refresh().await.unwrap();
        let before = grid.habits().await;
        let outcome = grid
            .toggle_completion(&HabitId::new("1"), day(1))
            .await
            .unwrap();
        assert_eq!(outcome, ToggleOutcome::Skipped);
        assert_eq!(grid.habits().await, before);
    }

    #[tokio::test]
    async fn toggling_today_twice_restores_state() {
        let mut api = MockHabitApi::new();
        api.expect_list_habits()
            .returning(|_| Ok(vec![habit("1", &[])]));
        api.expect_toggle_habit()
            .with(eq(HabitId::new("1")), eq(day(1)))
            .times(2)
            .returning(|_, _| Ok(()));
        let grid = controller(api, day(1));
        let id = HabitId::new("1");

        grid.refresh().await.unwrap();
        assert_eq!(
            grid.toggle_completion(&id, day(1)).await.unwrap(),
            ToggleOutcome::Confirmed
        );
        assert_eq!(grid.daily_score(day(1)).await, 100);

        grid.toggle_completion(&id, day(1)).await.unwrap();
        assert_eq!(grid.habits().await, vec![habit("1", &[])]);
        assert_eq!(grid.in_flight().await, 0);
    }

    #[tokio::test]
    async fn failed_toggle_reconciles_with_backend() {
        let server_state = vec![habit("1", &[day(2)]), habit("2", &[])];
        let mut api = MockHabitApi::new();
        let mut calls = 0;
        api.expect_list_habits().times(2).returning(move |_| {
            calls += 1;
            if calls == 1 {
                Ok(vec![habit("1", &[]), habit("2", &[])])
            } else {
                Ok(vec![habit("1", &[day(2)]), habit("2", &[])])
            }
        });
        api.expect_toggle_habit()
            .returning(|_, _| Err(ClientError::Server {
                status: 500,
                message: "boom".into(),
            }));
        let grid = controller(api, day(1));

        grid.refresh().await.unwrap();
        let outcome = grid
            .toggle_completion(&HabitId::new("2"), day(1))
            .await
            .unwrap();
        assert_eq!(outcome, ToggleOutcome::Reconciled);

        let window = grid.window().await;
        let expected: Vec<_> = server_state
            .into_iter()
            .map(|h| normalize(h, window))
            .collect();
        assert_eq!(grid.habits().await, expected);
        assert_eq!(grid.in_flight().await, 0);
    }

    #[tokio::test]
    async fn failed_toggle_and_refetch_undoes_the_flip() {
        let mut api = MockHabitApi::new();
        let mut calls = 0;
        api.expect_list_habits().returning(move |_| {
            calls += 1;
            if calls == 1 {
                Ok(vec![habit("1", &[])])
            } else {
                Err(ClientError::Transport("offline".into()))
            }
        });
        api.expect_toggle_habit()
            .returning(|_, _| Err(ClientError::Transport("offline".into())));
        let grid = controller(api, day(1));

        grid.refresh().await.unwrap();
        let err = grid
            .toggle_completion(&HabitId::new("1"), day(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
        assert_eq!(grid.habits().await, vec![habit("1", &[])]);
    }

    #[tokio::test]
    async fn expired_session_during_toggle_is_returned() {
        let mut api = MockHabitApi::new();
        api.expect_list_habits()
            .times(1)
            .returning(|_| Ok(vec![habit("1", &[])]));
        api.expect_toggle_habit()
            .returning(|_, _| Err(ClientError::Auth));
        let grid = controller(api, day(1));

        grid.refresh().await.unwrap();
        let err = grid
            .toggle_completion(&HabitId::new("1"), day(1))
            .await
            .unwrap_err();
        assert_eq!(err, ClientError::Auth);
        assert_eq!(grid.habits().await, vec![habit("1", &[])]);
    }

    #[tokio::test]
    async fn navigation_loads_the_shifted_window() {
        let mut api = MockHabitApi::new();
        api.expect_list_habits()
            .withf(|window| window.start == day(6))
            .times(1)
            .returning(|_| Ok(vec![]));
        let grid = controller(api, day(1));

        let window = grid.navigate(1).await.unwrap();
        assert_eq!(window.start, day(6));
        grid.load_window(window).await.unwrap();
        assert!(!grid.view().await.loading);

        let back = grid.jump_to_today().await;
        assert_eq!(back.start, day(1) - chrono::Duration::days(2));
    }

    #[tokio::test]
    async fn delete_removes_habit_immediately() {
        let mut api = MockHabitApi::new();
        api.expect_list_habits()
            .times(1)
            .returning(|_| Ok(vec![habit("1", &[day(1)]), habit("2", &[])]));
        api.expect_delete_habit()
            .with(eq(HabitId::new("1")))
            .returning(|_| Ok(()));
        let grid = controller(api, day(1));

        grid.refresh().await.unwrap();
        grid.delete_habit(&HabitId::new("1")).await.unwrap();
        assert_eq!(grid.habits().await, vec![habit("2", &[])]);
        assert_eq!(grid.daily_score(day(1)).await, 0);
    }

    #[tokio::test]
    async fn failed_delete_is_surfaced_and_reconciled() {
        let mut api = MockHabitApi::new();
        api.expect_list_habits()
            .times(2)
            .returning(|_| Ok(vec![habit("1", &[])]));
        api.expect_delete_habit()
            .returning(|_| Err(ClientError::NotFound("habit 1".into())));
        let grid = controller(api, day(1));

        grid.refresh().await.unwrap();
        let err = grid.delete_habit(&HabitId::new("1")).await.unwrap_err();
        assert!(matches!(err, ClientError::NotFound(_)));
        assert_eq!(grid.habits().await, vec![habit("1", &[])]);
    }

    #[tokio::test]
    async fn invalid_draft_never_reaches_backend() {
        let mut api = MockHabitApi::new();
        api.expect_create_habit().never();
        let grid = controller(api, day(1));

        let err = grid.create_habit("   ", None).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }

    #[tokio::test]
    async fn create_refreshes_the_window() {
        let mut api = MockHabitApi::new();
        api.expect_create_habit()
            .withf(|draft| draft.name == "Stretch" && draft.color == "#10b981")
            .returning(|draft| {
                Ok(Habit {
                    id: HabitId::new("9"),
                    name: draft.name.clone(),
                    color: Some(draft.color.clone()),
                    logs: vec![],
                })
            });
        api.expect_list_habits()
            .times(1)
            .returning(|_| Ok(vec![habit("9", &[])]));
        let grid = controller(api, day(1));

        let created = grid.create_habit(" Stretch ", Some("#10b981")).await.unwrap();
        assert_eq!(created.id, HabitId::new("9"));
        assert_eq!(grid.habits().await.len(), 1);
    }
}
