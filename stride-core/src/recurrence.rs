//! Due-date engine: which calendar days a recurrence pattern lands on.
//!
//! All queries are pure. The reference instant is always a parameter, never
//! ambient clock state, so cron catch-up and reporting collaborators can
//! replay any historical day.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

use crate::error::{EngineError, Result};
use crate::task::{Frequency, Recurrence, Task, TaskKind};
use crate::time;
use crate::user::Preferences;

/// Bounded scan window for occurrence searches. A pattern with no match
/// inside this many days is reported as unresolvable rather than looping.
pub const SCAN_HORIZON_DAYS: i64 = 400;

/// Does the pattern land on `date`? Ignores completion state.
fn matches_on(rec: &Recurrence, date: NaiveDate) -> bool {
    if date < rec.start_date {
        return false;
    }
    let every = i64::from(rec.every_x);

    match rec.frequency {
        Frequency::Daily => time::days_between(rec.start_date, date) % every == 0,
        Frequency::Weekly => {
            let weeks = time::days_between(week_start(rec.start_date), week_start(date)) / 7;
            rec.repeat.contains(date.weekday()) && weeks % every == 0
        }
        Frequency::Monthly => {
            if months_since(rec.start_date, date) % every != 0 {
                return false;
            }
            if !rec.weeks_of_month.is_empty() {
                matches_week_of_month(rec, date)
            } else {
                matches_day_of_month(rec, date)
            }
        }
        Frequency::Yearly => {
            let years = i64::from(date.year() - rec.start_date.year());
            years % every == 0 && is_anniversary(rec.start_date, date)
        }
    }
}

/// Monthly-by-day: listed day, or the month's last day standing in for any
/// listed day the month is too short to reach. An empty list falls back to
/// the start date's day-of-month.
fn matches_day_of_month(rec: &Recurrence, date: NaiveDate) -> bool {
    let last = days_in_month(date.year(), date.month());
    let on_listed = |d: u32| date.day() == d || (date.day() == last && d > last);

    if rec.days_of_month.is_empty() {
        return on_listed(rec.start_date.day());
    }
    rec.days_of_month.iter().any(|&d| on_listed(d))
}

/// Monthly-by-week: Nth occurrence of the weekday within the month, where
/// the weekday comes from `repeat` (falling back to the start date's
/// weekday) and N may be negative, counting from the month's end.
fn matches_week_of_month(rec: &Recurrence, date: NaiveDate) -> bool {
    let weekday_ok = if rec.repeat.is_empty() {
        date.weekday() == rec.start_date.weekday()
    } else {
        rec.repeat.contains(date.weekday())
    };
    if !weekday_ok {
        return false;
    }

    let index = ((date.day() - 1) / 7) as i32;
    let remaining_weeks = ((days_in_month(date.year(), date.month()) - date.day()) / 7) as i32;
    let occurrences = index + remaining_weeks + 1;

    rec.weeks_of_month
        .iter()
        .any(|&w| w == index || w == index - occurrences)
}

fn is_anniversary(start: NaiveDate, date: NaiveDate) -> bool {
    if date.month() != start.month() {
        return false;
    }
    let last = days_in_month(date.year(), date.month());
    date.day() == start.day() || (date.day() == last && start.day() > last)
}

fn week_start(d: NaiveDate) -> NaiveDate {
    d - Duration::days(i64::from(d.weekday().num_days_from_monday()))
}

fn months_since(start: NaiveDate, date: NaiveDate) -> i64 {
    i64::from(date.year() - start.year()) * 12 + i64::from(date.month()) - i64::from(start.month())
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (ny, nm) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(ny, nm, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(28)
}

/// Lazy, finite, restartable stream of occurrence dates.
///
/// Each pull scans at most [`SCAN_HORIZON_DAYS`] past the cursor; exhaustion
/// yields a single `UnresolvableRecurrence` and then the stream ends, so a
/// malformed pattern (e.g. an all-false weekly `repeat`) can never spin.
pub struct Occurrences<'a> {
    rec: &'a Recurrence,
    cursor: NaiveDate,
    failed: bool,
}

impl<'a> Occurrences<'a> {
    pub fn new(rec: &'a Recurrence, from: NaiveDate) -> Self {
        Self {
            rec,
            cursor: from.max(rec.start_date),
            failed: false,
        }
    }
}

impl Iterator for Occurrences<'_> {
    type Item = Result<NaiveDate>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let mut probe = self.cursor;
        for _ in 0..SCAN_HORIZON_DAYS {
            let next = probe.succ_opt()?;
            if matches_on(self.rec, probe) {
                self.cursor = next;
                return Some(Ok(probe));
            }
            probe = next;
        }
        self.failed = true;
        Some(Err(EngineError::UnresolvableRecurrence(format!(
            "no occurrence within {SCAN_HORIZON_DAYS} days of {}",
            self.cursor
        ))))
    }
}

/// Does the pattern of this task land on `date`? Dailies only; a daily with
/// no recurrence config is malformed and rejected.
pub fn due_on(task: &Task, date: NaiveDate) -> Result<bool> {
    if task.kind != TaskKind::Daily {
        return Ok(false);
    }
    let rec = task.recurrence.as_ref().ok_or_else(|| {
        EngineError::Validation(format!("daily {} has no recurrence config", task.id))
    })?;
    rec.validate()?;
    Ok(matches_on(rec, date))
}

/// Is the task due right now, for this user's day-start and zone?
///
/// Dailies: pattern match on the local day, unless already completed.
/// Todos: due until completed. Habits/rewards: never "due".
pub fn is_due(task: &Task, now: DateTime<Utc>, prefs: &Preferences) -> Result<bool> {
    match task.kind {
        TaskKind::Daily => Ok(due_on(task, time::local_day(now, prefs))? && !task.completed),
        TaskKind::Todo => Ok(!task.completed),
        TaskKind::Habit | TaskKind::Reward => Ok(false),
    }
}

/// The next `count` occurrence dates on/after `from`. Empty for
/// non-recurring kinds.
pub fn next_occurrences(task: &Task, from: NaiveDate, count: usize) -> Result<Vec<NaiveDate>> {
    if task.kind != TaskKind::Daily {
        return Ok(Vec::new());
    }
    let rec = task.recurrence.as_ref().ok_or_else(|| {
        EngineError::Validation(format!("daily {} has no recurrence config", task.id))
    })?;
    rec.validate()?;
    Occurrences::new(rec, from).take(count).collect()
}

/// First occurrence on/after `from`.
pub fn next_occurrence(rec: &Recurrence, from: NaiveDate) -> Result<NaiveDate> {
    rec.validate()?;
    match Occurrences::new(rec, from).next() {
        Some(res) => res,
        None => Err(EngineError::UnresolvableRecurrence(format!(
            "no occurrence on/after {from}"
        ))),
    }
}

/// All pattern days within `days` (used by cron's catch-up sweep).
pub fn due_days_among(rec: &Recurrence, days: &[NaiveDate]) -> Result<Vec<NaiveDate>> {
    rec.validate()?;
    Ok(days
        .iter()
        .copied()
        .filter(|&d| matches_on(rec, d))
        .collect())
}
