//! Time utilities: user-local, day-start-shifted calendar days.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Offset, Utc};

use crate::user::Preferences;

/// The user-local calendar day an instant falls on, after shifting by the
/// day-start hour. An instant before `day_start` still belongs to the
/// previous day.
pub fn local_day(at: DateTime<Utc>, prefs: &Preferences) -> NaiveDate {
    let shifted = at - Duration::hours(i64::from(prefs.day_start));
    match prefs.timezone {
        Some(tz) => shifted.with_timezone(&tz).date_naive(),
        None => {
            // Out-of-range offsets fall back to UTC rather than panicking.
            let offset: FixedOffset = FixedOffset::east_opt(prefs.timezone_offset_minutes * 60)
                .unwrap_or_else(|| Utc.fix());
            shifted.with_timezone(&offset).date_naive()
        }
    }
}

/// Local days a rollover from `last_cron` to `now` must evaluate: every day
/// D with day(last_cron) <= D < day(now). The last-cron day itself is
/// included because the previous run left it un-evaluated; today is excluded
/// because it is still in progress. Empty when both instants share a day,
/// which is what makes a same-day re-run a no-op.
///
/// Uses the current zone for all boundaries even if the offset changed
/// mid-gap (documented simplification).
pub fn days_between_runs(
    last_cron: DateTime<Utc>,
    now: DateTime<Utc>,
    prefs: &Preferences,
) -> Vec<NaiveDate> {
    let first = local_day(last_cron, prefs);
    let end = local_day(now, prefs);

    let mut days = Vec::new();
    let mut cursor = first;
    while cursor < end {
        days.push(cursor);
        let Some(next) = cursor.succ_opt() else { break };
        cursor = next;
    }
    days
}

pub fn days_between(a: NaiveDate, b: NaiveDate) -> i64 {
    b.signed_duration_since(a).num_days()
}
