//! Cron rollover: advance one user's date-dependent state past elapsed days.
//!
//! The processor walks every local day the user slept through, charges
//! misses, advances streaks, clears stale completion flags, and applies the
//! accumulated damage in one shot. Different users are independent; within
//! one run, per-task health effects are collected first and clamped exactly
//! once at the end (one hit per cron, however many days were missed).

use chrono::{DateTime, NaiveDate, Utc};

use crate::content::ContentCatalog;
use crate::error::{EngineError, Result};
use crate::recurrence;
use crate::score::{self, Direction};
use crate::streak::{self, StreakPolicy};
use crate::task::{HistoryEntry, Task, TaskKind};
use crate::time;
use crate::user::{DEATH_FLOOR, MAX_HP, Preferences, Stats, User};

/// One-sided habit values drift toward neutral at each rollover.
const HABIT_FADE: f64 = 0.5;
const HABIT_FADE_SNAP: f64 = 0.1;

/// A task cron had to skip, and why. The rollover itself carries on.
#[derive(Debug, Clone, PartialEq)]
pub struct CronDiagnostic {
    pub task_id: String,
    pub error: EngineError,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CronOutcome {
    /// Local days evaluated by this run (0 = same-day no-op).
    pub days_processed: usize,
    /// Damaging misses charged (shielded/slept misses not counted).
    pub misses: u32,
    /// Raw summed hp delta before the single death-floor clamp.
    pub damage: f64,
    pub died: bool,
    pub diagnostics: Vec<CronDiagnostic>,
}

/// Roll `user` forward from `last_cron` to `now`.
///
/// Re-running with the same `now` (or any instant on the same local day) is
/// a no-op: no days have elapsed, nothing is charged, `last_cron` is not
/// advanced past the day it already covers.
pub fn run(
    user: &mut User,
    tasks: &mut [Task],
    now: DateTime<Utc>,
    catalog: &impl ContentCatalog,
) -> CronOutcome {
    let prefs = user.preferences;
    let days = time::days_between_runs(user.last_cron, now, &prefs);
    if days.is_empty() {
        return CronOutcome::default();
    }

    let today = time::local_day(now, &prefs);
    let yesterday = today.pred_opt();
    let policy = StreakPolicy {
        preserve_on_miss: prefs.sleep || user.stats.buffs.streaks_frozen,
    };
    // Scoring reads a stats snapshot so task order cannot change deltas.
    let stats = user.stats.clone();

    let mut sweep = Sweep {
        now,
        days: &days,
        today,
        yesterday,
        prefs,
        policy,
        sleeping: prefs.sleep,
        stealth_left: user.stats.buffs.stealth,
        total_hp: 0.0,
        misses: 0,
    };
    let mut diagnostics = Vec::new();

    for task in tasks.iter_mut() {
        let res = match task.kind {
            TaskKind::Daily => sweep.process_daily(task, &stats, catalog),
            TaskKind::Habit => {
                process_habit(task);
                Ok(())
            }
            // Todos never recur (a completed todo stays completed) and
            // rewards carry no date-dependent state.
            TaskKind::Todo | TaskKind::Reward => Ok(()),
        };
        if let Err(error) = res {
            tracing::warn!(task_id = %task.id, %error, "skipping task during cron rollover");
            diagnostics.push(CronDiagnostic {
                task_id: task.id.clone(),
                error,
            });
        }
    }

    // One aggregated hit, one clamp. Per-day clamping would under-charge
    // long absences relative to the recorded deltas.
    user.stats.hp = (user.stats.hp + sweep.total_hp).clamp(DEATH_FLOOR, MAX_HP);
    let died = sweep.total_hp < 0.0 && user.stats.hp <= DEATH_FLOOR;

    user.stats.buffs.stealth = sweep.stealth_left;
    user.last_cron = now;

    CronOutcome {
        days_processed: days.len(),
        misses: sweep.misses,
        damage: sweep.total_hp,
        died,
        diagnostics,
    }
}

struct Sweep<'a> {
    now: DateTime<Utc>,
    days: &'a [NaiveDate],
    today: NaiveDate,
    yesterday: Option<NaiveDate>,
    prefs: Preferences,
    policy: StreakPolicy,
    sleeping: bool,
    stealth_left: u32,
    total_hp: f64,
    misses: u32,
}

impl Sweep<'_> {
    fn process_daily(
        &mut self,
        task: &mut Task,
        stats: &Stats,
        catalog: &impl ContentCatalog,
    ) -> Result<()> {
        let rec = task.recurrence.clone().ok_or_else(|| {
            EngineError::Validation(format!("daily {} has no recurrence config", task.id))
        })?;
        let due_days = recurrence::due_days_among(&rec, self.days)?;

        let mut shielded = false;
        for day in due_days {
            if completed_on(task, day, &self.prefs) {
                task.streak = streak::on_completed_through_cron(task.streak);
                continue;
            }

            // Resting suspends damage and streak resets entirely.
            if self.sleeping {
                continue;
            }
            // Stealth shields whole tasks, first missing task first.
            if !shielded && self.stealth_left > 0 {
                self.stealth_left -= 1;
                shielded = true;
            }
            if shielded {
                continue;
            }

            let delta = score::score(task, Direction::Down, stats, catalog);
            self.total_hp += delta.hp;
            task.value = delta.new_task_value;
            task.append_history(HistoryEntry {
                date: self.now,
                value: task.value,
                scored_up: false,
                scored_down: true,
            });
            task.streak = streak::on_missed_through_cron(task.streak, self.policy);
            self.misses += 1;
        }

        task.yester_daily = match self.yesterday {
            Some(y) => !recurrence::due_days_among(&rec, &[y])?.is_empty(),
            None => false,
        };

        // Stale completion state clears once a fresh due day exists.
        if task.completed {
            recurrence::next_occurrence(&rec, self.today)?;
            task.completed = false;
        }

        Ok(())
    }
}

/// Per-period habit bookkeeping: counters restart, and habits with only one
/// enabled direction drift back toward neutral.
fn process_habit(task: &mut Task) {
    task.counter_up = 0;
    task.counter_down = 0;

    if task.up != task.down {
        task.value *= HABIT_FADE;
        if task.value.abs() < HABIT_FADE_SNAP {
            task.value = 0.0;
        }
    }
}

/// Did an up-score land on this local day? The append-only history is the
/// witness, so catch-up over a multi-day gap can date completions that the
/// single `completed` flag cannot.
fn completed_on(task: &Task, day: NaiveDate, prefs: &Preferences) -> bool {
    task.history
        .iter()
        .rev()
        .find(|e| time::local_day(e.date, prefs) == day)
        .map(|e| e.scored_up)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion;
    use crate::content::StaticCatalog;
    use crate::task::{Recurrence, WeekdaySet};
    use chrono::{TimeZone, Weekday};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn everyday_daily(id: &str) -> Task {
        let created = Utc.with_ymd_and_hms(2026, 1, 5, 8, 0, 0).unwrap();
        Task::new(id, "daily", TaskKind::Daily, created)
            .with_recurrence(Recurrence::daily(date(2026, 1, 5), 1))
            .unwrap()
    }

    fn user_at(h: u32) -> User {
        User::new("u1", Utc.with_ymd_and_hms(2026, 2, 16, h, 0, 0).unwrap())
    }

    #[test]
    fn same_day_rerun_is_a_no_op() {
        let mut user = user_at(8);
        let mut tasks = vec![everyday_daily("d1")];
        let later = Utc.with_ymd_and_hms(2026, 2, 16, 22, 0, 0).unwrap();

        let out = run(&mut user, &mut tasks, later, &StaticCatalog);
        assert_eq!(out.days_processed, 0);
        assert_eq!(out.misses, 0);
        assert_eq!(user.stats.hp, MAX_HP);
        assert_eq!(
            user.last_cron,
            Utc.with_ymd_and_hms(2026, 2, 16, 8, 0, 0).unwrap()
        );
    }

    #[test]
    fn single_missed_day_charges_and_resets_streak() {
        let mut user = user_at(8);
        let mut tasks = vec![everyday_daily("d1")];
        tasks[0].streak = 5;
        let next_morning = Utc.with_ymd_and_hms(2026, 2, 17, 8, 0, 0).unwrap();

        let out = run(&mut user, &mut tasks, next_morning, &StaticCatalog);
        assert_eq!(out.misses, 1);
        assert!(out.damage < 0.0);
        assert_eq!(tasks[0].streak, 0);
        assert!(tasks[0].value < 0.0);
        assert!(user.stats.hp < MAX_HP);
        assert_eq!(user.last_cron, next_morning);
    }

    #[test]
    fn completed_daily_advances_streak_and_resets_flag() {
        let mut user = user_at(8);
        let mut tasks = vec![everyday_daily("d1")];
        let at = Utc.with_ymd_and_hms(2026, 2, 16, 10, 0, 0).unwrap();
        completion::complete(
            &mut tasks[0],
            Direction::Up,
            &mut user,
            at,
            &StaticCatalog,
        )
        .unwrap();
        assert!(tasks[0].completed);

        let next_morning = Utc.with_ymd_and_hms(2026, 2, 17, 8, 0, 0).unwrap();
        let out = run(&mut user, &mut tasks, next_morning, &StaticCatalog);
        assert_eq!(out.misses, 0);
        assert_eq!(tasks[0].streak, 1);
        assert!(!tasks[0].completed);
        assert!(tasks[0].yester_daily);
        assert_eq!(user.stats.hp, MAX_HP);
    }

    #[test]
    fn damage_aggregates_then_clamps_once_at_death_floor() {
        let mut user = user_at(8);
        user.stats.hp = 3.0;
        let mut tasks: Vec<Task> = (0..10).map(|i| everyday_daily(&format!("d{i}"))).collect();
        let week_later = Utc.with_ymd_and_hms(2026, 2, 23, 8, 0, 0).unwrap();

        let out = run(&mut user, &mut tasks, week_later, &StaticCatalog);
        // 10 tasks x 7 missed days, far past the floor.
        assert_eq!(out.misses, 70);
        assert!(out.damage < -3.0);
        assert_eq!(user.stats.hp, DEATH_FLOOR);
        assert!(out.died);
    }

    #[test]
    fn sleeping_user_takes_no_damage_and_keeps_streaks() {
        let mut user = user_at(8);
        user.preferences.sleep = true;
        let mut tasks = vec![everyday_daily("d1")];
        tasks[0].streak = 12;
        let next_morning = Utc.with_ymd_and_hms(2026, 2, 17, 8, 0, 0).unwrap();

        let out = run(&mut user, &mut tasks, next_morning, &StaticCatalog);
        assert_eq!(out.misses, 0);
        assert_eq!(out.damage, 0.0);
        assert_eq!(tasks[0].streak, 12);
        assert_eq!(user.stats.hp, MAX_HP);
        // The day still advanced.
        assert_eq!(user.last_cron, next_morning);
    }

    #[test]
    fn stealth_shields_first_missing_daily() {
        let mut user = user_at(8);
        user.stats.buffs.stealth = 1;
        let mut tasks = vec![everyday_daily("d1"), everyday_daily("d2")];
        tasks[0].streak = 4;
        let next_morning = Utc.with_ymd_and_hms(2026, 2, 17, 8, 0, 0).unwrap();

        let out = run(&mut user, &mut tasks, next_morning, &StaticCatalog);
        assert_eq!(out.misses, 1);
        // Shielded task untouched, unshielded one charged.
        assert_eq!(tasks[0].streak, 4);
        assert_eq!(tasks[0].value, 0.0);
        assert_eq!(tasks[1].streak, 0);
        assert!(tasks[1].value < 0.0);
        assert_eq!(user.stats.buffs.stealth, 0);
    }

    #[test]
    fn malformed_task_is_skipped_not_fatal() {
        let mut user = user_at(8);
        let created = Utc.with_ymd_and_hms(2026, 1, 5, 8, 0, 0).unwrap();
        // A daily with an all-false weekly repeat: nothing is ever due, and
        // the completed-flag reset cannot resolve a next occurrence.
        let mut broken = Task::new("bad", "broken", TaskKind::Daily, created)
            .with_recurrence(Recurrence::weekly(date(2026, 1, 5), WeekdaySet::empty()))
            .unwrap();
        broken.completed = true;
        let mut tasks = vec![broken, everyday_daily("good")];
        let next_morning = Utc.with_ymd_and_hms(2026, 2, 17, 8, 0, 0).unwrap();

        let out = run(&mut user, &mut tasks, next_morning, &StaticCatalog);
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].task_id, "bad");
        assert!(matches!(
            out.diagnostics[0].error,
            EngineError::UnresolvableRecurrence(_)
        ));
        // The healthy daily was still processed.
        assert_eq!(out.misses, 1);
        assert_eq!(user.last_cron, next_morning);
    }

    #[test]
    fn habit_counters_reset_and_one_sided_value_fades() {
        let mut user = user_at(8);
        let created = Utc.with_ymd_and_hms(2026, 1, 5, 8, 0, 0).unwrap();
        let mut one_sided = Task::new("h1", "floss", TaskKind::Habit, created)
            .with_directions(true, false)
            .with_value(8.0);
        one_sided.counter_up = 4;
        let mut two_sided = Task::new("h2", "snack", TaskKind::Habit, created).with_value(-6.0);
        two_sided.counter_down = 2;
        let mut tasks = vec![one_sided, two_sided];
        let next_morning = Utc.with_ymd_and_hms(2026, 2, 17, 8, 0, 0).unwrap();

        run(&mut user, &mut tasks, next_morning, &StaticCatalog);
        assert_eq!(tasks[0].counter_up, 0);
        assert_eq!(tasks[0].value, 4.0);
        assert_eq!(tasks[1].counter_down, 0);
        // Two-sided habits do not fade.
        assert_eq!(tasks[1].value, -6.0);
    }

    #[test]
    fn weekly_monday_daily_misses_only_mondays() {
        let mut user = user_at(8);
        let rec = Recurrence::weekly(date(2026, 1, 5), WeekdaySet::empty().with(Weekday::Mon));
        let created = Utc.with_ymd_and_hms(2026, 1, 5, 8, 0, 0).unwrap();
        let task = Task::new("d1", "weekly", TaskKind::Daily, created)
            .with_recurrence(rec)
            .unwrap();
        let mut tasks = vec![task];

        // Feb 16 (Mon) -> Feb 27 (Fri): due days swept are Feb 16 and Feb 23.
        let fri = Utc.with_ymd_and_hms(2026, 2, 27, 8, 0, 0).unwrap();
        let out = run(&mut user, &mut tasks, fri, &StaticCatalog);
        assert_eq!(out.days_processed, 11);
        assert_eq!(out.misses, 2);
    }
}
