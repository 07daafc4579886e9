//! User-facing scoring entry point: toggling/scoring a single task.
//!
//! Owns the aggregate for the duration of the call (no partial commits): a
//! rejected precondition leaves both task and user untouched.

use chrono::{DateTime, Utc};

use crate::content::ContentCatalog;
use crate::error::{EngineError, Result};
use crate::score::{self, Direction, StatDelta};
use crate::task::{HistoryEntry, Task, TaskKind};
use crate::user::{StatApplyOutcome, User};

/// What one completion call did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionOutcome {
    pub delta: StatDelta,
    pub levels_gained: u32,
    pub died: bool,
    /// True when an idempotence guard turned the call into a no-op.
    pub no_op: bool,
}

impl CompletionOutcome {
    fn no_op(task_value: f64) -> Self {
        Self {
            delta: StatDelta::zero_for(task_value),
            levels_gained: 0,
            died: false,
            no_op: true,
        }
    }

    fn scored(delta: StatDelta, applied: StatApplyOutcome) -> Self {
        Self {
            delta,
            levels_gained: applied.levels_gained,
            died: applied.died,
            no_op: false,
        }
    }
}

/// Score a task in `direction` for `user`.
///
/// Dailies/todos: `Up` marks complete, `Down` unmarks; repeating the current
/// state is a guarded no-op with a zero delta, never a double-score. Habits
/// score on every call (no completed state), but one-sided habits reject
/// their disabled direction. Rewards are purchases: `Up` only, and only
/// with enough gold. Streaks are untouched here; only cron moves them.
pub fn complete(
    task: &mut Task,
    direction: Direction,
    user: &mut User,
    now: DateTime<Utc>,
    catalog: &impl ContentCatalog,
) -> Result<CompletionOutcome> {
    match task.kind {
        TaskKind::Reward => {
            if direction == Direction::Down {
                return Err(EngineError::Precondition(
                    "rewards can only be purchased, not scored down".into(),
                ));
            }
            if user.stats.gp < task.value {
                return Err(EngineError::Precondition(format!(
                    "not enough gold for reward {} (need {:.2}, have {:.2})",
                    task.id, task.value, user.stats.gp
                )));
            }
        }
        TaskKind::Habit => match direction {
            Direction::Up if !task.up => {
                return Err(EngineError::Precondition(format!(
                    "habit {} has its up direction disabled",
                    task.id
                )));
            }
            Direction::Down if !task.down => {
                return Err(EngineError::Precondition(format!(
                    "habit {} has its down direction disabled",
                    task.id
                )));
            }
            _ => {}
        },
        TaskKind::Daily | TaskKind::Todo => {
            let already_there = match direction {
                Direction::Up => task.completed,
                Direction::Down => !task.completed,
            };
            if already_there {
                return Ok(CompletionOutcome::no_op(task.value));
            }
        }
    }

    let delta = score::score(task, direction, &user.stats, catalog);
    let applied = user.stats.apply(&delta);

    task.value = delta.new_task_value;
    task.append_history(HistoryEntry {
        date: now,
        value: task.value,
        scored_up: direction == Direction::Up,
        scored_down: direction == Direction::Down,
    });

    match task.kind {
        TaskKind::Daily | TaskKind::Todo => {
            task.completed = direction == Direction::Up;
        }
        TaskKind::Habit => match direction {
            Direction::Up => task.counter_up += 1,
            Direction::Down => task.counter_down += 1,
        },
        TaskKind::Reward => {}
    }

    Ok(CompletionOutcome::scored(delta, applied))
}
