//! stride-core: task recurrence & scoring engine.
//!
//! Pure, clock-injected transformations over one user's task aggregate:
//! due-date queries, up/down scoring, streaks, and the cron rollover.
//! Persistence, transport, and rendering are collaborators' concerns.

pub mod completion;
pub mod content;
pub mod cron;
pub mod error;
pub mod recurrence;
pub mod score;
pub mod streak;
pub mod task;
pub mod time;
pub mod user;

pub use completion::{CompletionOutcome, complete};
pub use content::{ContentCatalog, StaticCatalog, TaskDefaults};
pub use cron::{CronDiagnostic, CronOutcome, run as run_cron};
pub use error::{EngineError, Result};
pub use recurrence::{Occurrences, SCAN_HORIZON_DAYS, is_due, next_occurrences};
pub use score::{Direction, StatDelta, VALUE_CEILING, VALUE_FLOOR, ValueTier, score, tier};
pub use streak::{StreakPolicy, on_completed_through_cron, on_missed_through_cron};
pub use task::{
    ChecklistItem, Frequency, HistoryEntry, MAX_EVERY_X, Recurrence, Task, TaskKind, WeekdaySet,
};
pub use user::{
    Buffs, HeroClass, Preferences, Stats, TasksOrder, User, xp_to_next_level,
};
