//! Task model: kinds, value/history, checklists, recurrence configuration.

use chrono::{DateTime, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Largest accepted `every_x` interval for any frequency.
pub const MAX_EVERY_X: u32 = 9999;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Habit,
    Daily,
    Todo,
    Reward,
}

impl TaskKind {
    /// Dailies and todos carry checklists; habits and rewards never do.
    pub fn has_checklist(self) -> bool {
        matches!(self, TaskKind::Daily | TaskKind::Todo)
    }

    pub fn has_streak(self) -> bool {
        matches!(self, TaskKind::Daily)
    }

    pub fn has_recurrence(self) -> bool {
        matches!(self, TaskKind::Daily)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

/// Set of active weekdays for weekly recurrences, bit 0 = Monday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub const ALL: WeekdaySet = WeekdaySet(0b0111_1111);

    pub fn empty() -> Self {
        WeekdaySet(0)
    }

    /// Build from a raw 7-bit mask (excess bits dropped).
    pub fn from_bits(bits: u8) -> Self {
        WeekdaySet(bits & 0b0111_1111)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn with(self, day: Weekday) -> Self {
        WeekdaySet(self.0 | (1 << day.num_days_from_monday()))
    }

    pub fn contains(self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_monday()) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// Recurrence configuration for dailies.
///
/// `weeks_of_month` entries are 0-based occurrence indexes of the weekday
/// within the month; negative values count from the end (-1 = last).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recurrence {
    pub frequency: Frequency,
    pub every_x: u32,
    #[serde(default)]
    pub repeat: WeekdaySet,
    #[serde(default)]
    pub days_of_month: Vec<u32>,
    #[serde(default)]
    pub weeks_of_month: Vec<i32>,
    pub start_date: NaiveDate,
}

impl Recurrence {
    pub fn daily(start_date: NaiveDate, every_x: u32) -> Self {
        Self {
            frequency: Frequency::Daily,
            every_x,
            repeat: WeekdaySet::empty(),
            days_of_month: Vec::new(),
            weeks_of_month: Vec::new(),
            start_date,
        }
    }

    pub fn weekly(start_date: NaiveDate, repeat: WeekdaySet) -> Self {
        Self {
            frequency: Frequency::Weekly,
            every_x: 1,
            repeat,
            days_of_month: Vec::new(),
            weeks_of_month: Vec::new(),
            start_date,
        }
    }

    pub fn monthly_by_day(start_date: NaiveDate, days_of_month: Vec<u32>) -> Self {
        Self {
            frequency: Frequency::Monthly,
            every_x: 1,
            repeat: WeekdaySet::empty(),
            days_of_month,
            weeks_of_month: Vec::new(),
            start_date,
        }
    }

    pub fn monthly_by_week(start_date: NaiveDate, weeks_of_month: Vec<i32>) -> Self {
        Self {
            frequency: Frequency::Monthly,
            every_x: 1,
            repeat: WeekdaySet::empty().with(start_date_weekday(start_date)),
            days_of_month: Vec::new(),
            weeks_of_month,
            start_date,
        }
    }

    pub fn yearly(start_date: NaiveDate) -> Self {
        Self {
            frequency: Frequency::Yearly,
            every_x: 1,
            repeat: WeekdaySet::empty(),
            days_of_month: Vec::new(),
            weeks_of_month: Vec::new(),
            start_date,
        }
    }

    pub fn with_every_x(mut self, every_x: u32) -> Self {
        self.every_x = every_x;
        self
    }

    /// Minimal invariants for safe downstream processing.
    ///
    /// An out-of-range `every_x` is a fatal precondition violation, never a
    /// silently-misbehaving pattern.
    pub fn validate(&self) -> Result<()> {
        if self.every_x == 0 || self.every_x > MAX_EVERY_X {
            return Err(EngineError::Validation(format!(
                "every_x must be in 1..={MAX_EVERY_X}, got {}",
                self.every_x
            )));
        }
        if let Some(d) = self.days_of_month.iter().find(|&&d| d == 0 || d > 31) {
            return Err(EngineError::Validation(format!(
                "days_of_month entries must be in 1..=31, got {d}"
            )));
        }
        if let Some(w) = self
            .weeks_of_month
            .iter()
            .find(|&&w| !(-5..=4).contains(&w))
        {
            return Err(EngineError::Validation(format!(
                "weeks_of_month entries must be in -5..=4, got {w}"
            )));
        }
        Ok(())
    }
}

fn start_date_weekday(d: NaiveDate) -> Weekday {
    use chrono::Datelike;
    d.weekday()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: String,
    pub text: String,
    pub completed: bool,
}

/// One append-only audit record per scoring event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub date: DateTime<Utc>,
    pub value: f64,
    pub scored_up: bool,
    pub scored_down: bool,
}

/// Core task type.
///
/// Kept small + serializable; storage is a later layer. `kind` is immutable
/// after creation, which is why there is no setter for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub kind: TaskKind,

    /// Drives the scoring curve and the color tier.
    pub value: f64,

    /// Append-only, monotonically time-ordered audit log.
    #[serde(default)]
    pub history: Vec<HistoryEntry>,

    /// Dailies/todos only.
    pub completed: bool,

    /// Dailies only; consecutive on-time completions.
    pub streak: u32,

    /// Dailies only.
    #[serde(default)]
    pub recurrence: Option<Recurrence>,

    /// Dailies/todos only; must stay empty for habits and rewards.
    #[serde(default)]
    pub checklist: Vec<ChecklistItem>,

    /// Habits: which directions are enabled. A habit may be one-sided.
    pub up: bool,
    pub down: bool,

    /// Habits: per-period tallies, reset at cron.
    pub counter_up: u32,
    pub counter_down: u32,

    /// Was this daily due on the day before the last rollover? Gates display
    /// of stale completion state.
    pub yester_daily: bool,

    pub created_at: DateTime<Utc>,
}

impl Task {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        kind: TaskKind,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            kind,
            value: 0.0,
            history: Vec::new(),
            completed: false,
            streak: 0,
            recurrence: None,
            checklist: Vec::new(),
            up: true,
            down: true,
            counter_up: 0,
            counter_down: 0,
            yester_daily: false,
            created_at,
        }
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = value;
        self
    }

    /// Attach a recurrence config; dailies only, validated before mutation.
    pub fn with_recurrence(mut self, recurrence: Recurrence) -> Result<Self> {
        if !self.kind.has_recurrence() {
            return Err(EngineError::Precondition(format!(
                "{:?} tasks cannot carry a recurrence",
                self.kind
            )));
        }
        recurrence.validate()?;
        self.recurrence = Some(recurrence);
        Ok(self)
    }

    /// Replace the checklist; rejected for habits and rewards.
    pub fn set_checklist(&mut self, items: Vec<ChecklistItem>) -> Result<()> {
        if !self.kind.has_checklist() && !items.is_empty() {
            return Err(EngineError::Precondition(format!(
                "{:?} tasks cannot carry checklist items",
                self.kind
            )));
        }
        self.checklist = items;
        Ok(())
    }

    /// One-sided habit helper.
    pub fn with_directions(mut self, up: bool, down: bool) -> Self {
        self.up = up;
        self.down = down;
        self
    }

    pub fn append_history(&mut self, entry: HistoryEntry) {
        self.history.push(entry);
    }

    /// Most recent audit entry, if any.
    pub fn last_history(&self) -> Option<&HistoryEntry> {
        self.history.last()
    }
}
