//! Content catalog seam: task-type defaults and class bonus tables.
//!
//! The real catalog lives in an external collaborator; the engine only needs
//! these two lookups, so they are a trait with a static table implementation
//! for tests and the CLI.

use serde::{Deserialize, Serialize};

use crate::task::TaskKind;
use crate::user::HeroClass;

/// Per-kind creation defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaskDefaults {
    pub value: f64,
    /// Habit direction toggles; ignored for other kinds.
    pub up: bool,
    pub down: bool,
}

pub trait ContentCatalog {
    fn task_defaults(&self, kind: TaskKind) -> TaskDefaults;

    /// Multiplier applied to exp/gold rewards for this class on this kind.
    fn class_bonus(&self, class: HeroClass, kind: TaskKind) -> f64;
}

/// Built-in table, enough for tests and the operator CLI.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticCatalog;

impl ContentCatalog for StaticCatalog {
    fn task_defaults(&self, kind: TaskKind) -> TaskDefaults {
        match kind {
            TaskKind::Habit => TaskDefaults {
                value: 0.0,
                up: true,
                down: true,
            },
            TaskKind::Daily | TaskKind::Todo => TaskDefaults {
                value: 0.0,
                up: true,
                down: false,
            },
            TaskKind::Reward => TaskDefaults {
                value: 10.0,
                up: true,
                down: false,
            },
        }
    }

    fn class_bonus(&self, class: HeroClass, kind: TaskKind) -> f64 {
        match (class, kind) {
            (HeroClass::Warrior, TaskKind::Daily) => 1.1,
            (HeroClass::Mage, TaskKind::Todo) => 1.1,
            (HeroClass::Rogue, TaskKind::Habit) => 1.1,
            (HeroClass::Healer, TaskKind::Daily) => 1.05,
            _ => 1.0,
        }
    }
}
