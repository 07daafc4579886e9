//! User model: stats, buffs, preferences, per-kind task ordering, level-up.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::score::StatDelta;
use crate::task::TaskKind;

/// Health ceiling and death floor for the hp gauge.
pub const MAX_HP: f64 = 50.0;
pub const DEATH_FLOOR: f64 = 0.0;

/// Level cap used when scaling rewards (not a cap on the level itself).
pub const LEVEL_SCALE_CAP: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeroClass {
    Warrior,
    Mage,
    Healer,
    Rogue,
}

/// Flat stat buffs plus the two cron policy flags.
///
/// `stealth` shields that many dailies from damage on the next rollover;
/// `streaks_frozen` preserves streaks through misses (vacation-style hold).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Buffs {
    pub strength: f64,
    pub intellect: f64,
    pub perception: f64,
    pub constitution: f64,
    pub stealth: u32,
    pub streaks_frozen: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub hp: f64,
    pub mp: f64,
    pub exp: f64,
    pub gp: f64,
    pub lvl: u32,
    pub class: HeroClass,
    pub buffs: Buffs,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            hp: MAX_HP,
            mp: 10.0,
            exp: 0.0,
            gp: 0.0,
            lvl: 1,
            class: HeroClass::Warrior,
            buffs: Buffs::default(),
        }
    }
}

/// Total XP needed to advance past `lvl`, on a power curve rounded to tens.
pub fn xp_to_next_level(lvl: u32) -> f64 {
    let l = f64::from(lvl);
    ((l * l * 0.25 + 10.0 * l + 139.75) / 10.0).round() * 10.0
}

/// Mana ceiling grows with level.
pub fn max_mp(lvl: u32) -> f64 {
    30.0 + 2.0 * f64::from(lvl)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatApplyOutcome {
    pub levels_gained: u32,
    pub died: bool,
}

impl Stats {
    /// Apply a raw scoring delta: floor gp/mp/exp at zero, cap mp and hp,
    /// clamp hp at the death floor, and loop exp through the level curve
    /// (a single large gain can grant several levels).
    pub fn apply(&mut self, delta: &StatDelta) -> StatApplyOutcome {
        let mut outcome = StatApplyOutcome::default();

        self.hp = (self.hp + delta.hp).clamp(DEATH_FLOOR, MAX_HP);
        outcome.died = delta.hp < 0.0 && self.hp <= DEATH_FLOOR;

        self.gp = (self.gp + delta.gp).max(0.0);
        self.mp = (self.mp + delta.mp).clamp(0.0, max_mp(self.lvl));
        self.exp = (self.exp + delta.exp).max(0.0);

        while self.exp >= xp_to_next_level(self.lvl) {
            self.exp -= xp_to_next_level(self.lvl);
            self.lvl += 1;
            outcome.levels_gained += 1;
        }

        outcome
    }
}

/// Due-date preferences. An IANA zone wins over the raw minute offset when
/// both are present; the offset is kept for callers that only know a UTC
/// delta.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    /// Hour (0..=23) at which the user's day rolls over.
    pub day_start: u32,
    pub timezone: Option<Tz>,
    pub timezone_offset_minutes: i32,
    /// Resting: cron applies no damage and preserves streaks.
    pub sleep: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            day_start: 0,
            timezone: None,
            timezone_offset_minutes: 0,
            sleep: false,
        }
    }
}

/// Per-kind insertion-ordered id lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TasksOrder {
    pub habits: Vec<String>,
    pub dailys: Vec<String>,
    pub todos: Vec<String>,
    pub rewards: Vec<String>,
}

impl TasksOrder {
    pub fn push(&mut self, kind: TaskKind, id: impl Into<String>) {
        self.list_mut(kind).push(id.into());
    }

    /// Remove an id from whichever list holds it. Deletion collaborators
    /// call this so ordering never references a dead task.
    pub fn remove(&mut self, id: &str) {
        for list in [
            &mut self.habits,
            &mut self.dailys,
            &mut self.todos,
            &mut self.rewards,
        ] {
            list.retain(|t| t != id);
        }
    }

    pub fn list(&self, kind: TaskKind) -> &[String] {
        match kind {
            TaskKind::Habit => &self.habits,
            TaskKind::Daily => &self.dailys,
            TaskKind::Todo => &self.todos,
            TaskKind::Reward => &self.rewards,
        }
    }

    fn list_mut(&mut self, kind: TaskKind) -> &mut Vec<String> {
        match kind {
            TaskKind::Habit => &mut self.habits,
            TaskKind::Daily => &mut self.dailys,
            TaskKind::Todo => &mut self.todos,
            TaskKind::Reward => &mut self.rewards,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub stats: Stats,
    pub preferences: Preferences,
    pub last_cron: DateTime<Utc>,
    pub tasks_order: TasksOrder,
}

impl User {
    pub fn new(id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            stats: Stats::default(),
            preferences: Preferences::default(),
            last_cron: now,
            tasks_order: TasksOrder::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xp_curve_first_levels() {
        assert_eq!(xp_to_next_level(1), 150.0);
        assert_eq!(xp_to_next_level(2), 160.0);
        assert!(xp_to_next_level(50) > xp_to_next_level(10));
    }

    #[test]
    fn apply_handles_multi_level_gain() {
        let mut stats = Stats::default();
        let delta = StatDelta {
            exp: 320.0,
            ..StatDelta::ZERO
        };
        let out = stats.apply(&delta);
        // 320 = 150 (lvl 1) + 160 (lvl 2) + 10 remainder.
        assert_eq!(out.levels_gained, 2);
        assert_eq!(stats.lvl, 3);
        assert_eq!(stats.exp, 10.0);
    }

    #[test]
    fn apply_clamps_hp_at_death_floor() {
        let mut stats = Stats::default();
        let out = stats.apply(&StatDelta {
            hp: -200.0,
            ..StatDelta::ZERO
        });
        assert_eq!(stats.hp, DEATH_FLOOR);
        assert!(out.died);
    }

    #[test]
    fn apply_floors_gold_at_zero() {
        let mut stats = Stats::default();
        stats.gp = 5.0;
        stats.apply(&StatDelta {
            gp: -20.0,
            ..StatDelta::ZERO
        });
        assert_eq!(stats.gp, 0.0);
    }

    #[test]
    fn tasks_order_insertion_and_removal() {
        let mut order = TasksOrder::default();
        order.push(TaskKind::Daily, "d1");
        order.push(TaskKind::Daily, "d2");
        order.push(TaskKind::Habit, "h1");
        assert_eq!(order.list(TaskKind::Daily), ["d1", "d2"]);

        order.remove("d1");
        assert_eq!(order.list(TaskKind::Daily), ["d2"]);
        assert_eq!(order.list(TaskKind::Habit), ["h1"]);
    }
}
