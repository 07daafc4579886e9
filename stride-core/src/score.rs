//! Scoring curve: task value -> stat deltas for one up/down event.
//!
//! The curve is table-driven over five value tiers. Gains shrink as a task's
//! value climbs (diminishing returns) and misses on well-established tasks
//! hurt more than misses on already-red ones. Everything here is pure: the
//! same (value, direction, stats) snapshot produces bit-identical deltas,
//! which is what makes cron catch-up replayable.

use serde::{Deserialize, Serialize};

use crate::content::ContentCatalog;
use crate::task::{Task, TaskKind};
use crate::user::{LEVEL_SCALE_CAP, Stats};

/// Task value clamp bounds.
pub const VALUE_FLOOR: f64 = -47.27;
pub const VALUE_CEILING: f64 = 21.27;

const BASE_XP: f64 = 7.5;
const BASE_GOLD: f64 = 2.5;
const BASE_MANA: f64 = 1.0;
const BASE_DAMAGE: f64 = 2.0;

/// Constitution mitigates damage, at most this fraction of it.
const MAX_CON_MITIGATION: f64 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

/// Color tier a task value falls in, worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueTier {
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
}

struct TierRow {
    tier: ValueTier,
    min_value: f64,
    /// How far one event moves the task value.
    step: f64,
    /// Multiplier on exp/gold for an up event.
    reward_weight: f64,
    /// Multiplier on hp loss for a down event.
    penalty_weight: f64,
}

/// Breakpoints ascend; lookup takes the last row whose floor is reached.
/// Red tasks move fast and reward generously; blue tasks barely budge but
/// are expensive to miss.
static TIERS: [TierRow; 5] = [
    TierRow {
        tier: ValueTier::Red,
        min_value: f64::NEG_INFINITY,
        step: 2.5,
        reward_weight: 1.6,
        penalty_weight: 0.5,
    },
    TierRow {
        tier: ValueTier::Orange,
        min_value: -16.0,
        step: 2.0,
        reward_weight: 1.3,
        penalty_weight: 0.75,
    },
    TierRow {
        tier: ValueTier::Yellow,
        min_value: -8.0,
        step: 1.5,
        reward_weight: 1.0,
        penalty_weight: 1.0,
    },
    TierRow {
        tier: ValueTier::Green,
        min_value: 8.0,
        step: 1.0,
        reward_weight: 0.75,
        penalty_weight: 1.3,
    },
    TierRow {
        tier: ValueTier::Blue,
        min_value: 16.0,
        step: 0.5,
        reward_weight: 0.5,
        penalty_weight: 1.6,
    },
];

fn tier_row(value: f64) -> &'static TierRow {
    let mut row = &TIERS[0];
    for candidate in &TIERS[1..] {
        if value >= candidate.min_value {
            row = candidate;
        }
    }
    row
}

/// Color tier for a task value (drives client display and CLI output).
pub fn tier(value: f64) -> ValueTier {
    tier_row(value).tier
}

/// Raw stat delta from one scoring event. Floors/ceilings on the user's
/// gauges are the caller's job ([`Stats::apply`], or cron's single
/// aggregate clamp); this struct carries unclamped values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatDelta {
    pub exp: f64,
    pub gp: f64,
    pub hp: f64,
    pub mp: f64,
    pub new_task_value: f64,
}

impl StatDelta {
    pub const ZERO: StatDelta = StatDelta {
        exp: 0.0,
        gp: 0.0,
        hp: 0.0,
        mp: 0.0,
        new_task_value: 0.0,
    };

    pub fn zero_for(value: f64) -> StatDelta {
        StatDelta {
            new_task_value: value,
            ..StatDelta::ZERO
        }
    }
}

/// Reward reads sub-linearly off the level, capped.
fn level_scale(lvl: u32) -> f64 {
    1.0 + f64::from(lvl.min(LEVEL_SCALE_CAP)) / 100.0
}

/// Compute the delta for one scoring event.
///
/// Rewards are a purchase: gold down by the task's value (its price), no
/// curve involvement and no value drift. Everything else runs through the
/// tier table: up grants exp/gold/mana, down costs health, and the task
/// value steps toward the matching end of the clamp range.
pub fn score(
    task: &Task,
    direction: Direction,
    actor: &Stats,
    catalog: &impl ContentCatalog,
) -> StatDelta {
    if task.kind == TaskKind::Reward {
        return StatDelta {
            gp: -task.value,
            new_task_value: task.value,
            ..StatDelta::ZERO
        };
    }

    let row = tier_row(task.value);
    let class_mult = catalog.class_bonus(actor.class, task.kind);
    let scale = level_scale(actor.lvl);
    let buffs = &actor.buffs;

    match direction {
        Direction::Up => StatDelta {
            exp: BASE_XP * row.reward_weight * scale * class_mult * (1.0 + buffs.intellect / 100.0),
            gp: BASE_GOLD * row.reward_weight * scale * class_mult * (1.0 + buffs.perception / 100.0),
            hp: 0.0,
            mp: BASE_MANA * row.reward_weight,
            new_task_value: (task.value + row.step).clamp(VALUE_FLOOR, VALUE_CEILING),
        },
        Direction::Down => {
            let mitigation = (buffs.constitution / 250.0).min(MAX_CON_MITIGATION);
            StatDelta {
                exp: 0.0,
                gp: 0.0,
                hp: -(BASE_DAMAGE * row.penalty_weight * (1.0 - mitigation)),
                mp: 0.0,
                new_task_value: (task.value - row.step).clamp(VALUE_FLOOR, VALUE_CEILING),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::StaticCatalog;
    use chrono::{TimeZone, Utc};

    fn habit_with_value(value: f64) -> Task {
        let created = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        Task::new("h1", "habit", TaskKind::Habit, created).with_value(value)
    }

    #[test]
    fn deterministic_for_identical_inputs() {
        let task = habit_with_value(-3.25);
        let stats = Stats::default();
        let a = score(&task, Direction::Up, &stats, &StaticCatalog);
        let b = score(&task, Direction::Up, &stats, &StaticCatalog);
        assert_eq!(a, b);
    }

    #[test]
    fn red_up_gains_more_than_blue_up() {
        let stats = Stats::default();
        let red = score(&habit_with_value(-20.0), Direction::Up, &stats, &StaticCatalog);
        let blue = score(&habit_with_value(18.0), Direction::Up, &stats, &StaticCatalog);
        assert!(red.exp > blue.exp);
        assert!(red.gp > blue.gp);
    }

    #[test]
    fn blue_down_hurts_more_than_red_down() {
        let stats = Stats::default();
        let red = score(&habit_with_value(-20.0), Direction::Down, &stats, &StaticCatalog);
        let blue = score(&habit_with_value(18.0), Direction::Down, &stats, &StaticCatalog);
        assert!(blue.hp < red.hp);
        assert!(red.hp < 0.0);
    }

    #[test]
    fn value_clamped_at_floor_and_ceiling() {
        let stats = Stats::default();
        let low = score(&habit_with_value(VALUE_FLOOR), Direction::Down, &stats, &StaticCatalog);
        assert_eq!(low.new_task_value, VALUE_FLOOR);

        let high = score(&habit_with_value(VALUE_CEILING), Direction::Up, &stats, &StaticCatalog);
        assert_eq!(high.new_task_value, VALUE_CEILING);
    }

    #[test]
    fn higher_level_earns_more_up_to_cap() {
        let task = habit_with_value(0.0);
        let mut low = Stats::default();
        low.lvl = 1;
        let mut high = Stats::default();
        high.lvl = 40;
        let mut capped = Stats::default();
        capped.lvl = 90;

        let a = score(&task, Direction::Up, &low, &StaticCatalog);
        let b = score(&task, Direction::Up, &high, &StaticCatalog);
        let c = score(&task, Direction::Up, &capped, &StaticCatalog);
        assert!(b.exp > a.exp);
        // Past the cap the scale stops growing.
        let mut at_cap = Stats::default();
        at_cap.lvl = LEVEL_SCALE_CAP;
        let d = score(&task, Direction::Up, &at_cap, &StaticCatalog);
        assert_eq!(c.exp, d.exp);
    }

    #[test]
    fn constitution_mitigates_damage() {
        let task = habit_with_value(0.0);
        let plain = Stats::default();
        let mut tough = Stats::default();
        tough.buffs.constitution = 50.0;

        let a = score(&task, Direction::Down, &plain, &StaticCatalog);
        let b = score(&task, Direction::Down, &tough, &StaticCatalog);
        assert!(b.hp > a.hp); // less negative
        assert!(b.hp < 0.0);
    }

    #[test]
    fn reward_purchase_costs_its_value_and_keeps_it() {
        let created = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let reward = Task::new("r1", "coffee", TaskKind::Reward, created).with_value(10.0);
        let delta = score(&reward, Direction::Up, &Stats::default(), &StaticCatalog);
        assert_eq!(delta.gp, -10.0);
        assert_eq!(delta.exp, 0.0);
        assert_eq!(delta.new_task_value, 10.0);
        assert!(delta.new_task_value >= VALUE_FLOOR);
    }

    #[test]
    fn tier_breakpoints() {
        assert_eq!(tier(-20.0), ValueTier::Red);
        assert_eq!(tier(-16.0), ValueTier::Orange);
        assert_eq!(tier(-10.0), ValueTier::Orange);
        assert_eq!(tier(0.0), ValueTier::Yellow);
        assert_eq!(tier(8.0), ValueTier::Green);
        assert_eq!(tier(16.0), ValueTier::Blue);
    }
}
