//! Streak transitions applied during cron rollovers.
//!
//! Completion-time scoring never touches streaks; only the rollover does,
//! which is what makes the counter mean "consecutive on-time completions".

use serde::{Deserialize, Serialize};

/// Policy hook for streak preservation. Callers decide what freezes a
/// streak (vacation flag, frozen buff); the tracker only honors the bit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakPolicy {
    pub preserve_on_miss: bool,
}

/// A due daily crossed the rollover completed.
pub fn on_completed_through_cron(streak: u32) -> u32 {
    streak + 1
}

/// A due daily crossed the rollover incomplete.
pub fn on_missed_through_cron(streak: u32, policy: StreakPolicy) -> u32 {
    if policy.preserve_on_miss { streak } else { 0 }
}
