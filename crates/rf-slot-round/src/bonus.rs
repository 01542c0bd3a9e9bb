//! Bonus trigger and free-spin accounting
//!
//! Trigger and retrigger are independent checks; when both hold on the same
//! round their awards add up.

use serde::{Deserialize, Serialize};

use crate::config::BonusRules;

/// Free spins awarded by one round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BonusAward {
    /// Spins from the base trigger
    pub trigger: u32,
    /// Spins from a retrigger inside free spins
    pub retrigger: u32,
}

impl BonusAward {
    pub fn total(&self) -> u32 {
        self.trigger.saturating_add(self.retrigger)
    }

    pub fn is_awarded(&self) -> bool {
        self.total() > 0
    }

    pub fn triggered(&self) -> bool {
        self.trigger > 0
    }

    pub fn retriggered(&self) -> bool {
        self.retrigger > 0
    }
}

/// Decide the free-spin award for a round.
///
/// `in_free_spins` is whether the round itself was played inside a
/// free-spin sequence; retrigger is only considered then.
pub fn award_free_spins(
    rules: &BonusRules,
    scatter_count: usize,
    in_free_spins: bool,
) -> BonusAward {
    let trigger = if rules.enabled && scatter_count >= rules.trigger_count as usize {
        rules.free_spins_award
    } else {
        0
    };

    let retrigger = if in_free_spins
        && rules.retrigger_enabled
        && scatter_count >= rules.retrigger_count as usize
    {
        rules.retrigger_award
    } else {
        0
    };

    BonusAward { trigger, retrigger }
}
