//! Presentation seam
//!
//! The engine never draws anything. It hands results to a [`Presenter`] and
//! blocks on the calls that represent animations (`present_wins`,
//! `present_bonus_award`, `settle`) until they return.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::engine::RoundSession;
use crate::hold::HoldMask;
use crate::paytable::WinLine;
use crate::state::RoundState;
use crate::symbols::Cell;

/// Everything needed to show one round's wins
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WinPresentation<'a> {
    pub lines: &'a [WinLine],
    pub total_win: u64,
    pub bet: u64,
    pub big_win_multiplier: f64,
    /// Extra cells to highlight (paid scatters)
    pub highlight_cells: &'a [Cell],
}

impl WinPresentation<'_> {
    /// Win reached bet × big-win multiplier
    pub fn is_big_win(&self) -> bool {
        self.total_win > 0 && self.total_win as f64 >= self.bet as f64 * self.big_win_multiplier
    }
}

/// Display counters, pushed after every state mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplaySnapshot {
    pub balance: u64,
    pub bet: u64,
    pub last_win: u64,
    pub free_spins_remaining: u32,
    pub total_spins: u64,
    pub state: RoundState,
}

/// External presentation collaborator
pub trait Presenter {
    /// Show win lines and total; return when the animation has finished
    fn present_wins(&mut self, presentation: &WinPresentation<'_>);

    /// Show the free-spin award; return when dismissed
    fn present_bonus_award(&mut self, free_spins: u32);

    /// Update the held-reel indicator (fire and forget)
    fn set_hold_indicator(&mut self, mask: &HoldMask);

    /// Sync balance / bet / win / counters (fire and forget)
    fn report(&mut self, snapshot: &DisplaySnapshot);

    /// Post-transition notification; the session is consistent here and
    /// may be checkpointed.
    fn on_transition(&mut self, _from: RoundState, _to: RoundState, _session: &RoundSession) {}

    /// Settle delay before the round returns to IDLE
    fn settle(&mut self) {}
}

/// Presenter that shows nothing and never waits
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPresenter;

impl Presenter for NullPresenter {
    fn present_wins(&mut self, _presentation: &WinPresentation<'_>) {}
    fn present_bonus_award(&mut self, _free_spins: u32) {}
    fn set_hold_indicator(&mut self, _mask: &HoldMask) {}
    fn report(&mut self, _snapshot: &DisplaySnapshot) {}
}

/// Presenter that writes everything to the log, with an optional settle delay
#[derive(Debug, Clone, Default)]
pub struct LogPresenter {
    settle_delay: Option<Duration>,
}

impl LogPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settle_delay(delay: Duration) -> Self {
        Self {
            settle_delay: Some(delay),
        }
    }
}

impl Presenter for LogPresenter {
    fn present_wins(&mut self, presentation: &WinPresentation<'_>) {
        for line in presentation.lines {
            log::info!(
                "line {}: {}x {}{} pays {:.2}",
                line.payline_id,
                line.match_count,
                line.symbol,
                if line.used_wild { " (wild)" } else { "" },
                line.amount
            );
        }
        if !presentation.highlight_cells.is_empty() {
            log::info!("scatters at {:?}", presentation.highlight_cells);
        }
        let tier = if presentation.is_big_win() { "BIG WIN" } else { "win" };
        log::info!("{tier}: {} on bet {}", presentation.total_win, presentation.bet);
    }

    fn present_bonus_award(&mut self, free_spins: u32) {
        log::info!("bonus: {free_spins} free spins awarded");
    }

    fn set_hold_indicator(&mut self, mask: &HoldMask) {
        if mask.any() {
            log::info!("holding reels {:?}", mask.held_reels().collect::<Vec<_>>());
        }
    }

    fn report(&mut self, snapshot: &DisplaySnapshot) {
        log::debug!(
            "[{}] balance={} bet={} win={} free_spins={} spins={}",
            snapshot.state,
            snapshot.balance,
            snapshot.bet,
            snapshot.last_win,
            snapshot.free_spins_remaining,
            snapshot.total_spins
        );
    }

    fn on_transition(&mut self, from: RoundState, to: RoundState, _session: &RoundSession) {
        log::trace!("{from} -> {to}");
    }

    fn settle(&mut self) {
        if let Some(delay) = self.settle_delay {
            std::thread::sleep(delay);
        }
    }
}
