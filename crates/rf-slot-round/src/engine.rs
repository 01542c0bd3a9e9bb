//! Round engine
//!
//! Drives one round at a time through the state machine, owning the math
//! model and the RNG stream. All mutable game state lives in a
//! [`RoundSession`] owned by the caller and passed in by `&mut`.

use log::Level;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bonus::{BonusAward, award_free_spins};
use crate::config::{BetLimits, MathSpec};
use crate::hold::{HoldMask, compose};
use crate::paytable::{EvaluatedSpin, evaluate};
use crate::presenter::{DisplaySnapshot, Presenter, WinPresentation};
use crate::rng::{RandomSource, SessionRng};
use crate::state::{RoundMachine, RoundState, Transition};
use crate::symbols::{Cell, Grid};

/// Forced respins allowed back to back after one paid round
pub const MAX_HOLD_RESPINS: u32 = 10;

/// Rounds one `spin` call may chain before handing control back
pub const MAX_CHAINED_ROUNDS: usize = 1000;

// ═══════════════════════════════════════════════════════════════════════════════
// SESSION
// ═══════════════════════════════════════════════════════════════════════════════

/// Session statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub total_spins: u64,
    pub paid_spins: u64,
    pub free_spins: u64,
    pub respins: u64,
    pub total_bet: u64,
    pub total_win: u64,
    pub wins: u64,
    pub losses: u64,
    pub big_wins: u64,
    pub bonus_triggers: u64,
    pub retriggers: u64,
    pub max_win_ratio: f64,
}

impl SessionStats {
    /// Calculate RTP
    pub fn rtp(&self) -> f64 {
        if self.total_bet > 0 {
            (self.total_win as f64 / self.total_bet as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Calculate hit rate
    pub fn hit_rate(&self) -> f64 {
        if self.total_spins > 0 {
            (self.wins as f64 / self.total_spins as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Fold another session's counters into this one
    pub fn merge(&mut self, other: &SessionStats) {
        self.total_spins += other.total_spins;
        self.paid_spins += other.paid_spins;
        self.free_spins += other.free_spins;
        self.respins += other.respins;
        self.total_bet += other.total_bet;
        self.total_win += other.total_win;
        self.wins += other.wins;
        self.losses += other.losses;
        self.big_wins += other.big_wins;
        self.bonus_triggers += other.bonus_triggers;
        self.retriggers += other.retriggers;
        self.max_win_ratio = self.max_win_ratio.max(other.max_win_ratio);
    }
}

/// Mutable state of one player session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundSession {
    pub balance: u64,
    pub bet: u64,
    /// Win credited by the most recent round
    pub last_win: u64,
    pub free_spins_remaining: u32,
    pub total_spins: u64,
    /// Last stopped grid, source of held columns
    pub previous_grid: Option<Grid>,
    /// Reels to freeze on the next spin
    pub hold_mask: HoldMask,
    pub stats: SessionStats,
    machine: RoundMachine,
}

impl RoundSession {
    pub fn new(spec: &MathSpec) -> Self {
        Self {
            balance: spec.starting_balance,
            bet: spec.clamp_bet(spec.bet.default),
            last_win: 0,
            free_spins_remaining: 0,
            total_spins: 0,
            previous_grid: None,
            hold_mask: HoldMask::none(spec.reels as usize),
            stats: SessionStats::default(),
            machine: RoundMachine::new(),
        }
    }

    pub fn state(&self) -> RoundState {
        self.machine.state()
    }

    pub fn is_idle(&self) -> bool {
        self.state() == RoundState::Idle
    }

    pub fn in_free_spins(&self) -> bool {
        self.free_spins_remaining > 0
    }

    pub fn snapshot(&self) -> DisplaySnapshot {
        DisplaySnapshot {
            balance: self.balance,
            bet: self.bet,
            last_win: self.last_win,
            free_spins_remaining: self.free_spins_remaining,
            total_spins: self.total_spins,
            state: self.state(),
        }
    }

    /// Set the bet, clamped onto the ladder. Only allowed in IDLE.
    pub fn set_bet(&mut self, limits: &BetLimits, bet: u64) -> Result<u64, SpinRejection> {
        if !self.is_idle() {
            return Err(SpinRejection::Busy(self.state()));
        }
        self.bet = limits.clamp(bet);
        Ok(self.bet)
    }

    pub fn bet_up(&mut self, limits: &BetLimits) -> Result<u64, SpinRejection> {
        self.set_bet(limits, limits.step_up(self.bet))
    }

    pub fn bet_down(&mut self, limits: &BetLimits) -> Result<u64, SpinRejection> {
        self.set_bet(limits, limits.step_down(self.bet))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ROUND TYPES
// ═══════════════════════════════════════════════════════════════════════════════

/// How a round is paid for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpinKind {
    /// Debits the bet
    Paid,
    /// Consumes one spin from the free-spin pool
    Free,
    /// Internal respin while reels are held; no debit, no pool use
    ForcedRespin,
}

/// Why a spin request was refused. The session is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SpinRejection {
    #[error("round already in progress ({0})")]
    Busy(RoundState),
    #[error("insufficient balance: {balance} < bet {bet}")]
    InsufficientBalance { balance: u64, bet: u64 },
    #[error("no free spins remaining")]
    NoFreeSpins,
}

/// Result of one completed round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundOutcome {
    pub kind: SpinKind,
    pub bet: u64,
    pub grid: Grid,
    pub evaluation: EvaluatedSpin,
    pub award: BonusAward,
    /// Reels copied from the previous grid on this spin
    pub frozen: HoldMask,
    /// Hold mask carried into the next round
    pub hold_mask_next: HoldMask,
    pub forced_win: bool,
    pub forced_scatter: bool,
    pub balance_after: u64,
}

impl RoundOutcome {
    pub fn total_win(&self) -> u64 {
        self.evaluation.total_win
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ENGINE
// ═══════════════════════════════════════════════════════════════════════════════

/// Round engine over a math model and one sequential RNG stream
pub struct RoundEngine<R: RandomSource = SessionRng> {
    spec: MathSpec,
    rng: R,
}

impl RoundEngine<SessionRng> {
    /// Engine seeded from `spec.rng_seed` (0 picks a fresh seed)
    pub fn new(spec: MathSpec) -> Self {
        let rng = SessionRng::new(spec.rng_seed);
        log::info!("round engine seeded with {}", rng.seed());
        Self { spec, rng }
    }

    /// Effective seed, for replay
    pub fn seed(&self) -> u64 {
        self.rng.seed()
    }
}

impl<R: RandomSource> RoundEngine<R> {
    pub fn with_rng(spec: MathSpec, rng: R) -> Self {
        Self { spec, rng }
    }

    pub fn spec(&self) -> &MathSpec {
        &self.spec
    }

    pub fn rng_mut(&mut self) -> &mut R {
        &mut self.rng
    }

    /// Fresh session for this engine's math model
    pub fn new_session(&self) -> RoundSession {
        RoundSession::new(&self.spec)
    }

    fn diagnostics_level(&self) -> Level {
        if self.spec.qa.verbose {
            Level::Info
        } else {
            Level::Debug
        }
    }

    /// Handle an explicit spin request.
    ///
    /// Plays one round, then keeps going on its own while free spins remain
    /// and, with hold respins enabled, while a paid round left reels held.
    /// Returns every round played, in order.
    pub fn spin(
        &mut self,
        session: &mut RoundSession,
        presenter: &mut dyn Presenter,
    ) -> Result<Vec<RoundOutcome>, SpinRejection> {
        let kind = if session.in_free_spins() {
            SpinKind::Free
        } else {
            SpinKind::Paid
        };
        let mut outcomes = vec![self.play_round(session, presenter, kind)?];
        let mut respins = 0;

        while outcomes.len() < MAX_CHAINED_ROUNDS {
            let next = if session.in_free_spins() {
                SpinKind::Free
            } else if self.spec.hold_respin_enabled
                && session.hold_mask.any()
                && respins < MAX_HOLD_RESPINS
                && outcomes.last().is_some_and(|o| o.kind != SpinKind::Free)
            {
                respins += 1;
                SpinKind::ForcedRespin
            } else {
                break;
            };
            outcomes.push(self.play_round(session, presenter, next)?);
        }

        if outcomes.len() >= MAX_CHAINED_ROUNDS && session.in_free_spins() {
            log::warn!(
                "chain stopped after {} rounds with {} free spins pending",
                outcomes.len(),
                session.free_spins_remaining
            );
        }
        Ok(outcomes)
    }

    /// Play exactly one round from IDLE back to IDLE
    pub fn play_round(
        &mut self,
        session: &mut RoundSession,
        presenter: &mut dyn Presenter,
        kind: SpinKind,
    ) -> Result<RoundOutcome, SpinRejection> {
        if !session.is_idle() {
            return Err(SpinRejection::Busy(session.state()));
        }

        let bet = session.bet;
        match kind {
            SpinKind::Paid if session.balance < bet => {
                log::debug!("spin rejected: balance {} < bet {bet}", session.balance);
                return Err(SpinRejection::InsufficientBalance {
                    balance: session.balance,
                    bet,
                });
            }
            SpinKind::Free if session.free_spins_remaining == 0 => {
                return Err(SpinRejection::NoFreeSpins);
            }
            _ => {}
        }

        // Debit
        match kind {
            SpinKind::Paid => {
                session.balance -= bet;
                session.stats.paid_spins += 1;
                session.stats.total_bet += bet;
            }
            SpinKind::Free => {
                session.free_spins_remaining -= 1;
                session.stats.free_spins += 1;
            }
            SpinKind::ForcedRespin => {
                session.stats.respins += 1;
            }
        }
        session.last_win = 0;
        session.total_spins += 1;
        session.stats.total_spins += 1;

        // Spin
        enter(session, presenter, RoundState::Spinning);
        let composed = compose(
            &mut self.rng,
            &self.spec,
            session.previous_grid.as_ref(),
            Some(&session.hold_mask),
        );

        // Evaluate
        enter(session, presenter, RoundState::Result);
        let played_free = kind == SpinKind::Free;
        let evaluation = evaluate(&composed.grid, bet, &self.spec, played_free);
        let award = award_free_spins(&self.spec.bonus, evaluation.scatter_count, played_free);

        let inside_free_spins =
            played_free || session.free_spins_remaining.saturating_add(award.total()) > 0;
        let hold_mask_next = if inside_free_spins {
            HoldMask::none(composed.grid.reels())
        } else {
            evaluation.held_reels_next.without(&composed.frozen)
        };

        log::log!(
            self.diagnostics_level(),
            "round {} ({kind:?}): win={} lines={} scatters={} award={} forced_win={} forced_scatter={} frozen={:?}\n{}",
            session.total_spins,
            evaluation.total_win,
            evaluation.win_lines.len(),
            evaluation.scatter_count,
            award.total(),
            composed.forced_win,
            composed.forced_scatter,
            composed.frozen.held_reels().collect::<Vec<_>>(),
            composed.grid.render()
        );

        // Bonus
        if award.is_awarded() {
            enter(session, presenter, RoundState::Bonus);
            session.free_spins_remaining =
                session.free_spins_remaining.saturating_add(award.total());
            log::info!(
                "{} free spins awarded, {} in pool",
                award.total(),
                session.free_spins_remaining
            );
            if award.triggered() {
                session.stats.bonus_triggers += 1;
            }
            if award.retriggered() {
                session.stats.retriggers += 1;
            }
            presenter.report(&session.snapshot());
            presenter.present_bonus_award(award.total());
        }

        // Present and credit
        let win = evaluation.total_win;
        if win > 0 || award.is_awarded() {
            enter(session, presenter, RoundState::WinPresentation);
            if win > 0 {
                let highlight_cells: &[Cell] = if evaluation.scatter_win > 0.0 {
                    &evaluation.scatter_positions
                } else {
                    &[]
                };
                let presentation = WinPresentation {
                    lines: &evaluation.win_lines,
                    total_win: win,
                    bet,
                    big_win_multiplier: self.spec.big_win_multiplier,
                    highlight_cells,
                };
                presenter.present_wins(&presentation);
                if presentation.is_big_win() {
                    session.stats.big_wins += 1;
                }
            }
        }

        session.balance = session.balance.saturating_add(win);
        session.last_win = win;
        session.stats.total_win += win;
        if win > 0 {
            session.stats.wins += 1;
        } else {
            session.stats.losses += 1;
        }
        session.stats.max_win_ratio = session.stats.max_win_ratio.max(evaluation.win_ratio(bet));

        session.hold_mask = hold_mask_next.clone();
        session.previous_grid = Some(composed.grid.clone());
        presenter.set_hold_indicator(&session.hold_mask);
        presenter.report(&session.snapshot());

        presenter.settle();
        enter(session, presenter, RoundState::Idle);

        Ok(RoundOutcome {
            kind,
            bet,
            grid: composed.grid,
            evaluation,
            award,
            frozen: composed.frozen,
            hold_mask_next,
            forced_win: composed.forced_win,
            forced_scatter: composed.forced_scatter,
            balance_after: session.balance,
        })
    }
}

/// Move the session's machine and notify the presenter on success
fn enter(session: &mut RoundSession, presenter: &mut dyn Presenter, to: RoundState) {
    if let Transition::Moved(from, to) = session.machine.transition(to) {
        presenter.on_transition(from, to, session);
        presenter.report(&session.snapshot());
    }
}
