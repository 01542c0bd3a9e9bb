//! Sticky reel holds and the hold-aware spin composer
//!
//! A reel whose stopped column shows a wild is frozen for exactly the next
//! spin. The composer always generates a full new grid first (so RNG use is
//! identical with or without holds) and then copies frozen columns over
//! from the previous grid.

use serde::{Deserialize, Serialize};

use crate::config::MathSpec;
use crate::generator::generate;
use crate::rng::RandomSource;
use crate::symbols::Grid;

/// Per-reel hold flags; `true` = frozen for the next spin only
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HoldMask {
    held: Vec<bool>,
}

impl HoldMask {
    /// No reel held
    pub fn none(reels: usize) -> Self {
        Self {
            held: vec![false; reels],
        }
    }

    pub fn from_flags(held: Vec<bool>) -> Self {
        Self { held }
    }

    /// Reels whose column contains at least one wild
    pub fn from_wilds(grid: &Grid) -> Self {
        Self {
            held: (0..grid.reels())
                .map(|reel| grid.column(reel).iter().any(|s| s.is_wild()))
                .collect(),
        }
    }

    /// Out-of-range reels are never held
    pub fn is_held(&self, reel: usize) -> bool {
        self.held.get(reel).copied().unwrap_or(false)
    }

    pub fn set(&mut self, reel: usize, held: bool) {
        if reel >= self.held.len() {
            self.held.resize(reel + 1, false);
        }
        self.held[reel] = held;
    }

    pub fn any(&self) -> bool {
        self.held.iter().any(|&h| h)
    }

    pub fn held_count(&self) -> usize {
        self.held.iter().filter(|&&h| h).count()
    }

    /// Indices of held reels
    pub fn held_reels(&self) -> impl Iterator<Item = usize> + '_ {
        self.held
            .iter()
            .enumerate()
            .filter_map(|(reel, &h)| h.then_some(reel))
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.held
    }

    pub fn len(&self) -> usize {
        self.held.len()
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }

    /// Copy of this mask with every reel in `frozen` cleared.
    ///
    /// A reel that sat frozen through a spin cannot renew its own hold.
    pub fn without(&self, frozen: &HoldMask) -> HoldMask {
        Self {
            held: self
                .held
                .iter()
                .enumerate()
                .map(|(reel, &h)| h && !frozen.is_held(reel))
                .collect(),
        }
    }
}

/// Composed grid plus which reels were actually copied from the previous one
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedGrid {
    pub grid: Grid,
    pub forced_win: bool,
    pub forced_scatter: bool,
    /// Reels frozen on this spin
    pub frozen: HoldMask,
}

/// Build this spin's grid, honouring the hold mask carried from last round
pub fn compose(
    rng: &mut dyn RandomSource,
    spec: &MathSpec,
    previous: Option<&Grid>,
    held: Option<&HoldMask>,
) -> ComposedGrid {
    let generated = generate(rng, spec, spec.reels as usize, spec.rows as usize);
    let mut grid = generated.grid;
    let mut frozen = HoldMask::none(grid.reels());

    if let (Some(previous), Some(held)) = (previous, held) {
        let reels = grid.reels();
        let compatible = previous.reels() == reels && previous.rows() == grid.rows();
        if compatible {
            for reel in held.held_reels().filter(|&r| r < reels) {
                grid.set_column(reel, previous.column(reel));
                frozen.set(reel, true);
            }
        } else if held.any() {
            log::warn!(
                "previous grid is {}x{}, current is {}x{}; holds dropped",
                previous.reels(),
                previous.rows(),
                grid.reels(),
                grid.rows()
            );
        }
    }

    ComposedGrid {
        grid,
        forced_win: generated.forced_win,
        forced_scatter: generated.forced_scatter,
        frozen,
    }
}
