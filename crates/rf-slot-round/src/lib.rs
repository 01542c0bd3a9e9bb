//! # rf-slot-round: reel-slot round engine
//!
//! Deterministic core of a line-pays video slot: weighted grid generation
//! with hit-rate and bonus-frequency targeting, sticky wild holds, payline
//! and scatter scoring, free-spin accounting, and the round state machine
//! that ties them together.
//!
//! ## Architecture
//!
//! ```text
//! RawConfig ──resolve──> MathSpec
//!                           │
//! RoundEngine (MathSpec + RandomSource)
//!     │
//!     ├── compose   (generator + hold mask)
//!     ├── evaluate  (paylines, scatters, multiplier)
//!     ├── award     (trigger / retrigger)
//!     └── RoundMachine  IDLE → SPINNING → RESULT → (BONUS) → WIN_PRESENTATION → IDLE
//!           │
//!           v
//!     RoundSession (owned by the caller) + Presenter notifications
//! ```

pub mod bonus;
pub mod config;
pub mod engine;
pub mod generator;
pub mod hold;
pub mod paytable;
pub mod presenter;
pub mod rng;
pub mod state;
pub mod symbols;

pub use bonus::*;
pub use config::*;
pub use engine::*;
pub use generator::*;
pub use hold::*;
pub use paytable::*;
pub use presenter::*;
pub use rng::*;
pub use state::*;
pub use symbols::*;
