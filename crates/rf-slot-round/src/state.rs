//! Round states and the whitelisted transition table

use serde::{Deserialize, Serialize};

/// Round lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoundState {
    /// Waiting for a spin request
    #[default]
    Idle,
    /// Grid being composed, reels in motion
    Spinning,
    /// Reels stopped, grid being scored
    Result,
    /// Free spins being awarded
    Bonus,
    /// Wins being shown and credited
    WinPresentation,
}

impl RoundState {
    /// States reachable from `self` in one step
    pub fn successors(self) -> &'static [RoundState] {
        use RoundState::*;
        match self {
            Idle => &[Spinning],
            Spinning => &[Result],
            Result => &[Bonus, WinPresentation, Idle],
            Bonus => &[WinPresentation],
            WinPresentation => &[Idle, Spinning],
        }
    }

    /// Staying put is always allowed
    pub fn can_transition(self, to: RoundState) -> bool {
        self == to || self.successors().contains(&to)
    }

    pub fn name(self) -> &'static str {
        match self {
            RoundState::Idle => "IDLE",
            RoundState::Spinning => "SPINNING",
            RoundState::Result => "RESULT",
            RoundState::Bonus => "BONUS",
            RoundState::WinPresentation => "WIN_PRESENTATION",
        }
    }
}

impl std::fmt::Display for RoundState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of a transition request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Moved from the first state to the second
    Moved(RoundState, RoundState),
    /// Already in the requested state
    Unchanged,
    /// Not on the whitelist; state left as it was
    Ignored,
}

impl Transition {
    /// True for `Moved` and `Unchanged`
    pub fn succeeded(self) -> bool {
        !matches!(self, Transition::Ignored)
    }
}

/// Holder of the current state that only moves along whitelisted edges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoundMachine {
    state: RoundState,
}

impl RoundMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RoundState {
        self.state
    }

    pub fn can_transition(&self, to: RoundState) -> bool {
        self.state.can_transition(to)
    }

    /// Request a move. Illegal requests are ignored, never an error.
    pub fn transition(&mut self, to: RoundState) -> Transition {
        if self.state == to {
            return Transition::Unchanged;
        }
        if !self.state.can_transition(to) {
            log::debug!("ignored illegal transition {} -> {}", self.state, to);
            return Transition::Ignored;
        }
        let from = self.state;
        self.state = to;
        Transition::Moved(from, to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::RoundState::*;

    const ALL: [RoundState; 5] = [Idle, Spinning, Result, Bonus, WinPresentation];

    #[test]
    fn test_whitelist() {
        let allowed = [
            (Idle, Spinning),
            (Spinning, Result),
            (Result, Bonus),
            (Result, WinPresentation),
            (Result, Idle),
            (Bonus, WinPresentation),
            (WinPresentation, Idle),
            (WinPresentation, Spinning),
        ];
        for from in ALL {
            for to in ALL {
                let expected = from == to || allowed.contains(&(from, to));
                assert_eq!(from.can_transition(to), expected, "{from} -> {to}");
            }
        }
    }

    #[test]
    fn test_illegal_transition_ignored() {
        let mut machine = RoundMachine::new();
        assert_eq!(machine.transition(Bonus), Transition::Ignored);
        assert_eq!(machine.state(), Idle);
    }

    #[test]
    fn test_self_transition_noop() {
        let mut machine = RoundMachine::new();
        let t = machine.transition(Idle);
        assert_eq!(t, Transition::Unchanged);
        assert!(t.succeeded());
    }

    #[test]
    fn test_full_bonus_path() {
        let mut machine = RoundMachine::new();
        for to in [Spinning, Result, Bonus, WinPresentation, Idle] {
            assert_eq!(machine.transition(to), Transition::Moved(machine_prev(to), to));
        }
        assert_eq!(machine.state(), Idle);
    }

    fn machine_prev(to: RoundState) -> RoundState {
        match to {
            Spinning => Idle,
            Result => Spinning,
            Bonus => Result,
            WinPresentation => Bonus,
            Idle => WinPresentation,
        }
    }
}
