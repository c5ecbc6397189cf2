//! Update lifecycle state.

/// Phase of the current detection cycle, monotonic:
/// none → available → applying → {reloaded | error}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdatePhase {
    #[default]
    None,
    Available,
    Applying,
    Reloaded,
    Error,
}

/// Observable update state exposed to the page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateState {
    pub phase: UpdatePhase,
    pub error: Option<String>,
}

impl UpdateState {
    /// A newer build is installed and waiting.
    pub fn available(&self) -> bool {
        matches!(self.phase, UpdatePhase::Available | UpdatePhase::Applying)
    }

    /// A handoff is in flight.
    pub fn applying(&self) -> bool {
        self.phase == UpdatePhase::Applying
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_follow_phase() {
        let mut state = UpdateState::default();
        assert!(!state.available());
        assert!(!state.applying());

        state.phase = UpdatePhase::Available;
        assert!(state.available());
        assert!(!state.applying());

        state.phase = UpdatePhase::Applying;
        assert!(state.available());
        assert!(state.applying());

        state.phase = UpdatePhase::Reloaded;
        assert!(!state.applying());
    }
}
