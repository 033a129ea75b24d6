/// Capture controller state machine.
///
/// State transitions:
/// ```text
/// idle → requesting → previewing → recording → processing → ready_for_review → finalizing → saved
///  │                                   ↑            │   ↑          │    │            │
///  │                                   └── retake ──┘   │          │    └────────────┘ (save failed)
///  └──────────────── upload ────────────────────────────┘          └── retake → recording
///
/// every state except saved → idle (cancel); saved → idle (replace / permitted delete)
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureState {
    Idle,
    Requesting,
    Previewing { countdown_remaining: u32 },
    Recording { duration_secs: f64 },
    Processing,
    ReadyForReview,
    Finalizing,
    Saved,
}

impl CaptureState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_previewing(&self) -> bool {
        matches!(self, Self::Previewing { .. })
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording { .. })
    }

    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved)
    }

    /// Whether a live device stream may be held in this state.
    pub fn holds_stream(&self) -> bool {
        matches!(self, Self::Requesting | Self::Previewing { .. } | Self::Recording { .. })
    }

    /// Current recording duration, if recording.
    pub fn duration(&self) -> Option<f64> {
        match self {
            Self::Recording { duration_secs } => Some(*duration_secs),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Requesting => "requesting",
            Self::Previewing { .. } => "previewing",
            Self::Recording { .. } => "recording",
            Self::Processing => "processing",
            Self::ReadyForReview => "ready_for_review",
            Self::Finalizing => "finalizing",
            Self::Saved => "saved",
        }
    }

    /// The fixed transition table. Self-transitions are allowed only for the
    /// states that carry a progress payload (countdown, recording duration).
    pub fn can_transition_to(&self, next: &CaptureState) -> bool {
        use CaptureState::*;
        match (self, next) {
            (Idle, Requesting) | (Idle, Processing) => true,
            (Requesting, Previewing { .. }) => true,
            (Previewing { .. }, Previewing { .. }) | (Previewing { .. }, Recording { .. }) => true,
            (Recording { .. }, Recording { .. }) | (Recording { .. }, Processing) => true,
            (Processing, ReadyForReview) | (Processing, Recording { .. }) => true,
            (ReadyForReview, Recording { .. }) | (ReadyForReview, Finalizing) => true,
            (Finalizing, Saved) | (Finalizing, ReadyForReview) => true,
            (Saved, Idle) => true,
            (Saved, _) | (Idle, Idle) => false,
            (_, Idle) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for CaptureState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording() -> CaptureState {
        CaptureState::Recording { duration_secs: 0.0 }
    }

    fn previewing() -> CaptureState {
        CaptureState::Previewing { countdown_remaining: 3 }
    }

    #[test]
    fn happy_path_is_allowed() {
        let path = [
            CaptureState::Idle,
            CaptureState::Requesting,
            previewing(),
            recording(),
            CaptureState::Processing,
            CaptureState::ReadyForReview,
            CaptureState::Finalizing,
            CaptureState::Saved,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(&pair[1]), "{} → {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn every_state_but_saved_can_reset_to_idle() {
        let states = [
            CaptureState::Requesting,
            previewing(),
            recording(),
            CaptureState::Processing,
            CaptureState::ReadyForReview,
            CaptureState::Finalizing,
        ];
        for state in states {
            assert!(state.can_transition_to(&CaptureState::Idle), "{} → idle", state);
        }
    }

    #[test]
    fn skipping_steps_is_rejected() {
        assert!(!CaptureState::Idle.can_transition_to(&recording()));
        assert!(!CaptureState::Requesting.can_transition_to(&recording()));
        assert!(!previewing().can_transition_to(&CaptureState::Processing));
        assert!(!CaptureState::ReadyForReview.can_transition_to(&CaptureState::Saved));
        assert!(!CaptureState::Saved.can_transition_to(&CaptureState::Requesting));
        assert!(!CaptureState::Idle.can_transition_to(&CaptureState::Idle));
    }

    #[test]
    fn stream_is_only_held_before_processing() {
        assert!(CaptureState::Requesting.holds_stream());
        assert!(recording().holds_stream());
        assert!(!CaptureState::Processing.holds_stream());
        assert!(!CaptureState::Saved.holds_stream());
    }
}
