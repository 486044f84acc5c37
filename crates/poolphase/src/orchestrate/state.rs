use serde::{Deserialize, Serialize};
use std::fmt;

/// Steps of a generation run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PipelineState {
    /// Nothing done yet.
    Start,
    /// Pool directory reset to the placeholder.
    Staged,
    /// Target package and import set known.
    Resolved,
    /// Tolerant program loaded.
    Loaded,
    /// Pool sources written.
    Synthesized,
    /// Strict reload passed.
    Validated,
    /// Run finished successfully.
    Done,
    /// Run stopped on a fatal error.
    Aborted,
}

impl PipelineState {
    /// True for `Done` and `Aborted`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Aborted)
    }

    /// True when the state machine allows moving from `self` to `next`.
    pub fn can_transition(self, next: Self) -> bool {
        use PipelineState::*;
        match (self, next) {
            (from, Aborted) => !from.is_terminal(),
            (Start, Staged)
            | (Staged, Resolved)
            | (Staged, Done)
            | (Resolved, Loaded)
            | (Loaded, Synthesized)
            | (Synthesized, Validated)
            | (Validated, Done) => true,
            _ => false,
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::Staged => "staged",
            Self::Resolved => "resolved",
            Self::Loaded => "loaded",
            Self::Synthesized => "synthesized",
            Self::Validated => "validated",
            Self::Done => "done",
            Self::Aborted => "aborted",
        };
        f.write_str(name)
    }
}
