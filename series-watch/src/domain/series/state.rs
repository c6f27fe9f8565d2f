//! Tracked series lifecycle state.

use serde::{Deserialize, Serialize};

/// Lifecycle of a tracked series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LifecycleState {
    /// New episodes are imminent or already missing; check on every regular pass.
    #[default]
    Watching,
    /// Nothing is airing soon; left alone until the pause window elapses.
    Paused,
    /// The series is finished, either by observation or by manual override.
    Completed,
}

impl LifecycleState {
    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Watching => "Watching",
            Self::Paused => "Paused",
            Self::Completed => "Completed",
        }
    }

    /// Parse from database string representation.
    ///
    /// `Ended` is accepted as a legacy spelling of `Completed`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Watching" => Some(Self::Watching),
            "Paused" => Some(Self::Paused),
            "Completed" | "Ended" => Some(Self::Completed),
            _ => None,
        }
    }

    /// Whether the regular reconciliation pass owns this state.
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Completed)
    }

    /// All states, in display order.
    pub fn all() -> [LifecycleState; 3] {
        [Self::Watching, Self::Paused, Self::Completed]
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
