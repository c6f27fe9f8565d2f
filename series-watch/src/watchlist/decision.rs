//! Lifecycle decision table.
//!
//! The decision is an ordered list of guarded rules evaluated top to bottom;
//! the first rule whose guard holds produces the result. Keeping the rules as
//! data makes the priority order explicit and testable without any I/O.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use super::diff::SeriesDiff;
use crate::domain::{LifecycleState, SeriesStatus};

/// An upcoming episode further away than this many days pauses the series.
pub const IMMINENT_WINDOW_DAYS: i64 = 3;

/// Re-check cadence when nothing concrete is scheduled.
pub const HIATUS_RECHECK_DAYS: u64 = 7;

/// Everything the decision depends on.
#[derive(Debug, Clone, Copy)]
pub struct DecisionInput<'a> {
    pub remote: &'a SeriesStatus,
    pub diff: &'a SeriesDiff,
    pub metadata_complete: bool,
    pub force_completed: bool,
    pub today: NaiveDate,
}

/// Result of the decision table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub state: LifecycleState,
    pub paused_until: Option<NaiveDate>,
    /// Rule that produced this decision.
    pub rule: DecisionRule,
}

/// Decision rules, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DecisionRule {
    /// Manual "mark finished" override.
    ForceOverride,
    /// Nothing missing, metadata complete and the series is over.
    EligibleCompletion,
    /// The next missing episode has a known air date.
    KnownUpcomingGap,
    /// Nothing concrete scheduled; re-check later.
    UnknownGap,
}

/// The decision table. Order is priority.
pub const DECISION_RULES: [DecisionRule; 4] = [
    DecisionRule::ForceOverride,
    DecisionRule::EligibleCompletion,
    DecisionRule::KnownUpcomingGap,
    DecisionRule::UnknownGap,
];

impl DecisionRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ForceOverride => "force_override",
            Self::EligibleCompletion => "eligible_completion",
            Self::KnownUpcomingGap => "known_upcoming_gap",
            Self::UnknownGap => "unknown_gap",
        }
    }

    /// Evaluate this rule alone. `None` means its guard does not hold.
    pub fn evaluate(&self, input: &DecisionInput<'_>) -> Option<Decision> {
        match self {
            Self::ForceOverride => input
                .force_completed
                .then(|| self.decision(LifecycleState::Completed, None)),

            Self::EligibleCompletion => {
                let over = input.remote.is_terminal() || input.remote.finale.finale_aired(input.today);
                (input.diff.is_complete() && input.metadata_complete && over)
                    .then(|| self.decision(LifecycleState::Completed, None))
            }

            Self::KnownUpcomingGap => {
                let air_date = input.diff.next_episode.as_ref()?.air_date?;
                let days_until_air = (air_date - input.today).num_days();
                if days_until_air > IMMINENT_WINDOW_DAYS {
                    Some(self.decision(LifecycleState::Paused, air_date.pred_opt()))
                } else {
                    Some(self.decision(LifecycleState::Watching, None))
                }
            }

            Self::UnknownGap => Some(self.decision(
                LifecycleState::Paused,
                input.today.checked_add_days(Days::new(HIATUS_RECHECK_DAYS)),
            )),
        }
    }

    fn decision(self, state: LifecycleState, paused_until: Option<NaiveDate>) -> Decision {
        Decision {
            state,
            paused_until,
            rule: self,
        }
    }
}

impl std::fmt::Display for DecisionRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Run the decision table.
pub fn decide(input: &DecisionInput<'_>) -> Decision {
    DECISION_RULES
        .iter()
        .find_map(|rule| rule.evaluate(input))
        .unwrap_or(Decision {
            state: LifecycleState::Paused,
            paused_until: input.today.checked_add_days(Days::new(HIATUS_RECHECK_DAYS)),
            rule: DecisionRule::UnknownGap,
        })
}
