//! Moderation phases

use serde::{Deserialize, Serialize};
use std::fmt;

/// Phase of the intervention protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    /// Open conversation, talk time is being watched
    Monitoring,
    /// Imbalance held long enough to warn the group
    ImbalanceDetected,
    /// Cooldown nudge aimed at the dominant speaker
    Nudge,
    /// Strict round-robin with a fixed per-turn budget
    StructuredTurnTaking,
    /// Everyone pauses to reflect after a full round
    ReflectionPause,
    /// Group decides whether to resume open conversation
    CheckIn,
}

impl Default for Phase {
    fn default() -> Self {
        Phase::Monitoring
    }
}

impl Phase {
    /// All phases in protocol order
    pub const ALL: [Phase; 6] = [
        Phase::Monitoring,
        Phase::ImbalanceDetected,
        Phase::Nudge,
        Phase::StructuredTurnTaking,
        Phase::ReflectionPause,
        Phase::CheckIn,
    ];

    /// Short human label for logs
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Monitoring => "monitoring",
            Phase::ImbalanceDetected => "imbalance detected",
            Phase::Nudge => "nudge",
            Phase::StructuredTurnTaking => "structured turn-taking",
            Phase::ReflectionPause => "reflection pause",
            Phase::CheckIn => "check-in",
        }
    }

    /// Whether the imbalance flag is forced off while in this phase
    pub fn suppresses_imbalance(&self) -> bool {
        matches!(
            self,
            Phase::StructuredTurnTaking | Phase::ReflectionPause | Phase::Nudge | Phase::CheckIn
        )
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
