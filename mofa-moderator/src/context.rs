//! Moderation context and policy
//!
//! The context is the single mutable record the engine owns. Readers only
//! ever see it through a [`crate::Snapshot`] copy.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default dominance score at which the imbalance flag trips
pub const DEFAULT_IMBALANCE_SCORE_THRESHOLD: f64 = 0.35;
/// Default seconds the imbalance flag must hold before escalating
pub const DEFAULT_IMBALANCE_HOLD_SECONDS: f64 = 15.0;
/// Default seconds spent in the nudge phase
pub const DEFAULT_NUDGE_HOLD_SECONDS: f64 = 15.0;
/// Per-turn budget during structured turn-taking
pub const TURN_HOLD_SECONDS: f64 = 60.0;

/// Imbalance detection stays off until the clock reaches this
pub const GRACE_PERIOD_SECONDS: f64 = 15.0;
/// An uninterrupted monologue this long trips the imbalance flag
pub const MONOLOGUE_LIMIT_SECONDS: f64 = 15.0;
/// Seconds spent warning the group before the nudge
pub const IMBALANCE_DETECTED_SECONDS: f64 = 15.0;
/// Seconds of reflective pause after a structured round
pub const REFLECTION_PAUSE_SECONDS: f64 = 20.0;
/// Seconds of check-in before monitoring resumes
pub const CHECK_IN_SECONDS: f64 = 20.0;

/// Tunable policy constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModerationPolicy {
    pub imbalance_score_threshold: f64,
    pub imbalance_hold_seconds: f64,
    pub nudge_hold_seconds: f64,
    pub turn_hold_seconds: f64,
}

impl Default for ModerationPolicy {
    fn default() -> Self {
        Self {
            imbalance_score_threshold: DEFAULT_IMBALANCE_SCORE_THRESHOLD,
            imbalance_hold_seconds: DEFAULT_IMBALANCE_HOLD_SECONDS,
            nudge_hold_seconds: DEFAULT_NUDGE_HOLD_SECONDS,
            turn_hold_seconds: TURN_HOLD_SECONDS,
        }
    }
}

/// Optional policy overrides supplied at construction
///
/// The turn budget is fixed and cannot be overridden.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyOverrides {
    pub imbalance_score_threshold: Option<f64>,
    pub imbalance_hold_seconds: Option<f64>,
    pub nudge_hold_seconds: Option<f64>,
}

impl PolicyOverrides {
    /// Apply overrides on top of the default policy
    pub fn resolve(&self) -> ModerationPolicy {
        let defaults = ModerationPolicy::default();
        ModerationPolicy {
            imbalance_score_threshold: self
                .imbalance_score_threshold
                .unwrap_or(defaults.imbalance_score_threshold),
            imbalance_hold_seconds: self
                .imbalance_hold_seconds
                .unwrap_or(defaults.imbalance_hold_seconds),
            nudge_hold_seconds: self.nudge_hold_seconds.unwrap_or(defaults.nudge_hold_seconds),
            turn_hold_seconds: defaults.turn_hold_seconds,
        }
    }
}

/// Talk-time metrics and protocol bookkeeping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationContext {
    /// Participants in insertion order (default turn order)
    pub speakers: Vec<String>,
    /// Who holds the floor; `None` is silence
    pub active_speaker: Option<String>,
    /// Participant manually marked as the quiet one
    pub quiet_speaker: Option<String>,
    /// Accumulated seconds per speaker; keys always match `speakers`
    pub talk_time: BTreeMap<String, f64>,
    /// Simulation clock
    pub total_seconds: f64,
    pub silence_seconds: f64,
    /// Always equals the sum of `talk_time`
    pub total_talk_time: f64,
    pub current_monologue_seconds: f64,
    pub auto_mode: bool,
    pub quiet_mode: bool,
    pub policy: ModerationPolicy,
    pub imbalance_since: Option<f64>,
    pub state_since: Option<f64>,
    pub turn_since: Option<f64>,
    /// Speakers captured when structured turn-taking began
    pub turn_order: Vec<String>,
    pub turn_index: usize,
    pub dominance_score: f64,
    pub imbalance_flag: bool,
}

impl ModerationContext {
    /// Create a context with zeroed talk time for each speaker
    ///
    /// Duplicate names collapse onto their first occurrence.
    pub fn new(speakers: &[String], policy: ModerationPolicy) -> Self {
        let mut ordered: Vec<String> = Vec::with_capacity(speakers.len());
        for name in speakers {
            if !ordered.contains(name) {
                ordered.push(name.clone());
            }
        }
        let talk_time = ordered.iter().map(|s| (s.clone(), 0.0)).collect();

        Self {
            speakers: ordered,
            active_speaker: None,
            quiet_speaker: None,
            talk_time,
            total_seconds: 0.0,
            silence_seconds: 0.0,
            total_talk_time: 0.0,
            current_monologue_seconds: 0.0,
            auto_mode: true,
            quiet_mode: false,
            policy,
            imbalance_since: None,
            state_since: Some(0.0),
            turn_since: None,
            turn_order: Vec::new(),
            turn_index: 0,
            dominance_score: 0.0,
            imbalance_flag: false,
        }
    }

    /// Whether `name` is a known speaker
    pub fn has_speaker(&self, name: &str) -> bool {
        self.speakers.iter().any(|s| s == name)
    }

    /// Speaker with the most talk time, first in speaker order on ties
    pub fn dominant_speaker(&self) -> Option<&str> {
        if self.total_talk_time <= 0.0 {
            return None;
        }
        let mut best: Option<(&str, f64)> = None;
        for name in &self.speakers {
            let seconds = self.talk_time.get(name).copied().unwrap_or(0.0);
            match best {
                Some((_, top)) if seconds <= top => {}
                _ => best = Some((name.as_str(), seconds)),
            }
        }
        best.map(|(name, _)| name)
    }

    /// Fraction of total talk time owned by `name`
    pub fn talk_share(&self, name: &str) -> f64 {
        if self.total_talk_time <= 0.0 {
            return 0.0;
        }
        self.talk_time.get(name).copied().unwrap_or(0.0) / self.total_talk_time
    }

    /// Seconds since the current phase began
    pub fn seconds_in_phase(&self) -> f64 {
        self.total_seconds - self.state_since.unwrap_or(self.total_seconds)
    }

    /// Rebuild `total_talk_time` from the per-speaker entries
    ///
    /// Summed fresh so fractional ticks never drift from the map.
    pub(crate) fn recount_talk_time(&mut self) {
        self.total_talk_time = self.talk_time.values().sum();
    }

    /// Speaker whose turn it is, when the turn index is in range
    pub fn current_turn(&self) -> Option<&str> {
        self.turn_order.get(self.turn_index).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_new_context_zeroes_talk_time() {
        let ctx = ModerationContext::new(&names(&["A", "B", "A"]), ModerationPolicy::default());
        assert_eq!(ctx.speakers, names(&["A", "B"]));
        assert_eq!(ctx.talk_time.len(), 2);
        assert!(ctx.talk_time.values().all(|t| *t == 0.0));
        assert!(ctx.auto_mode);
        assert!(!ctx.quiet_mode);
    }

    #[test]
    fn test_overrides_keep_turn_budget_fixed() {
        let overrides = PolicyOverrides {
            imbalance_score_threshold: Some(0.5),
            imbalance_hold_seconds: None,
            nudge_hold_seconds: Some(5.0),
        };
        let policy = overrides.resolve();
        assert_eq!(policy.imbalance_score_threshold, 0.5);
        assert_eq!(policy.imbalance_hold_seconds, DEFAULT_IMBALANCE_HOLD_SECONDS);
        assert_eq!(policy.nudge_hold_seconds, 5.0);
        assert_eq!(policy.turn_hold_seconds, TURN_HOLD_SECONDS);
    }

    #[test]
    fn test_dominant_speaker_and_share() {
        let mut ctx = ModerationContext::new(&names(&["A", "B", "C"]), ModerationPolicy::default());
        assert_eq!(ctx.dominant_speaker(), None);

        ctx.talk_time.insert("B".into(), 30.0);
        ctx.talk_time.insert("C".into(), 10.0);
        ctx.total_talk_time = 40.0;
        assert_eq!(ctx.dominant_speaker(), Some("B"));
        assert!((ctx.talk_share("B") - 0.75).abs() < 1e-9);
        assert_eq!(ctx.talk_share("A"), 0.0);
        assert_eq!(ctx.talk_share("nobody"), 0.0);
    }

    #[test]
    fn test_dominant_speaker_tie_prefers_speaker_order() {
        let mut ctx = ModerationContext::new(&names(&["B", "A"]), ModerationPolicy::default());
        ctx.talk_time.insert("A".into(), 10.0);
        ctx.talk_time.insert("B".into(), 10.0);
        ctx.total_talk_time = 20.0;
        assert_eq!(ctx.dominant_speaker(), Some("B"));
    }

    #[test]
    fn test_current_turn_tracks_index() {
        let mut ctx = ModerationContext::new(&names(&["A", "B"]), ModerationPolicy::default());
        assert_eq!(ctx.current_turn(), None);

        ctx.turn_order = names(&["B", "A"]);
        assert_eq!(ctx.current_turn(), Some("B"));
        ctx.turn_index = 1;
        assert_eq!(ctx.current_turn(), Some("A"));
        ctx.turn_index = 2;
        assert_eq!(ctx.current_turn(), None);
    }
}
