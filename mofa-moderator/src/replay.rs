//! Scripted event replay
//!
//! Drives an engine from a YAML script, the way a live driver would feed
//! speaker detection and a one-second timer:
//!
//! ```yaml
//! speakers: [Ana, Ben]
//! events:
//!   - type: SPEAKER_SET
//!     name: Ana
//!   - type: TICK
//!     seconds: 1
//!     repeat: 60
//! ```

use crate::advisory::Advisor;
use crate::engine::{ModerationEngine, Snapshot};
use crate::event::ModerationEvent;
use crate::phase::Phase;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct ReplayScript {
    #[serde(default)]
    pub speakers: Vec<String>,
    #[serde(default)]
    pub events: Vec<ScriptStep>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScriptStep {
    #[serde(flatten)]
    pub event: ModerationEvent,
    /// Send the event this many times
    #[serde(default = "default_repeat")]
    pub repeat: usize,
}

fn default_repeat() -> usize {
    1
}

impl ReplayScript {
    pub fn from_yaml_str(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    /// Total number of events after expanding repeats
    pub fn event_count(&self) -> usize {
        self.events.iter().map(|step| step.repeat).sum()
    }
}

/// A phase change seen during replay
#[derive(Debug, Clone, Serialize)]
pub struct Transition {
    /// 1-based index of the event that caused it
    pub event_index: usize,
    pub at_seconds: f64,
    pub from: Phase,
    pub to: Phase,
    pub advice: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplayOutcome {
    pub transitions: Vec<Transition>,
    pub snapshot: Snapshot,
}

/// Send every scripted event, recording phase changes with their advice
pub fn replay(engine: &mut ModerationEngine, script: &ReplayScript, advisor: &Advisor) -> ReplayOutcome {
    let mut transitions = Vec::new();
    let mut index = 0;

    for step in &script.events {
        for _ in 0..step.repeat {
            index += 1;
            let before = engine.phase();
            engine.send(step.event.clone());
            let after = engine.phase();
            if after == before {
                continue;
            }

            let snapshot = engine.snapshot();
            let advice = advisor.advise(&snapshot);
            log::info!(
                "#{} t={}s {} -> {}: {}",
                index, snapshot.context.total_seconds, before, after, advice
            );
            transitions.push(Transition {
                event_index: index,
                at_seconds: snapshot.context.total_seconds,
                from: before,
                to: after,
                advice,
            });
        }
    }

    ReplayOutcome {
        transitions,
        snapshot: engine.snapshot(),
    }
}
