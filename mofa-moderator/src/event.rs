//! Events accepted by the moderation engine
//!
//! The event set is closed: [`crate::ModerationEngine::send`] matches on
//! every variant. Events deserialize from tagged maps such as
//! `{"type": "TICK", "seconds": 1}` so drivers can stream them from YAML
//! or JSON.

use crate::phase::Phase;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModerationEvent {
    /// `name` starts talking
    SpeakerSet { name: String },
    /// Nobody is talking
    Silence,
    /// Advance the simulation clock
    Tick { seconds: f64 },
    /// Hand the floor to the next speaker in structured mode
    NextTurn,
    SetQuietSpeaker {
        #[serde(default)]
        name: Option<String>,
    },
    SetAutoMode { enabled: bool },
    SetQuietMode { enabled: bool },
    AddSpeaker { name: String },
    RemoveSpeaker { name: String },
    SetTalkTime { name: String, seconds: f64 },
    SetSilence { seconds: f64 },
    /// Jump to `phase` regardless of auto mode
    ForceState { phase: Phase },
    /// Reserved, ignored by the engine
    TurnsComplete,
    /// Reserved, ignored by the engine
    PauseDone,
    /// Reserved, ignored by the engine
    #[serde(rename = "CHECKIN")]
    CheckIn {
        #[serde(default)]
        can_continue: bool,
    },
}

impl ModerationEvent {
    /// Wire tag, as logged by the engine
    pub fn tag(&self) -> &'static str {
        match self {
            ModerationEvent::SpeakerSet { .. } => "SPEAKER_SET",
            ModerationEvent::Silence => "SILENCE",
            ModerationEvent::Tick { .. } => "TICK",
            ModerationEvent::NextTurn => "NEXT_TURN",
            ModerationEvent::SetQuietSpeaker { .. } => "SET_QUIET_SPEAKER",
            ModerationEvent::SetAutoMode { .. } => "SET_AUTO_MODE",
            ModerationEvent::SetQuietMode { .. } => "SET_QUIET_MODE",
            ModerationEvent::AddSpeaker { .. } => "ADD_SPEAKER",
            ModerationEvent::RemoveSpeaker { .. } => "REMOVE_SPEAKER",
            ModerationEvent::SetTalkTime { .. } => "SET_TALK_TIME",
            ModerationEvent::SetSilence { .. } => "SET_SILENCE",
            ModerationEvent::ForceState { .. } => "FORCE_STATE",
            ModerationEvent::TurnsComplete => "TURNS_COMPLETE",
            ModerationEvent::PauseDone => "PAUSE_DONE",
            ModerationEvent::CheckIn { .. } => "CHECKIN",
        }
    }

    pub fn speaker_set(name: impl Into<String>) -> Self {
        ModerationEvent::SpeakerSet { name: name.into() }
    }

    pub fn tick(seconds: f64) -> Self {
        ModerationEvent::Tick { seconds }
    }
}
