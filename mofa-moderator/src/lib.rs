//! # MoFA Moderator
//!
//! Talk-time moderation for live group conversations. Tracks how long each
//! participant speaks and walks the group through an intervention protocol
//! when one voice dominates.
//!
//! ## Protocol
//!
//! ```text
//!  MONITORING ──(imbalance held)──► IMBALANCE_DETECTED ──(15s)──► NUDGE
//!      ▲                                                            │
//!      │ (20s, history reset)                                  (nudge hold)
//!      │                                                            ▼
//!  CHECK_IN ◄──(20s)── REFLECTION_PAUSE ◄──(round done)── STRUCTURED_TURN_TAKING
//! ```
//!
//! ## Key Components
//!
//! - [`ModerationEngine`] - synchronous reducer over [`ModerationEvent`]s
//! - [`dominance_score`] - normalized imbalance metric
//! - [`SharedModerator`] - locked handle with dirty-tracked snapshots
//! - [`ModeratorConfig`] - TOML + environment configuration
//! - [`Advisor`] - canned and generated guidance per phase
//! - [`replay`] - scripted event playback
//!
//! ## Usage Example
//!
//! ```rust
//! use mofa_moderator::{ModerationEngine, ModerationEvent, Phase, PolicyOverrides};
//!
//! let speakers = vec!["Ana".to_string(), "Ben".to_string()];
//! let mut engine = ModerationEngine::new(&speakers, PolicyOverrides::default());
//!
//! engine.send(ModerationEvent::speaker_set("Ana"));
//! for _ in 0..30 {
//!     engine.send(ModerationEvent::tick(1.0));
//! }
//!
//! let snapshot = engine.snapshot();
//! assert_eq!(snapshot.phase, Phase::ImbalanceDetected);
//! assert_eq!(snapshot.context.talk_time["Ana"], 30.0);
//! ```
//!
//! The engine performs no I/O and never reads the wall clock. Drivers decide
//! how often to send `TICK` events; stopping them pauses the protocol.

pub mod advisory;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod event;
pub mod phase;
pub mod replay;
pub mod scorer;
pub mod shared_state;

// Re-exports
pub use advisory::{canned_advice, AdviceProvider, AdviceRequest, Advisor, OpenAiAdviceProvider};
pub use config::{AdvisoryConfig, ConfigSource, ModeratorConfig};
pub use context::{ModerationContext, ModerationPolicy, PolicyOverrides};
pub use engine::{ModerationEngine, Snapshot};
pub use error::{AdvisoryError, AdvisoryResult, ConfigError, ConfigResult};
pub use event::ModerationEvent;
pub use phase::Phase;
pub use replay::{replay, ReplayOutcome, ReplayScript};
pub use scorer::dominance_score;
pub use shared_state::SharedModerator;
