//! Moderation engine
//!
//! A synchronous reducer over [`ModerationEvent`]s. Each `send` applies the
//! event, recomputes the derived metrics and, for ticks in auto mode, checks
//! whether the protocol should advance on its own. All timing is logical:
//! the clock only moves when a `TICK` arrives.

use crate::context::{
    ModerationContext, PolicyOverrides, CHECK_IN_SECONDS, GRACE_PERIOD_SECONDS,
    IMBALANCE_DETECTED_SECONDS, MONOLOGUE_LIMIT_SECONDS, REFLECTION_PAUSE_SECONDS,
};
use crate::event::ModerationEvent;
use crate::phase::Phase;
use crate::scorer::dominance_score;
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Independent copy of the engine state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub phase: Phase,
    pub context: ModerationContext,
}

/// Phase state machine plus talk-time metrics
#[derive(Debug, Clone)]
pub struct ModerationEngine {
    phase: Phase,
    context: ModerationContext,
}

impl ModerationEngine {
    /// Create an engine in `MONITORING` with zeroed talk time
    pub fn new(speakers: &[String], overrides: PolicyOverrides) -> Self {
        let context = ModerationContext::new(speakers, overrides.resolve());
        info!(
            "Moderation engine ready with {} speakers: {:?}",
            context.speakers.len(),
            context.speakers
        );
        Self {
            phase: Phase::Monitoring,
            context,
        }
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Borrow the context for in-process readers
    pub fn context(&self) -> &ModerationContext {
        &self.context
    }

    /// Copy of the phase and context
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            context: self.context.clone(),
        }
    }

    /// Apply one event
    pub fn send(&mut self, event: ModerationEvent) {
        debug!("[{}] {} {:?}", self.phase, event.tag(), event);
        let is_tick = matches!(event, ModerationEvent::Tick { .. });

        match event {
            ModerationEvent::SpeakerSet { name } => self.set_speaker(name),
            ModerationEvent::Silence => {
                self.context.active_speaker = None;
                self.context.current_monologue_seconds = 0.0;
            }
            ModerationEvent::Tick { seconds } => self.tick(seconds),
            ModerationEvent::NextTurn => self.next_turn(),
            ModerationEvent::SetQuietSpeaker { name } => self.context.quiet_speaker = name,
            ModerationEvent::SetAutoMode { enabled } => self.context.auto_mode = enabled,
            ModerationEvent::SetQuietMode { enabled } => self.context.quiet_mode = enabled,
            ModerationEvent::AddSpeaker { name } => self.add_speaker(name),
            ModerationEvent::RemoveSpeaker { name } => self.remove_speaker(&name),
            ModerationEvent::SetTalkTime { name, seconds } => self.set_talk_time(&name, seconds),
            ModerationEvent::SetSilence { seconds } => {
                self.context.silence_seconds = non_negative(seconds);
            }
            ModerationEvent::ForceState { phase } => self.transition_to(phase),
            ModerationEvent::TurnsComplete
            | ModerationEvent::PauseDone
            | ModerationEvent::CheckIn { .. } => {
                debug!("Reserved event ignored");
            }
        }

        self.recompute_metrics();

        if is_tick && self.context.auto_mode {
            self.auto_advance();
        }
    }

    fn set_speaker(&mut self, name: String) {
        let ctx = &mut self.context;
        if ctx.active_speaker.as_deref() != Some(name.as_str()) {
            ctx.current_monologue_seconds = 0.0;
        }

        if self.phase == Phase::StructuredTurnTaking {
            // Only listed speakers may take the floor mid-round
            if let Some(index) = ctx.turn_order.iter().position(|s| *s == name) {
                ctx.turn_index = index;
                ctx.active_speaker = Some(name);
                ctx.turn_since = Some(ctx.total_seconds);
            } else {
                debug!("{} is not in the turn order, ignoring", name);
            }
        } else {
            ctx.active_speaker = Some(name);
        }
    }

    fn tick(&mut self, seconds: f64) {
        let seconds = non_negative(seconds);
        let ctx = &mut self.context;
        ctx.total_seconds += seconds;

        match ctx.active_speaker.as_deref() {
            Some(active) => {
                // Unknown names still hold the floor but are not credited,
                // keeping talk_time keyed by `speakers` only
                if let Some(talked) = ctx.talk_time.get_mut(active) {
                    *talked += seconds;
                    ctx.recount_talk_time();
                }
                ctx.current_monologue_seconds += seconds;
                ctx.silence_seconds = 0.0;
            }
            None => {
                ctx.silence_seconds += seconds;
                ctx.current_monologue_seconds = 0.0;
            }
        }
    }

    fn add_speaker(&mut self, name: String) {
        let ctx = &mut self.context;
        if ctx.has_speaker(&name) {
            return;
        }
        ctx.talk_time.insert(name.clone(), 0.0);
        ctx.speakers.push(name);
    }

    fn remove_speaker(&mut self, name: &str) {
        let ctx = &mut self.context;
        ctx.speakers.retain(|s| s != name);
        if ctx.talk_time.remove(name).is_some() {
            ctx.recount_talk_time();
        }
        if ctx.active_speaker.as_deref() == Some(name) {
            ctx.active_speaker = None;
        }
        if ctx.quiet_speaker.as_deref() == Some(name) {
            ctx.quiet_speaker = None;
        }
    }

    fn set_talk_time(&mut self, name: &str, seconds: f64) {
        let ctx = &mut self.context;
        if let Some(talked) = ctx.talk_time.get_mut(name) {
            *talked = non_negative(seconds);
            ctx.recount_talk_time();
        }
    }

    /// Hand the floor to the next speaker, or pause after the last one
    fn next_turn(&mut self) {
        if self.phase != Phase::StructuredTurnTaking {
            return;
        }

        let next = self.context.turn_index + 1;
        if next >= self.context.turn_order.len() {
            self.context.turn_index = next;
            self.transition_to(Phase::ReflectionPause);
            return;
        }

        let ctx = &mut self.context;
        ctx.turn_index = next;
        ctx.active_speaker = Some(ctx.turn_order[next].clone());
        ctx.turn_since = Some(ctx.total_seconds);
        ctx.current_monologue_seconds = 0.0;
        debug!("Turn {} goes to {:?}", next, ctx.active_speaker);
    }

    /// Enter `next`, running its entry effects once
    fn transition_to(&mut self, next: Phase) {
        if next == self.phase {
            return;
        }
        let previous = self.phase;
        let ctx = &mut self.context;

        match next {
            Phase::Monitoring if previous == Phase::CheckIn => {
                ctx.total_seconds = 0.0;
                ctx.total_talk_time = 0.0;
                ctx.current_monologue_seconds = 0.0;
                ctx.silence_seconds = 0.0;
                ctx.imbalance_since = None;
                ctx.imbalance_flag = false;
                ctx.dominance_score = 0.0;
                for talked in ctx.talk_time.values_mut() {
                    *talked = 0.0;
                }
            }
            Phase::Monitoring => {
                ctx.active_speaker = None;
            }
            Phase::StructuredTurnTaking => {
                ctx.turn_order = ctx.speakers.clone();
                ctx.turn_index = 0;
                ctx.active_speaker = ctx.turn_order.first().cloned();
                ctx.turn_since = Some(ctx.total_seconds);
                ctx.current_monologue_seconds = 0.0;
            }
            Phase::ReflectionPause => {
                ctx.active_speaker = None;
                ctx.silence_seconds = 0.0;
                ctx.current_monologue_seconds = 0.0;
            }
            Phase::CheckIn => {
                ctx.active_speaker = None;
                ctx.current_monologue_seconds = 0.0;
            }
            Phase::ImbalanceDetected | Phase::Nudge => {}
        }

        ctx.state_since = Some(ctx.total_seconds);
        self.phase = next;
        info!(
            "Phase {} -> {} at t={}s",
            previous, next, self.context.total_seconds
        );

        self.recompute_metrics();
    }

    fn recompute_metrics(&mut self) {
        let suppressed = self.phase.suppresses_imbalance();
        let ctx = &mut self.context;

        ctx.dominance_score = dominance_score(&ctx.talk_time, &ctx.speakers, ctx.total_talk_time);

        ctx.imbalance_flag = if suppressed
            || ctx.quiet_mode
            || ctx.total_seconds < GRACE_PERIOD_SECONDS
        {
            false
        } else {
            ctx.dominance_score >= ctx.policy.imbalance_score_threshold
                || ctx.current_monologue_seconds >= MONOLOGUE_LIMIT_SECONDS
        };

        // Track the flag's rising and falling edges
        if ctx.imbalance_flag {
            if ctx.imbalance_since.is_none() {
                ctx.imbalance_since = Some(ctx.total_seconds);
            }
        } else {
            ctx.imbalance_since = None;
        }
    }

    /// Take at most one autonomous step
    fn auto_advance(&mut self) {
        let ctx = &self.context;
        let in_phase = ctx.seconds_in_phase();

        match self.phase {
            Phase::Monitoring => {
                if ctx.quiet_mode {
                    return;
                }
                if let Some(since) = ctx.imbalance_since {
                    if ctx.imbalance_flag
                        && ctx.total_seconds - since >= ctx.policy.imbalance_hold_seconds
                    {
                        self.transition_to(Phase::ImbalanceDetected);
                    }
                }
            }
            Phase::ImbalanceDetected => {
                if in_phase >= IMBALANCE_DETECTED_SECONDS {
                    self.transition_to(Phase::Nudge);
                }
            }
            Phase::Nudge => {
                if in_phase >= ctx.policy.nudge_hold_seconds {
                    self.transition_to(Phase::StructuredTurnTaking);
                }
            }
            Phase::StructuredTurnTaking => {
                let turn_elapsed = ctx.total_seconds - ctx.turn_since.unwrap_or(ctx.total_seconds);
                if !ctx.turn_order.is_empty() && turn_elapsed >= ctx.policy.turn_hold_seconds {
                    self.next_turn();
                    self.recompute_metrics();
                }
            }
            Phase::ReflectionPause => {
                if in_phase >= REFLECTION_PAUSE_SECONDS {
                    self.transition_to(Phase::CheckIn);
                }
            }
            Phase::CheckIn => {
                if in_phase >= CHECK_IN_SECONDS {
                    self.transition_to(Phase::Monitoring);
                }
            }
        }
    }
}

/// Clamp a duration to a finite, non-negative value
fn non_negative(seconds: f64) -> f64 {
    if seconds.is_finite() {
        seconds.max(0.0)
    } else {
        0.0
    }
}
