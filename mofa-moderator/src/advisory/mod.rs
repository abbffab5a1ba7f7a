//! Advisory text for the moderation UI
//!
//! Reads engine snapshots and turns them into a short line of guidance.
//! Most phases have a canned line. The nudge phase asks a generative
//! [`AdviceProvider`] for a tip, cached per `(phase, speaker count)`.
//!
//! [`Advisor::advise`] never blocks: a cache miss queues the request for a
//! background worker and returns the fallback text right away. Provider
//! failures, including rate limiting, are logged and the fallback keeps
//! being served.

pub mod client;

pub use client::OpenAiAdviceProvider;

use crate::config::AdvisoryConfig;
use crate::engine::Snapshot;
use crate::error::{AdvisoryError, AdvisoryResult};
use crate::phase::Phase;
use crossbeam_channel::{unbounded, Sender};
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

pub const DEFAULT_FALLBACK_TEXT: &str =
    "Invite someone who hasn't spoken yet to share their view.";

/// What a provider is asked to advise on; doubles as the cache key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AdviceRequest {
    pub phase: Phase,
    pub speaker_count: usize,
}

impl AdviceRequest {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self {
            phase: snapshot.phase,
            speaker_count: snapshot.context.speakers.len(),
        }
    }
}

/// Source of generated advice
pub trait AdviceProvider: Send + Sync {
    fn advise(&self, request: &AdviceRequest) -> AdvisoryResult<String>;
}

/// Fixed line for phases that never call a provider
pub fn canned_advice(phase: Phase) -> Option<&'static str> {
    match phase {
        Phase::Monitoring => Some("Conversation is flowing. Keep listening to each other."),
        Phase::ImbalanceDetected => {
            Some("One voice is carrying most of the conversation. Time to widen the circle.")
        }
        Phase::Nudge => None,
        Phase::StructuredTurnTaking => {
            Some("Round-robin turns: speak when it's your turn, then pass the floor.")
        }
        Phase::ReflectionPause => Some("Take a quiet moment to reflect on what you've heard."),
        Phase::CheckIn => Some("Check in: is everyone ready to go back to open conversation?"),
    }
}

/// Caching, non-blocking advisory text collaborator
pub struct Advisor {
    fallback: String,
    cache: Arc<RwLock<HashMap<AdviceRequest, String>>>,
    pending: Arc<Mutex<HashSet<AdviceRequest>>>,
    stopping: Arc<AtomicBool>,
    requests: Option<Sender<AdviceRequest>>,
    worker: Option<JoinHandle<()>>,
}

impl Advisor {
    /// Advisor that only serves canned lines and the fallback
    pub fn offline(fallback: impl Into<String>) -> Self {
        Self {
            fallback: fallback.into(),
            cache: Arc::new(RwLock::new(HashMap::new())),
            pending: Arc::new(Mutex::new(HashSet::new())),
            stopping: Arc::new(AtomicBool::new(false)),
            requests: None,
            worker: None,
        }
    }

    /// Advisor backed by `provider` on a background worker thread
    pub fn with_provider(provider: Arc<dyn AdviceProvider>, fallback: impl Into<String>) -> Self {
        let mut advisor = Self::offline(fallback);
        let (tx, rx) = unbounded::<AdviceRequest>();
        let cache = Arc::clone(&advisor.cache);
        let pending = Arc::clone(&advisor.pending);
        let stopping = Arc::clone(&advisor.stopping);

        let spawned = thread::Builder::new()
            .name("moderator-advisor".to_string())
            .spawn(move || {
                // Exits once the advisor drops its sender. Requests still
                // queued at that point are skipped.
                for request in rx.iter() {
                    if stopping.load(Ordering::Acquire) {
                        break;
                    }
                    match provider.advise(&request) {
                        Ok(text) if !text.trim().is_empty() => {
                            log::debug!("Cached advice for {:?}", request);
                            cache.write().insert(request, text.trim().to_string());
                        }
                        Ok(_) => log::warn!("Provider returned empty advice for {:?}", request),
                        Err(AdvisoryError::RateLimited) => {
                            log::warn!("Advice provider rate limited, serving fallback")
                        }
                        Err(e) => log::warn!("Advice request failed for {:?}: {}", request, e),
                    }
                    pending.lock().remove(&request);
                }
                log::debug!("Advisor worker stopped");
            });

        match spawned {
            Ok(handle) => {
                advisor.requests = Some(tx);
                advisor.worker = Some(handle);
            }
            Err(e) => log::warn!("Failed to start advisor worker, advice is offline: {}", e),
        }
        advisor
    }

    /// Build from config, falling back to offline when disabled or misconfigured
    pub fn from_config(config: &AdvisoryConfig) -> Self {
        match OpenAiAdviceProvider::from_config(config) {
            Ok(provider) => {
                log::info!("Generative advice enabled with model {}", config.model);
                Self::with_provider(Arc::new(provider), config.fallback_text.clone())
            }
            Err(AdvisoryError::Disabled) => Self::offline(config.fallback_text.clone()),
            Err(e) => {
                log::warn!("Generative advice unavailable: {}", e);
                Self::offline(config.fallback_text.clone())
            }
        }
    }

    /// Guidance for the given snapshot
    pub fn advise(&self, snapshot: &Snapshot) -> String {
        if let Some(text) = canned_advice(snapshot.phase) {
            return text.to_string();
        }

        let request = AdviceRequest::from_snapshot(snapshot);
        if let Some(text) = self.cache.read().get(&request) {
            return text.clone();
        }
        self.enqueue(request);
        self.fallback.clone()
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    pub fn cached(&self, request: &AdviceRequest) -> Option<String> {
        self.cache.read().get(request).cloned()
    }

    pub fn is_pending(&self, request: &AdviceRequest) -> bool {
        self.pending.lock().contains(request)
    }

    fn enqueue(&self, request: AdviceRequest) {
        let Some(requests) = &self.requests else {
            return;
        };
        // At most one in-flight request per key
        if !self.pending.lock().insert(request) {
            return;
        }
        if let Err(e) = requests.send(request) {
            log::warn!("Advisor worker unavailable: {}", e);
            self.pending.lock().remove(&request);
        }
    }
}

impl Drop for Advisor {
    fn drop(&mut self) {
        self.stopping.store(true, Ordering::Release);
        self.requests.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("Advisor worker panicked");
            }
        }
    }
}
