//! Single-report viewer state with a stale-response guard.
//!
//! Every navigation bumps a generation counter and hands out a token. A
//! fetch result is only applied while its token is current, so a slow
//! response for a previous hash can never overwrite the newer one.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use super::{resolve, ReportView};
use crate::api::ReportSource;
use crate::cache::ReportCache;

/// Ticket for one fetch; only the latest ticket may publish a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchToken {
    generation: u64,
    hash: String,
}

impl FetchToken {
    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// What the viewer currently shows.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerPhase {
    Idle,
    Loading { hash: String },
    Ready(ReportView),
}

struct ViewerState {
    generation: u64,
    hash: Option<String>,
    phase: ViewerPhase,
}

/// Viewer bound to a report source and the fallback cache.
pub struct ReportViewer {
    source: Arc<dyn ReportSource>,
    cache: Arc<ReportCache>,
    state: Mutex<ViewerState>,
}

impl ReportViewer {
    pub fn new(source: Arc<dyn ReportSource>, cache: Arc<ReportCache>) -> Self {
        Self {
            source,
            cache,
            state: Mutex::new(ViewerState {
                generation: 0,
                hash: None,
                phase: ViewerPhase::Idle,
            }),
        }
    }

    /// Switch to `hash`. Returns `None` if it is already the current hash.
    pub fn navigate(&self, hash: &str) -> Option<FetchToken> {
        let mut state = self.lock();
        if state.hash.as_deref() == Some(hash) {
            return None;
        }
        Some(Self::begin(&mut state, hash))
    }

    /// Start a new fetch for the current hash.
    pub fn refresh(&self) -> Option<FetchToken> {
        let mut state = self.lock();
        let hash = state.hash.clone()?;
        Some(Self::begin(&mut state, &hash))
    }

    fn begin(state: &mut ViewerState, hash: &str) -> FetchToken {
        state.generation += 1;
        state.hash = Some(hash.to_string());
        // Keep showing the previous view of the same hash while refreshing.
        let refreshing = matches!(state.phase, ViewerPhase::Ready(ref v) if v.hash == hash);
        if !refreshing {
            state.phase = ViewerPhase::Loading {
                hash: hash.to_string(),
            };
        }
        FetchToken {
            generation: state.generation,
            hash: hash.to_string(),
        }
    }

    /// Resolve the token's hash and publish the result if still current.
    pub async fn load(&self, token: FetchToken) -> bool {
        let view = resolve(self.source.as_ref(), &self.cache, &token.hash).await;
        self.apply(&token, view)
    }

    /// Publish `view` if `token` is the latest one. Returns whether it was applied.
    pub fn apply(&self, token: &FetchToken, view: ReportView) -> bool {
        let mut state = self.lock();
        if token.generation != state.generation {
            debug!(
                "Discarding stale result for {} (generation {}, current {})",
                token.hash, token.generation, state.generation
            );
            return false;
        }
        state.phase = ViewerPhase::Ready(view);
        true
    }

    pub fn phase(&self) -> ViewerPhase {
        self.lock().phase.clone()
    }

    pub fn current_hash(&self) -> Option<String> {
        self.lock().hash.clone()
    }

    fn lock(&self) -> MutexGuard<'_, ViewerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}
