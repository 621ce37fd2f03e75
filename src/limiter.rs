//! Per-model rate limiting.
//!
//! External providers enforce requests-per-minute ceilings per model, so the
//! limiter serializes *admission* per model: before a call for model M is
//! issued, M's exclusive section is entered, the remaining delay (if any) is
//! slept off, and the new call-start timestamp is recorded. The guard is held
//! across the remote call itself, which trades some parallelism for the
//! guarantee that no two calls to the same model ever start closer together
//! than the configured delay. Calls to different models proceed fully in
//! parallel.

use crate::ProviderConfig;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, MutexGuard};

/// Exclusive section + last-call timestamp for one model.
pub struct ModelGate {
    min_delay: Duration,
    last_call: Mutex<Option<Instant>>,
}

/// Guard for a model's exclusive section. Hold it for the full duration of the
/// remote call; dropping it releases the section.
pub struct Admission<'a> {
    _guard: MutexGuard<'a, Option<Instant>>,
}

impl ModelGate {
    pub fn new(min_delay: Duration) -> Self {
        Self {
            min_delay,
            last_call: Mutex::new(None),
        }
    }

    /// Enters the model's exclusive section, waiting out whatever remains of
    /// the minimum delay since the last call start. The new call-start
    /// timestamp is recorded before returning, so a slow in-flight call can
    /// never cause the next admission to under-wait.
    pub async fn admit(&self) -> Admission<'_> {
        let mut last_call = self.last_call.lock().await;
        if let Some(started) = *last_call {
            let elapsed = started.elapsed();
            if elapsed < self.min_delay {
                tokio::time::sleep(self.min_delay - elapsed).await;
            }
        }
        *last_call = Some(Instant::now());
        Admission { _guard: last_call }
    }
}

/// One [ModelGate] per distinct model identity, built once at run
/// configuration and shared by reference into every unit of work.
pub struct RateLimiter {
    gates: HashMap<String, Arc<ModelGate>>,
}

impl RateLimiter {
    pub fn new(providers: &[ProviderConfig]) -> Self {
        let mut gates = HashMap::new();
        for provider in providers {
            gates
                .entry(provider.model.clone())
                .or_insert_with(|| Arc::new(ModelGate::new(provider.rate_limit_delay)));
        }
        Self { gates }
    }

    /// The gate for `model`, or `None` for a model the limiter was not
    /// configured with (a defect in condition generation, not a runtime case).
    pub fn gate(&self, model: &str) -> Option<Arc<ModelGate>> {
        self.gates.get(model).cloned()
    }
}
