use std::time::Duration;

/// Runtime tuning for the resolver.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// How long a request may wait for an exclusive region before failing
    /// with a retryable busy error.
    pub lock_timeout: Duration,
    /// Pause between acquisition attempts while waiting.
    pub lock_retry_interval: Duration,
    /// RNG seed for probabilistic outcome draws.
    pub rng_seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_millis(200),
            lock_retry_interval: Duration::from_micros(500),
            rng_seed: 42,
        }
    }
}
