//! StalenessSweeper - background removal of abandoned conversations.
//!
//! The router already discards a stale conversation when its owner writes
//! again. The sweeper covers the users who never come back. Both judge
//! staleness against the local clock, which the router also stamps
//! `updated_at` with, so a conversation being worked on is never idle.
//!
//! ## Configuration
//!
//! | Setting | Default | Description |
//! |---------|---------|-------------|
//! | `interval` | 300s | How often to sweep |
//! | `threshold` | 24h | Idle time after which a conversation is removed |

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;
use tracing::{debug, error, info};

use crate::domain::foundation::Timestamp;
use crate::ports::{ConversationStore, StoreError};

/// Configuration for the StalenessSweeper service.
#[derive(Debug, Clone)]
pub struct SweeperConfig {
    pub interval: Duration,
    pub threshold: Duration,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300),
            threshold: Duration::from_secs(86_400),
        }
    }
}

impl SweeperConfig {
    /// Create config with custom sweep interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Create config with custom staleness threshold.
    pub fn with_threshold(mut self, threshold: Duration) -> Self {
        self.threshold = threshold;
        self
    }
}

/// Periodically expires conversations idle past the threshold.
pub struct StalenessSweeper {
    store: Arc<dyn ConversationStore>,
    config: SweeperConfig,
}

impl StalenessSweeper {
    pub fn new(store: Arc<dyn ConversationStore>) -> Self {
        Self::with_config(store, SweeperConfig::default())
    }

    pub fn with_config(store: Arc<dyn ConversationStore>, config: SweeperConfig) -> Self {
        Self { store, config }
    }

    /// Sweeps every interval until `shutdown` turns true.
    ///
    /// A failed sweep is logged and retried on the next tick.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = time::interval(self.config.interval);
        info!(
            interval_secs = self.config.interval.as_secs(),
            threshold_secs = self.config.threshold.as_secs(),
            "Staleness sweeper started"
        );

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Staleness sweeper stopped");
                        return;
                    }
                }

                _ = interval.tick() => {
                    if let Err(err) = self.sweep_once().await {
                        error!(error = %err, "Staleness sweep failed");
                    }
                }
            }
        }
    }

    /// Runs exactly one sweep against the current time.
    pub async fn sweep_once(&self) -> Result<u64, StoreError> {
        self.sweep_at(Timestamp::now()).await
    }

    /// Removes conversations last touched before `now - threshold`.
    pub async fn sweep_at(&self, now: Timestamp) -> Result<u64, StoreError> {
        let cutoff = now.minus(self.config.threshold);
        let removed = self.store.expire_stale(cutoff).await?;
        if removed > 0 {
            info!(removed, "Expired stale conversations");
        } else {
            debug!("No stale conversations");
        }
        Ok(removed)
    }
}
