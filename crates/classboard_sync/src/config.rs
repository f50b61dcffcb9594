//! Engine configuration.

use crate::guard::GuardConfig;
use classboard_model::ClockConfig;
use std::time::Duration;
use uuid::Uuid;

/// Configuration for the sync coordinator.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// This node's identity, carried as the broadcast event source.
    pub node_id: Uuid,
    /// Clock (server timezone offset).
    pub clock: ClockConfig,
    /// Corruption guard thresholds.
    pub guard: GuardConfig,
    /// Peer base URLs to forward accepted writes to.
    pub peers: Vec<String>,
    /// Master mode: restricts what this node accepts from replicas
    /// (`force_replace` from a replica is downgraded to a normal merge).
    pub master_mode: bool,
    /// Restore lock: temporarily blocks all writes.
    pub restore_lock: bool,
    /// Per-peer timeout for forwards, probes and bootstrap pulls.
    pub peer_timeout: Duration,
    /// Bounded forward queue depth; overflow drops the oldest intent
    /// (the next accepted write re-forwards the full document anyway).
    pub forward_queue: usize,
}

impl EngineConfig {
    /// Creates a configuration with default thresholds and a fresh node id.
    pub fn new() -> Self {
        Self {
            node_id: Uuid::new_v4(),
            clock: ClockConfig::default(),
            guard: GuardConfig::default(),
            peers: Vec::new(),
            master_mode: false,
            restore_lock: false,
            peer_timeout: Duration::from_secs(4),
            forward_queue: 32,
        }
    }

    /// Sets the peer list.
    #[must_use]
    pub fn with_peers(mut self, peers: Vec<String>) -> Self {
        self.peers = peers;
        self
    }

    /// Sets master mode.
    #[must_use]
    pub fn with_master_mode(mut self, on: bool) -> Self {
        self.master_mode = on;
        self
    }

    /// Sets the restore lock.
    #[must_use]
    pub fn with_restore_lock(mut self, on: bool) -> Self {
        self.restore_lock = on;
        self
    }

    /// Sets the guard thresholds.
    #[must_use]
    pub fn with_guard(mut self, guard: GuardConfig) -> Self {
        self.guard = guard;
        self
    }

    /// Sets the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: ClockConfig) -> Self {
        self.clock = clock;
        self
    }

    /// Sets the per-peer timeout.
    #[must_use]
    pub fn with_peer_timeout(mut self, timeout: Duration) -> Self {
        self.peer_timeout = timeout;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}
