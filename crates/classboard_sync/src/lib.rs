//! # classboard sync
//!
//! The offline-data synchronization and reconciliation engine.
//!
//! This crate provides:
//! - [`SyncCoordinator`]: the write pipeline (validate → guard → merge →
//!   persist → forward → broadcast)
//! - [`CorruptionGuard`]: tiny-roster, suspicious-shrink and
//!   stale-snapshot-healing checks
//! - Role-scoped patch building ([`ActorContext`], [`build_actor_patch`])
//! - [`ReplicationForwarder`]: best-effort background push to peers
//! - [`SyncBroadcaster`]: payload-free "wake up and re-sync" fan-out
//! - Peer health probing
//!
//! ## Key invariants
//!
//! - A write is durable locally before any replication attempt begins
//! - Merges are timestamp-keyed and converge regardless of order
//! - Forwarding failures are logged and swallowed, never surfaced to the
//!   original caller
//! - Nothing in this engine is fatal to the hosting process

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod engine;
mod error;
mod events;
mod forwarder;
mod guard;
mod health;
mod patch;

pub use config::EngineConfig;
pub use engine::{SyncCoordinator, WriteOutcome, WriteRequest};
pub use error::{SyncError, SyncResult};
pub use events::{EventBus, EventSubscription, SyncBroadcaster, SyncEvent};
pub use forwarder::{bootstrap_from_peers, MockPeerTransport, PeerTransport, ReplicationForwarder};
pub use guard::{CorruptionGuard, GuardConfig};
pub use health::{probe_peers, PeerHealth};
pub use patch::{
    build_actor_patch, build_student_appeal, build_student_request, build_teacher_patch,
    ActorContext, ActorRole, ReplicaPurpose,
};
