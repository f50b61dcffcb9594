//! # classboard store
//!
//! Single-document snapshot storage for the scoreboard engine.
//!
//! This crate provides:
//! - The [`SnapshotStore`] trait (`load`, `save`, `list_restore_points`,
//!   `restore`) so the merge engine can sit atop a file system, an
//!   embedded KV store or a managed object store without change
//! - [`FileSnapshotStore`]: atomic temp-write-then-rename persistence,
//!   rolling + hourly-immutable + startup backups, restore-point catalog
//!   with lock/label metadata, best-backup recovery
//! - [`MemorySnapshotStore`]: an in-memory implementation for tests and
//!   last-resort fallback storage
//!
//! Durability model: `save` never leaves a half-written document visible;
//! readers either see the previous snapshot or the new one.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod file;
mod memory;
mod snapshot;

pub use error::{StoreError, StoreResult};
pub use file::{FileSnapshotStore, StoreConfig};
pub use memory::MemorySnapshotStore;
pub use snapshot::{RestorePoint, RestorePointKind, SnapshotStore};
