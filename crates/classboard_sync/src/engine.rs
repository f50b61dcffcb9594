//! The write-pipeline coordinator.
//!
//! Control flow for a write: role-scoped validation restricts the
//! submission to a narrow patch → the corruption guard screens the
//! candidate against the stored document → the merge engine combines the
//! two → the store persists atomically and rotates backups → the
//! forwarder relays the result → the broadcaster notifies subscribers.
//!
//! No in-process lock serializes accept decisions; concurrent races are
//! resolved by the merge engine's commutative, timestamp-keyed design.

use crate::config::EngineConfig;
use crate::error::{SyncError, SyncResult};
use crate::events::{EventBus, EventSubscription, SyncBroadcaster, SyncEvent};
use crate::forwarder::{bootstrap_from_peers, PeerTransport, ReplicationForwarder};
use crate::guard::CorruptionGuard;
use crate::health::{probe_peers, PeerHealth};
use crate::patch::{build_actor_patch, build_student_appeal, build_student_request, ActorContext, ActorRole};
use classboard_merge::{merge_documents, recompute_veto_ledger};
use classboard_model::{ScoreboardDocument, Timestamp};
use classboard_store::{RestorePoint, RestorePointKind, SnapshotStore};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A document write submitted through the exchange endpoint.
#[derive(Debug, Clone)]
pub struct WriteRequest {
    /// The submitted document (full or narrow), as wire JSON.
    pub data: serde_json::Value,
    /// Who is writing.
    pub actor: ActorContext,
    /// Replace instead of merge. Honored for administrators always, and
    /// for authenticated replicas only while master mode is off.
    pub force_replace: bool,
    /// Extra peers to forward this particular write to.
    pub extra_peers: Vec<String>,
}

/// Result of an accepted write.
#[derive(Debug, Clone)]
pub struct WriteOutcome {
    /// The post-merge logical clock.
    pub updated_at: Timestamp,
    /// Students in the persisted document.
    pub student_count: usize,
}

/// Coordinates the sync engine around a snapshot store.
pub struct SyncCoordinator {
    store: Arc<dyn SnapshotStore>,
    config: EngineConfig,
    guard: CorruptionGuard,
    broadcaster: Arc<SyncBroadcaster>,
    transport: Option<Arc<dyn PeerTransport>>,
    forwarder: Option<ReplicationForwarder>,
}

impl SyncCoordinator {
    /// Creates a coordinator without peer replication.
    pub fn new(store: Arc<dyn SnapshotStore>, config: EngineConfig) -> Self {
        Self {
            store,
            guard: CorruptionGuard::new(config.guard.clone()),
            broadcaster: Arc::new(SyncBroadcaster::new()),
            transport: None,
            forwarder: None,
            config,
        }
    }

    /// Creates a coordinator that forwards accepted writes to the
    /// configured peers through `transport`.
    pub fn with_transport(
        store: Arc<dyn SnapshotStore>,
        config: EngineConfig,
        transport: Arc<dyn PeerTransport>,
    ) -> Self {
        let forwarder = ReplicationForwarder::spawn(
            Arc::clone(&transport),
            config.peers.clone(),
            config.peer_timeout,
            config.forward_queue,
        );
        Self {
            store,
            guard: CorruptionGuard::new(config.guard.clone()),
            broadcaster: Arc::new(SyncBroadcaster::new()),
            transport: Some(transport),
            forwarder: Some(forwarder),
            config,
        }
    }

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The event broadcaster.
    pub fn broadcaster(&self) -> Arc<SyncBroadcaster> {
        Arc::clone(&self.broadcaster)
    }

    /// Subscribes to sync events. The current clock arrives immediately
    /// as the baseline beat.
    pub fn subscribe(&self) -> EventSubscription {
        self.broadcaster.subscribe()
    }

    /// Startup routine: seed the broadcaster baseline and, when the
    /// local store is empty or implausibly small, bootstrap from the
    /// best-ranked reachable peer snapshot.
    pub fn startup(&self) -> SyncResult<()> {
        let local = self.store.load()?;
        let needs_bootstrap = match &local {
            None => true,
            Some(doc) => self.guard.is_implausible(doc),
        };

        if needs_bootstrap {
            if let Some(transport) = &self.transport {
                if let Some(peer_doc) = bootstrap_from_peers(
                    transport.as_ref(),
                    &self.config.peers,
                    self.config.peer_timeout,
                ) {
                    if !self.guard.is_implausible(&peer_doc) {
                        let stored = local.clone().unwrap_or_default();
                        let now = self.config.clock.now();
                        let merged = merge_documents(&stored, &peer_doc, now);
                        self.store.save(&merged)?;
                        tracing::info!(
                            students = merged.student_count(),
                            "bootstrapped document from peer"
                        );
                        self.broadcaster.seed(SyncEvent {
                            updated_at: now,
                            source: self.config.node_id.to_string(),
                        });
                        return Ok(());
                    }
                }
            }
        }

        if let Some(clock) = local.as_ref().and_then(|d| d.server_updated_at) {
            self.broadcaster.seed(SyncEvent {
                updated_at: clock,
                source: self.config.node_id.to_string(),
            });
        }
        Ok(())
    }

    /// Returns the current document for serving.
    ///
    /// A document failing the tiny-roster check triggers recovery from
    /// the best reachable peer, else the best-ranked local restore point;
    /// if no healthy candidate exists the read is refused rather than
    /// serving known-bad data.
    pub fn read_document(&self) -> SyncResult<Option<ScoreboardDocument>> {
        let Some(document) = self.store.load()? else {
            return Ok(None);
        };
        if !self.guard.is_implausible(&document) {
            return Ok(Some(document));
        }

        tracing::warn!(
            students = document.student_count(),
            "stored document fails tiny-roster check, attempting recovery"
        );

        // (a) Best reachable peer snapshot. The recovered document still
        // flows through the normal merge path before being persisted.
        if let Some(transport) = &self.transport {
            if let Some(peer_doc) = bootstrap_from_peers(
                transport.as_ref(),
                &self.config.peers,
                self.config.peer_timeout,
            ) {
                if !self.guard.is_implausible(&peer_doc) {
                    let now = self.config.clock.now();
                    let merged = merge_documents(&document, &peer_doc, now);
                    if !self.guard.is_implausible(&merged) {
                        self.store.save(&merged)?;
                        self.publish(now);
                        tracing::info!("recovered document from peer snapshot");
                        return Ok(Some(merged));
                    }
                }
            }
        }

        // (b) Best-ranked local restore point, ranked by
        // (logical clock, modification time, student count) descending.
        if let Some(point) = self.best_local_candidate()? {
            let restored = self.store.restore(&point.id)?;
            let now = self.config.clock.now();
            let merged = merge_documents(&document, &restored, now);
            if !self.guard.is_implausible(&merged) {
                self.store.save(&merged)?;
                self.publish(now);
                tracing::info!(point = %point.id, "recovered document from local snapshot");
                return Ok(Some(merged));
            }
        }

        Err(SyncError::CorruptState)
    }

    fn best_local_candidate(&self) -> SyncResult<Option<RestorePoint>> {
        let mut points: Vec<RestorePoint> = self
            .store
            .list_restore_points()?
            .into_iter()
            .filter(|p| p.kind != RestorePointKind::Live)
            .filter(|p| p.student_count >= self.guard.config().min_roster)
            .collect();
        points.sort_by(|a, b| {
            let key_a = (a.updated_at, a.modified, a.student_count);
            let key_b = (b.updated_at, b.modified, b.student_count);
            key_b.cmp(&key_a)
        });
        Ok(points.into_iter().next())
    }

    /// Accepts a document write through the full pipeline.
    pub fn accept_write(&self, request: WriteRequest) -> SyncResult<WriteOutcome> {
        if self.config.restore_lock {
            return Err(SyncError::WritesLocked);
        }

        let submitted = ScoreboardDocument::from_json_value(request.data)?;
        let stored = self.store.load()?.unwrap_or_default();
        let patch = build_actor_patch(&request.actor, &submitted, &stored, &self.config.clock)?;

        let full_document_write = matches!(
            request.actor.role,
            ActorRole::Admin | ActorRole::Replica
        ) && !matches!(
            (request.actor.replica_role, request.actor.replica_purpose),
            (Some(ActorRole::Teacher), Some(crate::patch::ReplicaPurpose::TeacherPatch))
        );

        let force = request.force_replace
            && (request.actor.role == ActorRole::Admin
                || (request.actor.role == ActorRole::Replica && !self.config.master_mode));
        if request.force_replace && !force {
            tracing::warn!("downgrading replica force_replace to merge in master mode");
        }

        let now = self.config.clock.now();
        let merged = if force {
            if self.guard.is_implausible(&patch) && !stored.students.is_empty() {
                return Err(SyncError::PayloadTooSmall {
                    student_count: patch.student_count(),
                    minimum: self.guard.config().min_roster,
                });
            }
            let mut replaced = patch;
            replaced.touch(now);
            recompute_veto_ledger(&mut replaced);
            replaced
        } else {
            if full_document_write {
                if let (Some(stored_clock), Some(incoming_clock)) =
                    (stored.server_updated_at, patch.server_updated_at)
                {
                    if incoming_clock < stored_clock {
                        return Err(SyncError::Conflict {
                            server_updated_at: stored.server_updated_at,
                        });
                    }
                }
                self.guard.check_write(&stored, &patch)?;
            }
            merge_documents(&stored, &patch, now)
        };

        self.store.save(&merged)?;
        self.relay(&merged, request.extra_peers);
        self.publish(now);

        Ok(WriteOutcome {
            updated_at: now,
            student_count: merged.student_count(),
        })
    }

    /// Creates a resource request on behalf of a logged-in student.
    pub fn submit_student_request(
        &self,
        roll: &str,
        item_id: i64,
        note: &str,
    ) -> SyncResult<WriteOutcome> {
        if self.config.restore_lock {
            return Err(SyncError::WritesLocked);
        }
        let stored = self.store.load()?.unwrap_or_default();
        let request = build_student_request(&stored, roll, item_id, note, &self.config.clock)?;

        let mut patch = ScoreboardDocument::default();
        patch.resource_requests.push(request);
        self.apply_patch(stored, patch)
    }

    /// Files a profile-change appeal for a logged-in student.
    pub fn submit_student_appeal(
        &self,
        roll: &str,
        message: &str,
        field_changes: BTreeMap<String, String>,
    ) -> SyncResult<WriteOutcome> {
        if self.config.restore_lock {
            return Err(SyncError::WritesLocked);
        }
        let stored = self.store.load()?.unwrap_or_default();
        let appeal =
            build_student_appeal(&stored, roll, message, field_changes, &self.config.clock)?;

        let mut patch = ScoreboardDocument::default();
        patch.appeals.push(appeal);
        self.apply_patch(stored, patch)
    }

    fn apply_patch(
        &self,
        stored: ScoreboardDocument,
        patch: ScoreboardDocument,
    ) -> SyncResult<WriteOutcome> {
        let now = self.config.clock.now();
        let merged = merge_documents(&stored, &patch, now);
        self.store.save(&merged)?;
        self.relay(&merged, Vec::new());
        self.publish(now);
        Ok(WriteOutcome {
            updated_at: now,
            student_count: merged.student_count(),
        })
    }

    /// Installs a restore point as the live document. The store writes a
    /// pre-restore safety copy and bumps the clock; the result is
    /// relayed and broadcast like any accepted write.
    pub fn restore(&self, id: &str) -> SyncResult<WriteOutcome> {
        let restored = self.store.restore(id)?;
        let updated_at = restored
            .server_updated_at
            .unwrap_or_else(|| self.config.clock.now());
        self.relay(&restored, Vec::new());
        self.publish(updated_at);
        Ok(WriteOutcome {
            updated_at,
            student_count: restored.student_count(),
        })
    }

    /// Lists the restore-point catalog.
    pub fn list_restore_points(&self) -> SyncResult<Vec<RestorePoint>> {
        Ok(self.store.list_restore_points()?)
    }

    /// Updates lock flag and/or label on a restore point.
    pub fn set_restore_meta(
        &self,
        id: &str,
        locked: Option<bool>,
        label: Option<String>,
    ) -> SyncResult<()> {
        Ok(self.store.set_restore_meta(id, locked, label)?)
    }

    /// Opportunistic stale-snapshot healing: adopt a peer's document when
    /// its clock leads ours beyond the skew margin. Returns whether a
    /// heal happened.
    pub fn heal_if_stale(&self) -> SyncResult<bool> {
        let Some(transport) = &self.transport else {
            return Ok(false);
        };
        let stored = self.store.load()?.unwrap_or_default();
        let Some(peer_doc) = bootstrap_from_peers(
            transport.as_ref(),
            &self.config.peers,
            self.config.peer_timeout,
        ) else {
            return Ok(false);
        };
        if !self
            .guard
            .should_adopt_peer(stored.server_updated_at, peer_doc.server_updated_at)
            || self.guard.is_implausible(&peer_doc)
        {
            return Ok(false);
        }
        let now = self.config.clock.now();
        let merged = merge_documents(&stored, &peer_doc, now);
        self.store.save(&merged)?;
        self.publish(now);
        tracing::info!("healed stale local document from peer");
        Ok(true)
    }

    /// Probes every configured peer for the health endpoint.
    pub fn probe_peers(&self) -> Vec<PeerHealth> {
        match &self.transport {
            Some(transport) => probe_peers(
                transport.as_ref(),
                &self.config.peers,
                self.config.peer_timeout,
            ),
            None => Vec::new(),
        }
    }

    fn relay(&self, document: &ScoreboardDocument, extra_peers: Vec<String>) {
        if let Some(forwarder) = &self.forwarder {
            forwarder.enqueue(document.clone(), extra_peers);
        }
    }

    fn publish(&self, updated_at: Timestamp) {
        self.broadcaster.publish(SyncEvent {
            updated_at,
            source: self.config.node_id.to_string(),
        });
    }
}
