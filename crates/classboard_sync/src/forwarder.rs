//! Best-effort peer replication.
//!
//! Accepted writes are pushed to configured peers from a background
//! worker thread with a bounded queue. Forward failures are logged and
//! swallowed; replication is advisory relative to the local write's
//! durability, and a failed forward is simply superseded by the next
//! accepted write. There is no persisted retry queue.

use classboard_model::{ScoreboardDocument, Timestamp};
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Network seam to peers.
///
/// Implementations must bound each call with `timeout`. The loopback and
/// mock implementations used in tests ignore it.
pub trait PeerTransport: Send + Sync {
    /// Pushes a document to a peer. Errors are strings because callers
    /// only ever log them.
    fn push_document(
        &self,
        base_url: &str,
        document: &ScoreboardDocument,
        timeout: Duration,
    ) -> Result<(), String>;

    /// Fetches a peer's current document, `None` when the peer has none.
    fn fetch_document(
        &self,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Option<ScoreboardDocument>, String>;
}

struct ForwardJob {
    document: ScoreboardDocument,
    peers: Vec<String>,
}

/// Background forwarder with a bounded queue and explicit shutdown
/// draining.
pub struct ReplicationForwarder {
    sender: Option<SyncSender<ForwardJob>>,
    handle: Option<JoinHandle<()>>,
}

impl ReplicationForwarder {
    /// Spawns the worker thread.
    pub fn spawn(
        transport: Arc<dyn PeerTransport>,
        peers: Vec<String>,
        timeout: Duration,
        queue_depth: usize,
    ) -> Self {
        let (sender, receiver) = sync_channel::<ForwardJob>(queue_depth.max(1));
        let handle = std::thread::Builder::new()
            .name("classboard-forwarder".into())
            .spawn(move || Self::worker(transport, peers, timeout, receiver))
            .ok();
        if handle.is_none() {
            tracing::warn!("failed to spawn forwarder thread; replication disabled");
        }
        Self {
            sender: handle.as_ref().map(|_| sender),
            handle,
        }
    }

    fn worker(
        transport: Arc<dyn PeerTransport>,
        peers: Vec<String>,
        timeout: Duration,
        receiver: Receiver<ForwardJob>,
    ) {
        while let Ok(job) = receiver.recv() {
            let mut targets: BTreeSet<String> = peers.iter().cloned().collect();
            targets.extend(job.peers.iter().cloned());
            for peer in targets {
                match transport.push_document(&peer, &job.document, timeout) {
                    Ok(()) => tracing::debug!(%peer, "forwarded document"),
                    Err(err) => tracing::warn!(%peer, %err, "peer forward failed"),
                }
            }
        }
    }

    /// Enqueues a forward without blocking the writer. A full queue drops
    /// the job with a warning: the next accepted write carries the full
    /// document anyway.
    pub fn enqueue(&self, document: ScoreboardDocument, extra_peers: Vec<String>) {
        let Some(sender) = &self.sender else {
            return;
        };
        match sender.try_send(ForwardJob {
            document,
            peers: extra_peers,
        }) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                tracing::warn!("forward queue full, dropping job");
            }
            Err(TrySendError::Disconnected(_)) => {
                tracing::warn!("forwarder gone, dropping job");
            }
        }
    }

    /// Drains the queue and stops the worker.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("forwarder thread panicked during shutdown");
            }
        }
    }
}

impl Drop for ReplicationForwarder {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Pulls the best reachable peer snapshot, ranked by (logical clock,
/// student count) descending. Used to seed an empty or tiny local store
/// at startup, gated by the same ranking the corruption guard uses.
pub fn bootstrap_from_peers(
    transport: &dyn PeerTransport,
    peers: &[String],
    timeout: Duration,
) -> Option<ScoreboardDocument> {
    let mut candidates: Vec<ScoreboardDocument> = Vec::new();
    for peer in peers {
        match transport.fetch_document(peer, timeout) {
            Ok(Some(document)) => candidates.push(document),
            Ok(None) => tracing::debug!(%peer, "peer has no document"),
            Err(err) => tracing::warn!(%peer, %err, "peer bootstrap pull failed"),
        }
    }
    candidates.sort_by(|a, b| {
        let key_a = (a.server_updated_at, a.student_count());
        let key_b = (b.server_updated_at, b.student_count());
        key_b.cmp(&key_a)
    });
    candidates.into_iter().next()
}

/// Scripted transport for tests: serves canned documents and records
/// every push.
#[derive(Default)]
pub struct MockPeerTransport {
    documents: Mutex<HashMap<String, ScoreboardDocument>>,
    unreachable: Mutex<BTreeSet<String>>,
    pushes: Mutex<Vec<(String, ScoreboardDocument)>>,
}

impl MockPeerTransport {
    /// Creates an empty mock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the document a peer will serve.
    pub fn set_document(&self, base_url: &str, document: ScoreboardDocument) {
        self.documents
            .lock()
            .insert(base_url.to_string(), document);
    }

    /// Marks a peer as unreachable.
    pub fn set_unreachable(&self, base_url: &str) {
        self.unreachable.lock().insert(base_url.to_string());
    }

    /// All recorded pushes, in order.
    pub fn pushes(&self) -> Vec<(String, ScoreboardDocument)> {
        self.pushes.lock().clone()
    }

    /// Clock of the document a peer serves, if any.
    pub fn peer_clock(&self, base_url: &str) -> Option<Timestamp> {
        self.documents
            .lock()
            .get(base_url)
            .and_then(|d| d.server_updated_at)
    }
}

impl PeerTransport for MockPeerTransport {
    fn push_document(
        &self,
        base_url: &str,
        document: &ScoreboardDocument,
        _timeout: Duration,
    ) -> Result<(), String> {
        if self.unreachable.lock().contains(base_url) {
            return Err("connection refused".into());
        }
        self.pushes
            .lock()
            .push((base_url.to_string(), document.clone()));
        Ok(())
    }

    fn fetch_document(
        &self,
        base_url: &str,
        _timeout: Duration,
    ) -> Result<Option<ScoreboardDocument>, String> {
        if self.unreachable.lock().contains(base_url) {
            return Err("connection refused".into());
        }
        Ok(self.documents.lock().get(base_url).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use classboard_model::Timestamp;

    fn document(count: usize, clock: &str) -> ScoreboardDocument {
        let mut doc = ScoreboardDocument::default();
        doc.server_updated_at = Some(Timestamp::parse(clock).unwrap());
        for i in 0..count {
            doc.students.push(classboard_model::Student {
                id: i as i64 + 1,
                roll: format!("EA24A{:02}", i + 1),
                name: String::new(),
                base_name: String::new(),
                class: 4,
                group: "A".into(),
                fees: 0,
                vote_power: 1,
                stars: 0,
                vetos: 0,
                active: true,
                created_at: None,
                updated_at: None,
            });
        }
        doc
    }

    #[test]
    fn forwards_to_all_peers_and_drains_on_shutdown() {
        let transport = Arc::new(MockPeerTransport::new());
        let forwarder = ReplicationForwarder::spawn(
            transport.clone(),
            vec!["http://a".into(), "http://b".into()],
            Duration::from_secs(1),
            8,
        );
        forwarder.enqueue(document(30, "2026-02-03T10:00:00+05:30"), vec![]);
        forwarder.shutdown();

        let pushes = transport.pushes();
        assert_eq!(pushes.len(), 2);
        let targets: BTreeSet<_> = pushes.iter().map(|(p, _)| p.clone()).collect();
        assert!(targets.contains("http://a"));
        assert!(targets.contains("http://b"));
    }

    #[test]
    fn unreachable_peer_never_blocks_the_others() {
        let transport = Arc::new(MockPeerTransport::new());
        transport.set_unreachable("http://dead");
        let forwarder = ReplicationForwarder::spawn(
            transport.clone(),
            vec!["http://dead".into(), "http://alive".into()],
            Duration::from_secs(1),
            8,
        );
        forwarder.enqueue(document(30, "2026-02-03T10:00:00+05:30"), vec![]);
        forwarder.shutdown();

        let pushes = transport.pushes();
        assert_eq!(pushes.len(), 1);
        assert_eq!(pushes[0].0, "http://alive");
    }

    #[test]
    fn extra_peers_are_included_once() {
        let transport = Arc::new(MockPeerTransport::new());
        let forwarder = ReplicationForwarder::spawn(
            transport.clone(),
            vec!["http://a".into()],
            Duration::from_secs(1),
            8,
        );
        forwarder.enqueue(
            document(30, "2026-02-03T10:00:00+05:30"),
            vec!["http://a".into(), "http://c".into()],
        );
        forwarder.shutdown();
        assert_eq!(transport.pushes().len(), 2);
    }

    #[test]
    fn bootstrap_picks_best_ranked_peer() {
        let transport = MockPeerTransport::new();
        transport.set_document("http://old", document(46, "2026-02-01T10:00:00+05:30"));
        transport.set_document("http://new", document(44, "2026-02-03T10:00:00+05:30"));
        transport.set_unreachable("http://dead");

        let peers = vec![
            "http://dead".to_string(),
            "http://old".to_string(),
            "http://new".to_string(),
        ];
        let best = bootstrap_from_peers(&transport, &peers, Duration::from_secs(1)).unwrap();
        assert_eq!(best.student_count(), 44);
    }

    #[test]
    fn bootstrap_with_no_reachable_peers_is_none() {
        let transport = MockPeerTransport::new();
        transport.set_unreachable("http://dead");
        let peers = vec!["http://dead".to_string()];
        assert!(bootstrap_from_peers(&transport, &peers, Duration::from_secs(1)).is_none());
    }
}
