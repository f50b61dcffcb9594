//! Peer health probing.

use crate::forwarder::PeerTransport;
use classboard_model::Timestamp;
use std::collections::BTreeMap;
use std::time::Duration;

/// Result of probing one peer.
#[derive(Debug, Clone)]
pub struct PeerHealth {
    /// The peer's base URL.
    pub base_url: String,
    /// Whether the peer answered at all.
    pub reachable: bool,
    /// The peer's logical clock, when it served a document.
    pub updated_at: Option<Timestamp>,
    /// The peer's student count.
    pub student_count: usize,
    /// Per-collection sizes for operational visibility.
    pub collection_sizes: BTreeMap<&'static str, usize>,
    /// Error text for unreachable peers.
    pub error: Option<String>,
}

/// Probes every configured peer, best-effort. Probe failures are recorded
/// in the result, never raised.
pub fn probe_peers(
    transport: &dyn PeerTransport,
    peers: &[String],
    timeout: Duration,
) -> Vec<PeerHealth> {
    peers
        .iter()
        .map(|peer| match transport.fetch_document(peer, timeout) {
            Ok(Some(document)) => PeerHealth {
                base_url: peer.clone(),
                reachable: true,
                updated_at: document.server_updated_at,
                student_count: document.student_count(),
                collection_sizes: document.collection_sizes(),
                error: None,
            },
            Ok(None) => PeerHealth {
                base_url: peer.clone(),
                reachable: true,
                updated_at: None,
                student_count: 0,
                collection_sizes: BTreeMap::new(),
                error: None,
            },
            Err(err) => {
                tracing::warn!(%peer, %err, "health probe failed");
                PeerHealth {
                    base_url: peer.clone(),
                    reachable: false,
                    updated_at: None,
                    student_count: 0,
                    collection_sizes: BTreeMap::new(),
                    error: Some(err),
                }
            }
        })
        .collect()
}
