//! Server node assembly.

use crate::auth::SharedSecret;
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::DocumentHandler;
use crate::peer_client::ReqwestPeerClient;
use classboard_store::{FileSnapshotStore, SnapshotStore};
use classboard_sync::SyncCoordinator;
use std::sync::Arc;

/// A fully wired classboard node: file store, sync engine, peer
/// transport and request handler.
///
/// An HTTP layer maps routes onto [`ScoreboardServer::handler`]; nothing
/// here binds a socket.
pub struct ScoreboardServer {
    handler: DocumentHandler,
}

impl ScoreboardServer {
    /// Opens the store, runs the startup routine (startup snapshot,
    /// optional peer bootstrap, event baseline) and returns the node.
    pub fn open(config: ServerConfig) -> ServerResult<Self> {
        let store = FileSnapshotStore::open(&config.data_dir, config.store_config())
            .map_err(|err| ServerError::Internal(err.to_string()))?;
        store
            .write_startup_snapshot()
            .map_err(|err| ServerError::Internal(err.to_string()))?;
        let store: Arc<dyn SnapshotStore> = Arc::new(store);

        let transport = Arc::new(ReqwestPeerClient::new(config.sync_secret.clone()));
        let engine = Arc::new(SyncCoordinator::with_transport(
            store,
            config.engine_config(),
            transport,
        ));
        engine.startup().map_err(ServerError::from)?;

        let secret = config.sync_secret.as_deref().map(SharedSecret::new);
        tracing::info!(
            peers = config.peers.len(),
            master = config.master_mode,
            "classboard node ready"
        );
        Ok(Self {
            handler: DocumentHandler::new(engine, secret),
        })
    }

    /// Opens a node from the environment configuration surface.
    pub fn open_from_env() -> ServerResult<Self> {
        Self::open(ServerConfig::from_env()?)
    }

    /// The request handler.
    pub fn handler(&self) -> &DocumentHandler {
        &self.handler
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{GetDocumentResponse, PostDocumentRequest, RequestAuth};
    use classboard_testkit::sample_document;
    use tempfile::TempDir;

    fn open_node(dir: &TempDir) -> ScoreboardServer {
        ScoreboardServer::open(ServerConfig::new(dir.path())).unwrap()
    }

    #[test]
    fn node_opens_on_an_empty_directory() {
        let dir = TempDir::new().unwrap();
        let server = open_node(&dir);
        let response = server.handler().get_document(None).unwrap();
        assert!(matches!(response, GetDocumentResponse::NoContent));
    }

    #[test]
    fn write_survives_node_restart() {
        let dir = TempDir::new().unwrap();
        {
            let server = open_node(&dir);
            server
                .handler()
                .post_document(
                    PostDocumentRequest {
                        data: sample_document(46).to_json_value().unwrap(),
                        peers: vec![],
                        force_replace: false,
                        actor_role: None,
                        replica_purpose: None,
                        actor_name: None,
                    },
                    &RequestAuth::admin("admin"),
                )
                .unwrap();
        }
        // The first node's store lock is released on drop.
        let server = open_node(&dir);
        match server.handler().get_document(None).unwrap() {
            GetDocumentResponse::Document(payload) => {
                assert!(payload.updated_at.is_some());
            }
            GetDocumentResponse::NoContent => panic!("document lost across restart"),
        }
    }

    #[test]
    fn startup_snapshot_appears_in_catalog() {
        let dir = TempDir::new().unwrap();
        {
            let server = open_node(&dir);
            server
                .handler()
                .post_document(
                    PostDocumentRequest {
                        data: sample_document(46).to_json_value().unwrap(),
                        peers: vec![],
                        force_replace: false,
                        actor_role: None,
                        replica_purpose: None,
                        actor_name: None,
                    },
                    &RequestAuth::admin("admin"),
                )
                .unwrap();
        }
        let server = open_node(&dir);
        let points = server
            .handler()
            .list_restore_points(&RequestAuth::admin("admin"))
            .unwrap();
        assert!(points
            .iter()
            .any(|p| p.kind == classboard_store::RestorePointKind::Startup));
    }
}
