//! Typed request handlers for the document-exchange endpoints.

use crate::auth::SharedSecret;
use crate::error::{ServerError, ServerResult};
use classboard_model::Timestamp;
use classboard_store::RestorePoint;
use classboard_sync::{
    ActorContext, ActorRole, EventSubscription, PeerHealth, ReplicaPurpose, SyncCoordinator,
    WriteOutcome, WriteRequest,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Credentials and headers accompanying a request.
#[derive(Debug, Clone, Default)]
pub struct RequestAuth {
    /// Role of the logged-in session, when any.
    pub session_role: Option<ActorRole>,
    /// Username (or student roll) of the logged-in session.
    pub username: Option<String>,
    /// Whether `X-EA-Replicated: 1` was present.
    pub replicated_header: bool,
    /// Value of `X-EA-Sync-Key`, when present.
    pub sync_key: Option<String>,
}

impl RequestAuth {
    /// An administrator session.
    pub fn admin(username: impl Into<String>) -> Self {
        Self {
            session_role: Some(ActorRole::Admin),
            username: Some(username.into()),
            ..Self::default()
        }
    }

    /// A teacher session.
    pub fn teacher(username: impl Into<String>) -> Self {
        Self {
            session_role: Some(ActorRole::Teacher),
            username: Some(username.into()),
            ..Self::default()
        }
    }

    /// A student session identified by roll.
    pub fn student(roll: impl Into<String>) -> Self {
        Self {
            session_role: Some(ActorRole::Student),
            username: Some(roll.into()),
            ..Self::default()
        }
    }

    /// A replica request carrying the marker header and secret.
    pub fn replica(sync_key: impl Into<String>) -> Self {
        Self {
            replicated_header: true,
            sync_key: Some(sync_key.into()),
            ..Self::default()
        }
    }
}

/// Body of a document `POST`.
#[derive(Debug, Clone, Deserialize)]
pub struct PostDocumentRequest {
    /// The submitted document.
    pub data: serde_json::Value,
    /// Extra peers to forward this write to.
    #[serde(default)]
    pub peers: Vec<String>,
    /// Replace instead of merge (admin, or replica off-master).
    #[serde(default)]
    pub force_replace: bool,
    /// Declared actor role for replica pushes.
    #[serde(default)]
    pub actor_role: Option<String>,
    /// Declared purpose for replica pushes.
    #[serde(default)]
    pub replica_purpose: Option<String>,
    /// Author the relayed write was made under (teacher patches).
    #[serde(default)]
    pub actor_name: Option<String>,
}

/// Wire shape of a served document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentPayload {
    /// The document itself.
    pub data: serde_json::Value,
    /// Its logical clock.
    pub updated_at: Option<Timestamp>,
}

/// Response to a document `GET`.
#[derive(Debug, Clone)]
pub enum GetDocumentResponse {
    /// Nothing to send: no document exists, or the caller is current.
    NoContent,
    /// The current document.
    Document(DocumentPayload),
}

/// Response to an accepted `POST`.
#[derive(Debug, Clone, Serialize)]
pub struct PostDocumentResponse {
    /// The post-merge logical clock.
    pub updated_at: Timestamp,
    /// Students in the persisted document.
    pub student_count: usize,
}

/// Body of a restore-point lock/label update.
#[derive(Debug, Clone, Deserialize)]
pub struct RestoreMetaRequest {
    /// New lock flag, when changing.
    #[serde(default)]
    pub locked: Option<bool>,
    /// New label, when changing.
    #[serde(default)]
    pub label: Option<String>,
}

/// The framework-free handler an HTTP layer maps routes onto.
pub struct DocumentHandler {
    engine: Arc<SyncCoordinator>,
    secret: Option<SharedSecret>,
}

impl DocumentHandler {
    /// Creates a handler around an engine and an optional replica secret.
    pub fn new(engine: Arc<SyncCoordinator>, secret: Option<SharedSecret>) -> Self {
        Self { engine, secret }
    }

    /// The underlying engine.
    pub fn engine(&self) -> &Arc<SyncCoordinator> {
        &self.engine
    }

    /// `GET` the current document.
    ///
    /// With `since`, short-circuits to no-content when the caller's clock
    /// is already current, saving bandwidth on low-power links.
    pub fn get_document(&self, since: Option<Timestamp>) -> ServerResult<GetDocumentResponse> {
        let document = self.engine.read_document().map_err(ServerError::from)?;
        let Some(document) = document else {
            return Ok(GetDocumentResponse::NoContent);
        };
        if let (Some(since), Some(current)) = (since, document.server_updated_at) {
            if since >= current {
                return Ok(GetDocumentResponse::NoContent);
            }
        }
        let updated_at = document.server_updated_at;
        let data = document
            .to_json_value()
            .map_err(|err| ServerError::Internal(err.to_string()))?;
        Ok(GetDocumentResponse::Document(DocumentPayload {
            data,
            updated_at,
        }))
    }

    /// `POST` a document or narrow patch.
    pub fn post_document(
        &self,
        request: PostDocumentRequest,
        auth: &RequestAuth,
    ) -> ServerResult<PostDocumentResponse> {
        let actor = self.resolve_actor(&request, auth)?;
        let outcome = self
            .engine
            .accept_write(WriteRequest {
                data: request.data,
                actor,
                force_replace: request.force_replace,
                extra_peers: request.peers,
            })
            .map_err(ServerError::from)?;
        Ok(outcome_response(outcome))
    }

    /// Student path: create a resource request.
    pub fn post_student_request(
        &self,
        auth: &RequestAuth,
        item_id: i64,
        note: &str,
    ) -> ServerResult<PostDocumentResponse> {
        let roll = self.require_role(auth, ActorRole::Student)?;
        let outcome = self
            .engine
            .submit_student_request(&roll, item_id, note)
            .map_err(ServerError::from)?;
        Ok(outcome_response(outcome))
    }

    /// Student path: file a profile-change appeal.
    pub fn post_student_appeal(
        &self,
        auth: &RequestAuth,
        message: &str,
        field_changes: BTreeMap<String, String>,
    ) -> ServerResult<PostDocumentResponse> {
        let roll = self.require_role(auth, ActorRole::Student)?;
        let outcome = self
            .engine
            .submit_student_appeal(&roll, message, field_changes)
            .map_err(ServerError::from)?;
        Ok(outcome_response(outcome))
    }

    /// Lists the restore-point catalog (administrator only).
    pub fn list_restore_points(&self, auth: &RequestAuth) -> ServerResult<Vec<RestorePoint>> {
        self.require_role(auth, ActorRole::Admin)?;
        self.engine.list_restore_points().map_err(ServerError::from)
    }

    /// Toggles lock/label on a restore point (administrator only).
    pub fn set_restore_meta(
        &self,
        auth: &RequestAuth,
        id: &str,
        request: RestoreMetaRequest,
    ) -> ServerResult<()> {
        self.require_role(auth, ActorRole::Admin)?;
        self.engine
            .set_restore_meta(id, request.locked, request.label)
            .map_err(ServerError::from)
    }

    /// Performs a restore (administrator only). The store writes a
    /// pre-restore safety copy before installing the snapshot.
    pub fn restore(&self, auth: &RequestAuth, id: &str) -> ServerResult<PostDocumentResponse> {
        self.require_role(auth, ActorRole::Admin)?;
        let outcome = self.engine.restore(id).map_err(ServerError::from)?;
        Ok(outcome_response(outcome))
    }

    /// Probes configured peers (administrator or teacher).
    pub fn health(&self, auth: &RequestAuth) -> ServerResult<Vec<PeerHealth>> {
        match auth.session_role {
            Some(ActorRole::Admin) | Some(ActorRole::Teacher) => Ok(self.engine.probe_peers()),
            _ => Err(ServerError::Forbidden(
                "health endpoint requires administrator or teacher".into(),
            )),
        }
    }

    /// Opens a long-lived event subscription. The current clock arrives
    /// immediately as the baseline beat.
    pub fn subscribe_events(&self) -> EventSubscription {
        self.engine.subscribe()
    }

    fn require_role(&self, auth: &RequestAuth, role: ActorRole) -> ServerResult<String> {
        if auth.session_role != Some(role) {
            return Err(ServerError::Forbidden(format!(
                "endpoint requires {} session",
                role.as_str()
            )));
        }
        auth.username
            .clone()
            .ok_or_else(|| ServerError::Unauthorized("session has no identity".into()))
    }

    /// Resolves the writing actor from headers and session.
    ///
    /// Replica calls must carry the replication marker header and a
    /// shared secret that verifies in constant time; everything else
    /// falls back to the logged-in session role.
    fn resolve_actor(
        &self,
        request: &PostDocumentRequest,
        auth: &RequestAuth,
    ) -> ServerResult<ActorContext> {
        if auth.replicated_header {
            let Some(secret) = &self.secret else {
                return Err(ServerError::Unauthorized(
                    "replication disabled: no sync secret configured".into(),
                ));
            };
            let Some(key) = &auth.sync_key else {
                return Err(ServerError::Unauthorized("missing sync key".into()));
            };
            if !secret.verify(key) {
                return Err(ServerError::Unauthorized("invalid sync key".into()));
            }

            let replica_role = request
                .actor_role
                .as_deref()
                .and_then(ActorRole::parse);
            let replica_purpose = request
                .replica_purpose
                .as_deref()
                .and_then(ReplicaPurpose::parse);
            if replica_role == Some(ActorRole::Teacher)
                && replica_purpose == Some(ReplicaPurpose::TeacherPatch)
                && request.actor_name.is_none()
            {
                return Err(ServerError::BadRequest(
                    "teacher_patch relay requires actor_name".into(),
                ));
            }
            let username = request.actor_name.clone().unwrap_or_else(|| "replica".into());
            return Ok(ActorContext::replica(username, replica_role, replica_purpose));
        }

        match (&auth.session_role, &auth.username) {
            (Some(ActorRole::Admin), Some(username)) => Ok(ActorContext::admin(username.clone())),
            (Some(ActorRole::Teacher), Some(username)) => {
                Ok(ActorContext::teacher(username.clone()))
            }
            (Some(ActorRole::Student), Some(roll)) => Ok(ActorContext::student(roll.clone())),
            _ => Err(ServerError::Unauthorized(
                "document writes require a session or a replica secret".into(),
            )),
        }
    }
}

fn outcome_response(outcome: WriteOutcome) -> PostDocumentResponse {
    PostDocumentResponse {
        updated_at: outcome.updated_at,
        student_count: outcome.student_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use classboard_store::MemorySnapshotStore;
    use classboard_sync::EngineConfig;
    use classboard_testkit::{sample_document, sample_document_at};

    fn handler_with_secret(secret: Option<&str>) -> DocumentHandler {
        let engine = Arc::new(SyncCoordinator::new(
            Arc::new(MemorySnapshotStore::default()),
            EngineConfig::new(),
        ));
        DocumentHandler::new(engine, secret.map(SharedSecret::new))
    }

    fn post(document: &classboard_model::ScoreboardDocument) -> PostDocumentRequest {
        PostDocumentRequest {
            data: document.to_json_value().unwrap(),
            peers: vec![],
            force_replace: false,
            actor_role: None,
            replica_purpose: None,
            actor_name: None,
        }
    }

    #[test]
    fn empty_node_serves_no_content() {
        let handler = handler_with_secret(None);
        let response = handler.get_document(None).unwrap();
        assert!(matches!(response, GetDocumentResponse::NoContent));
    }

    #[test]
    fn admin_post_then_get_roundtrip() {
        let handler = handler_with_secret(None);
        let auth = RequestAuth::admin("admin");
        let response = handler.post_document(post(&sample_document(46)), &auth).unwrap();
        assert_eq!(response.student_count, 46);

        match handler.get_document(None).unwrap() {
            GetDocumentResponse::Document(payload) => {
                assert_eq!(payload.updated_at, Some(response.updated_at));
            }
            GetDocumentResponse::NoContent => panic!("expected a document"),
        }
    }

    #[test]
    fn since_short_circuits_to_no_content() {
        let handler = handler_with_secret(None);
        let auth = RequestAuth::admin("admin");
        let response = handler.post_document(post(&sample_document(46)), &auth).unwrap();

        let current = handler.get_document(Some(response.updated_at)).unwrap();
        assert!(matches!(current, GetDocumentResponse::NoContent));

        let stale = Timestamp::parse("2020-01-01T00:00:00+05:30").unwrap();
        assert!(matches!(
            handler.get_document(Some(stale)).unwrap(),
            GetDocumentResponse::Document(_)
        ));
    }

    #[test]
    fn anonymous_post_is_unauthorized() {
        let handler = handler_with_secret(Some("shared-secret-value"));
        let err = handler
            .post_document(post(&sample_document(46)), &RequestAuth::default())
            .unwrap_err();
        assert_eq!(err.status_code(), 401);
    }

    #[test]
    fn replica_with_wrong_secret_is_unauthorized() {
        let handler = handler_with_secret(Some("shared-secret-value"));
        let err = handler
            .post_document(
                post(&sample_document(46)),
                &RequestAuth::replica("wrong-secret"),
            )
            .unwrap_err();
        assert_eq!(err.status_code(), 401);
    }

    #[test]
    fn replica_with_secret_merges() {
        let handler = handler_with_secret(Some("shared-secret-value"));
        let mut request = post(&sample_document(46));
        request.replica_purpose = Some("full_sync".into());
        let response = handler
            .post_document(request, &RequestAuth::replica("shared-secret-value"))
            .unwrap();
        assert_eq!(response.student_count, 46);
    }

    #[test]
    fn replica_without_configured_secret_is_refused() {
        let handler = handler_with_secret(None);
        let err = handler
            .post_document(
                post(&sample_document(46)),
                &RequestAuth::replica("anything"),
            )
            .unwrap_err();
        assert_eq!(err.status_code(), 401);
    }

    #[test]
    fn teacher_patch_relay_requires_actor_name() {
        let handler = handler_with_secret(Some("shared-secret-value"));
        let mut request = post(&sample_document(5));
        request.actor_role = Some("teacher".into());
        request.replica_purpose = Some("teacher_patch".into());
        let err = handler
            .post_document(request, &RequestAuth::replica("shared-secret-value"))
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn conflict_response_carries_stored_clock() {
        let handler = handler_with_secret(Some("shared-secret-value"));
        let auth = RequestAuth::admin("admin");
        handler.post_document(post(&sample_document(46)), &auth).unwrap();

        let mut request = post(&sample_document_at(20, "2026-02-01T10:00:00+05:30"));
        request.replica_purpose = Some("full_sync".into());
        let err = handler
            .post_document(request, &RequestAuth::replica("shared-secret-value"))
            .unwrap_err();
        match err {
            ServerError::Conflict { server_updated_at } => {
                assert!(server_updated_at.is_some());
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn restore_endpoints_are_admin_only() {
        let handler = handler_with_secret(None);
        let teacher = RequestAuth::teacher("teacher1");
        assert_eq!(
            handler.list_restore_points(&teacher).unwrap_err().status_code(),
            403
        );
        assert_eq!(
            handler.restore(&teacher, "any").unwrap_err().status_code(),
            403
        );
    }

    #[test]
    fn health_allows_admin_and_teacher_only() {
        let handler = handler_with_secret(None);
        assert!(handler.health(&RequestAuth::admin("admin")).is_ok());
        assert!(handler.health(&RequestAuth::teacher("teacher1")).is_ok());
        assert_eq!(
            handler
                .health(&RequestAuth::student("EA24A01"))
                .unwrap_err()
                .status_code(),
            403
        );
    }

    #[test]
    fn student_endpoints_demand_student_session() {
        let handler = handler_with_secret(None);
        let auth = RequestAuth::admin("admin");
        handler.post_document(post(&sample_document(46)), &auth).unwrap();

        let student = RequestAuth::student("EA24A01");
        let response = handler.post_student_request(&student, 3, "please").unwrap();
        assert_eq!(response.student_count, 46);

        assert_eq!(
            handler
                .post_student_request(&RequestAuth::teacher("t"), 3, "")
                .unwrap_err()
                .status_code(),
            403
        );
    }

    #[test]
    fn event_stream_baseline_arrives_immediately() {
        let handler = handler_with_secret(None);
        let auth = RequestAuth::admin("admin");
        let response = handler.post_document(post(&sample_document(46)), &auth).unwrap();

        let sub = handler.subscribe_events();
        let baseline = sub
            .receiver
            .recv_timeout(std::time::Duration::from_millis(200))
            .unwrap();
        assert_eq!(baseline.updated_at, response.updated_at);
    }
}
