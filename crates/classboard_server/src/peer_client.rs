//! HTTP peer transport backed by reqwest.

use crate::auth::{REPLICATION_HEADER, SYNC_KEY_HEADER};
use crate::handler::DocumentPayload;
use classboard_model::ScoreboardDocument;
use classboard_sync::PeerTransport;
use std::time::Duration;

const DOCUMENT_PATH: &str = "/scoreboard/data";

/// Pushes and pulls documents over HTTP.
///
/// Every call builds a short-lived blocking client with the requested
/// timeout; peers are few and forwards infrequent, so connection reuse
/// is not worth shared client state across timeouts.
pub struct ReqwestPeerClient {
    sync_secret: Option<String>,
}

impl ReqwestPeerClient {
    /// Creates a client that authenticates with the given shared secret.
    pub fn new(sync_secret: Option<String>) -> Self {
        Self { sync_secret }
    }

    fn client(&self, timeout: Duration) -> Result<reqwest::blocking::Client, String> {
        reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| err.to_string())
    }
}

impl PeerTransport for ReqwestPeerClient {
    fn push_document(
        &self,
        base_url: &str,
        document: &ScoreboardDocument,
        timeout: Duration,
    ) -> Result<(), String> {
        let client = self.client(timeout)?;
        let body = serde_json::json!({
            "data": document,
            "actor_role": "replica",
            "replica_purpose": "full_sync",
        });
        let mut request = client
            .post(format!("{base_url}{DOCUMENT_PATH}"))
            .header(REPLICATION_HEADER, "1")
            .json(&body);
        if let Some(secret) = &self.sync_secret {
            request = request.header(SYNC_KEY_HEADER, secret);
        }
        let response = request.send().map_err(|err| err.to_string())?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(format!("peer returned {}", response.status()))
        }
    }

    fn fetch_document(
        &self,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Option<ScoreboardDocument>, String> {
        let client = self.client(timeout)?;
        let response = client
            .get(format!("{base_url}{DOCUMENT_PATH}"))
            .send()
            .map_err(|err| err.to_string())?;

        if response.status() == reqwest::StatusCode::NO_CONTENT {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(format!("peer returned {}", response.status()));
        }

        let payload: DocumentPayload = response.json().map_err(|err| err.to_string())?;
        let document = ScoreboardDocument::from_json_value(payload.data)
            .map_err(|err| err.to_string())?;
        Ok(Some(document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreachable_peer_is_an_error_not_a_panic() {
        let client = ReqwestPeerClient::new(None);
        // Reserved TEST-NET address; nothing listens there.
        let result = client.fetch_document(
            "http://192.0.2.1:9",
            Duration::from_millis(200),
        );
        assert!(result.is_err());
    }
}
