//! # classboard server
//!
//! The document-exchange boundary of a classboard node.
//!
//! This crate provides:
//! - Typed request handlers for the document endpoint (`GET` with a
//!   `since` short-circuit, `POST` with role and replica gating), the
//!   restore-point endpoints, the health endpoint and the event stream
//! - Shared-secret replica authentication with constant-time comparison
//!   and the `X-EA-Replicated: 1` opt-in marker
//! - Environment-driven configuration
//! - The `reqwest`-backed peer transport used for forwarding, bootstrap
//!   and health probes
//!
//! The handlers are framework-free: an HTTP layer maps routes onto
//! them and translates [`ServerError::status_code`] into response codes.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod auth;
mod config;
mod error;
mod handler;
mod peer_client;
mod server;

pub use auth::{SharedSecret, REPLICATION_HEADER, SYNC_KEY_HEADER};
pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use handler::{
    DocumentHandler, DocumentPayload, GetDocumentResponse, PostDocumentRequest,
    PostDocumentResponse, RequestAuth, RestoreMetaRequest,
};
pub use peer_client::ReqwestPeerClient;
pub use server::ScoreboardServer;
