//! Host-supplied client resolution.

use async_trait::async_trait;
use serde_json::Value;

use crate::ModelResult;

/// Looks an audience value up in the host's client registry.
///
/// This is the only callback the model makes into the host. Installing one
/// (via [`JwtGrantModel::with_client_resolver`](crate::JwtGrantModel::with_client_resolver))
/// switches retrieval from trusting the verified `aud` claim as-is to
/// cross-checking it against a live registry: a lookup that errors, returns
/// `None`, or cannot run for want of an audience claim fails the retrieval
/// with [`InvalidClient`](crate::ModelError::InvalidClient).
///
/// The call is awaited verbatim; the model imposes no timeout of its own.
#[async_trait]
pub trait ClientResolver: Send + Sync {
    /// Returns the client registered under `client_id`, or `None` when no
    /// such client exists.
    ///
    /// # Errors
    ///
    /// Implementations may fail for any reason; the model reports every
    /// failure uniformly as `InvalidClient`.
    async fn resolve_client(&self, client_id: &str) -> ModelResult<Option<Value>>;
}
