//! The token lifecycle adapter.
//!
//! One issuance and one retrieval operation per grant artifact, plus the
//! scope check and the (unsupported) revocations. Issuance derives a claim
//! set and signs it with the artifact's secret; retrieval verifies a compact
//! token and projects its claims back into a logical record. Nothing is
//! persisted anywhere: the signed token is the only durable representation.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::{Value, json};
use time::OffsetDateTime;
use tracing::debug;

use crate::ModelResult;
use crate::claims::{ClaimView, GrantKind, RecordRef, stringify};
use crate::config::ModelConfig;
use crate::error::ModelError;
use crate::jwt;
use crate::resolver::ClientResolver;
use crate::types::{
    AccessToken, AuthorizationCode, AuthorizationCodeRecord, IssuedAuthorizationCode, IssuedToken,
    RefreshToken, TokenRecord,
};

/// Stateless grant model: persistence by signing, lookup by verification.
///
/// All operations are single-call and side-effect-free; a model value can be
/// shared freely across tasks. Client resolution is an explicit injected
/// collaborator, never ambient state.
pub struct JwtGrantModel {
    config: ModelConfig,
    resolver: Option<Arc<dyn ClientResolver>>,
}

impl JwtGrantModel {
    /// Creates a model that trusts verified audience claims as-is.
    #[must_use]
    pub fn new(config: ModelConfig) -> Self {
        Self {
            config,
            resolver: None,
        }
    }

    /// Installs the host's client registry lookup.
    ///
    /// With a resolver present, every retrieval cross-checks the audience
    /// claim against the registry and attaches the registered client to the
    /// logical record; lookup misses and failures become
    /// [`ModelError::InvalidClient`].
    #[must_use]
    pub fn with_client_resolver(mut self, resolver: Arc<dyn ClientResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    // =========================================================================
    // Issuance
    // =========================================================================

    /// Signs a freshly issued token record into its JWT form.
    ///
    /// The access token is always signed. When the record carries a refresh
    /// token, a second independent signing pass runs with the refresh secret
    /// in the same call; failure of either pass aborts the whole call, and
    /// since nothing is persisted there is no partial state to undo.
    ///
    /// # Errors
    ///
    /// Returns a `Configuration` error from claim derivation or a `Signing`
    /// error from the encoder.
    pub async fn save_token(
        &self,
        token: &TokenRecord,
        client: &Value,
        user: &Value,
    ) -> ModelResult<IssuedToken> {
        let record = RecordRef::Token(token);

        let access = ClaimView::new(GrantKind::AccessToken, &self.config, record, client, user);
        let access_jwt = jwt::sign(&self.config, GrantKind::AccessToken, &access.claims()?)?;

        let refresh_jwt = if token.refresh_token.is_some() {
            let refresh =
                ClaimView::new(GrantKind::RefreshToken, &self.config, record, client, user);
            Some(jwt::sign(
                &self.config,
                GrantKind::RefreshToken,
                &refresh.claims()?,
            )?)
        } else {
            None
        };

        debug!(with_refresh = refresh_jwt.is_some(), "issued access token");

        Ok(IssuedToken {
            access_token: access_jwt,
            access_token_expires_at: token.access_token_expires_at,
            refresh_token: refresh_jwt,
            refresh_token_expires_at: token.refresh_token_expires_at,
            scope: token.scope.clone(),
            client: client.clone(),
            user: user.clone(),
        })
    }

    /// Signs a freshly issued authorization code record into its JWT form.
    ///
    /// # Errors
    ///
    /// Returns a `Configuration` error from claim derivation or a `Signing`
    /// error from the encoder.
    pub async fn save_authorization_code(
        &self,
        code: &AuthorizationCodeRecord,
        client: &Value,
        user: &Value,
    ) -> ModelResult<IssuedAuthorizationCode> {
        let view = ClaimView::new(
            GrantKind::AuthorizationCode,
            &self.config,
            RecordRef::Code(code),
            client,
            user,
        );
        let code_jwt = jwt::sign(&self.config, GrantKind::AuthorizationCode, &view.claims()?)?;

        debug!("issued authorization code");

        Ok(IssuedAuthorizationCode {
            code: code_jwt,
            expires_at: code.expires_at,
            redirect_uri: code.redirect_uri.clone(),
            scope: code.scope.clone(),
            client: client.clone(),
            user: user.clone(),
        })
    }

    // =========================================================================
    // Retrieval
    // =========================================================================

    /// Resolves a previously issued access token back into its logical
    /// record.
    ///
    /// # Errors
    ///
    /// `InvalidToken` for any verification failure or grant-kind mismatch;
    /// `InvalidClient` when a configured resolver cannot produce the client.
    pub async fn get_access_token(&self, token: &str) -> ModelResult<AccessToken> {
        let claims = jwt::verify(&self.config, GrantKind::AccessToken, token)?;
        let client = self.resolve_client(claims.aud.as_deref()).await?;

        Ok(AccessToken {
            access_token: token.to_owned(),
            access_token_expires_at: timestamp(claims.exp)?,
            scope: claims.scope,
            client,
            user: claims.user,
        })
    }

    /// Resolves a previously issued refresh token back into its logical
    /// record.
    ///
    /// # Errors
    ///
    /// `InvalidToken` for any verification failure or grant-kind mismatch
    /// (an access token never verifies here, even under a shared secret);
    /// `InvalidClient` when a configured resolver cannot produce the client.
    pub async fn get_refresh_token(&self, token: &str) -> ModelResult<RefreshToken> {
        let claims = jwt::verify(&self.config, GrantKind::RefreshToken, token)?;
        let client = self.resolve_client(claims.aud.as_deref()).await?;

        Ok(RefreshToken {
            refresh_token: token.to_owned(),
            refresh_token_expires_at: timestamp(claims.exp)?,
            scope: claims.scope,
            client,
            user: claims.user,
        })
    }

    /// Resolves a previously issued authorization code back into its logical
    /// record.
    ///
    /// The redirect URI comes from the code's own claims; codes signed
    /// without one (by an older issuer) fall back to the resolved client's
    /// configured redirect-URI field.
    ///
    /// # Errors
    ///
    /// `InvalidToken` for any verification failure or grant-kind mismatch;
    /// `InvalidClient` when a configured resolver cannot produce the client;
    /// `Configuration` when the fallback is needed and
    /// `client_redirect_uri_field` is unset or absent from the client.
    pub async fn get_authorization_code(&self, code: &str) -> ModelResult<AuthorizationCode> {
        let claims = jwt::verify(&self.config, GrantKind::AuthorizationCode, code)?;
        let client = self.resolve_client(claims.aud.as_deref()).await?;

        let redirect_uri = match claims.redirect_uri {
            Some(uri) => uri,
            None => self.client_redirect_uri(&client)?,
        };

        Ok(AuthorizationCode {
            code: code.to_owned(),
            expires_at: timestamp(claims.exp)?,
            redirect_uri,
            scope: claims.scope,
            client,
            user: claims.user,
        })
    }

    // =========================================================================
    // Scope check and revocation
    // =========================================================================

    /// Checks a requested scope string against a token's granted scopes.
    ///
    /// Both strings split on single spaces into sets; the request passes only
    /// if every requested entry is granted. A token with no scope at all
    /// grants nothing: the result is `false`, not an error.
    #[must_use]
    pub fn verify_scope(&self, token: &AccessToken, requested_scope: &str) -> bool {
        let Some(granted) = token.scope.as_deref() else {
            return false;
        };
        let granted: HashSet<&str> = granted.split(' ').collect();
        requested_scope.split(' ').all(|scope| granted.contains(scope))
    }

    /// Token revocation is not supported: signed tokens stay valid until they
    /// expire. Always `false`.
    #[must_use]
    pub fn revoke_token(&self, _token: &RefreshToken) -> bool {
        false
    }

    /// Authorization code revocation is not supported. Always `false`.
    #[must_use]
    pub fn revoke_authorization_code(&self, _code: &AuthorizationCode) -> bool {
        false
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Produces the client for a logical record from the verified audience.
    async fn resolve_client(&self, audience: Option<&str>) -> ModelResult<Value> {
        let Some(resolver) = &self.resolver else {
            return Ok(json!({ "id": audience }));
        };

        let aud = audience.ok_or(ModelError::InvalidClient)?;
        match resolver.resolve_client(aud).await {
            Ok(Some(client)) => Ok(client),
            Ok(None) => Err(ModelError::InvalidClient),
            Err(err) => {
                debug!(error = %err, "client resolution failed");
                Err(ModelError::InvalidClient)
            }
        }
    }

    /// Fallback redirect URI read from a resolved client.
    fn client_redirect_uri(&self, client: &Value) -> ModelResult<String> {
        let field = self
            .config
            .client_redirect_uri_field
            .as_deref()
            .ok_or_else(|| {
                ModelError::configuration(
                    "client_redirect_uri_field is required when the code carries no redirect URI",
                )
            })?;
        let uri = client
            .get(field)
            .ok_or_else(|| ModelError::configuration(format!("client has no `{field}` field")))?;
        Ok(stringify(uri))
    }
}

fn timestamp(seconds: i64) -> ModelResult<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp(seconds).map_err(|_| ModelError::InvalidToken)
}
