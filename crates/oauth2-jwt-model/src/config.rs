//! Model configuration.
//!
//! All options are resolved once at construction into an explicit struct with
//! named fields; nothing is merged or defaulted at call time.

use jsonwebtoken::Algorithm;

use crate::claims::GrantKind;

/// Configuration for [`JwtGrantModel`](crate::JwtGrantModel).
///
/// Each grant artifact is signed and verified with its own shared HMAC
/// secret, so an access token can never verify under the refresh-token or
/// authorization-code key.
///
/// The `*_field` options name the keys read from the map-shaped `client` and
/// `user` values the host passes in. Each has a conventional default; setting
/// one to `None` declares the mapping unconfigured, which turns any operation
/// that needs it into a [`Configuration`](crate::ModelError::Configuration)
/// error.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Issuer embedded as the `iss` claim and required to match at
    /// verification time.
    pub issuer: String,

    /// HMAC secret for signing and verifying access tokens.
    pub access_token_secret: String,

    /// HMAC secret for signing and verifying refresh tokens.
    pub refresh_token_secret: String,

    /// HMAC secret for signing and verifying authorization codes.
    pub authorization_code_secret: String,

    /// Key read from an object-shaped user to produce the `sub` claim.
    /// Scalar users are stringified directly and never consult this.
    pub user_id_field: Option<String>,

    /// Key read from the client to produce the `aud` claim.
    pub client_id_field: Option<String>,

    /// Key read from a resolved client to recover an authorization code's
    /// redirect URI when the code's own claims carry none.
    pub client_redirect_uri_field: Option<String>,

    /// Algorithms accepted during verification. Signing uses the first entry.
    /// Secrets are shared symmetric keys, so only the HMAC (`HS*`) family is
    /// meaningful here.
    pub algorithms: Vec<Algorithm>,
}

impl ModelConfig {
    /// Creates a configuration with the conventional field names and the
    /// single-algorithm `HS256` allow-list.
    ///
    /// # Arguments
    ///
    /// * `issuer` - The authorization server's issuer identifier
    /// * `access_token_secret` - HMAC key for access tokens
    /// * `refresh_token_secret` - HMAC key for refresh tokens
    /// * `authorization_code_secret` - HMAC key for authorization codes
    #[must_use]
    pub fn new(
        issuer: impl Into<String>,
        access_token_secret: impl Into<String>,
        refresh_token_secret: impl Into<String>,
        authorization_code_secret: impl Into<String>,
    ) -> Self {
        Self {
            issuer: issuer.into(),
            access_token_secret: access_token_secret.into(),
            refresh_token_secret: refresh_token_secret.into(),
            authorization_code_secret: authorization_code_secret.into(),
            user_id_field: Some("id".to_string()),
            client_id_field: Some("id".to_string()),
            client_redirect_uri_field: Some("redirectUri".to_string()),
            algorithms: vec![Algorithm::HS256],
        }
    }

    /// Sets the key read from object-shaped users for the `sub` claim.
    #[must_use]
    pub fn with_user_id_field(mut self, field: impl Into<String>) -> Self {
        self.user_id_field = Some(field.into());
        self
    }

    /// Sets the key read from clients for the `aud` claim.
    #[must_use]
    pub fn with_client_id_field(mut self, field: impl Into<String>) -> Self {
        self.client_id_field = Some(field.into());
        self
    }

    /// Sets the key read from resolved clients for a fallback redirect URI.
    #[must_use]
    pub fn with_client_redirect_uri_field(mut self, field: impl Into<String>) -> Self {
        self.client_redirect_uri_field = Some(field.into());
        self
    }

    /// Replaces the verification algorithm allow-list.
    #[must_use]
    pub fn with_algorithms(mut self, algorithms: Vec<Algorithm>) -> Self {
        self.algorithms = algorithms;
        self
    }

    /// The signing/verification secret for one grant kind.
    pub(crate) fn secret_for(&self, kind: GrantKind) -> &str {
        match kind {
            GrantKind::AccessToken => &self.access_token_secret,
            GrantKind::RefreshToken => &self.refresh_token_secret,
            GrantKind::AuthorizationCode => &self.authorization_code_secret,
        }
    }

    /// Algorithm used when signing: the head of the allow-list.
    pub(crate) fn signing_algorithm(&self) -> Algorithm {
        self.algorithms.first().copied().unwrap_or(Algorithm::HS256)
    }
}
