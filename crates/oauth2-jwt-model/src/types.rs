//! Grant record types.
//!
//! Two families live here: the raw records the host hands in at issuance
//! (token values are opaque placeholders at that point), and the records
//! handed back out — issued records with the placeholders replaced by signed
//! JWTs, and logical records reconstructed from verified claims at retrieval.
//!
//! Wire field names are camelCase for interoperability with hosts that
//! serialize these records as JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

// =============================================================================
// Raw records (issuance input)
// =============================================================================

/// Token record produced by the host's grant step, before signing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRecord {
    /// Host-generated access token placeholder. It becomes the `jti` claim
    /// and is replaced by the signed JWT in the returned record.
    pub access_token: String,

    /// Access token expiry. Absence falls back to a 30-second lifetime at
    /// claim derivation time; that fallback is a safety net, not a supported
    /// configuration.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub access_token_expires_at: Option<OffsetDateTime>,

    /// Refresh token placeholder. Presence marks the refresh-token intent: a
    /// second signing pass runs in the same `save_token` call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Refresh token expiry.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub refresh_token_expires_at: Option<OffsetDateTime>,

    /// Granted scopes (space-separated).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

/// Authorization code record produced by the host's authorize step, before
/// signing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationCodeRecord {
    /// Host-generated code placeholder; becomes the `jti` claim.
    pub code: String,

    /// Code expiry. Absence falls back to a 30-second lifetime.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub expires_at: Option<OffsetDateTime>,

    /// Redirect URI the code was bound to; signed into the code's claims.
    pub redirect_uri: String,

    /// Granted scopes (space-separated).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

// =============================================================================
// Issued records (issuance output)
// =============================================================================

/// Record returned by `save_token`: the raw record with its token fields
/// replaced by signed JWTs, plus the client and user attached verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedToken {
    /// Signed access token JWT.
    pub access_token: String,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub access_token_expires_at: Option<OffsetDateTime>,

    /// Signed refresh token JWT, when the raw record carried the intent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub refresh_token_expires_at: Option<OffsetDateTime>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// The client the token was issued to, as supplied by the host.
    pub client: Value,

    /// The user the token represents, as supplied by the host.
    pub user: Value,
}

/// Record returned by `save_authorization_code`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedAuthorizationCode {
    /// Signed authorization code JWT.
    pub code: String,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub expires_at: Option<OffsetDateTime>,

    pub redirect_uri: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    pub client: Value,

    pub user: Value,
}

// =============================================================================
// Logical records (retrieval output)
// =============================================================================

/// Logical access token reconstructed from a verified JWT.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessToken {
    /// The compact token string, handed back unchanged.
    pub access_token: String,

    /// Expiry recovered from the `exp` claim (whole-second resolution).
    #[serde(with = "time::serde::rfc3339")]
    pub access_token_expires_at: OffsetDateTime,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// Resolved client when a resolver is configured, otherwise a minimal
    /// `{"id": <aud>}` mapping synthesized from the audience claim.
    pub client: Value,

    /// The `user` claim. Object-shaped users round-trip here; scalar users
    /// travel in `sub` only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Value>,
}

/// Logical refresh token reconstructed from a verified JWT.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshToken {
    /// The compact token string, handed back unchanged.
    pub refresh_token: String,

    /// Expiry recovered from the `exp` claim.
    #[serde(with = "time::serde::rfc3339")]
    pub refresh_token_expires_at: OffsetDateTime,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    pub client: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Value>,
}

/// Logical authorization code reconstructed from a verified JWT.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationCode {
    /// The compact code string, handed back unchanged.
    pub code: String,

    /// Expiry recovered from the `exp` claim.
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,

    /// From the code's own `redirectUri` claim, or the resolved client's
    /// configured redirect-URI field when the claim is absent.
    pub redirect_uri: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    pub client: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Value>,
}

impl AccessToken {
    /// Returns `true` if this token's expiry has passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        OffsetDateTime::now_utc() > self.access_token_expires_at
    }
}

impl RefreshToken {
    /// Returns `true` if this token's expiry has passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        OffsetDateTime::now_utc() > self.refresh_token_expires_at
    }
}

impl AuthorizationCode {
    /// Returns `true` if this code's expiry has passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        OffsetDateTime::now_utc() > self.expires_at
    }
}
