//! Claim derivation for the three grant artifacts.
//!
//! [`ClaimView`] is a pure projection of `(kind, record, client, user)` under
//! one configuration: every accessor recomputes from the borrowed inputs, so
//! each derivation can be exercised in isolation and nothing is cached or
//! mutated. [`GrantKind`] carries the one table mapping each kind to its
//! identifier and expiry fields.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use crate::ModelResult;
use crate::config::ModelConfig;
use crate::error::ModelError;
use crate::types::{AuthorizationCodeRecord, TokenRecord};

/// Expiry applied when a record carries no expiry for its kind. A safety
/// fallback, not a supported configuration.
const DEFAULT_EXPIRY_SECS: i64 = 30;

/// Fixed skew buffer backdating `nbf` from `exp` for non-refresh grants.
const NBF_SKEW_SECS: i64 = 35;

/// Scope sentinel some hosts emit for "scopes unsupported"; never signed into
/// a token.
const UNSUPPORTED_SCOPE: &str = "UNSUPPORTED";

// =============================================================================
// Grant Kind
// =============================================================================

/// The three grant artifacts this model issues and verifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GrantKind {
    /// Short-lived bearer credential.
    AccessToken,
    /// Long-lived credential that activates once its paired access token
    /// expires.
    RefreshToken,
    /// One-hop credential from the authorize step.
    AuthorizationCode,
}

impl GrantKind {
    /// Wire value of the `type` claim.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccessToken => "accessToken",
            Self::RefreshToken => "refreshToken",
            Self::AuthorizationCode => "authorizationCode",
        }
    }

    /// The record field that identifies this kind of grant (its `jti`).
    fn unique_id<'a>(&self, record: RecordRef<'a>) -> Option<&'a str> {
        match (self, record) {
            (Self::AccessToken, RecordRef::Token(t)) => Some(t.access_token.as_str()),
            (Self::RefreshToken, RecordRef::Token(t)) => t.refresh_token.as_deref(),
            (Self::AuthorizationCode, RecordRef::Code(c)) => Some(c.code.as_str()),
            _ => None,
        }
    }

    /// The record field holding this kind's expiry.
    fn expires_at(&self, record: RecordRef<'_>) -> Option<OffsetDateTime> {
        match (self, record) {
            (Self::AccessToken, RecordRef::Token(t)) => t.access_token_expires_at,
            (Self::RefreshToken, RecordRef::Token(t)) => t.refresh_token_expires_at,
            (Self::AuthorizationCode, RecordRef::Code(c)) => c.expires_at,
            _ => None,
        }
    }
}

impl fmt::Display for GrantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Record view
// =============================================================================

/// Borrowed view over either raw record shape.
#[derive(Debug, Clone, Copy)]
pub enum RecordRef<'a> {
    /// An access/refresh token record.
    Token(&'a TokenRecord),
    /// An authorization code record.
    Code(&'a AuthorizationCodeRecord),
}

impl<'a> RecordRef<'a> {
    fn scope(&self) -> Option<&'a str> {
        match self {
            Self::Token(t) => t.scope.as_deref(),
            Self::Code(c) => c.scope.as_deref(),
        }
    }
}

// =============================================================================
// Wire claims
// =============================================================================

/// Decoded claim set of a signed grant token.
///
/// Membership matches the signed wire format field for field, so any
/// compliant JWT verifier holding the right secret decodes the same set.
/// Optional members are omitted, never null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Unique token identifier: the host's placeholder token or code value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,

    /// Issuing authorization server.
    pub iss: String,

    /// Intended client recipient.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,

    /// End user the grant represents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Earliest valid time, seconds since epoch.
    pub nbf: i64,

    /// Expiry, seconds since epoch.
    pub exp: i64,

    /// Grant kind discriminator; see [`GrantKind::as_str`].
    #[serde(rename = "type")]
    pub kind: String,

    /// Object-shaped users ride along in full; scalar users live in `sub`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<Value>,

    /// Granted scopes (space-separated).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// Redirect URI, authorization codes only.
    #[serde(rename = "redirectUri", skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,
}

// =============================================================================
// Claim view
// =============================================================================

/// On-demand claim derivation for one grant artifact.
pub struct ClaimView<'a> {
    kind: GrantKind,
    config: &'a ModelConfig,
    record: RecordRef<'a>,
    client: &'a Value,
    user: &'a Value,
}

impl<'a> ClaimView<'a> {
    /// Creates a view over one `(record, client, user)` triple.
    #[must_use]
    pub fn new(
        kind: GrantKind,
        config: &'a ModelConfig,
        record: RecordRef<'a>,
        client: &'a Value,
        user: &'a Value,
    ) -> Self {
        Self {
            kind,
            config,
            record,
            client,
            user,
        }
    }

    /// The `jti` value: the record's own token or code string for this kind.
    #[must_use]
    pub fn unique_id(&self) -> Option<&'a str> {
        self.kind.unique_id(self.record)
    }

    /// Expiry in whole seconds since the epoch, floored. Records without an
    /// expiry for this kind get `now + 30s`.
    #[must_use]
    pub fn expires_at(&self) -> i64 {
        match self.kind.expires_at(self.record) {
            Some(at) => at.unix_timestamp(),
            None => OffsetDateTime::now_utc().unix_timestamp() + DEFAULT_EXPIRY_SECS,
        }
    }

    /// Not-before in whole seconds since the epoch.
    ///
    /// A refresh token only becomes active once its paired access token has
    /// expired, so its `nbf` anchors to the access token's expiry. Every
    /// other kind backdates `exp` by the fixed skew buffer.
    #[must_use]
    pub fn not_before(&self) -> i64 {
        if self.kind == GrantKind::RefreshToken {
            if let RecordRef::Token(t) = self.record {
                if let Some(at) = t.access_token_expires_at {
                    return at.unix_timestamp();
                }
            }
        }
        self.expires_at() - NBF_SKEW_SECS
    }

    /// The `sub` value.
    ///
    /// Object-shaped users are read through the configured `user_id_field`;
    /// scalar users are stringified directly.
    ///
    /// # Errors
    ///
    /// Returns a `Configuration` error when the user is an object and
    /// `user_id_field` is unset, or names a field the user does not have.
    pub fn subject(&self) -> ModelResult<String> {
        match self.user {
            Value::Object(fields) => {
                let field = self.config.user_id_field.as_deref().ok_or_else(|| {
                    ModelError::configuration(
                        "user_id_field is required when the user is an object",
                    )
                })?;
                let id = fields.get(field).ok_or_else(|| {
                    ModelError::configuration(format!("user has no `{field}` field"))
                })?;
                Ok(stringify(id))
            }
            scalar => Ok(stringify(scalar)),
        }
    }

    /// The `aud` value, read through the configured `client_id_field`.
    ///
    /// # Errors
    ///
    /// Returns a `Configuration` error when `client_id_field` is unset or
    /// names a field the client does not have.
    pub fn audience(&self) -> ModelResult<String> {
        let field = self.config.client_id_field.as_deref().ok_or_else(|| {
            ModelError::configuration("client_id_field is required to resolve the audience")
        })?;
        let id = self
            .client
            .get(field)
            .ok_or_else(|| ModelError::configuration(format!("client has no `{field}` field")))?;
        Ok(stringify(id))
    }

    /// Assembles the complete claim set for signing.
    ///
    /// `scope` is included only when present and not the `"UNSUPPORTED"`
    /// sentinel; `user` only for object-shaped users; `redirectUri` only for
    /// authorization codes.
    ///
    /// # Errors
    ///
    /// Propagates the `Configuration` errors of [`subject`](Self::subject)
    /// and [`audience`](Self::audience).
    pub fn claims(&self) -> ModelResult<Claims> {
        Ok(Claims {
            jti: self.unique_id().map(str::to_owned),
            iss: self.config.issuer.clone(),
            aud: Some(self.audience()?),
            sub: Some(self.subject()?),
            nbf: self.not_before(),
            exp: self.expires_at(),
            kind: self.kind.as_str().to_owned(),
            user: self.user.is_object().then(|| self.user.clone()),
            scope: self
                .record
                .scope()
                .filter(|s| *s != UNSUPPORTED_SCOPE)
                .map(str::to_owned),
            redirect_uri: match self.record {
                RecordRef::Code(c) => Some(c.redirect_uri.clone()),
                RecordRef::Token(_) => None,
            },
        })
    }
}

/// JSON scalars stringified the way hosts expect identifiers: strings bare,
/// everything else in its JSON rendering.
pub(crate) fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::Duration;

    fn config() -> ModelConfig {
        ModelConfig::new("test-issuer", "at-secret", "rt-secret", "ac-secret")
    }

    fn token_record() -> TokenRecord {
        TokenRecord {
            access_token: "asdf1234".to_string(),
            access_token_expires_at: None,
            refresh_token: None,
            refresh_token_expires_at: None,
            scope: None,
        }
    }

    fn code_record() -> AuthorizationCodeRecord {
        AuthorizationCodeRecord {
            code: "zxcv6789".to_string(),
            expires_at: None,
            redirect_uri: "https://app.example.com/cb".to_string(),
            scope: None,
        }
    }

    fn view<'a>(
        kind: GrantKind,
        config: &'a ModelConfig,
        record: RecordRef<'a>,
        client: &'a Value,
        user: &'a Value,
    ) -> ClaimView<'a> {
        ClaimView::new(kind, config, record, client, user)
    }

    #[test]
    fn test_unique_id_per_kind() {
        let config = config();
        let client = json!({"id": "acme"});
        let user = json!(1);

        let record = TokenRecord {
            refresh_token: Some("qwer5678".to_string()),
            ..token_record()
        };
        let code = code_record();

        let at = view(
            GrantKind::AccessToken,
            &config,
            RecordRef::Token(&record),
            &client,
            &user,
        );
        assert_eq!(at.unique_id(), Some("asdf1234"));

        let rt = view(
            GrantKind::RefreshToken,
            &config,
            RecordRef::Token(&record),
            &client,
            &user,
        );
        assert_eq!(rt.unique_id(), Some("qwer5678"));

        let ac = view(
            GrantKind::AuthorizationCode,
            &config,
            RecordRef::Code(&code),
            &client,
            &user,
        );
        assert_eq!(ac.unique_id(), Some("zxcv6789"));
    }

    #[test]
    fn test_unique_id_absent_refresh() {
        let config = config();
        let client = json!({"id": "acme"});
        let user = json!(1);
        let record = token_record();

        let rt = view(
            GrantKind::RefreshToken,
            &config,
            RecordRef::Token(&record),
            &client,
            &user,
        );
        assert_eq!(rt.unique_id(), None);
    }

    #[test]
    fn test_expiry_reads_the_kinds_field() {
        let config = config();
        let client = json!({"id": "acme"});
        let user = json!(1);

        let at_exp = OffsetDateTime::now_utc() + Duration::seconds(5);
        let rt_exp = OffsetDateTime::now_utc() + Duration::seconds(120);
        let record = TokenRecord {
            access_token_expires_at: Some(at_exp),
            refresh_token: Some("rt".to_string()),
            refresh_token_expires_at: Some(rt_exp),
            ..token_record()
        };

        let at = view(
            GrantKind::AccessToken,
            &config,
            RecordRef::Token(&record),
            &client,
            &user,
        );
        assert_eq!(at.expires_at(), at_exp.unix_timestamp());

        let rt = view(
            GrantKind::RefreshToken,
            &config,
            RecordRef::Token(&record),
            &client,
            &user,
        );
        assert_eq!(rt.expires_at(), rt_exp.unix_timestamp());

        let code_exp = OffsetDateTime::now_utc() + Duration::seconds(3);
        let code = AuthorizationCodeRecord {
            expires_at: Some(code_exp),
            ..code_record()
        };
        let ac = view(
            GrantKind::AuthorizationCode,
            &config,
            RecordRef::Code(&code),
            &client,
            &user,
        );
        assert_eq!(ac.expires_at(), code_exp.unix_timestamp());
    }

    #[test]
    fn test_expiry_defaults_to_thirty_seconds() {
        let config = config();
        let client = json!({"id": "acme"});
        let user = json!(1);
        let record = token_record();

        let at = view(
            GrantKind::AccessToken,
            &config,
            RecordRef::Token(&record),
            &client,
            &user,
        );

        let now = OffsetDateTime::now_utc().unix_timestamp();
        let exp = at.expires_at();
        assert!(exp >= now + 29 && exp <= now + 31);
    }

    #[test]
    fn test_refresh_nbf_anchors_to_access_expiry() {
        let config = config();
        let client = json!({"id": "acme"});
        let user = json!(1);

        let at_exp = OffsetDateTime::now_utc() + Duration::seconds(5);
        let record = TokenRecord {
            access_token_expires_at: Some(at_exp),
            refresh_token: Some("rt".to_string()),
            refresh_token_expires_at: Some(OffsetDateTime::now_utc() + Duration::seconds(120)),
            ..token_record()
        };

        let rt = view(
            GrantKind::RefreshToken,
            &config,
            RecordRef::Token(&record),
            &client,
            &user,
        );
        assert_eq!(rt.not_before(), at_exp.unix_timestamp());
        assert!(rt.not_before() < rt.expires_at());
    }

    #[test]
    fn test_default_nbf_is_in_the_past() {
        let config = config();
        let client = json!({"id": "acme"});
        let user = json!(1);
        let record = token_record();

        let at = view(
            GrantKind::AccessToken,
            &config,
            RecordRef::Token(&record),
            &client,
            &user,
        );
        assert!(at.not_before() < OffsetDateTime::now_utc().unix_timestamp());
        assert!(at.not_before() < at.expires_at());
    }

    #[test]
    fn test_subject_reads_configured_field() {
        let config = config().with_user_id_field("name");
        let client = json!({"id": "acme"});
        let user = json!({"name": "pilot"});
        let record = token_record();

        let at = view(
            GrantKind::AccessToken,
            &config,
            RecordRef::Token(&record),
            &client,
            &user,
        );
        assert_eq!(at.subject().unwrap(), "pilot");
    }

    #[test]
    fn test_subject_stringifies_scalars() {
        let config = config();
        let client = json!({"id": "acme"});
        let user = json!(1000);
        let record = token_record();

        let at = view(
            GrantKind::AccessToken,
            &config,
            RecordRef::Token(&record),
            &client,
            &user,
        );
        assert_eq!(at.subject().unwrap(), "1000");
    }

    #[test]
    fn test_subject_requires_user_id_field_for_objects() {
        let mut config = config();
        config.user_id_field = None;
        let client = json!({"id": "acme"});
        let user = json!({"id": 1});
        let record = token_record();

        let at = view(
            GrantKind::AccessToken,
            &config,
            RecordRef::Token(&record),
            &client,
            &user,
        );
        assert!(at.subject().unwrap_err().is_configuration());
    }

    #[test]
    fn test_audience_reads_configured_field() {
        let config = config();
        let client = json!({"id": "acme"});
        let user = json!(1);
        let record = token_record();

        let at = view(
            GrantKind::AccessToken,
            &config,
            RecordRef::Token(&record),
            &client,
            &user,
        );
        assert_eq!(at.audience().unwrap(), "acme");
    }

    #[test]
    fn test_audience_requires_client_id_field() {
        let mut config = config();
        config.client_id_field = None;
        let client = json!({"id": "acme"});
        let user = json!(1);
        let record = token_record();

        let at = view(
            GrantKind::AccessToken,
            &config,
            RecordRef::Token(&record),
            &client,
            &user,
        );
        assert!(at.audience().unwrap_err().is_configuration());
    }

    #[test]
    fn test_claims_membership() {
        let config = config();
        let client = json!({"id": "acme"});
        let user = json!({"id": 7});
        let record = TokenRecord {
            scope: Some("read write".to_string()),
            access_token_expires_at: Some(OffsetDateTime::now_utc() + Duration::seconds(10)),
            ..token_record()
        };

        let claims = view(
            GrantKind::AccessToken,
            &config,
            RecordRef::Token(&record),
            &client,
            &user,
        )
        .claims()
        .unwrap();

        assert_eq!(claims.jti.as_deref(), Some("asdf1234"));
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud.as_deref(), Some("acme"));
        assert_eq!(claims.sub.as_deref(), Some("7"));
        assert_eq!(claims.kind, "accessToken");
        assert_eq!(claims.scope.as_deref(), Some("read write"));
        assert_eq!(claims.user, Some(user));
        assert!(claims.redirect_uri.is_none());
        assert!(claims.nbf < claims.exp);
    }

    #[test]
    fn test_claims_omit_scalar_user_and_unsupported_scope() {
        let config = config();
        let client = json!({"id": "acme"});
        let user = json!("u-1");
        let record = TokenRecord {
            scope: Some(UNSUPPORTED_SCOPE.to_string()),
            ..token_record()
        };

        let claims = view(
            GrantKind::AccessToken,
            &config,
            RecordRef::Token(&record),
            &client,
            &user,
        )
        .claims()
        .unwrap();

        assert!(claims.user.is_none());
        assert!(claims.scope.is_none());
        assert_eq!(claims.sub.as_deref(), Some("u-1"));
    }

    #[test]
    fn test_claims_carry_redirect_uri_for_codes() {
        let config = config();
        let client = json!({"id": "acme"});
        let user = json!(1);
        let code = code_record();

        let claims = view(
            GrantKind::AuthorizationCode,
            &config,
            RecordRef::Code(&code),
            &client,
            &user,
        )
        .claims()
        .unwrap();

        assert_eq!(
            claims.redirect_uri.as_deref(),
            Some("https://app.example.com/cb")
        );
        assert_eq!(claims.kind, "authorizationCode");
    }

    #[test]
    fn test_wire_claims_omit_absent_members() {
        let claims = Claims {
            jti: None,
            iss: "test-issuer".to_string(),
            aud: Some("acme".to_string()),
            sub: Some("1".to_string()),
            nbf: 100,
            exp: 200,
            kind: "accessToken".to_string(),
            user: None,
            scope: None,
            redirect_uri: None,
        };

        let wire = serde_json::to_value(&claims).unwrap();
        assert!(wire.get("jti").is_none());
        assert!(wire.get("user").is_none());
        assert!(wire.get("scope").is_none());
        assert!(wire.get("redirectUri").is_none());
        assert_eq!(wire.get("type"), Some(&json!("accessToken")));
    }
}
