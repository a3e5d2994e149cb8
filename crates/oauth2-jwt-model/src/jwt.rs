//! Keyed JWT signing and verification.
//!
//! Thin wrapper over `jsonwebtoken`, keyed per grant kind. Verification is a
//! single funnel: whatever `jsonwebtoken` rejects — signature, algorithm,
//! expiry, not-before, issuer, malformed input — and whatever the grant-kind
//! assertion rejects, the caller sees one uniform `InvalidToken`. The cause
//! is logged at debug level only.

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::debug;

use crate::ModelResult;
use crate::claims::{Claims, GrantKind};
use crate::config::ModelConfig;
use crate::error::ModelError;

/// Signs a claim set with the secret for its grant kind.
pub(crate) fn sign(config: &ModelConfig, kind: GrantKind, claims: &Claims) -> ModelResult<String> {
    let header = Header::new(config.signing_algorithm());
    let key = EncodingKey::from_secret(config.secret_for(kind).as_bytes());
    encode(&header, claims, &key).map_err(|err| ModelError::signing(err.to_string()))
}

/// Verifies a compact token for one grant kind and returns its claim set.
///
/// Checks the signature against the kind's secret, the algorithm against the
/// configured allow-list, `exp` and `nbf` with zero leeway, and `iss` against
/// the configured issuer. `aud` is not checked here; the model layer resolves
/// it. The decoded `type` claim must equal the expected kind, so a token of
/// one kind never verifies as another even under a shared secret.
pub(crate) fn verify(config: &ModelConfig, kind: GrantKind, token: &str) -> ModelResult<Claims> {
    let mut validation = Validation::new(config.signing_algorithm());
    validation.algorithms = config.algorithms.clone();
    validation.set_issuer(&[&config.issuer]);
    validation.set_required_spec_claims(&["exp", "nbf", "iss"]);
    validation.validate_exp = true;
    validation.validate_nbf = true;
    validation.validate_aud = false;
    validation.leeway = 0;

    let key = DecodingKey::from_secret(config.secret_for(kind).as_bytes());
    let decoded = decode::<Claims>(token, &key, &validation).map_err(|err| {
        debug!(kind = %kind, error = %err, "token verification failed");
        ModelError::InvalidToken
    })?;

    let claims = decoded.claims;
    if claims.kind != kind.as_str() {
        debug!(expected = %kind, found = %claims.kind, "grant kind mismatch");
        return Err(ModelError::InvalidToken);
    }

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn config() -> ModelConfig {
        ModelConfig::new("test-issuer", "at-secret", "rt-secret", "ac-secret")
    }

    fn claims(kind: GrantKind, lifetime_secs: i64) -> Claims {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        Claims {
            jti: Some("jti-1".to_string()),
            iss: "test-issuer".to_string(),
            aud: Some("acme".to_string()),
            sub: Some("1".to_string()),
            nbf: now - 5,
            exp: now + lifetime_secs,
            kind: kind.as_str().to_string(),
            user: None,
            scope: None,
            redirect_uri: None,
        }
    }

    #[test]
    fn test_sign_verify_roundtrip() {
        let config = config();
        let claims = claims(GrantKind::AccessToken, 60);

        let token = sign(&config, GrantKind::AccessToken, &claims).unwrap();
        assert_eq!(token.split('.').count(), 3);

        let decoded = verify(&config, GrantKind::AccessToken, &token).unwrap();
        assert_eq!(decoded, claims);
    }

    #[test]
    fn test_wrong_kind_secret_rejected() {
        let config = config();
        let token = sign(&config, GrantKind::AccessToken, &claims(GrantKind::AccessToken, 60))
            .unwrap();

        // Refresh retrieval verifies under the refresh secret; the signature
        // cannot match.
        assert!(
            verify(&config, GrantKind::RefreshToken, &token)
                .unwrap_err()
                .is_invalid_token()
        );
    }

    #[test]
    fn test_kind_tag_rejected_under_shared_secret() {
        // Same secret for every kind: only the type claim can discriminate.
        let config = ModelConfig::new("test-issuer", "shared", "shared", "shared");
        let token = sign(&config, GrantKind::AccessToken, &claims(GrantKind::AccessToken, 60))
            .unwrap();

        assert!(
            verify(&config, GrantKind::RefreshToken, &token)
                .unwrap_err()
                .is_invalid_token()
        );
        assert!(verify(&config, GrantKind::AccessToken, &token).is_ok());
    }

    #[test]
    fn test_expired_rejected() {
        let config = config();
        let mut expired = claims(GrantKind::AccessToken, 60);
        expired.exp = OffsetDateTime::now_utc().unix_timestamp() - 120;
        expired.nbf = expired.exp - 35;

        let token = sign(&config, GrantKind::AccessToken, &expired).unwrap();
        assert!(
            verify(&config, GrantKind::AccessToken, &token)
                .unwrap_err()
                .is_invalid_token()
        );
    }

    #[test]
    fn test_not_yet_valid_rejected() {
        let config = config();
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let mut early = claims(GrantKind::RefreshToken, 600);
        early.nbf = now + 300;

        let token = sign(&config, GrantKind::RefreshToken, &early).unwrap();
        assert!(
            verify(&config, GrantKind::RefreshToken, &token)
                .unwrap_err()
                .is_invalid_token()
        );
    }

    #[test]
    fn test_issuer_mismatch_rejected() {
        let signer = ModelConfig::new("other-issuer", "at-secret", "rt-secret", "ac-secret");
        let verifier = config();

        let mut foreign = claims(GrantKind::AccessToken, 60);
        foreign.iss = "other-issuer".to_string();
        let token = sign(&signer, GrantKind::AccessToken, &foreign).unwrap();

        assert!(
            verify(&verifier, GrantKind::AccessToken, &token)
                .unwrap_err()
                .is_invalid_token()
        );
    }

    #[test]
    fn test_garbage_rejected() {
        let config = config();
        assert!(
            verify(&config, GrantKind::AccessToken, "abc")
                .unwrap_err()
                .is_invalid_token()
        );
    }
}
