//! Model error types.
//!
//! Verification failures are deliberately coarse: whatever sub-check rejected
//! a token (signature, algorithm, expiry, not-before, issuer, grant kind),
//! the caller sees the same [`ModelError::InvalidToken`]. The specific cause
//! is logged internally but never reported, so a caller cannot probe which
//! check a forged token got past.

/// Errors that can occur while issuing or resolving grant tokens.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// A required claim key mapping is unset while the current record, client,
    /// or user shape needs it. Indicates a deployment misconfiguration and is
    /// never caught internally.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },

    /// The token failed verification. Carries no cause on purpose.
    #[error("Invalid token")]
    InvalidToken,

    /// The audience claim could not be resolved to a registered client.
    #[error("Invalid client")]
    InvalidClient,

    /// Signing a claim set failed at issuance.
    #[error("Signing error: {message}")]
    Signing {
        /// Description of the signing failure.
        message: String,
    },
}

impl ModelError {
    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new `Signing` error.
    #[must_use]
    pub fn signing(message: impl Into<String>) -> Self {
        Self::Signing {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a token verification failure.
    #[must_use]
    pub fn is_invalid_token(&self) -> bool {
        matches!(self, Self::InvalidToken)
    }

    /// Returns `true` if this is a client resolution failure.
    #[must_use]
    pub fn is_invalid_client(&self) -> bool {
        matches!(self, Self::InvalidClient)
    }

    /// Returns `true` if this is a configuration error.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    /// Returns `true` if this is a server-side error (5xx category) rather
    /// than a problem with the presented token or client.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Configuration { .. } | Self::Signing { .. })
    }

    /// Returns the OAuth 2.0 error code for this error, for hosts translating
    /// model failures into protocol-level rejections.
    #[must_use]
    pub fn oauth_error_code(&self) -> &'static str {
        match self {
            Self::InvalidToken => "invalid_token",
            Self::InvalidClient => "invalid_client",
            Self::Configuration { .. } => "server_error",
            Self::Signing { .. } => "server_error",
        }
    }
}
