//! # oauth2-jwt-model
//!
//! Stateless, JWT-backed grant model for OAuth2 authorization servers.
//!
//! The host's authorization flow produces three artifacts — access tokens,
//! refresh tokens, and authorization codes. This crate persists each one by
//! signing its claims into a compact JWT and resolves it back by verifying
//! and decoding that JWT: the token string *is* the storage record. There is
//! no database, no token table, and nothing to clean up.
//!
//! ## Modules
//!
//! - [`config`] - Model configuration: issuer, per-artifact secrets, claim key mappings
//! - [`claims`] - Claim derivation for the three grant kinds
//! - [`types`] - Raw records in, issued and logical records out
//! - [`model`] - The lifecycle adapter: issuance, retrieval, scope checks
//! - [`resolver`] - Host-supplied client lookup collaborator
//! - [`error`] - Error taxonomy
//!
//! ## Example
//!
//! ```ignore
//! use oauth2_jwt_model::{JwtGrantModel, ModelConfig};
//!
//! let model = JwtGrantModel::new(ModelConfig::new(
//!     "https://auth.example.com",
//!     "access-secret",
//!     "refresh-secret",
//!     "code-secret",
//! ));
//!
//! let issued = model.save_token(&record, &client, &user).await?;
//! let logical = model.get_access_token(&issued.access_token).await?;
//! ```

pub mod claims;
pub mod config;
pub mod error;
pub mod model;
pub mod resolver;
pub mod types;

mod jwt;

pub use claims::{Claims, GrantKind};
pub use config::ModelConfig;
pub use error::ModelError;
pub use model::JwtGrantModel;
pub use resolver::ClientResolver;
pub use types::{
    AccessToken, AuthorizationCode, AuthorizationCodeRecord, IssuedAuthorizationCode, IssuedToken,
    RefreshToken, TokenRecord,
};

/// Type alias for model operation results.
pub type ModelResult<T> = Result<T, ModelError>;
