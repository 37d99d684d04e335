//! # casting-auth
//!
//! Bearer token validation and permission checks for the casting agency API.
//!
//! ## Components
//!
//! - **Keys:** Fetches and caches the identity provider's signing keys,
//!   refreshing them when a token names an unknown key id.
//! - **Verifier:** Checks a token's structure, pinned algorithm, signature
//!   and registered claims, yielding [`DecodedClaims`].
//! - **Permissions:** Exact-match check of a required permission against the
//!   token's permission set.
//! - **Gate:** Runs all of the above for one request and returns the claims
//!   or a single [`AuthError`].
//!
//! Every rejection maps to HTTP 401 through [`AuthError::status_hint`].

pub mod claims;
pub mod error;
pub mod gate;
pub mod keys;
pub mod permissions;
pub mod settings;
#[cfg(any(test, feature = "testutil"))]
pub mod testutil;
pub mod verifier;

pub use claims::{Audience, DecodedClaims, RawToken};
pub use error::{AuthError, AuthErrorKind, SettingsError};
pub use gate::AuthorizationGate;
pub use jsonwebtoken::Algorithm;
pub use keys::{HttpKeySource, KeyResolver, KeyResolverBuilder, KeySet, KeySource, SigningKey};
pub use permissions::enforce;
pub use settings::AuthSettings;
pub use verifier::{TokenVerifier, extract_bearer};
