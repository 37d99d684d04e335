use http::StatusCode;
use std::borrow::Cow;
use std::fmt;
use thiserror::Error;

/// The distinct reasons an authorization attempt can be rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthErrorKind {
    /// No `Authorization` header present.
    MissingHeader,
    /// Header present but not a well-formed `Bearer <token>` value.
    MalformedHeader,
    /// Token is not a structurally valid three-segment signed token.
    MalformedToken,
    /// Token declares an algorithm other than the pinned one.
    UnsupportedAlgorithm,
    /// Signature verification failed or the signing key could not be resolved.
    InvalidSignature,
    /// Token expiry is not in the future (after leeway).
    ExpiredToken,
    /// Issuer, audience or another registered claim does not match.
    InvalidClaims,
    /// Token carries no permission claim or an empty one.
    NoPermissionsGranted,
    /// Required permission absent from the token's permission set.
    PermissionNotFound,
    /// The provider's key set could not be fetched or parsed.
    KeySetUnavailable,
}

impl AuthErrorKind {
    /// Stable snake_case identifier, safe to log and to match on in dashboards.
    pub fn code(self) -> &'static str {
        match self {
            Self::MissingHeader => "authorization_header_missing",
            Self::MalformedHeader => "invalid_header",
            Self::MalformedToken => "malformed_token",
            Self::UnsupportedAlgorithm => "unsupported_algorithm",
            Self::InvalidSignature => "invalid_signature",
            Self::ExpiredToken => "token_expired",
            Self::InvalidClaims => "invalid_claims",
            Self::NoPermissionsGranted => "no_permissions_granted",
            Self::PermissionNotFound => "permission_not_found",
            Self::KeySetUnavailable => "key_set_unavailable",
        }
    }

    /// Status the boundary layer should answer with.
    ///
    /// Every kind maps to 401, policy denials included. Clients of this API
    /// rely on 401 for a missing permission, so this is not 403.
    pub fn status_hint(self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }
}

impl fmt::Display for AuthErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A rejected authorization attempt.
///
/// The description is shown to callers as-is, so it never contains token
/// material or anything read from the token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{description}")]
pub struct AuthError {
    kind: AuthErrorKind,
    description: Cow<'static, str>,
}

impl AuthError {
    pub fn new(kind: AuthErrorKind, description: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            description: description.into(),
        }
    }

    pub fn kind(&self) -> AuthErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn status_hint(&self) -> StatusCode {
        self.kind.status_hint()
    }

    pub fn missing_header() -> Self {
        Self::new(
            AuthErrorKind::MissingHeader,
            "Authorization header is expected.",
        )
    }

    pub fn wrong_scheme() -> Self {
        Self::new(
            AuthErrorKind::MalformedHeader,
            "Authorization header must start with \"Bearer\".",
        )
    }

    pub fn token_not_found() -> Self {
        Self::new(AuthErrorKind::MalformedHeader, "Token not found.")
    }

    pub fn not_bearer_token() -> Self {
        Self::new(
            AuthErrorKind::MalformedHeader,
            "Authorization header must be bearer token.",
        )
    }

    pub fn malformed_token() -> Self {
        Self::new(
            AuthErrorKind::MalformedToken,
            "Unable to parse authentication token.",
        )
    }

    pub fn unsupported_algorithm() -> Self {
        Self::new(
            AuthErrorKind::UnsupportedAlgorithm,
            "Token signing algorithm is not accepted.",
        )
    }

    pub fn unknown_key() -> Self {
        Self::new(
            AuthErrorKind::InvalidSignature,
            "Unable to find the appropriate key.",
        )
    }

    pub fn invalid_signature() -> Self {
        Self::new(AuthErrorKind::InvalidSignature, "Token signature is invalid.")
    }

    pub fn expired() -> Self {
        Self::new(AuthErrorKind::ExpiredToken, "Token expired.")
    }

    pub fn wrong_issuer() -> Self {
        Self::new(
            AuthErrorKind::InvalidClaims,
            "Incorrect claims. Please, check the issuer.",
        )
    }

    pub fn wrong_audience() -> Self {
        Self::new(
            AuthErrorKind::InvalidClaims,
            "Incorrect claims. Please, check the audience.",
        )
    }

    pub fn missing_claim() -> Self {
        Self::new(
            AuthErrorKind::InvalidClaims,
            "Token is missing a required claim.",
        )
    }

    pub fn not_yet_valid() -> Self {
        Self::new(AuthErrorKind::InvalidClaims, "Token is not valid yet.")
    }

    pub fn no_permissions() -> Self {
        Self::new(
            AuthErrorKind::NoPermissionsGranted,
            "Permissions not included in JWT.",
        )
    }

    pub fn permission_not_found() -> Self {
        Self::new(AuthErrorKind::PermissionNotFound, "Permission not found.")
    }

    pub fn key_set_unavailable() -> Self {
        Self::new(
            AuthErrorKind::KeySetUnavailable,
            "Unable to fetch signing keys.",
        )
    }
}

/// Invalid core configuration, reported once at startup.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Unknown signing algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("Symmetric signing algorithm {0} cannot be pinned, an asymmetric one is required")]
    SymmetricAlgorithm(String),

    #[error("Clock skew leeway of {0}s exceeds the {max}s limit", max = crate::settings::MAX_LEEWAY_SECS)]
    LeewayTooLarge(u64),

    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    #[error("Invalid key set URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Failed to build key set HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
