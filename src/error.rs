use thiserror::Error;

/// Errors surfaced by any marketplace operation.
///
/// Every variant carries a human-readable message. Denials and context
/// failures are returned as-is to the caller, never converted into an empty
/// success.
#[derive(Debug, Error)]
pub enum Error {
    /// The request credential could not be turned into an identity.
    #[error(transparent)]
    Auth(#[from] AuthError),
    /// A guard refused the operation.
    #[error(transparent)]
    Denied(#[from] GuardDenied),
    /// Arguments were malformed or referenced something missing.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// A persistence collaborator failed. Passed through unchanged.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Token issuance or password hashing failed.
    #[error(transparent)]
    Credential(#[from] CredentialError),
}

impl Error {
    /// Returns the denial reason if this error came from a guard.
    pub fn denial_reason(&self) -> Option<&str> {
        match self {
            Error::Denied(denied) => Some(denied.reason()),
            _ => None,
        }
    }
}

/// Failures while deriving the caller's identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Token missing its payload, badly signed, or expired.
    #[error("invalid or expired token")]
    InvalidToken,
    /// The token is valid but no user carries its email.
    #[error("user not found")]
    UserNotFound,
    /// Login with an unknown email or a wrong password.
    #[error("invalid credentials")]
    InvalidCredentials,
}

/// A guard's refusal, with the reason reported to the caller verbatim.
///
/// # Examples
///
/// ```
/// use marketplace_core::GuardDenied;
///
/// let denied = GuardDenied::new("must be authenticated");
/// assert_eq!(denied.to_string(), "must be authenticated");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct GuardDenied {
    reason: String,
}

impl GuardDenied {
    /// Creates a denial with the given reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// The reason the guard gave.
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Argument problems detected before or during an operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The value is not a well-formed entity identifier.
    #[error("invalid identifier")]
    InvalidIdentifier,
    /// The referenced entity does not exist.
    #[error("not found")]
    NotFound,
    /// Signup with an email that already belongs to a user.
    #[error("email already in use")]
    EmailInUse,
    /// A single input field broke one of its rules.
    #[error("invalid {field}: {reason}")]
    InvalidField {
        /// Input field name
        field: &'static str,
        /// Which rule failed
        reason: String,
    },
}

impl ValidationError {
    pub(crate) fn field(field: &'static str, reason: impl Into<String>) -> Self {
        ValidationError::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

/// Opaque failure reported by a persistence collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A uniqueness constraint was violated.
    #[error("store conflict: {0}")]
    Conflict(String),
    /// Anything else the backend reports.
    #[error("store failure: {0}")]
    Backend(String),
}

/// Failures of the credential primitives (hashing, token signing).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    /// Password hashing failed.
    #[error("password hashing failed: {0}")]
    Hashing(String),
    /// A token could not be produced.
    #[error("token issuance failed: {0}")]
    Signing(String),
}
