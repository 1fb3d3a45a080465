//! Bearer tokens and password hashes.
//!
//! Tokens are compact HS256 JWTs: `base64url(header).base64url(claims).base64url(mac)`
//! where the MAC is HMAC-SHA256 over the first two segments. Only `email`,
//! `iat` and `exp` are carried. Password hashes are Argon2id PHC strings.

use argon2::{Algorithm, Argon2, Params, PasswordHasher as _, PasswordVerifier as _, Version};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::Utc;
use hmac::{Hmac, Mac};
use password_hash::{PasswordHash, SaltString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::config::Config;
use crate::error::{AuthError, CredentialError};
use crate::model::AuthToken;
use crate::secret::Secret;

type HmacSha256 = Hmac<Sha256>;

const HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

/// Claims carried by a bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Email of the user the token was issued to
    pub email: String,
    /// Issued-at, seconds since the epoch
    pub iat: i64,
    /// Expiry, seconds since the epoch
    pub exp: i64,
}

#[derive(Deserialize)]
struct Header {
    alg: String,
}

/// Issues and verifies bearer tokens.
pub trait TokenCodec: Send + Sync {
    /// Signs a token for `email`.
    fn issue(&self, email: &str) -> Result<AuthToken, CredentialError>;

    /// Verifies signature and expiry, returning the claims.
    ///
    /// # Errors
    ///
    /// [`AuthError::InvalidToken`] for any malformed, forged or expired token.
    fn decode(&self, token: &str) -> Result<Claims, AuthError>;
}

/// HS256 implementation of [`TokenCodec`].
///
/// ```
/// use std::time::Duration;
/// use marketplace_core::{HmacTokenCodec, TokenCodec};
///
/// let codec = HmacTokenCodec::new("k3y", Duration::from_secs(60));
/// let token = codec.issue("ada@example.com").unwrap();
/// assert_eq!(codec.decode(&token.token).unwrap().email, "ada@example.com");
///
/// let other = HmacTokenCodec::new("different", Duration::from_secs(60));
/// assert!(other.decode(&token.token).is_err());
/// ```
pub struct HmacTokenCodec {
    key: Secret<Vec<u8>>,
    ttl_secs: i64,
}

impl HmacTokenCodec {
    /// Creates a codec signing with `key`; tokens live for `ttl`.
    pub fn new(key: impl AsRef<[u8]>, ttl: std::time::Duration) -> Self {
        Self {
            key: Secret::new(key.as_ref().to_vec()),
            ttl_secs: i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX),
        }
    }

    /// Creates a codec from the configured secret and lifetime.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.token_secret.expose_secret(), config.token_ttl)
    }

    fn mac(&self) -> HmacSha256 {
        // HMAC accepts keys of any length.
        <HmacSha256 as Mac>::new_from_slice(self.key.expose_secret())
            .unwrap_or_else(|_| unreachable!("hmac keys have no length limit"))
    }

    fn sign(&self, claims: &Claims) -> Result<String, CredentialError> {
        let payload =
            serde_json::to_vec(claims).map_err(|e| CredentialError::Signing(e.to_string()))?;
        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(HEADER),
            URL_SAFE_NO_PAD.encode(payload)
        );

        let mut mac = self.mac();
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();

        Ok(format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(signature)))
    }

    fn verify(&self, token: &str, now: i64) -> Result<Claims, AuthError> {
        let mut parts = token.split('.');
        let (Some(header), Some(payload), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(AuthError::InvalidToken);
        };

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| AuthError::InvalidToken)?;
        let mut mac = self.mac();
        mac.update(header.as_bytes());
        mac.update(b".");
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| AuthError::InvalidToken)?;

        let header: Header = decode_segment(header)?;
        if header.alg != "HS256" {
            return Err(AuthError::InvalidToken);
        }
        let claims: Claims = decode_segment(payload)?;
        if claims.exp <= now {
            return Err(AuthError::InvalidToken);
        }
        Ok(claims)
    }
}

fn decode_segment<T: serde::de::DeserializeOwned>(segment: &str) -> Result<T, AuthError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| AuthError::InvalidToken)?;
    serde_json::from_slice(&bytes).map_err(|_| AuthError::InvalidToken)
}

impl TokenCodec for HmacTokenCodec {
    fn issue(&self, email: &str) -> Result<AuthToken, CredentialError> {
        let iat = Utc::now().timestamp();
        let claims = Claims {
            email: email.to_string(),
            iat,
            exp: iat.saturating_add(self.ttl_secs),
        };
        self.sign(&claims).map(|token| AuthToken { token })
    }

    fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify(token, Utc::now().timestamp())
    }
}

/// Argon2id password hashing.
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher {
    /// Hasher with explicit cost parameters.
    pub fn new(params: Params) -> Self {
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }

    /// Hashes `password` with a fresh random salt into a PHC string.
    pub fn hash(&self, password: &Secret<String>) -> Result<String, CredentialError> {
        let mut salt_bytes = [0u8; 16];
        getrandom::getrandom(&mut salt_bytes)
            .map_err(|e| CredentialError::Hashing(e.to_string()))?;
        let salt = SaltString::encode_b64(&salt_bytes)
            .map_err(|e| CredentialError::Hashing(e.to_string()))?;

        self.argon2
            .hash_password(password.expose_secret().as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| CredentialError::Hashing(e.to_string()))
    }

    /// Checks `password` against a stored PHC string. Unparsable hashes never match.
    pub fn verify(&self, hash: &str, password: &Secret<String>) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => self
                .argon2
                .verify_password(password.expose_secret().as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(Params::default())
    }
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher").finish_non_exhaustive()
    }
}
