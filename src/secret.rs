use std::fmt;

use serde::{Deserialize, Deserializer};

/// A wrapper that keeps credentials out of logs and error output.
///
/// Passwords arriving in signup/login input and the token signing key are
/// held as `Secret`. The wrapped value is only reachable through
/// [`expose_secret`](Self::expose_secret).
///
/// - No `Deref`, `AsRef`, `Clone` or `Serialize`
/// - `Debug` and `Display` always print `[REDACTED]`
///
/// # Examples
///
/// ```
/// use marketplace_core::Secret;
///
/// let password = Secret::new("hunter2-hunter2".to_string());
/// assert_eq!(format!("{:?}", password), "[REDACTED]");
/// assert_eq!(password.expose_secret(), "hunter2-hunter2");
/// ```
// Do NOT derive Clone or Serialize; both would let the value escape unredacted.
pub struct Secret<T> {
    inner: T,
}

impl<T> Secret<T> {
    /// Wraps a sensitive value.
    pub fn new(value: T) -> Self {
        Self { inner: value }
    }

    /// Explicitly exposes the value. Never log the result.
    pub fn expose_secret(&self) -> &T {
        &self.inner
    }
}

impl<T> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl<T> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

// Inputs deserialize straight into a Secret so the plain value never sits in
// a loggable struct field.
impl<'de, T: Deserialize<'de>> Deserialize<'de> for Secret<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Secret::new)
    }
}

impl From<String> for Secret<String> {
    fn from(value: String) -> Self {
        Secret::new(value)
    }
}

impl From<&str> for Secret<String> {
    fn from(value: &str) -> Self {
        Secret::new(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_redacts_debug_and_display() {
        let key = Secret::new("signing-key".to_string());
        assert_eq!(format!("{:?}", key), "[REDACTED]");
        assert_eq!(format!("{}", key), "[REDACTED]");
    }

    #[test]
    fn secret_redacts_inside_containing_structs() {
        #[derive(Debug)]
        #[allow(dead_code)]
        struct Login {
            email: String,
            password: Secret<String>,
        }

        let login = Login {
            email: "a@b.io".to_string(),
            password: "correct horse".into(),
        };
        let out = format!("{:?}", login);
        assert!(out.contains("a@b.io"));
        assert!(!out.contains("correct horse"));
    }

    #[test]
    fn secret_deserializes_from_plain_value() {
        let secret: Secret<String> = serde_json::from_str("\"s3cret\"").unwrap();
        assert_eq!(secret.expose_secret(), "s3cret");
    }
}
