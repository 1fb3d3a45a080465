//! Request adapter for mapping transport requests to marketplace types.

use std::collections::HashMap;

use super::extract::{ExtractCredential, AUTHORIZATION};

/// Framework-neutral view of an inbound request.
///
/// Holds the request id and headers as owned data. Header names are stored
/// lowercased, so lookups are case-insensitive. Transport integrations
/// build one of these (or implement [`ExtractCredential`] directly) and
/// hand it to the resolver.
///
/// # Examples
///
/// ```
/// use marketplace_core::web::{ExtractCredential, RequestAdapter};
///
/// let mut adapter = RequestAdapter::new("req-12345");
/// adapter.add_header("Authorization", "Bearer abc");
///
/// assert_eq!(adapter.header("authorization"), Some("Bearer abc"));
/// assert_eq!(adapter.authorization(), Some("Bearer abc"));
/// ```
#[derive(Debug, Clone)]
pub struct RequestAdapter {
    request_id: String,
    headers: HashMap<String, String>,
}

impl RequestAdapter {
    /// Creates an adapter with no headers.
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            headers: HashMap::new(),
        }
    }

    /// Adds a header, replacing any previous value of the same name.
    pub fn add_header(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
    }

    /// Builder form: sets `Authorization: Bearer <token>`.
    pub fn with_bearer(mut self, token: &str) -> Self {
        self.add_header(AUTHORIZATION, format!("Bearer {token}"));
        self
    }

    /// Looks up a header by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Number of headers carried.
    pub fn headers_count(&self) -> usize {
        self.headers.len()
    }
}

impl ExtractCredential for RequestAdapter {
    fn request_id(&self) -> &str {
        &self.request_id
    }

    fn authorization(&self) -> Option<&str> {
        self.header(AUTHORIZATION)
    }
}
