//! Extraction boundary trait for transport integration.

/// Name of the credential header, compared case-insensitively.
pub const AUTHORIZATION: &str = "authorization";

/// Exposes what the [`AuthResolver`](crate::AuthResolver) needs from an
/// inbound request.
///
/// Transport layers (HTTP handlers, websocket connection params) implement
/// this for their own request type. Nothing here authenticates: it only
/// hands over the raw header.
///
/// # Examples
///
/// ```
/// use marketplace_core::web::ExtractCredential;
///
/// struct WsConnectionParams {
///     id: String,
///     auth: Option<String>,
/// }
///
/// impl ExtractCredential for WsConnectionParams {
///     fn request_id(&self) -> &str {
///         &self.id
///     }
///
///     fn authorization(&self) -> Option<&str> {
///         self.auth.as_deref()
///     }
/// }
/// ```
pub trait ExtractCredential {
    /// Correlation id for logs.
    fn request_id(&self) -> &str;

    /// Raw `Authorization` header value, if the request carried one.
    fn authorization(&self) -> Option<&str>;
}

/// Pulls the token out of a `Bearer <token>` header value.
///
/// The scheme is matched case-insensitively. Anything else, including a
/// bare scheme with no token, yields `None`.
///
/// ```
/// use marketplace_core::web::bearer_token;
///
/// assert_eq!(bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
/// assert_eq!(bearer_token("bearer   abc"), Some("abc"));
/// assert_eq!(bearer_token("Bearer"), None);
/// assert_eq!(bearer_token("Basic dXNlcjpwdw=="), None);
/// ```
pub fn bearer_token(header: &str) -> Option<&str> {
    let mut parts = header.split_whitespace();
    let scheme = parts.next()?;
    let token = parts.next()?;
    if !scheme.eq_ignore_ascii_case("bearer") || parts.next().is_some() {
        return None;
    }
    Some(token)
}
