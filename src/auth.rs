use std::sync::Arc;

use crate::context::RequestContext;
use crate::credential::TokenCodec;
use crate::error::{AuthError, Error};
use crate::request::Caller;
use crate::store::UserStore;
use crate::web::{bearer_token, ExtractCredential};

/// Turns an inbound request's credential into a [`RequestContext`].
///
/// - no `Authorization` header: anonymous context, not an error
/// - undecodable, forged or expired token: [`AuthError::InvalidToken`]
/// - valid token for an email nobody owns: [`AuthError::UserNotFound`]
///
/// Identity is looked up fresh on every call. A user deleted between two
/// requests is rejected on the second one.
pub struct AuthResolver {
    tokens: Arc<dyn TokenCodec>,
    users: Arc<dyn UserStore>,
}

impl AuthResolver {
    /// Creates a resolver over a token codec and the user store.
    pub fn new(tokens: Arc<dyn TokenCodec>, users: Arc<dyn UserStore>) -> Self {
        Self { tokens, users }
    }

    /// Resolves the context for `request`.
    ///
    /// # Errors
    ///
    /// [`Error::Auth`] as described above, or [`Error::Store`] if the user
    /// lookup itself fails.
    pub async fn resolve<R>(&self, request: &R) -> Result<RequestContext, Error>
    where
        R: ExtractCredential + ?Sized,
    {
        let request_id = request.request_id();
        let Some(header) = request.authorization() else {
            return Ok(RequestContext::anonymous(request_id));
        };

        let claims = bearer_token(header)
            .ok_or(AuthError::InvalidToken)
            .and_then(|token| self.tokens.decode(token))
            .map_err(|err| {
                tracing::warn!(request_id, error = %err, "rejected credential");
                err
            })?;

        let Some(user) = self.users.find_by_email(&claims.email).await? else {
            tracing::warn!(request_id, "token names an unknown user");
            return Err(AuthError::UserNotFound.into());
        };

        tracing::debug!(request_id, user = %user.id, "resolved caller");
        Ok(RequestContext::authenticated(request_id, Caller::from(&user)))
    }
}
