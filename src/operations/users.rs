//! Account handlers.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::bus::{EventBus, Topic};
use crate::chain::Handler;
use crate::context::RequestContext;
use crate::credential::{PasswordHasher, TokenCodec};
use crate::error::{AuthError, Error, GuardDenied, StoreError, ValidationError};
use crate::events::MarketplaceEvent;
use crate::guard::MUST_BE_AUTHENTICATED;
use crate::model::{AuthToken, LoginInput, SignupInput, User};
use crate::store::UserStore;
use crate::validate::normalize_email;

pub(crate) struct Signup {
    pub(crate) users: Arc<dyn UserStore>,
    pub(crate) passwords: Arc<PasswordHasher>,
    pub(crate) bus: Arc<EventBus<MarketplaceEvent>>,
}

#[async_trait]
impl Handler<SignupInput, User> for Signup {
    async fn handle(&self, input: SignupInput, ctx: &RequestContext) -> Result<User, Error> {
        let new_user = input.validate()?;
        if self.users.find_by_email(&new_user.email).await?.is_some() {
            return Err(ValidationError::EmailInUse.into());
        }

        let hash = self.passwords.hash(&input.password)?;
        let user = match self.users.insert(new_user.into_user(hash, Utc::now())).await {
            Ok(user) => user,
            // Lost a race with a concurrent signup for the same email.
            Err(StoreError::Conflict(_)) => return Err(ValidationError::EmailInUse.into()),
            Err(err) => return Err(err.into()),
        };

        self.bus
            .publish(&Topic::USER_CREATED, MarketplaceEvent::UserCreated(user.clone()));
        ctx.log().info(format_args!("user {} signed up", user.id));
        Ok(user)
    }
}

/// Exchanges an email and password for a bearer token.
///
/// Every failure collapses into [`AuthError::InvalidCredentials`].
pub(crate) struct Login {
    pub(crate) users: Arc<dyn UserStore>,
    pub(crate) passwords: Arc<PasswordHasher>,
    pub(crate) tokens: Arc<dyn TokenCodec>,
}

#[async_trait]
impl Handler<LoginInput, AuthToken> for Login {
    async fn handle(&self, input: LoginInput, ctx: &RequestContext) -> Result<AuthToken, Error> {
        let Ok(email) = normalize_email(&input.email) else {
            return Err(AuthError::InvalidCredentials.into());
        };
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .filter(|user| self.passwords.verify(&user.password_hash, &input.password))
            .ok_or(AuthError::InvalidCredentials)?;

        let token = self.tokens.issue(&user.email)?;
        ctx.log().info(format_args!("issued token for user {}", user.id));
        Ok(token)
    }
}

pub(crate) struct CurrentUser {
    pub(crate) users: Arc<dyn UserStore>,
}

#[async_trait]
impl Handler<(), User> for CurrentUser {
    async fn handle(&self, _args: (), ctx: &RequestContext) -> Result<User, Error> {
        let id = ctx
            .caller_id()
            .ok_or_else(|| GuardDenied::new(MUST_BE_AUTHENTICATED))?;
        self.users
            .find_by_id(&id)
            .await?
            .ok_or_else(|| AuthError::UserNotFound.into())
    }
}
