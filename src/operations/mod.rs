//! The marketplace operations, wired through guard chains.
//!
//! | operation      | guards                                   |
//! |----------------|------------------------------------------|
//! | `create_sale`  | authentication                           |
//! | `update_sale`  | authentication, ownership                |
//! | `delete_sale`  | authentication, ownership                |
//! | `signup`       | none                                     |
//! | `login`        | none                                     |
//! | `current_user` | authentication                           |
//!
//! Reads (`list_sales`, `sale_by_id`, the field resolvers and the batch
//! loader) are public and bypass the chains.

mod sales;
mod users;

use std::sync::Arc;

use crate::auth::AuthResolver;
use crate::bus::{EventBus, Subscription, Topic};
use crate::chain::GuardChain;
use crate::config::Config;
use crate::context::RequestContext;
use crate::credential::{HmacTokenCodec, PasswordHasher, TokenCodec};
use crate::error::Error;
use crate::events::MarketplaceEvent;
use crate::guard::RequiresAuthentication;
use crate::id::EntityId;
use crate::model::{AuthToken, DeleteSale, LoginInput, Sale, SaleInput, SignupInput, UpdateSale, User};
use crate::ownership::{RequiresOwnership, SaleOwners};
use crate::store::{InMemorySaleStore, InMemoryUserStore, SaleStore, UserStore};
use crate::web::{self, ExtractCredential};

use sales::{CreateSale, RemoveSale, ReplaceSale};
use users::{CurrentUser, Login, Signup};

/// The services a [`Marketplace`] is built from.
///
/// Fields are public so an embedding can swap any one of them.
///
/// ```
/// use marketplace_core::{Collaborators, Config};
///
/// let config = Config::new("k3y");
/// let collaborators = Collaborators::in_memory(&config);
/// # let _ = collaborators;
/// ```
pub struct Collaborators {
    /// User records
    pub users: Arc<dyn UserStore>,
    /// Sale records
    pub sales: Arc<dyn SaleStore>,
    /// Bearer token issuing and checking
    pub tokens: Arc<dyn TokenCodec>,
    /// Password hashing
    pub passwords: PasswordHasher,
}

impl Collaborators {
    /// In-memory stores, an HMAC codec keyed from `config` and default
    /// hashing parameters.
    pub fn in_memory(config: &Config) -> Self {
        Self {
            users: Arc::new(InMemoryUserStore::new()),
            sales: Arc::new(InMemorySaleStore::new()),
            tokens: Arc::new(HmacTokenCodec::from_config(config)),
            passwords: PasswordHasher::default(),
        }
    }
}

/// Entry point for every marketplace operation.
///
/// Mutations run as [`GuardChain`]s built once at construction. Each call
/// takes the [`RequestContext`] of the request it serves, as produced by
/// [`resolve_context`](Self::resolve_context).
pub struct Marketplace {
    config: Config,
    users: Arc<dyn UserStore>,
    sales: Arc<dyn SaleStore>,
    bus: Arc<EventBus<MarketplaceEvent>>,
    resolver: AuthResolver,
    create_sale: GuardChain<SaleInput, Sale>,
    update_sale: GuardChain<UpdateSale, Sale>,
    delete_sale: GuardChain<DeleteSale, Sale>,
    signup: GuardChain<SignupInput, User>,
    login: GuardChain<LoginInput, AuthToken>,
    current_user: GuardChain<(), User>,
}

impl Marketplace {
    /// Wires the operations over `collaborators`, publishing on `bus`.
    pub fn new(
        config: Config,
        collaborators: Collaborators,
        bus: Arc<EventBus<MarketplaceEvent>>,
    ) -> Self {
        let Collaborators {
            users,
            sales,
            tokens,
            passwords,
        } = collaborators;
        let passwords = Arc::new(passwords);

        let create_sale = GuardChain::new(
            "create_sale",
            CreateSale {
                users: users.clone(),
                sales: sales.clone(),
                bus: bus.clone(),
            },
        )
        .require(RequiresAuthentication);

        let update_sale = GuardChain::new(
            "update_sale",
            ReplaceSale {
                sales: sales.clone(),
            },
        )
        .require(RequiresAuthentication)
        .require(RequiresOwnership::new(SaleOwners::new(sales.clone())));

        let delete_sale = GuardChain::new(
            "delete_sale",
            RemoveSale {
                users: users.clone(),
                sales: sales.clone(),
            },
        )
        .require(RequiresAuthentication)
        .require(RequiresOwnership::new(SaleOwners::new(sales.clone())));

        let signup = GuardChain::new(
            "signup",
            Signup {
                users: users.clone(),
                passwords: passwords.clone(),
                bus: bus.clone(),
            },
        );

        let login = GuardChain::new(
            "login",
            Login {
                users: users.clone(),
                passwords,
                tokens: tokens.clone(),
            },
        );

        let current_user = GuardChain::new(
            "current_user",
            CurrentUser {
                users: users.clone(),
            },
        )
        .require(RequiresAuthentication);

        Self {
            config,
            resolver: AuthResolver::new(tokens, users.clone()),
            users,
            sales,
            bus,
            create_sale,
            update_sale,
            delete_sale,
            signup,
            login,
            current_user,
        }
    }

    /// Resolves the context for an inbound request.
    pub async fn resolve_context<R>(&self, request: &R) -> Result<RequestContext, Error>
    where
        R: ExtractCredential + ?Sized,
    {
        web::resolve_context(request, &self.resolver).await
    }

    /// Creates a sale owned by the caller and publishes it.
    pub async fn create_sale(&self, ctx: &RequestContext, input: SaleInput) -> Result<Sale, Error> {
        self.create_sale.evaluate(input, ctx).await
    }

    /// Replaces a sale's listing. Owner only.
    pub async fn update_sale(&self, ctx: &RequestContext, args: UpdateSale) -> Result<Sale, Error> {
        self.update_sale.evaluate(args, ctx).await
    }

    /// Deletes a sale and returns it. Owner only.
    pub async fn delete_sale(&self, ctx: &RequestContext, args: DeleteSale) -> Result<Sale, Error> {
        self.delete_sale.evaluate(args, ctx).await
    }

    /// Registers a user and publishes it.
    pub async fn signup(&self, ctx: &RequestContext, input: SignupInput) -> Result<User, Error> {
        self.signup.evaluate(input, ctx).await
    }

    /// Issues a bearer token for valid credentials.
    pub async fn login(&self, ctx: &RequestContext, input: LoginInput) -> Result<AuthToken, Error> {
        self.login.evaluate(input, ctx).await
    }

    /// The caller's own user record.
    pub async fn current_user(&self, ctx: &RequestContext) -> Result<User, Error> {
        self.current_user.evaluate((), ctx).await
    }

    /// Sales, newest first. `limit` defaults to the configured page size.
    pub async fn list_sales(
        &self,
        ctx: &RequestContext,
        skip: Option<usize>,
        limit: Option<usize>,
    ) -> Result<Vec<Sale>, Error> {
        let skip = skip.unwrap_or(0);
        let limit = limit.unwrap_or(self.config.default_page_limit);
        let page = self.sales.list(skip, limit).await?;
        ctx.log()
            .debug(format_args!("listed {} sale(s) from offset {}", page.len(), skip));
        Ok(page)
    }

    /// A single sale.
    ///
    /// # Errors
    ///
    /// [`ValidationError::InvalidIdentifier`](crate::ValidationError::InvalidIdentifier)
    /// for a malformed id. A well-formed id with no sale is `Ok(None)`.
    pub async fn sale_by_id(&self, ctx: &RequestContext, id: &str) -> Result<Option<Sale>, Error> {
        let id = EntityId::parse(id).map_err(|err| {
            ctx.log().debug(format_args!("sale lookup with malformed id"));
            err
        })?;
        Ok(self.sales.find_by_id(&id).await?)
    }

    /// `User.sales` field resolver.
    pub async fn sales_of(&self, user: &User) -> Result<Vec<Sale>, Error> {
        Ok(self.sales.list_by_owner(&user.id).await?)
    }

    /// `Sale.user` field resolver.
    pub async fn owner_of_sale(&self, sale: &Sale) -> Result<Option<User>, Error> {
        Ok(self.users.find_by_id(&sale.user).await?)
    }

    /// Batch user loader. The result is aligned with `ids`.
    pub async fn users_by_ids(&self, ids: &[EntityId]) -> Result<Vec<Option<User>>, Error> {
        Ok(self.users.find_many(ids).await?)
    }

    /// Subscribes to newly created sales.
    pub fn sale_created(&self) -> Subscription<MarketplaceEvent> {
        self.bus.subscribe(&Topic::SALE_CREATED)
    }

    /// Subscribes to newly registered users.
    pub fn user_created(&self) -> Subscription<MarketplaceEvent> {
        self.bus.subscribe(&Topic::USER_CREATED)
    }

    /// The bus this marketplace publishes on.
    pub fn bus(&self) -> &Arc<EventBus<MarketplaceEvent>> {
        &self.bus
    }

    /// Ends every live subscription.
    pub fn shutdown(&self) {
        tracing::info!("marketplace shutting down");
        self.bus.shutdown();
    }
}

impl std::fmt::Debug for Marketplace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Marketplace")
            .field("config", &self.config)
            .field("bus", &self.bus)
            .finish_non_exhaustive()
    }
}
