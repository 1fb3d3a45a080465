use std::sync::Arc;

use async_trait::async_trait;

use crate::context::RequestContext;
use crate::error::{Error, StoreError};
use crate::guard::{Guard, GuardResult, MUST_BE_AUTHENTICATED};
use crate::id::EntityId;
use crate::store::SaleStore;

/// Denial reason for a malformed target id.
pub const INVALID_IDENTIFIER: &str = "invalid identifier";
/// Denial reason for a target that does not exist.
pub const NOT_FOUND: &str = "not found";
/// Denial reason for a caller who does not own the target.
pub const NOT_OWNER: &str = "not authorized as owner";

/// Arguments that name a target entity.
pub trait TargetId {
    /// Raw id as received from the client.
    fn target_id(&self) -> &str;
}

/// Resolves the owner of an entity.
#[async_trait]
pub trait OwnedLookup: Send + Sync {
    /// Owner of `id`, or `None` if the entity does not exist.
    async fn owner_of(&self, id: &EntityId) -> Result<Option<EntityId>, StoreError>;
}

/// [`OwnedLookup`] over any [`SaleStore`] trait object.
pub struct SaleOwners(Arc<dyn SaleStore>);

impl SaleOwners {
    /// Wraps a sale store.
    pub fn new(sales: Arc<dyn SaleStore>) -> Self {
        Self(sales)
    }
}

#[async_trait]
impl OwnedLookup for SaleOwners {
    async fn owner_of(&self, id: &EntityId) -> Result<Option<EntityId>, StoreError> {
        Ok(self.0.find_by_id(id).await?.map(|sale| sale.user))
    }
}

/// Proceeds only when the caller owns the target entity.
///
/// Must follow [`RequiresAuthentication`](crate::RequiresAuthentication) in
/// a chain. On its own, an anonymous caller is denied as unauthenticated.
/// Ownership is read fresh on every call with one lookup, and a malformed id
/// is denied without any lookup.
pub struct RequiresOwnership<L> {
    lookup: L,
}

impl<L: OwnedLookup> RequiresOwnership<L> {
    /// Creates the guard over `lookup`.
    pub fn new(lookup: L) -> Self {
        Self { lookup }
    }
}

#[async_trait]
impl<A, L> Guard<A> for RequiresOwnership<L>
where
    A: TargetId + Sync,
    L: OwnedLookup,
{
    fn name(&self) -> &'static str {
        "requires_ownership"
    }

    async fn check(&self, args: &A, ctx: &RequestContext) -> Result<GuardResult, Error> {
        let Some(caller_id) = ctx.caller_id() else {
            return Ok(GuardResult::deny(MUST_BE_AUTHENTICATED));
        };
        let Ok(target) = EntityId::parse(args.target_id()) else {
            return Ok(GuardResult::deny(INVALID_IDENTIFIER));
        };

        Ok(match self.lookup.owner_of(&target).await? {
            None => GuardResult::deny(NOT_FOUND),
            Some(owner) if owner == caller_id => GuardResult::Proceed,
            Some(_) => GuardResult::deny(NOT_OWNER),
        })
    }
}
