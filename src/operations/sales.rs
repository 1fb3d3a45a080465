//! Sale mutation handlers.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::bus::{EventBus, Topic};
use crate::chain::Handler;
use crate::context::RequestContext;
use crate::error::{AuthError, Error, GuardDenied, ValidationError};
use crate::events::MarketplaceEvent;
use crate::guard::MUST_BE_AUTHENTICATED;
use crate::id::EntityId;
use crate::model::{DeleteSale, Sale, SaleInput, UpdateSale};
use crate::ownership::TargetId;
use crate::store::{SaleStore, UserStore};

impl TargetId for UpdateSale {
    fn target_id(&self) -> &str {
        &self.id
    }
}

impl TargetId for DeleteSale {
    fn target_id(&self) -> &str {
        &self.id
    }
}

fn caller_id(ctx: &RequestContext) -> Result<EntityId, Error> {
    ctx.caller_id()
        .ok_or_else(|| GuardDenied::new(MUST_BE_AUTHENTICATED).into())
}

/// Persists a new sale for the caller, links it to the caller, then
/// announces it on [`Topic::SALE_CREATED`].
pub(crate) struct CreateSale {
    pub(crate) users: Arc<dyn UserStore>,
    pub(crate) sales: Arc<dyn SaleStore>,
    pub(crate) bus: Arc<EventBus<MarketplaceEvent>>,
}

#[async_trait]
impl Handler<SaleInput, Sale> for CreateSale {
    async fn handle(&self, input: SaleInput, ctx: &RequestContext) -> Result<Sale, Error> {
        let owner = caller_id(ctx)?;
        let listing = input.validate()?;

        if self.users.find_by_id(&owner).await?.is_none() {
            return Err(AuthError::UserNotFound.into());
        }

        let sale = self.sales.save(Sale::new(listing, owner, Utc::now())).await?;
        if !self.users.add_sale(&owner, &sale.id).await? {
            // Owner vanished between the check and the link.
            self.sales.delete_by_id(&sale.id).await?;
            return Err(AuthError::UserNotFound.into());
        }

        let delivered = self
            .bus
            .publish(&Topic::SALE_CREATED, MarketplaceEvent::SaleCreated(sale.clone()));
        ctx.log().info(format_args!(
            "created sale {} ({} subscriber(s) notified)",
            sale.id, delivered
        ));
        Ok(sale)
    }
}

/// Replaces the listing fields of a sale the caller owns.
pub(crate) struct ReplaceSale {
    pub(crate) sales: Arc<dyn SaleStore>,
}

#[async_trait]
impl Handler<UpdateSale, Sale> for ReplaceSale {
    async fn handle(&self, args: UpdateSale, ctx: &RequestContext) -> Result<Sale, Error> {
        let id = EntityId::parse(&args.id)?;
        let listing = args.input.validate()?;

        let Some(saved) = self.sales.update_listing(&id, listing, Utc::now()).await? else {
            return Err(ValidationError::NotFound.into());
        };
        ctx.log().info(format_args!("updated sale {}", saved.id));
        Ok(saved)
    }
}

/// Deletes a sale the caller owns and unlinks it from the owner.
pub(crate) struct RemoveSale {
    pub(crate) users: Arc<dyn UserStore>,
    pub(crate) sales: Arc<dyn SaleStore>,
}

#[async_trait]
impl Handler<DeleteSale, Sale> for RemoveSale {
    async fn handle(&self, args: DeleteSale, ctx: &RequestContext) -> Result<Sale, Error> {
        let id = EntityId::parse(&args.id)?;

        let Some(sale) = self.sales.delete_by_id(&id).await? else {
            return Err(ValidationError::NotFound.into());
        };
        if !self.users.remove_sale(&sale.user, &sale.id).await? {
            ctx.log()
                .warn(format_args!("owner {} of sale {} is gone", sale.user, sale.id));
        }

        ctx.log().info(format_args!("deleted sale {}", sale.id));
        Ok(sale)
    }
}
