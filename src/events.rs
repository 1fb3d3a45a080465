use serde::Serialize;

use crate::bus::Topic;
use crate::model::{Sale, User};

/// Payloads carried on the marketplace bus.
///
/// Serializes the way subscription clients expect, keyed by field name:
/// `{"saleCreated": {...}}` or `{"userCreated": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum MarketplaceEvent {
    /// A sale was persisted
    #[serde(rename = "saleCreated")]
    SaleCreated(Sale),
    /// A user signed up
    #[serde(rename = "userCreated")]
    UserCreated(User),
}

impl MarketplaceEvent {
    /// The topic this event is published on.
    pub fn topic(&self) -> Topic {
        match self {
            MarketplaceEvent::SaleCreated(_) => Topic::SALE_CREATED,
            MarketplaceEvent::UserCreated(_) => Topic::USER_CREATED,
        }
    }

    /// The sale, if this is a sale event.
    pub fn as_sale(&self) -> Option<&Sale> {
        match self {
            MarketplaceEvent::SaleCreated(sale) => Some(sale),
            MarketplaceEvent::UserCreated(_) => None,
        }
    }

    /// The user, if this is a user event.
    pub fn as_user(&self) -> Option<&User> {
        match self {
            MarketplaceEvent::UserCreated(user) => Some(user),
            MarketplaceEvent::SaleCreated(_) => None,
        }
    }
}
