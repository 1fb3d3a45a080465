//! Persistence collaborators.
//!
//! The traits describe what the guards and handlers need from a user and a
//! sale store. The stores provide their own synchronization, and every method
//! is atomic for the single record it touches. The in-memory implementations
//! back the tests and can be used when embedding without a database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::error::StoreError;
use crate::id::EntityId;
use crate::model::{Listing, Sale, User};
use crate::ownership::OwnedLookup;

/// User records.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Finds a user by (normalized) email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Finds a user by id.
    async fn find_by_id(&self, id: &EntityId) -> Result<Option<User>, StoreError>;

    /// Batch lookup. The result is aligned with `ids`, with `None` for misses.
    async fn find_many(&self, ids: &[EntityId]) -> Result<Vec<Option<User>>, StoreError>;

    /// Inserts a new user. Fails with [`StoreError::Conflict`] on a taken email.
    async fn insert(&self, user: User) -> Result<User, StoreError>;

    /// Appends `sale` to the user's sale list. Returns `false` if the user is gone.
    async fn add_sale(&self, user: &EntityId, sale: &EntityId) -> Result<bool, StoreError>;

    /// Removes `sale` from the user's sale list. Returns `false` if the user is gone.
    async fn remove_sale(&self, user: &EntityId, sale: &EntityId) -> Result<bool, StoreError>;
}

/// Sale records.
#[async_trait]
pub trait SaleStore: Send + Sync {
    /// Finds a sale by id.
    async fn find_by_id(&self, id: &EntityId) -> Result<Option<Sale>, StoreError>;

    /// Inserts or replaces a sale, returning what was stored.
    async fn save(&self, sale: Sale) -> Result<Sale, StoreError>;

    /// Replaces the listing of an existing sale in one atomic step and
    /// stamps `updated_at`. Returns `None` if the sale is gone; never inserts.
    async fn update_listing(
        &self,
        id: &EntityId,
        listing: Listing,
        now: DateTime<Utc>,
    ) -> Result<Option<Sale>, StoreError>;

    /// Deletes a sale, returning it if it existed.
    async fn delete_by_id(&self, id: &EntityId) -> Result<Option<Sale>, StoreError>;

    /// Newest first, skipping `skip` and returning at most `limit`.
    async fn list(&self, skip: usize, limit: usize) -> Result<Vec<Sale>, StoreError>;

    /// All sales owned by `owner`, newest first.
    async fn list_by_owner(&self, owner: &EntityId) -> Result<Vec<Sale>, StoreError>;
}

/// In-memory [`UserStore`].
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<Vec<User>>,
}

impl InMemoryUserStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes a user outright. Mirrors an out-of-band account deletion.
    pub fn remove(&self, id: &EntityId) -> Option<User> {
        let mut users = self.users.write();
        let pos = users.iter().position(|u| u.id == *id)?;
        Some(users.remove(pos))
    }

    /// Number of stored users.
    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }

    fn edit_sales<F>(&self, user: &EntityId, edit: F) -> bool
    where
        F: FnOnce(&mut Vec<EntityId>),
    {
        let mut users = self.users.write();
        match users.iter_mut().find(|u| u.id == *user) {
            Some(found) => {
                edit(&mut found.sales);
                found.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: &EntityId) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().iter().find(|u| u.id == *id).cloned())
    }

    async fn find_many(&self, ids: &[EntityId]) -> Result<Vec<Option<User>>, StoreError> {
        let users = self.users.read();
        Ok(ids
            .iter()
            .map(|id| users.iter().find(|u| u.id == *id).cloned())
            .collect())
    }

    async fn insert(&self, user: User) -> Result<User, StoreError> {
        let mut users = self.users.write();
        if users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict(format!("email {} taken", user.email)));
        }
        users.push(user.clone());
        Ok(user)
    }

    async fn add_sale(&self, user: &EntityId, sale: &EntityId) -> Result<bool, StoreError> {
        Ok(self.edit_sales(user, |sales| sales.push(*sale)))
    }

    async fn remove_sale(&self, user: &EntityId, sale: &EntityId) -> Result<bool, StoreError> {
        Ok(self.edit_sales(user, |sales| sales.retain(|s| s != sale)))
    }
}

/// In-memory [`SaleStore`]. Keeps insertion order, which doubles as age order.
#[derive(Debug, Default)]
pub struct InMemorySaleStore {
    sales: RwLock<Vec<Sale>>,
}

impl InMemorySaleStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sales.
    pub fn len(&self) -> usize {
        self.sales.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.sales.read().is_empty()
    }
}

#[async_trait]
impl SaleStore for InMemorySaleStore {
    async fn find_by_id(&self, id: &EntityId) -> Result<Option<Sale>, StoreError> {
        Ok(self.sales.read().iter().find(|s| s.id == *id).cloned())
    }

    async fn save(&self, sale: Sale) -> Result<Sale, StoreError> {
        let mut sales = self.sales.write();
        match sales.iter_mut().find(|s| s.id == sale.id) {
            Some(existing) => *existing = sale.clone(),
            None => sales.push(sale.clone()),
        }
        Ok(sale)
    }

    async fn update_listing(
        &self,
        id: &EntityId,
        listing: Listing,
        now: DateTime<Utc>,
    ) -> Result<Option<Sale>, StoreError> {
        let mut sales = self.sales.write();
        Ok(sales.iter_mut().find(|s| s.id == *id).map(|sale| {
            sale.listing = listing;
            sale.updated_at = now;
            sale.clone()
        }))
    }

    async fn delete_by_id(&self, id: &EntityId) -> Result<Option<Sale>, StoreError> {
        let mut sales = self.sales.write();
        Ok(sales
            .iter()
            .position(|s| s.id == *id)
            .map(|pos| sales.remove(pos)))
    }

    async fn list(&self, skip: usize, limit: usize) -> Result<Vec<Sale>, StoreError> {
        Ok(self
            .sales
            .read()
            .iter()
            .rev()
            .skip(skip)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn list_by_owner(&self, owner: &EntityId) -> Result<Vec<Sale>, StoreError> {
        Ok(self
            .sales
            .read()
            .iter()
            .rev()
            .filter(|s| s.user == *owner)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl OwnedLookup for InMemorySaleStore {
    async fn owner_of(&self, id: &EntityId) -> Result<Option<EntityId>, StoreError> {
        Ok(self.sales.read().iter().find(|s| s.id == *id).map(|s| s.user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Listing, NewUser};

    fn user(email: &str) -> User {
        NewUser {
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            email: email.to_string(),
        }
        .into_user("hash".to_string(), Utc::now())
    }

    fn sale(owner: EntityId, address: &str) -> Sale {
        Sale::new(
            Listing {
                address: address.to_string(),
                latitude: 0.0,
                longitude: 0.0,
                kind: "garage".to_string(),
                categories: Vec::new(),
                desc: "desc".to_string(),
                year: 2024,
            },
            owner,
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn user_insert_rejects_duplicate_email() {
        let store = InMemoryUserStore::new();
        store.insert(user("a@b.io")).await.unwrap();
        let err = store.insert(user("a@b.io")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn sale_list_is_newest_first_with_paging() {
        let store = InMemorySaleStore::new();
        let owner = EntityId::generate();
        for address in ["first", "second", "third"] {
            store.save(sale(owner, address)).await.unwrap();
        }

        let page: Vec<String> = store
            .list(1, 5)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.listing.address)
            .collect();
        assert_eq!(page, vec!["second", "first"]);
    }

    #[tokio::test]
    async fn add_and_remove_sale_edit_user_list() {
        let users = InMemoryUserStore::new();
        let u = users.insert(user("a@b.io")).await.unwrap();
        let s = EntityId::generate();

        assert!(users.add_sale(&u.id, &s).await.unwrap());
        assert_eq!(users.find_by_id(&u.id).await.unwrap().unwrap().sales, vec![s]);
        assert!(users.remove_sale(&u.id, &s).await.unwrap());
        assert!(users.find_by_id(&u.id).await.unwrap().unwrap().sales.is_empty());
        assert!(!users.add_sale(&EntityId::generate(), &s).await.unwrap());
    }

    #[tokio::test]
    async fn find_many_preserves_request_order() {
        let users = InMemoryUserStore::new();
        let a = users.insert(user("a@b.io")).await.unwrap();
        let b = users.insert(user("b@b.io")).await.unwrap();
        let missing = EntityId::generate();

        let found = users.find_many(&[b.id, missing, a.id]).await.unwrap();
        assert_eq!(found[0].as_ref().map(|u| u.id), Some(b.id));
        assert!(found[1].is_none());
        assert_eq!(found[2].as_ref().map(|u| u.id), Some(a.id));
    }

    #[tokio::test]
    async fn update_listing_edits_in_place_and_never_resurrects() {
        let store = InMemorySaleStore::new();
        let s = store.save(sale(EntityId::generate(), "old")).await.unwrap();
        let later = s.updated_at + chrono::Duration::seconds(5);

        let mut listing = s.listing.clone();
        listing.address = "new".to_string();
        let updated = store
            .update_listing(&s.id, listing.clone(), later)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.listing.address, "new");
        assert_eq!(updated.updated_at, later);
        assert_eq!(updated.created_at, s.created_at);

        store.delete_by_id(&s.id).await.unwrap();
        assert_eq!(store.update_listing(&s.id, listing, later).await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn owner_lookup_reports_sale_owner() {
        let store = InMemorySaleStore::new();
        let owner = EntityId::generate();
        let s = store.save(sale(owner, "x")).await.unwrap();
        assert_eq!(store.owner_of(&s.id).await.unwrap(), Some(owner));
        assert_eq!(store.owner_of(&EntityId::generate()).await.unwrap(), None);
    }
}
