//! User and sale records plus the inputs that create them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::id::EntityId;
use crate::secret::Secret;
use crate::validate::{check_coordinate, check_password, normalize_category, normalize_email, TextRule};

/// A registered marketplace user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Identifier
    pub id: EntityId,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Unique, lowercased login email
    pub email: String,
    /// PHC-format password hash; never serialized
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Ids of sales this user owns
    pub sales: Vec<EntityId>,
    /// Administrative flag
    pub is_admin: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

/// The descriptive part of a sale listing, already validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    /// Street address
    pub address: String,
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
    /// Kind of sale (garage, estate, ...)
    #[serde(rename = "type")]
    pub kind: String,
    /// Lowercased category labels
    pub categories: Vec<String>,
    /// Free text description
    pub desc: String,
    /// Year of the sale
    pub year: i32,
}

/// A sale listing owned by one user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    /// Identifier
    pub id: EntityId,
    /// Listing fields
    #[serde(flatten)]
    pub listing: Listing,
    /// Owning user
    pub user: EntityId,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

impl Sale {
    /// Creates a new sale owned by `owner`, stamped at `now`.
    pub fn new(listing: Listing, owner: EntityId, now: DateTime<Utc>) -> Self {
        Self {
            id: EntityId::generate(),
            listing,
            user: owner,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Client input for creating or replacing a listing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SaleInput {
    /// Street address
    pub address: String,
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
    /// Kind of sale
    #[serde(rename = "type")]
    pub kind: String,
    /// Category labels
    #[serde(default)]
    pub categories: Vec<String>,
    /// Description
    pub desc: String,
    /// Year of the sale
    pub year: i32,
}

impl SaleInput {
    /// Applies the field rules and produces a [`Listing`].
    pub fn validate(self) -> Result<Listing, ValidationError> {
        Ok(Listing {
            address: TextRule::SHORT.clean("address", &self.address)?,
            latitude: check_coordinate("latitude", self.latitude, 90.0)?,
            longitude: check_coordinate("longitude", self.longitude, 180.0)?,
            kind: TextRule::SHORT.clean("type", &self.kind)?,
            categories: self
                .categories
                .iter()
                .map(|c| normalize_category(c))
                .collect::<Result<_, _>>()?,
            desc: TextRule::LONG.clean("desc", &self.desc)?,
            year: self.year,
        })
    }
}

/// Arguments of `updateSale`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateSale {
    /// Target sale id, as sent by the client
    pub id: String,
    /// Replacement listing
    pub input: SaleInput,
}

/// Arguments of `deleteSale`.
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteSale {
    /// Target sale id, as sent by the client
    pub id: String,
}

/// Client input for `signup`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupInput {
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Login email
    pub email: String,
    /// Plain password, hashed before storage
    pub password: Secret<String>,
}

/// Signup fields after validation; the password stays with the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    /// Trimmed given name
    pub first_name: String,
    /// Trimmed family name
    pub last_name: String,
    /// Normalized email
    pub email: String,
}

impl SignupInput {
    /// Validates names, email and password.
    pub fn validate(&self) -> Result<NewUser, ValidationError> {
        let new_user = NewUser {
            first_name: TextRule::SHORT.clean("firstName", &self.first_name)?,
            last_name: TextRule::SHORT.clean("lastName", &self.last_name)?,
            email: normalize_email(&self.email)?,
        };
        check_password(&self.password)?;
        Ok(new_user)
    }
}

impl NewUser {
    /// Builds the stored record around an already computed hash.
    pub fn into_user(self, password_hash: String, now: DateTime<Utc>) -> User {
        User {
            id: EntityId::generate(),
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            password_hash,
            sales: Vec::new(),
            is_admin: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Client input for `login`.
#[derive(Debug, Deserialize)]
pub struct LoginInput {
    /// Login email
    pub email: String,
    /// Plain password
    pub password: Secret<String>,
}

/// A signed bearer token returned by `login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthToken {
    /// Compact token, sent back as `Authorization: Bearer <token>`
    pub token: String,
}
