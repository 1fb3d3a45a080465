use crate::id::EntityId;
use crate::model::User;

/// The authenticated identity behind a request.
///
/// Email and id always travel together, so a context either knows both or
/// neither.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    /// Id of the resolved user
    pub id: EntityId,
    /// Email the token was issued for
    pub email: String,
}

impl From<&User> for Caller {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
        }
    }
}
