use async_graphql::SimpleObject;

use crate::gql::types::User;

/// An account together with a one-time password to hand to its owner.
#[derive(SimpleObject, Clone)]
pub struct TemporaryPasswordPayload {
    pub user: User,
    pub temporary_password: String,
}
