//! Authenticated Identity
//!
//! Bound to a single request by the auth middleware; never persisted.

use crate::domain::entity::{session::Session, user::UserClient};

#[derive(Debug, Clone)]
pub struct AuthIdentity {
    pub user: UserClient,
    pub session: Session,
}
