//! Domain Layer
//!
//! Entities, value objects, and the ports the application layer drives.

pub mod entity;
pub mod repository;
pub mod services;
pub mod value_object;

// Re-exports
pub use entity::{
    ephemeral_token::{EphemeralToken, TokenData, TokenKind},
    identity::AuthIdentity,
    session::{Session, SessionSummary},
    user::{User, UserClient},
};
pub use repository::{SessionRepository, TtlStore, UserRepository};
pub use services::{EmailJob, EmailQueue, PasswordHashing};
