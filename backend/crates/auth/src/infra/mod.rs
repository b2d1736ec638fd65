//! Infrastructure Layer
//!
//! Database implementations and external service integrations.

pub mod mail;
pub mod memory;
pub mod password;
pub mod postgres;

pub use mail::{ChannelEmailQueue, RecordingEmailQueue, spawn_email_worker};
pub use memory::MemoryAuthRepository;
pub use password::Argon2PasswordHasher;
pub use postgres::PgAuthRepository;
