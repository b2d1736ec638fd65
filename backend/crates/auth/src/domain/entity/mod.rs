//! Entity Module

pub mod ephemeral_token;
pub mod identity;
pub mod session;
pub mod user;
