//! Shared Kernel - Domain-crossing minimal core
//!
//! This crate contains the "smallest core" of domain vocabulary:
//! - The unified error type ([`error::app_error::AppError`]) and its HTTP mapping
//! - Typed identifiers for users and sessions
//!
//! Anything here must mean the same thing in every crate that depends on it.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
