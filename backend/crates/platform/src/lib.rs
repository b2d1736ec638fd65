//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (random keys, HMAC-SHA256, Base64)
//! - Compact signed tokens (HS256)
//! - Password hashing (Argon2id, NIST SP 800-63B length policy)
//! - Cookie building and parsing
//! - Client IP / User-Agent extraction
//! - Human-readable duration parsing for configuration

pub mod client;
pub mod cookie;
pub mod crypto;
pub mod duration;
pub mod jwt;
pub mod password;
