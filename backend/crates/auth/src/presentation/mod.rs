//! Presentation Layer
//!
//! HTTP handlers, DTOs, extractors, router, and middleware.

pub mod dto;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod router;

pub use extract::{CurrentIdentity, RequestClient, ValidatedJson, ValidatedPath};
pub use handlers::{AuthAppState, AuthBackend};
pub use middleware::{require_auth, require_auth_allow_unverified};
pub use router::auth_router;
