//! Service Ports
//!
//! Synchronous collaborators held as trait objects: password hashing and
//! the outbound email queue.

use serde::Serialize;
use thiserror::Error;

use crate::domain::value_object::user_password::{PasswordCredentials, RawPassword};
use crate::error::AuthResult;

pub trait PasswordHashing: Send + Sync {
    /// Hash with a fresh per-user salt
    fn hash(&self, password: &RawPassword) -> AuthResult<PasswordCredentials>;

    /// Constant-time check of an unvalidated candidate
    fn verify(&self, candidate: &str, stored: &PasswordCredentials) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailTemplate {
    VerifyUserEmail,
    VerifyForgotPassword,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailRecipient {
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailData {
    pub email: String,
    pub name: String,
    pub token: String,
}

/// One outbound email, rendered later by the worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailJob {
    pub to: Vec<EmailRecipient>,
    pub subject: String,
    pub template: EmailTemplate,
    pub data: EmailData,
}

impl EmailJob {
    /// Single-recipient job where the salutation data mirrors the recipient
    pub fn to_user(
        email: &str,
        name: &str,
        subject: &str,
        template: EmailTemplate,
        token: String,
    ) -> Self {
        Self {
            to: vec![EmailRecipient {
                email: email.to_string(),
                name: name.to_string(),
            }],
            subject: subject.to_string(),
            template,
            data: EmailData {
                email: email.to_string(),
                name: name.to_string(),
                token,
            },
        }
    }
}

#[derive(Debug, Error)]
pub enum EmailQueueError {
    #[error("email queue is closed")]
    Closed,
}

/// Fire-and-forget dispatch
pub trait EmailQueue: Send + Sync {
    fn enqueue(&self, job: EmailJob) -> Result<(), EmailQueueError>;
}
