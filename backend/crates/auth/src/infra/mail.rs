//! Email Queue Adapters
//!
//! Jobs are handed to a background worker over an unbounded channel so
//! request handlers never wait on delivery.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::domain::services::{EmailJob, EmailQueue, EmailQueueError};

/// Producer side of the email channel
#[derive(Debug, Clone)]
pub struct ChannelEmailQueue {
    sender: mpsc::UnboundedSender<EmailJob>,
}

impl ChannelEmailQueue {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<EmailJob>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl EmailQueue for ChannelEmailQueue {
    fn enqueue(&self, job: EmailJob) -> Result<(), EmailQueueError> {
        self.sender.send(job).map_err(|_| EmailQueueError::Closed)
    }
}

/// Drain the channel until every sender is dropped.
///
/// Delivery is out of scope here; each job is logged without its token.
pub fn spawn_email_worker(mut receiver: mpsc::UnboundedReceiver<EmailJob>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(job) = receiver.recv().await {
            let recipients: Vec<&str> = job.to.iter().map(|r| r.email.as_str()).collect();
            tracing::info!(
                template = ?job.template,
                subject = %job.subject,
                recipients = ?recipients,
                "Email dispatched"
            );
        }
        tracing::debug!("Email worker stopped");
    })
}

/// Keeps every job in memory. Used by tests to read issued codes.
#[derive(Debug, Clone, Default)]
pub struct RecordingEmailQueue {
    jobs: Arc<Mutex<Vec<EmailJob>>>,
}

impl RecordingEmailQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn jobs(&self) -> Vec<EmailJob> {
        self.jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Token carried by the most recent job
    pub fn last_token(&self) -> Option<String> {
        self.jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .map(|job| job.data.token.clone())
    }
}

impl EmailQueue for RecordingEmailQueue {
    fn enqueue(&self, job: EmailJob) -> Result<(), EmailQueueError> {
        self.jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(job);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::services::EmailTemplate;

    fn job(token: &str) -> EmailJob {
        EmailJob::to_user(
            "ada@example.com",
            "Ada Lovelace",
            "Verify your email",
            EmailTemplate::VerifyUserEmail,
            token.to_string(),
        )
    }

    #[tokio::test]
    async fn test_channel_queue_delivers_in_order() {
        let (queue, mut receiver) = ChannelEmailQueue::new();
        queue.enqueue(job("first")).unwrap();
        queue.enqueue(job("second")).unwrap();

        assert_eq!(receiver.recv().await.unwrap().data.token, "first");
        assert_eq!(receiver.recv().await.unwrap().data.token, "second");
    }

    #[tokio::test]
    async fn test_closed_channel_reports_error() {
        let (queue, receiver) = ChannelEmailQueue::new();
        drop(receiver);
        assert!(matches!(queue.enqueue(job("x")), Err(EmailQueueError::Closed)));
    }

    #[tokio::test]
    async fn test_worker_exits_when_senders_drop() {
        let (queue, receiver) = ChannelEmailQueue::new();
        let worker = spawn_email_worker(receiver);
        queue.enqueue(job("x")).unwrap();
        drop(queue);
        worker.await.unwrap();
    }

    #[test]
    fn test_recording_queue_keeps_last_token() {
        let queue = RecordingEmailQueue::new();
        assert_eq!(queue.last_token(), None);
        queue.enqueue(job("a")).unwrap();
        queue.enqueue(job("b")).unwrap();
        assert_eq!(queue.jobs().len(), 2);
        assert_eq!(queue.last_token().as_deref(), Some("b"));
    }
}
