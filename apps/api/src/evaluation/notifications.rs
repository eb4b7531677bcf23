//! HR notification channels used by the notify branch of Graph 2.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::models::evaluation::Tag;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("{channel} notification failed: {message}")]
    Delivery {
        channel: &'static str,
        message: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub recipient: String,
    pub job_id: Uuid,
    pub job_title: String,
    pub candidate_id: Uuid,
    pub candidate_name: String,
    pub candidate_email: String,
    pub score: u8,
    pub tag: Tag,
    pub message: String,
    pub cv_link: String,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    fn channel(&self) -> &'static str;

    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Writes the notification as a structured log event. A notification without
/// a recipient is undeliverable.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn channel(&self) -> &'static str {
        "log"
    }

    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        if notification.recipient.trim().is_empty() {
            return Err(NotifyError::Delivery {
                channel: self.channel(),
                message: format!("job {} has no HR recipient", notification.job_id),
            });
        }
        info!(
            recipient = %notification.recipient,
            job_id = %notification.job_id,
            candidate_id = %notification.candidate_id,
            score = notification.score,
            tag = %notification.tag,
            "HR notification: {} for {}",
            notification.message,
            notification.job_title
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification(recipient: &str) -> Notification {
        Notification {
            recipient: recipient.to_string(),
            job_id: Uuid::new_v4(),
            job_title: "Backend Engineer".to_string(),
            candidate_id: Uuid::new_v4(),
            candidate_name: "Ada Lovelace".to_string(),
            candidate_email: "ada@example.com".to_string(),
            score: 88,
            tag: Tag::HighPotential,
            message: "High potential candidate".to_string(),
            cv_link: String::new(),
        }
    }

    #[tokio::test]
    async fn test_log_notifier_delivers_to_recipient() {
        assert!(LogNotifier.notify(&notification("hr@example.com")).await.is_ok());
    }

    #[tokio::test]
    async fn test_log_notifier_rejects_missing_recipient() {
        let err = LogNotifier.notify(&notification("  ")).await.unwrap_err();
        assert!(err.to_string().starts_with("log notification failed"));
        assert!(err.to_string().contains("no HR recipient"));
    }
}
