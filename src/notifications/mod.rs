use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{info, instrument};

use crate::errors::ServiceError;

/// Outbound email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub subject: String,
    pub body: String,
    pub from: String,
    pub to: Vec<String>,
}

impl EmailMessage {
    pub fn new(
        subject: impl Into<String>,
        body: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
            from: from.into(),
            to: vec![to.into()],
        }
    }
}

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Notification has no recipients")]
    NoRecipients,
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

impl From<NotificationError> for ServiceError {
    fn from(err: NotificationError) -> Self {
        ServiceError::ExternalServiceError(err.to_string())
    }
}

/// Delivers notifications. Failures are reported to the caller, never retried.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<(), NotificationError>;
}

/// Writes messages to the log instead of a mail transport.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    #[instrument(skip(self, message), fields(subject = %message.subject))]
    async fn send(&self, message: EmailMessage) -> Result<(), NotificationError> {
        if message.to.iter().all(|to| to.trim().is_empty()) {
            return Err(NotificationError::NoRecipients);
        }
        info!(to = ?message.to, from = %message.from, body = %message.body, "email sent");
        Ok(())
    }
}

/// Keeps every sent message in memory; used by tests and local tooling.
#[derive(Debug, Default, Clone)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<EmailMessage>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, message: EmailMessage) -> Result<(), NotificationError> {
        if message.to.iter().all(|to| to.trim().is_empty()) {
            return Err(NotificationError::NoRecipients);
        }
        self.sent
            .lock()
            .map_err(|_| NotificationError::Delivery("outbox poisoned".to_string()))?
            .push(message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn recording_notifier_keeps_messages() {
        let notifier = RecordingNotifier::new();
        notifier
            .send(EmailMessage::new(
                "New Labourer Request",
                "body",
                "noreply@farm.com",
                "owner@greenpastures.com",
            ))
            .await
            .unwrap();

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, vec!["owner@greenpastures.com".to_string()]);
    }

    #[tokio::test]
    async fn blank_recipient_is_rejected() {
        let err = LogNotifier
            .send(EmailMessage::new("s", "b", "noreply@farm.com", " "))
            .await
            .unwrap_err();
        assert!(matches!(err, NotificationError::NoRecipients));
    }
}
