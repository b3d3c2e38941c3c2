use async_trait::async_trait;
use aws_sdk_sns::Client;
use tracing::info;

use crate::error::DisruptionError;

/// SNS rejects subjects longer than this.
const MAX_SUBJECT_LEN: usize = 100;

/// Publishes a report to a notification channel.
#[async_trait]
pub trait Reporter: Send + Sync {
    /// Returns the message id assigned by the channel.
    async fn publish(
        &self,
        channel: &str,
        subject: &str,
        body: &str,
    ) -> Result<String, DisruptionError>;
}

pub struct SnsReporter {
    client: Client,
}

impl SnsReporter {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Reporter for SnsReporter {
    async fn publish(
        &self,
        channel: &str,
        subject: &str,
        body: &str,
    ) -> Result<String, DisruptionError> {
        let subject = sanitize_subject(subject);

        info!(
            topic_arn = %channel,
            subject = %subject,
            api_action = "Publish",
            "Publishing report to SNS"
        );

        let response = self
            .client
            .publish()
            .topic_arn(channel)
            .subject(&subject)
            .message(body)
            .send()
            .await
            .map_err(|e| DisruptionError::service("sns:Publish", e))?;

        let message_id = response.message_id().unwrap_or("unknown").to_string();

        info!(
            topic_arn = %channel,
            message_id = %message_id,
            "Report published"
        );

        Ok(message_id)
    }
}

/// Make a subject SNS will accept: printable ASCII, single line, bounded length.
pub fn sanitize_subject(subject: &str) -> String {
    let cleaned: String = subject
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .filter(|c| c.is_ascii())
        .collect();

    let trimmed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    if trimmed.is_empty() {
        return "Test Report".to_string();
    }

    trimmed.chars().take(MAX_SUBJECT_LEN).collect()
}
