use async_trait::async_trait;
use aws_sdk_ec2::Client;
use tracing::info;

use crate::error::DisruptionError;

/// EC2 acknowledgement of a termination request. Not proof that the instance is gone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminationAck {
    pub instance_id: String,
    pub previous_state: Option<String>,
    pub current_state: Option<String>,
}

impl TerminationAck {
    pub fn accepted(instance_id: &str) -> Self {
        Self {
            instance_id: instance_id.to_string(),
            previous_state: None,
            current_state: None,
        }
    }
}

#[async_trait]
pub trait Terminator: Send + Sync {
    async fn terminate(&self, instance_id: &str) -> Result<TerminationAck, DisruptionError>;
}

pub struct Ec2Terminator {
    client: Client,
    region: String,
}

impl Ec2Terminator {
    pub fn new(client: Client, region: &str) -> Self {
        Self {
            client,
            region: region.to_string(),
        }
    }
}

#[async_trait]
impl Terminator for Ec2Terminator {
    async fn terminate(&self, instance_id: &str) -> Result<TerminationAck, DisruptionError> {
        info!(
            instance_id = %instance_id,
            region = %self.region,
            api_action = "TerminateInstances",
            "Sending terminate request to AWS EC2 API"
        );

        let response = self
            .client
            .terminate_instances()
            .instance_ids(instance_id)
            .send()
            .await
            .map_err(|e| DisruptionError::service("ec2:TerminateInstances", e))?;

        let change = response
            .terminating_instances()
            .iter()
            .find(|c| c.instance_id() == Some(instance_id));

        let ack = match change {
            Some(change) => TerminationAck {
                instance_id: instance_id.to_string(),
                previous_state: change
                    .previous_state()
                    .and_then(|s| s.name())
                    .map(|n| n.as_str().to_string()),
                current_state: change
                    .current_state()
                    .and_then(|s| s.name())
                    .map(|n| n.as_str().to_string()),
            },
            None => TerminationAck::accepted(instance_id),
        };

        info!(
            instance_id = %ack.instance_id,
            previous_state = ack.previous_state.as_deref().unwrap_or("unknown"),
            current_state = ack.current_state.as_deref().unwrap_or("unknown"),
            "Terminate request accepted"
        );

        Ok(ack)
    }
}
