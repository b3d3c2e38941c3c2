//! Auto Scaling Group membership lookup.

use async_trait::async_trait;
use aws_sdk_autoscaling::Client as AsgClient;
use aws_sdk_autoscaling::types::AutoScalingGroup;
use std::fmt;
use tracing::{debug, info, warn};

use crate::error::DisruptionError;

/// Lifecycle state as reported by Auto Scaling for one instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleState {
    Pending,
    Quarantined,
    InService,
    Terminating,
    Terminated,
    Detaching,
    Detached,
    EnteringStandby,
    Standby,
    /// Hook sub-states (`Pending:Wait`, `Terminating:Proceed`, ...) and warm pool states.
    Other(String),
}

impl LifecycleState {
    pub fn parse(value: &str) -> Self {
        match value {
            "Pending" => Self::Pending,
            "Quarantined" => Self::Quarantined,
            "InService" => Self::InService,
            "Terminating" => Self::Terminating,
            "Terminated" => Self::Terminated,
            "Detaching" => Self::Detaching,
            "Detached" => Self::Detached,
            "EnteringStandby" => Self::EnteringStandby,
            "Standby" => Self::Standby,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "Pending",
            Self::Quarantined => "Quarantined",
            Self::InService => "InService",
            Self::Terminating => "Terminating",
            Self::Terminated => "Terminated",
            Self::Detaching => "Detaching",
            Self::Detached => "Detached",
            Self::EnteringStandby => "EnteringStandby",
            Self::Standby => "Standby",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
    Unknown(String),
}

impl HealthStatus {
    pub fn parse(value: &str) -> Self {
        match value {
            "Healthy" => Self::Healthy,
            "Unhealthy" => Self::Unhealthy,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Healthy => "Healthy",
            Self::Unhealthy => "Unhealthy",
            Self::Unknown(s) => s,
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of one group member at invocation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub instance_id: String,
    pub lifecycle_state: LifecycleState,
    pub health_status: HealthStatus,
    pub availability_zone: String,
    pub instance_type: Option<String>,
}

impl Member {
    /// Only members that are both in service and healthy may be terminated.
    pub fn is_eligible(&self) -> bool {
        self.lifecycle_state == LifecycleState::InService
            && self.health_status == HealthStatus::Healthy
    }

    /// Returns `None` for instances without an id, which could never be terminated.
    fn from_sdk(instance: &aws_sdk_autoscaling::types::Instance) -> Option<Self> {
        let Some(instance_id) = instance.instance_id().filter(|id| !id.is_empty()) else {
            warn!(
                availability_zone = instance.availability_zone().unwrap_or("unknown"),
                "Skipping Auto Scaling instance without an instance id"
            );
            return None;
        };

        Some(Self {
            instance_id: instance_id.to_string(),
            lifecycle_state: instance
                .lifecycle_state()
                .map(|s| LifecycleState::parse(s.as_str()))
                .unwrap_or_else(|| LifecycleState::Other("unknown".to_string())),
            health_status: HealthStatus::parse(instance.health_status().unwrap_or("unknown")),
            availability_zone: instance.availability_zone().unwrap_or("unknown").to_string(),
            instance_type: instance.instance_type().map(|s| s.to_string()),
        })
    }
}

/// Convert a DescribeAutoScalingGroups result into members of `group_name`.
///
/// The API filters by name, so an empty group list means the group does not exist.
pub fn members_from_groups(
    group_name: &str,
    groups: &[AutoScalingGroup],
) -> Result<Vec<Member>, DisruptionError> {
    let group = groups
        .iter()
        .find(|g| g.auto_scaling_group_name() == Some(group_name))
        .or_else(|| groups.first())
        .ok_or_else(|| DisruptionError::NotFound(group_name.to_string()))?;

    let members: Vec<Member> = group.instances().iter().filter_map(Member::from_sdk).collect();

    info!(
        autoscaling_group_name = %group_name,
        desired_capacity = group.desired_capacity().unwrap_or(0),
        member_count = members.len(),
        "Fetched Auto Scaling Group members"
    );

    Ok(members)
}

/// Reads the current members of an instance group.
#[async_trait]
pub trait GroupInspector: Send + Sync {
    async fn describe(&self, group_name: &str) -> Result<Vec<Member>, DisruptionError>;
}

pub struct AsgInspector {
    client: AsgClient,
}

impl AsgInspector {
    pub fn new(client: AsgClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl GroupInspector for AsgInspector {
    async fn describe(&self, group_name: &str) -> Result<Vec<Member>, DisruptionError> {
        debug!(
            autoscaling_group_name = %group_name,
            api_action = "DescribeAutoScalingGroups",
            "Describing Auto Scaling Group"
        );

        let response = self
            .client
            .describe_auto_scaling_groups()
            .auto_scaling_group_names(group_name)
            .send()
            .await
            .map_err(|e| DisruptionError::service("autoscaling:DescribeAutoScalingGroups", e))?;

        members_from_groups(group_name, response.auto_scaling_groups())
    }
}
