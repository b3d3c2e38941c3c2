//! Human-readable test reports sent to the notification channel.

use crate::asg::Member;
use crate::error::DisruptionError;
use crate::trigger::Phase;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub subject: String,
    pub body: String,
    pub outcome: Outcome,
}

impl Report {
    /// Report for a member that was terminated, or would have been in dry run mode.
    pub fn success(subject: &str, group_name: &str, victim: &Member, dry_run: bool) -> Self {
        let (header, action) = if dry_run {
            (
                "🧪 Auto Scaling Group Test Completed (DRY RUN)",
                "Selected instance (not terminated, dry run)",
            )
        } else {
            (
                "🔔 Auto Scaling Group Test Completed Successfully 🚀",
                "Terminated instance to simulate failure",
            )
        };

        let mut body = String::new();
        body.push_str(header);
        body.push_str("\n\nAction Performed:\n");
        body.push_str(&format!("- {}: {}\n", action, victim.instance_id));
        body.push_str(&format!(
            "- Availability Zone: {}\n",
            victim.availability_zone
        ));
        if let Some(instance_type) = &victim.instance_type {
            body.push_str(&format!("- Instance Type: {}\n", instance_type));
        }
        body.push('\n');

        if dry_run {
            body.push_str(&format!(
                "No termination request was sent. Disable DRY_RUN to let the Auto Scaling Group '{}' replace this instance.\n",
                group_name
            ));
        } else {
            body.push_str(&format!(
                "The Auto Scaling Group '{}' will now detect this termination and launch a new instance to maintain the desired capacity.\n",
                group_name
            ));
        }

        Self {
            subject: subject.to_string(),
            body,
            outcome: Outcome::Success,
        }
    }

    pub fn failure(subject: &str, group_name: &str, phase: Phase, error: &DisruptionError) -> Self {
        let body = format!(
            "🚨 ERROR while testing Auto Scaling Group '{}' (failed while {}):\n\n{}\n",
            group_name, phase, error
        );

        Self {
            subject: subject.to_string(),
            body,
            outcome: Outcome::Failure,
        }
    }
}
