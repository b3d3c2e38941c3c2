use clap::Parser;

use crate::error::DisruptionError;

pub const SNS_TOPIC_ARN_ENV: &str = "SNS_TOPIC_ARN";
pub const AUTOSCALING_GROUP_NAME_ENV: &str = "AUTOSCALING_GROUP_NAME";

#[derive(Parser, Debug, Clone)]
#[command(
    name = "asg-failover-trigger",
    version,
    about = "Terminate a random healthy Auto Scaling Group instance and report the result to SNS"
)]
pub struct Config {
    /// SNS topic ARN that receives the test report
    #[arg(long, env = SNS_TOPIC_ARN_ENV)]
    pub sns_topic_arn: Option<String>,

    /// Auto Scaling Group to disrupt
    #[arg(long, env = AUTOSCALING_GROUP_NAME_ENV)]
    pub autoscaling_group_name: Option<String>,

    /// AWS region
    #[arg(long, env = "AWS_REGION")]
    pub region: Option<String>,

    /// Subject line of the SNS report
    #[arg(long, env = "REPORT_SUBJECT", default_value = "Test Report - ASG Failover")]
    pub report_subject: String,

    /// Dry run mode (select a victim but do not terminate it)
    #[arg(long, env = "DRY_RUN", default_value = "false")]
    pub dry_run: bool,

    /// Trigger payload as JSON, passed through to the handler untouched
    #[arg(long, default_value = "{}")]
    pub event: String,

    /// Log format: json or pretty
    #[arg(long, env = "LOG_FORMAT", default_value = "json")]
    pub log_format: String,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

/// Validated per-invocation settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub topic_arn: String,
    pub group_name: String,
    pub subject: String,
    pub dry_run: bool,
}

impl Config {
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Check the required values. Empty or whitespace-only values count as missing.
    pub fn validate(&self) -> Result<Settings, DisruptionError> {
        let topic_arn = non_empty(self.sns_topic_arn.as_deref());
        let group_name = non_empty(self.autoscaling_group_name.as_deref());

        match (topic_arn, group_name) {
            (Some(topic_arn), Some(group_name)) => Ok(Settings {
                topic_arn: topic_arn.to_string(),
                group_name: group_name.to_string(),
                subject: self.report_subject.clone(),
                dry_run: self.dry_run,
            }),
            (topic_arn, group_name) => {
                let mut missing = Vec::new();
                if group_name.is_none() {
                    missing.push(AUTOSCALING_GROUP_NAME_ENV);
                }
                if topic_arn.is_none() {
                    missing.push(SNS_TOPIC_ARN_ENV);
                }
                Err(DisruptionError::Configuration(format!(
                    "environment variables {} must be set",
                    missing.join(" and ")
                )))
            }
        }
    }

    pub fn display(&self, actual_region: &str) {
        let region_info = match &self.region {
            Some(region) => region.clone(),
            None => format!("auto-detect ({})", actual_region),
        };

        tracing::info!(
            autoscaling_group_name = %self.autoscaling_group_name.as_deref().unwrap_or("<unset>"),
            sns_topic_arn = %self.sns_topic_arn.as_deref().unwrap_or("<unset>"),
            report_subject = %self.report_subject,
            dry_run = self.dry_run,
            region = %region_info,
            log_format = %self.log_format,
            log_level = %self.log_level,
            "Configuration initialized"
        );

        if self.dry_run {
            tracing::warn!("DRY RUN MODE ENABLED - No instance will be terminated, only reported");
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
