//! AWS SDK configuration and client construction.

use anyhow::{Context, Result};
use aws_config::BehaviorVersion;
use aws_sdk_autoscaling::Client as AsgClient;
use aws_sdk_ec2::Client as Ec2Client;
use aws_sdk_sns::Client as SnsClient;
use tracing::{debug, info};

/// Clients for the three services a disruption test touches, sharing one SDK config.
#[derive(Clone)]
pub struct AwsClients {
    pub autoscaling: AsgClient,
    pub ec2: Ec2Client,
    pub sns: SnsClient,
    region: String,
}

impl AwsClients {
    /// Region resolution priority:
    /// 1. Explicit region from Config (--region CLI arg or AWS_REGION env var)
    /// 2. AWS SDK defaults (environment variables, ~/.aws/config, IMDS)
    ///
    /// Fails when neither source yields a region, since every later API call would fail too.
    pub async fn new(region: Option<&str>) -> Result<Self> {
        let config = Self::load_aws_config(region).await;
        let region_name = resolved_region(&config)?;

        info!(
            region = %region_name,
            "AWS clients initialized (autoscaling, ec2, sns)"
        );

        Ok(Self {
            autoscaling: AsgClient::new(&config),
            ec2: Ec2Client::new(&config),
            sns: SnsClient::new(&config),
            region: region_name,
        })
    }

    async fn load_aws_config(region: Option<&str>) -> aws_config::SdkConfig {
        match region {
            Some(r) => {
                info!(region = %r, "Using explicit AWS region from configuration");
                aws_config::defaults(BehaviorVersion::latest())
                    .region(aws_config::Region::new(r.to_string()))
                    .load()
                    .await
            }
            None => {
                debug!("Using default AWS region from AWS SDK (environment/credentials file/IMDS)");
                aws_config::load_defaults(BehaviorVersion::latest()).await
            }
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }
}

fn resolved_region(config: &aws_config::SdkConfig) -> Result<String> {
    config
        .region()
        .map(|r| r.as_ref().to_string())
        .context("AWS region could not be resolved; set AWS_REGION or pass --region")
}
