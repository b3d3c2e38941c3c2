use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{error, info};

use asg_failover_trigger::asg::AsgInspector;
use asg_failover_trigger::aws::AwsClients;
use asg_failover_trigger::config::Config;
use asg_failover_trigger::ec2::Ec2Terminator;
use asg_failover_trigger::logging;
use asg_failover_trigger::sns::SnsReporter;
use asg_failover_trigger::trigger::{DisruptionTrigger, InvocationContext, check_config};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_args();
    logging::init(&config.log_format, &config.log_level)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        commit = env!("GIT_COMMIT"),
        build_date = env!("BUILD_DATE"),
        "ASG failover trigger starting"
    );

    let event: serde_json::Value =
        serde_json::from_str(&config.event).context("Failed to parse --event as JSON")?;

    // Validate before any client exists: region lookup may already hit IMDS
    if let Err(response) = check_config(&config) {
        println!("{}", serde_json::to_string_pretty(&response)?);
        std::process::exit(1);
    }

    let clients = AwsClients::new(config.region.as_deref())
        .await
        .context("Failed to initialize AWS clients")?;
    config.display(clients.region());

    let trigger = DisruptionTrigger::new(
        config,
        Arc::new(AsgInspector::new(clients.autoscaling.clone())),
        Arc::new(Ec2Terminator::new(clients.ec2.clone(), clients.region())),
        Arc::new(SnsReporter::new(clients.sns.clone())),
    );

    let ctx = InvocationContext::new(format!(
        "{}-{}",
        chrono::Utc::now().format("%Y%m%dT%H%M%SZ"),
        std::process::id()
    ));

    let response = match trigger.handle(&event, &ctx).await {
        Ok(response) => response,
        Err(e) => {
            error!(
                request_id = %ctx.request_id,
                error = %e,
                "Failed to publish test report"
            );
            return Err(e.into());
        }
    };

    println!("{}", serde_json::to_string_pretty(&response)?);

    if !response.is_success() {
        error!(
            status_code = response.status_code,
            body = %response.body,
            "Trigger did not run"
        );
        std::process::exit(1);
    }

    Ok(())
}
