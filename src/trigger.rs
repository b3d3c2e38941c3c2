//! Invocation handler: inspect, select, terminate, report.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::asg::{GroupInspector, Member};
use crate::config::{Config, Settings};
use crate::ec2::Terminator;
use crate::error::DisruptionError;
use crate::report::Report;
use crate::selector::{RandomChooser, VictimChooser, select_victim};
use crate::sns::Reporter;

/// Body returned for every invocation that got past configuration validation.
pub const EXECUTED_BODY: &str = "Disruption trigger executed!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    Validating,
    Inspecting,
    Selecting,
    Terminating,
    Reporting,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::Validating => "validating",
            Self::Inspecting => "inspecting",
            Self::Selecting => "selecting",
            Self::Terminating => "terminating",
            Self::Reporting => "reporting",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Execution metadata supplied by whoever invoked the trigger. Only used for logging.
#[derive(Debug, Clone)]
pub struct InvocationContext {
    pub request_id: String,
    pub invoked_at: chrono::DateTime<chrono::Utc>,
}

impl InvocationContext {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            invoked_at: chrono::Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

impl InvocationResponse {
    pub fn executed() -> Self {
        Self {
            status_code: 200,
            body: EXECUTED_BODY.to_string(),
        }
    }

    pub fn misconfigured(message: String) -> Self {
        Self {
            status_code: 500,
            body: message,
        }
    }

    pub const fn is_success(&self) -> bool {
        self.status_code == 200
    }
}

pub struct DisruptionTrigger {
    config: Config,
    inspector: Arc<dyn GroupInspector>,
    terminator: Arc<dyn Terminator>,
    reporter: Arc<dyn Reporter>,
    chooser: Arc<dyn VictimChooser>,
}

impl DisruptionTrigger {
    pub fn new(
        config: Config,
        inspector: Arc<dyn GroupInspector>,
        terminator: Arc<dyn Terminator>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            config,
            inspector,
            terminator,
            reporter,
            chooser: Arc::new(RandomChooser),
        }
    }

    pub fn with_chooser(mut self, chooser: Arc<dyn VictimChooser>) -> Self {
        self.chooser = chooser;
        self
    }

    /// Run one disruption test.
    ///
    /// Returns 500 when configuration is missing, otherwise 200 no matter how the test went;
    /// the real outcome only reaches operators through the published report. The only
    /// error returned is a failed publish.
    pub async fn handle(
        &self,
        event: &serde_json::Value,
        ctx: &InvocationContext,
    ) -> Result<InvocationResponse, DisruptionError> {
        let span = info_span!("invocation", request_id = %ctx.request_id);
        self.run(event, ctx).instrument(span).await
    }

    async fn run(
        &self,
        event: &serde_json::Value,
        ctx: &InvocationContext,
    ) -> Result<InvocationResponse, DisruptionError> {
        let start_time = Instant::now();
        debug!(
            invoked_at = %ctx.invoked_at.to_rfc3339(),
            event = %event,
            "Received trigger payload"
        );

        transition(Phase::Init, Phase::Validating);
        let settings = match check_config(&self.config) {
            Ok(settings) => settings,
            Err(response) => return Ok(response),
        };

        let report = match self.disrupt(&settings).await {
            Ok(victim) => Report::success(
                &settings.subject,
                &settings.group_name,
                &victim,
                settings.dry_run,
            ),
            Err((phase, e)) => {
                error!(
                    autoscaling_group_name = %settings.group_name,
                    phase = %phase,
                    error = %e,
                    error_kind = e.kind(),
                    "Disruption test failed"
                );
                transition(phase, Phase::Reporting);
                Report::failure(&settings.subject, &settings.group_name, phase, &e)
            }
        };

        // Publish failures propagate to the caller
        let message_id = self
            .reporter
            .publish(&settings.topic_arn, &report.subject, &report.body)
            .await?;
        transition(Phase::Reporting, Phase::Done);

        info!(
            autoscaling_group_name = %settings.group_name,
            outcome = report.outcome.as_str(),
            message_id = %message_id,
            total_execution_seconds = format!("{:.2}", start_time.elapsed().as_secs_f64()),
            "Disruption trigger executed"
        );

        Ok(InvocationResponse::executed())
    }

    /// Inspect, select and terminate. On failure, returns the phase that failed.
    async fn disrupt(&self, settings: &Settings) -> Result<Member, (Phase, DisruptionError)> {
        transition(Phase::Validating, Phase::Inspecting);
        let members = self
            .inspector
            .describe(&settings.group_name)
            .await
            .map_err(|e| (Phase::Inspecting, e))?;

        transition(Phase::Inspecting, Phase::Selecting);
        let victim = select_victim(&settings.group_name, &members, self.chooser.as_ref())
            .map_err(|e| (Phase::Selecting, e))?
            .clone();

        info!(
            autoscaling_group_name = %settings.group_name,
            instance_id = %victim.instance_id,
            availability_zone = %victim.availability_zone,
            "Instance selected for termination"
        );

        transition(Phase::Selecting, Phase::Terminating);
        if settings.dry_run {
            warn!(
                instance_id = %victim.instance_id,
                availability_zone = %victim.availability_zone,
                action = "terminate",
                "DRY RUN: Would terminate instance (no action taken)"
            );
        } else {
            self.terminator
                .terminate(&victim.instance_id)
                .await
                .map_err(|e| (Phase::Terminating, e))?;
        }

        transition(Phase::Terminating, Phase::Reporting);
        Ok(victim)
    }
}

/// Validate configuration, turning a failure into the 500 response.
///
/// The binary calls this before building any AWS client so a misconfigured run
/// never reaches the SDK's region or credential providers.
pub fn check_config(config: &Config) -> Result<Settings, InvocationResponse> {
    config.validate().map_err(|e| {
        error!(
            error = %e,
            error_kind = e.kind(),
            "Invalid configuration, aborting without report"
        );
        InvocationResponse::misconfigured(e.to_string())
    })
}

fn transition(from: Phase, to: Phase) {
    debug!(from = %from, to = %to, "Invocation phase transition");
}
