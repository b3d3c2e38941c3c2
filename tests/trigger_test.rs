use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use asg_failover_trigger::asg::{GroupInspector, HealthStatus, LifecycleState, Member};
use asg_failover_trigger::config::Config;
use asg_failover_trigger::ec2::{TerminationAck, Terminator};
use asg_failover_trigger::error::DisruptionError;
use asg_failover_trigger::selector::VictimChooser;
use asg_failover_trigger::sns::Reporter;
use asg_failover_trigger::trigger::{DisruptionTrigger, EXECUTED_BODY, InvocationContext};

const TOPIC: &str = "arn:aws:sns:us-east-1:123456789012:asg-reports";
const GROUP: &str = "asg-web";

enum Inspection {
    Members(Vec<Member>),
    NotFound,
    Unavailable,
}

struct FakeInspector {
    result: Inspection,
    calls: Mutex<Vec<String>>,
}

impl FakeInspector {
    fn new(result: Inspection) -> Arc<Self> {
        Arc::new(Self {
            result,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GroupInspector for FakeInspector {
    async fn describe(&self, group_name: &str) -> Result<Vec<Member>, DisruptionError> {
        self.calls.lock().unwrap().push(group_name.to_string());
        match &self.result {
            Inspection::Members(members) => Ok(members.clone()),
            Inspection::NotFound => Err(DisruptionError::NotFound(group_name.to_string())),
            Inspection::Unavailable => Err(DisruptionError::service(
                "autoscaling:DescribeAutoScalingGroups",
                "Rate exceeded",
            )),
        }
    }
}

struct FakeTerminator {
    fail: bool,
    calls: Mutex<Vec<String>>,
}

impl FakeTerminator {
    fn new(fail: bool) -> Arc<Self> {
        Arc::new(Self {
            fail,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Terminator for FakeTerminator {
    async fn terminate(&self, instance_id: &str) -> Result<TerminationAck, DisruptionError> {
        self.calls.lock().unwrap().push(instance_id.to_string());
        if self.fail {
            return Err(DisruptionError::service(
                "ec2:TerminateInstances",
                "You are not authorized to perform this operation",
            ));
        }
        Ok(TerminationAck::accepted(instance_id))
    }
}

#[derive(Debug, Clone)]
struct Published {
    channel: String,
    subject: String,
    body: String,
}

struct FakeReporter {
    fail: bool,
    calls: Mutex<Vec<Published>>,
}

impl FakeReporter {
    fn new(fail: bool) -> Arc<Self> {
        Arc::new(Self {
            fail,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<Published> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Reporter for FakeReporter {
    async fn publish(
        &self,
        channel: &str,
        subject: &str,
        body: &str,
    ) -> Result<String, DisruptionError> {
        self.calls.lock().unwrap().push(Published {
            channel: channel.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        if self.fail {
            return Err(DisruptionError::service("sns:Publish", "Topic does not exist"));
        }
        Ok("msg-1".to_string())
    }
}

struct FixedChooser(usize);

impl VictimChooser for FixedChooser {
    fn choose(&self, _len: usize) -> usize {
        self.0
    }
}

struct Harness {
    inspector: Arc<FakeInspector>,
    terminator: Arc<FakeTerminator>,
    reporter: Arc<FakeReporter>,
    trigger: DisruptionTrigger,
}

fn config(topic: Option<&str>, group: Option<&str>) -> Config {
    Config {
        sns_topic_arn: topic.map(String::from),
        autoscaling_group_name: group.map(String::from),
        region: None,
        report_subject: "Test Report - ASG Failover".to_string(),
        dry_run: false,
        event: "{}".to_string(),
        log_format: "json".to_string(),
        log_level: "info".to_string(),
    }
}

fn harness(
    config: Config,
    inspection: Inspection,
    terminate_fails: bool,
    publish_fails: bool,
) -> Harness {
    let inspector = FakeInspector::new(inspection);
    let terminator = FakeTerminator::new(terminate_fails);
    let reporter = FakeReporter::new(publish_fails);

    let trigger = DisruptionTrigger::new(
        config,
        inspector.clone(),
        terminator.clone(),
        reporter.clone(),
    );

    Harness {
        inspector,
        terminator,
        reporter,
        trigger,
    }
}

fn member(id: &str, state: LifecycleState, health: HealthStatus, az: &str) -> Member {
    Member {
        instance_id: id.to_string(),
        lifecycle_state: state,
        health_status: health,
        availability_zone: az.to_string(),
        instance_type: None,
    }
}

fn web_group() -> Vec<Member> {
    vec![
        member("i-1", LifecycleState::InService, HealthStatus::Healthy, "us-east-1a"),
        member("i-2", LifecycleState::Terminating, HealthStatus::Healthy, "us-east-1b"),
    ]
}

fn ctx() -> InvocationContext {
    InvocationContext::new("test-request")
}

fn event() -> serde_json::Value {
    serde_json::json!({ "source": "aws.events" })
}

#[tokio::test]
async fn test_missing_channel_returns_500_without_calls() {
    let h = harness(config(None, Some(GROUP)), Inspection::Members(web_group()), false, false);

    let response = h.trigger.handle(&event(), &ctx()).await.unwrap();

    assert_eq!(response.status_code, 500);
    assert!(response.body.contains("SNS_TOPIC_ARN"));
    assert!(h.inspector.calls().is_empty());
    assert!(h.terminator.calls().is_empty());
    assert!(h.reporter.calls().is_empty());
}

#[tokio::test]
async fn test_empty_group_name_returns_500_without_calls() {
    let h = harness(config(Some(TOPIC), Some("")), Inspection::Members(web_group()), false, false);

    let response = h.trigger.handle(&event(), &ctx()).await.unwrap();

    assert_eq!(response.status_code, 500);
    assert!(response.body.contains("AUTOSCALING_GROUP_NAME"));
    assert!(h.inspector.calls().is_empty());
    assert!(h.terminator.calls().is_empty());
    assert!(h.reporter.calls().is_empty());
}

#[tokio::test]
async fn test_terminates_only_eligible_member() {
    let h = harness(
        config(Some(TOPIC), Some(GROUP)),
        Inspection::Members(web_group()),
        false,
        false,
    );

    let response = h.trigger.handle(&event(), &ctx()).await.unwrap();

    assert_eq!(response.status_code, 200);
    assert_eq!(response.body, EXECUTED_BODY);
    assert_eq!(h.inspector.calls(), vec![GROUP.to_string()]);
    assert_eq!(h.terminator.calls(), vec!["i-1".to_string()]);

    let published = h.reporter.calls();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].channel, TOPIC);
    assert_eq!(published[0].subject, "Test Report - ASG Failover");
    assert!(published[0].body.contains("i-1"));
    assert!(published[0].body.contains("us-east-1a"));
    assert!(published[0].body.contains("Completed Successfully"));
}

#[tokio::test]
async fn test_chooser_picks_within_eligible_subset() {
    let members = vec![
        member("i-a", LifecycleState::InService, HealthStatus::Unhealthy, "us-east-1a"),
        member("i-b", LifecycleState::InService, HealthStatus::Healthy, "us-east-1b"),
        member("i-c", LifecycleState::Pending, HealthStatus::Healthy, "us-east-1c"),
        member("i-d", LifecycleState::InService, HealthStatus::Healthy, "us-east-1d"),
    ];
    let h = harness(config(Some(TOPIC), Some(GROUP)), Inspection::Members(members), false, false);
    let trigger = h.trigger.with_chooser(Arc::new(FixedChooser(1)));

    trigger.handle(&event(), &ctx()).await.unwrap();

    assert_eq!(h.terminator.calls(), vec!["i-d".to_string()]);
    let published = h.reporter.calls();
    assert_eq!(published.len(), 1);
    assert!(published[0].body.contains("i-d"));
    assert!(published[0].body.contains("us-east-1d"));
}

#[tokio::test]
async fn test_random_selection_never_leaves_eligible_set() {
    let members = vec![
        member("i-a", LifecycleState::InService, HealthStatus::Healthy, "us-east-1a"),
        member("i-b", LifecycleState::Standby, HealthStatus::Healthy, "us-east-1b"),
        member("i-c", LifecycleState::InService, HealthStatus::Healthy, "us-east-1c"),
        member("i-d", LifecycleState::InService, HealthStatus::Unhealthy, "us-east-1d"),
    ];

    for _ in 0..50 {
        let h = harness(
            config(Some(TOPIC), Some(GROUP)),
            Inspection::Members(members.clone()),
            false,
            false,
        );
        h.trigger.handle(&event(), &ctx()).await.unwrap();

        let calls = h.terminator.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0] == "i-a" || calls[0] == "i-c", "picked {}", calls[0]);
    }
}

#[tokio::test]
async fn test_no_eligible_member_reports_failure() {
    let members = vec![
        member("i-1", LifecycleState::InService, HealthStatus::Unhealthy, "us-east-1a"),
        member("i-2", LifecycleState::Terminating, HealthStatus::Healthy, "us-east-1b"),
    ];
    let h = harness(config(Some(TOPIC), Some(GROUP)), Inspection::Members(members), false, false);

    let response = h.trigger.handle(&event(), &ctx()).await.unwrap();

    assert_eq!(response.status_code, 200);
    assert!(h.terminator.calls().is_empty());
    let published = h.reporter.calls();
    assert_eq!(published.len(), 1);
    assert!(published[0].body.to_lowercase().contains("no eligible"));
    assert!(published[0].body.contains("ERROR while testing"));
}

#[tokio::test]
async fn test_zero_members_reports_failure() {
    let h = harness(
        config(Some(TOPIC), Some(GROUP)),
        Inspection::Members(Vec::new()),
        false,
        false,
    );

    let response = h.trigger.handle(&event(), &ctx()).await.unwrap();

    assert_eq!(response.status_code, 200);
    assert!(h.terminator.calls().is_empty());
    assert_eq!(h.reporter.calls().len(), 1);
}

#[tokio::test]
async fn test_group_not_found_reports_failure() {
    let h = harness(config(Some(TOPIC), Some(GROUP)), Inspection::NotFound, false, false);

    let response = h.trigger.handle(&event(), &ctx()).await.unwrap();

    assert_eq!(response.status_code, 200);
    assert_eq!(response.body, EXECUTED_BODY);
    assert!(h.terminator.calls().is_empty());
    let published = h.reporter.calls();
    assert_eq!(published.len(), 1);
    assert!(published[0].body.contains("Auto Scaling Group 'asg-web' not found"));
}

#[tokio::test]
async fn test_inspect_failure_reports_failure() {
    let h = harness(config(Some(TOPIC), Some(GROUP)), Inspection::Unavailable, false, false);

    let response = h.trigger.handle(&event(), &ctx()).await.unwrap();

    assert_eq!(response.status_code, 200);
    assert!(h.terminator.calls().is_empty());
    let published = h.reporter.calls();
    assert_eq!(published.len(), 1);
    assert!(published[0].body.contains("Rate exceeded"));
    assert!(published[0].body.contains("inspecting"));
}

#[tokio::test]
async fn test_terminate_failure_reports_failure() {
    let h = harness(
        config(Some(TOPIC), Some(GROUP)),
        Inspection::Members(web_group()),
        true,
        false,
    );

    let response = h.trigger.handle(&event(), &ctx()).await.unwrap();

    assert_eq!(response.status_code, 200);
    assert_eq!(h.terminator.calls(), vec!["i-1".to_string()]);
    let published = h.reporter.calls();
    assert_eq!(published.len(), 1);
    assert!(published[0].body.contains("not authorized"));
    assert!(published[0].body.contains("terminating"));
    assert!(!published[0].body.contains("Completed Successfully"));
}

#[tokio::test]
async fn test_publish_failure_propagates() {
    let h = harness(
        config(Some(TOPIC), Some(GROUP)),
        Inspection::Members(web_group()),
        false,
        true,
    );

    let err = h.trigger.handle(&event(), &ctx()).await.unwrap_err();

    assert!(matches!(err, DisruptionError::Service { ref operation, .. } if operation == "sns:Publish"));
    assert_eq!(h.terminator.calls(), vec!["i-1".to_string()]);
    assert_eq!(h.reporter.calls().len(), 1);
}

#[tokio::test]
async fn test_dry_run_skips_termination() {
    let mut cfg = config(Some(TOPIC), Some(GROUP));
    cfg.dry_run = true;
    let h = harness(cfg, Inspection::Members(web_group()), false, false);

    let response = h.trigger.handle(&event(), &ctx()).await.unwrap();

    assert_eq!(response.status_code, 200);
    assert!(h.terminator.calls().is_empty());
    let published = h.reporter.calls();
    assert_eq!(published.len(), 1);
    assert!(published[0].body.contains("DRY RUN"));
    assert!(published[0].body.contains("i-1"));
}
