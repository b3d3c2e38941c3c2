pub mod asg;
pub mod aws;
pub mod config;
pub mod ec2;
pub mod error;
pub mod logging;
pub mod report;
pub mod selector;
pub mod sns;
pub mod trigger;
