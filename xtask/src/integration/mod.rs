//! Integration tests against DynamoDB Local.
//!
//! ```bash
//! # Start DynamoDB Local, deploy the table, run the suite, stop the container
//! cargo xtask integration
//!
//! # Reuse a DynamoDB Local that is already listening
//! cargo xtask integration --no-docker
//! ```
//!
//! The document backend needs no infrastructure and runs under plain
//! `cargo test`.

mod container;
mod error;

pub use error::{IntegrationError, Result};

use std::time::Duration;

use aws_sdk_dynamodb::config::Credentials;
use aws_sdk_dynamodb::Client;

use crate::prelude::*;
use container::{ContainerRuntime, DYNAMODB_LOCAL};

const REGION: &str = "us-east-1";
const LOCAL_ACCESS_KEY: &str = "test";
const LOCAL_SECRET_KEY: &str = "test";

#[derive(Debug, clap::Parser)]
#[command(long_about = "Run the DynamoDB backend tests against DynamoDB Local.

Starts an in-memory DynamoDB Local container (docker or podman), deploys the
peeth table into it, then runs the ignored tests in crates/peeth/tests/dynamodb.rs.
The container is stopped afterwards unless --keep-container is given.")]
pub struct IntegrationCommand {
    /// Skip container management and use whatever listens on the port.
    #[arg(long)]
    pub no_docker: bool,

    /// Leave the container running after the tests.
    #[arg(long)]
    pub keep_container: bool,

    /// Seconds to wait for DynamoDB Local to answer.
    #[arg(long, default_value = "30")]
    pub health_timeout: u64,

    /// Table the tests run against.
    #[arg(long, default_value = "peeth-integration")]
    pub table_name: String,
}

pub async fn run(command: IntegrationCommand, global: crate::Global) -> Result<()> {
    let spec = &DYNAMODB_LOCAL;
    let endpoint = spec.endpoint_url();

    let runtime = if command.no_docker {
        if !global.is_silent() {
            aprintln!("{} {}", p_y("Skipping container management:"), endpoint);
        }
        None
    } else {
        Some(start_container(&global).await?)
    };

    let outcome = prepare_and_test(&command, &endpoint, &global).await;

    if let Some((runtime, started)) = runtime {
        if started && !command.keep_container {
            if !global.is_silent() {
                aprintln!("{}", p_b("Stopping DynamoDB Local..."));
            }
            container::stop(runtime, spec).await?;
        } else if started && !global.is_silent() {
            aprintln!("{}", p_y("DynamoDB Local left running (--keep-container)"));
        }
    }

    outcome?;
    if !global.is_silent() {
        aprintln!("{}", p_g("All integration tests passed."));
    }
    Ok(())
}

/// Starts DynamoDB Local unless it already runs. Reports whether this call
/// started it.
async fn start_container(global: &crate::Global) -> Result<(ContainerRuntime, bool)> {
    let runtime = container::detect_runtime().await?;

    if container::is_running(runtime, &DYNAMODB_LOCAL).await? {
        if !global.is_silent() {
            aprintln!("{}", p_y("DynamoDB Local container already running"));
        }
        return Ok((runtime, false));
    }

    if !global.is_silent() {
        aprintln!(
            "{} {}",
            p_b("Starting DynamoDB Local with"),
            runtime.command()
        );
    }
    container::start(runtime, &DYNAMODB_LOCAL).await?;
    Ok((runtime, true))
}

async fn prepare_and_test(
    command: &IntegrationCommand,
    endpoint: &str,
    global: &crate::Global,
) -> Result<()> {
    let client = local_client(endpoint).await;
    let timeout = Duration::from_secs(command.health_timeout);
    container::wait_until_ready(&client, &DYNAMODB_LOCAL, timeout).await?;

    if !global.is_silent() {
        aprintln!("{} {}", p_b("Deploying table:"), command.table_name);
    }
    crate::dynamodb::ensure_table(&client, &command.table_name).await?;

    if !global.is_silent() {
        aprintln!("{}", p_c("Running DynamoDB tests..."));
    }
    let status = tokio::process::Command::new("cargo")
        .args(test_args())
        .env("AWS_ENDPOINT_URL", endpoint)
        .env("AWS_REGION", REGION)
        .env("AWS_ACCESS_KEY_ID", LOCAL_ACCESS_KEY)
        .env("AWS_SECRET_ACCESS_KEY", LOCAL_SECRET_KEY)
        .env("DYNAMODB_TABLE_NAME", &command.table_name)
        .status()
        .await?;

    if status.success() {
        Ok(())
    } else {
        aprintln!("{}", p_r("DynamoDB integration tests failed"));
        Err(IntegrationError::TestsFailed)
    }
}

/// `cargo` arguments selecting the ignored DynamoDB suite.
fn test_args() -> [&'static str; 9] {
    [
        "test",
        "-p",
        "peeth",
        "--features",
        "dynamodb",
        "--test",
        "dynamodb",
        "--",
        "--ignored",
    ]
}

async fn local_client(endpoint: &str) -> Client {
    let credentials = Credentials::new(LOCAL_ACCESS_KEY, LOCAL_SECRET_KEY, None, None, "local");
    let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(REGION))
        .endpoint_url(endpoint)
        .credentials_provider(credentials)
        .load()
        .await;
    Client::new(&sdk_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_ignored_dynamodb_suite_runs() {
        let args = test_args();
        assert_eq!(args[..3], ["test", "-p", "peeth"]);
        assert!(args.windows(2).any(|pair| pair == ["--test", "dynamodb"]));
        assert_eq!(args[args.len() - 2..], ["--", "--ignored"]);
    }
}
