//! DynamoDB Local container lifecycle.
//!
//! Argument building is pure; the rest shells out to `docker` or `podman`.

use std::time::Duration;

use aws_sdk_dynamodb::Client;
use tokio::process::Command;

use super::error::{IntegrationError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerRuntime {
    Docker,
    Podman,
}

impl ContainerRuntime {
    pub fn command(self) -> &'static str {
        match self {
            ContainerRuntime::Docker => "docker",
            ContainerRuntime::Podman => "podman",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ContainerSpec {
    pub name: &'static str,
    pub image: &'static str,
    pub port: u16,
    pub command: &'static str,
}

/// In-memory DynamoDB Local; every run starts from an empty database.
pub const DYNAMODB_LOCAL: ContainerSpec = ContainerSpec {
    name: "peeth-dynamodb-test",
    image: "amazon/dynamodb-local:latest",
    port: 8000,
    command: "-jar DynamoDBLocal.jar -inMemory -sharedDb",
};

impl ContainerSpec {
    pub fn endpoint_url(&self) -> String {
        format!("http://localhost:{}", self.port)
    }
}

/// Arguments for `<runtime> run`.
pub fn container_run_args(spec: &ContainerSpec) -> Vec<String> {
    let mut args = vec![
        "run".to_string(),
        "--rm".to_string(),
        "--name".to_string(),
        spec.name.to_string(),
        "-d".to_string(),
        "-p".to_string(),
        format!("{}:8000", spec.port),
        spec.image.to_string(),
    ];
    args.extend(spec.command.split_whitespace().map(String::from));
    args
}

/// Docker first, then Podman.
pub async fn detect_runtime() -> Result<ContainerRuntime> {
    for runtime in [ContainerRuntime::Docker, ContainerRuntime::Podman] {
        let output = Command::new(runtime.command()).arg("--version").output().await;
        if output.is_ok_and(|output| output.status.success()) {
            return Ok(runtime);
        }
    }

    Err(IntegrationError::RuntimeNotFound(
        "neither docker nor podman is on PATH".to_string(),
    ))
}

/// Whether a container with this name is running.
pub async fn is_running(runtime: ContainerRuntime, spec: &ContainerSpec) -> Result<bool> {
    let output = Command::new(runtime.command())
        .args(["ps", "-q", "-f", &format!("name={}", spec.name)])
        .output()
        .await?;
    Ok(!String::from_utf8_lossy(&output.stdout).trim().is_empty())
}

pub async fn start(runtime: ContainerRuntime, spec: &ContainerSpec) -> Result<()> {
    let output = Command::new(runtime.command())
        .args(container_run_args(spec))
        .output()
        .await?;

    if !output.status.success() {
        return Err(IntegrationError::ContainerFailed(format!(
            "failed to start '{}': {}",
            spec.name,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(())
}

/// Stops the container. It was started with `--rm`, so this also removes it.
pub async fn stop(runtime: ContainerRuntime, spec: &ContainerSpec) -> Result<()> {
    let output = Command::new(runtime.command())
        .args(["stop", spec.name])
        .output()
        .await?;

    if !output.status.success() {
        return Err(IntegrationError::ContainerFailed(format!(
            "failed to stop '{}': {}",
            spec.name,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(())
}

/// Polls `ListTables` until DynamoDB Local answers.
pub async fn wait_until_ready(
    client: &Client,
    spec: &ContainerSpec,
    timeout: Duration,
) -> Result<()> {
    let start = std::time::Instant::now();
    let poll_interval = Duration::from_millis(500);

    while start.elapsed() < timeout {
        if client.list_tables().limit(1).send().await.is_ok() {
            return Ok(());
        }
        tokio::time::sleep(poll_interval).await;
    }

    Err(IntegrationError::ContainerNotReady {
        name: spec.name.to_string(),
        timeout_secs: timeout.as_secs(),
    })
}
