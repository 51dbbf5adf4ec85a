//! DynamoDB infrastructure management commands.

mod client;
mod config;
mod deploy;
mod error;
mod planning;

pub use error::{DynamodbError, Result};

use crate::prelude::*;
use aws_sdk_dynamodb::Client;
use dialoguer::Confirm;

#[derive(Debug, clap::Parser)]
pub struct DynamodbCommand {
    #[command(subcommand)]
    pub action: DynamodbAction,
}

#[derive(Debug, clap::Subcommand)]
pub enum DynamodbAction {
    /// Deploy or destroy the peeth table.
    Deploy(DeployCommand),
}

#[derive(Debug, clap::Parser)]
#[command(long_about = "Deploy or destroy the peeth DynamoDB table.

Creates the single table (PK/SK) with the GSI1 and GSI2 indexes and enables
TTL on the `ttl` attribute. On an existing table, only missing indexes and
TTL are added.

The command shows a plan of changes before applying and asks for confirmation.

Environment variables:
  AWS_ENDPOINT_URL    - Use local DynamoDB (e.g., http://localhost:8000)
  AWS_REGION          - AWS region (defaults to us-east-1)
  AWS_PROFILE         - AWS profile to use for credentials
  DEPLOYMENT_MODE     - Picks the default table name (peeth-<mode>)")]
pub struct DeployCommand {
    /// Skip confirmation prompts.
    #[arg(long)]
    pub force: bool,

    /// Destroy the table instead of creating/updating.
    #[arg(long)]
    pub destroy: bool,

    /// Table name (defaults to "peeth-<DEPLOYMENT_MODE>").
    #[arg(long, env = "DYNAMODB_TABLE_NAME")]
    pub table_name: Option<String>,

    /// Deployment mode used for the default table name.
    #[arg(long, env = "DEPLOYMENT_MODE", default_value = "development")]
    pub mode: String,
}

impl DeployCommand {
    fn table_name(&self) -> String {
        self.table_name
            .clone()
            .unwrap_or_else(|| config::default_table_name(&self.mode))
    }
}

pub async fn run(command: DynamodbCommand, global: crate::Global) -> Result<()> {
    match command.action {
        DynamodbAction::Deploy(deploy_cmd) => run_deploy(deploy_cmd, &global).await,
    }
}

async fn run_deploy(cmd: DeployCommand, global: &crate::Global) -> Result<()> {
    let aws_config = client::AwsConfig::default();
    let table_name = cmd.table_name();

    if !global.is_silent() {
        aprintln!("{} {}", p_b("Target:"), aws_config.target_display());
        aprintln!("{} {}", p_b("Table:"), table_name);
        aprintln!();
    }

    let dynamo_client = client::create_client(&aws_config).await?;
    let current_state = client::get_table_state(&dynamo_client, &table_name).await?;

    if cmd.destroy {
        let plan = planning::calculate_destroy_plan(current_state.as_ref(), &table_name);

        if !global.is_silent() {
            aprintln!("{}", p_y("Destroy Plan:"));
            for line in planning::format_destroy_plan(&plan) {
                aprintln!("  {}", p_r(&line));
            }
            aprintln!();
        }

        if matches!(plan, planning::DestroyPlan::AlreadyGone { .. }) {
            if !global.is_silent() {
                aprintln!("{}", p_g("Nothing to destroy."));
            }
            return Ok(());
        }

        confirm(
            cmd.force,
            "Are you sure you want to delete this table? ALL DATA WILL BE LOST",
            false,
        )?;

        if !global.is_silent() {
            aprintln!("{}", p_b("Deleting table..."));
        }
        deploy::execute_destroy_plan(&dynamo_client, &plan).await?;
        if !global.is_silent() {
            aprintln!("{}", p_g("Table destroyed successfully."));
        }
        return Ok(());
    }

    let table_config = config::peeth_table_config().with_table_name(&table_name);
    let plan = planning::calculate_deploy_plan(current_state.as_ref(), &table_config);

    if !global.is_silent() {
        aprintln!("{}", p_c("Deploy Plan:"));
        for line in planning::format_deploy_plan(&plan) {
            match line.chars().next() {
                Some('+') => aprintln!("  {}", p_g(&line)),
                Some('-') => aprintln!("  {}", p_r(&line)),
                Some('~') => aprintln!("  {}", p_y(&line)),
                _ => aprintln!("  {}", line),
            }
        }
        aprintln!();
    }

    if matches!(plan, planning::DeployPlan::NoChanges { .. }) {
        if !global.is_silent() {
            aprintln!("{}", p_g("Infrastructure is up to date."));
        }
        return Ok(());
    }

    confirm(cmd.force, "Apply these changes?", true)?;

    if !global.is_silent() {
        aprintln!("{}", p_b("Applying changes..."));
    }
    deploy::execute_deploy_plan(&dynamo_client, &plan).await?;
    if !global.is_silent() {
        aprintln!("{}", p_g("Infrastructure deployed successfully."));
    }

    Ok(())
}

/// Brings `table_name` to the peeth schema without prompting.
pub async fn ensure_table(client: &Client, table_name: &str) -> Result<()> {
    let current_state = client::get_table_state(client, table_name).await?;
    let table_config = config::peeth_table_config().with_table_name(table_name);
    let plan = planning::calculate_deploy_plan(current_state.as_ref(), &table_config);
    deploy::execute_deploy_plan(client, &plan).await
}

fn confirm(force: bool, prompt: &str, default: bool) -> Result<()> {
    if force {
        return Ok(());
    }

    let confirmed = Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()?;

    if confirmed {
        Ok(())
    } else {
        Err(DynamodbError::UserCancelled)
    }
}
