//! See <https://github.com/matklad/cargo-xtask/>
//!
//! Auxiliary commands for the peeth repository that `cargo` cannot express
//! on its own. Run them through the `cargo xtask` alias.

use clap::Parser;

mod dynamodb;
mod integration;
mod prelude;

#[derive(Debug, Parser)]
#[command(name = "xtask")]
#[command(about = "Development tasks for peeth", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: Global,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Silence the command output
    #[clap(long, global = true)]
    pub silent: bool,
}

impl Global {
    pub fn is_silent(&self) -> bool {
        self.silent
    }
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// Manage DynamoDB infrastructure
    Dynamodb(dynamodb::DynamodbCommand),
    /// Run the DynamoDB backend tests against DynamoDB Local
    Integration(integration::IntegrationCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Dynamodb(cmd) => dynamodb::run(cmd, cli.global).await?,
        Commands::Integration(cmd) => integration::run(cmd, cli.global).await?,
    }

    Ok(())
}
