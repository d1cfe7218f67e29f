//! hdi CLI library

pub mod commands;
pub mod config;
pub mod error;

pub use error::{Error, Result};

use clap::{Parser, Subcommand};

/// hdi - declarative HDInsight cluster management
#[derive(Parser, Debug)]
#[command(name = "hdi")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "HDI_LOG_JSON")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a cluster from a document and wait until it is running
    Create(commands::create::CreateArgs),
    /// Show the observed state of a cluster
    Show(commands::show::ShowArgs),
    /// Apply changed fields of a document to an existing cluster
    Update(commands::update::UpdateArgs),
    /// Delete a cluster and wait until it is gone
    Delete(commands::delete::DeleteArgs),
    /// Read-only view of a cluster by resource group and name
    Lookup(commands::lookup::LookupArgs),
    /// Describe supported cluster kinds
    Kinds(commands::kinds::KindsArgs),
    /// Print the JSON schema of the cluster document
    Schema,
    /// Show or update stored connection settings
    Configure(commands::configure::ConfigureArgs),
}

impl Cli {
    /// Run the CLI command
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Create(args) => commands::create::run(args).await,
            Commands::Show(args) => commands::show::run(args).await,
            Commands::Update(args) => commands::update::run(args).await,
            Commands::Delete(args) => commands::delete::run(args).await,
            Commands::Lookup(args) => commands::lookup::run(args).await,
            Commands::Kinds(args) => commands::kinds::run(args),
            Commands::Schema => commands::schema::run(),
            Commands::Configure(args) => commands::configure::run(args),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn update_parses_change_set() {
        let cli = Cli::try_parse_from([
            "hdi",
            "update",
            "/subscriptions/s/resourceGroups/rg/providers/Microsoft.HDInsight/clusters/c",
            "-f",
            "c.yaml",
            "--kind",
            "kafka",
            "--changed",
            "tags,roles",
        ])
        .unwrap();
        match cli.command {
            Commands::Update(args) => {
                assert_eq!(args.kind, hdi_common::ClusterKind::Kafka);
                assert_eq!(args.changed.to_string(), "roles,tags");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let err = Cli::try_parse_from(["hdi", "kinds", "--kind", "cassandra"]).unwrap_err();
        assert!(err.to_string().contains("cassandra"));
    }
}
