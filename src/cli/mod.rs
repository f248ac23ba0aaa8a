pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "nodos")]
#[command(about = "Nodos CLI - database maintenance and bootstrap for the Nodos API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Apply pending database migrations")]
    Migrate,

    #[command(about = "Create the SUDO user if none exists yet")]
    SetupSudo(commands::sudo::SetupSudoArgs),

    #[command(about = "Create the fixed QA users (password: password123)")]
    SeedUsers,

    #[command(about = "Replace all nodes with a deterministic sample tree")]
    SeedNodes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Migrate => commands::migrate::handle(output_format).await,
        Commands::SetupSudo(args) => commands::sudo::handle(args, output_format).await,
        Commands::SeedUsers => commands::seed::seed_users(output_format).await,
        Commands::SeedNodes => commands::seed::seed_nodes(output_format).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_subcommands_and_global_flags() {
        let cli = Cli::try_parse_from(["nodos", "--json", "seed-users"]).unwrap();
        assert_eq!(OutputFormat::from_cli(&cli), OutputFormat::Json);
        assert!(matches!(cli.command, Commands::SeedUsers));

        let cli = Cli::try_parse_from(["nodos", "setup-sudo", "--username", "root"]).unwrap();
        assert_eq!(OutputFormat::from_cli(&cli), OutputFormat::Text);
        match cli.command {
            Commands::SetupSudo(args) => assert_eq!(args.username.as_deref(), Some("root")),
            _ => panic!("expected setup-sudo"),
        }
    }

    #[test]
    fn rejects_unknown_subcommand() {
        assert!(Cli::try_parse_from(["nodos", "frobnicate"]).is_err());
    }
}
