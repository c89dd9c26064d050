pub mod commands;
pub mod config;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "hospital")]
#[command(about = "Hospital CLI - Command-line interface for the Hospital API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Select and check the API server")]
    Server {
        #[command(subcommand)]
        cmd: commands::server::ServerCommands,
    },

    #[command(about = "Register, login and session management")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },

    #[command(about = "Browse and manage doctors")]
    Doctors {
        #[command(subcommand)]
        cmd: commands::doctors::DoctorCommands,
    },

    #[command(about = "Book and manage appointments")]
    Appointments {
        #[command(subcommand)]
        cmd: commands::appointments::AppointmentCommands,
    },

    #[command(about = "View and attach medical reports")]
    Reports {
        #[command(subcommand)]
        cmd: commands::reports::ReportCommands,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
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
        Commands::Server { cmd } => commands::server::handle(cmd, output_format).await,
        Commands::Auth { cmd } => commands::auth::handle(cmd, output_format).await,
        Commands::Doctors { cmd } => commands::doctors::handle(cmd, output_format).await,
        Commands::Appointments { cmd } => commands::appointments::handle(cmd, output_format).await,
        Commands::Reports { cmd } => commands::reports::handle(cmd, output_format).await,
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
    fn parses_global_json_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["hospital", "doctors", "list", "--json"]).unwrap();
        assert!(matches!(OutputFormat::from_cli(&cli), OutputFormat::Json));
    }
}
