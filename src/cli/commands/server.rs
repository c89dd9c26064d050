use clap::Subcommand;
use serde_json::json;

use crate::cli::config::{load_session_config, save_session_config};
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum ServerCommands {
    #[command(about = "Point the CLI at a server (drops any saved session)")]
    Set {
        #[arg(help = "Server URL, e.g. http://localhost:5000")]
        url: String,
    },

    #[command(about = "Check server health status from the /health endpoint")]
    Ping,
}

pub async fn handle(cmd: ServerCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ServerCommands::Set { url } => {
            url::Url::parse(&url)?;
            let mut config = load_session_config()?;
            config.server_url = Some(url.clone());
            config.clear_session();
            save_session_config(&config)?;

            output_success(
                &output_format,
                &format!("Using server {}", url),
                Some(json!({ "server_url": url })),
            )
        }
        ServerCommands::Ping => {
            let config = load_session_config()?;
            let health = config.client()?.health().await?;
            output_success(
                &output_format,
                &format!("{} is {}", config.server_url(), health["status"].as_str().unwrap_or("up")),
                Some(health),
            )
        }
    }
}
