use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::client::ApiClient;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:5000";

/// Persisted CLI state: which server to talk to and the current session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    pub server_url: Option<String>,
    pub token: Option<String>,
    pub username: Option<String>,
    pub logged_in_at: Option<DateTime<Utc>>,
}

impl SessionConfig {
    pub fn server_url(&self) -> &str {
        self.server_url.as_deref().unwrap_or(DEFAULT_SERVER_URL)
    }

    /// Client for the configured server, resuming the saved session
    pub fn client(&self) -> anyhow::Result<ApiClient> {
        Ok(ApiClient::new(self.server_url())?.with_token(self.token.clone()))
    }

    pub fn clear_session(&mut self) {
        self.token = None;
        self.username = None;
        self.logged_in_at = None;
    }
}

pub fn get_config_dir() -> anyhow::Result<PathBuf> {
    let config_dir = if let Ok(custom_dir) = std::env::var("HOSPITAL_CLI_CONFIG_DIR") {
        PathBuf::from(custom_dir)
    } else {
        let home = std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME environment variable not set"))?;
        PathBuf::from(home).join(".config").join("hospital").join("cli")
    };

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

pub fn load_session_config() -> anyhow::Result<SessionConfig> {
    let session_file = get_config_dir()?.join("session.json");

    if !session_file.exists() {
        return Ok(SessionConfig::default());
    }

    let content = fs::read_to_string(session_file)?;
    let config: SessionConfig = serde_json::from_str(&content)?;
    Ok(config)
}

pub fn save_session_config(config: &SessionConfig) -> anyhow::Result<()> {
    let session_file = get_config_dir()?.join("session.json");

    let content = serde_json::to_string_pretty(config)?;
    fs::write(session_file, content)?;
    Ok(())
}
