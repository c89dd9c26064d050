use serde::{Deserialize, Serialize};
use std::env;

/// Development-only signing secret; staging and production refuse to start with it
pub const DEV_SESSION_SECRET: &str = "hospital-dev-session-secret-change-me";

/// Longest accepted session lifetime (one year)
pub const MAX_SESSION_EXPIRY_HOURS: u64 = 24 * 365;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub seed: SeedConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StorageBackend,
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    #[serde(skip_serializing)]
    pub session_secret: String,
    pub session_expiry_hours: u64,
    pub cookie_secure: bool,
    /// Lets `/api/register` accept `role: "admin"`; otherwise every new account is a patient
    pub allow_admin_registration: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    pub doctors: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("SESSION_SECRET must be set to a non-default value outside development")]
    InsecureSessionSecret,
    #[error("SESSION_EXPIRY_HOURS must be between 1 and {max}, got {0}", max = MAX_SESSION_EXPIRY_HOURS)]
    SessionExpiryOutOfRange(u64),
    #[error("DATABASE_URL is required for the postgres storage backend")]
    MissingDatabaseUrl,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    /// Reject configurations that must never reach a running server
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.environment != Environment::Development
            && (self.security.session_secret.is_empty()
                || self.security.session_secret == DEV_SESSION_SECRET)
        {
            return Err(ConfigError::InsecureSessionSecret);
        }
        let hours = self.security.session_expiry_hours;
        if hours == 0 || hours > MAX_SESSION_EXPIRY_HOURS {
            return Err(ConfigError::SessionExpiryOutOfRange(hours));
        }
        if self.database.backend == StorageBackend::Postgres && self.database.url.is_none() {
            return Err(ConfigError::MissingDatabaseUrl);
        }
        Ok(())
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        match env::var("STORAGE_BACKEND").as_deref() {
            Ok("memory") => self.database.backend = StorageBackend::Memory,
            Ok("postgres") => self.database.backend = StorageBackend::Postgres,
            _ => {}
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_RUN_MIGRATIONS") {
            self.database.run_migrations = v.parse().unwrap_or(self.database.run_migrations);
        }

        // API overrides
        if let Some(port) = env::var("HOSPITAL_API_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.api.port = port;
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("SESSION_SECRET") {
            self.security.session_secret = v;
        }
        if let Ok(v) = env::var("SESSION_EXPIRY_HOURS") {
            self.security.session_expiry_hours = v.parse().unwrap_or(self.security.session_expiry_hours);
        }
        if let Ok(v) = env::var("SESSION_COOKIE_SECURE") {
            self.security.cookie_secure = v.parse().unwrap_or(self.security.cookie_secure);
        }
        if let Ok(v) = env::var("SECURITY_ALLOW_ADMIN_REGISTRATION") {
            self.security.allow_admin_registration =
                v.parse().unwrap_or(self.security.allow_admin_registration);
        }

        if let Ok(v) = env::var("SEED_DOCTORS") {
            self.seed.doctors = v.parse().unwrap_or(self.seed.doctors);
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                backend: StorageBackend::Postgres,
                url: None,
                max_connections: 10,
                connection_timeout: 30,
                run_migrations: true,
            },
            api: ApiConfig {
                port: 5000,
                enable_request_logging: true,
                max_request_size_bytes: 1024 * 1024, // 1MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:5000".to_string(), "http://localhost:5173".to_string()],
                session_secret: DEV_SESSION_SECRET.to_string(),
                session_expiry_hours: 24 * 7, // 1 week
                cookie_secure: false,
                allow_admin_registration: true,
            },
            seed: SeedConfig { doctors: true },
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                backend: StorageBackend::Postgres,
                url: None,
                max_connections: 20,
                connection_timeout: 10,
                run_migrations: true,
            },
            api: ApiConfig {
                port: 5000,
                enable_request_logging: true,
                max_request_size_bytes: 512 * 1024,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
                // Must come from SESSION_SECRET
                session_secret: String::new(),
                session_expiry_hours: 24,
                cookie_secure: true,
                allow_admin_registration: false,
            },
            seed: SeedConfig { doctors: true },
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                backend: StorageBackend::Postgres,
                url: None,
                max_connections: 50,
                connection_timeout: 5,
                run_migrations: false,
            },
            api: ApiConfig {
                port: 5000,
                enable_request_logging: false,
                max_request_size_bytes: 256 * 1024,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
                // Must come from SESSION_SECRET
                session_secret: String::new(),
                session_expiry_hours: 12,
                cookie_secure: true,
                allow_admin_registration: false,
            },
            seed: SeedConfig { doctors: false },
        }
    }

    /// In-memory development config, used by the test-suite
    pub fn in_memory() -> Self {
        let mut config = Self::development();
        config.database.backend = StorageBackend::Memory;
        config.database.run_migrations = false;
        config.api.enable_request_logging = false;
        config
    }
}
