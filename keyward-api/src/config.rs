/// Configuration management for the API server
///
/// This module loads configuration from environment variables and provides
/// a type-safe configuration struct.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `API_TOKEN_TTL_SECONDS`: Developer API token lifetime (default: unset, tokens never expire)
/// - `CORS_ORIGINS`: Comma-separated allowed origins (default: `*`)
/// - `RUN_MIGRATIONS`: Apply embedded migrations at startup (default: true)
/// - `LOG_FORMAT`: `pretty` or `json` (default: pretty)
/// - `BOOTSTRAP_ORGANIZATION` / `BOOTSTRAP_DEVELOPER`: create a first
///   organization and developer at startup when both are set
/// - `RUST_LOG`: Log filter
///
/// # Example
///
/// ```no_run
/// use keyward_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use std::env;

use keyward_shared::auth::tokens::TokenPolicy;
use keyward_shared::db::pool::DatabaseConfig;
use keyward_shared::services::CoreConfig;

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Developer API token lifetime in seconds (None = never expires)
    pub token_ttl_seconds: Option<i64>,

    /// Apply migrations before serving
    pub run_migrations: bool,

    /// Log output format
    pub log_format: LogFormat,

    /// First organization/developer to create at startup
    pub bootstrap: Option<BootstrapConfig>,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins; `*` means any
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Names used to seed an empty installation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapConfig {
    pub organization: String,
    pub developer: String,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `DATABASE_URL` is missing
    /// - A numeric or boolean variable has an invalid value
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = var("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = var("API_PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse::<u16>()?;

        let cors_origins = var("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let url = var("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|| "10".to_string())
            .parse::<u32>()?;

        let token_ttl_seconds = var("API_TOKEN_TTL_SECONDS")
            .map(|v| v.parse::<i64>())
            .transpose()?;
        if let Some(ttl) = token_ttl_seconds {
            if ttl <= 0 {
                anyhow::bail!("API_TOKEN_TTL_SECONDS must be positive");
            }
            if chrono::Duration::try_seconds(ttl).is_none() {
                anyhow::bail!("API_TOKEN_TTL_SECONDS is out of range: {}", ttl);
            }
        }

        let run_migrations = var("RUN_MIGRATIONS")
            .unwrap_or_else(|| "true".to_string())
            .parse::<bool>()?;

        let log_format = match var("LOG_FORMAT").as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => anyhow::bail!("LOG_FORMAT must be 'pretty' or 'json', got '{}'", other),
        };

        let bootstrap = match (var("BOOTSTRAP_ORGANIZATION"), var("BOOTSTRAP_DEVELOPER")) {
            (Some(organization), Some(developer)) => Some(BootstrapConfig {
                organization,
                developer,
            }),
            (None, None) => None,
            _ => anyhow::bail!(
                "BOOTSTRAP_ORGANIZATION and BOOTSTRAP_DEVELOPER must be set together"
            ),
        };

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                cors_origins,
            },
            database: DatabaseConfig {
                url,
                max_connections,
                ..Default::default()
            },
            token_ttl_seconds,
            run_migrations,
            log_format,
            bootstrap,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Settings handed to the core services
    pub fn core_config(&self) -> CoreConfig {
        let token_policy = match self.token_ttl_seconds.and_then(chrono::Duration::try_seconds) {
            Some(ttl) => TokenPolicy::with_ttl(ttl),
            None => TokenPolicy::never_expires(),
        };

        CoreConfig {
            token_policy,
            ..Default::default()
        }
    }

    /// True when any origin is allowed
    pub fn cors_permissive(&self) -> bool {
        self.api.cors_origins.iter().any(|origin| origin == "*")
    }
}
