use clap::Parser;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Connection details for a MySQL server attached through DuckDB's `mysql` extension.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct MySqlConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    pub database: String,
}

impl Default for MySqlConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3306,
            user: "root".to_string(),
            password: None,
            database: "football".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub connection_string: String,
    pub pool_size: usize,
    pub connect_timeout_secs: u64,
    pub read_only: bool,
    pub mysql: Option<MySqlConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LlmConfig {
    pub backend: String, // "gemini", "remote", or "ollama"
    pub model: String,   // Model name
    pub api_key: Option<String>,
    pub api_url: Option<String>,
    pub timeout_secs: u64,
    pub strip_markdown: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub web: WebConfig,
    pub llm: LlmConfig,
}

#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Answer a single question on the terminal instead of starting the server
    #[arg(long, value_name = "QUESTION")]
    pub ask: Option<String>,

    /// Create (or replace) the top_scorers table from a CSV file and exit
    #[arg(long, value_name = "FILE")]
    pub load_csv: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,
}

impl AppConfig {
    pub fn new(args: &CliArgs) -> Result<Self, ConfigError> {
        // Start with default configuration
        let mut config_builder = Config::builder().add_source(Config::try_from(&AppConfig::default())?);

        // Add configuration from file if specified
        if let Some(config_path) = &args.config {
            config_builder = config_builder.add_source(File::from(config_path.as_path()));
        } else {
            // Check for config in default locations
            let default_locations = vec![
                "config.toml",
                "config/config.toml",
                "/etc/nl-sql/config.toml",
            ];

            for location in default_locations {
                if Path::new(location).exists() {
                    config_builder =
                        config_builder.add_source(File::new(location, config::FileFormat::Toml));
                    break;
                }
            }
        }

        // NLSQL__LLM__MODEL, NLSQL__DATABASE__MYSQL__HOST, ...
        config_builder = config_builder.add_source(
            Environment::with_prefix("NLSQL")
                .prefix_separator("__")
                .separator("__"),
        );

        // Build the config
        let mut config: AppConfig = config_builder.build()?.try_deserialize()?;

        config.apply_secret_fallbacks(
            std::env::var("GOOGLE_API_KEY").ok(),
            std::env::var("DB_PASSWORD").ok(),
        );

        // Override with command line args if provided
        if let Some(host) = &args.host {
            config.web.host = host.clone();
        }
        if let Some(port) = args.port {
            config.web.port = port;
        }

        Ok(config)
    }

    /// Fills secrets from the legacy `GOOGLE_API_KEY` / `DB_PASSWORD` variables
    /// when the layered sources left them unset.
    fn apply_secret_fallbacks(&mut self, api_key: Option<String>, db_password: Option<String>) {
        if self.llm.api_key.is_none() {
            self.llm.api_key = api_key.filter(|key| !key.is_empty());
        }

        if self.ignores_db_password(db_password.as_deref()) {
            warn!(
                "DB_PASSWORD is set but no [database.mysql] section is configured; using DuckDB at {}",
                self.database.connection_string
            );
        }

        if let Some(mysql) = self.database.mysql.as_mut() {
            if mysql.password.is_none() {
                mysql.password = db_password;
            }
        }
    }

    /// True when a MySQL password was supplied but there is no MySQL server to use it for.
    fn ignores_db_password(&self, db_password: Option<&str>) -> bool {
        self.database.mysql.is_none() && db_password.is_some_and(|password| !password.is_empty())
    }
}

// Default implementation
impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                connection_string: "football.duckdb".to_string(),
                pool_size: 5,
                connect_timeout_secs: 5,
                read_only: false,
                mysql: None,
            },
            web: WebConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            llm: LlmConfig {
                backend: "gemini".to_string(),
                model: "gemini-1.5-pro-exp-0801".to_string(),
                api_key: None,
                api_url: None,
                timeout_secs: 60,
                strip_markdown: true,
            },
        }
    }
}
