use std::env;

use config::{Config, File};
use serde::Deserialize;
use watchtower_core::chain::Network;
use watchtower_core::constants::DEFAULT_RESOLVE_TIMEOUT_MS;

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    pub server: ServerConfig,
    pub alchemy: AlchemyConfig,
    #[serde(default)]
    pub watcher: WatcherConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlchemyConfig {
    pub api_key: String,

    #[serde(default = "default_base_domain")]
    pub base_domain: String,

    #[serde(default = "default_cache_ttl_seconds")]
    pub cache_ttl_seconds: u64,

    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
    /// Network used when a request does not name one.
    pub default_network: Network,
    pub resolve_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".into(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            default_network: Network::EthMainnet,
            resolve_timeout_ms: DEFAULT_RESOLVE_TIMEOUT_MS,
        }
    }
}

fn default_base_domain() -> String {
    alchemy_core::transfers::DEFAULT_BASE_DOMAIN.to_string()
}

fn default_cache_ttl_seconds() -> u64 {
    60 * 60
}

fn default_cache_capacity() -> u64 {
    1_000
}

pub fn get_config() -> EngineConfig {
    let base_path = env::current_dir().expect("Failed to determine the current directory");
    let configuration_directory = base_path.join("configuration");

    // Detect the running environment
    let environment: Environment = env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .expect("Failed to parse APP_ENVIRONMENT");

    let environment_filename = format!("server_{}.yaml", environment.as_str());

    // Load configuration from files
    let config = Config::builder()
        .add_source(File::from(configuration_directory.join("server_base.yaml")))
        .add_source(File::from(
            configuration_directory.join(environment_filename),
        ))
        .add_source(config::Environment::with_prefix("app").separator("__"))
        .build()
        .unwrap_or_else(|e| {
            eprintln!("Configuration error: {}", e);
            panic!("Failed to build configuration");
        });

    // Deserialize the configuration
    config.try_deserialize::<EngineConfig>()
        .unwrap_or_else(|e| {
            eprintln!("Configuration error: {}", e);
            eprintln!("Make sure all required fields are set correctly in your configuration files or environment variables.");
            panic!("Failed to deserialize configuration");
        })
}

/// The possible runtime environment for our application.
pub enum Environment {
    Local,
    Development,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "development" => Ok(Self::Development),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local`, `development`, or `production`.",
                other
            )),
        }
    }
}
