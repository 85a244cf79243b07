use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

use crate::domain::config_types::{
    DatabaseName, DatabasePassword, DatabaseUsername, DelayMs, Host, LogFormat, LogLevel,
    MaxConnections, Port,
};
use crate::domain::{CounterName, MaxAttempts, Quantity, StockLevel, Strategy, WorkerCount};

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub run: RunSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub host: Host,
    pub port: Port,
    pub username: DatabaseUsername,
    pub password: DatabasePassword,
    pub database_name: DatabaseName,
    pub max_connections: MaxConnections,
}

impl DatabaseSettings {
    pub fn url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username,
            self.password.as_ref(),
            self.host,
            self.port,
            self.database_name
        )
    }
}

/// Parameters of one reservation run
#[derive(Debug, Deserialize, Clone)]
pub struct RunSettings {
    pub strategy: Strategy,
    pub counter_name: CounterName,
    pub initial_stock: StockLevel,
    pub worker_count: WorkerCount,
    pub quantity: Quantity,
    /// Optimistic path only
    pub max_attempts: MaxAttempts,
    /// Optimistic path only
    pub backoff_ms: DelayMs,
    pub work_delay_ms: DelayMs,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    pub level: LogLevel,
    pub format: LogFormat,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Start with default values
            .set_default("database.host", "localhost")?
            .set_default("database.port", 5433)?
            .set_default("database.username", "postgres")?
            .set_default("database.password", "postgres")?
            .set_default("database.database_name", "database")?
            .set_default("database.max_connections", 10)?
            .set_default("run.strategy", "optimistic")?
            .set_default("run.counter_name", "Sugar")?
            .set_default("run.initial_stock", 10)?
            .set_default("run.worker_count", 20)?
            .set_default("run.quantity", 1)?
            .set_default("run.max_attempts", 2)?
            .set_default("run.backoff_ms", 50)?
            .set_default("run.work_delay_ms", 100)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "compact")?
            // Add configuration file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{environment}")).required(false))
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables with prefix
            .add_source(Environment::with_prefix("STOCK_GUARD").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    pub fn database_url(&self) -> String {
        self.database.url()
    }
}
