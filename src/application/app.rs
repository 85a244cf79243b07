use crate::config::Settings;
use crate::infrastructure::database::Database;
use crate::infrastructure::log_messages::application as msg;
use crate::Result;
use std::sync::Arc;
use tracing::{info, instrument};

use super::simulation::{RunParameters, Simulation};
use super::worker_pool::RunReport;

/// Main application struct that coordinates all components
pub struct Application {
    settings: Settings,
    database: Database,
}

impl Application {
    #[instrument]
    pub async fn new() -> Result<Self> {
        let settings = Settings::new()?;
        Self::with_settings(settings).await
    }

    #[instrument(skip_all)]
    pub async fn with_settings(settings: Settings) -> Result<Self> {
        info!(
            host = %settings.database.host,
            port = %settings.database.port,
            "{}",
            msg::CONNECTING_TO_DATABASE
        );
        let database = Database::connect(&settings.database).await?;
        database.health_check().await?;
        database.counter_store().ensure_schema().await?;

        Ok(Self { settings, database })
    }

    /// Reset the table, seed the counter and run every worker once
    #[instrument(skip(self))]
    pub async fn run(self) -> Result<RunReport> {
        let store = Arc::new(self.database.counter_store());
        store.reset().await?;

        let params = RunParameters::from(&self.settings.run);
        let result = Simulation::new(store, params).run().await?;

        result.report.log();
        info!(
            final_stock = %result.final_state.value,
            final_version = %result.final_state.version,
            "{}",
            msg::ALL_WORKERS_FINISHED
        );

        Ok(result.report)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}
