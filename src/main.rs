use anyhow::Result;
use stock_guard::config::{LoggingSettings, Settings};
use stock_guard::domain::config_types::LogFormat;
use stock_guard::infrastructure::log_messages::application as msg;
use stock_guard::Application;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing(logging: &LoggingSettings) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.as_str()));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match logging.format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Full => builder.init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::new()?;
    init_tracing(&settings.logging);

    info!(strategy = %settings.run.strategy, "{}", msg::STARTING);

    let app = Application::with_settings(settings).await?;
    let report = app.run().await?;

    println!("{}", serde_json::to_string_pretty(&report.summary())?);

    Ok(())
}
