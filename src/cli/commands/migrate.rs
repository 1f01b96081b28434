use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::database::DatabaseManager;

pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    let url = config
        .database
        .url
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set to run migrations"))?;

    let manager = DatabaseManager::connect(url, &config.database).await?;
    let result = manager.migrate().await;
    manager.close().await;
    result?;

    output_success(&output_format, "Migrations applied", Some(json!({ "migrated": true })))
}
