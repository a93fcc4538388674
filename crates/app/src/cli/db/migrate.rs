use fleetdesk_app::{config::AppConfig, database};

use crate::cli::error_chain;

pub(crate) async fn run(config: &AppConfig) -> Result<(), String> {
    let registry_url = config
        .database
        .registry_url()
        .map_err(|error| error.to_string())?;

    let pool = database::connect(registry_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    let migrated = sqlx::migrate!("../../migrations/registry")
        .run(&pool)
        .await
        .map_err(|error| format!("failed to migrate registry: {}", error_chain(&error)));

    pool.close().await;

    migrated?;

    println!("registry migrations applied");

    Ok(())
}
