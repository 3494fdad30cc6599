//! Migrate command - explicit schema bootstrap, separate from serving

use clap::Args;
use tracing::info;

use crate::config::AppConfig;
use crate::infrastructure::logging;
use crate::infrastructure::storage::{PostgresMigrator, directory_migrations};

#[derive(Args)]
pub struct MigrateArgs {
    /// Revert the most recently applied migration instead of applying
    #[arg(long)]
    pub revert: bool,
}

/// Apply or revert the schema migrations for the configured policy
pub async fn run(args: MigrateArgs) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().unwrap_or_default();
    logging::init_logging(&logging::LoggingConfig {
        level: config.logging.level.clone(),
        format: config.logging.format.clone(),
    });

    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

    let pool = sqlx::PgPool::connect(&database_url).await?;
    let migrator = PostgresMigrator::new(pool);
    let migrations = directory_migrations(&config.directory);

    if args.revert {
        let Some(version) = migrator.current_version().await? else {
            info!("No applied migrations to revert");
            return Ok(());
        };

        let Some(migration) = migrations.iter().find(|m| m.version == version) else {
            anyhow::bail!(
                "Applied version {} is not in the configured migration set",
                version
            );
        };

        migrator.revert_migration(migration).await?;
        info!(
            "Reverted migration {} ({})",
            migration.version, migration.description
        );
    } else {
        migrator.run_all(&migrations).await?;
        info!(
            "Schema is at version {:?}",
            migrator.current_version().await?
        );
    }

    Ok(())
}
