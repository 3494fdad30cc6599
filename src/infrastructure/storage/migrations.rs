//! Database migrations infrastructure

use sqlx::postgres::PgPool;

use crate::config::DirectoryConfig;
use crate::domain::DomainError;

/// Represents a database migration
#[derive(Debug, Clone)]
pub struct Migration {
    /// Migration version, ascending
    pub version: i64,
    /// Human-readable description
    pub description: String,
    /// SQL to run when applying the migration
    pub up: String,
    /// SQL to run when reverting the migration
    pub down: String,
}

impl Migration {
    pub fn new(
        version: i64,
        description: impl Into<String>,
        up: impl Into<String>,
        down: impl Into<String>,
    ) -> Self {
        Self {
            version,
            description: description.into(),
            up: up.into(),
            down: down.into(),
        }
    }
}

/// PostgreSQL migrator recording applied versions in a `_migrations` table
#[derive(Debug)]
pub struct PostgresMigrator {
    pool: PgPool,
}

impl PostgresMigrator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the migrations ledger table if it doesn't exist
    async fn ensure_migrations_table(&self) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version BIGINT PRIMARY KEY,
                description TEXT NOT NULL,
                installed_on TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create migrations table: {}", e)))?;

        Ok(())
    }

    /// Runs every pending migration, in version order
    pub async fn run_all(&self, migrations: &[Migration]) -> Result<(), DomainError> {
        for migration in migrations {
            self.run_migration(migration).await?;
        }
        Ok(())
    }

    /// Runs a single migration; applying an already-applied version is
    /// a no-op
    pub async fn run_migration(&self, migration: &Migration) -> Result<(), DomainError> {
        self.ensure_migrations_table().await?;

        if self.is_applied(migration.version).await? {
            return Ok(());
        }

        sqlx::query(&migration.up)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DomainError::storage(format!(
                    "Failed to run migration {}: {}",
                    migration.version, e
                ))
            })?;

        sqlx::query("INSERT INTO _migrations (version, description) VALUES ($1, $2)")
            .bind(migration.version)
            .bind(&migration.description)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DomainError::storage(format!(
                    "Failed to record migration {}: {}",
                    migration.version, e
                ))
            })?;

        Ok(())
    }

    /// Reverts a single migration if it was applied
    pub async fn revert_migration(&self, migration: &Migration) -> Result<(), DomainError> {
        self.ensure_migrations_table().await?;

        if !self.is_applied(migration.version).await? {
            return Ok(());
        }

        sqlx::query(&migration.down)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DomainError::storage(format!(
                    "Failed to revert migration {}: {}",
                    migration.version, e
                ))
            })?;

        sqlx::query("DELETE FROM _migrations WHERE version = $1")
            .bind(migration.version)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DomainError::storage(format!(
                    "Failed to remove migration record {}: {}",
                    migration.version, e
                ))
            })?;

        Ok(())
    }

    /// Returns the latest applied migration version
    pub async fn current_version(&self) -> Result<Option<i64>, DomainError> {
        self.ensure_migrations_table().await?;

        let version: Option<i64> = sqlx::query_scalar("SELECT MAX(version) FROM _migrations")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get migration version: {}", e)))?;

        Ok(version)
    }

    async fn is_applied(&self, version: i64) -> Result<bool, DomainError> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM _migrations WHERE version = $1)")
            .bind(version)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to check migration status: {}", e)))
    }
}

/// The migration set for a deployment
///
/// The base schema always carries the email unique index; the phone and
/// name indexes are added only when the corresponding uniqueness policy is
/// on, so the database enforces exactly the configured invariants.
pub fn directory_migrations(directory: &DirectoryConfig) -> Vec<Migration> {
    let mut migrations = vec![Migration::new(
        1,
        "Create users table",
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id BIGSERIAL PRIMARY KEY,
            name VARCHAR(80) NOT NULL,
            email VARCHAR(255) NOT NULL,
            phone VARCHAR(15),
            password_hash VARCHAR(255) NOT NULL,
            status BOOLEAN NOT NULL DEFAULT TRUE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        );
        CREATE UNIQUE INDEX IF NOT EXISTS users_email_key ON users(email);
        "#,
        r#"
        DROP TABLE IF EXISTS users;
        "#,
    )];

    if directory.unique_phone {
        migrations.push(Migration::new(
            2,
            "Add unique phone index",
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS users_phone_key
            ON users(phone) WHERE phone IS NOT NULL;
            "#,
            r#"
            DROP INDEX IF EXISTS users_phone_key;
            "#,
        ));
    }

    if directory.unique_name {
        migrations.push(Migration::new(
            3,
            "Add unique name index",
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS users_name_key ON users(name);
            "#,
            r#"
            DROP INDEX IF EXISTS users_name_key;
            "#,
        ));
    }

    migrations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_migrations() {
        let migrations = directory_migrations(&DirectoryConfig::default());

        let descriptions: Vec<&str> =
            migrations.iter().map(|m| m.description.as_str()).collect();
        assert_eq!(
            descriptions,
            vec!["Create users table", "Add unique phone index"]
        );
    }

    #[test]
    fn test_name_unique_policy_adds_index_migration() {
        let config = DirectoryConfig {
            unique_name: true,
            ..DirectoryConfig::default()
        };

        let migrations = directory_migrations(&config);
        assert!(
            migrations
                .iter()
                .any(|m| m.up.contains("users_name_key"))
        );
    }

    #[test]
    fn test_versions_are_ascending() {
        let config = DirectoryConfig {
            unique_name: true,
            unique_phone: true,
            ..DirectoryConfig::default()
        };

        let migrations = directory_migrations(&config);
        let versions: Vec<i64> = migrations.iter().map(|m| m.version).collect();
        let mut sorted = versions.clone();
        sorted.sort_unstable();
        assert_eq!(versions, sorted);
    }
}
