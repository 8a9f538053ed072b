use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use std::time::Duration;
use tracing::{debug, error, info};

use crate::config::AppConfig;
use crate::errors::ServiceError;

/// Type alias for a database connection pool
pub type DbPool = DatabaseConnection;

/// Configuration for database connection
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Database connection URL
    pub url: String,
    /// Maximum number of connections
    pub max_connections: u32,
    /// Minimum number of connections
    pub min_connections: u32,
    /// Connection timeout duration
    pub connect_timeout: Duration,
    /// Idle timeout duration
    pub idle_timeout: Duration,
    /// Acquire connection timeout
    pub acquire_timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            acquire_timeout: Duration::from_secs(8),
        }
    }
}

impl DbConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            url: config.database_url.clone(),
            max_connections: config.database.max_connections,
            min_connections: config.database.min_connections,
            connect_timeout: Duration::from_secs(config.database.connect_timeout_secs),
            idle_timeout: Duration::from_secs(config.database.idle_timeout_secs),
            acquire_timeout: Duration::from_secs(config.database.acquire_timeout_secs),
        }
    }
}

/// Establishes a connection pool to the database with default settings.
pub async fn establish_connection(database_url: &str) -> Result<DbPool, ServiceError> {
    let config = DbConfig {
        url: database_url.to_string(),
        ..Default::default()
    };

    establish_connection_with_config(&config).await
}

/// Establishes a connection pool with custom configuration. Every timeout is
/// bounded; pool exhaustion surfaces as a retryable error rather than a hang.
pub async fn establish_connection_with_config(config: &DbConfig) -> Result<DbPool, ServiceError> {
    debug!("Configuring database connection with: {:?}", config);

    let mut opt = ConnectOptions::new(config.url.clone());
    opt.max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(config.connect_timeout)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(config.idle_timeout)
        .sqlx_logging(false);

    let connection = Database::connect(opt).await.map_err(|e| {
        error!(error = %e, "Failed to establish database connection");
        ServiceError::DatabaseError(e)
    })?;

    info!("Database connection established");
    Ok(connection)
}

/// Pings the database; cheap liveness probe for health endpoints.
pub async fn health_check(db: &DbPool) -> Result<(), ServiceError> {
    db.execute_unprepared("SELECT 1").await.map_err(|e| {
        error!(error = %e, "Database health check failed");
        ServiceError::DatabaseError(e)
    })?;
    Ok(())
}
