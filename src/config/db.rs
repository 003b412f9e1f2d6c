// src/config/db.rs
// DOCUMENTATION: Storage initialization
// PURPOSE: Build the GopherStore selected by configuration

use crate::config::{Config, StorageBackend};
use crate::db::{MemoryGopherStore, PgGopherStore, Storer};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::sync::Arc;
use std::time::Duration;

/// Initialize PostgreSQL connection pool
/// DOCUMENTATION: Creates connection pool with optimal settings
/// Called once during application startup
pub async fn init_db_pool(config: &Config) -> Result<PgPool, sqlx::Error> {
    log::info!("Initializing database pool");

    let pool = PgPoolOptions::new()
        // Maximum concurrent connections
        .max_connections(config.db_max_connections)
        // Timeout waiting for connection from pool
        .acquire_timeout(Duration::from_secs(config.db_connection_timeout))
        // Connection idle timeout (5 minutes)
        .idle_timeout(Duration::from_secs(300))
        // Connection lifetime (30 minutes before recycle)
        .max_lifetime(Duration::from_secs(1800))
        .connect(&config.database_url)
        .await?;

    // Verify connection works
    sqlx::query("SELECT 1").execute(&pool).await?;

    log::info!("Database pool initialized successfully");
    Ok(pool)
}

/// Open the configured backend, creating the schema when it is PostgreSQL
pub async fn init_store(config: &Config) -> anyhow::Result<Storer> {
    let store: Storer = match config.storage_backend().map_err(anyhow::Error::msg)? {
        StorageBackend::Memory => Arc::new(MemoryGopherStore::new()),
        StorageBackend::Postgres => {
            let pool = init_db_pool(config).await?;
            Arc::new(PgGopherStore::with_tables(pool, config.tables.clone()).await?)
        }
    };

    log::info!("Storage backend: {}", config.backend);
    Ok(store)
}
