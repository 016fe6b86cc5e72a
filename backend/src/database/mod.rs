use sqlx::{PgPool, Postgres, Transaction};
use std::time::Duration;

use crate::error::AppError;

/// Connection pool configuration.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

impl DatabaseConfig {
    pub fn from_url(url: String) -> Self {
        Self {
            url,
            max_connections: 20,
            min_connections: 2,
            connect_timeout: Duration::from_secs(10),
            idle_timeout: Duration::from_secs(600),
            max_lifetime: Duration::from_secs(1800),
        }
    }
}

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn new(config: DatabaseConfig) -> Result<Self, AppError> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(config.idle_timeout)
            .max_lifetime(config.max_lifetime)
            .connect(&config.url)
            .await
            .map_err(|e| AppError::Database(e))?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs pending migrations from `./migrations`. Idempotent.
    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("migration failed: {e}")))?;
        Ok(())
    }

    pub async fn health_check(&self) -> DatabaseHealth {
        let start = std::time::Instant::now();
        let result = sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(&self.pool).await;
        let response_time = start.elapsed();

        match result {
            Ok(_) => DatabaseHealth {
                is_healthy: true,
                response_time,
                pool_size: self.pool.size(),
                idle_connections: self.pool.num_idle() as u32,
                error: None,
            },
            Err(e) => DatabaseHealth {
                is_healthy: false,
                response_time,
                pool_size: self.pool.size(),
                idle_connections: self.pool.num_idle() as u32,
                error: Some(e.to_string()),
            },
        }
    }

    pub async fn begin_transaction(&self) -> Result<Transaction<'_, Postgres>, AppError> {
        self.pool.begin().await.map_err(AppError::from)
    }

    /// Runs `f` inside a transaction, committing on `Ok` and rolling back on `Err`.
    pub async fn with_transaction<F, R>(&self, f: F) -> Result<R, AppError>
    where
        F: for<'c> FnOnce(
            &mut Transaction<'c, Postgres>,
        ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<R, AppError>> + Send + 'c>>,
    {
        let mut tx = self.begin_transaction().await?;
        match f(&mut tx).await {
            Ok(result) => {
                tx.commit().await.map_err(AppError::from)?;
                Ok(result)
            }
            Err(e) => {
                tx.rollback().await.map_err(AppError::from)?;
                Err(e)
            }
        }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseHealth {
    pub is_healthy: bool,
    pub response_time: Duration,
    pub pool_size: u32,
    pub idle_connections: u32,
    pub error: Option<String>,
}
