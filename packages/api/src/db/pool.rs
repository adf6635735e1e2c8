//! Database connection pool using the OnceCell pattern.

use sqlx::migrate::MigrateError;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio::sync::OnceCell;

use crate::settings::Database;

static POOL: OnceCell<PgPool> = OnceCell::const_new();

/// Get or initialize the database connection pool.
/// `DATABASE_URL` takes precedence over the configured url.
pub async fn get_pool(config: &Database) -> Result<&'static PgPool, sqlx::Error> {
    POOL.get_or_try_init(|| async {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| config.url.clone());

        PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&database_url)
            .await
    })
    .await
}

/// Run the embedded migrations.
pub async fn migrate(pool: &PgPool) -> Result<(), MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
