//! # Database module: PostgreSQL pool, migrations and the `PgStore` gateway
//!
//! The pool is a **lazy, process-wide singleton** backed by a
//! [`tokio::sync::OnceCell`]. The first call to [`get_pool`] resolves the
//! connection string (`DATABASE_URL` if set, via `dotenvy`, otherwise
//! `database.url` from [`crate::settings::Settings`]), opens the pool and
//! caches it for all subsequent callers.
//!
//! ## Re-exports
//!
//! - [`get_pool`] returns `&'static PgPool`, initialising it on first use.
//! - [`migrate`] applies the embedded migrations in `packages/api/migrations`.
//! - [`PgStore`] is the [`store::Store`] implementation over that pool.

mod pool;
mod postgres;

pub use pool::{get_pool, migrate};
pub use postgres::PgStore;
