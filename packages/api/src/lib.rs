//! # API crate: the FocusFuel HTTP service
//!
//! Everything the `web` binary serves lives here. The binary only loads
//! [`Settings`], connects the pool and hands an [`AppState`] to [`router`].
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`auth`] | Session tokens and the [`Session`](auth::Session) extractor, Argon2 password hashing, OAuth login |
//! | [`db`] | PostgreSQL pool (lazy `OnceCell` singleton), migrations, and [`PgStore`](db::PgStore) |
//! | [`error`] | [`ApiError`], rendered as `{"error": "..."}` |
//! | [`payload`] | JSON body extractor and per-field validation |
//! | [`progress`] | Daily buckets for the trailing 7 days |
//! | [`routes`] | Handlers and the axum router |
//! | [`settings`] | Layered configuration |
//! | [`state`] | Router state shared by handlers |

pub mod auth;
pub mod db;
pub mod error;
pub mod payload;
pub mod progress;
pub mod routes;
pub mod settings;
pub mod state;

pub use error::ApiError;
pub use routes::router;
pub use settings::Settings;
pub use state::AppState;
