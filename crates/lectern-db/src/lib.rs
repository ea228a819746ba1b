//! Lectern DB - Database abstractions
//!
//! SQLx-based persistence for the access-control core. Every component talks
//! to the datastore through the async repository traits in [`repo`]; the
//! PostgreSQL implementations live in [`pg`].
//!
//! # Example
//!
//! ```rust,ignore
//! use lectern_db::{create_pool, run_migrations, Repositories};
//!
//! let pool = create_pool("postgres://localhost/lectern").await?;
//! run_migrations(&pool).await?;
//! let repos = Repositories::new(pool);
//!
//! let user = repos.users.find_by_email("student@uni.edu").await?;
//! ```

pub mod error;
pub mod models;
pub mod pg;
pub mod pool;
pub mod repo;

pub use error::{DbError, DbResult};
pub use models::*;
pub use pg::Repositories;
pub use pool::{create_pool, create_pool_with_options, run_migrations, DbPool, PoolOptions};
pub use repo::*;
