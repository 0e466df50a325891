//! Database layer
//!
//! This module provides database access for the Kindred backend:
//! - SQLite connection pool management
//! - Embedded code-based migrations
//! - Repository implementations per entity
//!
//! # Usage
//!
//! ```ignore
//! use kindred::config::DatabaseConfig;
//! use kindred::db::{create_pool, migrations};
//!
//! let pool = create_pool(&config).await?;
//! migrations::run_migrations(&pool).await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{create_pool, create_test_pool, DbPool};
