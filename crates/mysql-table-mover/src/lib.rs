//! # mysql-table-mover
//!
//! Table-by-table data migration between two MySQL/MariaDB databases whose
//! schemas have drifted apart.
//!
//! For every table the library:
//!
//! - **Reconciles** columns present on both sides, minus a per-table skip list
//! - **Truncates or upserts** depending on the table's replace/update policy
//! - **Repairs values**: class-name renames, enum fallback, character substitution
//! - **Binds by target type** (integer, float, binary, text)
//! - **Writes atomically**: one transaction per table, rolled back on any failure
//!
//! ## Example
//!
//! ```rust,no_run
//! use mysql_table_mover::{Config, Migrator};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> mysql_table_mover::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let migrator = Migrator::mysql(config);
//!     let result = migrator.run(CancellationToken::new()).await?;
//!     println!("Wrote {} rows", result.rows_written);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod drivers;
pub mod entity;
pub mod error;
pub mod orchestrator;
pub mod reconcile;
pub mod transform;
pub mod typemap;
pub mod verify;

// Re-exports for convenient access
pub use config::{Config, ConnectionProfile, MigrationConfig, MigrationPolicy, MissingSourcePolicy};
pub use crate::core::{BindValue, Side, SqlValue};
pub use drivers::mysql::MysqlDatabase;
pub use entity::{ConfigEntityResolver, EntityResolver};
pub use error::{MigrateError, Result};
pub use orchestrator::{
    HealthCheckResult, MigrationResult, Migrator, PlanEntry, TableOutcome, TableReport,
};
pub use reconcile::reconcile;
pub use typemap::BindCategory;
pub use verify::{Verifier, VerifyReport};
