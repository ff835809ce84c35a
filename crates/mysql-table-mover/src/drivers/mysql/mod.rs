//! MySQL/MariaDB driver.
//!
//! [`MysqlDatabase`] is one side of the migration. It implements
//! [`SchemaInspector`](crate::core::SchemaInspector),
//! [`SourceReader`](crate::core::SourceReader) and
//! [`TargetWriter`](crate::core::TargetWriter) over `mysql_async`.
//!
//! Connections are short-lived: each logical operation (probe, fetch,
//! write) opens its own connection and disconnects when done, so no
//! connection is held across tables.
//!
//! # Supported Versions
//!
//! - MySQL 5.7+, 8.0+
//! - MariaDB 10.2+

mod database;

pub use database::{mysql_value_to_sql, MysqlDatabase};
