//! Core abstractions shared by the migrator, the verifier and the driver.
//!
//! - [`schema`]: sides, column sets, type maps and enum constraints
//! - [`value`]: source values, rows and typed bind values
//! - [`traits`]: inspector, reader and writer traits implemented per database
//! - [`identifier`]: identifier validation and quoting

pub mod identifier;
pub mod schema;
pub mod traits;
pub mod value;

#[cfg(test)]
pub(crate) mod memory;

pub use schema::{parse_enum_values, ColumnSet, ColumnTypeMap, EnumConstraint, Side};
pub use traits::{SchemaInspector, SourceReader, TargetWriter, WritePlan, WriteStats};
pub use value::{BindValue, Row, SqlValue};
