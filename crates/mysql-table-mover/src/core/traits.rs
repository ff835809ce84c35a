//! Core traits for reading one database and writing the other.
//!
//! - [`SchemaInspector`]: existence and shape of a table on one side
//! - [`SourceReader`]: fetches projected rows
//! - [`TargetWriter`]: truncates and writes transformed rows in one transaction
//!
//! The migrator and the verifier are generic over these traits; the MySQL
//! driver implements all three for either side.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::typemap::BindCategory;

use super::schema::{ColumnSet, ColumnTypeMap, EnumConstraint, Side};
use super::value::{BindValue, Row};

/// Describe tables on one side.
#[async_trait]
pub trait SchemaInspector: Send + Sync {
    /// Which side this endpoint is.
    fn side(&self) -> Side;

    /// True if the table exists. Only connectivity failures are errors.
    async fn table_exists(&self, table: &str) -> Result<bool>;

    /// Column names in declaration order.
    async fn columns(&self, table: &str) -> Result<ColumnSet>;

    /// Declared type string per column.
    async fn column_types(&self, table: &str) -> Result<ColumnTypeMap>;

    /// Members of an enum column; empty if not an enum or not present.
    async fn enum_allowed_values(&self, table: &str, column: &str) -> Result<EnumConstraint>;

    /// Primary key columns in key order; empty if the table has none.
    async fn primary_key(&self, table: &str) -> Result<Vec<String>>;

    /// `COUNT(*)` of the table.
    async fn row_count(&self, table: &str) -> Result<u64>;

    /// Round-trip a trivial query.
    async fn ping(&self) -> Result<()>;
}

/// Read rows from the source side.
#[async_trait]
pub trait SourceReader: SchemaInspector {
    /// All rows of `table`, restricted to `columns`.
    async fn fetch_rows(&self, table: &str, columns: &[String]) -> Result<Vec<Row>>;
}

/// Write rows to the target side.
#[async_trait]
pub trait TargetWriter: SchemaInspector {
    /// Remove every row from the table.
    async fn truncate(&self, table: &str) -> Result<()>;

    /// Write `rows` (aligned with `plan.columns`) in a single transaction.
    ///
    /// With `plan.clear_first` the existing rows are deleted inside the same
    /// transaction. Any failure rolls back the delete and every row.
    async fn write_rows(&self, plan: &WritePlan, rows: Vec<Vec<BindValue>>) -> Result<WriteStats>;
}

/// Everything a writer needs to build its statements for one table.
#[derive(Debug, Clone)]
pub struct WritePlan {
    pub table: String,
    /// Projected columns, the order of every row.
    pub columns: Vec<String>,
    /// Bind category per projected column.
    pub categories: Vec<BindCategory>,
    /// Primary key columns of the target table.
    pub key_columns: Vec<String>,
    /// Upsert by primary key instead of plain insert.
    pub update_existing: bool,
    /// Delete every existing row before inserting (replace mode).
    pub clear_first: bool,
}

impl WritePlan {
    /// Positions of the key columns within `columns`.
    ///
    /// `None` when upserting is impossible: no key, or a key column is not
    /// projected.
    pub fn key_indices(&self) -> Option<Vec<usize>> {
        if self.key_columns.is_empty() {
            return None;
        }
        self.key_columns
            .iter()
            .map(|k| self.columns.iter().position(|c| c == k))
            .collect()
    }

    /// Positions of the projected columns that are not part of the key.
    pub fn non_key_indices(&self) -> Vec<usize> {
        (0..self.columns.len())
            .filter(|&i| !self.key_columns.contains(&self.columns[i]))
            .collect()
    }

    /// Key values of a row when updating and the row carries a full key.
    pub fn row_key<'r>(&self, row: &'r [BindValue]) -> Option<Vec<&'r BindValue>> {
        if !self.update_existing {
            return None;
        }
        let indices = self.key_indices()?;
        let key: Vec<&BindValue> = indices.iter().map(|&i| &row[i]).collect();
        if key.iter().any(|v| matches!(v, BindValue::Null)) {
            return None;
        }
        Some(key)
    }
}

/// Rows written by one table's write phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteStats {
    pub inserted: u64,
    pub updated: u64,
}

impl WriteStats {
    pub fn total(&self) -> u64 {
        self.inserted + self.updated
    }
}
