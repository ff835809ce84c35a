//! In-memory database used by migrator and verifier tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::schema::{parse_enum_values, ColumnSet, ColumnTypeMap, EnumConstraint, Side};
use super::traits::{SchemaInspector, SourceReader, TargetWriter, WritePlan, WriteStats};
use super::value::{BindValue, Row, SqlValue};
use crate::error::{MigrateError, Result};

#[derive(Debug, Clone, Default)]
pub struct MemTable {
    /// (name, declared type)
    pub columns: Vec<(String, String)>,
    pub primary_key: Vec<String>,
    pub rows: Vec<Row>,
}

impl MemTable {
    pub fn new(columns: &[(&str, &str)]) -> Self {
        Self {
            columns: columns
                .iter()
                .map(|(n, t)| (n.to_string(), t.to_string()))
                .collect(),
            primary_key: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn with_key(mut self, key: &str) -> Self {
        self.primary_key = vec![key.to_string()];
        self
    }

    pub fn with_row(mut self, values: &[(&str, SqlValue)]) -> Self {
        self.rows.push(
            values
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        );
        self
    }
}

pub struct MemoryDatabase {
    side: Side,
    tables: Mutex<HashMap<String, MemTable>>,
    calls: AtomicUsize,
    /// Fail the write phase when this row index is reached.
    fail_at_row: Option<usize>,
    /// Fail every `row_count` call.
    fail_row_count: bool,
}

impl MemoryDatabase {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            tables: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
            fail_at_row: None,
            fail_row_count: false,
        }
    }

    pub fn with_table(self, name: &str, table: MemTable) -> Self {
        self.tables
            .lock()
            .unwrap()
            .insert(name.to_string(), table);
        self
    }

    pub fn failing_at_row(mut self, row: usize) -> Self {
        self.fail_at_row = Some(row);
        self
    }

    pub fn failing_row_count(mut self) -> Self {
        self.fail_row_count = true;
        self
    }

    /// Number of trait calls made against this database.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .map(|t| t.rows.clone())
            .unwrap_or_default()
    }

    fn table(&self, name: &str) -> Result<MemTable> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tables
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| MigrateError::schema(name, "table cannot be described"))
    }
}

fn stored(value: &BindValue) -> SqlValue {
    match value {
        BindValue::Null => SqlValue::Null,
        BindValue::Int(v) => SqlValue::Int(*v),
        BindValue::UInt(v) => SqlValue::UInt(*v),
        BindValue::Float(v) => SqlValue::Float(*v),
        BindValue::Binary(b) => SqlValue::from_bytes(b.clone()),
        BindValue::Text(s) => SqlValue::Text(s.clone()),
    }
}

#[async_trait]
impl SchemaInspector for MemoryDatabase {
    fn side(&self) -> Side {
        self.side
    }

    async fn table_exists(&self, table: &str) -> Result<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.tables.lock().unwrap().contains_key(table))
    }

    async fn columns(&self, table: &str) -> Result<ColumnSet> {
        Ok(self.table(table)?.columns.into_iter().map(|(n, _)| n).collect())
    }

    async fn column_types(&self, table: &str) -> Result<ColumnTypeMap> {
        Ok(self.table(table)?.columns.into_iter().collect())
    }

    async fn enum_allowed_values(&self, table: &str, column: &str) -> Result<EnumConstraint> {
        let table = match self.table(table) {
            Ok(t) => t,
            Err(_) => return Ok(Vec::new()),
        };
        Ok(table
            .columns
            .iter()
            .find(|(n, _)| n == column)
            .map(|(_, t)| parse_enum_values(t))
            .unwrap_or_default())
    }

    async fn primary_key(&self, table: &str) -> Result<Vec<String>> {
        Ok(self.table(table)?.primary_key)
    }

    async fn row_count(&self, table: &str) -> Result<u64> {
        let rows = self.table(table)?.rows.len() as u64;
        if self.fail_row_count {
            return Err(MigrateError::pool("connection reset", "counting rows"));
        }
        Ok(rows)
    }

    async fn ping(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl SourceReader for MemoryDatabase {
    async fn fetch_rows(&self, table: &str, columns: &[String]) -> Result<Vec<Row>> {
        let table = self.table(table)?;
        Ok(table
            .rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .filter(|(k, _)| columns.contains(k))
                    .collect()
            })
            .collect())
    }
}

#[async_trait]
impl TargetWriter for MemoryDatabase {
    async fn truncate(&self, table: &str) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(t) = self.tables.lock().unwrap().get_mut(table) {
            t.rows.clear();
        }
        Ok(())
    }

    async fn write_rows(&self, plan: &WritePlan, rows: Vec<Vec<BindValue>>) -> Result<WriteStats> {
        // Work on a copy and swap it in only on success.
        let mut staged = self.table(&plan.table)?;
        let mut stats = WriteStats::default();
        if plan.clear_first {
            staged.rows.clear();
        }

        for (n, row) in rows.iter().enumerate() {
            if self.fail_at_row == Some(n) {
                return Err(MigrateError::write(&plan.table, format!("row {} rejected", n)));
            }

            let key = plan.row_key(row);
            let existing = key.as_ref().and_then(|key| {
                staged.rows.iter().position(|r| {
                    plan.key_columns
                        .iter()
                        .zip(key.iter())
                        .all(|(col, v)| r.get(col) == Some(&stored(v)))
                })
            });

            match existing {
                Some(pos) => {
                    let non_key = plan.non_key_indices();
                    if non_key.is_empty() {
                        continue;
                    }
                    for i in non_key {
                        staged.rows[pos].insert(plan.columns[i].clone(), stored(&row[i]));
                    }
                    stats.updated += 1;
                }
                None => {
                    staged.rows.push(
                        plan.columns
                            .iter()
                            .cloned()
                            .zip(row.iter().map(stored))
                            .collect(),
                    );
                    stats.inserted += 1;
                }
            }
        }

        self.tables
            .lock()
            .unwrap()
            .insert(plan.table.clone(), staged);
        Ok(stats)
    }
}
