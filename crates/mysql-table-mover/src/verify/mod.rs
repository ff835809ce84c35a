//! Post-migration row-count verification.
//!
//! Compares `COUNT(*)` of a table on both sides. This checks cardinality
//! only, not row content.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::SchemaInspector;
use crate::error::{MigrateError, Result};

/// Row counts of one table on both sides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyReport {
    pub table: String,
    pub source_count: u64,
    pub target_count: u64,
}

impl VerifyReport {
    pub fn matches(&self) -> bool {
        self.source_count == self.target_count
    }
}

/// Row-count verifier over any pair of inspectors.
pub struct Verifier<S, T> {
    source: Arc<S>,
    target: Arc<T>,
}

impl<S, T> Verifier<S, T>
where
    S: SchemaInspector,
    T: SchemaInspector,
{
    pub fn new(source: Arc<S>, target: Arc<T>) -> Self {
        Self { source, target }
    }

    /// Count rows on both sides and log whether they match.
    ///
    /// A mismatch is reported, not raised.
    pub async fn check(&self, table: &str) -> Result<VerifyReport> {
        let report = VerifyReport {
            table: table.to_string(),
            source_count: self.count(self.source.as_ref(), table).await?,
            target_count: self.count(self.target.as_ref(), table).await?,
        };

        if report.matches() {
            info!("{}: {} rows (match)", table, report.source_count);
        } else {
            warn!(
                "{}: source={} target={} (MISMATCH)",
                table, report.source_count, report.target_count
            );
        }
        Ok(report)
    }

    /// Verify one table; unequal counts are a `VerificationMismatch` error.
    pub async fn verify_table(&self, table: &str) -> Result<VerifyReport> {
        let report = self.check(table).await?;
        if report.matches() {
            return Ok(report);
        }
        Err(MigrateError::VerificationMismatch {
            table: report.table,
            source_count: report.source_count,
            target_count: report.target_count,
        })
    }

    async fn count<I>(&self, side: &I, table: &str) -> Result<u64>
    where
        I: SchemaInspector + ?Sized,
    {
        if !side.table_exists(table).await? {
            return Err(MigrateError::schema(
                table,
                format!("table does not exist on the {} database", side.side()),
            ));
        }
        side.row_count(table).await
    }
}

/// Check several tables, collecting every report.
///
/// Mismatches are returned as reports; any other failure stops the loop.
pub async fn verify_tables<S, T>(
    verifier: &Verifier<S, T>,
    tables: &[String],
) -> Result<Vec<VerifyReport>>
where
    S: SchemaInspector,
    T: SchemaInspector,
{
    let mut reports = Vec::with_capacity(tables.len());
    for table in tables {
        reports.push(verifier.check(table).await?);
    }
    Ok(reports)
}
