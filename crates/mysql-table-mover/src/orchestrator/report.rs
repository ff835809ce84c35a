//! Per-table and per-run results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::MigrationPolicy;
use crate::core::WriteStats;
use crate::error::{MigrateError, Result};
use crate::transform::TransformStats;
use crate::verify::VerifyReport;

/// Terminal state of one table's migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableOutcome {
    /// Excluded by `tables_to_skip`; no query was issued.
    Skipped,
    /// Absent on the source under `missing_source: warn`.
    MissingSource,
    /// No column survives reconciliation.
    NoCommonFields,
    /// The source table is empty.
    NoData,
    /// Rows were written and committed.
    Migrated,
    /// The table failed; see `error`.
    Failed,
}

impl TableOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, TableOutcome::Failed)
    }
}

/// What happened to one table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableReport {
    pub table: String,
    pub outcome: TableOutcome,
    /// `replace`, `update` or `skip`.
    pub mode: String,
    /// Columns copied, in source order.
    pub columns: Vec<String>,
    pub rows_read: u64,
    pub rows_inserted: u64,
    pub rows_updated: u64,
    pub classes_renamed: u64,
    pub enum_repairs: u64,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification: Option<VerifyReport>,
    /// Row counts could not be read after a successful write.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TableReport {
    pub(crate) fn new(table: &str, policy: MigrationPolicy) -> Self {
        Self {
            table: table.to_string(),
            outcome: TableOutcome::Skipped,
            mode: policy.mode_name().to_string(),
            columns: Vec::new(),
            rows_read: 0,
            rows_inserted: 0,
            rows_updated: 0,
            classes_renamed: 0,
            enum_repairs: 0,
            duration_ms: 0,
            verification: None,
            verification_error: None,
            error: None,
        }
    }

    pub(crate) fn failed(table: &str, policy: MigrationPolicy, err: &MigrateError) -> Self {
        let mut report = Self::new(table, policy);
        report.outcome = TableOutcome::Failed;
        report.error = Some(err.to_string());
        report
    }

    pub(crate) fn record_write(&mut self, write: WriteStats, transform: TransformStats) {
        self.rows_inserted = write.inserted;
        self.rows_updated = write.updated;
        self.classes_renamed = transform.renamed;
        self.enum_repairs = transform.enum_repairs;
    }

    /// Rows inserted plus rows updated.
    pub fn rows_written(&self) -> u64 {
        self.rows_inserted + self.rows_updated
    }
}

/// Result of a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationResult {
    /// Unique run identifier.
    pub run_id: String,

    /// `completed`, `failed` or `cancelled`.
    pub status: String,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// When the run started.
    pub started_at: DateTime<Utc>,

    /// When the run completed.
    pub completed_at: DateTime<Utc>,

    /// Tables in the resolved run list.
    pub tables_total: usize,

    /// Tables that reached a non-failure outcome.
    pub tables_success: usize,

    /// Tables that failed.
    pub tables_failed: usize,

    /// Rows inserted or updated across all tables.
    pub rows_written: u64,

    /// Tables whose row counts differ after migration.
    pub mismatched_tables: Vec<String>,

    /// List of failed table names.
    pub failed_tables: Vec<String>,

    /// One report per attempted table, in run order.
    pub tables: Vec<TableReport>,
}

impl MigrationResult {
    pub(crate) fn from_reports(
        run_id: String,
        started_at: DateTime<Utc>,
        tables_total: usize,
        tables: Vec<TableReport>,
        cancelled: bool,
    ) -> Self {
        let completed_at = Utc::now();
        let duration_seconds = (completed_at - started_at).num_milliseconds() as f64 / 1000.0;

        let failed_tables: Vec<String> = tables
            .iter()
            .filter(|r| r.outcome.is_failure())
            .map(|r| r.table.clone())
            .collect();
        let mismatched_tables = tables
            .iter()
            .filter(|r| r.verification.as_ref().is_some_and(|v| !v.matches()))
            .map(|r| r.table.clone())
            .collect();

        let status = if !failed_tables.is_empty() {
            "failed"
        } else if cancelled {
            "cancelled"
        } else {
            "completed"
        };

        Self {
            run_id,
            status: status.to_string(),
            duration_seconds,
            started_at,
            completed_at,
            tables_total,
            tables_success: tables.len() - failed_tables.len(),
            tables_failed: failed_tables.len(),
            rows_written: tables.iter().map(TableReport::rows_written).sum(),
            mismatched_tables,
            failed_tables,
            tables,
        }
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// One table of a dry-run plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanEntry {
    pub table: String,
    pub mode: String,
    pub skipped_fields: Vec<String>,
}

/// Reachability of both databases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub healthy: bool,
    pub source_connected: bool,
    pub source_latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_error: Option<String>,
    pub target_connected: bool,
    pub target_latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_error: Option<String>,
}

impl HealthCheckResult {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
