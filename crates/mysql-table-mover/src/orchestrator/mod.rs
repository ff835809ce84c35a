//! Migration orchestrator - table, entity and batch workflows.
//!
//! Tables are migrated strictly one after another. Each table either
//! reaches a terminal [`TableOutcome`] or fails with one error; the batch
//! runner decides whether a failure stops the run.

mod report;
mod table;

pub use report::{HealthCheckResult, MigrationResult, PlanEntry, TableOutcome, TableReport};

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::core::{SchemaInspector, Side, SourceReader, TargetWriter};
use crate::drivers::mysql::MysqlDatabase;
use crate::entity::{dedup_tables, ConfigEntityResolver, EntityResolver};
use crate::error::{MigrateError, Result};
use crate::verify::{verify_tables, Verifier, VerifyReport};

/// Migrates tables from a source reader to a target writer.
pub struct Migrator<S, T> {
    config: Config,
    source: Arc<S>,
    target: Arc<T>,
}

impl Migrator<MysqlDatabase, MysqlDatabase> {
    /// Build a migrator over the two MySQL databases named in `config`.
    ///
    /// No connection is opened until the first operation.
    pub fn mysql(config: Config) -> Self {
        let source = MysqlDatabase::new(Side::Source, &config.source);
        let target = MysqlDatabase::new(Side::Target, &config.target);
        Self::new(config, Arc::new(source), Arc::new(target))
    }
}

impl<S, T> Migrator<S, T>
where
    S: SourceReader,
    T: TargetWriter,
{
    pub fn new(config: Config, source: Arc<S>, target: Arc<T>) -> Self {
        Self {
            config,
            source,
            target,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn verifier(&self) -> Verifier<S, T> {
        Verifier::new(self.source.clone(), self.target.clone())
    }

    /// Ordered tables of one entity, including auxiliary tables.
    pub fn tables_for_entity(&self, entity: &str) -> Result<Vec<String>> {
        ConfigEntityResolver::new(&self.config.migration.entity_tables).tables_for_entity(entity)
    }

    /// Entity tables first, then the explicit table list, without repeats.
    pub fn resolve_tables(&self) -> Result<Vec<String>> {
        let migration = &self.config.migration;
        let mut tables = Vec::new();
        for entity in &migration.entities {
            tables.extend(self.tables_for_entity(entity)?);
        }
        tables.extend(migration.tables.iter().cloned());
        Ok(dedup_tables(tables))
    }

    /// Migrate every table of one entity, stopping at the first failure.
    pub async fn migrate_entity(&self, entity: &str) -> Result<Vec<TableReport>> {
        let tables = self.tables_for_entity(entity)?;
        info!("{}: migrating {} tables", entity, tables.len());

        let mut reports = Vec::with_capacity(tables.len());
        for table in &tables {
            reports.push(self.migrate_table(table).await?);
        }
        Ok(reports)
    }

    /// Run the configured batch.
    ///
    /// Cancellation is honoured between tables. Without `continue_on_error`
    /// the first failed table ends the run and its error is returned.
    pub async fn run(&self, cancel: CancellationToken) -> Result<MigrationResult> {
        let started_at = Utc::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        let tables = self.resolve_tables()?;
        let migration = &self.config.migration;

        info!("Starting migration run: {} ({} tables)", run_id, tables.len());

        let mut reports = Vec::with_capacity(tables.len());
        let mut fatal = None;
        let mut cancelled = false;

        for table in &tables {
            if cancel.is_cancelled() {
                warn!("Migration cancelled before table {}", table);
                cancelled = true;
                break;
            }

            match self.run_table(table).await {
                Ok(report) => reports.push(report),
                Err(e) => {
                    error!("{}: {}", table, e);
                    reports.push(TableReport::failed(table, migration.policy_for(table), &e));
                    if !migration.continue_on_error {
                        fatal = Some(e);
                        break;
                    }
                }
            }
        }

        let result =
            MigrationResult::from_reports(run_id, started_at, tables.len(), reports, cancelled);

        info!(
            "Migration {}: {}/{} tables, {} rows in {:.1}s",
            result.status,
            result.tables_success,
            result.tables_total,
            result.rows_written,
            result.duration_seconds
        );

        if let Some(e) = fatal {
            return Err(e);
        }
        Ok(result)
    }

    /// One table of a batch: deadline, then optional verification.
    async fn run_table(&self, table: &str) -> Result<TableReport> {
        let migration = &self.config.migration;

        let mut report = match migration.table_timeout_secs {
            Some(seconds) => {
                tokio::time::timeout(Duration::from_secs(seconds), self.migrate_table(table))
                    .await
                    .map_err(|_| MigrateError::Timeout {
                        table: table.to_string(),
                        seconds,
                    })??
            }
            None => self.migrate_table(table).await?,
        };

        // The write is committed; a failed check is recorded, not raised.
        if migration.verify_after_migrate && report.outcome == TableOutcome::Migrated {
            match self.verifier().check(table).await {
                Ok(verification) => report.verification = Some(verification),
                Err(e) => {
                    warn!("{}: row count verification failed: {}", table, e);
                    report.verification_error = Some(e.to_string());
                }
            }
        }
        Ok(report)
    }

    /// Compare row counts for `tables`, or for every non-skipped table of
    /// the run list when `tables` is empty.
    pub async fn verify(&self, tables: &[String]) -> Result<Vec<VerifyReport>> {
        let tables = if tables.is_empty() {
            self.resolve_tables()?
                .into_iter()
                .filter(|t| !self.config.migration.policy_for(t).skip)
                .collect()
        } else {
            tables.to_vec()
        };
        verify_tables(&self.verifier(), &tables).await
    }

    /// Verify a single table; a mismatch is an error.
    pub async fn verify_table(&self, table: &str) -> Result<VerifyReport> {
        self.verifier().verify_table(table).await
    }

    /// The resolved run list with each table's mode. Touches no database.
    pub fn plan(&self) -> Result<Vec<PlanEntry>> {
        let migration = &self.config.migration;
        Ok(self
            .resolve_tables()?
            .into_iter()
            .map(|table| PlanEntry {
                mode: migration.policy_for(&table).mode_name().to_string(),
                skipped_fields: migration.skip_list(&table).to_vec(),
                table,
            })
            .collect())
    }

    /// Ping both databases.
    pub async fn health_check(&self) -> HealthCheckResult {
        let (source_connected, source_latency_ms, source_error) =
            ping(self.source.as_ref()).await;
        let (target_connected, target_latency_ms, target_error) =
            ping(self.target.as_ref()).await;

        HealthCheckResult {
            healthy: source_connected && target_connected,
            source_connected,
            source_latency_ms,
            source_error,
            target_connected,
            target_latency_ms,
            target_error,
        }
    }
}

async fn ping<I: SchemaInspector>(side: &I) -> (bool, u64, Option<String>) {
    let start = Instant::now();
    let outcome = side.ping().await;
    let latency = start.elapsed().as_millis() as u64;
    match outcome {
        Ok(()) => {
            info!("{} database reachable ({} ms)", side.side(), latency);
            (true, latency, None)
        }
        Err(e) => {
            error!("{} database unreachable: {}", side.side(), e);
            (false, latency, Some(e.to_string()))
        }
    }
}
