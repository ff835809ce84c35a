//! Single-table migration.
//!
//! `Start -> Skipped | MissingSource | MissingTarget | NoCommonFields | NoData | Migrated`

use std::time::Instant;

use tracing::{debug, info, warn};

use super::report::{TableOutcome, TableReport};
use super::Migrator;
use crate::config::MissingSourcePolicy;
use crate::core::{BindValue, SourceReader, SqlValue, TargetWriter, WritePlan};
use crate::error::{MigrateError, Result};
use crate::reconcile::reconcile;
use crate::transform::{TransformStats, ValueTransformer};
use crate::typemap::BindCategory;

impl<S, T> Migrator<S, T>
where
    S: SourceReader,
    T: TargetWriter,
{
    /// Migrate one table.
    ///
    /// Fatal conditions (missing target table, schema, fetch or write
    /// failures) are returned as one error for the table. Every schema query
    /// and the source fetch run before the target is modified; in replace
    /// mode the old rows are deleted inside the write transaction, so a
    /// failure leaves the target as it was.
    pub async fn migrate_table(&self, table: &str) -> Result<TableReport> {
        let started = Instant::now();
        let migration = &self.config.migration;
        let policy = migration.policy_for(table);
        let mut report = TableReport::new(table, policy);

        if policy.skip {
            info!("{}: skipped by configuration", table);
            return Ok(finish(report, TableOutcome::Skipped, started));
        }

        if !self.source.table_exists(table).await? {
            match migration.missing_source {
                MissingSourcePolicy::Error => {
                    return Err(MigrateError::schema(
                        table,
                        "table does not exist on the source database",
                    ));
                }
                MissingSourcePolicy::Warn => {
                    warn!("{}: table does not exist on the source database, skipping", table);
                    return Ok(finish(report, TableOutcome::MissingSource, started));
                }
            }
        }

        if !self.target.table_exists(table).await? {
            return Err(MigrateError::schema(
                table,
                "table does not exist on the target database",
            ));
        }

        let source_columns = self.source.columns(table).await?;
        let target_columns = self.target.columns(table).await?;
        let columns = reconcile(&source_columns, &target_columns, migration.skip_list(table));

        if columns.is_empty() {
            warn!("{}: no common fields between source and target", table);
            return Ok(finish(report, TableOutcome::NoCommonFields, started));
        }
        debug!("{}: copying columns [{}]", table, columns.join(", "));

        let rows = self.source.fetch_rows(table, &columns).await?;
        report.rows_read = rows.len() as u64;
        if rows.is_empty() {
            if !policy.update_rather_than_replace {
                self.target.truncate(table).await?;
                debug!("{}: target truncated", table);
            }
            info!("{}: no data to migrate", table);
            report.columns = columns;
            return Ok(finish(report, TableOutcome::NoData, started));
        }

        let target_types = self.target.column_types(table).await?;
        let categories: Vec<BindCategory> = columns
            .iter()
            .map(|c| {
                target_types
                    .get(c)
                    .map(|t| BindCategory::for_type(t))
                    .unwrap_or(BindCategory::Text)
            })
            .collect();

        let class_column = &migration.class_name_column;
        let enum_constraint = if columns.contains(class_column) {
            self.target.enum_allowed_values(table, class_column).await?
        } else {
            Vec::new()
        };

        let key_columns = if policy.update_rather_than_replace {
            self.target.primary_key(table).await?
        } else {
            Vec::new()
        };

        let transformer = ValueTransformer::new(table, migration, enum_constraint);
        let mut transform_stats = TransformStats::default();
        let mut bound = Vec::with_capacity(rows.len());
        for mut row in rows {
            let mut values = Vec::with_capacity(columns.len());
            for (column, category) in columns.iter().zip(&categories) {
                let value = row.remove(column).unwrap_or(SqlValue::Null);
                let value = transformer.transform(column, value, &mut transform_stats);
                values.push(BindValue::bind(value, *category));
            }
            bound.push(values);
        }

        let plan = WritePlan {
            table: table.to_string(),
            columns,
            categories,
            key_columns,
            update_existing: policy.update_rather_than_replace,
            clear_first: !policy.update_rather_than_replace,
        };
        let write_stats = self.target.write_rows(&plan, bound).await?;

        report.columns = plan.columns;
        report.record_write(write_stats, transform_stats);
        info!(
            "{}: migrated {} rows ({} inserted, {} updated, {} mode)",
            table,
            write_stats.total(),
            write_stats.inserted,
            write_stats.updated,
            report.mode
        );
        Ok(finish(report, TableOutcome::Migrated, started))
    }
}

fn finish(mut report: TableReport, outcome: TableOutcome, started: Instant) -> TableReport {
    report.outcome = outcome;
    report.duration_ms = started.elapsed().as_millis() as u64;
    report
}
