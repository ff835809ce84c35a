//! MySQL endpoint for one side of the migration.

use async_trait::async_trait;
use mysql_async::prelude::*;
use mysql_async::{Conn, Opts, OptsBuilder, Statement, Transaction, TxOpts};
use tracing::{debug, info, warn};

use crate::config::ConnectionProfile;
use crate::core::identifier::{quote_list, quote_mysql};
use crate::core::{
    parse_enum_values, BindValue, ColumnSet, ColumnTypeMap, EnumConstraint, Row, SchemaInspector,
    Side, SourceReader, SqlValue, TargetWriter, WritePlan, WriteStats,
};
use crate::error::{MigrateError, Result};

/// One configured database.
pub struct MysqlDatabase {
    side: Side,
    opts: Opts,
    database: String,
}

impl MysqlDatabase {
    /// Create an endpoint. No connection is opened until first use.
    pub fn new(side: Side, profile: &ConnectionProfile) -> Self {
        let builder = OptsBuilder::default()
            .ip_or_hostname(profile.host.clone())
            .tcp_port(profile.port())
            .db_name(Some(profile.database.clone()))
            .user(Some(profile.user.clone()))
            .pass(Some(profile.password.clone()))
            // Use utf8mb4 for full Unicode support
            .init(vec!["SET NAMES utf8mb4"]);

        Self {
            side,
            opts: builder.into(),
            database: profile.database.clone(),
        }
    }

    /// Open a fresh connection for one logical operation.
    async fn connect(&self) -> Result<Conn> {
        Conn::new(self.opts.clone())
            .await
            .map_err(|e| MigrateError::pool(e, format!("connecting to {} database", self.side)))
    }

    async fn disconnect(&self, conn: Conn) {
        if let Err(e) = conn.disconnect().await {
            debug!("{} connection did not close cleanly: {}", self.side, e);
        }
    }

    /// `(name, type)` for every column, in declaration order.
    async fn describe(&self, table: &str) -> Result<Vec<(String, String)>> {
        let sql = format!("SHOW COLUMNS FROM {}", quote_mysql(table)?);
        let mut conn = self.connect().await?;
        let result: std::result::Result<Vec<mysql_async::Row>, _> = conn.query(sql).await;
        self.disconnect(conn).await;

        let rows = result.map_err(|e| {
            MigrateError::schema(table, format!("cannot describe on {}: {}", self.side, e))
        })?;

        rows.into_iter()
            .map(|row| {
                let name: Option<String> = row.get("Field");
                let type_str: Option<String> = row.get("Type");
                match (name, type_str) {
                    (Some(n), Some(t)) => Ok((n, t)),
                    _ => Err(MigrateError::schema(table, "unexpected SHOW COLUMNS result")),
                }
            })
            .collect()
    }

    async fn write_in_tx(
        tx: &mut Transaction<'_>,
        plan: &WritePlan,
        rows: Vec<Vec<BindValue>>,
    ) -> Result<WriteStats> {
        let table = quote_mysql(&plan.table)?;

        if plan.clear_first {
            // TRUNCATE would commit implicitly; DELETE stays in the transaction.
            tx.query_drop(format!("DELETE FROM {}", table))
                .await
                .map_err(|e| MigrateError::write(&plan.table, format!("clearing: {}", e)))?;
            debug!("{}: existing rows deleted", plan.table);
        }

        let placeholders = vec!["?"; plan.columns.len()].join(", ");
        let insert_sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            quote_list(&plan.columns)?,
            placeholders
        );
        let insert = prepare(tx, &plan.table, &insert_sql).await?;

        let key_indices = plan.key_indices();
        let non_key = plan.non_key_indices();
        let mut upsert: Option<(Statement, Option<Statement>)> = None;

        if plan.update_existing {
            if key_indices.is_some() {
                let where_clause = plan
                    .key_columns
                    .iter()
                    .map(|k| Ok(format!("{} = ?", quote_mysql(k)?)))
                    .collect::<Result<Vec<_>>>()?
                    .join(" AND ");

                let exists_sql = format!("SELECT 1 FROM {} WHERE {} LIMIT 1", table, where_clause);
                let exists = prepare(tx, &plan.table, &exists_sql).await?;

                let update = if non_key.is_empty() {
                    None
                } else {
                    let set_clause = non_key
                        .iter()
                        .map(|&i| Ok(format!("{} = ?", quote_mysql(&plan.columns[i])?)))
                        .collect::<Result<Vec<_>>>()?
                        .join(", ");
                    let update_sql =
                        format!("UPDATE {} SET {} WHERE {}", table, set_clause, where_clause);
                    Some(prepare(tx, &plan.table, &update_sql).await?)
                };

                upsert = Some((exists, update));
            } else {
                warn!(
                    "{}: primary key {:?} is not fully projected, inserting without update check",
                    plan.table, plan.key_columns
                );
            }
        }

        let mut stats = WriteStats::default();

        for (n, row) in rows.into_iter().enumerate() {
            let key: Option<Vec<mysql_async::Value>> = plan
                .row_key(&row)
                .map(|key| key.into_iter().cloned().map(Into::into).collect());

            if let (Some((exists, update)), Some(key)) = (&upsert, key) {
                let found: Option<i64> = tx
                    .exec_first(exists, key.clone())
                    .await
                    .map_err(|e| MigrateError::write(&plan.table, format!("row {}: {}", n, e)))?;

                if found.is_some() {
                    let Some(update) = update else {
                        debug!("{}: row {} already present, nothing to update", plan.table, n);
                        continue;
                    };
                    let mut params: Vec<mysql_async::Value> =
                        non_key.iter().map(|&i| row[i].clone().into()).collect();
                    params.extend(key);
                    tx.exec_drop(update, params).await.map_err(|e| {
                        MigrateError::write(&plan.table, format!("row {}: {}", n, e))
                    })?;
                    stats.updated += 1;
                    continue;
                }
            }

            let params: Vec<mysql_async::Value> = row.into_iter().map(Into::into).collect();
            tx.exec_drop(&insert, params)
                .await
                .map_err(|e| MigrateError::write(&plan.table, format!("row {}: {}", n, e)))?;
            stats.inserted += 1;
        }

        Ok(stats)
    }
}

async fn prepare(tx: &mut Transaction<'_>, table: &str, sql: &str) -> Result<Statement> {
    debug!("prepare: {}", sql);
    tx.prep(sql)
        .await
        .map_err(|e| MigrateError::write(table, format!("preparing statement: {}", e)))
}

/// Convert a value read over the text protocol.
pub fn mysql_value_to_sql(value: mysql_async::Value) -> SqlValue {
    use mysql_async::Value;

    match value {
        Value::NULL => SqlValue::Null,
        Value::Bytes(b) => SqlValue::from_bytes(b),
        Value::Int(v) => SqlValue::Int(v),
        Value::UInt(v) => SqlValue::UInt(v),
        Value::Float(v) => SqlValue::Float(v as f64),
        Value::Double(v) => SqlValue::Float(v),
        Value::Date(y, mo, d, h, mi, s, us) => {
            let mut text = format!("{:04}-{:02}-{:02} {:02}:{:02}:{:02}", y, mo, d, h, mi, s);
            if us > 0 {
                text.push_str(&format!(".{:06}", us));
            }
            SqlValue::Text(text)
        }
        Value::Time(neg, days, h, mi, s, us) => {
            let hours = days * 24 + u32::from(h);
            let sign = if neg { "-" } else { "" };
            let mut text = format!("{}{:02}:{:02}:{:02}", sign, hours, mi, s);
            if us > 0 {
                text.push_str(&format!(".{:06}", us));
            }
            SqlValue::Text(text)
        }
    }
}

#[async_trait]
impl SchemaInspector for MysqlDatabase {
    fn side(&self) -> Side {
        self.side
    }

    async fn table_exists(&self, table: &str) -> Result<bool> {
        let sql = r#"
            SELECT COUNT(*) AS cnt FROM information_schema.TABLES
            WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?
        "#;

        let mut conn = self.connect().await?;
        let count: std::result::Result<Option<i64>, _> =
            conn.exec_first(sql, (self.database.as_str(), table)).await;
        self.disconnect(conn).await;

        let count = count.map_err(|e| MigrateError::pool(e, "checking table existence"))?;
        Ok(count.unwrap_or(0) > 0)
    }

    async fn columns(&self, table: &str) -> Result<ColumnSet> {
        Ok(self.describe(table).await?.into_iter().map(|(n, _)| n).collect())
    }

    async fn column_types(&self, table: &str) -> Result<ColumnTypeMap> {
        Ok(self.describe(table).await?.into_iter().collect())
    }

    async fn enum_allowed_values(&self, table: &str, column: &str) -> Result<EnumConstraint> {
        let sql = r#"
            SELECT CAST(COLUMN_TYPE AS CHAR(65535)) AS COLUMN_TYPE
            FROM information_schema.COLUMNS
            WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? AND COLUMN_NAME = ?
        "#;

        let mut conn = self.connect().await?;
        let type_str: std::result::Result<Option<String>, _> =
            conn.exec_first(sql, (self.database.as_str(), table, column)).await;
        self.disconnect(conn).await;

        let type_str = type_str.map_err(|e| {
            MigrateError::schema(table, format!("reading type of {}: {}", column, e))
        })?;
        Ok(type_str.map(|t| parse_enum_values(&t)).unwrap_or_default())
    }

    async fn primary_key(&self, table: &str) -> Result<Vec<String>> {
        let sql = r#"
            SELECT CAST(COLUMN_NAME AS CHAR(255)) AS COLUMN_NAME
            FROM information_schema.KEY_COLUMN_USAGE
            WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? AND CONSTRAINT_NAME = 'PRIMARY'
            ORDER BY ORDINAL_POSITION
        "#;

        let mut conn = self.connect().await?;
        let keys: std::result::Result<Vec<String>, _> =
            conn.exec(sql, (self.database.as_str(), table)).await;
        self.disconnect(conn).await;

        keys.map_err(|e| MigrateError::schema(table, format!("reading primary key: {}", e)))
    }

    async fn row_count(&self, table: &str) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) AS cnt FROM {}", quote_mysql(table)?);

        let mut conn = self.connect().await?;
        let count: std::result::Result<Option<u64>, _> = conn.query_first(sql).await;
        self.disconnect(conn).await;

        let count = count.map_err(|e| {
            MigrateError::schema(table, format!("counting rows on {}: {}", self.side, e))
        })?;
        Ok(count.unwrap_or(0))
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.connect().await?;
        let result = conn.query_drop("SELECT 1").await;
        self.disconnect(conn).await;
        result.map_err(|e| MigrateError::pool(e, format!("testing {} connection", self.side)))
    }
}

#[async_trait]
impl SourceReader for MysqlDatabase {
    async fn fetch_rows(&self, table: &str, columns: &[String]) -> Result<Vec<Row>> {
        let sql = format!("SELECT {} FROM {}", quote_list(columns)?, quote_mysql(table)?);
        debug!("fetch: {}", sql);

        let mut conn = self.connect().await?;
        let result: std::result::Result<Vec<mysql_async::Row>, _> = conn.query(sql).await;
        self.disconnect(conn).await;

        let rows = result.map_err(|e| {
            MigrateError::fetch(table, format!("Error fetching data from source table: {}", e))
        })?;

        info!("{}: fetched {} rows from source", table, rows.len());

        Ok(rows
            .into_iter()
            .map(|row| {
                let mut row = row;
                columns
                    .iter()
                    .enumerate()
                    .map(|(i, name)| {
                        let value = row.take::<mysql_async::Value, usize>(i);
                        (name.clone(), value.map(mysql_value_to_sql).unwrap_or(SqlValue::Null))
                    })
                    .collect()
            })
            .collect())
    }
}

#[async_trait]
impl TargetWriter for MysqlDatabase {
    async fn truncate(&self, table: &str) -> Result<()> {
        let sql = format!("TRUNCATE TABLE {}", quote_mysql(table)?);

        let mut conn = self.connect().await?;
        let result = conn.query_drop(sql).await;
        self.disconnect(conn).await;

        result.map_err(|e| MigrateError::write(table, format!("truncating: {}", e)))?;
        debug!("Truncated table {}", table);
        Ok(())
    }

    async fn write_rows(&self, plan: &WritePlan, rows: Vec<Vec<BindValue>>) -> Result<WriteStats> {
        let mut conn = self.connect().await?;

        let result = match conn.start_transaction(TxOpts::default()).await {
            Ok(mut tx) => match Self::write_in_tx(&mut tx, plan, rows).await {
                Ok(stats) => tx
                    .commit()
                    .await
                    .map(|_| stats)
                    .map_err(|e| MigrateError::write(&plan.table, format!("commit: {}", e))),
                Err(e) => {
                    if let Err(rollback) = tx.rollback().await {
                        warn!("{}: rollback failed: {}", plan.table, rollback);
                    }
                    Err(e)
                }
            },
            Err(e) => Err(MigrateError::write(
                &plan.table,
                format!("starting transaction: {}", e),
            )),
        };

        self.disconnect(conn).await;
        result
    }
}
