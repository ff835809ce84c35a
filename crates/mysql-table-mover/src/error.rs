//! Error types for the migration library.

use thiserror::Error;

/// Main error type for migration operations.
///
/// Every table-level failure surfaces as exactly one of these values so the
/// caller decides whether a failed table halts the batch.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Configuration error (invalid YAML, missing connection parameters, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Table missing on one side, or its description could not be read
    #[error("Schema error for table {table}: {message}")]
    Schema { table: String, message: String },

    /// Reading rows from the source failed
    #[error("Data fetch failed for table {table}: {message}")]
    DataFetch { table: String, message: String },

    /// Prepare/execute failure inside the write transaction (rolled back)
    #[error("Write failed for table {table}: {message}")]
    Write { table: String, message: String },

    /// Row counts differ after migration
    #[error("Row count mismatch for table {table}: source={source_count} target={target_count}")]
    VerificationMismatch {
        table: String,
        source_count: u64,
        target_count: u64,
    },

    /// Connection error with context
    #[error("Connection error: {message}\n  Context: {context}")]
    Pool { message: String, context: String },

    /// Per-table deadline exceeded
    #[error("Migration of table {table} exceeded {seconds}s")]
    Timeout { table: String, seconds: u64 },

    /// Migration was cancelled (SIGINT, etc.)
    #[error("Migration cancelled")]
    Cancelled,

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MigrateError {
    /// Create a connection error with context about where it occurred.
    pub fn pool(err: impl std::fmt::Display, context: impl Into<String>) -> Self {
        MigrateError::Pool {
            message: err.to_string(),
            context: context.into(),
        }
    }

    /// Create a Schema error.
    pub fn schema(table: impl Into<String>, message: impl Into<String>) -> Self {
        MigrateError::Schema {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Create a DataFetch error.
    pub fn fetch(table: impl Into<String>, message: impl Into<String>) -> Self {
        MigrateError::DataFetch {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Create a Write error.
    pub fn write(table: impl Into<String>, message: impl Into<String>) -> Self {
        MigrateError::Write {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Process exit code for the CLI.
    pub fn exit_code(&self) -> u8 {
        match self {
            MigrateError::Config(_) | MigrateError::Yaml(_) => 2,
            MigrateError::Pool { .. } => 3,
            MigrateError::Schema { .. } => 4,
            MigrateError::DataFetch { .. } => 5,
            MigrateError::Write { .. } => 6,
            MigrateError::VerificationMismatch { .. } => 7,
            MigrateError::Timeout { .. } => 8,
            MigrateError::Cancelled => 130,
            MigrateError::Io(_) | MigrateError::Json(_) => 1,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct_per_category() {
        let codes = [
            MigrateError::Config("x".into()).exit_code(),
            MigrateError::pool("refused", "connecting").exit_code(),
            MigrateError::schema("Foo", "missing").exit_code(),
            MigrateError::fetch("Foo", "boom").exit_code(),
            MigrateError::write("Foo", "boom").exit_code(),
            MigrateError::VerificationMismatch {
                table: "Foo".into(),
                source_count: 1,
                target_count: 2,
            }
            .exit_code(),
        ];
        let mut sorted = codes.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), codes.len());
    }

    #[test]
    fn test_mismatch_message_names_both_counts() {
        let err = MigrateError::VerificationMismatch {
            table: "Page".into(),
            source_count: 10,
            target_count: 7,
        };
        let msg = err.to_string();
        assert!(msg.contains("source=10"));
        assert!(msg.contains("target=7"));
    }

    #[test]
    fn test_format_detailed_includes_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "config.yaml");
        let err = MigrateError::from(io);
        assert!(err.format_detailed().starts_with("Error: IO error"));
    }
}
