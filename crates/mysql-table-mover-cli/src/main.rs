//! mysql-table-mover CLI - move tables between drifted MySQL schemas.

use clap::{Parser, Subcommand};
use mysql_table_mover::{Config, MigrateError, MigrationResult, Migrator, TableReport};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{info, Level};
use tracing_subscriber::fmt::format::FmtSpan;

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

/// Exit code when a run finished but some tables failed.
const EXIT_TABLES_FAILED: u8 = 1;

#[derive(Parser)]
#[command(name = "mysql-table-mover")]
#[command(about = "Move tables between two MySQL databases with drifted schemas")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Migrate every configured entity and table
    Run {
        /// Dry run: show the table plan without touching any database
        #[arg(long)]
        dry_run: bool,

        /// Keep going after a table fails
        #[arg(long)]
        continue_on_error: bool,
    },

    /// Migrate a single table
    Table {
        /// Table name
        name: String,

        /// Compare row counts afterwards
        #[arg(long)]
        verify: bool,
    },

    /// Migrate every table of one entity
    Entity {
        /// Entity identifier as listed under migration.entity_tables
        id: String,
    },

    /// Compare row counts between source and target
    Verify {
        /// Tables to check [default: every table of the run]
        tables: Vec<String>,
    },

    /// Show the resolved table list and the mode of each table
    Plan,

    /// Test database connections
    HealthCheck,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<ExitCode, MigrateError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format)
        .map_err(|e| MigrateError::Config(e.to_string()))?;

    let mut config = Config::load(&cli.config)?;
    info!("Loaded configuration from {:?}", cli.config);

    match cli.command {
        Commands::Run {
            dry_run,
            continue_on_error,
        } => {
            if continue_on_error {
                config.migration.continue_on_error = true;
            }
            let migrator = Migrator::mysql(config);

            if dry_run {
                let plan = migrator.plan()?;
                if cli.output_json {
                    println!("{}", serde_json::to_string_pretty(&plan)?);
                } else {
                    println!("Dry run: {} tables", plan.len());
                    for entry in &plan {
                        if entry.skipped_fields.is_empty() {
                            println!("  {:<8} {}", entry.mode, entry.table);
                        } else {
                            println!(
                                "  {:<8} {} (skipping fields: {})",
                                entry.mode,
                                entry.table,
                                entry.skipped_fields.join(", ")
                            );
                        }
                    }
                }
                return Ok(ExitCode::SUCCESS);
            }

            let cancel_token = setup_signal_handler()?;
            let result = migrator.run(cancel_token).await?;

            if cli.output_json {
                println!("{}", result.to_json()?);
            } else {
                print_result(&result);
            }

            if result.status == "cancelled" {
                return Err(MigrateError::Cancelled);
            }
            if result.tables_failed > 0 {
                return Ok(ExitCode::from(EXIT_TABLES_FAILED));
            }
        }

        Commands::Table { name, verify } => {
            let migrator = Migrator::mysql(config);
            let report = migrator.migrate_table(&name).await?;
            print_reports(std::slice::from_ref(&report), cli.output_json)?;

            if verify {
                migrator.verify_table(&name).await?;
            }
        }

        Commands::Entity { id } => {
            let migrator = Migrator::mysql(config);
            let reports = migrator.migrate_entity(&id).await?;
            print_reports(&reports, cli.output_json)?;
        }

        Commands::Verify { tables } => {
            let migrator = Migrator::mysql(config);
            let reports = migrator.verify(&tables).await?;

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else {
                println!("Row count verification:");
                for r in &reports {
                    let status = if r.matches() { "OK" } else { "MISMATCH" };
                    println!(
                        "  {:<8} {} (source: {}, target: {})",
                        status, r.table, r.source_count, r.target_count
                    );
                }
            }

            if let Some(r) = reports.into_iter().find(|r| !r.matches()) {
                return Err(MigrateError::VerificationMismatch {
                    table: r.table,
                    source_count: r.source_count,
                    target_count: r.target_count,
                });
            }
        }

        Commands::Plan => {
            let migrator = Migrator::mysql(config);
            let plan = migrator.plan()?;
            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                for entry in &plan {
                    println!("{}\t{}", entry.table, entry.mode);
                }
            }
        }

        Commands::HealthCheck => {
            let migrator = Migrator::mysql(config);
            let result = migrator.health_check().await;

            if cli.output_json {
                println!("{}", result.to_json()?);
            } else {
                println!("Health Check Results:");
                println!(
                    "  Source: {} ({}ms)",
                    if result.source_connected { "OK" } else { "FAILED" },
                    result.source_latency_ms
                );
                if let Some(ref err) = result.source_error {
                    println!("    Error: {}", err);
                }
                println!(
                    "  Target: {} ({}ms)",
                    if result.target_connected { "OK" } else { "FAILED" },
                    result.target_latency_ms
                );
                if let Some(ref err) = result.target_error {
                    println!("    Error: {}", err);
                }
                println!(
                    "\n  Overall: {}",
                    if result.healthy { "HEALTHY" } else { "UNHEALTHY" }
                );
            }

            if !result.healthy {
                return Err(MigrateError::pool(
                    "one or more databases are unreachable",
                    "health check",
                ));
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn print_result(result: &MigrationResult) {
    println!("\nMigration {}!", result.status);
    println!("  Run ID: {}", result.run_id);
    println!("  Duration: {:.2}s", result.duration_seconds);
    println!("  Tables: {}/{}", result.tables_success, result.tables_total);
    println!("  Rows written: {}", result.rows_written);
    if !result.failed_tables.is_empty() {
        println!("  Failed tables: {:?}", result.failed_tables);
    }
    if !result.mismatched_tables.is_empty() {
        println!("  Row count mismatches: {:?}", result.mismatched_tables);
    }
}

fn print_reports(reports: &[TableReport], json: bool) -> Result<(), MigrateError> {
    if json {
        println!("{}", serde_json::to_string_pretty(reports)?);
        return Ok(());
    }
    for r in reports {
        println!(
            "  {:?} {} [{}]: {} inserted, {} updated, {} renamed, {} enum repairs",
            r.outcome,
            r.table,
            r.mode,
            r.rows_inserted,
            r.rows_updated,
            r.classes_renamed,
            r.enum_repairs
        );
    }
    Ok(())
}

fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        other => return Err(format!("unknown verbosity: {}", other)),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        "json" => subscriber.json().init(),
        "text" => subscriber.init(),
        other => return Err(format!("unknown log format: {}", other)),
    }

    Ok(())
}

/// Cancel the returned token on SIGINT or SIGTERM.
///
/// The batch stops before the next table; the current table finishes.
#[cfg(unix)]
fn setup_signal_handler() -> Result<CancellationToken, MigrateError> {
    let cancel_token = CancellationToken::new();

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    let token = cancel_token.clone();
    tokio::spawn(async move {
        let name = tokio::select! {
            _ = sigint.recv() => "SIGINT",
            _ = sigterm.recv() => "SIGTERM",
        };
        eprintln!("\nReceived {}. Stopping after the current table...", name);
        token.cancel();
    });

    Ok(cancel_token)
}

#[cfg(not(unix))]
fn setup_signal_handler() -> Result<CancellationToken, MigrateError> {
    let cancel_token = CancellationToken::new();
    let token = cancel_token.clone();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nReceived Ctrl-C. Stopping after the current table...");
            token.cancel();
        }
    });

    Ok(cancel_token)
}
