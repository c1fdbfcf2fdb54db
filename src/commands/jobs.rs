//! Jobs command - Notification e-mail queue management.
//!
//! - `work`: process queued e-mails until Ctrl+C
//! - `list`: counts by status
//! - `clear`: delete failed jobs
//!
//! ```bash
//! community-hub jobs work
//! community-hub jobs list
//! ```

use apalis::prelude::*;
use apalis_sql::postgres::PostgresStorage;
use apalis_sql::sqlx::postgres::{PgPool, PgPoolOptions};
use apalis_sql::sqlx::Row;

use crate::cli::args::{JobsAction, JobsArgs};
use crate::config::{Config, JOB_NAME_NOTIFICATION_EMAIL};
use crate::errors::{AppError, AppResult};
use crate::infra::notification_email_storage;
use crate::jobs::notification_email_handler;

/// Execute the jobs command
pub async fn execute(args: JobsArgs, config: Config) -> AppResult<()> {
    let pool = connect(&config).await?;
    match args.action {
        JobsAction::Work => run_worker(pool).await,
        JobsAction::List => list_jobs(&pool).await,
        JobsAction::Clear => clear_failed_jobs(&pool).await,
    }
}

async fn connect(config: &Config) -> AppResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .map_err(|e| AppError::internal(format!("Failed to connect to database: {}", e)))
}

fn query_error(e: apalis_sql::sqlx::Error) -> AppError {
    AppError::internal(format!("Job queue query failed: {}", e))
}

/// The apalis schema only exists once a worker or the server set it up.
async fn queue_initialized(pool: &PgPool) -> AppResult<bool> {
    apalis_sql::sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM information_schema.schemata WHERE schema_name = 'apalis')",
    )
    .fetch_one(pool)
    .await
    .map_err(query_error)
}

async fn run_worker(pool: PgPool) -> AppResult<()> {
    PostgresStorage::setup(&pool)
        .await
        .map_err(|e| AppError::internal(format!("Failed to setup job storage: {}", e)))?;

    let worker = WorkerBuilder::new("notification-email-worker")
        .backend(notification_email_storage(pool))
        .build_fn(notification_email_handler);

    tracing::info!(queue = JOB_NAME_NOTIFICATION_EMAIL, "Job worker started. Press Ctrl+C to stop.");

    tokio::select! {
        result = Monitor::new().register(worker).run() => {
            if let Err(e) = result {
                return Err(AppError::internal(format!("Worker failed: {}", e)));
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received shutdown signal, stopping worker...");
        }
    }

    tracing::info!("Job worker stopped");
    Ok(())
}

async fn list_jobs(pool: &PgPool) -> AppResult<()> {
    if !queue_initialized(pool).await? {
        println!("Job queue not initialized. Run `serve` or `jobs work` first.");
        return Ok(());
    }

    let rows = apalis_sql::sqlx::query(
        "SELECT status::text AS status, COUNT(*)::bigint AS count \
         FROM apalis.jobs WHERE job_type = $1 GROUP BY status ORDER BY status",
    )
    .bind(JOB_NAME_NOTIFICATION_EMAIL)
    .fetch_all(pool)
    .await
    .map_err(query_error)?;

    println!("\n=== {} ===", JOB_NAME_NOTIFICATION_EMAIL);
    if rows.is_empty() {
        println!("(empty)");
    }
    for row in rows {
        let status: String = row.try_get("status").map_err(query_error)?;
        let count: i64 = row.try_get("count").map_err(query_error)?;
        println!("{:<10} {}", status, count);
    }
    println!();

    Ok(())
}

async fn clear_failed_jobs(pool: &PgPool) -> AppResult<()> {
    if !queue_initialized(pool).await? {
        println!("Job queue not initialized. Nothing to clear.");
        return Ok(());
    }

    let result = apalis_sql::sqlx::query(
        "DELETE FROM apalis.jobs WHERE job_type = $1 AND status = 'Failed'",
    )
    .bind(JOB_NAME_NOTIFICATION_EMAIL)
    .execute(pool)
    .await
    .map_err(query_error)?;

    println!("Cleared {} failed job(s).", result.rows_affected());
    Ok(())
}
