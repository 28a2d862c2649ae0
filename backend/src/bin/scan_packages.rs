//! Apply a scan action to one or more packages from the command line.
//!
//! One code runs a single scan and prints a `ScanReport`; several codes run
//! a bulk scan and print the itemised `BulkScanResponse`. Output is JSON on
//! stdout; logs go to stderr as JSON records.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::collections::BTreeMap;
use std::env;
use std::ffi::OsString;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use courier::domain::ports::{BulkScanRequest, PackageScanCommand, ScanReport, ScanRequest};
use courier::domain::{PackageScanPorts, PackageScanService, UserId};
use courier::outbound::notifier::TracingTransitionNotifier;
use courier::outbound::persistence::{
    DbPool, DieselActorDirectory, DieselPackageStore, PoolConfig, run_pending_migrations,
};
use courier::settings::ScanSettings;
use mockable::DefaultClock;
use ortho_config::OrthoConfig;
use tokio::runtime::Builder;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

/// `scan-packages` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "scan-packages",
    about = "Apply a scan action to packages and record tracking events",
    version
)]
struct CliArgs {
    /// User id of the scanning actor.
    #[arg(long, value_name = "uuid", value_parser = parse_actor)]
    actor: UserId,
    /// Scan action, e.g. `collect`, `deliver`, `confirm_receipt`, `print`.
    #[arg(long, value_name = "action")]
    action: String,
    /// Metadata entry recorded on the tracking event. Repeatable.
    #[arg(long = "metadata", value_name = "key=value", value_parser = parse_metadata_entry)]
    metadata: Vec<(String, String)>,
    /// Override the per-scan timeout in milliseconds.
    #[arg(long = "timeout-ms", value_name = "ms")]
    timeout_ms: Option<u64>,
    /// Apply pending schema migrations before scanning.
    #[arg(long)]
    migrate: bool,
    /// Database connection URL. Falls back to `DATABASE_URL` when omitted.
    #[arg(long = "database-url", value_name = "url")]
    database_url: Option<String>,
    /// Package codes to scan.
    #[arg(value_name = "code", required = true, num_args = 1..)]
    codes: Vec<String>,
}

fn main() -> io::Result<()> {
    if let Err(error) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .json()
        .try_init()
    {
        warn!(%error, "tracing init failed");
    }

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| io::Error::other(format!("create Tokio runtime: {error}")))?;
    runtime.block_on(async_main())
}

async fn async_main() -> io::Result<()> {
    let args = CliArgs::try_parse().map_err(io::Error::other)?;
    let settings = ScanSettings::load_from_iter([OsString::from("scan-packages")])
        .map_err(|error| io::Error::other(format!("load scan settings: {error}")))?;

    let database_url = resolve_database_url(args.database_url.clone())?;
    if args.migrate {
        run_pending_migrations(&database_url)
            .await
            .map_err(|error| io::Error::other(format!("run migrations: {error}")))?;
    }
    let pool = DbPool::new(PoolConfig::new(&database_url))
        .await
        .map_err(|error| io::Error::other(format!("create database pool: {error}")))?;

    let service = PackageScanService::new(
        PackageScanPorts::new(
            Arc::new(DieselPackageStore::new(pool.clone())),
            Arc::new(DieselActorDirectory::new(pool)),
            Arc::new(TracingTransitionNotifier),
        ),
        Arc::new(DefaultClock),
        settings.executor_config(),
    );

    let (output, succeeded) = run(&service, args).await?;
    service.flush_notifications().await;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{output}")?;
    if succeeded {
        Ok(())
    } else {
        Err(io::Error::other("scan failed"))
    }
}

/// Run the scan and render its JSON report plus an overall success flag.
async fn run(command: &dyn PackageScanCommand, args: CliArgs) -> io::Result<(String, bool)> {
    let metadata: BTreeMap<String, String> = args.metadata.into_iter().collect();
    let timeout = args.timeout_ms.map(Duration::from_millis);

    if let [code] = args.codes.as_slice() {
        let result = command
            .scan_single(ScanRequest {
                actor_id: args.actor,
                package_code: code.clone(),
                action: args.action,
                metadata,
                timeout,
            })
            .await;
        let report = ScanReport::from_result(&result);
        return render(&report).map(|json| (json, report.success));
    }

    let result = command
        .scan_bulk(BulkScanRequest {
            actor_id: args.actor,
            package_codes: args.codes,
            action: args.action,
            metadata,
            timeout,
        })
        .await;
    match result {
        Ok(response) => {
            let all_succeeded = response.summary.failed == 0;
            render(&response).map(|json| (json, all_succeeded))
        }
        Err(error) => render(&ScanReport::from_result(&Err(error))).map(|json| (json, false)),
    }
}

fn render(value: &impl serde::Serialize) -> io::Result<String> {
    serde_json::to_string_pretty(value)
        .map_err(|error| io::Error::other(format!("serialise report: {error}")))
}

fn parse_actor(raw: &str) -> Result<UserId, String> {
    UserId::new(raw).map_err(|error| error.to_string())
}

fn parse_metadata_entry(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("metadata entry `{raw}` must look like key=value"))?;
    if key.trim().is_empty() {
        return Err("metadata key must not be empty".to_owned());
    }
    Ok((key.trim().to_owned(), value.to_owned()))
}

fn resolve_database_url(explicit: Option<String>) -> io::Result<String> {
    if let Some(value) = explicit {
        if value.trim().is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "--database-url must not be empty when provided",
            ));
        }
        return Ok(value);
    }

    let from_env = env::var("DATABASE_URL").map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "database URL missing: set --database-url or DATABASE_URL",
        )
    })?;
    if from_env.trim().is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "DATABASE_URL must not be empty",
        ));
    }
    Ok(from_env)
}
