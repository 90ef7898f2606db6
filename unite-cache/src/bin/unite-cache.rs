//! Unite cache maintenance entry point.
//!
//! Opens the configured LMDB store and runs one maintenance command against
//! the component cache namespace. Keys outside the namespace are never
//! touched.

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use unite_cache::{
    inspect_namespace, purge_namespace, sweep_namespace, EntrySummary, LmdbStore, SweepReport,
    TracingObserver,
};
use unite_core::{
    CachePolicy, CacheSettings, Clock, CodecError, LogFormat, LogSettings, SystemClock, UniteError,
    UniteResult, CONFIG_ENV_VAR,
};

#[derive(Parser)]
#[command(name = "unite-cache")]
#[command(about = "Maintenance for the Unite UI component cache store", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file (TOML)
    #[arg(short, long, global = true, env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Remove expired, stale-version and unparseable entries
    Sweep,

    /// List cache entries with their version, age and validity
    Inspect,

    /// Remove every entry in the cache namespace
    Purge {
        /// Confirm the purge
        #[arg(long)]
        yes: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match CacheSettings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("Error: {}", err);
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&settings.log);

    match run(&cli, &settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "Command failed");
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(log: &LogSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    let registry = tracing_subscriber::registry().with(filter);

    match log.format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
            .init(),
    }
}

fn run(cli: &Cli, settings: &CacheSettings) -> UniteResult<()> {
    let store = LmdbStore::new(&settings.store_path, settings.map_size_mb)?;
    let policy = CachePolicy::default();
    let now = SystemClock.now_millis();

    match &cli.command {
        Commands::Sweep => {
            let report = sweep_namespace(&store, &policy, now, &TracingObserver);
            print_sweep(&report, cli.json)
        }
        Commands::Inspect => {
            let entries = inspect_namespace(&store, &policy, now)?;
            print_inspect(&entries, cli.json)
        }
        Commands::Purge { yes } => {
            if !yes {
                eprintln!("Refusing to purge {} without --yes", policy.namespace);
                return Ok(());
            }
            let removed = purge_namespace(&store, &policy)?;
            tracing::info!(namespace = %policy.namespace, removed, "Component cache purged");
            if cli.json {
                println!("{}", serde_json::json!({ "removed": removed }));
            } else {
                println!("Removed {} entries", removed);
            }
            Ok(())
        }
    }
}

fn print_sweep(report: &SweepReport, json: bool) -> UniteResult<()> {
    if json {
        println!("{}", to_json(report)?);
        return Ok(());
    }
    println!("Scanned:        {}", report.scanned);
    println!("Kept:           {}", report.kept);
    println!("Expired:        {}", report.expired);
    println!("Stale version:  {}", report.stale_version);
    println!("Corrupt:        {}", report.corrupt);
    println!("Failures:       {}", report.failures);
    Ok(())
}

fn print_inspect(entries: &[EntrySummary], json: bool) -> UniteResult<()> {
    if json {
        println!("{}", to_json(entries)?);
        return Ok(());
    }
    if entries.is_empty() {
        println!("No cache entries");
        return Ok(());
    }

    println!(
        "{:<40} {:<10} {:<20} {:>10} {:<16}",
        "KEY", "VERSION", "WRITTEN", "BYTES", "STATUS"
    );
    for entry in entries {
        let written = entry
            .written_at
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<40} {:<10} {:<20} {:>10} {:<16}",
            entry.key,
            entry.version.as_deref().unwrap_or("-"),
            written,
            entry.size_bytes,
            entry.status.as_str()
        );
    }
    Ok(())
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> UniteResult<String> {
    serde_json::to_string_pretty(value).map_err(|e| {
        UniteError::Codec(CodecError::Serialize {
            reason: e.to_string(),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Unserializable;

    impl serde::Serialize for Unserializable {
        fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("not representable"))
        }
    }

    #[test]
    fn test_to_json_failure_is_not_corruption() {
        let err = to_json(&Unserializable).expect_err("serialization should fail");
        assert!(matches!(err, UniteError::Codec(CodecError::Serialize { .. })));
        assert!(!err.is_corruption());
    }

    #[test]
    fn test_to_json_sweep_report() {
        let json = to_json(&SweepReport::default()).expect("report should serialize");
        assert!(json.contains("\"stale_version\": 0"));
    }
}
