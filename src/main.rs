use anyhow::{Context, bail};
use clap::Parser;
use dotenvy::dotenv;
use nhost_migrate::config::{DeploymentConfig, MigrationConfig};
use nhost_migrate::infrastructure::clients;
use nhost_migrate::services::migration::MigrationRun;
use nhost_migrate::services::table_copy::TableCopier;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// What to migrate (files, tables, all)
    #[arg(short, long, default_value = "all")]
    mode: String,

    /// Reconcile and print the file plan without writing anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nhost_migrate=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if !matches!(args.mode.as_str(), "files" | "tables" | "all") {
        bail!("unknown mode {:?} (expected files, tables or all)", args.mode);
    }

    info!("🚀 Starting Nhost migration [Mode: {}]", args.mode);

    let source = DeploymentConfig::from_env("SOURCE")?;
    let destination = DeploymentConfig::from_env("DESTINATION")?;
    let mut config = MigrationConfig::from_env();
    config.dry_run = args.dry_run;
    info!(
        "⚙️  Pause={}ms, retries={}, schemas={}",
        config.transfer_pause_ms,
        config.max_retries,
        config.schemas.join(",")
    );

    // Tables go first so relational rows (users, buckets) exist before the
    // file objects that reference them arrive.
    if matches!(args.mode.as_str(), "tables" | "all") {
        if args.dry_run {
            info!("Dry run: skipping table copy");
        } else {
            let source_pg = source
                .pg_connection
                .clone()
                .context("SOURCE_PG_CONNECTION must be set for table copy")?;
            let destination_pg = destination
                .pg_connection
                .clone()
                .context("DESTINATION_PG_CONNECTION must be set for table copy")?;

            let copier = TableCopier::new(
                source_pg,
                destination_pg,
                config.export_dir.clone(),
                config.schemas.clone(),
            );
            copier.run().await?;
        }
    }

    if matches!(args.mode.as_str(), "files" | "all") {
        let clients = clients::setup_clients(&source, &destination)?;
        let run = MigrationRun::new(
            config,
            clients.source,
            clients.destination,
            clients.ingest,
        );
        let stats = run.execute().await?;
        if stats.failed > 0 {
            warn!(
                "{} file(s) failed after retries; rerun to pick them up",
                stats.failed
            );
        }
    }

    info!("✅ Migration finished");
    Ok(())
}
