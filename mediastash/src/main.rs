//! mediastash - object-storage gateway for task artifacts
//!
//! Thin command-line front end over the gateway library: upload task
//! artifacts, mint signed download URLs, inspect and delete stored
//! objects. Store credentials come from the `S3_*` environment.

use anyhow::Context;
use clap::{Parser, Subcommand};
use mediastash_gateway::{S3Store, StorageGateway, StoreConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "mediastash")]
#[command(about = "Object-storage gateway for task artifacts", long_about = None)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "MEDIASTASH_LOG_LEVEL")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload a local file as a task artifact
    Upload {
        /// File to upload
        file: PathBuf,

        /// Task the artifact belongs to
        #[arg(long)]
        task: String,

        /// Format for content-type resolution; defaults to the file extension
        #[arg(long)]
        format: Option<String>,
    },
    /// Print a signed download URL for a key
    Url {
        /// Object key, e.g. downloads/abc123/clip.mp4
        key: String,
    },
    /// Delete the object at a key
    Delete {
        /// Object key to delete
        key: String,
    },
    /// Print the stored metadata view of a key, or null
    Info {
        /// Object key to inspect
        key: String,
    },
    /// Delete every artifact of a task
    Purge {
        /// Task whose artifacts are removed
        task: String,
    },
    /// Probe the store and exit non-zero when unreachable
    Health,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "mediastash={},mediastash_gateway={}",
                    args.log_level, args.log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = StoreConfig::from_env().context("loading store configuration")?;
    let store = S3Store::connect(&config).context("building the store client")?;
    info!(endpoint = %config.endpoint, bucket = %config.bucket, "store client ready");
    let gateway = StorageGateway::new(Arc::new(store));

    match args.command {
        Command::Upload { file, task, format } => {
            let format = format.unwrap_or_else(|| {
                file.extension()
                    .map(|ext| ext.to_string_lossy().into_owned())
                    .unwrap_or_default()
            });
            let result = gateway.upload(&file, &task, &format).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Url { key } => {
            let signed = gateway.download_url(&key).await?;
            println!("{}", serde_json::to_string_pretty(&signed)?);
        }
        Command::Delete { key } => {
            gateway.delete(&key).await?;
            println!("deleted {key}");
        }
        Command::Info { key } => match gateway.file_info(&key).await {
            Some(info) => println!("{}", serde_json::to_string_pretty(&info)?),
            None => println!("null"),
        },
        Command::Purge { task } => {
            let removed = gateway.purge_task(&task).await?;
            println!("purged {removed} artifacts of task {task}");
        }
        Command::Health => {
            if gateway.health_check().await {
                println!("ok: bucket {} reachable at {}", config.bucket, config.endpoint);
            } else {
                anyhow::bail!("store unreachable at {}", config.endpoint);
            }
        }
    }

    Ok(())
}
