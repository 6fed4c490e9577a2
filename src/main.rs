mod cli;
mod error;

use crate::cli::Args;
use crate::error::{ErrorKind, Result};
use clap::Parser;
use exn::ResultExt;
use s3bulk_config::Config;
use s3bulk_inspect::{HabInspector, InspectorHandle};
use s3bulk_pipeline::RunSummary;
use s3bulk_storage::StoreHandle;
use s3bulk_storage::backend::S3Store;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Conventional exit status for a run stopped by SIGINT.
const EXIT_INTERRUPTED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_directives()));
    // Logs go to stderr.
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted; waiting for in-flight uploads to finish");
                cancel.cancel();
            }
        }
    });

    match run(args, cancel).await {
        Ok(summary) if summary.cancelled => {
            tracing::warn!(%summary, "Upload cancelled");
            ExitCode::from(EXIT_INTERRUPTED)
        },
        Ok(summary) => {
            tracing::info!(%summary, "Upload complete");
            ExitCode::SUCCESS
        },
        Err(err) => {
            tracing::error!(error = ?err, "{}", *err);
            ExitCode::FAILURE
        },
    }
}

async fn run(args: Args, cancel: CancellationToken) -> Result<RunSummary> {
    let file = args.config.clone().or_else(Config::default_file);
    let config = Config::load(file.as_deref(), &args.overrides()).or_raise(|| ErrorKind::Config)?;
    tracing::info!(options = %config, "Using options");

    let (key_id, key_secret) = config.credentials().or_raise(|| ErrorKind::Config)?;
    let store: StoreHandle = Arc::new(S3Store::new(
        config.backend.to_string(),
        &config.bucket,
        &config.region,
        config.endpoint(),
        key_id,
        key_secret,
    ));
    let inspector = match &config.hab_binary {
        Some(binary) => HabInspector::with_binary(binary),
        None => HabInspector::discover(),
    }
    .or_raise(|| ErrorKind::Inspector)?;
    tracing::debug!(hab = %inspector.binary().display(), "Using hab CLI");
    let inspector: InspectorHandle = Arc::new(inspector);

    s3bulk_pipeline::run(config.pipeline_options(), store, inspector, cancel).await.or_raise(|| ErrorKind::Pipeline)
}
