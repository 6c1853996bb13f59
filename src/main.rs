use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use psxscraper::{fetch, sink, Config, Dispatcher};
use reqwest::Client;
use std::{fs, path::PathBuf, sync::Arc};
use tracing::{error, info, instrument::WithSubscriber, Dispatch};
use tracing_subscriber::{fmt, EnvFilter};

/// Download one day's exchange reports and turn them into Parquet tables.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Report date (YYYY-MM-DD); defaults to today.
    #[arg(long)]
    date: Option<NaiveDate>,

    /// YAML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Use whatever is already in the data directory.
    #[arg(long)]
    skip_download: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // ─── 1) logging ─────────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .finish();
    let dispatch = Dispatch::new(subscriber);

    run(args, dispatch.clone()).with_subscriber(dispatch).await
}

async fn run(args: Args, dispatch: Dispatch) -> Result<()> {
    info!("startup");

    // ─── 2) config + dirs ───────────────────────────────────────────
    let config = Arc::new(Config::load(args.config.as_deref())?);
    let date = args.date.unwrap_or_else(|| Local::now().date_naive());
    let date_token = date.format("%Y-%m-%d").to_string();
    for d in [&config.data_dir, &config.out_dir] {
        fs::create_dir_all(d).with_context(|| format!("creating {}", d.display()))?;
    }

    // ─── 3) download ────────────────────────────────────────────────
    if args.skip_download {
        info!("download skipped by flag");
    } else if fetch::has_files_for(&config.data_dir, &date_token)? {
        info!(date = %date_token, "files already present; not downloading");
    } else {
        let client = Client::new();
        let reports = fetch::report_urls(&config, date)?;
        info!(reports = reports.len(), date = %date_token, "downloading");
        let got = fetch::download_all(
            &client,
            reports,
            &config.data_dir,
            config.download_concurrency,
        )
        .await;
        info!(files = got.len(), "downloads finished");
    }

    // ─── 4) extract on the blocking pool ────────────────────────────
    let files = fetch::list_files(&config.data_dir)?;
    if files.is_empty() {
        info!("no input files; exit");
        return Ok(());
    }
    info!(files = files.len(), "extracting");

    let tables = tokio::task::spawn_blocking({
        let config = Arc::clone(&config);
        let files = files.clone();
        move || Dispatcher::new(&config, dispatch).run(&files)
    })
    .await?;

    // ─── 5) store + clean up ────────────────────────────────────────
    if let Err(e) = sink::write_all(&config.out_dir, date, &tables) {
        error!(error = %e, "writing output failed; keeping inputs");
        return Err(e);
    }
    if !config.keep_downloads {
        let removed = fetch::delete_files(&files);
        info!(removed, "deleted inputs");
    }

    info!("all done");
    Ok(())
}
