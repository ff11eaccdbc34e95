//! vpress CLI: bulk download, store upload and CMS publishing.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vpress_pipeline::{
    config, fetch, orchestrate, publish, store, FetchOptions, PipelineError, PipelineResult,
    PublishOptions, RunOptions, StoreOptions,
};
use vpress_site::{SiteClient, DEFAULT_EMBED_HEIGHT, DEFAULT_EMBED_WIDTH};
use vpress_store::StoreClient;

#[derive(Parser)]
#[command(
    name = "vpress",
    version,
    about = "Bulk video downloader, store uploader and CMS autoposter"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Download manifest entries into MP4/JPG pairs
    Fetch(FetchArgs),
    /// Upload downloaded pairs to the video store
    Store(StoreArgs),
    /// Publish stored videos as CMS posts
    Publish(PublishArgs),
    /// Run all three phases, then clean up on full success
    Run(RunArgs),
}

#[derive(Args)]
struct FetchArgs {
    /// Input manifest of `url - title` lines
    #[arg(long, default_value = "upload.txt")]
    src: PathBuf,
    /// Output directory
    #[arg(long, default_value = "downloads")]
    out: PathBuf,
    /// Cookie file for age-gated sites
    #[arg(long, default_value = "cookies.txt")]
    cookies: PathBuf,
    /// Parallel workers [default: host parallelism]
    #[arg(long)]
    workers: Option<usize>,
    /// Per-download deadline in seconds
    #[arg(long, default_value_t = 3600)]
    download_timeout: u64,
}

#[derive(Args)]
struct StoreArgs {
    /// Directory with MP4/JPG pairs
    #[arg(long, default_value = "downloads")]
    dir: PathBuf,
    /// Ledger file to write
    #[arg(long, default_value = "store_results.json")]
    out: PathBuf,
    /// Parallel uploads
    #[arg(long, default_value_t = 4)]
    workers: usize,
    /// Store API key [env: BUNNY_API_KEY]
    #[arg(long)]
    api_key: Option<String>,
    /// Store library id [env: BUNNY_LIBRARY_ID]
    #[arg(long)]
    library: Option<u64>,
}

#[derive(Args)]
struct PublishArgs {
    /// Store-phase ledger to read
    #[arg(long, default_value = "store_results.json")]
    input: PathBuf,
    /// Ledger file to write
    #[arg(long, default_value = "site_results.json")]
    out: PathBuf,
    /// Parallel posts
    #[arg(long, default_value_t = 1)]
    workers: usize,
    /// Post status: publish|draft|private
    #[arg(long, default_value = "publish")]
    status: String,
    /// Iframe width
    #[arg(long, default_value_t = DEFAULT_EMBED_WIDTH)]
    width: u32,
    /// Iframe height
    #[arg(long, default_value_t = DEFAULT_EMBED_HEIGHT)]
    height: u32,
    /// Site base URL [env: WP_SITE]
    #[arg(long)]
    site: Option<String>,
    /// Site username [env: WP_USER]
    #[arg(long)]
    user: Option<String>,
    /// Site application password [env: WP_APP_PW]
    #[arg(long)]
    password: Option<String>,
}

#[derive(Args)]
struct RunArgs {
    #[command(flatten)]
    fetch: FetchArgs,
    /// Parallel uploads in the store phase
    #[arg(long, default_value_t = 4)]
    store_workers: usize,
    /// Store API key [env: BUNNY_API_KEY]
    #[arg(long)]
    api_key: Option<String>,
    /// Store library id [env: BUNNY_LIBRARY_ID]
    #[arg(long)]
    library: Option<u64>,
    /// Parallel posts in the publish phase
    #[arg(long, default_value_t = 1)]
    publish_workers: usize,
    /// Post status: publish|draft|private
    #[arg(long, default_value = "publish")]
    status: String,
    /// Iframe width
    #[arg(long, default_value_t = DEFAULT_EMBED_WIDTH)]
    width: u32,
    /// Iframe height
    #[arg(long, default_value_t = DEFAULT_EMBED_HEIGHT)]
    height: u32,
    /// Site base URL [env: WP_SITE]
    #[arg(long)]
    site: Option<String>,
    /// Site username [env: WP_USER]
    #[arg(long)]
    user: Option<String>,
    /// Site application password [env: WP_APP_PW]
    #[arg(long)]
    password: Option<String>,
}

impl FetchArgs {
    fn into_options(self) -> FetchOptions {
        FetchOptions {
            manifest: self.src,
            out_dir: self.out,
            cookies: Some(self.cookies),
            workers: self.workers.unwrap_or_else(config::default_fetch_workers),
            download_timeout_secs: self.download_timeout,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Install rustls crypto provider (required for TLS/HTTPS)
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        eprintln!("Failed to install rustls crypto provider");
        return ExitCode::from(2);
    }

    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("vpress=info".parse().expect("static directive"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    let cli = Cli::parse();

    match dispatch(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_partial_failure() => {
            error!("{}", e);
            ExitCode::from(1)
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::from(2)
        }
    }
}

async fn dispatch(command: Command) -> PipelineResult<()> {
    match command {
        Command::Fetch(args) => {
            let summary = fetch::run_fetch(args.into_options()).await?;
            if summary.is_clean() {
                Ok(())
            } else {
                Err(PipelineError::ItemsFailed {
                    phase: "fetch",
                    failed: summary.failed,
                    total: summary.total(),
                })
            }
        }
        Command::Store(args) => {
            let store_config = config::resolve_store_config(args.api_key, args.library)?;
            let client = StoreClient::new(store_config)?;
            let summary = store::run_store(
                client,
                StoreOptions {
                    dir: args.dir,
                    out_ledger: args.out,
                    workers: args.workers,
                },
            )
            .await?;
            if summary.is_clean() {
                Ok(())
            } else {
                Err(PipelineError::ItemsFailed {
                    phase: "store",
                    failed: summary.failed,
                    total: summary.total(),
                })
            }
        }
        Command::Publish(args) => {
            let site_config = config::resolve_site_config(args.site, args.user, args.password)?;
            let client = SiteClient::new(site_config)?;
            let summary = publish::run_publish(
                client,
                PublishOptions {
                    ledger: args.input,
                    out_ledger: args.out,
                    workers: args.workers,
                    post_status: args.status,
                    embed_width: args.width,
                    embed_height: args.height,
                },
            )
            .await?;
            if summary.is_clean() {
                Ok(())
            } else {
                Err(PipelineError::ItemsFailed {
                    phase: "publish",
                    failed: summary.failed,
                    total: summary.total(),
                })
            }
        }
        Command::Run(args) => {
            // Resolve all credentials before any work starts.
            let store_config = config::resolve_store_config(args.api_key, args.library)?;
            let site_config = config::resolve_site_config(args.site, args.user, args.password)?;
            let store_client = StoreClient::new(store_config)?;
            let site_client = SiteClient::new(site_config)?;

            let fetch_options = args.fetch.into_options();
            let run_options = RunOptions {
                store: StoreOptions {
                    dir: fetch_options.out_dir.clone(),
                    out_ledger: PathBuf::from("store_results.json"),
                    workers: args.store_workers,
                },
                publish: PublishOptions {
                    ledger: PathBuf::from("store_results.json"),
                    out_ledger: PathBuf::from("site_results.json"),
                    workers: args.publish_workers,
                    post_status: args.status,
                    embed_width: args.width,
                    embed_height: args.height,
                },
                fetch: fetch_options,
            };

            orchestrate::run_all(store_client, site_client, run_options).await
        }
    }
}
