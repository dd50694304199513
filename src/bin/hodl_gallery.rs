use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use miette::IntoDiagnostic;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use hodl_gallery::balances::{BalancesClient, BlockdaemonHttpClient};
use hodl_gallery::cache::AssetCache;
use hodl_gallery::config::{Config, ConfigLoader};
use hodl_gallery::domain::AssetId;
use hodl_gallery::error::GalleryError;
use hodl_gallery::grouping::{self, DateOrder, GemOrder, SortConfig};
use hodl_gallery::indexer::AlgonodeHttpClient;
use hodl_gallery::metadata::PeraHttpClient;
use hodl_gallery::nfd::{self, NfdHttpClient};
use hodl_gallery::output::{JsonOutput, StderrProgress};
use hodl_gallery::pipeline::Orchestrator;
use hodl_gallery::server::{self, AppState};

#[derive(Parser)]
#[command(name = "hodl-gallery")]
#[command(about = "Asset gallery aggregator and API proxy for the HODL Heroes NFT collection")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Run the gallery API server")]
    Serve(ServeArgs),
    #[command(about = "Run the aggregation pipeline once and print the collection")]
    Fetch(FetchArgs),
    #[command(about = "List current holders of an asset")]
    Holders(HoldersArgs),
    #[command(about = "Drop the persistent asset cache")]
    ClearCache,
}

#[derive(Args)]
struct ServeArgs {
    #[arg(long)]
    bind: Option<String>,
}

#[derive(Args, Clone)]
struct FetchArgs {
    #[arg(long)]
    no_cache: bool,

    #[arg(long, value_enum)]
    group: Option<GroupMode>,

    #[arg(long, value_enum)]
    gem_order: Option<GemOrder>,

    #[arg(long, value_enum)]
    date_order: Option<DateOrder>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum GroupMode {
    Tiers,
    Editions,
}

#[derive(Args)]
struct HoldersArgs {
    asset_id: String,

    #[arg(long)]
    resolve_names: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(gallery) = report.downcast_ref::<GalleryError>() {
            return ExitCode::from(map_exit_code(gallery));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &GalleryError) -> u8 {
    match error {
        GalleryError::InvalidAssetId(_)
        | GalleryError::ConfigRead(_)
        | GalleryError::ConfigParse(_) => 2,
        GalleryError::IndexerHttp(_)
        | GalleryError::IndexerStatus { .. }
        | GalleryError::MetadataHttp(_)
        | GalleryError::MetadataStatus { .. }
        | GalleryError::MalformedMetadata(_)
        | GalleryError::BalancesHttp(_)
        | GalleryError::BalancesStatus { .. }
        | GalleryError::NfdHttp(_)
        | GalleryError::NfdStatus { .. } => 3,
        _ => 1,
    }
}

#[tokio::main]
async fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ConfigLoader::resolve(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve(args) => run_serve(args, config).await,
        Commands::Fetch(args) => run_fetch(args, config).await,
        Commands::Holders(args) => run_holders(args, config).await,
        Commands::ClearCache => run_clear_cache(config),
    }
}

async fn run_serve(args: ServeArgs, config: Config) -> miette::Result<()> {
    let bind = args.bind.unwrap_or_else(|| config.bind_address.clone());
    let state = Arc::new(AppState::new(&config)?);
    server::serve(state, &bind).await?;
    Ok(())
}

async fn run_fetch(args: FetchArgs, config: Config) -> miette::Result<()> {
    let cache = AssetCache::new(config.cache_ttl_secs)?;
    if args.no_cache {
        cache.invalidate()?;
    }

    let lister = AlgonodeHttpClient::new(&config)?;
    let metadata = PeraHttpClient::new(&config)?;
    let mut orchestrator = Orchestrator::new(lister, metadata, cache);

    let cancel = CancellationToken::new();
    orchestrator.start(&cancel, &StderrProgress).await;

    let sort = SortConfig {
        gem_order: args.gem_order.unwrap_or(GemOrder::HighestFirst),
        date_order: args.date_order.unwrap_or(DateOrder::NewestFirst),
    };
    match args.group {
        Some(GroupMode::Tiers) => {
            JsonOutput::print_tier_groups(&grouping::group_by_tier(orchestrator.assets(), &sort))
        }
        Some(GroupMode::Editions) => JsonOutput::print_edition_groups(&grouping::group_by_edition(
            orchestrator.assets(),
            &sort,
        )),
        None => JsonOutput::print_assets(orchestrator.assets()),
    }
    .into_diagnostic()?;
    Ok(())
}

async fn run_holders(args: HoldersArgs, config: Config) -> miette::Result<()> {
    let id: AssetId = args.asset_id.parse::<AssetId>()?;
    let balances = BlockdaemonHttpClient::new(&config)?;
    let mut holders = balances.holders(id).await?;

    if args.resolve_names {
        let client = NfdHttpClient::new(&config)?;
        let mut addresses: Vec<String> = holders.iter().map(|h| h.address.clone()).collect();
        addresses.sort();
        addresses.dedup();
        let records = nfd::resolve_names(&client, &addresses).await;
        nfd::apply_names(&mut holders, &records);
    }

    grouping::sort_holders(&mut holders);
    JsonOutput::print_holders(&holders).into_diagnostic()?;
    Ok(())
}

fn run_clear_cache(config: Config) -> miette::Result<()> {
    let cache = AssetCache::new(config.cache_ttl_secs)?;
    cache.invalidate()?;
    Ok(())
}
