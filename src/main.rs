use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use bargain_hunter::{
    bot::{TelegramBot, TelegramClient},
    config::LoggingConfig,
    plugins::notifiers::{LogNotifier, TelegramNotifier},
    web::{self, AppState},
    AppConfig, CheckEngine, CheckScheduler, CheckSettings, HttpFetcher, Notifier, PluginManager,
    WatchStore,
};

#[derive(Parser)]
#[command(
    name = "bargain-hunter",
    version,
    about = "Reports search listings under a price ceiling to Telegram"
)]
struct Cli {
    /// Directory holding default.toml and its overrides
    #[arg(long, default_value = "config")]
    config_dir: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Run the scheduler, the chat bot and the health server (default)
    Run,
    /// Run one pass without delivering anything and print the matches as JSON
    CheckOnce,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = AppConfig::load(&cli.config_dir).context("Failed to load configuration")?;
    let _log_guard = init_tracing(&config.logging)?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(config).await,
        Commands::CheckOnce => check_once(config).await,
    }
}

fn init_tracing(logging: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.filter))
        .context("Invalid log filter")?;

    match &logging.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, "bargain-hunter.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer())
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer())
                .init();
            Ok(None)
        }
    }
}

fn init_metrics(config: &AppConfig) -> Result<Option<PrometheusHandle>> {
    if !config.metrics.enabled {
        return Ok(None);
    }
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install metrics recorder")?;
    Ok(Some(handle))
}

async fn build_engine(config: &AppConfig, notifier: Arc<dyn Notifier>) -> Result<Arc<CheckEngine>> {
    let plugins = PluginManager::new();
    plugins.initialize_default_plugins(&config.sites).await?;
    info!("Supported sites: {}", plugins.list_sites().await.join(", "));

    let fetcher = Arc::new(HttpFetcher::new(&config.scraper)?);
    Ok(Arc::new(CheckEngine::new(
        fetcher,
        plugins,
        notifier,
        CheckSettings::from(&config.checker),
    )))
}

async fn run(config: AppConfig) -> Result<()> {
    info!("Starting bargain hunter...");

    let metrics = init_metrics(&config)?;
    let store = Arc::new(WatchStore::open(&config.storage.data_dir).await?);

    let telegram = match &config.telegram.bot_token {
        Some(token) => Some(Arc::new(TelegramClient::new(&config.telegram, token)?)),
        None => {
            warn!("No Telegram bot token configured, matches will only be logged");
            None
        }
    };
    let notifier: Arc<dyn Notifier> = match &telegram {
        Some(client) => Arc::new(TelegramNotifier::new(Arc::clone(client))),
        None => Arc::new(LogNotifier::new()),
    };
    let engine = build_engine(&config, notifier).await?;

    let mut scheduler =
        CheckScheduler::new(Arc::clone(&engine), Arc::clone(&store), config.checker.interval())
            .await?;
    scheduler.start().await?;

    let bot_task = telegram.map(|client| {
        let bot = TelegramBot::new(
            client,
            Arc::clone(&store),
            Arc::clone(&engine),
            config.checker.interval_minutes,
            config.telegram.poll_timeout,
        );
        tokio::spawn(bot.run())
    });

    let state = AppState {
        engine: Arc::clone(&engine),
        metrics,
    };

    tokio::select! {
        result = web::serve(&config, state) => result?,
        result = tokio::signal::ctrl_c() => {
            result?;
            info!("Shutting down...");
        }
    }

    if let Some(task) = bot_task {
        task.abort();
    }
    scheduler.shutdown().await?;

    Ok(())
}

async fn check_once(config: AppConfig) -> Result<()> {
    let store = WatchStore::open(&config.storage.data_dir).await?;
    let engine = build_engine(&config, Arc::new(LogNotifier::new())).await?;

    let products = store.list_products().await?;
    let sites = store.list_sites().await?;
    // Nothing is delivered, so an unbound store still gets checked
    let destination = store.chat_id().await?.unwrap_or_default();

    let listings = engine.run_check(&products, &sites, Some(destination)).await?;
    println!("{}", serde_json::to_string_pretty(&listings)?);

    Ok(())
}
