//! Action listing CLI.
//!
//! Reads a page context (and optionally the previously known actions) from JSON
//! files and lists the page's actions through a registered strategy.
//!
//! Usage examples:
//!     $ MODEL_API_KEY=... cargo run --bin action-listing -- list --context page.json
//!     $ MODEL_API_KEY=... cargo run --bin action-listing -- list \
//!       --context page.json --previous actions.json --incremental --json

use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use action_listing_rs::config::{ListingConfig, ListingConfigOverrides, Verbosity};
use action_listing_rs::context::PageContext;
use action_listing_rs::llm::{CompletionService, LlmService};
use action_listing_rs::logging::{ListingLogger, LogCallback, log_facade_handler};
use action_listing_rs::metrics::{ListingMetrics, usage_callback};
use action_listing_rs::pipe::{ActionListingPipe, ActionListingStrategy, available_strategies};
use action_listing_rs::types::{Action, PossibleAction};
use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use log::info;
use serde::de::DeserializeOwned;

#[derive(Parser)]
#[command(
    name = "action-listing",
    author,
    version,
    about = "List the actions a page offers using a language model"
)]
struct Cli {
    /// Increase log verbosity (pass multiple times for DEBUG).
    #[arg(long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the actions of a page context.
    List(ListArgs),
    /// Print the registered strategy names.
    Strategies,
}

#[derive(Args)]
struct ListArgs {
    /// JSON file holding the page context.
    #[arg(long)]
    context: PathBuf,

    /// JSON file holding the previously known actions.
    #[arg(long)]
    previous: Option<PathBuf>,

    /// Only list actions not covered by `--previous`.
    #[arg(long, requires = "previous")]
    incremental: bool,

    /// Registered listing strategy.
    #[arg(long, default_value = "simple-markdown-table")]
    strategy: String,

    /// Attempts before giving up (defaults to LISTING_MAX_TRIES or 3).
    #[arg(long)]
    max_tries: Option<usize>,

    /// Override the model name.
    #[arg(long)]
    model: Option<String>,

    /// Print the listed actions as JSON instead of a table.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_env_logger(cli.verbose);
    let verbosity = verbosity_from_count(cli.verbose);

    match cli.command {
        Command::List(args) => run_list(args, verbosity).await?,
        Command::Strategies => {
            for name in available_strategies() {
                println!("{name}");
            }
        }
    }

    Ok(())
}

async fn run_list(args: ListArgs, verbosity: Verbosity) -> Result<()> {
    let config = build_config(&args, verbosity)?;
    let context: PageContext = read_json(&args.context).await?;
    let previous: Option<Vec<Action>> = match &args.previous {
        Some(path) => Some(read_json(path).await?),
        None => None,
    };

    let strategy: ActionListingStrategy = args.strategy.parse()?;
    let metrics = ListingMetrics::shared();
    let usage = usage_callback(Arc::clone(&metrics), strategy.prompt_ids().incremental);
    let service: Arc<dyn CompletionService> = Arc::new(
        LlmService::from_config(&config, Some(usage))
            .context("failed to configure model service")?,
    );
    let logger = Arc::new(ListingLogger::from_listing_config(&config));
    let pipe = strategy
        .pipe_with(Some(service), logger)?
        .with_max_tries(config.max_tries)
        .with_metrics(Arc::clone(&metrics));

    info!("Listing actions of {} with strategy {strategy}", context.url);

    let actions = match (&previous, args.incremental) {
        (Some(previous), true) => pipe.list_incremental(&context, previous).await?,
        (previous, _) => pipe.list(&context, previous.as_deref()).await?,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&actions)?);
    } else {
        print_table(&actions);
    }

    let metrics = metrics
        .lock()
        .map_err(|_| anyhow!("metrics lock poisoned"))?;
    info!(
        "Listed {} actions ({} prompt tokens, {} completion tokens, {} ms)",
        actions.len(),
        metrics.total_prompt_tokens,
        metrics.total_completion_tokens,
        metrics.total_inference_time_ms
    );
    Ok(())
}

fn build_config(args: &ListArgs, verbosity: Verbosity) -> Result<ListingConfig> {
    let base = ListingConfig::from_env().context("invalid listing configuration")?;
    let mut overrides = ListingConfigOverrides {
        verbose: Some(verbosity),
        external_logger: Some(Some(make_logger_callback())),
        ..ListingConfigOverrides::default()
    };
    if let Some(model) = &args.model {
        overrides = overrides.model_name(model.as_str());
    }
    if let Some(max_tries) = args.max_tries {
        overrides = overrides.max_tries(max_tries);
    }
    Ok(base.with_overrides(overrides))
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

fn print_table(actions: &[PossibleAction]) {
    println!("| ID | Description | Parameters | Category |");
    println!("|----|-------------|------------|----------|");
    for action in actions {
        let params = action
            .params
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        println!(
            "| {} | {} | {} | {} |",
            action.id, action.description, params, action.category
        );
    }
}

fn make_logger_callback() -> LogCallback {
    Arc::new(log_facade_handler)
}

fn verbosity_from_count(count: u8) -> Verbosity {
    match count {
        0 => Verbosity::Medium,
        _ => Verbosity::Detailed,
    }
}

fn init_env_logger(verbose: u8) {
    if env::var("RUST_LOG").is_err() {
        let level = if verbose > 0 { "debug" } else { "info" };
        unsafe {
            env::set_var("RUST_LOG", level);
        }
    }

    let _ = env_logger::Builder::from_env(env_logger::Env::default())
        .format_timestamp_secs()
        .try_init();
}
