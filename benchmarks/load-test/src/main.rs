//! Tripico Load Testing Tool
//!
//! Simulates concurrent users of the itinerary platform under a named traffic
//! profile, and seeds or cleans up the test data those users rely on.
//!
//! Usage:
//!   cargo run -p tripico-loadtest -- run --profile periodic --users 100 --duration 60
//!   cargo run -p tripico-loadtest -- seed
//!   cargo run -p tripico-loadtest -- cleanup --yes

mod report;

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use tripico_harness::auth::{
    CredentialCache, IdentityProvider, SeededUserStore, TokenFile, store,
};
use tripico_harness::cleanup::{self, CleanupSummary};
use tripico_harness::clock::SystemClock;
use tripico_harness::config::Config;
use tripico_harness::http::ServiceClient;
use tripico_harness::runner::{self, RunOptions};
use tripico_harness::seed::{SeedPacing, Seeder};
use tripico_harness::workload::{ProfileKind, RunContext};

/// Environment file for the seeding and cleanup commands.
const SEED_ENV_FILE: &str = ".env.seed";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Drive virtual users against the services.
    Run(RunArgs),
    /// Create seeded users, itineraries and social activity.
    Seed,
    /// Exchange custom tokens for ID tokens and save them to TOKENS_FILE.
    ExchangeTokens {
        /// Custom token file, keyed by email.
        #[arg(default_value = "custom_tokens.json")]
        input: PathBuf,
    },
    /// Delete seeded identity accounts and generated files.
    Cleanup {
        /// Do not ask for confirmation.
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Traffic profile: periodic or spike.
    #[arg(long, default_value = "periodic")]
    profile: ProfileKind,

    /// Number of concurrent users.
    #[arg(long, default_value = "100")]
    users: usize,

    /// Test duration in seconds.
    #[arg(long, default_value = "60")]
    duration: u64,

    /// Seconds over which users are started.
    #[arg(long, default_value = "10")]
    ramp_up: u64,

    /// Seed for the virtual users' random streams. Defaults to RANDOM_SEED.
    #[arg(long)]
    seed: Option<u64>,

    /// Write the full report as JSON.
    #[arg(long)]
    report: Option<PathBuf>,

    /// P95 latency gate in milliseconds.
    #[arg(long, default_value = "1000")]
    max_p95_ms: u64,

    /// Use fresh pre-exchanged tokens from TOKENS_FILE instead of signing in.
    #[arg(long)]
    token_file: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let env_file = match &cli.command {
        Command::Run(args) => args.profile.env_file(),
        _ => SEED_ENV_FILE,
    };
    let env_files = Config::load_env_files(&[env_file]);
    init_tracing();
    for file in &env_files {
        debug!(file = %file.display(), "loaded environment file");
    }

    let config = Config::from_env().context("Failed to load configuration")?;
    let client = ServiceClient::new().context("Failed to create HTTP client")?;

    match cli.command {
        Command::Run(args) => run_load(&config, client, args).await,
        Command::Seed => seed(&config, client).await,
        Command::ExchangeTokens { input } => exchange_tokens(&config, client, &input).await,
        Command::Cleanup { yes } => clean_up(&config, client, yes).await,
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn,hyper_util=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn identity_provider(config: &Config, client: ServiceClient) -> IdentityProvider {
    IdentityProvider::new(
        client,
        &config.identity_toolkit_url,
        config.firebase_api_key.clone(),
    )
}

fn credential_cache(config: &Config, client: ServiceClient) -> CredentialCache {
    CredentialCache::new(
        identity_provider(config, client),
        SeededUserStore::new(config.test_users_file.clone()),
        config.token_freshness,
        Arc::new(SystemClock),
    )
}

async fn run_load(config: &Config, client: ServiceClient, args: RunArgs) -> Result<()> {
    let profile = Arc::new(args.profile.profile()?);
    let credentials = Arc::new(credential_cache(config, client.clone()));
    if !credentials.is_configured() {
        warn!("FIREBASE_API_KEY not set, requests are sent without credentials");
    }

    let tokens = if args.token_file {
        let tokens = TokenFile::load_fresh(&config.tokens_file, config.token_freshness, Utc::now());
        info!(
            count = tokens.len(),
            path = %config.tokens_file.display(),
            "loaded pre-exchanged tokens"
        );
        tokens
    } else {
        Vec::new()
    };
    let ctx = Arc::new(RunContext::new(config, client, credentials).with_issued_tokens(tokens));

    println!("Tripico Load Test");
    println!("=================");
    println!("Profile:          {}", args.profile);
    println!("Concurrent users: {}", args.users);
    println!("Duration:         {} seconds", args.duration);
    println!("Ramp-up:          {} seconds", args.ramp_up);
    println!("Itinerary API:    {}", config.services.itinerary);
    println!();

    let summary = runner::run(
        ctx,
        profile,
        RunOptions {
            users: args.users,
            duration: Duration::from_secs(args.duration),
            ramp_up: Duration::from_secs(args.ramp_up),
            seed: args.seed.unwrap_or(config.random_seed),
        },
    )
    .await;

    report::print_run(&summary);
    if let Some(path) = &args.report {
        report::write_json(path, args.profile, &summary)?;
        println!("\nReport written to {}", path.display());
    }
    report::print_gates(&summary.report.aggregated, args.max_p95_ms);
    Ok(())
}

async fn seed(config: &Config, client: ServiceClient) -> Result<()> {
    let provider = identity_provider(config, client.clone());
    if config.create_identity_users && !provider.is_configured() {
        warn!("CREATE_FIREBASE_USERS is set but FIREBASE_API_KEY is not, skipping accounts");
    }
    let summary = Seeder::new(config, client, provider, SeedPacing::default())
        .run()
        .await?;
    report::print_seed(&summary);
    Ok(())
}

async fn exchange_tokens(config: &Config, client: ServiceClient, input: &Path) -> Result<()> {
    let cache = credential_cache(config, client);
    if !cache.is_configured() {
        bail!("FIREBASE_API_KEY is required to exchange custom tokens");
    }

    let records = store::read_custom_tokens(input)?;
    info!(count = records.len(), path = %input.display(), "exchanging custom tokens");
    let tokens = cache.exchange_all(&records).await;
    let exchanged = tokens.len();
    TokenFile::save(&config.tokens_file, tokens, Utc::now())?;

    println!(
        "Exchanged {exchanged}/{} tokens, saved to {}",
        records.len(),
        config.tokens_file.display()
    );
    if exchanged < records.len() {
        println!("⚠️  WARN: {} tokens could not be exchanged", records.len() - exchanged);
    }
    Ok(())
}

async fn clean_up(config: &Config, client: ServiceClient, yes: bool) -> Result<()> {
    let users = cleanup::load_targets(&config.test_users_file)?;
    let provider = identity_provider(config, client);

    println!("Tripico Test Data Cleanup");
    println!("=========================");
    println!("Seeded users: {}", users.len());
    if provider.is_configured() {
        println!("Identity accounts will be deleted.");
    } else {
        println!("FIREBASE_API_KEY not set, identity accounts are kept.");
    }
    println!(
        "Files: {}, {}",
        config.test_users_file.display(),
        config.tokens_file.display()
    );

    if !yes && !confirm("Proceed with cleanup?")? {
        println!("Cleanup cancelled.");
        return Ok(());
    }

    let mut summary = CleanupSummary::default();
    cleanup::delete_accounts(&provider, &users, &config.test_user_password, &mut summary).await;
    cleanup::remove_files(
        &[config.test_users_file.as_path(), config.tokens_file.as_path()],
        &mut summary,
    )?;
    report::print_cleanup(&summary);
    Ok(())
}

fn confirm(question: &str) -> Result<bool> {
    print!("{question} [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("Failed to read confirmation")?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
