//! Forum Harvest main entry point
//!
//! This is the command-line interface for the forum post harvester.

use clap::Parser;
use forum_harvest::config::{load_config_with_hash, Config};
use forum_harvest::crawler::{build_scheduler, handle_interrupts, stop_channel};
use forum_harvest::storage::open_storage;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Forum Harvest: a humanized forum post harvester
///
/// Forum Harvest visits a random batch of forums with a headless browser,
/// stores recent posts in SQLite, then idles before the next batch. It runs
/// until interrupted with Ctrl-C.
#[derive(Parser, Debug)]
#[command(name = "forum-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A humanized forum post harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Pre-authenticated browser session state (overrides the config file)
    #[arg(long, env = "HARVEST_SESSION_STATE", value_name = "PATH")]
    session_state: Option<PathBuf>,

    /// SQLite database path (overrides the config file)
    #[arg(long, env = "HARVEST_DATABASE", value_name = "PATH")]
    database: Option<String>,

    /// Perform a single run and exit instead of looping
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    once: bool,

    /// Validate config and show what would be harvested without starting a browser
    #[arg(long, conflicts_with_all = ["once", "stats"])]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["once", "dry_run"])]
    stats: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let mut config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if let Some(path) = cli.session_state {
        config.browser.session_state = Some(path);
    }
    if let Some(path) = cli.database {
        config.output.database_path = path;
    }

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_harvest(config, cli.once).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("forum_harvest=info,warn"),
            1 => EnvFilter::new("forum_harvest=debug,info"),
            2 => EnvFilter::new("forum_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the resolved configuration
fn handle_dry_run(config: &Config) {
    println!("=== Forum Harvest Dry Run ===\n");

    let schedule = &config.schedule;
    println!("Schedule:");
    println!(
        "  Forums per run: {}..={}",
        schedule.batch_min, schedule.batch_max
    );
    println!(
        "  Cooldown between forums: {}..={}s",
        schedule.cooldown_min_secs, schedule.cooldown_max_secs
    );
    println!(
        "  Idle between runs: {}..={}s",
        schedule.idle_min_secs, schedule.idle_max_secs
    );
    println!(
        "  Backoff with no forums: {}..={}s",
        schedule.empty_backoff_min_secs, schedule.empty_backoff_max_secs
    );

    println!("\nExtraction:");
    println!("  Origin: {}", config.extraction.origin);
    println!(
        "  Max post age: {} hours",
        config.extraction.max_post_age_hours
    );

    let browser = &config.browser;
    println!("\nBrowser:");
    println!("  Headless: {}", browser.headless);
    match &browser.chrome_path {
        Some(path) => println!("  Executable: {}", path.display()),
        None => println!("  Executable: auto-detect"),
    }
    match &browser.session_state {
        Some(path) => println!("  Session state: {}", path.display()),
        None => println!("  Session state: none"),
    }
    println!(
        "  Timeouts: navigation {}s, posts {}s",
        browser.navigation_timeout_secs, browser.element_timeout_secs
    );

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    println!("  Screenshots: {}", config.output.screenshot_dir.display());

    println!("\nForums ({}):", config.forums.len());
    for forum in &config.forums {
        println!("  - r/{}", forum);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    use forum_harvest::output::{load_statistics, print_statistics};

    println!("Database: {}\n", config.output.database_path);

    let storage = open_storage(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main harvest loop
async fn handle_harvest(config: Config, once: bool) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        "Forums: {}, database: {}",
        config.forums.len(),
        config.output.database_path
    );

    // The database is the one dependency the loop cannot degrade around
    let storage = match open_storage(Path::new(&config.output.database_path)) {
        Ok(storage) => storage,
        Err(e) => {
            tracing::error!("Failed to open database: {}", e);
            return Err(e.into());
        }
    };

    let (stop_handle, stop) = stop_channel();
    tokio::spawn(handle_interrupts(stop_handle, tokio::signal::ctrl_c, || {
        std::process::exit(130);
    }));

    let mut scheduler = build_scheduler(&config, storage, stop)?;

    if once {
        let report = scheduler.run_once().await;
        tracing::info!(
            "Run finished: {} of {} forums visited ({} failed), {} posts saved ({} new)",
            report.visited,
            report.selected.len(),
            report.failed,
            report.saved,
            report.inserted
        );
    } else {
        scheduler.run_forever().await;
    }

    Ok(())
}
