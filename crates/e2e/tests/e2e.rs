//! E2E suite entry point
//!
//! Runs the store suites against the live site through Playwright.
//! Run with: cargo test --package shopcheck-e2e --test e2e -- [options]

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use regex::Regex;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use shopcheck_e2e::cases::case_files;
use shopcheck_e2e::playwright::check_playwright_installed;
use shopcheck_e2e::suites;
use shopcheck_e2e::{
    standard_registry, Browser, E2eError, E2eResult, PlaywrightProvider, RunnerConfig, SuiteConfig,
    TestData, TestRunner,
};

#[derive(Parser, Debug)]
#[command(name = "shopcheck-e2e")]
#[command(about = "UI and API suites for the automationexercise.com demo store")]
struct Args {
    /// Suite configuration file (TOML); defaults apply when it is missing
    #[arg(short, long, default_value = "shopcheck.toml")]
    config: PathBuf,

    /// Browser to use (chromium, firefox, webkit)
    #[arg(long)]
    browser: Option<Browser>,

    /// Show the browser window
    #[arg(long)]
    headed: bool,

    /// Number of tests run concurrently
    #[arg(short, long)]
    workers: Option<usize>,

    /// Extra attempts for a failing test
    #[arg(long)]
    retries: Option<u32>,

    /// Run only tests carrying this tag (ui, api, integration, data-driven)
    #[arg(short, long)]
    tag: Option<String>,

    /// Run only tests whose name or suite matches this pattern
    #[arg(short, long)]
    grep: Option<Regex>,

    /// Store under test
    #[arg(long)]
    base_url: Option<String>,

    /// Output directory for test-results.json
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// List the selected tests without running them
    #[arg(long)]
    list: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to create tokio runtime: {}", e);
            std::process::exit(2);
        }
    };

    match rt.block_on(async_main(args)) {
        Ok(true) => std::process::exit(0),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("{}", e);
            std::process::exit(2);
        }
    }
}

fn load_config(args: &Args) -> E2eResult<SuiteConfig> {
    let mut config = SuiteConfig::load(&args.config)?;
    config.apply_env()?;

    if let Some(browser) = args.browser {
        config.browser = browser;
    }
    if args.headed {
        config.headless = false;
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if let Some(retries) = args.retries {
        config.retries = retries;
    }
    if let Some(base_url) = &args.base_url {
        config.base_url = base_url.clone();
    }
    if let Some(output) = &args.output {
        config.output_dir = output.clone();
    }

    config.validate()?;
    Ok(config)
}

async fn async_main(args: Args) -> E2eResult<bool> {
    let config = load_config(&args)?;
    let suites = suites::all(&config)?;

    let provider = Arc::new(PlaywrightProvider::new(&config));
    let registry = shopcheck_fixture::install(standard_registry(provider, TestData::default(), &config)?)?;

    let runner_config = RunnerConfig {
        tag: args.tag.clone(),
        grep: args.grep.clone(),
        ..RunnerConfig::from(&config)
    };
    let runner = TestRunner::new(Arc::clone(&registry), runner_config);

    let selected = runner.select(&suites);
    if args.list {
        for (suite, case) in &selected {
            println!("{} › {} [{}]", suite.name, case.name, case.tags.join(", "));
        }
        println!("{} test(s)", selected.len());
        for path in case_files(&config.data_dir) {
            println!("case file: {}", path.display());
        }
        return Ok(true);
    }
    if selected.is_empty() {
        return Err(E2eError::Config("no tests match the given filters".to_string()));
    }

    if suites::needs_browser(&registry, selected.iter().map(|(_, case)| *case)) {
        check_playwright_installed()?;
    }

    info!(
        "Target {} ({}, {})",
        config.base_url,
        config.browser,
        if config.headless { "headless" } else { "headed" }
    );

    let results = runner.run(&suites).await;
    runner.write_results(&results)?;

    Ok(results.success())
}
