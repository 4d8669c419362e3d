//! CLI command definitions, routing, and tracing setup.

use std::io::{BufRead, IsTerminal};
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use newsforge_core::{
    ArticleResearchConfig, CompanyResearchConfig, ProgressReporter, ResearchPipeline,
};
use newsforge_crawler::{FetchOrchestrator, probe_client, probe_url};
use newsforge_filter::{FilterOptions, rank_urls};
use newsforge_search::{ArticleType, CompanyQuery, Jurisdiction, TopicQuery};
use newsforge_shared::{
    AppConfig, FetchOutcome, ProviderSettings, ResearchBundle, config_file_path, init_config,
    load_config,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use url::Url;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Newsforge: news research bundles for companies and topics.
#[derive(Parser)]
#[command(
    name = "newsforge",
    version,
    about = "Search the news, keep the URLs worth reading, and fetch them into a research bundle.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run a research pipeline and emit a JSON bundle.
    Research {
        #[command(subcommand)]
        target: ResearchTarget,
    },

    /// Rank URLs the way the research pipeline would.
    ///
    /// URLs are taken from the arguments, or one per line from stdin.
    Filter {
        urls: Vec<String>,

        /// Maximum URLs to keep.
        #[arg(long, default_value_t = 15)]
        max_urls: usize,

        /// Keep paywalled sources.
        #[arg(long)]
        include_paywalls: bool,

        /// Keep social networks and aggregators.
        #[arg(long)]
        include_social: bool,

        /// Do not boost authoritative sources.
        #[arg(long)]
        no_authority_boost: bool,
    },

    /// Fetch one URL through the provider chain and print the outcome.
    Fetch {
        url: String,
    },

    /// Check whether a URL answers a HEAD request.
    Probe {
        url: String,
    },

    /// Show which providers are configured.
    Providers,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Research pipelines.
#[derive(Subcommand)]
pub(crate) enum ResearchTarget {
    /// Research a company's recent news coverage.
    Company {
        /// Company name, e.g. "Acme Capital".
        #[arg(long)]
        name: String,

        /// Company web domain.
        #[arg(long)]
        domain: String,

        /// Category slug, e.g. private_equity.
        #[arg(long)]
        category: String,

        /// Jurisdiction: UK, US, EU or anything else for no regional focus.
        #[arg(long, default_value = "other")]
        jurisdiction: String,

        /// Cap on URLs fetched (defaults to config).
        #[arg(long)]
        max_urls: Option<usize>,

        /// Concurrent fetches (defaults to config).
        #[arg(long)]
        concurrency: Option<usize>,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Research a topic for an article.
    Topic {
        /// Topic text used as the search query.
        topic: String,

        /// news, feature, deep_dive or analysis.
        #[arg(long, default_value = "news")]
        article_type: String,

        /// Publication whose hits go first (repeatable).
        #[arg(long = "priority-source")]
        priority_sources: Vec<String>,

        /// Keep paywalled sources.
        #[arg(long)]
        include_paywalls: bool,

        /// Cap on sources fetched, also the fetch concurrency (defaults to config).
        #[arg(long)]
        max_sources: Option<usize>,

        #[command(flatten)]
        run: RunArgs,
    },
}

/// Options shared by the research commands.
#[derive(Args, Clone, Debug)]
pub(crate) struct RunArgs {
    /// Search result pages to request (1-3).
    #[arg(long)]
    pages: Option<u32>,

    /// Write the bundle here instead of stdout.
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Stop launching fetches after this many seconds and emit what settled.
    #[arg(long)]
    deadline_secs: Option<u64>,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
///
/// Logs go to stderr so stdout stays clean for JSON output.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "newsforge=info",
        1 => "newsforge=debug",
        _ => "newsforge=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Research { target } => match target {
            ResearchTarget::Company {
                name,
                domain,
                category,
                jurisdiction,
                max_urls,
                concurrency,
                run,
            } => {
                let company = CompanyQuery {
                    company_name: name,
                    domain,
                    category,
                    jurisdiction: Jurisdiction::from(jurisdiction.as_str()),
                };
                cmd_research_company(company, max_urls, concurrency, &run).await
            }
            ResearchTarget::Topic {
                topic,
                article_type,
                priority_sources,
                include_paywalls,
                max_sources,
                run,
            } => {
                let topic = TopicQuery {
                    topic,
                    article_type: article_type.parse::<ArticleType>()?,
                    priority_sources,
                };
                cmd_research_topic(topic, include_paywalls, max_sources, &run).await
            }
        },
        Command::Filter {
            urls,
            max_urls,
            include_paywalls,
            include_social,
            no_authority_boost,
        } => {
            let opts = FilterOptions {
                exclude_paywalls: !include_paywalls,
                exclude_social: !include_social,
                prefer_authoritative: !no_authority_boost,
                ..FilterOptions::default().with_max_urls(max_urls)
            };
            cmd_filter(urls, &opts)
        }
        Command::Fetch { url } => cmd_fetch(&url).await,
        Command::Probe { url } => cmd_probe(&url).await,
        Command::Providers => cmd_providers(),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

// ---------------------------------------------------------------------------
// Research
// ---------------------------------------------------------------------------

fn build_pipeline(config: &AppConfig) -> Result<ResearchPipeline> {
    let settings = ProviderSettings::from_env(config);
    info!(?settings, "provider settings resolved");
    Ok(ResearchPipeline::from_settings(&settings, &config.research)?)
}

async fn cmd_research_company(
    company: CompanyQuery,
    max_urls: Option<usize>,
    concurrency: Option<usize>,
    run: &RunArgs,
) -> Result<()> {
    let config = load_config()?;
    let pipeline = build_pipeline(&config)?;

    let mut research = CompanyResearchConfig::new(company, &config.research);
    if let Some(pages) = run.pages {
        research.pages = pages;
    }
    if let Some(max) = max_urls {
        research.max_urls = max;
    }
    if let Some(n) = concurrency {
        research.concurrency = n;
    }

    info!(
        company = %research.company.company_name,
        pages = research.pages,
        max_urls = research.max_urls,
        "researching company"
    );

    let cancel = cancel_on_interrupt(run.deadline_secs);
    let reporter = CliProgress::new();
    let bundle = pipeline
        .research_company(&research, &cancel, &reporter)
        .await?;

    emit_bundle(&bundle, run.out.as_deref())
}

async fn cmd_research_topic(
    topic: TopicQuery,
    include_paywalls: bool,
    max_sources: Option<usize>,
    run: &RunArgs,
) -> Result<()> {
    let config = load_config()?;
    let pipeline = build_pipeline(&config)?;

    let mut research = ArticleResearchConfig::new(topic, &config.research);
    research.exclude_paywalls = !include_paywalls;
    if let Some(pages) = run.pages {
        research.pages = pages;
    }
    if let Some(max) = max_sources {
        research.max_sources = max;
    }

    info!(
        topic = %research.topic.topic,
        article_type = research.topic.article_type.as_str(),
        max_sources = research.max_sources,
        "researching topic"
    );

    let cancel = cancel_on_interrupt(run.deadline_secs);
    let reporter = CliProgress::new();
    let bundle = pipeline
        .research_article(&research, &cancel, &reporter)
        .await?;

    emit_bundle(&bundle, run.out.as_deref())
}

/// Token cancelled on Ctrl-C or when the optional deadline passes.
fn cancel_on_interrupt(deadline_secs: Option<u64>) -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();

    tokio::spawn(async move {
        let deadline = async {
            match deadline_secs {
                Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                warn!("interrupted, cancelling outstanding fetches");
            }
            _ = deadline => {
                warn!(deadline_secs, "deadline reached, cancelling outstanding fetches");
            }
            _ = trigger.cancelled() => return,
        }
        trigger.cancel();
    });

    token
}

fn emit_bundle(bundle: &ResearchBundle, out: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(bundle)?;

    match out {
        Some(path) => {
            std::fs::write(path, &json)
                .map_err(|e| eyre!("failed to write '{}': {e}", path.display()))?;

            println!();
            println!("  Research bundle written!");
            println!("  Query:    {}", bundle.query);
            println!("  Found:    {}", bundle.urls_found);
            println!("  Filtered: {}", bundle.urls_filtered);
            println!("  Crawled:  {}", bundle.urls_crawled);
            println!("  Words:    {}", bundle.total_words);
            println!("  Cost:     ${:.3}", bundle.cost);
            println!("  Path:     {}", path.display());
            println!();
        }
        None => println!("{json}"),
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner on stderr.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn url_settled(&self, outcome: &FetchOutcome, current: usize, total: usize) {
        let status = if outcome.success { "ok" } else { "failed" };
        self.spinner.set_message(format!(
            "Fetched [{current}/{total}] {} ({}, {status})",
            outcome.url, outcome.provider
        ));
    }

    fn done(&self, _bundle: &ResearchBundle) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// Utilities
// ---------------------------------------------------------------------------

fn cmd_filter(mut urls: Vec<String>, opts: &FilterOptions) -> Result<()> {
    if urls.is_empty() {
        let stdin = std::io::stdin();
        if stdin.is_terminal() {
            return Err(eyre!("no URLs given: pass them as arguments or pipe one per line"));
        }
        for line in stdin.lock().lines() {
            let line = line?;
            let line = line.trim();
            if !line.is_empty() {
                urls.push(line.to_string());
            }
        }
    }

    for ranked in rank_urls(&urls, opts) {
        println!("{:>3}  {}", ranked.score, ranked.url);
    }
    Ok(())
}

async fn cmd_fetch(url: &str) -> Result<()> {
    let parsed = Url::parse(url).map_err(|e| eyre!("invalid URL '{url}': {e}"))?;

    let config = load_config()?;
    let settings = ProviderSettings::from_env(&config);
    let fetcher = FetchOrchestrator::from_settings(&settings)?;

    let cancel = cancel_on_interrupt(None);
    let outcome = fetcher.fetch_one(parsed.as_str(), &cancel).await;
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    if !outcome.success {
        return Err(eyre!(
            "could not fetch '{url}': {}",
            outcome.error.as_deref().unwrap_or("unknown error")
        ));
    }
    Ok(())
}

async fn cmd_probe(url: &str) -> Result<()> {
    let parsed = Url::parse(url).map_err(|e| eyre!("invalid URL '{url}': {e}"))?;
    let report = probe_url(&probe_client()?, parsed.as_str()).await;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn cmd_providers() -> Result<()> {
    let config = load_config()?;
    let settings = ProviderSettings::from_env(&config);

    println!();
    for (name, available) in settings.availability() {
        let mark = if available { "configured" } else { "not configured" };
        println!("  {name:<14} {mark}");
    }
    println!();
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("# {}", config_file_path()?.display());
    println!("{toml_str}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_company_research() {
        let cli = Cli::try_parse_from([
            "newsforge",
            "research",
            "company",
            "--name",
            "Acme Capital",
            "--domain",
            "acme.example",
            "--category",
            "private_equity",
            "--jurisdiction",
            "UK",
            "--deadline-secs",
            "90",
            "-o",
            "bundle.json",
        ])
        .unwrap();

        match cli.command {
            Command::Research {
                target:
                    ResearchTarget::Company {
                        name,
                        jurisdiction,
                        run,
                        ..
                    },
            } => {
                assert_eq!(name, "Acme Capital");
                assert_eq!(jurisdiction, "UK");
                assert_eq!(run.deadline_secs, Some(90));
                assert_eq!(run.out, Some(PathBuf::from("bundle.json")));
            }
            _ => panic!("expected research company"),
        }
    }

    #[test]
    fn parses_topic_with_repeated_priority_sources() {
        let cli = Cli::try_parse_from([
            "newsforge",
            "-vv",
            "research",
            "topic",
            "continuation funds",
            "--article-type",
            "deep-dive",
            "--priority-source",
            "FT",
            "--priority-source",
            "Reuters",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Research {
                target:
                    ResearchTarget::Topic {
                        topic,
                        article_type,
                        priority_sources,
                        include_paywalls,
                        ..
                    },
            } => {
                assert_eq!(topic, "continuation funds");
                assert_eq!(article_type.parse::<ArticleType>().unwrap(), ArticleType::DeepDive);
                assert_eq!(priority_sources, vec!["FT", "Reuters"]);
                assert!(!include_paywalls);
            }
            _ => panic!("expected research topic"),
        }
    }

    #[test]
    fn company_research_requires_a_name() {
        let err = Cli::try_parse_from([
            "newsforge",
            "research",
            "company",
            "--domain",
            "acme.example",
            "--category",
            "fintech",
        ]);
        assert!(err.is_err());
    }
}
