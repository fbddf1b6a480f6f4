mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "adscout-cli")]
#[command(about = "Ad library crawl and enrichment pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Run one scrape now
    Scrape {
        /// Search keyword; repeat for several. Defaults to trending tags.
        #[arg(long = "keyword")]
        keywords: Vec<String>,
        /// Result pages per keyword
        #[arg(long)]
        max_pages: Option<u32>,
        /// Crawl and classify against an in-memory store; nothing is persisted
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
    /// Classify creatives still missing an analysis
    Analyze,
    /// Delete old scraping jobs and alert triggers (windows of 1 to 36500 days)
    Cleanup {
        #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u32).range(1..=36_500))]
        job_days: u32,
        #[arg(long, default_value_t = 90, value_parser = clap::value_parser!(u32).range(1..=36_500))]
        trigger_days: u32,
    },
    /// Print the next fire time of each scheduled job
    Schedule,
    /// Summarize trends across recently analyzed creatives
    Insights {
        #[arg(long, default_value_t = 7)]
        days: u32,
    },
    /// Suggest improvements for one stored creative
    Improve { id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("adscout-cli: no command given, see --help");
        return Ok(());
    };

    let config = adscout_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match command {
        Commands::Migrate => commands::migrate(&config).await,
        Commands::Scrape {
            keywords,
            max_pages,
            dry_run,
        } => commands::scrape(&config, keywords, max_pages, dry_run).await,
        Commands::Analyze => commands::analyze(&config).await,
        Commands::Cleanup {
            job_days,
            trigger_days,
        } => commands::cleanup(&config, job_days, trigger_days).await,
        Commands::Schedule => commands::schedule(&config),
        Commands::Insights { days } => commands::insights(&config, days).await,
        Commands::Improve { id } => commands::improve(&config, &id).await,
    }
}
