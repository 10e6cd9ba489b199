use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use ai_client::OpenAi;
use askbot_common::{Config, SourceKind};
use askbot_scout::consensus::{ConsensusGenerator, LlmConsensus};
use askbot_scout::ledger::{JsonFileLedger, LedgerStore};
use askbot_scout::notify::noop::{LogBackend, NoopBackend};
use askbot_scout::notify::{NotifyBackend, NotifyRouter};
use askbot_scout::pipeline::AnswerBot;
use askbot_scout::publish::{LogPublisher, Publisher};
use askbot_scout::sources::build_source;
use x_client::{OAuthCredentials, XClient};

#[derive(Parser)]
#[command(name = "askbot", about = "Consensus answers for discussion threads")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Answer new questions from one source, publish and send a digest.
    Run {
        /// hn or reddit
        #[arg(long)]
        source: SourceKind,
        /// Only consider posts created before this date (Hacker News).
        #[arg(long)]
        before: Option<NaiveDate>,
        /// Log tweets and the digest instead of sending them; leave the ledger untouched.
        #[arg(long)]
        dry_run: bool,
        /// Ledger file, overriding ASKBOT_LEDGER_PATH.
        #[arg(long)]
        ledger: Option<PathBuf>,
    },
    /// Print the newest ledger rows.
    ShowLedger {
        #[arg(long)]
        ledger: Option<PathBuf>,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("askbot=info".parse()?))
        .init();

    match Cli::parse().command {
        Command::Run {
            source,
            before,
            dry_run,
            ledger,
        } => run(source, before, dry_run, ledger).await,
        Command::ShowLedger { ledger, limit } => show_ledger(ledger, limit).await,
    }
}

async fn run(
    kind: SourceKind,
    before: Option<NaiveDate>,
    dry_run: bool,
    ledger: Option<PathBuf>,
) -> Result<()> {
    info!(source = %kind, dry_run, "Askbot starting...");

    let config = Config::from_env()?;
    let http = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()?;

    let source = build_source(kind, &config, http.clone(), before);

    let mut llm =
        OpenAi::new(&config.openai_api_key, &config.openai_model).with_http_client(http.clone());
    if let Some(base_url) = &config.openai_base_url {
        llm = llm.with_base_url(base_url);
    }
    let generator: Arc<dyn ConsensusGenerator> = Arc::new(LlmConsensus::new(llm));

    let store: Arc<dyn LedgerStore> =
        Arc::new(JsonFileLedger::new(ledger.unwrap_or_else(|| config.ledger_path.clone())));

    let publisher: Arc<dyn Publisher> = match (&config.x, dry_run) {
        (Some(x), false) => {
            info!("Publishing to X enabled");
            let credentials = OAuthCredentials {
                consumer_key: x.consumer_key.clone(),
                consumer_secret: x.consumer_secret.clone(),
                access_token: x.access_token.clone(),
                access_token_secret: x.access_token_secret.clone(),
            };
            Arc::new(XClient::new(credentials).with_http_client(http.clone()))
        }
        (None, false) => {
            info!("No X credentials set, tweets will only be logged");
            Arc::new(LogPublisher)
        }
        (_, true) => Arc::new(LogPublisher),
    };

    let notifier: Arc<dyn NotifyBackend> = if dry_run {
        Arc::new(LogBackend)
    } else {
        match NotifyRouter::from_config(&config, http) {
            Some(router) => Arc::new(router),
            None => {
                info!("No digest backend configured, notifications disabled");
                Arc::new(NoopBackend)
            }
        }
    };

    let bot = AnswerBot::new(source, generator, store, publisher, notifier)
        .with_post_deadline(config.post_deadline)
        .with_dry_run(dry_run);

    let stats = bot.run().await?;
    info!("{stats}");
    Ok(())
}

async fn show_ledger(ledger: Option<PathBuf>, limit: usize) -> Result<()> {
    let store = JsonFileLedger::new(ledger.unwrap_or_else(Config::ledger_path_from_env));
    let rows = store.load().await?;

    println!("{} rows in {}", rows.len(), store.path().display());
    for row in rows.iter().take(limit) {
        println!("\n{row}\n  {}\n  {}", row.answer, row.url);
    }
    Ok(())
}
