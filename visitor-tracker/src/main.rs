use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

use visitor_tracker::client::{
    Environment, FileSession, MemorySession, NamePrompt, PromptState, Reporter, SessionStore,
};
use visitor_tracker::config::DEFAULT_GEO_API;
use visitor_tracker::{router, AppState, GeoLocator, TrackerConfig};

#[derive(Parser, Debug)]
#[command(name = "track-visitor")]
#[command(about = "Email a notification for every site visit")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Run the tracking endpoint
    Serve(TrackerConfig),
    /// Act as a visitor: answer the name prompt and report the visit
    Visit(VisitArgs),
}

#[derive(Args, Debug)]
struct VisitArgs {
    /// Tracking endpoint to post to
    #[arg(long, default_value = "http://127.0.0.1:3000/api/track-visitor")]
    endpoint: String,

    /// Keep session flags in this file (in memory when omitted)
    #[arg(long)]
    session_file: Option<PathBuf>,

    #[arg(long, env = "GEO_API_BASE", default_value = DEFAULT_GEO_API)]
    geo_api_base: String,

    /// Page the visitor is "on"
    #[arg(long, default_value = "http://localhost/")]
    page_url: String,

    #[arg(long)]
    referrer: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.cmd {
        Cmd::Serve(cfg) => serve(cfg).await,
        Cmd::Visit(args) => match args.session_file.clone() {
            Some(path) => visit(&args, FileSession::open(path)).await,
            None => visit(&args, MemorySession::new()).await,
        },
    }
}

async fn serve(cfg: TrackerConfig) -> Result<()> {
    let state = AppState::from_config(&cfg).context("building HTTP client")?;
    if !state.mailer.is_configured() {
        tracing::warn!("RESEND_API_KEY or NOTIFICATION_EMAIL unset; visits will not be emailed");
    }
    let app = router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(cfg.bind)
        .await
        .with_context(|| format!("binding {}", cfg.bind))?;
    tracing::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

async fn visit(args: &VisitArgs, mut store: impl SessionStore) -> Result<()> {
    let mut prompt = NamePrompt::mount(&store);
    let PromptState::Scheduled { delay } = prompt.state() else {
        println!("Name already given this session; nothing to do.");
        return Ok(());
    };
    tokio::time::sleep(delay).await;
    prompt.open();

    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(b"Welcome! May I have your name? (Enter to skip) ")
        .await?;
    stdout.flush().await?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let input = lines.next_line().await?.unwrap_or_default();

    let name = if input.trim().is_empty() {
        prompt.skip(&mut store)?
    } else {
        prompt.submit(&mut store, &input)?
    }
    .context("prompt closed without an answer")?;

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(10))
        .build()?;
    let geo = GeoLocator::new(client.clone(), args.geo_api_base.clone());
    let reporter = Reporter::new(client, args.endpoint.clone(), geo);
    let record = Environment::detect(&args.page_url, args.referrer.as_deref()).record(Some(&name), Utc::now());

    if reporter.report(&mut store, record).await {
        println!("Thanks, {name}!");
    }
    Ok(())
}
