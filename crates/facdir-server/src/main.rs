use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use facdir::http;
use facdir_core::{
    DirectoryConfig, DEFAULT_FRESHNESS_S, DEFAULT_LOOKAHEAD, DEFAULT_SOURCE_URL,
    DEFAULT_USER_AGENT,
};
use facdir_local::{Extractor, FacultyDirectory, LocalFetcher};

#[derive(Parser, Debug)]
#[command(name = "facdir")]
#[command(about = "Faculty directory scraper with a cached JSON endpoint", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve `GET /api/faculty-list` over HTTP.
    Serve(ServeCmd),
    /// Run the extraction pipeline once and print the JSON array (no cache, no fallback).
    Scrape(ScrapeCmd),
    /// Print version info.
    Version(VersionCmd),
}

/// Source page and extraction policy, shared by `serve` and `scrape`.
#[derive(clap::Args, Debug, Clone)]
struct SourceArgs {
    /// Faculty listing page to scrape.
    #[arg(
        long = "url",
        alias = "source-url",
        env = "FACDIR_SOURCE_URL",
        default_value = DEFAULT_SOURCE_URL
    )]
    source_url: String,
    /// User-Agent sent with the fetch.
    #[arg(long, env = "FACDIR_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    user_agent: String,
    /// Seconds a successful scrape is served before the next request re-fetches.
    #[arg(long, env = "FACDIR_FRESHNESS_S", default_value_t = DEFAULT_FRESHNESS_S)]
    freshness_s: u64,
    /// Blocks inspected after a name for designation, profile link and photo.
    #[arg(long, env = "FACDIR_LOOKAHEAD", default_value_t = DEFAULT_LOOKAHEAD)]
    lookahead: usize,
    /// Fetch timeout (connect + body), milliseconds.
    #[arg(long, env = "FACDIR_TIMEOUT_MS")]
    timeout_ms: Option<u64>,
    /// Cap on response body bytes.
    #[arg(long, env = "FACDIR_MAX_BYTES")]
    max_bytes: Option<u64>,
}

impl SourceArgs {
    fn to_config(&self) -> DirectoryConfig {
        let mut cfg = DirectoryConfig::for_source(self.source_url.trim());
        cfg.user_agent = self.user_agent.clone();
        cfg.freshness_s = self.freshness_s;
        cfg.lookahead = self.lookahead;
        if let Some(ms) = self.timeout_ms {
            cfg.timeout_ms = ms.max(1);
        }
        if let Some(n) = self.max_bytes {
            cfg.max_bytes = n;
        }
        cfg
    }
}

#[derive(clap::Args, Debug)]
struct ServeCmd {
    /// Address to bind the HTTP server to (host:port).
    #[arg(long, env = "FACDIR_BIND", default_value = "127.0.0.1:8080")]
    bind: String,
    #[command(flatten)]
    source: SourceArgs,
}

#[derive(clap::Args, Debug)]
struct ScrapeCmd {
    /// Read HTML from a local file instead of fetching `--url`.
    #[arg(long)]
    html_file: Option<PathBuf>,
    /// Base URL for resolving relative links in `--html-file` input.
    #[arg(long, requires = "html_file")]
    base_url: Option<String>,
    #[command(flatten)]
    source: SourceArgs,
}

#[derive(clap::Args, Debug)]
struct VersionCmd {
    /// Output format: json|text
    #[arg(long = "output", alias = "format", default_value = "json")]
    output: String,
}

/// Opt-in env-file loader (`FACDIR_ENV_FILE`): `KEY=VALUE` lines, `#` comments.
///
/// Never overrides variables already present in the process environment and
/// never logs values.
fn load_env_file() {
    let Ok(p) = std::env::var("FACDIR_ENV_FILE") else {
        return;
    };
    let p = p.trim();
    if p.is_empty() {
        return;
    }
    let Ok(txt) = std::fs::read_to_string(p) else {
        return;
    };
    for raw in txt.lines() {
        let s = raw.trim();
        if s.is_empty() || s.starts_with('#') {
            continue;
        }
        let Some((k, v)) = s.split_once('=') else {
            continue;
        };
        let k = k.trim();
        let v = v.trim().trim_matches('"');
        if k.is_empty() {
            continue;
        }
        if std::env::var_os(k).is_none() {
            std::env::set_var(k, v);
        }
    }
}

async fn serve(cmd: ServeCmd) -> Result<()> {
    let cfg = cmd.source.to_config();
    let fetcher = Arc::new(LocalFetcher::new()?);
    let directory = Arc::new(FacultyDirectory::new(fetcher, cfg)?);
    let app = http::router(directory.clone());

    let addr: SocketAddr = cmd
        .bind
        .parse()
        .with_context(|| format!("invalid bind address {}", cmd.bind))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(
        addr = %listener.local_addr()?,
        source = %directory.config().source_url,
        freshness_s = directory.config().freshness_s,
        "facdir listening"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await
        .context("server shutdown")?;
    Ok(())
}

async fn scrape(cmd: ScrapeCmd) -> Result<()> {
    let cfg = cmd.source.to_config();
    let entries = match &cmd.html_file {
        Some(path) => {
            let html = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            Extractor::new(&cfg)?.extract(&html, cmd.base_url.as_deref())?
        }
        None => {
            let fetcher = Arc::new(LocalFetcher::new()?);
            FacultyDirectory::new(fetcher, cfg)?.scrape().await?
        }
    };
    tracing::info!(entries = entries.len(), "scrape complete");
    println!("{}", serde_json::to_string(&entries)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    load_env_file();

    // Logs go to stderr so `scrape` output stays parseable.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Serve(cmd) => serve(cmd).await?,
        Commands::Scrape(cmd) => scrape(cmd).await?,
        Commands::Version(args) => {
            let v = serde_json::json!({
                "name": "facdir",
                "version": env!("CARGO_PKG_VERSION"),
            });
            match args.output.to_ascii_lowercase().as_str() {
                "text" => println!("facdir {}", env!("CARGO_PKG_VERSION")),
                _ => println!("{v}"),
            }
        }
    }
    Ok(())
}
