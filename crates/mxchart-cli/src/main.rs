//! mxchart CLI - Maintenance Timeline Renderer
//!
//! Serves the gated render endpoint, or renders a request body offline.

use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use mxchart_core::{wire, ChartRequest, Renderer};
use mxchart_render::{ChromeRasterizer, Deadline, HtmlTimelineRenderer, Rasterizer};
use mxchart_server::config::DEFAULT_SECRET_HEADER;
use mxchart_server::{ServerConfig, SharedSecret};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "mxchart")]
#[command(author, version, about = "Maintenance timeline renderer", long_about = None)]
struct Cli {
    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP render service
    Serve(ServeArgs),

    /// Render a request body file to PNG (or HTML)
    Render(RenderArgs),
}

#[derive(Args)]
struct ServeArgs {
    /// Bind address
    #[arg(long, env = "MXCHART_ADDR", default_value = "0.0.0.0:3000")]
    addr: SocketAddr,

    /// Shared secret expected in the secret header
    #[arg(long, env = "MXCHART_SECRET", hide_env_values = true)]
    secret: String,

    /// Header carrying the shared secret
    #[arg(long, env = "MXCHART_SECRET_HEADER", default_value = DEFAULT_SECRET_HEADER)]
    secret_header: String,

    /// Upper bound for one rasterization, in seconds
    #[arg(long, env = "MXCHART_RENDER_TIMEOUT_SECS", default_value_t = 30)]
    render_timeout_secs: u64,

    #[command(flatten)]
    browser: BrowserArgs,

    /// Return PNG bodies base64-encoded
    #[arg(long, env = "MXCHART_BASE64_BODY")]
    base64_body: bool,
}

#[derive(Args)]
struct BrowserArgs {
    /// Chrome/Chromium binary (autodetected if not specified)
    #[arg(long, env = "MXCHART_CHROME_PATH")]
    chrome_path: Option<PathBuf>,

    /// Launch Chrome without its sandbox (needed in most containers)
    #[arg(long, env = "MXCHART_NO_SANDBOX")]
    no_sandbox: bool,
}

#[derive(Args)]
struct RenderArgs {
    /// Request body file: {"tasks": [...]}
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Output file path
    #[arg(short, long)]
    output: PathBuf,

    /// Write the HTML document instead of a PNG
    #[arg(long)]
    html: bool,

    /// Date marked as today (defaults to the local date)
    #[arg(long, value_name = "YYYY-MM-DD")]
    today: Option<NaiveDate>,

    /// Dark color theme
    #[arg(long)]
    dark: bool,

    /// Chart title
    #[arg(long)]
    title: Option<String>,

    /// Upper bound for rasterization, in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    #[command(flatten)]
    browser: BrowserArgs,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    match cli.command {
        Commands::Serve(args) => cmd_serve(args),
        Commands::Render(args) => cmd_render(&args),
    }
}

fn cmd_serve(args: ServeArgs) -> Result<()> {
    let config = ServerConfig::new(args.addr, SharedSecret::new(args.secret))
        .secret_header(&args.secret_header)?
        .render_timeout(Duration::from_secs(args.render_timeout_secs))
        .base64_body(args.base64_body)
        .chrome_path(args.browser.chrome_path)
        .sandbox(!args.browser.no_sandbox);
    config.validate()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    runtime
        .block_on(mxchart_server::serve(config))
        .context("server failed")
}

fn cmd_render(args: &RenderArgs) -> Result<()> {
    let started = Instant::now();
    let body = fs::read(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let tasks = wire::parse_request(&body)
        .with_context(|| format!("invalid request body in {}", args.file.display()))?;
    let today = args
        .today
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    let mut renderer = HtmlTimelineRenderer::new();
    if args.dark {
        renderer = renderer.dark_theme();
    }
    if let Some(title) = &args.title {
        renderer = renderer.title(title.clone());
    }
    let document = renderer.render(&ChartRequest::new(tasks, today))?;

    if args.html {
        fs::write(&args.output, &document.html)
            .with_context(|| format!("failed to write {}", args.output.display()))?;
    } else {
        let deadline = Deadline::after(Duration::from_secs(args.timeout_secs));
        let mut rasterizer = ChromeRasterizer::new();
        if let Some(path) = &args.browser.chrome_path {
            rasterizer = rasterizer.chrome_path(path.clone());
        }
        if args.browser.no_sandbox {
            rasterizer = rasterizer.no_sandbox();
        }
        let png = rasterizer.rasterize(&document, deadline)?;
        fs::write(&args.output, png)
            .with_context(|| format!("failed to write {}", args.output.display()))?;
    }

    info!(
        output = %args.output.display(),
        columns = document.columns,
        rows = document.rows,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "chart written"
    );
    Ok(())
}
