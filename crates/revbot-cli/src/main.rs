//! Revbot CLI

use anyhow::Result;
use clap::{Parser, Subcommand};
use revbot_core::{config, Config};
use revbot_github::GitHubClient;
use revbot_openai::{OpenAiClient, OpenAiClientConfig};
use revbot_web::{api::AppState, create_router, AutoPrWorker, AutoPrWorkerConfig, WebhookConfig};
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

/// Initialize logging with the specified verbosity level
fn init_logging(verbose: u8, quiet: bool, json: bool) -> Result<()> {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(format!("revbot_cli={}", level).parse()?)
        .add_directive(format!("revbot_core={}", level).parse()?)
        .add_directive(format!("revbot_github={}", level).parse()?)
        .add_directive(format!("revbot_openai={}", level).parse()?)
        .add_directive(format!("revbot_web={}", level).parse()?);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose >= 2) // Show module path at debug+
        .with_file(verbose >= 3) // Show file:line at trace
        .with_line_number(verbose >= 3);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }

    Ok(())
}

#[derive(Parser)]
#[command(name = "revbot")]
#[command(about = "AI code review relay for GitHub pull requests")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase verbosity (-v: info, -vv: debug, -vvv: trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output logs as JSON (for machine parsing)
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the review server
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "PORT", default_value_t = config::DEFAULT_PORT)]
        port: u16,

        /// GitHub token used for API calls and pushes
        #[arg(long, env = "GITHUB_TOKEN")]
        github_token: String,

        /// OpenAI API key
        #[arg(long, env = "OPENAI_API_KEY")]
        openai_api_key: String,

        /// Model requested for every completion
        #[arg(long, env = "OPENAI_MODEL", default_value = config::DEFAULT_MODEL)]
        openai_model: String,

        /// Webhook secret for signature verification
        #[arg(long, env = "GITHUB_WEBHOOK_SECRET")]
        webhook_secret: Option<String>,

        /// GitHub API base URL
        #[arg(long, env = "GITHUB_API_URL", default_value = config::DEFAULT_GITHUB_API_URL)]
        github_api_url: String,

        /// Completions API base URL
        #[arg(long, env = "OPENAI_API_URL", default_value = config::DEFAULT_OPENAI_API_URL)]
        openai_api_url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet, cli.log_json)?;

    match cli.command {
        Commands::Serve {
            port,
            github_token,
            openai_api_key,
            openai_model,
            webhook_secret,
            github_api_url,
            openai_api_url,
        } => {
            let config = Config::new(github_token, openai_api_key)
                .with_port(port)
                .with_model(openai_model)
                .with_github_api_url(github_api_url)
                .with_openai_api_url(openai_api_url)
                .with_webhook_secret(webhook_secret);
            serve(config).await
        }
    }
}

async fn serve(config: Config) -> Result<()> {
    if config.webhook_secret.is_none() {
        warn!("No webhook secret configured, signature verification is disabled");
    }

    let github = GitHubClient::with_api_url(config.github_token.as_str(), &config.github_api_url)?;
    let openai = OpenAiClient::with_config(
        config.openai_api_key.as_str(),
        OpenAiClientConfig {
            base_url: config.openai_api_url.clone(),
            model: config.openai_model.clone(),
            ..OpenAiClientConfig::default()
        },
    );

    let worker_config = AutoPrWorkerConfig::default();
    let (pr_jobs, jobs_rx) = tokio::sync::mpsc::channel(worker_config.queue_capacity);
    let worker = AutoPrWorker::new(github.clone(), worker_config);
    tokio::spawn(async move {
        worker.run(jobs_rx).await;
    });

    let state = Arc::new(AppState::new(
        github,
        openai,
        WebhookConfig::new(config.webhook_secret.clone()),
        pr_jobs,
    ));
    let app = create_router(state);

    println!("Starting review server on http://localhost:{}", config.port);
    info!(port = config.port, model = %config.openai_model, "Review server listening");

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
