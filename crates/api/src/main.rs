//! Switchboard API server binary.
//!
//! Usage:
//!   switchboard-api --config config.toml
//!   switchboard-api --port 8080
//!   switchboard-api --port 8080 --bind 0.0.0.0
//!
//! # Environment Variables
//!
//! - `SWITCHBOARD_BIND_ADDR` - Server bind address (default: 127.0.0.1)
//! - `OPENAI_API_KEY` - API key for the routing classifier
//! - `GITHUB_TOKEN_<ID>` / `LINEAR_API_KEY_<ID>` - Per-user credentials

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use switchboard_agents::{GitHubAgent, LinearAgent};
use switchboard_api::{serve, AppState};
use switchboard_classifier::{LlmClassifier, OpenAiChat};
use switchboard_common::DomainAgent;
use switchboard_orchestrator::SwitchboardConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,switchboard_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse command line arguments (simple for now)
    let args: Vec<String> = std::env::args().collect();
    let mut port: u16 = 8080;
    let mut config_path = "config.toml".to_string();
    let mut bind_addr: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--port" | "-p" => {
                if i + 1 < args.len() {
                    port = args[i + 1]
                        .parse()
                        .map_err(|_| anyhow::anyhow!("Invalid port number: {}", args[i + 1]))?;
                    i += 1;
                }
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--bind" | "-b" => {
                if i + 1 < args.len() {
                    bind_addr = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Switchboard API Server");
                println!();
                println!("Usage: switchboard-api [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -p, --port <PORT>    Port to listen on (default: 8080)");
                println!(
                    "  -b, --bind <ADDR>    Bind address (default: 127.0.0.1, env: SWITCHBOARD_BIND_ADDR)"
                );
                println!("  -c, --config <FILE>  Path to config.toml file (default: config.toml)");
                println!("  -h, --help           Show this help message");
                println!();
                println!("Environment variables:");
                println!("  SWITCHBOARD_BIND_ADDR    Server bind address (overridden by --bind flag)");
                println!("  OPENAI_API_KEY           API key for the routing classifier");
                println!("  GITHUB_TOKEN_<ID>        GitHub token for configured user <ID>");
                println!("  LINEAR_API_KEY_<ID>      Linear API key for configured user <ID>");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    // Determine bind address (CLI flag > env var > default 127.0.0.1)
    let host = bind_addr
        .or_else(|| std::env::var("SWITCHBOARD_BIND_ADDR").ok())
        .unwrap_or_else(|| "127.0.0.1".to_string());

    if host == "0.0.0.0" {
        tracing::warn!(
            "Server binding to 0.0.0.0 — this exposes the API to all network interfaces. \
             Ensure a firewall is in place."
        );
    }

    tracing::info!(path = %config_path, "Loading configuration");
    let config = SwitchboardConfig::from_file(&config_path)?;

    for problem in config.validate() {
        tracing::warn!(%problem, "Configuration incomplete");
    }

    let directory = config.directory();

    // Routing classifier
    let api_key = config.classifier.resolve_api_key();
    let llm_enabled = api_key.is_some();
    if !llm_enabled {
        tracing::warn!(
            "No classifier API key resolved (api_key or OPENAI_API_KEY) — \
             every query will fail classification until one is provided."
        );
    }
    let chat = OpenAiChat::new(
        Some(config.classifier.api_url.clone()),
        config.classifier.model.clone(),
        api_key,
        Duration::from_millis(config.classifier.timeout_ms),
    );
    let classifier = Arc::new(LlmClassifier::new(chat));

    // Domain agents, with per-user credentials
    let mut github_tokens = HashMap::new();
    let mut linear_keys = HashMap::new();
    for user in &config.users {
        if let Some(token) = user.resolve_github_token() {
            github_tokens.insert(user.id.clone(), token);
        }
        if let Some(key) = user.resolve_linear_api_key() {
            linear_keys.insert(user.id.clone(), key);
        }
    }
    let agents: Vec<Arc<dyn DomainAgent>> = vec![
        Arc::new(GitHubAgent::new(directory.clone(), github_tokens)),
        Arc::new(LinearAgent::new(directory.clone(), linear_keys)),
    ];

    let state = AppState::new(classifier, agents, directory, llm_enabled);

    // Start server
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    serve(Arc::new(state), addr).await?;

    Ok(())
}
