mod analysis;
mod cli;
mod config;
mod server;
mod social;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use cli::Cli;
use server::billing::BillingClient;
use server::rate_limit::RateLimiter;
use server::AppState;
use social::SocialClient;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    // Load config: explicit --config path, or auto-detect cymatica.toml / global config
    let config_path = cli.config.clone().or_else(|| {
        let local = std::path::PathBuf::from("cymatica.toml");
        if local.exists() {
            return Some(local);
        }
        if let Some(home) = dirs::home_dir() {
            let xdg = home.join(".config").join("cymatica").join("config.toml");
            if xdg.exists() {
                return Some(xdg);
            }
        }
        if let Some(config_dir) = dirs::config_dir() {
            let platform = config_dir.join("cymatica").join("config.toml");
            if platform.exists() {
                return Some(platform);
            }
        }
        None
    });

    let mut config = config::Config::default();
    if let Some(ref path) = config_path {
        if let Some(cfg) = config::load_config(path) {
            log::info!("Loaded config from {}", path.display());
            config = cfg;
        } else {
            log::warn!("Failed to load config from {}", path.display());
        }
    }
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    log::info!("cymatica - spectral analysis & scoring API");
    log::info!("Rate limit: {} requests/minute", config.limits.requests_per_minute);

    let social_key = env_secret("OPENAI_API_KEY");
    let billing_key = env_secret("STRIPE_SECRET_KEY");
    let webhook_secret = env_secret("STRIPE_WEBHOOK_SECRET");
    if social_key.is_none() {
        log::warn!("OPENAI_API_KEY not set; social copy will use static templates");
    }
    if billing_key.is_none() {
        log::warn!("STRIPE_SECRET_KEY not set; checkout endpoint disabled");
    }
    if webhook_secret.is_none() {
        log::warn!("STRIPE_WEBHOOK_SECRET not set; webhook events will be rejected");
    }

    let social_http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.social.timeout_secs))
        .build()
        .context("Failed to build social HTTP client")?;
    let billing_http = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .context("Failed to build billing HTTP client")?;

    let state = AppState {
        limiter: Arc::new(RateLimiter::new(
            config.limits.requests_per_minute,
            Duration::from_secs(60),
        )),
        social: Arc::new(SocialClient::new(
            social_http,
            config.social.clone(),
            social_key,
        )),
        billing: Arc::new(BillingClient::new(
            billing_http,
            config.billing.clone(),
            billing_key,
            webhook_secret,
        )),
    };

    server::serve(&config, state).await
}

fn env_secret(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
