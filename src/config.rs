use serde::Deserialize;
use std::path::PathBuf;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub social: SocialConfig,
    #[serde(default)]
    pub billing: BillingConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SocialConfig {
    #[serde(default = "default_social_api_base")]
    pub api_base: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct BillingConfig {
    #[serde(default = "default_billing_api_base")]
    pub api_base: String,
    #[serde(default = "default_success_url")]
    pub success_url: String,
    #[serde(default = "default_cancel_url")]
    pub cancel_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: default_requests_per_minute(),
        }
    }
}

impl Default for SocialConfig {
    fn default() -> Self {
        Self {
            api_base: default_social_api_base(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            api_base: default_billing_api_base(),
            success_url: default_success_url(),
            cancel_url: default_cancel_url(),
        }
    }
}

fn default_bind() -> String { "127.0.0.1".into() }
fn default_port() -> u16 { 8080 }
fn default_requests_per_minute() -> u32 { 60 }
fn default_social_api_base() -> String { "https://api.openai.com/v1".into() }
fn default_model() -> String { "gpt-4o-mini".into() }
fn default_timeout_secs() -> u64 { 20 }
fn default_max_tokens() -> u32 { 350 }
fn default_billing_api_base() -> String { "https://api.stripe.com".into() }
fn default_success_url() -> String { "https://example.com/success".into() }
fn default_cancel_url() -> String { "https://example.com/cancel".into() }

pub fn load_config(path: &PathBuf) -> Option<Config> {
    let content = std::fs::read_to_string(path).ok()?;
    toml::from_str(&content).ok()
}
