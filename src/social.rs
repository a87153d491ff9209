use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::analysis::AnalysisResult;
use crate::config::SocialConfig;
use crate::server::analyze::Tier;

const WATERMARK: &str = "Generated by Cymatica";

/// Client for the external copy-generation service. Every call is best-effort:
/// missing key, transport failure, bad status, or empty content all degrade to
/// the deterministic static templates.
pub struct SocialClient {
    http: reqwest::Client,
    config: SocialConfig,
    api_key: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ChannelCopy {
    pub post: String,
    pub hashtags: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SocialPack {
    pub instagram: ChannelCopy,
    pub linkedin: ChannelCopy,
    pub tiktok: ChannelCopy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watermark: Option<String>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

impl SocialClient {
    pub fn new(http: reqwest::Client, config: SocialConfig, api_key: Option<String>) -> Self {
        Self { http, config, api_key }
    }

    pub async fn social_pack(&self, analysis: &AnalysisResult, tier: Tier) -> SocialPack {
        let context = prompt_context(analysis);
        let (instagram, linkedin, tiktok) = tokio::join!(
            self.channel_copy("Instagram", &context),
            self.channel_copy("LinkedIn", &context),
            self.channel_copy("TikTok", &context),
        );

        SocialPack {
            instagram: ChannelCopy {
                post: instagram.unwrap_or_else(|| instagram_template(analysis)),
                hashtags: smart_hashtags(analysis),
            },
            linkedin: ChannelCopy {
                post: linkedin.unwrap_or_else(|| linkedin_template(analysis)),
                hashtags: vec!["#MusicTech".into(), "#Innovation".into(), "#CreativeTech".into()],
            },
            tiktok: ChannelCopy {
                post: tiktok.unwrap_or_else(|| tiktok_template(analysis)),
                hashtags: vec!["#musictech".into(), "#sound".into(), "#foryou".into()],
            },
            watermark: (tier == Tier::Free).then(|| WATERMARK.to_string()),
        }
    }

    async fn channel_copy(&self, platform: &str, context: &str) -> Option<String> {
        let key = self.api_key.as_deref()?;
        let prompt = format!(
            "Write a short {} post for a musician sharing these spectral analysis \
             results. Plain text only, no surrounding quotes.\n\n{}",
            platform, context
        );
        let body = json!({
            "model": self.config.model,
            "messages": [{ "role": "user", "content": prompt }],
            "max_tokens": self.config.max_tokens,
            "temperature": 0.7,
        });

        let response = self
            .http
            .post(format!("{}/chat/completions", self.config.api_base))
            .bearer_auth(key)
            .json(&body)
            .send()
            .await;
        let response = match response.and_then(|r| r.error_for_status()) {
            Ok(r) => r,
            Err(err) => {
                log::warn!("{} copy generation failed: {}", platform, err);
                return None;
            }
        };
        let parsed: ChatResponse = match response.json().await {
            Ok(p) => p,
            Err(err) => {
                log::warn!("{} copy response unreadable: {}", platform, err);
                return None;
            }
        };

        let content = parsed.choices.into_iter().next()?.message.content;
        let content = content.trim();
        if content.is_empty() {
            None
        } else {
            Some(content.to_string())
        }
    }
}

fn prompt_context(analysis: &AnalysisResult) -> String {
    format!(
        "Fundamental: {} Hz ({})\nQuality score: {}/100\nHarmonics detected: {}",
        analysis.fundamental_frequency,
        analysis.musical_note,
        analysis.score,
        analysis.harmonics.len()
    )
}

fn quality_word(score: u8) -> &'static str {
    if score > 80 {
        "exceptional"
    } else if score > 60 {
        "strong"
    } else {
        "solid"
    }
}

fn instagram_template(analysis: &AnalysisResult) -> String {
    format!(
        "Spectral analysis results:\nNote: {}\nScore: {}/100\nFrequency: {} Hz\n\
         A {} harmonic structure.",
        analysis.musical_note,
        analysis.score,
        analysis.fundamental_frequency,
        quality_word(analysis.score)
    )
}

fn linkedin_template(analysis: &AnalysisResult) -> String {
    format!(
        "Just ran a spectral analysis: {} Hz fundamental ({}) with {} detectable \
         harmonics, composite score {}/100. The algorithm confirms a {} harmonic \
         structure.",
        analysis.fundamental_frequency,
        analysis.musical_note,
        analysis.harmonics.len(),
        analysis.score,
        quality_word(analysis.score)
    )
}

fn tiktok_template(analysis: &AnalysisResult) -> String {
    format!(
        "{} Hz fundamental, {} harmonics detected, score {}/100. The spectrum \
         doesn't lie.",
        analysis.fundamental_frequency,
        analysis.harmonics.len(),
        analysis.score
    )
}

fn smart_hashtags(analysis: &AnalysisResult) -> Vec<String> {
    let mut tags: Vec<String> = vec![
        "#spectral".into(),
        "#musictech".into(),
        "#frequency".into(),
        format!("#{}note", analysis.musical_note.to_lowercase()),
    ];
    if analysis.score > 85 {
        tags.extend(["#exceptional".into(), "#masterpiece".into()]);
    } else {
        tags.extend(["#quality".into(), "#harmony".into()]);
    }
    tags.truncate(10);
    tags
}
