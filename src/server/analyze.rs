use std::net::SocketAddr;

use axum::extract::{ConnectInfo, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{AppState, VERSION};
use crate::analysis::{analyze, AudioInput};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    #[default]
    Free,
    SocialPack,
    Premium,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub audio_data: Option<AudioPayload>,
    #[serde(default)]
    pub tier: Tier,
}

/// Wire shape of `audioData`: a JSON array of numbers, or an opaque string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum AudioPayload {
    Values(Vec<f64>),
    Seed(String),
}

/// Decode the wire payload. Arrays whose elements are all integers in 0..=255
/// are raw PCM bytes (the shape a byte buffer takes after JSON serialization);
/// other arrays are sample values. Strings are opaque seeds.
fn to_input(payload: Option<AudioPayload>) -> AudioInput {
    match payload {
        None => AudioInput::Absent,
        Some(AudioPayload::Seed(seed)) => AudioInput::Seed(seed),
        Some(AudioPayload::Values(values)) => {
            let is_bytes = !values.is_empty()
                && values
                    .iter()
                    .all(|v| v.fract() == 0.0 && (0.0..=255.0).contains(v));
            if is_bytes {
                AudioInput::Pcm16(values.iter().map(|&v| v as u8).collect())
            } else {
                AudioInput::Samples(values.iter().map(|&v| v as f32).collect())
            }
        }
    }
}

pub async fn handle(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    if !state.limiter.check(addr.ip()) {
        return Err((
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({ "success": false, "error": "Rate limit exceeded" })),
        ));
    }

    let result = analyze(to_input(request.audio_data));
    log::info!(
        "Analysis: {:.2} Hz ({}) score={} for {}",
        result.fundamental_frequency,
        result.musical_note,
        result.score,
        addr.ip()
    );

    // Copy generation is best-effort; the analysis result stands on its own.
    let content = state.social.social_pack(&result, request.tier).await;

    Ok(Json(json!({
        "success": true,
        "analysis": result,
        "content": content,
        "metadata": {
            "generatedAt": Utc::now().to_rfc3339(),
            "version": VERSION,
        },
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_payload_maps_to_absent() {
        assert!(matches!(to_input(None), AudioInput::Absent));
    }

    #[test]
    fn string_payload_is_a_seed() {
        let input = to_input(Some(AudioPayload::Seed("test".into())));
        match input {
            AudioInput::Seed(seed) => assert_eq!(seed, "test"),
            other => panic!("unexpected input: {:?}", other),
        }
    }

    #[test]
    fn byte_like_arrays_decode_as_pcm() {
        let input = to_input(Some(AudioPayload::Values(vec![0.0, 128.0, 255.0, 7.0])));
        match input {
            AudioInput::Pcm16(bytes) => assert_eq!(bytes, vec![0, 128, 255, 7]),
            other => panic!("unexpected input: {:?}", other),
        }
    }

    #[test]
    fn fractional_arrays_are_samples() {
        let input = to_input(Some(AudioPayload::Values(vec![0.5, -0.25])));
        match input {
            AudioInput::Samples(samples) => assert_eq!(samples, vec![0.5, -0.25]),
            other => panic!("unexpected input: {:?}", other),
        }
    }

    #[test]
    fn out_of_byte_range_integers_are_samples() {
        let input = to_input(Some(AudioPayload::Values(vec![1.0, 300.0])));
        assert!(matches!(input, AudioInput::Samples(_)));
    }

    #[test]
    fn tier_parses_from_wire_names() {
        let request: AnalyzeRequest =
            serde_json::from_str(r#"{"audioData":"test","tier":"social_pack"}"#).unwrap();
        assert_eq!(request.tier, Tier::SocialPack);

        let request: AnalyzeRequest = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(request.tier, Tier::Free);
        assert!(request.audio_data.is_none());
    }
}
