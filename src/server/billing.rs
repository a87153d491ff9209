use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::json;
use sha2::Sha256;
use thiserror::Error;

use super::AppState;
use crate::config::BillingConfig;

type HmacSha256 = Hmac<Sha256>;

/// Accepted clock skew between the provider's signature timestamp and ours.
const SIGNATURE_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Error)]
pub enum BillingError {
    #[error("billing is not configured")]
    NotConfigured,
    #[error("payment provider request failed: {0}")]
    Provider(#[from] reqwest::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WebhookError {
    #[error("missing signature header")]
    MissingSignature,
    #[error("malformed signature header")]
    MalformedSignature,
    #[error("signature timestamp outside tolerance")]
    StaleTimestamp,
    #[error("signature mismatch")]
    Mismatch,
    #[error("webhook secret is not configured")]
    NotConfigured,
}

/// Thin client for the payment provider: hosted checkout-session creation and
/// webhook signature verification. No data dependency on the analysis pipeline.
pub struct BillingClient {
    http: reqwest::Client,
    config: BillingConfig,
    secret_key: Option<String>,
    webhook_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub price_id: String,
    #[serde(default = "default_user_id")]
    pub user_id: String,
    pub success_url: Option<String>,
    pub cancel_url: Option<String>,
}

fn default_user_id() -> String {
    "anonymous".into()
}

#[derive(Debug, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

impl BillingClient {
    pub fn new(
        http: reqwest::Client,
        config: BillingConfig,
        secret_key: Option<String>,
        webhook_secret: Option<String>,
    ) -> Self {
        Self {
            http,
            config,
            secret_key,
            webhook_secret,
        }
    }

    pub async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, BillingError> {
        let key = self.secret_key.as_deref().ok_or(BillingError::NotConfigured)?;
        let success_url = request
            .success_url
            .as_deref()
            .unwrap_or(&self.config.success_url);
        let cancel_url = request
            .cancel_url
            .as_deref()
            .unwrap_or(&self.config.cancel_url);

        let params = [
            ("mode", "subscription"),
            ("payment_method_types[0]", "card"),
            ("line_items[0][price]", request.price_id.as_str()),
            ("line_items[0][quantity]", "1"),
            ("success_url", success_url),
            ("cancel_url", cancel_url),
            ("client_reference_id", request.user_id.as_str()),
        ];

        let session = self
            .http
            .post(format!("{}/v1/checkout/sessions", self.config.api_base))
            .bearer_auth(key)
            .form(&params)
            .send()
            .await?
            .error_for_status()?
            .json::<CheckoutSession>()
            .await?;

        log::info!("Checkout session created: {}", session.id);
        Ok(session)
    }

    /// Verify a `t=...,v1=...` signature header: HMAC-SHA256 over `"{t}.{body}"`
    /// with the shared webhook secret, any v1 candidate may match.
    pub fn verify_signature(&self, payload: &[u8], header: &str) -> Result<(), WebhookError> {
        self.verify_signature_at(payload, header, chrono::Utc::now().timestamp())
    }

    fn verify_signature_at(
        &self,
        payload: &[u8],
        header: &str,
        now: i64,
    ) -> Result<(), WebhookError> {
        let secret = self
            .webhook_secret
            .as_deref()
            .ok_or(WebhookError::NotConfigured)?;

        let mut timestamp: Option<i64> = None;
        let mut candidates: Vec<&str> = Vec::new();
        for part in header.split(',') {
            match part.trim().split_once('=') {
                Some(("t", value)) => timestamp = value.parse().ok(),
                Some(("v1", value)) => candidates.push(value),
                _ => {}
            }
        }
        let timestamp = timestamp.ok_or(WebhookError::MalformedSignature)?;
        if candidates.is_empty() {
            return Err(WebhookError::MalformedSignature);
        }
        if (now - timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
            return Err(WebhookError::StaleTimestamp);
        }

        for candidate in candidates {
            let Ok(signature) = hex::decode(candidate) else {
                continue;
            };
            let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
                .map_err(|_| WebhookError::NotConfigured)?;
            mac.update(timestamp.to_string().as_bytes());
            mac.update(b".");
            mac.update(payload);
            if mac.verify_slice(&signature).is_ok() {
                return Ok(());
            }
        }
        Err(WebhookError::Mismatch)
    }
}

pub async fn handle_checkout(
    State(state): State<AppState>,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    match state.billing.create_checkout_session(&request).await {
        Ok(session) => Ok(Json(json!({ "url": session.url, "sessionId": session.id }))),
        Err(BillingError::NotConfigured) => Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "success": false, "error": "Billing is not configured" })),
        )),
        Err(err) => {
            log::error!("Checkout session creation failed: {}", err);
            Err((
                StatusCode::BAD_GATEWAY,
                Json(json!({ "success": false, "error": "Payment session creation failed" })),
            ))
        }
    }
}

#[derive(Debug, Deserialize)]
struct WebhookEvent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: EventData,
}

#[derive(Debug, Default, Deserialize)]
struct EventData {
    #[serde(default)]
    object: serde_json::Value,
}

pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    let bad_request = |message: String| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "error": message })),
        )
    };

    let header = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| bad_request(WebhookError::MissingSignature.to_string()))?;

    state
        .billing
        .verify_signature(&body, header)
        .map_err(|err| bad_request(format!("Webhook error: {}", err)))?;

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|err| bad_request(format!("Invalid event payload: {}", err)))?;

    let object_id = event.data.object.get("id").and_then(|v| v.as_str());
    match event.kind.as_str() {
        "checkout.session.completed" => {
            let user = event
                .data
                .object
                .get("client_reference_id")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown");
            log::info!(
                "Payment completed: session {:?}, activating subscription for {}",
                object_id,
                user
            );
        }
        "invoice.payment_succeeded" => {
            log::info!("Recurring payment succeeded: invoice {:?}", object_id);
        }
        "customer.subscription.deleted" => {
            log::info!("Subscription cancelled: {:?}", object_id);
        }
        other => {
            log::debug!("Unhandled webhook event type: {}", other);
        }
    }

    Ok(Json(json!({ "received": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(secret: Option<&str>) -> BillingClient {
        BillingClient::new(
            reqwest::Client::new(),
            BillingConfig::default(),
            None,
            secret.map(String::from),
        )
    }

    fn sign(secret: &str, timestamp: i64, payload: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn accepts_a_valid_signature() {
        let billing = client(Some("whsec_test"));
        let payload = br#"{"type":"checkout.session.completed"}"#;
        let header = format!("t=1000,v1={}", sign("whsec_test", 1000, payload));
        assert_eq!(billing.verify_signature_at(payload, &header, 1000), Ok(()));
    }

    #[test]
    fn rejects_a_tampered_payload() {
        let billing = client(Some("whsec_test"));
        let header = format!("t=1000,v1={}", sign("whsec_test", 1000, b"original"));
        assert_eq!(
            billing.verify_signature_at(b"tampered", &header, 1000),
            Err(WebhookError::Mismatch)
        );
    }

    #[test]
    fn rejects_a_stale_timestamp() {
        let billing = client(Some("whsec_test"));
        let payload = b"{}";
        let header = format!("t=1000,v1={}", sign("whsec_test", 1000, payload));
        assert_eq!(
            billing.verify_signature_at(payload, &header, 1000 + 301),
            Err(WebhookError::StaleTimestamp)
        );
    }

    #[test]
    fn rejects_malformed_headers() {
        let billing = client(Some("whsec_test"));
        assert_eq!(
            billing.verify_signature_at(b"{}", "v1=abcd", 0),
            Err(WebhookError::MalformedSignature)
        );
        assert_eq!(
            billing.verify_signature_at(b"{}", "t=1000", 1000),
            Err(WebhookError::MalformedSignature)
        );
    }

    #[test]
    fn accepts_any_matching_v1_candidate() {
        let billing = client(Some("whsec_test"));
        let payload = b"{}";
        let good = sign("whsec_test", 1000, payload);
        let header = format!("t=1000,v1=deadbeef,v1={}", good);
        assert_eq!(billing.verify_signature_at(payload, &header, 1000), Ok(()));
    }

    #[test]
    fn requires_a_configured_secret() {
        let billing = client(None);
        assert_eq!(
            billing.verify_signature_at(b"{}", "t=1000,v1=00", 1000),
            Err(WebhookError::NotConfigured)
        );
    }

    #[tokio::test]
    async fn checkout_without_key_is_not_configured() {
        let billing = client(None);
        let request = CheckoutRequest {
            price_id: "price_123".into(),
            user_id: "user_1".into(),
            success_url: None,
            cancel_url: None,
        };
        assert!(matches!(
            billing.create_checkout_session(&request).await,
            Err(BillingError::NotConfigured)
        ));
    }
}
