use chrono::{DateTime, Utc};
use reqwest::Client;
use ring::hmac;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

pub const SIGNATURE_HEADER: &str = "X-Revocation-Signature";
const REVOCATION_PATH: &str = "internal/revocations";

#[derive(thiserror::Error, Debug)]
pub enum GatewayError {
    #[error("HTTP request to {gateway} failed: {source}")]
    Http {
        gateway: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Gateway {gateway} rejected revocation: HTTP {status}: {body}")]
    Rejected {
        gateway: String,
        status: u16,
        body: String,
    },

    #[error("Invalid gateway URL {0}")]
    InvalidUrl(String),

    #[error("Failed to serialize revocation notice: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Revocation notice pushed to every gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevocationNotice {
    pub revoked_token: String,
    pub token_type: String,
    pub expiry_time: String,
    pub event_id: String,
    pub consumer_key: String,
    pub tenant_id: String,
    pub tenant_domain: String,
    pub revoked_at: DateTime<Utc>,
}

/// Pushes revocation notices to the configured gateways
#[derive(Clone)]
pub struct GatewayNotifier {
    client: Client,
    gateways: Vec<Url>,
    signing_key: hmac::Key,
}

impl GatewayNotifier {
    pub fn new(
        gateway_urls: &[String],
        secret: &str,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let gateways = gateway_urls
            .iter()
            .map(|raw| revocation_endpoint(raw))
            .collect::<Result<Vec<_>, _>>()?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| GatewayError::Http {
                gateway: "<client>".to_string(),
                source,
            })?;

        Ok(Self {
            client,
            gateways,
            signing_key: hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes()),
        })
    }

    pub fn gateway_count(&self) -> usize {
        self.gateways.len()
    }

    /// Sends the notice to every gateway.
    ///
    /// A failing gateway does not stop delivery to the others; the first
    /// failure is returned once all gateways have been tried.
    #[tracing::instrument(skip(self, notice), fields(event_id = %notice.event_id, gateways = self.gateways.len()))]
    pub async fn notify(&self, notice: &RevocationNotice) -> Result<(), GatewayError> {
        let body = serde_json::to_vec(notice)?;
        let signature = hex::encode(hmac::sign(&self.signing_key, &body).as_ref());

        let mut first_error = None;

        for gateway in &self.gateways {
            match self.send(gateway, &body, &signature).await {
                Ok(()) => {
                    tracing::debug!(gateway = %gateway, "Revocation delivered to gateway");
                }
                Err(e) => {
                    tracing::error!(gateway = %gateway, error = %e, "Revocation delivery failed");
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn send(&self, gateway: &Url, body: &[u8], signature: &str) -> Result<(), GatewayError> {
        let response = self
            .client
            .post(gateway.clone())
            .header("Content-Type", "application/json")
            .header(SIGNATURE_HEADER, signature)
            .body(body.to_vec())
            .send()
            .await
            .map_err(|source| GatewayError::Http {
                gateway: gateway.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GatewayError::Rejected {
                gateway: gateway.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

fn revocation_endpoint(raw: &str) -> Result<Url, GatewayError> {
    let base = format!("{}/", raw.trim().trim_end_matches('/'));
    Url::parse(&base)
        .and_then(|url| url.join(REVOCATION_PATH))
        .map_err(|_| GatewayError::InvalidUrl(raw.to_string()))
}

/// Hex HMAC-SHA256 of `body`, as sent in the signature header
pub fn sign(body: &[u8], secret: &str) -> String {
    let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
    hex::encode(hmac::sign(&key, body).as_ref())
}

/// Constant-time check of a signature produced by [`sign`]
pub fn verify(body: &[u8], signature: &str, secret: &str) -> bool {
    let Ok(tag) = hex::decode(signature) else {
        return false;
    };
    let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
    hmac::verify(&key, body, &tag).is_ok()
}
