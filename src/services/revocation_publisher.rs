use async_trait::async_trait;
use chrono::Utc;
use ring::digest;
use sqlx::PgPool;

use crate::models::{
    revoked_token::{CreateRevokedTokenData, RevokedToken},
    token_revocation::{expiry_millis, RevocationProperties},
};
use crate::services::gateway_notifier::{GatewayError, GatewayNotifier, RevocationNotice};

#[derive(thiserror::Error, Debug)]
pub enum PublishError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Gateway notification failed: {0}")]
    Gateway(#[from] GatewayError),
}

/// Disseminates revoked tokens to the components that enforce them
#[async_trait]
pub trait RevocationPublisher: Send + Sync {
    async fn publish_revocation_events(
        &self,
        access_token: &str,
        expiry_time: &str,
        properties: &RevocationProperties,
    ) -> Result<(), PublishError>;
}

/// Records revoked tokens and pushes them to the gateways
pub struct RevocationRequestPublisher {
    pool: Option<PgPool>,
    notifier: GatewayNotifier,
}

impl RevocationRequestPublisher {
    /// `pool` is optional; without a database revocations are only forwarded.
    pub fn new(pool: Option<PgPool>, notifier: GatewayNotifier) -> Self {
        Self { pool, notifier }
    }
}

#[async_trait]
impl RevocationPublisher for RevocationRequestPublisher {
    #[tracing::instrument(skip(self, access_token), fields(event_id = %properties.event_id, token_type = %properties.token_type))]
    async fn publish_revocation_events(
        &self,
        access_token: &str,
        expiry_time: &str,
        properties: &RevocationProperties,
    ) -> Result<(), PublishError> {
        let revoked_token = revocation_key(access_token, properties).to_string();

        if let Some(pool) = &self.pool {
            let record = RevokedToken::insert(
                pool,
                CreateRevokedTokenData {
                    token_hash: token_hash(&revoked_token),
                    token_type: properties.token_type.clone(),
                    consumer_key: properties.consumer_key.clone(),
                    tenant_id: properties.tenant_id.clone(),
                    tenant_domain: properties.tenant_domain.clone(),
                    event_id: properties.event_id.clone(),
                    expiry_time: expiry_millis(expiry_time),
                },
            )
            .await?;

            tracing::debug!(revoked_token_id = %record.id, "Revoked token recorded");
        }

        let notice = RevocationNotice {
            revoked_token,
            token_type: properties.token_type.clone(),
            expiry_time: expiry_time.to_string(),
            event_id: properties.event_id.clone(),
            consumer_key: properties.consumer_key.clone(),
            tenant_id: properties.tenant_id.clone(),
            tenant_domain: properties.tenant_domain.clone(),
            revoked_at: Utc::now(),
        };

        self.notifier.notify(&notice).await?;

        tracing::info!(
            consumer_key = %properties.consumer_key,
            tenant_domain = %properties.tenant_domain,
            "Token revocation published"
        );

        Ok(())
    }
}

/// Gateways key revoked JWTs by their signature segment; any other token is
/// revoked as a whole.
pub fn revocation_key<'a>(access_token: &'a str, properties: &RevocationProperties) -> &'a str {
    if properties.is_jwt() {
        let segments: Vec<&str> = access_token.split('.').collect();
        if let [_, _, signature] = segments[..] {
            if !signature.is_empty() {
                return signature;
            }
        }
    }
    access_token
}

/// Hex SHA-256 used as the storage key so raw tokens never reach the database
pub fn token_hash(revoked_token: &str) -> String {
    hex::encode(digest::digest(&digest::SHA256, revoked_token.as_bytes()).as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn properties(token_type: &str) -> RevocationProperties {
        RevocationProperties {
            event_id: "e1".to_string(),
            consumer_key: "ck1".to_string(),
            token_type: token_type.to_string(),
            tenant_id: "1".to_string(),
            tenant_domain: "carbon.super".to_string(),
        }
    }

    #[test]
    fn test_revocation_key_uses_jwt_signature() {
        assert_eq!(revocation_key("aaa.bbb.ccc", &properties("JWT")), "ccc");
        assert_eq!(revocation_key("aaa.bbb.ccc", &properties("jwt")), "ccc");
    }

    #[test]
    fn test_revocation_key_keeps_opaque_and_malformed_tokens() {
        assert_eq!(revocation_key("aaa.bbb.ccc", &properties("Default")), "aaa.bbb.ccc");
        assert_eq!(revocation_key("tok123", &properties("JWT")), "tok123");
        assert_eq!(revocation_key("aaa.bbb.", &properties("JWT")), "aaa.bbb.");
    }

    #[test]
    fn test_token_hash_is_stable_hex() {
        let hash = token_hash("tok123");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, token_hash("tok123"));
        assert_ne!(hash, token_hash("tok124"));
    }

    #[tokio::test]
    async fn test_publish_without_database_notifies_gateways() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/internal/revocations"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let notifier =
            GatewayNotifier::new(&[server.uri()], "secret", Duration::from_secs(2)).unwrap();
        let publisher = RevocationRequestPublisher::new(None, notifier);

        publisher
            .publish_revocation_events("aaa.bbb.ccc", "1700000000", &properties("JWT"))
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        let notice: RevocationNotice = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(notice.revoked_token, "ccc");
        assert_eq!(notice.expiry_time, "1700000000");
        assert_eq!(notice.consumer_key, "ck1");
    }

    #[tokio::test]
    async fn test_publish_surfaces_gateway_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let notifier =
            GatewayNotifier::new(&[server.uri()], "secret", Duration::from_secs(2)).unwrap();
        let publisher = RevocationRequestPublisher::new(None, notifier);

        let result = publisher
            .publish_revocation_events("tok123", "1700000000", &properties("Default"))
            .await;

        assert!(matches!(result, Err(PublishError::Gateway(_))));
    }
}
