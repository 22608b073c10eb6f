use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RevokedToken {
    pub id: Uuid,
    pub token_hash: String, // hex SHA-256 of the revocation key, never the raw token
    pub token_type: String,
    pub consumer_key: String,
    pub tenant_id: String,
    pub tenant_domain: String,
    pub event_id: String,
    pub expiry_time: Option<i64>, // epoch millis
    pub revoked_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateRevokedTokenData {
    pub token_hash: String,
    pub token_type: String,
    pub consumer_key: String,
    pub tenant_id: String,
    pub tenant_domain: String,
    pub event_id: String,
    pub expiry_time: Option<i64>,
}

impl RevokedToken {
    /// Records a revoked token. Revoking the same token twice keeps the first record.
    pub async fn insert(pool: &PgPool, data: CreateRevokedTokenData) -> Result<Self, sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO revoked_tokens (token_hash, token_type, consumer_key, tenant_id, tenant_domain, event_id, expiry_time)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (token_hash) DO NOTHING
            "#,
        )
        .bind(&data.token_hash)
        .bind(&data.token_type)
        .bind(&data.consumer_key)
        .bind(&data.tenant_id)
        .bind(&data.tenant_domain)
        .bind(&data.event_id)
        .bind(data.expiry_time)
        .execute(pool)
        .await?;

        Self::find_by_hash(pool, &data.token_hash)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn find_by_hash(pool: &PgPool, token_hash: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, RevokedToken>(
            r#"
            SELECT * FROM revoked_tokens WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(pool)
        .await
    }

    pub async fn is_revoked(pool: &PgPool, token_hash: &str) -> Result<bool, sqlx::Error> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(SELECT 1 FROM revoked_tokens WHERE token_hash = $1)
            "#,
        )
        .bind(token_hash)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    /// Deletes records of tokens that have expired naturally. Rows without an
    /// expiry time are kept.
    pub async fn purge_expired(pool: &PgPool, now_millis: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM revoked_tokens
            WHERE expiry_time IS NOT NULL AND expiry_time < $1
            "#,
        )
        .bind(now_millis)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_pool() -> PgPool {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        crate::db::connect(&url).await.unwrap()
    }

    fn sample(token_hash: &str, expiry_time: Option<i64>) -> CreateRevokedTokenData {
        CreateRevokedTokenData {
            token_hash: token_hash.to_string(),
            token_type: "JWT".to_string(),
            consumer_key: "ck1".to_string(),
            tenant_id: "1".to_string(),
            tenant_domain: "carbon.super".to_string(),
            event_id: Uuid::new_v4().to_string(),
            expiry_time,
        }
    }

    #[tokio::test]
    #[ignore] // Requires a PostgreSQL database
    async fn test_insert_is_idempotent() {
        let pool = test_pool().await;
        let hash = format!("test-{}", Uuid::new_v4());

        let first = RevokedToken::insert(&pool, sample(&hash, Some(1))).await.unwrap();
        let second = RevokedToken::insert(&pool, sample(&hash, Some(2))).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.expiry_time, Some(1));
        assert!(RevokedToken::is_revoked(&pool, &hash).await.unwrap());
    }

    #[tokio::test]
    #[ignore] // Requires a PostgreSQL database
    async fn test_purge_expired_keeps_open_ended_rows() {
        let pool = test_pool().await;
        let expired = format!("test-{}", Uuid::new_v4());
        let open_ended = format!("test-{}", Uuid::new_v4());

        RevokedToken::insert(&pool, sample(&expired, Some(10))).await.unwrap();
        RevokedToken::insert(&pool, sample(&open_ended, None)).await.unwrap();

        let removed = RevokedToken::purge_expired(&pool, 20).await.unwrap();

        assert!(removed >= 1);
        assert!(!RevokedToken::is_revoked(&pool, &expired).await.unwrap());
        assert!(RevokedToken::is_revoked(&pool, &open_ended).await.unwrap());
    }
}
