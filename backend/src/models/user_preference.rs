use ipnetwork::IpNetwork;
use plexguard_shared::{IpAccessPolicy, NetworkPolicy};
use sqlx::{FromRow, PgPool};

use crate::error::AppError;

#[derive(Debug, Clone, FromRow)]
pub struct UserPreference {
    pub user_id: String,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
    pub hidden: bool,
    pub default_block: Option<bool>,
    pub network_policy: NetworkPolicy,
    pub ip_access_policy: IpAccessPolicy,
    pub allowed_ips: Vec<IpNetwork>,
    pub concurrent_stream_limit: Option<i32>,
}

impl UserPreference {
    /// Every user implicitly has preferences; this returns the stored row
    /// or the all-defaults row that would be created on first write.
    pub async fn find_or_default(pool: &PgPool, user_id: &str) -> Result<Self, AppError> {
        let found = sqlx::query_as!(
            UserPreference,
            r#"
            SELECT
                user_id, username, avatar_url, hidden, default_block,
                network_policy as "network_policy: NetworkPolicy",
                ip_access_policy as "ip_access_policy: IpAccessPolicy",
                allowed_ips as "allowed_ips: Vec<IpNetwork>",
                concurrent_stream_limit
            FROM user_preferences WHERE user_id = $1
            "#,
            user_id
        )
        .fetch_optional(pool)
        .await?;

        Ok(found.unwrap_or_else(|| Self::defaults_for(user_id)))
    }

    /// Every user who has ever been observed or written to. Users only
    /// ever known through live session observation and never yet written
    /// to this table won't appear here until their first `ingest`.
    pub async fn list_all(pool: &PgPool, limit: i64, offset: i64) -> Result<(Vec<Self>, i64), AppError> {
        let rows = sqlx::query_as!(
            UserPreference,
            r#"
            SELECT
                user_id, username, avatar_url, hidden, default_block,
                network_policy as "network_policy: NetworkPolicy",
                ip_access_policy as "ip_access_policy: IpAccessPolicy",
                allowed_ips as "allowed_ips: Vec<IpNetwork>",
                concurrent_stream_limit
            FROM user_preferences
            ORDER BY user_id
            LIMIT $1 OFFSET $2
            "#,
            limit,
            offset
        )
        .fetch_all(pool)
        .await?;

        let total = sqlx::query_scalar!("SELECT COUNT(*) FROM user_preferences").fetch_one(pool).await?.unwrap_or(0);

        Ok((rows, total))
    }

    fn defaults_for(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            username: None,
            avatar_url: None,
            hidden: false,
            default_block: None,
            network_policy: NetworkPolicy::Both,
            ip_access_policy: IpAccessPolicy::All,
            allowed_ips: Vec::new(),
            concurrent_stream_limit: None,
        }
    }

    pub async fn upsert_identity(
        pool: &PgPool,
        user_id: &str,
        username: Option<&str>,
        avatar_url: Option<&str>,
    ) -> Result<(), AppError> {
        sqlx::query!(
            r#"
            INSERT INTO user_preferences (user_id, username, avatar_url)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE SET
                username = EXCLUDED.username,
                avatar_url = EXCLUDED.avatar_url,
                updated_at = NOW()
            "#,
            user_id,
            username,
            avatar_url,
        )
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn update_policy(
        pool: &PgPool,
        user_id: &str,
        default_block: Option<bool>,
        network_policy: Option<NetworkPolicy>,
    ) -> Result<Self, AppError> {
        let current = Self::find_or_default(pool, user_id).await?;
        let default_block = default_block.or(current.default_block);
        let network_policy = network_policy.unwrap_or(current.network_policy);

        sqlx::query!(
            r#"
            INSERT INTO user_preferences (user_id, default_block, network_policy)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE SET
                default_block = EXCLUDED.default_block,
                network_policy = EXCLUDED.network_policy,
                updated_at = NOW()
            "#,
            user_id,
            default_block,
            network_policy as NetworkPolicy,
        )
        .execute(pool)
        .await?;

        Self::find_or_default(pool, user_id).await
    }

    pub async fn update_ip_policy(
        pool: &PgPool,
        user_id: &str,
        ip_access_policy: IpAccessPolicy,
        allowed_ips: &[IpNetwork],
    ) -> Result<Self, AppError> {
        sqlx::query!(
            r#"
            INSERT INTO user_preferences (user_id, ip_access_policy, allowed_ips)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE SET
                ip_access_policy = EXCLUDED.ip_access_policy,
                allowed_ips = EXCLUDED.allowed_ips,
                updated_at = NOW()
            "#,
            user_id,
            ip_access_policy as IpAccessPolicy,
            allowed_ips,
        )
        .execute(pool)
        .await?;

        Self::find_or_default(pool, user_id).await
    }

    pub async fn set_hidden(pool: &PgPool, user_id: &str, hidden: bool) -> Result<Self, AppError> {
        sqlx::query!(
            r#"
            INSERT INTO user_preferences (user_id, hidden)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET hidden = EXCLUDED.hidden, updated_at = NOW()
            "#,
            user_id,
            hidden,
        )
        .execute(pool)
        .await?;

        Self::find_or_default(pool, user_id).await
    }

    pub async fn update_concurrent_limit(
        pool: &PgPool,
        user_id: &str,
        concurrent_stream_limit: Option<i32>,
    ) -> Result<Self, AppError> {
        sqlx::query!(
            r#"
            INSERT INTO user_preferences (user_id, concurrent_stream_limit)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET
                concurrent_stream_limit = EXCLUDED.concurrent_stream_limit,
                updated_at = NOW()
            "#,
            user_id,
            concurrent_stream_limit,
        )
        .execute(pool)
        .await?;

        Self::find_or_default(pool, user_id).await
    }
}
