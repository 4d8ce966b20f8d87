//! Session storage with Redis.
//!
//! Sessions are server-side: the client holds an opaque cookie token, the
//! token maps to a user id in Redis. Every authenticated request refreshes
//! the TTL, giving a one-hour sliding expiration.

use fred::clients::Client as RedisClient;
use fred::interfaces::KeysInterface;
use fred::types::Expiration;
use std::sync::Arc;
use tracing::debug;

use crate::{AppError, AppResult, TokenGenerator};

/// Session lifetime: one hour, sliding.
pub const SESSION_TTL: i64 = 60 * 60;

/// Redis-backed session store.
#[derive(Clone)]
pub struct SessionStore {
    redis: Arc<RedisClient>,
    prefix: String,
    token_gen: TokenGenerator,
}

impl SessionStore {
    /// Create a new session store.
    #[must_use]
    pub const fn new(redis: Arc<RedisClient>, prefix: String) -> Self {
        Self {
            redis,
            prefix,
            token_gen: TokenGenerator::new(),
        }
    }

    fn session_key(&self, token: &str) -> String {
        format!("{}:session:{token}", self.prefix)
    }

    /// Create a session for a user and return the opaque token.
    pub async fn create(&self, user_id: i64) -> AppResult<String> {
        let token = self.token_gen.generate();
        let key = self.session_key(&token);

        self.redis
            .set::<(), _, _>(
                key,
                user_id.to_string(),
                Some(Expiration::EX(SESSION_TTL)),
                None,
                false,
            )
            .await
            .map_err(|e| AppError::Redis(e.to_string()))?;

        debug!(user_id, "Session created");
        Ok(token)
    }

    /// Resolve a token to a user id, refreshing the sliding TTL on hit.
    pub async fn resolve(&self, token: &str) -> AppResult<Option<i64>> {
        let key = self.session_key(token);

        let value: Option<String> = self
            .redis
            .get(key.clone())
            .await
            .map_err(|e| AppError::Redis(e.to_string()))?;

        let Some(raw) = value else {
            return Ok(None);
        };

        let user_id: i64 = raw
            .parse()
            .map_err(|_| AppError::Redis(format!("Corrupt session value for {key}")))?;

        // Sliding expiration: rewrite the entry with a fresh TTL
        self.redis
            .set::<(), _, _>(key, raw, Some(Expiration::EX(SESSION_TTL)), None, false)
            .await
            .map_err(|e| AppError::Redis(e.to_string()))?;

        Ok(Some(user_id))
    }

    /// Destroy a session.
    pub async fn destroy(&self, token: &str) -> AppResult<()> {
        self.redis
            .del::<(), _>(self.session_key(token))
            .await
            .map_err(|e| AppError::Redis(e.to_string()))?;
        Ok(())
    }
}
