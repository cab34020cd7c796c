//! Redis-backed `DialogStore`.
//!
//! One key per chat, value is the JSON-serialized `DialogState`. No TTL: a
//! dialog survives until it finishes, is cancelled, or the bot restarts and
//! wipes all of them.

use async_trait::async_trait;
use deadpool_redis::{Config, Pool, Runtime};
use redis::AsyncCommands;
use tracing::info;

use etb_core::dialog::DialogState;
use etb_core::domain::ChatId;
use etb_core::ports::DialogStore;
use etb_core::{Error, Result};

const KEY_PREFIX: &str = "fsm:";

fn key(chat_id: ChatId) -> String {
    format!("{KEY_PREFIX}{}", chat_id.0)
}

fn map_pool(err: deadpool_redis::PoolError) -> Error {
    Error::Storage(err.to_string())
}

fn map_redis(err: redis::RedisError) -> Error {
    Error::Storage(err.to_string())
}

pub struct RedisDialogStore {
    pool: Pool,
}

impl RedisDialogStore {
    pub fn connect(redis_url: &str) -> Result<Self> {
        let cfg = Config::from_url(redis_url);
        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| Error::Storage(e.to_string()))?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl DialogStore for RedisDialogStore {
    /// Missing or unreadable state loads as the default (main menu). An
    /// unreadable value can only mean a state layout change between releases,
    /// and restarting the dialog is the right response to that.
    async fn load(&self, chat_id: ChatId) -> Result<DialogState> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;
        let raw: Option<String> = conn.get(key(chat_id)).await.map_err(map_redis)?;
        Ok(raw
            .and_then(|json| serde_json::from_str(&json).ok())
            .unwrap_or_default())
    }

    async fn save(&self, chat_id: ChatId, state: &DialogState) -> Result<()> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;
        let json = serde_json::to_string(state)?;
        let _: () = conn.set(key(chat_id), json).await.map_err(map_redis)?;
        Ok(())
    }

    async fn clear(&self, chat_id: ChatId) -> Result<()> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;
        let _: () = conn.del(key(chat_id)).await.map_err(map_redis)?;
        Ok(())
    }

    /// Drop every stored dialog. Run at startup so a redeploy never leaves
    /// chats stuck in a state the new code no longer knows.
    async fn clear_all(&self) -> Result<()> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;
        let keys: Vec<String> = {
            let mut iter = conn
                .scan_match::<_, String>(format!("{KEY_PREFIX}*"))
                .await
                .map_err(map_redis)?;
            let mut keys = Vec::new();
            while let Some(k) = iter.next_item().await {
                keys.push(k);
            }
            keys
        };
        if !keys.is_empty() {
            info!(count = keys.len(), "clearing stored dialog states");
            let _: () = conn.del(keys).await.map_err(map_redis)?;
        }
        Ok(())
    }
}
