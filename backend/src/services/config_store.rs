use std::collections::HashMap;
use std::sync::Arc;

use plexguard_shared::SettingKind;
use tokio::sync::RwLock;
use tracing::warn;

use crate::error::AppError;
use crate::repositories::SettingRepository;

#[derive(Debug, Clone)]
struct CachedSetting {
    value: serde_json::Value,
    kind: SettingKind,
}

/// Read-through cache over the `settings` table (spec §4.7). Typed getters
/// fall back to the caller-supplied default when the key is absent or its
/// stored kind doesn't match - a missing required setting is a `Config`
/// disposition (spec §7), not a fatal one, so callers always get a usable
/// value back.
pub struct ConfigStore {
    repository: SettingRepository,
    cache: RwLock<HashMap<String, CachedSetting>>,
}

impl ConfigStore {
    pub fn new(repository: SettingRepository) -> Self {
        Self { repository, cache: RwLock::new(HashMap::new()) }
    }

    async fn read_through(&self, key: &str) -> Result<Option<CachedSetting>, AppError> {
        if let Some(cached) = self.cache.read().await.get(key) {
            return Ok(Some(cached.clone()));
        }

        let Some(setting) = self.repository.find(key).await? else {
            return Ok(None);
        };

        let cached = CachedSetting { value: setting.value, kind: setting.kind };
        self.cache.write().await.insert(key.to_string(), cached.clone());
        Ok(Some(cached))
    }

    pub async fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.read_through(key).await {
            Ok(Some(cached)) if cached.kind == SettingKind::Bool => cached.value.as_bool().unwrap_or(default),
            Ok(Some(_)) => {
                warn!(key, "setting has a non-bool kind, using default");
                default
            }
            Ok(None) => default,
            Err(error) => {
                warn!(key, %error, "failed to read setting, using default");
                default
            }
        }
    }

    pub async fn get_int(&self, key: &str, default: i64) -> i64 {
        match self.read_through(key).await {
            Ok(Some(cached)) if cached.kind == SettingKind::Int => cached.value.as_i64().unwrap_or(default),
            Ok(Some(_)) => {
                warn!(key, "setting has a non-int kind, using default");
                default
            }
            Ok(None) => default,
            Err(error) => {
                warn!(key, %error, "failed to read setting, using default");
                default
            }
        }
    }

    pub async fn get_string(&self, key: &str, default: &str) -> String {
        match self.read_through(key).await {
            Ok(Some(cached)) if cached.kind == SettingKind::String => {
                cached.value.as_str().map(str::to_string).unwrap_or_else(|| default.to_string())
            }
            Ok(Some(_)) => {
                warn!(key, "setting has a non-string kind, using default");
                default.to_string()
            }
            Ok(None) => default.to_string(),
            Err(error) => {
                warn!(key, %error, "failed to read setting, using default");
                default.to_string()
            }
        }
    }

    pub async fn get_json(&self, key: &str) -> Option<serde_json::Value> {
        self.read_through(key).await.ok().flatten().map(|cached| cached.value)
    }

    pub async fn set(&self, key: &str, value: serde_json::Value, kind: SettingKind, private: bool) -> Result<(), AppError> {
        self.repository.upsert(key, &value, kind, private).await?;
        self.cache.write().await.remove(key);
        Ok(())
    }
}
