// ==========================================
// 仓储异常检测引擎 - 配置存储
// ==========================================
// 存储: config_kv 表 (scope_id + key → JSON value)
// 用途: 外围应用持久化规则/范围/模板/参数；引擎本身不访问数据库
// ==========================================

use crate::config::engine_config::{EngineConfig, EngineSettings};
use crate::config::error::{ConfigError, ConfigResult};
use crate::config::source::EngineConfigSource;
use crate::db::{configure_sqlite_connection, open_sqlite_connection};
use crate::domain::location::LocationTemplate;
use crate::domain::rule::RuleDefinition;
use crate::domain::scope::ScopeConfig;
use async_trait::async_trait;
use chrono::Local;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

/// 配置键
pub mod config_keys {
    pub const RULES: &str = "engine.rules";
    pub const SCOPE: &str = "engine.scope";
    pub const TEMPLATE: &str = "engine.template";
    pub const SETTINGS: &str = "engine.settings";
}

/// 默认作用域
pub const GLOBAL_SCOPE: &str = "global";

/// 覆盖默认配置库路径的环境变量
pub const DB_PATH_ENV: &str = "WAREHOUSE_RULE_ENGINE_DB_PATH";

/// 默认配置库路径
///
/// 优先级: 环境变量 > 用户数据目录 > 当前目录
pub fn default_store_path() -> PathBuf {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }

    match dirs::data_dir() {
        Some(data_dir) => {
            let dir = data_dir.join("warehouse-rule-engine");
            // 目录创建失败时由打开连接报错
            let _ = std::fs::create_dir_all(&dir);
            dir.join("config.db")
        }
        None => PathBuf::from("./warehouse_rule_engine.db"),
    }
}

// ==========================================
// ConfigStore
// ==========================================
pub struct ConfigStore {
    conn: Arc<Mutex<Connection>>,
    scope_id: String,
}

impl ConfigStore {
    /// 打开（或创建）配置库
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    /// 内存库（测试 / 一次性运行）
    pub fn in_memory() -> ConfigResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    /// 从已有连接创建（重复应用 PRAGMA，幂等）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| ConfigError::LockPoisoned(e.to_string()))?;
            configure_sqlite_connection(&guard)?;
            ensure_schema(&guard)?;
        }
        Ok(Self {
            conn,
            scope_id: GLOBAL_SCOPE.to_string(),
        })
    }

    /// 切换作用域（如按仓库区分配置）
    pub fn with_scope(mut self, scope_id: impl Into<String>) -> Self {
        self.scope_id = scope_id.into();
        self
    }

    fn lock(&self) -> ConfigResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| ConfigError::LockPoisoned(e.to_string()))
    }

    pub fn get_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.lock()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
                params![self.scope_id, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn set_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = ?4",
            params![self.scope_id, key, value, Local::now().naive_local()],
        )?;
        Ok(())
    }

    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> ConfigResult<Option<T>> {
        match self.get_value(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn set_json<T: Serialize>(&self, key: &str, value: &T) -> ConfigResult<()> {
        let raw = serde_json::to_string(value)?;
        self.set_value(key, &raw)
    }

    /// 整体保存一份运行配置（先校验）
    pub fn save_engine_config(&self, config: &EngineConfig) -> ConfigResult<()> {
        config.validate()?;
        self.set_json(config_keys::RULES, &config.rules)?;
        self.set_json(config_keys::SCOPE, &config.scope)?;
        self.set_json(config_keys::TEMPLATE, &config.template)?;
        self.set_json(config_keys::SETTINGS, &config.settings)?;
        info!(scope_id = %self.scope_id, rules = config.rules.len(), "运行配置已保存");
        Ok(())
    }

    /// 当前作用域全部配置的快照（JSON 对象，键有序）
    pub fn snapshot(&self) -> ConfigResult<String> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key")?;
        let rows = stmt.query_map(params![self.scope_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut entries: BTreeMap<String, String> = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            entries.insert(key, value);
        }
        Ok(serde_json::to_string(&entries)?)
    }

    /// 从快照恢复（覆盖同名键），返回写入条数
    pub fn restore_snapshot(&self, snapshot_json: &str) -> ConfigResult<usize> {
        let entries: BTreeMap<String, String> = serde_json::from_str(snapshot_json)?;
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let now = Local::now().naive_local();

        let mut count = 0;
        for (key, value) in &entries {
            count += tx.execute(
                "INSERT INTO config_kv (scope_id, key, value, updated_at) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = ?4",
                params![self.scope_id, key, value, now],
            )?;
        }
        tx.commit()?;

        debug!(scope_id = %self.scope_id, count, "配置快照已恢复");
        Ok(count)
    }
}

#[async_trait]
impl EngineConfigSource for ConfigStore {
    /// 缺失的键取默认值
    async fn load_engine_config(&self) -> ConfigResult<EngineConfig> {
        let defaults = EngineConfig::default();
        let config = EngineConfig {
            rules: self
                .get_json::<Vec<RuleDefinition>>(config_keys::RULES)?
                .unwrap_or(defaults.rules),
            scope: self
                .get_json::<ScopeConfig>(config_keys::SCOPE)?
                .unwrap_or(defaults.scope),
            template: self
                .get_json::<LocationTemplate>(config_keys::TEMPLATE)?
                .unwrap_or(defaults.template),
            settings: self
                .get_json::<EngineSettings>(config_keys::SETTINGS)?
                .unwrap_or(defaults.settings),
        };
        config.validate()?;
        Ok(config)
    }
}

fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS config_kv (
            scope_id   TEXT NOT NULL,
            key        TEXT NOT NULL,
            value      TEXT NOT NULL,
            updated_at TEXT,
            PRIMARY KEY (scope_id, key)
        );",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_store_yields_defaults() {
        let store = ConfigStore::in_memory().unwrap();
        let config = store.load_engine_config().await.unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[tokio::test]
    async fn test_save_and_load_roundtrip() {
        let store = ConfigStore::in_memory().unwrap();
        let mut config = EngineConfig::default();
        config.scope = ScopeConfig::with_includes(["RECV-*"]);
        config.settings.rule_budget_ms = 123;
        store.save_engine_config(&config).unwrap();

        let loaded = store.load_engine_config().await.unwrap();
        assert_eq!(loaded.settings.rule_budget_ms, 123);
        assert_eq!(loaded.scope.include_patterns.len(), 1);
    }

    #[test]
    fn test_snapshot_and_restore() {
        let store = ConfigStore::in_memory().unwrap();
        store.set_value("a", "1").unwrap();
        store.set_value("b", "2").unwrap();
        let snapshot = store.snapshot().unwrap();

        store.set_value("a", "99").unwrap();
        let restored = store.restore_snapshot(&snapshot).unwrap();
        assert_eq!(restored, 2);
        assert_eq!(store.get_value("a").unwrap(), Some("1".to_string()));
    }

    #[test]
    fn test_scopes_are_isolated() {
        let conn = Arc::new(Mutex::new(Connection::open_in_memory().unwrap()));
        let global = ConfigStore::from_connection(conn.clone()).unwrap();
        let east = ConfigStore::from_connection(conn).unwrap().with_scope("wh-east");

        global.set_value("k", "global").unwrap();
        assert_eq!(east.get_value("k").unwrap(), None);
    }

    #[tokio::test]
    async fn test_invalid_stored_config_is_rejected() {
        let store = ConfigStore::in_memory().unwrap();
        store
            .set_json(config_keys::SETTINGS, &serde_json::json!({"rule_budget_ms": 0}))
            .unwrap();
        assert!(matches!(
            store.load_engine_config().await,
            Err(ConfigError::Invalid(_))
        ));
    }
}
