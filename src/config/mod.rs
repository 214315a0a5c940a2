// ==========================================
// 仓储异常检测引擎 - 配置层
// ==========================================
// 职责: 单次运行配置 / 默认规则目录 / 配置来源 / 持久化存储
// 存储: config_kv 表
// ==========================================

pub mod config_store;
pub mod defaults;
pub mod engine_config;
pub mod error;
pub mod source;

pub use config_store::{config_keys, default_store_path, ConfigStore};
pub use defaults::default_rules;
pub use engine_config::{EngineConfig, EngineSettings};
pub use error::{ConfigError, ConfigResult};
pub use source::EngineConfigSource;
