// ==========================================
// 仓储异常检测引擎 - 配置层错误类型
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件读取失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("配置 JSON 格式错误: {0}")]
    Json(#[from] serde_json::Error),

    #[error("配置存储访问失败: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("配置无效: {0}")]
    Invalid(String),

    #[error("锁获取失败: {0}")]
    LockPoisoned(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
