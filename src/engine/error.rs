// ==========================================
// 仓储异常检测引擎 - 引擎层错误类型
// ==========================================
// 仅结构性无效输入为致命错误，在评估前中止
// 其余情况（解析失败/范围缺失/单规则失败）降级为运行告警
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("记录集为空，无法分析")]
    EmptyRecordSet,

    #[error("缺少必填列: {0:?}")]
    MissingRequiredColumns(Vec<String>),

    #[error("配置无效: {0}")]
    InvalidConfiguration(String),

    #[error("分析已取消（阶段: {stage}）")]
    Cancelled { stage: String },

    #[error("引擎内部错误: {0}")]
    Internal(String),
}

impl From<regex::Error> for EngineError {
    fn from(err: regex::Error) -> Self {
        EngineError::InvalidConfiguration(format!("模式编译失败: {}", err))
    }
}

impl From<crate::config::ConfigError> for EngineError {
    fn from(err: crate::config::ConfigError) -> Self {
        EngineError::InvalidConfiguration(err.to_string())
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
