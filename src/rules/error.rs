// ==========================================
// 仓储异常检测引擎 - 规则层错误类型
// ==========================================
// 单条规则的失败只影响该规则，其余规则照常执行
// ==========================================

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuleError {
    #[error("规则 {rule_id} 条件无效: {reason}")]
    InvalidConditions { rule_id: String, reason: String },

    #[error("规则 {rule_id} 执行失败: {reason}")]
    Evaluation { rule_id: String, reason: String },
}

impl RuleError {
    pub fn invalid(rule_id: &str, reason: impl Into<String>) -> Self {
        RuleError::InvalidConditions {
            rule_id: rule_id.to_string(),
            reason: reason.into(),
        }
    }
}

pub type RuleResult<T> = Result<T, RuleError>;
