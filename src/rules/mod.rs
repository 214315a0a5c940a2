// ==========================================
// 仓储异常检测引擎 - 规则评估器
// ==========================================
// 统一契约: evaluate(规则, 上下文) -> 候选异常
// 各评估器纯函数、互不依赖；按规则种类穷举分派
// ==========================================

pub mod context;
pub mod error;
pub mod integrity;
pub mod invalid_location;
pub mod lot_straggler;
pub mod overcapacity;
pub mod time_in_area;

pub use context::{EvaluationContext, EvaluationOutput};
pub use error::{RuleError, RuleResult};

use crate::domain::rule::{RuleDefinition, RuleKind};

/// 评估单条规则
pub fn evaluate(rule: &RuleDefinition, ctx: &EvaluationContext) -> RuleResult<EvaluationOutput> {
    match &rule.kind {
        RuleKind::TimeInArea(conditions) => time_in_area::evaluate(rule, conditions, ctx),
        RuleKind::LotStraggler(conditions) => lot_straggler::evaluate(rule, conditions, ctx),
        RuleKind::Overcapacity(conditions) => overcapacity::evaluate(rule, conditions, ctx),
        RuleKind::InvalidLocation(conditions) => invalid_location::evaluate(rule, conditions, ctx),
        RuleKind::Integrity(conditions) => integrity::evaluate(rule, conditions, ctx),
    }
}

/// 规则条件的静态校验（运行前）
pub fn validate_conditions(rule: &RuleDefinition) -> RuleResult<()> {
    match &rule.kind {
        RuleKind::TimeInArea(c) => time_in_area::validate(&rule.id, c),
        RuleKind::LotStraggler(c) => lot_straggler::validate(&rule.id, c),
        RuleKind::Overcapacity(_) | RuleKind::InvalidLocation(_) => Ok(()),
        RuleKind::Integrity(c) => integrity::validate(&rule.id, c),
    }
}
