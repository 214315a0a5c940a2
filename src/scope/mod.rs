// ==========================================
// 仓储异常检测引擎 - 分析范围
// ==========================================

pub mod filter;

pub use filter::{ScopeDecision, ScopeFilter, ScopeOutcome};
