// ==========================================
// 仓储异常检测引擎 - 引擎层
// ==========================================
// 职责: 编排一次分析（时间 → 库位 → 范围 → 规则 → 裁决 → 报告）
// 红线: 同一输入 + 同一配置 + 同一参考时间 → 同一报告（run_id/耗时除外）
// ==========================================

pub mod error;
pub mod orchestrator;
pub mod precedence;

pub use error::{EngineError, EngineResult};
pub use orchestrator::{evaluate_all, CancellationFlag, RuleEngine};
pub use precedence::{PrecedenceResolver, Resolution};
