// ==========================================
// 仓储异常检测引擎 - 领域层
// ==========================================
// 职责: 实体与值对象，不含业务流程
// ==========================================

pub mod anomaly;
pub mod date_profile;
pub mod location;
pub mod record;
pub mod report;
pub mod rule;
pub mod scope;
pub mod types;

// 重导出核心类型
pub use anomaly::{Anomaly, AnomalySubject};
pub use date_profile::{DateFormatProfile, DateFormatType, DateQualityReport, ParsingStrategy};
pub use location::{
    LocationDescriptor, LocationTemplate, RejectionReason, SpecialArea, StorageAddress,
};
pub use record::InventoryRecord;
pub use report::{
    Report, ReportSummary, RulePerformance, RuleRunStatus, RunWarning, StageTiming, WarningKind,
};
pub use rule::{
    IntegrityConditions, InvalidLocationConditions, LotStragglerConditions,
    OvercapacityConditions, RuleDefinition, RuleKind, TimeInAreaConditions,
};
pub use scope::{IncludePattern, ScopeConfig, ScopeHint, ScopeMetrics};
pub use types::{
    AnomalyCategory, AnomalyPriority, LocationType, PrecedenceClass, UnitType,
};
