// ==========================================
// 仓储异常检测引擎 - 分析报告
// ==========================================
// 对外暴露: 有序异常列表 / 范围统计 / 规则耗时 / 时间画像 / 告警
// ==========================================

use crate::domain::anomaly::Anomaly;
use crate::domain::date_profile::{DateFormatProfile, DateQualityReport};
use crate::domain::scope::ScopeMetrics;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

// ==========================================
// 运行告警
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningKind {
    ParseFailure,          // 时间无法解析
    DateQuality,           // 时间质量问题
    ScopeMisconfiguration, // 范围配置缺失
    LowCoverage,           // 范围覆盖率过低
    UnparsedSkipped,       // 规则跳过未解析时间的记录
    RuleEvaluationFailure, // 规则执行失败
    RuleTimeout,           // 规则超时
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WarningKind::ParseFailure => "PARSE_FAILURE",
            WarningKind::DateQuality => "DATE_QUALITY",
            WarningKind::ScopeMisconfiguration => "SCOPE_MISCONFIGURATION",
            WarningKind::LowCoverage => "LOW_COVERAGE",
            WarningKind::UnparsedSkipped => "UNPARSED_SKIPPED",
            WarningKind::RuleEvaluationFailure => "RULE_EVALUATION_FAILURE",
            WarningKind::RuleTimeout => "RULE_TIMEOUT",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunWarning {
    pub kind: WarningKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,

    pub message: String,
}

impl RunWarning {
    pub fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            rule_id: None,
            message: message.into(),
        }
    }

    pub fn for_rule(kind: WarningKind, rule_id: &str, message: impl Into<String>) -> Self {
        Self {
            kind,
            rule_id: Some(rule_id.to_string()),
            message: message.into(),
        }
    }
}

// ==========================================
// 规则执行统计
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleRunStatus {
    Completed,
    Failed(String),
    TimedOut(String),
    Skipped(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RulePerformance {
    pub rule_id: String,
    pub rule_kind: String,
    pub status: RuleRunStatus,
    pub elapsed_ms: u64,

    /// 评估器产出
    pub candidate_count: usize,

    /// 裁决后保留
    pub accepted_count: usize,

    /// 被更高优先级发现覆盖
    pub suppressed_count: usize,

    /// 因时间未解析而跳过的记录
    pub skipped_records: usize,
}

// ==========================================
// 阶段耗时
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageTiming {
    pub stage: String,
    pub elapsed_ms: u64,
}

// ==========================================
// 报告汇总
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_records: usize,
    pub analyzed_records: usize,
    pub total_anomalies: usize,
    pub by_priority: BTreeMap<String, usize>,
    pub by_category: BTreeMap<String, usize>,
    pub suppressed_candidates: usize,
}

// ==========================================
// Report - 单次分析结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub run_id: Uuid,
    pub generated_at: NaiveDateTime,
    pub reference_time: NaiveDateTime,

    /// 描述与告警使用的语言
    pub locale: String,

    /// 按优先级降序、裁决等级升序排列
    pub anomalies: Vec<Anomaly>,

    pub per_rule_performance: Vec<RulePerformance>,
    pub scope_metrics: ScopeMetrics,
    pub date_profile: DateFormatProfile,
    pub date_quality: DateQualityReport,
    pub warnings: Vec<RunWarning>,
    pub stage_timings: Vec<StageTiming>,
    pub summary: ReportSummary,
}

impl Report {
    /// 某规则保留下来的异常
    pub fn anomalies_for_rule<'a>(&'a self, rule_id: &'a str) -> impl Iterator<Item = &'a Anomaly> + 'a {
        self.anomalies.iter().filter(move |a| a.rule_id == rule_id)
    }

    pub fn has_warning(&self, kind: WarningKind) -> bool {
        self.warnings.iter().any(|w| w.kind == kind)
    }

    pub fn performance_for(&self, rule_id: &str) -> Option<&RulePerformance> {
        self.per_rule_performance.iter().find(|p| p.rule_id == rule_id)
    }
}
