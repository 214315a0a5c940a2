// ==========================================
// 仓储异常检测引擎 - 范围过滤
// ==========================================
// 排除模式优先（首个命中即排除）→ 包含模式按声明顺序（首个命中生效并提供提示）
// 无任何包含模式: 全部纳入（fail-open）并告警，不静默丢弃未配置数据
// ==========================================

use crate::domain::record::InventoryRecord;
use crate::domain::report::{RunWarning, WarningKind};
use crate::domain::scope::{IncludePattern, ScopeConfig, ScopeHint, ScopeMetrics};
use crate::i18n::{t_with_args, DEFAULT_LOCALE};
use crate::pattern::WildcardPattern;
use std::collections::HashMap;
use tracing::{debug, warn};

/// 覆盖率低于此值时告警
pub const LOW_COVERAGE_THRESHOLD: f64 = 0.5;

// ==========================================
// ScopeDecision - 单个库位代码的判定
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub enum ScopeDecision {
    /// 命中排除模式
    Excluded { pattern: String },
    /// 命中包含模式
    Included { pattern: String, hint: ScopeHint },
    /// 存在包含模式但均未命中
    Unmatched,
    /// 未配置包含模式
    FailOpen,
}

impl ScopeDecision {
    pub fn is_in_scope(&self) -> bool {
        matches!(self, ScopeDecision::Included { .. } | ScopeDecision::FailOpen)
    }
}

// ==========================================
// ScopeOutcome - 过滤结果
// ==========================================
#[derive(Debug, Clone)]
pub struct ScopeOutcome {
    pub in_scope: Vec<InventoryRecord>,
    pub metrics: ScopeMetrics,

    /// 原始库位代码 → 包含模式提示（仅带提示的模式）
    pub hints: HashMap<String, ScopeHint>,

    pub warnings: Vec<RunWarning>,
}

// ==========================================
// ScopeFilter
// ==========================================
pub struct ScopeFilter {
    includes: Vec<(IncludePattern, WildcardPattern)>,
    excludes: Vec<WildcardPattern>,

    /// 告警消息语言
    locale: &'static str,
}

impl ScopeFilter {
    pub fn new(config: &ScopeConfig) -> Result<Self, regex::Error> {
        let includes = config
            .include_patterns
            .iter()
            .map(|p| Ok((p.clone(), WildcardPattern::compile(p.pattern())?)))
            .collect::<Result<Vec<_>, regex::Error>>()?;
        let excludes = config
            .exclude_patterns
            .iter()
            .map(|p| WildcardPattern::compile(p))
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self {
            includes,
            excludes,
            locale: DEFAULT_LOCALE,
        })
    }

    pub fn with_locale(mut self, locale: &'static str) -> Self {
        self.locale = locale;
        self
    }

    pub fn has_includes(&self) -> bool {
        !self.includes.is_empty()
    }

    /// 判定单个库位代码
    pub fn decide(&self, code: &str) -> ScopeDecision {
        if let Some(p) = self.excludes.iter().find(|p| p.is_match(code)) {
            return ScopeDecision::Excluded {
                pattern: p.as_str().to_string(),
            };
        }
        if self.includes.is_empty() {
            return ScopeDecision::FailOpen;
        }
        match self.includes.iter().find(|(_, p)| p.is_match(code)) {
            Some((include, compiled)) => ScopeDecision::Included {
                pattern: compiled.as_str().to_string(),
                hint: ScopeHint {
                    unit_type: include.unit_type(),
                    capacity: include.capacity(),
                },
            },
            None => ScopeDecision::Unmatched,
        }
    }

    /// 过滤记录（每个不同代码只判定一次）
    pub fn filter(&self, records: &[InventoryRecord]) -> ScopeOutcome {
        let mut decisions: HashMap<&str, ScopeDecision> = HashMap::new();
        let mut in_scope = Vec::with_capacity(records.len());
        let mut excluded_count = 0usize;
        let mut unmatched_count = 0usize;

        for record in records {
            let decision = decisions
                .entry(record.location_code.as_str())
                .or_insert_with(|| self.decide(&record.location_code));
            match decision {
                ScopeDecision::Excluded { .. } => excluded_count += 1,
                ScopeDecision::Unmatched => unmatched_count += 1,
                ScopeDecision::Included { .. } | ScopeDecision::FailOpen => {
                    in_scope.push(record.clone())
                }
            }
        }

        let hints: HashMap<String, ScopeHint> = decisions
            .iter()
            .filter_map(|(code, decision)| match decision {
                ScopeDecision::Included { hint, .. }
                    if hint.unit_type.is_some() || hint.capacity.is_some() =>
                {
                    Some((code.to_string(), *hint))
                }
                _ => None,
            })
            .collect();

        let total = records.len();
        let in_scope_count = in_scope.len();
        let coverage_ratio = if total == 0 {
            0.0
        } else {
            in_scope_count as f64 / total as f64
        };
        let fail_open = self.includes.is_empty();

        let metrics = ScopeMetrics {
            total,
            in_scope_count,
            out_of_scope_count: total - in_scope_count,
            coverage_ratio,
            excluded_count,
            unmatched_count,
            fail_open,
        };

        let mut warnings = Vec::new();
        if fail_open {
            warn!(total, "未配置包含模式，全部记录纳入分析");
            warnings.push(RunWarning::new(
                WarningKind::ScopeMisconfiguration,
                t_with_args(
                    self.locale,
                    "scope.no_include_patterns",
                    &[("total", &total.to_string())],
                ),
            ));
        }
        if total > 0 && coverage_ratio < LOW_COVERAGE_THRESHOLD {
            let pct = format!("{:.1}", coverage_ratio * 100.0);
            warn!(coverage_ratio, "范围覆盖率过低");
            warnings.push(RunWarning::new(
                WarningKind::LowCoverage,
                t_with_args(
                    self.locale,
                    "scope.low_coverage",
                    &[
                        ("coverage", pct.as_str()),
                        ("in_scope", &in_scope_count.to_string()),
                        ("total", &total.to_string()),
                    ],
                ),
            ));
        }

        debug!(
            total,
            in_scope_count,
            excluded_count,
            unmatched_count,
            distinct_codes = decisions.len(),
            "范围过滤完成"
        );

        ScopeOutcome {
            in_scope,
            metrics,
            hints,
            warnings,
        }
    }
}
