// ==========================================
// 仓储异常检测引擎 - 分析范围配置
// ==========================================

use crate::domain::types::UnitType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ==========================================
// IncludePattern - 纳入模式（可携带单位/容量提示）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IncludePattern {
    /// 仅模式串
    Plain(String),

    /// 模式串 + 提示
    Hinted {
        pattern: String,
        #[serde(default)]
        unit_type: Option<UnitType>,
        #[serde(default)]
        capacity: Option<u32>,
    },
}

impl IncludePattern {
    pub fn pattern(&self) -> &str {
        match self {
            IncludePattern::Plain(p) => p,
            IncludePattern::Hinted { pattern, .. } => pattern,
        }
    }

    pub fn unit_type(&self) -> Option<UnitType> {
        match self {
            IncludePattern::Plain(_) => None,
            IncludePattern::Hinted { unit_type, .. } => *unit_type,
        }
    }

    pub fn capacity(&self) -> Option<u32> {
        match self {
            IncludePattern::Plain(_) => None,
            IncludePattern::Hinted { capacity, .. } => *capacity,
        }
    }
}

impl From<&str> for IncludePattern {
    fn from(value: &str) -> Self {
        IncludePattern::Plain(value.to_string())
    }
}

// ==========================================
// ScopeConfig - 范围配置
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeConfig {
    pub include_patterns: Vec<IncludePattern>,
    pub exclude_patterns: Vec<String>,
    pub unit_type_overrides: HashMap<String, UnitType>,
    pub capacity_overrides: HashMap<String, u32>,
}

impl ScopeConfig {
    pub fn with_includes<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            include_patterns: patterns
                .into_iter()
                .map(|p| IncludePattern::from(p.as_ref()))
                .collect(),
            ..Self::default()
        }
    }
}

// ==========================================
// ScopeHint - 纳入模式提供的提示
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScopeHint {
    pub unit_type: Option<UnitType>,
    pub capacity: Option<u32>,
}

// ==========================================
// ScopeMetrics - 范围统计
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScopeMetrics {
    pub total: usize,
    pub in_scope_count: usize,
    pub out_of_scope_count: usize,

    /// in_scope / total（total=0 时为 0）
    pub coverage_ratio: f64,

    /// 被排除模式命中的记录数
    pub excluded_count: usize,

    /// 有纳入模式但均未命中的记录数
    pub unmatched_count: usize,

    /// 未配置纳入模式，按默认全部纳入
    pub fail_open: bool,
}
