// ==========================================
// 仓储异常检测引擎 - 规则定义
// ==========================================
// 规则种类为带标签的枚举，按种类穷举分派
// JSON 形态: {"kind": "TIME_IN_AREA", "conditions": {...}}
// ==========================================

use crate::domain::types::{AnomalyCategory, AnomalyPriority, LocationType, PrecedenceClass};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 各类规则条件
// ==========================================

/// 区域滞留条件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeInAreaConditions {
    /// 参与判定的库位类型
    pub location_types: Vec<LocationType>,

    /// 滞留阈值（小时）
    pub threshold_hours: f64,
}

/// 批次掉队条件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LotStragglerConditions {
    /// 完成度阈值（0~1）
    pub completion_threshold: f64,

    /// 视为“已完成”的库位类型
    #[serde(default = "default_final_types")]
    pub final_location_types: Vec<LocationType>,

    /// 视为“未离开来源”的库位类型
    #[serde(default = "default_source_types")]
    pub source_location_types: Vec<LocationType>,

    /// 小于该规模的批次不参与判定
    #[serde(default = "default_min_lot_size")]
    pub min_lot_size: usize,
}

fn default_final_types() -> Vec<LocationType> {
    vec![LocationType::Storage]
}

fn default_source_types() -> Vec<LocationType> {
    vec![LocationType::Receiving]
}

fn default_min_lot_size() -> usize {
    2
}

/// 库位超容条件
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OvercapacityConditions {
    /// 仅检查这些库位类型（空 = 全部有效库位）
    #[serde(default)]
    pub location_types: Vec<LocationType>,
}

/// 无效库位条件（无参数）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvalidLocationConditions {}

/// 数据完整性条件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrityConditions {
    pub check_duplicates: bool,
    pub check_missing_fields: bool,
    pub check_impossible_values: bool,

    /// 允许的未来时间容差（小时）
    pub future_tolerance_hours: f64,

    /// 合理的最早年份
    pub min_year: i32,
}

impl Default for IntegrityConditions {
    fn default() -> Self {
        Self {
            check_duplicates: true,
            check_missing_fields: true,
            check_impossible_values: true,
            future_tolerance_hours: 24.0,
            min_year: 2000,
        }
    }
}

// ==========================================
// RuleKind - 规则种类（带标签的变体）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "conditions", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleKind {
    TimeInArea(TimeInAreaConditions),
    LotStraggler(LotStragglerConditions),
    Overcapacity(OvercapacityConditions),
    InvalidLocation(InvalidLocationConditions),
    Integrity(IntegrityConditions),
}

impl RuleKind {
    /// 种类标签（日志 / 报告用）
    pub fn tag(&self) -> &'static str {
        match self {
            RuleKind::TimeInArea(_) => "TIME_IN_AREA",
            RuleKind::LotStraggler(_) => "LOT_STRAGGLER",
            RuleKind::Overcapacity(_) => "OVERCAPACITY",
            RuleKind::InvalidLocation(_) => "INVALID_LOCATION",
            RuleKind::Integrity(_) => "INTEGRITY",
        }
    }

    /// 该种类产出的异常类别
    pub fn category(&self) -> AnomalyCategory {
        match self {
            RuleKind::TimeInArea(_) => AnomalyCategory::Stagnation,
            RuleKind::LotStraggler(_) => AnomalyCategory::IncompleteLot,
            RuleKind::Overcapacity(_) => AnomalyCategory::Overcapacity,
            RuleKind::InvalidLocation(_) => AnomalyCategory::InvalidLocation,
            RuleKind::Integrity(_) => AnomalyCategory::DataIntegrity,
        }
    }

    /// 是否依赖解析后的时间
    pub fn uses_timestamps(&self) -> bool {
        matches!(self, RuleKind::TimeInArea(_) | RuleKind::Integrity(_))
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

// ==========================================
// RuleDefinition - 规则定义（一次载入，只读）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDefinition {
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(flatten)]
    pub kind: RuleKind,

    pub priority: AnomalyPriority,

    pub precedence_class: PrecedenceClass,

    /// 越小越优先
    pub precedence_level: u32,

    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl RuleDefinition {
    pub fn new(
        id: impl Into<String>,
        kind: RuleKind,
        priority: AnomalyPriority,
        precedence_class: PrecedenceClass,
        precedence_level: u32,
    ) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            kind,
            priority,
            precedence_class,
            precedence_level,
            active: true,
        }
    }

    /// 显示名称（未配置时退回 id）
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}
