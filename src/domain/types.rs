// ==========================================
// 仓储异常检测引擎 - 领域类型定义
// ==========================================
// 红线: 优先级为等级制，不是评分制
// 序列化格式: SCREAMING_SNAKE_CASE (与配置文件一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 库位类型 (Location Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LocationType {
    Storage,   // 货架存储位
    Receiving, // 收货区
    Staging,   // 暂存区
    Dock,      // 月台
    Aisle,     // 通道（过渡区）
    Invalid,   // 无法识别
}

impl LocationType {
    /// 是否为特殊区域（非货架位、非无效）
    pub fn is_special_area(&self) -> bool {
        matches!(
            self,
            LocationType::Receiving | LocationType::Staging | LocationType::Dock | LocationType::Aisle
        )
    }

    /// 从字符串解析（大小写不敏感）
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "STORAGE" => Some(LocationType::Storage),
            "RECEIVING" => Some(LocationType::Receiving),
            "STAGING" => Some(LocationType::Staging),
            "DOCK" => Some(LocationType::Dock),
            "AISLE" | "TRANSITIONAL" => Some(LocationType::Aisle),
            "INVALID" => Some(LocationType::Invalid),
            _ => None,
        }
    }
}

impl fmt::Display for LocationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationType::Storage => write!(f, "STORAGE"),
            LocationType::Receiving => write!(f, "RECEIVING"),
            LocationType::Staging => write!(f, "STAGING"),
            LocationType::Dock => write!(f, "DOCK"),
            LocationType::Aisle => write!(f, "AISLE"),
            LocationType::Invalid => write!(f, "INVALID"),
        }
    }
}

// ==========================================
// 计量单位类型 (Unit Type)
// ==========================================
// 离散单位(托盘/箱/件箱)逐个计超额; 细粒度单位(散件/混合)按库位汇总
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitType {
    Pallets,
    Boxes,
    Items,
    Cases,
    Mixed,
}

impl UnitType {
    /// 是否为离散单位
    pub fn is_discrete(&self) -> bool {
        matches!(self, UnitType::Pallets | UnitType::Boxes | UnitType::Cases)
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pallets" | "pallet" => Some(UnitType::Pallets),
            "boxes" | "box" => Some(UnitType::Boxes),
            "items" | "item" => Some(UnitType::Items),
            "cases" | "case" => Some(UnitType::Cases),
            "mixed" => Some(UnitType::Mixed),
            _ => None,
        }
    }
}

impl Default for UnitType {
    fn default() -> Self {
        UnitType::Pallets
    }
}

impl fmt::Display for UnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitType::Pallets => write!(f, "pallets"),
            UnitType::Boxes => write!(f, "boxes"),
            UnitType::Items => write!(f, "items"),
            UnitType::Cases => write!(f, "cases"),
            UnitType::Mixed => write!(f, "mixed"),
        }
    }
}

// ==========================================
// 异常优先级 (Anomaly Priority)
// ==========================================
// 顺序: Low < Medium < High < VeryHigh
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnomalyPriority {
    Low,      // 提示
    Medium,   // 关注
    High,     // 紧急
    VeryHigh, // 红线
}

impl AnomalyPriority {
    /// 抬升 steps 级（封顶 VeryHigh）
    pub fn escalate(self, steps: u8) -> Self {
        let mut level = self;
        for _ in 0..steps {
            level = match level {
                AnomalyPriority::Low => AnomalyPriority::Medium,
                AnomalyPriority::Medium => AnomalyPriority::High,
                AnomalyPriority::High | AnomalyPriority::VeryHigh => AnomalyPriority::VeryHigh,
            };
        }
        level
    }
}

impl fmt::Display for AnomalyPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnomalyPriority::Low => write!(f, "LOW"),
            AnomalyPriority::Medium => write!(f, "MEDIUM"),
            AnomalyPriority::High => write!(f, "HIGH"),
            AnomalyPriority::VeryHigh => write!(f, "VERY_HIGH"),
        }
    }
}

// ==========================================
// 异常类别 (Anomaly Category)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnomalyCategory {
    Stagnation,      // 区域滞留
    IncompleteLot,   // 批次掉队
    Overcapacity,    // 库位超容
    InvalidLocation, // 无效库位
    DataIntegrity,   // 数据完整性
}

impl fmt::Display for AnomalyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnomalyCategory::Stagnation => write!(f, "STAGNATION"),
            AnomalyCategory::IncompleteLot => write!(f, "INCOMPLETE_LOT"),
            AnomalyCategory::Overcapacity => write!(f, "OVERCAPACITY"),
            AnomalyCategory::InvalidLocation => write!(f, "INVALID_LOCATION"),
            AnomalyCategory::DataIntegrity => write!(f, "DATA_INTEGRITY"),
        }
    }
}

// ==========================================
// 优先类别 (Precedence Class)
// ==========================================
// 同一记录在同一类别内只保留一条发现; 不同类别互不干扰
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrecedenceClass {
    LocationValidity, // 库位有效性
    Dwell,            // 停留时长
    LotFlow,          // 批次流转
    Capacity,         // 容量
    DataIntegrity,    // 数据完整性
}

impl fmt::Display for PrecedenceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrecedenceClass::LocationValidity => write!(f, "LOCATION_VALIDITY"),
            PrecedenceClass::Dwell => write!(f, "DWELL"),
            PrecedenceClass::LotFlow => write!(f, "LOT_FLOW"),
            PrecedenceClass::Capacity => write!(f, "CAPACITY"),
            PrecedenceClass::DataIntegrity => write!(f, "DATA_INTEGRITY"),
        }
    }
}
