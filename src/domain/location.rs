// ==========================================
// 仓储异常检测引擎 - 库位模型
// ==========================================
// 虚拟库位: 库位的存在性与属性由结构模板推导，不逐个落库
// ==========================================

use crate::domain::types::{LocationType, UnitType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ==========================================
// StorageAddress - 货架位分解结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageAddress {
    pub aisle: Option<u32>,
    pub rack: Option<u32>,
    pub position: u32,
    pub level: char,
}

// ==========================================
// RejectionReason - 货架位语法拒绝原因（结构化，渲染时才选语言）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionReason {
    EmptyCode,
    WrongShape {
        #[serde(rename = "value")]
        code: String,
    },
    InvalidLevel {
        level: char,
        alphabet: String,
    },
    PositionWidth {
        segment: String,
        width: usize,
        zero_padded: bool,
    },
    PositionOutOfRange {
        position: u32,
        max: u32,
    },
    AisleOutOfRange {
        aisle: u32,
        max: u32,
    },
    RackOutOfRange {
        rack: u32,
        max: u32,
    },
}

// ==========================================
// LocationDescriptor - 库位描述（派生，按代码缓存）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationDescriptor {
    /// 标准化后的库位代码
    pub code: String,

    pub location_type: LocationType,

    /// 容量（INVALID 时为 None）
    pub capacity: Option<u32>,

    pub unit_type: UnitType,

    /// 拒绝原因（仅 INVALID）
    pub rejection_reason: Option<RejectionReason>,

    /// 货架位分解（仅 STORAGE）
    #[serde(default)]
    pub address: Option<StorageAddress>,

    /// 命中的特殊区域名称（仅特殊区域）
    #[serde(default)]
    pub matched_area: Option<String>,
}

impl LocationDescriptor {
    pub fn is_invalid(&self) -> bool {
        self.location_type == LocationType::Invalid
    }
}

// ==========================================
// SpecialArea - 特殊区域（收货/暂存/月台/通道）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialArea {
    /// 区域名称
    pub name: String,

    /// 通配符模式（`*` 任意串, `?` 单字符; 无通配符即精确匹配）
    pub pattern: String,

    pub area_type: LocationType,

    pub capacity: u32,

    #[serde(default)]
    pub unit_type: UnitType,
}

impl SpecialArea {
    pub fn new(
        name: impl Into<String>,
        pattern: impl Into<String>,
        area_type: LocationType,
        capacity: u32,
        unit_type: UnitType,
    ) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            area_type,
            capacity,
            unit_type,
        }
    }
}

// ==========================================
// LocationTemplate - 仓库结构模板
// ==========================================
// 货架位语法: [通道-货架-]位置 层级
//   例: 015A / 01-02-015A
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationTemplate {
    /// 模板名称
    pub name: String,

    /// 通道数量（前缀段上限）
    pub num_aisles: u32,

    /// 每通道货架数（前缀段上限）
    pub racks_per_aisle: u32,

    /// 每货架位置数（位置段上限）
    pub positions_per_rack: u32,

    /// 位置段宽度（None = 取 positions_per_rack 的位数）
    pub position_width: Option<usize>,

    /// 位置段必须补零到固定宽度
    pub zero_padded: bool,

    /// 层级字母表（如 "ABCD"）
    pub level_alphabet: String,

    /// 货架位默认容量
    pub default_capacity: u32,

    /// 货架位默认计量单位
    pub default_unit_type: UnitType,

    /// 特殊区域（按声明顺序匹配）
    pub special_areas: Vec<SpecialArea>,

    /// 按库位覆写容量
    pub capacity_overrides: HashMap<String, u32>,

    /// 按库位覆写计量单位
    pub unit_type_overrides: HashMap<String, UnitType>,
}

impl LocationTemplate {
    /// 位置段最大宽度
    pub fn effective_position_width(&self) -> usize {
        self.position_width
            .unwrap_or_else(|| self.positions_per_rack.max(1).to_string().len())
    }

    /// 标准化后的层级字母表
    pub fn levels(&self) -> Vec<char> {
        self.level_alphabet
            .chars()
            .filter(|c| !c.is_whitespace() && *c != ',')
            .map(|c| c.to_ascii_uppercase())
            .collect()
    }
}

impl Default for LocationTemplate {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            num_aisles: 99,
            racks_per_aisle: 99,
            positions_per_rack: 999,
            position_width: None,
            zero_padded: false,
            level_alphabet: "ABCD".to_string(),
            default_capacity: 1,
            default_unit_type: UnitType::Pallets,
            special_areas: default_special_areas(),
            capacity_overrides: HashMap::new(),
            unit_type_overrides: HashMap::new(),
        }
    }
}

/// 未配置仓库时仍可识别的常见过渡区
pub fn default_special_areas() -> Vec<SpecialArea> {
    vec![
        SpecialArea::new("receiving", "RECV-*", LocationType::Receiving, 10, UnitType::Pallets),
        SpecialArea::new("receiving", "RECEIVING*", LocationType::Receiving, 10, UnitType::Pallets),
        SpecialArea::new("staging", "STAGE-*", LocationType::Staging, 5, UnitType::Pallets),
        SpecialArea::new("staging", "STAGING*", LocationType::Staging, 5, UnitType::Pallets),
        SpecialArea::new("dock", "DOCK-*", LocationType::Dock, 2, UnitType::Pallets),
        SpecialArea::new("aisle", "AISLE-*", LocationType::Aisle, 2, UnitType::Pallets),
    ]
}
