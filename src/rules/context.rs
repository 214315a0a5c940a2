// ==========================================
// 仓储异常检测引擎 - 规则评估上下文
// ==========================================
// 单次运行内共享、只读: 范围内记录 + 库位缓存 + 时间画像 + 范围提示 + 消息语言
// ==========================================

use crate::domain::date_profile::DateFormatProfile;
use crate::domain::location::{LocationDescriptor, LocationTemplate};
use crate::domain::record::InventoryRecord;
use crate::domain::scope::{ScopeConfig, ScopeHint};
use crate::domain::types::UnitType;
use crate::domain::Anomaly;
use crate::i18n::DEFAULT_LOCALE;
use crate::location::{normalize_code, LocationCache};
use chrono::NaiveDateTime;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct EvaluationContext {
    /// 范围内记录（已带解析后时间）
    pub records: Vec<InventoryRecord>,

    pub locations: LocationCache,

    pub date_profile: DateFormatProfile,

    /// 判定“当前时间”的参照点
    pub reference_time: NaiveDateTime,

    /// 本次运行的消息语言
    pub locale: &'static str,

    /// 原始库位代码 → 包含模式提示
    hints: HashMap<String, ScopeHint>,

    /// 标准化代码 → 按库位容量覆写（范围配置 > 模板）
    capacity_overrides: HashMap<String, u32>,

    /// 标准化代码 → 按库位计量单位覆写（范围配置 > 模板）
    unit_type_overrides: HashMap<String, UnitType>,
}

impl EvaluationContext {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        records: Vec<InventoryRecord>,
        locations: LocationCache,
        date_profile: DateFormatProfile,
        reference_time: NaiveDateTime,
        scope: &ScopeConfig,
        template: &LocationTemplate,
        hints: HashMap<String, ScopeHint>,
    ) -> Self {
        // 模板覆写先入，范围覆写后入（同键覆盖）
        let mut capacity_overrides: HashMap<String, u32> = HashMap::new();
        for (code, cap) in template.capacity_overrides.iter().chain(scope.capacity_overrides.iter()) {
            capacity_overrides.insert(normalize_code(code), *cap);
        }
        let mut unit_type_overrides: HashMap<String, UnitType> = HashMap::new();
        for (code, unit) in template
            .unit_type_overrides
            .iter()
            .chain(scope.unit_type_overrides.iter())
        {
            unit_type_overrides.insert(normalize_code(code), *unit);
        }

        Self {
            records,
            locations,
            date_profile,
            reference_time,
            locale: DEFAULT_LOCALE,
            hints,
            capacity_overrides,
            unit_type_overrides,
        }
    }

    pub fn with_locale(mut self, locale: &'static str) -> Self {
        self.locale = locale;
        self
    }

    pub fn descriptor(&self, record: &InventoryRecord) -> Option<&LocationDescriptor> {
        self.locations.get(&record.location_code)
    }

    /// 有效容量: 按库位覆写 > 包含模式提示 > 分类器推导值
    pub fn effective_capacity(&self, raw_code: &str) -> Option<u32> {
        let descriptor = self.locations.get(raw_code)?;
        if descriptor.is_invalid() {
            return None;
        }
        self.capacity_overrides
            .get(&descriptor.code)
            .copied()
            .or_else(|| self.hints.get(raw_code).and_then(|h| h.capacity))
            .or(descriptor.capacity)
    }

    /// 有效计量单位: 按库位覆写 > 包含模式提示 > 分类器推导值
    pub fn effective_unit_type(&self, raw_code: &str) -> Option<UnitType> {
        let descriptor = self.locations.get(raw_code)?;
        Some(
            self.unit_type_overrides
                .get(&descriptor.code)
                .copied()
                .or_else(|| self.hints.get(raw_code).and_then(|h| h.unit_type))
                .unwrap_or(descriptor.unit_type),
        )
    }
}

// ==========================================
// EvaluationOutput - 单条规则产出
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct EvaluationOutput {
    /// 候选异常（按评估器产出顺序）
    pub anomalies: Vec<Anomaly>,

    /// 因时间未解析而跳过的记录数
    pub skipped_unparsed: usize,
}
