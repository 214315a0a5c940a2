// ==========================================
// 仓储异常检测引擎 - 库位分类器
// ==========================================
// 纯模式推导: 描述只取决于 (代码, 模板)，不查询落库的逐库位记录
// 顺序: 特殊区域 → 货架位语法 → INVALID
// 容量/计量单位: 按库位覆写 > 模式推导值 > 模板默认
// ==========================================

use crate::domain::location::{LocationDescriptor, LocationTemplate, RejectionReason, SpecialArea};
use crate::domain::types::LocationType;
use crate::location::grammar;
use crate::pattern::WildcardPattern;
use std::collections::HashMap;
use tracing::debug;

/// 库位代码标准化: 去首尾空白并转大写
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

// ==========================================
// LocationClassifier
// ==========================================
pub struct LocationClassifier {
    template: LocationTemplate,
    areas: Vec<(SpecialArea, WildcardPattern)>,
}

impl LocationClassifier {
    pub fn new(template: LocationTemplate) -> Result<Self, regex::Error> {
        let areas = template
            .special_areas
            .iter()
            .map(|area| Ok((area.clone(), WildcardPattern::compile(&area.pattern)?)))
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self { template, areas })
    }

    pub fn template(&self) -> &LocationTemplate {
        &self.template
    }

    /// 分类单个库位代码
    pub fn classify(&self, raw_code: &str) -> LocationDescriptor {
        let code = normalize_code(raw_code);
        if code.is_empty() {
            return self.invalid(code, RejectionReason::EmptyCode);
        }

        // 1. 特殊区域（按声明顺序，首个命中生效）
        if let Some((area, _)) = self.areas.iter().find(|(_, p)| p.is_match(&code)) {
            return LocationDescriptor {
                capacity: Some(self.capacity_override(&code).unwrap_or(area.capacity)),
                unit_type: self
                    .template
                    .unit_type_overrides
                    .get(&code)
                    .copied()
                    .unwrap_or(area.unit_type),
                location_type: area.area_type,
                rejection_reason: None,
                address: None,
                matched_area: Some(area.name.clone()),
                code,
            };
        }

        // 2. 货架位语法
        match grammar::decode(&code, &self.template) {
            Ok(address) => LocationDescriptor {
                capacity: Some(
                    self.capacity_override(&code)
                        .unwrap_or(self.template.default_capacity),
                ),
                unit_type: self
                    .template
                    .unit_type_overrides
                    .get(&code)
                    .copied()
                    .unwrap_or(self.template.default_unit_type),
                location_type: LocationType::Storage,
                rejection_reason: None,
                address: Some(address),
                matched_area: None,
                code,
            },
            // 3. 无法识别
            Err(reason) => self.invalid(code, reason),
        }
    }

    fn capacity_override(&self, code: &str) -> Option<u32> {
        self.template.capacity_overrides.get(code).copied()
    }

    fn invalid(&self, code: String, reason: RejectionReason) -> LocationDescriptor {
        LocationDescriptor {
            code,
            location_type: LocationType::Invalid,
            capacity: None,
            unit_type: self.template.default_unit_type,
            rejection_reason: Some(reason),
            address: None,
            matched_area: None,
        }
    }
}

// ==========================================
// LocationCache - 单次运行的描述缓存
// ==========================================
// 键为原始代码（记录中的写法），每个不同代码只分类一次
#[derive(Debug, Clone, Default)]
pub struct LocationCache {
    descriptors: HashMap<String, LocationDescriptor>,
}

impl LocationCache {
    /// 对所有不同代码分类一次
    pub fn build<'a, I>(codes: I, classifier: &LocationClassifier) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut descriptors = HashMap::new();
        for code in codes {
            if !descriptors.contains_key(code) {
                descriptors.insert(code.to_string(), classifier.classify(code));
            }
        }

        let invalid = descriptors.values().filter(|d| d.is_invalid()).count();
        debug!(distinct = descriptors.len(), invalid, "库位分类完成");

        Self { descriptors }
    }

    pub fn get(&self, code: &str) -> Option<&LocationDescriptor> {
        self.descriptors.get(code)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn invalid_count(&self) -> usize {
        self.descriptors.values().filter(|d| d.is_invalid()).count()
    }
}
