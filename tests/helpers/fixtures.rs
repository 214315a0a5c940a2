// ==========================================
// 测试夹具 - 配置 / 模板
// ==========================================

use super::record_builder::reference_time;
use warehouse_rule_engine::domain::location::{LocationTemplate, SpecialArea};
use warehouse_rule_engine::{EngineConfig, LocationType, UnitType};

/// 默认规则目录 + 固定参考时间
pub fn config_at_reference() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.settings.reference_time = Some(reference_time());
    config
}

/// 仅启用给定规则
pub fn config_with_active(rule_ids: &[&str]) -> EngineConfig {
    let mut config = config_at_reference();
    for rule in config.rules.iter_mut() {
        rule.active = rule_ids.contains(&rule.id.as_str());
    }
    config
}

/// 小型仓库: 2 通道 × 3 货架 × 20 位置，层级 A-D，位置补零到 2 位
pub fn small_warehouse_template() -> LocationTemplate {
    LocationTemplate {
        name: "small".to_string(),
        num_aisles: 2,
        racks_per_aisle: 3,
        positions_per_rack: 20,
        position_width: Some(2),
        zero_padded: true,
        level_alphabet: "ABCD".to_string(),
        default_capacity: 1,
        default_unit_type: UnitType::Pallets,
        special_areas: vec![
            SpecialArea::new("receiving", "RECV-*", LocationType::Receiving, 10, UnitType::Pallets),
            SpecialArea::new("bulk", "BULK-??", LocationType::Staging, 100, UnitType::Items),
        ],
        ..LocationTemplate::default()
    }
}
