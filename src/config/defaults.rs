// ==========================================
// 仓储异常检测引擎 - 默认规则目录
// ==========================================
// 裁决等级: 库位有效性(10) → 滞留(20/25) → 批次(30) → 容量(40) → 完整性(50)
// ==========================================

use crate::domain::rule::{
    IntegrityConditions, InvalidLocationConditions, LotStragglerConditions,
    OvercapacityConditions, RuleDefinition, RuleKind, TimeInAreaConditions,
};
use crate::domain::types::{AnomalyPriority, LocationType, PrecedenceClass};

pub fn default_rules() -> Vec<RuleDefinition> {
    vec![
        named(
            RuleDefinition::new(
                "invalid-location",
                RuleKind::InvalidLocation(InvalidLocationConditions {}),
                AnomalyPriority::High,
                PrecedenceClass::LocationValidity,
                10,
            ),
            "无效库位",
        ),
        named(
            RuleDefinition::new(
                "stagnant-receiving",
                RuleKind::TimeInArea(TimeInAreaConditions {
                    location_types: vec![LocationType::Receiving],
                    threshold_hours: 6.0,
                }),
                AnomalyPriority::Medium,
                PrecedenceClass::Dwell,
                20,
            ),
            "收货区滞留",
        ),
        named(
            RuleDefinition::new(
                "stagnant-transitional",
                RuleKind::TimeInArea(TimeInAreaConditions {
                    location_types: vec![LocationType::Staging, LocationType::Dock, LocationType::Aisle],
                    threshold_hours: 2.0,
                }),
                AnomalyPriority::Medium,
                PrecedenceClass::Dwell,
                25,
            ),
            "过渡区滞留",
        ),
        named(
            RuleDefinition::new(
                "lot-straggler",
                RuleKind::LotStraggler(LotStragglerConditions {
                    completion_threshold: 0.8,
                    final_location_types: vec![LocationType::Storage],
                    source_location_types: vec![LocationType::Receiving],
                    min_lot_size: 2,
                }),
                AnomalyPriority::Medium,
                PrecedenceClass::LotFlow,
                30,
            ),
            "批次掉队",
        ),
        named(
            RuleDefinition::new(
                "overcapacity",
                RuleKind::Overcapacity(OvercapacityConditions::default()),
                AnomalyPriority::High,
                PrecedenceClass::Capacity,
                40,
            ),
            "库位超容",
        ),
        named(
            RuleDefinition::new(
                "data-integrity",
                RuleKind::Integrity(IntegrityConditions::default()),
                AnomalyPriority::Medium,
                PrecedenceClass::DataIntegrity,
                50,
            ),
            "数据完整性",
        ),
    ]
}

fn named(mut rule: RuleDefinition, name: &str) -> RuleDefinition {
    rule.name = name.to_string();
    rule
}
