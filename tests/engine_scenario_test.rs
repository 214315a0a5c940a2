// ==========================================
// 引擎场景测试
// ==========================================
// 职责: 通过公开入口验证完整分析流程
// 场景: 超容 / 批次掉队 / 无效库位 / 跨规则裁决 / 时间列识别
// ==========================================

mod helpers;

use helpers::*;
use std::collections::HashSet;
use warehouse_rule_engine::domain::report::{RuleRunStatus, WarningKind};
use warehouse_rule_engine::domain::rule::TimeInAreaConditions;
use warehouse_rule_engine::domain::scope::IncludePattern;
use warehouse_rule_engine::domain::{DateFormatType, LocationTemplate};
use warehouse_rule_engine::{
    AnomalyCategory, AnomalyPriority, InventoryRecord, LocationType, PrecedenceClass,
    RuleDefinition, RuleEngine, RuleKind, UnitType,
};

/// 100 条记录: 12 条在 RECV-01（容量 10），其余各占一个货架位
fn hundred_records() -> Vec<InventoryRecord> {
    let mut records = Vec::new();
    for i in 0..12 {
        records.push(
            RecordBuilder::new(&format!("RECV-P{:02}", i))
                .location("RECV-01")
                .minutes_ago(60 - i as i64)
                .build(),
        );
    }
    for i in 1..=88 {
        records.push(
            RecordBuilder::new(&format!("P{:03}", i))
                .location(&storage_code(i))
                .minutes_ago(90)
                .build(),
        );
    }
    numbered(records)
}

// ==========================================
// 超容
// ==========================================

#[tokio::test]
async fn test_hundred_records_twelve_at_receiving() {
    let engine = RuleEngine::new(config_at_reference()).unwrap();
    let report = engine.evaluate_all(hundred_records()).await.unwrap();

    assert_eq!(report.summary.total_records, 100);
    assert_eq!(report.anomalies.len(), 2, "{:#?}", report.anomalies);
    for anomaly in &report.anomalies {
        assert_eq!(anomaly.category, AnomalyCategory::Overcapacity);
        assert_eq!(anomaly.location_code, "RECV-01");
        assert_eq!(anomaly.excess_count, Some(2));
    }

    // 最近入位的两个单元被判为超出部分
    let flagged: HashSet<&str> = report
        .anomalies
        .iter()
        .flat_map(|a| a.record_ids.iter().map(String::as_str))
        .collect();
    assert_eq!(flagged, HashSet::from(["RECV-P11", "RECV-P10"]));

    let perf = report.performance_for("overcapacity").unwrap();
    assert_eq!(perf.status, RuleRunStatus::Completed);
    assert_eq!(perf.candidate_count, 2);
    assert_eq!(perf.accepted_count, 2);
}

#[tokio::test]
async fn test_fine_grained_units_yield_one_aggregate() {
    let mut config = config_with_active(&["overcapacity"]);
    config
        .scope
        .unit_type_overrides
        .insert("RECV-01".to_string(), UnitType::Items);

    let engine = RuleEngine::new(config).unwrap();
    let report = engine.evaluate_all(hundred_records()).await.unwrap();

    assert_eq!(report.anomalies.len(), 1);
    let anomaly = &report.anomalies[0];
    assert_eq!(anomaly.excess_count, Some(2));
    assert_eq!(anomaly.record_ids.len(), 12);
    assert_eq!(anomaly.location_code, "RECV-01");
}

#[tokio::test]
async fn test_include_hint_capacity_applies() {
    let mut config = config_with_active(&["overcapacity"]);
    config.scope.include_patterns = vec![
        IncludePattern::Hinted {
            pattern: "RECV-*".to_string(),
            unit_type: None,
            capacity: Some(11),
        },
        IncludePattern::from("???A"),
    ];

    let engine = RuleEngine::new(config).unwrap();
    let report = engine.evaluate_all(hundred_records()).await.unwrap();

    assert_eq!(report.anomalies.len(), 1);
    assert_eq!(report.scope_metrics.in_scope_count, 100);
    assert!(!report.has_warning(WarningKind::ScopeMisconfiguration));
}

// ==========================================
// 批次掉队
// ==========================================

fn lot_records(final_count: usize) -> Vec<InventoryRecord> {
    let mut records = Vec::new();
    for i in 0..10 {
        let builder = RecordBuilder::new(&format!("L{:02}", i)).lot("R-100");
        let builder = if i < final_count {
            builder.location(&storage_code(i + 1))
        } else {
            builder.location("RECV-01")
        };
        records.push(builder.build());
    }
    numbered(records)
}

#[tokio::test]
async fn test_lot_nine_of_ten_yields_one_straggler() {
    let engine = RuleEngine::new(config_with_active(&["lot-straggler"])).unwrap();
    let report = engine.evaluate_all(lot_records(9)).await.unwrap();

    assert_eq!(report.anomalies.len(), 1);
    assert_eq!(report.anomalies[0].category, AnomalyCategory::IncompleteLot);
    assert_eq!(report.anomalies[0].record_ids, vec!["L09".to_string()]);
}

#[tokio::test]
async fn test_lot_seven_of_ten_yields_nothing() {
    let engine = RuleEngine::new(config_with_active(&["lot-straggler"])).unwrap();
    let report = engine.evaluate_all(lot_records(7)).await.unwrap();
    assert!(report.anomalies.is_empty());
}

// ==========================================
// 无效库位
// ==========================================

#[tokio::test]
async fn test_invalid_level_letter_is_reported() {
    let engine = RuleEngine::new(config_with_active(&["invalid-location"])).unwrap();
    let records = numbered(vec![
        RecordBuilder::new("A").location("999Z").build(),
        RecordBuilder::new("B").location("015A").build(),
    ]);

    let report = engine.evaluate_all(records).await.unwrap();

    assert_eq!(report.anomalies.len(), 1);
    let anomaly = &report.anomalies[0];
    assert_eq!(anomaly.category, AnomalyCategory::InvalidLocation);
    assert_eq!(anomaly.location_code, "999Z");
    let reason = anomaly.details["rejection_reason"].as_str().unwrap();
    assert!(reason.contains('Z'));
    assert!(reason.contains("ABCD"));
}

#[tokio::test]
async fn test_template_controls_storage_grammar() {
    let mut config = config_with_active(&["invalid-location"]);
    config.template = small_warehouse_template();
    let engine = RuleEngine::new(config).unwrap();
    let records = numbered(vec![
        RecordBuilder::new("ok").location("01-02-05A").build(),
        RecordBuilder::new("unpadded").location("01-02-5A").build(),
        RecordBuilder::new("aisle").location("03-01-05A").build(),
        RecordBuilder::new("bulk").location("BULK-07").build(),
    ]);

    let report = engine.evaluate_all(records).await.unwrap();

    let flagged: HashSet<&str> = report
        .anomalies
        .iter()
        .map(|a| a.record_ids[0].as_str())
        .collect();
    assert_eq!(flagged, HashSet::from(["unpadded", "aisle"]));
}

// ==========================================
// 跨规则裁决
// ==========================================

#[tokio::test]
async fn test_same_class_keeps_lower_precedence_level() {
    let mut config = config_with_active(&["stagnant-receiving"]);
    config.rules.push(RuleDefinition::new(
        "receiving-one-hour",
        RuleKind::TimeInArea(TimeInAreaConditions {
            location_types: vec![LocationType::Receiving],
            threshold_hours: 1.0,
        }),
        AnomalyPriority::Low,
        PrecedenceClass::Dwell,
        22,
    ));
    let engine = RuleEngine::new(config).unwrap();
    let records = numbered(vec![
        RecordBuilder::new("old").location("RECV-01").hours_ago(8).build(),
        RecordBuilder::new("recent").location("RECV-01").hours_ago(2).build(),
    ]);

    let report = engine.evaluate_all(records).await.unwrap();

    // old: 两条规则都命中，只保留等级 20；recent: 只有 1 小时规则命中
    assert_eq!(report.anomalies.len(), 2);
    let old = report
        .anomalies
        .iter()
        .find(|a| a.record_ids == vec!["old".to_string()])
        .unwrap();
    assert_eq!(old.rule_id, "stagnant-receiving");
    assert_eq!(report.summary.suppressed_candidates, 1);
    assert_eq!(
        report.performance_for("receiving-one-hour").unwrap().suppressed_count,
        1
    );
}

#[tokio::test]
async fn test_different_classes_are_both_retained() {
    let engine =
        RuleEngine::new(config_with_active(&["invalid-location", "data-integrity"])).unwrap();
    let records = numbered(vec![
        RecordBuilder::new("X").location("999Z").product("").build(),
        RecordBuilder::new("Y").location("010A").build(),
    ]);

    let report = engine.evaluate_all(records).await.unwrap();

    let for_x: Vec<_> = report
        .anomalies
        .iter()
        .filter(|a| a.record_ids == vec!["X".to_string()])
        .map(|a| a.precedence_class)
        .collect();
    assert_eq!(for_x.len(), 2);
    assert!(for_x.contains(&PrecedenceClass::LocationValidity));
    assert!(for_x.contains(&PrecedenceClass::DataIntegrity));
    // 优先级降序
    assert_eq!(report.anomalies[0].priority, AnomalyPriority::High);
}

// ==========================================
// 时间列
// ==========================================

#[tokio::test]
async fn test_serial_column_is_detected_and_parsed() {
    let engine = RuleEngine::new(config_with_active(&["data-integrity"])).unwrap();
    let records: Vec<InventoryRecord> = (0..40)
        .map(|i| {
            RecordBuilder::new(&format!("S{}", i))
                .location(&storage_code(i + 1))
                .timestamp_raw(&format!("{}.25", 44000 + i * 50))
                .build()
        })
        .collect();

    let report = engine.evaluate_all(numbered(records)).await.unwrap();

    assert_eq!(report.date_profile.format_type, DateFormatType::SerialNumeric);
    assert!(report.date_profile.confidence >= 0.95);
    assert_eq!(report.date_quality.failed_count, 0);
    assert_eq!(report.date_quality.success_rate, 1.0);
    assert!(!report.has_warning(WarningKind::ParseFailure));
}

#[tokio::test]
async fn test_unparseable_timestamps_warn_and_skip() {
    let engine = RuleEngine::new(config_with_active(&["stagnant-receiving"])).unwrap();
    let records = numbered(vec![
        RecordBuilder::new("A").location("RECV-01").hours_ago(8).build(),
        RecordBuilder::new("B").location("RECV-01").hours_ago(9).build(),
        RecordBuilder::new("C")
            .location("RECV-01")
            .timestamp_raw("not a date")
            .build(),
    ]);

    let report = engine.evaluate_all(records).await.unwrap();

    assert!(report.has_warning(WarningKind::ParseFailure));
    assert!(report.has_warning(WarningKind::UnparsedSkipped));
    assert_eq!(report.anomalies.len(), 2);
    assert_eq!(
        report.performance_for("stagnant-receiving").unwrap().skipped_records,
        1
    );
}

// ==========================================
// 范围
// ==========================================

#[tokio::test]
async fn test_no_include_patterns_fails_open_with_warning() {
    let engine = RuleEngine::new(config_at_reference()).unwrap();
    let report = engine.evaluate_all(hundred_records()).await.unwrap();

    assert!(report.scope_metrics.fail_open);
    assert_eq!(report.scope_metrics.in_scope_count, 100);
    assert!(report.has_warning(WarningKind::ScopeMisconfiguration));
}

#[tokio::test]
async fn test_excluded_records_are_not_analyzed() {
    let mut config = config_at_reference();
    config.scope.include_patterns = vec![IncludePattern::from("*")];
    config.scope.exclude_patterns = vec!["RECV-*".to_string()];

    let engine = RuleEngine::new(config).unwrap();
    let report = engine.evaluate_all(hundred_records()).await.unwrap();

    assert!(report.anomalies.is_empty());
    assert_eq!(report.summary.analyzed_records, 88);
    assert_eq!(report.scope_metrics.excluded_count, 12);
}

#[tokio::test]
async fn test_same_input_same_anomalies() {
    let engine = RuleEngine::new(config_at_reference()).unwrap();
    let mut records = hundred_records();
    records.push(RecordBuilder::new("bad").location("999Z").build());

    let first = engine.evaluate_all(records.clone()).await.unwrap();
    let second = engine.evaluate_all(records).await.unwrap();

    assert_eq!(first.anomalies, second.anomalies);
    assert_ne!(first.run_id, second.run_id);
}

#[tokio::test]
async fn test_default_template_roundtrip_through_config_json() {
    let config = config_at_reference();
    let json = config.to_json_pretty().unwrap();
    let restored = warehouse_rule_engine::EngineConfig::from_json_str(&json).unwrap();
    assert_eq!(restored, config);
    assert_eq!(restored.template, LocationTemplate::default());
}
