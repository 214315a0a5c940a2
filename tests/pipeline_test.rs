// ==========================================
// 端到端流程测试
// ==========================================
// 职责: 文件载入 → 配置库 → 引擎 → 报告
// 场景: 致命错误 / 取消 / 配置来源 / 报告序列化
// ==========================================

mod helpers;

use helpers::*;
use std::io::Write;
use warehouse_rule_engine::config::config_keys;
use warehouse_rule_engine::domain::report::WarningKind;
use warehouse_rule_engine::importer::{ImportError, RecordLoader};
use warehouse_rule_engine::{
    AnomalyCategory, CancellationFlag, ConfigStore, EngineConfig, EngineConfigSource,
    EngineError, RuleEngine,
};

fn csv_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

// ==========================================
// 致命错误
// ==========================================

#[tokio::test]
async fn test_empty_record_set_aborts() {
    let engine = RuleEngine::new(config_at_reference()).unwrap();
    let result = engine.evaluate_all(Vec::new()).await;
    assert!(matches!(result, Err(EngineError::EmptyRecordSet)));
}

#[tokio::test]
async fn test_blank_location_column_aborts() {
    let engine = RuleEngine::new(config_at_reference()).unwrap();
    let records = vec![
        RecordBuilder::new("A").location("").build(),
        RecordBuilder::new("B").location(" ").build(),
    ];
    match engine.evaluate_all(records).await {
        Err(EngineError::MissingRequiredColumns(columns)) => {
            assert_eq!(columns, vec!["location_code".to_string()]);
        }
        other => panic!("期望缺列错误: {:?}", other.map(|r| r.run_id)),
    }
}

#[test]
fn test_invalid_configuration_is_rejected_up_front() {
    let mut config = config_at_reference();
    let duplicate = config.rules[0].clone();
    config.rules.push(duplicate);
    assert!(matches!(
        RuleEngine::new(config),
        Err(EngineError::InvalidConfiguration(_))
    ));
}

#[tokio::test]
async fn test_cancelled_run_returns_cancelled() {
    let engine = RuleEngine::new(config_at_reference()).unwrap();
    let cancel = CancellationFlag::new();
    cancel.cancel();

    let result = engine
        .evaluate_all_with_cancel(vec![RecordBuilder::new("A").build()], &cancel)
        .await;

    assert!(matches!(result, Err(EngineError::Cancelled { .. })));
}

// ==========================================
// 载入 → 分析
// ==========================================

#[tokio::test]
async fn test_csv_to_report() {
    let file = csv_file(&format!(
        "Pallet ID,Location,Creation Date,Receipt Number,Description\n\
         P1,RECV-01,{old},R-1,Widget\n\
         P2,015A,{recent},R-1,Widget\n\
         P3,999Z,{recent},,Gadget\n",
        old = hours_ago(10),
        recent = hours_ago(1),
    ));

    let loaded = RecordLoader::new().load(file.path()).unwrap();
    assert_eq!(loaded.records.len(), 3);
    assert!(loaded.rejected_rows.is_empty());

    let engine = RuleEngine::new(config_at_reference()).unwrap();
    let report = engine.evaluate_all(loaded.records).await.unwrap();

    let categories: Vec<AnomalyCategory> = report.anomalies.iter().map(|a| a.category).collect();
    assert!(categories.contains(&AnomalyCategory::Stagnation));
    assert!(categories.contains(&AnomalyCategory::InvalidLocation));
    assert!(report
        .anomalies
        .iter()
        .all(|a| a.category != AnomalyCategory::Stagnation || a.record_ids == vec!["P1"]));

    // 报告可序列化为 JSON
    let json = serde_json::to_value(&report).unwrap();
    assert!(json["anomalies"].is_array());
    assert!(json["stage_timings"].as_array().unwrap().len() >= 4);
}

#[test]
fn test_csv_without_location_column_is_rejected() {
    let file = csv_file("pallet_id,timestamp,sku\nP1,2024-06-01 10:00:00,SKU\n");
    let result = RecordLoader::new().load(file.path());
    match result {
        Err(ImportError::MissingColumns(columns)) => {
            assert_eq!(columns, vec!["location_code".to_string()]);
        }
        other => panic!("期望缺列错误: {:?}", other.map(|o| o.records.len())),
    }
}

// ==========================================
// 配置来源
// ==========================================

#[tokio::test]
async fn test_store_round_trip_drives_engine() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.db");
    let path = path.to_str().unwrap();

    let mut config = config_with_active(&["overcapacity"]);
    config
        .template
        .capacity_overrides
        .insert("RECV-01".to_string(), 1);
    ConfigStore::new(path)
        .unwrap()
        .save_engine_config(&config)
        .unwrap();

    // 重新打开，模拟下一次运行
    let store = ConfigStore::new(path).unwrap();
    let loaded = store.load_engine_config().await.unwrap();
    assert_eq!(loaded, config);

    let engine = RuleEngine::from_source(&store).await.unwrap();
    let records = numbered(vec![
        RecordBuilder::new("A").location("RECV-01").minutes_ago(30).build(),
        RecordBuilder::new("B").location("RECV-01").minutes_ago(20).build(),
    ]);
    let report = engine.evaluate_all(records).await.unwrap();

    assert_eq!(report.anomalies.len(), 1);
    assert_eq!(report.anomalies[0].record_ids, vec!["B".to_string()]);
}

#[tokio::test]
async fn test_empty_store_falls_back_to_defaults() {
    let store = ConfigStore::in_memory().unwrap();
    let loaded = store.load_engine_config().await.unwrap();
    assert_eq!(loaded.rules, EngineConfig::default().rules);
    assert!(store.get_value(config_keys::RULES).unwrap().is_none());
}

#[tokio::test]
async fn test_in_memory_config_is_a_source() {
    let config = config_at_reference();
    let engine = RuleEngine::from_source(&config).await.unwrap();
    let report = engine
        .evaluate_all(vec![RecordBuilder::new("A").build()])
        .await
        .unwrap();
    assert!(report.anomalies.is_empty());
    assert!(report.has_warning(WarningKind::ScopeMisconfiguration));
}
