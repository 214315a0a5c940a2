// ==========================================
// 仓储异常检测引擎 - 库位超容规则
// ==========================================
// 按库位分组，记录数与有效容量比较
// 离散单位（托盘/箱/件箱）: 每个超出单位一条（取最近入位的记录）
// 细粒度单位（散件/混合）: 整个库位一条聚合异常，携带超出数
// INVALID 库位不参与
// ==========================================

use crate::domain::anomaly::Anomaly;
use crate::domain::record::InventoryRecord;
use crate::domain::rule::{OvercapacityConditions, RuleDefinition};
use crate::i18n::t_with_args;
use crate::rules::context::{EvaluationContext, EvaluationOutput};
use crate::rules::error::RuleResult;
use serde_json::json;
use std::cmp::Reverse;
use std::collections::HashMap;
use tracing::{debug, instrument};

#[instrument(skip_all, fields(rule_id = %rule.id, records = ctx.records.len()))]
pub fn evaluate(
    rule: &RuleDefinition,
    conditions: &OvercapacityConditions,
    ctx: &EvaluationContext,
) -> RuleResult<EvaluationOutput> {
    // 标准化代码分组（首次出现顺序）；同时记住一个原始写法用于查提示
    let mut code_order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, (&str, Vec<&InventoryRecord>)> = HashMap::new();
    for record in &ctx.records {
        let Some(descriptor) = ctx.descriptor(record) else {
            continue;
        };
        if descriptor.is_invalid() {
            continue;
        }
        if !conditions.location_types.is_empty()
            && !conditions.location_types.contains(&descriptor.location_type)
        {
            continue;
        }
        groups
            .entry(descriptor.code.as_str())
            .or_insert_with(|| {
                code_order.push(descriptor.code.as_str());
                (record.location_code.as_str(), Vec::new())
            })
            .1
            .push(record);
    }

    let mut output = EvaluationOutput::default();
    let mut over_locations = 0usize;

    for code in code_order {
        let (raw_code, members) = &groups[code];
        let Some(capacity) = ctx.effective_capacity(raw_code) else {
            continue;
        };
        let count = members.len();
        if count <= capacity as usize {
            continue;
        }
        over_locations += 1;

        let excess = count - capacity as usize;
        let unit_type = ctx.effective_unit_type(raw_code).unwrap_or_default();
        let capacity_text = capacity.to_string();
        let count_text = count.to_string();
        let excess_text = excess.to_string();
        let details = json!({
            "capacity": capacity,
            "count": count,
            "excess": excess,
            "unit_type": unit_type,
        });

        if unit_type.is_discrete() {
            // 最近入位优先；时间未解析的排最后；同一时间按行号倒序
            let mut newest_first: Vec<&&InventoryRecord> = members.iter().collect();
            newest_first.sort_by_key(|r| (Reverse(r.parsed_timestamp), Reverse(r.row_number)));

            for record in newest_first.into_iter().take(excess) {
                let description = t_with_args(
                    ctx.locale,
                    "anomaly.overcapacity_unit",
                    &[
                        ("record_id", record.record_id.as_str()),
                        ("location", code),
                        ("count", count_text.as_str()),
                        ("capacity", capacity_text.as_str()),
                        ("unit_type", &unit_type.to_string()),
                    ],
                );
                let anomaly = Anomaly::for_record(
                    rule,
                    output.anomalies.len(),
                    &record.record_id,
                    code,
                    description,
                    ctx.reference_time,
                )
                .with_excess_count(excess)
                .with_details(details.clone());
                output.anomalies.push(anomaly);
            }
        } else {
            let description = t_with_args(
                ctx.locale,
                "anomaly.overcapacity_aggregate",
                &[
                    ("location", code),
                    ("count", count_text.as_str()),
                    ("capacity", capacity_text.as_str()),
                    ("excess", excess_text.as_str()),
                    ("unit_type", &unit_type.to_string()),
                ],
            );
            let record_ids = members.iter().map(|r| r.record_id.clone()).collect();
            let anomaly = Anomaly::for_location(
                rule,
                output.anomalies.len(),
                code,
                record_ids,
                description,
                ctx.reference_time,
            )
            .with_excess_count(excess)
            .with_details(details);
            output.anomalies.push(anomaly);
        }
    }

    debug!(over_locations, candidates = output.anomalies.len(), "超容评估完成");
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::anomaly::AnomalySubject;
    use crate::domain::location::LocationTemplate;
    use crate::domain::rule::RuleKind;
    use crate::domain::scope::ScopeConfig;
    use crate::domain::types::{AnomalyPriority, PrecedenceClass, UnitType};
    use crate::rules::test_support::{context, context_with, hours_ago, record};

    fn rule() -> (RuleDefinition, OvercapacityConditions) {
        let conditions = OvercapacityConditions::default();
        let rule = RuleDefinition::new(
            "overcap",
            RuleKind::Overcapacity(conditions.clone()),
            AnomalyPriority::High,
            PrecedenceClass::Capacity,
            40,
        );
        (rule, conditions)
    }

    fn twelve_at(code: &str) -> Vec<InventoryRecord> {
        (0..12)
            .map(|i| {
                let mut r = record(&format!("P{:02}", i), code, Some(hours_ago(24 - i)));
                r.row_number = i as usize + 1;
                r
            })
            .collect()
    }

    #[test]
    fn test_discrete_units_one_anomaly_per_excess_record() {
        let ctx = context(twelve_at("RECV-01"));
        let (rule, conditions) = rule();
        let output = evaluate(&rule, &conditions, &ctx).unwrap();

        assert_eq!(output.anomalies.len(), 2);
        // 最近入位的两条
        let ids: Vec<&str> = output.anomalies.iter().map(|a| a.record_ids[0].as_str()).collect();
        assert_eq!(ids, vec!["P11", "P10"]);
        assert!(output
            .anomalies
            .iter()
            .all(|a| a.location_code == "RECV-01" && a.excess_count == Some(2)));
    }

    #[test]
    fn test_fine_grained_units_single_aggregate() {
        let mut scope = ScopeConfig::default();
        scope
            .unit_type_overrides
            .insert("RECV-01".to_string(), UnitType::Items);
        let ctx = context_with(twelve_at("RECV-01"), LocationTemplate::default(), scope);
        let (rule, conditions) = rule();
        let output = evaluate(&rule, &conditions, &ctx).unwrap();

        assert_eq!(output.anomalies.len(), 1);
        let anomaly = &output.anomalies[0];
        assert_eq!(anomaly.excess_count, Some(2));
        assert_eq!(anomaly.subject, AnomalySubject::Location("RECV-01".to_string()));
        assert_eq!(anomaly.record_ids.len(), 12);
    }

    #[test]
    fn test_unparsed_timestamps_are_taken_last() {
        let mut records = twelve_at("RECV-01");
        records[11].parsed_timestamp = None;
        let ctx = context(records);
        let (rule, conditions) = rule();
        let output = evaluate(&rule, &conditions, &ctx).unwrap();

        let ids: Vec<&str> = output.anomalies.iter().map(|a| a.record_ids[0].as_str()).collect();
        assert_eq!(ids, vec!["P10", "P09"]);
    }

    #[test]
    fn test_invalid_and_within_capacity_locations_are_skipped() {
        let mut records = twelve_at("999Z");
        records.push(record("S1", "010A", Some(hours_ago(1))));
        let ctx = context(records);
        let (rule, conditions) = rule();
        let output = evaluate(&rule, &conditions, &ctx).unwrap();
        assert!(output.anomalies.is_empty());
    }
}
