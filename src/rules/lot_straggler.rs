// ==========================================
// 仓储异常检测引擎 - 批次掉队规则
// ==========================================
// 按批次分组: 完成度 = 已入终点类型库位的记录 / 批次规模
// 完成度达到阈值时，仍停留在来源类型库位的记录即为掉队
// 优先级按完成度超出阈值的程度抬升（最多两级）
// ==========================================

use crate::domain::anomaly::Anomaly;
use crate::domain::record::InventoryRecord;
use crate::domain::rule::{LotStragglerConditions, RuleDefinition};
use crate::domain::types::LocationType;
use crate::i18n::t_with_args;
use crate::rules::context::{EvaluationContext, EvaluationOutput};
use crate::rules::error::{RuleError, RuleResult};
use serde_json::json;
use std::collections::HashMap;
use tracing::{debug, instrument};

pub fn validate(rule_id: &str, conditions: &LotStragglerConditions) -> RuleResult<()> {
    let threshold = conditions.completion_threshold;
    if !threshold.is_finite() || threshold <= 0.0 || threshold > 1.0 {
        return Err(RuleError::invalid(
            rule_id,
            format!("completion_threshold 必须在 (0, 1] 内，当前 {}", threshold),
        ));
    }
    if conditions.final_location_types.is_empty() || conditions.source_location_types.is_empty() {
        return Err(RuleError::invalid(
            rule_id,
            "final_location_types / source_location_types 不能为空",
        ));
    }
    Ok(())
}

/// 优先级抬升级数: floor((完成度 - 阈值) / (1 - 阈值) × 2)，限定 0..=2
pub fn escalation_steps(completion: f64, threshold: f64) -> u8 {
    if threshold >= 1.0 || completion <= threshold {
        return 0;
    }
    // 容差吸收浮点误差（0.9 - 0.8 != 0.1）
    let scaled = ((completion - threshold) / (1.0 - threshold)) * 2.0 + 1e-9;
    scaled.floor().clamp(0.0, 2.0) as u8
}

fn location_type_of(ctx: &EvaluationContext, record: &InventoryRecord) -> Option<LocationType> {
    ctx.descriptor(record)
        .filter(|d| !d.is_invalid())
        .map(|d| d.location_type)
}

#[instrument(skip_all, fields(rule_id = %rule.id, records = ctx.records.len()))]
pub fn evaluate(
    rule: &RuleDefinition,
    conditions: &LotStragglerConditions,
    ctx: &EvaluationContext,
) -> RuleResult<EvaluationOutput> {
    validate(&rule.id, conditions)?;

    // 按首次出现顺序分组
    let mut lot_order: Vec<&str> = Vec::new();
    let mut lots: HashMap<&str, Vec<&InventoryRecord>> = HashMap::new();
    for record in &ctx.records {
        let Some(lot) = record.lot() else {
            continue;
        };
        lots.entry(lot)
            .or_insert_with(|| {
                lot_order.push(lot);
                Vec::new()
            })
            .push(record);
    }

    let mut output = EvaluationOutput::default();
    let mut evaluated_lots = 0usize;

    for lot in lot_order {
        let members = &lots[lot];
        if members.len() < conditions.min_lot_size.max(1) {
            continue;
        }
        evaluated_lots += 1;

        let completed = members
            .iter()
            .filter(|r| {
                location_type_of(ctx, r)
                    .map(|t| conditions.final_location_types.contains(&t))
                    .unwrap_or(false)
            })
            .count();
        let completion = completed as f64 / members.len() as f64;
        if completion < conditions.completion_threshold {
            continue;
        }

        let steps = escalation_steps(completion, conditions.completion_threshold);
        let completion_pct = format!("{:.0}", completion * 100.0);

        for record in members.iter().filter(|r| {
            location_type_of(ctx, r)
                .map(|t| conditions.source_location_types.contains(&t))
                .unwrap_or(false)
        }) {
            let location = ctx
                .descriptor(record)
                .map(|d| d.code.clone())
                .unwrap_or_else(|| record.location_code.clone());
            let description = t_with_args(
                ctx.locale,
                "anomaly.lot_straggler",
                &[
                    ("record_id", record.record_id.as_str()),
                    ("lot_id", lot),
                    ("location", location.as_str()),
                    ("completion", completion_pct.as_str()),
                    ("completed", &completed.to_string()),
                    ("total", &members.len().to_string()),
                ],
            );
            let anomaly = Anomaly::for_record(
                rule,
                output.anomalies.len(),
                &record.record_id,
                &location,
                description,
                ctx.reference_time,
            )
            .with_priority(rule.priority.escalate(steps))
            .with_details(json!({
                "lot_id": lot,
                "lot_size": members.len(),
                "completed": completed,
                "completion": completion,
                "completion_threshold": conditions.completion_threshold,
            }));
            output.anomalies.push(anomaly);
        }
    }

    debug!(
        evaluated_lots,
        stragglers = output.anomalies.len(),
        "批次掉队评估完成"
    );
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rule::RuleKind;
    use crate::domain::types::{AnomalyPriority, PrecedenceClass};
    use crate::rules::test_support::{context, hours_ago, record};

    fn rule() -> (RuleDefinition, LotStragglerConditions) {
        let conditions = LotStragglerConditions {
            completion_threshold: 0.8,
            final_location_types: vec![LocationType::Storage],
            source_location_types: vec![LocationType::Receiving],
            min_lot_size: 2,
        };
        let rule = RuleDefinition::new(
            "straggler",
            RuleKind::LotStraggler(conditions.clone()),
            AnomalyPriority::Low,
            PrecedenceClass::LotFlow,
            30,
        );
        (rule, conditions)
    }

    fn lot(lot_id: &str, stored: usize, receiving: usize) -> Vec<InventoryRecord> {
        let mut records = Vec::new();
        for i in 0..stored {
            let mut r = record(&format!("{}-S{}", lot_id, i), &format!("{:03}A", i + 1), Some(hours_ago(5)));
            r.lot_id = Some(lot_id.to_string());
            records.push(r);
        }
        for i in 0..receiving {
            let mut r = record(&format!("{}-R{}", lot_id, i), "RECV-01", Some(hours_ago(5)));
            r.lot_id = Some(lot_id.to_string());
            records.push(r);
        }
        records
    }

    #[test]
    fn test_nine_of_ten_yields_one_straggler() {
        let ctx = context(lot("L1", 9, 1));
        let (rule, conditions) = rule();
        let output = evaluate(&rule, &conditions, &ctx).unwrap();

        assert_eq!(output.anomalies.len(), 1);
        assert_eq!(output.anomalies[0].record_ids, vec!["L1-R0".to_string()]);
        // (0.9 - 0.8) / 0.2 × 2 = 1
        assert_eq!(output.anomalies[0].priority, AnomalyPriority::Medium);
    }

    #[test]
    fn test_seven_of_ten_yields_nothing() {
        let ctx = context(lot("L1", 7, 3));
        let (rule, conditions) = rule();
        let output = evaluate(&rule, &conditions, &ctx).unwrap();
        assert!(output.anomalies.is_empty());
    }

    #[test]
    fn test_records_without_lot_and_small_lots_are_ignored() {
        let mut records = lot("SOLO", 0, 1);
        records.push(record("NOLOT", "RECV-01", None));
        let ctx = context(records);
        let (rule, conditions) = rule();
        let output = evaluate(&rule, &conditions, &ctx).unwrap();
        assert!(output.anomalies.is_empty());
    }

    #[test]
    fn test_escalation_steps() {
        assert_eq!(escalation_steps(0.8, 0.8), 0);
        assert_eq!(escalation_steps(0.85, 0.8), 0);
        assert_eq!(escalation_steps(0.9, 0.8), 1);
        assert_eq!(escalation_steps(1.0, 0.8), 2);
        assert_eq!(escalation_steps(1.0, 1.0), 0);
    }
}
