// ==========================================
// 仓储异常检测引擎 - 区域滞留规则
// ==========================================
// 库位类型命中且 (参照时间 - 入位时间) 超过阈值 → 滞留
// 时间未解析的记录跳过并单独计数，不当作“现在”或“纪元零点”
// ==========================================

use crate::domain::anomaly::Anomaly;
use crate::domain::rule::{RuleDefinition, TimeInAreaConditions};
use crate::i18n::t_with_args;
use crate::rules::context::{EvaluationContext, EvaluationOutput};
use crate::rules::error::{RuleError, RuleResult};
use serde_json::json;
use tracing::instrument;

pub fn validate(rule_id: &str, conditions: &TimeInAreaConditions) -> RuleResult<()> {
    if !conditions.threshold_hours.is_finite() || conditions.threshold_hours <= 0.0 {
        return Err(RuleError::invalid(
            rule_id,
            format!("threshold_hours 必须为正数，当前 {}", conditions.threshold_hours),
        ));
    }
    Ok(())
}

#[instrument(skip_all, fields(rule_id = %rule.id, records = ctx.records.len()))]
pub fn evaluate(
    rule: &RuleDefinition,
    conditions: &TimeInAreaConditions,
    ctx: &EvaluationContext,
) -> RuleResult<EvaluationOutput> {
    validate(&rule.id, conditions)?;

    let mut output = EvaluationOutput::default();
    let threshold = conditions.threshold_hours;

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

        let Some(arrived_at) = record.parsed_timestamp else {
            output.skipped_unparsed += 1;
            continue;
        };

        let dwell_hours = (ctx.reference_time - arrived_at).num_seconds() as f64 / 3600.0;
        if dwell_hours <= threshold {
            continue;
        }

        // 超过两倍阈值抬升一级
        let steps = if dwell_hours >= threshold * 2.0 { 1 } else { 0 };
        let dwell_text = format!("{:.1}", dwell_hours);
        let description = t_with_args(
            ctx.locale,
            "anomaly.time_in_area",
            &[
                ("record_id", record.record_id.as_str()),
                ("location", descriptor.code.as_str()),
                ("location_type", &descriptor.location_type.to_string()),
                ("hours", dwell_text.as_str()),
                ("threshold", &threshold.to_string()),
            ],
        );

        let anomaly = Anomaly::for_record(
            rule,
            output.anomalies.len(),
            &record.record_id,
            &descriptor.code,
            description,
            ctx.reference_time,
        )
        .with_priority(rule.priority.escalate(steps))
        .with_details(json!({
            "dwell_hours": dwell_hours,
            "threshold_hours": threshold,
            "location_type": descriptor.location_type,
            "arrived_at": arrived_at,
        }));
        output.anomalies.push(anomaly);
    }

    Ok(output)
}
