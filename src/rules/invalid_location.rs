// ==========================================
// 仓储异常检测引擎 - 无效库位规则
// ==========================================

use crate::domain::anomaly::Anomaly;
use crate::domain::rule::{InvalidLocationConditions, RuleDefinition};
use crate::i18n::t_with_args;
use crate::rules::context::{EvaluationContext, EvaluationOutput};
use crate::rules::error::RuleResult;
use serde_json::json;
use tracing::instrument;

/// 每条位于 INVALID 库位的记录一条异常，携带分类器的拒绝原因
#[instrument(skip_all, fields(rule_id = %rule.id, records = ctx.records.len()))]
pub fn evaluate(
    rule: &RuleDefinition,
    _conditions: &InvalidLocationConditions,
    ctx: &EvaluationContext,
) -> RuleResult<EvaluationOutput> {
    let mut output = EvaluationOutput::default();

    for record in &ctx.records {
        let Some(descriptor) = ctx.descriptor(record).filter(|d| d.is_invalid()) else {
            continue;
        };
        let reason = descriptor
            .rejection_reason
            .as_ref()
            .map(|r| r.render(ctx.locale))
            .unwrap_or_default();
        let reason_code = descriptor.rejection_reason.as_ref().map(|r| r.code());
        let description = t_with_args(
            ctx.locale,
            "anomaly.invalid_location",
            &[
                ("record_id", record.record_id.as_str()),
                ("location", record.location_code.as_str()),
                ("reason", reason.as_str()),
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
        .with_details(json!({
            "rejection_reason": reason,
            "rejection_code": reason_code,
        }));
        output.anomalies.push(anomaly);
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rule::RuleKind;
    use crate::domain::types::{AnomalyPriority, PrecedenceClass};
    use crate::rules::test_support::{context, record};

    #[test]
    fn test_one_anomaly_per_invalid_record() {
        let ctx = context(vec![
            record("A", "999Z", None),
            record("B", "010A", None),
            record("C", "", None),
            record("D", "RECV-01", None),
        ]);
        let conditions = InvalidLocationConditions {};
        let rule = RuleDefinition::new(
            "invalid",
            RuleKind::InvalidLocation(conditions.clone()),
            AnomalyPriority::High,
            PrecedenceClass::LocationValidity,
            10,
        );
        let output = evaluate(&rule, &conditions, &ctx).unwrap();

        assert_eq!(output.anomalies.len(), 2);
        assert_eq!(output.anomalies[0].record_ids, vec!["A".to_string()]);
        let reason = output.anomalies[0].details["rejection_reason"].as_str().unwrap();
        assert!(reason.contains('Z'));
        assert_eq!(output.anomalies[0].details["rejection_code"], "INVALID_LEVEL");
        assert_eq!(output.anomalies[1].record_ids, vec!["C".to_string()]);
        assert_eq!(output.anomalies[1].details["rejection_code"], "EMPTY_CODE");
    }

    #[test]
    fn test_reason_follows_run_locale() {
        let conditions = InvalidLocationConditions {};
        let rule = RuleDefinition::new(
            "invalid",
            RuleKind::InvalidLocation(conditions.clone()),
            AnomalyPriority::High,
            PrecedenceClass::LocationValidity,
            10,
        );

        let zh = evaluate(&rule, &conditions, &context(vec![record("A", "999Z", None)])).unwrap();
        assert!(zh.anomalies[0].description.contains("层级字母"));

        let ctx = context(vec![record("A", "999Z", None)]).with_locale("en");
        let en = evaluate(&rule, &conditions, &ctx).unwrap();
        let description = &en.anomalies[0].description;
        assert!(description.starts_with("Pallet A has invalid location 999Z"));
        assert!(description.contains("level letter 'Z'"));
        assert!(description.chars().all(|c| c.is_ascii()), "{}", description);
    }
}
