// ==========================================
// 仓储异常检测引擎 - 数据完整性规则
// ==========================================
// 检查项:
// (a) 同一 record_id 出现在不同库位
// (b) 必填字段缺失
// (c) 不可能的时间（晚于 参照时间+容差 / 早于合理最早年份）
// (d) 数量为负
// 同一记录的多项问题合并为一条异常（同一优先类别内只会保留一条）
// ==========================================

use crate::domain::anomaly::Anomaly;
use crate::domain::record::InventoryRecord;
use crate::domain::rule::{IntegrityConditions, RuleDefinition};
use crate::dates::MAX_FUTURE_TOLERANCE_HOURS;
use crate::i18n::t_with_args;
use crate::location::normalize_code;
use crate::rules::context::{EvaluationContext, EvaluationOutput};
use crate::rules::error::{RuleError, RuleResult};
use chrono::{Datelike, NaiveDateTime, TimeDelta};
use serde_json::json;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, instrument};

#[derive(Debug, Clone, PartialEq)]
enum Issue {
    DuplicateId { locations: Vec<String> },
    MissingFields { fields: Vec<&'static str> },
    FutureTimestamp { value: String },
    TooOld { value: String, min_year: i32 },
    NegativeQuantity { quantity: f64 },
}

impl Issue {
    fn code(&self) -> &'static str {
        match self {
            Issue::DuplicateId { .. } => "DUPLICATE_ID",
            Issue::MissingFields { .. } => "MISSING_FIELDS",
            Issue::FutureTimestamp { .. } => "FUTURE_TIMESTAMP",
            Issue::TooOld { .. } => "TOO_OLD_TIMESTAMP",
            Issue::NegativeQuantity { .. } => "NEGATIVE_QUANTITY",
        }
    }

    fn message(&self, locale: &str) -> String {
        match self {
            Issue::DuplicateId { locations } => t_with_args(
                locale,
                "integrity.duplicate_id",
                &[("locations", locations.join(", ").as_str())],
            ),
            Issue::MissingFields { fields } => t_with_args(
                locale,
                "integrity.missing_fields",
                &[("fields", fields.join(", ").as_str())],
            ),
            Issue::FutureTimestamp { value } => t_with_args(
                locale,
                "integrity.future_timestamp",
                &[("value", value.as_str())],
            ),
            Issue::TooOld { value, min_year } => t_with_args(
                locale,
                "integrity.too_old_timestamp",
                &[("value", value.as_str()), ("year", &min_year.to_string())],
            ),
            Issue::NegativeQuantity { quantity } => t_with_args(
                locale,
                "integrity.negative_quantity",
                &[("quantity", &quantity.to_string())],
            ),
        }
    }
}

struct SubjectIssues {
    location: String,
    issues: Vec<Issue>,
}

pub fn validate(rule_id: &str, conditions: &IntegrityConditions) -> RuleResult<()> {
    let hours = conditions.future_tolerance_hours;
    if !hours.is_finite() || hours < 0.0 || hours > MAX_FUTURE_TOLERANCE_HOURS as f64 {
        return Err(RuleError::invalid(
            rule_id,
            format!(
                "future_tolerance_hours 必须在 0..={} 之间，当前 {}",
                MAX_FUTURE_TOLERANCE_HOURS, hours
            ),
        ));
    }
    Ok(())
}

/// 未来时间上限: 参照时间 + 容差；溢出时视为无上限
fn future_limit(reference_time: NaiveDateTime, tolerance_hours: f64) -> Option<NaiveDateTime> {
    TimeDelta::try_seconds((tolerance_hours * 3600.0) as i64)
        .and_then(|tolerance| reference_time.checked_add_signed(tolerance))
}

/// 记录主体键: record_id 为空时退回行号
fn subject_key(record: &InventoryRecord) -> String {
    let id = record.record_id.trim();
    if id.is_empty() {
        format!("#row-{}", record.row_number)
    } else {
        id.to_string()
    }
}

#[instrument(skip_all, fields(rule_id = %rule.id, records = ctx.records.len()))]
pub fn evaluate(
    rule: &RuleDefinition,
    conditions: &IntegrityConditions,
    ctx: &EvaluationContext,
) -> RuleResult<EvaluationOutput> {
    validate(&rule.id, conditions)?;

    // (a) 重复 id → 出现过的不同库位
    let mut duplicates: HashMap<&str, BTreeSet<String>> = HashMap::new();
    if conditions.check_duplicates {
        let mut locations_by_id: HashMap<&str, BTreeSet<String>> = HashMap::new();
        for record in &ctx.records {
            let id = record.record_id.trim();
            if id.is_empty() {
                continue;
            }
            locations_by_id
                .entry(id)
                .or_default()
                .insert(normalize_code(&record.location_code));
        }
        duplicates = locations_by_id
            .into_iter()
            .filter(|(_, locations)| locations.len() > 1)
            .collect();
    }

    let future_limit = future_limit(ctx.reference_time, conditions.future_tolerance_hours);

    let mut order: Vec<String> = Vec::new();
    let mut subjects: HashMap<String, SubjectIssues> = HashMap::new();

    for record in &ctx.records {
        let key = subject_key(record);
        let mut issues = Vec::new();

        if let Some(locations) = duplicates.get(record.record_id.trim()) {
            let already_reported = subjects
                .get(&key)
                .map(|s| s.issues.iter().any(|i| matches!(i, Issue::DuplicateId { .. })))
                .unwrap_or(false);
            if !already_reported {
                issues.push(Issue::DuplicateId {
                    locations: locations.iter().cloned().collect(),
                });
            }
        }

        if conditions.check_missing_fields {
            let fields = record.missing_required_fields();
            if !fields.is_empty() {
                issues.push(Issue::MissingFields { fields });
            }
        }

        if conditions.check_impossible_values {
            if let Some(ts) = record.parsed_timestamp {
                if future_limit.is_some_and(|limit| ts > limit) {
                    issues.push(Issue::FutureTimestamp {
                        value: ts.to_string(),
                    });
                } else if ts.year() < conditions.min_year {
                    issues.push(Issue::TooOld {
                        value: ts.to_string(),
                        min_year: conditions.min_year,
                    });
                }
            }
            if record.quantity < 0.0 {
                issues.push(Issue::NegativeQuantity {
                    quantity: record.quantity,
                });
            }
        }

        if issues.is_empty() {
            continue;
        }
        subjects
            .entry(key.clone())
            .or_insert_with(|| {
                order.push(key);
                SubjectIssues {
                    location: normalize_code(&record.location_code),
                    issues: Vec::new(),
                }
            })
            .issues
            .extend(issues);
    }

    let mut output = EvaluationOutput::default();
    for key in order {
        let Some(subject) = subjects.remove(&key) else {
            continue;
        };
        let messages: Vec<String> = subject
            .issues
            .iter()
            .map(|issue| issue.message(ctx.locale))
            .collect();
        let codes: Vec<&str> = subject.issues.iter().map(Issue::code).collect();
        let description = t_with_args(
            ctx.locale,
            "anomaly.integrity",
            &[
                ("record_id", key.as_str()),
                ("issues", messages.join("; ").as_str()),
            ],
        );
        let anomaly = Anomaly::for_record(
            rule,
            output.anomalies.len(),
            &key,
            &subject.location,
            description,
            ctx.reference_time,
        )
        .with_details(json!({ "issues": codes }));
        output.anomalies.push(anomaly);
    }

    debug!(
        duplicate_ids = duplicates.len(),
        flagged = output.anomalies.len(),
        "完整性评估完成"
    );
    Ok(output)
}
