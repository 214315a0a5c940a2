// ==========================================
// 仓储异常检测引擎 - 异常对象
// ==========================================
// 由规则评估器产出，经优先级裁决后进入报告
// ==========================================

use crate::domain::rule::RuleDefinition;
use crate::domain::types::{AnomalyCategory, AnomalyPriority, PrecedenceClass};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// AnomalySubject - 裁决主体
// ==========================================
// 记录级异常以 record_id 占位; 库位级汇总异常以库位代码占位
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "scope", content = "key", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnomalySubject {
    Record(String),
    Location(String),
}

impl fmt::Display for AnomalySubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnomalySubject::Record(id) => write!(f, "record:{}", id),
            AnomalySubject::Location(code) => write!(f, "location:{}", code),
        }
    }
}

// ==========================================
// Anomaly - 单条异常
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    /// 稳定 ID: {rule_id}:{subject}:{序号}
    pub id: String,

    pub rule_id: String,

    /// 涉及的记录
    pub record_ids: Vec<String>,

    pub location_code: String,

    pub priority: AnomalyPriority,

    pub category: AnomalyCategory,

    pub description: String,

    pub detected_at: NaiveDateTime,

    pub subject: AnomalySubject,

    pub precedence_class: PrecedenceClass,

    pub precedence_level: u32,

    /// 超额数量（仅库位级超容）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excess_count: Option<usize>,

    /// 评估器附加指标
    #[serde(default)]
    pub details: serde_json::Value,
}

impl Anomaly {
    /// 记录级异常
    pub fn for_record(
        rule: &RuleDefinition,
        sequence: usize,
        record_id: &str,
        location_code: &str,
        description: String,
        detected_at: NaiveDateTime,
    ) -> Self {
        let subject = AnomalySubject::Record(record_id.to_string());
        Self {
            id: format!("{}:{}:{}", rule.id, subject, sequence),
            rule_id: rule.id.clone(),
            record_ids: vec![record_id.to_string()],
            location_code: location_code.to_string(),
            priority: rule.priority,
            category: rule.kind.category(),
            description,
            detected_at,
            subject,
            precedence_class: rule.precedence_class,
            precedence_level: rule.precedence_level,
            excess_count: None,
            details: serde_json::Value::Null,
        }
    }

    /// 库位级汇总异常
    pub fn for_location(
        rule: &RuleDefinition,
        sequence: usize,
        location_code: &str,
        record_ids: Vec<String>,
        description: String,
        detected_at: NaiveDateTime,
    ) -> Self {
        let subject = AnomalySubject::Location(location_code.to_string());
        Self {
            id: format!("{}:{}:{}", rule.id, subject, sequence),
            rule_id: rule.id.clone(),
            record_ids,
            location_code: location_code.to_string(),
            priority: rule.priority,
            category: rule.kind.category(),
            description,
            detected_at,
            subject,
            precedence_class: rule.precedence_class,
            precedence_level: rule.precedence_level,
            excess_count: None,
            details: serde_json::Value::Null,
        }
    }

    pub fn with_priority(mut self, priority: AnomalyPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }

    pub fn with_excess_count(mut self, excess: usize) -> Self {
        self.excess_count = Some(excess);
        self
    }

    /// 裁决键
    pub fn claim_key(&self) -> (AnomalySubject, PrecedenceClass) {
        (self.subject.clone(), self.precedence_class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rule::{InvalidLocationConditions, RuleKind};
    use chrono::NaiveDate;

    fn rule() -> RuleDefinition {
        RuleDefinition::new(
            "invalid-loc",
            RuleKind::InvalidLocation(InvalidLocationConditions {}),
            AnomalyPriority::High,
            PrecedenceClass::LocationValidity,
            10,
        )
    }

    #[test]
    fn test_for_record_copies_rule_attributes() {
        let at = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let anomaly = Anomaly::for_record(&rule(), 0, "P001", "999Z", "bad".to_string(), at);

        assert_eq!(anomaly.id, "invalid-loc:record:P001:0");
        assert_eq!(anomaly.category, AnomalyCategory::InvalidLocation);
        assert_eq!(anomaly.precedence_level, 10);
        assert_eq!(
            anomaly.claim_key(),
            (
                AnomalySubject::Record("P001".to_string()),
                PrecedenceClass::LocationValidity
            )
        );
    }
}
