// ==========================================
// 仓储异常检测引擎 - 库存记录
// ==========================================
// 一行 = 一个被追踪的单元（托盘/箱/件）
// 红线: 载入后不可变; 时间解析结果由引擎一次性回填
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 必填字段（缺失即为数据完整性问题）
pub const REQUIRED_FIELDS: [&str; 4] = ["record_id", "location_code", "timestamp_raw", "product"];

// ==========================================
// InventoryRecord - 库存快照中的一行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryRecord {
    /// 单元标识（托盘号 / LPN）
    pub record_id: String,

    /// 库位代码（原样保留，分类时再标准化）
    pub location_code: String,

    /// 原始时间字符串
    pub timestamp_raw: String,

    /// 解析后的时间（None = 未能解析，不得视为 now 或 epoch）
    #[serde(default)]
    pub parsed_timestamp: Option<NaiveDateTime>,

    /// 批次 / 收货单号
    #[serde(default)]
    pub lot_id: Option<String>,

    /// 产品描述
    #[serde(default)]
    pub product: String,

    /// 数量
    #[serde(default)]
    pub quantity: f64,

    /// 源文件行号（从 1 开始，仅用于诊断与稳定排序）
    #[serde(default)]
    pub row_number: usize,
}

impl InventoryRecord {
    pub fn new(
        record_id: impl Into<String>,
        location_code: impl Into<String>,
        timestamp_raw: impl Into<String>,
    ) -> Self {
        Self {
            record_id: record_id.into(),
            location_code: location_code.into(),
            timestamp_raw: timestamp_raw.into(),
            parsed_timestamp: None,
            lot_id: None,
            product: String::new(),
            quantity: 1.0,
            row_number: 0,
        }
    }

    /// 返回回填了解析时间的新记录（原记录不变）
    pub fn with_parsed_timestamp(&self, parsed: Option<NaiveDateTime>) -> Self {
        let mut record = self.clone();
        record.parsed_timestamp = parsed;
        record
    }

    /// 有效批次号（空白视为无批次）
    pub fn lot(&self) -> Option<&str> {
        self.lot_id
            .as_deref()
            .map(str::trim)
            .filter(|lot| !lot.is_empty())
    }

    /// 缺失的必填字段列表
    pub fn missing_required_fields(&self) -> Vec<&'static str> {
        let values = [
            &self.record_id,
            &self.location_code,
            &self.timestamp_raw,
            &self.product,
        ];
        REQUIRED_FIELDS
            .iter()
            .zip(values)
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(field, _)| *field)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_missing_required_fields() {
        let mut record = InventoryRecord::new("P001", "  ", "2024-01-05");
        record.product = "Widget".to_string();

        assert_eq!(record.missing_required_fields(), vec!["location_code"]);
    }

    #[test]
    fn test_lot_blank_is_none() {
        let mut record = InventoryRecord::new("P001", "001A", "2024-01-05");
        record.lot_id = Some("   ".to_string());
        assert_eq!(record.lot(), None);

        record.lot_id = Some(" R-100 ".to_string());
        assert_eq!(record.lot(), Some("R-100"));
    }

    #[test]
    fn test_with_parsed_timestamp_keeps_original() {
        let record = InventoryRecord::new("P001", "001A", "2024-01-05");
        let ts = NaiveDate::from_ymd_opt(2024, 1, 5)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();

        let parsed = record.with_parsed_timestamp(Some(ts));

        assert!(record.parsed_timestamp.is_none());
        assert_eq!(parsed.parsed_timestamp, Some(ts));
    }
}
