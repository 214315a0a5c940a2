// ==========================================
// 测试数据构建器 - 库存记录
// ==========================================

use chrono::{Duration, NaiveDate, NaiveDateTime};
use warehouse_rule_engine::InventoryRecord;

/// 所有集成测试共用的参考时间: 2024-06-01 12:00:00
pub fn reference_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

/// 参考时间前 N 分钟（ISO 文本）
pub fn minutes_ago(minutes: i64) -> String {
    (reference_time() - Duration::minutes(minutes))
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

pub fn hours_ago(hours: i64) -> String {
    minutes_ago(hours * 60)
}

/// 货架位代码: 001A, 002A, ...
pub fn storage_code(position: usize) -> String {
    format!("{:03}A", position)
}

// ==========================================
// RecordBuilder
// ==========================================
pub struct RecordBuilder {
    record: InventoryRecord,
}

impl RecordBuilder {
    /// 默认: 货架位 001A、1 小时前入位、产品 SKU-1
    pub fn new(record_id: &str) -> Self {
        let mut record = InventoryRecord::new(record_id, "001A", hours_ago(1));
        record.product = "SKU-1".to_string();
        Self { record }
    }

    pub fn location(mut self, code: &str) -> Self {
        self.record.location_code = code.to_string();
        self
    }

    pub fn minutes_ago(mut self, minutes: i64) -> Self {
        self.record.timestamp_raw = minutes_ago(minutes);
        self
    }

    pub fn hours_ago(mut self, hours: i64) -> Self {
        self.record.timestamp_raw = hours_ago(hours);
        self
    }

    pub fn timestamp_raw(mut self, raw: &str) -> Self {
        self.record.timestamp_raw = raw.to_string();
        self
    }

    pub fn lot(mut self, lot_id: &str) -> Self {
        self.record.lot_id = Some(lot_id.to_string());
        self
    }

    pub fn product(mut self, product: &str) -> Self {
        self.record.product = product.to_string();
        self
    }

    pub fn quantity(mut self, quantity: f64) -> Self {
        self.record.quantity = quantity;
        self
    }

    pub fn build(self) -> InventoryRecord {
        self.record
    }
}

/// 按顺序回填行号（从 1 开始）
pub fn numbered(mut records: Vec<InventoryRecord>) -> Vec<InventoryRecord> {
    for (idx, record) in records.iter_mut().enumerate() {
        record.row_number = idx + 1;
    }
    records
}
