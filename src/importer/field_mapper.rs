// ==========================================
// 仓储异常检测引擎 - 字段映射器
// ==========================================
// 职责: 源列名 → 标准字段（别名表）+ 类型转换
// 列名比较前统一: 去空白 / 小写 / 空格与连字符转下划线
// ==========================================

use crate::domain::record::InventoryRecord;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::RawRow;

/// 标准字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanonicalField {
    RecordId,
    LocationCode,
    Timestamp,
    LotId,
    Product,
    Quantity,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 6] = [
        CanonicalField::RecordId,
        CanonicalField::LocationCode,
        CanonicalField::Timestamp,
        CanonicalField::LotId,
        CanonicalField::Product,
        CanonicalField::Quantity,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CanonicalField::RecordId => "record_id",
            CanonicalField::LocationCode => "location_code",
            CanonicalField::Timestamp => "timestamp_raw",
            CanonicalField::LotId => "lot_id",
            CanonicalField::Product => "product",
            CanonicalField::Quantity => "quantity",
        }
    }

    /// 可接受的源列名（已标准化）
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            CanonicalField::RecordId => &["record_id", "pallet_id", "pallet", "lpn", "id"],
            CanonicalField::LocationCode => {
                &["location_code", "location", "loc", "bin", "库位", "库位代码"]
            }
            CanonicalField::Timestamp => &[
                "timestamp",
                "timestamp_raw",
                "creation_date",
                "receipt_time",
                "received_at",
                "date",
                "入库时间",
            ],
            CanonicalField::LotId => &["lot_id", "lot", "receipt_number", "batch", "批次号"],
            CanonicalField::Product => &["product", "sku", "description", "item", "产品"],
            CanonicalField::Quantity => &["quantity", "qty", "数量"],
        }
    }

    /// 缺列即致命（批次/数量为可选列）
    pub fn is_required(&self) -> bool {
        !matches!(self, CanonicalField::LotId | CanonicalField::Quantity)
    }
}

fn normalize_header(header: &str) -> String {
    header
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

// ==========================================
// FieldMapper - 表头解析后的列索引
// ==========================================
#[derive(Debug, Clone)]
pub struct FieldMapper {
    columns: [Option<usize>; 6],
}

impl FieldMapper {
    /// 根据表头建立映射；必填列缺失返回 MissingColumns
    pub fn from_headers(headers: &[String]) -> ImportResult<Self> {
        let normalized: Vec<String> = headers.iter().map(|h| normalize_header(h)).collect();

        let mut columns = [None; 6];
        for (slot, field) in columns.iter_mut().zip(CanonicalField::ALL) {
            // 按别名优先级查找，先匹配的别名胜出
            *slot = field
                .aliases()
                .iter()
                .find_map(|alias| normalized.iter().position(|h| h == alias));
        }

        let missing: Vec<String> = CanonicalField::ALL
            .iter()
            .zip(columns.iter())
            .filter(|(field, column)| field.is_required() && column.is_none())
            .map(|(field, _)| field.name().to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ImportError::MissingColumns(missing));
        }

        Ok(Self { columns })
    }

    pub fn column_of(&self, field: CanonicalField) -> Option<usize> {
        let idx = CanonicalField::ALL.iter().position(|f| *f == field)?;
        self.columns[idx]
    }

    fn value<'a>(&self, row: &'a RawRow, field: CanonicalField) -> &'a str {
        self.column_of(field)
            .and_then(|idx| row.values.get(idx))
            .map(|v| v.trim())
            .unwrap_or("")
    }

    /// 原始行 → 标准记录
    pub fn map_row(&self, row: &RawRow) -> ImportResult<InventoryRecord> {
        let mut record = InventoryRecord::new(
            self.value(row, CanonicalField::RecordId),
            self.value(row, CanonicalField::LocationCode),
            self.value(row, CanonicalField::Timestamp),
        );
        record.product = self.value(row, CanonicalField::Product).to_string();
        record.row_number = row.row_number;

        let lot = self.value(row, CanonicalField::LotId);
        if !lot.is_empty() {
            record.lot_id = Some(lot.to_string());
        }

        let quantity = self.value(row, CanonicalField::Quantity);
        if !quantity.is_empty() {
            record.quantity =
                quantity
                    .replace(',', "")
                    .parse::<f64>()
                    .map_err(|_| ImportError::TypeConversionError {
                        row: row.row_number,
                        field: CanonicalField::Quantity.name().to_string(),
                        message: format!("无法解析为数值: {}", quantity),
                    })?;
        }

        Ok(record)
    }
}
