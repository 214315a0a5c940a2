// ==========================================
// 仓储异常检测引擎 - 库存记录载入器
// ==========================================
// 流程:
// 1) 文件解析 → 原始表格
// 2) 表头映射（必填列缺失即中止）
// 3) 逐行转换；无法转换的行跳过并记录原因
// ==========================================

use crate::domain::record::InventoryRecord;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::FieldMapper;
use crate::importer::file_parser::{FileParser, RawTable, UniversalFileParser};
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

/// 单行转换失败
#[derive(Debug, Clone, PartialEq)]
pub struct RowRejection {
    pub row_number: usize,
    pub message: String,
}

/// 载入结果
#[derive(Debug, Clone, Default)]
pub struct LoadOutcome {
    pub records: Vec<InventoryRecord>,
    pub rejected_rows: Vec<RowRejection>,
}

// ==========================================
// RecordLoader
// ==========================================
pub struct RecordLoader<P: FileParser = UniversalFileParser> {
    parser: P,
}

impl RecordLoader<UniversalFileParser> {
    pub fn new() -> Self {
        Self {
            parser: UniversalFileParser,
        }
    }
}

impl Default for RecordLoader<UniversalFileParser> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: FileParser> RecordLoader<P> {
    pub fn with_parser(parser: P) -> Self {
        Self { parser }
    }

    /// 从文件载入
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load<T: AsRef<Path>>(&self, path: T) -> ImportResult<LoadOutcome> {
        let table = self.parser.parse_table(path.as_ref())?;
        let outcome = Self::from_table(&table)?;
        info!(
            records = outcome.records.len(),
            rejected = outcome.rejected_rows.len(),
            "记录载入完成"
        );
        Ok(outcome)
    }

    /// 从已解析的原始表格转换
    pub fn from_table(table: &RawTable) -> ImportResult<LoadOutcome> {
        let mapper = FieldMapper::from_headers(&table.headers)?;
        let mut outcome = LoadOutcome::default();

        for row in &table.rows {
            match mapper.map_row(row) {
                Ok(record) => outcome.records.push(record),
                Err(err) => {
                    warn!(row = row.row_number, error = %err, "跳过无法转换的行");
                    outcome.rejected_rows.push(RowRejection {
                        row_number: row.row_number,
                        message: err.to_string(),
                    });
                }
            }
        }

        Ok(outcome)
    }
}

/// 在阻塞线程池中载入（供异步调用方使用）
pub async fn load_records_async(path: PathBuf) -> ImportResult<LoadOutcome> {
    tokio::task::spawn_blocking(move || RecordLoader::new().load(&path))
        .await
        .map_err(|e| ImportError::FileReadError(format!("载入任务失败: {}", e)))?
}
