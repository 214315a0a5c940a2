// ==========================================
// 仓储异常检测引擎 - 导入层
// ==========================================
// 职责: 外部文件 → 标准库存记录
// 支持: Excel, CSV
// 红线: 导入层不解析时间，原始时间串原样交给引擎
// ==========================================

pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod record_loader;

pub use error::{ImportError, ImportResult};
pub use field_mapper::{CanonicalField, FieldMapper};
pub use file_parser::{CsvParser, ExcelParser, FileParser, RawRow, RawTable, UniversalFileParser};
pub use record_loader::{load_records_async, LoadOutcome, RecordLoader, RowRejection};
