// ==========================================
// 仓储异常检测引擎 - 时间格式检测与解析
// ==========================================
// detect: 抽样推断列级编码
// parse: 按策略逐值转换（失败为 None）
// validate: 解析质量统计
// ==========================================

pub mod detector;
pub mod free_text;
pub mod parser;
pub mod quality;
pub mod shape;

pub use detector::{DateFormatDetector, DetectorSettings};
pub use parser::{DateParser, ParseOutcome};
pub use quality::{validate, QualitySettings, MAX_FUTURE_TOLERANCE_HOURS};
