// ==========================================
// 仓储异常检测引擎 - 时间格式画像
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ==========================================
// DateFormatType - 时间列编码类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DateFormatType {
    SerialNumeric,  // 表格日序号（1899-12-30 起算）
    UnixEpoch,      // Unix 秒 / 毫秒
    CompactNumeric, // YYYYMMDDHHMMSS / YYYYMMDD
    Iso8601,        // YYYY-MM-DD[...]
    SlashAmbiguous, // 分隔符日期（欧式/美式待定）
    FreeText,       // 自由文本
    Mixed,          // 混合编码
    Unknown,        // 无法识别
}

impl fmt::Display for DateFormatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DateFormatType::SerialNumeric => "SERIAL_NUMERIC",
            DateFormatType::UnixEpoch => "UNIX_EPOCH",
            DateFormatType::CompactNumeric => "COMPACT_NUMERIC",
            DateFormatType::Iso8601 => "ISO8601",
            DateFormatType::SlashAmbiguous => "SLASH_AMBIGUOUS",
            DateFormatType::FreeText => "FREE_TEXT",
            DateFormatType::Mixed => "MIXED",
            DateFormatType::Unknown => "UNKNOWN",
        };
        write!(f, "{}", s)
    }
}

// ==========================================
// ParsingStrategy - 解析策略（每种一条确定性规则）
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParsingStrategy {
    SerialDays,       // 起算日 + 天数 + 小数天
    UnixSeconds,      // 秒
    UnixMillis,       // 毫秒
    CompactDateTime,  // 14 位定宽切片
    CompactDate,      // 8 位定宽切片
    IsoFormat,        // ISO 显式格式串
    DayFirst,         // 日/月/年（欧式）
    MonthFirst,       // 月/日/年（美式）
    YearFirst,        // 年/月/日
    Flexible,         // 通用宽松解析
    PerValue,         // 混合列逐值识别
    None,             // 无可用策略
}

impl fmt::Display for ParsingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ParsingStrategy::SerialDays => "SERIAL_DAYS",
            ParsingStrategy::UnixSeconds => "UNIX_SECONDS",
            ParsingStrategy::UnixMillis => "UNIX_MILLIS",
            ParsingStrategy::CompactDateTime => "COMPACT_DATE_TIME",
            ParsingStrategy::CompactDate => "COMPACT_DATE",
            ParsingStrategy::IsoFormat => "ISO_FORMAT",
            ParsingStrategy::DayFirst => "DAY_FIRST",
            ParsingStrategy::MonthFirst => "MONTH_FIRST",
            ParsingStrategy::YearFirst => "YEAR_FIRST",
            ParsingStrategy::Flexible => "FLEXIBLE",
            ParsingStrategy::PerValue => "PER_VALUE",
            ParsingStrategy::None => "NONE",
        };
        write!(f, "{}", s)
    }
}

// ==========================================
// DateFormatProfile - 检测结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateFormatProfile {
    pub format_type: DateFormatType,

    /// 置信度 0~1
    pub confidence: f64,

    pub parsing_strategy: ParsingStrategy,

    /// 抽样值（最多 10 个，供前端展示）
    pub sample_values: Vec<String>,

    /// 抽样中无法识别的数量
    pub unparseable_count: usize,

    /// 抽样总数
    #[serde(default)]
    pub sampled_count: usize,

    /// 各策略得票（键为策略名）
    #[serde(default)]
    pub strategy_counts: BTreeMap<String, usize>,

    /// 分隔符日期的列级顺序判定（混合列逐值解析时沿用）
    #[serde(default)]
    pub delimited_order: Option<ParsingStrategy>,
}

impl DateFormatProfile {
    /// 空列画像
    pub fn empty() -> Self {
        Self {
            format_type: DateFormatType::Unknown,
            confidence: 0.0,
            parsing_strategy: ParsingStrategy::None,
            sample_values: Vec::new(),
            unparseable_count: 0,
            sampled_count: 0,
            strategy_counts: BTreeMap::new(),
            delimited_order: None,
        }
    }
}

// ==========================================
// DateQualityReport - 解析质量
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateQualityReport {
    pub total_values: usize,
    pub parsed_count: usize,
    pub failed_count: usize,
    pub success_rate: f64,
    pub min_date: Option<NaiveDateTime>,
    pub max_date: Option<NaiveDateTime>,
    pub future_count: usize,
    pub too_old_count: usize,
    pub outlier_count: usize,
    pub warnings: Vec<String>,
}
