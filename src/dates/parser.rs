// ==========================================
// 仓储异常检测引擎 - 时间解析器
// ==========================================
// 按画像策略逐值转换；失败得到 None，绝不回填哨兵日期
// 同一原始值只解析一次（按去重值缓存）
// ==========================================

use crate::dates::detector::order_for_strategy;
use crate::dates::free_text;
use crate::dates::shape::{self, DelimitedOrder, ValueShape};
use crate::domain::date_profile::{DateFormatProfile, ParsingStrategy};
use chrono::NaiveDateTime;
use std::collections::HashMap;

/// 失败样例保留数
const MAX_FAILED_SAMPLES: usize = 10;

// ==========================================
// ParseOutcome - 整列解析结果
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutcome {
    /// 与输入一一对应
    pub values: Vec<Option<NaiveDateTime>>,
    pub parsed_count: usize,
    pub failed_count: usize,
    pub empty_count: usize,

    /// parsed / 非空值数；全空列为 0
    pub success_rate: f64,

    /// 去重后的失败原始值（最多 10 个）
    pub failed_samples: Vec<String>,
}

pub struct DateParser;

impl DateParser {
    /// 解析整列
    pub fn parse<S: AsRef<str>>(values: &[S], profile: &DateFormatProfile) -> ParseOutcome {
        let mut cache: HashMap<&str, Option<NaiveDateTime>> = HashMap::new();
        let mut parsed_values = Vec::with_capacity(values.len());
        let mut parsed_count = 0usize;
        let mut failed_count = 0usize;
        let mut empty_count = 0usize;
        let mut failed_samples: Vec<String> = Vec::new();

        for raw in values {
            let value = raw.as_ref().trim();
            if value.is_empty() {
                empty_count += 1;
                parsed_values.push(None);
                continue;
            }

            let parsed = *cache
                .entry(value)
                .or_insert_with(|| Self::parse_value(value, profile));

            match parsed {
                Some(_) => parsed_count += 1,
                None => {
                    failed_count += 1;
                    if failed_samples.len() < MAX_FAILED_SAMPLES
                        && !failed_samples.iter().any(|s| s == value)
                    {
                        failed_samples.push(value.to_string());
                    }
                }
            }
            parsed_values.push(parsed);
        }

        let non_empty = parsed_count + failed_count;
        let success_rate = if non_empty == 0 {
            0.0
        } else {
            parsed_count as f64 / non_empty as f64
        };

        ParseOutcome {
            values: parsed_values,
            parsed_count,
            failed_count,
            empty_count,
            success_rate,
            failed_samples,
        }
    }

    /// 按画像策略解析单个值
    pub fn parse_value(raw: &str, profile: &DateFormatProfile) -> Option<NaiveDateTime> {
        let value = raw.trim();
        if value.is_empty() {
            return None;
        }

        match profile.parsing_strategy {
            ParsingStrategy::SerialDays => value
                .parse::<f64>()
                .ok()
                .and_then(shape::serial_to_datetime),
            ParsingStrategy::UnixSeconds => value
                .parse::<i64>()
                .ok()
                .and_then(shape::unix_seconds_to_datetime),
            ParsingStrategy::UnixMillis => value
                .parse::<i64>()
                .ok()
                .and_then(shape::unix_millis_to_datetime),
            ParsingStrategy::CompactDateTime | ParsingStrategy::CompactDate => {
                shape::compact_to_datetime(value)
            }
            ParsingStrategy::IsoFormat => shape::iso_to_datetime(value),
            ParsingStrategy::DayFirst => shape::delimited_to_datetime(value, DelimitedOrder::DayFirst),
            ParsingStrategy::MonthFirst => {
                shape::delimited_to_datetime(value, DelimitedOrder::MonthFirst)
            }
            ParsingStrategy::YearFirst => shape::delimited_to_datetime(value, DelimitedOrder::YearFirst),
            ParsingStrategy::Flexible => free_text::parse_flexible(value),
            ParsingStrategy::PerValue => Self::parse_per_value(value, profile),
            ParsingStrategy::None => None,
        }
    }

    /// 混合列: 逐值识别形态后转换
    fn parse_per_value(value: &str, profile: &DateFormatProfile) -> Option<NaiveDateTime> {
        match shape::shape_of(value)? {
            ValueShape::Serial(serial) => shape::serial_to_datetime(serial),
            ValueShape::UnixSeconds(secs) => shape::unix_seconds_to_datetime(secs),
            ValueShape::UnixMillis(millis) => shape::unix_millis_to_datetime(millis),
            ValueShape::CompactDateTime | ValueShape::CompactDate => shape::compact_to_datetime(value),
            ValueShape::Iso => shape::iso_to_datetime(value),
            ValueShape::Delimited(groups) => {
                // 优先沿用列级顺序，失败再按单值判定
                let column_order = profile.delimited_order.and_then(order_for_strategy);
                let value_order = if groups.first_width == 4 {
                    DelimitedOrder::YearFirst
                } else if groups.first > 12 {
                    DelimitedOrder::DayFirst
                } else {
                    DelimitedOrder::MonthFirst
                };
                column_order
                    .and_then(|order| shape::delimited_to_datetime(value, order))
                    .or_else(|| shape::delimited_to_datetime(value, value_order))
            }
            ValueShape::FreeText => free_text::parse_flexible(value),
        }
    }
}
