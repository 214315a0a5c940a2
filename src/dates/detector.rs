// ==========================================
// 仓储异常检测引擎 - 时间格式检测器
// ==========================================
// 抽样 → 逐值识别形态 → 策略投票 → 多数判定
// 多数策略覆盖率不足阈值时判为 MIXED（逐值解析）
// ==========================================

use crate::dates::shape::{self, DelimitedGroups, DelimitedOrder, ValueShape};
use crate::domain::date_profile::{DateFormatProfile, DateFormatType, ParsingStrategy};
use std::collections::BTreeMap;
use tracing::debug;

/// 默认抽样数
pub const DEFAULT_SAMPLE_SIZE: usize = 200;

/// 多数策略最低覆盖率
pub const MAJORITY_THRESHOLD: f64 = 0.7;

/// 欧美顺序无法区分时的置信度惩罚
pub const AMBIGUOUS_ORDER_PENALTY: f64 = 0.85;

/// MIXED 画像的置信度折扣
const MIXED_CONFIDENCE_FACTOR: f64 = 0.5;

/// 画像中保留的样例数
const MAX_SAMPLE_VALUES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorSettings {
    pub sample_size: usize,
    pub majority_threshold: f64,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_SIZE,
            majority_threshold: MAJORITY_THRESHOLD,
        }
    }
}

// ==========================================
// DateFormatDetector
// ==========================================
pub struct DateFormatDetector {
    settings: DetectorSettings,
}

impl DateFormatDetector {
    pub fn new(settings: DetectorSettings) -> Self {
        Self { settings }
    }

    /// 检测时间列的编码格式
    ///
    /// # 参数
    /// - values: 原始时间列（空白值不参与抽样）
    pub fn detect<S: AsRef<str>>(&self, values: &[S]) -> DateFormatProfile {
        let sample = self.sample(values);
        if sample.is_empty() {
            return DateFormatProfile::empty();
        }

        let mut votes: BTreeMap<ParsingStrategy, usize> = BTreeMap::new();
        let mut delimited: Vec<(&str, DelimitedGroups)> = Vec::new();
        let mut unparseable = 0usize;

        for value in &sample {
            match shape::shape_of(value) {
                Some(ValueShape::Serial(_)) => *votes.entry(ParsingStrategy::SerialDays).or_default() += 1,
                Some(ValueShape::UnixSeconds(_)) => {
                    *votes.entry(ParsingStrategy::UnixSeconds).or_default() += 1
                }
                Some(ValueShape::UnixMillis(_)) => {
                    *votes.entry(ParsingStrategy::UnixMillis).or_default() += 1
                }
                Some(ValueShape::CompactDateTime) => {
                    *votes.entry(ParsingStrategy::CompactDateTime).or_default() += 1
                }
                Some(ValueShape::CompactDate) => {
                    *votes.entry(ParsingStrategy::CompactDate).or_default() += 1
                }
                Some(ValueShape::Iso) => *votes.entry(ParsingStrategy::IsoFormat).or_default() += 1,
                Some(ValueShape::Delimited(groups)) => delimited.push((value, groups)),
                Some(ValueShape::FreeText) => *votes.entry(ParsingStrategy::Flexible).or_default() += 1,
                None => unparseable += 1,
            }
        }

        // 分隔符日期: 先定列级顺序，再按该顺序实际可转换的值计票
        let resolution = resolve_delimited_order(delimited.iter().map(|(_, g)| *g));
        if let Some((order, _)) = resolution {
            let strategy = strategy_for_order(order);
            let mut converted = 0usize;
            for (value, _) in &delimited {
                if shape::delimited_to_datetime(value, order).is_some() {
                    converted += 1;
                } else if !delimited_value_converts_any_order(value) {
                    unparseable += 1;
                }
            }
            if converted > 0 {
                *votes.entry(strategy).or_default() += converted;
            }
        }

        let sampled_count = sample.len();
        let parseable = sampled_count - unparseable;
        let strategy_counts: BTreeMap<String, usize> =
            votes.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        let sample_values: Vec<String> = sample
            .iter()
            .take(MAX_SAMPLE_VALUES)
            .map(|v| v.to_string())
            .collect();
        let delimited_order = resolution.map(|(order, _)| strategy_for_order(order));

        // 得票最多的策略（票数相同取优先级靠前者）
        let best = votes
            .iter()
            .max_by(|(sa, ca), (sb, cb)| ca.cmp(cb).then_with(|| sb.cmp(sa)))
            .map(|(s, c)| (*s, *c));

        let (format_type, parsing_strategy, confidence) = match best {
            None => (DateFormatType::Unknown, ParsingStrategy::None, 0.0),
            Some((strategy, count)) => {
                let coverage = count as f64 / sampled_count as f64;
                if coverage >= self.settings.majority_threshold {
                    let penalty = match resolution {
                        Some((order, penalized)) if strategy_for_order(order) == strategy && penalized => {
                            AMBIGUOUS_ORDER_PENALTY
                        }
                        _ => 1.0,
                    };
                    (format_type_for(strategy), strategy, coverage * penalty)
                } else {
                    let parseable_ratio = parseable as f64 / sampled_count as f64;
                    (
                        DateFormatType::Mixed,
                        ParsingStrategy::PerValue,
                        parseable_ratio * MIXED_CONFIDENCE_FACTOR,
                    )
                }
            }
        };

        debug!(
            format_type = %format_type,
            strategy = %parsing_strategy,
            confidence,
            sampled_count,
            unparseable,
            "时间格式检测完成"
        );

        DateFormatProfile {
            format_type,
            confidence,
            parsing_strategy,
            sample_values,
            unparseable_count: unparseable,
            sampled_count,
            strategy_counts,
            delimited_order,
        }
    }

    /// 等距抽样（跳过空白值）
    fn sample<'a, S: AsRef<str>>(&self, values: &'a [S]) -> Vec<&'a str> {
        let non_empty: Vec<&str> = values
            .iter()
            .map(|v| v.as_ref().trim())
            .filter(|v| !v.is_empty())
            .collect();

        let limit = self.settings.sample_size.max(1);
        if non_empty.len() <= limit {
            return non_empty;
        }
        (0..limit)
            .map(|i| non_empty[i * non_empty.len() / limit])
            .collect()
    }
}

impl Default for DateFormatDetector {
    fn default() -> Self {
        Self::new(DetectorSettings::default())
    }
}

/// 列级判定分隔符日期顺序
///
/// # 返回
/// - (顺序, 是否需要置信度惩罚)；无分隔符样本时为 None
pub fn resolve_delimited_order<I>(groups: I) -> Option<(DelimitedOrder, bool)>
where
    I: IntoIterator<Item = DelimitedGroups>,
{
    let mut any = false;
    let mut year_first = 0usize;
    let mut other = 0usize;
    let mut first_over_12 = false;
    let mut second_over_12 = false;

    for g in groups {
        any = true;
        if g.first_width == 4 {
            year_first += 1;
            continue;
        }
        other += 1;
        if g.first > 12 {
            first_over_12 = true;
        }
        if g.second > 12 {
            second_over_12 = true;
        }
    }

    if !any {
        return None;
    }
    if year_first > other {
        return Some((DelimitedOrder::YearFirst, false));
    }
    if first_over_12 {
        return Some((DelimitedOrder::DayFirst, false));
    }
    if second_over_12 {
        return Some((DelimitedOrder::MonthFirst, false));
    }
    Some((DelimitedOrder::MonthFirst, true))
}

pub fn strategy_for_order(order: DelimitedOrder) -> ParsingStrategy {
    match order {
        DelimitedOrder::DayFirst => ParsingStrategy::DayFirst,
        DelimitedOrder::MonthFirst => ParsingStrategy::MonthFirst,
        DelimitedOrder::YearFirst => ParsingStrategy::YearFirst,
    }
}

pub fn order_for_strategy(strategy: ParsingStrategy) -> Option<DelimitedOrder> {
    match strategy {
        ParsingStrategy::DayFirst => Some(DelimitedOrder::DayFirst),
        ParsingStrategy::MonthFirst => Some(DelimitedOrder::MonthFirst),
        ParsingStrategy::YearFirst => Some(DelimitedOrder::YearFirst),
        _ => None,
    }
}

fn delimited_value_converts_any_order(value: &str) -> bool {
    [
        DelimitedOrder::DayFirst,
        DelimitedOrder::MonthFirst,
        DelimitedOrder::YearFirst,
    ]
    .iter()
    .any(|order| shape::delimited_to_datetime(value, *order).is_some())
}

fn format_type_for(strategy: ParsingStrategy) -> DateFormatType {
    match strategy {
        ParsingStrategy::SerialDays => DateFormatType::SerialNumeric,
        ParsingStrategy::UnixSeconds | ParsingStrategy::UnixMillis => DateFormatType::UnixEpoch,
        ParsingStrategy::CompactDateTime | ParsingStrategy::CompactDate => {
            DateFormatType::CompactNumeric
        }
        ParsingStrategy::IsoFormat => DateFormatType::Iso8601,
        ParsingStrategy::DayFirst | ParsingStrategy::MonthFirst | ParsingStrategy::YearFirst => {
            DateFormatType::SlashAmbiguous
        }
        ParsingStrategy::Flexible => DateFormatType::FreeText,
        ParsingStrategy::PerValue => DateFormatType::Mixed,
        ParsingStrategy::None => DateFormatType::Unknown,
    }
}
