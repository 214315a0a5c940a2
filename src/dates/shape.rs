// ==========================================
// 仓储异常检测引擎 - 时间值形态识别与转换规则
// ==========================================
// 每种形态一条确定性转换规则:
// - 序号: 起算日 1899-12-30 + 天数 + 小数天（四舍五入到秒）
// - 定宽: 按位切片 Y/M/D/H/M/S
// - ISO / 分隔符: 显式格式串
// ==========================================

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use std::sync::OnceLock;

use super::free_text;

/// 序号日期合理下限（1954-10-03）
pub const SERIAL_MIN: f64 = 20_000.0;

/// 序号日期合理上限（2099-12-31）
pub const SERIAL_MAX: f64 = 73_050.0;

/// Unix 秒合理下限（2000-01-01）
pub const UNIX_SECONDS_MIN: i64 = 946_684_800;

/// Unix 秒合理上限（2100-01-01）
pub const UNIX_SECONDS_MAX: i64 = 4_102_444_800;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// 分隔符日期的三段数字
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelimitedGroups {
    pub first: u32,
    pub second: u32,
    pub third: u32,
    pub first_width: usize,
    pub third_width: usize,
}

/// 分隔符日期的段顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelimitedOrder {
    DayFirst,
    MonthFirst,
    YearFirst,
}

/// 单个值的形态
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueShape {
    Serial(f64),
    UnixSeconds(i64),
    UnixMillis(i64),
    CompactDateTime,
    CompactDate,
    Iso,
    Delimited(DelimitedGroups),
    FreeText,
}

fn iso_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}(?:[T ].*|Z)?$").expect("ISO 正则"))
}

fn delimited_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{1,4})[/.\-](\d{1,2})[/.\-](\d{2,4})(?:[ T]+(.+))?$").expect("分隔符日期正则")
    })
}

fn is_all_digits(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

/// 识别单个值的形态（按优先级: 序号 → Unix → 定宽 → ISO → 分隔符 → 自由文本）
///
/// # 返回
/// - Some(shape): 该形态的转换规则可以成功转换此值
/// - None: 空值或无法识别
pub fn shape_of(raw: &str) -> Option<ValueShape> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(number) = value.parse::<f64>() {
        if !number.is_finite() {
            return None;
        }
        // (a) 序号日期
        if (SERIAL_MIN..=SERIAL_MAX).contains(&number) {
            return Some(ValueShape::Serial(number));
        }
        if is_all_digits(value) {
            match value.len() {
                // (b) 定宽
                14 if compact_to_datetime(value).is_some() => return Some(ValueShape::CompactDateTime),
                8 if compact_to_datetime(value).is_some() => return Some(ValueShape::CompactDate),
                // Unix 秒 / 毫秒
                10 => {
                    let secs = value.parse::<i64>().ok()?;
                    if (UNIX_SECONDS_MIN..UNIX_SECONDS_MAX).contains(&secs) {
                        return Some(ValueShape::UnixSeconds(secs));
                    }
                }
                13 => {
                    let millis = value.parse::<i64>().ok()?;
                    if (UNIX_SECONDS_MIN * 1000..UNIX_SECONDS_MAX * 1000).contains(&millis) {
                        return Some(ValueShape::UnixMillis(millis));
                    }
                }
                _ => {}
            }
        }
        // 数值但不在任何合理区间
        return None;
    }

    // (c) ISO
    if iso_regex().is_match(value) && iso_to_datetime(value).is_some() {
        return Some(ValueShape::Iso);
    }

    // (d) 分隔符日期（至少一种段顺序可成立）
    if let Some(groups) = delimited_groups(value) {
        let any_order_valid = [
            DelimitedOrder::DayFirst,
            DelimitedOrder::MonthFirst,
            DelimitedOrder::YearFirst,
        ]
        .iter()
        .any(|order| delimited_to_datetime(value, *order).is_some());
        if any_order_valid {
            return Some(ValueShape::Delimited(groups));
        }
    }

    // (e) 自由文本
    if free_text::parse_flexible(value).is_some() {
        return Some(ValueShape::FreeText);
    }

    None
}

// ==========================================
// 转换规则
// ==========================================

/// 序号日期 → 时间
pub fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || !(SERIAL_MIN..=SERIAL_MAX).contains(&serial) {
        return None;
    }
    let anchor = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_time(NaiveTime::MIN);
    let total_seconds = (serial * SECONDS_PER_DAY).round() as i64;
    anchor.checked_add_signed(Duration::seconds(total_seconds))
}

/// Unix 秒 → 时间（UTC 墙钟）
pub fn unix_seconds_to_datetime(secs: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp(secs, 0).map(|dt| dt.naive_utc())
}

/// Unix 毫秒 → 时间（UTC 墙钟）
pub fn unix_millis_to_datetime(millis: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp_millis(millis).map(|dt| dt.naive_utc())
}

/// 定宽数字 → 时间（14 位含时分秒，8 位仅日期）
pub fn compact_to_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if !is_all_digits(value) {
        return None;
    }
    let slice = |start: usize, end: usize| value.get(start..end)?.parse::<u32>().ok();

    let date = NaiveDate::from_ymd_opt(slice(0, 4)? as i32, slice(4, 6)?, slice(6, 8)?)?;
    match value.len() {
        14 => date.and_hms_opt(slice(8, 10)?, slice(10, 12)?, slice(12, 14)?),
        8 => Some(date.and_time(NaiveTime::MIN)),
        _ => None,
    }
}

/// ISO 8601 → 时间（带偏移的值取记录时的本地墙钟时间）
pub fn iso_to_datetime(value: &str) -> Option<NaiveDateTime> {
    const ISO_DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    const ISO_OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%z", "%Y-%m-%d %H:%M:%S%.f%z"];

    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }
    for format in ISO_OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, format) {
            return Some(dt.naive_local());
        }
    }

    let value = value.strip_suffix('Z').unwrap_or(value);
    for format in ISO_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN))
}

/// 提取分隔符日期的三段数字
pub fn delimited_groups(value: &str) -> Option<DelimitedGroups> {
    let caps = delimited_regex().captures(value.trim())?;
    let first = caps.get(1)?.as_str();
    let third = caps.get(3)?.as_str();
    Some(DelimitedGroups {
        first: first.parse().ok()?,
        second: caps.get(2)?.as_str().parse().ok()?,
        third: third.parse().ok()?,
        first_width: first.len(),
        third_width: third.len(),
    })
}

/// 两位年份: <70 → 20xx，否则 19xx
fn expand_year(year: u32, width: usize) -> i32 {
    if width <= 2 {
        if year < 70 {
            2000 + year as i32
        } else {
            1900 + year as i32
        }
    } else {
        year as i32
    }
}

/// 分隔符日期的时间部分
fn parse_time_part(raw: &str) -> Option<NaiveTime> {
    const TIME_FORMATS: &[&str] = &[
        "%H:%M:%S",
        "%H:%M:%S%.f",
        "%H:%M",
        "%I:%M:%S %p",
        "%I:%M %p",
        "%I:%M:%S%p",
        "%I:%M%p",
        "%I %p",
    ];
    let value = raw.trim();
    let value = value.strip_suffix('Z').unwrap_or(value).trim();
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(value, format).ok())
}

/// 分隔符日期 → 时间（按给定段顺序）
pub fn delimited_to_datetime(value: &str, order: DelimitedOrder) -> Option<NaiveDateTime> {
    let value = value.trim();
    let caps = delimited_regex().captures(value)?;
    let groups = delimited_groups(value)?;

    let (year, month, day) = match order {
        DelimitedOrder::YearFirst => {
            if groups.first_width != 4 || groups.third_width > 2 {
                return None;
            }
            (groups.first as i32, groups.second, groups.third)
        }
        DelimitedOrder::DayFirst | DelimitedOrder::MonthFirst => {
            if groups.first_width > 2 {
                return None;
            }
            let year = expand_year(groups.third, groups.third_width);
            if order == DelimitedOrder::DayFirst {
                (year, groups.second, groups.first)
            } else {
                (year, groups.first, groups.second)
            }
        }
    };

    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    match caps.get(4) {
        Some(time) => parse_time_part(time.as_str()).map(|t| date.and_time(t)),
        None => Some(date.and_time(NaiveTime::MIN)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn test_serial_conversion() {
        assert_eq!(serial_to_datetime(45000.0), Some(at(2023, 3, 15, 0, 0, 0)));
        assert_eq!(serial_to_datetime(45000.5), Some(at(2023, 3, 15, 12, 0, 0)));
        assert_eq!(serial_to_datetime(44927.25), Some(at(2023, 1, 1, 6, 0, 0)));
        assert_eq!(serial_to_datetime(5.0), None);
    }

    #[test]
    fn test_compact_conversion() {
        assert_eq!(
            compact_to_datetime("20240105143015"),
            Some(at(2024, 1, 5, 14, 30, 15))
        );
        assert_eq!(compact_to_datetime("20240105"), Some(at(2024, 1, 5, 0, 0, 0)));
        assert_eq!(compact_to_datetime("20241305143015"), None);
    }

    #[test]
    fn test_unix_conversion() {
        assert_eq!(
            unix_seconds_to_datetime(1_704_067_200),
            Some(at(2024, 1, 1, 0, 0, 0))
        );
        assert_eq!(
            unix_millis_to_datetime(1_704_067_200_500).map(|d| d.and_utc().timestamp()),
            Some(1_704_067_200)
        );
    }

    #[test]
    fn test_delimited_orders() {
        assert_eq!(
            delimited_to_datetime("25/12/2023 14:30", DelimitedOrder::DayFirst),
            Some(at(2023, 12, 25, 14, 30, 0))
        );
        assert_eq!(
            delimited_to_datetime("12/25/2023 2:30 PM", DelimitedOrder::MonthFirst),
            Some(at(2023, 12, 25, 14, 30, 0))
        );
        assert_eq!(
            delimited_to_datetime("2023/12/25", DelimitedOrder::YearFirst),
            Some(at(2023, 12, 25, 0, 0, 0))
        );
        assert_eq!(
            delimited_to_datetime("05.01.24", DelimitedOrder::DayFirst),
            Some(at(2024, 1, 5, 0, 0, 0))
        );
        assert_eq!(delimited_to_datetime("25/12/2023", DelimitedOrder::MonthFirst), None);
    }

    #[test]
    fn test_shape_priority() {
        assert_eq!(shape_of("45123.5"), Some(ValueShape::Serial(45123.5)));
        assert_eq!(shape_of("20240105143015"), Some(ValueShape::CompactDateTime));
        assert_eq!(shape_of("20240105"), Some(ValueShape::CompactDate));
        assert_eq!(shape_of("1704067200"), Some(ValueShape::UnixSeconds(1_704_067_200)));
        assert_eq!(shape_of("2024-01-05 10:00:00"), Some(ValueShape::Iso));
        assert!(matches!(shape_of("05/01/2024"), Some(ValueShape::Delimited(_))));
        assert_eq!(shape_of("Jan 5, 2024"), Some(ValueShape::FreeText));
        assert_eq!(shape_of("12"), None);
        assert_eq!(shape_of("   "), None);
        assert_eq!(shape_of("garbage"), None);
    }

    #[test]
    fn test_iso_variants() {
        assert_eq!(iso_to_datetime("2024-01-05"), Some(at(2024, 1, 5, 0, 0, 0)));
        assert_eq!(
            iso_to_datetime("2024-01-05T08:09:10Z"),
            Some(at(2024, 1, 5, 8, 9, 10))
        );
        assert_eq!(
            iso_to_datetime("2024-01-05 08:09"),
            Some(at(2024, 1, 5, 8, 9, 0))
        );
        assert_eq!(iso_to_datetime("2024-02-30"), None);
    }
}
