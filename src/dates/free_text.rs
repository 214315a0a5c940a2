// ==========================================
// 仓储异常检测引擎 - 自由文本时间解析
// ==========================================
// 兜底解析: 月份名 / RFC 2822 / RFC 3339 / 点分 / 12 小时制
// 纯数字串不在此处理（交给定宽/序号规则）
// ==========================================

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use std::sync::OnceLock;

/// 带时间的格式（按顺序尝试）
const DATETIME_FORMATS: &[&str] = &[
    "%B %d, %Y %H:%M:%S",
    "%B %d, %Y %H:%M",
    "%B %d, %Y %I:%M:%S %p",
    "%B %d, %Y %I:%M %p",
    "%B %d %Y %H:%M:%S",
    "%B %d %Y %H:%M",
    "%B %d %Y %I:%M %p",
    "%d %B %Y %H:%M:%S",
    "%d %B %Y %H:%M",
    "%d %B %Y %I:%M %p",
    "%d-%b-%Y %H:%M:%S",
    "%d-%b-%Y %H:%M",
    "%a %b %d %H:%M:%S %Y",
    "%a, %d %b %Y %H:%M:%S",
    "%a, %d %b %Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %I:%M %p",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    "%Y%m%dT%H%M%S",
];

/// 仅日期的格式
const DATE_FORMATS: &[&str] = &[
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%d %B, %Y",
    "%A, %B %d, %Y",
    "%a, %B %d, %Y",
    "%a %b %d %Y",
    "%d-%b-%Y",
    "%d-%b-%y",
    "%b-%d-%Y",
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%d.%m.%Y",
];

fn ordinal_suffix_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(\d{1,2})(st|nd|rd|th)\b").expect("序数后缀正则"))
}

fn whitespace_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("空白正则"))
}

/// 预处理: 压缩空白 / 去序数后缀 / 去时区缩写
fn normalize(raw: &str) -> String {
    let collapsed = whitespace_regex().replace_all(raw.trim(), " ");
    let without_ordinals = ordinal_suffix_regex().replace_all(&collapsed, "$1");
    let mut value = without_ordinals.to_string();
    for suffix in [" UTC", " GMT", " Z"] {
        if value.to_uppercase().ends_with(suffix) {
            value.truncate(value.len() - suffix.len());
        }
    }
    value.trim().to_string()
}

/// 宽松解析单个值
///
/// # 返回
/// - Some: 解析成功（带时区的值取其记录时的本地墙钟时间）
/// - None: 无法解析（绝不返回哨兵日期）
pub fn parse_flexible(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(dt.naive_local());
    }

    let value = normalize(trimmed);

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&value, format) {
            return Some(dt);
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(&value, format) {
            return Some(date.and_time(NaiveTime::MIN));
        }
    }

    None
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
    fn test_month_name_formats() {
        assert_eq!(parse_flexible("January 5, 2024"), Some(at(2024, 1, 5, 0, 0, 0)));
        assert_eq!(parse_flexible("Jan 5, 2024 14:30"), Some(at(2024, 1, 5, 14, 30, 0)));
        assert_eq!(parse_flexible("5 March 2024"), Some(at(2024, 3, 5, 0, 0, 0)));
        assert_eq!(parse_flexible("05-Mar-2024 08:15"), Some(at(2024, 3, 5, 8, 15, 0)));
    }

    #[test]
    fn test_ordinal_suffix_and_twelve_hour_clock() {
        assert_eq!(
            parse_flexible("March 3rd, 2024 2:45 PM"),
            Some(at(2024, 3, 3, 14, 45, 0))
        );
    }

    #[test]
    fn test_rfc_formats() {
        assert_eq!(
            parse_flexible("Tue, 5 Mar 2024 10:00:00 +0000"),
            Some(at(2024, 3, 5, 10, 0, 0))
        );
        assert_eq!(
            parse_flexible("2024-03-05T10:00:00+08:00"),
            Some(at(2024, 3, 5, 10, 0, 0))
        );
    }

    #[test]
    fn test_timezone_abbreviation_stripped() {
        assert_eq!(
            parse_flexible("2024-03-05 10:00:00 UTC"),
            Some(at(2024, 3, 5, 10, 0, 0))
        );
    }

    #[test]
    fn test_rejects_garbage_and_pure_numbers() {
        assert_eq!(parse_flexible("not a date"), None);
        assert_eq!(parse_flexible("45000"), None);
        assert_eq!(parse_flexible(""), None);
        assert_eq!(parse_flexible("February 30, 2024"), None);
    }
}
