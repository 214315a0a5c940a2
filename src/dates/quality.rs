// ==========================================
// 仓储异常检测引擎 - 时间解析质量校验
// ==========================================
// 成功率 / 时间范围 / 未来时间 / 过旧时间 / 2σ 离群值
// ==========================================

use crate::domain::date_profile::DateQualityReport;
use crate::i18n::t_with_args;
use chrono::{Datelike, NaiveDateTime, TimeDelta};

/// 成功率低于此值时告警
const LOW_SUCCESS_RATE: f64 = 0.95;

/// 离群判定的标准差倍数
const OUTLIER_SIGMA: f64 = 2.0;

/// 未来时间容差上限（小时，约 100 年）
pub const MAX_FUTURE_TOLERANCE_HOURS: i64 = 24 * 366 * 100;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualitySettings {
    pub reference_time: NaiveDateTime,
    pub future_tolerance_hours: i64,
    pub min_sane_year: i32,

    /// 告警消息语言
    pub locale: &'static str,
}

/// 校验解析结果
///
/// # 参数
/// - original: 原始值（与 parsed 一一对应）
/// - parsed: 解析结果
pub fn validate<S: AsRef<str>>(
    original: &[S],
    parsed: &[Option<NaiveDateTime>],
    settings: &QualitySettings,
) -> DateQualityReport {
    let total_values = original
        .iter()
        .filter(|v| !v.as_ref().trim().is_empty())
        .count();
    let dates: Vec<NaiveDateTime> = parsed.iter().flatten().copied().collect();
    let parsed_count = dates.len();
    let failed_count = total_values.saturating_sub(parsed_count);
    let success_rate = if total_values == 0 {
        0.0
    } else {
        parsed_count as f64 / total_values as f64
    };

    // 容差溢出时不设上限
    let future_limit = TimeDelta::try_hours(settings.future_tolerance_hours)
        .and_then(|tolerance| settings.reference_time.checked_add_signed(tolerance));
    let future_count = match future_limit {
        Some(limit) => dates.iter().filter(|d| **d > limit).count(),
        None => 0,
    };
    let too_old_count = dates
        .iter()
        .filter(|d| d.year() < settings.min_sane_year)
        .count();
    let outlier_count = count_outliers(&dates);

    let min_date = dates.iter().min().copied();
    let max_date = dates.iter().max().copied();

    let mut warnings = Vec::new();
    let pct = format!("{:.1}", success_rate * 100.0);
    if total_values > 0 && success_rate < LOW_SUCCESS_RATE {
        warnings.push(t_with_args(
            settings.locale,
            "dates.low_success_rate",
            &[("rate", pct.as_str()), ("failed", &failed_count.to_string())],
        ));
    }
    if future_count > 0 {
        warnings.push(t_with_args(
            settings.locale,
            "dates.future_values",
            &[
                ("count", &future_count.to_string()),
                ("hours", &settings.future_tolerance_hours.to_string()),
            ],
        ));
    }
    if too_old_count > 0 {
        warnings.push(t_with_args(
            settings.locale,
            "dates.too_old_values",
            &[
                ("count", &too_old_count.to_string()),
                ("year", &settings.min_sane_year.to_string()),
            ],
        ));
    }
    if outlier_count > 0 {
        warnings.push(t_with_args(
            settings.locale,
            "dates.outliers",
            &[("count", &outlier_count.to_string())],
        ));
    }

    DateQualityReport {
        total_values,
        parsed_count,
        failed_count,
        success_rate,
        min_date,
        max_date,
        future_count,
        too_old_count,
        outlier_count,
        warnings,
    }
}

/// 以 Unix 秒计算，偏离均值超过 2σ 的个数（至少 3 个值且 σ > 0）
fn count_outliers(dates: &[NaiveDateTime]) -> usize {
    if dates.len() < 3 {
        return 0;
    }
    let secs: Vec<f64> = dates
        .iter()
        .map(|d| d.and_utc().timestamp() as f64)
        .collect();
    let n = secs.len() as f64;
    let mean = secs.iter().sum::<f64>() / n;
    let variance = secs.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
    let sigma = variance.sqrt();
    if sigma <= 0.0 {
        return 0;
    }
    secs.iter()
        .filter(|s| (*s - mean).abs() > OUTLIER_SIGMA * sigma)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn settings() -> QualitySettings {
        QualitySettings {
            reference_time: day(2024, 6, 1),
            future_tolerance_hours: 24,
            min_sane_year: 2000,
            locale: "zh-CN",
        }
    }

    #[test]
    fn test_counts_and_range() {
        let original = ["a", "b", "c", "", "e"];
        let parsed = vec![
            Some(day(2024, 5, 1)),
            Some(day(2024, 5, 3)),
            None,
            None,
            Some(day(2024, 7, 1)),
        ];
        let report = validate(&original, &parsed, &settings());
        assert_eq!(report.total_values, 4);
        assert_eq!(report.parsed_count, 3);
        assert_eq!(report.failed_count, 1);
        assert!((report.success_rate - 0.75).abs() < 1e-9);
        assert_eq!(report.min_date, Some(day(2024, 5, 1)));
        assert_eq!(report.max_date, Some(day(2024, 7, 1)));
        assert_eq!(report.future_count, 1);
        assert_eq!(report.too_old_count, 0);
        assert!(!report.warnings.is_empty());
    }

    #[test]
    fn test_too_old_and_outliers() {
        let mut parsed: Vec<Option<NaiveDateTime>> =
            (1..=20).map(|d| Some(day(2024, 5, d))).collect();
        parsed.push(Some(day(1995, 1, 1)));
        let original: Vec<String> = parsed.iter().map(|_| "x".to_string()).collect();

        let report = validate(&original, &parsed, &settings());
        assert_eq!(report.too_old_count, 1);
        assert_eq!(report.outlier_count, 1);
        assert_eq!(report.success_rate, 1.0);
    }

    #[test]
    fn test_huge_tolerance_does_not_overflow() {
        let parsed = vec![Some(day(2024, 5, 1)), Some(day(2030, 1, 1))];
        let original = vec!["x"; 2];
        let report = validate(
            &original,
            &parsed,
            &QualitySettings {
                future_tolerance_hours: i64::MAX / 1000,
                ..settings()
            },
        );
        assert_eq!(report.future_count, 0);
        assert_eq!(report.parsed_count, 2);
    }

    #[test]
    fn test_warnings_use_requested_locale() {
        let parsed = vec![Some(day(2030, 1, 1))];
        let report = validate(
            &["x"],
            &parsed,
            &QualitySettings {
                locale: "en",
                ..settings()
            },
        );
        assert_eq!(report.future_count, 1);
        assert_eq!(
            report.warnings,
            vec!["1 timestamps are more than 24 hours after the reference time".to_string()]
        );
    }

    #[test]
    fn test_no_outliers_for_identical_values() {
        let parsed = vec![Some(day(2024, 5, 1)); 5];
        let original = vec!["x"; 5];
        let report = validate(&original, &parsed, &settings());
        assert_eq!(report.outlier_count, 0);
        assert!(report.warnings.is_empty());
    }
}
