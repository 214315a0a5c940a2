// ==========================================
// 仓储异常检测引擎 - 国际化 (i18n)
// ==========================================
// 使用 rust-i18n 库，消息文件位于 locales/
// 每次运行解析一次语言，渲染时显式传入；不读写 rust-i18n 的进程级语言
// 未指定或不支持的语言一律按 zh-CN 渲染
// ==========================================
// 注意: rust_i18n::i18n! 宏已在 lib.rs 中初始化
// ==========================================

use tracing::warn;

/// 默认语言
pub const DEFAULT_LOCALE: &str = "zh-CN";

/// 已提供消息文件的语言
pub const SUPPORTED_LOCALES: [&str; 2] = ["zh-CN", "en"];

/// 标准化语言代码
///
/// 接受 "zh" / "zh_CN" / "zh-Hans" 与 "en" / "en-US" 等写法，不支持时返回 None
pub fn normalize_locale(raw: &str) -> Option<&'static str> {
    let lowered = raw.trim().to_ascii_lowercase().replace('_', "-");
    let primary = lowered.split('-').next().unwrap_or_default();
    match primary {
        "zh" => Some("zh-CN"),
        "en" => Some("en"),
        _ => None,
    }
}

/// 解析一次运行使用的语言
///
/// # 参数
/// - requested: 配置中的语言（None 或空串取默认值）
pub fn resolve_locale(requested: Option<&str>) -> &'static str {
    match requested.map(str::trim).filter(|s| !s.is_empty()) {
        None => DEFAULT_LOCALE,
        Some(raw) => normalize_locale(raw).unwrap_or_else(|| {
            warn!(locale = raw, fallback = DEFAULT_LOCALE, "不支持的语言，使用默认语言");
            DEFAULT_LOCALE
        }),
    }
}

/// 翻译消息（无参数）
///
/// # 示例
/// ```no_run
/// use warehouse_rule_engine::i18n::t;
/// let msg = t("en", "common.success");
/// ```
pub fn t(locale: &str, key: &str) -> String {
    rust_i18n::t!(key, locale = locale).to_string()
}

/// 翻译消息（带参数，占位符写作 `%{name}`）
///
/// # 示例
/// ```no_run
/// use warehouse_rule_engine::i18n::t_with_args;
/// let msg = t_with_args(
///     "zh-CN",
///     "scope.low_coverage",
///     &[("coverage", "42.0"), ("in_scope", "42"), ("total", "100")],
/// );
/// ```
pub fn t_with_args(locale: &str, key: &str, args: &[(&str, &str)]) -> String {
    args.iter().fold(t(locale, key), |message, (name, value)| {
        message.replace(&format!("%{{{}}}", name), value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_cjk(text: &str) -> bool {
        text.chars().any(|c| ('\u{4e00}'..='\u{9fff}').contains(&c))
    }

    #[test]
    fn test_resolve_locale() {
        assert_eq!(resolve_locale(None), "zh-CN");
        assert_eq!(resolve_locale(Some("  ")), "zh-CN");
        assert_eq!(resolve_locale(Some("en")), "en");
        assert_eq!(resolve_locale(Some("en_US")), "en");
        assert_eq!(resolve_locale(Some("zh")), "zh-CN");
        assert_eq!(resolve_locale(Some("fr-FR")), "zh-CN");
        assert_eq!(normalize_locale("de"), None);
        assert!(SUPPORTED_LOCALES.iter().all(|l| normalize_locale(l) == Some(*l)));
    }

    #[test]
    fn test_translate_simple() {
        assert_eq!(t("zh-CN", "common.success"), "操作成功");
        assert_eq!(t("en", "common.success"), "Operation successful");
    }

    #[test]
    fn test_translate_with_args() {
        let msg = t_with_args("zh-CN", "import.file_not_found", &[("path", "/tmp/test.csv")]);
        assert!(msg.contains("/tmp/test.csv"));
        assert!(msg.contains("文件不存在"));

        let msg = t_with_args("en", "import.file_not_found", &[("path", "/tmp/test.csv")]);
        assert!(msg.contains("/tmp/test.csv"));
        assert!(msg.contains("File not found"));
    }

    #[test]
    fn test_locales_are_independent_per_call() {
        // 交替渲染，互不影响
        let zh = t("zh-CN", "common.success");
        let en = t("en", "common.success");
        assert_eq!(t("zh-CN", "common.success"), zh);
        assert_ne!(zh, en);
    }

    #[test]
    fn test_anomaly_description_fills_every_placeholder() {
        for locale in SUPPORTED_LOCALES {
            let msg = t_with_args(
                locale,
                "anomaly.overcapacity_aggregate",
                &[
                    ("location", "RECV-01"),
                    ("count", "12"),
                    ("capacity", "10"),
                    ("excess", "2"),
                    ("unit_type", "items"),
                ],
            );
            assert!(msg.contains("RECV-01"));
            assert!(!msg.contains("%{"), "{} 存在未替换的占位符: {}", locale, msg);
        }
    }

    #[test]
    fn test_english_messages_have_no_cjk() {
        for key in [
            "location.invalid_level",
            "location.wrong_shape",
            "anomaly.invalid_location",
            "scope.no_include_patterns",
            "dates.future_values",
        ] {
            let msg = t("en", key);
            assert!(!has_cjk(&msg), "{}: {}", key, msg);
            assert!(has_cjk(&t("zh-CN", key)), "{} 缺少中文消息", key);
        }
    }
}
