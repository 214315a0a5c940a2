// ==========================================
// 仓储异常检测引擎 - 单次运行配置
// ==========================================
// 每次运行显式传入，不依赖全局规则缓存
// ==========================================

use crate::config::defaults::default_rules;
use crate::config::error::{ConfigError, ConfigResult};
use crate::dates::MAX_FUTURE_TOLERANCE_HOURS;
use crate::domain::location::LocationTemplate;
use crate::domain::rule::RuleDefinition;
use crate::domain::scope::ScopeConfig;
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

// ==========================================
// EngineSettings - 运行参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// 参照时间（None = 本地当前时间）
    pub reference_time: Option<NaiveDateTime>,

    /// 单条规则的执行预算（毫秒）
    pub rule_budget_ms: u64,

    /// 规则并行执行
    pub parallel: bool,

    /// 时间格式检测抽样数
    pub date_sample_size: usize,

    /// 合理的最早年份
    pub min_sane_year: i32,

    /// 未来时间容差（小时）
    pub future_tolerance_hours: i64,

    /// 消息语言（"zh-CN" / "en"）
    pub locale: Option<String>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            reference_time: None,
            rule_budget_ms: 5_000,
            parallel: true,
            date_sample_size: 200,
            min_sane_year: 2000,
            future_tolerance_hours: 24,
            locale: None,
        }
    }
}

impl EngineSettings {
    pub fn resolve_reference_time(&self) -> NaiveDateTime {
        self.reference_time
            .unwrap_or_else(|| Local::now().naive_local())
    }
}

// ==========================================
// EngineConfig - 规则 / 范围 / 模板 / 参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub rules: Vec<RuleDefinition>,
    pub scope: ScopeConfig,
    pub template: LocationTemplate,
    pub settings: EngineSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rules: default_rules(),
            scope: ScopeConfig::default(),
            template: LocationTemplate::default(),
            settings: EngineSettings::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(raw: &str) -> ConfigResult<Self> {
        let config: EngineConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// 从 JSON 文件加载（缺省字段取默认值）
    pub fn from_json_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }

    pub fn to_json_pretty(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn active_rules(&self) -> impl Iterator<Item = &RuleDefinition> {
        self.rules.iter().filter(|r| r.active)
    }

    /// 结构校验
    pub fn validate(&self) -> ConfigResult<()> {
        let mut seen = HashSet::new();
        for rule in &self.rules {
            if rule.id.trim().is_empty() {
                return Err(ConfigError::Invalid("规则 id 不能为空".to_string()));
            }
            if !seen.insert(rule.id.as_str()) {
                return Err(ConfigError::Invalid(format!("规则 id 重复: {}", rule.id)));
            }
            crate::rules::validate_conditions(rule)
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        }

        if self.template.levels().is_empty() {
            return Err(ConfigError::Invalid("层级字母表不能为空".to_string()));
        }
        if self.template.positions_per_rack == 0 {
            return Err(ConfigError::Invalid("positions_per_rack 必须大于 0".to_string()));
        }
        if self.template.position_width == Some(0) {
            return Err(ConfigError::Invalid("position_width 必须大于 0".to_string()));
        }
        if self.settings.rule_budget_ms == 0 {
            return Err(ConfigError::Invalid("rule_budget_ms 必须大于 0".to_string()));
        }
        if self.settings.date_sample_size == 0 {
            return Err(ConfigError::Invalid("date_sample_size 必须大于 0".to_string()));
        }
        if !(0..=MAX_FUTURE_TOLERANCE_HOURS).contains(&self.settings.future_tolerance_hours) {
            return Err(ConfigError::Invalid(format!(
                "future_tolerance_hours 必须在 0..={} 之间，当前 {}",
                MAX_FUTURE_TOLERANCE_HOURS, self.settings.future_tolerance_hours
            )));
        }
        if let Some(locale) = self.settings.locale.as_deref() {
            if !locale.trim().is_empty() && crate::i18n::normalize_locale(locale).is_none() {
                return Err(ConfigError::Invalid(format!(
                    "不支持的语言: {}（可选: {}）",
                    locale,
                    crate::i18n::SUPPORTED_LOCALES.join(", ")
                )));
            }
        }
        Ok(())
    }
}
