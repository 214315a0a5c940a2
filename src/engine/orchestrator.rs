// ==========================================
// 仓储异常检测引擎 - 规则引擎编排器
// ==========================================
// 流程:
// 1) 时间列检测 + 解析（每个不同原始值一次）
// 2) 库位分类（每个不同代码一次）
// 3) 范围过滤
// 4) 各启用规则并行评估（阻塞任务 + 单规则时间预算）
// 5) 合并候选 → 6) 跨规则裁决 → 7) 组装报告
// 取消只在阶段边界检查；单条规则失败/超时/panic 不影响其余规则
// 消息语言每次运行解析一次并显式传递，不修改进程级状态
// ==========================================

use crate::config::{EngineConfig, EngineConfigSource};
use crate::dates::{self, DateFormatDetector, DateParser, DetectorSettings, QualitySettings};
use crate::domain::anomaly::Anomaly;
use crate::domain::location::LocationTemplate;
use crate::domain::record::{InventoryRecord, REQUIRED_FIELDS};
use crate::domain::report::{
    Report, ReportSummary, RulePerformance, RuleRunStatus, RunWarning, WarningKind,
};
use crate::domain::rule::RuleDefinition;
use crate::domain::scope::ScopeConfig;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::precedence::PrecedenceResolver;
use crate::i18n::{resolve_locale, t_with_args};
use crate::location::{LocationCache, LocationClassifier};
use crate::perf::StageTimings;
use crate::rules::{self, EvaluationContext, EvaluationOutput, RuleError};
use crate::scope::ScopeFilter;
use chrono::Local;
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// CancellationFlag - 取消标记（阶段边界检查）
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn checkpoint(&self, stage: &str) -> EngineResult<()> {
        if self.is_cancelled() {
            warn!(stage, "分析已取消");
            return Err(EngineError::Cancelled {
                stage: stage.to_string(),
            });
        }
        Ok(())
    }
}

/// 单条规则的执行结果
enum RuleOutcome {
    Completed(EvaluationOutput),
    Failed(String),
    TimedOut(String),
}

// ==========================================
// RuleEngine - 编排器
// ==========================================
pub struct RuleEngine {
    config: EngineConfig,
}

impl RuleEngine {
    /// 使用一份已校验的配置创建引擎
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// 从配置来源载入
    pub async fn from_source(source: &dyn EngineConfigSource) -> EngineResult<Self> {
        let config = source.load_engine_config().await?;
        Self::new(config)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// 执行一次完整分析
    pub async fn evaluate_all(&self, records: Vec<InventoryRecord>) -> EngineResult<Report> {
        self.evaluate_all_with_cancel(records, &CancellationFlag::new())
            .await
    }

    /// 执行一次完整分析（可取消）
    #[instrument(skip_all, fields(records = records.len(), rules = self.config.rules.len()))]
    pub async fn evaluate_all_with_cancel(
        &self,
        mut records: Vec<InventoryRecord>,
        cancel: &CancellationFlag,
    ) -> EngineResult<Report> {
        let run_id = Uuid::new_v4();
        let settings = &self.config.settings;
        let reference_time = settings.resolve_reference_time();
        let locale = resolve_locale(settings.locale.as_deref());
        let timings = StageTimings::new();
        let mut warnings: Vec<RunWarning> = Vec::new();

        // 0. 结构性校验（致命）
        validate_input(&records)?;
        info!(%run_id, records = records.len(), %reference_time, locale, "开始分析");
        cancel.checkpoint("validate")?;

        // 1. 时间检测 + 解析
        let (date_profile, date_quality) = {
            let _t = timings.start("dates");
            let raw: Vec<&str> = records.iter().map(|r| r.timestamp_raw.as_str()).collect();
            let detector = DateFormatDetector::new(DetectorSettings {
                sample_size: settings.date_sample_size,
                ..DetectorSettings::default()
            });
            let profile = detector.detect(&raw);
            let outcome = DateParser::parse(&raw, &profile);
            let quality = dates::validate(
                &raw,
                &outcome.values,
                &QualitySettings {
                    reference_time,
                    future_tolerance_hours: settings.future_tolerance_hours,
                    min_sane_year: settings.min_sane_year,
                    locale,
                },
            );

            if outcome.failed_count > 0 {
                warn!(
                    failed = outcome.failed_count,
                    samples = ?outcome.failed_samples,
                    "部分时间值无法解析"
                );
                warnings.push(RunWarning::new(
                    WarningKind::ParseFailure,
                    t_with_args(
                        locale,
                        "warning.parse_failure",
                        &[
                            ("count", &outcome.failed_count.to_string()),
                            ("samples", &outcome.failed_samples.join(", ")),
                        ],
                    ),
                ));
            }
            warnings.extend(
                quality
                    .warnings
                    .iter()
                    .map(|w| RunWarning::new(WarningKind::DateQuality, w.clone())),
            );

            for (record, parsed) in records.iter_mut().zip(outcome.values) {
                record.parsed_timestamp = parsed;
            }
            info!(
                format = %profile.format_type,
                strategy = %profile.parsing_strategy,
                confidence = profile.confidence,
                success_rate = outcome.success_rate,
                "时间列解析完成"
            );
            (profile, quality)
        };
        cancel.checkpoint("dates")?;

        // 2. 库位分类
        let location_cache = {
            let _t = timings.start("classify");
            let classifier = LocationClassifier::new(self.config.template.clone())?;
            LocationCache::build(records.iter().map(|r| r.location_code.as_str()), &classifier)
        };
        info!(
            distinct = location_cache.len(),
            invalid = location_cache.invalid_count(),
            "库位分类完成"
        );
        cancel.checkpoint("classify")?;

        // 3. 范围过滤
        let total_records = records.len();
        let scope_outcome = {
            let _t = timings.start("scope");
            ScopeFilter::new(&self.config.scope)?
                .with_locale(locale)
                .filter(&records)
        };
        drop(records);
        warnings.extend(scope_outcome.warnings.iter().cloned());
        let scope_metrics = scope_outcome.metrics.clone();
        info!(
            in_scope = scope_metrics.in_scope_count,
            coverage = scope_metrics.coverage_ratio,
            "范围过滤完成"
        );
        cancel.checkpoint("scope")?;

        // 4. 规则评估
        let ctx = Arc::new(
            EvaluationContext::new(
                scope_outcome.in_scope,
                location_cache,
                date_profile.clone(),
                reference_time,
                &self.config.scope,
                &self.config.template,
                scope_outcome.hints,
            )
            .with_locale(locale),
        );
        let analyzed_records = ctx.records.len();

        let active: Vec<RuleDefinition> = self.config.active_rules().cloned().collect();
        let outcomes = {
            let _t = timings.start("evaluate");
            self.run_rules(&active, &ctx).await
        };
        cancel.checkpoint("evaluate")?;

        // 5. 合并候选（规则声明顺序 + 评估器产出顺序）
        let mut performance: BTreeMap<String, RulePerformance> = BTreeMap::new();
        let mut candidates: Vec<Anomaly> = Vec::new();

        for (rule, (outcome, elapsed_ms)) in active.iter().zip(outcomes) {
            let mut perf = RulePerformance {
                rule_id: rule.id.clone(),
                rule_kind: rule.kind.tag().to_string(),
                status: RuleRunStatus::Completed,
                elapsed_ms,
                candidate_count: 0,
                accepted_count: 0,
                suppressed_count: 0,
                skipped_records: 0,
            };

            match outcome {
                RuleOutcome::Completed(output) => {
                    perf.candidate_count = output.anomalies.len();
                    perf.skipped_records = output.skipped_unparsed;
                    if output.skipped_unparsed > 0 {
                        warnings.push(RunWarning::for_rule(
                            WarningKind::UnparsedSkipped,
                            &rule.id,
                            t_with_args(
                                locale,
                                "warning.unparsed_skipped",
                                &[
                                    ("rule_id", rule.id.as_str()),
                                    ("count", &output.skipped_unparsed.to_string()),
                                ],
                            ),
                        ));
                    }
                    candidates.extend(output.anomalies);
                }
                RuleOutcome::Failed(reason) => {
                    error!(rule_id = %rule.id, %reason, "规则执行失败");
                    warnings.push(RunWarning::for_rule(
                        WarningKind::RuleEvaluationFailure,
                        &rule.id,
                        t_with_args(
                            locale,
                            "warning.rule_failed",
                            &[("rule_id", rule.id.as_str()), ("reason", reason.as_str())],
                        ),
                    ));
                    perf.status = RuleRunStatus::Failed(reason);
                }
                RuleOutcome::TimedOut(reason) => {
                    error!(rule_id = %rule.id, %reason, "规则执行超时");
                    warnings.push(RunWarning::for_rule(
                        WarningKind::RuleTimeout,
                        &rule.id,
                        t_with_args(
                            locale,
                            "warning.rule_timeout",
                            &[
                                ("rule_id", rule.id.as_str()),
                                ("budget_ms", &self.config.settings.rule_budget_ms.to_string()),
                            ],
                        ),
                    ));
                    perf.status = RuleRunStatus::TimedOut(reason);
                }
            }
            performance.insert(rule.id.clone(), perf);
        }

        // 6. 跨规则裁决
        let resolution = {
            let _t = timings.start("resolve");
            PrecedenceResolver::resolve(candidates)
        };
        let suppressed_candidates = resolution.suppressed_total();
        for (rule_id, count) in &resolution.suppressed {
            if let Some(perf) = performance.get_mut(rule_id) {
                perf.suppressed_count = *count;
            }
        }
        for anomaly in &resolution.accepted {
            if let Some(perf) = performance.get_mut(&anomaly.rule_id) {
                perf.accepted_count += 1;
            }
        }

        // 7. 组装报告: 优先级降序，同级按裁决等级升序（稳定）
        let mut anomalies = resolution.accepted;
        anomalies.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| a.precedence_level.cmp(&b.precedence_level))
        });

        let per_rule_performance: Vec<RulePerformance> = self
            .config
            .rules
            .iter()
            .map(|rule| {
                performance.remove(&rule.id).unwrap_or_else(|| RulePerformance {
                    rule_id: rule.id.clone(),
                    rule_kind: rule.kind.tag().to_string(),
                    status: RuleRunStatus::Skipped("inactive".to_string()),
                    elapsed_ms: 0,
                    candidate_count: 0,
                    accepted_count: 0,
                    suppressed_count: 0,
                    skipped_records: 0,
                })
            })
            .collect();

        let summary = summarize(&anomalies, total_records, analyzed_records, suppressed_candidates);
        info!(
            %run_id,
            anomalies = summary.total_anomalies,
            suppressed = suppressed_candidates,
            warnings = warnings.len(),
            "分析完成"
        );

        Ok(Report {
            run_id,
            generated_at: Local::now().naive_local(),
            reference_time,
            locale: locale.to_string(),
            anomalies,
            per_rule_performance,
            scope_metrics,
            date_profile,
            date_quality,
            warnings,
            stage_timings: timings.snapshot(),
            summary,
        })
    }

    /// 执行全部启用规则，结果与输入规则一一对应
    async fn run_rules(
        &self,
        active: &[RuleDefinition],
        ctx: &Arc<EvaluationContext>,
    ) -> Vec<(RuleOutcome, u64)> {
        let budget = Duration::from_millis(self.config.settings.rule_budget_ms);

        if self.config.settings.parallel {
            let tasks = active
                .iter()
                .map(|rule| run_rule(rule.clone(), Arc::clone(ctx), budget));
            join_all(tasks).await
        } else {
            let mut outcomes = Vec::with_capacity(active.len());
            for rule in active {
                outcomes.push(run_rule(rule.clone(), Arc::clone(ctx), budget).await);
            }
            outcomes
        }
    }
}

/// 在阻塞线程池执行单条规则，受时间预算约束
async fn run_rule(
    rule: RuleDefinition,
    ctx: Arc<EvaluationContext>,
    budget: Duration,
) -> (RuleOutcome, u64) {
    let start = Instant::now();
    let rule_id = rule.id.clone();
    let handle = tokio::task::spawn_blocking(move || rules::evaluate(&rule, &ctx));

    let outcome = match tokio::time::timeout(budget, handle).await {
        Ok(Ok(Ok(output))) => RuleOutcome::Completed(output),
        Ok(Ok(Err(err))) => RuleOutcome::Failed(err.to_string()),
        Ok(Err(join_err)) => {
            let reason = if join_err.is_panic() {
                format!("评估器 panic: {}", join_err)
            } else {
                join_err.to_string()
            };
            RuleOutcome::Failed(
                RuleError::Evaluation {
                    rule_id: rule_id.clone(),
                    reason,
                }
                .to_string(),
            )
        }
        Err(_) => RuleOutcome::TimedOut(format!("超过 {} ms 预算", budget.as_millis())),
    };

    let elapsed_ms = start.elapsed().as_millis() as u64;
    debug!(rule_id = %rule_id, elapsed_ms, "规则执行结束");
    (outcome, elapsed_ms)
}

/// 记录集结构校验: 空集或某必填列整列为空即为致命错误
fn validate_input(records: &[InventoryRecord]) -> EngineResult<()> {
    if records.is_empty() {
        return Err(EngineError::EmptyRecordSet);
    }

    let missing: Vec<String> = REQUIRED_FIELDS
        .iter()
        .filter(|field| {
            records
                .iter()
                .all(|r| r.missing_required_fields().contains(*field))
        })
        .map(|field| field.to_string())
        .collect();

    if !missing.is_empty() {
        return Err(EngineError::MissingRequiredColumns(missing));
    }
    Ok(())
}

fn summarize(
    anomalies: &[Anomaly],
    total_records: usize,
    analyzed_records: usize,
    suppressed_candidates: usize,
) -> ReportSummary {
    let mut summary = ReportSummary {
        total_records,
        analyzed_records,
        total_anomalies: anomalies.len(),
        suppressed_candidates,
        ..ReportSummary::default()
    };
    for anomaly in anomalies {
        *summary
            .by_priority
            .entry(anomaly.priority.to_string())
            .or_default() += 1;
        *summary
            .by_category
            .entry(anomaly.category.to_string())
            .or_default() += 1;
    }
    summary
}

/// 便捷入口: 以默认运行参数执行一次分析
pub async fn evaluate_all(
    records: Vec<InventoryRecord>,
    rules: Vec<RuleDefinition>,
    scope: ScopeConfig,
    template: LocationTemplate,
) -> EngineResult<Report> {
    let config = EngineConfig {
        rules,
        scope,
        template,
        ..EngineConfig::default()
    };
    RuleEngine::new(config)?.evaluate_all(records).await
}
