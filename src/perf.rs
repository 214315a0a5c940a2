// ==========================================
// 仓储异常检测引擎 - 阶段耗时统计
// ==========================================
// StageTimer: RAII Guard，drop 时输出 perf 日志并写入本次运行的耗时列表
// ==========================================

use crate::domain::report::StageTiming;
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// 单次运行的阶段耗时收集器（可跨任务克隆）
#[derive(Debug, Clone, Default)]
pub struct StageTimings {
    inner: Arc<Mutex<Vec<StageTiming>>>,
}

impl StageTimings {
    pub fn new() -> Self {
        Self::default()
    }

    /// 开始计时一个阶段
    pub fn start(&self, stage: &'static str) -> StageTimer {
        StageTimer {
            stage,
            start: Instant::now(),
            sink: Some(self.clone()),
        }
    }

    fn push(&self, timing: StageTiming) {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        guard.push(timing);
    }

    /// 按完成顺序返回已记录的阶段
    pub fn snapshot(&self) -> Vec<StageTiming> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

/// 阶段计时 Guard
///
/// 使用方式：
/// ```ignore
/// let timings = StageTimings::new();
/// {
///     let _t = timings.start("classify");
///     // do work...
/// }
/// ```
pub struct StageTimer {
    stage: &'static str,
    start: Instant,
    sink: Option<StageTimings>,
}

impl StageTimer {
    /// 只输出日志、不写入收集器
    pub fn detached(stage: &'static str) -> Self {
        Self {
            stage,
            start: Instant::now(),
            sink: None,
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

impl Drop for StageTimer {
    fn drop(&mut self) {
        let elapsed_ms = self.elapsed_ms();

        tracing::info!(
            target: "perf",
            stage = self.stage,
            elapsed_ms,
            "done"
        );

        if let Some(sink) = self.sink.take() {
            sink.push(StageTiming {
                stage: self.stage.to_string(),
                elapsed_ms,
            });
        }
    }
}
