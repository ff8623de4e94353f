//! 管道统计与健康状态
//!
//! 计数器使用原子操作，错误分类统计放在互斥锁内。

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::pipeline::error::{ErrorStats, PipelineError};

/// 连续失败达到此次数时组件视为不健康
pub const UNHEALTHY_AFTER_FAILURES: usize = 3;

/// 管道阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Format,
    Translate,
    Analyze,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Format => "format",
            Stage::Translate => "translate",
            Stage::Analyze => "analyze",
        }
    }
}

/// 管道统计信息（线程安全版本）
#[derive(Debug, Default)]
pub struct PipelineStats {
    /// 已安排的防抖计时器
    pub triggers_scheduled: AtomicUsize,

    /// 被新编辑取消的计时器
    pub triggers_debounced: AtomicUsize,

    pub cycles_started: AtomicUsize,
    pub cycles_completed: AtomicUsize,
    pub cycles_aborted: AtomicUsize,
    pub cycles_superseded: AtomicUsize,
    pub cycles_skipped: AtomicUsize,

    pub format_failures: AtomicUsize,
    pub translate_failures: AtomicUsize,
    pub analyze_failures: AtomicUsize,

    // 连续失败计数，成功时清零
    format_streak: AtomicUsize,
    translate_streak: AtomicUsize,
    analyze_streak: AtomicUsize,

    /// 已完成周期的总耗时（微秒）
    pub processing_time: AtomicU64,

    errors: Mutex<ErrorStats>,
}

impl PipelineStats {
    pub fn inc_triggers_scheduled(&self) {
        self.triggers_scheduled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_triggers_debounced(&self) {
        self.triggers_debounced.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_cycles_started(&self) {
        self.cycles_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_cycles_completed(&self, elapsed: Duration) {
        self.cycles_completed.fetch_add(1, Ordering::Relaxed);
        self.processing_time
            .fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn inc_cycles_aborted(&self) {
        self.cycles_aborted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_cycles_superseded(&self) {
        self.cycles_superseded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_cycles_skipped(&self) {
        self.cycles_skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// 记录阶段失败
    pub fn record_stage_failure(&self, stage: Stage, error: &PipelineError) {
        let (total, streak) = self.stage_counters(stage);
        total.fetch_add(1, Ordering::Relaxed);
        streak.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut errors) = self.errors.lock() {
            errors.record_error(error);
        }
    }

    /// 记录阶段成功
    pub fn record_stage_success(&self, stage: Stage) {
        let (_, streak) = self.stage_counters(stage);
        streak.store(0, Ordering::Relaxed);
    }

    fn stage_counters(&self, stage: Stage) -> (&AtomicUsize, &AtomicUsize) {
        match stage {
            Stage::Format => (&self.format_failures, &self.format_streak),
            Stage::Translate => (&self.translate_failures, &self.translate_streak),
            Stage::Analyze => (&self.analyze_failures, &self.analyze_streak),
        }
    }

    /// 错误分类统计的副本
    pub fn error_stats(&self) -> ErrorStats {
        self.errors
            .lock()
            .map(|errors| errors.clone())
            .unwrap_or_default()
    }

    /// 获取统计数据快照
    pub fn snapshot(&self) -> PipelineStatsSnapshot {
        PipelineStatsSnapshot {
            triggers_scheduled: self.triggers_scheduled.load(Ordering::Relaxed),
            triggers_debounced: self.triggers_debounced.load(Ordering::Relaxed),
            cycles_started: self.cycles_started.load(Ordering::Relaxed),
            cycles_completed: self.cycles_completed.load(Ordering::Relaxed),
            cycles_aborted: self.cycles_aborted.load(Ordering::Relaxed),
            cycles_superseded: self.cycles_superseded.load(Ordering::Relaxed),
            cycles_skipped: self.cycles_skipped.load(Ordering::Relaxed),
            format_failures: self.format_failures.load(Ordering::Relaxed),
            translate_failures: self.translate_failures.load(Ordering::Relaxed),
            analyze_failures: self.analyze_failures.load(Ordering::Relaxed),
            processing_time: Duration::from_micros(self.processing_time.load(Ordering::Relaxed)),
        }
    }

    /// 根据连续失败次数得出各阶段健康状态
    pub fn health(&self) -> HealthStatus {
        let mut components = HashMap::new();
        for stage in [Stage::Format, Stage::Translate, Stage::Analyze] {
            let (_, streak) = self.stage_counters(stage);
            let level = match streak.load(Ordering::Relaxed) {
                0 => HealthLevel::Healthy,
                n if n >= UNHEALTHY_AFTER_FAILURES => HealthLevel::Unhealthy,
                _ => HealthLevel::Degraded,
            };
            components.insert(stage.name().to_string(), level);
        }

        let overall = if components.values().all(|&l| l == HealthLevel::Healthy) {
            HealthLevel::Healthy
        } else if components.values().any(|&l| l == HealthLevel::Unhealthy) {
            HealthLevel::Unhealthy
        } else {
            HealthLevel::Degraded
        };

        HealthStatus {
            overall,
            components,
        }
    }
}

/// 统计数据的不可变快照
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct PipelineStatsSnapshot {
    pub triggers_scheduled: usize,
    pub triggers_debounced: usize,
    pub cycles_started: usize,
    pub cycles_completed: usize,
    pub cycles_aborted: usize,
    pub cycles_superseded: usize,
    pub cycles_skipped: usize,
    pub format_failures: usize,
    pub translate_failures: usize,
    pub analyze_failures: usize,
    pub processing_time: Duration,
}

impl PipelineStatsSnapshot {
    /// 已完成周期的平均耗时
    pub fn average_cycle_time(&self) -> Duration {
        if self.cycles_completed == 0 {
            Duration::ZERO
        } else {
            self.processing_time / self.cycles_completed as u32
        }
    }
}

/// 管道健康状态
#[derive(Debug, Clone)]
pub struct HealthStatus {
    pub overall: HealthLevel,
    pub components: HashMap<String, HealthLevel>,
}

/// 健康状态级别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthLevel {
    Healthy,
    Degraded,
    Unhealthy,
}
