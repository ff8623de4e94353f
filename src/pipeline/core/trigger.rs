//! 防抖触发器
//!
//! 每次编辑都会取消尚未触发的计时器并重新安排；只有静默间隔内未被打断
//! 的计时器才会启动周期。计时器触发后周期在独立任务中运行，因此取消
//! 计时器永远不会中断正在进行的周期。

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use futures::FutureExt;
use tokio::task::{JoinError, JoinHandle};

use super::orchestrator::CycleOrchestrator;
use crate::pipeline::config::AutoProcessingConfig;
use crate::pipeline::error::PipelineError;
use crate::pipeline::types::CycleOutcome;

/// 未被 `flush` 取走的已结束周期结果最多保留的条数
pub const MAX_UNCOLLECTED_OUTCOMES: usize = 16;

struct TriggerInner {
    orchestrator: Arc<CycleOrchestrator>,
    config: RwLock<AutoProcessingConfig>,
    article_id: Option<String>,
    pending: Mutex<Option<JoinHandle<()>>>,
    cycles: Mutex<Vec<JoinHandle<CycleOutcome>>>,
    finished: Mutex<VecDeque<CycleOutcome>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl TriggerInner {
    fn config(&self) -> AutoProcessingConfig {
        *self
            .config
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 计时器到期：按当时的开关快照启动周期
    fn fire(&self) {
        let config = self.config();
        let orchestrator = Arc::clone(&self.orchestrator);
        let article_id = self.article_id.clone();

        tracing::debug!("静默间隔结束，启动周期");
        let handle = tokio::spawn(async move {
            orchestrator
                .run_cycle(config, article_id.as_deref())
                .await
        });

        let mut cycles = lock(&self.cycles);
        self.reap_finished(&mut cycles);
        cycles.push(handle);
    }

    /// 把已结束的周期移出任务列表，只保留最近的若干条结果
    fn reap_finished(&self, cycles: &mut Vec<JoinHandle<CycleOutcome>>) {
        let mut finished = lock(&self.finished);
        let mut running = Vec::with_capacity(cycles.len());

        for mut handle in cycles.drain(..) {
            if !handle.is_finished() {
                running.push(handle);
                continue;
            }
            match (&mut handle).now_or_never() {
                Some(result) => {
                    finished.push_back(join_outcome(result));
                    if finished.len() > MAX_UNCOLLECTED_OUTCOMES {
                        finished.pop_front();
                    }
                }
                None => running.push(handle),
            }
        }

        *cycles = running;
    }

    fn cancel_pending(&self) {
        if let Some(handle) = lock(&self.pending).take() {
            if !handle.is_finished() {
                handle.abort();
                self.orchestrator.session().stats().inc_triggers_debounced();
            }
        }
    }
}

/// 防抖触发器
///
/// 必须在 tokio 运行时中使用：`on_edit` 会派生计时器任务。
pub struct DebouncedTrigger {
    inner: Arc<TriggerInner>,
}

impl DebouncedTrigger {
    pub fn new(
        orchestrator: Arc<CycleOrchestrator>,
        config: AutoProcessingConfig,
        article_id: Option<String>,
    ) -> Self {
        Self {
            inner: Arc::new(TriggerInner {
                orchestrator,
                config: RwLock::new(config),
                article_id,
                pending: Mutex::new(None),
                cycles: Mutex::new(Vec::new()),
                finished: Mutex::new(VecDeque::new()),
            }),
        }
    }

    pub fn orchestrator(&self) -> &Arc<CycleOrchestrator> {
        &self.inner.orchestrator
    }

    /// 当前开关
    pub fn config(&self) -> AutoProcessingConfig {
        self.inner.config()
    }

    /// 更新开关，对之后启动的周期生效
    pub fn set_config(&self, config: AutoProcessingConfig) {
        *self
            .inner
            .config
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = config;
    }

    /// 是否有等待中的计时器
    pub fn has_pending(&self) -> bool {
        lock(&self.inner.pending)
            .as_ref()
            .map_or(false, |handle| !handle.is_finished())
    }

    /// 处理一次用户编辑，返回是否安排了新的计时器
    pub fn on_edit(&self, en: impl Into<String>) -> bool {
        let en = en.into();
        let session = self.inner.orchestrator.session();

        if session.content().en == en {
            return false;
        }

        let echo = session.is_echo(&en);
        session.edit_en(en.as_str());
        self.inner.cancel_pending();

        if echo {
            tracing::debug!("内容与上次处理结果相同，不安排周期");
            return false;
        }

        if !self.config().enabled {
            return false;
        }

        let settings = self.inner.orchestrator.settings();
        if !settings.is_eligible(&en) {
            tracing::trace!("内容过短，不安排周期");
            return false;
        }

        let quiet = settings.quiet_interval();
        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(quiet).await;
            inner.fire();
        });

        *lock(&self.inner.pending) = Some(handle);
        session.stats().inc_triggers_scheduled();
        true
    }

    /// 手动立即处理，取消等待中的计时器
    pub async fn process_now(&self) -> CycleOutcome {
        self.inner.cancel_pending();
        let config = self.config();
        self.inner
            .orchestrator
            .run_cycle(config, self.inner.article_id.as_deref())
            .await
    }

    /// 等待所有已启动的周期结束
    ///
    /// 先返回已结束但尚未取走的结果（最多 `MAX_UNCOLLECTED_OUTCOMES` 条），
    /// 再按启动顺序返回仍在运行的周期结果。
    pub async fn flush(&self) -> Vec<CycleOutcome> {
        let handles: Vec<_> = lock(&self.inner.cycles).drain(..).collect();
        let mut outcomes: Vec<_> = lock(&self.inner.finished).drain(..).collect();

        outcomes.reserve(handles.len());
        for handle in handles {
            outcomes.push(join_outcome(handle.await));
        }
        outcomes
    }

    /// 当前跟踪的周期数（运行中的任务加未取走的结果）
    pub fn tracked_cycles(&self) -> usize {
        lock(&self.inner.cycles).len() + lock(&self.inner.finished).len()
    }
}

fn join_outcome(result: Result<CycleOutcome, JoinError>) -> CycleOutcome {
    result.unwrap_or_else(|e| {
        CycleOutcome::Aborted(PipelineError::InternalError(format!(
            "周期任务异常结束: {}",
            e
        )))
    })
}

impl Drop for DebouncedTrigger {
    fn drop(&mut self) {
        if let Some(handle) = lock(&self.inner.pending).take() {
            handle.abort();
        }
    }
}
