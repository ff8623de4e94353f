//! 编辑器会话状态
//!
//! 会话持有双语内容、处理状态和最新分析结果。每个周期开始时领取一个
//! 单调递增的代号（generation），用户编辑也会推进代号；只有代号仍是
//! 最新的周期才能写入状态，过期周期的结果全部丢弃。

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use tokio::sync::watch;

use super::stats::PipelineStats;
use crate::pipeline::types::{
    AnalysisSnapshot, AuthoredContent, ContentAnalysisReport, ContentFingerprint,
    ProcessingStatus,
};

/// 周期凭证
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleTicket {
    id: u64,
}

impl CycleTicket {
    pub fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Debug, Default)]
struct SessionState {
    content: AuthoredContent,
    analysis: Option<AnalysisSnapshot>,
    last_processed: Option<ContentFingerprint>,
    generation: u64,
}

struct SessionInner {
    state: Mutex<SessionState>,
    status_tx: watch::Sender<ProcessingStatus>,
    stats: PipelineStats,
}

/// 编辑器会话（可廉价克隆，克隆共享同一状态）
#[derive(Clone)]
pub struct EditorSession {
    inner: Arc<SessionInner>,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorSession {
    pub fn new() -> Self {
        Self::with_content(AuthoredContent::default())
    }

    pub fn with_content(content: AuthoredContent) -> Self {
        let (status_tx, _) = watch::channel(ProcessingStatus::idle());
        Self {
            inner: Arc::new(SessionInner {
                state: Mutex::new(SessionState {
                    content,
                    ..Default::default()
                }),
                status_tx,
                stats: PipelineStats::default(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        // 锁内没有可能 panic 的写入，中毒时继续使用内部数据
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn content(&self) -> AuthoredContent {
        self.lock().content.clone()
    }

    pub fn status(&self) -> ProcessingStatus {
        *self.inner.status_tx.borrow()
    }

    /// 订阅处理状态变化
    pub fn subscribe_status(&self) -> watch::Receiver<ProcessingStatus> {
        self.inner.status_tx.subscribe()
    }

    pub fn analysis(&self) -> Option<AnalysisSnapshot> {
        self.lock().analysis.clone()
    }

    pub fn report(&self) -> Option<ContentAnalysisReport> {
        self.lock().analysis.as_ref().map(|a| a.report.clone())
    }

    pub fn stats(&self) -> &PipelineStats {
        &self.inner.stats
    }

    /// 当前代号
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// 载入另一篇文章：替换全部内容并清空分析结果
    pub fn load(&self, content: AuthoredContent) {
        let mut state = self.lock();
        state.generation += 1;
        state.content = content;
        state.analysis = None;
        state.last_processed = None;
        self.inner.status_tx.send_replace(ProcessingStatus::idle());
    }

    /// 用户编辑英文内容
    ///
    /// 编辑会使进行中的周期过期；若状态不是 Idle 则立即复位。
    /// 返回是否有周期因此过期。
    pub fn edit_en(&self, en: impl Into<String>) -> bool {
        let mut state = self.lock();
        state.generation += 1;
        state.content.en = en.into();

        let was_active = !self.inner.status_tx.borrow().is_idle();
        if was_active {
            tracing::debug!("编辑使进行中的周期过期，状态复位");
            self.inner.status_tx.send_replace(ProcessingStatus::idle());
        }
        was_active
    }

    /// 该内容是否就是上一次处理完成的输出
    pub fn is_echo(&self, en: &str) -> bool {
        self.lock().last_processed == Some(ContentFingerprint::of(en))
    }

    /// 开始新周期：推进代号并把状态复位为 Idle
    ///
    /// 返回的内容快照与凭证在同一次加锁内取得。
    pub fn begin_cycle(&self) -> (CycleTicket, AuthoredContent) {
        let mut state = self.lock();
        self.start_cycle(&mut state)
    }

    /// 仅当当前内容满足条件时开始新周期，否则不推进代号
    pub fn begin_cycle_if<F>(&self, eligible: F) -> Option<(CycleTicket, AuthoredContent)>
    where
        F: FnOnce(&AuthoredContent) -> bool,
    {
        let mut state = self.lock();
        if !eligible(&state.content) {
            return None;
        }
        Some(self.start_cycle(&mut state))
    }

    fn start_cycle(&self, state: &mut SessionState) -> (CycleTicket, AuthoredContent) {
        state.generation += 1;
        self.inner.status_tx.send_replace(ProcessingStatus::idle());
        self.inner.stats.inc_cycles_started();
        let ticket = CycleTicket {
            id: state.generation,
        };
        (ticket, state.content.clone())
    }

    pub fn is_current(&self, ticket: &CycleTicket) -> bool {
        self.lock().generation == ticket.id
    }

    /// 写入处理状态（过期周期返回 false）
    pub fn set_status(&self, ticket: &CycleTicket, status: ProcessingStatus) -> bool {
        let state = self.lock();
        if state.generation != ticket.id {
            return false;
        }
        self.inner.status_tx.send_replace(status);
        true
    }

    /// 整体替换内容（过期周期返回 false）
    pub fn commit_content(&self, ticket: &CycleTicket, content: &AuthoredContent) -> bool {
        let mut state = self.lock();
        if state.generation != ticket.id {
            return false;
        }
        state.content = content.clone();
        true
    }

    /// 整体替换分析报告（过期周期返回 false）
    pub fn commit_report(&self, ticket: &CycleTicket, report: ContentAnalysisReport) -> bool {
        let mut state = self.lock();
        if state.generation != ticket.id {
            return false;
        }
        state.analysis = Some(AnalysisSnapshot {
            report,
            cycle_id: ticket.id,
            received_at: Utc::now(),
        });
        true
    }

    /// 记录本周期最终英文内容的指纹
    pub fn mark_processed(&self, ticket: &CycleTicket) -> bool {
        let mut state = self.lock();
        if state.generation != ticket.id {
            return false;
        }
        state.last_processed = Some(state.content.fingerprint());
        true
    }
}
