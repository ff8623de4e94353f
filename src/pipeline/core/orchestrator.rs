//! 周期编排器
//!
//! 按 Idle → Formatting → Translating → Analyzing → Done → Idle 的顺序推进
//! 单个处理周期。格式化失败终止整个周期；翻译和分析失败只记录日志。
//!
//! 每次写入前都会校验周期凭证，一旦发现周期已过期（新周期开始或用户
//! 再次编辑），编排器在下一个阶段边界停止，不再写入任何状态。

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;

use super::session::{CycleTicket, EditorSession};
use super::stats::Stage;
use crate::pipeline::config::{constants, AutoProcessingConfig, PipelineSettings};
use crate::pipeline::error::{helpers, PipelineError, PipelineResult};
use crate::pipeline::services::{Collaborators, Notifier, TracingNotifier};
use crate::pipeline::types::{
    AuthoredContent, CycleOutcome, CycleSummary, Language, ProcessingStatus, ProcessingStep,
    SkipReason,
};

const SUCCESS_MESSAGE: &str = "内容已自动处理完成";
const FAILURE_MESSAGE: &str = "内容自动处理失败";

/// 周期内部的推进结果
enum Flow {
    Finished(CycleSummary),
    Superseded,
}

/// 周期编排器
pub struct CycleOrchestrator {
    session: EditorSession,
    services: Collaborators,
    notifier: Arc<dyn Notifier>,
    settings: PipelineSettings,
}

impl CycleOrchestrator {
    pub fn new(
        session: EditorSession,
        services: Collaborators,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            session,
            services,
            notifier: Arc::new(TracingNotifier),
            settings,
        }
    }

    /// 替换提示通道
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn session(&self) -> &EditorSession {
        &self.session
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// 运行一个完整周期
    ///
    /// `config` 是周期开始时的开关快照，周期内不会重新读取。
    pub async fn run_cycle(
        &self,
        config: AutoProcessingConfig,
        article_id: Option<&str>,
    ) -> CycleOutcome {
        if !config.enabled {
            tracing::debug!("自动处理已关闭，跳过周期");
            self.session.stats().inc_cycles_skipped();
            return CycleOutcome::Skipped(SkipReason::Disabled);
        }

        let settings = &self.settings;
        let (ticket, original) = match self
            .session
            .begin_cycle_if(|content| settings.is_eligible(&content.en))
        {
            Some(started) => started,
            None => {
                tracing::debug!(
                    "内容少于 {} 个字符，跳过周期",
                    self.settings.min_content_chars
                );
                self.session.stats().inc_cycles_skipped();
                return CycleOutcome::Skipped(SkipReason::TooShort);
            }
        };

        let started = Instant::now();
        tracing::info!(
            cycle = ticket.id(),
            format = config.auto_format,
            translate = config.auto_translate,
            analyze = config.auto_analyze,
            "开始自动处理周期"
        );

        let flow = AssertUnwindSafe(self.drive(&ticket, &config, original, article_id, started))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                Err(PipelineError::InternalError(format!(
                    "处理周期异常终止: {}",
                    panic_message(panic.as_ref())
                )))
            });

        match flow {
            Ok(Flow::Finished(summary)) => {
                self.session.stats().inc_cycles_completed(summary.elapsed);
                self.notifier.success(SUCCESS_MESSAGE);
                tracing::info!(cycle = ticket.id(), elapsed = ?summary.elapsed, "周期完成");

                self.hold_done(&ticket).await;
                CycleOutcome::Completed(summary)
            }
            Ok(Flow::Superseded) => self.superseded(&ticket),
            Err(error) => {
                // 周期已过期时错误不再属于当前会话
                if !self.session.set_status(&ticket, ProcessingStatus::idle()) {
                    return self.superseded(&ticket);
                }
                helpers::trace_error(&error);
                self.session.stats().inc_cycles_aborted();
                self.notifier.error(&format!("{}: {}", FAILURE_MESSAGE, error));
                CycleOutcome::Aborted(error)
            }
        }
    }

    fn superseded(&self, ticket: &CycleTicket) -> CycleOutcome {
        tracing::debug!(cycle = ticket.id(), "周期已过期，丢弃结果");
        self.session.stats().inc_cycles_superseded();
        CycleOutcome::Superseded
    }

    /// 在 Done 状态停留片刻后复位为 Idle
    async fn hold_done(&self, ticket: &CycleTicket) {
        let hold = self.settings.done_hold();
        if hold > Duration::ZERO {
            tokio::time::sleep(hold).await;
        }
        self.session.set_status(ticket, ProcessingStatus::idle());
    }

    fn checkpoint(&self, ticket: &CycleTicket, step: ProcessingStep, progress: u8) -> bool {
        self.session
            .set_status(ticket, ProcessingStatus::at(step, progress))
    }

    async fn drive(
        &self,
        ticket: &CycleTicket,
        config: &AutoProcessingConfig,
        original: AuthoredContent,
        article_id: Option<&str>,
        started: Instant,
    ) -> Result<Flow, PipelineError> {
        let mut working = original;
        let mut summary = CycleSummary {
            cycle_id: ticket.id(),
            formatted: false,
            translated: false,
            analyzed: false,
            elapsed: Duration::ZERO,
        };

        // 格式化：失败即终止
        if !self.checkpoint(ticket, ProcessingStep::Formatting, constants::PROGRESS_FORMAT_START) {
            return Ok(Flow::Superseded);
        }
        if config.auto_format {
            let request = AuthoredContent::english(working.en.clone());
            let formatted = match guarded(
                Stage::Format,
                self.services.formatter.format(&request, article_id),
            )
            .await
            {
                Ok(formatted) => formatted,
                Err(e) => {
                    self.session.stats().record_stage_failure(Stage::Format, &e);
                    return Err(e.with_context("格式化阶段"));
                }
            };
            if formatted.en.trim().is_empty() {
                let e = helpers::validation_error("格式化服务返回了空的英文内容");
                self.session.stats().record_stage_failure(Stage::Format, &e);
                return Err(e);
            }
            self.session.stats().record_stage_success(Stage::Format);

            working.en = formatted.en;
            // 格式化返回的高棉文只是临时结果，空值不覆盖已有译文
            if !formatted.kh.trim().is_empty() {
                working.kh = formatted.kh;
            }
            if !self.session.commit_content(ticket, &working) {
                return Ok(Flow::Superseded);
            }
            summary.formatted = true;
            tracing::debug!(cycle = ticket.id(), "格式化完成");
        }
        if !self.checkpoint(ticket, ProcessingStep::Formatting, constants::PROGRESS_FORMAT_DONE) {
            return Ok(Flow::Superseded);
        }

        // 翻译：尽力而为
        if !self.checkpoint(
            ticket,
            ProcessingStep::Translating,
            constants::PROGRESS_TRANSLATE_START,
        ) {
            return Ok(Flow::Superseded);
        }
        if config.auto_translate {
            match guarded(
                Stage::Translate,
                self.services.translator.translate(&working.en, Language::Kh),
            )
            .await
            {
                Ok(kh) if !kh.trim().is_empty() => {
                    self.session.stats().record_stage_success(Stage::Translate);
                    working.kh = kh;
                    if !self.session.commit_content(ticket, &working) {
                        return Ok(Flow::Superseded);
                    }
                    summary.translated = true;
                    tracing::debug!(cycle = ticket.id(), "翻译完成");
                }
                Ok(_) => {
                    let e = PipelineError::ParseError("翻译服务返回了空译文".to_string());
                    tracing::warn!(cycle = ticket.id(), "翻译失败，保留原有译文: {}", e);
                    self.session.stats().record_stage_failure(Stage::Translate, &e);
                }
                Err(e) => {
                    tracing::warn!(cycle = ticket.id(), "翻译失败，保留原有译文: {}", e);
                    self.session.stats().record_stage_failure(Stage::Translate, &e);
                }
            }
        }
        if !self.checkpoint(
            ticket,
            ProcessingStep::Translating,
            constants::PROGRESS_TRANSLATE_DONE,
        ) {
            return Ok(Flow::Superseded);
        }

        // 分析：尽力而为，只写报告
        if !self.checkpoint(ticket, ProcessingStep::Analyzing, constants::PROGRESS_ANALYZE_START) {
            return Ok(Flow::Superseded);
        }
        if config.auto_analyze {
            match guarded(Stage::Analyze, self.services.analyzer.analyze(&working.en)).await {
                Ok(report) => {
                    self.session.stats().record_stage_success(Stage::Analyze);
                    if !self.session.commit_report(ticket, report) {
                        return Ok(Flow::Superseded);
                    }
                    summary.analyzed = true;
                    tracing::debug!(cycle = ticket.id(), "分析完成");
                }
                Err(e) => {
                    tracing::warn!(cycle = ticket.id(), "内容分析失败: {}", e);
                    self.session.stats().record_stage_failure(Stage::Analyze, &e);
                }
            }
        }
        if !self.checkpoint(ticket, ProcessingStep::Analyzing, constants::PROGRESS_ANALYZE_DONE) {
            return Ok(Flow::Superseded);
        }

        if !self.session.mark_processed(ticket)
            || !self.session.set_status(ticket, ProcessingStatus::done())
        {
            return Ok(Flow::Superseded);
        }

        summary.elapsed = started.elapsed();
        Ok(Flow::Finished(summary))
    }
}

/// 调用协作服务，服务内部 panic 转换为内部错误
async fn guarded<T, F>(stage: Stage, call: F) -> PipelineResult<T>
where
    F: Future<Output = PipelineResult<T>>,
{
    match AssertUnwindSafe(call).catch_unwind().await {
        Ok(result) => result,
        Err(panic) => Err(PipelineError::InternalError(format!(
            "{} 服务异常: {}",
            stage.name(),
            panic_message(panic.as_ref())
        ))),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "未知 panic".to_string()
    }
}
