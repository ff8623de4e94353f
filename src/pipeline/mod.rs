//! 自动处理管道
//!
//! 文章编辑器的 格式化 → 翻译 → 分析 流程：
//! - **core**: 会话状态、周期编排、防抖触发和统计
//! - **services**: 远程协作服务接口及 HTTP 实现
//! - **config**: 配置管理
//! - **types**: 数据模型
//! - **error**: 错误处理
//!
//! # 基本用法
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use autoprocess::pipeline::{
//!     Collaborators, CycleOrchestrator, DebouncedTrigger, EditorSession, HttpCollaborators,
//!     PipelineSettings,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = PipelineSettings::default();
//! let services = Collaborators::from_shared(Arc::new(HttpCollaborators::new(&settings)?));
//! let orchestrator = Arc::new(CycleOrchestrator::new(
//!     EditorSession::new(),
//!     services,
//!     settings.clone(),
//! ));
//! let trigger = DebouncedTrigger::new(orchestrator, settings.auto_processing(), None);
//!
//! trigger.on_edit("Cambodia's economy grew 6% in 2024 according to new reports.");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod services;
pub mod types;

pub use self::config::{constants, AutoProcessingConfig, ConfigManager, PipelineSettings};
pub use self::core::{
    CycleOrchestrator, CycleTicket, DebouncedTrigger, EditorSession, HealthLevel, HealthStatus,
    PipelineStats, PipelineStatsSnapshot, Stage,
};
pub use self::error::{ErrorCategory, ErrorSeverity, ErrorStats, PipelineError, PipelineResult};
#[cfg(feature = "http")]
pub use self::services::HttpCollaborators;
pub use self::services::{
    Collaborators, ContentAnalyzer, ContentFormatter, ContentTranslator, Notifier,
    TracingNotifier,
};
pub use self::types::{
    AnalysisSnapshot, AuthoredContent, ContentAnalysisReport, ContentFingerprint, CycleOutcome,
    CycleSummary, EngagementScore, Language, ProcessingStatus, ProcessingStep, ReadabilityScore,
    SeoScore, SkipReason,
};
