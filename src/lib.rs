//! # Autoprocess
//!
//! 双语（英文/高棉文）文章编辑器的自动处理管道：在用户停止输入后
//! 依次调用格式化、翻译和内容分析服务，并维护编辑器的内存状态。
//!
//! ## 模块组织
//!
//! - `pipeline` - 会话状态、周期编排、防抖触发和远程服务
//! - `env` - 类型安全的环境变量

pub mod env;
pub mod pipeline;

// Re-export commonly used items for convenience
pub use pipeline::{
    AuthoredContent, AutoProcessingConfig, Collaborators, ContentAnalysisReport, CycleOrchestrator,
    CycleOutcome, DebouncedTrigger, EditorSession, PipelineError, PipelineResult,
    PipelineSettings, ProcessingStatus, ProcessingStep,
};
