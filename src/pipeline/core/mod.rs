//! 管道核心
//!
//! - `session`: 编辑器会话状态与周期代号
//! - `orchestrator`: 单个周期的状态机
//! - `trigger`: 防抖触发
//! - `stats`: 统计与健康状态

pub mod orchestrator;
pub mod session;
pub mod stats;
pub mod trigger;

pub use orchestrator::CycleOrchestrator;
pub use session::{CycleTicket, EditorSession};
pub use stats::{HealthLevel, HealthStatus, PipelineStats, PipelineStatsSnapshot, Stage};
pub use trigger::{DebouncedTrigger, MAX_UNCOLLECTED_OUTCOMES};
