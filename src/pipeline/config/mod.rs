//! 自动处理配置管理模块
//!
//! 提供简化的配置管理，支持环境变量、配置文件和默认值

pub mod manager;

// 重新导出主要类型
pub use manager::{AutoProcessingConfig, ConfigManager, PipelineSettings};

/// 配置常量
pub mod constants {
    use std::time::Duration;

    // 触发相关
    pub const DEFAULT_QUIET_INTERVAL: Duration = Duration::from_millis(2000);
    pub const DEFAULT_MIN_CONTENT_CHARS: usize = 50;
    pub const DEFAULT_DONE_HOLD: Duration = Duration::from_millis(1000);

    // 默认API设置
    pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";
    pub const DEFAULT_FORMAT_ENDPOINT: &str = "/api/ai/format-content";
    pub const DEFAULT_TRANSLATE_ENDPOINT: &str = "/api/ai/translate";
    pub const DEFAULT_ANALYZE_ENDPOINT: &str = "/api/ai/analyze-content";
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

    // 进度检查点
    pub const PROGRESS_FORMAT_START: u8 = 10;
    pub const PROGRESS_FORMAT_DONE: u8 = 30;
    pub const PROGRESS_TRANSLATE_START: u8 = 50;
    pub const PROGRESS_TRANSLATE_DONE: u8 = 70;
    pub const PROGRESS_ANALYZE_START: u8 = 85;
    pub const PROGRESS_ANALYZE_DONE: u8 = 90;
    pub const PROGRESS_COMPLETE: u8 = 100;

    // 配置文件搜索路径
    pub const CONFIG_PATHS: &[&str] = &[
        "autoprocess.toml",
        ".autoprocess.toml",
        "autoprocess.json",
        "~/.config/autoprocess/config.toml",
        "/etc/autoprocess/config.toml",
    ];
}
