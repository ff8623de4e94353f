//! 简化的配置管理器
//!
//! 提供统一的配置接口，支持文件配置、环境变量和默认值

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::constants;
use crate::pipeline::error::{PipelineError, PipelineResult};

/// 用户可切换的自动处理开关
///
/// 每个周期开始时读取一次快照，周期内不再重新读取。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoProcessingConfig {
    pub enabled: bool,
    pub auto_format: bool,
    pub auto_translate: bool,
    pub auto_analyze: bool,
}

impl Default for AutoProcessingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            auto_format: true,
            auto_translate: true,
            auto_analyze: true,
        }
    }
}

impl AutoProcessingConfig {
    /// 所有阶段都关闭的配置
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

/// 管道运行配置
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineSettings {
    // 开关
    pub enabled: bool,
    pub auto_format: bool,
    pub auto_translate: bool,
    pub auto_analyze: bool,

    // 触发配置
    pub quiet_interval_ms: u64,
    pub min_content_chars: usize,
    pub done_hold_ms: u64,

    // 服务配置
    pub api_base_url: String,
    pub format_endpoint: String,
    pub translate_endpoint: String,
    pub analyze_endpoint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            auto_format: true,
            auto_translate: true,
            auto_analyze: true,

            quiet_interval_ms: constants::DEFAULT_QUIET_INTERVAL.as_millis() as u64,
            min_content_chars: constants::DEFAULT_MIN_CONTENT_CHARS,
            done_hold_ms: constants::DEFAULT_DONE_HOLD.as_millis() as u64,

            api_base_url: constants::DEFAULT_API_BASE_URL.to_string(),
            format_endpoint: constants::DEFAULT_FORMAT_ENDPOINT.to_string(),
            translate_endpoint: constants::DEFAULT_TRANSLATE_ENDPOINT.to_string(),
            analyze_endpoint: constants::DEFAULT_ANALYZE_ENDPOINT.to_string(),
            api_token: None,
            request_timeout_secs: constants::DEFAULT_REQUEST_TIMEOUT.as_secs(),
        }
    }
}

impl PipelineSettings {
    /// 验证配置
    pub fn validate(&self) -> PipelineResult<()> {
        if self.quiet_interval_ms == 0 {
            return Err(PipelineError::ConfigError("静默间隔不能为0".to_string()));
        }

        if self.min_content_chars == 0 {
            return Err(PipelineError::ConfigError("最少字符数不能为0".to_string()));
        }

        if self.request_timeout_secs == 0 {
            return Err(PipelineError::ConfigError("请求超时必须大于0".to_string()));
        }

        let base = url::Url::parse(&self.api_base_url)?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(PipelineError::ConfigError(format!(
                "不支持的协议: {}",
                base.scheme()
            )));
        }

        for endpoint in [
            &self.format_endpoint,
            &self.translate_endpoint,
            &self.analyze_endpoint,
        ] {
            if endpoint.trim().is_empty() {
                return Err(PipelineError::ConfigError("服务端点不能为空".to_string()));
            }
        }

        Ok(())
    }

    /// 应用环境变量覆盖
    ///
    /// 只有显式设置的变量才会覆盖文件中的值；格式错误的变量记录警告后忽略。
    pub fn apply_env_overrides(&mut self) {
        use crate::env::{pipeline, services, EnvVar};

        fn take<T>(name: &str, value: Option<crate::env::EnvResult<T>>) -> Option<T> {
            match value? {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!("忽略无效的环境变量 {}: {}", name, e);
                    None
                }
            }
        }

        if let Some(enabled) = take(pipeline::Enabled::NAME, pipeline::Enabled::get_set()) {
            self.enabled = enabled;
        }
        if let Some(v) = take(pipeline::AutoFormat::NAME, pipeline::AutoFormat::get_set()) {
            self.auto_format = v;
        }
        if let Some(v) = take(pipeline::AutoTranslate::NAME, pipeline::AutoTranslate::get_set()) {
            self.auto_translate = v;
        }
        if let Some(v) = take(pipeline::AutoAnalyze::NAME, pipeline::AutoAnalyze::get_set()) {
            self.auto_analyze = v;
        }
        if let Some(v) = take(pipeline::QuietInterval::NAME, pipeline::QuietInterval::get_set()) {
            self.quiet_interval_ms = v.as_millis() as u64;
        }
        if let Some(v) = take(pipeline::DoneHold::NAME, pipeline::DoneHold::get_set()) {
            self.done_hold_ms = v.as_millis() as u64;
        }
        if let Some(v) = take(
            pipeline::MinContentChars::NAME,
            pipeline::MinContentChars::get_set(),
        ) {
            self.min_content_chars = v;
        }
        if let Some(v) = take(services::ApiBaseUrl::NAME, services::ApiBaseUrl::get_set()) {
            self.api_base_url = v;
            tracing::info!("环境变量覆盖 API 地址: {}", self.api_base_url);
        }
        if let Some(v) = take(services::ApiToken::NAME, services::ApiToken::get_set()) {
            self.api_token = Some(v);
        }
        if let Some(v) = take(
            services::RequestTimeout::NAME,
            services::RequestTimeout::get_set(),
        ) {
            self.request_timeout_secs = v.as_secs();
        }
    }

    /// 当前开关的快照
    pub fn auto_processing(&self) -> AutoProcessingConfig {
        AutoProcessingConfig {
            enabled: self.enabled,
            auto_format: self.auto_format,
            auto_translate: self.auto_translate,
            auto_analyze: self.auto_analyze,
        }
    }

    pub fn quiet_interval(&self) -> Duration {
        Duration::from_millis(self.quiet_interval_ms)
    }

    pub fn done_hold(&self) -> Duration {
        Duration::from_millis(self.done_hold_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// 内容是否达到触发长度（按去除首尾空白后的字符数计）
    pub fn is_eligible(&self, en: &str) -> bool {
        let trimmed = en.trim();
        !trimmed.is_empty() && trimmed.chars().count() >= self.min_content_chars
    }
}

/// 简化的配置管理器
pub struct ConfigManager {
    settings: PipelineSettings,
}

impl ConfigManager {
    /// 创建新的配置管理器
    pub fn new() -> PipelineResult<Self> {
        let mut settings = Self::load_settings()?;
        settings.apply_env_overrides();
        settings.validate()?;

        Ok(Self { settings })
    }

    /// 从指定文件创建配置管理器（同样应用环境变量覆盖）
    pub fn from_file<P: AsRef<Path>>(path: P) -> PipelineResult<Self> {
        Self::load_dotenv();
        let mut settings = Self::load_from_file(path.as_ref())?;
        settings.apply_env_overrides();
        settings.validate()?;

        Ok(Self { settings })
    }

    /// 获取配置
    pub fn get_settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// 取出配置
    pub fn into_settings(self) -> PipelineSettings {
        self.settings
    }

    /// 从搜索路径加载配置
    fn load_settings() -> PipelineResult<PipelineSettings> {
        // 首先尝试加载 .env 文件
        Self::load_dotenv();

        for path in constants::CONFIG_PATHS {
            let expanded_path = shellexpand::tilde(path);
            let candidate = Path::new(expanded_path.as_ref());
            if candidate.exists() {
                tracing::info!("加载配置文件: {}", expanded_path);
                return Self::load_from_file(candidate);
            }
        }

        tracing::info!("未找到配置文件，使用默认配置");
        Ok(PipelineSettings::default())
    }

    /// 从指定文件加载配置
    fn load_from_file(path: &Path) -> PipelineResult<PipelineSettings> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::ConfigError(format!("读取配置文件失败 {}: {}", path.display(), e))
        })?;

        if path.extension().map_or(false, |ext| ext == "toml") {
            toml::from_str(&content)
                .map_err(|e| PipelineError::ConfigError(format!("解析TOML配置失败: {}", e)))
        } else {
            serde_json::from_str(&content)
                .map_err(|e| PipelineError::ConfigError(format!("解析JSON配置失败: {}", e)))
        }
    }

    /// 加载 .env 文件
    fn load_dotenv() {
        let env_files = [".env.local", ".env.development", ".env.production", ".env"];

        for env_file in &env_files {
            if Path::new(env_file).exists() && dotenv::from_filename(env_file).is_ok() {
                tracing::info!("已加载环境变量文件: {}", env_file);
                break;
            }
        }
    }

    /// 生成示例配置文件
    pub fn generate_example_config<P: AsRef<Path>>(path: P) -> PipelineResult<()> {
        let settings = PipelineSettings::default();
        let content = toml::to_string_pretty(&settings)
            .map_err(|e| PipelineError::ConfigError(format!("序列化配置失败: {}", e)))?;

        std::fs::write(path.as_ref(), content)
            .map_err(|e| PipelineError::ConfigError(format!("写入配置文件失败: {}", e)))?;

        Ok(())
    }
}
