//! 统一的环境变量管理系统
//!
//! 提供类型安全、可验证的环境变量访问，所有变量统一使用 `AUTOPROCESS_` 前缀

use std::env;
use std::fmt;
use std::time::Duration;

/// 环境变量解析错误
#[derive(Debug, Clone)]
pub struct EnvError {
    pub variable: String,
    pub message: String,
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Environment variable '{}': {}", self.variable, self.message)
    }
}

impl std::error::Error for EnvError {}

pub type EnvResult<T> = Result<T, EnvError>;

/// 环境变量访问器特性
pub trait EnvVar<T> {
    const NAME: &'static str;
    const DEFAULT: Option<T>;
    const DESCRIPTION: &'static str;

    fn parse(value: &str) -> EnvResult<T>;

    fn get() -> EnvResult<T> {
        match env::var(Self::NAME) {
            Ok(value) => Self::parse(&value),
            Err(_) => {
                if let Some(default) = Self::DEFAULT {
                    Ok(default)
                } else {
                    Err(EnvError {
                        variable: Self::NAME.to_string(),
                        message: "Required environment variable not set".to_string(),
                    })
                }
            }
        }
    }

    /// 仅在变量被显式设置时返回值
    fn get_set() -> Option<EnvResult<T>> {
        env::var(Self::NAME).ok().map(|value| Self::parse(&value))
    }

    fn get_or_default(default: T) -> T {
        Self::get().unwrap_or(default)
    }
}

/// 核心环境变量定义
pub mod core {
    use super::*;

    /// 日志级别
    pub struct LogLevel;
    impl EnvVar<String> for LogLevel {
        const NAME: &'static str = "AUTOPROCESS_LOG_LEVEL";
        const DEFAULT: Option<String> = None;

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("info".to_string()),
            }
        }
        const DESCRIPTION: &'static str = "Log level: trace, debug, info, warn, error";

        fn parse(value: &str) -> EnvResult<String> {
            match value.to_lowercase().as_str() {
                "trace" | "debug" | "info" | "warn" | "error" => Ok(value.to_lowercase()),
                _ => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!(
                        "Invalid log level '{}'. Use: trace, debug, info, warn, error",
                        value
                    ),
                }),
            }
        }
    }
}

/// 自动处理开关
pub mod pipeline {
    use super::*;

    /// 自动处理总开关
    pub struct Enabled;
    impl EnvVar<bool> for Enabled {
        const NAME: &'static str = "AUTOPROCESS_ENABLED";
        const DEFAULT: Option<bool> = Some(true);
        const DESCRIPTION: &'static str = "Enable automatic processing of edited content";

        fn parse(value: &str) -> EnvResult<bool> {
            parse_bool(value, Self::NAME)
        }
    }

    /// 自动格式化
    pub struct AutoFormat;
    impl EnvVar<bool> for AutoFormat {
        const NAME: &'static str = "AUTOPROCESS_AUTO_FORMAT";
        const DEFAULT: Option<bool> = Some(true);
        const DESCRIPTION: &'static str = "Run the format stage in each cycle";

        fn parse(value: &str) -> EnvResult<bool> {
            parse_bool(value, Self::NAME)
        }
    }

    /// 自动翻译
    pub struct AutoTranslate;
    impl EnvVar<bool> for AutoTranslate {
        const NAME: &'static str = "AUTOPROCESS_AUTO_TRANSLATE";
        const DEFAULT: Option<bool> = Some(true);
        const DESCRIPTION: &'static str = "Run the Khmer translation stage in each cycle";

        fn parse(value: &str) -> EnvResult<bool> {
            parse_bool(value, Self::NAME)
        }
    }

    /// 自动分析
    pub struct AutoAnalyze;
    impl EnvVar<bool> for AutoAnalyze {
        const NAME: &'static str = "AUTOPROCESS_AUTO_ANALYZE";
        const DEFAULT: Option<bool> = Some(true);
        const DESCRIPTION: &'static str = "Run the content analysis stage in each cycle";

        fn parse(value: &str) -> EnvResult<bool> {
            parse_bool(value, Self::NAME)
        }
    }

    /// 静默间隔（毫秒）
    pub struct QuietInterval;
    impl EnvVar<Duration> for QuietInterval {
        const NAME: &'static str = "AUTOPROCESS_QUIET_INTERVAL_MS";
        const DEFAULT: Option<Duration> = Some(Duration::from_millis(2000));
        const DESCRIPTION: &'static str = "Milliseconds without edits before a cycle starts";

        fn parse(value: &str) -> EnvResult<Duration> {
            parse_millis(value, Self::NAME, 1, 60_000)
        }
    }

    /// 完成状态保持时间（毫秒）
    pub struct DoneHold;
    impl EnvVar<Duration> for DoneHold {
        const NAME: &'static str = "AUTOPROCESS_DONE_HOLD_MS";
        const DEFAULT: Option<Duration> = Some(Duration::from_millis(1000));
        const DESCRIPTION: &'static str = "Milliseconds the Done step stays visible before Idle";

        fn parse(value: &str) -> EnvResult<Duration> {
            parse_millis(value, Self::NAME, 0, 10_000)
        }
    }

    /// 触发所需的最少字符数
    pub struct MinContentChars;
    impl EnvVar<usize> for MinContentChars {
        const NAME: &'static str = "AUTOPROCESS_MIN_CONTENT_CHARS";
        const DEFAULT: Option<usize> = Some(50);
        const DESCRIPTION: &'static str = "Minimum content length (characters) that triggers a cycle";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_positive_usize(value, Self::NAME, 1, 100_000)
        }
    }
}

/// 远程服务相关环境变量
pub mod services {
    use super::*;

    /// 服务基础地址
    pub struct ApiBaseUrl;
    impl EnvVar<String> for ApiBaseUrl {
        const NAME: &'static str = "AUTOPROCESS_API_BASE_URL";
        const DEFAULT: Option<String> = None;

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("http://localhost:5000".to_string()),
            }
        }
        const DESCRIPTION: &'static str = "Base URL of the format/translate/analyze API";

        fn parse(value: &str) -> EnvResult<String> {
            let url = value.trim();
            if url.starts_with("http://") || url.starts_with("https://") {
                Ok(url.to_string())
            } else {
                Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "API URL must start with http:// or https://".to_string(),
                })
            }
        }
    }

    /// 认证令牌
    pub struct ApiToken;
    impl EnvVar<String> for ApiToken {
        const NAME: &'static str = "AUTOPROCESS_API_TOKEN";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Bearer token sent to the API (optional)";

        fn parse(value: &str) -> EnvResult<String> {
            let token = value.trim();
            if token.is_empty() {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Token must not be empty".to_string(),
                });
            }
            Ok(token.to_string())
        }
    }

    /// 请求超时（秒）
    pub struct RequestTimeout;
    impl EnvVar<Duration> for RequestTimeout {
        const NAME: &'static str = "AUTOPROCESS_REQUEST_TIMEOUT";
        const DEFAULT: Option<Duration> = Some(Duration::from_secs(60));
        const DESCRIPTION: &'static str = "HTTP request timeout in seconds";

        fn parse(value: &str) -> EnvResult<Duration> {
            let seconds: u64 = value.parse().map_err(|_| EnvError {
                variable: Self::NAME.to_string(),
                message: "Must be a valid number of seconds".to_string(),
            })?;

            if seconds == 0 {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Timeout must be greater than 0".to_string(),
                });
            }

            if seconds > 600 {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Timeout too long (max 600 seconds)".to_string(),
                });
            }

            Ok(Duration::from_secs(seconds))
        }
    }
}

/// 辅助函数
fn parse_bool(value: &str, var_name: &str) -> EnvResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "enabled" => Ok(true),
        "false" | "0" | "no" | "off" | "disabled" => Ok(false),
        _ => Err(EnvError {
            variable: var_name.to_string(),
            message: format!(
                "Invalid boolean value '{}'. Use: true/false, 1/0, yes/no, on/off, enabled/disabled",
                value
            ),
        }),
    }
}

fn parse_positive_usize(value: &str, var_name: &str, min: usize, max: usize) -> EnvResult<usize> {
    let num: usize = value.trim().parse().map_err(|_| EnvError {
        variable: var_name.to_string(),
        message: "Must be a valid positive number".to_string(),
    })?;

    if num < min {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} is below minimum {}", num, min),
        });
    }

    if num > max {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} exceeds maximum {}", num, max),
        });
    }

    Ok(num)
}

fn parse_millis(value: &str, var_name: &str, min: u64, max: u64) -> EnvResult<Duration> {
    let millis: u64 = value.trim().parse().map_err(|_| EnvError {
        variable: var_name.to_string(),
        message: "Must be a valid number of milliseconds".to_string(),
    })?;

    if millis < min || millis > max {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} must be between {} and {}", millis, min, max),
        });
    }

    Ok(Duration::from_millis(millis))
}

/// 环境变量配置汇总
#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub log_level: String,

    pub enabled: bool,
    pub auto_format: bool,
    pub auto_translate: bool,
    pub auto_analyze: bool,
    pub quiet_interval: Duration,
    pub done_hold: Duration,
    pub min_content_chars: usize,

    pub api_base_url: String,
    pub api_token: Option<String>,
    pub request_timeout: Duration,
}

impl EnvConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> EnvResult<Self> {
        Ok(Self {
            log_level: core::LogLevel::get()?,

            enabled: pipeline::Enabled::get()?,
            auto_format: pipeline::AutoFormat::get()?,
            auto_translate: pipeline::AutoTranslate::get()?,
            auto_analyze: pipeline::AutoAnalyze::get()?,
            quiet_interval: pipeline::QuietInterval::get()?,
            done_hold: pipeline::DoneHold::get()?,
            min_content_chars: pipeline::MinContentChars::get()?,

            api_base_url: services::ApiBaseUrl::get()?,
            api_token: services::ApiToken::get().ok(),
            request_timeout: services::RequestTimeout::get()?,
        })
    }

    /// 打印配置摘要（隐藏敏感信息）
    pub fn print_summary(&self) {
        println!("Environment Configuration Summary:");
        println!("  Log Level: {}", self.log_level);
        println!(
            "  Auto-processing: {}",
            if self.enabled { "enabled" } else { "disabled" }
        );
        println!(
            "  Stages: format={} translate={} analyze={}",
            self.auto_format, self.auto_translate, self.auto_analyze
        );
        println!("  Quiet interval: {:?}", self.quiet_interval);
        println!("  API: {}", self.api_base_url);
        if self.api_token.is_some() {
            println!("  API Token: [configured]");
        }
    }
}

fn doc_line<T: fmt::Debug>(name: &str, description: &str, default: Option<T>) -> String {
    format!("- `{}`: {} (default: {:?})\n", name, description, default)
}

/// 环境变量文档生成器
pub fn generate_env_docs() -> String {
    let mut docs = String::new();
    docs.push_str("# Environment Variables Documentation\n\n");

    docs.push_str("## Core Configuration\n\n");
    docs.push_str(&doc_line(
        core::LogLevel::NAME,
        core::LogLevel::DESCRIPTION,
        Some("info"),
    ));

    docs.push_str("\n## Pipeline Configuration\n\n");
    docs.push_str(&doc_line(
        pipeline::Enabled::NAME,
        pipeline::Enabled::DESCRIPTION,
        pipeline::Enabled::DEFAULT,
    ));
    docs.push_str(&doc_line(
        pipeline::AutoFormat::NAME,
        pipeline::AutoFormat::DESCRIPTION,
        pipeline::AutoFormat::DEFAULT,
    ));
    docs.push_str(&doc_line(
        pipeline::AutoTranslate::NAME,
        pipeline::AutoTranslate::DESCRIPTION,
        pipeline::AutoTranslate::DEFAULT,
    ));
    docs.push_str(&doc_line(
        pipeline::AutoAnalyze::NAME,
        pipeline::AutoAnalyze::DESCRIPTION,
        pipeline::AutoAnalyze::DEFAULT,
    ));
    docs.push_str(&doc_line(
        pipeline::QuietInterval::NAME,
        pipeline::QuietInterval::DESCRIPTION,
        pipeline::QuietInterval::DEFAULT,
    ));
    docs.push_str(&doc_line(
        pipeline::DoneHold::NAME,
        pipeline::DoneHold::DESCRIPTION,
        pipeline::DoneHold::DEFAULT,
    ));
    docs.push_str(&doc_line(
        pipeline::MinContentChars::NAME,
        pipeline::MinContentChars::DESCRIPTION,
        pipeline::MinContentChars::DEFAULT,
    ));

    docs.push_str("\n## Service Configuration\n\n");
    docs.push_str(&doc_line(
        services::ApiBaseUrl::NAME,
        services::ApiBaseUrl::DESCRIPTION,
        Some("http://localhost:5000"),
    ));
    docs.push_str(&doc_line(
        services::ApiToken::NAME,
        services::ApiToken::DESCRIPTION,
        services::ApiToken::DEFAULT,
    ));
    docs.push_str(&doc_line(
        services::RequestTimeout::NAME,
        services::RequestTimeout::DESCRIPTION,
        services::RequestTimeout::DEFAULT,
    ));

    docs
}
