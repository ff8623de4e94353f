//! 自动处理管道统一错误处理
//!
//! 提供结构化错误类型和错误处理机制

use std::fmt;

use thiserror::Error;

use crate::env::EnvError;

/// 管道错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// 配置错误
    #[error("配置错误: {0}")]
    ConfigError(String),

    /// 网络错误
    #[error("网络错误: {0}")]
    NetworkError(String),

    /// 远程服务返回失败
    #[error("服务错误: {0}")]
    ServiceError(String),

    /// 输入验证错误
    #[error("输入无效: {0}")]
    InvalidInput(String),

    /// 响应解析错误
    #[error("解析错误: {0}")]
    ParseError(String),

    /// 序列化错误
    #[error("序列化错误: {0}")]
    SerializationError(String),

    /// 超时错误
    #[error("操作超时: {0}")]
    TimeoutError(String),

    /// 内部错误
    #[error("内部错误: {0}")]
    InternalError(String),
}

impl PipelineError {
    /// 检查错误是否可重试
    pub fn is_retryable(&self) -> bool {
        match self {
            PipelineError::NetworkError(_) => true,
            PipelineError::TimeoutError(_) => true,
            PipelineError::ServiceError(_) => true,
            PipelineError::ConfigError(_) => false,
            PipelineError::InvalidInput(_) => false,
            PipelineError::ParseError(_) => false,
            PipelineError::SerializationError(_) => false,
            PipelineError::InternalError(_) => false,
        }
    }

    /// 获取错误的严重程度
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            PipelineError::ConfigError(_) => ErrorSeverity::Critical,
            PipelineError::NetworkError(_) => ErrorSeverity::Warning,
            PipelineError::ServiceError(_) => ErrorSeverity::Error,
            PipelineError::InvalidInput(_) => ErrorSeverity::Info,
            PipelineError::ParseError(_) => ErrorSeverity::Error,
            PipelineError::SerializationError(_) => ErrorSeverity::Error,
            PipelineError::TimeoutError(_) => ErrorSeverity::Warning,
            PipelineError::InternalError(_) => ErrorSeverity::Critical,
        }
    }

    /// 获取错误类别
    pub fn category(&self) -> ErrorCategory {
        match self {
            PipelineError::ConfigError(_) => ErrorCategory::Configuration,
            PipelineError::NetworkError(_) => ErrorCategory::Network,
            PipelineError::ServiceError(_) => ErrorCategory::Service,
            PipelineError::InvalidInput(_) => ErrorCategory::Input,
            PipelineError::ParseError(_) => ErrorCategory::Parsing,
            PipelineError::SerializationError(_) => ErrorCategory::Serialization,
            PipelineError::TimeoutError(_) => ErrorCategory::Timeout,
            PipelineError::InternalError(_) => ErrorCategory::Internal,
        }
    }

    /// 创建带上下文的错误
    pub fn with_context<T: fmt::Display>(mut self, context: T) -> Self {
        let new_msg = match &self {
            PipelineError::ConfigError(msg)
            | PipelineError::NetworkError(msg)
            | PipelineError::ServiceError(msg)
            | PipelineError::InvalidInput(msg)
            | PipelineError::ParseError(msg)
            | PipelineError::SerializationError(msg)
            | PipelineError::TimeoutError(msg)
            | PipelineError::InternalError(msg) => format!("{} (上下文: {})", msg, context),
        };

        match &mut self {
            PipelineError::ConfigError(ref mut msg)
            | PipelineError::NetworkError(ref mut msg)
            | PipelineError::ServiceError(ref mut msg)
            | PipelineError::InvalidInput(ref mut msg)
            | PipelineError::ParseError(ref mut msg)
            | PipelineError::SerializationError(ref mut msg)
            | PipelineError::TimeoutError(ref mut msg)
            | PipelineError::InternalError(ref mut msg) => *msg = new_msg,
        }

        self
    }
}

/// 错误严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Service,
    Input,
    Parsing,
    Serialization,
    Timeout,
    Internal,
}

impl From<std::io::Error> for PipelineError {
    fn from(error: std::io::Error) -> Self {
        PipelineError::InternalError(format!("IO错误: {}", error))
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(error: serde_json::Error) -> Self {
        PipelineError::SerializationError(format!("JSON序列化错误: {}", error))
    }
}

impl From<toml::de::Error> for PipelineError {
    fn from(error: toml::de::Error) -> Self {
        PipelineError::ConfigError(format!("TOML解析错误: {}", error))
    }
}

impl From<url::ParseError> for PipelineError {
    fn from(error: url::ParseError) -> Self {
        PipelineError::ConfigError(format!("无效的服务地址: {}", error))
    }
}

impl From<EnvError> for PipelineError {
    fn from(error: EnvError) -> Self {
        PipelineError::ConfigError(error.to_string())
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for PipelineError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            PipelineError::TimeoutError(format!("请求超时: {}", error))
        } else if error.is_decode() {
            PipelineError::ParseError(format!("响应解码失败: {}", error))
        } else if let Some(status) = error.status() {
            PipelineError::ServiceError(format!("HTTP {}: {}", status, error))
        } else {
            PipelineError::NetworkError(error.to_string())
        }
    }
}

/// 错误结果类型别名
pub type PipelineResult<T> = Result<T, PipelineError>;

/// 错误统计信息
#[derive(Debug, Clone, Default)]
pub struct ErrorStats {
    pub total_errors: usize,
    pub by_category: std::collections::HashMap<ErrorCategory, usize>,
    pub by_severity: std::collections::HashMap<ErrorSeverity, usize>,
    pub retryable_errors: usize,
    pub critical_errors: usize,
}

impl ErrorStats {
    /// 记录错误
    pub fn record_error(&mut self, error: &PipelineError) {
        self.total_errors += 1;

        let category = error.category();
        *self.by_category.entry(category).or_insert(0) += 1;

        let severity = error.severity();
        *self.by_severity.entry(severity).or_insert(0) += 1;

        if error.is_retryable() {
            self.retryable_errors += 1;
        }

        if severity == ErrorSeverity::Critical {
            self.critical_errors += 1;
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Default::default();
    }

    /// 获取错误率
    pub fn error_rate(&self, total_operations: usize) -> f64 {
        if total_operations == 0 {
            0.0
        } else {
            self.total_errors as f64 / total_operations as f64
        }
    }
}

/// 错误处理助手函数
pub mod helpers {
    use super::*;

    /// 按严重程度记录错误，不改变返回值
    pub fn trace_error(error: &PipelineError) {
        match error.severity() {
            ErrorSeverity::Info => tracing::info!("管道信息: {}", error),
            ErrorSeverity::Warning => tracing::warn!("管道警告: {}", error),
            ErrorSeverity::Error => tracing::error!("管道错误: {}", error),
            ErrorSeverity::Critical => tracing::error!("管道严重错误: {}", error),
        }
    }

    /// 记录并返回错误
    pub fn log_error<T>(error: PipelineError) -> PipelineResult<T> {
        trace_error(&error);
        Err(error)
    }

    /// 创建网络错误
    pub fn network_error<T: fmt::Display>(msg: T) -> PipelineError {
        PipelineError::NetworkError(msg.to_string())
    }

    /// 创建服务错误
    pub fn service_error<T: fmt::Display>(msg: T) -> PipelineError {
        PipelineError::ServiceError(msg.to_string())
    }

    /// 创建配置错误
    pub fn config_error<T: fmt::Display>(msg: T) -> PipelineError {
        PipelineError::ConfigError(msg.to_string())
    }

    /// 创建输入验证错误
    pub fn validation_error<T: fmt::Display>(msg: T) -> PipelineError {
        PipelineError::InvalidInput(msg.to_string())
    }

    /// 创建内部错误
    pub fn internal_error<T: fmt::Display>(msg: T) -> PipelineError {
        PipelineError::InternalError(msg.to_string())
    }
}
