//! 远程协作服务接口
//!
//! 管道只通过这些特性访问格式化、翻译和分析服务；
//! HTTP 实现在 `http` 子模块中（需要 `http` 特性）。

use std::sync::Arc;

use async_trait::async_trait;

use crate::pipeline::error::PipelineResult;
use crate::pipeline::types::{AuthoredContent, ContentAnalysisReport, Language};

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::HttpCollaborators;

/// 内容格式化服务
#[async_trait]
pub trait ContentFormatter: Send + Sync {
    /// 格式化内容；`article_id` 让服务端获取文章上下文
    async fn format(
        &self,
        content: &AuthoredContent,
        article_id: Option<&str>,
    ) -> PipelineResult<AuthoredContent>;
}

/// 翻译服务
#[async_trait]
pub trait ContentTranslator: Send + Sync {
    async fn translate(&self, text: &str, target: Language) -> PipelineResult<String>;
}

/// 内容质量分析服务
#[async_trait]
pub trait ContentAnalyzer: Send + Sync {
    async fn analyze(&self, text: &str) -> PipelineResult<ContentAnalysisReport>;
}

/// 一个周期用到的三个协作服务
#[derive(Clone)]
pub struct Collaborators {
    pub formatter: Arc<dyn ContentFormatter>,
    pub translator: Arc<dyn ContentTranslator>,
    pub analyzer: Arc<dyn ContentAnalyzer>,
}

impl Collaborators {
    pub fn new(
        formatter: Arc<dyn ContentFormatter>,
        translator: Arc<dyn ContentTranslator>,
        analyzer: Arc<dyn ContentAnalyzer>,
    ) -> Self {
        Self {
            formatter,
            translator,
            analyzer,
        }
    }

    /// 由同一个对象提供三个服务
    pub fn from_shared<T>(service: Arc<T>) -> Self
    where
        T: ContentFormatter + ContentTranslator + ContentAnalyzer + 'static,
    {
        Self {
            formatter: service.clone(),
            translator: service.clone(),
            analyzer: service,
        }
    }
}

/// 面向用户的提示（toast）
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
}

/// 把提示写进日志的默认实现
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn success(&self, message: &str) {
        tracing::info!(target: "autoprocess::toast", "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "autoprocess::toast", "{}", message);
    }
}
