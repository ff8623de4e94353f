//! 管道数据模型
//!
//! 编辑器会话中的双语内容、处理状态和内容分析报告。

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::pipeline::config::constants;
use crate::pipeline::error::PipelineError;

/// 双语文章内容
///
/// `en` 由用户编辑；`kh` 由翻译阶段覆盖。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthoredContent {
    #[serde(default)]
    pub en: String,
    #[serde(default)]
    pub kh: String,
}

impl AuthoredContent {
    pub fn new(en: impl Into<String>, kh: impl Into<String>) -> Self {
        Self {
            en: en.into(),
            kh: kh.into(),
        }
    }

    /// 只有英文的内容，格式化请求使用这个形状
    pub fn english(en: impl Into<String>) -> Self {
        Self::new(en, String::new())
    }

    /// 英文内容的指纹
    pub fn fingerprint(&self) -> ContentFingerprint {
        ContentFingerprint::of(&self.en)
    }
}

/// 英文内容的 blake3 指纹
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentFingerprint([u8; 32]);

impl ContentFingerprint {
    pub fn of(text: &str) -> Self {
        Self(*blake3::hash(text.as_bytes()).as_bytes())
    }
}

impl fmt::Debug for ContentFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 前 8 字节足够在日志中区分
        for byte in &self.0[..8] {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// 翻译语言
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Kh,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Kh => "kh",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// 处理步骤
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStep {
    #[default]
    Idle,
    Formatting,
    Translating,
    Analyzing,
    Done,
}

/// 单个周期的处理状态，不持久化
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingStatus {
    pub is_processing: bool,
    pub current_step: ProcessingStep,
    pub progress: u8,
}

impl ProcessingStatus {
    pub fn idle() -> Self {
        Self::default()
    }

    /// 周期内的检查点；`Done` 时 `is_processing` 为 false
    pub fn at(step: ProcessingStep, progress: u8) -> Self {
        Self {
            is_processing: !matches!(step, ProcessingStep::Idle | ProcessingStep::Done),
            current_step: step,
            progress: progress.min(constants::PROGRESS_COMPLETE),
        }
    }

    pub fn done() -> Self {
        Self::at(ProcessingStep::Done, constants::PROGRESS_COMPLETE)
    }

    pub fn is_idle(&self) -> bool {
        self.current_step == ProcessingStep::Idle
    }
}

/// 可读性评分
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadabilityScore {
    pub score: i32,
    pub level: String,
}

/// SEO 评分
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeoScore {
    pub score: i32,
    pub keywords: Vec<String>,
}

/// 互动评分
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngagementScore {
    pub score: i32,
}

/// 内容分析报告，只用于展示，每次整体替换
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentAnalysisReport {
    pub readability: ReadabilityScore,
    pub seo: SeoScore,
    pub engagement: EngagementScore,
}

/// 会话中保存的最新分析结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSnapshot {
    pub report: ContentAnalysisReport,
    pub cycle_id: u64,
    pub received_at: DateTime<Utc>,
}

/// 周期跳过的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// 自动处理总开关关闭
    Disabled,
    /// 内容为空或短于最少字符数
    TooShort,
}

/// 正常完成的周期摘要
#[derive(Debug, Clone, PartialEq)]
pub struct CycleSummary {
    pub cycle_id: u64,
    pub formatted: bool,
    pub translated: bool,
    pub analyzed: bool,
    pub elapsed: Duration,
}

/// 周期结果
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    Completed(CycleSummary),
    Aborted(PipelineError),
    Superseded,
    Skipped(SkipReason),
}

impl CycleOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, CycleOutcome::Completed(_))
    }

    pub fn summary(&self) -> Option<&CycleSummary> {
        match self {
            CycleOutcome::Completed(summary) => Some(summary),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_camel_case() {
        let status = ProcessingStatus::at(ProcessingStep::Translating, 50);
        let json = serde_json::to_value(status).unwrap();
        assert_eq!(json["isProcessing"], true);
        assert_eq!(json["currentStep"], "translating");
        assert_eq!(json["progress"], 50);
    }

    #[test]
    fn test_done_is_not_processing() {
        let done = ProcessingStatus::done();
        assert!(!done.is_processing);
        assert_eq!(done.progress, 100);
        assert!(ProcessingStatus::idle().is_idle());
    }

    #[test]
    fn test_report_tolerates_missing_sections() {
        let report: ContentAnalysisReport =
            serde_json::from_str(r#"{ "readability": { "score": 82 } }"#).unwrap();
        assert_eq!(report.readability.score, 82);
        assert_eq!(report.readability.level, "");
        assert!(report.seo.keywords.is_empty());
        assert_eq!(report.engagement.score, 0);
    }

    #[test]
    fn test_fingerprint_tracks_english_only() {
        let a = AuthoredContent::new("<p>Hello</p>", "សួស្តី");
        let b = AuthoredContent::english("<p>Hello</p>");
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), ContentFingerprint::of("<p>Hello!</p>"));
        assert_eq!(format!("{:?}", a.fingerprint()).len(), 16);
    }

    #[test]
    fn test_language_codes() {
        assert_eq!(serde_json::to_string(&Language::Kh).unwrap(), "\"kh\"");
        assert_eq!(Language::En.to_string(), "en");
    }
}
