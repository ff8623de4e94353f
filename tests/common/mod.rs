// 集成测试公共模块
//
// 提供可控的模拟服务、记录提示的通知器和测试环境

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use autoprocess::pipeline::{
    AuthoredContent, AutoProcessingConfig, Collaborators, ContentAnalysisReport, ContentAnalyzer,
    ContentFormatter, ContentTranslator, CycleOrchestrator, DebouncedTrigger, EditorSession,
    Language, Notifier, PipelineError, PipelineResult, PipelineSettings, ProcessingStatus,
};

/// 柬埔寨经济新闻样例（超过 50 个字符）
pub const CAMBODIA_DRAFT: &str = "Cambodia's economy grew 6% in 2024 according to new reports.";

/// 格式化后的样例
pub const CAMBODIA_FORMATTED: &str =
    "<p>Cambodia's economy grew 6% in 2024 according to new reports.</p>";

/// 样例译文
pub const CAMBODIA_KHMER: &str = "សេដ្ឋកិច្ចកម្ពុជាបានកើនឡើង ៦% ក្នុងឆ្នាំ ២០២៤ យោងតាមរបាយការណ៍ថ្មីៗ។";

/// 另一段足够长的英文草稿
pub const SECOND_DRAFT: &str =
    "Phnom Penh prepares for the Water Festival as thousands travel to the capital.";

// ============================================================================
// 模拟服务
// ============================================================================

/// 格式化行为
#[derive(Clone)]
pub enum FormatBehavior {
    /// 总是返回固定内容
    Fixed(AuthoredContent),
    /// 用 <p> 包裹（已包裹则原样返回）
    WrapParagraph,
    /// 总是失败
    Fail(PipelineError),
}

pub struct MockFormatter {
    behavior: Mutex<FormatBehavior>,
    delay: Duration,
    calls: AtomicUsize,
    call_times: Mutex<Vec<Instant>>,
    seen: Mutex<Vec<(AuthoredContent, Option<String>)>>,
}

impl MockFormatter {
    pub fn new(behavior: FormatBehavior) -> Self {
        Self::with_delay(behavior, Duration::ZERO)
    }

    pub fn with_delay(behavior: FormatBehavior, delay: Duration) -> Self {
        Self {
            behavior: Mutex::new(behavior),
            delay,
            calls: AtomicUsize::new(0),
            call_times: Mutex::new(Vec::new()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.call_times.lock().unwrap().clone()
    }

    pub fn seen(&self) -> Vec<(AuthoredContent, Option<String>)> {
        self.seen.lock().unwrap().clone()
    }

    pub fn set_behavior(&self, behavior: FormatBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }
}

#[async_trait]
impl ContentFormatter for MockFormatter {
    async fn format(
        &self,
        content: &AuthoredContent,
        article_id: Option<&str>,
    ) -> PipelineResult<AuthoredContent> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.call_times.lock().unwrap().push(Instant::now());
        self.seen
            .lock()
            .unwrap()
            .push((content.clone(), article_id.map(str::to_string)));

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let behavior = self.behavior.lock().unwrap().clone();
        match behavior {
            FormatBehavior::Fixed(content) => Ok(content),
            FormatBehavior::WrapParagraph => {
                let en = content.en.trim();
                if en.starts_with("<p>") && en.ends_with("</p>") {
                    Ok(AuthoredContent::english(en))
                } else {
                    Ok(AuthoredContent::english(format!("<p>{}</p>", en)))
                }
            }
            FormatBehavior::Fail(error) => Err(error),
        }
    }
}

pub struct MockTranslator {
    result: Mutex<PipelineResult<String>>,
    delay: Duration,
    calls: AtomicUsize,
    seen: Mutex<Vec<(String, Language)>>,
}

impl MockTranslator {
    pub fn new(result: PipelineResult<String>) -> Self {
        Self::with_delay(result, Duration::ZERO)
    }

    pub fn with_delay(result: PipelineResult<String>, delay: Duration) -> Self {
        Self {
            result: Mutex::new(result),
            delay,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<(String, Language)> {
        self.seen.lock().unwrap().clone()
    }

    pub fn set_result(&self, result: PipelineResult<String>) {
        *self.result.lock().unwrap() = result;
    }
}

#[async_trait]
impl ContentTranslator for MockTranslator {
    async fn translate(&self, text: &str, target: Language) -> PipelineResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push((text.to_string(), target));
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.result.lock().unwrap().clone()
    }
}

pub struct MockAnalyzer {
    result: Mutex<PipelineResult<ContentAnalysisReport>>,
    delay: Duration,
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl MockAnalyzer {
    pub fn new(result: PipelineResult<ContentAnalysisReport>) -> Self {
        Self::with_delay(result, Duration::ZERO)
    }

    pub fn with_delay(result: PipelineResult<ContentAnalysisReport>, delay: Duration) -> Self {
        Self {
            result: Mutex::new(result),
            delay,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }

    pub fn set_result(&self, result: PipelineResult<ContentAnalysisReport>) {
        *self.result.lock().unwrap() = result;
    }
}

#[async_trait]
impl ContentAnalyzer for MockAnalyzer {
    async fn analyze(&self, text: &str) -> PipelineResult<ContentAnalysisReport> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(text.to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.result.lock().unwrap().clone()
    }
}

/// 一被调用就 panic 的服务
pub struct PanickingService {
    message: &'static str,
}

impl PanickingService {
    pub fn new(message: &'static str) -> Self {
        Self { message }
    }
}

#[async_trait]
impl ContentFormatter for PanickingService {
    async fn format(
        &self,
        _content: &AuthoredContent,
        _article_id: Option<&str>,
    ) -> PipelineResult<AuthoredContent> {
        panic!("{}", self.message)
    }
}

#[async_trait]
impl ContentTranslator for PanickingService {
    async fn translate(&self, _text: &str, _target: Language) -> PipelineResult<String> {
        panic!("{}", self.message)
    }
}

#[async_trait]
impl ContentAnalyzer for PanickingService {
    async fn analyze(&self, _text: &str) -> PipelineResult<ContentAnalysisReport> {
        panic!("{}", self.message)
    }
}

/// 记录所有提示的通知器
#[derive(Default)]
pub struct RecordingNotifier {
    successes: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn successes(&self) -> Vec<String> {
        self.successes.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn success(&self, message: &str) {
        self.successes.lock().unwrap().push(message.to_string());
    }

    fn error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }
}

// ============================================================================
// 测试数据
// ============================================================================

pub struct TestDataGenerator;

impl TestDataGenerator {
    /// 可读性 82 分的报告
    pub fn cambodia_report() -> ContentAnalysisReport {
        let mut report = ContentAnalysisReport::default();
        report.readability.score = 82;
        report.readability.level = "easy".to_string();
        report.seo.score = 71;
        report.seo.keywords = vec!["cambodia".to_string(), "economy".to_string()];
        report.engagement.score = 64;
        report
    }

    pub fn report_with_score(score: i32) -> ContentAnalysisReport {
        let mut report = ContentAnalysisReport::default();
        report.readability.score = score;
        report
    }

    pub fn network_failure() -> PipelineError {
        PipelineError::NetworkError("connection refused".to_string())
    }
}

// ============================================================================
// 测试环境
// ============================================================================

/// 一个会话加三个模拟服务
pub struct TestEnvironment {
    pub session: EditorSession,
    pub orchestrator: Arc<CycleOrchestrator>,
    pub formatter: Arc<MockFormatter>,
    pub translator: Arc<MockTranslator>,
    pub analyzer: Arc<MockAnalyzer>,
    pub notifier: Arc<RecordingNotifier>,
}

impl TestEnvironment {
    pub fn new(
        initial: AuthoredContent,
        formatter: MockFormatter,
        translator: MockTranslator,
        analyzer: MockAnalyzer,
    ) -> Self {
        Self::with_settings(initial, formatter, translator, analyzer, PipelineSettings::default())
    }

    pub fn with_settings(
        initial: AuthoredContent,
        formatter: MockFormatter,
        translator: MockTranslator,
        analyzer: MockAnalyzer,
        settings: PipelineSettings,
    ) -> Self {
        let formatter = Arc::new(formatter);
        let translator = Arc::new(translator);
        let analyzer = Arc::new(analyzer);
        let notifier = Arc::new(RecordingNotifier::default());

        let session = EditorSession::with_content(initial);
        let services = Collaborators::new(formatter.clone(), translator.clone(), analyzer.clone());
        let orchestrator = Arc::new(
            CycleOrchestrator::new(session.clone(), services, settings)
                .with_notifier(notifier.clone()),
        );

        Self {
            session,
            orchestrator,
            formatter,
            translator,
            analyzer,
            notifier,
        }
    }

    /// 三个服务都成功的柬埔寨样例
    pub fn cambodia() -> Self {
        Self::new(
            AuthoredContent::english(CAMBODIA_DRAFT),
            MockFormatter::new(FormatBehavior::Fixed(AuthoredContent::english(
                CAMBODIA_FORMATTED,
            ))),
            MockTranslator::new(Ok(CAMBODIA_KHMER.to_string())),
            MockAnalyzer::new(Ok(TestDataGenerator::cambodia_report())),
        )
    }

    /// 从空内容开始、三个服务都成功的环境
    pub fn empty_editor() -> Self {
        Self::new(
            AuthoredContent::default(),
            MockFormatter::new(FormatBehavior::WrapParagraph),
            MockTranslator::new(Ok(CAMBODIA_KHMER.to_string())),
            MockAnalyzer::new(Ok(TestDataGenerator::cambodia_report())),
        )
    }

    pub fn trigger(&self, config: AutoProcessingConfig) -> DebouncedTrigger {
        DebouncedTrigger::new(self.orchestrator.clone(), config, Some("article-42".to_string()))
    }
}

/// 用任意服务组合搭建编排器
pub fn orchestrator_with(
    initial: AuthoredContent,
    services: Collaborators,
) -> (EditorSession, Arc<CycleOrchestrator>, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::default());
    let session = EditorSession::with_content(initial);
    let orchestrator = Arc::new(
        CycleOrchestrator::new(session.clone(), services, PipelineSettings::default())
            .with_notifier(notifier.clone()),
    );
    (session, orchestrator, notifier)
}

/// 收集状态变化直到周期回到 Idle
pub async fn collect_statuses_until_idle(
    mut rx: tokio::sync::watch::Receiver<ProcessingStatus>,
) -> Vec<ProcessingStatus> {
    let mut seen = Vec::new();
    let mut left_idle = false;
    while rx.changed().await.is_ok() {
        let status = *rx.borrow_and_update();
        seen.push(status);
        if !status.is_idle() {
            left_idle = true;
        } else if left_idle {
            break;
        }
    }
    seen
}
