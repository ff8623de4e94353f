//! 基于 reqwest 的远程服务客户端
//!
//! 实现格式化、翻译、分析三个接口的请求/响应约定。

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use super::{ContentAnalyzer, ContentFormatter, ContentTranslator};
use crate::pipeline::config::PipelineSettings;
use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::types::{AuthoredContent, ContentAnalysisReport, Language};

/// 格式化请求中的内容，可以是双语对象或纯文本
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FormatPayload {
    Bilingual(AuthoredContent),
    Plain(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct FormatOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub article_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FormatRequest {
    pub content: FormatPayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<FormatOptions>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FormatResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub content: Option<AuthoredContent>,
    #[serde(default)]
    pub error: Option<String>,
}

impl FormatResponse {
    /// 把响应信封转换为格式化后的内容
    pub fn into_content(self) -> PipelineResult<AuthoredContent> {
        if !self.success {
            return Err(PipelineError::ServiceError(
                self.error.unwrap_or_else(|| "格式化服务返回失败".to_string()),
            ));
        }
        let content = self
            .content
            .ok_or_else(|| PipelineError::InvalidInput("格式化响应缺少 content".to_string()))?;
        if content.en.trim().is_empty() {
            return Err(PipelineError::InvalidInput(
                "格式化服务返回了空的英文内容".to_string(),
            ));
        }
        Ok(content)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TranslateRequest<'a> {
    pub text: &'a str,
    pub target_language: Language,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TranslationData {
    pub translation: String,
}

/// 翻译响应信封，兼容 `data.translation` 与顶层 `translation`
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TranslateResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub data: Option<TranslationData>,
    #[serde(default)]
    pub translation: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl TranslateResponse {
    pub fn into_translation(self) -> PipelineResult<String> {
        if self.success == Some(false) {
            return Err(PipelineError::ServiceError(
                self.error.unwrap_or_else(|| "翻译服务返回失败".to_string()),
            ));
        }
        self.data
            .map(|d| d.translation)
            .or(self.translation)
            .ok_or_else(|| PipelineError::ParseError("翻译响应缺少 translation".to_string()))
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AnalyzeRequest<'a> {
    pub content: &'a str,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AnalyzeResponse {
    pub data: ContentAnalysisReport,
}

/// 三个远程服务的 HTTP 客户端
pub struct HttpCollaborators {
    client: Client,
    format_url: Url,
    translate_url: Url,
    analyze_url: Url,
}

impl HttpCollaborators {
    pub fn new(settings: &PipelineSettings) -> PipelineResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = &settings.api_token {
            let auth = format!("Bearer {}", token.trim());
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&auth)
                    .map_err(|e| PipelineError::ConfigError(format!("无效的 API 令牌: {}", e)))?,
            );
        }

        let client = Client::builder()
            .timeout(settings.request_timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| PipelineError::ConfigError(format!("创建 HTTP 客户端失败: {}", e)))?;

        let base = Url::parse(&settings.api_base_url)?;
        Ok(Self {
            client,
            format_url: base.join(&settings.format_endpoint)?,
            translate_url: base.join(&settings.translate_endpoint)?,
            analyze_url: base.join(&settings.analyze_endpoint)?,
        })
    }

    pub fn format_url(&self) -> &Url {
        &self.format_url
    }

    pub fn translate_url(&self) -> &Url {
        &self.translate_url
    }

    pub fn analyze_url(&self) -> &Url {
        &self.analyze_url
    }

    async fn post_json<B, R>(&self, url: &Url, body: &B) -> PipelineResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        tracing::debug!("POST {}", url);
        let resp = self.client.post(url.clone()).json(body).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(PipelineError::ServiceError(format!(
                "{} 返回 {}: {}",
                url.path(),
                status,
                text
            )));
        }

        let bytes = resp.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            PipelineError::ParseError(format!("无法解析 {} 的响应: {}", url.path(), e))
        })
    }
}

#[async_trait]
impl ContentFormatter for HttpCollaborators {
    async fn format(
        &self,
        content: &AuthoredContent,
        article_id: Option<&str>,
    ) -> PipelineResult<AuthoredContent> {
        let request = FormatRequest {
            content: FormatPayload::Bilingual(content.clone()),
            options: article_id.map(|id| FormatOptions {
                article_id: Some(id.to_string()),
            }),
        };
        let response: FormatResponse = self.post_json(&self.format_url, &request).await?;
        response.into_content()
    }
}

#[async_trait]
impl ContentTranslator for HttpCollaborators {
    async fn translate(&self, text: &str, target: Language) -> PipelineResult<String> {
        let request = TranslateRequest {
            text,
            target_language: target,
        };
        let response: TranslateResponse = self.post_json(&self.translate_url, &request).await?;
        response.into_translation()
    }
}

#[async_trait]
impl ContentAnalyzer for HttpCollaborators {
    async fn analyze(&self, text: &str) -> PipelineResult<ContentAnalysisReport> {
        let request = AnalyzeRequest { content: text };
        let response: AnalyzeResponse = self.post_json(&self.analyze_url, &request).await?;
        Ok(response.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_request_shape() {
        let request = FormatRequest {
            content: FormatPayload::Bilingual(AuthoredContent::english("Hello")),
            options: Some(FormatOptions {
                article_id: Some("66a1".to_string()),
            }),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({ "content": { "en": "Hello", "kh": "" }, "options": { "articleId": "66a1" } })
        );

        let plain: FormatRequest =
            serde_json::from_value(json!({ "content": "just text" })).unwrap();
        assert_eq!(plain.content, FormatPayload::Plain("just text".to_string()));
        assert!(plain.options.is_none());
    }

    #[test]
    fn test_format_response_envelope() {
        let ok: FormatResponse = serde_json::from_value(
            json!({ "success": true, "content": { "en": "<p>Hi</p>", "kh": "" } }),
        )
        .unwrap();
        assert_eq!(ok.into_content().unwrap().en, "<p>Hi</p>");

        let failed: FormatResponse =
            serde_json::from_value(json!({ "success": false, "error": "quota exceeded" })).unwrap();
        assert_eq!(
            failed.into_content(),
            Err(PipelineError::ServiceError("quota exceeded".to_string()))
        );

        let empty: FormatResponse =
            serde_json::from_value(json!({ "success": true, "content": { "en": " ", "kh": "" } }))
                .unwrap();
        assert!(matches!(empty.into_content(), Err(PipelineError::InvalidInput(_))));
    }

    #[test]
    fn test_translate_request_uses_camel_case() {
        let request = TranslateRequest {
            text: "Hello",
            target_language: Language::Kh,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({ "text": "Hello", "targetLanguage": "kh" })
        );
    }

    #[test]
    fn test_translate_response_variants() {
        let wrapped: TranslateResponse =
            serde_json::from_value(json!({ "success": true, "data": { "translation": "សួស្តី" } }))
                .unwrap();
        assert_eq!(wrapped.into_translation().unwrap(), "សួស្តី");

        let flat: TranslateResponse =
            serde_json::from_value(json!({ "translation": "សួស្តី" })).unwrap();
        assert_eq!(flat.into_translation().unwrap(), "សួស្តី");

        let missing: TranslateResponse =
            serde_json::from_value(json!({ "success": true })).unwrap();
        assert!(matches!(missing.into_translation(), Err(PipelineError::ParseError(_))));
    }

    #[test]
    fn test_analyze_response() {
        let resp: AnalyzeResponse = serde_json::from_value(json!({
            "data": {
                "readability": { "score": 82, "level": "easy" },
                "seo": { "score": 70, "keywords": ["cambodia", "economy"] },
                "engagement": { "score": 64 }
            }
        }))
        .unwrap();
        assert_eq!(resp.data.readability.score, 82);
        assert_eq!(resp.data.seo.keywords, vec!["cambodia", "economy"]);
    }

    #[test]
    fn test_endpoints_resolve_against_base() {
        let mut settings = PipelineSettings::default();
        settings.api_base_url = "https://cms.example.com".to_string();
        settings.api_token = Some("secret-token".to_string());

        let client = HttpCollaborators::new(&settings).unwrap();
        assert_eq!(
            client.format_url().as_str(),
            "https://cms.example.com/api/ai/format-content"
        );
        assert_eq!(
            client.translate_url().as_str(),
            "https://cms.example.com/api/ai/translate"
        );
        assert_eq!(
            client.analyze_url().as_str(),
            "https://cms.example.com/api/ai/analyze-content"
        );
    }
}
