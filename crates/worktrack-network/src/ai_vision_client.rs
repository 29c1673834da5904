//! 비전 모델 분석 클라이언트.
//!
//! 분석 윈도우의 스크린샷을 균등 샘플링해 base64 JPEG으로 첨부하고,
//! OpenAI 호환 `chat/completions` API 응답을 `SummaryRecord`로 변환한다.
//! 저장은 하지 않는다.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as B64, Engine};
use chrono::Local;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use worktrack_core::config::AnalysisConfig;
use worktrack_core::error::CoreError;
use worktrack_core::models::capture::CaptureRecord;
use worktrack_core::models::summary::{Activity, SummaryRecord};
use worktrack_core::models::window::AnalysisWindow;
use worktrack_core::ports::analysis::Analyzer;
use worktrack_core::ports::storage::CaptureStorage;

// ============================================================
// 응답 페이로드
// ============================================================

/// 모델이 반환하는 JSON 본문
#[derive(Debug, Deserialize)]
struct AnalysisPayload {
    #[serde(default)]
    summary: String,
    #[serde(default)]
    activities: Vec<Activity>,
    #[serde(default)]
    app_usage: BTreeMap<String, u32>,
}

// ============================================================
// VisionAnalyzer
// ============================================================

/// OpenAI 호환 비전 API 분석기
pub struct VisionAnalyzer {
    http_client: reqwest::Client,
    storage: Arc<dyn CaptureStorage>,
    endpoint: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    max_images: usize,
}

impl VisionAnalyzer {
    /// 새 분석기 생성 (API 키가 비어 있으면 설정 에러)
    pub fn new(config: &AnalysisConfig, storage: Arc<dyn CaptureStorage>) -> Result<Self, CoreError> {
        if config.api_key.trim().is_empty() {
            return Err(CoreError::Config(
                "분석 API 키 미설정. config.json의 analysis.api_key를 입력하세요.".into(),
            ));
        }

        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CoreError::Network(format!("HTTP 클라이언트 생성 실패: {e}")))?;

        debug!(
            endpoint = %config.endpoint,
            model = %config.model,
            timeout = config.timeout_secs,
            "VisionAnalyzer 초기화"
        );

        Ok(Self {
            http_client,
            storage,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            max_images: config.max_images,
        })
    }

    /// 균등 샘플링 — step = len / max, 앞에서부터 max개
    fn sample_captures(all: &[CaptureRecord], max: usize) -> Vec<&CaptureRecord> {
        let max = max.max(1);
        if all.len() <= max {
            return all.iter().collect();
        }
        let step = all.len() / max;
        (0..max).filter_map(|i| all.get(i * step)).collect()
    }

    fn system_prompt() -> &'static str {
        "당신은 작업 분석 도우미입니다. 화면 스크린샷을 보고 사용자의 작업 내용을 요약하세요."
    }

    /// 사용자 프롬프트 (윈도우 시각은 HH:MM)
    fn build_user_prompt(window: &AnalysisWindow) -> String {
        format!(
            r#"{start}부터 {end}까지의 작업 내용을 분석하세요.

판단 규칙:
- 스크린샷이 모두 검은 화면, 잠금 화면, 빈 화면이거나 내용 변화가 거의 없다면 실제 작업이 없는 구간입니다.
- 이 경우 {{"summary": "캡처 내용 없음", "activities": [], "app_usage": {{}}}} 를 반환하세요.

분석 요구사항 (작업 내용이 있을 때만):
1. 주로 사용한 애플리케이션을 식별하세요 (예: VS Code, 브라우저, Office, 메신저).
2. 시간대별 주요 작업 내용과 활동 분류(개발, 문서, 커뮤니케이션, 검색 등)를 정리하세요.
3. 각 활동의 대략적인 소요 시간(분)을 추정하세요.
4. summary 필드는 "1.첫 번째 항목;2.두 번째 항목;" 형식의 번호 목록으로, 줄바꿈 없이 작성하세요.

다른 텍스트 없이 아래 JSON 형식으로만 응답하세요:
{{
  "summary": "1.xx 기능 개발;2.xx 문제 해결;",
  "activities": [
    {{"name": "기능 개발", "duration_minutes": 45, "apps": ["VS Code", "Chrome"], "category": "개발"}}
  ],
  "app_usage": {{"VS Code": 40, "Chrome": 20}}
}}"#,
            start = window.start.format("%H:%M"),
            end = window.end.format("%H:%M"),
        )
    }

    /// 샘플 이미지를 data URL로 로드 (읽기 실패한 파일은 건너뜀)
    async fn load_images(samples: &[&CaptureRecord]) -> Vec<String> {
        let mut urls = Vec::with_capacity(samples.len());
        for record in samples {
            match tokio::fs::read(&record.file_path).await {
                Ok(bytes) => urls.push(format!("data:image/jpeg;base64,{}", B64.encode(bytes))),
                Err(e) => warn!("스크린샷 읽기 실패, 건너뜀 {}: {e}", record.file_path),
            }
        }
        urls
    }

    fn build_request_body(&self, window: &AnalysisWindow, images: &[String]) -> serde_json::Value {
        let mut content = vec![serde_json::json!({
            "type": "text",
            "text": Self::build_user_prompt(window),
        })];
        content.extend(images.iter().map(|url| {
            serde_json::json!({
                "type": "image_url",
                "image_url": { "url": url },
            })
        }));

        serde_json::json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
            "messages": [
                { "role": "system", "content": Self::system_prompt() },
                { "role": "user", "content": content },
            ]
        })
    }

    /// `choices[0].message.content` 추출
    fn extract_content(body: &str) -> Result<String, CoreError> {
        let response: serde_json::Value = serde_json::from_str(body)
            .map_err(|e| CoreError::Internal(format!("분석 응답 JSON 파싱 실패: {e}")))?;

        response
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|arr| arr.first())
            .and_then(|choice| choice.get("message"))
            .and_then(|msg| msg.get("content"))
            .and_then(|t| t.as_str())
            .map(str::to_string)
            .ok_or_else(|| CoreError::Internal("분석 응답에서 텍스트를 찾을 수 없음".to_string()))
    }

    /// 모델 텍스트 → 요약 (JSON 파싱 실패 시 첫 `{` ~ 마지막 `}` 구간 재시도)
    fn parse_summary(text: &str, window: &AnalysisWindow) -> Result<SummaryRecord, CoreError> {
        let payload: AnalysisPayload = match serde_json::from_str(text) {
            Ok(payload) => payload,
            Err(first_err) => {
                let json_str = match (text.find('{'), text.rfind('}')) {
                    (Some(start), Some(end)) if end > start => &text[start..=end],
                    _ => {
                        return Err(CoreError::Internal(format!(
                            "분석 응답 파싱 실패: {first_err}"
                        )))
                    }
                };
                serde_json::from_str(json_str).map_err(|e| {
                    CoreError::Internal(format!(
                        "분석 응답 JSON 파싱 실패: {e} (raw: {})",
                        json_str.chars().take(200).collect::<String>()
                    ))
                })?
            }
        };

        Ok(SummaryRecord {
            id: None,
            start_time: window.start,
            end_time: window.end,
            summary: payload.summary,
            activities: payload.activities,
            app_usage: payload.app_usage,
            created_at: Local::now(),
        })
    }
}

#[async_trait]
impl Analyzer for VisionAnalyzer {
    async fn analyze(&self, window: &AnalysisWindow) -> Result<SummaryRecord, CoreError> {
        let captures = self.storage.get_captures(window).await?;
        if captures.is_empty() {
            return Err(CoreError::NoData(format!("{window} 구간 스크린샷 없음")));
        }

        let sampled = Self::sample_captures(&captures, self.max_images);
        let images = Self::load_images(&sampled).await;
        info!(
            "분석 요청: {window}, 스크린샷 {}장 중 {}장 전송",
            captures.len(),
            images.len()
        );

        let response = self
            .http_client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&self.build_request_body(window, &images))
            .send()
            .await
            .map_err(|e| CoreError::Network(format!("분석 API 호출 실패: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CoreError::Network(format!("분석 API 응답 읽기 실패: {e}")))?;

        if !status.is_success() {
            warn!(status = %status, "분석 API 오류 응답");
            return Err(CoreError::Network(format!(
                "분석 API 오류 ({status}): {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        let text = Self::extract_content(&body)?;
        let summary = Self::parse_summary(&text, window)?;

        debug!(
            activities = summary.activities.len(),
            minutes = summary.total_activity_minutes(),
            "분석 완료"
        );
        Ok(summary)
    }
}

// ============================================================
// 테스트
// ============================================================
