//! AI generated memory aids, capped per day.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{json, Value};
use thiserror::Error;
use voca::{KeyValueStore, UsageError, UsageLimiter};

pub const GEMINI_ENDPOINT: &str = "https://aiplatform.googleapis.com/v1/publishers/google/models/gemini-2.5-flash-lite:streamGenerateContent";

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Request failed: HTTP {status} {body}")]
    HttpStatus { status: u16, body: String },
    #[error("Invalid response: {0}")]
    Json(#[from] serde_json::Error),
    #[error("The response contained no text")]
    EmptyResponse,
}

#[derive(Debug, Error)]
pub enum MnemonicError {
    #[error(transparent)]
    Usage(#[from] UsageError),
    #[error("AI 연상고리 생성에 실패했습니다. 잠시 후 다시 시도해주세요.")]
    Failed(#[source] GeneratorError),
}

#[async_trait]
pub trait MnemonicGenerator: Send + Sync {
    async fn generate(&self, english: &str, korean: &str) -> Result<String, GeneratorError>;
}

/// The instruction sent for `english` meaning `korean`.
pub fn prompt(english: &str, korean: &str) -> String {
    format!(
        r#"
영어 단어 "{english}"(뜻: {korean})에 대한 창의적이고 재미있는 연상고리나 기억법을 1-2문장으로 만들어주세요.

다음과 같은 방식을 활용해주세요:
1. 발음과 비슷한 한국어 단어 연결
2. 단어의 철자나 모양을 활용한 시각적 연상
3. 재미있는 상황이나 스토리 연결
4. 어원이나 단어 구성 요소 활용

예시:
- "serendipity" → "세렌디피티, 세렌(고요한) + 디피(깊이) = 고요한 깊이에서 찾은 뜻밖의 행운!"
- "ephemeral" → "에페메랄, 에페(애페) + 메랄 = 애페하게 메랄메랄 사라지는 일시적인 것"

한국어로 답변하고, 이모지를 1-2개 포함해서 친근하게 작성해주세요.
답변에 볼드체(**)가 너무 많으면 가독성이 떨어지니, 핵심 단어 1-2개에만 제한적으로 사용해주세요.
"#
    )
}

/// Joins the first text part of every chunk of a streamed response.
///
/// A single unstreamed response object is accepted as well.
pub fn collect_text(response: &Value) -> String {
    let first_text = |chunk: &Value| {
        chunk
            .pointer("/candidates/0/content/parts/0/text")
            .and_then(Value::as_str)
            .map(str::to_string)
    };
    let text = match response {
        Value::Array(chunks) => chunks.iter().filter_map(first_text).collect::<String>(),
        other => first_text(other).unwrap_or_default(),
    };
    text.trim().to_string()
}

/// Generates mnemonics with Gemini on Vertex AI.
#[derive(Debug, Clone)]
pub struct GeminiGenerator {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl GeminiGenerator {
    pub fn new(api_key: &str) -> Self {
        Self::with_endpoint(GEMINI_ENDPOINT, api_key)
    }

    pub fn with_endpoint(endpoint: &str, api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl MnemonicGenerator for GeminiGenerator {
    async fn generate(&self, english: &str, korean: &str) -> Result<String, GeneratorError> {
        tracing::info!("Generating a mnemonic for {english}");

        let body = json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt(english, korean) }],
            }],
        });
        let res = self
            .client
            .post(&self.endpoint)
            .query(&[("key", &self.api_key)])
            .json(&body)
            .send()
            .await?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(GeneratorError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }
        let bytes = res.bytes().await?;
        let response: Value = serde_json::from_slice(&bytes)?;
        let text = collect_text(&response);
        if text.is_empty() {
            return Err(GeneratorError::EmptyResponse);
        }

        tracing::info!("Generated a mnemonic for {english}");
        Ok(text)
    }
}

/// A [`MnemonicGenerator`] behind a daily [`UsageLimiter`].
pub struct Mnemonics<S, G> {
    limiter: UsageLimiter<S>,
    generator: G,
}

impl<S, G> Mnemonics<S, G>
where
    S: KeyValueStore,
    G: MnemonicGenerator,
{
    pub fn new(limiter: UsageLimiter<S>, generator: G) -> Self {
        Self { limiter, generator }
    }

    pub fn limiter(&self) -> &UsageLimiter<S> {
        &self.limiter
    }

    pub async fn generate(&self, english: &str, korean: &str) -> Result<String, MnemonicError> {
        self.generate_on(UsageLimiter::<S>::today(), english, korean)
            .await
    }

    /// Counts the request against `today` and generates. The request is counted even if
    /// generation fails.
    pub async fn generate_on(
        &self,
        today: NaiveDate,
        english: &str,
        korean: &str,
    ) -> Result<String, MnemonicError> {
        let used = self.limiter.check_and_increment(today)?;
        tracing::debug!("Mnemonic request {used} of {} on {today}", self.limiter.limit());
        self.generator
            .generate(english, korean)
            .await
            .map_err(|err| {
                tracing::error!("Failed to generate a mnemonic for {english}: {err}");
                MnemonicError::Failed(err)
            })
    }
}
