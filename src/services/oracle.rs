use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};

use crate::domain::announcement::Verdict;
use crate::services::pacer::Pacer;

pub const NO_CONTENT_REASONING: &str = "Tidak ada konten untuk dianalisis.";
const DEFAULT_REASONING: &str = "No reasoning provided.";
const ATTACHED_PDF_NOTE: &str = "The document text is contained in the attached PDF documents.";

#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("oracle throttled with status {status}")]
    Throttled { status: u16 },
    #[error("oracle api error: {0}")]
    Api(String),
    #[error("malformed oracle response: {0}")]
    MalformedResponse(String),
    #[error("oracle request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("oracle retries exhausted after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },
}

/// One segment of a classification request: either instruction/document text
/// or a scanned document attached as raw PDF bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum PromptPart {
    Text(String),
    InlinePdf(Vec<u8>),
}

/// Capability to run one remote generation call over assembled prompt parts.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(&self, parts: &[PromptPart]) -> Result<String, OracleError>;
}

#[derive(Clone)]
pub struct OracleConfig {
    pub prompt_template: String,
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
    pub text_only_limit: usize,
    pub multimodal_text_limit: usize,
}

/// The verdict assembler: builds the classification request from aggregated
/// announcement content, interprets the response contract, and owns the
/// retry policy around the remote call. Throttling (429/503) is retried with
/// exponential backoff through the injected pacer; any other failure aborts
/// the attempt immediately. The triage pipeline maps errors to the failed
/// bucket, so a classification failure never takes down a batch.
pub struct Oracle {
    generator: Arc<dyn ContentGenerator>,
    pacer: Arc<dyn Pacer>,
    config: OracleConfig,
}

impl Oracle {
    pub fn new(
        generator: Arc<dyn ContentGenerator>,
        pacer: Arc<dyn Pacer>,
        config: OracleConfig,
    ) -> Self {
        Oracle {
            generator,
            pacer,
            config,
        }
    }

    pub async fn classify(
        &self,
        combined_text: &str,
        scanned_buffers: &[Vec<u8>],
        title: &str,
    ) -> Result<Verdict, OracleError> {
        if combined_text.trim().is_empty() && scanned_buffers.is_empty() {
            return Ok(Verdict {
                is_interesting: false,
                reasoning: NO_CONTENT_REASONING.to_string(),
            });
        }

        let parts = self.build_parts(combined_text, scanned_buffers, title);

        let mut attempt = 1;
        loop {
            match self.generator.generate(&parts).await {
                Ok(response) => return parse_verdict(&response),
                Err(OracleError::Throttled { status }) => {
                    if attempt >= self.config.max_attempts {
                        return Err(OracleError::RetriesExhausted { attempts: attempt });
                    }
                    let wait = backoff_delay(attempt, self.config.backoff_base_ms);
                    log::warn!(
                        "Oracle throttled with status {} on attempt {}/{}, backing off for {:?}",
                        status,
                        attempt,
                        self.config.max_attempts,
                        wait
                    );
                    self.pacer.wait(wait).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Scanned documents force the multimodal path even when some text was
    /// extracted: an image-bearing attachment may carry terms the partial
    /// text misses. Text-only requests get the larger truncation bound.
    fn build_parts(
        &self,
        combined_text: &str,
        scanned_buffers: &[Vec<u8>],
        title: &str,
    ) -> Vec<PromptPart> {
        match scanned_buffers.is_empty() {
            false => {
                let document_text = match combined_text.trim().is_empty() {
                    true => ATTACHED_PDF_NOTE.to_string(),
                    false => {
                        truncate_chars(combined_text, self.config.multimodal_text_limit)
                            .to_string()
                    }
                };

                let mut parts = vec![PromptPart::Text(self.render_prompt(title, &document_text))];
                parts.extend(
                    scanned_buffers
                        .iter()
                        .map(|buffer| PromptPart::InlinePdf(buffer.clone())),
                );
                parts
            }
            true => {
                let document_text = truncate_chars(combined_text, self.config.text_only_limit);
                vec![PromptPart::Text(self.render_prompt(title, document_text))]
            }
        }
    }

    fn render_prompt(&self, title: &str, document_text: &str) -> String {
        self.config
            .prompt_template
            .replace("{{title}}", title)
            .replace("{{documentText}}", document_text)
    }
}

fn backoff_delay(attempt: u32, base_ms: u64) -> Duration {
    Duration::from_millis(3u64.pow(attempt) * base_ms)
}

/// Interpret the classifier's reply: an optional ```json fence around a JSON
/// object with `isInteresting` and `reasoning`, both defaulted when absent
/// or empty. Anything unparseable is a fatal, non-retryable error.
pub fn parse_verdict(response: &str) -> Result<Verdict, OracleError> {
    #[derive(Deserialize)]
    struct RawVerdict {
        #[serde(rename = "isInteresting", default)]
        is_interesting: bool,
        reasoning: Option<String>,
    }

    let raw: RawVerdict = serde_json::from_str(strip_code_fences(response))
        .map_err(|e| OracleError::MalformedResponse(e.to_string()))?;

    Ok(Verdict {
        is_interesting: raw.is_interesting,
        reasoning: raw
            .reasoning
            .filter(|reasoning| !reasoning.is_empty())
            .unwrap_or_else(|| DEFAULT_REASONING.to_string()),
    })
}

fn strip_code_fences(response: &str) -> &str {
    response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum GeminiPart {
    Text { text: String },
    InlineData { inline_data: GeminiInlineData },
}

#[derive(Serialize)]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
struct GeminiGenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    error: Option<GeminiApiError>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiResponseContent,
}

#[derive(Deserialize)]
struct GeminiResponseContent {
    parts: Vec<GeminiResponsePart>,
}

#[derive(Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct GeminiApiError {
    message: String,
}

pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .unwrap();

        GeminiClient {
            client,
            api_key,
            model,
        }
    }
}

#[async_trait]
impl ContentGenerator for GeminiClient {
    async fn generate(&self, parts: &[PromptPart]) -> Result<String, OracleError> {
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: parts
                    .iter()
                    .map(|part| match part {
                        PromptPart::Text(text) => GeminiPart::Text { text: text.clone() },
                        PromptPart::InlinePdf(bytes) => GeminiPart::InlineData {
                            inline_data: GeminiInlineData {
                                mime_type: "application/pdf".to_string(),
                                data: BASE64.encode(bytes),
                            },
                        },
                    })
                    .collect(),
            }],
            generation_config: GeminiGenerationConfig {
                temperature: 0.1,
                max_output_tokens: 2048,
            },
        };

        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, self.api_key
        );

        let response = self.client.post(&url).json(&request).send().await?;
        let status = response.status().as_u16();

        if status == 429 || status == 503 {
            return Err(OracleError::Throttled { status });
        }
        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OracleError::Api(format!(
                "Gemini API error ({}): {}",
                status, body
            )));
        }

        let gemini_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| OracleError::MalformedResponse(e.to_string()))?;

        if let Some(error) = gemini_response.error {
            return Err(OracleError::Api(error.message));
        }

        gemini_response
            .candidates
            .and_then(|candidates| candidates.into_iter().next())
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .and_then(|part| part.text)
            .ok_or_else(|| OracleError::Api("Gemini returned no candidates".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    struct StubGenerator {
        responses: Mutex<Vec<Result<String, OracleError>>>,
        calls: Mutex<usize>,
    }

    impl StubGenerator {
        fn new(responses: Vec<Result<String, OracleError>>) -> Self {
            StubGenerator {
                responses: Mutex::new(responses),
                calls: Mutex::new(0),
            }
        }

        fn call_count(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl ContentGenerator for StubGenerator {
        async fn generate(&self, _parts: &[PromptPart]) -> Result<String, OracleError> {
            *self.calls.lock().unwrap() += 1;
            self.responses.lock().unwrap().remove(0)
        }
    }

    struct CapturingGenerator {
        captured: Mutex<Vec<Vec<PromptPart>>>,
    }

    #[async_trait]
    impl ContentGenerator for CapturingGenerator {
        async fn generate(&self, parts: &[PromptPart]) -> Result<String, OracleError> {
            self.captured.lock().unwrap().push(parts.to_vec());
            Ok(r#"{"isInteresting": true, "reasoning": "ok"}"#.to_string())
        }
    }

    struct RecordingPacer {
        waits: Mutex<Vec<Duration>>,
    }

    impl RecordingPacer {
        fn new() -> Self {
            RecordingPacer {
                waits: Mutex::new(vec![]),
            }
        }
    }

    #[async_trait]
    impl Pacer for RecordingPacer {
        async fn wait(&self, duration: Duration) {
            self.waits.lock().unwrap().push(duration);
        }
    }

    fn config() -> OracleConfig {
        OracleConfig {
            prompt_template: "Judul: {{title}}\nDokumen: {{documentText}}".to_string(),
            max_attempts: 5,
            backoff_base_ms: 2500,
            text_only_limit: 20_000,
            multimodal_text_limit: 10_000,
        }
    }

    fn throttled(status: u16) -> Result<String, OracleError> {
        Err(OracleError::Throttled { status })
    }

    #[test]
    fn parse_verdict_strips_json_fence() {
        let response = "```json\n{\"isInteresting\": true, \"reasoning\": \"Akuisisi besar\"}\n```";
        let verdict = parse_verdict(response).unwrap();

        assert!(verdict.is_interesting);
        assert_eq!(verdict.reasoning, "Akuisisi besar");
    }

    #[test]
    fn parse_verdict_accepts_bare_json() {
        let verdict = parse_verdict(r#"{"isInteresting": false, "reasoning": "Rutin"}"#).unwrap();

        assert!(!verdict.is_interesting);
        assert_eq!(verdict.reasoning, "Rutin");
    }

    #[test]
    fn parse_verdict_defaults_missing_fields() {
        let verdict = parse_verdict("{}").unwrap();

        assert!(!verdict.is_interesting);
        assert_eq!(verdict.reasoning, "No reasoning provided.");
    }

    #[test]
    fn parse_verdict_defaults_empty_reasoning() {
        let verdict = parse_verdict(r#"{"isInteresting": true, "reasoning": ""}"#).unwrap();

        assert_eq!(verdict.reasoning, "No reasoning provided.");
    }

    #[test]
    fn parse_verdict_rejects_prose() {
        let result = parse_verdict("The announcement looks interesting to me.");
        assert!(matches!(result, Err(OracleError::MalformedResponse(_))));
    }

    #[test]
    fn backoff_grows_exponentially_from_the_base() {
        assert_eq!(backoff_delay(1, 2500), Duration::from_millis(7_500));
        assert_eq!(backoff_delay(2, 2500), Duration::from_millis(22_500));
        assert_eq!(backoff_delay(3, 2500), Duration::from_millis(67_500));
        assert_eq!(backoff_delay(4, 2500), Duration::from_millis(202_500));
    }

    #[test]
    fn truncate_chars_respects_multibyte_boundaries() {
        assert_eq!(truncate_chars("laporan", 20), "laporan");
        assert_eq!(truncate_chars("données financières", 7), "données");
    }

    #[tokio::test]
    async fn empty_content_short_circuits_without_calling_the_generator() {
        let generator = Arc::new(StubGenerator::new(vec![]));
        let oracle = Oracle::new(generator.clone(), Arc::new(RecordingPacer::new()), config());

        let verdict = oracle.classify("   ", &[], "Judul").await.unwrap();

        assert!(!verdict.is_interesting);
        assert_eq!(verdict.reasoning, NO_CONTENT_REASONING);
        assert_eq!(generator.call_count(), 0);
    }

    #[tokio::test]
    async fn throttling_is_retried_with_recorded_backoff() {
        let generator = Arc::new(StubGenerator::new(vec![
            throttled(429),
            throttled(429),
            Ok(r#"{"isInteresting": true, "reasoning": "Merger"}"#.to_string()),
        ]));
        let pacer = Arc::new(RecordingPacer::new());
        let oracle = Oracle::new(generator.clone(), pacer.clone(), config());

        let verdict = oracle
            .classify("some extracted text", &[], "Judul")
            .await
            .unwrap();

        assert!(verdict.is_interesting);
        assert_eq!(generator.call_count(), 3);
        assert_eq!(
            *pacer.waits.lock().unwrap(),
            vec![Duration::from_millis(7_500), Duration::from_millis(22_500)]
        );
    }

    #[tokio::test]
    async fn exhausted_retries_surface_after_five_attempts() {
        let generator = Arc::new(StubGenerator::new(vec![
            throttled(503),
            throttled(503),
            throttled(503),
            throttled(503),
            throttled(503),
        ]));
        let pacer = Arc::new(RecordingPacer::new());
        let oracle = Oracle::new(generator.clone(), pacer.clone(), config());

        let result = oracle.classify("some extracted text", &[], "Judul").await;

        assert!(matches!(
            result,
            Err(OracleError::RetriesExhausted { attempts: 5 })
        ));
        assert_eq!(generator.call_count(), 5);
        assert_eq!(pacer.waits.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn non_throttling_errors_abort_immediately() {
        let generator = Arc::new(StubGenerator::new(vec![Err(OracleError::Api(
            "boom".to_string(),
        ))]));
        let pacer = Arc::new(RecordingPacer::new());
        let oracle = Oracle::new(generator.clone(), pacer.clone(), config());

        let result = oracle.classify("some extracted text", &[], "Judul").await;

        assert!(matches!(result, Err(OracleError::Api(_))));
        assert_eq!(generator.call_count(), 1);
        assert!(pacer.waits.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn scanned_documents_force_the_multimodal_path() {
        let generator = Arc::new(CapturingGenerator {
            captured: Mutex::new(vec![]),
        });
        let oracle = Oracle::new(generator.clone(), Arc::new(RecordingPacer::new()), config());

        let scanned = vec![vec![0x25, 0x50, 0x44, 0x46]];
        oracle
            .classify("partial text", &scanned, "Penawaran Tender")
            .await
            .unwrap();

        let captured = generator.captured.lock().unwrap();
        let parts = &captured[0];

        assert_eq!(parts.len(), 2);
        assert!(matches!(&parts[0], PromptPart::Text(prompt)
            if prompt.contains("Penawaran Tender") && prompt.contains("partial text")));
        assert_eq!(parts[1], PromptPart::InlinePdf(scanned[0].clone()));
    }

    #[tokio::test]
    async fn text_only_requests_carry_a_single_text_part() {
        let generator = Arc::new(CapturingGenerator {
            captured: Mutex::new(vec![]),
        });
        let oracle = Oracle::new(generator.clone(), Arc::new(RecordingPacer::new()), config());

        oracle
            .classify("full document text", &[], "Judul")
            .await
            .unwrap();

        let captured = generator.captured.lock().unwrap();
        assert_eq!(captured[0].len(), 1);
    }
}
