use reqwest::Client;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::types::{GenerateContentRequest, GenerateContentResponse};
use crate::config::{GeminiConfig, RequestConfig};
use crate::error::{ProviderError, ProviderResult};
use crate::model::{FlatAnalysisNode, GroundingData, GroundingSource};
use crate::prompts;

const ANALYZE_TEMPERATURE: f64 = 0.2;
const EXPLORE_TEMPERATURE: f64 = 0.7;
const MOTION_TEMPERATURE: f64 = 0.3;

/// Client for the Gemini generateContent API.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
    request_config: RequestConfig,
}

impl GeminiClient {
    /// Create a new client. The underlying HTTP client carries no
    /// global timeout so streaming responses can run long; unary calls
    /// apply the configured timeout per request.
    pub fn new(config: &GeminiConfig, request_config: RequestConfig) -> ProviderResult<Self> {
        let client = Client::builder().build().map_err(ProviderError::Http)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            request_config,
        })
    }

    /// Base URL the client targets (for testing).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn require_api_key(&self) -> ProviderResult<&str> {
        if self.api_key.is_empty() {
            Err(ProviderError::MissingApiKey)
        } else {
            Ok(&self.api_key)
        }
    }

    /// Stream the full-document analysis as flat nodes.
    ///
    /// The model emits NDJSON inside an SSE stream; this re-chunks the
    /// SSE text into lines, parses each JSON line into a
    /// [`FlatAnalysisNode`] and forwards it on the channel. Malformed
    /// lines are logged and skipped; a transport failure mid-stream is
    /// forwarded as the final channel item.
    pub async fn analyze_stream(
        &self,
        document_text: &str,
    ) -> ProviderResult<mpsc::Receiver<Result<FlatAnalysisNode, ProviderError>>> {
        let api_key = self.require_api_key()?.to_string();
        let url = format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
            self.base_url, self.model
        );
        let request = GenerateContentRequest::from_prompt(prompts::analysis_prompt(document_text))
            .with_temperature(ANALYZE_TEMPERATURE);

        debug!(model = %self.model, "Starting streaming analysis");

        let mut response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(ProviderError::Http)?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: error_body,
            });
        }

        let (tx, rx) = mpsc::channel(32);

        tokio::spawn(async move {
            let start = Instant::now();
            let mut sse_buffer: Vec<u8> = Vec::new();
            let mut line_buffer = String::new();
            let mut forwarded = 0usize;

            loop {
                match response.chunk().await {
                    Ok(Some(bytes)) => {
                        sse_buffer.extend_from_slice(&bytes);
                        drain_sse_lines(&mut sse_buffer, &mut line_buffer);
                        if drain_ndjson(&mut line_buffer, &tx, &mut forwarded)
                            .await
                            .is_err()
                        {
                            return;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        error!(error = %e, "Analysis stream transport failure");
                        let _ = tx
                            .send(Err(ProviderError::Stream {
                                message: e.to_string(),
                            }))
                            .await;
                        return;
                    }
                }
            }

            // The transport may end without a final newline.
            if !sse_buffer.is_empty() {
                sse_buffer.push(b'\n');
                drain_sse_lines(&mut sse_buffer, &mut line_buffer);
            }

            // The stream may end without a trailing newline.
            let final_line = line_buffer.trim().to_string();
            if final_line.starts_with('{') && final_line.ends_with('}') {
                match serde_json::from_str::<FlatAnalysisNode>(&final_line) {
                    Ok(node) => {
                        forwarded += 1;
                        let _ = tx.send(Ok(node)).await;
                    }
                    Err(e) => warn!(error = %e, line = %final_line, "Skipping malformed final line"),
                }
            }

            info!(
                nodes = forwarded,
                latency_ms = start.elapsed().as_millis(),
                "Analysis stream complete"
            );
        });

        Ok(rx)
    }

    /// Generate a counter-argument for a single node.
    pub async fn explore(
        &self,
        node_title: &str,
        node_content: &str,
        testimony: &str,
    ) -> ProviderResult<String> {
        let request = GenerateContentRequest::from_prompt(prompts::counter_argument_prompt(
            node_title,
            node_content,
            testimony,
        ))
        .with_temperature(EXPLORE_TEMPERATURE);

        let response = self.generate("explore", request).await?;
        Ok(response.text().trim().to_string())
    }

    /// Fact-check a claim with search grounding. Returns the summary
    /// plus the sources the model actually cited.
    pub async fn fact_check(
        &self,
        claim_title: &str,
        claim_content: &str,
    ) -> ProviderResult<GroundingData> {
        let request = GenerateContentRequest::from_prompt(prompts::fact_check_prompt(
            claim_title,
            claim_content,
        ))
        .with_search_tool();

        let response = self.generate("fact_check", request).await?;

        let summary = response.text().trim().to_string();
        let sources: Vec<GroundingSource> = response
            .candidates
            .first()
            .and_then(|c| c.grounding_metadata.as_ref())
            .map(|metadata| {
                metadata
                    .grounding_chunks
                    .iter()
                    .filter_map(|chunk| chunk.web.as_ref())
                    .filter_map(|web| {
                        let uri = web.uri.clone().filter(|u| !u.is_empty())?;
                        Some(GroundingSource {
                            uri,
                            title: web
                                .title
                                .clone()
                                .unwrap_or_else(|| "Unknown Source".to_string()),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        if summary.is_empty() && sources.is_empty() {
            return Ok(GroundingData {
                summary: "Could not find relevant information to verify this claim.".to_string(),
                sources: Vec::new(),
            });
        }

        Ok(GroundingData { summary, sources })
    }

    /// Draft a formal motion document from a suggested motion node.
    pub async fn generate_motion(
        &self,
        motion_type: &str,
        justification: &str,
        counter_argument: Option<&str>,
        fact_check: Option<&str>,
    ) -> ProviderResult<String> {
        let request = GenerateContentRequest::from_prompt(prompts::motion_prompt(
            motion_type,
            justification,
            counter_argument,
            fact_check,
        ))
        .with_temperature(MOTION_TEMPERATURE);

        let response = self.generate("generate_motion", request).await?;
        Ok(response.text().trim().to_string())
    }

    /// Unary generateContent call with retry and exponential backoff.
    async fn generate(
        &self,
        operation: &str,
        request: GenerateContentRequest,
    ) -> ProviderResult<GenerateContentResponse> {
        self.require_api_key()?;
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let mut last_error = None;
        let mut retries = 0;

        while retries <= self.request_config.max_retries {
            if retries > 0 {
                let delay = Duration::from_millis(
                    self.request_config.retry_delay_ms * (2_u64.pow(retries - 1)),
                );
                warn!(
                    operation = %operation,
                    retry = retries,
                    delay_ms = delay.as_millis(),
                    "Retrying Gemini request"
                );
                tokio::time::sleep(delay).await;
            }

            let start = Instant::now();

            match self.execute_request(&url, &request).await {
                Ok(response) => {
                    info!(
                        operation = %operation,
                        latency_ms = start.elapsed().as_millis(),
                        "Gemini call succeeded"
                    );
                    return Ok(response);
                }
                Err(e) => {
                    error!(
                        operation = %operation,
                        error = %e,
                        latency_ms = start.elapsed().as_millis(),
                        retry = retries,
                        "Gemini call failed"
                    );
                    last_error = Some(e);
                    retries += 1;
                }
            }
        }

        Err(ProviderError::Unavailable {
            message: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "Unknown error".to_string()),
            retries,
        })
    }

    async fn execute_request(
        &self,
        url: &str,
        request: &GenerateContentRequest,
    ) -> ProviderResult<GenerateContentResponse> {
        let response = self
            .client
            .post(url)
            .timeout(Duration::from_millis(self.request_config.timeout_ms))
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout {
                        timeout_ms: self.request_config.timeout_ms,
                    }
                } else {
                    ProviderError::Http(e)
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: error_body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse {
                message: format!("Failed to parse response: {}", e),
            })
    }
}

/// Parse every complete SSE line in `buffer`, appending the text of
/// each event to `text`. Transport chunks arrive at arbitrary byte
/// boundaries, so decoding happens per complete line; trailing partial
/// bytes stay buffered until their newline arrives, keeping a UTF-8
/// sequence split across chunks intact.
fn drain_sse_lines(buffer: &mut Vec<u8>, text: &mut String) {
    while let Some(eol) = buffer.iter().position(|&b| b == b'\n') {
        let line_bytes: Vec<u8> = buffer.drain(..=eol).collect();
        let line = String::from_utf8_lossy(&line_bytes);
        if let Some(payload) = line.trim().strip_prefix("data: ") {
            match serde_json::from_str::<GenerateContentResponse>(payload) {
                Ok(event) => text.push_str(&event.text()),
                Err(e) => warn!(error = %e, "Skipping malformed SSE event"),
            }
        }
    }
}

/// Forward every complete NDJSON line in `buffer` on the channel.
/// Returns Err when the receiver has gone away.
async fn drain_ndjson(
    buffer: &mut String,
    tx: &mpsc::Sender<Result<FlatAnalysisNode, ProviderError>>,
    forwarded: &mut usize,
) -> Result<(), ()> {
    while let Some(eol) = buffer.find('\n') {
        let line = buffer[..eol].trim().to_string();
        buffer.drain(..=eol);

        if line.starts_with('{') && line.ends_with('}') {
            match serde_json::from_str::<FlatAnalysisNode>(&line) {
                Ok(node) => {
                    *forwarded += 1;
                    if tx.send(Ok(node)).await.is_err() {
                        return Err(());
                    }
                }
                Err(e) => warn!(error = %e, line = %line, "Skipping malformed NDJSON line"),
            }
        } else if !line.is_empty() {
            debug!(line = %line, "Skipping non-JSON line from stream");
        }
    }
    Ok(())
}
