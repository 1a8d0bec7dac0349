//! Gemini text generation over blocking HTTP.
//!
//! Callers depend on the [`Generator`] trait, not on [`GeminiClient`], so the
//! controller can be driven by a scripted generator in tests. Failures come
//! back as a tagged [`AiError`]; turning them into display text is the
//! controller's job.

use std::io::IsTerminal;
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};

use crate::credentials::ApiKey;
use crate::error::NutriaError;
use crate::prompt::SYSTEM_INSTRUCTION;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Prefix of every AI failure shown to the user.
pub const AI_ERROR_PREFIX: &str = "Ocurrio un error al contactar a la IA: ";

const SPINNER_MESSAGE: &str = "🧠 La IA está generando tu plan...";
const USER_AGENT: &str = concat!("nutria/", env!("CARGO_PKG_VERSION"));

/// Why a generation call produced no usable text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AiError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("provider returned HTTP {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("empty response ({reason})")]
    EmptyResponse { reason: String },
}

impl AiError {
    /// Text shown in place of an answer.
    pub fn user_message(&self) -> String {
        format!("{AI_ERROR_PREFIX}{self}")
    }
}

/// Text generation seam: a prompt in, Markdown text or a tagged failure out.
pub trait Generator {
    fn generate(&self, prompt: &str) -> Result<String, AiError>;
}

impl<G: Generator + ?Sized> Generator for &G {
    fn generate(&self, prompt: &str) -> Result<String, AiError> {
        (**self).generate(prompt)
    }
}

impl<G: Generator + ?Sized> Generator for Box<G> {
    fn generate(&self, prompt: &str) -> Result<String, AiError> {
        (**self).generate(prompt)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: RequestContent<'a>,
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<ResponseContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    status: Option<String>,
}

fn build_request(prompt: &str) -> GenerateContentRequest<'_> {
    GenerateContentRequest {
        system_instruction: RequestContent {
            role: None,
            parts: vec![RequestPart {
                text: SYSTEM_INSTRUCTION,
            }],
        },
        contents: vec![RequestContent {
            role: Some("user"),
            parts: vec![RequestPart { text: prompt }],
        }],
    }
}

/// Concatenate the text parts of the first candidate.
fn extract_text(response: GenerateContentResponse) -> Result<String, AiError> {
    let block_reason = response
        .prompt_feedback
        .and_then(|f| f.block_reason);

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(AiError::EmptyResponse {
            reason: block_reason.unwrap_or_else(|| "no candidates".to_owned()),
        });
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        return Err(AiError::EmptyResponse {
            reason: candidate
                .finish_reason
                .unwrap_or_else(|| "no text parts".to_owned()),
        });
    }
    Ok(text)
}

/// Map a non-success HTTP response to [`AiError::Provider`], keeping the
/// provider's own message when the body carries one.
fn provider_error(status: u16, body: &str) -> AiError {
    let message = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(env) => match env.error.status {
            Some(s) if !env.error.message.is_empty() => format!("{s}: {}", env.error.message),
            Some(s) => s,
            None => env.error.message,
        },
        Err(_) => body.trim().to_owned(),
    };
    AiError::Provider { status, message }
}

/// Production [`Generator`] backed by the Gemini `generateContent` endpoint.
#[derive(Debug)]
pub struct GeminiClient {
    http: reqwest::blocking::Client,
    api_key: ApiKey,
    api_base: String,
    model: String,
    show_progress: bool,
}

impl GeminiClient {
    /// `timeout` of `None` leaves the request unbounded so provider-side
    /// limits apply.
    pub fn new(
        api_key: ApiKey,
        model: impl Into<String>,
        api_base: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, NutriaError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| NutriaError::HttpClientFailed {
                detail: e.to_string(),
            })?;
        Ok(Self {
            http,
            api_key,
            api_base: api_base.into().trim_end_matches('/').to_owned(),
            model: model.into(),
            show_progress: std::io::stderr().is_terminal(),
        })
    }

    /// Force the spinner on or off (it defaults to on when stderr is a TTY).
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }

    fn call(&self, prompt: &str) -> Result<String, AiError> {
        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", self.api_key.expose())
            .json(&build_request(prompt))
            .send()
            .map_err(|e| AiError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| AiError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(provider_error(status.as_u16(), &body));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|e| AiError::MalformedResponse(e.to_string()))?;
        extract_text(parsed)
    }
}

impl Generator for GeminiClient {
    fn generate(&self, prompt: &str) -> Result<String, AiError> {
        let started = Instant::now();
        let spinner = self.show_progress.then(start_spinner);

        let result = self.call(prompt);

        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }

        let duration_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(text) => tracing::info!(
                model = %self.model,
                prompt_len = prompt.len(),
                response_len = text.len(),
                duration_ms,
                "generation completed"
            ),
            Err(e) => tracing::warn!(
                model = %self.model,
                prompt_len = prompt.len(),
                duration_ms,
                err = %e,
                "generation failed"
            ),
        }
        result
    }
}

fn start_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(SPINNER_MESSAGE);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
