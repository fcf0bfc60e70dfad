//! Model access: the [`TextGenerator`] capability and the two requests the
//! session makes through it.
//!
//! All prompt wording lives in [`crate::prompts`]; this module only sends a
//! rendered prompt, applies the optional timeout, reports progress, and turns
//! failures into [`GenerateError`]s. There is no retry: a failed request is
//! reported to the user, who can simply ask again.

use crate::config::SessionConfig;
use crate::error::{GenerateError, PdfTopicsError};
use crate::output::TopicList;
use crate::progress::RequestKind;
use crate::prompts::{summary_prompt, topic_extraction_prompt};
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, LlmError, ProviderFactory};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{timeout, Duration};
use tracing::{debug, info, warn};

/// Turns a prompt into text. The only thing the session needs from a model.
pub trait TextGenerator: Send + Sync {
    fn generate<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, GenerateError>>;
}

/// [`TextGenerator`] backed by an edgequake-llm provider.
pub struct ProviderGenerator {
    provider: Arc<dyn LLMProvider>,
    options: CompletionOptions,
}

impl ProviderGenerator {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self {
            provider,
            options: CompletionOptions::default(),
        }
    }

    /// Use the sampling settings from `config`.
    pub fn with_config(mut self, config: &SessionConfig) -> Self {
        self.options = CompletionOptions {
            temperature: Some(config.temperature),
            max_tokens: Some(config.max_tokens),
            ..Default::default()
        };
        self
    }
}

impl TextGenerator for ProviderGenerator {
    fn generate<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, GenerateError>> {
        Box::pin(async move {
            let messages = vec![ChatMessage::user(prompt)];
            match self.provider.chat(&messages, Some(&self.options)).await {
                Ok(response) => {
                    debug!(
                        "{} input tokens, {} output tokens",
                        response.prompt_tokens, response.completion_tokens
                    );
                    if response.content.trim().is_empty() {
                        Err(GenerateError::MalformedResponse(
                            "model returned no text".to_string(),
                        ))
                    } else {
                        Ok(response.content)
                    }
                }
                Err(e) => Err(classify_provider_error(&e)),
            }
        })
    }
}

/// Map an edgequake-llm error onto [`GenerateError`].
///
/// Typed variants decide directly. Only free-form provider messages fall back
/// to looking for quota wording, since some providers report a 429 that way.
pub(crate) fn classify_provider_error(err: &LlmError) -> GenerateError {
    let detail = err.to_string();
    match err {
        LlmError::RateLimited(_) => GenerateError::Quota(detail),
        LlmError::SerializationError(_) => GenerateError::MalformedResponse(detail),
        LlmError::NetworkError(_) | LlmError::Timeout => GenerateError::Network(detail),
        LlmError::ApiError(msg) | LlmError::ProviderError(msg) | LlmError::Unknown(msg)
            if mentions_quota(msg) =>
        {
            GenerateError::Quota(detail)
        }
        _ => GenerateError::Network(detail),
    }
}

fn mentions_quota(message: &str) -> bool {
    let lower = message.to_lowercase();
    ["429", "rate limit", "rate_limit", "ratelimit", "quota", "resource_exhausted"]
        .iter()
        .any(|needle| lower.contains(needle))
}

/// Send one prompt, honouring the configured timeout and progress callback.
pub async fn request(
    generator: &dyn TextGenerator,
    kind: RequestKind,
    prompt: &str,
    config: &SessionConfig,
) -> Result<String, PdfTopicsError> {
    let start = Instant::now();
    if let Some(ref cb) = config.progress_callback {
        cb.on_request_start(kind);
    }
    debug!("Sending {} prompt ({} bytes)", kind, prompt.len());

    let result = match config.api_timeout_secs {
        Some(secs) => timeout(Duration::from_secs(secs), generator.generate(prompt))
            .await
            .unwrap_or(Err(GenerateError::Timeout { secs })),
        None => generator.generate(prompt).await,
    };

    match result {
        Ok(text) => {
            info!(
                "{} answered with {} bytes in {:?}",
                kind,
                text.len(),
                start.elapsed()
            );
            if let Some(ref cb) = config.progress_callback {
                cb.on_request_complete(kind, text.len());
            }
            Ok(text)
        }
        Err(source) => {
            warn!("{} request failed: {}", kind, source);
            if let Some(ref cb) = config.progress_callback {
                cb.on_request_error(kind, &source.to_string());
            }
            Err(PdfTopicsError::Generation { kind, source })
        }
    }
}

/// Ask the model for the topics discussed in `text`.
pub async fn request_topics(
    generator: &dyn TextGenerator,
    text: &str,
    config: &SessionConfig,
) -> Result<TopicList, PdfTopicsError> {
    let raw = request(
        generator,
        RequestKind::Topics,
        &topic_extraction_prompt(text),
        config,
    )
    .await?;
    Ok(TopicList::from_response(&raw))
}

/// Ask the model for a summary of `topic` based on `text`.
pub async fn request_summary(
    generator: &dyn TextGenerator,
    topic: &str,
    text: &str,
    config: &SessionConfig,
) -> Result<String, PdfTopicsError> {
    request(
        generator,
        RequestKind::Summary,
        &summary_prompt(topic, text),
        config,
    )
    .await
}

/// Default model when only a provider is known.
pub fn default_model(provider_name: &str) -> &'static str {
    match provider_name {
        "gemini" | "google" => "gemini-1.5-flash",
        "anthropic" => "claude-haiku-4-20250514",
        "ollama" => "llama3.2",
        _ => "gpt-4.1-nano",
    }
}

fn create_provider(
    provider_name: &str,
    model: &str,
    config: &SessionConfig,
) -> Result<Arc<dyn TextGenerator>, PdfTopicsError> {
    info!("Using provider '{}' with model '{}'", provider_name, model);
    let provider = ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        PdfTopicsError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })?;
    Ok(Arc::new(ProviderGenerator::new(provider).with_config(config)))
}

fn env_set(name: &str) -> bool {
    std::env::var(name).map(|v| !v.is_empty()).unwrap_or(false)
}

/// Resolve the generator, from most-specific to least-specific:
///
/// 1. a pre-built generator or provider in the config;
/// 2. a provider named in the config (model from config or [`default_model`]);
/// 3. `PDFTOPICS_PROVIDER` + `PDFTOPICS_MODEL`, when both are set;
/// 4. Gemini when `GEMINI_API_KEY` or `GOOGLE_API_KEY` is set;
/// 5. OpenAI when `OPENAI_API_KEY` is set;
/// 6. whatever `ProviderFactory::from_env` finds.
pub fn resolve_generator(config: &SessionConfig) -> Result<Arc<dyn TextGenerator>, PdfTopicsError> {
    if let Some(ref generator) = config.generator {
        return Ok(Arc::clone(generator));
    }

    if let Some(ref provider) = config.provider {
        return Ok(Arc::new(
            ProviderGenerator::new(Arc::clone(provider)).with_config(config),
        ));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(default_model(name));
        return create_provider(name, model, config);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("PDFTOPICS_PROVIDER"),
        std::env::var("PDFTOPICS_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model, config);
        }
    }

    for (key, provider) in [
        ("GEMINI_API_KEY", "gemini"),
        ("GOOGLE_API_KEY", "gemini"),
        ("OPENAI_API_KEY", "openai"),
    ] {
        if env_set(key) {
            let model = config.model.as_deref().unwrap_or(default_model(provider));
            return create_provider(provider, model, config);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| PdfTopicsError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set GEMINI_API_KEY, OPENAI_API_KEY, or pass --provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(Arc::new(
        ProviderGenerator::new(llm_provider).with_config(config),
    ))
}
