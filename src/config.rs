//! Session configuration.
//!
//! Every knob a session needs lives in [`SessionConfig`], built through
//! [`SessionConfigBuilder`]. Only the model call and the preview renderer
//! have tunables; range parsing and text aggregation are fixed behaviour.

use crate::error::PdfTopicsError;
use crate::pipeline::llm::TextGenerator;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration for a [`crate::session::Session`].
///
/// # Example
/// ```rust
/// use pdf_topics::SessionConfig;
///
/// let config = SessionConfig::builder()
///     .provider_name("gemini")
///     .model("gemini-1.5-flash")
///     .temperature(0.2)
///     .build()
///     .unwrap();
/// assert_eq!(config.model.as_deref(), Some("gemini-1.5-flash"));
/// ```
#[derive(Clone)]
pub struct SessionConfig {
    /// LLM model identifier. If None, the provider's default for this tool.
    pub model: Option<String>,

    /// LLM provider name (e.g. "gemini", "openai", "ollama").
    /// If None, the provider is auto-detected from the environment.
    pub provider_name: Option<String>,

    /// Pre-constructed edgequake-llm provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Pre-constructed generator. Takes precedence over everything else.
    pub generator: Option<Arc<dyn TextGenerator>>,

    /// Sampling temperature. Range 0.0–2.0. Default: 0.3.
    pub temperature: f32,

    /// Maximum tokens the model may generate per request. Default: 2048.
    pub max_tokens: usize,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Per-request model timeout in seconds. Default: None (wait indefinitely).
    pub api_timeout_secs: Option<u64>,

    /// Longest edge of a rendered preview image, in pixels. Default: 1200.
    pub preview_max_pixels: u32,

    /// Directory that holds the transient upload. Default: the system temp dir.
    pub upload_dir: Option<PathBuf>,

    /// Receives extraction and request events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            generator: None,
            temperature: 0.3,
            max_tokens: 2048,
            password: None,
            download_timeout_secs: 120,
            api_timeout_secs: None,
            preview_max_pixels: 1200,
            upload_dir: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("generator", &self.generator.as_ref().map(|_| "<dyn TextGenerator>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("preview_max_pixels", &self.preview_max_pixels)
            .field("upload_dir", &self.upload_dir)
            .finish()
    }
}

impl SessionConfig {
    /// Create a new builder for `SessionConfig`.
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`SessionConfig`].
#[derive(Debug)]
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    /// Use an already-configured edgequake-llm provider.
    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    /// Use any [`TextGenerator`], e.g. a mock in tests.
    pub fn generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.config.generator = Some(generator);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = Some(secs);
        self
    }

    pub fn preview_max_pixels(mut self, px: u32) -> Self {
        self.config.preview_max_pixels = px.max(100);
        self
    }

    pub fn upload_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.upload_dir = Some(dir.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<SessionConfig, PdfTopicsError> {
        let c = &self.config;
        if c.max_tokens == 0 {
            return Err(PdfTopicsError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.api_timeout_secs == Some(0) {
            return Err(PdfTopicsError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        if let Some(dir) = &c.upload_dir {
            if !dir.is_dir() {
                return Err(PdfTopicsError::InvalidConfig(format!(
                    "upload directory {} does not exist",
                    dir.display()
                )));
            }
        }
        Ok(self.config)
    }
}
