use std::fmt::{self, Debug};

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-oss:20b";

/// Where a local `ollama serve` exposes its OpenAI-compatible API.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434/v1";

/// Builder for [`OllamaConfig`].
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct OllamaConfigBuilder {
    api_key: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
}

impl OllamaConfigBuilder {
    /// Creates a builder with every setting at its default.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the model to use, as listed by `ollama list`.
    #[inline]
    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets a custom base URL, e.g. a remote host running Ollama.
    #[inline]
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets a bearer token for servers placed behind an authenticating
    /// proxy. A local server needs none.
    #[inline]
    pub fn with_api_key<S: Into<String>>(mut self, api_key: S) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Builds the configuration.
    #[inline]
    pub fn build(self) -> OllamaConfig {
        let base_url = self
            .base_url
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        OllamaConfig {
            api_key: self.api_key.filter(|key| !key.trim().is_empty()),
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: normalize_base_url(&base_url),
        }
    }
}

impl Debug for OllamaConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OllamaConfigBuilder")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Configuration for the Ollama provider.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct OllamaConfig {
    pub(crate) api_key: Option<String>,
    pub(crate) model: String,
    pub(crate) base_url: String,
}

impl OllamaConfig {
    /// Returns the model name.
    #[inline]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns the normalized base URL, always ending with `/v1`.
    #[inline]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

impl Debug for OllamaConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OllamaConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Accepts both the server root (`http://host:11434`) and the
/// compatibility root (`http://host:11434/v1`).
fn normalize_base_url(base_url: &str) -> String {
    let trimmed = base_url.trim().trim_end_matches('/');
    if trimmed.ends_with("/v1") {
        trimmed.to_owned()
    } else {
        format!("{trimmed}/v1")
    }
}
