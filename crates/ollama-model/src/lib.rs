//! A model provider for a local [Ollama](https://ollama.com) server.
//!
//! Requests go through Ollama's OpenAI-compatible chat completions
//! endpoint with streaming enabled, so replies arrive as server-sent
//! events and tool calls use the OpenAI function-calling format.

#[macro_use]
extern crate tracing;

mod config;
mod io;
mod proto;
mod response;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use mime::Mime;
use parley_model::{
    ErrorKind, ModelProvider, ModelProviderError, ModelRequest,
};
use reqwest::{Client, Response, StatusCode, header};

pub use config::{
    DEFAULT_BASE_URL, DEFAULT_MODEL, OllamaConfig, OllamaConfigBuilder,
};
use io::{Chunks, Sse};
use proto::ErrorBody;
pub use response::OllamaResponse;

/// Error type for [`OllamaProvider`].
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// Ollama model provider.
#[derive(Clone, Debug)]
pub struct OllamaProvider {
    client: Client,
    config: Arc<OllamaConfig>,
}

impl OllamaProvider {
    /// Creates a new `OllamaProvider` with the given configuration.
    #[inline]
    pub fn new(config: OllamaConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }

    /// Returns the configuration this provider was built with.
    #[inline]
    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }
}

impl ModelProvider for OllamaProvider {
    type Error = Error;
    type Response = OllamaResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let ollama_req = proto::create_request(req, &self.config);
        let mut builder = self
            .client
            .post(self.config.chat_completions_url())
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "text/event-stream")
            .json(&ollama_req);
        if let Some(api_key) = &self.config.api_key {
            builder =
                builder.header(header::AUTHORIZATION, format!("Bearer {api_key}"));
        }
        let resp_fut = builder.send();

        async move {
            let resp = resp_fut.await.map_err(|err| {
                let kind = if err.is_connect() || err.is_timeout() {
                    ErrorKind::Unavailable
                } else {
                    ErrorKind::Other
                };
                Error::new(format!("{err}"), kind)
            })?;
            let resp = check_status(resp).await?;

            let content_type = resp
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok());
            let is_event_stream = content_type
                .and_then(|v| v.parse().ok())
                .map(|m: Mime| m.subtype().as_str() == "event-stream")
                .unwrap_or(false);
            if !is_event_stream {
                return Err(Error::new(
                    format!("Unexpected content type: {content_type:?}"),
                    ErrorKind::Other,
                ));
            }

            // Here we got a successful response.
            let chunks = Chunks::from_response(resp);
            let sse = Sse::new(chunks);
            Ok(OllamaResponse::from_sse(sse))
        }
    }
}

async fn check_status(resp: Response) -> Result<Response, Error> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|body| body.error.message)
        .unwrap_or(body);
    debug!("server responded with {status}: {message}");
    Err(Error::new(
        format!("{status}: {message}"),
        error_kind_for_status(status),
    ))
}

fn error_kind_for_status(status: StatusCode) -> ErrorKind {
    match status {
        StatusCode::TOO_MANY_REQUESTS => ErrorKind::RateLimitExceeded,
        // Ollama answers 404 when the model has not been pulled.
        StatusCode::NOT_FOUND | StatusCode::SERVICE_UNAVAILABLE => {
            ErrorKind::Unavailable
        }
        _ => ErrorKind::Other,
    }
}
