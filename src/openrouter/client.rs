use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::EnvMap;

use super::{
    error::{OpenRouterError, OpenRouterResult},
    models::{ChatMessage, ChatRequest, ChatResponse, Model, ModelListing},
};

/// Base URL of the OpenAI-compatible OpenRouter API.
pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Operations the rest of the application needs from a model provider.
pub trait ModelProvider: Send + Sync {
    /// List every model the provider offers.
    fn list_models(&self) -> BoxFuture<'_, OpenRouterResult<Vec<Model>>>;
    /// Send a single user message to `model` and return the reply text.
    fn chat<'a>(&'a self, model: &'a str, message: &'a str)
    -> BoxFuture<'a, OpenRouterResult<String>>;
}

/// HTTP client for the OpenRouter API.
#[derive(Clone)]
pub struct OpenRouterClient {
    client: Client,
    base_url: Arc<str>,
    api_key: Arc<str>,
}

impl OpenRouterClient {
    /// Client pointed at [`OPENROUTER_BASE_URL`].
    pub fn new(api_key: impl Into<String>) -> OpenRouterResult<Self> {
        Self::with_base_url(api_key, OPENROUTER_BASE_URL)
    }

    /// Client pointed at an arbitrary OpenAI-compatible endpoint.
    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl AsRef<str>,
    ) -> OpenRouterResult<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|source| OpenRouterError::ClientBuilder { source })?;

        Ok(Self {
            client,
            base_url: Arc::<str>::from(base_url.as_ref().trim_end_matches('/')),
            api_key: Arc::<str>::from(api_key.into()),
        })
    }

    /// API key sent as bearer token.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Base URL requests are issued against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path);
        self.client
            .request(method, url)
            .bearer_auth(self.api_key.as_ref())
    }

    async fn send_json<T>(&self, path: &str, builder: RequestBuilder) -> OpenRouterResult<T>
    where
        T: DeserializeOwned,
    {
        let response = builder
            .send()
            .await
            .map_err(|source| OpenRouterError::RequestSend {
                path: path.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(OpenRouterError::RequestStatus {
                path: path.to_string(),
                status,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|source| OpenRouterError::DecodeResponse {
                path: path.to_string(),
                source,
            })
    }

    /// `GET /models`.
    pub async fn fetch_models(&self) -> OpenRouterResult<Vec<Model>> {
        let path = "models";
        let listing: ModelListing = self
            .send_json(path, self.request(Method::GET, path))
            .await?;
        let models: Vec<Model> = listing.into();
        debug!(count = models.len(), "listed OpenRouter models");
        Ok(models)
    }

    /// `POST /chat/completions` with a single user message.
    pub async fn complete(&self, model: &str, message: &str) -> OpenRouterResult<String> {
        let path = "chat/completions";
        let body = ChatRequest {
            model,
            messages: [ChatMessage {
                role: "user",
                content: message,
            }],
        };
        let response: ChatResponse = self
            .send_json(path, self.request(Method::POST, path).json(&body))
            .await?;

        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or_else(|| OpenRouterError::NoChoices {
                model: model.to_string(),
            })
    }
}

impl ModelProvider for OpenRouterClient {
    fn list_models(&self) -> BoxFuture<'_, OpenRouterResult<Vec<Model>>> {
        Box::pin(self.fetch_models())
    }

    fn chat<'a>(
        &'a self,
        model: &'a str,
        message: &'a str,
    ) -> BoxFuture<'a, OpenRouterResult<String>> {
        Box::pin(self.complete(model, message))
    }
}

/// Create a client for OpenRouter.
///
/// An explicit `api_key` wins; otherwise `OPENROUTER_API_KEY` is read from `env`.
pub fn create_openrouter_client(
    api_key: Option<&str>,
    env: &EnvMap,
) -> OpenRouterResult<OpenRouterClient> {
    let key = api_key
        .filter(|key| !key.is_empty())
        .or_else(|| {
            env.get("OPENROUTER_API_KEY")
                .map(String::as_str)
                .filter(|key| !key.is_empty())
        })
        .ok_or(OpenRouterError::MissingApiKey)?;
    OpenRouterClient::new(key)
}
