use std::sync::Arc;
use tracing::{error, info, instrument};

use crate::ai::error::DispatchError;
use crate::ai::prompt::{
    parse_ranked_lines, ChatMessage, Intent, ModelParams, PromptRequest, SUMMARY_MAX_TOKENS,
};
use crate::ai::transport::{ChatTransport, CompletionRequest, HttpTransport};
use crate::config::{keys, Settings};

pub const FALLBACK_REPLY: &str = "Sorry, I encountered an error processing your request.";

/// Client for a hosted chat-completion endpoint.
///
/// `dispatch` returns typed errors. The intent helpers (`chat`, `summarize`, ...)
/// log the error and answer with [`FALLBACK_REPLY`] instead.
#[derive(Clone)]
pub struct LlmClient {
    transport: Arc<dyn ChatTransport>,
    model: String,
}

impl LlmClient {
    /// Fails with a configuration error before any transport exists if no credential is set.
    pub fn from_settings(settings: &Settings) -> Result<Self, DispatchError> {
        let api_key = settings
            .api_key
            .clone()
            .ok_or_else(|| DispatchError::missing_credential(keys::API_KEY))?;
        let transport = HttpTransport::new(&settings.base_url, api_key, settings.request_timeout)?;
        info!(endpoint = %transport.endpoint(), model = %settings.model, "LLM client configured");
        Ok(Self::with_transport(Arc::new(transport), settings.model.clone()))
    }

    pub fn with_transport(transport: Arc<dyn ChatTransport>, model: impl Into<String>) -> Self {
        Self {
            transport,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn default_params(&self) -> ModelParams {
        ModelParams::new(self.model.clone())
    }

    #[instrument(skip(self, request), fields(intent = request.intent.name(), model = %request.params.model))]
    pub async fn dispatch(&self, request: &PromptRequest) -> Result<String, DispatchError> {
        let completion = CompletionRequest {
            model: request.params.model.clone(),
            messages: request.messages(),
            temperature: request.params.temperature,
            max_tokens: request.params.max_tokens,
        };
        self.transport.complete(&completion).await?.first_content()
    }

    async fn dispatch_or_fallback(&self, request: PromptRequest) -> String {
        match self.dispatch(&request).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(
                    intent = request.intent.name(),
                    kind = e.kind(),
                    transient = e.is_transient(),
                    "Error in chat request: {}",
                    e
                );
                FALLBACK_REPLY.to_string()
            }
        }
    }

    pub async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        model: Option<&str>,
        temperature: f32,
        max_tokens: u32,
    ) -> String {
        let params = ModelParams::new(model.unwrap_or(&self.model))
            .with_temperature(temperature)
            .with_max_tokens(max_tokens);
        self.dispatch_or_fallback(PromptRequest::new(Intent::Chat(messages), params))
            .await
    }

    pub async fn generate(&self, prompt: &str, temperature: f32) -> String {
        let params = self.default_params().with_temperature(temperature);
        self.dispatch_or_fallback(PromptRequest::new(
            Intent::Generate { prompt: prompt.to_string() },
            params,
        ))
        .await
    }

    /// The whole text is sent; callers truncate if they need to.
    pub async fn summarize(&self, text: &str, max_tokens: Option<u32>) -> String {
        let params = self
            .default_params()
            .with_max_tokens(max_tokens.unwrap_or(SUMMARY_MAX_TOKENS));
        self.dispatch_or_fallback(PromptRequest::new(
            Intent::Summarize { text: text.to_string() },
            params,
        ))
        .await
    }

    pub async fn translate(&self, text: &str, target_language: &str) -> String {
        self.dispatch_or_fallback(PromptRequest::new(
            Intent::Translate {
                text: text.to_string(),
                target_language: target_language.to_string(),
            },
            self.default_params(),
        ))
        .await
    }

    pub async fn answer_question(&self, context: &str, question: &str) -> String {
        self.dispatch_or_fallback(PromptRequest::new(
            Intent::AnswerQuestion {
                context: context.to_string(),
                question: question.to_string(),
            },
            self.default_params(),
        ))
        .await
    }

    pub async fn try_find_relevant(
        &self,
        query: &str,
        candidates: &[String],
    ) -> Result<Vec<String>, DispatchError> {
        let request = PromptRequest::new(
            Intent::FindRelevant {
                query: query.to_string(),
                candidates: candidates.to_vec(),
            },
            self.default_params(),
        );
        let reply = self.dispatch(&request).await?;
        Ok(parse_ranked_lines(&reply))
    }

    /// Model-ranked lines, trusted as returned. Empty when the request fails.
    pub async fn find_relevant(&self, query: &str, candidates: &[String]) -> Vec<String> {
        self.try_find_relevant(query, candidates)
            .await
            .unwrap_or_else(|e| {
                error!(kind = e.kind(), "Error finding relevant resources: {}", e);
                Vec::new()
            })
    }
}

impl std::fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClient").field("model", &self.model).finish()
    }
}
