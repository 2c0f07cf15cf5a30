use async_trait::async_trait;
use crate::config::LLMConfig;
use crate::llm::openai::OpenAIAdapter;
use crate::types::{LLMProvider, LLMRequest, LLMResponse, AppResult};

#[async_trait]
pub trait LLMAdapter: Send + Sync {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse>;
}

/// Shared chat-completion client. Built once at startup and handed to the
/// proposal agent.
pub struct LLM {
    adapter: Box<dyn LLMAdapter>,
    provider_name: String,
}

impl LLM {
    pub fn new(config: &LLMConfig) -> Self {
        let adapter: Box<dyn LLMAdapter> = match (&config.base_url, config.provider) {
            // An explicit base URL wins over the provider's default endpoint
            (Some(base_url), _) => Box::new(OpenAIAdapter::new_with_api_base(&config.api_key, base_url)),
            (None, LLMProvider::OpenAI) => Box::new(OpenAIAdapter::new(&config.api_key)),
            (None, LLMProvider::Groq) => Box::new(crate::llm::groq::GroqAdapter::new(&config.api_key)),
            (None, LLMProvider::OpenRouter) => {
                Box::new(crate::llm::openrouter::OpenRouterAdapter::new(&config.api_key))
            }
        };

        Self {
            adapter,
            provider_name: config.provider.to_string(),
        }
    }

    pub fn with_adapter(adapter: Box<dyn LLMAdapter>, provider_name: impl Into<String>) -> Self {
        Self {
            adapter,
            provider_name: provider_name.into(),
        }
    }

    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }

    pub async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
        self.adapter.create_chat_completion(request).await
    }
}
