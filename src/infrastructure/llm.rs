//! LLM 客户端
//!
//! 使用 async-openai 实现补全接口，兼容任何 OpenAI 风格的服务

use std::time::Duration;

use async_openai::config::OpenAIConfig;
use async_openai::types::chat::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequest, CreateChatCompletionRequestArgs, CreateChatCompletionResponse,
};
use async_openai::Client;
use async_trait::async_trait;
use tracing::debug;

use crate::core::completion::{CompletionChoice, CompletionPort, CompletionReply, CompletionRequest};
use crate::errors::{ChatbotError, Result};

/// OpenAI 客户端
///
/// 内部的 HTTP 连接池可在多个请求间共享。
#[derive(Clone)]
pub struct OpenAIClient {
    client: Client<OpenAIConfig>,
    base_url: String,
}

impl OpenAIClient {
    /// 创建新的 OpenAI 客户端
    ///
    /// `api_key` 可以为空，此时请求会被服务端拒绝并按失败处理。
    pub fn new_with_base_url(api_key: String, base_url: String) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();

        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(base_url.clone());

        let client = Client::with_config(config);

        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// 构建单条用户消息的请求
    fn build_request(request: &CompletionRequest) -> Result<CreateChatCompletionRequest> {
        let message = ChatCompletionRequestUserMessageArgs::default()
            .content(request.message.clone())
            .build()
            .map(ChatCompletionRequestMessage::User)?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&request.model)
            .messages(vec![message])
            .build()?;

        Ok(request)
    }

    /// 缺失的 content 视为空字符串
    fn into_reply(response: CreateChatCompletionResponse) -> CompletionReply {
        CompletionReply {
            choices: response
                .choices
                .into_iter()
                .map(|c| CompletionChoice {
                    content: c.message.content.unwrap_or_default(),
                })
                .collect(),
        }
    }
}

#[async_trait]
impl CompletionPort for OpenAIClient {
    async fn complete(
        &self,
        request: CompletionRequest,
        deadline: Duration,
    ) -> Result<CompletionReply> {
        let request = Self::build_request(&request)?;

        let response = tokio::time::timeout(deadline, self.client.chat().create(request))
            .await
            .map_err(|_| ChatbotError::DeadlineExceeded(deadline))??;

        debug!(choices = response.choices.len(), "AI response received");

        Ok(Self::into_reply(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = OpenAIClient::new_with_base_url(
            "test-key".to_string(),
            "https://api.openai.com/v1/".to_string(),
        );

        assert_eq!(client.base_url(), "https://api.openai.com/v1");
    }

    #[test]
    fn test_build_request() {
        let request = CompletionRequest::new("gpt-4o-mini", "Hello");
        let built = OpenAIClient::build_request(&request).unwrap();

        assert_eq!(built.model, "gpt-4o-mini");
        assert_eq!(built.messages.len(), 1);
        assert!(matches!(built.messages[0], ChatCompletionRequestMessage::User(_)));
    }

    #[test]
    fn test_build_request_empty_message() {
        let request = CompletionRequest::new("gpt-4o-mini", "");
        assert!(OpenAIClient::build_request(&request).is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_provider_fails() {
        let client = OpenAIClient::new_with_base_url(
            String::new(),
            "http://127.0.0.1:1/v1".to_string(),
        );

        let result = client
            .complete(
                CompletionRequest::new("gpt-4o-mini", "Hello"),
                Duration::from_secs(5),
            )
            .await;

        assert!(result.is_err());
    }
}
