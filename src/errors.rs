//! 标准化错误处理
//!
//! 定义项目专用的错误类型

use std::time::Duration;

use thiserror::Error;

/// 项目主要错误类型
#[derive(Error, Debug)]
pub enum ChatbotError {
    /// 配置错误
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// LLM 服务错误（网络、鉴权、服务端错误等）
    #[error("LLM service error: {0}")]
    LlmError(String),

    /// 调用超过截止时间
    #[error("Deadline exceeded after {0:?}")]
    DeadlineExceeded(Duration),

    /// 存储相关错误
    #[error("Storage error: {0}")]
    StorageError(String),

    /// 输入验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl ChatbotError {
    /// 是否为超时
    pub fn is_timeout(&self) -> bool {
        matches!(self, ChatbotError::DeadlineExceeded(_))
    }
}

impl From<async_openai::error::OpenAIError> for ChatbotError {
    fn from(err: async_openai::error::OpenAIError) -> Self {
        ChatbotError::LlmError(err.to_string())
    }
}

impl From<rusqlite::Error> for ChatbotError {
    fn from(err: rusqlite::Error) -> Self {
        ChatbotError::StorageError(err.to_string())
    }
}

impl From<std::io::Error> for ChatbotError {
    fn from(err: std::io::Error) -> Self {
        ChatbotError::StorageError(err.to_string())
    }
}

impl From<tokio::task::JoinError> for ChatbotError {
    fn from(err: tokio::task::JoinError) -> Self {
        ChatbotError::StorageError(format!("Task failed: {}", err))
    }
}

impl From<serde_json::Error> for ChatbotError {
    fn from(err: serde_json::Error) -> Self {
        ChatbotError::ValidationError(err.to_string())
    }
}

/// 项目结果类型别名
pub type Result<T> = std::result::Result<T, ChatbotError>;
