//! 对话服务接口
//!
//! HTTP 层只依赖 [`ChatService`]，不关心背后是 LLM 还是回显。

use async_trait::async_trait;
use tracing::info;

/// 对话服务
///
/// `respond` 总是返回一段文本，失败通过降级回复表达，不向调用方抛错。
#[async_trait]
pub trait ChatService: Send + Sync {
    async fn respond(&self, message: &str) -> String;
}

/// 回显服务
///
/// 不访问任何外部系统，用于联调和冒烟测试。
#[derive(Debug, Clone, Default)]
pub struct EchoService;

impl EchoService {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ChatService for EchoService {
    async fn respond(&self, message: &str) -> String {
        info!(message_length = message.len(), content = %message, "Processing message");
        format!("You said: {}", message)
    }
}
