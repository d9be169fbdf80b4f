//! 对话编排
//!
//! 一次请求的完整流程：
//! 1. 在截止时间内调用补全接口
//! 2. 根据结果确定回复（成功、空结果或降级文本）
//! 3. 构造对话记录，交给独立的后台任务保存
//! 4. 立即返回回复，不等待保存结果
//!
//! 保存失败只记录日志，不会影响已经确定的回复。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;
use tracing::{debug, error, info, Instrument};

use crate::core::completion::{CompletionPort, CompletionRequest};
use crate::core::store::{ChatRecord, ChatRepository};
use crate::errors::{ChatbotError, Result};

use super::chat::ChatService;

/// 补全调用的截止时间
pub const COMPLETION_DEADLINE: Duration = Duration::from_secs(90);

/// 后台保存的截止时间
pub const SAVE_DEADLINE: Duration = Duration::from_secs(5);

/// 补全调用失败（超时、网络、服务端错误）时的回复
pub const FALLBACK_REPLY: &str = "Sorry, I'm having trouble thinking right now.";

/// 补全调用成功但没有任何候选时的回复
pub const EMPTY_REPLY: &str = "I received an empty response.";

/// 对话编排器
///
/// 补全客户端和存储都是长期共享的，编排器不对它们加锁。
#[derive(Clone)]
pub struct ChatOrchestrator {
    model: String,
    completion: Arc<dyn CompletionPort>,
    repository: Arc<dyn ChatRepository>,
    completion_deadline: Duration,
    save_deadline: Duration,
}

impl ChatOrchestrator {
    pub fn new(
        model: impl Into<String>,
        completion: Arc<dyn CompletionPort>,
        repository: Arc<dyn ChatRepository>,
    ) -> Self {
        Self {
            model: model.into(),
            completion,
            repository,
            completion_deadline: COMPLETION_DEADLINE,
            save_deadline: SAVE_DEADLINE,
        }
    }

    /// 覆盖补全截止时间
    pub fn with_completion_deadline(mut self, deadline: Duration) -> Self {
        self.completion_deadline = deadline;
        self
    }

    /// 覆盖保存截止时间
    pub fn with_save_deadline(mut self, deadline: Duration) -> Self {
        self.save_deadline = deadline;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn completion_deadline(&self) -> Duration {
        self.completion_deadline
    }

    pub fn save_deadline(&self) -> Duration {
        self.save_deadline
    }

    /// 调用补全接口并确定回复文本
    async fn resolve_reply(&self, message: &str) -> String {
        let request = CompletionRequest::new(&self.model, message);
        let deadline = self.completion_deadline;

        info!(model = %self.model, "Sending request to AI");

        let outcome = match timeout(deadline, self.completion.complete(request, deadline)).await {
            Ok(result) => result,
            Err(_) => Err(ChatbotError::DeadlineExceeded(deadline)),
        };

        match outcome {
            Err(e) => {
                error!(
                    model = %self.model,
                    timeout = e.is_timeout(),
                    error = %e,
                    "AI API call failed"
                );
                FALLBACK_REPLY.to_string()
            }
            Ok(reply) => match reply.choices.into_iter().next() {
                Some(choice) => choice.content,
                None => {
                    error!(model = %self.model, "AI returned an empty response");
                    EMPTY_REPLY.to_string()
                }
            },
        }
    }

    /// 在独立任务中保存记录
    ///
    /// 任务带有自己的截止时间，结果只进入日志。
    fn spawn_save(&self, record: ChatRecord) {
        let repository = Arc::clone(&self.repository);
        let deadline = self.save_deadline;

        // 不保留句柄，任务与请求路径分离
        tokio::spawn(
            async move {
                match save_with_deadline(repository.as_ref(), record, deadline).await {
                    Ok(()) => debug!("Chat record saved"),
                    Err(e) => error!(timeout = e.is_timeout(), error = %e, "Async save failed"),
                }
            }
            .in_current_span(),
        );
    }
}

async fn save_with_deadline(
    repository: &dyn ChatRepository,
    record: ChatRecord,
    deadline: Duration,
) -> Result<()> {
    match timeout(deadline, repository.save(record, deadline)).await {
        Ok(result) => result,
        Err(_) => Err(ChatbotError::DeadlineExceeded(deadline)),
    }
}

#[async_trait]
impl ChatService for ChatOrchestrator {
    async fn respond(&self, message: &str) -> String {
        let reply = self.resolve_reply(message).await;

        let record = ChatRecord::new(message, reply.as_str());
        self.spawn_save(record);

        reply
    }
}
