//! 补全接口定义
//!
//! 对 LLM 提供方的抽象：给定模型和消息，在截止时间内返回补全结果或失败。
//! 具体实现见 `infrastructure::llm`。

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// 补全请求
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// 模型标识
    pub model: String,
    /// 用户消息（原样转发）
    pub message: String,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            message: message.into(),
        }
    }
}

/// 单个候选回复
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionChoice {
    pub content: String,
}

/// 补全结果
///
/// `choices` 为空表示调用成功但没有可用内容，与调用失败（`Err`）区分开。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionReply {
    pub choices: Vec<CompletionChoice>,
}

impl CompletionReply {
    /// 由若干文本构造
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            choices: texts
                .into_iter()
                .map(|t| CompletionChoice { content: t.into() })
                .collect(),
        }
    }

    /// 没有任何候选
    pub fn empty() -> Self {
        Self::default()
    }

    /// 第一个候选的内容
    pub fn first_content(&self) -> Option<&str> {
        self.choices.first().map(|c| c.content.as_str())
    }
}

/// 补全接口
///
/// 实现必须遵守调用方给出的 `deadline`，调用不得超过该时长。
/// 失败不会被重试。
#[async_trait]
pub trait CompletionPort: Send + Sync {
    async fn complete(
        &self,
        request: CompletionRequest,
        deadline: Duration,
    ) -> Result<CompletionReply>;
}
