//! 存储接口定义
//!
//! 提供对话记录持久化能力的抽象接口，支持内存和SQLite实现

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::Result;

pub mod memory;

pub use memory::MemoryStore;

/// 一条对话记录
///
/// 只在回复确定之后构造，交给存储后不再修改。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRecord {
    /// 用户说的话
    pub user_message: String,
    /// AI 回复的话（可能是降级文本）
    pub ai_message: String,
    /// 记录创建时间
    pub created_at: DateTime<Utc>,
}

impl ChatRecord {
    /// 以当前时间创建记录
    pub fn new(user_message: impl Into<String>, ai_message: impl Into<String>) -> Self {
        Self {
            user_message: user_message.into(),
            ai_message: ai_message.into(),
            created_at: Utc::now(),
        }
    }
}

/// 存储接口
///
/// 只追加，不读回。实现需要支持并发的独立写入。
#[async_trait]
pub trait ChatRepository: Send + Sync {
    /// 在 `deadline` 内保存一条记录
    async fn save(&self, record: ChatRecord, deadline: Duration) -> Result<()>;
}
