//! 内存存储实现
//!
//! 数据仅在内存中，重启后丢失，适合测试和无需持久化的场景

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::errors::Result;

use super::{ChatRecord, ChatRepository};

/// 内存存储
pub struct MemoryStore {
    records: RwLock<Vec<ChatRecord>>,
}

impl MemoryStore {
    /// 创建新的内存存储
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }

    /// 读取全部记录（按写入顺序）
    pub async fn records(&self) -> Vec<ChatRecord> {
        self.records.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatRepository for MemoryStore {
    async fn save(&self, record: ChatRecord, _deadline: Duration) -> Result<()> {
        let mut records = self.records.write().await;
        records.push(record);
        Ok(())
    }
}
