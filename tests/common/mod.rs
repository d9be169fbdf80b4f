//! 测试通用工具
//!
//! 提供可编排的补全接口、会失败或变慢的存储，以及等待后台保存完成的辅助函数

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use chatbot::core::completion::{CompletionPort, CompletionReply, CompletionRequest};
use chatbot::core::store::{ChatRecord, ChatRepository, MemoryStore};
use chatbot::errors::{ChatbotError, Result};

static INIT: Once = Once::new();

/// 初始化测试环境
pub fn setup() {
    INIT.call_once(|| {
        // 设置测试日志
        let _ = tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_test_writer()
            .try_init();
    });
}

/// 补全接口的行为
#[derive(Debug, Clone)]
pub enum Behavior {
    /// 返回 "Echo: <message>"
    Echo,
    /// 返回给定的候选
    Reply(Vec<String>),
    /// 返回零个候选
    Empty,
    /// 调用失败
    Fail,
}

/// 可编排的补全接口
pub struct ScriptedCompletion {
    behavior: Behavior,
    delay: Duration,
    calls: AtomicUsize,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedCompletion {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// 每次调用前等待 `delay`，不理会截止时间
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl CompletionPort for ScriptedCompletion {
    async fn complete(
        &self,
        request: CompletionRequest,
        _deadline: Duration,
    ) -> Result<CompletionReply> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().await.push(request.clone());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match &self.behavior {
            Behavior::Echo => Ok(CompletionReply::from_texts([format!(
                "Echo: {}",
                request.message
            )])),
            Behavior::Reply(texts) => Ok(CompletionReply::from_texts(texts.clone())),
            Behavior::Empty => Ok(CompletionReply::empty()),
            Behavior::Fail => Err(ChatbotError::LlmError("provider unavailable".to_string())),
        }
    }
}

/// 总是失败的存储
#[derive(Default)]
pub struct FailingStore {
    attempts: AtomicUsize,
}

impl FailingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatRepository for FailingStore {
    async fn save(&self, _record: ChatRecord, _deadline: Duration) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(ChatbotError::StorageError("disk full".to_string()))
    }
}

/// 写入前先等待的存储，写入落到内部的内存存储
///
/// 写入在完成前被丢弃（例如超过截止时间）时计入 `cancelled()`。
pub struct SlowStore {
    delay: Duration,
    inner: MemoryStore,
    cancelled: Arc<AtomicUsize>,
}

impl SlowStore {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            inner: MemoryStore::new(),
            cancelled: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub async fn records(&self) -> Vec<ChatRecord> {
        self.inner.records().await
    }

    pub fn cancelled(&self) -> usize {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// 未完成时被丢弃则计数
struct CancelGuard {
    counter: Arc<AtomicUsize>,
    finished: bool,
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        if !self.finished {
            self.counter.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl ChatRepository for SlowStore {
    async fn save(&self, record: ChatRecord, deadline: Duration) -> Result<()> {
        let mut guard = CancelGuard {
            counter: self.cancelled.clone(),
            finished: false,
        };
        tokio::time::sleep(self.delay).await;
        let result = self.inner.save(record, deadline).await;
        guard.finished = true;
        result
    }
}

/// 等待内存存储中至少有 `n` 条记录
pub async fn wait_for_records(store: &MemoryStore, n: usize) -> Vec<ChatRecord> {
    tokio::time::timeout(TEST_TIMEOUT_SHORT, async {
        loop {
            let records = store.records().await;
            if records.len() >= n {
                return records;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("timed out waiting for background save")
}

/// 构造使用内存存储的编排器
pub fn orchestrator_with_memory(
    completion: Arc<dyn CompletionPort>,
) -> (chatbot::ChatOrchestrator, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let orchestrator = chatbot::ChatOrchestrator::new("test-model", completion, store.clone());
    (orchestrator, store)
}

/// 常用的测试超时时间
pub const TEST_TIMEOUT_SHORT: Duration = Duration::from_secs(5);
