//! LLM 对话网关
//!
//! 接收 HTTP 消息，转发给 OpenAI 兼容的补全服务，返回回复，
//! 并在后台把这次对话写入存储：
//! - 补全调用有截止时间，失败或空结果时返回固定的降级回复
//! - 保存在独立任务中进行，失败只记录日志，不影响回复
//! - 补全服务和存储都通过 trait 抽象，可替换
//!
//! # 架构分层
//!
//! - `core`: 核心层，对话记录、补全和存储接口、配置
//! - `application`: 应用层，对话编排
//! - `infrastructure`: 基础设施层，OpenAI、SQLite、HTTP、日志

// 核心层
pub mod core;

// 应用层
pub mod application;

// 基础设施层
pub mod infrastructure;

// 错误类型
pub mod errors;

// 重新导出核心类型
pub use crate::core::completion::{
    CompletionChoice, CompletionPort, CompletionReply, CompletionRequest,
};
pub use crate::core::config::{AppConfig, ServiceMode};
pub use crate::core::store::{ChatRecord, ChatRepository, MemoryStore};

// 重新导出应用类型
pub use crate::application::chat::{ChatService, EchoService};
pub use crate::application::orchestrator::{
    ChatOrchestrator, COMPLETION_DEADLINE, EMPTY_REPLY, FALLBACK_REPLY, SAVE_DEADLINE,
};

// 重新导出基础设施类型
pub use crate::infrastructure::llm::OpenAIClient;
pub use crate::infrastructure::logger;
pub use crate::infrastructure::store::SqliteStore;
pub use crate::infrastructure::web::{create_router, start_web_server, AppState};

pub use crate::errors::{ChatbotError, Result};

/// 版本号
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
