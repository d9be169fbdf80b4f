//! 核心层：领域模型和接口抽象
//!
//! 包含对话记录、补全接口、存储接口和配置管理

pub mod completion;
pub mod config;
pub mod store;
