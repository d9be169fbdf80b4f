//! 配置管理
//!
//! 配置来自命令行参数或环境变量；启动时先按 `APP_ENV` 加载 `.env.<env>` 文件。

use clap::Parser;

use crate::errors::{ChatbotError, Result};

/// 服务模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceMode {
    /// 调用 LLM 并异步落库
    Ai,
    /// 原样回显，不访问外部系统
    Echo,
}

impl std::str::FromStr for ServiceMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ai" => Ok(ServiceMode::Ai),
            "echo" => Ok(ServiceMode::Echo),
            _ => Err(format!("Unknown service mode: {}", s)),
        }
    }
}

impl std::fmt::Display for ServiceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceMode::Ai => write!(f, "ai"),
            ServiceMode::Echo => write!(f, "echo"),
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "HTTP chat gateway in front of an OpenAI-compatible API")]
pub struct AppConfig {
    /// 当前环境名称（dev, prod ...），prod 环境输出 JSON 日志
    #[arg(long, env = "APP_ENV", default_value = "dev")]
    pub env: String,

    /// 日志级别: debug, info, warn, error
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// 日志格式覆盖: pretty, compact, json
    #[arg(long, env = "LOG_FORMAT")]
    pub log_format: Option<String>,

    // LLM 配置
    #[arg(long, env = "AI_BASE_URL", default_value = "https://api.openai.com/v1")]
    pub ai_base_url: String,

    /// 允许为空；为空时服务照常启动，调用会失败并返回降级回复
    #[arg(long, env = "AI_API_KEY", default_value = "")]
    pub ai_api_key: String,

    #[arg(long, env = "AI_MODEL", default_value = "gpt-3.5-turbo")]
    pub ai_model: String,

    // 存储配置
    /// SQLite 数据库路径，`:memory:` 表示内存数据库
    #[arg(long, env = "DB_PATH", default_value = "./data/chat_history.db")]
    pub db_path: String,

    /// HTTP 监听地址
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8080")]
    pub bind_addr: String,

    /// 服务模式: ai, echo
    #[arg(long, env = "SERVICE_MODE", default_value = "ai")]
    pub service_mode: ServiceMode,
}

impl AppConfig {
    /// 验证配置的有效性
    ///
    /// 空的 API Key 不算错误。
    pub fn validate(&self) -> Result<()> {
        if self.ai_model.trim().is_empty() {
            return Err(ChatbotError::ConfigError("AI_MODEL must not be empty".into()));
        }
        if self.bind_addr.trim().is_empty() {
            return Err(ChatbotError::ConfigError("BIND_ADDR must not be empty".into()));
        }
        if self.db_path.trim().is_empty() {
            return Err(ChatbotError::ConfigError("DB_PATH must not be empty".into()));
        }
        Ok(())
    }
}

/// 当前环境标识，默认为 "dev"
pub fn current_env() -> String {
    std::env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string())
}

/// 环境对应的配置文件名，例如 `.env.dev`
pub fn env_file_name(env: &str) -> String {
    format!(".env.{}", env)
}

/// 加载 `.env.<env>` 文件，返回是否找到
///
/// 文件不存在不算错误：容器环境通常直接注入系统环境变量。
/// 已存在的环境变量不会被覆盖。此时日志尚未初始化，由调用方记录结果。
pub fn load_env_file(env: &str) -> bool {
    dotenv::from_filename(env_file_name(env)).is_ok()
}
