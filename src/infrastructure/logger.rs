//! 日志模块 - 提供结构化日志和请求追踪
//!
//! 特性：
//! - 支持人类可读、紧凑和 JSON 三种格式
//! - prod 环境默认 JSON，其余环境默认人类可读
//! - 请求追踪 ID，贯穿单次请求（包括后台保存任务）
//! - API Key 脱敏
//!
//! 日志只作为观测输出，业务逻辑不读取任何日志状态。

use std::time::Instant;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use crate::errors::{ChatbotError, Result};

/// 日志格式类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// 人类可读格式（带颜色）
    Pretty,
    /// 紧凑单行格式
    Compact,
    /// JSON 结构化格式（适合日志收集系统）
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("unknown log format: {}", s)),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// 默认过滤级别，`RUST_LOG` 存在时以其为准
    pub level: String,
    /// 日志格式
    pub format: LogFormat,
    /// 是否显示目标模块
    pub show_target: bool,
    /// 是否显示文件名和行号
    pub show_file: bool,
    /// 是否启用颜色（JSON 格式无效）
    pub enable_color: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            show_target: true,
            show_file: false,
            enable_color: true,
        }
    }
}

impl LogConfig {
    /// 按运行环境和级别生成配置
    ///
    /// 未知级别回退为 `info`。
    pub fn for_env(env: &str, level: &str) -> Self {
        let format = if env.eq_ignore_ascii_case("prod") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        };

        Self {
            level: normalize_level(level).to_string(),
            format,
            enable_color: format != LogFormat::Json,
            ..Default::default()
        }
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self.enable_color = format != LogFormat::Json;
        self
    }
}

fn normalize_level(level: &str) -> &'static str {
    match level.to_lowercase().as_str() {
        "debug" => "debug",
        "info" => "info",
        "warn" | "warning" => "warn",
        "error" => "error",
        _ => "info",
    }
}

/// 初始化日志系统
///
/// # 环境变量
/// - `RUST_LOG`: 覆盖配置中的级别（如 `debug`, `warn,chatbot=trace`）
///
/// 全局只能初始化一次，重复调用返回错误。
pub fn init(config: &LogConfig) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    let result = match config.format {
        LogFormat::Pretty => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .pretty()
                .with_target(config.show_target)
                .with_file(config.show_file)
                .with_line_number(config.show_file)
                .with_ansi(config.enable_color);
            subscriber.with(fmt_layer).try_init()
        }
        LogFormat::Compact => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .compact()
                .with_target(config.show_target)
                .with_file(config.show_file)
                .with_line_number(config.show_file)
                .with_ansi(config.enable_color);
            subscriber.with(fmt_layer).try_init()
        }
        LogFormat::Json => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_target(config.show_target)
                .with_file(config.show_file)
                .with_line_number(config.show_file)
                .with_current_span(true)
                .with_span_list(true);
            subscriber.with(fmt_layer).try_init()
        }
    };

    result.map_err(|e| ChatbotError::ConfigError(format!("failed to init logger: {}", e)))
}

/// 请求追踪上下文
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// 请求唯一 ID
    pub request_id: String,
    /// 请求开始时间
    pub start_time: Instant,
}

impl RequestContext {
    /// 创建新的请求上下文
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            start_time: Instant::now(),
        }
    }

    /// 获取已流逝的时间
    pub fn elapsed(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// 创建带有请求 ID 的 span
#[macro_export]
macro_rules! request_span {
    ($ctx:expr) => {
        tracing::info_span!(
            "request",
            request_id = %$ctx.request_id,
        )
    };
}

/// 敏感信息脱敏工具
pub struct Sanitizer;

impl Sanitizer {
    /// 脱敏 API 密钥 - 只保留前 8 位和后 4 位
    pub fn api_key(key: &str) -> String {
        if key.is_empty() {
            return "<empty>".to_string();
        }
        if key.len() <= 16 || !key.is_ascii() {
            return "***".to_string();
        }
        format!("{}...{}", &key[..8], &key[key.len() - 4..])
    }
}
