use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use chatbot::core::config::{current_env, env_file_name, load_env_file};
use chatbot::logger::{self, LogConfig, LogFormat, Sanitizer};
use chatbot::{
    start_web_server, AppConfig, ChatOrchestrator, ChatService, EchoService, OpenAIClient,
    ServiceMode, SqliteStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. 加载配置
    let env = current_env();
    let env_file_found = load_env_file(&env);
    let cfg = AppConfig::parse();

    setup_logger(&cfg)?;

    if env_file_found {
        info!(file = %env_file_name(&env), "Config loaded from file");
    } else {
        warn!(file = %env_file_name(&env), "Config file not found, relying on system env vars");
    }
    cfg.validate().context("invalid configuration")?;

    // 2. 组装对话服务
    let chat_service = build_chat_service(&cfg).await?;

    // 3. 启动 HTTP 服务
    start_web_server(&cfg.bind_addr, chat_service).await
}

/// prod 环境 JSON 日志，其余环境人类可读；LOG_FORMAT 可覆盖
fn setup_logger(cfg: &AppConfig) -> Result<()> {
    let mut log_config = LogConfig::for_env(&cfg.env, &cfg.log_level);
    if let Some(format) = cfg.log_format.as_deref() {
        let format = format
            .parse::<LogFormat>()
            .map_err(anyhow::Error::msg)
            .context("invalid LOG_FORMAT")?;
        log_config = log_config.with_format(format);
    }
    logger::init(&log_config)?;
    Ok(())
}

async fn build_chat_service(cfg: &AppConfig) -> Result<Arc<dyn ChatService>> {
    if cfg.service_mode == ServiceMode::Echo {
        info!("Running in echo mode");
        return Ok(Arc::new(EchoService::new()));
    }

    info!(path = %cfg.db_path, "Opening chat history database...");
    let store = SqliteStore::new(&cfg.db_path).context("failed to open chat history database")?;
    store.ping().await.context("failed to ping chat history database")?;
    info!("Chat history database ready");

    if cfg.ai_api_key.is_empty() {
        warn!("AI_API_KEY is not set.");
    }
    let client = OpenAIClient::new_with_base_url(cfg.ai_api_key.clone(), cfg.ai_base_url.clone());
    info!(
        base_url = %client.base_url(),
        api_key = %Sanitizer::api_key(&cfg.ai_api_key),
        "AI provider configured"
    );

    let orchestrator =
        ChatOrchestrator::new(cfg.ai_model.clone(), Arc::new(client), Arc::new(store));
    info!(
        model = %orchestrator.model(),
        completion_deadline_secs = orchestrator.completion_deadline().as_secs(),
        save_deadline_secs = orchestrator.save_deadline().as_secs(),
        "Chat orchestrator ready"
    );

    Ok(Arc::new(orchestrator))
}
