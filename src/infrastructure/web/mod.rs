//! Web 服务器模块
//!
//! 提供 HTTP API：把请求体转换成消息交给对话服务，再把回复包装成响应

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{debug, error, info, Instrument};

use crate::application::chat::ChatService;
use crate::errors::{ChatbotError, Result};
use crate::infrastructure::logger::RequestContext;

/// 单个请求的处理上限，需大于补全截止时间
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(100);

// ==================== 错误响应 ====================

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// ==================== 状态 ====================

#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<dyn ChatService>,
}

impl AppState {
    pub fn new(chat_service: Arc<dyn ChatService>) -> Self {
        Self { chat_service }
    }
}

// ==================== 请求/响应类型 ====================

/// 客户端发送过来的 JSON
///
/// 缺少 `message` 字段时按空字符串处理。
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
}

/// 解码请求体
///
/// 只接受 JSON 对象；数组、字符串、数字和 null 都视为无效请求。
pub fn decode_chat_request(body: &[u8]) -> Result<ChatRequest> {
    let value: serde_json::Value = serde_json::from_slice(body)?;
    if !value.is_object() {
        return Err(ChatbotError::ValidationError(
            "request body must be a JSON object".to_string(),
        ));
    }
    Ok(serde_json::from_value(value)?)
}

/// 返回给客户端的 JSON
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

// ==================== 处理器 ====================

/// 健康检查
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// 对话
///
/// 请求体不看 Content-Type，直接按 JSON 解码。
/// 任何可解析的请求都返回 200，降级回复也一样。
async fn chat(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let ctx = RequestContext::new();
    let span = crate::request_span!(ctx);

    async move {
        debug!(body_len = body.len(), "Received raw request");

        let req = match decode_chat_request(&body) {
            Ok(req) => req,
            Err(e) => {
                error!(error = %e, "Failed to decode request");
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse {
                        error: "Invalid request body".to_string(),
                    }),
                )
                    .into_response();
            }
        };

        let response = state.chat_service.respond(&req.message).await;

        debug!(elapsed_ms = ctx.elapsed().as_millis() as u64, "Request completed");

        (StatusCode::OK, Json(ChatResponse { response })).into_response()
    }
    .instrument(span)
    .await
}

// ==================== 路由 ====================

/// `/chat` 只注册了 POST，其他方法由 axum 返回 405
pub fn create_router(state: Arc<AppState>) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(CorsLayer::permissive());

    Router::new()
        .route("/health", get(health_check))
        .route("/chat", post(chat))
        .layer(middleware)
        .with_state(state)
}

// ==================== 服务器启动 ====================

pub async fn start_web_server(
    bind_addr: &str,
    chat_service: Arc<dyn ChatService>,
) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new(chat_service));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!(addr = %bind_addr, "Starting HTTP server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped");
    Ok(())
}

/// 等待 Ctrl-C
///
/// 未完成的后台保存任务会随进程退出而丢失。
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            error!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}
