//! HTTP surface: `POST /api/chat` and `GET /health`.

use std::sync::Arc;

use axum::extract::State;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use color_eyre::eyre::{Result, WrapErr};
use huddle_core::Responder;
use huddle_shared::{ChatRequest, ChatResponse};
use serde_json::{Value, json};
use tracing::{Instrument, info, info_span};
use uuid::Uuid;

/// Build the application router around a shared responder.
pub(crate) fn router(responder: Arc<Responder>) -> Router {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/health", get(health))
        .with_state(responder)
}

/// Bind `addr` and serve until Ctrl-C.
pub(crate) async fn serve(addr: &str, responder: Arc<Responder>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .wrap_err_with(|| format!("failed to bind {addr}"))?;
    info!(%addr, "server listening");

    axum::serve(listener, router(responder))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .wrap_err("server error")?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler available; run until the process is killed.
        std::future::pending::<()>().await;
    }
}

async fn chat(
    State(responder): State<Arc<Responder>>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let span = info_span!("chat_request", request_id = %Uuid::now_v7());
    let reply = responder.respond_to(&request).instrument(span).await;
    Json(ChatResponse::from(reply))
}

async fn health(State(responder): State<Arc<Responder>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "policy": responder.policy().as_str(),
        "rules": responder.knowledge().rules.len(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use huddle_core::{FixedPicker, Knowledge};
    use huddle_search::DisabledSearch;

    async fn spawn_server() -> String {
        let knowledge = Arc::new(Knowledge::builtin().unwrap());
        let responder = Responder::new(knowledge, Arc::new(DisabledSearch))
            .with_picker(Arc::new(FixedPicker(0)));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(Arc::new(responder))).await.unwrap();
        });
        format!("http://{addr}")
    }

    async fn post_chat(base: &str, body: Value) -> Value {
        let resp = reqwest::Client::new()
            .post(format!("{base}/api/chat"))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        resp.json().await.unwrap()
    }

    #[tokio::test]
    async fn chat_answers_quick_rule() {
        let base = spawn_server().await;
        let body = post_chat(&base, json!({ "message": "¿qué es un touchdown?" })).await;
        let reply = body["reply"].as_str().unwrap();
        assert!(reply.starts_with("En la NFL se pueden anotar puntos"));
    }

    #[tokio::test]
    async fn chat_without_message_gets_empty_prompt_reply() {
        let base = spawn_server().await;
        let knowledge = Knowledge::builtin().unwrap();

        let body = post_chat(&base, json!({})).await;
        assert_eq!(body["reply"], knowledge.replies.empty_prompt.as_str());

        let body = post_chat(&base, json!({ "message": "   ", "history": [] })).await;
        assert_eq!(body["reply"], knowledge.replies.empty_prompt.as_str());
    }

    #[tokio::test]
    async fn chat_screens_abuse_and_accepts_history() {
        let base = spawn_server().await;
        let knowledge = Knowledge::builtin().unwrap();
        let body = post_chat(
            &base,
            json!({
                "message": "eres un tonto",
                "history": [{ "role": "user", "content": "hola" }]
            }),
        )
        .await;
        assert_eq!(body["reply"], knowledge.replies.safety.as_str());
    }

    #[tokio::test]
    async fn chat_with_null_history_still_replies() {
        let base = spawn_server().await;
        let knowledge = Knowledge::builtin().unwrap();

        let body = post_chat(&base, json!({ "message": "hola", "history": null })).await;
        assert_eq!(body["reply"], knowledge.replies.greeting[0].as_str());

        let body = post_chat(
            &base,
            json!({ "message": "hola", "history": [{ "role": "user", "content": null }] }),
        )
        .await;
        assert_eq!(body["reply"], knowledge.replies.greeting[0].as_str());
    }

    #[tokio::test]
    async fn chat_refuses_off_domain() {
        let base = spawn_server().await;
        let knowledge = Knowledge::builtin().unwrap();
        let body = post_chat(&base, json!({ "message": "receta de paella" })).await;
        assert_eq!(body["reply"], knowledge.replies.domain_refusal.as_str());
    }

    #[tokio::test]
    async fn malformed_body_is_rejected() {
        let base = spawn_server().await;
        let resp = reqwest::Client::new()
            .post(format!("{base}/api/chat"))
            .header("content-type", "application/json")
            .body("{not json")
            .send()
            .await
            .unwrap();
        assert!(resp.status().is_client_error());
    }

    #[tokio::test]
    async fn health_reports_rules_and_policy() {
        let base = spawn_server().await;
        let body: Value = reqwest::get(format!("{base}/health"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["policy"], "refuse");
        assert_eq!(body["rules"], 10);
    }
}
