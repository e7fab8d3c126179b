//! Liveness endpoint for hosting platforms that expect an open port.
//!
//! Independent of the relay: it answers as long as the process is up, even
//! while the supervisor is between sessions.

use std::net::SocketAddr;

use {
    axum::{Json, Router, extract::State, response::IntoResponse, routing::get},
    tokio_util::sync::CancellationToken,
    tracing::info,
};

const ROOT_BODY: &str = "ferry relay is running";

#[derive(Clone)]
struct HealthState {
    version: &'static str,
}

pub fn router(version: &'static str) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .with_state(HealthState { version })
}

async fn root_handler() -> &'static str {
    ROOT_BODY
}

async fn health_handler(State(state): State<HealthState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": state.version,
    }))
}

/// Bind `addr` and serve until `cancel` fires.
pub async fn serve(addr: SocketAddr, cancel: CancellationToken) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "health endpoint listening");
    axum::serve(listener, router(env!("CARGO_PKG_VERSION")))
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await?;
    Ok(())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, tokio::net::TcpListener};

    async fn start_test_server() -> (SocketAddr, CancellationToken) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let cancel = CancellationToken::new();
        let shutdown = cancel.clone();
        tokio::spawn(async move {
            axum::serve(listener, router("9.9.9"))
                .with_graceful_shutdown(async move { shutdown.cancelled().await })
                .await
                .unwrap();
        });
        (addr, cancel)
    }

    #[tokio::test]
    async fn root_returns_static_body() {
        let (addr, cancel) = start_test_server().await;
        let resp = reqwest::get(format!("http://{addr}/")).await.unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.text().await.unwrap(), ROOT_BODY);
        cancel.cancel();
    }

    #[tokio::test]
    async fn health_endpoint_returns_json() {
        let (addr, cancel) = start_test_server().await;
        let resp = reqwest::get(format!("http://{addr}/health")).await.unwrap();
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], "9.9.9");
        cancel.cancel();
    }

    #[tokio::test]
    async fn serve_stops_on_cancel() {
        let cancel = CancellationToken::new();
        let task = tokio::spawn(serve("127.0.0.1:0".parse().unwrap(), cancel.clone()));
        cancel.cancel();
        task.await.unwrap().unwrap();
    }
}
