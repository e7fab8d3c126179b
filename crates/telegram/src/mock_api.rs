//! Minimal Bot API server for tests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::{
    collections::{HashMap, VecDeque},
    net::SocketAddr,
    sync::{Arc, Mutex},
};

use {
    axum::{Json, Router, body::Bytes, extract::State, http::Uri, routing::post},
    serde_json::{Value, json},
    tokio::{sync::oneshot, task::JoinHandle},
};

#[derive(Clone, Default)]
struct ApiState {
    calls: Arc<Mutex<Vec<(String, Value)>>>,
    failures: Arc<Mutex<HashMap<String, (u16, String)>>>,
    updates: Arc<Mutex<VecDeque<Value>>>,
}

pub(crate) struct MockBotApi {
    state: ApiState,
    addr: SocketAddr,
    shutdown_tx: oneshot::Sender<()>,
    server: JoinHandle<()>,
}

impl MockBotApi {
    pub(crate) async fn start() -> Self {
        let state = ApiState::default();
        let app = Router::new()
            .route("/{*path}", post(handle))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("serve mock telegram api");
        });

        Self {
            state,
            addr,
            shutdown_tx,
            server,
        }
    }

    pub(crate) fn api_url(&self) -> reqwest::Url {
        reqwest::Url::parse(&format!("http://{}/", self.addr)).expect("parse api url")
    }

    pub(crate) fn bot(&self) -> teloxide::Bot {
        teloxide::Bot::new("test-token").set_api_url(self.api_url())
    }

    /// Make every call to `method` fail with the given Bot API error.
    pub(crate) fn fail(&self, method: &str, code: u16, description: &str) {
        self.state
            .failures
            .lock()
            .unwrap()
            .insert(method.to_string(), (code, description.to_string()));
    }

    pub(crate) fn clear_failure(&self, method: &str) {
        self.state.failures.lock().unwrap().remove(method);
    }

    /// Queue an update for the next `getUpdates` call.
    pub(crate) fn push_update(&self, update: Value) {
        self.state.updates.lock().unwrap().push_back(update);
    }

    /// Request bodies received for `method`, in order.
    pub(crate) fn calls(&self, method: &str) -> Vec<Value> {
        self.state
            .calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, _)| m == method)
            .map(|(_, body)| body.clone())
            .collect()
    }

    pub(crate) async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        self.server.await.expect("server join");
    }
}

fn message(id: i64, chat_id: &Value) -> Value {
    json!({
        "message_id": id,
        "date": 0,
        "chat": { "id": chat_id, "type": "private" },
        "text": "ok"
    })
}

async fn handle(State(state): State<ApiState>, uri: Uri, body: Bytes) -> Json<Value> {
    let method = uri.path().rsplit('/').next().unwrap_or_default().to_string();
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    state
        .calls
        .lock()
        .unwrap()
        .push((method.clone(), body.clone()));

    if let Some((code, description)) = state.failures.lock().unwrap().get(&method).cloned() {
        return Json(json!({ "ok": false, "error_code": code, "description": description }));
    }

    let result = match method.as_str() {
        "GetMe" => json!({
            "id": 9000,
            "is_bot": true,
            "first_name": "Ferry",
            "username": "ferry_bot",
            "can_join_groups": true,
            "can_read_all_group_messages": true,
            "supports_inline_queries": false,
            "can_connect_to_business": false,
            "has_main_web_app": false
        }),
        "GetUpdates" => Value::Array(state.updates.lock().unwrap().drain(..).collect()),
        "CopyMessage" => json!({ "message_id": 77 }),
        "ForwardMessage" | "SendMessage" => message(1, &body["chat_id"]),
        _ => json!(true),
    };
    Json(json!({ "ok": true, "result": result }))
}
