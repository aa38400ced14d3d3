//! Mock resource server for testing the live host.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

#[derive(Default)]
struct ServerState {
    resources: HashMap<String, String>,
    beer_status: Option<u16>,
    beer_orders: Vec<Value>,
}

type Shared = Arc<Mutex<ServerState>>;

/// Serves `GET /resources/{id}` and `POST /orders/beer`.
pub struct MockServer {
    pub addr: SocketAddr,
    state: Shared,
    handle: tokio::task::JoinHandle<()>,
}

impl MockServer {
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(ServerState::default()));
        let app = Router::new()
            .route("/resources/{id}", get(resource))
            .route("/orders/beer", post(order_beer))
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub async fn add_resource(&self, id: &str, body: &str) {
        self.state
            .lock()
            .await
            .resources
            .insert(id.to_string(), body.to_string());
    }

    pub async fn set_beer_status(&self, status: u16) {
        self.state.lock().await.beer_status = Some(status);
    }

    pub async fn beer_orders(&self) -> Vec<Value> {
        self.state.lock().await.beer_orders.clone()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn resource(
    State(state): State<Shared>,
    Path(id): Path<String>,
) -> Result<String, (StatusCode, String)> {
    state
        .lock()
        .await
        .resources
        .get(&id)
        .cloned()
        .ok_or((StatusCode::NOT_FOUND, format!("no package at {}", id)))
}

async fn order_beer(State(state): State<Shared>, Json(body): Json<Value>) -> StatusCode {
    let mut state = state.lock().await;
    if let Some(status) = state.beer_status {
        return StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    }
    state.beer_orders.push(body);
    StatusCode::CREATED
}
