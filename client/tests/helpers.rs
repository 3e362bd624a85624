//! Test helper utilities for client integration tests

#![allow(dead_code)]

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use reqwest::cookie::Jar;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

use client::services::build_http_client;
use client::{ClientConfig, HttpTokenRefresher, LoginRedirector, RealApiClient, RefreshCoordinator};

/// Configuration pointing at a mock HTTP server
pub fn create_test_config(api_url: &str) -> ClientConfig {
    ClientConfig::default()
        .with_api_url(api_url)
        .unwrap()
        .with_login_url("http://localhost:3000/login")
        .unwrap()
}

/// Real API client wired to its own jar, coordinator and recording navigator
pub fn create_api_client(config: &ClientConfig) -> (RealApiClient, Arc<LoginRedirector>, Arc<Jar>) {
    let jar = Arc::new(Jar::default());
    let http = build_http_client(config, jar.clone()).unwrap();
    let navigator = Arc::new(LoginRedirector::new(config.login_url.clone()));
    let refresher = Arc::new(HttpTokenRefresher::new(http.clone(), &config.api_url).unwrap());
    let coordinator = Arc::new(RefreshCoordinator::new(refresher, navigator.clone()));
    let api = RealApiClient::new(http, config, coordinator, navigator.clone());
    (api, navigator, jar)
}

/// One-connection WebSocket server on a random local port
pub struct TestEventServer {
    pub url: String,
    listener: TcpListener,
}

impl TestEventServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}/ws", listener.local_addr().unwrap());
        Self { url, listener }
    }

    /// Accept one connection, reporting the handshake's Cookie header
    pub async fn accept(&self) -> (WebSocketStream<TcpStream>, Option<String>) {
        let (stream, _) = self.listener.accept().await.unwrap();
        let (cookie_tx, cookie_rx) = oneshot::channel();
        let capture = |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
            let cookie = request
                .headers()
                .get("cookie")
                .and_then(|value| value.to_str().ok())
                .map(str::to_string);
            let _ = cookie_tx.send(cookie);
            Ok(response)
        };
        let socket = tokio_tungstenite::accept_hdr_async(stream, capture).await.unwrap();
        (socket, cookie_rx.await.unwrap())
    }
}

/// Send one `{"event", "data"}` text frame
pub async fn send_frame(socket: &mut WebSocketStream<TcpStream>, event: &str, data: serde_json::Value) {
    let frame = serde_json::json!({ "event": event, "data": data });
    socket.send(Message::Text(frame.to_string())).await.unwrap();
}

/// Next text frame sent by the client, parsed as JSON
pub async fn next_client_frame(socket: &mut WebSocketStream<TcpStream>) -> serde_json::Value {
    loop {
        match socket.next().await {
            Some(Ok(Message::Text(text))) => return serde_json::from_str(&text).unwrap(),
            Some(Ok(_)) => continue,
            other => panic!("client frame expected, got {other:?}"),
        }
    }
}

/// Helper to wait for async conditions with timeout
pub async fn wait_for_condition<F, Fut>(mut condition: F, timeout_ms: u64) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let start = std::time::Instant::now();
    let timeout = std::time::Duration::from_millis(timeout_ms);

    loop {
        if condition().await {
            return true;
        }

        if start.elapsed() > timeout {
            return false;
        }

        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
}
