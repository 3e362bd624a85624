//! WebSocket transport for the server event channel
//!
//! Each `connect` opens one socket and splits it into two tasks: the writer
//! drains outbound `ClientEvent`s, the reader parses `{"event", "data"}`
//! frames into `ServerEvent`s. The inbound receiver closes when the socket
//! does.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use reqwest::cookie::{CookieStore, Jar};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{header::COOKIE, HeaderValue};
use tokio_tungstenite::tungstenite::Message;
use tracing::debug;
use url::Url;

use shared::{component_info, component_warn, ClientEvent, ComponentId, ServerEvent};
use crate::error::{ClientError, ClientResult};
use crate::traits::{ChannelConnection, EventChannel};

const CHANNEL_CAPACITY: usize = 100;

pub struct WsEventChannel {
    events_url: Url,
    /// Origin whose cookies authenticate the handshake
    cookie_origin: Url,
    jar: Arc<Jar>,
}

impl WsEventChannel {
    pub fn new(events_url: Url, cookie_origin: Url, jar: Arc<Jar>) -> Self {
        Self {
            events_url,
            cookie_origin,
            jar,
        }
    }

    fn cookie_header(&self) -> ClientResult<Option<HeaderValue>> {
        // reqwest and tungstenite depend on different `http` majors; go through &str
        let Some(cookies) = self.jar.cookies(&self.cookie_origin) else {
            return Ok(None);
        };
        let value = cookies
            .to_str()
            .map_err(|e| ClientError::channel(format!("Session cookie is not valid text: {e}")))?;
        HeaderValue::from_str(value)
            .map(Some)
            .map_err(|e| ClientError::channel(format!("Session cookie rejected: {e}")))
    }
}

#[async_trait]
impl EventChannel for WsEventChannel {
    async fn connect(&self) -> ClientResult<ChannelConnection> {
        let mut request = self.events_url.as_str().into_client_request()?;
        if let Some(cookie) = self.cookie_header()? {
            request.headers_mut().insert(COOKIE, cookie);
        }

        let (socket, _) = connect_async(request).await?;
        component_info!(ComponentId::Events, "🔗 Event channel connected to {}", self.events_url);

        let (mut sender, mut receiver) = socket.split();
        let (out_tx, mut out_rx) = mpsc::channel::<ClientEvent>(CHANNEL_CAPACITY);
        let (in_tx, in_rx) = mpsc::channel::<ServerEvent>(CHANNEL_CAPACITY);

        tokio::spawn(async move {
            while let Some(event) = out_rx.recv().await {
                let frame = match serde_json::to_string(&event) {
                    Ok(frame) => frame,
                    Err(e) => {
                        component_warn!(ComponentId::Events, "Failed to serialize {:?}: {}", event, e);
                        continue;
                    }
                };
                if let Err(e) = sender.send(Message::Text(frame)).await {
                    debug!("Event channel writer stopped: {}", e);
                    break;
                }
            }
            let _ = sender.close().await;
        });

        tokio::spawn(async move {
            loop {
                let frame = tokio::select! {
                    frame = receiver.next() => frame,
                    _ = in_tx.closed() => break,
                };
                let message = match frame {
                    Some(Ok(message)) => message,
                    Some(Err(e)) => {
                        component_warn!(ComponentId::Events, "⚠️ Event channel error: {}", e);
                        break;
                    }
                    None => break,
                };

                match message {
                    Message::Text(text) => match serde_json::from_str::<ServerEvent>(&text) {
                        Ok(event) => {
                            if in_tx.send(event).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            component_warn!(ComponentId::Events, "Skipping unparseable frame: {} ({})", text, e);
                        }
                    },
                    Message::Close(_) => {
                        debug!("Server closed the event channel");
                        break;
                    }
                    Message::Binary(_) => {
                        component_warn!(ComponentId::Events, "Received binary frame - not supported");
                    }
                    Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
                }
            }
            component_info!(ComponentId::Events, "👋 Event channel closed");
        });

        Ok(ChannelConnection {
            outbound: out_tx,
            inbound: in_rx,
        })
    }
}
