// Copyright 2025 norns-tools developers
// SPDX-License-Identifier: Apache-2.0

//! WebSocket REPL client
//!
//! Connects to matron's WebSocket endpoint with the required sub-protocol
//! advertised, then pumps every inbound frame into an event channel. The
//! caller consumes events; the reader task is the only spawned task.

use crate::config::ClientConfig;
use crate::error::{TransportError, TransportResult};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::error::ProtocolError;
use tokio_tungstenite::tungstenite::http::header::SEC_WEBSOCKET_PROTOCOL;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type WsStream = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Event delivered by the reader task
#[derive(Debug)]
pub enum ReplEvent {
    /// Text payload of one inbound frame (binary frames are decoded lossily)
    Text(String),

    /// The peer closed the connection
    Closed,

    /// Transport failure while receiving
    Error(TransportError),
}

/// WebSocket REPL socket implementation (line-oriented client)
pub struct WsRepl {
    sink: Option<WsSink>,
    events: mpsc::UnboundedReceiver<ReplEvent>,
    reader: Option<JoinHandle<()>>,
}

impl WsRepl {
    /// Connect to the configured address, advertising the sub-protocol
    pub async fn connect(config: &ClientConfig) -> TransportResult<Self> {
        config.validate().map_err(TransportError::InvalidConfig)?;

        let url = config.url();
        let mut request = url
            .clone()
            .into_client_request()
            .map_err(|e| TransportError::ConnectFailed(e.to_string()))?;

        if let Some(proto) = &config.subprotocol {
            let value = HeaderValue::from_str(proto)
                .map_err(|e| TransportError::InvalidConfig(e.to_string()))?;
            request.headers_mut().insert(SEC_WEBSOCKET_PROTOCOL, value);
        }

        let (ws_stream, response) = connect_async(request)
            .await
            .map_err(|e| TransportError::ConnectFailed(e.to_string()))?;

        info!("[WS-REPL] Connected to {}", url);

        if let Some(expected) = &config.subprotocol {
            let negotiated = response
                .headers()
                .get(SEC_WEBSOCKET_PROTOCOL)
                .and_then(|v| v.to_str().ok());
            if negotiated != Some(expected.as_str()) {
                warn!("[WS-REPL] Server did not confirm sub-protocol {}", expected);
            }
        }

        let (sink, stream) = ws_stream.split();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let max_message_size = config.max_message_size;

        let reader = tokio::spawn(async move {
            pump_events(stream, event_tx, max_message_size).await;
        });

        Ok(Self {
            sink: Some(sink),
            events: event_rx,
            reader: Some(reader),
        })
    }

    /// Send one line, appending the newline terminator
    pub async fn send_line(&mut self, line: &str) -> TransportResult<()> {
        let sink = self.sink.as_mut().ok_or(TransportError::NotRunning)?;

        sink.send(Message::Text(format!("{}\n", line)))
            .await
            .map_err(|e| match e {
                WsError::ConnectionClosed | WsError::AlreadyClosed => {
                    TransportError::ConnectionClosed
                }
                e => TransportError::SendFailed(e.to_string()),
            })?;

        debug!("[WS-REPL] Sent line: {}", line);
        Ok(())
    }

    /// Await the next transport event
    ///
    /// Returns `None` once the connection has closed and every buffered
    /// event has been drained.
    pub async fn next_event(&mut self) -> Option<ReplEvent> {
        self.events.recv().await
    }

    /// Await the next event, failing after `timeout_ms`
    pub async fn next_event_timeout(&mut self, timeout_ms: u64) -> TransportResult<ReplEvent> {
        let timeout = std::time::Duration::from_millis(timeout_ms);

        match tokio::time::timeout(timeout, self.events.recv()).await {
            Ok(Some(event)) => Ok(event),
            Ok(None) => Err(TransportError::ConnectionClosed),
            Err(_) => Err(TransportError::Timeout),
        }
    }

    /// Close the connection with a close frame
    pub async fn close(&mut self) -> TransportResult<()> {
        let mut sink = self.sink.take().ok_or(TransportError::NotRunning)?;

        if let Err(e) = sink.send(Message::Close(None)).await {
            match e {
                // Already gone; closing an absent connection is not a failure
                WsError::ConnectionClosed | WsError::AlreadyClosed => {}
                e => return Err(TransportError::SendFailed(e.to_string())),
            }
        }

        debug!("[WS-REPL] Close frame sent");
        Ok(())
    }

    /// Check if the write half is still open
    pub fn is_running(&self) -> bool {
        self.sink.is_some()
    }
}

impl Drop for WsRepl {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}

/// Forward inbound frames to the event channel until the stream ends
async fn pump_events(
    mut stream: WsStream,
    events: mpsc::UnboundedSender<ReplEvent>,
    max_message_size: Option<usize>,
) {
    while let Some(item) = stream.next().await {
        match item {
            Ok(Message::Close(_)) => {
                let _ = events.send(ReplEvent::Closed);
                return;
            }
            Ok(msg) => {
                // Ping/pong and fragmentation are handled inside tungstenite
                if let Some((size, text)) = frame_text(msg) {
                    if let Some(max_size) = max_message_size {
                        if size > max_size {
                            let _ = events.send(ReplEvent::Error(
                                TransportError::MessageTooLarge { size, max_size },
                            ));
                            return;
                        }
                    }

                    debug!("[WS-REPL] Received: {}", text.trim_end());
                    if events.send(ReplEvent::Text(text)).is_err() {
                        return;
                    }
                }
            }
            Err(e) if is_close_error(&e) => {
                let _ = events.send(ReplEvent::Closed);
                return;
            }
            Err(e) => {
                let _ = events.send(ReplEvent::Error(TransportError::ReceiveFailed(
                    e.to_string(),
                )));
                return;
            }
        }
    }

    let _ = events.send(ReplEvent::Closed);
}

/// Extract the text payload of a data frame
fn frame_text(msg: Message) -> Option<(usize, String)> {
    match msg {
        Message::Text(text) => Some((text.len(), text)),
        Message::Binary(data) => Some((data.len(), String::from_utf8_lossy(&data).into_owned())),
        _ => None,
    }
}

/// Receive errors that mean the peer is gone rather than misbehaving
fn is_close_error(err: &WsError) -> bool {
    matches!(
        err,
        WsError::ConnectionClosed
            | WsError::AlreadyClosed
            | WsError::Protocol(ProtocolError::ResetWithoutClosingHandshake)
    )
}
