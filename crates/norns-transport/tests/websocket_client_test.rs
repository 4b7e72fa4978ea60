//! WebSocket client integration tests
//!
//! Drives the real client against in-process tokio-tungstenite servers.

use futures_util::{SinkExt, StreamExt};
use norns_transport::{ClientConfig, ReplEvent, TransportError, WsRepl, REPL_SUBPROTOCOL};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::handshake::server::{Request, Response};
use tokio_tungstenite::tungstenite::http::header::SEC_WEBSOCKET_PROTOCOL;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_hdr_async, WebSocketStream};

async fn bind_local() -> (TcpListener, ClientConfig) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let config = ClientConfig::new(addr.to_string()).with_subprotocol(REPL_SUBPROTOCOL);
    (listener, config)
}

/// Accept one connection, asserting and echoing the REPL sub-protocol
async fn accept_repl(listener: &TcpListener) -> WebSocketStream<TcpStream> {
    let (stream, _) = listener.accept().await.unwrap();

    accept_hdr_async(stream, |req: &Request, mut resp: Response| {
        let proto = req
            .headers()
            .get(SEC_WEBSOCKET_PROTOCOL)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        assert_eq!(proto.as_deref(), Some(REPL_SUBPROTOCOL));

        resp.headers_mut()
            .insert(SEC_WEBSOCKET_PROTOCOL, proto.unwrap().parse().unwrap());
        Ok(resp)
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn test_connect_advertises_subprotocol_and_appends_newline() {
    let (listener, config) = bind_local().await;

    let server = tokio::spawn(async move {
        let mut ws = accept_repl(&listener).await;

        match ws.next().await.unwrap().unwrap() {
            Message::Text(text) => assert_eq!(text, "print(1+1)\n"),
            other => panic!("expected text frame, got {:?}", other),
        }

        ws.send(Message::Text("2".into())).await.unwrap();
        ws.close(None).await.unwrap();
    });

    let mut client = WsRepl::connect(&config).await.unwrap();
    assert!(client.is_running());

    client.send_line("print(1+1)").await.unwrap();

    match client.next_event().await.unwrap() {
        ReplEvent::Text(text) => assert_eq!(text, "2"),
        other => panic!("expected text event, got {:?}", other),
    }
    assert!(matches!(
        client.next_event().await.unwrap(),
        ReplEvent::Closed
    ));

    server.await.unwrap();
}

#[tokio::test]
async fn test_binary_frames_are_decoded_as_text() {
    let (listener, config) = bind_local().await;

    let server = tokio::spawn(async move {
        let mut ws = accept_repl(&listener).await;
        ws.send(Message::Binary(b"running".to_vec())).await.unwrap();
        ws.close(None).await.unwrap();
    });

    let mut client = WsRepl::connect(&config).await.unwrap();

    match client.next_event().await.unwrap() {
        ReplEvent::Text(text) => assert_eq!(text, "running"),
        other => panic!("expected text event, got {:?}", other),
    }

    server.await.unwrap();
}

#[tokio::test]
async fn test_events_preserve_delivery_order() {
    let (listener, config) = bind_local().await;

    let server = tokio::spawn(async move {
        let mut ws = accept_repl(&listener).await;
        for line in ["a", "b", "c"] {
            ws.send(Message::Text(line.into())).await.unwrap();
        }
        ws.close(None).await.unwrap();
    });

    let mut client = WsRepl::connect(&config).await.unwrap();

    let mut received = Vec::new();
    while let Some(event) = client.next_event().await {
        match event {
            ReplEvent::Text(text) => received.push(text),
            ReplEvent::Closed => break,
            ReplEvent::Error(e) => panic!("unexpected error: {}", e),
        }
    }
    assert_eq!(received, vec!["a", "b", "c"]);

    server.await.unwrap();
}

#[tokio::test]
async fn test_connect_refused_fails_immediately() {
    // Bind and drop to get a port nothing listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = ClientConfig::new(addr.to_string()).with_subprotocol(REPL_SUBPROTOCOL);
    match WsRepl::connect(&config).await {
        Err(TransportError::ConnectFailed(_)) => {}
        other => panic!("expected ConnectFailed, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_next_event_timeout_on_silent_server() {
    let (listener, config) = bind_local().await;

    let server = tokio::spawn(async move {
        let mut ws = accept_repl(&listener).await;
        // Stay silent until the client gives up
        let _ = ws.next().await;
    });

    let mut client = WsRepl::connect(&config).await.unwrap();
    match client.next_event_timeout(100).await {
        Err(TransportError::Timeout) => {}
        other => panic!("expected Timeout, got {:?}", other.map(|_| ())),
    }

    drop(client);
    server.await.unwrap();
}

#[tokio::test]
async fn test_send_after_close_is_not_running() {
    let (listener, config) = bind_local().await;

    let server = tokio::spawn(async move {
        let mut ws = accept_repl(&listener).await;
        while let Some(Ok(msg)) = ws.next().await {
            if msg.is_close() {
                break;
            }
        }
    });

    let mut client = WsRepl::connect(&config).await.unwrap();
    client.close().await.unwrap();
    assert!(!client.is_running());

    match client.send_line("late").await {
        Err(TransportError::NotRunning) => {}
        other => panic!("expected NotRunning, got {:?}", other),
    }

    server.await.unwrap();
}

#[tokio::test]
async fn test_oversize_message_is_an_error_event() {
    let (listener, config) = bind_local().await;
    let config = config.with_max_message_size(4);

    let server = tokio::spawn(async move {
        let mut ws = accept_repl(&listener).await;
        ws.send(Message::Text("way too long".into())).await.unwrap();
        let _ = ws.next().await;
    });

    let mut client = WsRepl::connect(&config).await.unwrap();
    match client.next_event().await.unwrap() {
        ReplEvent::Error(TransportError::MessageTooLarge { size, max_size }) => {
            assert_eq!(size, 12);
            assert_eq!(max_size, 4);
        }
        other => panic!("expected MessageTooLarge, got {:?}", other),
    }

    drop(client);
    server.await.unwrap();
}
