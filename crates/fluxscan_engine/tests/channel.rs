use std::time::Duration;

use fluxscan_engine::{
    ChannelHandle, ChannelSettings, PushEvent, ScanComplete, ScanProgress, ScanSubscriber,
    ServerEvent,
};
use futures_util::{SinkExt, StreamExt};
use pretty_assertions::assert_eq;
use reqwest::Url;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

const OPEN: &str = r#"0{"sid":"s1","upgrades":[],"pingInterval":25000,"pingTimeout":20000}"#;

async fn next_text(ws: &mut WebSocketStream<TcpStream>) -> Option<String> {
    while let Some(Ok(message)) = ws.next().await {
        if message.is_close() {
            return None;
        }
        if message.is_text() {
            return Some(message.to_text().unwrap().to_owned());
        }
    }
    None
}

async fn accept(listener: &TcpListener) -> WebSocketStream<TcpStream> {
    let (tcp, _) = listener.accept().await.unwrap();
    tokio_tungstenite::accept_async(tcp).await.unwrap()
}

/// Runs the open / namespace-connect handshake from the server side.
async fn handshake(ws: &mut WebSocketStream<TcpStream>) -> String {
    ws.send(Message::text(OPEN)).await.unwrap();
    let connect = next_text(ws).await.expect("namespace connect");
    ws.send(Message::text(r#"40{"sid":"n1"}"#)).await.unwrap();
    connect
}

async fn next_event(rx: &mut mpsc::UnboundedReceiver<PushEvent>) -> PushEvent {
    timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("event in time")
        .expect("channel open")
}

fn settings_for(listener: &TcpListener) -> ChannelSettings {
    let addr = listener.local_addr().unwrap();
    let mut settings = ChannelSettings::new(Url::parse(&format!("http://{addr}")).unwrap());
    settings.reconnect_delay = Duration::from_millis(20);
    settings.max_reconnect_delay = Duration::from_millis(40);
    settings
}

#[tokio::test]
async fn channel_delivers_typed_events_and_flushes_queued_subscribe() {
    fluxscan_logging::initialize_for_tests();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let settings = settings_for(&listener);

    let server = tokio::spawn(async move {
        let mut ws = accept(&listener).await;
        let mut received = vec![handshake(&mut ws).await];
        ws.send(Message::text(
            r#"42["connected",{"data":"Connected to FluxScan WebSocket"}]"#,
        ))
        .await
        .unwrap();
        received.push(next_text(&mut ws).await.expect("subscribe"));
        ws.send(Message::text("2")).await.unwrap();
        received.push(next_text(&mut ws).await.expect("pong"));
        ws.send(Message::text(
            r#"42["scan_progress",{"scan_id":"S1","progress":42,"symbol":"TCS"}]"#,
        ))
        .await
        .unwrap();
        ws.send(Message::text(r#"42["price_tick",{"symbol":"TCS"}]"#))
            .await
            .unwrap();
        ws.send(Message::text(
            r#"42["scan_complete",{"scan_id":"S1","status":"completed","total_scanned":50,"signals_found":7}]"#,
        ))
        .await
        .unwrap();
        while let Some(frame) = next_text(&mut ws).await {
            received.push(frame);
        }
        received
    });

    let (tx, mut rx) = mpsc::unbounded_channel();
    let handle = ChannelHandle::spawn(settings, tx);
    handle.subscribe("S1");

    assert_eq!(next_event(&mut rx).await, PushEvent::Connected);
    assert_eq!(
        next_event(&mut rx).await,
        PushEvent::Server(ServerEvent::Connected {
            data: "Connected to FluxScan WebSocket".to_string(),
        })
    );
    assert_eq!(
        next_event(&mut rx).await,
        PushEvent::Server(ServerEvent::ScanProgress(ScanProgress {
            scan_id: "S1".to_string(),
            progress: 42,
            symbol: "TCS".to_string(),
        }))
    );
    assert_eq!(
        next_event(&mut rx).await,
        PushEvent::Server(ServerEvent::ScanComplete(ScanComplete {
            scan_id: "S1".to_string(),
            status: "completed".to_string(),
            signals_found: 7,
            total_scanned: Some(50),
        }))
    );

    handle.shutdown().await;
    assert_eq!(next_event(&mut rx).await, PushEvent::Disconnected);

    let frames = timeout(Duration::from_secs(5), server)
        .await
        .expect("server finished")
        .unwrap();
    assert_eq!(
        frames,
        vec![
            "40".to_string(),
            r#"42["subscribe_scan",{"scan_id":"S1"}]"#.to_string(),
            "3".to_string(),
            "41".to_string(),
        ]
    );
}

#[tokio::test]
async fn channel_reconnects_after_server_drops() {
    fluxscan_logging::initialize_for_tests();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let settings = settings_for(&listener);

    let server = tokio::spawn(async move {
        let mut first = accept(&listener).await;
        handshake(&mut first).await;
        first.close(None).await.unwrap();
        drop(first);

        let mut second = accept(&listener).await;
        handshake(&mut second).await;
        second
            .send(Message::text(
                r#"42["scan_progress",{"scan_id":7,"progress":10,"symbol":"ITC"}]"#,
            ))
            .await
            .unwrap();
        while next_text(&mut second).await.is_some() {}
    });

    let (tx, mut rx) = mpsc::unbounded_channel();
    let handle = ChannelHandle::spawn(settings, tx);

    assert_eq!(next_event(&mut rx).await, PushEvent::Connected);
    assert_eq!(next_event(&mut rx).await, PushEvent::Disconnected);
    assert_eq!(next_event(&mut rx).await, PushEvent::Connected);
    assert_eq!(
        next_event(&mut rx).await,
        PushEvent::Server(ServerEvent::ScanProgress(ScanProgress {
            scan_id: "7".to_string(),
            progress: 10,
            symbol: "ITC".to_string(),
        }))
    );

    handle.shutdown().await;
    let _ = timeout(Duration::from_secs(5), server).await;
}
