use std::collections::VecDeque;
use std::fmt::Display;
use std::sync::Mutex;
use std::time::Duration;

use fluxscan_logging::{flux_debug, flux_error, flux_info, flux_trace, flux_warn};
use futures_util::{Sink, SinkExt, StreamExt};
use reqwest::Url;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::socketio::{self, Frame, SocketPacket, CONNECT_FRAME, DISCONNECT_FRAME};
use crate::{ClientError, ClientEvent, PushEvent, ScanSubscriber, ServerEvent};

#[derive(Debug, Clone)]
pub struct ChannelSettings {
    pub base_url: Url,
    /// First wait after a lost connection; doubles on each failed attempt.
    pub reconnect_delay: Duration,
    pub max_reconnect_delay: Duration,
}

impl ChannelSettings {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            reconnect_delay: Duration::from_millis(1000),
            max_reconnect_delay: Duration::from_millis(5000),
        }
    }
}

/// WebSocket endpoint for a server base URL.
pub fn socket_url(base_url: &Url) -> Result<Url, ClientError> {
    let mut url = base_url
        .join("/socket.io/")
        .map_err(|err| ClientError::InvalidRequest(err.to_string()))?;
    let scheme = match url.scheme() {
        "https" | "wss" => "wss",
        _ => "ws",
    };
    url.set_scheme(scheme)
        .map_err(|_| ClientError::InvalidRequest(format!("cannot use {scheme} for {base_url}")))?;
    url.query_pairs_mut()
        .clear()
        .append_pair("EIO", "4")
        .append_pair("transport", "websocket");
    Ok(url)
}

enum ChannelCommand {
    Emit(ClientEvent),
    Shutdown,
}

enum SessionEnd {
    Shutdown,
    Lost { connected: bool, reason: String },
}

/// Handle to the background push-channel task. Emits made while the
/// connection is down are queued and sent after the next connect.
pub struct ChannelHandle {
    cmd_tx: mpsc::UnboundedSender<ChannelCommand>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ChannelHandle {
    /// Starts the channel task. Must be called from inside a tokio runtime.
    pub fn spawn(settings: ChannelSettings, events: mpsc::UnboundedSender<PushEvent>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_channel(settings, cmd_rx, events));
        Self {
            cmd_tx,
            task: Mutex::new(Some(task)),
        }
    }

    pub fn emit(&self, event: ClientEvent) {
        let _ = self.cmd_tx.send(ChannelCommand::Emit(event));
    }

    /// Closes the connection and waits for the task to finish. Later calls
    /// return immediately.
    pub async fn shutdown(&self) {
        let _ = self.cmd_tx.send(ChannelCommand::Shutdown);
        let task = self.task.lock().ok().and_then(|mut task| task.take());
        if let Some(task) = task {
            let _ = task.await;
        }
    }
}

impl ScanSubscriber for ChannelHandle {
    fn subscribe(&self, scan_id: &str) {
        self.emit(ClientEvent::SubscribeScan {
            scan_id: scan_id.to_string(),
        });
    }
}

async fn run_channel(
    settings: ChannelSettings,
    mut cmd_rx: mpsc::UnboundedReceiver<ChannelCommand>,
    events: mpsc::UnboundedSender<PushEvent>,
) {
    let url = match socket_url(&settings.base_url) {
        Ok(url) => url,
        Err(err) => {
            flux_error!("Push channel disabled: {}", err);
            return;
        }
    };

    let mut outbox = VecDeque::new();
    let mut delay = settings.reconnect_delay;
    loop {
        match run_session(&url, &mut cmd_rx, &events, &mut outbox).await {
            SessionEnd::Shutdown => return,
            SessionEnd::Lost { connected, reason } => {
                flux_warn!("Push channel lost: {}", reason);
                if connected {
                    delay = settings.reconnect_delay;
                }
            }
        }
        if events.is_closed() {
            return;
        }

        flux_debug!("Reconnecting push channel in {:?}", delay);
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                _ = &mut sleep => break,
                cmd = cmd_rx.recv() => match cmd {
                    Some(ChannelCommand::Emit(event)) => outbox.push_back(encode(&event)),
                    Some(ChannelCommand::Shutdown) | None => return,
                },
            }
        }
        delay = (delay * 2).min(settings.max_reconnect_delay);
    }
}

async fn run_session(
    url: &Url,
    cmd_rx: &mut mpsc::UnboundedReceiver<ChannelCommand>,
    events: &mpsc::UnboundedSender<PushEvent>,
    outbox: &mut VecDeque<String>,
) -> SessionEnd {
    let (socket, _) = match connect_async(url.as_str()).await {
        Ok(pair) => pair,
        Err(err) => {
            return SessionEnd::Lost {
                connected: false,
                reason: err.to_string(),
            }
        }
    };
    let (mut sink, mut stream) = socket.split();
    let mut connected = false;

    loop {
        tokio::select! {
            frame = stream.next() => {
                let message = match frame {
                    Some(Ok(message)) => message,
                    Some(Err(err)) => return lost(events, connected, err.to_string()),
                    None => return lost(events, connected, "connection closed".to_string()),
                };
                if message.is_close() {
                    return lost(events, connected, "server closed the connection".to_string());
                }
                if !message.is_text() {
                    continue;
                }
                let text = match message.to_text() {
                    Ok(text) => text,
                    Err(err) => {
                        flux_warn!("Unreadable push frame: {}", err);
                        continue;
                    }
                };
                match socketio::decode_frame(text) {
                    Ok(Frame::Open(info)) => {
                        flux_debug!("Engine session {} opened", info.sid);
                        if let Err(err) = send_text(&mut sink, CONNECT_FRAME.to_string()).await {
                            return lost(events, connected, err.to_string());
                        }
                    }
                    Ok(Frame::Ping(payload)) => {
                        if let Err(err) = send_text(&mut sink, socketio::pong(&payload)).await {
                            return lost(events, connected, err.to_string());
                        }
                    }
                    Ok(Frame::Message(SocketPacket::Connect)) => {
                        connected = true;
                        flux_info!("Connected to push channel at {}", url);
                        let _ = events.send(PushEvent::Connected);
                        while let Some(frame) = outbox.pop_front() {
                            if let Err(err) = send_text(&mut sink, frame.clone()).await {
                                outbox.push_front(frame);
                                return lost(events, connected, err.to_string());
                            }
                        }
                    }
                    Ok(Frame::Message(SocketPacket::Event { name, data })) => {
                        match ServerEvent::from_parts(&name, data) {
                            Ok(event) => {
                                flux_trace!("Push event {:?}", event);
                                let _ = events.send(PushEvent::Server(event));
                            }
                            Err(err) => flux_debug!("Ignoring push event {}: {}", name, err),
                        }
                    }
                    Ok(Frame::Message(SocketPacket::ConnectError(reason))) => {
                        return lost(events, connected, format!("connect refused: {reason}"));
                    }
                    Ok(Frame::Message(SocketPacket::Disconnect)) | Ok(Frame::Close) => {
                        return lost(events, connected, "server ended the session".to_string());
                    }
                    Ok(_) => {}
                    Err(err) => flux_warn!("Dropping push frame: {}", err),
                }
            }
            cmd = cmd_rx.recv() => match cmd {
                Some(ChannelCommand::Emit(event)) => {
                    let frame = encode(&event);
                    if !connected {
                        outbox.push_back(frame);
                        continue;
                    }
                    if let Err(err) = send_text(&mut sink, frame.clone()).await {
                        outbox.push_back(frame);
                        return lost(events, connected, err.to_string());
                    }
                }
                Some(ChannelCommand::Shutdown) | None => {
                    let _ = send_text(&mut sink, DISCONNECT_FRAME.to_string()).await;
                    let _ = sink.close().await;
                    if connected {
                        flux_info!("Disconnected from push channel");
                        let _ = events.send(PushEvent::Disconnected);
                    }
                    return SessionEnd::Shutdown;
                }
            },
        }
    }
}

fn lost(events: &mpsc::UnboundedSender<PushEvent>, connected: bool, reason: String) -> SessionEnd {
    if connected {
        flux_info!("Disconnected from push channel");
        let _ = events.send(PushEvent::Disconnected);
    }
    SessionEnd::Lost { connected, reason }
}

fn encode(event: &ClientEvent) -> String {
    socketio::encode_event(event.name(), &event.payload())
}

async fn send_text<S>(sink: &mut S, text: String) -> Result<(), ClientError>
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    sink.send(Message::text(text))
        .await
        .map_err(|err| ClientError::Channel(err.to_string()))
}
