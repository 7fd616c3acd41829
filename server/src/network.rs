//! Server network layer handling WebSocket sessions and the engine loop
//!
//! Connection tasks never touch grid state. They forward decoded frames to
//! the server loop over one channel, and the loop, which owns the engine,
//! handles them strictly one at a time.

use crate::config::Config;
use crate::engine::Engine;
use crate::gateway::ChannelGateway;
use crate::origin::OriginPolicy;
use crate::registry::{Session, SessionId};
use crate::utils::timestamp_ms;
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use shared::{ClientEventKind, InboundFrame, ServerEvent, SubmitRequest};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::{header::ORIGIN, StatusCode};
use tokio_tungstenite::tungstenite::Message;

const HEALTH_REQUEST_PREFIX: &[u8] = b"GET /health";
/// Time a new connection gets to send its request line and finish the handshake
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);
const HEALTH_BODY: &str = r#"{"status":"ok"}"#;
const MAX_PROBE_HEAD: usize = 4096;
const PEEK_ATTEMPTS: usize = 20;

/// Messages sent from connection tasks to the server loop
#[derive(Debug)]
pub enum ServerMessage {
    SessionOpened {
        session: Session,
        outbox: mpsc::UnboundedSender<ServerEvent>,
    },
    Submit {
        session: SessionId,
        ack: Option<u64>,
        request: SubmitRequest,
    },
    SessionClosed {
        session: SessionId,
    },
    Shutdown,
}

/// Grid server coordinating sessions and the authoritative engine
pub struct Server {
    listener: Arc<TcpListener>,
    origins: Arc<OriginPolicy>,
    engine: Engine<ChannelGateway>,

    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
}

impl Server {
    pub async fn new(config: &Config) -> Result<Self, Box<dyn std::error::Error>> {
        let listener = TcpListener::bind(config.address()).await?;
        info!("Server listening on {}", listener.local_addr()?);
        info!(
            "Cooldown: {}",
            match config.cooldown_seconds {
                0 => "one move per player".to_string(),
                n => format!("{}s between moves", n),
            }
        );

        let (server_tx, server_rx) = mpsc::unbounded_channel();

        Ok(Server {
            listener: Arc::new(listener),
            origins: Arc::new(config.origin_policy()),
            engine: Engine::new(config.cooldown_seconds, ChannelGateway::new()),
            server_tx,
            server_rx,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Sender for injecting messages into the loop, e.g. `Shutdown`
    pub fn handle(&self) -> mpsc::UnboundedSender<ServerMessage> {
        self.server_tx.clone()
    }

    /// Spawns task that accepts connections and gives each its own task
    fn spawn_acceptor(&self) {
        let listener = Arc::clone(&self.listener);
        let origins = Arc::clone(&self.origins);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut next_session = 1;

            loop {
                match listener.accept().await {
                    Ok((stream, addr)) => {
                        let session = SessionId(next_session);
                        next_session += 1;
                        tokio::spawn(handle_connection(
                            stream,
                            addr,
                            session,
                            Arc::clone(&origins),
                            server_tx.clone(),
                            HANDSHAKE_TIMEOUT,
                        ));
                    }
                    Err(e) => {
                        error!("Error accepting connection: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Applies one message to the engine. Returns false once the loop should stop.
    fn handle_message(&mut self, message: ServerMessage) -> bool {
        match message {
            ServerMessage::SessionOpened { session, outbox } => {
                self.engine.gateway_mut().attach(session.id, outbox);
                self.engine.connect(session);
            }
            ServerMessage::Submit {
                session,
                ack,
                request,
            } => {
                self.engine.submit(session, ack, &request, timestamp_ms());
            }
            ServerMessage::SessionClosed { session } => {
                self.engine.disconnect(session);
                self.engine.gateway_mut().detach(session);
            }
            ServerMessage::Shutdown => {
                info!("Server shutting down");
                return false;
            }
        }
        true
    }

    /// Main server loop
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.spawn_acceptor();
        info!("Server started successfully");

        while let Some(message) = self.server_rx.recv().await {
            if !self.handle_message(message) {
                break;
            }
        }

        Ok(())
    }
}

/// Serves one TCP connection: either the liveness probe or a viewer session.
///
/// A session that completed the handshake reports `SessionClosed` exactly
/// once, whichever way the loop below ends.
async fn handle_connection(
    mut stream: TcpStream,
    addr: SocketAddr,
    session: SessionId,
    origins: Arc<OriginPolicy>,
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    handshake_timeout: Duration,
) {
    let probe = match timeout(handshake_timeout, is_health_probe(&stream)).await {
        Ok(probe) => probe,
        Err(_) => {
            debug!("Connection from {} sent nothing in time", addr);
            return;
        }
    };
    match probe {
        Ok(true) => {
            if let Err(e) = answer_health_probe(&mut stream).await {
                debug!("Health probe from {} failed: {}", addr, e);
            }
            return;
        }
        Ok(false) => {}
        Err(e) => {
            debug!("Connection from {} closed before handshake: {}", addr, e);
            return;
        }
    }

    let check_origin = move |request: &Request, response: Response| {
        let origin = request
            .headers()
            .get(ORIGIN)
            .and_then(|value| value.to_str().ok());
        if origins.permits(origin) {
            Ok(response)
        } else {
            warn!("Refusing session from {} with origin {:?}", addr, origin);
            Err(forbidden())
        }
    };

    let ws = match timeout(handshake_timeout, accept_hdr_async(stream, check_origin)).await {
        Ok(Ok(ws)) => ws,
        Ok(Err(e)) => {
            debug!("WebSocket handshake with {} failed: {}", addr, e);
            return;
        }
        Err(_) => {
            debug!("WebSocket handshake with {} timed out", addr);
            return;
        }
    };

    let (outbox_tx, mut outbox_rx) = mpsc::unbounded_channel();
    let opened = ServerMessage::SessionOpened {
        session: Session::new(session, addr),
        outbox: outbox_tx,
    };
    if let Err(e) = server_tx.send(opened) {
        error!("Failed to register session {}: {}", session, e);
        return;
    }

    let (mut write, mut read) = ws.split();

    loop {
        tokio::select! {
            event = outbox_rx.recv() => {
                let Some(event) = event else { break };
                match serde_json::to_string(&event) {
                    Ok(text) => {
                        if let Err(e) = write.send(Message::Text(text)).await {
                            debug!("Write to session {} failed: {}", session, e);
                            break;
                        }
                    }
                    Err(e) => error!("Failed to encode event for session {}: {}", session, e),
                }
            }
            frame = read.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => forward_frame(session, &text, &server_tx),
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!("Read from session {} failed: {}", session, e);
                        break;
                    }
                }
            }
        }
    }

    if let Err(e) = server_tx.send(ServerMessage::SessionClosed { session }) {
        error!("Failed to report close of session {}: {}", session, e);
    }
}

fn forward_frame(session: SessionId, text: &str, server_tx: &mpsc::UnboundedSender<ServerMessage>) {
    let frame = match serde_json::from_str::<InboundFrame>(text) {
        Ok(frame) => frame,
        Err(e) => {
            warn!("Ignoring malformed frame from session {}: {}", session, e);
            return;
        }
    };

    let ack = frame.ack_id();
    if ack.is_none() && !frame.ack.is_null() {
        debug!("Session {} sent unusable ack id {}", session, frame.ack);
    }
    let message = match frame.event {
        ClientEventKind::Submit => ServerMessage::Submit {
            session,
            ack,
            request: SubmitRequest::from_value(frame.data),
        },
    };
    if let Err(e) = server_tx.send(message) {
        error!("Failed to queue frame from session {}: {}", session, e);
    }
}

fn forbidden() -> ErrorResponse {
    let mut response = ErrorResponse::new(Some("Origin not allowed".to_string()));
    *response.status_mut() = StatusCode::FORBIDDEN;
    response
}

/// Peeks at the request line without consuming it, so a WebSocket upgrade
/// can still be handed to the handshake untouched.
async fn is_health_probe(stream: &TcpStream) -> io::Result<bool> {
    let mut buf = [0u8; 16];

    for _ in 0..PEEK_ATTEMPTS {
        let n = stream.peek(&mut buf).await?;
        if n == 0 {
            return Err(io::ErrorKind::UnexpectedEof.into());
        }
        if let Some(matched) = match_health_request(&buf[..n]) {
            return Ok(matched);
        }
        // Only part of the request line has arrived so far
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    Ok(false)
}

/// `None` while `head` is too short to decide.
fn match_health_request(head: &[u8]) -> Option<bool> {
    let len = head.len().min(HEALTH_REQUEST_PREFIX.len());
    if head[..len] != HEALTH_REQUEST_PREFIX[..len] {
        return Some(false);
    }
    // The path must end right after `/health`
    head.get(HEALTH_REQUEST_PREFIX.len())
        .map(|&next| next == b' ' || next == b'?')
}

async fn answer_health_probe(stream: &mut TcpStream) -> io::Result<()> {
    // Drain the request head first so closing does not reset the connection
    let mut head = Vec::with_capacity(256);
    let mut buf = [0u8; 256];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") && head.len() < MAX_PROBE_HEAD {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        head.extend_from_slice(&buf[..n]);
    }

    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        HEALTH_BODY.len(),
        HEALTH_BODY
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}
