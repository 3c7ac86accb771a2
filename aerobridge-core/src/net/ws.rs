//! WebSocket fan-out (RFC 6455), browser clients included.
//!
//! One server thread owns accept and per-client reads; broadcasting runs on
//! the host thread like the TCP path and sends the same payload bytes,
//! framed once per broadcast tick. Per-client state machine:
//!
//! ```text
//! AwaitingHandshake --101--> Open --close/error--> Closed
//! ```
//!
//! Handshakes have a 2 s deadline and an 8 KiB cap; client frames must be
//! masked; text frames feed the command queue; ping gets pong; binary and
//! continuation frames are tolerated and ignored.

use super::frame::{self, Frame, Opcode};
use crate::command::CommandQueue;
use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use parking_lot::Mutex;
use sha1::{Digest, Sha1};
use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Default WebSocket port.
pub const DEFAULT_WS_PORT: u16 = 8765;

/// Server loop poll interval; bounds both read latency and shutdown time.
const POLL_INTERVAL: Duration = Duration::from_millis(5);
/// Handshake must complete within this window.
const HANDSHAKE_DEADLINE: Duration = Duration::from_secs(2);
/// Handshake request size cap.
const MAX_HANDSHAKE_BYTES: usize = 8 * 1024;

/// RFC 6455 §1.3 magic GUID.
const WS_ACCEPT_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// Compute the `Sec-WebSocket-Accept` value for a client key.
pub fn accept_key(client_key: &str) -> String {
    let mut sha = Sha1::new();
    sha.update(client_key.trim().as_bytes());
    sha.update(WS_ACCEPT_GUID.as_bytes());
    BASE64.encode(sha.finalize())
}

#[derive(Debug, PartialEq, Eq)]
enum ClientState {
    AwaitingHandshake,
    Open,
    Closed,
}

struct WsClient {
    stream: TcpStream,
    state: ClientState,
    read_buf: Vec<u8>,
    connected_at: Instant,
}

impl WsClient {
    fn new(stream: TcpStream) -> Self {
        Self {
            stream,
            state: ClientState::AwaitingHandshake,
            read_buf: Vec::with_capacity(1024),
            connected_at: Instant::now(),
        }
    }

    fn close(&mut self) {
        let _ = self.stream.shutdown(Shutdown::Both);
        self.state = ClientState::Closed;
        self.read_buf = Vec::new();
    }
}

/// The WebSocket fan-out server (default port 8765).
pub struct WebSocketServer {
    clients: Arc<Mutex<Vec<WsClient>>>,
    running: Arc<AtomicBool>,
    server_thread: Option<JoinHandle<()>>,
    local_port: u16,
}

impl WebSocketServer {
    pub fn start(port: u16, queue: CommandQueue) -> Result<Self> {
        let listener = TcpListener::bind(("0.0.0.0", port))
            .with_context(|| format!("failed to bind websocket port {port}"))?;
        let local_port = listener.local_addr()?.port();
        listener
            .set_nonblocking(true)
            .context("failed to make websocket listener non-blocking")?;

        let clients = Arc::new(Mutex::new(Vec::new()));
        let running = Arc::new(AtomicBool::new(true));

        let loop_clients = clients.clone();
        let loop_running = running.clone();
        let server_thread = std::thread::Builder::new()
            .name("bridge-websocket".into())
            .spawn(move || server_loop(listener, loop_clients, queue, loop_running))
            .context("failed to spawn websocket thread")?;

        info!(port = local_port, "websocket server listening");
        Ok(Self {
            clients,
            running,
            server_thread: Some(server_thread),
            local_port,
        })
    }

    pub fn local_port(&self) -> u16 {
        self.local_port
    }

    /// Clients that have completed the handshake.
    pub fn client_count(&self) -> usize {
        self.clients
            .lock()
            .iter()
            .filter(|c| c.state == ClientState::Open)
            .count()
    }

    /// Broadcast one payload as a single unmasked text frame. The frame is
    /// built once; sends are non-blocking and lossy, mirroring the TCP path.
    pub fn broadcast(&self, payload: &[u8]) {
        let mut local = std::mem::take(&mut *self.clients.lock());
        if local.is_empty() {
            return;
        }

        let framed = frame::encode_text(payload);
        for client in &mut local {
            if client.state != ClientState::Open {
                continue;
            }
            match client.stream.write(&framed) {
                Ok(n) if n == framed.len() => {}
                Ok(_) => {
                    // Partial frame would desync the protocol stream.
                    debug!("partial websocket frame, dropping client");
                    client.close();
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => {}
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    debug!(error = %e, "websocket client dropped on send");
                    client.close();
                }
            }
        }
        local.retain(|c| c.state != ClientState::Closed);

        self.clients.lock().append(&mut local);
    }

    /// Stop the server thread and close every connection. Idempotent.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.server_thread.take() {
            let _ = handle.join();
        }
        for client in self.clients.lock().iter_mut() {
            if client.state == ClientState::Open {
                let _ = client
                    .stream
                    .write(&frame::encode_server_frame(Opcode::Close, &[]));
            }
            client.close();
        }
        self.clients.lock().clear();
    }
}

impl Drop for WebSocketServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn server_loop(
    listener: TcpListener,
    clients: Arc<Mutex<Vec<WsClient>>>,
    queue: CommandQueue,
    running: Arc<AtomicBool>,
) {
    while running.load(Ordering::Acquire) {
        // Accept every pending connection.
        loop {
            match listener.accept() {
                Ok((stream, peer)) => {
                    if stream.set_nonblocking(true).and(stream.set_nodelay(true)).is_err() {
                        continue;
                    }
                    debug!(%peer, "websocket connection accepted");
                    clients.lock().push(WsClient::new(stream));
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) => {
                    warn!(error = %e, "websocket accept failed");
                    break;
                }
            }
        }

        // Service every client, then evict the closed ones.
        let mut local = std::mem::take(&mut *clients.lock());
        for client in &mut local {
            service_client(client, &queue);
        }
        local.retain(|c| c.state != ClientState::Closed);
        clients.lock().append(&mut local);

        std::thread::sleep(POLL_INTERVAL);
    }
}

fn service_client(client: &mut WsClient, queue: &CommandQueue) {
    if client.state == ClientState::Closed {
        return;
    }

    // Drain whatever the socket has without blocking.
    let mut chunk = [0u8; 4096];
    loop {
        match client.stream.read(&mut chunk) {
            Ok(0) => {
                client.close();
                return;
            }
            Ok(n) => client.read_buf.extend_from_slice(&chunk[..n]),
            Err(e) if e.kind() == ErrorKind::WouldBlock => break,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                debug!(error = %e, "websocket read failed");
                client.close();
                return;
            }
        }
    }

    match client.state {
        ClientState::AwaitingHandshake => progress_handshake(client),
        ClientState::Open => process_frames(client, queue),
        ClientState::Closed => {}
    }
}

fn progress_handshake(client: &mut WsClient) {
    if client.connected_at.elapsed() > HANDSHAKE_DEADLINE
        || client.read_buf.len() > MAX_HANDSHAKE_BYTES
    {
        debug!("websocket handshake timed out or overflowed");
        client.close();
        return;
    }

    let Some(end) = find_header_end(&client.read_buf) else {
        return;
    };

    let request = String::from_utf8_lossy(&client.read_buf[..end]).into_owned();
    client.read_buf.drain(..end);

    match handshake_response(&request) {
        Some(response) => {
            if client.stream.write_all(response.as_bytes()).is_err() {
                client.close();
                return;
            }
            client.state = ClientState::Open;
            debug!("websocket handshake complete");
        }
        None => {
            debug!("invalid websocket handshake");
            let _ = client
                .stream
                .write_all(b"HTTP/1.1 400 Bad Request\r\nConnection: close\r\n\r\n");
            client.close();
        }
    }
}

fn process_frames(client: &mut WsClient, queue: &CommandQueue) {
    loop {
        match frame::parse_client_frame(&client.read_buf) {
            Ok(None) => return,
            Ok(Some((frame, consumed))) => {
                client.read_buf.drain(..consumed);
                handle_frame(client, frame, queue);
                if client.state == ClientState::Closed {
                    return;
                }
            }
            Err(e) => {
                debug!(error = %e, "websocket protocol violation");
                client.close();
                return;
            }
        }
    }
}

fn handle_frame(client: &mut WsClient, frame: Frame, queue: &CommandQueue) {
    match frame.opcode {
        Opcode::Text => {
            queue.push(String::from_utf8_lossy(&frame.payload).into_owned());
        }
        Opcode::Ping => {
            let pong = frame::encode_server_frame(Opcode::Pong, &frame.payload);
            if client.stream.write_all(&pong).is_err() {
                client.close();
            }
        }
        Opcode::Close => {
            let _ = client
                .stream
                .write(&frame::encode_server_frame(Opcode::Close, &[]));
            client.close();
        }
        // Single-frame text covers every supported client; these are legal
        // but carry nothing for us.
        Opcode::Binary | Opcode::Continuation | Opcode::Pong => {}
    }
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n").map(|p| p + 4)
}

/// Validate the upgrade request and build the `101` response.
///
/// Header checks are case-insensitive per RFC 7230; only `Upgrade`,
/// `Connection` and `Sec-WebSocket-Key` matter here.
fn handshake_response(request: &str) -> Option<String> {
    let mut has_upgrade = false;
    let mut has_connection_upgrade = false;
    let mut key = None;

    for line in request.lines().skip(1) {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let name = name.trim().to_ascii_lowercase();
        let value = value.trim();
        match name.as_str() {
            "upgrade" => has_upgrade = value.eq_ignore_ascii_case("websocket"),
            "connection" => {
                has_connection_upgrade = value
                    .split(',')
                    .any(|t| t.trim().eq_ignore_ascii_case("upgrade"));
            }
            "sec-websocket-key" => key = Some(value.to_string()),
            _ => {}
        }
    }

    if !has_upgrade || !has_connection_upgrade {
        return None;
    }
    let key = key?;

    Some(format!(
        "HTTP/1.1 101 Switching Protocols\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Accept: {}\r\n\r\n",
        accept_key(&key)
    ))
}
