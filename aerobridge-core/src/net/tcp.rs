//! TCP fan-out: the line-delimited JSON telemetry stream and the one-shot
//! command listener.
//!
//! Each listener gets one accept thread. Listeners and client sockets are
//! non-blocking throughout; the accept loops poll with a bounded sleep so a
//! shutdown flag is observed within well under a second. Broadcasting runs
//! on the host thread and never blocks: a client that cannot keep up simply
//! misses frames, and fatal socket errors evict the client.

use crate::command::CommandQueue;
use anyhow::{Context, Result};
use parking_lot::Mutex;
use socket2::SockRef;
use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default telemetry port.
pub const DEFAULT_TELEMETRY_PORT: u16 = 12345;
/// Default command port.
pub const DEFAULT_COMMAND_PORT: u16 = 12346;

/// Accept-loop poll interval; bounds shutdown latency.
const ACCEPT_POLL: Duration = Duration::from_millis(50);
/// Per-connection read timeout on the command port.
const COMMAND_READ_TIMEOUT: Duration = Duration::from_millis(200);
/// Largest accepted command payload.
const MAX_COMMAND_BYTES: usize = 64 * 1024;

fn configure_client(stream: &TcpStream) -> std::io::Result<()> {
    stream.set_nodelay(true)?;
    stream.set_nonblocking(true)?;
    SockRef::from(stream).set_keepalive(true)?;
    Ok(())
}

enum SendOutcome {
    Sent,
    Skipped,
    Dead,
}

/// Write one frame without blocking. Would-block skips the frame; a partial
/// write gets a single immediate retry for the remainder, then the rest of
/// the frame is abandoned (the next broadcast starts clean on a newline
/// boundary only for clients that accepted the full frame, which is why the
/// whole frame is retried-or-dropped rather than trickled).
fn send_frame(stream: &mut TcpStream, payload: &[u8]) -> SendOutcome {
    let mut written = 0;
    let mut retried = false;
    while written < payload.len() {
        match stream.write(&payload[written..]) {
            Ok(0) => return SendOutcome::Dead,
            Ok(n) => {
                written += n;
                if written < payload.len() {
                    if retried {
                        return SendOutcome::Skipped;
                    }
                    retried = true;
                }
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => return SendOutcome::Skipped,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(_) => return SendOutcome::Dead,
        }
    }
    SendOutcome::Sent
}

/// The JSON telemetry broadcaster (default port 12345).
pub struct TelemetryServer {
    clients: Arc<Mutex<Vec<TcpStream>>>,
    running: Arc<AtomicBool>,
    accept_thread: Option<JoinHandle<()>>,
    local_port: u16,
}

impl TelemetryServer {
    /// Bind and start accepting. Pass port 0 to let the OS choose (tests).
    pub fn start(port: u16) -> Result<Self> {
        let listener = TcpListener::bind(("0.0.0.0", port))
            .with_context(|| format!("failed to bind telemetry port {port}"))?;
        let local_port = listener.local_addr()?.port();
        listener
            .set_nonblocking(true)
            .context("failed to make telemetry listener non-blocking")?;

        let clients = Arc::new(Mutex::new(Vec::new()));
        let running = Arc::new(AtomicBool::new(true));

        let accept_clients = clients.clone();
        let accept_running = running.clone();
        let accept_thread = std::thread::Builder::new()
            .name("bridge-telemetry-accept".into())
            .spawn(move || accept_loop(listener, accept_clients, accept_running))
            .context("failed to spawn telemetry accept thread")?;

        info!(port = local_port, "telemetry server listening");
        Ok(Self {
            clients,
            running,
            accept_thread: Some(accept_thread),
            local_port,
        })
    }

    pub fn local_port(&self) -> u16 {
        self.local_port
    }

    pub fn client_count(&self) -> usize {
        self.clients.lock().len()
    }

    /// Send one frame to every connected client. Runs on the host thread;
    /// sockets are non-blocking so this returns promptly regardless of
    /// client behavior.
    pub fn broadcast(&self, payload: &[u8]) {
        let mut local = std::mem::take(&mut *self.clients.lock());
        if local.is_empty() {
            return;
        }

        local.retain_mut(|stream| match send_frame(stream, payload) {
            SendOutcome::Sent | SendOutcome::Skipped => true,
            SendOutcome::Dead => {
                debug!("telemetry client dropped");
                let _ = stream.shutdown(Shutdown::Both);
                false
            }
        });

        // Clients accepted during the send joined the (empty) shared vec;
        // merge the survivors back in.
        self.clients.lock().append(&mut local);
    }

    /// Stop accepting, drop all clients, join the accept thread. Idempotent.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.accept_thread.take() {
            let _ = handle.join();
        }
        for stream in self.clients.lock().drain(..) {
            let _ = stream.shutdown(Shutdown::Both);
        }
    }
}

impl Drop for TelemetryServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn accept_loop(listener: TcpListener, clients: Arc<Mutex<Vec<TcpStream>>>, running: Arc<AtomicBool>) {
    while running.load(Ordering::Acquire) {
        match listener.accept() {
            Ok((stream, peer)) => {
                if let Err(e) = configure_client(&stream) {
                    warn!(%peer, error = %e, "failed to configure telemetry client");
                    continue;
                }
                debug!(%peer, "telemetry client connected");
                clients.lock().push(stream);
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                std::thread::sleep(ACCEPT_POLL);
            }
            Err(e) => {
                warn!(error = %e, "telemetry accept failed");
                std::thread::sleep(ACCEPT_POLL);
            }
        }
    }
}

/// The one-shot command listener (default port 12346).
///
/// Protocol: a client connects, writes one JSON command, closes. The whole
/// received byte sequence is enqueued as a single command string; there is
/// no reply. Stateless on purpose so shell scripts can drive it.
pub struct CommandServer {
    running: Arc<AtomicBool>,
    accept_thread: Option<JoinHandle<()>>,
    local_port: u16,
}

impl CommandServer {
    pub fn start(port: u16, queue: CommandQueue) -> Result<Self> {
        let listener = TcpListener::bind(("0.0.0.0", port))
            .with_context(|| format!("failed to bind command port {port}"))?;
        let local_port = listener.local_addr()?.port();
        listener
            .set_nonblocking(true)
            .context("failed to make command listener non-blocking")?;

        let running = Arc::new(AtomicBool::new(true));
        let accept_running = running.clone();
        let accept_thread = std::thread::Builder::new()
            .name("bridge-command-accept".into())
            .spawn(move || command_loop(listener, queue, accept_running))
            .context("failed to spawn command accept thread")?;

        info!(port = local_port, "command server listening");
        Ok(Self {
            running,
            accept_thread: Some(accept_thread),
            local_port,
        })
    }

    pub fn local_port(&self) -> u16 {
        self.local_port
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.accept_thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for CommandServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn command_loop(listener: TcpListener, queue: CommandQueue, running: Arc<AtomicBool>) {
    while running.load(Ordering::Acquire) {
        match listener.accept() {
            Ok((stream, peer)) => {
                match read_one_command(stream) {
                    Ok(raw) if !raw.is_empty() => {
                        debug!(%peer, bytes = raw.len(), "command received");
                        queue.push(raw);
                    }
                    Ok(_) => debug!(%peer, "empty command connection"),
                    Err(e) => debug!(%peer, error = %e, "command read failed"),
                }
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                std::thread::sleep(ACCEPT_POLL);
            }
            Err(e) => {
                warn!(error = %e, "command accept failed");
                std::thread::sleep(ACCEPT_POLL);
            }
        }
    }
}

/// Read until EOF, the size cap, or the read timeout. One-shot clients
/// close immediately after writing, so this returns fast; the timeout keeps
/// a misbehaving client from stalling the accept thread.
fn read_one_command(stream: TcpStream) -> std::io::Result<String> {
    let mut stream = stream;
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(COMMAND_READ_TIMEOUT))?;

    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 4096];
    loop {
        match stream.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                if buf.len() >= MAX_COMMAND_BYTES {
                    buf.truncate(MAX_COMMAND_BYTES);
                    break;
                }
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e)
                if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut =>
            {
                break;
            }
            Err(e) => return Err(e),
        }
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
