//! Participant connection management for the match supervisor
//!
//! This module owns the listening socket and every accepted TCP connection:
//! - Accepting new connections without ever blocking the match loop
//! - Reading whatever bytes are available and framing them into RPC commands
//! - Queuing outbound JSON messages and writing them as sockets allow
//! - Tearing down a connection on error or close without touching the others
//!
//! A session does not know which role it serves. The role registry binds a
//! session to a role the first time a command with a valid key arrives on it.

use crate::error::{SessionError, SupervisorError};
use log::{debug, info, warn};
use shared::RpcFramer;
use std::collections::HashMap;
use std::future::poll_fn;
use std::io;
use std::net::SocketAddr;
use std::task::Poll;
use tokio::net::{TcpListener, TcpStream};

/// Largest outbound backlog kept for a slow reader. Messages that would grow
/// the queue past it are dropped.
pub const MAX_OUTBOUND: usize = 4 * 1024 * 1024;

const READ_CHUNK: usize = 4096;

/// Something that happened on a session during [`SessionManager::poll`].
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A complete RPC command, marker included.
    Command { session: u32, text: String },
    /// The session was closed and removed.
    Closed { session: u32 },
}

/// One accepted participant connection
///
/// Each session keeps:
/// - The socket and the peer address for diagnostics
/// - The framer holding any partial command between reads
/// - Trailing bytes of a UTF-8 sequence split across reads
/// - Outbound bytes not yet accepted by the socket
#[derive(Debug)]
pub struct Session {
    /// Identifier assigned on accept, never reused
    pub id: u32,
    /// Peer address
    pub addr: SocketAddr,
    stream: TcpStream,
    framer: RpcFramer,
    partial_utf8: Vec<u8>,
    outbound: Vec<u8>,
}

impl Session {
    fn new(id: u32, addr: SocketAddr, stream: TcpStream) -> Self {
        Self {
            id,
            addr,
            stream,
            framer: RpcFramer::new(),
            partial_utf8: Vec::new(),
            outbound: Vec::new(),
        }
    }

    /// Drains every byte currently readable from the socket
    ///
    /// Returns the complete commands found, or `Ok(None)` once the peer has
    /// closed the connection. Never waits for data.
    fn read_available(&mut self) -> io::Result<Option<Vec<String>>> {
        let mut received = Vec::new();
        let mut buffer = [0u8; READ_CHUNK];
        let mut closed = false;

        loop {
            match self.stream.try_read(&mut buffer) {
                Ok(0) => {
                    closed = true;
                    break;
                }
                Ok(n) => received.extend_from_slice(&buffer[..n]),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        let commands = if received.is_empty() {
            Vec::new()
        } else {
            self.partial_utf8.extend_from_slice(&received);
            let text = decode_utf8(&mut self.partial_utf8);
            self.framer.feed(&text)
        };

        if closed && commands.is_empty() {
            Ok(None)
        } else {
            Ok(Some(commands))
        }
    }

    /// Writes as much of the outbound queue as the socket accepts right now
    fn flush(&mut self) -> io::Result<()> {
        while !self.outbound.is_empty() {
            match self.stream.try_write(&self.outbound) {
                Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
                Ok(n) => {
                    self.outbound.drain(..n);
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Bytes queued but not yet written
    pub fn pending_output(&self) -> usize {
        self.outbound.len()
    }
}

/// Decodes the longest valid UTF-8 prefix of `bytes`, keeping an incomplete
/// trailing sequence for the next read. Invalid bytes are replaced.
fn decode_utf8(bytes: &mut Vec<u8>) -> String {
    let mut text = String::new();
    let mut rest: &[u8] = bytes;
    loop {
        match std::str::from_utf8(rest) {
            Ok(valid) => {
                text.push_str(valid);
                rest = &[];
                break;
            }
            Err(e) => {
                let (valid, after) = rest.split_at(e.valid_up_to());
                text.push_str(&String::from_utf8_lossy(valid));
                match e.error_len() {
                    Some(len) => {
                        text.push(char::REPLACEMENT_CHARACTER);
                        rest = &after[len..];
                    }
                    None => {
                        rest = after;
                        break;
                    }
                }
            }
        }
    }
    *bytes = rest.to_vec();
    text
}

/// Accepts and services every participant connection
///
/// The SessionManager is polled once per tick by the run loop. All socket
/// operations are non-blocking: a quiet or slow participant costs nothing,
/// and a failing one is dropped without affecting the rest of the match.
pub struct SessionManager {
    listener: TcpListener,
    /// Open sessions indexed by their identifier
    sessions: HashMap<u32, Session>,
    /// Identifier handed to the next accepted connection
    next_session_id: u32,
}

impl SessionManager {
    /// Binds the listening socket
    pub async fn bind(addr: &str) -> Result<Self, SupervisorError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| SupervisorError::BindFailed(addr.to_string(), e))?;
        info!("Supervisor listening on {}", addr);

        Ok(Self {
            listener,
            sessions: HashMap::new(),
            next_session_id: 1,
        })
    }

    /// Address actually bound, useful when binding port 0
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts pending connections and reads all available input
    ///
    /// Returns commands in arrival order per session, followed by a
    /// [`SessionEvent::Closed`] for every session that went away. Never
    /// waits for a connection or for data.
    pub async fn poll(&mut self) -> Vec<SessionEvent> {
        self.accept_pending().await;

        let mut events = Vec::new();
        let mut closed = Vec::new();

        let mut ids: Vec<u32> = self.sessions.keys().copied().collect();
        ids.sort_unstable();

        for id in ids {
            let Some(session) = self.sessions.get_mut(&id) else {
                continue;
            };
            match session.read_available() {
                Ok(Some(commands)) => {
                    events.extend(
                        commands
                            .into_iter()
                            .map(|text| SessionEvent::Command { session: id, text }),
                    );
                }
                Ok(None) => {
                    info!("Session {} ({}) closed by peer", id, session.addr);
                    closed.push(id);
                }
                Err(source) => {
                    let err = SessionError {
                        id,
                        addr: session.addr,
                        source,
                    };
                    warn!("{}", err);
                    closed.push(id);
                }
            }
        }

        for id in closed {
            self.sessions.remove(&id);
            events.push(SessionEvent::Closed { session: id });
        }
        events
    }

    async fn accept_pending(&mut self) {
        loop {
            let accepted = poll_fn(|cx| Poll::Ready(self.listener.poll_accept(cx))).await;
            match accepted {
                Poll::Ready(Ok((stream, addr))) => {
                    if let Err(e) = stream.set_nodelay(true) {
                        debug!("Could not disable Nagle for {}: {}", addr, e);
                    }
                    let id = self.next_session_id;
                    self.next_session_id += 1;
                    info!("Accepted session {} from {}", id, addr);
                    self.sessions.insert(id, Session::new(id, addr, stream));
                }
                Poll::Ready(Err(e)) => {
                    warn!("Failed to accept connection: {}", e);
                    break;
                }
                Poll::Pending => break,
            }
        }
    }

    /// Queues a message for a session
    ///
    /// Returns false if the session is gone or its backlog is full, in which
    /// case the message is dropped whole so the stream stays well formed.
    pub fn send(&mut self, session: u32, message: &str) -> bool {
        let Some(session) = self.sessions.get_mut(&session) else {
            return false;
        };
        if session.outbound.len() + message.len() > MAX_OUTBOUND {
            warn!(
                "Session {} is not reading, dropping a {} byte message",
                session.id,
                message.len()
            );
            return false;
        }
        session.outbound.extend_from_slice(message.as_bytes());
        true
    }

    /// Writes queued output on every session
    ///
    /// Sessions whose socket fails are removed and reported.
    pub fn flush(&mut self) -> Vec<SessionEvent> {
        let mut failed = Vec::new();
        for (id, session) in self.sessions.iter_mut() {
            if let Err(source) = session.flush() {
                let err = SessionError {
                    id: *id,
                    addr: session.addr,
                    source,
                };
                warn!("{}", err);
                failed.push(*id);
            }
        }
        failed.sort_unstable();
        failed
            .into_iter()
            .map(|id| {
                self.sessions.remove(&id);
                SessionEvent::Closed { session: id }
            })
            .collect()
    }

    pub fn get(&self, session: u32) -> Option<&Session> {
        self.sessions.get(&session)
    }

    /// Returns the number of open sessions
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns true if no session is open
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
