use shared::Role;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    #[error("Failed to bind listener to {0}: {1}")]
    BindFailed(String, std::io::Error),

    #[error("Failed to read config {0}: {1}")]
    ConfigRead(PathBuf, std::io::Error),

    #[error("Invalid config {0}: {1}")]
    ConfigParse(PathBuf, serde_json::Error),

    #[error("Failed to write report {0}: {1}")]
    ReportWrite(PathBuf, std::io::Error),

    #[error("Failed to launch {0}: {1}")]
    LaunchFailed(String, std::io::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Rejection of a command by the role registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("no role holds key {0:?}")]
    UnknownKey(String),

    #[error("{role} may not send {command}")]
    Forbidden { role: Role, command: &'static str },
}

/// A session failed at the socket level.
#[derive(Debug, thiserror::Error)]
#[error("session {id} ({addr}) failed: {source}")]
pub struct SessionError {
    pub id: u32,
    pub addr: SocketAddr,
    #[source]
    pub source: std::io::Error,
}
