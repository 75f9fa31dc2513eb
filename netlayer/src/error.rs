//! Error types for netlayer.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Main error type for netlayer operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Transport-level errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Channel operation errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Mode handling errors
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// Device profile errors
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),
}

impl Error {
    /// True if the error is a prompt-boundary read timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Channel(ChannelError::ReadTimeout(_)))
    }

    /// True if the error means the connection is gone.
    pub fn is_disconnect(&self) -> bool {
        matches!(
            self,
            Error::Channel(ChannelError::ConnectionClosed)
                | Error::Transport(TransportError::Disconnected)
        )
    }
}

/// Transport layer errors (connection, authentication, raw I/O).
#[derive(Error, Debug)]
pub enum TransportError {
    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// SSH key error
    #[error("SSH key error: {0}")]
    Key(String),

    /// The server's host key differs from the one in known_hosts
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// The server is not in known_hosts and strict checking is on
    #[error("Host {host}:{port} is not in known_hosts")]
    HostKeyUnknown { host: String, port: u16 },

    /// known_hosts could not be read or written
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// Connection was closed unexpectedly
    #[error("Connection disconnected")]
    Disconnected,

    /// Connecting timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Channel layer errors (prompt synthesis, prompt-boundary reads).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// No identifier-plus-delimiter prompt shape could be found
    #[error("Cannot derive a prompt pattern from '{line}'")]
    PromptFormat { line: String },

    /// No prompt boundary appeared before the deadline
    #[error("Prompt not found within {0:?}")]
    ReadTimeout(Duration),

    /// The stream ended before a prompt boundary
    #[error("Connection closed before a prompt was seen")]
    ConnectionClosed,

    /// Another send is already in flight
    #[error("Session busy - a command is already in flight")]
    Busy,

    /// The in-flight send was cancelled
    #[error("Command cancelled")]
    Cancelled,

    /// No prompt pattern yet - the stream was never established
    #[error("Stream not established - no prompt seen yet")]
    NotEstablished,

    /// Invalid regex pattern
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Driver layer errors (mode classification and transitions).
#[derive(Error, Debug)]
pub enum DriverError {
    /// A prompt matched none of the configured markers
    #[error("Unknown mode from prompt: '{prompt}'")]
    UnknownMode { prompt: String },

    /// A transition step landed in the wrong mode
    #[error("Transition failed: expected mode '{expected}', observed '{observed}'")]
    Transition { expected: String, observed: String },

    /// The current mode is unknown and must be refreshed first
    #[error("Current mode unknown - call refresh_mode() first")]
    ModeUnknown,

    /// The requested mode is not defined in the profile
    #[error("No mode named '{name}'")]
    NoSuchMode { name: String },

    /// Entering a mode asked for a secret and none was configured
    #[error("Mode '{mode}' asked for a secret but none was configured")]
    MissingSecret { mode: String },

    /// A commit reply contained a failure pattern
    #[error("Commit in mode '{mode}' failed: {message}")]
    CommitFailed { mode: String, message: String },
}

/// Device profile errors.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// Invalid profile definition
    #[error("Invalid profile definition: {message}")]
    InvalidDefinition { message: String },
}

/// Result type alias using netlayer's Error.
pub type Result<T> = std::result::Result<T, Error>;
