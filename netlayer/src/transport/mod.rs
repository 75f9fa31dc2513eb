//! Transport layer.
//!
//! A [`Transport`] is a duplex text stream to one device. The session never
//! assumes any framing beyond newline-delimited text. Two adapters ship with
//! the crate: [`IoTransport`] over any tokio byte stream (telnet sockets,
//! serial consoles, in-memory pipes) and [`SshTransport`] over an SSH shell
//! channel.

pub mod config;
mod io;
mod ssh;

pub use config::{AuthMethod, HostKeyVerification, SshConfig};
pub use io::IoTransport;
pub use ssh::SshTransport;

use std::future::Future;

use bytes::Bytes;

use crate::error::Result;

/// A duplex byte stream to a device.
pub trait Transport: Send {
    /// Write all of `data` to the device.
    fn write(&mut self, data: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Wait for and return the next chunk of output.
    ///
    /// Returns `Ok(None)` once the stream has ended.
    fn read_available(&mut self) -> impl Future<Output = Result<Option<Bytes>>> + Send;

    /// Release the underlying connection.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;
}
