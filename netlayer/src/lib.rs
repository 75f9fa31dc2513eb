//! # Netlayer
//!
//! Async prompt-driven mode state machine for network device CLI sessions.
//!
//! Network devices expose nested CLI modes (user exec, privileged exec,
//! configuration, sub-configuration), each recognisable by its prompt.
//! Netlayer tracks which mode a session is in, moves between modes with the
//! right enter/exit commands, and reads command output up to the next
//! prompt.
//!
//! ## Features
//!
//! - Async SSH connections via russh, or any `AsyncRead + AsyncWrite` stream
//! - Prompt pattern derived from the device's own first prompt
//! - Vendor behaviour as data: ordered layers with prompt markers
//! - Transition planning over linear or tree-shaped mode hierarchies
//! - Commit-before-exit for transactional configuration modes
//! - Efficient tail-only prompt matching with ANSI stripping and pager handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use netlayer::SessionBuilder;
//! use netlayer::platform::vendors::cisco_like;
//! use netlayer::transport::SshConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), netlayer::Error> {
//!     let config = SshConfig::new("192.168.1.1", "admin").password("secret");
//!     let mut session = SessionBuilder::new(cisco_like::profile())
//!         .connect_ssh(config)
//!         .await?;
//!
//!     let response = session.run("show ip interface brief", Some("privilege_exec")).await?;
//!     println!("{}", response.result);
//!
//!     session.run("hostname edge1", Some("config_mode")).await?;
//!
//!     session.close().await?;
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod driver;
pub mod error;
pub mod platform;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main types for convenience
pub use driver::{Response, Session, SessionBuilder, SharedSession};
pub use error::{Error, Result};
pub use platform::{DeviceProfile, Layer, Marker, Mode};
pub use transport::{AuthMethod, SshConfig, Transport};
