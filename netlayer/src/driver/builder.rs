//! Builder for opening sessions.

use std::collections::HashMap;
use std::time::Duration;

use log::info;
use secrecy::SecretString;

use super::graph::LayerGraph;
use super::machine::ModeStateMachine;
use super::session::Session;
use crate::channel::{SessionStream, StreamConfig};
use crate::error::Result;
use crate::platform::DeviceProfile;
use crate::transport::{SshConfig, SshTransport, Transport};

/// Builder for constructing sessions.
///
/// # Example
///
/// ```rust,no_run
/// use netlayer::driver::SessionBuilder;
/// use netlayer::platform::vendors::cisco_like;
/// use netlayer::transport::SshConfig;
///
/// # async fn example() -> Result<(), netlayer::Error> {
/// let config = SshConfig::new("192.168.1.1", "admin").password("secret");
/// let mut session = SessionBuilder::new(cisco_like::profile_with_enable_secret())
///     .secret("privilege_exec", "enable-secret")
///     .connect_ssh(config)
///     .await?;
///
/// let response = session.run("show running-config", Some("privilege_exec")).await?;
/// println!("{}", response.result);
/// session.close().await?;
/// # Ok(())
/// # }
/// ```
pub struct SessionBuilder {
    profile: DeviceProfile,
    stream_config: StreamConfig,
    transition_timeout: Duration,
    secrets: HashMap<String, SecretString>,
}

impl SessionBuilder {
    /// Create a builder for a device described by `profile`.
    pub fn new(profile: DeviceProfile) -> Self {
        Self {
            profile,
            stream_config: StreamConfig::default(),
            transition_timeout: Duration::from_secs(30),
            secrets: HashMap::new(),
        }
    }

    /// Set the default timeout for user commands (default: 30s).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.stream_config.timeout = timeout;
        self
    }

    /// Set the timeout for each transition step (default: 30s).
    ///
    /// A layer's own timeout takes precedence.
    pub fn transition_timeout(mut self, timeout: Duration) -> Self {
        self.transition_timeout = timeout;
        self
    }

    /// Set how long to wait for the login prompt before sending a line ending.
    pub fn wake_after(mut self, wait: Duration) -> Self {
        self.stream_config.wake_after = wait;
        self
    }

    /// Set how many trailing bytes are searched for the prompt.
    pub fn search_depth(mut self, depth: usize) -> Self {
        self.stream_config.search_depth = depth;
        self
    }

    /// Supply the secret answered when entering `mode` asks for one.
    pub fn secret(mut self, mode: impl Into<String>, secret: impl Into<String>) -> Self {
        self.secrets
            .insert(mode.into(), SecretString::from(secret.into()));
        self
    }

    /// Open a session over an already connected transport.
    ///
    /// Waits for the first prompt, derives the prompt pattern, classifies the
    /// starting mode and disables paging.
    pub async fn open<T: Transport>(self, transport: T) -> Result<Session<T>> {
        let graph = LayerGraph::new(&self.profile)?;
        let mut stream = SessionStream::new(transport, &self.profile, self.stream_config)?;
        let mut machine = ModeStateMachine::new(
            graph,
            self.secrets,
            self.transition_timeout,
            self.profile.failed_when_contains.clone(),
        );

        let prompt = stream.establish().await?;
        let mode = machine.observe(&prompt)?;
        info!("Session open at {:?} in mode {}", prompt, mode);

        if let Some(command) = &self.profile.paging_command {
            let reply = stream.send(command).await?;
            machine.observe(&reply.prompt)?;
        }

        Ok(Session::new(self.profile, stream, machine))
    }

    /// Connect over SSH and open a session.
    pub async fn connect_ssh(self, config: SshConfig) -> Result<Session<SshTransport>> {
        let transport = SshTransport::connect(config).await?;
        self.open(transport).await
    }
}
