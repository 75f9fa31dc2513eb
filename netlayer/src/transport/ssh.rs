//! SSH shell-channel transport using russh.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use log::{debug, trace, warn};
use russh::client::{self, Handle, Msg};
use russh::keys::{PrivateKeyWithHashAlg, PublicKey, load_secret_key};
use russh::{Channel, ChannelMsg};
use secrecy::ExposeSecret;

use super::Transport;
use super::config::{AuthMethod, HostKeyVerification, SshConfig};
use crate::error::{Result, TransportError};

/// A PTY shell channel on an authenticated SSH connection.
pub struct SshTransport {
    session: Handle<SshHandler>,
    channel: Channel<Msg>,
    closed: bool,
}

impl SshTransport {
    /// Connect, authenticate, and open an interactive shell channel.
    pub async fn connect(config: SshConfig) -> Result<Self> {
        let ssh_config = Arc::new(client::Config {
            inactivity_timeout: None,
            ..Default::default()
        });

        let host_key_error: Arc<Mutex<Option<TransportError>>> = Arc::new(Mutex::new(None));

        let handler = SshHandler {
            host: config.host.clone(),
            port: config.port,
            host_key_verification: config.host_key_verification.clone(),
            known_hosts_path: config.known_hosts_path.clone(),
            host_key_error: host_key_error.clone(),
        };

        debug!("ssh: connecting to {}", config.socket_addr());
        let mut session = tokio::time::timeout(
            config.timeout,
            client::connect(ssh_config, (config.host.as_str(), config.port), handler),
        )
        .await
        .map_err(|_| TransportError::Timeout(config.timeout))?
        .map_err(|e| {
            // Prefer the detailed host-key error over russh's generic one
            host_key_error
                .lock()
                .ok()
                .and_then(|mut slot| slot.take())
                .unwrap_or(TransportError::Ssh(e))
        })?;

        authenticate(&mut session, &config).await?;

        let channel = session
            .channel_open_session()
            .await
            .map_err(TransportError::Ssh)?;
        channel
            .request_pty(
                true,
                "xterm",
                config.terminal_width,
                config.terminal_height,
                0,
                0,
                &[],
            )
            .await
            .map_err(TransportError::Ssh)?;
        channel
            .request_shell(true)
            .await
            .map_err(TransportError::Ssh)?;

        debug!("ssh: shell open on {}", config.socket_addr());
        Ok(Self {
            session,
            channel,
            closed: false,
        })
    }
}

impl Transport for SshTransport {
    async fn write(&mut self, data: &[u8]) -> Result<()> {
        if self.closed {
            return Err(TransportError::Disconnected.into());
        }
        self.channel
            .data(data)
            .await
            .map_err(TransportError::Ssh)?;
        Ok(())
    }

    async fn read_available(&mut self) -> Result<Option<Bytes>> {
        if self.closed {
            return Ok(None);
        }
        loop {
            match self.channel.wait().await {
                Some(ChannelMsg::Data { data }) => {
                    return Ok(Some(Bytes::copy_from_slice(&data)));
                }
                Some(ChannelMsg::ExtendedData { data, .. }) => {
                    return Ok(Some(Bytes::copy_from_slice(&data)));
                }
                Some(ChannelMsg::Eof) | Some(ChannelMsg::Close) | None => {
                    trace!("ssh: channel ended");
                    self.closed = true;
                    return Ok(None);
                }
                Some(other) => {
                    trace!("ssh: ignoring channel message {:?}", other);
                }
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.closed = true;
            if let Err(e) = self.channel.eof().await {
                debug!("ssh: eof on close failed: {}", e);
            }
        }
        self.session
            .disconnect(russh::Disconnect::ByApplication, "", "en")
            .await
            .map_err(TransportError::Ssh)?;
        Ok(())
    }
}

async fn authenticate(session: &mut Handle<SshHandler>, config: &SshConfig) -> Result<()> {
    let success = match &config.auth {
        AuthMethod::None => session
            .authenticate_none(&config.username)
            .await
            .map_err(TransportError::Ssh)?
            .success(),
        AuthMethod::Password(password) => session
            .authenticate_password(&config.username, password.expose_secret())
            .await
            .map_err(TransportError::Ssh)?
            .success(),
        AuthMethod::PrivateKey { path, passphrase } => {
            let key = load_secret_key(path, passphrase.as_ref().map(|p| p.expose_secret()))
                .map_err(|e| TransportError::Key(e.to_string()))?;

            let hash_alg = session
                .best_supported_rsa_hash()
                .await
                .map_err(TransportError::Ssh)?
                .flatten();

            session
                .authenticate_publickey(
                    &config.username,
                    PrivateKeyWithHashAlg::new(Arc::new(key), hash_alg),
                )
                .await
                .map_err(TransportError::Ssh)?
                .success()
        }
    };

    if !success {
        return Err(TransportError::AuthenticationFailed {
            user: config.username.clone(),
        }
        .into());
    }

    Ok(())
}

/// russh client handler doing known_hosts checks.
struct SshHandler {
    host: String,
    port: u16,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
    host_key_error: Arc<Mutex<Option<TransportError>>>,
}

impl SshHandler {
    /// `Ok(true)` if known and matching, `Ok(false)` if unknown.
    fn check_known_hosts(&self, pubkey: &PublicKey) -> std::result::Result<bool, TransportError> {
        let result = match self.known_hosts_path {
            Some(ref path) => russh::keys::check_known_hosts_path(&self.host, self.port, pubkey, path),
            None => russh::keys::check_known_hosts(&self.host, self.port, pubkey),
        };

        match result {
            Ok(matched) => Ok(matched),
            Err(russh::keys::Error::KeyChanged { line }) => Err(TransportError::HostKeyChanged {
                host: self.host.clone(),
                port: self.port,
                line,
            }),
            Err(e) => Err(TransportError::KnownHosts(e.to_string())),
        }
    }

    fn learn_host_key(&self, pubkey: &PublicKey) -> std::result::Result<(), TransportError> {
        let result = match self.known_hosts_path {
            Some(ref path) => {
                russh::keys::known_hosts::learn_known_hosts_path(&self.host, self.port, pubkey, path)
            }
            None => russh::keys::known_hosts::learn_known_hosts(&self.host, self.port, pubkey),
        };
        result.map_err(|e| TransportError::KnownHosts(e.to_string()))
    }

    fn reject(&self, error: TransportError) -> bool {
        if let Ok(mut slot) = self.host_key_error.lock() {
            *slot = Some(error);
        }
        false
    }
}

impl client::Handler for SshHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        let accepted = match self.host_key_verification {
            HostKeyVerification::Disabled => true,
            HostKeyVerification::AcceptNew => match self.check_known_hosts(server_public_key) {
                Ok(true) => true,
                Ok(false) => {
                    if let Err(e) = self.learn_host_key(server_public_key) {
                        warn!("Failed to save host key: {}", e);
                    }
                    true
                }
                Err(e) => self.reject(e),
            },
            HostKeyVerification::Strict => match self.check_known_hosts(server_public_key) {
                Ok(true) => true,
                Ok(false) => self.reject(TransportError::HostKeyUnknown {
                    host: self.host.clone(),
                    port: self.port,
                }),
                Err(e) => self.reject(e),
            },
        };
        Ok(accepted)
    }
}
