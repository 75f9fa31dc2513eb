//! SSH connection configuration.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

/// Host key verification mode, analogous to OpenSSH's `StrictHostKeyChecking`.
#[derive(Debug, Clone, Default)]
pub enum HostKeyVerification {
    /// Reject unknown and changed keys.
    Strict,

    /// Accept and learn unknown keys, reject changed keys.
    #[default]
    AcceptNew,

    /// Accept all keys without checking. For lab use only.
    Disabled,
}

/// SSH connection configuration.
#[derive(Debug, Clone)]
pub struct SshConfig {
    /// Target host (hostname or IP address).
    pub host: String,

    /// SSH port (default: 22).
    pub port: u16,

    /// Username for authentication.
    pub username: String,

    /// Authentication method.
    pub auth: AuthMethod,

    /// Connect and handshake timeout.
    pub timeout: Duration,

    /// Terminal width for the PTY.
    pub terminal_width: u32,

    /// Terminal height for the PTY.
    pub terminal_height: u32,

    /// Host key verification mode.
    pub host_key_verification: HostKeyVerification,

    /// Path to known_hosts file (defaults to the user's).
    pub known_hosts_path: Option<PathBuf>,
}

impl SshConfig {
    /// Create a config with defaults for everything but host and user.
    pub fn new(host: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 22,
            username: username.into(),
            auth: AuthMethod::None,
            timeout: Duration::from_secs(30),
            terminal_width: 511,
            terminal_height: 24,
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
        }
    }

    /// Set the SSH port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Use password authentication.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.auth = AuthMethod::Password(SecretString::from(password.into()));
        self
    }

    /// Use private key authentication.
    pub fn private_key(mut self, path: impl Into<PathBuf>, passphrase: Option<String>) -> Self {
        self.auth = AuthMethod::PrivateKey {
            path: path.into(),
            passphrase: passphrase.map(SecretString::from),
        };
        self
    }

    /// Set the connect timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the host key verification mode.
    pub fn host_key_verification(mut self, mode: HostKeyVerification) -> Self {
        self.host_key_verification = mode;
        self
    }

    /// Get the socket address for connection.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Authentication method for SSH connections.
#[derive(Debug, Clone)]
pub enum AuthMethod {
    /// No authentication (for testing only).
    None,

    /// Password authentication.
    Password(SecretString),

    /// Private key authentication.
    PrivateKey {
        /// Path to the private key file.
        path: PathBuf,
        /// Optional passphrase for encrypted keys.
        passphrase: Option<SecretString>,
    },
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn test_defaults_and_builders() {
        let config = SshConfig::new("10.0.0.1", "admin")
            .port(2222)
            .password("hunter2");

        assert_eq!(config.socket_addr(), "10.0.0.1:2222");
        assert!(matches!(
            config.host_key_verification,
            HostKeyVerification::AcceptNew
        ));
        match &config.auth {
            AuthMethod::Password(p) => assert_eq!(p.expose_secret(), "hunter2"),
            other => panic!("unexpected auth {other:?}"),
        }
    }

    #[test]
    fn test_secret_not_in_debug() {
        let config = SshConfig::new("h", "u").password("hunter2");
        assert!(!format!("{config:?}").contains("hunter2"));
    }
}
