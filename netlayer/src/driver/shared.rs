//! Session handle shared between tasks.

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

use super::response::Response;
use super::session::Session;
use crate::error::Result;
use crate::platform::Mode;
use crate::transport::Transport;

/// Cloneable handle to one [`Session`].
///
/// Callers queue on an async mutex, so commands from different tasks never
/// interleave on the wire and each sees the mode left by the previous one.
pub struct SharedSession<T> {
    inner: Arc<Mutex<Session<T>>>,
}

impl<T> Clone for SharedSession<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Transport> SharedSession<T> {
    /// Wrap a session.
    pub fn new(session: Session<T>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    /// See [`Session::run`].
    pub async fn run(&self, command: &str, mode: Option<&str>) -> Result<Response> {
        self.inner.lock().await.run(command, mode).await
    }

    /// See [`Session::run_many`].
    pub async fn run_many(&self, commands: &[&str], mode: Option<&str>) -> Result<Vec<Response>> {
        self.inner.lock().await.run_many(commands, mode).await
    }

    /// See [`Session::transition_to`].
    pub async fn transition_to(&self, mode: &str) -> Result<()> {
        self.inner.lock().await.transition_to(mode).await
    }

    /// See [`Session::current_mode`].
    pub async fn current_mode(&self) -> Option<Mode> {
        self.inner.lock().await.current_mode().cloned()
    }

    /// See [`Session::refresh_mode`].
    pub async fn refresh_mode(&self) -> Result<Mode> {
        self.inner.lock().await.refresh_mode().await
    }

    /// See [`Session::commit`].
    pub async fn commit(&self) -> Result<bool> {
        self.inner.lock().await.commit().await
    }

    /// Hold the session for a sequence of calls no other task may split.
    pub async fn lock(&self) -> MutexGuard<'_, Session<T>> {
        self.inner.lock().await
    }

    /// Unwind and close the session. Later calls on any clone fail.
    pub async fn close(&self) -> Result<()> {
        self.inner.lock().await.shutdown().await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::driver::SessionBuilder;
    use crate::platform::vendors::cisco_like;
    use crate::testing::FakeDevice;

    async fn shared(device: &FakeDevice) -> SharedSession<FakeDevice> {
        SessionBuilder::new(cisco_like::profile())
            .timeout(Duration::from_secs(2))
            .open(device.clone())
            .await
            .unwrap()
            .into_shared()
    }

    #[tokio::test]
    async fn test_concurrent_callers_are_serialised() {
        let device = FakeDevice::cisco("r1")
            .with_output("show clock", "12:00")
            .with_output("show users", "vty 0");
        let session = shared(&device).await;
        device.clear_writes();

        let a = {
            let session = session.clone();
            tokio::spawn(async move { session.run("show clock", Some("privilege_exec")).await })
        };
        let b = {
            let session = session.clone();
            tokio::spawn(async move { session.run("show users", Some("unprivilege_exec")).await })
        };

        let a = a.await.unwrap().unwrap();
        let b = b.await.unwrap().unwrap();
        assert_eq!(a.result, "12:00");
        assert_eq!(a.mode.unwrap(), "privilege_exec");
        assert_eq!(b.result, "vty 0");
        assert_eq!(b.mode.unwrap(), "unprivilege_exec");
    }

    #[tokio::test]
    async fn test_lock_holds_sequence() {
        let device = FakeDevice::cisco("r1");
        let session = shared(&device).await;

        {
            let mut guard = session.lock().await;
            guard.transition_to("config_mode").await.unwrap();
            assert_eq!(guard.current_mode().unwrap(), "config_mode");
        }
        assert_eq!(session.current_mode().await.unwrap(), "config_mode");

        session.close().await.unwrap();
        assert!(device.state().closed_by_client);
        assert!(session.run("show clock", None).await.is_err());
    }
}
