//! The caller-facing session.

use std::future::Future;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use super::machine::ModeStateMachine;
use super::response::Response;
use super::shared::SharedSession;
use crate::channel::{PromptPattern, SessionStream};
use crate::error::{ChannelError, Result};
use crate::platform::{DeviceProfile, Mode};
use crate::transport::Transport;

/// An open CLI session to one device.
///
/// Commands can require a mode; the session moves there first, then runs the
/// command and records the mode the trailing prompt shows. Create one with
/// [`SessionBuilder`](super::SessionBuilder).
pub struct Session<T> {
    profile: DeviceProfile,
    stream: SessionStream<T>,
    machine: ModeStateMachine,
}

impl<T: Transport> Session<T> {
    pub(crate) fn new(
        profile: DeviceProfile,
        stream: SessionStream<T>,
        machine: ModeStateMachine,
    ) -> Self {
        Self {
            profile,
            stream,
            machine,
        }
    }

    /// Run a command, first moving to `mode` if one is given.
    ///
    /// Transition errors are returned unchanged and the command is not sent.
    /// If the trailing prompt matches no mode the output is still returned,
    /// with `mode: None`, and the session's mode becomes unknown.
    pub async fn run(&mut self, command: &str, mode: Option<&str>) -> Result<Response> {
        if let Some(name) = mode {
            let target = self.machine.graph().mode(name)?;
            self.machine.transition_to(&mut self.stream, &target).await?;
        }

        // A command counts as run once it may have been written, even if
        // its reply never arrives.
        if let Some(ran_in) = self.machine.current().cloned() {
            self.machine.record_command(&ran_in);
        }
        self.machine.mark_unknown();

        let start = Instant::now();
        let reply = self.stream.send(command).await?;
        let elapsed = start.elapsed();

        let mode = match self.machine.observe(&reply.prompt) {
            Ok(mode) => Some(mode),
            Err(e) => {
                warn!("{} after {:?}; current mode is unknown", e, command);
                None
            }
        };

        let failure = self.machine.failure_in(&reply.output).map(str::to_string);
        let response = Response::from_reply(reply, mode, elapsed);
        match failure {
            Some(message) => {
                debug!("Command {:?} failed: {}", command, message);
                Ok(response.with_failure(message))
            }
            None => Ok(response),
        }
    }

    /// Run several commands in order, stopping at the first error.
    pub async fn run_many(&mut self, commands: &[&str], mode: Option<&str>) -> Result<Vec<Response>> {
        let mut responses = Vec::with_capacity(commands.len());
        for command in commands {
            responses.push(self.run(command, mode).await?);
        }
        Ok(responses)
    }

    /// Like [`run`](Self::run), abandoned as soon as `cancel` completes.
    ///
    /// A cancelled command leaves the mode unknown.
    pub async fn run_cancellable(
        &mut self,
        command: &str,
        mode: Option<&str>,
        cancel: impl Future<Output = ()> + Send,
    ) -> Result<Response> {
        tokio::select! {
            biased;
            _ = cancel => Err(ChannelError::Cancelled.into()),
            result = self.run(command, mode) => result,
        }
    }

    /// Move to the named mode.
    pub async fn transition_to(&mut self, mode: &str) -> Result<()> {
        let target = self.machine.graph().mode(mode)?;
        self.machine.transition_to(&mut self.stream, &target).await
    }

    /// The current mode, `None` if unknown.
    pub fn current_mode(&self) -> Option<&Mode> {
        self.machine.current()
    }

    /// Re-read the prompt and classify it.
    ///
    /// Required after a failed transition before the next one.
    pub async fn refresh_mode(&mut self) -> Result<Mode> {
        self.machine.mark_unknown();
        let reply = self.stream.send("").await?;
        let mode = self.machine.observe(&reply.prompt)?;
        debug!("Refreshed mode: {}", mode);
        Ok(mode)
    }

    /// Commit pending changes in the innermost transactional mode.
    ///
    /// Returns `false` if there was nothing to commit.
    pub async fn commit(&mut self) -> Result<bool> {
        self.machine.commit_current(&mut self.stream).await
    }

    /// Look up a mode by name.
    pub fn mode(&self, name: &str) -> Result<Mode> {
        self.machine.graph().mode(name)
    }

    /// All modes in rank order.
    pub fn modes(&self) -> &[Mode] {
        self.machine.graph().modes()
    }

    /// The device profile.
    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    /// The prompt pattern derived at setup.
    pub fn prompt_pattern(&self) -> Option<&PromptPattern> {
        self.stream.prompt_pattern()
    }

    /// True while a command is in flight.
    pub fn is_busy(&self) -> bool {
        self.stream.is_busy()
    }

    /// Set the default timeout for user commands.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.stream.set_timeout(timeout);
    }

    /// Wrap the session for use from several tasks.
    pub fn into_shared(self) -> SharedSession<T> {
        SharedSession::new(self)
    }

    /// Unwind to the default mode and close the transport.
    ///
    /// Dirty transactional layers are committed on the way out. Unwind
    /// failures are logged, only the transport close error is returned.
    pub async fn close(mut self) -> Result<()> {
        self.shutdown().await
    }

    pub(crate) async fn shutdown(&mut self) -> Result<()> {
        if self.machine.current().is_none() {
            if let Err(e) = self.refresh_mode().await {
                warn!("Cannot determine mode before closing: {}", e);
            }
        }

        if self.machine.current().is_some() {
            let root = self.machine.graph().root().clone();
            if let Err(e) = self.machine.transition_to(&mut self.stream, &root).await {
                warn!("Unwind to {} before closing failed: {}", root, e);
            }
        }

        info!("Closing session to {}", self.profile.name);
        self.stream.close().await
    }
}
