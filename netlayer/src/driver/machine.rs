//! Mode tracking and transitions.

use std::collections::HashMap;
use std::time::Duration;

use log::{debug, info};
use secrecy::{ExposeSecret, SecretString};

use super::graph::{Direction, LayerGraph, Step};
use crate::channel::{Boundary, SessionStream};
use crate::error::{DriverError, Result};
use crate::platform::{Layer, Mode, ModeClassifier};
use crate::transport::Transport;

/// Tracks the session's current mode and moves it between layers.
///
/// The current mode is `None` whenever it has not been confirmed by a
/// prompt: before the first prompt, while a transition step is in flight,
/// and after any failed or cancelled step. It is only ever set from a prompt
/// that classified as the expected mode.
#[derive(Debug)]
pub struct ModeStateMachine {
    graph: LayerGraph,
    classifier: ModeClassifier,
    current: Option<Mode>,
    /// Per-rank "changes not yet committed" flags.
    uncommitted: Vec<bool>,
    /// Secrets for layers with an auth prompt, keyed by mode name.
    secrets: HashMap<String, SecretString>,
    transition_timeout: Duration,
    failed_when_contains: Vec<String>,
}

impl ModeStateMachine {
    /// Create a state machine with no known mode.
    pub fn new(
        graph: LayerGraph,
        secrets: HashMap<String, SecretString>,
        transition_timeout: Duration,
        failed_when_contains: Vec<String>,
    ) -> Self {
        let classifier = graph.classifier();
        let uncommitted = vec![false; graph.modes().len()];
        Self {
            graph,
            classifier,
            current: None,
            uncommitted,
            secrets,
            transition_timeout,
            failed_when_contains,
        }
    }

    /// The layer graph.
    pub fn graph(&self) -> &LayerGraph {
        &self.graph
    }

    /// The confirmed current mode, `None` if unknown.
    pub fn current(&self) -> Option<&Mode> {
        self.current.as_ref()
    }

    /// Forget the current mode.
    pub fn mark_unknown(&mut self) {
        self.current = None;
    }

    /// Classify a prompt and adopt the result as the current mode.
    ///
    /// An unrecognised prompt leaves the mode unknown.
    pub fn observe(&mut self, prompt: &str) -> Result<Mode> {
        match self.classifier.classify(prompt) {
            Ok(mode) => {
                self.current = Some(mode.clone());
                Ok(mode)
            }
            Err(e) => {
                self.current = None;
                Err(e)
            }
        }
    }

    /// Note that a user command ran in `mode`, which may have changed the
    /// candidate configuration of every transactional layer on its chain.
    pub fn record_command(&mut self, mode: &Mode) {
        for rank in self.graph.chain(mode.rank()) {
            if self.graph.layer(rank).is_some_and(|layer| layer.transactional) {
                self.uncommitted[rank] = true;
            }
        }
    }

    /// True if the layer at `rank` has uncommitted changes.
    pub fn is_dirty(&self, rank: usize) -> bool {
        self.uncommitted.get(rank).copied().unwrap_or(false)
    }

    /// First configured failure substring found in `output`.
    pub fn failure_in(&self, output: &str) -> Option<&str> {
        self.failed_when_contains
            .iter()
            .find(|pattern| output.contains(pattern.as_str()))
            .map(String::as_str)
    }

    /// Move the session to `target`.
    ///
    /// Zero writes if already there. Fails with
    /// [`ModeUnknown`](DriverError::ModeUnknown) if the current mode is not
    /// known; the caller must refresh it first.
    pub async fn transition_to<T: Transport>(
        &mut self,
        stream: &mut SessionStream<T>,
        target: &Mode,
    ) -> Result<()> {
        let Some(current) = self.current.clone() else {
            return Err(DriverError::ModeUnknown.into());
        };
        if current == *target {
            return Ok(());
        }

        let steps = self.graph.plan(&current, target);
        info!(
            "Transition {} -> {} ({} step(s))",
            current,
            target,
            steps.len()
        );

        for step in &steps {
            self.run_step(stream, step).await?;
        }
        Ok(())
    }

    /// Commit the innermost transactional layer on the current chain.
    ///
    /// Returns `false` without writing anything when there is no such layer
    /// or it has nothing to commit.
    pub async fn commit_current<T: Transport>(
        &mut self,
        stream: &mut SessionStream<T>,
    ) -> Result<bool> {
        let Some(current) = self.current.clone() else {
            return Err(DriverError::ModeUnknown.into());
        };

        let innermost = self
            .graph
            .chain(current.rank())
            .into_iter()
            .rev()
            .find(|&rank| self.graph.layer(rank).is_some_and(|layer| layer.transactional));

        match innermost {
            Some(rank) if self.uncommitted[rank] => {
                self.commit_layer(stream, rank, current).await?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn layer(&self, rank: usize) -> Result<Layer> {
        self.graph.layer(rank).cloned().ok_or_else(|| {
            DriverError::NoSuchMode {
                name: format!("rank {rank}"),
            }
            .into()
        })
    }

    async fn run_step<T: Transport>(
        &mut self,
        stream: &mut SessionStream<T>,
        step: &Step,
    ) -> Result<()> {
        let layer = self.layer(step.layer)?;

        if step.direction == Direction::Exit && layer.transactional && self.uncommitted[step.layer] {
            let mode = self.graph.mode(&layer.name)?;
            self.commit_layer(stream, step.layer, mode).await?;
        }

        let timeout = layer.timeout.unwrap_or(self.transition_timeout);
        let commands = match step.direction {
            Direction::Enter => &layer.enter,
            Direction::Exit => &layer.exit,
        };
        debug!("{:?} {} via {:?}", step.direction, layer.name, commands);

        self.current = None;
        let mut prompt = String::new();
        for command in commands {
            let reply = match (step.direction, &layer.auth_prompt) {
                (Direction::Enter, Some(auth)) => {
                    let reply = stream.send_expecting(command, auth, timeout).await?;
                    if reply.boundary == Boundary::Expect {
                        let secret =
                            self.secrets
                                .get(&layer.name)
                                .ok_or_else(|| DriverError::MissingSecret {
                                    mode: layer.name.clone(),
                                })?;
                        stream.send_hidden(secret.expose_secret(), timeout).await?
                    } else {
                        reply
                    }
                }
                _ => stream.send_with_timeout(command, timeout).await?,
            };
            prompt = reply.prompt;
        }

        self.verify(&step.expected, &prompt)?;
        if step.direction == Direction::Enter {
            self.uncommitted[step.layer] = false;
        }
        Ok(())
    }

    async fn commit_layer<T: Transport>(
        &mut self,
        stream: &mut SessionStream<T>,
        rank: usize,
        expected: Mode,
    ) -> Result<()> {
        let layer = self.layer(rank)?;
        let timeout = layer.timeout.unwrap_or(self.transition_timeout);
        info!("Committing {}", layer.name);

        self.current = None;
        let mut prompt = String::new();
        let mut failure = None;
        for command in &layer.commit {
            let reply = stream.send_with_timeout(command, timeout).await?;
            if failure.is_none() {
                failure = self.failure_in(&reply.output).map(|_| reply.output.clone());
            }
            prompt = reply.prompt;
        }

        self.verify(&expected, &prompt)?;
        if let Some(message) = failure {
            return Err(DriverError::CommitFailed {
                mode: layer.name,
                message,
            }
            .into());
        }

        self.uncommitted[rank] = false;
        Ok(())
    }

    /// Adopt `expected` as current only if `prompt` classifies as it.
    fn verify(&mut self, expected: &Mode, prompt: &str) -> Result<()> {
        let observed = self.observe(prompt)?;
        if observed != *expected {
            self.current = None;
            return Err(DriverError::Transition {
                expected: expected.name().to_string(),
                observed: observed.name().to_string(),
            }
            .into());
        }
        Ok(())
    }
}
