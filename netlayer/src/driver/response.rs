//! Response type for command execution results.

use std::time::Duration;

use crate::channel::Reply;
use crate::platform::Mode;

/// Response from a command execution.
#[derive(Debug, Clone)]
pub struct Response {
    /// The command that was executed.
    pub command: String,

    /// The command output (normalized - command echo and trailing prompt removed).
    pub result: String,

    /// The raw output before normalization.
    pub raw_result: String,

    /// The prompt that was matched at the end.
    pub prompt: String,

    /// Mode the trailing prompt classified as, `None` if unrecognised.
    pub mode: Option<Mode>,

    /// Time taken to execute the command.
    pub elapsed: Duration,

    /// Failure message if the command failed (based on failure patterns).
    pub failure_message: Option<String>,
}

impl Response {
    /// Build a response from a stream reply.
    pub(crate) fn from_reply(reply: Reply, mode: Option<Mode>, elapsed: Duration) -> Self {
        Self {
            command: reply.command,
            result: reply.output,
            raw_result: reply.raw,
            prompt: reply.prompt,
            mode,
            elapsed,
            failure_message: None,
        }
    }

    /// Attach a failure message.
    pub(crate) fn with_failure(mut self, message: impl Into<String>) -> Self {
        self.failure_message = Some(message.into());
        self
    }

    /// Check if the response indicates success.
    pub fn is_success(&self) -> bool {
        self.failure_message.is_none()
    }

    /// Get the result lines as an iterator.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.result.lines()
    }

    /// Check if the result contains a substring.
    pub fn contains(&self, pattern: &str) -> bool {
        self.result.contains(pattern)
    }
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.result)
    }
}
