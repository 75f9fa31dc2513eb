//! Layer definition: how to reach, leave and commit one mode.

use std::time::Duration;

use regex::bytes::Regex;

/// Discriminating prompt fragment for one mode.
#[derive(Debug, Clone)]
pub enum Marker {
    /// Plain substring, e.g. `)#`.
    Contains(String),

    /// Regex fragment, e.g. `\(config[^)]*\)#`.
    Pattern(Regex),
}

impl Marker {
    /// Substring marker.
    pub fn contains(text: impl Into<String>) -> Self {
        Marker::Contains(text.into())
    }

    /// Regex marker.
    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Marker::Pattern(Regex::new(pattern)?))
    }

    /// Check the marker against prompt text.
    pub fn matches(&self, prompt: &str) -> bool {
        match self {
            Marker::Contains(text) => prompt.contains(text.as_str()),
            Marker::Pattern(re) => re.is_match(prompt.as_bytes()),
        }
    }
}

/// One reachable mode of a device.
///
/// The rank-0 layer (the mode a fresh login lands in) has no enter/exit
/// commands. Every other layer is entered from its parent (by default the
/// layer defined just before it) and exited back to it.
#[derive(Debug, Clone)]
pub struct Layer {
    /// Mode name (e.g., "exec", "privilege_exec", "configuration").
    pub name: String,

    /// Prompt marker identifying this mode.
    pub marker: Marker,

    /// Parent layer name. `None` means "the previous layer in the profile".
    pub parent: Option<String>,

    /// Commands sent, in order, to enter this layer from its parent.
    pub enter: Vec<String>,

    /// Commands sent, in order, to return to the parent.
    pub exit: Vec<String>,

    /// Whether changes made here need an explicit commit before exiting.
    pub transactional: bool,

    /// Commit commands, present iff `transactional`.
    pub commit: Vec<String>,

    /// Reply pattern that means entering wants a secret (e.g. `Password:`).
    pub auth_prompt: Option<Regex>,

    /// Timeout override for this layer's transition steps.
    pub timeout: Option<Duration>,
}

impl Layer {
    /// Create a layer with a marker and nothing else.
    pub fn new(name: impl Into<String>, marker: Marker) -> Self {
        Self {
            name: name.into(),
            marker,
            parent: None,
            enter: vec![],
            exit: vec![],
            transactional: false,
            commit: vec![],
            auth_prompt: None,
            timeout: None,
        }
    }

    /// Set the parent layer, for tree-shaped hierarchies.
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Append an enter command.
    pub fn with_enter(mut self, command: impl Into<String>) -> Self {
        self.enter.push(command.into());
        self
    }

    /// Append an exit command.
    pub fn with_exit(mut self, command: impl Into<String>) -> Self {
        self.exit.push(command.into());
        self
    }

    /// Mark the layer transactional and append a commit command.
    pub fn with_commit(mut self, command: impl Into<String>) -> Self {
        self.transactional = true;
        self.commit.push(command.into());
        self
    }

    /// Expect an authentication prompt when entering.
    pub fn with_auth(mut self, prompt_pattern: &str) -> Result<Self, regex::Error> {
        self.auth_prompt = Some(Regex::new(prompt_pattern)?);
        Ok(self)
    }

    /// Override the timeout for this layer's transition steps.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
