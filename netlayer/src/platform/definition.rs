//! Device profile: the vendor-specific data a session is configured with.

use indexmap::IndexMap;
use regex::bytes::Regex;

use super::layer::Layer;
use crate::error::{PlatformError, Result};

/// Pager handling for devices that paginate despite the paging command.
#[derive(Debug, Clone)]
pub struct Pager {
    /// Trailing-line pattern of the pager banner (e.g. `--More--`).
    pub pattern: Regex,

    /// Text written to advance the pager, sent without a line ending.
    pub response: String,
}

impl Pager {
    /// Create a pager definition.
    pub fn new(pattern: &str, response: impl Into<String>) -> std::result::Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            response: response.into(),
        })
    }
}

/// Everything vendor-specific about a device: its layers in rank order,
/// prompt delimiters and session setup commands.
#[derive(Debug, Clone)]
pub struct DeviceProfile {
    /// Profile name (e.g., "cisco_like").
    pub name: String,

    /// Layers in rank order; the first is the rank-0 mode.
    pub layers: IndexMap<String, Layer>,

    /// Characters that close a prompt (e.g. `>` and `#`).
    pub delimiters: Vec<char>,

    /// Command issued once at session start to disable output paging.
    pub paging_command: Option<String>,

    /// Pager banner handling.
    pub pager: Option<Pager>,

    /// Substrings that mark a command's output as failed.
    pub failed_when_contains: Vec<String>,

    /// Line terminator appended to every command.
    pub line_ending: String,

    /// Layer names added more than once; each would otherwise replace the
    /// earlier layer and lose a rank.
    duplicates: Vec<String>,
}

impl DeviceProfile {
    /// Create a new profile with minimal required fields.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            layers: IndexMap::new(),
            delimiters: vec!['>', '#'],
            paging_command: None,
            pager: None,
            failed_when_contains: vec![],
            line_ending: "\n".to_string(),
            duplicates: vec![],
        }
    }

    /// Add a layer at the next rank.
    ///
    /// Reusing a name is reported by [`validate`](Self::validate).
    pub fn with_layer(mut self, layer: Layer) -> Self {
        if self.layers.contains_key(&layer.name) {
            self.duplicates.push(layer.name.clone());
        } else {
            self.layers.insert(layer.name.clone(), layer);
        }
        self
    }

    /// Set the prompt delimiters.
    pub fn with_delimiters(mut self, delimiters: &[char]) -> Self {
        self.delimiters = delimiters.to_vec();
        self
    }

    /// Set the paging-disable command.
    pub fn with_paging_command(mut self, command: impl Into<String>) -> Self {
        self.paging_command = Some(command.into());
        self
    }

    /// Set pager handling.
    pub fn with_pager(mut self, pager: Pager) -> Self {
        self.pager = Some(pager);
        self
    }

    /// Add a failure pattern.
    pub fn with_failure_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.failed_when_contains.push(pattern.into());
        self
    }

    /// Set the line terminator.
    pub fn with_line_ending(mut self, line_ending: impl Into<String>) -> Self {
        self.line_ending = line_ending.into();
        self
    }

    /// Get a layer by name.
    pub fn get_layer(&self, name: &str) -> Option<&Layer> {
        self.layers.get(name)
    }

    /// Check the profile's structural invariants.
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| -> crate::Error {
            PlatformError::InvalidDefinition { message }.into()
        };

        if self.delimiters.is_empty() {
            return Err(invalid(format!("profile '{}' has no prompt delimiters", self.name)));
        }

        if let Some(name) = self.duplicates.first() {
            return Err(invalid(format!("layer '{name}' is defined more than once")));
        }
        if let Some((key, layer)) = self.layers.iter().find(|(key, layer)| **key != layer.name) {
            return Err(invalid(format!(
                "layer '{}' is registered under the name '{}'",
                layer.name, key
            )));
        }

        let Some((_, root)) = self.layers.first() else {
            return Err(invalid(format!("profile '{}' has no layers", self.name)));
        };
        if !root.enter.is_empty() || !root.exit.is_empty() || root.parent.is_some() {
            return Err(invalid(format!(
                "root layer '{}' must have no enter/exit commands and no parent",
                root.name
            )));
        }

        for (rank, layer) in self.layers.values().enumerate() {
            if layer.transactional != !layer.commit.is_empty() {
                return Err(invalid(format!(
                    "layer '{}' needs commit commands iff it is transactional",
                    layer.name
                )));
            }
            if rank == 0 {
                continue;
            }
            if layer.enter.is_empty() || layer.exit.is_empty() {
                return Err(invalid(format!(
                    "layer '{}' needs both enter and exit commands",
                    layer.name
                )));
            }
            if let Some(ref parent) = layer.parent {
                match self.layers.get_index_of(parent) {
                    Some(parent_rank) if parent_rank < rank => {}
                    Some(_) => {
                        return Err(invalid(format!(
                            "layer '{}' must be defined after its parent '{}'",
                            layer.name, parent
                        )));
                    }
                    None => {
                        return Err(invalid(format!(
                            "layer '{}' has unknown parent '{}'",
                            layer.name, parent
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}
