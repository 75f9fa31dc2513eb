//! Serde representation of a [`DeviceProfile`].
//!
//! Lets vendor catalogs live in data files rather than code:
//!
//! ```json
//! {
//!   "name": "cisco_like",
//!   "delimiters": [">", "#"],
//!   "paging_command": "terminal length 0",
//!   "layers": [
//!     { "name": "exec", "marker": { "contains": ">" } },
//!     { "name": "privileged", "marker": { "contains": "#" },
//!       "enter": ["enable"], "exit": ["disable"] }
//!   ]
//! }
//! ```

use std::time::Duration;

use regex::bytes::Regex;
use serde::{Deserialize, Serialize};

use super::definition::{DeviceProfile, Pager};
use super::layer::{Layer, Marker};
use crate::error::{ChannelError, Error, Result};

/// Serializable marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerSpec {
    /// Substring marker.
    Contains(String),
    /// Regex marker.
    Regex(String),
}

/// Serializable pager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagerSpec {
    /// Banner regex.
    pub pattern: String,
    /// Text sent to advance.
    #[serde(default = "default_pager_response")]
    pub response: String,
}

/// Serializable layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub name: String,
    pub marker: MarkerSpec,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub enter: Vec<String>,
    #[serde(default)]
    pub exit: Vec<String>,
    #[serde(default)]
    pub commit: Vec<String>,
    #[serde(default)]
    pub auth_prompt: Option<String>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

/// Serializable device profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSpec {
    pub name: String,
    pub layers: Vec<LayerSpec>,
    #[serde(default = "default_delimiters")]
    pub delimiters: Vec<char>,
    #[serde(default)]
    pub paging_command: Option<String>,
    #[serde(default)]
    pub pager: Option<PagerSpec>,
    #[serde(default)]
    pub failed_when_contains: Vec<String>,
    #[serde(default = "default_line_ending")]
    pub line_ending: String,
}

fn default_delimiters() -> Vec<char> {
    vec!['>', '#']
}

fn default_line_ending() -> String {
    "\n".to_string()
}

fn default_pager_response() -> String {
    " ".to_string()
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| ChannelError::InvalidPattern(e).into())
}

impl TryFrom<LayerSpec> for Layer {
    type Error = Error;

    fn try_from(spec: LayerSpec) -> Result<Self> {
        let marker = match spec.marker {
            MarkerSpec::Contains(text) => Marker::Contains(text),
            MarkerSpec::Regex(pattern) => Marker::Pattern(compile(&pattern)?),
        };

        Ok(Layer {
            name: spec.name,
            marker,
            parent: spec.parent,
            enter: spec.enter,
            exit: spec.exit,
            transactional: !spec.commit.is_empty(),
            commit: spec.commit,
            auth_prompt: spec.auth_prompt.as_deref().map(compile).transpose()?,
            timeout: spec.timeout_ms.map(Duration::from_millis),
        })
    }
}

impl TryFrom<ProfileSpec> for DeviceProfile {
    type Error = Error;

    /// Convert and validate.
    fn try_from(spec: ProfileSpec) -> Result<Self> {
        let mut profile = DeviceProfile::new(spec.name)
            .with_delimiters(&spec.delimiters)
            .with_line_ending(spec.line_ending);
        profile.paging_command = spec.paging_command;
        profile.failed_when_contains = spec.failed_when_contains;

        if let Some(pager) = spec.pager {
            profile.pager = Some(Pager {
                pattern: compile(&pager.pattern)?,
                response: pager.response,
            });
        }

        for layer in spec.layers {
            profile = profile.with_layer(Layer::try_from(layer)?);
        }

        profile.validate()?;
        Ok(profile)
    }
}
