//! Mode classification from prompt text.

use super::layer::Marker;
use super::mode::Mode;
use crate::error::{DriverError, Result};

/// Determines a session's mode from its prompt.
///
/// Markers are tested in the order given, which must be deepest mode first:
/// a deeper prompt such as `host(config)#` also contains the shallower `#`
/// marker, and the first match wins.
#[derive(Debug, Clone)]
pub struct ModeClassifier {
    entries: Vec<(Mode, Marker)>,
}

impl ModeClassifier {
    /// Create a classifier from (mode, marker) pairs, deepest first.
    pub fn new(entries: Vec<(Mode, Marker)>) -> Self {
        Self { entries }
    }

    /// Create a classifier from pairs in any order, sorting deepest first.
    pub fn by_rank(mut entries: Vec<(Mode, Marker)>) -> Self {
        entries.sort_by(|a, b| b.0.rank().cmp(&a.0.rank()));
        Self { entries }
    }

    /// Classify a prompt.
    pub fn classify(&self, prompt: &str) -> Result<Mode> {
        self.entries
            .iter()
            .find(|(_, marker)| marker.matches(prompt))
            .map(|(mode, _)| mode.clone())
            .ok_or_else(|| {
                DriverError::UnknownMode {
                    prompt: prompt.to_string(),
                }
                .into()
            })
    }

    /// The (mode, marker) pairs in test order.
    pub fn entries(&self) -> &[(Mode, Marker)] {
        &self.entries
    }
}
