//! Layer hierarchy and transition planning.

use crate::error::{DriverError, Result};
use crate::platform::{DeviceProfile, Layer, Mode, ModeClassifier};

/// Direction of one transition step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Run the layer's enter commands from its parent.
    Enter,
    /// Run the layer's exit commands back to its parent.
    Exit,
}

/// One hop between adjacent modes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// Enter or exit.
    pub direction: Direction,
    /// Rank of the layer whose commands are sent.
    pub layer: usize,
    /// Mode the prompt must classify as afterwards.
    pub expected: Mode,
}

/// The profile's layers as a tree rooted at rank 0.
///
/// Each layer's parent defaults to the layer defined just before it, so a
/// profile without explicit parents is a linear hierarchy.
#[derive(Debug, Clone)]
pub struct LayerGraph {
    layers: Vec<Layer>,
    modes: Vec<Mode>,
    parents: Vec<Option<usize>>,
}

impl LayerGraph {
    /// Build the graph from a profile, validating it first.
    pub fn new(profile: &DeviceProfile) -> Result<Self> {
        profile.validate()?;

        let mut layers = Vec::with_capacity(profile.layers.len());
        let mut modes = Vec::with_capacity(profile.layers.len());
        let mut parents = Vec::with_capacity(profile.layers.len());

        for (rank, layer) in profile.layers.values().enumerate() {
            let parent = match (rank, &layer.parent) {
                (0, _) => None,
                (_, Some(name)) => profile.layers.get_index_of(name),
                (_, None) => Some(rank - 1),
            };
            modes.push(Mode::new(rank, &layer.name));
            parents.push(parent);
            layers.push(layer.clone());
        }

        Ok(Self {
            layers,
            modes,
            parents,
        })
    }

    /// Look up a mode by name.
    pub fn mode(&self, name: &str) -> Result<Mode> {
        self.modes
            .iter()
            .find(|mode| *mode == name)
            .cloned()
            .ok_or_else(|| {
                DriverError::NoSuchMode {
                    name: name.to_string(),
                }
                .into()
            })
    }

    /// The mode at `rank`.
    pub fn mode_at(&self, rank: usize) -> Option<&Mode> {
        self.modes.get(rank)
    }

    /// The rank-0 mode.
    pub fn root(&self) -> &Mode {
        &self.modes[0]
    }

    /// The layer bound to `rank`.
    pub fn layer(&self, rank: usize) -> Option<&Layer> {
        self.layers.get(rank)
    }

    /// All modes in rank order.
    pub fn modes(&self) -> &[Mode] {
        &self.modes
    }

    /// Ranks from the root down to `rank`, inclusive.
    pub fn chain(&self, rank: usize) -> Vec<usize> {
        let mut chain = vec![];
        let mut cursor = Some(rank);
        while let Some(r) = cursor {
            chain.push(r);
            cursor = self.parents.get(r).copied().flatten();
        }
        chain.reverse();
        chain
    }

    /// Plan the steps from `from` to `to`: exit up to the lowest common
    /// ancestor, then enter down to the target.
    pub fn plan(&self, from: &Mode, to: &Mode) -> Vec<Step> {
        let up = self.chain(from.rank());
        let down = self.chain(to.rank());
        let shared = up
            .iter()
            .zip(down.iter())
            .take_while(|(a, b)| a == b)
            .count();

        let exits = up[shared..].iter().rev().map(|&rank| Step {
            direction: Direction::Exit,
            layer: rank,
            expected: self.parent_mode(rank),
        });
        let enters = down[shared..].iter().map(|&rank| Step {
            direction: Direction::Enter,
            layer: rank,
            expected: self.modes[rank].clone(),
        });

        exits.chain(enters).collect()
    }

    fn parent_mode(&self, rank: usize) -> Mode {
        let parent = self.parents[rank].unwrap_or(0);
        self.modes[parent].clone()
    }

    /// Classifier over every layer's marker, deepest rank first.
    pub fn classifier(&self) -> ModeClassifier {
        ModeClassifier::by_rank(
            self.modes
                .iter()
                .cloned()
                .zip(self.layers.iter().map(|layer| layer.marker.clone()))
                .collect(),
        )
    }
}
