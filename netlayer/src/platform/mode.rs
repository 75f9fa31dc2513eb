//! Mode identifiers.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// A privilege/configuration level of a device session.
///
/// Modes are ordered by rank: rank 0 is the default mode after login, higher
/// ranks are deeper. They are created once when a session is configured and
/// never change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Mode {
    rank: usize,
    name: Arc<str>,
}

impl Mode {
    pub(crate) fn new(rank: usize, name: &str) -> Self {
        Self {
            rank,
            name: Arc::from(name),
        }
    }

    /// Position in the profile, 0 for the default mode.
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Mode name as configured in the profile.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True for the rank-0 mode.
    pub fn is_root(&self) -> bool {
        self.rank == 0
    }
}

impl PartialOrd for Mode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Mode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank
            .cmp(&other.rank)
            .then_with(|| self.name.cmp(&other.name))
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl PartialEq<str> for Mode {
    fn eq(&self, other: &str) -> bool {
        &*self.name == other
    }
}

impl PartialEq<&str> for Mode {
    fn eq(&self, other: &&str) -> bool {
        &*self.name == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_by_rank() {
        let exec = Mode::new(0, "exec");
        let config = Mode::new(2, "config");
        let privileged = Mode::new(1, "privileged");

        let mut modes = vec![config.clone(), exec.clone(), privileged.clone()];
        modes.sort();
        assert_eq!(modes, vec![exec.clone(), privileged, config]);
        assert!(exec.is_root());
        assert_eq!(exec, "exec");
        assert_eq!(exec.to_string(), "exec");
    }
}
