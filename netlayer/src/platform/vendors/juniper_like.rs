//! Juniper-like device profile, with a transactional configuration layer.
//!
//! ```text
//! admin@vmx1>               # operational
//! [edit]
//! admin@vmx1#               # configuration
//! ```
//!
//! Leaving `configuration` with uncommitted changes sends `commit` first.

use std::time::Duration;

use crate::platform::{DeviceProfile, Layer, Marker, Pager};

/// Profile name.
pub const PROFILE_NAME: &str = "juniper_like";

/// Create the juniper-like profile.
pub fn profile() -> DeviceProfile {
    let operational = Layer::new("operational", Marker::contains(">"));

    let configuration = Layer::new("configuration", Marker::contains("#"))
        .with_enter("configure")
        .with_exit("exit configuration-mode")
        .with_commit("commit")
        .with_timeout(Duration::from_secs(120));

    DeviceProfile::new(PROFILE_NAME)
        .with_layer(operational)
        .with_layer(configuration)
        .with_delimiters(&['>', '#'])
        .with_paging_command("set cli screen-length 0")
        .with_pager(Pager::new(r"---\(more( \d+%)?\)---", " ").unwrap())
        .with_failure_pattern("error:")
        .with_failure_pattern("unknown command")
        .with_failure_pattern("syntax error")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_juniper_like_profile() {
        let profile = profile();
        profile.validate().unwrap();

        let config = profile.get_layer("configuration").unwrap();
        assert!(config.transactional);
        assert_eq!(config.commit, vec!["commit"]);
        assert!(config.marker.matches("admin@vmx1#"));
        assert!(!config.marker.matches("admin@vmx1>"));
    }

    #[test]
    fn test_pager_pattern() {
        let pager = profile().pager.unwrap();
        assert!(pager.pattern.is_match(b"---(more)---"));
        assert!(pager.pattern.is_match(b"---(more 42%)---"));
    }
}
