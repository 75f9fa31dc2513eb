//! Cisco-like device profile (IOS, IOS-XE, EOS and look-alikes).
//!
//! # Prompt Examples
//!
//! ```text
//! router1>                  # unprivilege_exec
//! router1#                  # privilege_exec
//! router1(config)#          # config_mode
//! router1(config-if)#       # config_mode (sub-context)
//! ```
//!
//! # Layers
//!
//! ```text
//! ┌──────────────────┐  enable  ┌────────────────┐  conf t  ┌─────────────┐
//! │ unprivilege_exec ├──────────► privilege_exec ├──────────► config_mode │
//! │        >         │ disable  │       #        │   end    │     )#      │
//! └──────────────────┘◄─────────┴────────────────┘◄─────────┴─────────────┘
//! ```

use regex::bytes::Regex;

use crate::platform::{DeviceProfile, Layer, Marker, Pager};

/// Profile name.
pub const PROFILE_NAME: &str = "cisco_like";

/// Create the cisco-like profile.
pub fn profile() -> DeviceProfile {
    let unprivilege = Layer::new("unprivilege_exec", Marker::contains(">"));

    let privilege = Layer::new("privilege_exec", Marker::contains("#"))
        .with_enter("enable")
        .with_exit("disable");

    let config = Layer::new("config_mode", Marker::contains(")#"))
        .with_enter("conf t")
        .with_exit("end");

    DeviceProfile::new(PROFILE_NAME)
        .with_layer(unprivilege)
        .with_layer(privilege)
        .with_layer(config)
        .with_delimiters(&['>', '#'])
        .with_paging_command("term len 0")
        .with_pager(Pager::new(r"-+\s?[Mm]ore\s?-+", " ").unwrap())
        .with_failure_pattern("% Invalid input")
        .with_failure_pattern("% Incomplete command")
        .with_failure_pattern("% Ambiguous command")
}

/// Cisco-like profile whose `enable` asks for a password.
pub fn profile_with_enable_secret() -> DeviceProfile {
    let mut profile = profile();
    if let Some(layer) = profile.layers.get_mut("privilege_exec") {
        layer.auth_prompt = Some(Regex::new(r"[Pp]assword:\s*$").unwrap());
    }
    profile
}
