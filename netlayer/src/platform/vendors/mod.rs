//! Ready-made device profiles.
//!
//! Profiles are plain data: copy one and adjust it, or load your own from a
//! [`ProfileSpec`](crate::platform::ProfileSpec) document.

pub mod cisco_like;
pub mod juniper_like;
