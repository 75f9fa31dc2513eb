//! Mode-aware sessions on top of the channel layer.
//!
//! [`LayerGraph`] plans moves between a profile's layers,
//! [`ModeStateMachine`] carries them out and tracks the current mode, and
//! [`Session`] is the caller-facing entry point built by [`SessionBuilder`].

mod builder;
mod graph;
mod machine;
mod response;
mod session;
mod shared;

pub use builder::SessionBuilder;
pub use graph::{Direction, LayerGraph, Step};
pub use machine::ModeStateMachine;
pub use response::Response;
pub use session::Session;
pub use shared::SharedSession;
