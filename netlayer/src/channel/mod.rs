//! Channel layer: prompt detection and the command/response stream.
//!
//! This module turns a raw byte [`Transport`](crate::transport::Transport)
//! into prompt-delimited exchanges, including ANSI stripping, echo removal
//! and pager handling.

mod buffer;
mod patterns;
mod stream;

pub use buffer::LineBuffer;
pub use patterns::{PromptMatcher, PromptPattern, PromptPatternBuilder};
pub use stream::{Boundary, Reply, SessionStream, StreamConfig};
