//! Device profiles: modes, layers and prompt markers.
//!
//! Everything vendor-specific is data in a [`DeviceProfile`]; the state
//! machine in [`crate::driver`] is the same for every device.

mod classifier;
mod definition;
mod layer;
mod mode;
mod spec;
pub mod vendors;

pub use classifier::ModeClassifier;
pub use definition::{DeviceProfile, Pager};
pub use layer::{Layer, Marker};
pub use mode::Mode;
pub use spec::{LayerSpec, MarkerSpec, PagerSpec, ProfileSpec};
