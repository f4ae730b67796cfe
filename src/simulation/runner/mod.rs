//! Runner module containing runner behavior and perception systems.

#[allow(clippy::module_inception)]
mod runner;
mod perception;
mod proprioception;
mod sense;
mod vision;

// Re-export everything from the runner module
pub use runner::*;

// Re-export perception system components
pub use perception::Perception;
pub use proprioception::{Proprioception, heading_signal};
pub use sense::Sense;
pub use vision::Vision;
