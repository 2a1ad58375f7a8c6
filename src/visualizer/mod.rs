// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Visualization tools: skeleton topology, identity colors and the preview window.

/// Color definitions and identity colors.
pub mod color;

/// Joint names and bone topology.
pub mod skeleton;

#[cfg(feature = "visualize")]
pub mod viewer;

pub use color::{Color, MARKER_COLOR};
pub use skeleton::{JOINT_NAMES, NUM_JOINTS, SKELETON};

#[cfg(feature = "visualize")]
pub use viewer::Viewer;
