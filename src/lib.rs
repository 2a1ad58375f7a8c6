// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

#![allow(clippy::multiple_crate_versions)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! # pose-trail
//!
//! Skeleton overlay and keypoint tracing for pose-tracked video. A pose tracker assigns
//! persistent identities to people; `pose-trail` draws their COCO 17-joint skeletons
//! onto each frame and records where every joint was, frame by frame.
//!
//! Two tracking modes are available:
//!
//! - **Single subject** - follow one identity. When it drops out of a frame its last
//!   known pose is drawn again and flagged as recovered, so the trace has no holes.
//! - **Multi subject** - draw every identity and keep a structured trace
//!   (`identity -> frame -> joint -> [x, y]`) of fresh detections only.
//!
//! ## Quick Start (Library)
//!
//! ```no_run
//! use pose_trail::{Pipeline, ReplayDetector, Source, TrackParams, TrackerConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let detector = ReplayDetector::from_path("tracks.json", TrackParams::default())?;
//!     let config = TrackerConfig::new().with_target(1).with_output_dir("results");
//!
//!     let summary = Pipeline::new(config, detector)?.run(Source::from("test_video.mp4"))?;
//!     println!("{} frames, {} recovered", summary.frames, summary.recovered);
//!     Ok(())
//! }
//! ```
//!
//! ## CLI Usage
//!
//! ```bash
//! # Follow identity 1, write results/coordinates.txt and results/frames.txt
//! pose-trail track --source test_video.mp4 --detections tracks.json --target 1
//!
//! # Every identity, structured trace in results/coordinates.json
//! pose-trail track -s frames/ -d tracks.json
//!
//! # Also mark the first person's box anchor, logged to results/tracked_coordinates.txt
//! pose-trail track -s test_video.mp4 -d tracks.json --anchor
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`pose`] | Keypoints, poses and identities |
//! | [`detector`] | [`PoseDetector`] trait and the JSON [`ReplayDetector`] |
//! | [`extract`] | Raw detector output to per-identity poses |
//! | [`continuity`] | Single/multi subject selection and recovery |
//! | [`annotate`] | Skeleton rendering |
//! | [`anchor`] | Box anchor point marking and `tracked_coordinates.txt` |
//! | [`trace`] | Flat and structured keypoint traces |
//! | [`source`] | Input frames ([`Source`], [`SourceIterator`]) |
//! | [`io`] | Annotated frame output |
//! | [`pipeline`] | Frame-by-frame orchestration |
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `visualize` | Real-time preview window (default) |
//! | `video` | Video decoding and MP4 output |

// Modules
pub mod anchor;
pub mod annotate;
pub mod cli;
pub mod config;
pub mod continuity;
pub mod detector;
pub mod error;
pub mod extract;
pub mod io;
pub mod pipeline;
pub mod pose;
pub mod source;
pub mod trace;
pub mod visualizer;

// Re-export main types for convenience
pub use anchor::{AnchorTraceWriter, anchor_point};
pub use config::TrackerConfig;
pub use continuity::{ContinuityEngine, Observation, SelectedPose, TrackState, TrackingMode};
pub use detector::{PoseDetector, ReplayDetector, TrackParams};
pub use error::{Result, TrackError};
pub use extract::{RawDetections, extract_poses};
pub use pipeline::{Pipeline, RunSummary};
pub use pose::{FramePoses, Identity, Keypoint, Pose};
pub use source::{Source, SourceIterator, SourceMeta, VideoInfo};
pub use trace::{FlatTraceWriter, StructuredTrace, TraceSink};
pub use visualizer::Color;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(VERSION.contains('.'));
    }

    #[test]
    fn test_name() {
        assert_eq!(NAME, "pose-trail");
    }
}
