// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Tracking run configuration.
//!
//! [`TrackerConfig`] controls which subjects are followed, where artifacts land and
//! which optional outputs (preview window, video sink) are produced.

use std::path::PathBuf;

use crate::continuity::TrackingMode;
use crate::detector::TrackParams;
use crate::error::{Result, TrackError};
use crate::pose::Identity;

/// Configuration for a tracking run.
///
/// # Example
///
/// ```rust
/// use pose_trail::TrackerConfig;
///
/// let config = TrackerConfig::new()
///     .with_target(1)
///     .with_output_dir("results")
///     .with_save_video(false);
/// ```
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Single-subject or multi-subject tracking.
    pub mode: TrackingMode,
    /// Directory for trace files and the output video.
    pub output_dir: PathBuf,
    /// Show annotated frames in a window while processing.
    pub show_preview: bool,
    /// Write annotated frames to the video sink.
    pub save_video: bool,
    /// Frame rate assumed for image sequences, which carry none.
    pub fallback_fps: f32,
    /// Parameters forwarded to the detector.
    pub params: TrackParams,
    /// Log every processed frame.
    pub verbose: bool,
    /// Mark and log the box anchor of the first detection in every frame.
    pub anchor: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            mode: TrackingMode::Multi,
            output_dir: PathBuf::from("results"),
            show_preview: false,
            save_video: true,
            fallback_fps: 30.0,
            params: TrackParams::default(),
            verbose: true,
            anchor: false,
        }
    }
}

impl TrackerConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tracking mode.
    #[must_use]
    pub const fn with_mode(mut self, mode: TrackingMode) -> Self {
        self.mode = mode;
        self
    }

    /// Follow a single identity.
    #[must_use]
    pub const fn with_target(mut self, target: i64) -> Self {
        self.mode = TrackingMode::Single {
            target: Identity(target),
        };
        self
    }

    /// Set the output directory.
    #[must_use]
    pub fn with_output_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Enable or disable the preview window.
    #[must_use]
    pub const fn with_show_preview(mut self, show: bool) -> Self {
        self.show_preview = show;
        self
    }

    /// Enable or disable the video sink.
    #[must_use]
    pub const fn with_save_video(mut self, save: bool) -> Self {
        self.save_video = save;
        self
    }

    /// Set the frame rate used for image sequences.
    #[must_use]
    pub const fn with_fps(mut self, fps: f32) -> Self {
        self.fallback_fps = fps;
        self
    }

    /// Set the detector parameters.
    #[must_use]
    pub const fn with_params(mut self, params: TrackParams) -> Self {
        self.params = params;
        self
    }

    /// Enable or disable per-frame logging.
    #[must_use]
    pub const fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Enable or disable box anchor tracking.
    #[must_use]
    pub const fn with_anchor(mut self, anchor: bool) -> Self {
        self.anchor = anchor;
        self
    }

    /// Check the configuration for values the pipeline cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::ConfigError`] for a non-positive frame rate, a confidence
    /// outside `[0, 1]` or an empty output directory.
    pub fn validate(&self) -> Result<()> {
        if !(self.fallback_fps.is_finite() && self.fallback_fps > 0.0) {
            return Err(TrackError::ConfigError(format!(
                "fps must be positive, got {}",
                self.fallback_fps
            )));
        }
        if !(0.0..=1.0).contains(&self.params.conf) {
            return Err(TrackError::ConfigError(format!(
                "conf must be within [0, 1], got {}",
                self.params.conf
            )));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(TrackError::ConfigError(
                "output directory must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
