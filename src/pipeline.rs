// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Frame-by-frame tracking pipeline.
//!
//! Sequences `read -> detect -> extract -> select -> render -> trace -> sink -> preview`
//! over a whole source. Processing is strictly sequential: the recovery decision for a
//! frame depends on the state left by the previous one.

use std::collections::BTreeSet;
use std::fs;

use image::DynamicImage;

use crate::anchor::{AnchorTraceWriter, anchor_point, draw_anchor};
use crate::annotate::annotate_frame;
use crate::cli::logging::frame_progress;
use crate::config::TrackerConfig;
use crate::continuity::{ContinuityEngine, Observation, SelectedPose};
use crate::detector::PoseDetector;
use crate::error::{Result, TrackError};
use crate::extract::extract_poses;
use crate::io::FrameSink;
use crate::pose::Identity;
use crate::source::{Source, SourceIterator, VideoInfo};
use crate::trace::TraceSink;
use crate::{error, verbose, warn};

#[cfg(feature = "visualize")]
use crate::visualizer::Viewer;

/// Counters collected over a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Frames read from the source.
    pub frames: usize,
    /// Poses drawn from a fresh detection.
    pub observed: usize,
    /// Poses carried forward from the last known pose.
    pub recovered: usize,
    /// Frames skipped after a detector or extraction failure.
    pub skipped: usize,
    /// Identities drawn at least once.
    pub identities: BTreeSet<Identity>,
    /// Frames with a logged box anchor.
    pub anchors: usize,
    /// The run ended before the source was exhausted.
    pub stopped_early: bool,
}

impl RunSummary {
    fn count(&mut self, selections: &[SelectedPose]) {
        for sel in selections {
            match sel.observation {
                Observation::Observed => self.observed += 1,
                Observation::Recovered => self.recovered += 1,
            }
            self.identities.insert(sel.identity);
        }
    }
}

/// Optional live preview; a no-op unless the `visualize` feature is enabled.
struct Preview {
    #[cfg(feature = "visualize")]
    viewer: Option<Viewer>,
    #[cfg_attr(not(feature = "visualize"), allow(dead_code))]
    delay: std::time::Duration,
}

impl Preview {
    fn open(enabled: bool, info: VideoInfo) -> Result<Self> {
        #[cfg(feature = "visualize")]
        let viewer = if enabled {
            Some(Viewer::new(
                "pose-trail",
                info.width as usize,
                info.height as usize,
            )?)
        } else {
            None
        };

        #[cfg(not(feature = "visualize"))]
        if enabled {
            warn!("--show requires the 'visualize' feature; preview disabled.");
        }

        Ok(Self {
            #[cfg(feature = "visualize")]
            viewer,
            delay: info.frame_delay(),
        })
    }

    /// Returns `false` once the operator closes the preview.
    #[allow(clippy::unnecessary_wraps, clippy::unused_self)]
    fn show(&mut self, frame: &DynamicImage) -> Result<bool> {
        #[cfg(feature = "visualize")]
        if let Some(viewer) = &mut self.viewer {
            return viewer.show(frame, self.delay);
        }
        #[cfg(not(feature = "visualize"))]
        let _ = frame;
        Ok(true)
    }
}

/// Everything decided for one frame.
struct FrameOutcome {
    selections: Vec<SelectedPose>,
    anchor: Option<(i32, i32)>,
}

/// Per-run output handles passed to the frame loop.
struct Outputs<'a> {
    trace: &'a mut TraceSink,
    anchors: Option<&'a mut AnchorTraceWriter>,
    sink: Option<&'a mut FrameSink>,
    preview: &'a mut Preview,
}

/// Tracking pipeline over one detector.
pub struct Pipeline<D: PoseDetector> {
    config: TrackerConfig,
    detector: D,
    engine: ContinuityEngine,
}

impl<D: PoseDetector> Pipeline<D> {
    /// Create a pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::ConfigError`] if the configuration is invalid.
    pub fn new(config: TrackerConfig, detector: D) -> Result<Self> {
        config.validate()?;
        let engine = ContinuityEngine::new(config.mode);
        Ok(Self {
            config,
            detector,
            engine,
        })
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Continuity engine, with the state left by the last processed frame.
    #[must_use]
    pub const fn engine(&self) -> &ContinuityEngine {
        &self.engine
    }

    /// Detect, extract and select poses for one frame.
    ///
    /// # Errors
    ///
    /// Returns the detector or extraction error; engine state is left untouched.
    pub fn select_frame(
        &mut self,
        frame_idx: usize,
        image: &DynamicImage,
    ) -> Result<Vec<SelectedPose>> {
        Ok(self.analyze_frame(frame_idx, image)?.selections)
    }

    fn analyze_frame(&mut self, frame_idx: usize, image: &DynamicImage) -> Result<FrameOutcome> {
        let raw = self.detector.track(frame_idx, image)?;
        let poses = extract_poses(&raw)?;
        let anchor = if self.config.anchor {
            raw.first_box()?.map(anchor_point)
        } else {
            None
        };
        Ok(FrameOutcome {
            selections: self.engine.select(&poses),
            anchor,
        })
    }

    /// Process a whole source.
    ///
    /// The source is opened before any output is created, so a source that cannot be
    /// opened leaves no partial output behind. Trace files and the video sink are
    /// finalized on every exit path.
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::SourceError`] if the source cannot be opened, or an IO/video
    /// error if outputs cannot be created or written.
    pub fn run(&mut self, source: Source) -> Result<RunSummary> {
        crate::cli::logging::set_verbose(self.config.verbose);

        let name = source.describe();
        let mut frames = SourceIterator::open(source, self.config.fallback_fps)?;
        let info = frames.info();
        verbose!(
            "Source: {name} ({}x{} @ {:.2} fps)",
            info.width,
            info.height,
            info.fps
        );

        let dir = &self.config.output_dir;
        fs::create_dir_all(dir).map_err(|e| {
            TrackError::IoError(format!("Failed to create directory {}: {e}", dir.display()))
        })?;

        let mut trace = TraceSink::open(self.config.mode, dir)?;
        let mut anchors = if self.config.anchor {
            Some(AnchorTraceWriter::create(dir)?)
        } else {
            None
        };
        let mut sink = if self.config.save_video {
            Some(FrameSink::open(dir, info)?)
        } else {
            None
        };
        let mut preview = Preview::open(self.config.show_preview, info)?;

        let mut summary = RunSummary::default();
        let outcome = self.process(
            &mut frames,
            Outputs {
                trace: &mut trace,
                anchors: anchors.as_mut(),
                sink: sink.as_mut(),
                preview: &mut preview,
            },
            &mut summary,
        );

        let trace_done = trace.finish();
        let anchors_done = anchors.map_or(Ok(()), AnchorTraceWriter::finish);
        let sink_done = sink.map_or(Ok(()), FrameSink::finish);
        outcome?;
        trace_done?;
        anchors_done?;
        sink_done?;

        Ok(summary)
    }

    fn process(
        &mut self,
        frames: &mut SourceIterator,
        out: Outputs<'_>,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let Outputs {
            trace,
            mut anchors,
            mut sink,
            preview,
        } = out;

        for item in frames {
            let (img, meta) = match item {
                Ok(val) => val,
                Err(e) => {
                    error!("Error reading source: {e}");
                    summary.stopped_early = true;
                    break;
                }
            };
            let frame_idx = meta.frame_idx;
            summary.frames += 1;

            let outcome = match self.analyze_frame(frame_idx, &img) {
                Ok(outcome) => outcome,
                Err(e) if e.is_frame_recoverable() => {
                    warn!("Skipping frame {frame_idx}: {e}");
                    summary.skipped += 1;
                    FrameOutcome {
                        selections: Vec::new(),
                        anchor: None,
                    }
                }
                Err(e) => return Err(e),
            };
            summary.count(&outcome.selections);
            trace.record_frame(frame_idx, &outcome.selections)?;

            if let (Some(writer), Some(point)) = (anchors.as_deref_mut(), outcome.anchor) {
                writer.write(frame_idx, point)?;
                summary.anchors += 1;
            }

            verbose!("{}", frame_progress(frame_idx, meta.total_frames));

            let output = if outcome.selections.is_empty() && outcome.anchor.is_none() {
                img
            } else {
                let mut annotated = annotate_frame(&img, &outcome.selections).to_rgb8();
                if let Some(point) = outcome.anchor {
                    draw_anchor(&mut annotated, point);
                }
                DynamicImage::ImageRgb8(annotated)
            };

            if let Some(sink) = sink.as_deref_mut() {
                sink.write(&output)?;
            }

            if !preview.show(&output)? {
                summary.stopped_early = true;
                break;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::RawDetections;
    use crate::trace::{COORDINATES_TXT, FRAMES_TXT};

    /// Fails on frame 1, reports track 1 everywhere else.
    struct FlakyDetector;

    impl PoseDetector for FlakyDetector {
        fn track(&mut self, frame_idx: usize, _image: &DynamicImage) -> Result<RawDetections> {
            if frame_idx == 1 {
                return Err(TrackError::DetectorError("model hiccup".to_string()));
            }
            RawDetections::from_rows(&[(1, vec![[10.0, 20.0]; 17])])
        }
    }

    /// Every call fails with an unrecoverable error.
    struct BrokenDetector;

    impl PoseDetector for BrokenDetector {
        fn track(&mut self, _frame_idx: usize, _image: &DynamicImage) -> Result<RawDetections> {
            Err(TrackError::IoError("weights missing".to_string()))
        }
    }

    fn frames(n: usize) -> Source {
        Source::Frames(vec![DynamicImage::new_rgb8(32, 32); n])
    }

    #[test]
    fn test_detector_error_skips_frame_only() {
        let dir = tempfile::tempdir().unwrap();
        let config = TrackerConfig::new()
            .with_target(1)
            .with_output_dir(dir.path())
            .with_save_video(false)
            .with_verbose(false);
        let mut pipeline = Pipeline::new(config, FlakyDetector).unwrap();
        let summary = pipeline.run(frames(3)).unwrap();

        assert_eq!(summary.frames, 3);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.observed, 2);
        assert_eq!(summary.recovered, 0);

        let frames_log = fs::read_to_string(dir.path().join(FRAMES_TXT)).unwrap();
        assert_eq!(frames_log, "(0, 0)\n(1, 0)\n(2, 0)\n");
        let coords = fs::read_to_string(dir.path().join(COORDINATES_TXT)).unwrap();
        let starts: Vec<&str> = coords.lines().map(|l| &l[..8]).collect();
        assert_eq!(starts, vec!["Frame 0:", "Frame 2:"]);
    }

    #[test]
    fn test_unrecoverable_detector_error_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let config = TrackerConfig::new()
            .with_output_dir(dir.path())
            .with_save_video(false)
            .with_verbose(false);
        let mut pipeline = Pipeline::new(config, BrokenDetector).unwrap();
        assert!(matches!(
            pipeline.run(frames(2)),
            Err(TrackError::IoError(_))
        ));
        // The structured trace is still finalized.
        assert!(dir.path().join(crate::trace::COORDINATES_JSON).exists());
    }

    #[test]
    fn test_unopenable_source_creates_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let config = TrackerConfig::new()
            .with_target(1)
            .with_output_dir(&out)
            .with_verbose(false);
        let mut pipeline = Pipeline::new(config, FlakyDetector).unwrap();
        let err = pipeline
            .run(Source::Directory(dir.path().join("missing")))
            .unwrap_err();
        assert!(matches!(err, TrackError::SourceError(_)));
        assert!(!out.exists());
    }

    #[cfg(not(feature = "video"))]
    #[test]
    fn test_skipped_frame_reaches_sink_unmodified() {
        use image::{Rgb, RgbImage};

        let dir = tempfile::tempdir().unwrap();
        let config = TrackerConfig::new()
            .with_target(1)
            .with_output_dir(dir.path())
            .with_save_video(true)
            .with_verbose(false);
        let input = DynamicImage::ImageRgb8(RgbImage::from_pixel(32, 32, Rgb([90, 90, 90])));
        let mut pipeline = Pipeline::new(config, FlakyDetector).unwrap();
        let summary = pipeline.run(Source::Frames(vec![input; 3])).unwrap();
        assert_eq!(summary.skipped, 1);

        let frames_dir = dir.path().join(crate::io::OUTPUT_FRAMES_DIR);
        assert_eq!(fs::read_dir(&frames_dir).unwrap().count(), 3);

        // Largest channel deviation from the input gray; JPEG leaves a flat frame flat.
        let deviation = |name: &str| {
            image::open(frames_dir.join(name))
                .unwrap()
                .to_rgb8()
                .pixels()
                .flat_map(|p| p.0)
                .map(|c| c.abs_diff(90))
                .max()
                .unwrap()
        };
        assert!(deviation("000001.jpg") <= 2);
        assert!(deviation("000000.jpg") > 50);
        assert!(deviation("000002.jpg") > 50);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = TrackerConfig::new().with_fps(-1.0);
        assert!(Pipeline::new(config, FlakyDetector).is_err());
    }
}
