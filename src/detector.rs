// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Pose detector/tracker collaborator.
//!
//! Model inference and identity assignment happen outside this crate. A detector only
//! has to hand back, per frame, the track ids and their keypoints as
//! [`RawDetections`]. [`ReplayDetector`] serves detections recorded ahead of time,
//! for example exported from a tracking run:
//!
//! ```json
//! {
//!   "frames": [
//!     { "frame": 0, "detections": [
//!       { "id": 1, "conf": 0.91, "box": [280.0, 60.0, 350.0, 400.0], "keypoints": [[312.5, 88.0], ...] }
//!     ] }
//!   ]
//! }
//! ```
//!
//! `conf` defaults to 1.0. `box` is optional; a frame carries boxes only when every
//! surviving detection has one.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use image::DynamicImage;
use serde::Deserialize;

use crate::error::{Result, TrackError};
use crate::extract::RawDetections;

/// Tracking parameters handed to a detector at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackParams {
    /// Minimum detection confidence (0.0 to 1.0).
    pub conf: f32,
    /// `IoU` threshold for NMS and track association.
    pub iou: f32,
    /// Square inference image size.
    pub imgsz: usize,
    /// Keep tracks alive between calls.
    pub persist: bool,
}

impl Default for TrackParams {
    fn default() -> Self {
        Self {
            conf: 0.5,
            iou: 0.6,
            imgsz: 608,
            persist: true,
        }
    }
}

/// A source of per-frame pose tracks.
pub trait PoseDetector {
    /// Run detection and tracking on one frame.
    ///
    /// Frames are passed strictly in order, starting at index 0.
    ///
    /// # Errors
    ///
    /// Implementations return [`TrackError::DetectorError`] or
    /// [`TrackError::ShapeMismatch`]; the pipeline skips the frame and continues.
    fn track(&mut self, frame_idx: usize, image: &DynamicImage) -> Result<RawDetections>;
}

impl<D: PoseDetector + ?Sized> PoseDetector for Box<D> {
    fn track(&mut self, frame_idx: usize, image: &DynamicImage) -> Result<RawDetections> {
        (**self).track(frame_idx, image)
    }
}

#[derive(Debug, Deserialize)]
struct DetectionLog {
    frames: Vec<FrameEntry>,
}

#[derive(Debug, Deserialize)]
struct FrameEntry {
    frame: usize,
    #[serde(default)]
    detections: Vec<DetectionEntry>,
}

#[derive(Debug, Clone, Deserialize)]
struct DetectionEntry {
    id: i64,
    #[serde(default = "default_conf")]
    conf: f32,
    #[serde(default, rename = "box")]
    bbox: Option<[f32; 4]>,
    keypoints: Vec<[f32; 2]>,
}

const fn default_conf() -> f32 {
    1.0
}

/// Detector that replays a recorded detection log.
#[derive(Debug, Default)]
pub struct ReplayDetector {
    frames: HashMap<usize, Vec<DetectionEntry>>,
    params: TrackParams,
}

impl ReplayDetector {
    /// Load a detection log from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid detection log.
    pub fn from_path<P: AsRef<Path>>(path: P, params: TrackParams) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            TrackError::IoError(format!("Failed to open {}: {e}", path.display()))
        })?;
        let log: DetectionLog = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            TrackError::DetectorError(format!("Invalid detection log {}: {e}", path.display()))
        })?;
        Ok(Self::from_log(log, params))
    }

    /// Parse a detection log from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::DetectorError`] if the JSON is not a valid detection log.
    pub fn from_json(json: &str, params: TrackParams) -> Result<Self> {
        let log: DetectionLog = serde_json::from_str(json)
            .map_err(|e| TrackError::DetectorError(format!("Invalid detection log: {e}")))?;
        Ok(Self::from_log(log, params))
    }

    fn from_log(log: DetectionLog, params: TrackParams) -> Self {
        let mut frames: HashMap<usize, Vec<DetectionEntry>> = HashMap::new();
        for entry in log.frames {
            frames
                .entry(entry.frame)
                .or_default()
                .extend(entry.detections);
        }
        Self { frames, params }
    }

    /// Number of frames with at least one recorded entry.
    #[must_use]
    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }
}

impl PoseDetector for ReplayDetector {
    fn track(&mut self, frame_idx: usize, _image: &DynamicImage) -> Result<RawDetections> {
        let kept: Vec<&DetectionEntry> = self
            .frames
            .get(&frame_idx)
            .into_iter()
            .flatten()
            .filter(|det| det.conf >= self.params.conf)
            .collect();

        let rows: Vec<(i64, Vec<[f32; 2]>)> = kept
            .iter()
            .map(|det| (det.id, det.keypoints.clone()))
            .collect();
        let raw = RawDetections::from_rows(&rows)?;

        match kept.iter().map(|det| det.bbox).collect::<Option<Vec<_>>>() {
            Some(boxes) if !boxes.is_empty() => raw.with_boxes(&boxes),
            _ => Ok(raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract_poses;
    use crate::pose::Identity;

    fn keypoints_json(value: f32, count: usize) -> String {
        let pts: Vec<String> = (0..count).map(|_| format!("[{value}, {value}]")).collect();
        format!("[{}]", pts.join(", "))
    }

    fn blank() -> DynamicImage {
        DynamicImage::new_rgb8(4, 4)
    }

    #[test]
    fn test_track_params_defaults() {
        let params = TrackParams::default();
        assert!((params.conf - 0.5).abs() < f32::EPSILON);
        assert!((params.iou - 0.6).abs() < f32::EPSILON);
        assert_eq!(params.imgsz, 608);
        assert!(params.persist);
    }

    #[test]
    fn test_replay_returns_recorded_tracks() {
        let json = format!(
            r#"{{"frames": [{{"frame": 2, "detections": [{{"id": 4, "keypoints": {}}}]}}]}}"#,
            keypoints_json(7.0, 17)
        );
        let mut detector = ReplayDetector::from_json(&json, TrackParams::default()).unwrap();
        assert_eq!(detector.num_frames(), 1);

        let raw = detector.track(2, &blank()).unwrap();
        let poses = extract_poses(&raw).unwrap();
        assert_eq!(poses.len(), 1);
        assert!(poses[&Identity(4)].is_detected());

        let raw = detector.track(3, &blank()).unwrap();
        assert!(raw.is_empty());
        assert!(extract_poses(&raw).unwrap().is_empty());
    }

    #[test]
    fn test_replay_filters_by_confidence() {
        let json = format!(
            r#"{{"frames": [{{"frame": 0, "detections": [
                {{"id": 1, "conf": 0.3, "keypoints": {k}}},
                {{"id": 2, "conf": 0.8, "keypoints": {k}}}
            ]}}]}}"#,
            k = keypoints_json(5.0, 17)
        );
        let mut detector = ReplayDetector::from_json(&json, TrackParams::default()).unwrap();
        let poses = extract_poses(&detector.track(0, &blank()).unwrap()).unwrap();
        let ids: Vec<Identity> = poses.keys().copied().collect();
        assert_eq!(ids, vec![Identity(2)]);
    }

    #[test]
    fn test_replay_short_keypoints_fail_extraction() {
        let json = format!(
            r#"{{"frames": [{{"frame": 0, "detections": [{{"id": 1, "keypoints": {}}}]}}]}}"#,
            keypoints_json(5.0, 12)
        );
        let mut detector = ReplayDetector::from_json(&json, TrackParams::default()).unwrap();
        let raw = detector.track(0, &blank()).unwrap();
        assert!(matches!(
            extract_poses(&raw),
            Err(TrackError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_invalid_log_is_detector_error() {
        let err = ReplayDetector::from_json("{\"frames\": 3}", TrackParams::default()).unwrap_err();
        assert!(matches!(err, TrackError::DetectorError(_)));
    }

    #[test]
    fn test_replay_boxes_follow_surviving_rows() {
        let json = format!(
            r#"{{"frames": [
                {{"frame": 0, "detections": [
                    {{"id": 1, "conf": 0.2, "box": [0, 0, 5, 5], "keypoints": {k}}},
                    {{"id": 2, "box": [10, 20, 30, 60], "keypoints": {k}}}
                ]}},
                {{"frame": 1, "detections": [
                    {{"id": 2, "box": [10, 20, 30, 60], "keypoints": {k}}},
                    {{"id": 3, "keypoints": {k}}}
                ]}}
            ]}}"#,
            k = keypoints_json(5.0, 17)
        );
        let mut detector = ReplayDetector::from_json(&json, TrackParams::default()).unwrap();

        let raw = detector.track(0, &blank()).unwrap();
        assert_eq!(raw.first_box().unwrap(), Some([10.0, 20.0, 30.0, 60.0]));

        // One detection without a box drops boxes for the whole frame.
        let raw = detector.track(1, &blank()).unwrap();
        assert_eq!(raw.len(), 2);
        assert_eq!(raw.first_box().unwrap(), None);
    }
}
