// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Frame keypoint extraction.
//!
//! Turns the raw per-frame output of a pose tracker (a list of track ids plus an
//! `(N, K, 2|3)` keypoint tensor) into a validated [`FramePoses`] map. Validity of
//! individual keypoints is not judged here; that happens at render and trace time.

use ndarray::{Array2, Array3, s};

use crate::error::{Result, TrackError};
use crate::pose::{FramePoses, Identity, Keypoint, Pose};
use crate::visualizer::skeleton::NUM_JOINTS;

/// Raw tracker output for one frame.
#[derive(Debug, Clone)]
pub struct RawDetections {
    /// Track ids, one per pose row. `None` when the tracker has no active tracks.
    pub ids: Option<Vec<i64>>,
    /// Keypoint data with shape (N, 17, 2) or (N, 17, 3) if confidence is included.
    pub keypoints: Array3<f32>,
    /// Person boxes as `(N, 4)` `[x1, y1, x2, y2]`, when the tracker reports them.
    pub boxes: Option<Array2<f32>>,
}

impl RawDetections {
    /// Detections for a frame without any tracks.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            ids: None,
            keypoints: Array3::zeros((0, NUM_JOINTS, 2)),
            boxes: None,
        }
    }

    /// Build detections from `(id, [[x, y], ...])` rows.
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::ShapeMismatch`] when rows have different keypoint counts.
    pub fn from_rows(rows: &[(i64, Vec<[f32; 2]>)]) -> Result<Self> {
        if rows.is_empty() {
            return Ok(Self::empty());
        }

        let k = rows[0].1.len();
        if let Some((id, kpts)) = rows.iter().find(|(_, kpts)| kpts.len() != k) {
            return Err(TrackError::ShapeMismatch {
                expected: format!("{k} keypoints per track"),
                actual: format!("{} keypoints for track {id}", kpts.len()),
            });
        }

        let flat: Vec<f32> = rows
            .iter()
            .flat_map(|(_, kpts)| kpts.iter().flatten().copied())
            .collect();
        let keypoints = Array3::from_shape_vec((rows.len(), k, 2), flat).map_err(|e| {
            TrackError::ShapeMismatch {
                expected: format!("({}, {k}, 2)", rows.len()),
                actual: e.to_string(),
            }
        })?;

        Ok(Self {
            ids: Some(rows.iter().map(|(id, _)| *id).collect()),
            keypoints,
            boxes: None,
        })
    }

    /// Attach `[x1, y1, x2, y2]` boxes, one per pose row.
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::ShapeMismatch`] if the box count differs from the row count.
    pub fn with_boxes(mut self, boxes: &[[f32; 4]]) -> Result<Self> {
        if boxes.len() != self.len() {
            return Err(TrackError::ShapeMismatch {
                expected: format!("{} boxes", self.len()),
                actual: format!("{} boxes", boxes.len()),
            });
        }
        let flat: Vec<f32> = boxes.iter().flatten().copied().collect();
        let boxes = Array2::from_shape_vec((boxes.len(), 4), flat).map_err(|e| {
            TrackError::ShapeMismatch {
                expected: format!("({}, 4)", self.len()),
                actual: e.to_string(),
            }
        })?;
        self.boxes = Some(boxes);
        Ok(self)
    }

    /// Box of the first detection row, if the frame has tracks and boxes.
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::ShapeMismatch`] if the box array is not `(N, 4)`.
    pub fn first_box(&self) -> Result<Option<[f32; 4]>> {
        let Some(boxes) = &self.boxes else {
            return Ok(None);
        };
        if self.is_empty() {
            return Ok(None);
        }

        let (n, d) = boxes.dim();
        if n != self.len() || d != 4 {
            return Err(TrackError::ShapeMismatch {
                expected: format!("({}, 4) boxes", self.len()),
                actual: format!("({n}, {d})"),
            });
        }
        Ok(Some([boxes[[0, 0]], boxes[[0, 1]], boxes[[0, 2]], boxes[[0, 3]]]))
    }

    /// Number of pose rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keypoints.shape()[0]
    }

    /// Whether the frame carries no tracks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.as_ref().is_none_or(Vec::is_empty)
    }
}

/// Extract per-identity poses from raw tracker output.
///
/// The first row wins when an identity appears twice in the same frame.
///
/// # Errors
///
/// Returns [`TrackError::ShapeMismatch`] if the keypoint tensor is not laid out as
/// `(N, 17, 2|3)` or the number of ids differs from `N`.
pub fn extract_poses(raw: &RawDetections) -> Result<FramePoses> {
    let Some(ids) = &raw.ids else {
        return Ok(FramePoses::new());
    };

    let shape = raw.keypoints.shape();
    let (n, k, d) = (shape[0], shape[1], shape[2]);

    if n > 0 && (k != NUM_JOINTS || d < 2) {
        return Err(TrackError::ShapeMismatch {
            expected: format!("(N, {NUM_JOINTS}, 2) or (N, {NUM_JOINTS}, 3)"),
            actual: format!("({n}, {k}, {d})"),
        });
    }
    if ids.len() != n {
        return Err(TrackError::ShapeMismatch {
            expected: format!("{n} track ids"),
            actual: format!("{} track ids", ids.len()),
        });
    }

    let mut poses = FramePoses::new();
    for (row, &id) in ids.iter().enumerate() {
        let xy = raw.keypoints.slice(s![row, .., 0..2]);
        let mut pose = Pose::default();
        for (joint, kp) in pose.0.iter_mut().enumerate() {
            *kp = Keypoint::new(xy[[joint, 0]], xy[[joint, 1]]);
        }
        poses.entry(Identity(id)).or_insert(pose);
    }

    Ok(poses)
}
