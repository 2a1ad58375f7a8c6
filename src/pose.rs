// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Pose data model: keypoints, poses and tracked identities.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::visualizer::skeleton::{JOINT_NAMES, NUM_JOINTS};

/// Stable integer handle assigned to a subject by the external tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(pub i64);

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Identity {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// A 2D keypoint in pixel coordinates.
///
/// Detectors report undetected joints as zero or negative coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Keypoint {
    /// X coordinate in pixels.
    pub x: f32,
    /// Y coordinate in pixels.
    pub y: f32,
}

impl Keypoint {
    /// Create a new keypoint.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// A keypoint is drawable only when both coordinates are strictly positive.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.x > 0.0 && self.y > 0.0
    }

    /// Integer pixel position, truncated toward zero.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn to_pixel(&self) -> (i32, i32) {
        (self.x as i32, self.y as i32)
    }
}

/// 17 keypoints for one identity in one frame, index-aligned with [`JOINT_NAMES`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Pose(pub [Keypoint; NUM_JOINTS]);

impl Pose {
    /// Build a pose from `[x, y]` pairs.
    #[must_use]
    pub fn from_xy(points: [[f32; 2]; NUM_JOINTS]) -> Self {
        Self(points.map(|[x, y]| Keypoint::new(x, y)))
    }

    /// Keypoint for a joint index.
    #[must_use]
    pub fn get(&self, joint: usize) -> Option<&Keypoint> {
        self.0.get(joint)
    }

    /// Iterate over the keypoints in joint order.
    pub fn iter(&self) -> impl Iterator<Item = &Keypoint> {
        self.0.iter()
    }

    /// Iterate over `(joint_name, keypoint)` for valid keypoints only.
    pub fn named_valid(&self) -> impl Iterator<Item = (&'static str, &Keypoint)> {
        JOINT_NAMES
            .iter()
            .zip(self.0.iter())
            .filter(|(_, kp)| kp.is_valid())
            .map(|(name, kp)| (*name, kp))
    }

    /// Number of valid keypoints.
    #[must_use]
    pub fn valid_count(&self) -> usize {
        self.0.iter().filter(|kp| kp.is_valid()).count()
    }

    /// Whether the detector actually located this subject (any valid keypoint).
    #[must_use]
    pub fn is_detected(&self) -> bool {
        self.0.iter().any(Keypoint::is_valid)
    }
}

/// Poses of every identity detected in one frame, ordered by identity.
pub type FramePoses = BTreeMap<Identity, Pose>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypoint_validity() {
        assert!(Keypoint::new(1.0, 1.0).is_valid());
        assert!(!Keypoint::new(0.0, 10.0).is_valid());
        assert!(!Keypoint::new(10.0, 0.0).is_valid());
        assert!(!Keypoint::new(-3.0, 10.0).is_valid());
        assert!(!Keypoint::default().is_valid());
    }

    #[test]
    fn test_to_pixel_truncates() {
        assert_eq!(Keypoint::new(10.9, 20.99).to_pixel(), (10, 20));
        assert_eq!(Keypoint::new(0.5, 1.5).to_pixel(), (0, 1));
    }

    #[test]
    fn test_pose_is_detected() {
        let mut pose = Pose::default();
        assert!(!pose.is_detected());
        assert_eq!(pose.valid_count(), 0);

        pose.0[5] = Keypoint::new(40.0, 50.0);
        assert!(pose.is_detected());
        assert_eq!(pose.valid_count(), 1);
    }

    #[test]
    fn test_named_valid() {
        let mut pose = Pose::default();
        pose.0[0] = Keypoint::new(1.0, 2.0);
        pose.0[16] = Keypoint::new(3.0, 4.0);
        let names: Vec<&str> = pose.named_valid().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["nose", "right_ankle"]);
    }

    #[test]
    fn test_identity_display() {
        assert_eq!(Identity(42).to_string(), "42");
        assert_eq!(serde_json::to_string(&Identity(7)).unwrap(), "7");
    }
}
