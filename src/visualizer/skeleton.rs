// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// Number of COCO-Pose keypoints per pose.
pub const NUM_JOINTS: usize = 17;

/// COCO-Pose joint names, index-aligned with every [`crate::Pose`].
pub const JOINT_NAMES: [&str; NUM_JOINTS] = [
    "nose",
    "left_eye",
    "right_eye",
    "left_ear",
    "right_ear",
    "left_shoulder",
    "right_shoulder",
    "left_elbow",
    "right_elbow",
    "left_wrist",
    "right_wrist",
    "left_hip",
    "right_hip",
    "left_knee",
    "right_knee",
    "left_ankle",
    "right_ankle",
];

/// Skeleton structure (pairs of keypoint indices).
/// Arm and leg pairs appear in both the limb group and the side group; the list is kept
/// as-is and deduplicated by [`bones`].
pub const SKELETON: [[usize; 2]; 20] = [
    [5, 7],   // left shoulder to left elbow
    [7, 9],   // left elbow to left wrist
    [11, 13], // left hip to left knee
    [13, 15], // left knee to left ankle
    [5, 11],  // left shoulder to left hip
    [6, 12],  // right shoulder to right hip
    [11, 12], // left hip to right hip
    [0, 1],   // nose to left eye
    [0, 2],   // nose to right eye
    [1, 3],   // left eye to left ear
    [2, 4],   // right eye to right ear
    [5, 6],   // left shoulder to right shoulder
    [5, 7],   // left arm
    [7, 9],
    [6, 8], // right arm
    [8, 10],
    [11, 13], // left leg
    [13, 15],
    [12, 14], // right leg
    [14, 16],
];

/// Distinct bones of [`SKELETON`] in first-occurrence order.
pub fn bones() -> impl Iterator<Item = [usize; 2]> {
    SKELETON
        .iter()
        .enumerate()
        .filter(|(i, bone)| !SKELETON[..*i].contains(bone))
        .map(|(_, bone)| *bone)
}

/// Look up a joint index by name.
#[must_use]
pub fn joint_index(name: &str) -> Option<usize> {
    JOINT_NAMES.iter().position(|&n| n == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bones_are_deduplicated() {
        let unique: Vec<[usize; 2]> = bones().collect();
        assert_eq!(unique.len(), 16);
        for (i, bone) in unique.iter().enumerate() {
            assert!(!unique[i + 1..].contains(bone));
        }
        assert_eq!(unique[0], [5, 7]);
        assert_eq!(unique[15], [14, 16]);
    }

    #[test]
    fn test_skeleton_indices_in_range() {
        for [a, b] in SKELETON {
            assert!(a < NUM_JOINTS && b < NUM_JOINTS);
            assert_ne!(a, b);
        }
    }

    #[test]
    fn test_joint_index() {
        assert_eq!(joint_index("nose"), Some(0));
        assert_eq!(joint_index("right_ankle"), Some(16));
        assert_eq!(joint_index("tail"), None);
    }
}
