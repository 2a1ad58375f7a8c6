// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Continuity and recovery of poses across frames.
//!
//! The engine decides, frame by frame, which poses are drawn and recorded. Two
//! strategies share the same [`SelectedPose`] output:
//!
//! - [`SingleSubject`] follows one target identity and freezes its last known pose
//!   while the tracker loses it, flagging those frames as [`Observation::Recovered`].
//! - [`MultiSubject`] passes through every identity detected in the frame and never
//!   carries a pose forward.

use crate::pose::{FramePoses, Identity, Pose};

/// Which subjects the pipeline follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingMode {
    /// Follow one identity, bridging detection gaps with its last known pose.
    Single {
        /// Identity to follow.
        target: Identity,
    },
    /// Draw and record every detected identity.
    Multi,
}

/// Whether a selected pose was freshly detected or carried forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// Detected in the current frame.
    Observed,
    /// Reused from the last known pose.
    Recovered,
}

impl Observation {
    /// Whether the pose was carried forward.
    #[must_use]
    pub const fn is_recovered(self) -> bool {
        matches!(self, Self::Recovered)
    }
}

/// A pose to draw and record for one identity in one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectedPose {
    /// Tracked identity.
    pub identity: Identity,
    /// Keypoints to draw and record.
    pub pose: Pose,
    /// Detection status for this frame.
    pub observation: Observation,
}

/// Lifecycle of the followed identity in single-subject mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackState {
    /// Not detected yet.
    #[default]
    NeverSeen,
    /// Detected in the latest frame.
    Tracking,
    /// Missing from the latest frame; the last known pose is shown instead.
    Recovered,
}

/// Follows one identity and bridges its detection gaps.
#[derive(Debug, Clone)]
pub struct SingleSubject {
    target: Identity,
    last_known: Option<Pose>,
    state: TrackState,
}

impl SingleSubject {
    /// Create a strategy following `target`.
    #[must_use]
    pub const fn new(target: Identity) -> Self {
        Self {
            target,
            last_known: None,
            state: TrackState::NeverSeen,
        }
    }

    /// Identity being followed.
    #[must_use]
    pub const fn target(&self) -> Identity {
        self.target
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> TrackState {
        self.state
    }

    /// Most recent detected pose of the target, if any.
    #[must_use]
    pub const fn last_known(&self) -> Option<&Pose> {
        self.last_known.as_ref()
    }

    /// Select the target's pose for this frame.
    ///
    /// A target pose without any valid keypoint counts as a missed detection.
    pub fn select(&mut self, poses: &FramePoses) -> Option<SelectedPose> {
        match poses.get(&self.target).filter(|pose| pose.is_detected()) {
            Some(pose) => {
                self.last_known = Some(*pose);
                self.state = TrackState::Tracking;
                Some(SelectedPose {
                    identity: self.target,
                    pose: *pose,
                    observation: Observation::Observed,
                })
            }
            None => {
                let pose = self.last_known?;
                self.state = TrackState::Recovered;
                Some(SelectedPose {
                    identity: self.target,
                    pose,
                    observation: Observation::Recovered,
                })
            }
        }
    }
}

/// Passes through every identity detected in the frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct MultiSubject;

impl MultiSubject {
    /// Select all detected identities, in ascending identity order.
    #[must_use]
    pub fn select(&self, poses: &FramePoses) -> Vec<SelectedPose> {
        poses
            .iter()
            .filter(|(_, pose)| pose.is_detected())
            .map(|(&identity, &pose)| SelectedPose {
                identity,
                pose,
                observation: Observation::Observed,
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
enum Strategy {
    Single(SingleSubject),
    Multi(MultiSubject),
}

/// Frame-by-frame pose selection, configured by [`TrackingMode`].
#[derive(Debug, Clone)]
pub struct ContinuityEngine {
    strategy: Strategy,
}

impl ContinuityEngine {
    /// Create an engine for the given mode.
    #[must_use]
    pub const fn new(mode: TrackingMode) -> Self {
        let strategy = match mode {
            TrackingMode::Single { target } => Strategy::Single(SingleSubject::new(target)),
            TrackingMode::Multi => Strategy::Multi(MultiSubject),
        };
        Self { strategy }
    }

    /// Mode this engine runs in.
    #[must_use]
    pub const fn mode(&self) -> TrackingMode {
        match &self.strategy {
            Strategy::Single(s) => TrackingMode::Single { target: s.target },
            Strategy::Multi(_) => TrackingMode::Multi,
        }
    }

    /// Target state in single-subject mode, `None` in multi-subject mode.
    #[must_use]
    pub const fn state(&self) -> Option<TrackState> {
        match &self.strategy {
            Strategy::Single(s) => Some(s.state),
            Strategy::Multi(_) => None,
        }
    }

    /// Decide what to draw and record for this frame.
    pub fn select(&mut self, poses: &FramePoses) -> Vec<SelectedPose> {
        match &mut self.strategy {
            Strategy::Single(s) => s.select(poses).into_iter().collect(),
            Strategy::Multi(m) => m.select(poses),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::Keypoint;

    fn pose(v: f32) -> Pose {
        Pose([Keypoint::new(v, v); 17])
    }

    fn frame(entries: &[(i64, Pose)]) -> FramePoses {
        entries.iter().map(|&(id, p)| (Identity(id), p)).collect()
    }

    #[test]
    fn test_single_never_seen_emits_nothing() {
        let mut s = SingleSubject::new(Identity(1));
        assert!(s.select(&frame(&[(2, pose(5.0))])).is_none());
        assert!(s.select(&FramePoses::new()).is_none());
        assert_eq!(s.state(), TrackState::NeverSeen);
        assert!(s.last_known().is_none());
    }

    #[test]
    fn test_single_observe_recover_observe() {
        let p0 = pose(10.0);
        let p2 = pose(30.0);
        let mut s = SingleSubject::new(Identity(1));

        let f0 = s.select(&frame(&[(1, p0)])).unwrap();
        assert_eq!(f0.observation, Observation::Observed);
        assert_eq!(f0.pose, p0);
        assert_eq!(s.state(), TrackState::Tracking);

        let f1 = s.select(&frame(&[(2, pose(99.0))])).unwrap();
        assert_eq!(f1.observation, Observation::Recovered);
        assert_eq!(f1.pose, p0);
        assert_eq!(s.state(), TrackState::Recovered);

        let f2 = s.select(&frame(&[(1, p2)])).unwrap();
        assert_eq!(f2.observation, Observation::Observed);
        assert_eq!(f2.pose, p2);
        assert_eq!(s.state(), TrackState::Tracking);
        assert_eq!(s.last_known(), Some(&p2));
    }

    #[test]
    fn test_single_recovers_through_long_gap() {
        let mut s = SingleSubject::new(Identity(7));
        s.select(&frame(&[(7, pose(4.0))]));
        for _ in 0..500 {
            let sel = s.select(&FramePoses::new()).unwrap();
            assert!(sel.observation.is_recovered());
            assert_eq!(sel.pose, pose(4.0));
        }
    }

    #[test]
    fn test_single_undetected_pose_counts_as_absent() {
        let mut s = SingleSubject::new(Identity(1));
        s.select(&frame(&[(1, pose(8.0))]));
        let sel = s.select(&frame(&[(1, Pose::default())])).unwrap();
        assert_eq!(sel.observation, Observation::Recovered);
        assert_eq!(sel.pose, pose(8.0));
    }

    #[test]
    fn test_multi_passes_detected_identities() {
        let m = MultiSubject;
        let sel = m.select(&frame(&[(3, pose(1.0)), (1, pose(2.0)), (2, Pose::default())]));
        let ids: Vec<i64> = sel.iter().map(|s| s.identity.0).collect();
        assert_eq!(ids, vec![1, 3]);
        assert!(sel.iter().all(|s| s.observation == Observation::Observed));
    }

    #[test]
    fn test_multi_does_not_carry_forward() {
        let mut engine = ContinuityEngine::new(TrackingMode::Multi);
        assert_eq!(engine.select(&frame(&[(1, pose(1.0))])).len(), 1);
        assert!(engine.select(&FramePoses::new()).is_empty());
        assert_eq!(engine.state(), None);
    }

    #[test]
    fn test_engine_mode_roundtrip() {
        let mode = TrackingMode::Single {
            target: Identity(5),
        };
        let mut engine = ContinuityEngine::new(mode);
        assert_eq!(engine.mode(), mode);
        assert_eq!(engine.state(), Some(TrackState::NeverSeen));
        assert_eq!(engine.select(&frame(&[(5, pose(2.0))])).len(), 1);
        assert_eq!(engine.state(), Some(TrackState::Tracking));
        assert_eq!(ContinuityEngine::new(TrackingMode::Multi).mode(), TrackingMode::Multi);
    }
}
