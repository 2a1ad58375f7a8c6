// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Keypoint trace output.
//!
//! Two schemas are supported:
//!
//! - **Flat log** (single-subject mode): `coordinates.txt` holds one line per frame with
//!   a pose, `Frame 12: (x, y), ...` or `Frame 13 (recovered): (x, y), ...`, with 17
//!   integer pairs in joint order. `frames.txt` holds `(n, 0)` for every processed
//!   frame so plots can be aligned even where no pose was recorded.
//! - **Structured** (multi-subject mode): `coordinates.json` maps identity to frame to
//!   `{joint_name: [x, y]}` for every genuine detection.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::continuity::{Observation, SelectedPose, TrackingMode};
use crate::error::{Result, TrackError};
use crate::pose::{Identity, Keypoint, Pose};

/// Flat coordinate log file name.
pub const COORDINATES_TXT: &str = "coordinates.txt";
/// Frame index log file name.
pub const FRAMES_TXT: &str = "frames.txt";
/// Structured trace file name.
pub const COORDINATES_JSON: &str = "coordinates.json";

fn create(path: &Path) -> Result<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| TrackError::IoError(format!("Failed to create {}: {e}", path.display())))
}

/// Integer pixel pair for the flat log; undetected joints are written as `(0, 0)`.
fn flat_pixel(kp: &Keypoint) -> (i32, i32) {
    if kp.is_valid() { kp.to_pixel() } else { (0, 0) }
}

/// Format one flat log line (without trailing newline).
#[must_use]
pub fn format_flat_line(frame_idx: usize, pose: &Pose, observation: Observation) -> String {
    let marker = match observation {
        Observation::Observed => String::new(),
        Observation::Recovered => " (recovered)".to_string(),
    };
    let coords: Vec<String> = pose
        .iter()
        .map(|kp| {
            let (x, y) = flat_pixel(kp);
            format!("({x}, {y})")
        })
        .collect();
    format!("Frame {frame_idx}{marker}: {}", coords.join(", "))
}

/// Streaming writer for the flat log schema.
pub struct FlatTraceWriter {
    coordinates: BufWriter<File>,
    frames: BufWriter<File>,
}

impl FlatTraceWriter {
    /// Create `coordinates.txt` and `frames.txt` in `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if either file cannot be created.
    pub fn create<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        Ok(Self {
            coordinates: create(&dir.join(COORDINATES_TXT))?,
            frames: create(&dir.join(FRAMES_TXT))?,
        })
    }

    /// Record one processed frame. `pose` is `None` when nothing is drawn for it.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_frame(&mut self, frame_idx: usize, pose: Option<&SelectedPose>) -> Result<()> {
        if let Some(sel) = pose {
            writeln!(
                self.coordinates,
                "{}",
                format_flat_line(frame_idx, &sel.pose, sel.observation)
            )?;
        }
        writeln!(self.frames, "({frame_idx}, 0)")?;
        Ok(())
    }

    /// Flush both logs.
    ///
    /// # Errors
    ///
    /// Returns an error if flushing fails.
    pub fn finish(mut self) -> Result<()> {
        self.coordinates.flush()?;
        self.frames.flush()?;
        Ok(())
    }
}

/// Joint coordinates of one pose in the structured trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoseRecord(Vec<(&'static str, [i32; 2])>);

impl PoseRecord {
    /// Build a record from the valid keypoints of a pose.
    #[must_use]
    pub fn from_pose(pose: &Pose) -> Self {
        Self(
            pose.named_valid()
                .map(|(name, kp)| {
                    let (x, y) = kp.to_pixel();
                    (name, [x, y])
                })
                .collect(),
        )
    }

    /// Coordinates of a joint, if it was detected.
    #[must_use]
    pub fn get(&self, joint: &str) -> Option<[i32; 2]> {
        self.0.iter().find(|(n, _)| *n == joint).map(|(_, xy)| *xy)
    }

    /// Number of joints recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no joint was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for PoseRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, xy) in &self.0 {
            map.serialize_entry(name, xy)?;
        }
        map.end()
    }
}

/// In-memory structured trace: identity -> frame -> joint -> `[x, y]`.
#[derive(Debug, Default)]
pub struct StructuredTrace {
    data: BTreeMap<Identity, BTreeMap<usize, PoseRecord>>,
}

impl StructuredTrace {
    /// Create an empty trace.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record observed poses for a frame. Recovered selections are ignored.
    pub fn record(&mut self, frame_idx: usize, selections: &[SelectedPose]) {
        for sel in selections
            .iter()
            .filter(|s| s.observation == Observation::Observed)
        {
            self.data
                .entry(sel.identity)
                .or_default()
                .insert(frame_idx, PoseRecord::from_pose(&sel.pose));
        }
    }

    /// Frames in which `identity` was recorded.
    #[must_use]
    pub fn frames(&self, identity: Identity) -> BTreeSet<usize> {
        self.data
            .get(&identity)
            .map(|frames| frames.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Record for one identity in one frame.
    #[must_use]
    pub fn get(&self, identity: Identity, frame_idx: usize) -> Option<&PoseRecord> {
        self.data.get(&identity)?.get(&frame_idx)
    }

    /// Serialize to a pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::TraceError`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.data)?)
    }

    /// Write the trace as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = create(path.as_ref())?;
        serde_json::to_writer_pretty(&mut writer, &self.data)?;
        writer.flush()?;
        Ok(())
    }
}

/// Trace output for the configured mode.
pub enum TraceSink {
    /// Flat text logs, written as frames arrive.
    Flat(FlatTraceWriter),
    /// Structured JSON, written on finish.
    Structured {
        /// Accumulated trace.
        trace: StructuredTrace,
        /// Output path.
        path: PathBuf,
    },
}

impl TraceSink {
    /// Open the trace output for `mode` in `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if output files cannot be created.
    pub fn open<P: AsRef<Path>>(mode: TrackingMode, dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        match mode {
            TrackingMode::Single { .. } => Ok(Self::Flat(FlatTraceWriter::create(dir)?)),
            TrackingMode::Multi => Ok(Self::Structured {
                trace: StructuredTrace::new(),
                path: dir.join(COORDINATES_JSON),
            }),
        }
    }

    /// Record the selections made for a processed frame.
    ///
    /// # Errors
    ///
    /// Returns an error if writing the flat log fails.
    pub fn record_frame(&mut self, frame_idx: usize, selections: &[SelectedPose]) -> Result<()> {
        match self {
            Self::Flat(writer) => writer.write_frame(frame_idx, selections.first()),
            Self::Structured { trace, .. } => {
                trace.record(frame_idx, selections);
                Ok(())
            }
        }
    }

    /// Flush or serialize the trace.
    ///
    /// # Errors
    ///
    /// Returns an error if the final write fails.
    pub fn finish(self) -> Result<()> {
        match self {
            Self::Flat(writer) => writer.finish(),
            Self::Structured { trace, path } => trace.save(path),
        }
    }
}
