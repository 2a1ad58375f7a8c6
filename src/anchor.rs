// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Box anchor tracking.
//!
//! A lighter alternative to full skeletons: the first detection of every frame is
//! reduced to one anchor point on its person box, the horizontal center at the upper
//! quarter (roughly shoulder height). The point is marked on the frame and logged as
//! `frame, x, y` lines in `tracked_coordinates.txt`. Frames without a box produce no
//! line.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use image::RgbImage;

use crate::annotate::draw_marker;
use crate::error::{Result, TrackError};
use crate::visualizer::Color;

/// Anchor log file name.
pub const ANCHOR_TXT: &str = "tracked_coordinates.txt";

/// Anchor marker radius in pixels.
pub const ANCHOR_RADIUS: i32 = 5;

/// Anchor marker color.
pub const ANCHOR_COLOR: Color = Color::RED;

/// Anchor point of an `[x1, y1, x2, y2]` box, truncated to pixels.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn anchor_point(bbox: [f32; 4]) -> (i32, i32) {
    let [x1, y1, x2, y2] = bbox;
    let x = (x1 + x2) / 2.0;
    let y = (y2 - y1).mul_add(0.25, y1);
    (x as i32, y as i32)
}

/// Mark an anchor point on a frame.
pub fn draw_anchor(img: &mut RgbImage, point: (i32, i32)) {
    draw_marker(img, point, ANCHOR_RADIUS, ANCHOR_COLOR);
}

/// Streaming writer for `tracked_coordinates.txt`.
pub struct AnchorTraceWriter {
    file: BufWriter<File>,
}

impl AnchorTraceWriter {
    /// Create the anchor log in `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created.
    pub fn create<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let path = dir.as_ref().join(ANCHOR_TXT);
        let file = File::create(&path).map_err(|e| {
            TrackError::IoError(format!("Failed to create {}: {e}", path.display()))
        })?;
        Ok(Self {
            file: BufWriter::new(file),
        })
    }

    /// Log the anchor of one frame.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write(&mut self, frame_idx: usize, point: (i32, i32)) -> Result<()> {
        writeln!(self.file, "{frame_idx}, {}, {}", point.0, point.1)?;
        Ok(())
    }

    /// Flush the log.
    ///
    /// # Errors
    ///
    /// Returns an error if flushing fails.
    pub fn finish(mut self) -> Result<()> {
        self.file.flush()?;
        Ok(())
    }
}
