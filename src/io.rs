// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Output frame sink: an encoded video when the `video` feature is enabled,
//! numbered JPEG frames otherwise.

use std::path::{Path, PathBuf};

use image::DynamicImage;

use crate::error::{Result, TrackError};
use crate::source::VideoInfo;

#[cfg(feature = "video")]
use video_rs::{Encoder, Time, encode::Settings as EncoderSettings};

#[cfg(feature = "video")]
use std::sync::Once;

#[cfg(feature = "video")]
static INIT: Once = Once::new();

/// Output video file name.
pub const OUTPUT_VIDEO: &str = "output_video.mp4";

/// Output frame directory name when video encoding is unavailable.
pub const OUTPUT_FRAMES_DIR: &str = "frames";

/// Initialize `video-rs` (and FFmpeg) once per process.
#[allow(clippy::missing_const_for_fn)]
pub fn init_video() {
    #[cfg(feature = "video")]
    INIT.call_once(|| {
        if let Err(e) = video_rs::init() {
            crate::warn!("Failed to initialize video-rs: {e}");
        }
    });
}

/// A wrapper around `video-rs` encoder writing frames at a fixed rate.
#[cfg(feature = "video")]
pub struct VideoWriter {
    encoder: Encoder,
    frame_duration: Time,
    position: Time,
    width: usize,
    height: usize,
}

#[cfg(feature = "video")]
impl VideoWriter {
    /// Create a new H.264 `VideoWriter` matching the source parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if the encoder cannot be initialized.
    pub fn new<P: AsRef<Path>>(path: P, info: VideoInfo) -> Result<Self> {
        init_video();

        let width = info.width as usize;
        let height = info.height as usize;
        let settings = EncoderSettings::preset_h264_yuv420p(width, height, false);
        let encoder = Encoder::new(path.as_ref(), settings).map_err(|e| {
            TrackError::VideoError(format!("Failed to create video encoder: {e}"))
        })?;

        Ok(Self {
            encoder,
            frame_duration: Time::from_secs_f64(1.0 / f64::from(info.fps)),
            position: Time::zero(),
            width,
            height,
        })
    }

    /// Encode one frame.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails or frame dimensions don't match.
    pub fn write_frame(&mut self, frame: &DynamicImage) -> Result<()> {
        let img_buffer = frame.to_rgb8();
        let width = img_buffer.width() as usize;
        let height = img_buffer.height() as usize;

        if width != self.width || height != self.height {
            return Err(TrackError::VideoError(format!(
                "Frame dimensions {width}x{height} do not match video dimensions {}x{}",
                self.width, self.height
            )));
        }

        let frame_array =
            ndarray::Array3::from_shape_vec((height, width, 3), img_buffer.into_raw())
                .map_err(|e| TrackError::VideoError(e.to_string()))?;

        self.encoder
            .encode(&frame_array, self.position)
            .map_err(|e| TrackError::VideoError(format!("Failed to encode frame: {e}")))?;

        self.position = self.position.aligned_with(self.frame_duration).add();
        Ok(())
    }

    /// Finish writing the video.
    ///
    /// # Errors
    ///
    /// Returns an error if the encoder fails to finish.
    pub fn finish(mut self) -> Result<()> {
        self.encoder.finish().map_err(|e| {
            TrackError::VideoError(format!("Failed to finish video encoding: {e}"))
        })
    }
}

enum Backend {
    #[cfg(feature = "video")]
    Video(VideoWriter),
    #[cfg_attr(feature = "video", allow(dead_code))]
    Images(PathBuf),
}

/// Destination for processed frames, one output frame per input frame.
pub struct FrameSink {
    backend: Backend,
    written: usize,
}

impl FrameSink {
    /// Open the sink in `output_dir`.
    ///
    /// With the `video` feature this encodes [`OUTPUT_VIDEO`]; without it every frame is
    /// saved as `frames/{index:06}.jpg`.
    ///
    /// # Errors
    ///
    /// Returns an error if the encoder or the frame directory cannot be created.
    pub fn open<P: AsRef<Path>>(output_dir: P, info: VideoInfo) -> Result<Self> {
        let output_dir = output_dir.as_ref();

        #[cfg(feature = "video")]
        let backend = Backend::Video(VideoWriter::new(output_dir.join(OUTPUT_VIDEO), info)?);

        #[cfg(not(feature = "video"))]
        let backend = {
            let _ = info;
            let dir = output_dir.join(OUTPUT_FRAMES_DIR);
            std::fs::create_dir_all(&dir).map_err(|e| {
                TrackError::IoError(format!("Failed to create directory {}: {e}", dir.display()))
            })?;
            Backend::Images(dir)
        };

        Ok(Self {
            backend,
            written: 0,
        })
    }

    /// Append a frame.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or saving fails.
    pub fn write(&mut self, frame: &DynamicImage) -> Result<()> {
        match &mut self.backend {
            #[cfg(feature = "video")]
            Backend::Video(writer) => writer.write_frame(frame)?,
            Backend::Images(dir) => {
                let path = dir.join(format!("{:06}.jpg", self.written));
                frame
                    .to_rgb8()
                    .save(&path)
                    .map_err(|e| TrackError::ImageError(format!("{}: {e}", path.display())))?;
            }
        }
        self.written += 1;
        Ok(())
    }

    /// Number of frames written so far.
    #[must_use]
    pub const fn frames_written(&self) -> usize {
        self.written
    }

    /// Finalize the output.
    ///
    /// # Errors
    ///
    /// Returns an error if the encoder fails to finish.
    pub fn finish(self) -> Result<()> {
        match self.backend {
            #[cfg(feature = "video")]
            Backend::Video(writer) => writer.finish(),
            Backend::Images(_) => Ok(()),
        }
    }
}

#[cfg(all(test, not(feature = "video")))]
mod tests {
    use super::*;

    #[test]
    fn test_frames_are_numbered() {
        let dir = tempfile::tempdir().unwrap();
        let info = VideoInfo {
            fps: 30.0,
            width: 4,
            height: 4,
        };
        let mut sink = FrameSink::open(dir.path(), info).unwrap();
        let frame = DynamicImage::new_rgb8(4, 4);
        sink.write(&frame).unwrap();
        sink.write(&frame).unwrap();
        assert_eq!(sink.frames_written(), 2);
        sink.finish().unwrap();

        let frames_dir = dir.path().join(OUTPUT_FRAMES_DIR);
        assert!(frames_dir.join("000000.jpg").exists());
        assert!(frames_dir.join("000001.jpg").exists());
    }
}
