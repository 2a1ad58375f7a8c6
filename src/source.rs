// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Frame sources for the tracking pipeline.
//!
//! A source is opened once, reports its intrinsic parameters ([`VideoInfo`]) and then
//! yields frames strictly in order until exhausted.

use std::path::{Path, PathBuf};

use image::{DynamicImage, GenericImageView};

use crate::error::{Result, TrackError};

/// Represents the supported frame sources.
#[derive(Debug, Clone)]
pub enum Source {
    /// Path to a video file.
    Video(PathBuf),
    /// Directory of frame images, read in file name order.
    Directory(PathBuf),
    /// Glob pattern for frame images, e.g. `frames/*.png`.
    Glob(String),
    /// Explicit list of frame images.
    ImageList(Vec<PathBuf>),
    /// In-memory frames.
    Frames(Vec<DynamicImage>),
}

impl Source {
    /// Human-readable name used in log lines.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Video(p) | Self::Directory(p) => p.display().to_string(),
            Self::Glob(pattern) => pattern.clone(),
            Self::ImageList(paths) => format!("{} images", paths.len()),
            Self::Frames(frames) => format!("{} in-memory frames", frames.len()),
        }
    }
}

/// Convert from a string path to Source.
impl From<&str> for Source {
    fn from(s: &str) -> Self {
        if s.contains('*') {
            return Self::Glob(s.to_string());
        }

        let path = PathBuf::from(s);
        if path.is_dir() {
            return Self::Directory(path);
        }

        if is_image_file(&path) {
            return Self::ImageList(vec![path]);
        }

        Self::Video(path)
    }
}

impl From<String> for Source {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<&Path> for Source {
    fn from(path: &Path) -> Self {
        Self::from(path.to_string_lossy().as_ref())
    }
}

impl From<Vec<DynamicImage>> for Source {
    fn from(frames: Vec<DynamicImage>) -> Self {
        Self::Frames(frames)
    }
}

/// Intrinsic parameters of an opened source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoInfo {
    /// Frames per second.
    pub fps: f32,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
}

impl VideoInfo {
    /// Preview delay between frames (`1000 / fps` ms).
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn frame_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis((1000.0 / self.fps.max(1.0)) as u64)
    }
}

/// Metadata about a source frame.
#[derive(Debug, Clone, Default)]
pub struct SourceMeta {
    /// Frame index, starting at 0.
    pub frame_idx: usize,
    /// Total frames, when known up front.
    pub total_frames: Option<usize>,
}

/// Check if a path is an image file based on extension.
fn is_image_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| {
        let ext = ext.to_string_lossy().to_lowercase();
        matches!(
            ext.as_str(),
            "jpg" | "jpeg" | "png" | "bmp" | "gif" | "webp" | "tiff" | "tif"
        )
    })
}

/// Collect image paths from a directory.
fn collect_images_from_dir(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|e| TrackError::SourceError(format!("Cannot read {}: {e}", dir.display())))?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| is_image_file(path))
        .collect();

    paths.sort();
    Ok(paths)
}

/// Collect image paths from a simple `dir/*.ext` glob pattern.
fn collect_images_from_glob(pattern: &str) -> Result<Vec<PathBuf>> {
    let Some(star_pos) = pattern.find('*') else {
        return Ok(vec![PathBuf::from(pattern)]);
    };

    let dir_part = &pattern[..star_pos];
    let dir = if dir_part.is_empty() {
        Path::new(".")
    } else {
        Path::new(dir_part.trim_end_matches(['/', '\\']))
    };
    let ext_filter = pattern[star_pos..].strip_prefix("*.").map(str::to_lowercase);

    let paths = collect_images_from_dir(dir)?
        .into_iter()
        .filter(|path| {
            ext_filter.as_ref().is_none_or(|ext| {
                path.extension()
                    .is_some_and(|e| e.to_string_lossy().to_lowercase() == *ext)
            })
        })
        .collect();
    Ok(paths)
}

fn open_image(path: &Path) -> Result<DynamicImage> {
    image::open(path)
        .map_err(|e| TrackError::ImageError(format!("Failed to load {}: {e}", path.display())))
}

enum Frames {
    Images {
        paths: Vec<PathBuf>,
        first: Option<DynamicImage>,
    },
    Memory(std::vec::IntoIter<DynamicImage>),
    #[cfg(feature = "video")]
    Video(video_rs::decode::Decoder),
}

/// Iterator over the frames of an opened source.
pub struct SourceIterator {
    frames: Frames,
    info: VideoInfo,
    current_frame: usize,
    total_frames: Option<usize>,
}

impl SourceIterator {
    /// Open a source and read its intrinsic parameters.
    ///
    /// Image sequences take their size from the first frame and use `fallback_fps`.
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::SourceError`] if the source cannot be opened or holds no
    /// frames.
    pub fn open(source: Source, fallback_fps: f32) -> Result<Self> {
        match source {
            Source::Video(path) => Self::open_video(&path),
            Source::Directory(dir) => {
                if !dir.is_dir() {
                    return Err(TrackError::SourceError(format!(
                        "Not a directory: {}",
                        dir.display()
                    )));
                }
                Self::open_images(collect_images_from_dir(&dir)?, fallback_fps)
            }
            Source::Glob(pattern) => {
                Self::open_images(collect_images_from_glob(&pattern)?, fallback_fps)
            }
            Source::ImageList(paths) => Self::open_images(paths, fallback_fps),
            Source::Frames(frames) => {
                let first = frames
                    .first()
                    .ok_or_else(|| TrackError::SourceError("No frames provided".to_string()))?;
                let (width, height) = first.dimensions();
                let total = frames.len();
                Ok(Self {
                    frames: Frames::Memory(frames.into_iter()),
                    info: VideoInfo {
                        fps: fallback_fps,
                        width,
                        height,
                    },
                    current_frame: 0,
                    total_frames: Some(total),
                })
            }
        }
    }

    fn open_images(mut paths: Vec<PathBuf>, fps: f32) -> Result<Self> {
        if paths.is_empty() {
            return Err(TrackError::SourceError("No images found".to_string()));
        }
        let first = open_image(&paths[0])
            .map_err(|e| TrackError::SourceError(format!("Could not open source: {e}")))?;
        let (width, height) = first.dimensions();
        let total = paths.len();
        paths.reverse();

        Ok(Self {
            frames: Frames::Images {
                paths,
                first: Some(first),
            },
            info: VideoInfo { fps, width, height },
            current_frame: 0,
            total_frames: Some(total),
        })
    }

    #[cfg(feature = "video")]
    fn open_video(path: &Path) -> Result<Self> {
        crate::io::init_video();

        let decoder = video_rs::decode::Decoder::new(path).map_err(|e| {
            TrackError::SourceError(format!("Could not open video {}: {e}", path.display()))
        })?;
        let fps = decoder.frame_rate();
        let (width, height) = decoder.size();

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let total_frames = decoder
            .duration()
            .ok()
            .map(|d| (d.as_secs_f64() * f64::from(fps)) as usize);

        Ok(Self {
            frames: Frames::Video(decoder),
            info: VideoInfo { fps, width, height },
            current_frame: 0,
            total_frames,
        })
    }

    #[cfg(not(feature = "video"))]
    fn open_video(_path: &Path) -> Result<Self> {
        Err(TrackError::FeatureNotEnabled(
            "Video support requires 'video' feature".to_string(),
        ))
    }

    /// Intrinsic parameters of the source.
    #[must_use]
    pub const fn info(&self) -> VideoInfo {
        self.info
    }

    fn next_frame(&mut self) -> Option<Result<DynamicImage>> {
        match &mut self.frames {
            Frames::Images { paths, first } => {
                let path = paths.pop()?;
                Some(first.take().map_or_else(|| open_image(&path), Ok))
            }
            Frames::Memory(iter) => iter.next().map(Ok),
            #[cfg(feature = "video")]
            Frames::Video(decoder) => match decoder.decode() {
                Ok((_ts, frame)) => Some(video_frame_to_image(&frame)),
                // video-rs reports end of stream as an error
                Err(_) => None,
            },
        }
    }
}

impl Iterator for SourceIterator {
    type Item = Result<(DynamicImage, SourceMeta)>;

    fn next(&mut self) -> Option<Self::Item> {
        let frame = self.next_frame()?;
        let meta = SourceMeta {
            frame_idx: self.current_frame,
            total_frames: self.total_frames,
        };
        self.current_frame += 1;
        Some(frame.map(|img| (img, meta)))
    }
}

#[cfg(feature = "video")]
/// Convert a `video_rs` HWC frame to `DynamicImage`.
fn video_frame_to_image(arr: &video_rs::Frame) -> Result<DynamicImage> {
    let shape = arr.shape();
    let height = u32::try_from(shape[0])
        .map_err(|_| TrackError::ImageError("Image height exceeds u32::MAX".to_string()))?;
    let width = u32::try_from(shape[1])
        .map_err(|_| TrackError::ImageError("Image width exceeds u32::MAX".to_string()))?;

    let rgb_data: Vec<u8> = arr.iter().copied().collect();
    let img_buffer = image::RgbImage::from_raw(width, height, rgb_data).ok_or_else(|| {
        TrackError::ImageError("Failed to create image from video frame".to_string())
    })?;

    Ok(DynamicImage::ImageRgb8(img_buffer))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_from_string() {
        assert!(matches!(Source::from("video.mp4"), Source::Video(_)));
        assert!(matches!(Source::from("frames/*.png"), Source::Glob(_)));
        assert!(matches!(Source::from("frame.jpg"), Source::ImageList(_)));
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(Source::from(dir.path()), Source::Directory(_)));
    }

    #[test]
    fn test_in_memory_frames() {
        let frames = vec![DynamicImage::new_rgb8(8, 6); 3];
        let iter = SourceIterator::open(Source::from(frames), 25.0).unwrap();
        assert_eq!(
            iter.info(),
            VideoInfo {
                fps: 25.0,
                width: 8,
                height: 6
            }
        );

        let idx: Vec<usize> = iter.map(|r| r.unwrap().1.frame_idx).collect();
        assert_eq!(idx, vec![0, 1, 2]);
    }

    #[test]
    fn test_empty_sources_fail_to_open() {
        assert!(matches!(
            SourceIterator::open(Source::Frames(vec![]), 30.0),
            Err(TrackError::SourceError(_))
        ));
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            SourceIterator::open(Source::Directory(dir.path().to_path_buf()), 30.0),
            Err(TrackError::SourceError(_))
        ));
        assert!(
            SourceIterator::open(Source::Directory(PathBuf::from("/no/such/dir")), 30.0).is_err()
        );
    }

    #[test]
    fn test_directory_frames_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        for (name, w) in [("b.png", 4), ("a.png", 2), ("c.png", 6)] {
            DynamicImage::new_rgb8(w, 3).save(dir.path().join(name)).unwrap();
        }
        std::fs::write(dir.path().join("notes.txt"), "skip").unwrap();

        let iter = SourceIterator::open(Source::Directory(dir.path().to_path_buf()), 10.0).unwrap();
        assert_eq!(iter.info().width, 2);
        let widths: Vec<u32> = iter.map(|r| r.unwrap().0.width()).collect();
        assert_eq!(widths, vec![2, 4, 6]);
    }

    #[test]
    fn test_describe() {
        assert_eq!(Source::from("frames/*.png").describe(), "frames/*.png");
        assert_eq!(
            Source::Frames(vec![DynamicImage::new_rgb8(1, 1); 2]).describe(),
            "2 in-memory frames"
        );
        assert_eq!(
            Source::ImageList(vec![PathBuf::from("a.jpg")]).describe(),
            "1 images"
        );
    }

    #[test]
    fn test_frame_delay() {
        let info = VideoInfo {
            fps: 25.0,
            width: 1,
            height: 1,
        };
        assert_eq!(info.frame_delay().as_millis(), 40);
    }
}
