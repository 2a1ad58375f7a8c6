// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Live preview window for annotated frames.

use std::time::{Duration, Instant};

use image::DynamicImage;
use minifb::{Key, Window, WindowOptions};

use crate::error::{Result, TrackError};

/// A preview window using minifb. `q` or `Esc` asks the pipeline to stop.
pub struct Viewer {
    window: Window,
    /// Width of the last shown frame.
    pub width: usize,
    /// Height of the last shown frame.
    pub height: usize,
    buffer: Vec<u32>,
}

impl Viewer {
    /// Create a new preview window.
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::VisualizerError`] if no window can be created.
    pub fn new(title: &str, width: usize, height: usize) -> Result<Self> {
        let mut window = Window::new(
            title,
            width,
            height,
            WindowOptions {
                resize: true,
                ..WindowOptions::default()
            },
        )
        .map_err(|e| TrackError::VisualizerError(format!("Failed to create window: {e}")))?;

        window.set_target_fps(60);

        Ok(Self {
            window,
            width,
            height,
            buffer: vec![0; width * height],
        })
    }

    /// Whether the operator asked to quit.
    fn quit_requested(&self) -> bool {
        !self.window.is_open()
            || self.window.is_key_down(Key::Escape)
            || self.window.is_key_down(Key::Q)
    }

    /// Show a frame and keep the window responsive for `delay`.
    ///
    /// Returns `Ok(false)` once the operator closes the preview.
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::VisualizerError`] if the window cannot be redrawn.
    pub fn show(&mut self, image: &DynamicImage, delay: Duration) -> Result<bool> {
        if self.quit_requested() {
            return Ok(false);
        }

        let rgb = image.to_rgb8();
        self.width = rgb.width() as usize;
        self.height = rgb.height() as usize;
        self.buffer.resize(self.width * self.height, 0);

        // minifb expects 0x00RRGGBB
        for (dst, pixel) in self.buffer.iter_mut().zip(rgb.pixels()) {
            let [r, g, b] = pixel.0;
            *dst = (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b);
        }

        let start = Instant::now();
        loop {
            self.window
                .update_with_buffer(&self.buffer, self.width, self.height)
                .map_err(|e| {
                    TrackError::VisualizerError(format!("Failed to update window: {e}"))
                })?;
            if self.quit_requested() {
                return Ok(false);
            }
            if start.elapsed() >= delay {
                return Ok(true);
            }
        }
    }
}
