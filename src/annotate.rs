// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Skeleton overlay rendering.

use image::{DynamicImage, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};

use crate::continuity::SelectedPose;
use crate::pose::{Keypoint, Pose};
use crate::visualizer::color::{Color, MARKER_COLOR};
use crate::visualizer::skeleton::bones;

/// Joint marker radius in pixels.
pub const MARKER_RADIUS: i32 = 3;

/// Bone line thickness in pixels.
pub const BONE_THICKNESS: i32 = 2;

/// Bones whose two endpoints are both valid keypoints.
#[must_use]
pub fn drawable_bones(pose: &Pose) -> Vec<[usize; 2]> {
    bones()
        .filter(|&[a, b]| pose.0[a].is_valid() && pose.0[b].is_valid())
        .collect()
}

/// Clip the segment `p0 -> p1` to the pixel grid of a `width x height` image
/// (Liang-Barsky). Returns `None` when no part of it lies on the image.
fn clip_segment(
    p0: (f64, f64),
    p1: (f64, f64),
    width: u32,
    height: u32,
) -> Option<((f32, f32), (f32, f32))> {
    if width == 0 || height == 0 {
        return None;
    }
    let (x_max, y_max) = (f64::from(width - 1), f64::from(height - 1));
    let (dx, dy) = (p1.0 - p0.0, p1.1 - p0.1);
    let (mut t0, mut t1) = (0.0_f64, 1.0_f64);

    for (p, q) in [
        (-dx, p0.0),
        (dx, x_max - p0.0),
        (-dy, p0.1),
        (dy, y_max - p0.1),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    let at = |t: f64| ((p0.0 + t * dx) as f32, (p0.1 + t * dy) as f32);
    Some((at(t0), at(t1)))
}

/// Draw a line `thickness` pixels wide by stacking 1px segments across the minor axis.
/// Each segment is clipped to the image first, so far off-image endpoints are safe.
fn draw_thick_line(
    img: &mut RgbImage,
    start: Keypoint,
    end: Keypoint,
    color: Color,
    thickness: i32,
) {
    let (x1, y1) = start.to_pixel();
    let (x2, y2) = end.to_pixel();
    let (x1, y1, x2, y2) = (f64::from(x1), f64::from(y1), f64::from(x2), f64::from(y2));
    let steep = (y2 - y1).abs() > (x2 - x1).abs();

    for t in 0..thickness.max(1) {
        let t = f64::from(t);
        let (ox, oy) = if steep { (t, 0.0) } else { (0.0, t) };
        if let Some((a, b)) = clip_segment(
            (x1 + ox, y1 + oy),
            (x2 + ox, y2 + oy),
            img.width(),
            img.height(),
        ) {
            draw_line_segment_mut(img, a, b, color.to_rgb());
        }
    }
}

/// Draw a filled marker, skipping centers whose disc cannot touch the image.
pub fn draw_marker(img: &mut RgbImage, center: (i32, i32), radius: i32, color: Color) {
    let (x, y) = (i64::from(center.0), i64::from(center.1));
    let r = i64::from(radius);
    if x < -r || y < -r || x > i64::from(img.width()) + r || y > i64::from(img.height()) + r {
        return;
    }
    draw_filled_circle_mut(img, center, radius, color.to_rgb());
}

/// Draw one pose onto an image in place.
///
/// Valid keypoints get a filled [`MARKER_COLOR`] marker; a bone is drawn in `color`
/// only when both of its endpoints are valid. Everything else is skipped silently, and
/// whatever falls outside the image is clipped.
pub fn draw_pose(img: &mut RgbImage, pose: &Pose, color: Color) {
    for kp in pose.iter().filter(|kp| kp.is_valid()) {
        draw_marker(img, kp.to_pixel(), MARKER_RADIUS, MARKER_COLOR);
    }

    for [a, b] in drawable_bones(pose) {
        draw_thick_line(img, pose.0[a], pose.0[b], color, BONE_THICKNESS);
    }
}

/// Annotate a frame with every selected pose, each in its identity color.
///
/// Recovered poses are drawn the same way as observed ones.
#[must_use]
pub fn annotate_frame(image: &DynamicImage, selections: &[SelectedPose]) -> DynamicImage {
    let mut img = image.to_rgb8();
    for sel in selections {
        draw_pose(&mut img, &sel.pose, Color::from_identity(sel.identity));
    }
    DynamicImage::ImageRgb8(img)
}
