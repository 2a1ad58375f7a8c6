// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use crate::pose::Identity;

/// Color type for visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color(pub u8, pub u8, pub u8);

impl Color {
    /// Yellow color.
    pub const YELLOW: Self = Self(255, 255, 0);
    /// White color.
    pub const WHITE: Self = Self(255, 255, 255);
    /// Red color.
    pub const RED: Self = Self(255, 0, 0);

    /// Create a new color from RGB values.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self(r, g, b)
    }

    /// Stable color for a tracked identity.
    ///
    /// The identity is mixed with the `SplitMix64` finalizer and the low three bytes of
    /// the result become the channels, so the same subject keeps its color for the
    /// whole video and across runs.
    #[must_use]
    pub const fn from_identity(identity: Identity) -> Self {
        #[allow(clippy::cast_sign_loss)]
        let mut z = (identity.0 as u64).wrapping_add(0x9E37_79B9_7F4A_7C15);
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^= z >> 31;
        let [r, g, b, ..] = z.to_le_bytes();
        Self(r, g, b)
    }

    /// Convert to an `image` pixel.
    #[must_use]
    pub const fn to_rgb(self) -> image::Rgb<u8> {
        image::Rgb([self.0, self.1, self.2])
    }
}

/// Joint marker color, shared by every identity.
pub const MARKER_COLOR: Color = Color::YELLOW;
