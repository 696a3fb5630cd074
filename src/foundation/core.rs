pub use kurbo::{Affine, Point, Rect, Size, Vec2};

/// Symbolic extent of an effect chain.
///
/// `Invalid` marks an extent that cannot be known without materializing pixels, e.g. after a
/// custom raster operation that does not describe how it transforms its bounds.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Bounds {
    /// A concrete logical-space rectangle.
    Valid(Rect),
    /// Unknown until rendered.
    Invalid,
}

impl Bounds {
    /// Return `true` for the invalid sentinel.
    pub fn is_invalid(self) -> bool {
        matches!(self, Self::Invalid)
    }

    /// The rectangle, if known.
    pub fn rect(self) -> Option<Rect> {
        match self {
            Self::Valid(r) => Some(r),
            Self::Invalid => None,
        }
    }

    /// Map a valid rectangle, leaving the invalid sentinel untouched.
    pub fn map(self, f: impl FnOnce(Rect) -> Rect) -> Self {
        match self {
            Self::Valid(r) => Self::Valid(f(r)),
            Self::Invalid => Self::Invalid,
        }
    }
}

impl From<Rect> for Bounds {
    fn from(r: Rect) -> Self {
        Self::Valid(r)
    }
}

/// Grow `r` by a different amount on each side. Negative values shrink.
pub fn inflate_sides(r: Rect, left: f64, top: f64, right: f64, bottom: f64) -> Rect {
    Rect::new(r.x0 - left, r.y0 - top, r.x1 + right, r.y1 + bottom)
}

/// The same extent as `r`, placed at the origin.
pub fn local_rect(r: Rect) -> Rect {
    Rect::from_origin_size(Point::ZERO, r.size())
}

/// Pixel dimensions needed to hold `r`, rounding partial pixels up.
pub fn pixel_size(r: Rect) -> (u32, u32) {
    fn dim(v: f64) -> u32 {
        if !v.is_finite() || v <= 0.0 {
            return 0;
        }
        v.ceil().min(f64::from(u32::MAX)) as u32
    }
    (dim(r.width()), dim(r.height()))
}

/// Premultiplied RGBA8 (r,g,b already multiplied by a).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Rgba8Premul {
    /// Red channel premultiplied by alpha.
    pub r: u8,
    /// Green channel premultiplied by alpha.
    pub g: u8,
    /// Blue channel premultiplied by alpha.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8Premul {
    /// Fully transparent black.
    pub fn transparent() -> Self {
        Self {
            r: 0,
            g: 0,
            b: 0,
            a: 0,
        }
    }

    /// Convert straight-alpha RGBA8 into premultiplied RGBA8.
    pub fn from_straight_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        fn premul(c: u8, a: u8) -> u8 {
            let c = u16::from(c);
            let a = u16::from(a);
            (((c * a) + 127) / 255) as u8
        }

        Self {
            r: premul(r, a),
            g: premul(g, a),
            b: premul(b, a),
            a,
        }
    }

    /// Byte layout used by surfaces.
    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Straight-alpha channels in `0..=1`.
    pub fn to_straight_f32(self) -> [f32; 4] {
        if self.a == 0 {
            return [0.0; 4];
        }
        let a = f32::from(self.a) / 255.0;
        [
            (f32::from(self.r) / 255.0 / a).min(1.0),
            (f32::from(self.g) / 255.0 / a).min(1.0),
            (f32::from(self.b) / 255.0 / a).min(1.0),
            a,
        ]
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
