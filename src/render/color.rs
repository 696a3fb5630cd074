use crate::foundation::core::Rgba8Premul;
use crate::foundation::error::{FxError, FxResult};
use crate::foundation::math::{premul_u8, unit_to_u8, unpremul_f32};
use crate::render::canvas::{BlendMode, blend_px};
use crate::render::image::Image;
use rayon::prelude::*;
use std::sync::Arc;

/// 4x5 identity color matrix.
pub const IDENTITY_MATRIX: [f32; 20] = [
    1.0, 0.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 0.0, 1.0, 0.0, //
];

pub(crate) fn is_identity_color_matrix(m: &[f32; 20]) -> bool {
    let eps = 1.0e-6;
    m.iter()
        .zip(IDENTITY_MATRIX.iter())
        .all(|(a, b)| (*a - *b).abs() <= eps)
}

/// Compose two 4x5 affine color matrices as `a(b(x))`.
pub fn mul_color_matrix(a: [f32; 20], b: [f32; 20]) -> [f32; 20] {
    // out = M * [r,g,b,a,1]
    let mut out = [0.0f32; 20];
    for row in 0..4 {
        let base = row * 5;
        for col in 0..4 {
            let mut v = 0.0f32;
            for k in 0..4 {
                v += a[base + k] * b[k * 5 + col];
            }
            out[base + col] = v;
        }
        out[base + 4] = a[base + 4]
            + a[base] * b[4]
            + a[base + 1] * b[9]
            + a[base + 2] * b[14]
            + a[base + 3] * b[19];
    }
    out
}

/// Saturation matrix; `1` is identity, `0` is grayscale.
pub fn saturate_matrix(s: f32) -> [f32; 20] {
    [
        0.213 + 0.787 * s,
        0.715 - 0.715 * s,
        0.072 - 0.072 * s,
        0.0,
        0.0,
        0.213 - 0.213 * s,
        0.715 + 0.285 * s,
        0.072 - 0.072 * s,
        0.0,
        0.0,
        0.213 - 0.213 * s,
        0.715 - 0.715 * s,
        0.072 + 0.928 * s,
        0.0,
        0.0,
        0.0,
        0.0,
        0.0,
        1.0,
        0.0,
    ]
}

/// Hue rotation by `degrees`.
pub fn hue_rotate_matrix(degrees: f32) -> [f32; 20] {
    let (sin, cos) = degrees.to_radians().sin_cos();
    [
        0.213 + cos * 0.787 - sin * 0.213,
        0.715 - cos * 0.715 - sin * 0.715,
        0.072 - cos * 0.072 + sin * 0.928,
        0.0,
        0.0,
        0.213 - cos * 0.213 + sin * 0.143,
        0.715 + cos * 0.285 + sin * 0.140,
        0.072 - cos * 0.072 - sin * 0.283,
        0.0,
        0.0,
        0.213 - cos * 0.213 - sin * 0.787,
        0.715 - cos * 0.715 + sin * 0.715,
        0.072 + cos * 0.928 + sin * 0.072,
        0.0,
        0.0,
        0.0,
        0.0,
        0.0,
        1.0,
        0.0,
    ]
}

/// Adds luminance to alpha while keeping color channels.
pub fn luminance_to_alpha_matrix() -> [f32; 20] {
    let mut m = [0.0; 20];
    m[0] = 1.0;
    m[6] = 1.0;
    m[12] = 1.0;
    m[15] = 0.2125;
    m[16] = 0.7154;
    m[17] = 0.0721;
    m[18] = 1.0;
    m
}

/// Scales color channels by `amount`.
pub fn brightness_matrix(amount: f32) -> [f32; 20] {
    let mut m = [0.0; 20];
    m[0] = amount;
    m[6] = amount;
    m[12] = amount;
    m[18] = 1.0;
    m
}

/// Contrast in percent; `0` is identity, `-100` collapses to mid gray.
pub fn contrast_matrix(contrast: f32) -> [f32; 20] {
    let scale = (100.0 + contrast) / 100.0;
    let scale = scale * scale;
    let bias = 0.5 * (1.0 - scale);
    let mut m = [0.0; 20];
    m[0] = scale;
    m[6] = scale;
    m[12] = scale;
    m[18] = 1.0;
    m[4] = bias;
    m[9] = bias;
    m[14] = bias;
    m
}

/// Per-channel multiply then add; alpha is untouched.
pub fn lighting_matrix(multiply: Rgba8Premul, add: Rgba8Premul) -> [f32; 20] {
    let f = |v: u8| f32::from(v) / 255.0;
    let mut m = [0.0; 20];
    m[0] = f(multiply.r);
    m[6] = f(multiply.g);
    m[12] = f(multiply.b);
    m[18] = 1.0;
    m[4] = f(add.r);
    m[9] = f(add.g);
    m[14] = f(add.b);
    m
}

/// Luma into alpha, color channels cleared.
pub fn luma_color_matrix() -> [f32; 20] {
    let mut m = [0.0; 20];
    m[15] = 0.2126;
    m[16] = 0.7152;
    m[17] = 0.0722;
    m
}

fn apply_matrix_px(px: [u8; 4], m: &[f32; 20]) -> [u8; 4] {
    let [r, g, b, a] = unpremul_f32(px);
    let row = |i: usize| m[i] * r + m[i + 1] * g + m[i + 2] * b + m[i + 3] * a + m[i + 4];
    premul_u8([row(0), row(5), row(10), row(15)])
}

/// One 256-entry channel lookup table.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct LookupTable(Vec<u8>);

impl LookupTable {
    /// Wrap exactly 256 entries.
    pub fn new(entries: Vec<u8>) -> FxResult<Self> {
        if entries.len() != 256 {
            return Err(FxError::validation("lookup table must have 256 entries"));
        }
        Ok(Self(entries))
    }

    /// `i -> i`.
    pub fn identity() -> Self {
        Self((0..=255).collect())
    }

    /// Table filled from a mapping function.
    pub fn from_fn(f: impl Fn(u8) -> u8) -> Self {
        Self((0..=255).map(f).collect())
    }

    /// Blend between identity (`0`) and this table (`1`).
    pub fn with_strength(&self, strength: f32) -> Self {
        let s = strength.clamp(0.0, 1.0);
        if s >= 1.0 {
            return self.clone();
        }
        Self(
            self.0
                .iter()
                .enumerate()
                .map(|(i, &v)| {
                    let i = i as f32;
                    (i + (f32::from(v) - i) * s).round().clamp(0.0, 255.0) as u8
                })
                .collect(),
        )
    }

    /// Look up one value.
    pub fn get(&self, v: u8) -> u8 {
        self.0[usize::from(v)]
    }

    /// Raw entries.
    pub fn entries(&self) -> &[u8] {
        &self.0
    }
}

/// Separate lookup tables per channel.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct LookupTables {
    /// Alpha.
    pub a: LookupTable,
    /// Red.
    pub r: LookupTable,
    /// Green.
    pub g: LookupTable,
    /// Blue.
    pub b: LookupTable,
}

impl LookupTables {
    /// Same table for every channel.
    pub fn uniform(t: LookupTable) -> Self {
        Self {
            a: t.clone(),
            r: t.clone(),
            g: t.clone(),
            b: t,
        }
    }

    /// Every table blended toward identity.
    pub fn with_strength(&self, strength: f32) -> Self {
        Self {
            a: self.a.with_strength(strength),
            r: self.r.with_strength(strength),
            g: self.g.with_strength(strength),
            b: self.b.with_strength(strength),
        }
    }
}

/// Inversion applied by the high-contrast filter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum InvertStyle {
    /// Keep colors.
    #[default]
    NoInvert,
    /// Invert each channel.
    InvertBrightness,
    /// Invert HSL lightness, keeping hue and saturation.
    InvertLightness,
}

/// High-contrast filter settings.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct HighContrast {
    /// Reduce to luma first.
    pub grayscale: bool,
    /// Inversion step.
    pub invert: InvertStyle,
    /// In `-1..=1`.
    pub contrast: f32,
}

fn rgb_to_hsl(r: f32, g: f32, b: f32) -> (f32, f32, f32) {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;
    if max == min {
        return (0.0, 0.0, l);
    }
    let d = max - min;
    let s = if l > 0.5 {
        d / (2.0 - max - min)
    } else {
        d / (max + min)
    };
    let h = if max == r {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };
    (h / 6.0, s, l)
}

fn hsl_to_rgb(h: f32, s: f32, l: f32) -> (f32, f32, f32) {
    if s == 0.0 {
        return (l, l, l);
    }
    fn hue(p: f32, q: f32, mut t: f32) -> f32 {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        }
    }
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    (
        hue(p, q, h + 1.0 / 3.0),
        hue(p, q, h),
        hue(p, q, h - 1.0 / 3.0),
    )
}

impl HighContrast {
    fn apply_px(&self, px: [u8; 4]) -> [u8; 4] {
        let [mut r, mut g, mut b, a] = unpremul_f32(px);
        if a <= 0.0 {
            return [0; 4];
        }
        if self.grayscale {
            let l = 0.2126 * r + 0.7152 * g + 0.0722 * b;
            (r, g, b) = (l, l, l);
        }
        match self.invert {
            InvertStyle::NoInvert => {}
            InvertStyle::InvertBrightness => {
                (r, g, b) = (1.0 - r, 1.0 - g, 1.0 - b);
            }
            InvertStyle::InvertLightness => {
                let (h, s, l) = rgb_to_hsl(r, g, b);
                (r, g, b) = hsl_to_rgb(h, s, 1.0 - l);
            }
        }
        let k = self.contrast.clamp(-1.0 + f32::EPSILON, 1.0 - f32::EPSILON);
        let f = (1.0 + k) / (1.0 - k);
        let c = |v: f32| ((v - 0.5) * f + 0.5).clamp(0.0, 1.0);
        premul_u8([c(r), c(g), c(b), a])
    }
}

/// Per-pixel color transform.
///
/// Matrices are row-major 4x5 over straight-alpha channels in `0..=1`, bias included.
#[derive(Clone, Debug, PartialEq)]
pub enum ColorFilter {
    /// 4x5 color matrix.
    Matrix([f32; 20]),
    /// Per-channel lookup on straight-alpha values.
    Table(Arc<LookupTables>),
    /// Accessibility high-contrast transform.
    HighContrast(HighContrast),
    /// Blend a constant color (source) onto each pixel (destination).
    Blend {
        /// Source color.
        color: Rgba8Premul,
        /// Blend mode.
        mode: BlendMode,
    },
    /// `outer(inner(x))`.
    Compose(Arc<ColorFilter>, Arc<ColorFilter>),
}

impl ColorFilter {
    /// Matrix filter.
    pub fn matrix(m: [f32; 20]) -> Self {
        Self::Matrix(m)
    }

    /// Table filter.
    pub fn table(t: LookupTables) -> Self {
        Self::Table(Arc::new(t))
    }

    /// `outer(inner(x))`; two matrices fold into one.
    pub fn compose(outer: Self, inner: Self) -> Self {
        match (outer, inner) {
            (Self::Matrix(a), Self::Matrix(b)) => Self::Matrix(mul_color_matrix(a, b)),
            (outer, inner) => Self::Compose(Arc::new(outer), Arc::new(inner)),
        }
    }

    /// Return `true` when this filter leaves every pixel unchanged.
    pub fn is_identity(&self) -> bool {
        matches!(self, Self::Matrix(m) if is_identity_color_matrix(m))
    }

    /// Transform one premultiplied pixel.
    pub fn apply_px(&self, px: [u8; 4]) -> [u8; 4] {
        match self {
            Self::Matrix(m) => apply_matrix_px(px, m),
            Self::Table(t) => {
                let [r, g, b, a] = unpremul_f32(px);
                let f = |v: u8| f32::from(v) / 255.0;
                premul_u8([
                    f(t.r.get(unit_to_u8(r))),
                    f(t.g.get(unit_to_u8(g))),
                    f(t.b.get(unit_to_u8(b))),
                    f(t.a.get(unit_to_u8(a))),
                ])
            }
            Self::HighContrast(hc) => hc.apply_px(px),
            Self::Blend { color, mode } => blend_px(px, color.to_array(), *mode),
            Self::Compose(outer, inner) => outer.apply_px(inner.apply_px(px)),
        }
    }

    /// Transform every pixel of `image`.
    pub fn apply_image(&self, image: &Image) -> Image {
        if self.is_identity() || image.is_empty() {
            return image.clone();
        }
        let mut out = image.data().to_vec();
        let row_bytes = (image.width() as usize) * 4;
        out.par_chunks_mut(row_bytes).for_each(|row| {
            for px in row.chunks_exact_mut(4) {
                let v = self.apply_px([px[0], px[1], px[2], px[3]]);
                px.copy_from_slice(&v);
            }
        });
        Image::from_parts(image.width(), image.height(), out)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/color.rs"]
mod tests;
