use crate::foundation::core::{Affine, Point, Rect};
use crate::foundation::math::{mul_div255_u8, premul_u8, unpremul_f32};
use crate::render::canvas::{BlendMode, blend_px};
use crate::render::image::{Image, Layer};
use rayon::prelude::*;

/// Edge handling for kernels that sample outside their input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum TileMode {
    /// Repeat the edge pixel.
    Clamp,
    /// Wrap around.
    Repeat,
    /// Reflect at the edges.
    Mirror,
    /// Transparent outside the input.
    #[default]
    Decal,
}

/// Resampling used by affine transforms.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Interpolation {
    /// Nearest neighbor.
    Nearest,
    /// Bilinear.
    #[default]
    Linear,
}

/// Color channel read from a displacement map.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ChannelSelector {
    /// Red.
    R,
    /// Green.
    G,
    /// Blue.
    B,
    /// Alpha.
    #[default]
    A,
}

impl ChannelSelector {
    fn index(self) -> usize {
        match self {
            Self::R => 0,
            Self::G => 1,
            Self::B => 2,
            Self::A => 3,
        }
    }
}

/// Radius in pixels covering three standard deviations.
pub(crate) fn blur_radius(sigma: f64) -> usize {
    if !sigma.is_finite() || sigma <= 0.0 {
        return 0;
    }
    (sigma * 3.0).ceil().min(4096.0) as usize
}

pub(crate) fn gaussian_kernel_q16(radius: usize, sigma: f64) -> Vec<u32> {
    if radius == 0 || !sigma.is_finite() || sigma <= 0.0 {
        return vec![1 << 16];
    }

    let r = radius as i64;
    let denom = 2.0 * sigma * sigma;
    let weights_f: Vec<f64> = (-r..=r)
        .map(|i| {
            let x = i as f64;
            (-x * x / denom).exp()
        })
        .collect();
    let sum: f64 = weights_f.iter().sum();
    if sum <= 0.0 {
        return vec![1 << 16];
    }

    let mut weights = Vec::<u32>::with_capacity(weights_f.len());
    let mut acc: i64 = 0;
    for &wf in &weights_f {
        let q = (((wf / sum) * 65536.0).round() as i64).clamp(0, 65536);
        weights.push(q as u32);
        acc += q;
    }
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        weights[mid] = (i64::from(weights[mid]) + delta).clamp(0, 65536) as u32;
    }
    weights
}

fn q16_to_u8(acc: u64) -> u8 {
    ((acc + 32768) >> 16).min(255) as u8
}

fn px_at(data: &[u8], w: usize, x: usize, y: usize) -> [u8; 4] {
    let idx = (y * w + x) * 4;
    [data[idx], data[idx + 1], data[idx + 2], data[idx + 3]]
}

/// Separable gaussian blur with transparent padding. The layer grows by the kernel radius.
pub(crate) fn blur(layer: &Layer, sigma_x: f64, sigma_y: f64) -> Layer {
    let rx = blur_radius(sigma_x);
    let ry = blur_radius(sigma_y);
    if layer.image.is_empty() || (rx == 0 && ry == 0) {
        return layer.clone();
    }
    let kx = gaussian_kernel_q16(rx, sigma_x);
    let ky = gaussian_kernel_q16(ry, sigma_y);

    let w = layer.image.width() as usize;
    let h = layer.image.height() as usize;
    let ow = w + 2 * rx;
    let oh = h + 2 * ry;
    let src = layer.image.data();

    let mut tmp = vec![0u8; ow * h * 4];
    tmp.par_chunks_mut(ow * 4).enumerate().for_each(|(y, row)| {
        for x in 0..ow {
            let mut acc = [0u64; 4];
            for (ki, &kw) in kx.iter().enumerate() {
                let sx = (x + ki) as i64 - 2 * rx as i64;
                if sx < 0 || sx >= w as i64 {
                    continue;
                }
                let p = px_at(src, w, sx as usize, y);
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(p[c]);
                }
            }
            for c in 0..4 {
                row[x * 4 + c] = q16_to_u8(acc[c]);
            }
        }
    });

    let mut out = vec![0u8; ow * oh * 4];
    out.par_chunks_mut(ow * 4).enumerate().for_each(|(y, row)| {
        for x in 0..ow {
            let mut acc = [0u64; 4];
            for (ki, &kw) in ky.iter().enumerate() {
                let sy = (y + ki) as i64 - 2 * ry as i64;
                if sy < 0 || sy >= h as i64 {
                    continue;
                }
                let p = px_at(&tmp, ow, x, sy as usize);
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(p[c]);
                }
            }
            for c in 0..4 {
                row[x * 4 + c] = q16_to_u8(acc[c]);
            }
        }
    });

    Layer::new(
        Image::from_parts(ow as u32, oh as u32, out),
        layer.x - rx as i32,
        layer.y - ry as i32,
    )
}

fn morph_pass(
    src: &[u8],
    sw: usize,
    sh: usize,
    grow: usize,
    radius: usize,
    horizontal: bool,
    dilate: bool,
) -> (Vec<u8>, usize, usize) {
    let (ow, oh) = if horizontal {
        (sw + 2 * grow, sh)
    } else {
        (sw, sh + 2 * grow)
    };
    let mut out = vec![0u8; ow * oh * 4];
    out.par_chunks_mut(ow * 4).enumerate().for_each(|(y, row)| {
        for x in 0..ow {
            let center = (if horizontal { x } else { y }) as i64 - grow as i64;
            let limit = (if horizontal { sw } else { sh }) as i64;
            let mut v = if dilate { [0u8; 4] } else { [255u8; 4] };
            for d in -(radius as i64)..=(radius as i64) {
                let s = center + d;
                let p = if s < 0 || s >= limit {
                    [0u8; 4]
                } else if horizontal {
                    px_at(src, sw, s as usize, y)
                } else {
                    px_at(src, sw, x, s as usize)
                };
                for c in 0..4 {
                    v[c] = if dilate { v[c].max(p[c]) } else { v[c].min(p[c]) };
                }
            }
            row[x * 4..x * 4 + 4].copy_from_slice(&v);
        }
    });
    (out, ow, oh)
}

/// Per-channel max (dilate, layer grows by the radius) or min (erode, extent kept).
pub(crate) fn morphology(layer: &Layer, rx: u32, ry: u32, dilate: bool) -> Layer {
    if layer.image.is_empty() || (rx == 0 && ry == 0) {
        return layer.clone();
    }
    let (rx, ry) = (rx as usize, ry as usize);
    let (gx, gy) = if dilate { (rx, ry) } else { (0, 0) };
    let w = layer.image.width() as usize;
    let h = layer.image.height() as usize;
    let (tmp, tw, th) = morph_pass(layer.image.data(), w, h, gx, rx, true, dilate);
    let (out, ow, oh) = morph_pass(&tmp, tw, th, gy, ry, false, dilate);
    Layer::new(
        Image::from_parts(ow as u32, oh as u32, out),
        layer.x - gx as i32,
        layer.y - gy as i32,
    )
}

fn tile_coord(v: i64, len: i64, mode: TileMode) -> Option<i64> {
    if (0..len).contains(&v) {
        return Some(v);
    }
    match mode {
        TileMode::Decal => None,
        TileMode::Clamp => Some(v.clamp(0, len - 1)),
        TileMode::Repeat => Some(v.rem_euclid(len)),
        TileMode::Mirror => {
            let period = 2 * len;
            let m = v.rem_euclid(period);
            Some(if m < len { m } else { period - 1 - m })
        }
    }
}

/// Parameters of a matrix convolution.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ConvolutionParams {
    /// Kernel width and height.
    pub kernel_size: (u32, u32),
    /// Row-major weights, `width * height` entries.
    pub kernel: Vec<f32>,
    /// Multiplier applied to the weighted sum.
    pub gain: f32,
    /// Added after the gain, in `0..=1` units.
    pub bias: f32,
    /// Kernel element aligned with the output pixel.
    pub kernel_offset: (i32, i32),
    /// Sampling outside the input.
    pub tile_mode: TileMode,
    /// Convolve alpha too; otherwise alpha is copied from the input.
    pub convolve_alpha: bool,
}

/// Matrix convolution. Output covers the kernel support around the input.
pub(crate) fn convolve(layer: &Layer, p: &ConvolutionParams) -> Layer {
    let (kw, kh) = (p.kernel_size.0 as i64, p.kernel_size.1 as i64);
    if layer.image.is_empty() || kw <= 0 || kh <= 0 || p.kernel.len() != (kw * kh) as usize {
        return layer.clone();
    }
    let (ox, oy) = (i64::from(p.kernel_offset.0), i64::from(p.kernel_offset.1));
    let w = i64::from(layer.image.width());
    let h = i64::from(layer.image.height());

    // Output pixel (x, y) reads input (x - ox + i, y - oy + j).
    let (left, top, right, bottom) = if p.convolve_alpha && p.tile_mode == TileMode::Decal {
        ((kw - 1 - ox).max(0), (kh - 1 - oy).max(0), ox.max(0), oy.max(0))
    } else {
        (0, 0, 0, 0)
    };
    let ow = (w + left + right) as usize;
    let oh = (h + top + bottom) as usize;
    let img = &layer.image;

    let sample = |sx: i64, sy: i64| -> [u8; 4] {
        match (tile_coord(sx, w, p.tile_mode), tile_coord(sy, h, p.tile_mode)) {
            (Some(x), Some(y)) => img.pixel(x, y),
            _ => [0; 4],
        }
    };

    let mut out = vec![0u8; ow * oh * 4];
    out.par_chunks_mut(ow * 4).enumerate().for_each(|(oy_px, row)| {
        for ox_px in 0..ow {
            let x = ox_px as i64 - left;
            let y = oy_px as i64 - top;
            let mut acc = [0f32; 4];
            for j in 0..kh {
                for i in 0..kw {
                    let k = p.kernel[(j * kw + i) as usize];
                    let s = sample(x - ox + i, y - oy + j);
                    let s = if p.convolve_alpha {
                        s.map(|v| f32::from(v) / 255.0)
                    } else {
                        unpremul_f32(s)
                    };
                    for c in 0..4 {
                        acc[c] += k * s[c];
                    }
                }
            }
            let v = acc.map(|a| a * p.gain + p.bias);
            let px = if p.convolve_alpha {
                let a = v[3].clamp(0.0, 1.0);
                let q = |c: f32| (c.clamp(0.0, a) * 255.0).round() as u8;
                [q(v[0]), q(v[1]), q(v[2]), (a * 255.0).round() as u8]
            } else {
                let a = f32::from(img.pixel(x, y)[3]) / 255.0;
                premul_u8([v[0], v[1], v[2], a])
            };
            row[ox_px * 4..ox_px * 4 + 4].copy_from_slice(&px);
        }
    });

    Layer::new(
        Image::from_parts(ow as u32, oh as u32, out),
        layer.x - left as i32,
        layer.y - top as i32,
    )
}

/// Offset each pixel of `source` by `scale * (D - 0.5)` read from `displacement`.
pub(crate) fn displace(
    source: &Layer,
    displacement: &Layer,
    x_channel: ChannelSelector,
    y_channel: ChannelSelector,
    scale: f32,
) -> Layer {
    if source.image.is_empty() {
        return source.clone();
    }
    let grow = (f64::from(scale.abs()) / 2.0).ceil() as i32;
    let ow = source.image.width() as usize + 2 * grow as usize;
    let oh = source.image.height() as usize + 2 * grow as usize;
    let x0 = source.x - grow;
    let y0 = source.y - grow;

    let mut out = vec![0u8; ow * oh * 4];
    out.par_chunks_mut(ow * 4).enumerate().for_each(|(py, row)| {
        for px in 0..ow {
            let gx = i64::from(x0) + px as i64;
            let gy = i64::from(y0) + py as i64;
            let d = unpremul_f32(displacement.pixel_at(gx, gy));
            let dx = scale * (d[x_channel.index()] - 0.5);
            let dy = scale * (d[y_channel.index()] - 0.5);
            let sx = gx + dx.round() as i64;
            let sy = gy + dy.round() as i64;
            row[px * 4..px * 4 + 4].copy_from_slice(&source.pixel_at(sx, sy));
        }
    });
    Layer::new(Image::from_parts(ow as u32, oh as u32, out), x0, y0)
}

fn sample_bilinear(layer: &Layer, p: Point) -> [u8; 4] {
    let fx = p.x - 0.5;
    let fy = p.y - 0.5;
    let x0 = fx.floor();
    let y0 = fy.floor();
    let tx = (fx - x0) as f32;
    let ty = (fy - y0) as f32;
    let (x0, y0) = (x0 as i64, y0 as i64);
    let p00 = layer.pixel_at(x0, y0);
    let p10 = layer.pixel_at(x0 + 1, y0);
    let p01 = layer.pixel_at(x0, y0 + 1);
    let p11 = layer.pixel_at(x0 + 1, y0 + 1);
    let mut out = [0u8; 4];
    for c in 0..4 {
        let top = f32::from(p00[c]) * (1.0 - tx) + f32::from(p10[c]) * tx;
        let bot = f32::from(p01[c]) * (1.0 - tx) + f32::from(p11[c]) * tx;
        out[c] = (top * (1.0 - ty) + bot * ty).round().clamp(0.0, 255.0) as u8;
    }
    out
}

/// Resample `layer` through `m`. The output covers the transformed extent.
pub(crate) fn transform(layer: &Layer, m: Affine, interpolation: Interpolation) -> Layer {
    if layer.image.is_empty() || m == Affine::IDENTITY {
        return layer.clone();
    }
    if m.determinant().abs() < 1e-12 || !m.as_coeffs().iter().all(|c| c.is_finite()) {
        return Layer::empty();
    }
    let aabb: Rect = m.transform_rect_bbox(layer.rect());
    let x0 = aabb.x0.floor() as i64;
    let y0 = aabb.y0.floor() as i64;
    let ow = (aabb.x1.ceil() as i64 - x0).max(0) as usize;
    let oh = (aabb.y1.ceil() as i64 - y0).max(0) as usize;
    if ow == 0 || oh == 0 {
        return Layer::empty();
    }
    let inv = m.inverse();

    let mut out = vec![0u8; ow * oh * 4];
    out.par_chunks_mut(ow * 4).enumerate().for_each(|(py, row)| {
        for px in 0..ow {
            let c = Point::new((x0 + px as i64) as f64 + 0.5, (y0 + py as i64) as f64 + 0.5);
            let s = inv * c;
            let v = match interpolation {
                Interpolation::Nearest => layer.pixel_at(s.x.floor() as i64, s.y.floor() as i64),
                Interpolation::Linear => sample_bilinear(layer, s),
            };
            row[px * 4..px * 4 + 4].copy_from_slice(&v);
        }
    });
    Layer::new(
        Image::from_parts(ow as u32, oh as u32, out),
        x0 as i32,
        y0 as i32,
    )
}

/// Replace color by `color` while keeping coverage: `color * alpha`.
pub(crate) fn tint(layer: &Layer, color: [u8; 4]) -> Layer {
    let mut out = layer.image.data().to_vec();
    for px in out.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        for c in 0..4 {
            px[c] = mul_div255_u8(u16::from(color[c]), a);
        }
    }
    Layer::new(
        Image::from_parts(layer.image.width(), layer.image.height(), out),
        layer.x,
        layer.y,
    )
}

/// Draw `top` over `bottom` into a layer covering both extents.
pub(crate) fn union_over(bottom: &Layer, top: &Layer) -> Layer {
    if bottom.image.is_empty() {
        return top.clone();
    }
    if top.image.is_empty() {
        return bottom.clone();
    }
    let r = bottom.rect().union(top.rect());
    let x0 = r.x0 as i64;
    let y0 = r.y0 as i64;
    let ow = r.width() as usize;
    let oh = r.height() as usize;

    let mut out = vec![0u8; ow * oh * 4];
    out.par_chunks_mut(ow * 4).enumerate().for_each(|(py, row)| {
        for px in 0..ow {
            let gx = x0 + px as i64;
            let gy = y0 + py as i64;
            let b = bottom.pixel_at(gx, gy);
            let t = top.pixel_at(gx, gy);
            let v = if t[3] == 0 {
                b
            } else if b[3] == 0 {
                t
            } else {
                blend_px(b, t, BlendMode::SrcOver)
            };
            row[px * 4..px * 4 + 4].copy_from_slice(&v);
        }
    });
    Layer::new(
        Image::from_parts(ow as u32, oh as u32, out),
        x0 as i32,
        y0 as i32,
    )
}

#[cfg(test)]
#[path = "../../tests/unit/render/kernels.rs"]
mod tests;
