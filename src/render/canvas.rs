use crate::foundation::core::{Point, Rect, Rgba8Premul, Vec2};
use crate::foundation::error::FxResult;
use crate::foundation::math::{add_sat_u8, mul_div255_u8};
use crate::render::filter::ImageFilter;
use crate::render::image::{Image, Layer};
use crate::render::surface::{RenderTarget, Surface};
use std::sync::RwLockWriteGuard;

/// Porter-Duff and separable blend modes on premultiplied pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum BlendMode {
    /// Replace destination.
    Src,
    /// Source over destination.
    #[default]
    SrcOver,
    /// Destination over source.
    DstOver,
    /// Source where destination is present.
    SrcIn,
    /// Destination where source is present.
    DstIn,
    /// Source where destination is absent.
    SrcOut,
    /// Destination where source is absent.
    DstOut,
    /// Source atop destination.
    SrcATop,
    /// Destination atop source.
    DstATop,
    /// Exclusive or.
    Xor,
    /// Saturating add.
    Plus,
    /// Multiply.
    Multiply,
    /// Screen.
    Screen,
}

/// Blend one premultiplied source pixel onto a destination pixel.
pub fn blend_px(dst: [u8; 4], src: [u8; 4], mode: BlendMode) -> [u8; 4] {
    let sa = u16::from(src[3]);
    let da = u16::from(dst[3]);
    let inv_sa = 255 - sa;
    let inv_da = 255 - da;

    let mut out = [0u8; 4];
    for c in 0..4 {
        let s = u16::from(src[c]);
        let d = u16::from(dst[c]);
        out[c] = match mode {
            BlendMode::Src => src[c],
            BlendMode::SrcOver => add_sat_u8(src[c], mul_div255_u8(d, inv_sa)),
            BlendMode::DstOver => add_sat_u8(dst[c], mul_div255_u8(s, inv_da)),
            BlendMode::SrcIn => mul_div255_u8(s, da),
            BlendMode::DstIn => mul_div255_u8(d, sa),
            BlendMode::SrcOut => mul_div255_u8(s, inv_da),
            BlendMode::DstOut => mul_div255_u8(d, inv_sa),
            BlendMode::SrcATop => add_sat_u8(mul_div255_u8(s, da), mul_div255_u8(d, inv_sa)),
            BlendMode::DstATop => add_sat_u8(mul_div255_u8(d, sa), mul_div255_u8(s, inv_da)),
            BlendMode::Xor => add_sat_u8(mul_div255_u8(s, inv_da), mul_div255_u8(d, inv_sa)),
            BlendMode::Plus => add_sat_u8(src[c], dst[c]),
            BlendMode::Multiply => {
                if c == 3 {
                    add_sat_u8(src[3], mul_div255_u8(d, inv_sa))
                } else {
                    add_sat_u8(
                        add_sat_u8(mul_div255_u8(s, inv_da), mul_div255_u8(d, inv_sa)),
                        mul_div255_u8(s, d),
                    )
                }
            }
            BlendMode::Screen => (s + d - u16::from(mul_div255_u8(s, d))) as u8,
        };
    }
    out
}

fn scale_px(px: [u8; 4], opacity: u16) -> [u8; 4] {
    if opacity >= 255 {
        return px;
    }
    [
        mul_div255_u8(u16::from(px[0]), opacity),
        mul_div255_u8(u16::from(px[1]), opacity),
        mul_div255_u8(u16::from(px[2]), opacity),
        mul_div255_u8(u16::from(px[3]), opacity),
    ]
}

/// Drawing parameters for image draws.
#[derive(Clone, Debug)]
pub struct Paint {
    /// Opacity multiplier in `0..=1`.
    pub opacity: f32,
    /// Blend mode used to combine with the destination.
    pub blend: BlendMode,
    /// Optional filter applied to the drawn image before blending.
    pub filter: Option<ImageFilter>,
}

impl Default for Paint {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            blend: BlendMode::SrcOver,
            filter: None,
        }
    }
}

impl Paint {
    /// Paint with the given blend mode.
    pub fn blend(blend: BlendMode) -> Self {
        Self {
            blend,
            ..Self::default()
        }
    }

    /// Paint running `filter` over the drawn image.
    pub fn filtered(filter: ImageFilter) -> Self {
        Self {
            filter: Some(filter),
            ..Self::default()
        }
    }
}

/// Scoped drawing access to one render target.
///
/// The target stays locked for writing until the canvas is dropped.
pub struct Canvas<'a> {
    surface: RwLockWriteGuard<'a, Surface>,
    translation: Vec2,
}

impl<'a> Canvas<'a> {
    pub(crate) fn open(target: &'a RenderTarget, clear: bool) -> FxResult<Self> {
        let mut surface = target.write()?;
        if clear {
            surface.data_mut().fill(0);
        }
        Ok(Self {
            surface,
            translation: Vec2::ZERO,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.surface.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.surface.height()
    }

    /// Current translation applied to every draw.
    pub fn translation(&self) -> Vec2 {
        self.translation
    }

    /// Replace the current translation.
    pub fn set_translation(&mut self, t: Vec2) {
        self.translation = t;
    }

    /// Add to the current translation.
    pub fn translate(&mut self, d: Vec2) {
        self.translation += d;
    }

    /// Clear to transparent.
    pub fn clear(&mut self) {
        self.surface.data_mut().fill(0);
    }

    /// Read back one pixel in device space.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        let idx = ((y as usize) * (self.width() as usize) + (x as usize)) * 4;
        let d = self.surface.data();
        Some([d[idx], d[idx + 1], d[idx + 2], d[idx + 3]])
    }

    /// Snapshot the pixels drawn so far.
    pub fn snapshot(&self) -> Image {
        self.surface.snapshot()
    }

    /// Fill `rect` (in canvas space, before translation) with a solid color.
    pub fn fill_rect(&mut self, rect: Rect, color: Rgba8Premul, blend: BlendMode) {
        let r = rect + self.translation;
        let x0 = r.x0.round().max(0.0) as i64;
        let y0 = r.y0.round().max(0.0) as i64;
        let x1 = (r.x1.round() as i64).min(i64::from(self.width()));
        let y1 = (r.y1.round() as i64).min(i64::from(self.height()));
        let w = self.width() as usize;
        let src = color.to_array();
        let data = self.surface.data_mut();
        for y in y0..y1 {
            for x in x0..x1 {
                let idx = ((y as usize) * w + (x as usize)) * 4;
                let dst = [data[idx], data[idx + 1], data[idx + 2], data[idx + 3]];
                data[idx..idx + 4].copy_from_slice(&blend_px(dst, src, blend));
            }
        }
    }

    /// Draw `image` with its top-left corner at `at`.
    pub fn draw_image(&mut self, image: &Image, at: Point, paint: &Paint) {
        let x = (at.x + self.translation.x).round() as i32;
        let y = (at.y + self.translation.y).round() as i32;
        let layer = Layer::new(image.clone(), x, y);
        self.draw_device_layer(&layer, paint);
    }

    /// Draw a layer at its own position (in canvas space, before translation).
    pub fn draw_layer(&mut self, layer: &Layer, paint: &Paint) {
        let x = layer.x + self.translation.x.round() as i32;
        let y = layer.y + self.translation.y.round() as i32;
        self.draw_device_layer(&Layer::new(layer.image.clone(), x, y), paint);
    }

    /// Draw the current pixels of another render target.
    pub fn draw_render_target(
        &mut self,
        target: &RenderTarget,
        at: Point,
        paint: &Paint,
    ) -> FxResult<()> {
        let image = target.snapshot()?;
        self.draw_image(&image, at, paint);
        Ok(())
    }

    fn draw_device_layer(&mut self, layer: &Layer, paint: &Paint) {
        let filtered;
        let layer = match &paint.filter {
            Some(f) => {
                filtered = f.apply(layer);
                &filtered
            }
            None => layer,
        };
        let opacity = ((paint.opacity.clamp(0.0, 1.0) * 255.0).round() as i32).clamp(0, 255) as u16;
        if opacity == 0 && matches!(paint.blend, BlendMode::SrcOver | BlendMode::Plus) {
            return;
        }

        let cw = i64::from(self.width());
        let ch = i64::from(self.height());
        let lw = i64::from(layer.image.width());
        let lh = i64::from(layer.image.height());
        let x0 = i64::from(layer.x).max(0);
        let y0 = i64::from(layer.y).max(0);
        let x1 = (i64::from(layer.x) + lw).min(cw);
        let y1 = (i64::from(layer.y) + lh).min(ch);
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        let blend = paint.blend;
        let w = cw as usize;
        let data = self.surface.data_mut();
        for y in y0..y1 {
            for x in x0..x1 {
                let src = scale_px(layer.pixel_at(x, y), opacity);
                let idx = ((y as usize) * w + (x as usize)) * 4;
                let dst = [data[idx], data[idx + 1], data[idx + 2], data[idx + 3]];
                data[idx..idx + 4].copy_from_slice(&blend_px(dst, src, blend));
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/canvas.rs"]
mod tests;
