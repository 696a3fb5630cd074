use crate::foundation::core::{Affine, Point, Rect, Rgba8Premul, Size, Vec2, inflate_sides};
use crate::foundation::error::FxResult;
use crate::fx::activator::Activator;
use crate::fx::context::EffectContext;
use crate::fx::custom::CustomFilterEffectContext;
use crate::fx::record::{BoundsFn, ColorFactory, CustomCallback, FilterFactory, FxParams, Record};
use crate::render::{
    BlendMode, ChannelSelector, ColorFilter, ConvolutionParams, HighContrast, ImageFilter,
    Interpolation, InvertStyle, LookupTable, LookupTables, Paint, brightness_matrix,
    contrast_matrix, hue_rotate_matrix, lighting_matrix, luma_color_matrix,
    luminance_to_alpha_matrix, saturate_matrix,
};

fn non_negative(s: Size) -> Size {
    Size::new(s.width.max(0.0), s.height.max(0.0))
}

fn identity_bounds<T>(_: &T, r: Rect) -> Rect {
    r
}

#[derive(Debug, PartialEq, serde::Serialize)]
struct Blur {
    sigma: Size,
}

#[derive(Debug, PartialEq, serde::Serialize)]
struct DropShadow {
    offset: Vec2,
    sigma: Size,
    color: Rgba8Premul,
    shadow_only: bool,
}

impl DropShadow {
    fn shadow_rect(&self, r: Rect) -> Rect {
        (r + self.offset).inflate(self.sigma.width * 3.0, self.sigma.height * 3.0)
    }
}

#[derive(Debug, PartialEq, serde::Serialize)]
struct DisplacementMap {
    x_channel: ChannelSelector,
    y_channel: ChannelSelector,
    scale: f32,
    source: EffectContext,
}

#[derive(Debug, PartialEq, serde::Serialize)]
struct Transform {
    matrix: Affine,
    interpolation: Interpolation,
}

#[derive(Debug, PartialEq, serde::Serialize)]
struct Morphology {
    rx: f32,
    ry: f32,
}

impl Morphology {
    fn radii(&self) -> (u32, u32) {
        let r = |v: f32| v.max(0.0).round() as u32;
        (r(self.rx), r(self.ry))
    }
}

#[derive(Debug, PartialEq, serde::Serialize)]
struct Erode(Morphology);

#[derive(Debug, PartialEq, serde::Serialize)]
struct Dilate(Morphology);

#[derive(Debug, PartialEq, serde::Serialize)]
struct ColorMatrix([f32; 20]);

#[derive(Debug, PartialEq, serde::Serialize)]
struct ColorMatrixWith<T> {
    data: T,
    matrix: [f32; 20],
}

#[derive(Debug, PartialEq, serde::Serialize)]
struct Saturate(f32);

#[derive(Debug, PartialEq, serde::Serialize)]
struct HueRotate(f32);

#[derive(Debug, PartialEq, serde::Serialize)]
struct Brightness(f32);

#[derive(Debug, PartialEq, serde::Serialize)]
struct Contrast(f32);

#[derive(Debug, PartialEq, serde::Serialize)]
struct LuminanceToAlpha;

#[derive(Debug, PartialEq, serde::Serialize)]
struct Lighting {
    multiply: Rgba8Premul,
    add: Rgba8Premul,
}

#[derive(Debug, PartialEq, serde::Serialize)]
struct LumaColor;

#[derive(Debug, PartialEq, serde::Serialize)]
struct Lookup {
    table: LookupTable,
    strength: f32,
}

#[derive(Debug, PartialEq, serde::Serialize)]
struct LookupArgb {
    tables: LookupTables,
    strength: f32,
}

#[derive(Debug, PartialEq, serde::Serialize)]
struct BlendColor {
    color: Rgba8Premul,
    mode: BlendMode,
}

#[derive(Debug, PartialEq, serde::Serialize)]
struct InnerShadow {
    offset: Vec2,
    sigma: Size,
    color: Rgba8Premul,
    shadow_only: bool,
}

fn matrix_factory(m: [f32; 20]) -> Option<ColorFilter> {
    Some(ColorFilter::matrix(m))
}

impl EffectContext {
    /// Append a backend filter-graph record.
    pub fn append_filter<T: FxParams>(
        &mut self,
        params: T,
        factory: FilterFactory<T>,
        bounds: BoundsFn<T>,
    ) {
        self.append(Record::filter(params, factory, bounds));
    }

    /// Append a color transform record.
    pub fn append_color<T: FxParams>(&mut self, params: T, factory: ColorFactory<T>) {
        self.append(Record::color(params, factory));
    }

    /// Gaussian blur. Negative sigma components are treated as zero.
    pub fn blur(&mut self, sigma: Size) {
        self.append_filter(
            Blur {
                sigma: non_negative(sigma),
            },
            |p, input, _| ImageFilter::blur(p.sigma.width, p.sigma.height, input),
            |p, r| r.inflate(p.sigma.width * 3.0, p.sigma.height * 3.0),
        );
    }

    fn shadow(&mut self, offset: Vec2, sigma: Size, color: Rgba8Premul, shadow_only: bool) {
        self.append_filter(
            DropShadow {
                offset,
                sigma: non_negative(sigma),
                color,
                shadow_only,
            },
            |p, input, _| {
                Some(ImageFilter::drop_shadow(
                    p.offset,
                    (p.sigma.width, p.sigma.height),
                    p.color,
                    p.shadow_only,
                    input,
                ))
            },
            |p, r| {
                let shadow = p.shadow_rect(r);
                if p.shadow_only {
                    shadow
                } else {
                    r.union(shadow)
                }
            },
        );
    }

    /// Shadow drawn under the content.
    pub fn drop_shadow(&mut self, offset: Vec2, sigma: Size, color: Rgba8Premul) {
        self.shadow(offset, sigma, color, false);
    }

    /// The shadow alone.
    pub fn drop_shadow_only(&mut self, offset: Vec2, sigma: Size, color: Rgba8Premul) {
        self.shadow(offset, sigma, color, true);
    }

    /// Displace content by channels of a map recorded by `source` into a child context.
    pub fn displacement_map(
        &mut self,
        x_channel: ChannelSelector,
        y_channel: ChannelSelector,
        scale: f32,
        source: impl FnOnce(&mut EffectContext),
    ) {
        let mut child = self.create_child_context();
        source(&mut child);
        self.append_filter(
            DisplacementMap {
                x_channel,
                y_channel,
                scale,
                source: child,
            },
            displacement_factory,
            |p, r| {
                let half = f64::from(p.scale) / 2.0;
                r.inflate(half, half)
            },
        );
    }

    /// Affine transform of the content.
    pub fn transform(&mut self, matrix: Affine, interpolation: Interpolation) {
        self.append_filter(
            Transform {
                matrix,
                interpolation,
            },
            |p, input, _| Some(ImageFilter::transform(p.matrix, p.interpolation, input)),
            |p, r| p.matrix.transform_rect_bbox(r),
        );
    }

    /// Matrix convolution.
    pub fn matrix_convolution(&mut self, params: ConvolutionParams) {
        self.append_filter(
            params,
            |p, input, _| {
                let (w, h) = p.kernel_size;
                if w == 0 || h == 0 || p.kernel.len() != (w as usize) * (h as usize) {
                    tracing::debug!(?p.kernel_size, "skipping malformed convolution kernel");
                    return None;
                }
                Some(ImageFilter::convolution(p.clone(), input))
            },
            |p, r| {
                let (kw, kh) = (f64::from(p.kernel_size.0), f64::from(p.kernel_size.1));
                let (ox, oy) = (f64::from(p.kernel_offset.0), f64::from(p.kernel_offset.1));
                inflate_sides(r, ox - (kw - 1.0), oy - (kh - 1.0), ox, oy)
            },
        );
    }

    /// Per-channel minimum. Bounds are unchanged.
    pub fn erode(&mut self, rx: f32, ry: f32) {
        self.append_filter(
            Erode(Morphology { rx, ry }),
            |p, input, _| {
                let (rx, ry) = p.0.radii();
                Some(ImageFilter::erode(rx, ry, input))
            },
            identity_bounds,
        );
    }

    /// Per-channel maximum. Bounds grow by the radius.
    pub fn dilate(&mut self, rx: f32, ry: f32) {
        self.append_filter(
            Dilate(Morphology { rx, ry }),
            |p, input, _| {
                let (rx, ry) = p.0.radii();
                Some(ImageFilter::dilate(rx, ry, input))
            },
            |p, r| r.inflate(f64::from(p.0.rx.max(0.0)), f64::from(p.0.ry.max(0.0))),
        );
    }

    /// Row-major 4x5 color matrix.
    pub fn color_matrix(&mut self, matrix: [f32; 20]) {
        self.append_color(ColorMatrix(matrix), |p, _| matrix_factory(p.0));
    }

    /// Color matrix computed from `data`. Records compare by `data`.
    pub fn color_matrix_with<T: FxParams>(&mut self, data: T, f: fn(&T) -> [f32; 20]) {
        let matrix = f(&data);
        self.append_color(ColorMatrixWith { data, matrix }, |p, _| {
            matrix_factory(p.matrix)
        });
    }

    /// Saturation; `1` keeps colors.
    pub fn saturate(&mut self, s: f32) {
        self.append_color(Saturate(s), |p, _| matrix_factory(saturate_matrix(p.0)));
    }

    /// Hue rotation in degrees.
    pub fn hue_rotate(&mut self, degrees: f32) {
        self.append_color(HueRotate(degrees), |p, _| {
            matrix_factory(hue_rotate_matrix(p.0))
        });
    }

    /// Scale color channels.
    pub fn brightness(&mut self, amount: f32) {
        self.append_color(Brightness(amount), |p, _| {
            matrix_factory(brightness_matrix(p.0))
        });
    }

    /// Contrast in percent.
    pub fn contrast(&mut self, contrast: f32) {
        self.append_color(Contrast(contrast), |p, _| {
            matrix_factory(contrast_matrix(p.0))
        });
    }

    /// Add luminance to alpha.
    pub fn luminance_to_alpha(&mut self) {
        self.append_color(LuminanceToAlpha, |_, _| {
            matrix_factory(luminance_to_alpha_matrix())
        });
    }

    /// Per-channel multiply then add.
    pub fn lighting(&mut self, multiply: Rgba8Premul, add: Rgba8Premul) {
        self.append_color(Lighting { multiply, add }, |p, _| {
            matrix_factory(lighting_matrix(p.multiply, p.add))
        });
    }

    /// Luma into alpha.
    pub fn luma_color(&mut self) {
        self.append_color(LumaColor, |_, _| matrix_factory(luma_color_matrix()));
    }

    /// One lookup table for every channel, blended toward identity by `strength`.
    pub fn lookup_table(&mut self, table: LookupTable, strength: f32) {
        self.append_color(Lookup { table, strength }, |p, _| {
            Some(ColorFilter::table(
                LookupTables::uniform(p.table.clone()).with_strength(p.strength),
            ))
        });
    }

    /// Per-channel lookup tables, blended toward identity by `strength`.
    pub fn lookup_table_argb(&mut self, tables: LookupTables, strength: f32) {
        self.append_color(LookupArgb { tables, strength }, |p, _| {
            Some(ColorFilter::table(p.tables.with_strength(p.strength)))
        });
    }

    /// Accessibility high-contrast transform.
    pub fn high_contrast(&mut self, grayscale: bool, invert: InvertStyle, contrast: f32) {
        self.append_color(
            HighContrast {
                grayscale,
                invert,
                contrast,
            },
            |p, _| Some(ColorFilter::HighContrast(*p)),
        );
    }

    /// Blend a constant color onto the content.
    pub fn blend_mode(&mut self, color: Rgba8Premul, mode: BlendMode) {
        self.append_color(BlendColor { color, mode }, |p, _| {
            Some(ColorFilter::Blend {
                color: p.color,
                mode: p.mode,
            })
        });
    }

    /// Custom raster step with a symbolic bounds transform.
    pub fn custom_effect<T: FxParams>(
        &mut self,
        params: T,
        callback: CustomCallback<T>,
        transform_bounds: BoundsFn<T>,
    ) {
        self.append(Record::custom(params, callback, Some(transform_bounds)));
    }

    /// Custom raster step whose extent is only known after rendering.
    ///
    /// Everything recorded afterwards runs per target once the real bounds exist.
    pub fn custom_effect_unbounded<T: FxParams>(&mut self, params: T, callback: CustomCallback<T>) {
        self.append(Record::custom(params, callback, None));
    }

    fn inner(&mut self, offset: Vec2, sigma: Size, color: Rgba8Premul, shadow_only: bool) {
        self.custom_effect(
            InnerShadow {
                offset,
                sigma: non_negative(sigma),
                color,
                shadow_only,
            },
            inner_shadow,
            identity_bounds,
        );
    }

    /// Shadow cast inside the content's edges.
    pub fn inner_shadow(&mut self, offset: Vec2, sigma: Size, color: Rgba8Premul) {
        self.inner(offset, sigma, color, false);
    }

    /// The inner shadow alone, clipped to the content.
    pub fn inner_shadow_only(&mut self, offset: Vec2, sigma: Size, color: Rgba8Premul) {
        self.inner(offset, sigma, color, true);
    }
}

fn displacement_factory(
    p: &DisplacementMap,
    input: Option<ImageFilter>,
    activator: &mut Activator<'_>,
) -> Option<ImageFilter> {
    let displacement = match activator.activate(&p.source) {
        Ok(f) => f,
        Err(err) => {
            tracing::warn!(%err, "displacement source failed to activate");
            return None;
        }
    };
    Some(ImageFilter::displacement_map(
        p.x_channel,
        p.y_channel,
        p.scale,
        displacement,
        input,
    ))
}

fn inner_shadow(p: &InnerShadow, ctx: &mut CustomFilterEffectContext<'_>) -> FxResult<()> {
    let shadow = ImageFilter::color(
        ColorFilter::Blend {
            color: p.color,
            mode: BlendMode::SrcOut,
        },
        ImageFilter::blur(p.sigma.width, p.sigma.height, None),
    );
    let clip = if p.shadow_only {
        BlendMode::DstIn
    } else {
        BlendMode::DstATop
    };

    for i in 0..ctx.targets().len() {
        let Some(src) = ctx.targets()[i].render_target().cloned() else {
            continue;
        };
        let bounds = ctx.targets()[i].bounds();
        let next = ctx.create_target(bounds);
        if next.is_empty() {
            continue;
        }
        {
            let mut canvas = ctx.open(&next)?;
            canvas.draw_render_target(
                &src,
                Point::new(p.offset.x, p.offset.y),
                &Paint::filtered(shadow.clone()),
            )?;
            canvas.draw_render_target(&src, Point::ZERO, &Paint::blend(clip))?;
        }
        ctx.targets_mut().set(i, next);
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/fx/emit.rs"]
mod tests;
