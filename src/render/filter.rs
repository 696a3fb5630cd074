use crate::foundation::core::{Affine, Rgba8Premul, Vec2};
use crate::render::color::ColorFilter;
use crate::render::image::Layer;
use crate::render::kernels::{
    self, ChannelSelector, ConvolutionParams, Interpolation, blur, convolve, displace, morphology,
    tint, union_over,
};
use std::sync::Arc;

/// One node of a backend filter graph.
///
/// `input: None` reads the layer the graph is applied to.
#[derive(Debug)]
pub enum FilterNode {
    /// Gaussian blur.
    Blur {
        /// Standard deviation per axis.
        sigma: (f64, f64),
        /// Upstream node.
        input: Option<ImageFilter>,
    },
    /// Blurred, tinted and offset copy of the input drawn under it.
    DropShadow {
        /// Shadow offset.
        offset: Vec2,
        /// Shadow blur per axis.
        sigma: (f64, f64),
        /// Shadow color.
        color: Rgba8Premul,
        /// Emit only the shadow.
        shadow_only: bool,
        /// Upstream node.
        input: Option<ImageFilter>,
    },
    /// Affine resample.
    Transform {
        /// Transform applied to the input.
        matrix: Affine,
        /// Sampling quality.
        interpolation: Interpolation,
        /// Upstream node.
        input: Option<ImageFilter>,
    },
    /// Matrix convolution.
    Convolution {
        /// Kernel parameters.
        params: ConvolutionParams,
        /// Upstream node.
        input: Option<ImageFilter>,
    },
    /// Erode or dilate.
    Morphology {
        /// Horizontal radius.
        rx: u32,
        /// Vertical radius.
        ry: u32,
        /// `true` to dilate, `false` to erode.
        dilate: bool,
        /// Upstream node.
        input: Option<ImageFilter>,
    },
    /// Displace the input by channels of another graph.
    DisplacementMap {
        /// Channel driving horizontal offsets.
        x_channel: ChannelSelector,
        /// Channel driving vertical offsets.
        y_channel: ChannelSelector,
        /// Offset scale.
        scale: f32,
        /// Graph producing the displacement map; `None` uses the source.
        displacement: Option<ImageFilter>,
        /// Upstream node.
        input: Option<ImageFilter>,
    },
    /// Per-pixel color transform.
    Color {
        /// Transform.
        filter: ColorFilter,
        /// Upstream node.
        input: Option<ImageFilter>,
    },
    /// Fixed pixels, ignoring the source.
    Image {
        /// Pixels and placement.
        layer: Layer,
    },
    /// Inputs drawn over each other in order.
    Merge {
        /// Bottom to top.
        inputs: Vec<ImageFilter>,
    },
}

/// Immutable, shareable backend filter graph.
#[derive(Clone, Debug)]
pub struct ImageFilter(Arc<FilterNode>);

impl ImageFilter {
    fn node(node: FilterNode) -> Self {
        Self(Arc::new(node))
    }

    /// Gaussian blur; `None` for a zero sigma.
    pub fn blur(sigma_x: f64, sigma_y: f64, input: Option<ImageFilter>) -> Option<Self> {
        if kernels::blur_radius(sigma_x) == 0 && kernels::blur_radius(sigma_y) == 0 {
            return None;
        }
        Some(Self::node(FilterNode::Blur {
            sigma: (sigma_x, sigma_y),
            input,
        }))
    }

    /// Drop shadow under (or instead of) the input.
    pub fn drop_shadow(
        offset: Vec2,
        sigma: (f64, f64),
        color: Rgba8Premul,
        shadow_only: bool,
        input: Option<ImageFilter>,
    ) -> Self {
        Self::node(FilterNode::DropShadow {
            offset,
            sigma,
            color,
            shadow_only,
            input,
        })
    }

    /// Affine resample.
    pub fn transform(
        matrix: Affine,
        interpolation: Interpolation,
        input: Option<ImageFilter>,
    ) -> Self {
        Self::node(FilterNode::Transform {
            matrix,
            interpolation,
            input,
        })
    }

    /// Matrix convolution.
    pub fn convolution(params: ConvolutionParams, input: Option<ImageFilter>) -> Self {
        Self::node(FilterNode::Convolution { params, input })
    }

    /// Per-channel minimum over a `(2rx+1)x(2ry+1)` window.
    pub fn erode(rx: u32, ry: u32, input: Option<ImageFilter>) -> Self {
        Self::node(FilterNode::Morphology {
            rx,
            ry,
            dilate: false,
            input,
        })
    }

    /// Per-channel maximum over a `(2rx+1)x(2ry+1)` window.
    pub fn dilate(rx: u32, ry: u32, input: Option<ImageFilter>) -> Self {
        Self::node(FilterNode::Morphology {
            rx,
            ry,
            dilate: true,
            input,
        })
    }

    /// Displacement map.
    pub fn displacement_map(
        x_channel: ChannelSelector,
        y_channel: ChannelSelector,
        scale: f32,
        displacement: Option<ImageFilter>,
        input: Option<ImageFilter>,
    ) -> Self {
        Self::node(FilterNode::DisplacementMap {
            x_channel,
            y_channel,
            scale,
            displacement,
            input,
        })
    }

    /// Color transform over the input.
    pub fn color(filter: ColorFilter, input: Option<ImageFilter>) -> Self {
        Self::node(FilterNode::Color { filter, input })
    }

    /// Fixed pixels.
    pub fn image(layer: Layer) -> Self {
        Self::node(FilterNode::Image { layer })
    }

    /// Draw `inputs` over each other, bottom first.
    pub fn merge(inputs: Vec<ImageFilter>) -> Self {
        Self::node(FilterNode::Merge { inputs })
    }

    /// Root node.
    pub fn root(&self) -> &FilterNode {
        &self.0
    }

    /// Evaluate the graph against `source`.
    pub fn apply(&self, source: &Layer) -> Layer {
        let input = |f: &Option<ImageFilter>| match f {
            Some(f) => f.apply(source),
            None => source.clone(),
        };
        match self.root() {
            FilterNode::Blur { sigma, input: i } => blur(&input(i), sigma.0, sigma.1),
            FilterNode::DropShadow {
                offset,
                sigma,
                color,
                shadow_only,
                input: i,
            } => {
                let src = input(i);
                let mut shadow = tint(&blur(&src, sigma.0, sigma.1), color.to_array());
                shadow.x += offset.x.round() as i32;
                shadow.y += offset.y.round() as i32;
                if *shadow_only {
                    shadow
                } else {
                    union_over(&shadow, &src)
                }
            }
            FilterNode::Transform {
                matrix,
                interpolation,
                input: i,
            } => kernels::transform(&input(i), *matrix, *interpolation),
            FilterNode::Convolution { params, input: i } => convolve(&input(i), params),
            FilterNode::Morphology {
                rx,
                ry,
                dilate,
                input: i,
            } => morphology(&input(i), *rx, *ry, *dilate),
            FilterNode::DisplacementMap {
                x_channel,
                y_channel,
                scale,
                displacement,
                input: i,
            } => {
                let map = input(displacement);
                displace(&input(i), &map, *x_channel, *y_channel, *scale)
            }
            FilterNode::Color { filter, input: i } => {
                let src = input(i);
                Layer::new(filter.apply_image(&src.image), src.x, src.y)
            }
            FilterNode::Image { layer } => layer.clone(),
            FilterNode::Merge { inputs } => inputs
                .iter()
                .map(|f| f.apply(source))
                .fold(Layer::empty(), |acc, l| union_over(&acc, &l)),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/filter.rs"]
mod tests;
