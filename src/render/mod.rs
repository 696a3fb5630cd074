pub(crate) mod canvas;
pub(crate) mod color;
pub(crate) mod filter;
pub(crate) mod image;
pub(crate) mod kernels;
pub(crate) mod surface;

pub use canvas::{BlendMode, Canvas, Paint};
pub use color::{
    ColorFilter, HighContrast, IDENTITY_MATRIX, InvertStyle, LookupTable, LookupTables,
    brightness_matrix, contrast_matrix, hue_rotate_matrix, lighting_matrix, luma_color_matrix,
    luminance_to_alpha_matrix, mul_color_matrix, saturate_matrix,
};
pub use filter::{FilterNode, ImageFilter};
pub use image::{Image, Layer};
pub use kernels::{ChannelSelector, ConvolutionParams, Interpolation, TileMode};
pub use surface::{
    CpuGraphicsFactory, CpuGraphicsOpts, GraphicsFactory, RenderTarget, Surface, SurfaceStats,
};
