use crate::foundation::core::{Point, Rect, Rgba8Premul};
use crate::foundation::error::{FxError, FxResult};
use std::fmt;
use std::sync::Arc;

struct ImageData {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

/// Immutable premultiplied RGBA8 pixels. Cloning is cheap.
#[derive(Clone)]
pub struct Image {
    inner: Arc<ImageData>,
}

impl Image {
    /// Build an image from tightly packed premultiplied RGBA8 bytes.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> FxResult<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| FxError::validation("image size overflow"))?;
        if data.len() != expected {
            return Err(FxError::validation(
                "image data must be width*height*4 bytes",
            ));
        }
        Ok(Self::from_parts(width, height, data))
    }

    pub(crate) fn from_parts(width: u32, height: u32, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), (width as usize) * (height as usize) * 4);
        Self {
            inner: Arc::new(ImageData {
                width,
                height,
                data,
            }),
        }
    }

    /// A transparent image of the given size.
    pub fn transparent(width: u32, height: u32) -> Self {
        Self::from_parts(width, height, vec![0; (width as usize) * (height as usize) * 4])
    }

    /// An image filled with one color.
    pub fn solid(width: u32, height: u32, color: Rgba8Premul) -> Self {
        Self::from_parts(
            width,
            height,
            color.to_array().repeat((width as usize) * (height as usize)),
        )
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.inner.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.inner.height
    }

    /// Return `true` for an image without pixels.
    pub fn is_empty(&self) -> bool {
        self.inner.width == 0 || self.inner.height == 0
    }

    /// RGBA8 bytes, tightly packed, row-major.
    pub fn data(&self) -> &[u8] {
        &self.inner.data
    }

    /// Pixel at `(x, y)`; transparent outside the image.
    pub fn pixel(&self, x: i64, y: i64) -> [u8; 4] {
        if x < 0 || y < 0 || x >= i64::from(self.width()) || y >= i64::from(self.height()) {
            return [0; 4];
        }
        let idx = ((y as usize) * (self.width() as usize) + (x as usize)) * 4;
        let d = &self.inner.data;
        [d[idx], d[idx + 1], d[idx + 2], d[idx + 3]]
    }
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Image")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

/// An image placed on the integer pixel grid of some coordinate space.
///
/// Filters consume and produce layers; their extent can grow (blur) or move (offset) while the
/// pixel grid stays aligned.
#[derive(Clone, Debug)]
pub struct Layer {
    /// Pixels.
    pub image: Image,
    /// Left edge in pixels.
    pub x: i32,
    /// Top edge in pixels.
    pub y: i32,
}

impl Layer {
    /// Place `image` at `(x, y)`.
    pub fn new(image: Image, x: i32, y: i32) -> Self {
        Self { image, x, y }
    }

    /// A layer with no pixels at the origin.
    pub fn empty() -> Self {
        Self::new(Image::transparent(0, 0), 0, 0)
    }

    /// The same pixels moved by `(dx, dy)`.
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.image, self.x + dx, self.y + dy)
    }

    /// Extent covered by the layer.
    pub fn rect(&self) -> Rect {
        Rect::from_origin_size(
            Point::new(f64::from(self.x), f64::from(self.y)),
            (f64::from(self.image.width()), f64::from(self.image.height())),
        )
    }

    /// Pixel at grid position `(x, y)` in the layer's coordinate space.
    pub fn pixel_at(&self, x: i64, y: i64) -> [u8; 4] {
        self.image
            .pixel(x - i64::from(self.x), y - i64::from(self.y))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/image.rs"]
mod tests;
