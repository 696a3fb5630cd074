use crate::foundation::error::{FxError, FxResult};
use crate::render::canvas::Canvas;
use crate::render::image::Image;
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, TryLockError};

/// A premultiplied RGBA8 raster surface.
pub struct Surface {
    pixmap: vello_cpu::Pixmap,
    width: u32,
    height: u32,
}

impl Surface {
    /// Allocate a zero-initialized surface.
    ///
    /// Returns `None` for empty dimensions or dimensions the raster backend cannot address.
    pub fn new(width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        let w: u16 = width.try_into().ok()?;
        let h: u16 = height.try_into().ok()?;
        Some(Self {
            pixmap: vello_cpu::Pixmap::new(w, h),
            width,
            height,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// RGBA8 bytes, tightly packed, row-major.
    pub fn data(&self) -> &[u8] {
        self.pixmap.data_as_u8_slice()
    }

    /// Mutable RGBA8 bytes.
    pub fn data_mut(&mut self) -> &mut [u8] {
        self.pixmap.data_as_u8_slice_mut()
    }

    /// Copy the current pixels into an immutable [`Image`].
    pub fn snapshot(&self) -> Image {
        Image::from_parts(self.width, self.height, self.data().to_vec())
    }

    fn byte_len(&self) -> u64 {
        u64::from(self.width)
            .saturating_mul(u64::from(self.height))
            .saturating_mul(4)
    }
}

impl fmt::Debug for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Surface")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

#[derive(Debug, Default)]
struct SurfaceCounters {
    live_surfaces: AtomicUsize,
    alloc_surfaces: AtomicU64,
    alloc_bytes: AtomicU64,
    failed_allocs: AtomicU64,
}

struct RenderTargetInner {
    surface: RwLock<Surface>,
    width: u32,
    height: u32,
    counters: Option<Arc<SurfaceCounters>>,
}

impl Drop for RenderTargetInner {
    fn drop(&mut self) {
        if let Some(c) = &self.counters {
            c.live_surfaces.fetch_sub(1, Ordering::Relaxed);
        }
    }
}

/// Reference-counted raster surface handle.
///
/// Cloning aliases the same pixels. The surface is released when the last handle is dropped.
#[derive(Clone)]
pub struct RenderTarget {
    inner: Arc<RenderTargetInner>,
}

impl RenderTarget {
    /// Wrap a surface that is not tracked by any factory.
    pub fn new(surface: Surface) -> Self {
        Self::with_counters(surface, None)
    }

    fn with_counters(surface: Surface, counters: Option<Arc<SurfaceCounters>>) -> Self {
        let (width, height) = (surface.width(), surface.height());
        Self {
            inner: Arc::new(RenderTargetInner {
                surface: RwLock::new(surface),
                width,
                height,
                counters,
            }),
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.inner.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.inner.height
    }

    /// Number of live handles aliasing this surface.
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Return `true` when both handles alias the same surface.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    /// Copy the current pixels into an immutable [`Image`].
    pub fn snapshot(&self) -> FxResult<Image> {
        Ok(self.read()?.snapshot())
    }

    pub(crate) fn read(&self) -> FxResult<RwLockReadGuard<'_, Surface>> {
        match self.inner.surface.try_read() {
            Ok(g) => Ok(g),
            Err(TryLockError::WouldBlock) => Err(FxError::evaluation(
                "render target is open for writing while being read",
            )),
            Err(TryLockError::Poisoned(_)) => {
                Err(FxError::evaluation("render target lock poisoned"))
            }
        }
    }

    pub(crate) fn write(&self) -> FxResult<RwLockWriteGuard<'_, Surface>> {
        match self.inner.surface.try_write() {
            Ok(g) => Ok(g),
            Err(TryLockError::WouldBlock) => {
                Err(FxError::evaluation("render target is already open"))
            }
            Err(TryLockError::Poisoned(_)) => {
                Err(FxError::evaluation("render target lock poisoned"))
            }
        }
    }
}

impl fmt::Debug for RenderTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderTarget")
            .field("width", &self.inner.width)
            .field("height", &self.inner.height)
            .field("refs", &self.ref_count())
            .finish()
    }
}

/// Injected graphics capability: the only path through which the engine creates surfaces.
pub trait GraphicsFactory: Send + Sync {
    /// Allocate a zero-initialized render target, or `None` when the allocation cannot be
    /// satisfied (size limits, memory exhaustion).
    fn create_render_target(&self, width: u32, height: u32) -> Option<RenderTarget>;

    /// Open a drawing canvas over `target`, optionally clearing it to transparent.
    fn create_canvas<'a>(&self, target: &'a RenderTarget, clear: bool) -> FxResult<Canvas<'a>> {
        Canvas::open(target, clear)
    }
}

/// Limits for [`CpuGraphicsFactory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CpuGraphicsOpts {
    /// Largest accepted width or height, in pixels.
    pub max_dimension: u32,
    /// Largest accepted pixel count for a single surface.
    pub max_pixels: u64,
}

impl Default for CpuGraphicsOpts {
    fn default() -> Self {
        Self {
            max_dimension: 16_384,
            max_pixels: 64 * 1024 * 1024,
        }
    }
}

/// Allocation counters reported by [`CpuGraphicsFactory::stats`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SurfaceStats {
    /// Render targets currently alive.
    pub live_surfaces: usize,
    /// Render targets allocated since creation.
    pub alloc_surfaces: u64,
    /// Bytes allocated since creation.
    pub alloc_bytes: u64,
    /// Allocation requests that were refused.
    pub failed_allocs: u64,
}

/// CPU graphics factory backed by `vello_cpu` pixmaps.
#[derive(Debug, Default)]
pub struct CpuGraphicsFactory {
    opts: CpuGraphicsOpts,
    counters: Arc<SurfaceCounters>,
}

impl CpuGraphicsFactory {
    /// Create a factory with the given limits.
    pub fn new(opts: CpuGraphicsOpts) -> Self {
        Self {
            opts,
            counters: Arc::new(SurfaceCounters::default()),
        }
    }

    /// Configured limits.
    pub fn opts(&self) -> CpuGraphicsOpts {
        self.opts
    }

    /// Snapshot of the allocation counters.
    pub fn stats(&self) -> SurfaceStats {
        SurfaceStats {
            live_surfaces: self.counters.live_surfaces.load(Ordering::Relaxed),
            alloc_surfaces: self.counters.alloc_surfaces.load(Ordering::Relaxed),
            alloc_bytes: self.counters.alloc_bytes.load(Ordering::Relaxed),
            failed_allocs: self.counters.failed_allocs.load(Ordering::Relaxed),
        }
    }

    fn refuse(&self, width: u32, height: u32, reason: &'static str) -> Option<RenderTarget> {
        self.counters.failed_allocs.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(width, height, reason, "render target allocation refused");
        None
    }
}

impl GraphicsFactory for CpuGraphicsFactory {
    fn create_render_target(&self, width: u32, height: u32) -> Option<RenderTarget> {
        let max_dim = self.opts.max_dimension.min(u32::from(u16::MAX));
        if width == 0 || height == 0 {
            return self.refuse(width, height, "empty");
        }
        if width > max_dim || height > max_dim {
            return self.refuse(width, height, "dimension limit");
        }
        if u64::from(width).saturating_mul(u64::from(height)) > self.opts.max_pixels {
            return self.refuse(width, height, "pixel limit");
        }
        let Some(surface) = Surface::new(width, height) else {
            return self.refuse(width, height, "backend");
        };

        self.counters.live_surfaces.fetch_add(1, Ordering::Relaxed);
        self.counters.alloc_surfaces.fetch_add(1, Ordering::Relaxed);
        self.counters
            .alloc_bytes
            .fetch_add(surface.byte_len(), Ordering::Relaxed);
        Some(RenderTarget::with_counters(
            surface,
            Some(self.counters.clone()),
        ))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
