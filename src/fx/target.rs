use crate::foundation::core::{Bounds, Rect, Vec2, local_rect};
use crate::foundation::error::{FxError, FxResult};
use crate::fx::history::{History, HistoryEntry};
use crate::fx::record::Record;
use crate::render::{Canvas, Image, Paint, RenderTarget};
use std::fmt;
use std::sync::Arc;

/// Deferred drawing that has not been rasterized yet.
pub trait DrawNode: fmt::Debug + Send + Sync {
    /// Logical extent covered by the node.
    fn bounds(&self) -> Rect;

    /// Draw in logical coordinates.
    fn draw(&self, canvas: &mut Canvas<'_>) -> FxResult<()>;
}

/// An image placed at a fixed logical rectangle.
#[derive(Clone, Debug)]
pub struct ImageNode {
    image: Image,
    bounds: Rect,
}

impl ImageNode {
    /// Place `image` with its top-left corner at `bounds.origin()`.
    pub fn new(image: Image, bounds: Rect) -> Self {
        Self { image, bounds }
    }
}

impl DrawNode for ImageNode {
    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn draw(&self, canvas: &mut Canvas<'_>) -> FxResult<()> {
        canvas.draw_image(&self.image, self.bounds.origin(), &Paint::default());
        Ok(())
    }
}

/// What an [`EffectTarget`] holds.
#[derive(Clone, Debug, Default)]
pub enum TargetResource {
    /// Materialized pixels.
    Raster(RenderTarget),
    /// Drawing not rasterized yet.
    GraphNode(Arc<dyn DrawNode>),
    /// Disposed or failed.
    #[default]
    Empty,
}

/// One raster stream flowing through an effect chain.
///
/// `bounds` is the logical extent. `original_bounds` is the same extent in the resource's own
/// coordinates: raster pixels start at the origin, graph nodes draw in logical space.
#[derive(Clone, Debug, Default)]
pub struct EffectTarget {
    resource: TargetResource,
    bounds: Rect,
    original_bounds: Rect,
    history: History,
}

impl EffectTarget {
    /// A target with nothing in it.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wrap rendered pixels that cover `bounds`.
    pub fn from_render_target(target: RenderTarget, bounds: Rect) -> Self {
        Self {
            resource: TargetResource::Raster(target),
            bounds,
            original_bounds: local_rect(bounds),
            history: History::new(),
        }
    }

    /// Wrap a drawing node.
    pub fn from_node(node: Arc<dyn DrawNode>) -> Self {
        let bounds = node.bounds();
        Self {
            resource: TargetResource::GraphNode(node),
            bounds,
            original_bounds: bounds,
            history: History::new(),
        }
    }

    /// Return `true` when the target holds nothing.
    pub fn is_empty(&self) -> bool {
        matches!(self.resource, TargetResource::Empty)
    }

    /// Return `true` when the target holds a drawing node.
    pub fn is_graph_node(&self) -> bool {
        matches!(self.resource, TargetResource::GraphNode(_))
    }

    /// The held resource.
    pub fn resource(&self) -> &TargetResource {
        &self.resource
    }

    /// Rendered pixels, if any.
    pub fn render_target(&self) -> Option<&RenderTarget> {
        match &self.resource {
            TargetResource::Raster(rt) => Some(rt),
            _ => None,
        }
    }

    /// Drawing node, if any.
    pub fn node(&self) -> Option<&Arc<dyn DrawNode>> {
        match &self.resource {
            TargetResource::GraphNode(n) => Some(n),
            _ => None,
        }
    }

    /// Logical extent.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Move the target to a new logical extent.
    pub fn set_bounds(&mut self, bounds: Rect) {
        self.bounds = bounds;
    }

    /// Extent in the resource's own coordinates.
    pub fn original_bounds(&self) -> Rect {
        self.original_bounds
    }

    /// Logical position of the resource's own coordinate origin.
    pub(crate) fn resource_offset(&self) -> Vec2 {
        self.bounds.origin() - self.original_bounds.origin()
    }

    /// Return `true` when a raster resource no longer covers the logical extent one to one.
    pub(crate) fn is_out_of_shape(&self) -> bool {
        self.render_target().is_some() && self.original_bounds != local_rect(self.bounds)
    }

    /// Records applied so far.
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Return `true` when both targets alias the same resource.
    pub fn same_resource(a: &Self, b: &Self) -> bool {
        match (&a.resource, &b.resource) {
            (TargetResource::Raster(x), TargetResource::Raster(y)) => RenderTarget::ptr_eq(x, y),
            (TargetResource::GraphNode(x), TargetResource::GraphNode(y)) => Arc::ptr_eq(x, y),
            _ => false,
        }
    }

    /// Release the resource. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        self.resource = TargetResource::Empty;
    }

    /// Composite onto `canvas` at the logical position.
    pub fn draw(&self, canvas: &mut Canvas<'_>) -> FxResult<()> {
        match &self.resource {
            TargetResource::Raster(rt) => {
                canvas.draw_render_target(rt, self.bounds.origin(), &Paint::default())
            }
            TargetResource::GraphNode(node) => node.draw(canvas),
            TargetResource::Empty => Err(FxError::invalid_target("cannot draw an empty target")),
        }
    }

    pub(crate) fn with_history(mut self, history: History) -> Self {
        self.history = history;
        self
    }

    /// Record `record` and move both extents through its bounds transform.
    pub(crate) fn advance(&mut self, record: &Record) {
        self.history = self.history.push(HistoryEntry {
            record: record.clone(),
            source_bounds: self.bounds,
        });
        if let Bounds::Valid(b) = record.transform_bounds(self.bounds) {
            self.bounds = b;
        }
        if let Bounds::Valid(b) = record.transform_bounds(self.original_bounds) {
            self.original_bounds = b;
        }
    }

    pub(crate) fn push_history(&mut self, record: &Record, source_bounds: Rect) {
        self.history = self.history.push(HistoryEntry {
            record: record.clone(),
            source_bounds,
        });
    }

    /// Reset `original_bounds` to the resource's own origin.
    pub(crate) fn reset_local_bounds(&mut self) {
        self.original_bounds = match self.resource {
            TargetResource::GraphNode(_) => self.bounds,
            _ => local_rect(self.bounds),
        };
    }
}

#[cfg(test)]
#[path = "../../tests/unit/fx/target.rs"]
mod tests;
