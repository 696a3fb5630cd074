//! `wavyte-fx` is the effect composition and incremental execution engine of Wavyte.
//!
//! Effects never touch pixels. They describe themselves as a chain of operation records on an
//! [`EffectContext`], and an [`Activator`] later executes that chain against the live
//! [`EffectTargets`] of a frame:
//!
//! - consecutive filter and color records are fused into one backend filter graph
//! - surfaces are only materialized when a custom raster step or deferred work needs them
//! - every target keeps the history of records it went through, so a [`HistoryComparator`]
//!   can tell a frame cache how much of the previous frame's work is still valid
//!
//! The [`render`] module holds the CPU raster backend the engine drives.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub(crate) mod fx;
/// CPU raster backend: surfaces, canvases, filter graphs and color transforms.
pub mod render;

pub use crate::foundation::core::{
    Affine, Bounds, Point, Rect, Rgba8Premul, Size, Vec2, inflate_sides, local_rect, pixel_size,
};
pub use crate::foundation::error::{FxError, FxResult};

pub use crate::fx::{
    Activator, BoundsFn, CacheReport, ColorFactory, CustomCallback, CustomFilterEffectContext,
    DrawNode, EffectContext, EffectId, EffectTarget, EffectTargets, FilterBuilder, FilterEffect,
    FilterEffectGroup, FilterFactory, Fingerprint, FxParams, History, HistoryComparator,
    HistoryEntry, HistorySnapshot, ImageNode, Record, RecordKind, RenderCache, RenderTimeItem,
    TargetResource,
};
