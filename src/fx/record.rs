use crate::foundation::core::{Bounds, Rect};
use crate::foundation::error::FxResult;
use crate::fx::activator::Activator;
use crate::fx::custom::CustomFilterEffectContext;
use crate::fx::fingerprint::{Fingerprint, StableHasher};
use crate::render::{ColorFilter, ImageFilter};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// What an operation record does when executed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum RecordKind {
    /// Fusable node of the backend filter graph.
    BackendFilter,
    /// Fusable per-pixel color transform.
    ColorTransform,
    /// Arbitrary raster work over materialized targets.
    CustomRaster,
}

impl RecordKind {
    fn tag(self) -> u8 {
        match self {
            Self::BackendFilter => 1,
            Self::ColorTransform => 2,
            Self::CustomRaster => 3,
        }
    }
}

/// Bound for record parameters: compared by value, hashed through their serialized form.
pub trait FxParams: Any + fmt::Debug + PartialEq + serde::Serialize + Send + Sync {}

impl<T> FxParams for T where T: Any + fmt::Debug + PartialEq + serde::Serialize + Send + Sync {}

/// Symbolic bounds transform of a record.
pub type BoundsFn<T> = fn(&T, Rect) -> Rect;

/// Builds the next filter graph node from the current graph.
///
/// Returning `None` leaves the graph unchanged.
pub type FilterFactory<T> = fn(&T, Option<ImageFilter>, &mut Activator<'_>) -> Option<ImageFilter>;

/// Builds a color transform. Returning `None` skips the record.
pub type ColorFactory<T> = fn(&T, &mut Activator<'_>) -> Option<ColorFilter>;

/// Raster callback run over materialized targets.
pub type CustomCallback<T> = fn(&T, &mut CustomFilterEffectContext<'_>) -> FxResult<()>;

pub(crate) trait RecordItem: fmt::Debug + Send + Sync {
    fn kind(&self) -> RecordKind;

    fn params_any(&self) -> &dyn Any;

    fn params_eq(&self, other: &dyn RecordItem) -> bool;

    fn params_type_name(&self) -> &'static str;

    fn write_params(&self, h: &mut StableHasher);

    fn transform_bounds(&self, r: Rect) -> Bounds;

    fn build_filter(
        &self,
        _input: Option<ImageFilter>,
        _activator: &mut Activator<'_>,
    ) -> Option<ImageFilter> {
        None
    }

    fn build_color(&self, _activator: &mut Activator<'_>) -> Option<ColorFilter> {
        None
    }

    fn run_custom(&self, _ctx: &mut CustomFilterEffectContext<'_>) -> FxResult<()> {
        Ok(())
    }
}

fn params_eq<T: FxParams>(a: &T, other: &dyn RecordItem) -> bool {
    other
        .params_any()
        .downcast_ref::<T>()
        .is_some_and(|b| a == b)
}

fn write_params<T: FxParams>(p: &T, h: &mut StableHasher) {
    h.write_str(std::any::type_name::<T>());
    match serde_json::to_vec(p) {
        Ok(bytes) => h.write_bytes(&bytes),
        Err(_) => h.write_str(&format!("{p:?}")),
    }
}

struct FilterItem<T> {
    params: T,
    factory: FilterFactory<T>,
    bounds: BoundsFn<T>,
}

impl<T: FxParams> fmt::Debug for FilterItem<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendFilter")
            .field("params", &self.params)
            .finish()
    }
}

impl<T: FxParams> RecordItem for FilterItem<T> {
    fn kind(&self) -> RecordKind {
        RecordKind::BackendFilter
    }

    fn params_any(&self) -> &dyn Any {
        &self.params
    }

    fn params_eq(&self, other: &dyn RecordItem) -> bool {
        params_eq(&self.params, other)
    }

    fn params_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn write_params(&self, h: &mut StableHasher) {
        write_params(&self.params, h);
    }

    fn transform_bounds(&self, r: Rect) -> Bounds {
        Bounds::Valid((self.bounds)(&self.params, r))
    }

    fn build_filter(
        &self,
        input: Option<ImageFilter>,
        activator: &mut Activator<'_>,
    ) -> Option<ImageFilter> {
        (self.factory)(&self.params, input, activator)
    }
}

struct ColorItem<T> {
    params: T,
    factory: ColorFactory<T>,
}

impl<T: FxParams> fmt::Debug for ColorItem<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColorTransform")
            .field("params", &self.params)
            .finish()
    }
}

impl<T: FxParams> RecordItem for ColorItem<T> {
    fn kind(&self) -> RecordKind {
        RecordKind::ColorTransform
    }

    fn params_any(&self) -> &dyn Any {
        &self.params
    }

    fn params_eq(&self, other: &dyn RecordItem) -> bool {
        params_eq(&self.params, other)
    }

    fn params_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn write_params(&self, h: &mut StableHasher) {
        write_params(&self.params, h);
    }

    fn transform_bounds(&self, r: Rect) -> Bounds {
        Bounds::Valid(r)
    }

    fn build_color(&self, activator: &mut Activator<'_>) -> Option<ColorFilter> {
        (self.factory)(&self.params, activator)
    }
}

struct CustomItem<T> {
    params: T,
    callback: CustomCallback<T>,
    bounds: Option<BoundsFn<T>>,
}

impl<T: FxParams> fmt::Debug for CustomItem<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomRaster")
            .field("params", &self.params)
            .field("bounded", &self.bounds.is_some())
            .finish()
    }
}

impl<T: FxParams> RecordItem for CustomItem<T> {
    fn kind(&self) -> RecordKind {
        RecordKind::CustomRaster
    }

    fn params_any(&self) -> &dyn Any {
        &self.params
    }

    fn params_eq(&self, other: &dyn RecordItem) -> bool {
        params_eq(&self.params, other)
    }

    fn params_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn write_params(&self, h: &mut StableHasher) {
        write_params(&self.params, h);
    }

    fn transform_bounds(&self, r: Rect) -> Bounds {
        match self.bounds {
            Some(f) => Bounds::Valid(f(&self.params, r)),
            None => Bounds::Invalid,
        }
    }

    fn run_custom(&self, ctx: &mut CustomFilterEffectContext<'_>) -> FxResult<()> {
        (self.callback)(&self.params, ctx)
    }
}

/// One immutable step of an effect chain.
///
/// Two records are equal when they have the same kind and parameter type and their parameters
/// compare equal. Factories and callbacks take no part in equality.
#[derive(Clone)]
pub struct Record(Arc<dyn RecordItem>);

impl Record {
    /// A backend filter-graph step.
    pub fn filter<T: FxParams>(params: T, factory: FilterFactory<T>, bounds: BoundsFn<T>) -> Self {
        Self(Arc::new(FilterItem {
            params,
            factory,
            bounds,
        }))
    }

    /// A color transform step. Bounds are unchanged.
    pub fn color<T: FxParams>(params: T, factory: ColorFactory<T>) -> Self {
        Self(Arc::new(ColorItem { params, factory }))
    }

    /// A custom raster step. Without `bounds`, the resulting extent is unknown until rendered.
    pub fn custom<T: FxParams>(
        params: T,
        callback: CustomCallback<T>,
        bounds: Option<BoundsFn<T>>,
    ) -> Self {
        Self(Arc::new(CustomItem {
            params,
            callback,
            bounds,
        }))
    }

    /// Record kind.
    pub fn kind(&self) -> RecordKind {
        self.0.kind()
    }

    /// Parameters, if they are a `T`.
    pub fn params<T: FxParams>(&self) -> Option<&T> {
        self.0.params_any().downcast_ref::<T>()
    }

    /// Rust type name of the parameters.
    pub fn params_type_name(&self) -> &'static str {
        self.0.params_type_name()
    }

    /// Apply the symbolic bounds transform.
    pub fn transform_bounds(&self, r: Rect) -> Bounds {
        self.0.transform_bounds(r)
    }

    /// Return `true` when the record can describe its output extent.
    pub fn has_bounds(&self) -> bool {
        !self.0.transform_bounds(Rect::ZERO).is_invalid()
    }

    /// Stable digest of kind and parameters.
    pub fn fingerprint(&self) -> Fingerprint {
        let mut h = StableHasher::new();
        self.write_fingerprint(&mut h);
        h.finish()
    }

    pub(crate) fn write_fingerprint(&self, h: &mut StableHasher) {
        h.write_u8(self.kind().tag());
        self.0.write_params(h);
    }

    pub(crate) fn build_filter(
        &self,
        input: Option<ImageFilter>,
        activator: &mut Activator<'_>,
    ) -> Option<ImageFilter> {
        self.0.build_filter(input, activator)
    }

    pub(crate) fn build_color(&self, activator: &mut Activator<'_>) -> Option<ColorFilter> {
        self.0.build_color(activator)
    }

    pub(crate) fn run_custom(&self, ctx: &mut CustomFilterEffectContext<'_>) -> FxResult<()> {
        self.0.run_custom(ctx)
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.kind() == other.kind() && self.0.params_eq(other.0.as_ref())
    }
}

impl std::hash::Hash for Record {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.fingerprint().hash(state);
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/fx/record.rs"]
mod tests;
