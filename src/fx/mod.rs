pub(crate) mod activator;
pub(crate) mod builder;
pub(crate) mod comparator;
pub(crate) mod context;
pub(crate) mod custom;
pub(crate) mod effect;
pub(crate) mod emit;
pub(crate) mod fingerprint;
pub(crate) mod history;
pub(crate) mod record;
pub(crate) mod target;
pub(crate) mod targets;

pub use activator::Activator;
pub use builder::FilterBuilder;
pub use comparator::{CacheReport, HistoryComparator, HistorySnapshot, RenderCache};
pub use context::{EffectContext, RenderTimeItem};
pub use custom::CustomFilterEffectContext;
pub use effect::{EffectId, FilterEffect, FilterEffectGroup};
pub use fingerprint::Fingerprint;
pub use history::{History, HistoryEntry};
pub use record::{
    BoundsFn, ColorFactory, CustomCallback, FilterFactory, FxParams, Record, RecordKind,
};
pub use target::{DrawNode, EffectTarget, ImageNode, TargetResource};
pub use targets::EffectTargets;
