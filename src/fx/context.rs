use crate::foundation::core::{Bounds, Rect};
use crate::foundation::error::{FxError, FxResult};
use crate::fx::effect::{EffectId, FilterEffect};
use crate::fx::fingerprint::{Fingerprint, StableHasher};
use crate::fx::record::Record;
use serde::ser::SerializeStruct;
use std::fmt;
use std::sync::Arc;

/// Work queued while the chain's extent is unknown.
#[derive(Clone)]
pub enum RenderTimeItem {
    /// A record appended after the bounds became invalid.
    Record(Record),
    /// An effect applied after the bounds became invalid.
    Effect(Arc<dyn FilterEffect>),
}

impl RenderTimeItem {
    pub(crate) fn write_fingerprint(&self, h: &mut StableHasher) {
        match self {
            Self::Record(r) => {
                h.write_u8(1);
                r.write_fingerprint(h);
            }
            Self::Effect(e) => {
                h.write_u8(2);
                h.write_u64(e.id().0);
                h.write_u64(e.version());
            }
        }
    }
}

impl PartialEq for RenderTimeItem {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Record(a), Self::Record(b)) => a == b,
            (Self::Effect(a), Self::Effect(b)) => a.id() == b.id() && a.version() == b.version(),
            _ => false,
        }
    }
}

impl fmt::Debug for RenderTimeItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Record(r) => r.fmt(f),
            Self::Effect(e) => f
                .debug_struct("Effect")
                .field("id", &e.id())
                .field("version", &e.version())
                .finish(),
        }
    }
}

/// Records the operations of one effect chain and tracks their symbolic bounds.
///
/// Nothing here touches pixels; an [`Activator`](crate::Activator) executes the records later.
#[derive(Clone, Debug)]
pub struct EffectContext {
    bounds: Bounds,
    original_bounds: Bounds,
    items: Vec<Record>,
    render_time_items: Vec<RenderTimeItem>,
    applied_versions: Vec<(EffectId, u64)>,
}

impl EffectContext {
    /// Start recording from `bounds`.
    pub fn new(bounds: impl Into<Bounds>) -> Self {
        let bounds = bounds.into();
        Self {
            bounds,
            original_bounds: bounds,
            items: Vec::new(),
            render_time_items: Vec::new(),
            applied_versions: Vec::new(),
        }
    }

    /// Current symbolic extent.
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Extent the context was created with.
    pub fn original_bounds(&self) -> Bounds {
        self.original_bounds
    }

    /// Records to execute in order.
    pub fn items(&self) -> &[Record] {
        &self.items
    }

    /// Work deferred until the real extent is known.
    pub fn render_time_items(&self) -> &[RenderTimeItem] {
        &self.render_time_items
    }

    /// Number of regular records.
    pub fn count_items(&self) -> usize {
        self.items.len()
    }

    /// `(id, version)` of every applied effect, in application order.
    pub fn applied_versions(&self) -> &[(EffectId, u64)] {
        &self.applied_versions
    }

    /// Version of the first applied effect.
    pub fn first_version(&self) -> FxResult<u64> {
        self.applied_versions
            .first()
            .map(|(_, v)| *v)
            .ok_or(FxError::NoAppliedEffects)
    }

    /// Append one record, updating the bounds.
    ///
    /// While the bounds are invalid the record is queued as render-time work instead.
    pub fn append(&mut self, record: Record) {
        match self.bounds {
            Bounds::Valid(r) => {
                self.bounds = record.transform_bounds(r);
                self.items.push(record);
            }
            Bounds::Invalid => self.render_time_items.push(RenderTimeItem::Record(record)),
        }
    }

    /// Let `effect` emit its records into this context.
    pub fn apply(&mut self, effect: Option<&Arc<dyn FilterEffect>>) {
        let Some(effect) = effect else {
            return;
        };
        self.applied_versions.push((effect.id(), effect.version()));
        if !effect.is_enabled() {
            return;
        }
        if self.bounds.is_invalid() {
            self.render_time_items
                .push(RenderTimeItem::Effect(effect.clone()));
            return;
        }
        effect.apply_to(self);
    }

    /// Replay one deferred item.
    pub(crate) fn replay(&mut self, item: &RenderTimeItem) {
        match item {
            RenderTimeItem::Record(r) => self.append(r.clone()),
            RenderTimeItem::Effect(e) => self.apply(Some(e)),
        }
    }

    /// A fresh context starting at this context's current bounds.
    pub fn create_child_context(&self) -> Self {
        Self::new(self.bounds)
    }

    /// Stable digest of bounds and item sequences.
    pub fn fingerprint(&self) -> Fingerprint {
        let mut h = StableHasher::new();
        h.write_bounds(self.bounds);
        h.write_u64(self.items.len() as u64);
        for r in &self.items {
            r.write_fingerprint(&mut h);
        }
        h.write_u64(self.render_time_items.len() as u64);
        for i in &self.render_time_items {
            i.write_fingerprint(&mut h);
        }
        h.finish()
    }
}

impl Default for EffectContext {
    fn default() -> Self {
        Self::new(Rect::ZERO)
    }
}

impl PartialEq for EffectContext {
    fn eq(&self, other: &Self) -> bool {
        self.bounds == other.bounds
            && self.items == other.items
            && self.render_time_items == other.render_time_items
    }
}

impl std::hash::Hash for EffectContext {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.fingerprint().hash(state);
    }
}

impl serde::Serialize for EffectContext {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut st = serializer.serialize_struct("EffectContext", 2)?;
        st.serialize_field("bounds", &self.bounds)?;
        st.serialize_field("fingerprint", &self.fingerprint())?;
        st.end()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/fx/context.rs"]
mod tests;
