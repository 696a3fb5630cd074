use crate::fx::context::EffectContext;
use std::fmt;
use std::sync::Arc;

/// Identity of an effect instance, stable across frames.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct EffectId(pub u64);

/// A producer of operation records.
///
/// Effects describe themselves by calling emitters on an [`EffectContext`]; they never touch
/// pixels directly. `version` must change whenever the emitted records could change.
pub trait FilterEffect: fmt::Debug + Send + Sync {
    /// Instance identity.
    fn id(&self) -> EffectId;

    /// Monotonic parameter version.
    fn version(&self) -> u64;

    /// Disabled effects record their version and emit nothing.
    fn is_enabled(&self) -> bool {
        true
    }

    /// Emit records for the current parameters.
    fn apply_to(&self, ctx: &mut EffectContext);
}

/// Applies child effects in order.
#[derive(Debug, Clone)]
pub struct FilterEffectGroup {
    id: EffectId,
    enabled: bool,
    children: Vec<Arc<dyn FilterEffect>>,
}

impl FilterEffectGroup {
    /// Group `children` under `id`.
    pub fn new(id: EffectId, children: Vec<Arc<dyn FilterEffect>>) -> Self {
        Self {
            id,
            enabled: true,
            children,
        }
    }

    /// Enable or disable the whole group.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Child effects.
    pub fn children(&self) -> &[Arc<dyn FilterEffect>] {
        &self.children
    }
}

impl FilterEffect for FilterEffectGroup {
    fn id(&self) -> EffectId {
        self.id
    }

    fn version(&self) -> u64 {
        self.children.iter().fold(u64::from(self.enabled), |acc, c| {
            acc.rotate_left(5) ^ c.id().0.wrapping_mul(0x9e37_79b9_7f4a_7c15) ^ c.version()
        })
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn apply_to(&self, ctx: &mut EffectContext) {
        for child in &self.children {
            ctx.apply(Some(child));
        }
    }
}
