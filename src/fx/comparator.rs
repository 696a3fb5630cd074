use crate::foundation::core::Rect;
use crate::fx::context::EffectContext;
use crate::fx::effect::FilterEffect;
use crate::fx::fingerprint::{Fingerprint, StableHasher};
use crate::fx::history::History;
use crate::fx::record::Record;
use crate::fx::targets::EffectTargets;
use std::sync::Arc;

/// How much of a freshly recorded chain matches what the cached targets went through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub struct CacheReport {
    /// Length of the shared record prefix; the smallest across targets.
    pub matched: usize,
    /// Number of records the current chain would execute; the largest across targets.
    pub total: usize,
}

impl CacheReport {
    /// Return `true` when every record matched.
    pub fn is_complete(&self) -> bool {
        self.matched == self.total
    }
}

/// Receives comparison results.
pub trait RenderCache {
    /// Called once per [`HistoryComparator::accepts`].
    fn report(&mut self, report: CacheReport);
}

/// Per-target histories captured after one activation.
#[derive(Clone, Debug, PartialEq)]
pub struct HistorySnapshot {
    histories: Vec<History>,
    version: u64,
    source_bounds: Rect,
    recorded: EffectContext,
}

impl HistorySnapshot {
    /// Captured histories in target order.
    pub fn histories(&self) -> &[History] {
        &self.histories
    }

    /// Effect version that produced the histories.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Source extent the chain started from.
    pub fn source_bounds(&self) -> Rect {
        self.source_bounds
    }

    /// Chain recorded when the snapshot was taken.
    pub fn recorded(&self) -> &EffectContext {
        &self.recorded
    }

    /// Stable digest of version, source extent, recorded chain and histories.
    pub fn fingerprint(&self) -> Fingerprint {
        let mut h = StableHasher::new();
        h.write_u64(self.version);
        h.write_rect(self.source_bounds);
        h.write_fingerprint(self.recorded.fingerprint());
        h.write_u64(self.histories.len() as u64);
        for hist in &self.histories {
            hist.write_fingerprint(&mut h);
        }
        h.finish()
    }
}

/// Decides how much of an effect chain's cached output is still valid.
#[derive(Debug)]
pub struct HistoryComparator {
    effect: Arc<dyn FilterEffect>,
    source_bounds: Rect,
    snapshot: Option<HistorySnapshot>,
}

impl HistoryComparator {
    /// Compare chains produced by `effect` from `source_bounds`.
    pub fn new(effect: Arc<dyn FilterEffect>, source_bounds: Rect) -> Self {
        Self {
            effect,
            source_bounds,
            snapshot: None,
        }
    }

    /// The compared effect.
    pub fn effect(&self) -> &Arc<dyn FilterEffect> {
        &self.effect
    }

    /// Current source extent.
    pub fn source_bounds(&self) -> Rect {
        self.source_bounds
    }

    /// Change the source extent the chain is recorded from.
    pub fn set_source_bounds(&mut self, bounds: Rect) {
        self.source_bounds = bounds;
    }

    /// Retained snapshot, if one was captured.
    pub fn snapshot(&self) -> Option<&HistorySnapshot> {
        self.snapshot.as_ref()
    }

    /// Remember the histories of `targets` together with the current effect version and chain.
    pub fn capture(&mut self, targets: &EffectTargets) {
        self.snapshot = Some(HistorySnapshot {
            histories: targets.iter().map(|t| t.history().clone()).collect(),
            version: self.effect.version(),
            source_bounds: self.source_bounds,
            recorded: self.record(),
        });
    }

    /// Forget the retained snapshot.
    pub fn reset(&mut self) {
        self.snapshot = None;
    }

    /// Report the shared prefix to `cache` and return `true` when the cached output is
    /// still complete.
    pub fn accepts(&self, cache: &mut dyn RenderCache) -> bool {
        let Some(snap) = &self.snapshot else {
            let ctx = self.record();
            cache.report(CacheReport {
                matched: 0,
                total: ctx.count_items(),
            });
            return false;
        };

        if snap.version == self.effect.version() && snap.source_bounds == self.source_bounds {
            let n = snap.histories.iter().map(History::len).max().unwrap_or(0);
            cache.report(CacheReport {
                matched: n,
                total: n,
            });
            return true;
        }

        let ctx = self.record();
        if snap.histories.is_empty() {
            // Nothing survived the chain; only the recording itself can be compared.
            let matched = ctx
                .items()
                .iter()
                .zip(snap.recorded.items())
                .take_while(|(a, b)| a == b)
                .count();
            let total = ctx.count_items();
            let complete = ctx == snap.recorded;
            tracing::debug!(matched, total, complete, "no cached targets");
            cache.report(CacheReport { matched, total });
            return complete;
        }

        let mut matched = usize::MAX;
        let mut total = 0;
        let mut complete = true;
        for history in &snap.histories {
            let (m, t, c) = compare_one(&ctx, history);
            matched = matched.min(m);
            total = total.max(t);
            complete &= c;
        }

        tracing::debug!(matched, total, complete, "history compared");
        cache.report(CacheReport { matched, total });
        complete
    }

    fn record(&self) -> EffectContext {
        let mut ctx = EffectContext::new(self.source_bounds);
        ctx.apply(Some(&self.effect));
        ctx
    }
}

/// Returns `(matched, total, complete)` for one target.
fn compare_one(ctx: &EffectContext, history: &History) -> (usize, usize, bool) {
    let entries = history.entries();
    let mut expected: Vec<Record> = ctx.items().to_vec();
    let mut pending = ctx.render_time_items().to_vec();

    // Deferred items are resolved against the bounds the target actually had.
    while !pending.is_empty() {
        let Some(entry) = entries.get(expected.len()) else {
            break;
        };
        let mut child = EffectContext::new(entry.source_bounds);
        for item in &pending {
            child.replay(item);
        }
        if child.count_items() == 0 && child.render_time_items().len() >= pending.len() {
            break;
        }
        expected.extend_from_slice(child.items());
        pending = child.render_time_items().to_vec();
    }

    let matched = expected
        .iter()
        .zip(entries.iter())
        .take_while(|(r, e)| **r == e.record)
        .count();
    let total = expected.len();
    let complete = pending.is_empty() && matched == total && matched == entries.len();
    (matched, total, complete)
}

#[cfg(test)]
#[path = "../../tests/unit/fx/comparator.rs"]
mod tests;
