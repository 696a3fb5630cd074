use crate::foundation::core::Rect;
use crate::fx::target::EffectTarget;
use smallvec::SmallVec;
use std::ops::{Index, IndexMut};

/// Ordered set of parallel targets; order is z-order, bottom first.
#[derive(Clone, Debug, Default)]
pub struct EffectTargets {
    items: SmallVec<[EffectTarget; 1]>,
}

impl EffectTargets {
    /// No targets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of targets.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Return `true` when there are no targets.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Target at `index`.
    pub fn get(&self, index: usize) -> Option<&EffectTarget> {
        self.items.get(index)
    }

    /// Mutable target at `index`.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut EffectTarget> {
        self.items.get_mut(index)
    }

    /// Replace the target at `index`; the previous one is released.
    pub fn set(&mut self, index: usize, target: EffectTarget) {
        self.items[index] = target;
    }

    /// Append a target on top.
    pub fn push(&mut self, target: EffectTarget) {
        self.items.push(target);
    }

    /// Insert `targets` starting at `index`, keeping their order.
    pub fn insert_range(&mut self, index: usize, targets: impl IntoIterator<Item = EffectTarget>) {
        self.items.insert_many(index, targets);
    }

    /// Remove and return the target at `index`.
    pub fn remove_at(&mut self, index: usize) -> EffectTarget {
        self.items.remove(index)
    }

    /// Iterate bottom to top.
    pub fn iter(&self) -> std::slice::Iter<'_, EffectTarget> {
        self.items.iter()
    }

    /// Iterate mutably bottom to top.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, EffectTarget> {
        self.items.iter_mut()
    }

    /// Release every target, top first, and clear the set. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        for t in self.items.iter_mut().rev() {
            t.dispose();
        }
        self.items.clear();
    }

    /// Union of the bounds of all non-empty targets; zero when there are none.
    pub fn calculate_bounds(&self) -> Rect {
        self.items
            .iter()
            .filter(|t| !t.is_empty())
            .map(EffectTarget::bounds)
            .reduce(|a, b| a.union(b))
            .unwrap_or(Rect::ZERO)
    }

    /// Drop targets whose resource was released.
    pub(crate) fn prune_empty(&mut self) -> usize {
        let before = self.items.len();
        self.items.retain(|t| !t.is_empty());
        before - self.items.len()
    }
}

impl From<EffectTarget> for EffectTargets {
    fn from(target: EffectTarget) -> Self {
        let mut items = SmallVec::new();
        items.push(target);
        Self { items }
    }
}

impl FromIterator<EffectTarget> for EffectTargets {
    fn from_iter<I: IntoIterator<Item = EffectTarget>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for EffectTargets {
    type Item = EffectTarget;
    type IntoIter = smallvec::IntoIter<[EffectTarget; 1]>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a EffectTargets {
    type Item = &'a EffectTarget;
    type IntoIter = std::slice::Iter<'a, EffectTarget>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl Extend<EffectTarget> for EffectTargets {
    fn extend<I: IntoIterator<Item = EffectTarget>>(&mut self, iter: I) {
        self.items.extend(iter);
    }
}

impl Index<usize> for EffectTargets {
    type Output = EffectTarget;

    fn index(&self, index: usize) -> &EffectTarget {
        &self.items[index]
    }
}

impl IndexMut<usize> for EffectTargets {
    fn index_mut(&mut self, index: usize) -> &mut EffectTarget {
        &mut self.items[index]
    }
}

#[cfg(test)]
#[path = "../../tests/unit/fx/targets.rs"]
mod tests;
