use crate::fx::activator::Activator;
use crate::fx::record::Record;
use crate::render::{ColorFilter, ImageFilter};

/// Fuses consecutive filter and color records into one backend filter graph.
#[derive(Debug, Default)]
pub struct FilterBuilder {
    filter: Option<ImageFilter>,
    color: Option<ColorFilter>,
}

impl FilterBuilder {
    /// Empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a filter node fed by the current graph.
    ///
    /// A pending color transform is folded in first so record order is preserved.
    pub fn append_filter(&mut self, record: &Record, activator: &mut Activator<'_>) {
        self.fold_color();
        if let Some(next) = record.build_filter(self.filter.clone(), activator) {
            self.filter = Some(next);
        }
    }

    /// Compose a color transform after the pending one.
    pub fn append_color(&mut self, record: &Record, activator: &mut Activator<'_>) {
        let Some(next) = record.build_color(activator) else {
            return;
        };
        self.color = Some(match self.color.take() {
            Some(pending) => ColorFilter::compose(next, pending),
            None => next,
        });
    }

    /// Return `true` when a graph or color transform is pending.
    pub fn has_filter(&self) -> bool {
        self.filter.is_some() || self.color.is_some()
    }

    /// Take the fused graph, leaving the builder empty.
    pub fn get_filter(&mut self) -> Option<ImageFilter> {
        self.fold_color();
        self.filter.take()
    }

    /// The fused graph, leaving the builder untouched.
    pub(crate) fn peek_filter(&self) -> Option<ImageFilter> {
        match &self.color {
            Some(color) if !color.is_identity() => {
                Some(ImageFilter::color(color.clone(), self.filter.clone()))
            }
            _ => self.filter.clone(),
        }
    }

    /// Drop everything pending.
    pub fn clear(&mut self) {
        self.filter = None;
        self.color = None;
    }

    fn fold_color(&mut self) {
        if let Some(color) = self.color.take() {
            if color.is_identity() {
                return;
            }
            self.filter = Some(ImageFilter::color(color, self.filter.take()));
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/fx/builder.rs"]
mod tests;
