use crate::foundation::core::{Rect, pixel_size};
use crate::foundation::error::{FxError, FxResult};
use crate::fx::history::History;
use crate::fx::target::EffectTarget;
use crate::fx::targets::EffectTargets;
use crate::render::{Canvas, GraphicsFactory};

/// What a custom raster callback can see and do.
///
/// Targets are materialized before the callback runs. Replaced or disposed targets are cleaned up
/// by the activator afterwards.
pub struct CustomFilterEffectContext<'a> {
    targets: &'a mut EffectTargets,
    history: History,
    graphics: &'a dyn GraphicsFactory,
}

impl<'a> CustomFilterEffectContext<'a> {
    pub(crate) fn new(
        targets: &'a mut EffectTargets,
        history: History,
        graphics: &'a dyn GraphicsFactory,
    ) -> Self {
        Self {
            targets,
            history,
            graphics,
        }
    }

    /// Current targets.
    pub fn targets(&self) -> &EffectTargets {
        self.targets
    }

    /// Current targets, for replacement, insertion or removal.
    pub fn targets_mut(&mut self) -> &mut EffectTargets {
        self.targets
    }

    /// Injected graphics capability.
    pub fn graphics(&self) -> &dyn GraphicsFactory {
        self.graphics
    }

    /// Allocate a transparent target covering `bounds` that inherits the chain's history.
    ///
    /// Returns an empty target when the surface cannot be allocated.
    pub fn create_target(&self, bounds: Rect) -> EffectTarget {
        let (w, h) = pixel_size(bounds);
        match self.graphics.create_render_target(w, h) {
            Some(rt) => {
                EffectTarget::from_render_target(rt, bounds).with_history(self.history.clone())
            }
            None => {
                tracing::warn!(width = w, height = h, "custom target allocation failed");
                EffectTarget::empty()
            }
        }
    }

    /// Open a canvas over a raster target.
    pub fn open<'t>(&self, target: &'t EffectTarget) -> FxResult<Canvas<'t>> {
        let rt = target
            .render_target()
            .ok_or_else(|| FxError::invalid_target("only raster targets can be opened"))?;
        self.graphics.create_canvas(rt, false)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/fx/custom.rs"]
mod tests;
