use crate::foundation::core::{Rect, Vec2, pixel_size};
use crate::foundation::error::FxResult;
use crate::fx::builder::FilterBuilder;
use crate::fx::context::{EffectContext, RenderTimeItem};
use crate::fx::custom::CustomFilterEffectContext;
use crate::fx::record::{Record, RecordKind};
use crate::fx::target::{EffectTarget, TargetResource};
use crate::fx::targets::EffectTargets;
use crate::render::{GraphicsFactory, ImageFilter, Layer, Paint};
use std::collections::VecDeque;

/// Executes recorded effect chains against a set of targets.
///
/// Fusable records accumulate in a [`FilterBuilder`]; pixels are only produced when a custom
/// raster record needs them, when deferred work needs real bounds, or on [`Activator::finish`].
pub struct Activator<'g> {
    targets: EffectTargets,
    builder: FilterBuilder,
    graphics: &'g dyn GraphicsFactory,
}

impl<'g> Activator<'g> {
    /// Start from `targets`, allocating through `graphics`.
    pub fn new(targets: EffectTargets, graphics: &'g dyn GraphicsFactory) -> Self {
        Self {
            targets,
            builder: FilterBuilder::new(),
            graphics,
        }
    }

    /// Current targets. Pending filters are not applied yet.
    pub fn targets(&self) -> &EffectTargets {
        &self.targets
    }

    /// Pending fused work.
    pub fn builder(&self) -> &FilterBuilder {
        &self.builder
    }

    /// Injected graphics capability.
    pub fn graphics(&self) -> &'g dyn GraphicsFactory {
        self.graphics
    }

    /// Execute every record of `ctx`, then its deferred work.
    #[tracing::instrument(skip_all, fields(items = ctx.count_items(), targets = self.targets.len()))]
    pub fn apply(&mut self, ctx: &EffectContext) -> FxResult<()> {
        self.apply_range(ctx, 0, ctx.count_items())
    }

    /// Execute `count` records of `ctx` starting at `offset`.
    ///
    /// Deferred work runs only when the range reaches the last record.
    pub fn apply_range(&mut self, ctx: &EffectContext, offset: usize, count: usize) -> FxResult<()> {
        let end = offset.saturating_add(count).min(ctx.count_items());
        let start = offset.min(end);
        self.apply_items(&ctx.items()[start..end])?;
        if end == ctx.count_items() && !ctx.render_time_items().is_empty() {
            self.apply_render_time_items(ctx.render_time_items())?;
        }
        Ok(())
    }

    fn apply_items(&mut self, items: &[Record]) -> FxResult<()> {
        for record in items {
            match record.kind() {
                RecordKind::BackendFilter => {
                    let mut builder = std::mem::take(&mut self.builder);
                    builder.append_filter(record, self);
                    self.builder = builder;
                    self.advance_targets(record);
                }
                RecordKind::ColorTransform => {
                    let mut builder = std::mem::take(&mut self.builder);
                    builder.append_color(record, self);
                    self.builder = builder;
                    self.advance_targets(record);
                }
                RecordKind::CustomRaster => self.run_custom(record)?,
            }
        }
        Ok(())
    }

    fn advance_targets(&mut self, record: &Record) {
        for t in self.targets.iter_mut() {
            t.advance(record);
        }
    }

    fn run_custom(&mut self, record: &Record) -> FxResult<()> {
        self.flush(true)?;

        let source_bounds = self.targets.calculate_bounds();
        let history = self
            .targets
            .get(0)
            .map(|t| t.history().clone())
            .unwrap_or_default();
        let mut cx = CustomFilterEffectContext::new(&mut self.targets, history, self.graphics);
        if let Err(err) = record.run_custom(&mut cx) {
            tracing::warn!(%err, params = record.params_type_name(), "custom effect failed");
        }

        let pruned = self.targets.prune_empty();
        if pruned > 0 {
            tracing::debug!(pruned, "custom effect erased targets");
        }
        for t in self.targets.iter_mut() {
            t.push_history(record, source_bounds);
            t.reset_local_bounds();
        }
        Ok(())
    }

    fn apply_render_time_items(&mut self, deferred: &[RenderTimeItem]) -> FxResult<()> {
        self.flush(false)?;

        let mut work: VecDeque<(Vec<RenderTimeItem>, EffectTarget)> = std::mem::take(&mut self.targets)
            .into_iter()
            .map(|t| (deferred.to_vec(), t))
            .collect();
        let mut done = EffectTargets::new();

        while let Some((items, target)) = work.pop_front() {
            let mut child = EffectContext::new(target.bounds());
            for item in &items {
                child.replay(item);
            }

            let progressed = items.is_empty()
                || child.count_items() > 0
                || child.render_time_items().len() < items.len();
            if !progressed {
                tracing::error!(items = items.len(), "deferred items made no progress; dropping target");
                debug_assert!(progressed, "deferred items made no progress");
                continue;
            }

            let mut sub = Activator::new(EffectTargets::from(target), self.graphics);
            sub.apply_items(child.items())?;
            let produced = sub.finish()?;

            if child.render_time_items().is_empty() {
                done.extend(produced);
            } else {
                for t in produced.into_iter().rev() {
                    work.push_front((child.render_time_items().to_vec(), t));
                }
            }
        }

        self.targets = done;
        Ok(())
    }

    /// Materialize pending work into new raster targets.
    ///
    /// Acts when the builder holds something, when `force` is set, when the only target is a
    /// drawing node, or when a raster no longer matches its extent. Raster targets with nothing
    /// pending are kept as they are. On error the targets and pending work are left untouched.
    #[tracing::instrument(skip_all, fields(force = force, targets = self.targets.len()))]
    pub fn flush(&mut self, force: bool) -> FxResult<()> {
        let single_node = self.targets.len() == 1 && self.targets[0].is_graph_node();
        let reshaped = self.targets.iter().any(EffectTarget::is_out_of_shape);
        if !self.builder.has_filter() && !force && !single_node && !reshaped {
            return Ok(());
        }

        let filter = self.builder.peek_filter();
        let mut out = EffectTargets::new();
        for target in self.targets.iter() {
            if target.is_empty() {
                continue;
            }
            if filter.is_none() && target.render_target().is_some() && !target.is_out_of_shape() {
                out.push(target.clone());
                continue;
            }
            let Some(source) = self.source_layer(target)? else {
                tracing::warn!("target source could not be rendered; dropping target");
                continue;
            };
            let layer = match &filter {
                Some(f) => f.apply(&source),
                None => source,
            };

            let ob = target.original_bounds();
            let (w, h) = pixel_size(ob);
            let Some(rt) = self.graphics.create_render_target(w, h) else {
                tracing::warn!(width = w, height = h, "flush allocation failed; dropping target");
                continue;
            };
            {
                let mut canvas = self.graphics.create_canvas(&rt, true)?;
                canvas.set_translation(Vec2::new(-ob.x0, -ob.y0));
                canvas.draw_layer(&layer, &Paint::default());
            }
            out.push(
                EffectTarget::from_render_target(rt, target.bounds())
                    .with_history(target.history().clone()),
            );
        }

        tracing::debug!(targets = out.len(), filtered = filter.is_some(), "flushed");
        self.builder.clear();
        self.targets = out;
        Ok(())
    }

    /// Pixels of `target` in its own coordinates.
    fn source_layer(&self, target: &EffectTarget) -> FxResult<Option<Layer>> {
        match target.resource() {
            TargetResource::Raster(rt) => Ok(Some(Layer::new(rt.snapshot()?, 0, 0))),
            TargetResource::GraphNode(node) => {
                let b = node.bounds();
                let grid = Rect::new(b.x0.floor(), b.y0.floor(), b.x1.ceil(), b.y1.ceil());
                let (w, h) = pixel_size(grid);
                let Some(rt) = self.graphics.create_render_target(w, h) else {
                    return Ok(None);
                };
                {
                    let mut canvas = self.graphics.create_canvas(&rt, true)?;
                    canvas.set_translation(Vec2::new(-grid.x0, -grid.y0));
                    node.draw(&mut canvas)?;
                }
                Ok(Some(Layer::new(
                    rt.snapshot()?,
                    grid.x0 as i32,
                    grid.y0 as i32,
                )))
            }
            TargetResource::Empty => Ok(None),
        }
    }

    /// Run `ctx` over a copy of the current targets and return it as a filter graph.
    ///
    /// When the single remaining target still aliases the source and only fused work is pending,
    /// the pending graph is returned directly. Otherwise the resulting targets become fixed images
    /// placed relative to the first current target.
    #[tracing::instrument(skip_all, fields(items = ctx.count_items()))]
    pub fn activate(&mut self, ctx: &EffectContext) -> FxResult<Option<ImageFilter>> {
        let mut child = Activator::new(self.targets.clone(), self.graphics);
        child.apply(ctx)?;

        let aliased = child.targets.len() == 1
            && self.targets.len() == 1
            && EffectTarget::same_resource(&child.targets[0], &self.targets[0]);
        if aliased && child.builder.has_filter() {
            return Ok(child.builder.get_filter());
        }

        // Frozen layers live in the coordinates of the first parent target.
        let frame = self
            .targets
            .get(0)
            .map(EffectTarget::resource_offset)
            .unwrap_or(Vec2::ZERO);
        let filter = child.builder.get_filter();
        let mut layers = Vec::with_capacity(child.targets.len());
        for t in child.targets.iter() {
            let Some(src) = child.source_layer(t)? else {
                continue;
            };
            let layer = match &filter {
                Some(f) => f.apply(&src),
                None => src,
            };
            let shift = t.resource_offset() - frame;
            layers.push(ImageFilter::image(
                layer.offset(shift.x.round() as i32, shift.y.round() as i32),
            ));
        }
        Ok(match layers.len() {
            0 => None,
            1 => layers.pop(),
            _ => Some(ImageFilter::merge(layers)),
        })
    }

    /// Flush pending work and hand back the targets.
    pub fn finish(mut self) -> FxResult<EffectTargets> {
        self.flush(false)?;
        Ok(self.targets)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/fx/activator.rs"]
mod tests;
