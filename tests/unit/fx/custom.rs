use super::*;
use crate::fx::history::HistoryEntry;
use crate::fx::record::Record;
use crate::fx::target::ImageNode;
use crate::render::{CpuGraphicsFactory, CpuGraphicsOpts, Image, Paint};
use std::sync::Arc;

#[derive(Debug, PartialEq, serde::Serialize)]
struct Mark;

fn history() -> History {
    History::new().push(HistoryEntry {
        record: Record::color(Mark, |_, _| None),
        source_bounds: Rect::new(0.0, 0.0, 1.0, 1.0),
    })
}

#[test]
fn created_targets_inherit_history() {
    let g = CpuGraphicsFactory::default();
    let mut ts = EffectTargets::new();
    let cx = CustomFilterEffectContext::new(&mut ts, history(), &g);
    let t = cx.create_target(Rect::new(2.0, 3.0, 6.0, 5.0));
    assert!(!t.is_empty());
    assert_eq!(t.bounds(), Rect::new(2.0, 3.0, 6.0, 5.0));
    assert_eq!(t.render_target().map(|rt| (rt.width(), rt.height())), Some((4, 2)));
    assert_eq!(t.history().len(), 1);
}

#[test]
fn failed_allocation_yields_empty_target() {
    let g = CpuGraphicsFactory::new(CpuGraphicsOpts {
        max_dimension: 4,
        ..CpuGraphicsOpts::default()
    });
    let mut ts = EffectTargets::new();
    let cx = CustomFilterEffectContext::new(&mut ts, History::new(), &g);
    assert!(cx.create_target(Rect::new(0.0, 0.0, 10.0, 1.0)).is_empty());
    assert_eq!(g.stats().failed_allocs, 1);
}

#[test]
fn open_requires_a_raster_target() {
    let g = CpuGraphicsFactory::default();
    let mut ts = EffectTargets::new();
    let cx = CustomFilterEffectContext::new(&mut ts, History::new(), &g);

    let node = EffectTarget::from_node(Arc::new(ImageNode::new(
        Image::transparent(1, 1),
        Rect::new(0.0, 0.0, 1.0, 1.0),
    )));
    assert!(matches!(cx.open(&node), Err(FxError::InvalidTarget(_))));
    assert!(matches!(cx.open(&EffectTarget::empty()), Err(FxError::InvalidTarget(_))));

    let raster = cx.create_target(Rect::new(0.0, 0.0, 2.0, 2.0));
    let mut canvas = cx.open(&raster).unwrap();
    let grey = crate::Rgba8Premul::from_straight_rgba(9, 9, 9, 255);
    canvas.draw_image(&Image::solid(1, 1, grey), crate::Point::ZERO, &Paint::default());
    assert_eq!(canvas.pixel(0, 0), Some([9, 9, 9, 255]));
}

#[test]
fn callbacks_can_reshape_the_target_set() {
    let g = CpuGraphicsFactory::default();
    let mut ts = EffectTargets::new();
    {
        let mut cx = CustomFilterEffectContext::new(&mut ts, History::new(), &g);
        let a = cx.create_target(Rect::new(0.0, 0.0, 1.0, 1.0));
        let b = cx.create_target(Rect::new(1.0, 0.0, 2.0, 1.0));
        cx.targets_mut().push(a);
        cx.targets_mut().push(b);
        assert_eq!(cx.targets().len(), 2);
        cx.targets_mut().remove_at(0);
    }
    assert_eq!(ts.len(), 1);
    assert_eq!(ts[0].bounds().x0, 1.0);
    assert_eq!(g.stats().live_surfaces, 1);
}
