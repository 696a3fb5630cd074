use super::*;
use crate::foundation::core::Size;
use crate::foundation::error::FxResult;
use crate::fx::activator::Activator;
use crate::fx::custom::CustomFilterEffectContext;
use crate::fx::effect::EffectId;
use crate::fx::target::EffectTarget;
use crate::render::{CpuGraphicsFactory, GraphicsFactory};
use std::sync::Mutex;

#[derive(Debug, Clone)]
struct Params {
    version: u64,
    sigma: f64,
    saturation: f32,
    extra: bool,
    deferred: bool,
    erase: bool,
}

#[derive(Debug)]
struct Tunable {
    state: Mutex<Params>,
}

impl Tunable {
    fn new(deferred: bool) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(Params {
                version: 1,
                sigma: 1.0,
                saturation: 0.5,
                extra: false,
                deferred,
                erase: false,
            }),
        })
    }

    fn tweak(&self, f: impl FnOnce(&mut Params)) {
        let mut p = self.state.lock().unwrap();
        f(&mut p);
        p.version += 1;
    }
}

impl FilterEffect for Tunable {
    fn id(&self) -> EffectId {
        EffectId(1)
    }

    fn version(&self) -> u64 {
        self.state.lock().unwrap().version
    }

    fn apply_to(&self, ctx: &mut EffectContext) {
        let p = self.state.lock().unwrap().clone();
        if p.erase {
            ctx.custom_effect(Erase, erase, |_, r| r);
        }
        if p.deferred {
            ctx.custom_effect_unbounded(Grow, grow);
        }
        ctx.blur(Size::new(p.sigma, p.sigma));
        ctx.saturate(p.saturation);
        if p.extra {
            ctx.brightness(0.5);
        }
    }
}

#[derive(Debug, PartialEq, serde::Serialize)]
struct Grow;

fn grow(_: &Grow, cx: &mut CustomFilterEffectContext<'_>) -> FxResult<()> {
    for i in 0..cx.targets().len() {
        let b = cx.targets()[i].bounds();
        let next = cx.create_target(b.inflate(1.0, 1.0));
        cx.targets_mut().set(i, next);
    }
    Ok(())
}

#[derive(Debug, PartialEq, serde::Serialize)]
struct Erase;

fn erase(_: &Erase, cx: &mut CustomFilterEffectContext<'_>) -> FxResult<()> {
    cx.targets_mut().dispose();
    Ok(())
}

#[derive(Default)]
struct Reports(Vec<CacheReport>);

impl RenderCache for Reports {
    fn report(&mut self, report: CacheReport) {
        self.0.push(report);
    }
}

fn source() -> Rect {
    Rect::new(0.0, 0.0, 4.0, 4.0)
}

fn render(effect: &Arc<dyn FilterEffect>, copies: usize) -> EffectTargets {
    let g = CpuGraphicsFactory::default();
    let targets: EffectTargets = (0..copies)
        .map(|_| EffectTarget::from_render_target(g.create_render_target(4, 4).unwrap(), source()))
        .collect();
    let mut ctx = EffectContext::new(source());
    ctx.apply(Some(effect));
    let mut act = Activator::new(targets, &g);
    act.apply(&ctx).unwrap();
    act.finish().unwrap()
}

fn captured(deferred: bool) -> (Arc<Tunable>, HistoryComparator) {
    let tunable = Tunable::new(deferred);
    let effect: Arc<dyn FilterEffect> = tunable.clone();
    let mut cmp = HistoryComparator::new(effect.clone(), source());
    cmp.capture(&render(&effect, 1));
    (tunable, cmp)
}

#[test]
fn without_snapshot_nothing_matches() {
    let effect: Arc<dyn FilterEffect> = Tunable::new(false);
    let cmp = HistoryComparator::new(effect, source());
    let mut reports = Reports::default();
    assert!(!cmp.accepts(&mut reports));
    assert_eq!(reports.0, vec![CacheReport { matched: 0, total: 2 }]);
}

#[test]
fn unchanged_version_takes_fast_path() {
    let (_, cmp) = captured(false);
    let mut reports = Reports::default();
    assert!(cmp.accepts(&mut reports));
    assert_eq!(reports.0, vec![CacheReport { matched: 2, total: 2 }]);
    assert_eq!(cmp.snapshot().map(HistorySnapshot::version), Some(1));
}

#[test]
fn version_bump_without_changes_still_matches() {
    let (tunable, cmp) = captured(false);
    tunable.tweak(|_| {});
    let mut reports = Reports::default();
    assert!(cmp.accepts(&mut reports));
    assert!(reports.0[0].is_complete());
}

#[test]
fn changed_parameter_limits_prefix() {
    let (tunable, cmp) = captured(false);
    tunable.tweak(|p| p.saturation = 0.25);
    let mut reports = Reports::default();
    assert!(!cmp.accepts(&mut reports));
    assert_eq!(reports.0, vec![CacheReport { matched: 1, total: 2 }]);

    tunable.tweak(|p| p.sigma = 3.0);
    assert!(!cmp.accepts(&mut reports));
    assert_eq!(reports.0[1], CacheReport { matched: 0, total: 2 });
}

#[test]
fn appended_and_removed_records_are_incomplete() {
    let (tunable, cmp) = captured(false);
    tunable.tweak(|p| p.extra = true);
    let mut reports = Reports::default();
    assert!(!cmp.accepts(&mut reports));
    assert_eq!(reports.0[0], CacheReport { matched: 2, total: 3 });

    let effect: Arc<dyn FilterEffect> = tunable.clone();
    let mut cmp = HistoryComparator::new(effect.clone(), source());
    cmp.capture(&render(&effect, 1));
    tunable.tweak(|p| p.extra = false);
    assert!(!cmp.accepts(&mut reports));
    assert_eq!(reports.0[1], CacheReport { matched: 2, total: 2 });
}

#[test]
fn deferred_items_are_replayed_from_recorded_bounds() {
    let (tunable, cmp) = captured(true);
    let hist = &cmp.snapshot().unwrap().histories()[0];
    assert_eq!(hist.len(), 3);

    tunable.tweak(|_| {});
    let mut reports = Reports::default();
    assert!(cmp.accepts(&mut reports));
    assert_eq!(reports.0[0], CacheReport { matched: 3, total: 3 });

    tunable.tweak(|p| p.saturation = 0.0);
    assert!(!cmp.accepts(&mut reports));
    assert_eq!(reports.0[1], CacheReport { matched: 2, total: 3 });
}

#[test]
fn every_target_must_match() {
    let tunable = Tunable::new(false);
    let effect: Arc<dyn FilterEffect> = tunable.clone();
    let mut cmp = HistoryComparator::new(effect.clone(), source());
    let mut targets = render(&effect, 2);
    targets.remove_at(1);
    let mut short = EffectTargets::from(
        EffectTarget::from_render_target(
            CpuGraphicsFactory::default().create_render_target(1, 1).unwrap(),
            source(),
        ),
    );
    short.insert_range(0, targets);
    cmp.capture(&short);

    tunable.tweak(|_| {});
    let mut reports = Reports::default();
    assert!(!cmp.accepts(&mut reports));
    assert_eq!(reports.0[0], CacheReport { matched: 0, total: 2 });
}

#[test]
fn snapshot_fingerprint_tracks_version_and_bounds() {
    let (tunable, mut cmp) = captured(false);
    let first = cmp.snapshot().unwrap().fingerprint();

    let effect = cmp.effect().clone();
    cmp.capture(&render(&effect, 1));
    assert_eq!(cmp.snapshot().unwrap().fingerprint(), first);

    tunable.tweak(|_| {});
    cmp.capture(&render(&effect, 1));
    assert_ne!(cmp.snapshot().unwrap().fingerprint(), first);

    cmp.set_source_bounds(Rect::new(0.0, 0.0, 8.0, 8.0));
    assert_eq!(cmp.source_bounds(), Rect::new(0.0, 0.0, 8.0, 8.0));
    cmp.reset();
    assert!(cmp.snapshot().is_none());
}

#[test]
fn erased_chain_still_matches_its_recording() {
    let tunable = Tunable::new(false);
    tunable.tweak(|p| p.erase = true);
    let effect: Arc<dyn FilterEffect> = tunable.clone();
    let mut cmp = HistoryComparator::new(effect.clone(), source());
    let out = render(&effect, 1);
    assert!(out.is_empty());
    cmp.capture(&out);
    assert!(cmp.snapshot().unwrap().histories().is_empty());
    assert_eq!(cmp.snapshot().unwrap().recorded().count_items(), 3);

    tunable.tweak(|_| {});
    let mut reports = Reports::default();
    assert!(cmp.accepts(&mut reports));
    assert_eq!(reports.0[0], CacheReport { matched: 3, total: 3 });

    tunable.tweak(|p| p.saturation = 0.0);
    assert!(!cmp.accepts(&mut reports));
    assert_eq!(reports.0[1], CacheReport { matched: 2, total: 3 });
}
