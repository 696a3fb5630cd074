use super::*;
use crate::foundation::core::Size;
use crate::fx::effect::FilterEffectGroup;
use crate::fx::record::RecordKind;

#[derive(Debug)]
struct Blurry {
    id: u64,
    version: u64,
    sigma: f64,
    enabled: bool,
}

impl Blurry {
    fn new(id: u64, sigma: f64) -> Arc<dyn FilterEffect> {
        Arc::new(Self {
            id,
            version: 1,
            sigma,
            enabled: true,
        })
    }
}

impl FilterEffect for Blurry {
    fn id(&self) -> EffectId {
        EffectId(self.id)
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn apply_to(&self, ctx: &mut EffectContext) {
        ctx.blur(Size::new(self.sigma, self.sigma));
    }
}

#[derive(Debug, PartialEq, serde::Serialize)]
struct Opaque;

fn unit() -> Rect {
    Rect::new(0.0, 0.0, 10.0, 10.0)
}

#[test]
fn new_context_is_empty() {
    let ctx = EffectContext::new(unit());
    assert_eq!(ctx.bounds(), Bounds::Valid(unit()));
    assert_eq!(ctx.original_bounds(), Bounds::Valid(unit()));
    assert_eq!(ctx.count_items(), 0);
    assert!(ctx.render_time_items().is_empty());
    assert!(matches!(ctx.first_version(), Err(FxError::NoAppliedEffects)));
}

#[test]
fn apply_none_is_noop() {
    let mut ctx = EffectContext::new(unit());
    ctx.apply(None);
    assert!(ctx.applied_versions().is_empty());
    assert_eq!(ctx.count_items(), 0);
}

#[test]
fn apply_records_version_and_bounds() {
    let mut ctx = EffectContext::new(unit());
    ctx.apply(Some(&Blurry::new(7, 2.0)));
    assert_eq!(ctx.applied_versions(), &[(EffectId(7), 1)]);
    assert_eq!(ctx.first_version().unwrap(), 1);
    assert_eq!(ctx.count_items(), 1);
    assert_eq!(ctx.items()[0].kind(), RecordKind::BackendFilter);
    assert_eq!(ctx.bounds(), Bounds::Valid(Rect::new(-6.0, -6.0, 16.0, 16.0)));
    assert_eq!(ctx.original_bounds(), Bounds::Valid(unit()));
}

#[test]
fn disabled_effect_only_records_version() {
    let effect: Arc<dyn FilterEffect> = Arc::new(Blurry {
        id: 3,
        version: 9,
        sigma: 1.0,
        enabled: false,
    });
    let mut ctx = EffectContext::new(unit());
    ctx.apply(Some(&effect));
    assert_eq!(ctx.applied_versions(), &[(EffectId(3), 9)]);
    assert_eq!(ctx.count_items(), 0);
    assert_eq!(ctx.bounds(), Bounds::Valid(unit()));
}

#[test]
fn group_applies_children_in_order() {
    let group: Arc<dyn FilterEffect> = Arc::new(FilterEffectGroup::new(
        EffectId(1),
        vec![Blurry::new(2, 1.0), Blurry::new(3, 2.0)],
    ));
    let mut ctx = EffectContext::new(unit());
    ctx.apply(Some(&group));

    let ids: Vec<EffectId> = ctx.applied_versions().iter().map(|(id, _)| *id).collect();
    assert_eq!(ids, vec![EffectId(1), EffectId(2), EffectId(3)]);
    assert_eq!(ctx.count_items(), 2);
    assert_eq!(ctx.bounds(), Bounds::Valid(Rect::new(-9.0, -9.0, 19.0, 19.0)));
}

#[test]
fn unbounded_custom_defers_everything_after_it() {
    let mut ctx = EffectContext::new(unit());
    ctx.saturate(0.5);
    ctx.custom_effect_unbounded(Opaque, |_, _| Ok(()));
    assert!(ctx.bounds().is_invalid());
    assert_eq!(ctx.count_items(), 2);

    ctx.blur(Size::new(1.0, 1.0));
    ctx.apply(Some(&Blurry::new(5, 1.0)));
    assert_eq!(ctx.count_items(), 2);
    assert_eq!(ctx.render_time_items().len(), 2);
    assert!(matches!(ctx.render_time_items()[0], RenderTimeItem::Record(_)));
    assert!(matches!(ctx.render_time_items()[1], RenderTimeItem::Effect(_)));
    assert_eq!(ctx.applied_versions().len(), 1);
}

#[test]
fn replay_resolves_deferred_items_against_real_bounds() {
    let mut ctx = EffectContext::new(unit());
    ctx.custom_effect_unbounded(Opaque, |_, _| Ok(()));
    ctx.blur(Size::new(1.0, 1.0));
    ctx.apply(Some(&Blurry::new(5, 2.0)));

    let real = Rect::new(0.0, 0.0, 4.0, 4.0);
    let mut child = EffectContext::new(real);
    for item in ctx.render_time_items() {
        child.replay(item);
    }
    assert_eq!(child.count_items(), 2);
    assert!(child.render_time_items().is_empty());
    assert_eq!(child.bounds(), Bounds::Valid(Rect::new(-9.0, -9.0, 13.0, 13.0)));
}

#[test]
fn clone_is_independent_and_equal() {
    let mut a = EffectContext::new(unit());
    a.blur(Size::new(1.0, 1.0));
    let mut b = a.clone();
    assert_eq!(a, b);
    assert_eq!(a.fingerprint(), b.fingerprint());

    b.saturate(0.0);
    assert_eq!(a.count_items(), 1);
    assert_eq!(b.count_items(), 2);
    assert_ne!(a, b);
    assert_ne!(a.fingerprint(), b.fingerprint());
}

#[test]
fn equality_tracks_bounds_and_parameters() {
    let mut a = EffectContext::new(unit());
    let mut b = EffectContext::new(unit());
    a.blur(Size::new(1.0, 1.0));
    b.blur(Size::new(1.0, 1.0));
    assert_eq!(a, b);

    let mut c = EffectContext::new(unit());
    c.blur(Size::new(1.5, 1.0));
    assert_ne!(a, c);

    let mut d = EffectContext::new(Rect::new(0.0, 0.0, 5.0, 5.0));
    d.blur(Size::new(1.0, 1.0));
    assert_ne!(a, d);
}

#[test]
fn child_context_starts_at_current_bounds() {
    let mut ctx = EffectContext::new(unit());
    ctx.dilate(2.0, 3.0);
    let child = ctx.create_child_context();
    assert_eq!(child.bounds(), ctx.bounds());
    assert_eq!(child.original_bounds(), ctx.bounds());
    assert_eq!(child.count_items(), 0);
}

#[test]
fn serializes_bounds_and_fingerprint() {
    let mut ctx = EffectContext::new(unit());
    ctx.brightness(0.5);
    let v = serde_json::to_value(&ctx).unwrap();
    assert!(v.get("bounds").is_some());
    assert!(v.get("fingerprint").is_some());
}
