use super::*;

#[test]
fn bounds_map_keeps_invalid_sentinel() {
    let b = Bounds::Invalid.map(|r| r.inflate(1.0, 1.0));
    assert!(b.is_invalid());
    assert_eq!(b.rect(), None);

    let v = Bounds::from(Rect::new(0.0, 0.0, 10.0, 10.0)).map(|r| r.inflate(1.0, 2.0));
    assert_eq!(v.rect(), Some(Rect::new(-1.0, -2.0, 11.0, 12.0)));
}

#[test]
fn inflate_sides_is_asymmetric() {
    let r = inflate_sides(Rect::new(0.0, 0.0, 4.0, 4.0), 1.0, 2.0, 3.0, 4.0);
    assert_eq!(r, Rect::new(-1.0, -2.0, 7.0, 8.0));
}

#[test]
fn pixel_size_rounds_up_and_rejects_degenerate() {
    assert_eq!(pixel_size(Rect::new(0.0, 0.0, 10.2, 3.0)), (11, 3));
    assert_eq!(pixel_size(Rect::new(5.0, 5.0, 5.0, 9.0)), (0, 4));
    assert_eq!(pixel_size(Rect::new(0.0, 0.0, f64::NAN, 1.0)), (0, 1));
}

#[test]
fn local_rect_moves_to_origin() {
    let r = local_rect(Rect::new(-15.0, -15.0, 115.0, 115.0));
    assert_eq!(r, Rect::new(0.0, 0.0, 130.0, 130.0));
}

#[test]
fn rgba8_premul_from_straight_rounding() {
    let c = Rgba8Premul::from_straight_rgba(255, 128, 0, 128);
    assert_eq!(c.a, 128);
    assert_eq!(c.r, 128);
    assert_eq!(c.g, 64);
    assert_eq!(c.b, 0);
    assert_eq!(Rgba8Premul::transparent().to_straight_f32(), [0.0; 4]);
}
