use super::*;

#[test]
fn mul_div255_variants_align() {
    for x in [0u16, 1, 127, 255] {
        for y in [0u16, 1, 127, 255] {
            assert_eq!(u16::from(mul_div255_u8(x, y)), mul_div255_u16(x, y));
        }
    }
}

#[test]
fn premul_roundtrip_is_close_for_opaque_and_translucent() {
    for px in [[255u8, 128, 0, 255], [100, 50, 25, 128], [0, 0, 0, 0]] {
        let back = premul_u8(unpremul_f32(px));
        for c in 0..4 {
            assert!((i32::from(back[c]) - i32::from(px[c])).abs() <= 1);
        }
    }
}

#[test]
fn unit_to_u8_clamps() {
    assert_eq!(unit_to_u8(-1.0), 0);
    assert_eq!(unit_to_u8(2.0), 255);
    assert_eq!(add_sat_u8(200, 100), 255);
}
