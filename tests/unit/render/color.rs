use super::*;

const WHITE: [u8; 4] = [255, 255, 255, 255];
const RED: [u8; 4] = [255, 0, 0, 255];

fn close(a: [u8; 4], b: [u8; 4]) -> bool {
    a.iter()
        .zip(b.iter())
        .all(|(x, y)| (i32::from(*x) - i32::from(*y)).abs() <= 1)
}

#[test]
fn identity_is_neutral_for_matrix_multiplication() {
    let m = saturate_matrix(0.3);
    assert_eq!(mul_color_matrix(IDENTITY_MATRIX, m), m);
    assert_eq!(mul_color_matrix(m, IDENTITY_MATRIX), m);
    assert!(is_identity_color_matrix(&contrast_matrix(0.0)));
    assert!(is_identity_color_matrix(&brightness_matrix(1.0)));
    assert!(ColorFilter::matrix(saturate_matrix(1.0)).is_identity());
}

#[test]
fn composed_matrices_fold_and_match_sequential_application() {
    let a = ColorFilter::matrix(brightness_matrix(0.5));
    let b = ColorFilter::matrix(hue_rotate_matrix(90.0));
    let c = ColorFilter::compose(a.clone(), b.clone());
    assert!(matches!(c, ColorFilter::Matrix(_)));

    for px in [RED, [10, 200, 30, 255], [40, 20, 10, 128]] {
        assert!(close(c.apply_px(px), a.apply_px(b.apply_px(px))));
    }
}

#[test]
fn saturate_zero_is_grayscale() {
    let out = ColorFilter::matrix(saturate_matrix(0.0)).apply_px(RED);
    assert_eq!(out[0], out[1]);
    assert_eq!(out[1], out[2]);
    assert_eq!(out[3], 255);
}

#[test]
fn luma_color_moves_luminance_into_alpha() {
    let out = ColorFilter::matrix(luma_color_matrix()).apply_px(WHITE);
    assert!(close(out, [0, 0, 0, 255]));
    assert_eq!(ColorFilter::matrix(luma_color_matrix()).apply_px([0, 0, 0, 255]), [0; 4]);
}

#[test]
fn lookup_table_validates_and_honors_strength() {
    assert!(LookupTable::new(vec![0; 10]).is_err());
    let invert = LookupTable::from_fn(|v| 255 - v);
    assert_eq!(invert.with_strength(0.0), LookupTable::identity());
    assert_eq!(invert.with_strength(2.0), invert);
    assert_eq!(invert.with_strength(0.5).get(0), 128);

    let f = ColorFilter::table(LookupTables {
        a: LookupTable::identity(),
        ..LookupTables::uniform(invert)
    });
    assert_eq!(f.apply_px(RED), [0, 255, 255, 255]);
}

#[test]
fn blend_color_filter_uses_pixel_as_destination() {
    let f = ColorFilter::Blend {
        color: Rgba8Premul::from_straight_rgba(0, 0, 0, 255),
        mode: BlendMode::SrcOut,
    };
    assert_eq!(f.apply_px([0; 4]), [0, 0, 0, 255]);
    assert_eq!(f.apply_px(RED), [0; 4]);
}

#[test]
fn high_contrast_inverts_brightness_and_lightness() {
    let hc = |invert| {
        ColorFilter::HighContrast(HighContrast {
            grayscale: false,
            invert,
            contrast: 0.0,
        })
    };
    assert!(close(hc(InvertStyle::InvertBrightness).apply_px(WHITE), [0, 0, 0, 255]));
    assert!(close(hc(InvertStyle::InvertLightness).apply_px(WHITE), [0, 0, 0, 255]));
    assert!(close(hc(InvertStyle::InvertLightness).apply_px(RED), RED));
    assert!(close(hc(InvertStyle::NoInvert).apply_px(RED), RED));
    assert_eq!(hc(InvertStyle::InvertBrightness).apply_px([0; 4]), [0; 4]);
}

#[test]
fn apply_image_maps_every_pixel() {
    let img = Image::solid(3, 2, Rgba8Premul::from_straight_rgba(255, 0, 0, 255));
    let out = ColorFilter::matrix(brightness_matrix(0.0)).apply_image(&img);
    assert_eq!(out.width(), 3);
    assert!(out.data().chunks_exact(4).all(|p| p == [0, 0, 0, 255]));
}
