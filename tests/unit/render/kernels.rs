use super::*;
use crate::foundation::core::Rgba8Premul;

fn dot(x: i32, y: i32) -> Layer {
    Layer::new(
        Image::solid(1, 1, Rgba8Premul::from_straight_rgba(255, 255, 255, 255)),
        x,
        y,
    )
}

#[test]
fn gaussian_kernel_sums_to_one() {
    let k = gaussian_kernel_q16(6, 2.0);
    assert_eq!(k.len(), 13);
    assert_eq!(k.iter().map(|&v| u64::from(v)).sum::<u64>(), 1 << 16);
    assert_eq!(gaussian_kernel_q16(0, 2.0), vec![1 << 16]);
    assert_eq!(blur_radius(0.0), 0);
    assert_eq!(blur_radius(-1.0), 0);
    assert_eq!(blur_radius(1.5), 5);
}

#[test]
fn blur_grows_extent_and_spreads_energy() {
    let out = blur(&dot(10, 20), 1.0, 2.0);
    assert_eq!((out.x, out.y), (7, 14));
    assert_eq!((out.image.width(), out.image.height()), (7, 13));
    let center = out.pixel_at(10, 20);
    assert!(center[3] > 0 && center[3] < 255);
    assert!(out.pixel_at(11, 20)[3] < center[3]);
    assert_eq!(out.pixel_at(13, 20), [0; 4]);
}

#[test]
fn dilate_grows_and_erode_shrinks_coverage() {
    let d = morphology(&dot(0, 0), 1, 2, true);
    assert_eq!(d.rect(), Rect::new(-1.0, -2.0, 2.0, 3.0));
    assert_eq!(d.pixel_at(-1, 2), [255; 4]);

    let block = Layer::new(Image::solid(3, 3, Rgba8Premul::from_straight_rgba(255, 255, 255, 255)), 0, 0);
    let e = morphology(&block, 1, 1, false);
    assert_eq!(e.rect(), block.rect());
    assert_eq!(e.pixel_at(1, 1), [255; 4]);
    assert_eq!(e.pixel_at(0, 0), [0; 4]);
}

#[test]
fn identity_convolution_keeps_pixels() {
    let p = ConvolutionParams {
        kernel_size: (3, 3),
        kernel: vec![0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0],
        gain: 1.0,
        bias: 0.0,
        kernel_offset: (1, 1),
        tile_mode: TileMode::Decal,
        convolve_alpha: true,
    };
    let out = convolve(&dot(4, 4), &p);
    assert_eq!(out.rect(), Rect::new(3.0, 3.0, 6.0, 6.0));
    assert_eq!(out.pixel_at(4, 4), [255; 4]);
    assert_eq!(out.pixel_at(3, 4), [0; 4]);
}

#[test]
fn tile_modes_map_coordinates() {
    assert_eq!(tile_coord(-1, 4, TileMode::Decal), None);
    assert_eq!(tile_coord(-1, 4, TileMode::Clamp), Some(0));
    assert_eq!(tile_coord(5, 4, TileMode::Repeat), Some(1));
    assert_eq!(tile_coord(4, 4, TileMode::Mirror), Some(3));
    assert_eq!(tile_coord(-1, 4, TileMode::Mirror), Some(0));
}

#[test]
fn translation_transform_moves_pixels() {
    let out = transform(&dot(0, 0), Affine::translate((3.0, 1.0)), Interpolation::Nearest);
    assert_eq!(out.rect(), Rect::new(3.0, 1.0, 4.0, 2.0));
    assert_eq!(out.pixel_at(3, 1), [255; 4]);
    assert!(transform(&dot(0, 0), Affine::scale(0.0), Interpolation::Linear).image.is_empty());
}

#[test]
fn neutral_displacement_keeps_pixels() {
    let gray = Layer::new(
        Image::solid(5, 5, Rgba8Premul::from_straight_rgba(128, 128, 128, 255)),
        -2,
        -2,
    );
    let out = displace(&dot(0, 0), &gray, ChannelSelector::R, ChannelSelector::G, 2.0);
    assert_eq!(out.rect(), Rect::new(-1.0, -1.0, 2.0, 2.0));
    assert_eq!(out.pixel_at(0, 0), [255; 4]);
    assert_eq!(out.pixel_at(1, 0), [0; 4]);
}

#[test]
fn union_over_covers_both_layers() {
    let shadow = tint(&dot(2, 2), [0, 0, 0, 255]);
    let out = union_over(&shadow, &dot(0, 0));
    assert_eq!(out.rect(), Rect::new(0.0, 0.0, 3.0, 3.0));
    assert_eq!(out.pixel_at(2, 2), [0, 0, 0, 255]);
    assert_eq!(out.pixel_at(0, 0), [255; 4]);
    assert_eq!(out.pixel_at(1, 1), [0; 4]);
}
