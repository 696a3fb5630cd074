use super::*;

#[test]
fn new_validates_length() {
    assert!(Image::new(2, 2, vec![0; 15]).is_err());
    assert!(Image::new(2, 2, vec![0; 16]).is_ok());
}

#[test]
fn pixel_outside_is_transparent() {
    let img = Image::solid(2, 1, Rgba8Premul::from_straight_rgba(255, 0, 0, 255));
    assert_eq!(img.pixel(0, 0), [255, 0, 0, 255]);
    assert_eq!(img.pixel(2, 0), [0; 4]);
    assert_eq!(img.pixel(-1, 0), [0; 4]);
}

#[test]
fn layer_pixel_at_uses_origin() {
    let layer = Layer::new(
        Image::solid(1, 1, Rgba8Premul::from_straight_rgba(0, 0, 255, 255)),
        5,
        -3,
    );
    assert_eq!(layer.pixel_at(5, -3), [0, 0, 255, 255]);
    assert_eq!(layer.pixel_at(0, 0), [0; 4]);
    assert_eq!(layer.rect(), Rect::new(5.0, -3.0, 6.0, -2.0));
    assert!(Layer::empty().image.is_empty());
}
