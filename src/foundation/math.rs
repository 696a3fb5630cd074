pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

pub(crate) fn mul_div255_u8(x: u16, y: u16) -> u8 {
    mul_div255_u16(x, y) as u8
}

pub(crate) fn add_sat_u8(a: u8, b: u8) -> u8 {
    a.saturating_add(b)
}

pub(crate) fn unit_to_u8(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Unpremultiply one pixel into `0..=1` straight-alpha channels.
pub(crate) fn unpremul_f32(px: [u8; 4]) -> [f32; 4] {
    let a = f32::from(px[3]) / 255.0;
    if a <= 0.0 {
        return [0.0; 4];
    }
    let inv = 1.0 / a;
    [
        (f32::from(px[0]) / 255.0 * inv).min(1.0),
        (f32::from(px[1]) / 255.0 * inv).min(1.0),
        (f32::from(px[2]) / 255.0 * inv).min(1.0),
        a,
    ]
}

/// Premultiply straight-alpha channels and quantize.
pub(crate) fn premul_u8(c: [f32; 4]) -> [u8; 4] {
    let a = c[3].clamp(0.0, 1.0);
    [
        unit_to_u8(c[0].clamp(0.0, 1.0) * a),
        unit_to_u8(c[1].clamp(0.0, 1.0) * a),
        unit_to_u8(c[2].clamp(0.0, 1.0) * a),
        unit_to_u8(a),
    ]
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
