//! Magma colormap.

/// Control points sampled from matplotlib's magma at even steps.
const MAGMA: [[u8; 3]; 9] = [
    [0, 0, 4],
    [28, 16, 68],
    [79, 18, 123],
    [129, 37, 129],
    [181, 54, 122],
    [229, 80, 100],
    [251, 135, 97],
    [254, 194, 135],
    [252, 253, 191],
];

/// Map `t` in [0, 1] to an RGB color.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn magma(t: f32) -> [u8; 3] {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let scaled = t * (MAGMA.len() - 1) as f32;
    let lower = (scaled.floor() as usize).min(MAGMA.len() - 2);
    let frac = scaled - lower as f32;
    let (a, b) = (MAGMA[lower], MAGMA[lower + 1]);
    std::array::from_fn(|i| {
        let value = f32::from(a[i]) + (f32::from(b[i]) - f32::from(a[i])) * frac;
        value.round() as u8
    })
}
