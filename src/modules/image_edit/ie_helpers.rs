pub(super) const TRANSPARENT: [u8; 4] = [0, 0, 0, 0];

pub(super) fn clamp_channel(v: f32) -> u8 { v.round().clamp(0.0, 255.0) as u8 }

pub(super) fn luma(r: f32, g: f32, b: f32) -> f32 { 0.3 * r + 0.59 * g + 0.11 * b }

/// Source-over for straight (unpremultiplied) RGBA. `opacity` scales the source alpha.
pub(super) fn blend_over(dst: [u8; 4], src: [u8; 4], opacity: f32) -> [u8; 4] {
    let src_a: f32 = src[3] as f32 / 255.0 * opacity;
    if src_a <= 0.0 { return dst; }
    if src_a >= 1.0 { return src; }

    if dst[3] == 0 {
        let a: u8 = clamp_channel(src_a * 255.0);
        return if a == 0 { TRANSPARENT } else { [src[0], src[1], src[2], a] };
    }

    let dst_a: f32 = dst[3] as f32 / 255.0;
    let out_a: f32 = src_a + dst_a * (1.0 - src_a);
    let mix = |s: u8, d: u8| -> u8 {
        clamp_channel((s as f32 * src_a + d as f32 * dst_a * (1.0 - src_a)) / out_a)
    };
    [mix(src[0], dst[0]), mix(src[1], dst[1]), mix(src[2], dst[2]), clamp_channel(out_a * 255.0)]
}

/// Destination-out: the source only contributes its alpha, which is removed from `dst`.
pub(super) fn erase(dst: [u8; 4], src_alpha: u8, opacity: f32) -> [u8; 4] {
    let k: f32 = src_alpha as f32 / 255.0 * opacity;
    if k <= 0.0 { return dst; }
    let a: u8 = clamp_channel(dst[3] as f32 * (1.0 - k));
    if a == 0 { TRANSPARENT } else { [dst[0], dst[1], dst[2], a] }
}

pub(super) fn distance_to_segment(p: (f32, f32), a: (f32, f32), b: (f32, f32)) -> f32 {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len_sq: f32 = dx * dx + dy * dy;
    let t: f32 = if len_sq == 0.0 { 0.0 } else { (((p.0 - a.0) * dx + (p.1 - a.1) * dy) / len_sq).clamp(0.0, 1.0) };
    let (cx, cy) = (a.0 + dx * t, a.1 + dy * t);
    ((p.0 - cx).powi(2) + (p.1 - cy).powi(2)).sqrt()
}
