use image::RgbaImage;

use crate::foundation::core::BlendMode;

/// One straight-alpha RGBA8 pixel.
pub type Rgba8 = [u8; 4];

/// Porter-Duff source-over on straight-alpha pixels.
///
/// Colour terms are alpha-weighted in `u32` and divided by the output alpha once.
pub fn over(dst: Rgba8, src: Rgba8) -> Rgba8 {
    let sa = u32::from(src[3]);
    if sa == 0 {
        return dst;
    }
    if sa == 255 {
        return src;
    }

    // Both weights are scaled by 255.
    let src_w = sa * 255;
    let dst_w = u32::from(dst[3]) * (255 - sa);
    let total = src_w + dst_w;

    let mut out = [0u8; 4];
    for i in 0..3 {
        let c = u32::from(src[i]) * src_w + u32::from(dst[i]) * dst_w;
        out[i] = ((c + total / 2) / total).min(255) as u8;
    }
    out[3] = ((total + 127) / 255).min(255) as u8;
    out
}

/// Porter-Duff destination-over: `src` ends up behind `dst`.
pub fn dest_over(dst: Rgba8, src: Rgba8) -> Rgba8 {
    over(src, dst)
}

/// Combine `src` into `dst` with `mode`.
pub fn blend(mode: BlendMode, dst: Rgba8, src: Rgba8) -> Rgba8 {
    match mode {
        BlendMode::Over => over(dst, src),
        BlendMode::DestOver => dest_over(dst, src),
    }
}

/// Blend `src` into `dst` with its top-left corner at `(x, y)`.
///
/// Pixels of `src` that fall outside `dst` are ignored; `dst` keeps its size.
pub fn layer_in_place(dst: &mut RgbaImage, src: &RgbaImage, x: i64, y: i64, mode: BlendMode) {
    let (dw, dh) = (i64::from(dst.width()), i64::from(dst.height()));
    let (sw, sh) = (i64::from(src.width()), i64::from(src.height()));

    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = x.saturating_add(sw).min(dw);
    let y1 = y.saturating_add(sh).min(dh);
    if x0 >= x1 || y0 >= y1 {
        return;
    }

    for dy in y0..y1 {
        for dx in x0..x1 {
            let s = src.get_pixel((dx - x) as u32, (dy - y) as u32).0;
            let d = dst.get_pixel_mut(dx as u32, dy as u32);
            d.0 = blend(mode, d.0, s);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/backend/blend.rs"]
mod tests;
