use std::io::Cursor;

use anyhow::Context;
use image::{
    AnimationDecoder, Delay, DynamicImage, Frame, ImageFormat, RgbaImage,
    codecs::gif::{GifDecoder, GifEncoder, Repeat},
};

use crate::{
    backend::raster::RasterImage,
    foundation::{
        core::{DELAY, LOOP, MetaValue, Metadata, N_PAGES, PAGE_HEIGHT},
        error::{StackError, StackResult},
    },
};

/// Frame delay used when an animation carries no timing metadata.
pub const DEFAULT_DELAY_MS: i64 = 100;

/// Decode encoded bytes into a straight-alpha raster.
///
/// GIF data keeps every frame, packed top to bottom, with page metadata describing the layout.
pub fn decode_image(bytes: &[u8]) -> anyhow::Result<RasterImage> {
    let format = image::guess_format(bytes).context("detect image format")?;
    if format == ImageFormat::Gif {
        return decode_gif_pages(bytes);
    }

    let dyn_img =
        image::load_from_memory_with_format(bytes, format).context("decode image from memory")?;
    let pixels = dyn_img.to_rgba8();

    Ok(RasterImage {
        pixels,
        format,
        meta: Metadata::new(),
    })
}

/// Decode every GIF frame and stack them into one tall image.
pub fn decode_gif_pages(bytes: &[u8]) -> anyhow::Result<RasterImage> {
    let decoder = GifDecoder::new(Cursor::new(bytes)).context("read gif header")?;
    let frames = decoder
        .into_frames()
        .collect_frames()
        .context("decode gif frames")?;

    let Some(first) = frames.first() else {
        anyhow::bail!("gif contains no frames");
    };
    let (width, page_height) = first.buffer().dimensions();
    if width == 0 || page_height == 0 {
        anyhow::bail!("gif frame has zero size");
    }
    let pages = u32::try_from(frames.len()).context("gif frame count overflows u32")?;
    let total_height = page_height
        .checked_mul(pages)
        .context("packed gif height overflows u32")?;

    let mut pixels = RgbaImage::new(width, total_height);
    let mut delays = Vec::with_capacity(frames.len());
    for (idx, frame) in frames.iter().enumerate() {
        let buf = frame.buffer();
        if buf.dimensions() != (width, page_height) {
            anyhow::bail!(
                "gif frame {idx} is {}x{}, expected {width}x{page_height}",
                buf.width(),
                buf.height()
            );
        }
        let top = i64::from(page_height) * idx as i64;
        image::imageops::replace(&mut pixels, buf, 0, top);
        delays.push(delay_ms(frame.delay()));
    }

    let mut meta = Metadata::new();
    meta.set_int(PAGE_HEIGHT, i64::from(page_height));
    meta.set_int(N_PAGES, i64::from(pages));
    meta.set(DELAY, MetaValue::IntArray(delays));

    Ok(RasterImage {
        pixels,
        format: ImageFormat::Gif,
        meta,
    })
}

/// Encode `img` in the format it was decoded from.
pub fn encode_native(img: &RasterImage) -> StackResult<Vec<u8>> {
    let name = format_label(img.format);
    let dyn_img = DynamicImage::ImageRgba8(img.pixels.clone());
    let dyn_img = if supports_alpha(img.format) {
        dyn_img
    } else {
        DynamicImage::ImageRgb8(dyn_img.to_rgb8())
    };

    let mut buf = Vec::new();
    dyn_img
        .write_to(&mut Cursor::new(&mut buf), img.format)
        .map_err(|e| StackError::export(name, e))?;
    Ok(buf)
}

/// Encode a packed multi-page raster as an animated GIF.
pub fn encode_gif(img: &RasterImage) -> StackResult<Vec<u8>> {
    let (width, height) = img.pixels.dimensions();
    let page_height = img
        .meta
        .int_or(PAGE_HEIGHT, i64::from(height))
        .and_then(|ph| {
            u32::try_from(ph)
                .ok()
                .filter(|ph| *ph > 0 && height % *ph == 0)
                .ok_or_else(|| {
                    StackError::metadata(
                        PAGE_HEIGHT,
                        format!("{ph} does not evenly divide image height {height}"),
                    )
                })
        })?;
    let pages = height / page_height;

    let delays = img.meta.int_array(DELAY).unwrap_or(&[]);
    let repeat = match img.meta.int_or(LOOP, 0)? {
        n if n <= 0 => Repeat::Infinite,
        n => Repeat::Finite(u16::try_from(n).unwrap_or(u16::MAX)),
    };

    let mut frames = Vec::with_capacity(pages as usize);
    for page in 0..pages {
        let buf =
            image::imageops::crop_imm(&img.pixels, 0, page * page_height, width, page_height)
                .to_image();

        let ms = if delays.is_empty() {
            DEFAULT_DELAY_MS
        } else {
            delays[page as usize % delays.len()]
        };
        let ms = u32::try_from(ms.max(0)).unwrap_or(u32::MAX);
        frames.push(Frame::from_parts(
            buf,
            0,
            0,
            Delay::from_numer_denom_ms(ms, 1),
        ));
    }

    let mut out = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut out);
        encoder
            .set_repeat(repeat)
            .map_err(|e| StackError::export("gif", e))?;
        encoder
            .encode_frames(frames)
            .map_err(|e| StackError::export("gif", e))?;
    }
    Ok(out)
}

/// Short lowercase label for a format (its primary file extension).
pub fn format_label(format: ImageFormat) -> String {
    format
        .extensions_str()
        .first()
        .map(|ext| (*ext).to_string())
        .unwrap_or_else(|| format!("{format:?}").to_lowercase())
}

fn supports_alpha(format: ImageFormat) -> bool {
    !matches!(format, ImageFormat::Jpeg | ImageFormat::Pnm)
}

fn delay_ms(delay: Delay) -> i64 {
    let (numer, denom) = delay.numer_denom_ms();
    if denom == 0 {
        return DEFAULT_DELAY_MS;
    }
    i64::from((numer + denom / 2) / denom)
}

#[cfg(test)]
#[path = "../../tests/unit/backend/codec.rs"]
mod tests;
