//! SVG rasterization and canvas composition using resvg.
//!
//! Icons are always drawn onto a transparent square: content is scaled to fit
//! while keeping its aspect ratio and centered, leaving the rest clear. Wide
//! renditions place that square in the middle of a larger transparent canvas.

use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage};
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{Options, Tree};

use crate::error::{Error, Result};
use crate::geometry::{RectPx, SizePx};

// ============================================================================
// Rendering
// ============================================================================

/// Renders markup onto a transparent `size` x `size` image.
///
/// The drawing is scaled uniformly so its larger dimension spans `size`, then
/// centered along the other axis.
pub fn render_square(svg_data: &str, size: u32) -> Result<RgbaImage> {
    let tree = Tree::from_str(svg_data, &Options::default())
        .map_err(|e| Error::MalformedMarkup(format!("failed to parse SVG: {e}")))?;

    let mut pixmap = Pixmap::new(size, size)
        .ok_or_else(|| Error::Raster(format!("cannot allocate a {size}x{size} pixmap")))?;

    let svg_size = tree.size();
    let scale = (size as f32 / svg_size.width()).min(size as f32 / svg_size.height());
    let dx = (size as f32 - svg_size.width() * scale) / 2.0;
    let dy = (size as f32 - svg_size.height() * scale) / 2.0;
    let transform = Transform::from_row(scale, 0.0, 0.0, scale, dx, dy);
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    Ok(pixmap_to_rgba_image(&pixmap))
}

/// Renders markup as an `icon_size` square centered on a transparent
/// `width` x `height` canvas.
///
/// The icon is expected to fit; anything hanging over the canvas edge is
/// clipped.
pub fn render_wide(svg_data: &str, icon_size: u32, width: u32, height: u32) -> Result<RgbaImage> {
    if width == 0 || height == 0 {
        return Err(Error::Raster(format!("invalid canvas size {width}x{height}")));
    }

    let icon = render_square(svg_data, icon_size)?;
    let placement = RectPx::centered(SizePx::square(icon_size), SizePx::new(width, height));

    let mut canvas = RgbaImage::new(width, height);
    composite_over(&mut canvas, &icon, placement.x as i32, placement.y as i32);
    Ok(canvas)
}

/// Encodes an image as PNG.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| Error::Raster(format!("PNG encoding failed: {e}")))?;
    Ok(bytes)
}

/// Converts a tiny_skia Pixmap to an image::RgbaImage.
fn pixmap_to_rgba_image(pixmap: &Pixmap) -> RgbaImage {
    RgbaImage::from_fn(pixmap.width(), pixmap.height(), |x, y| {
        match pixmap.pixel(x, y) {
            // tiny_skia uses premultiplied alpha, we need to unpremultiply
            Some(pixel) => {
                let (r, g, b, a) =
                    unpremultiply(pixel.red(), pixel.green(), pixel.blue(), pixel.alpha());
                Rgba([r, g, b, a])
            }
            None => Rgba([0, 0, 0, 0]),
        }
    })
}

/// Unpremultiplies a premultiplied alpha pixel.
fn unpremultiply(r: u8, g: u8, b: u8, a: u8) -> (u8, u8, u8, u8) {
    if a == 0 {
        (0, 0, 0, 0)
    } else {
        let a_f = a as f32 / 255.0;
        (
            (r as f32 / a_f).round().min(255.0) as u8,
            (g as f32 / a_f).round().min(255.0) as u8,
            (b as f32 / a_f).round().min(255.0) as u8,
            a,
        )
    }
}

// ============================================================================
// Compositing
// ============================================================================

/// Composites a source image onto a destination image at the specified position.
///
/// Uses standard alpha blending (source over destination).
pub fn composite_over(dest: &mut RgbaImage, src: &RgbaImage, x: i32, y: i32) {
    let dest_width = dest.width() as i32;
    let dest_height = dest.height() as i32;

    for sy in 0..src.height() {
        for sx in 0..src.width() {
            let dx = x + sx as i32;
            let dy = y + sy as i32;

            if dx < 0 || dy < 0 || dx >= dest_width || dy >= dest_height {
                continue;
            }

            let src_pixel = src.get_pixel(sx, sy);
            let dst_pixel = dest.get_pixel(dx as u32, dy as u32);
            let blended = alpha_blend(*src_pixel, *dst_pixel);
            dest.put_pixel(dx as u32, dy as u32, blended);
        }
    }
}

/// Alpha blends two RGBA pixels (source over destination).
fn alpha_blend(src: Rgba<u8>, dst: Rgba<u8>) -> Rgba<u8> {
    let sa = src[3] as f32 / 255.0;
    let da = dst[3] as f32 / 255.0;

    let out_a = sa + da * (1.0 - sa);

    if out_a == 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let blend = |s: u8, d: u8| -> u8 {
        let sf = s as f32 / 255.0;
        let df = d as f32 / 255.0;
        let out = (sf * sa + df * da * (1.0 - sa)) / out_a;
        (out * 255.0).round() as u8
    };

    Rgba([
        blend(src[0], dst[0]),
        blend(src[1], dst[1]),
        blend(src[2], dst[2]),
        (out_a * 255.0).round() as u8,
    ])
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const CIRCLE_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100"><circle cx="50" cy="50" r="40" fill="#ff0000"/></svg>"##;

    const TALL_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="50" height="100"><rect width="50" height="100" fill="#0000ff"/></svg>"##;

    fn is_clear(img: &RgbaImage, x: u32, y: u32) -> bool {
        img.get_pixel(x, y)[3] == 0
    }

    #[test]
    fn square_has_requested_size_and_clear_corners() {
        let img = render_square(CIRCLE_SVG, 50).unwrap();
        assert_eq!(img.dimensions(), (50, 50));
        for (x, y) in [(0, 0), (49, 0), (0, 49), (49, 49)] {
            assert!(is_clear(&img, x, y), "corner ({x}, {y}) should be transparent");
        }
        let center = img.get_pixel(25, 25);
        assert_eq!(center[3], 255);
        assert!(center[0] > 200);
    }

    #[test]
    fn square_letterboxes_non_square_content() {
        let img = render_square(TALL_SVG, 40).unwrap();
        assert_eq!(img.dimensions(), (40, 40));
        // 50x100 scaled to 20x40 and centered: columns 10..30 are filled.
        assert!(is_clear(&img, 5, 20));
        assert!(is_clear(&img, 34, 20));
        assert_eq!(img.get_pixel(20, 20).0, [0, 0, 255, 255]);
    }

    #[test]
    fn wide_centers_icon_on_canvas() {
        let img = render_wide(TALL_SVG, 160, 320, 180).unwrap();
        assert_eq!(img.dimensions(), (320, 180));
        // Icon square spans x 80..240, y 10..170; content spans x 120..200.
        assert!(is_clear(&img, 0, 0));
        assert!(is_clear(&img, 100, 90));
        assert!(is_clear(&img, 160, 5));
        assert_eq!(img.get_pixel(160, 90).0, [0, 0, 255, 255]);
        assert_eq!(img.get_pixel(160, 11).0, [0, 0, 255, 255]);
    }

    #[test]
    fn unparseable_markup_is_malformed() {
        let err = render_square("<svg", 10).unwrap_err();
        assert!(matches!(err, Error::MalformedMarkup(_)));
    }

    #[test]
    fn zero_canvas_is_a_raster_error() {
        let err = render_wide(CIRCLE_SVG, 10, 0, 10).unwrap_err();
        assert!(matches!(err, Error::Raster(_)));
    }

    #[test]
    fn png_round_trips_dimensions() {
        let img = render_square(CIRCLE_SVG, 12).unwrap();
        let png = encode_png(&img).unwrap();
        assert_eq!(&png[1..4], b"PNG");
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (12, 12));
    }

    #[test]
    fn composite_simple() {
        let mut dest = RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255]));
        let src = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 255, 255]));

        composite_over(&mut dest, &src, 3, 3);

        assert_eq!(dest.get_pixel(5, 5).0, [0, 0, 255, 255]);
        assert_eq!(dest.get_pixel(0, 0).0, [255, 0, 0, 255]);
    }

    #[test]
    fn composite_onto_transparent_keeps_source() {
        let mut dest = RgbaImage::new(4, 4);
        let src = RgbaImage::from_pixel(2, 2, Rgba([10, 20, 30, 128]));

        composite_over(&mut dest, &src, 1, 1);

        assert_eq!(dest.get_pixel(1, 1).0, [10, 20, 30, 128]);
        assert_eq!(dest.get_pixel(0, 0).0, [0, 0, 0, 0]);
    }

    #[test]
    fn composite_clips_out_of_bounds() {
        let mut dest = RgbaImage::new(4, 4);
        let src = RgbaImage::from_pixel(4, 4, Rgba([0, 255, 0, 255]));

        composite_over(&mut dest, &src, 2, -2);

        assert_eq!(dest.get_pixel(3, 1).0, [0, 255, 0, 255]);
        assert_eq!(dest.get_pixel(1, 1).0, [0, 0, 0, 0]);
        assert_eq!(dest.get_pixel(3, 2).0, [0, 0, 0, 0]);
    }
}
