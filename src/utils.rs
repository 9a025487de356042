use ab_glyph::{ FontVec, PxScale };
use image::{ imageops, GrayImage, Luma, Rgb, RgbImage };
use imageproc::drawing::{ draw_line_segment_mut, draw_text_mut };

use std::fs;
use std::path::Path;

use crate::error::LprError;
use crate::geometry::OrientedBox;

pub const BOX_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
pub const BOX_THICKNESS: i32 = 5;

/// Outlines a plate region as a closed 4-edge polygon, `thickness` pixels wide.
pub fn draw_region_mut(canvas: &mut RgbImage, region: &OrientedBox, color: Rgb<u8>, thickness: i32) {
    let v = region.vertices();
    let half = thickness / 2;
    for i in 0..v.len() {
        let (a, b) = (v[i], v[(i + 1) % v.len()]);
        for dx in -half..=thickness - 1 - half {
            for dy in -half..=thickness - 1 - half {
                let (ox, oy) = (dx as f32, dy as f32);
                draw_line_segment_mut(canvas, (a.x + ox, a.y + oy), (b.x + ox, b.y + oy), color);
            }
        }
    }
}

/// Rectified plate above its filtered version, both centered on a black strip.
pub fn plate_strip(plate: &GrayImage, filtered: &GrayImage) -> GrayImage {
    let width = plate.width().max(filtered.width());
    let mut strip = GrayImage::from_pixel(width, plate.height() + filtered.height(), Luma([0]));
    imageops::replace(&mut strip, plate, ((width - plate.width()) / 2) as i64, 0);
    imageops::replace(&mut strip, filtered, ((width - filtered.width()) / 2) as i64, plate.height() as i64);
    strip
}

pub fn load_font(path: impl AsRef<Path>) -> Result<FontVec, LprError> {
    let data = fs::read(path)?;
    Ok(FontVec::try_from_vec(data)?)
}

/// Writes `text` just above the region's top-left corner.
pub fn draw_label_mut(canvas: &mut RgbImage, region: &OrientedBox, text: &str, font: &FontVec, color: Rgb<u8>) {
    let scale = PxScale::from(24.0);
    let [_, top_left, _, _] = region.vertices();
    let x = top_left.x.round() as i32;
    let y = (top_left.y - 30.0).max(0.0).round() as i32;
    draw_text_mut(canvas, color, x, y, scale, font, text);
}
