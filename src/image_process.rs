use image::{ imageops, imageops::FilterType, DynamicImage, GrayImage, Luma };
use imageproc::contours::find_contours;
use imageproc::distance_transform::Norm;
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::edges::canny;
use imageproc::geometric_transformations::{ warp_into, Interpolation };
use imageproc::map::map_colors;
use imageproc::morphology::{ dilate, erode };
use imageproc::rect::Rect;

use crate::config::DetectorConfig;
use crate::error::{ LprError, LprErrorKind };
use crate::geometry::{ build_rectify_transform, OrientedBox };

/// Gray-scale copy of the source, refusing images without pixels.
pub fn to_gray(img: &DynamicImage) -> Result<GrayImage, LprError> {
    if img.width() == 0 || img.height() == 0 {
        return Err(LprErrorKind::EmptyInput.into());
    }
    Ok(img.to_luma8())
}

/// Binary edge map (255 on edges) that the contour tree is traced from.
pub fn edge_map(gray: &GrayImage, low: f32, high: f32) -> GrayImage {
    canny(gray, low, high)
}

/// Warps a rotated plate region onto an upright raster of bounded size.
#[derive(Debug, Clone)]
pub struct PlateRectifier {
    envelope: (u32, u32),
    margin: u32,
}

impl Default for PlateRectifier {
    fn default() -> Self {
        Self::new(&DetectorConfig::default())
    }
}

impl PlateRectifier {

    pub fn new(config: &DetectorConfig) -> Self {
        Self { envelope: (config.envelope_width, config.envelope_height), margin: config.edge_margin }
    }

    /// Upright copy of `region` at its own size, `round(width) x round(height)`.
    pub fn warp_upright(&self, gray: &GrayImage, region: &OrientedBox) -> Result<GrayImage, LprError> {
        let (w, h) = (region.width.round(), region.height.round());
        if !(w >= 1.0 && h >= 1.0) {
            return Err(LprError::degenerate(format!("plate region {}x{}", region.width, region.height)));
        }
        let transform = build_rectify_transform(region.vertices(), region.width, region.height)?;
        let projection = transform.to_projection()?;
        let mut upright = GrayImage::new(w as u32, h as u32);
        warp_into(gray, &projection, Interpolation::Bilinear, Luma([0u8]), &mut upright);
        Ok(upright)
    }

    /// Size the plate takes after uniform scaling into the envelope.
    pub fn scaled_size(&self, region: &OrientedBox) -> (u32, u32) {
        let (ew, eh) = (self.envelope.0 as f32, self.envelope.1 as f32);
        let scale = (ew / region.width).min(eh / region.height);
        let w = (region.width * scale).round().clamp(0.0, ew);
        let h = (region.height * scale).round().clamp(0.0, eh);
        (w as u32, h as u32)
    }

    /// Drops the warp border, `margin` pixels on every side.
    pub fn crop_margin(&self, plate: &GrayImage) -> Result<GrayImage, LprError> {
        let (w, h) = plate.dimensions();
        let m = self.margin;
        if w <= 2 * m || h <= 2 * m {
            return Err(LprError::degenerate(format!("{}x{} plate is smaller than its margins", w, h)));
        }
        Ok(imageops::crop_imm(plate, m, m, w - 2 * m, h - 2 * m).to_image())
    }

    pub fn rectify(&self, gray: &GrayImage, region: &OrientedBox) -> Result<GrayImage, LprError> {
        let upright = self.warp_upright(gray, region)?;
        let (w, h) = self.scaled_size(region);
        if w == 0 || h == 0 {
            return Err(LprError::degenerate(format!("plate region {}x{} vanishes when scaled", region.width, region.height)));
        }
        let scaled = imageops::resize(&upright, w, h, FilterType::CatmullRom);
        self.crop_margin(&scaled)
    }
}

/// Turns a rectified plate into white characters on black, without the frame.
#[derive(Debug, Clone)]
pub struct CharacterMaskFilter {
    threshold: u8,
    canny_low: f32,
    canny_high: f32,
}

impl Default for CharacterMaskFilter {
    fn default() -> Self {
        Self::new(&DetectorConfig::default())
    }
}

impl CharacterMaskFilter {

    pub fn new(config: &DetectorConfig) -> Self {
        Self { threshold: config.plate_threshold, canny_low: config.canny_low, canny_high: config.canny_high }
    }

    /// Dark ink becomes 255, paper becomes 0.
    pub fn threshold(&self, plate: &GrayImage) -> GrayImage {
        let t = self.threshold;
        map_colors(plate, |p: Luma<u8>| -> Luma<u8> { if p[0] > t { Luma([0]) } else { Luma([255]) } })
    }

    /// White canvas with black boxes over every outermost edge contour taller than
    /// half the plate.
    pub fn border_mask(&self, plate: &GrayImage) -> GrayImage {
        Self::mask_from_edges(&canny(plate, self.canny_low, self.canny_high))
    }

    /// Same as [`border_mask`](Self::border_mask) for an edge map that is already traced.
    pub fn mask_from_edges(edges: &GrayImage) -> GrayImage {
        let (width, height) = edges.dimensions();
        let mut mask = GrayImage::from_pixel(width, height, Luma([255]));

        for contour in find_contours::<i32>(edges).iter().filter(|c| c.parent.is_none()) {
            let (min_x, max_x, min_y, max_y) = contour.points.iter().fold(
                (i32::MAX, i32::MIN, i32::MAX, i32::MIN),
                |acc, p| (acc.0.min(p.x), acc.1.max(p.x), acc.2.min(p.y), acc.3.max(p.y)),
            );
            if min_x > max_x || max_y - min_y + 1 <= (height >> 1) as i32 {
                continue;
            }
            let left = (min_x - 1).max(0);
            let top = (min_y - 1).max(0);
            let right = (max_x + 1).min(width as i32 - 1);
            let bottom = (max_y + 1).min(height as i32 - 1);
            let rect = Rect::at(left, top).of_size((right - left + 1) as u32, (bottom - top + 1) as u32);
            draw_filled_rect_mut(&mut mask, rect, Luma([0]));
        }
        mask
    }

    /// Clears `binary` wherever `mask` is black.
    pub fn apply_mask(binary: &mut GrayImage, mask: &GrayImage) {
        binary.pixels_mut().zip(mask.pixels()).filter(|(_, m)| m[0] == 0).for_each(|(p, _)| p[0] = 0);
    }

    /// One 3x3 erosion followed by one 3x3 dilation.
    pub fn despeckle(binary: &GrayImage) -> GrayImage {
        dilate(&erode(binary, Norm::LInf, 1), Norm::LInf, 1)
    }

    /// Mask then despeckle an already thresholded plate.
    pub fn refine(&self, binary: &GrayImage, mask: &GrayImage) -> GrayImage {
        let mut masked = binary.clone();
        Self::apply_mask(&mut masked, mask);
        Self::despeckle(&masked)
    }

    pub fn filter(&self, plate: &GrayImage) -> GrayImage {
        let binary = self.threshold(plate);
        let mask = self.border_mask(plate);
        self.refine(&binary, &mask)
    }
}
