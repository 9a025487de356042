use image::{ DynamicImage, GrayImage, Luma };
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

use lpr_contour::geometry::{ OrientedBox, Point2f };
use lpr_contour::{ ContourSource, Lpr, LprError, LprErrorKind, PlateSelector, TextRecognizer };

/// Hierarchy given by parent links, with areas and rectangles chosen by the test.
#[derive(Default)]
struct Hierarchy {
    nodes: Vec<(Option<usize>, f64, OrientedBox)>,
}

impl Hierarchy {
    fn add(&mut self, parent: Option<usize>, area: f64, width: f32, height: f32) -> usize {
        let region = OrientedBox::new(Point2f::new(200.0, 100.0), width, height, 0.0);
        self.nodes.push((parent, area, region));
        self.nodes.len() - 1
    }

    fn add_leaves(&mut self, parent: usize, n: usize) {
        for _ in 0..n {
            self.add(Some(parent), 20.0, 4.0, 4.0);
        }
    }

    fn first_with_parent(&self, parent: Option<usize>, after: usize) -> Option<usize> {
        (after..self.nodes.len()).find(|i| self.nodes[*i].0 == parent)
    }
}

impl ContourSource for Hierarchy {
    fn first_root(&self) -> Option<usize> {
        self.first_with_parent(None, 0)
    }

    fn first_child(&self, id: usize) -> Option<usize> {
        self.first_with_parent(Some(id), id + 1)
    }

    fn next_sibling(&self, id: usize) -> Option<usize> {
        self.first_with_parent(self.nodes[id].0, id + 1)
    }

    fn area(&self, id: usize) -> f64 {
        self.nodes[id].1
    }

    fn min_area_rect(&self, id: usize) -> OrientedBox {
        self.nodes[id].2
    }
}

#[derive(Default)]
struct Counting {
    calls: usize,
    loaded: Option<(u32, u32)>,
}

impl TextRecognizer for Counting {
    fn set_image(&mut self, image: &GrayImage) -> Result<(), LprError> {
        self.loaded = Some(image.dimensions());
        Ok(())
    }

    fn recognize(&mut self) -> Result<(), LprError> {
        self.calls += 1;
        self.loaded.map(|_| ()).ok_or_else(|| LprErrorKind::NoImage.into())
    }

    fn text(&mut self) -> Result<String, LprError> {
        Ok("A777AA".to_string())
    }
}

fn plate_scene() -> GrayImage {
    let mut gray = GrayImage::from_pixel(400, 200, Luma([210u8]));
    for x in &[110, 150, 190, 230, 270] {
        draw_filled_rect_mut(&mut gray, Rect::at(*x, 85).of_size(18, 30), Luma([30u8]));
    }
    gray
}

#[test]
fn plate_with_four_characters_is_read_once() {
    let mut h = Hierarchy::default();
    let plate = h.add(None, 1000.0, 250.0, 50.0);
    h.add_leaves(plate, 4);

    let mut lpr = Lpr::new(Counting::default());
    let plates = lpr.detect_in_tree(&h, &plate_scene());

    assert_eq!(plates.len(), 1);
    let found = &plates[0];
    assert_eq!(found.region.width / found.region.height, 5.0);
    assert_eq!(found.text, "A777AA");
    let (w, h) = found.plate.dimensions();
    assert!(w <= 240 && h <= 180);
    // 250x50 scales to 240x48, minus the cropped edge margin
    assert_eq!((w, h), (234, 42));
    assert!(found.filtered.pixels().all(|p| p[0] == 0 || p[0] == 255));
    assert_eq!(lpr.ocr().calls, 1);
    assert_eq!(lpr.ocr().loaded, Some((234, 42)));
}

#[test]
fn small_contour_is_never_recognized() {
    let mut h = Hierarchy::default();
    let plate = h.add(None, 300.0, 250.0, 50.0);
    h.add_leaves(plate, 4);

    assert!(PlateSelector::default().select(&h).is_empty());
    let mut lpr = Lpr::new(Counting::default());
    assert!(lpr.detect_in_tree(&h, &plate_scene()).is_empty());
    assert_eq!(lpr.ocr().calls, 0);
}

#[test]
fn plate_is_found_at_the_grandchild() {
    let mut h = Hierarchy::default();
    let root = h.add(None, 5000.0, 300.0, 150.0);
    let frame = h.add(Some(root), 3000.0, 280.0, 120.0);
    h.add(Some(root), 100.0, 10.0, 10.0);
    let plate = h.add(Some(frame), 1000.0, 250.0, 50.0);
    h.add_leaves(plate, 4);

    let candidates = PlateSelector::default().select(&h);
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].id, plate);
    assert_eq!(candidates[0].children, 4);
}

#[test]
fn empty_hierarchy_yields_nothing() {
    let h = Hierarchy::default();
    let mut lpr = Lpr::new(Counting::default());
    assert!(lpr.detect_in_tree(&h, &plate_scene()).is_empty());
    assert_eq!(lpr.ocr().calls, 0);
}

/// Light 240x50 plate with five short dark glyphs, turned by `angle` degrees around
/// (200, 130) on a dark background. Edges are anti-aliased by 4x4 supersampling.
fn rendered_plate(angle: f32) -> GrayImage {
    let (sin, cos) = angle.to_radians().sin_cos();
    let shade = |x: f32, y: f32| -> f32 {
        let (dx, dy) = (x - 200.0, y - 130.0);
        let (u, v) = (dx * cos + dy * sin, -dx * sin + dy * cos);
        if u.abs() >= 120.0 || v.abs() >= 25.0 {
            return 40.0;
        }
        let on_glyph = [-80.0f32, -40.0, 0.0, 40.0, 80.0].iter().any(|gx| (u - gx).abs() < 6.0 && v.abs() < 9.0);
        if on_glyph { 30.0 } else { 220.0 }
    };
    GrayImage::from_fn(400, 260, |x, y| {
        let mut sum = 0.0;
        for i in 0..4 {
            for j in 0..4 {
                sum += shade(x as f32 + (i as f32 + 0.5) / 4.0, y as f32 + (j as f32 + 0.5) / 4.0);
            }
        }
        Luma([(sum / 16.0).round() as u8])
    })
}

fn assert_plate_found(angle: f32) -> Result<(), LprError> {
    let img = DynamicImage::ImageLuma8(rendered_plate(angle));
    let mut lpr = Lpr::new(Counting::default());
    let plates = lpr.detect_license_plates(&img)?;

    assert_eq!(plates.len(), 1, "angle {}", angle);
    let found = &plates[0];
    assert!((found.region.angle - angle).abs() < 1.0, "angle {} detected as {}", angle, found.region.angle);
    assert!((found.region.center.x - 200.0).abs() < 3.0 && (found.region.center.y - 130.0).abs() < 3.0);
    assert!(found.region.width / found.region.height > 3.0);
    let (w, h) = found.plate.dimensions();
    assert!(w <= 240 && h <= 180);
    let ink = found.filtered.pixels().filter(|p| p[0] == 255).count();
    assert!(ink > 0, "angle {}: filtered plate is empty", angle);
    assert_eq!(lpr.ocr().calls, 1);
    Ok(())
}

#[test]
fn upright_plate_is_found_from_pixels() -> Result<(), LprError> {
    assert_plate_found(0.0)
}

#[test]
fn skewed_plates_are_found_and_straightened() -> Result<(), LprError> {
    for angle in &[20.0, -20.0, 12.0] {
        assert_plate_found(*angle)?;
    }
    Ok(())
}
