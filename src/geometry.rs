use imageproc::geometric_transformations::Projection;
use imageproc::geometry::convex_hull;
use imageproc::point::Point;

use crate::error::LprError;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point2f {
    pub x: f32,
    pub y: f32,
}

impl Point2f {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Minimum-area rectangle with a rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientedBox {
    pub center: Point2f,
    pub width: f32,
    pub height: f32,
    /// Degrees; positive turns the width axis clockwise on screen (y grows down).
    pub angle: f32,
}

impl OrientedBox {

    pub fn new(center: Point2f, width: f32, height: f32, angle: f32) -> Self {
        Self { center, width, height, angle }
    }

    /// Corners in the order bottom-left, top-left, top-right, bottom-right.
    pub fn vertices(&self) -> [Point2f; 4] {
        let (sin, cos) = self.angle.to_radians().sin_cos();
        let (hw, hh) = (self.width / 2.0, self.height / 2.0);
        let Point2f { x: cx, y: cy } = self.center;
        // u runs along the width, v along the height (towards the bottom edge)
        let corner = |su: f32, sv: f32| {
            Point2f::new(cx + su * hw * cos - sv * hh * sin, cy + su * hw * sin + sv * hh * cos)
        };
        [corner(-1.0, 1.0), corner(-1.0, -1.0), corner(1.0, -1.0), corner(1.0, 1.0)]
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }
}

/// Folds the angle into (-45, 45], swapping width and height when turning by a quarter.
pub fn normalize_box(mut b: OrientedBox) -> OrientedBox {
    if b.angle <= -45.0 {
        std::mem::swap(&mut b.width, &mut b.height);
        b.angle += 90.0;
    } else if b.angle > 45.0 {
        std::mem::swap(&mut b.width, &mut b.height);
        b.angle -= 90.0;
    }
    b
}

pub fn aspect_ratio(b: &OrientedBox) -> f64 {
    b.width as f64 / b.height as f64
}

/// Signed shoelace area of a closed polygon, returned as an absolute value.
pub fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: i64 = points.iter().zip(points.iter().cycle().skip(1)).map(|(a, b)| {
        a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64
    }).sum();
    (twice as f64 / 2.0).abs()
}

/// Minimum-area enclosing rectangle of a point set (rotating calipers over the hull).
///
/// The returned angle lies in (-90, 90]; run it through [`normalize_box`] before
/// reading width and height as the horizontal and vertical extents.
pub fn min_area_rect(points: &[Point<i32>]) -> OrientedBox {
    let empty = OrientedBox::new(Point2f::default(), 0.0, 0.0, 0.0);
    let first = match points.first() {
        Some(p) => p,
        None => return empty,
    };
    let hull = if points.len() < 3 { points.to_vec() } else { convex_hull(points) };
    if hull.len() < 3 {
        let (min_x, max_x, min_y, max_y) = points.iter().fold(
            (first.x, first.x, first.y, first.y),
            |acc, p| (acc.0.min(p.x), acc.1.max(p.x), acc.2.min(p.y), acc.3.max(p.y)),
        );
        let center = Point2f::new((min_x + max_x) as f32 / 2.0, (min_y + max_y) as f32 / 2.0);
        return OrientedBox::new(center, (max_x - min_x) as f32, (max_y - min_y) as f32, 0.0);
    }

    let hull: Vec<(f64, f64)> = hull.iter().map(|p| (p.x as f64, p.y as f64)).collect();
    let mut best: Option<(f64, OrientedBox)> = None;
    for i in 0..hull.len() {
        let (x0, y0) = hull[i];
        let (x1, y1) = hull[(i + 1) % hull.len()];
        let theta = (y1 - y0).atan2(x1 - x0);
        let (sin, cos) = theta.sin_cos();

        let (mut min_u, mut max_u, mut min_v, mut max_v) = (f64::MAX, f64::MIN, f64::MAX, f64::MIN);
        for &(x, y) in &hull {
            let u = x * cos + y * sin;
            let v = -x * sin + y * cos;
            min_u = min_u.min(u);
            max_u = max_u.max(u);
            min_v = min_v.min(v);
            max_v = max_v.max(v);
        }
        let area = (max_u - min_u) * (max_v - min_v);
        if best.as_ref().map_or(true, |(a, _)| area < *a) {
            let (cu, cv) = ((min_u + max_u) / 2.0, (min_v + max_v) / 2.0);
            let center = Point2f::new((cu * cos - cv * sin) as f32, (cu * sin + cv * cos) as f32);
            let mut angle = theta.to_degrees();
            if angle > 90.0 {
                angle -= 180.0;
            } else if angle <= -90.0 {
                angle += 180.0;
            }
            let rect = OrientedBox::new(center, (max_u - min_u) as f32, (max_v - min_v) as f32, angle as f32);
            best = Some((area, rect));
        }
    }
    best.map(|(_, rect)| rect).unwrap_or(empty)
}

/// Row-major 2x3 affine matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform(pub [f32; 6]);

impl AffineTransform {

    /// Exact affine map sending the three `src` points onto the three `dst` points.
    pub fn from_triangles(src: [Point2f; 3], dst: [Point2f; 3]) -> Result<Self, LprError> {
        let [p0, p1, p2] = src;
        let (x0, y0, x1, y1, x2, y2) = (p0.x as f64, p0.y as f64, p1.x as f64, p1.y as f64, p2.x as f64, p2.y as f64);
        let det = x0 * (y1 - y2) - y0 * (x1 - x2) + (x1 * y2 - x2 * y1);
        if det.abs() < 1e-6 {
            return Err(LprError::degenerate("source vertices are collinear"));
        }
        // Cramer's rule on [x y 1] * (a b c)^T = target, once per output axis
        let solve = |t0: f64, t1: f64, t2: f64| {
            let a = (t0 * (y1 - y2) - y0 * (t1 - t2) + (t1 * y2 - t2 * y1)) / det;
            let b = (x0 * (t1 - t2) - t0 * (x1 - x2) + (x1 * t2 - x2 * t1)) / det;
            let c = (x0 * (y1 * t2 - y2 * t1) - y0 * (x1 * t2 - x2 * t1) + t0 * (x1 * y2 - x2 * y1)) / det;
            (a as f32, b as f32, c as f32)
        };
        let (a, b, c) = solve(dst[0].x as f64, dst[1].x as f64, dst[2].x as f64);
        let (d, e, f) = solve(dst[0].y as f64, dst[1].y as f64, dst[2].y as f64);
        Ok(Self([a, b, c, d, e, f]))
    }

    pub fn apply(&self, p: Point2f) -> Point2f {
        let [a, b, c, d, e, f] = self.0;
        Point2f::new(a * p.x + b * p.y + c, d * p.x + e * p.y + f)
    }

    pub fn to_projection(&self) -> Result<Projection, LprError> {
        let [a, b, c, d, e, f] = self.0;
        Projection::from_matrix([a, b, c, d, e, f, 0.0, 0.0, 1.0])
            .ok_or_else(|| LprError::degenerate("affine transform is not invertible"))
    }
}

/// Maps the box corners (bottom-left, top-left, top-right, bottom-right) onto the
/// corners of an upright `dst_width` x `dst_height` rectangle.
pub fn build_rectify_transform(src: [Point2f; 4], dst_width: f32, dst_height: f32) -> Result<AffineTransform, LprError> {
    if !(dst_width > 0.0 && dst_height > 0.0) {
        return Err(LprError::degenerate(format!("target size {}x{}", dst_width, dst_height)));
    }
    let dst = [
        Point2f::new(0.0, dst_height - 1.0),
        Point2f::new(0.0, 0.0),
        Point2f::new(dst_width - 1.0, 0.0),
    ];
    AffineTransform::from_triangles([src[0], src[1], src[2]], dst)
}
