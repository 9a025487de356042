use tracing::debug;

use crate::config::DetectorConfig;
use crate::geometry::{ aspect_ratio, normalize_box, OrientedBox };

/// Read-only view of a contour hierarchy the selector can walk.
///
/// Ids index a flat arena; `None` ends a sibling chain or marks a leaf.
pub trait ContourSource {
    fn first_root(&self) -> Option<usize>;
    fn first_child(&self, id: usize) -> Option<usize>;
    fn next_sibling(&self, id: usize) -> Option<usize>;
    /// Enclosed area in square pixels.
    fn area(&self, id: usize) -> f64;
    /// Raw minimum-area rectangle, before angle normalization.
    fn min_area_rect(&self, id: usize) -> OrientedBox;

    fn child_count(&self, id: usize) -> usize {
        std::iter::successors(self.first_child(id), |c| self.next_sibling(*c)).count()
    }
}

/// A contour accepted as a plate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub id: usize,
    pub area: f64,
    pub children: usize,
    pub region: OrientedBox,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlateSelector {
    min_area: f64,
    min_children: usize,
    min_ratio: f64,
    max_ratio: f64,
}

impl Default for PlateSelector {
    fn default() -> Self {
        Self::new(&DetectorConfig::default())
    }
}

impl PlateSelector {

    pub fn new(config: &DetectorConfig) -> Self {
        Self {
            min_area: config.min_area,
            min_children: config.min_children,
            min_ratio: config.min_ratio,
            max_ratio: config.max_ratio,
        }
    }

    /// Width/height ratio test, exclusive at both ends.
    pub fn ratio_accepted(&self, ratio: f64) -> bool {
        self.min_ratio < ratio && ratio < self.max_ratio
    }

    /// All candidates in visiting order.
    pub fn select<S: ContourSource + ?Sized>(&self, source: &S) -> Vec<Candidate> {
        let mut found = Vec::new();
        self.select_with(source, |candidate| found.push(candidate));
        found
    }

    /// Depth-first walk from the outermost sibling chain. `on_plate` runs for each
    /// candidate as soon as it is accepted, before the walk moves on.
    pub fn select_with<S, F>(&self, source: &S, mut on_plate: F)
    where S: ContourSource + ?Sized, F: FnMut(Candidate)
    {
        self.walk(source, source.first_root(), &mut on_plate);
    }

    fn walk<S, F>(&self, source: &S, start: Option<usize>, on_plate: &mut F)
    where S: ContourSource + ?Sized, F: FnMut(Candidate)
    {
        let mut next = start;
        while let Some(id) = next {
            next = source.next_sibling(id);

            let children = source.child_count(id);
            if children == 0 {
                continue;
            }
            let area = source.area(id);
            if area <= self.min_area {
                debug!(id, area, "contour too small");
                continue;
            }
            if children < self.min_children {
                debug!(id, children, "too few children, searching inside");
                self.walk(source, source.first_child(id), on_plate);
                continue;
            }

            let region = normalize_box(source.min_area_rect(id));
            let ratio = aspect_ratio(&region);
            if !self.ratio_accepted(ratio) {
                match source.first_child(id) {
                    Some(child) => {
                        debug!(id, ratio, "not plate shaped, searching inside");
                        self.walk(source, Some(child), on_plate);
                    }
                    None => debug!(id, ratio, "not plate shaped"),
                }
                continue;
            }

            debug!(id, area, children, ratio, "plate candidate");
            on_plate(Candidate { id, area, children, region });
        }
    }
}
