use image::GrayImage;
use imageproc::contours::{ find_contours, BorderType };
use imageproc::point::Point;

use crate::geometry::{ self, OrientedBox };
use crate::selector::ContourSource;

/// One closed boundary traced from the edge map.
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    pub points: Vec<Point<i32>>,
    /// Hole borders separate a foreground region from a background hole inside it.
    pub is_hole: bool,
}

/// Links of one contour; `None` plays the role of the "no such contour" sentinel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HierarchyEntry {
    pub next_sibling: Option<usize>,
    pub first_child: Option<usize>,
    pub parent: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct ContourTree {
    contours: Vec<Contour>,
    hierarchy: Vec<HierarchyEntry>,
    first_root: Option<usize>,
}

impl ContourTree {

    /// Traces all contours of a binary edge map (non-zero pixels are foreground).
    pub fn from_edge_map(edges: &GrayImage) -> Self {
        let (contours, parents): (Vec<Contour>, Vec<Option<usize>>) = find_contours::<i32>(edges).into_iter().map(|c| {
            let contour = Contour { points: c.points, is_hole: matches!(c.border_type, BorderType::Hole) };
            (contour, c.parent)
        }).unzip();
        Self::from_parents(contours, parents)
    }

    /// Builds the tree from contours listed in discovery order and the index of
    /// each one's parent. Children keep the relative order of `contours`.
    pub fn from_parents(contours: Vec<Contour>, parents: Vec<Option<usize>>) -> Self {
        debug_assert_eq!(contours.len(), parents.len());
        let mut hierarchy = vec![HierarchyEntry::default(); contours.len()];
        let mut last_child: Vec<Option<usize>> = vec![None; contours.len()];
        let mut first_root = None;
        let mut last_root: Option<usize> = None;

        for (id, parent) in parents.into_iter().enumerate() {
            // a parent that does not precede its child would break the forest
            let parent = parent.filter(|p| *p < id);
            hierarchy[id].parent = parent;
            let previous = match parent {
                Some(p) => last_child[p].replace(id),
                None => last_root.replace(id),
            };
            match (previous, parent) {
                (Some(prev), _) => hierarchy[prev].next_sibling = Some(id),
                (None, Some(p)) => hierarchy[p].first_child = Some(id),
                (None, None) => first_root = Some(id),
            }
        }
        Self { contours, hierarchy, first_root }
    }

    pub fn len(&self) -> usize {
        self.contours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }

    pub fn contour(&self, id: usize) -> &Contour {
        &self.contours[id]
    }

    pub fn entry(&self, id: usize) -> HierarchyEntry {
        self.hierarchy[id]
    }

    /// First contour of the outermost sibling chain.
    pub fn first_root(&self) -> Option<usize> {
        self.first_root
    }

    /// Walks a sibling chain starting at `first`.
    pub fn siblings(&self, first: Option<usize>) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors(first, move |id| self.hierarchy[*id].next_sibling)
    }

    pub fn children(&self, id: usize) -> impl Iterator<Item = usize> + '_ {
        self.siblings(self.hierarchy[id].first_child)
    }

    /// Contours without a parent.
    pub fn roots(&self) -> impl Iterator<Item = usize> + '_ {
        self.siblings(self.first_root)
    }
}

impl ContourSource for ContourTree {

    fn first_root(&self) -> Option<usize> {
        self.first_root
    }

    fn first_child(&self, id: usize) -> Option<usize> {
        self.hierarchy[id].first_child
    }

    fn next_sibling(&self, id: usize) -> Option<usize> {
        self.hierarchy[id].next_sibling
    }

    fn area(&self, id: usize) -> f64 {
        geometry::polygon_area(&self.contours[id].points)
    }

    fn min_area_rect(&self, id: usize) -> OrientedBox {
        geometry::min_area_rect(&self.contours[id].points)
    }
}


#[cfg(test)]
mod test {

    use image::{ GrayImage, Luma };
    use imageproc::drawing::draw_hollow_rect_mut;
    use imageproc::rect::Rect;

    use super::{ Contour, ContourTree };

    fn dummy(n: usize) -> Vec<Contour> {
        (0..n).map(|_| Contour { points: Vec::new(), is_hole: false }).collect()
    }

    #[test]
    fn links_follow_parent_list() {
        //   0        4
        //  / \
        // 1   3
        // |
        // 2
        let tree = ContourTree::from_parents(dummy(5), vec![None, Some(0), Some(1), Some(0), None]);
        assert_eq!(tree.roots().collect::<Vec<_>>(), vec![0, 4]);
        assert_eq!(tree.children(0).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(tree.children(1).collect::<Vec<_>>(), vec![2]);
        assert_eq!(tree.children(2).count(), 0);
        assert_eq!(tree.entry(3).next_sibling, None);
        assert_eq!(tree.entry(2).parent, Some(1));
    }

    #[test]
    fn empty_edge_map_has_no_contours() {
        let tree = ContourTree::from_edge_map(&GrayImage::new(32, 32));
        assert!(tree.is_empty());
        assert_eq!(tree.first_root(), None);
        assert_eq!(tree.roots().count(), 0);
    }

    #[test]
    fn nested_outlines_become_nested_contours() {
        let mut edges = GrayImage::new(120, 60);
        draw_hollow_rect_mut(&mut edges, Rect::at(10, 10).of_size(100, 40), Luma([255u8]));
        draw_hollow_rect_mut(&mut edges, Rect::at(30, 20).of_size(10, 20), Luma([255u8]));
        draw_hollow_rect_mut(&mut edges, Rect::at(60, 20).of_size(10, 20), Luma([255u8]));
        let tree = ContourTree::from_edge_map(&edges);

        let roots: Vec<usize> = tree.roots().collect();
        assert_eq!(roots.len(), 1);
        let frame = roots[0];
        assert!(!tree.contour(frame).is_hole);

        // the frame's hole border holds both inner outlines
        let holes: Vec<usize> = tree.children(frame).collect();
        assert_eq!(holes.len(), 1);
        assert!(tree.contour(holes[0]).is_hole);
        assert_eq!(tree.children(holes[0]).count(), 2);
    }
}
