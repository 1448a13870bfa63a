//! R-tree of organism bounding boxes for overlap queries

use ahash::HashMap;
use biomorph_organism::{OrganismId, Rect};
use rstar::{Envelope, RTree, RTreeObject, SelectionFunction, AABB};

/// Bounding box of one organism as stored in the tree
#[derive(Debug, Clone, Copy, PartialEq)]
struct Footprint {
    id: OrganismId,
    min: [f64; 2],
    max: [f64; 2],
}

impl Footprint {
    fn new(id: OrganismId, rect: &Rect) -> Self {
        Self {
            id,
            min: [rect.min.x, rect.min.y],
            max: [rect.max.x, rect.max.y],
        }
    }
}

impl RTreeObject for Footprint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.min, self.max)
    }
}

/// Selects footprints whose box overlaps an area (edges included)
struct Overlapping(AABB<[f64; 2]>);

impl SelectionFunction<Footprint> for Overlapping {
    fn should_unpack_parent(&self, envelope: &AABB<[f64; 2]>) -> bool {
        envelope.intersects(&self.0)
    }

    fn should_unpack_leaf(&self, leaf: &Footprint) -> bool {
        leaf.envelope().intersects(&self.0)
    }
}

/// Spatial index answering "who overlaps this box"
#[derive(Default)]
pub struct OccupancyIndex {
    tree: RTree<Footprint>,
    footprints: HashMap<OrganismId, Footprint>,
}

impl OccupancyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or move an organism's box
    pub fn update(&mut self, id: OrganismId, rect: &Rect) {
        let footprint = Footprint::new(id, rect);
        if let Some(previous) = self.footprints.insert(id, footprint) {
            if previous == footprint {
                return;
            }
            self.tree.remove(&previous);
        }
        self.tree.insert(footprint);
    }

    pub fn remove(&mut self, id: OrganismId) {
        if let Some(footprint) = self.footprints.remove(&id) {
            self.tree.remove(&footprint);
        }
    }

    /// Ids overlapping `area`, sorted, without `exclude`
    pub fn query(&self, area: &Rect, exclude: Option<OrganismId>) -> Vec<OrganismId> {
        let selection = Overlapping(AABB::from_corners(
            [area.min.x, area.min.y],
            [area.max.x, area.max.y],
        ));
        let mut ids: Vec<OrganismId> = self
            .tree
            .locate_with_selection_function(selection)
            .map(|footprint| footprint.id)
            .filter(|&id| Some(id) != exclude)
            .collect();
        ids.sort_unstable();
        ids
    }

    pub fn contains(&self, id: OrganismId) -> bool {
        self.footprints.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.footprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.footprints.is_empty()
    }
}
