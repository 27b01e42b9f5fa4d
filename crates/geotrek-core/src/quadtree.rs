//! Quadtree envelope index for candidate lookup in intersection queries
//!
//! Each feature envelope is stored at the deepest node that fully contains it.
//! Envelopes that fit no child (or fall outside the indexed extent) stay at the root,
//! so lookups never miss an entry.

use crate::{FeatureId, FeatureKind};
use geo::{Coord, Rect};
use std::collections::HashMap;

/// Maximum depth of the quadtree to prevent infinite recursion
const MAX_DEPTH: u32 = 16;

/// Number of entries a leaf holds before it is subdivided
const MAX_ENTRIES_PER_LEAF: usize = 8;

#[derive(Debug, Clone, Copy)]
struct Entry {
    id: FeatureId,
    kind: FeatureKind,
    envelope: Rect<f64>,
}

/// Root container for the envelope index
#[derive(Debug, Clone)]
pub struct Quadtree {
    root: QuadtreeNode,
    /// Current envelope of every indexed feature
    envelopes: HashMap<FeatureId, Rect<f64>>,
}

/// A single node in the quadtree
#[derive(Debug, Clone)]
struct QuadtreeNode {
    /// Bounding box in storage units
    bounding_box: Rect<f64>,
    /// Depth level in the tree (0 = root)
    level: u32,
    entries: Vec<Entry>,
    /// Child nodes (NW, NE, SW, SE) if subdivided
    children: Option<Box<[QuadtreeNode; 4]>>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl Quadtree {
    /// Create an empty index covering `bounds`
    pub fn new(bounds: Rect<f64>) -> Self {
        Self {
            root: QuadtreeNode::new(bounds, 0),
            envelopes: HashMap::new(),
        }
    }

    /// Index a feature envelope, replacing any previous one for the same id
    pub fn insert(&mut self, id: FeatureId, kind: FeatureKind, envelope: Rect<f64>) {
        self.remove(id);
        self.root.insert(Entry { id, kind, envelope });
        self.envelopes.insert(id, envelope);
    }

    /// Drop a feature from the index; returns whether it was indexed
    pub fn remove(&mut self, id: FeatureId) -> bool {
        match self.envelopes.remove(&id) {
            Some(envelope) => {
                self.root.remove(id, envelope);
                true
            }
            None => false,
        }
    }

    /// Ids whose envelope intersects `area`, optionally restricted to one kind
    ///
    /// The result is sorted by id so callers get a stable order.
    pub fn query(&self, kind: Option<FeatureKind>, area: Rect<f64>) -> Vec<FeatureId> {
        let mut results = Vec::new();
        self.root.query(kind, area, &mut results);
        results.sort_unstable();
        results
    }

    pub fn envelope(&self, id: FeatureId) -> Option<Rect<f64>> {
        self.envelopes.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.envelopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.envelopes.is_empty()
    }
}

impl QuadtreeNode {
    fn new(bounding_box: Rect<f64>, level: u32) -> Self {
        Self {
            bounding_box,
            level,
            entries: Vec::new(),
            children: None,
        }
    }

    fn subdivide(&mut self) {
        if self.children.is_some() {
            return; // Already subdivided
        }

        let min = self.bounding_box.min();
        let max = self.bounding_box.max();
        let mid_x = (min.x + max.x) / 2.0;
        let mid_y = (min.y + max.y) / 2.0;
        let child_level = self.level + 1;

        // Create 4 children: NW, NE, SW, SE
        let nw = QuadtreeNode::new(
            Rect::new(Coord { x: min.x, y: mid_y }, Coord { x: mid_x, y: max.y }),
            child_level,
        );
        let ne = QuadtreeNode::new(
            Rect::new(Coord { x: mid_x, y: mid_y }, Coord { x: max.x, y: max.y }),
            child_level,
        );
        let sw = QuadtreeNode::new(
            Rect::new(Coord { x: min.x, y: min.y }, Coord { x: mid_x, y: mid_y }),
            child_level,
        );
        let se = QuadtreeNode::new(
            Rect::new(Coord { x: mid_x, y: min.y }, Coord { x: max.x, y: mid_y }),
            child_level,
        );

        self.children = Some(Box::new([nw, ne, sw, se]));

        // Push down whatever now fits a child
        let entries = std::mem::take(&mut self.entries);
        for entry in entries {
            self.insert(entry);
        }
    }

    fn insert(&mut self, entry: Entry) {
        if let Some(children) = &mut self.children {
            if let Some(child) = children
                .iter_mut()
                .find(|child| contains(child.bounding_box, entry.envelope))
            {
                child.insert(entry);
                return;
            }
            self.entries.push(entry);
            return;
        }

        self.entries.push(entry);
        if self.entries.len() > MAX_ENTRIES_PER_LEAF && self.level < MAX_DEPTH {
            self.subdivide();
        }
    }

    fn remove(&mut self, id: FeatureId, envelope: Rect<f64>) -> bool {
        if let Some(position) = self.entries.iter().position(|entry| entry.id == id) {
            self.entries.swap_remove(position);
            return true;
        }
        match &mut self.children {
            Some(children) => children
                .iter_mut()
                .filter(|child| contains(child.bounding_box, envelope))
                .any(|child| child.remove(id, envelope)),
            None => false,
        }
    }

    fn query(&self, kind: Option<FeatureKind>, area: Rect<f64>, results: &mut Vec<FeatureId>) {
        // The root also holds out-of-extent entries, so it is never culled
        if self.level > 0 && !intersects(self.bounding_box, area) {
            return;
        }

        for entry in &self.entries {
            if kind.is_none_or(|kind| kind == entry.kind) && intersects(entry.envelope, area) {
                results.push(entry.id);
            }
        }

        if let Some(children) = &self.children {
            for child in children.iter() {
                child.query(kind, area, results);
            }
        }
    }
}

/// Whether `outer` fully contains `inner`
#[inline]
fn contains(outer: Rect<f64>, inner: Rect<f64>) -> bool {
    let (omin, omax) = (outer.min(), outer.max());
    let (imin, imax) = (inner.min(), inner.max());
    imin.x >= omin.x && imin.y >= omin.y && imax.x <= omax.x && imax.y <= omax.y
}

/// Closed rectangle intersection (touching edges count)
#[inline]
fn intersects(a: Rect<f64>, b: Rect<f64>) -> bool {
    let (amin, amax) = (a.min(), a.max());
    let (bmin, bmax) = (b.min(), b.max());
    !(amax.x < bmin.x || amin.x > bmax.x || amax.y < bmin.y || amin.y > bmax.y)
}
