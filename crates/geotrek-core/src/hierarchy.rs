//! Ordered parent/child relations between features
//!
//! [`Hierarchy`] holds the ordered itinerary links between treks (a feature may belong
//! to several parents). [`SiteTree`] is the single-parent outdoor site tree, rebuilt on
//! demand from each site's parent link.

use crate::{CoreError, FeatureId, Result};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One ordered link from a parent to a child
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OrderedChild {
    pub parent: FeatureId,
    pub child: FeatureId,
    pub order: i64,
}

/// Ordered children per parent, acyclic by construction
#[derive(Debug, Clone, Default)]
pub struct Hierarchy {
    /// parent -> child -> order
    children: BTreeMap<FeatureId, BTreeMap<FeatureId, i64>>,
    /// child -> parents
    parents: BTreeMap<FeatureId, BTreeSet<FeatureId>>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl Hierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `child` under `parent` at `order`
    ///
    /// Re-adding an existing pair updates its order. Fails with `CyclicHierarchy` when
    /// `child` is `parent` itself or one of its ancestors.
    pub fn add_child(&mut self, parent: FeatureId, child: FeatureId, order: i64) -> Result<()> {
        if self.is_ancestor_or_self(child, parent)? {
            return Err(CoreError::CyclicHierarchy { parent, child });
        }
        self.children.entry(parent).or_default().insert(child, order);
        self.parents.entry(child).or_default().insert(parent);
        Ok(())
    }

    /// Detach `child` from `parent`; returns whether the link existed
    pub fn remove_child(&mut self, parent: FeatureId, child: FeatureId) -> bool {
        let removed = self
            .children
            .get_mut(&parent)
            .is_some_and(|children| children.remove(&child).is_some());
        if removed {
            if self.children.get(&parent).is_some_and(BTreeMap::is_empty) {
                self.children.remove(&parent);
            }
            if let Some(parents) = self.parents.get_mut(&child) {
                parents.remove(&parent);
                if parents.is_empty() {
                    self.parents.remove(&child);
                }
            }
        }
        removed
    }

    /// Children ordered by `order`, ties broken by child id
    pub fn children_of(&self, parent: FeatureId) -> Vec<FeatureId> {
        self.links_of(parent).into_iter().map(|link| link.child).collect()
    }

    /// Ordered links under `parent`
    pub fn links_of(&self, parent: FeatureId) -> Vec<OrderedChild> {
        let mut links: Vec<OrderedChild> = self
            .children
            .get(&parent)
            .map(|children| {
                children
                    .iter()
                    .map(|(&child, &order)| OrderedChild {
                        parent,
                        child,
                        order,
                    })
                    .collect()
            })
            .unwrap_or_default();
        links.sort_by_key(|link| (link.order, link.child));
        links
    }

    /// Parent ids, ascending
    pub fn parents_of(&self, child: FeatureId) -> Vec<FeatureId> {
        self.parents
            .get(&child)
            .map(|parents| parents.iter().copied().collect())
            .unwrap_or_default()
    }

    /// For each parent, the sibling right before `feature`
    pub fn previous_sibling(&self, feature: FeatureId) -> BTreeMap<FeatureId, Option<FeatureId>> {
        self.siblings(feature, |position, _| position.checked_sub(1))
    }

    /// For each parent, the sibling right after `feature`
    pub fn next_sibling(&self, feature: FeatureId) -> BTreeMap<FeatureId, Option<FeatureId>> {
        self.siblings(feature, |position, len| {
            (position + 1 < len).then_some(position + 1)
        })
    }

    fn siblings(
        &self,
        feature: FeatureId,
        pick: impl Fn(usize, usize) -> Option<usize>,
    ) -> BTreeMap<FeatureId, Option<FeatureId>> {
        self.parents_of(feature)
            .into_iter()
            .map(|parent| {
                let children = self.children_of(parent);
                let sibling = children
                    .iter()
                    .position(|&child| child == feature)
                    .and_then(|position| pick(position, children.len()))
                    .map(|index| children[index]);
                (parent, sibling)
            })
            .collect()
    }

    /// Number of ids taking part in at least one link
    fn node_count(&self) -> usize {
        let mut nodes: HashSet<FeatureId> = self.children.keys().copied().collect();
        nodes.extend(self.parents.keys().copied());
        nodes.len()
    }

    /// Whether `candidate` is `feature` or one of its ancestors
    ///
    /// The walk is bounded by the number of known ids; exceeding it means the stored
    /// links already contain a cycle.
    fn is_ancestor_or_self(&self, candidate: FeatureId, feature: FeatureId) -> Result<bool> {
        if candidate == feature {
            return Ok(true);
        }
        let bound = self.node_count() + 1;
        let mut visited = HashSet::new();
        let mut stack = vec![feature];
        let mut steps = 0;
        while let Some(current) = stack.pop() {
            steps += 1;
            if steps > bound {
                return Err(CoreError::CyclicHierarchy {
                    parent: feature,
                    child: candidate,
                });
            }
            for parent in self.parents_of(current) {
                if parent == candidate {
                    return Ok(true);
                }
                if visited.insert(parent) {
                    stack.push(parent);
                }
            }
        }
        Ok(false)
    }
}

fn mark_reached(nodes: &[SiteNode], start: usize, reached: &mut [bool]) {
    let mut stack = vec![start];
    while let Some(slot) = stack.pop() {
        if !std::mem::replace(&mut reached[slot], true) {
            stack.extend(nodes[slot].children.iter().copied());
        }
    }
}

#[derive(Debug, Clone)]
struct SiteNode {
    id: FeatureId,
    name: String,
    parent: Option<usize>,
    children: Vec<usize>,
}

/// Outdoor site tree stored as an arena with a parent-id index
#[derive(Debug, Clone, Default)]
pub struct SiteTree {
    nodes: Vec<SiteNode>,
    index: HashMap<FeatureId, usize>,
    roots: Vec<usize>,
}

impl SiteTree {
    /// Build the tree from `(id, parent, name)` triples
    ///
    /// A parent that is not part of the input makes the site a root. Siblings are
    /// ordered by name, then id.
    pub fn build<I>(sites: I) -> Self
    where
        I: IntoIterator<Item = (FeatureId, Option<FeatureId>, String)>,
    {
        let mut nodes = Vec::new();
        let mut index = HashMap::new();
        let mut parents = Vec::new();
        for (id, parent, name) in sites {
            index.insert(id, nodes.len());
            nodes.push(SiteNode {
                id,
                name,
                parent: None,
                children: Vec::new(),
            });
            parents.push(parent);
        }

        let mut roots = Vec::new();
        for (slot, parent) in parents.into_iter().enumerate() {
            match parent.and_then(|parent| index.get(&parent).copied()) {
                Some(parent_slot) if parent_slot != slot => {
                    nodes[slot].parent = Some(parent_slot);
                    nodes[parent_slot].children.push(slot);
                }
                _ => roots.push(slot),
            }
        }

        // Sites caught in a parent loop are unreachable from the roots; cut each loop
        // so that every site is still traversed
        let mut reached = vec![false; nodes.len()];
        for &root in &roots {
            mark_reached(&nodes, root, &mut reached);
        }
        for slot in 0..nodes.len() {
            if reached[slot] {
                continue;
            }
            if let Some(parent) = nodes[slot].parent.take() {
                nodes[parent].children.retain(|&child| child != slot);
                tracing::warn!(
                    "Site {} is part of a parent loop, detached from {}",
                    nodes[slot].id,
                    nodes[parent].id
                );
            }
            roots.push(slot);
            mark_reached(&nodes, slot, &mut reached);
        }

        let mut tree = Self {
            nodes,
            index,
            roots,
        };
        let sort_key = |nodes: &[SiteNode], slot: usize| (nodes[slot].name.clone(), nodes[slot].id);
        let mut roots = std::mem::take(&mut tree.roots);
        roots.sort_by_key(|&slot| sort_key(&tree.nodes, slot));
        tree.roots = roots;
        for slot in 0..tree.nodes.len() {
            let mut children = std::mem::take(&mut tree.nodes[slot].children);
            children.sort_by_key(|&child| sort_key(&tree.nodes, child));
            tree.nodes[slot].children = children;
        }
        tree
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: FeatureId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn roots(&self) -> Vec<FeatureId> {
        self.roots.iter().map(|&slot| self.nodes[slot].id).collect()
    }

    /// Direct children, ordered by name then id
    pub fn children(&self, id: FeatureId) -> Vec<FeatureId> {
        self.index
            .get(&id)
            .map(|&slot| {
                self.nodes[slot]
                    .children
                    .iter()
                    .map(|&child| self.nodes[child].id)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn parent(&self, id: FeatureId) -> Option<FeatureId> {
        let slot = *self.index.get(&id)?;
        self.nodes[slot].parent.map(|parent| self.nodes[parent].id)
    }

    /// Ancestors from the direct parent up to the root
    pub fn ancestors(&self, id: FeatureId) -> Vec<FeatureId> {
        let mut ancestors = Vec::new();
        let mut current = self.index.get(&id).and_then(|&slot| self.nodes[slot].parent);
        while let Some(slot) = current {
            if ancestors.len() >= self.nodes.len() {
                break;
            }
            ancestors.push(self.nodes[slot].id);
            current = self.nodes[slot].parent;
        }
        ancestors
    }

    /// Descendants in pre-order, excluding `id` itself
    pub fn descendants(&self, id: FeatureId) -> Vec<FeatureId> {
        let mut out = Vec::new();
        if let Some(&slot) = self.index.get(&id) {
            for &child in self.nodes[slot].children.iter() {
                self.walk(child, 1, &mut |node: &SiteNode, _: usize| out.push(node.id));
            }
        }
        out
    }

    /// Whole tree in pre-order with depths (roots at depth 0)
    pub fn traverse(&self) -> Vec<(FeatureId, usize)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        for &root in &self.roots {
            self.walk(root, 0, &mut |node: &SiteNode, depth: usize| {
                out.push((node.id, depth))
            });
        }
        out
    }

    fn walk<F: FnMut(&SiteNode, usize)>(&self, slot: usize, depth: usize, visit: &mut F) {
        if depth > self.nodes.len() {
            return;
        }
        let node = &self.nodes[slot];
        visit(node, depth);
        for &child in &node.children {
            self.walk(child, depth + 1, visit);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_hierarchy() -> Hierarchy {
        // Itinerary 1 walks 10, 11, 12; itinerary 2 walks 12, 10
        let mut hierarchy = Hierarchy::new();
        hierarchy.add_child(1, 10, 0).unwrap();
        hierarchy.add_child(1, 11, 1).unwrap();
        hierarchy.add_child(1, 12, 2).unwrap();
        hierarchy.add_child(2, 12, 0).unwrap();
        hierarchy.add_child(2, 10, 5).unwrap();
        hierarchy
    }

    #[test]
    fn test_children_ordering() {
        let hierarchy = create_test_hierarchy();
        assert_eq!(hierarchy.children_of(1), vec![10, 11, 12]);
        assert_eq!(hierarchy.children_of(2), vec![12, 10]);
        assert!(hierarchy.children_of(99).is_empty());
    }

    #[test]
    fn test_order_ties_broken_by_id() {
        let mut hierarchy = Hierarchy::new();
        hierarchy.add_child(1, 30, 0).unwrap();
        hierarchy.add_child(1, 20, 0).unwrap();
        assert_eq!(hierarchy.children_of(1), vec![20, 30]);
    }

    #[test]
    fn test_insert_between_keeps_relative_order() {
        let mut hierarchy = Hierarchy::new();
        hierarchy.add_child(1, 10, 0).unwrap();
        hierarchy.add_child(1, 11, 10).unwrap();
        hierarchy.add_child(1, 12, 20).unwrap();

        hierarchy.add_child(1, 13, 15).unwrap();
        assert_eq!(hierarchy.children_of(1), vec![10, 11, 13, 12]);
    }

    #[test]
    fn test_readding_updates_order() {
        let mut hierarchy = create_test_hierarchy();
        hierarchy.add_child(1, 10, 9).unwrap();
        assert_eq!(hierarchy.children_of(1), vec![11, 12, 10]);
        assert_eq!(hierarchy.parents_of(10), vec![1, 2]);
    }

    #[test]
    fn test_parents_of() {
        let hierarchy = create_test_hierarchy();
        assert_eq!(hierarchy.parents_of(12), vec![1, 2]);
        assert_eq!(hierarchy.parents_of(11), vec![1]);
        assert!(hierarchy.parents_of(1).is_empty());
    }

    #[test]
    fn test_previous_and_next_per_parent() {
        let hierarchy = create_test_hierarchy();

        let previous = hierarchy.previous_sibling(12);
        assert_eq!(previous, BTreeMap::from([(1, Some(11)), (2, None)]));

        let next = hierarchy.next_sibling(12);
        assert_eq!(next, BTreeMap::from([(1, None), (2, Some(10))]));

        // No parents at all yields an empty map
        assert!(hierarchy.next_sibling(1).is_empty());
    }

    #[test]
    fn test_cycles_are_rejected() {
        let mut hierarchy = create_test_hierarchy();
        assert!(matches!(
            hierarchy.add_child(5, 5, 0),
            Err(CoreError::CyclicHierarchy {
                parent: 5,
                child: 5
            })
        ));

        hierarchy.add_child(10, 100, 0).unwrap();
        assert!(matches!(
            hierarchy.add_child(100, 1, 0),
            Err(CoreError::CyclicHierarchy { .. })
        ));
        // Failed writes leave no trace
        assert!(hierarchy.children_of(100).is_empty());
    }

    #[test]
    fn test_remove_child() {
        let mut hierarchy = create_test_hierarchy();
        assert!(hierarchy.remove_child(1, 11));
        assert!(!hierarchy.remove_child(1, 11));
        assert_eq!(hierarchy.children_of(1), vec![10, 12]);
        assert!(hierarchy.parents_of(11).is_empty());
    }

    fn create_test_site_tree() -> SiteTree {
        SiteTree::build(vec![
            (1, None, "Massif".to_string()),
            (2, Some(1), "Secteur Nord".to_string()),
            (3, Some(1), "Falaise".to_string()),
            (4, Some(2), "Voie".to_string()),
            (5, Some(99), "Orphelin".to_string()),
        ])
    }

    #[test]
    fn test_site_tree_traversal() {
        let tree = create_test_site_tree();
        assert_eq!(tree.len(), 5);
        assert_eq!(tree.roots(), vec![1, 5]);
        assert_eq!(tree.children(1), vec![3, 2]);
        assert_eq!(
            tree.traverse(),
            vec![(1, 0), (3, 1), (2, 1), (4, 2), (5, 0)]
        );
    }

    #[test]
    fn test_site_tree_relations() {
        let tree = create_test_site_tree();
        assert_eq!(tree.ancestors(4), vec![2, 1]);
        assert_eq!(tree.descendants(1), vec![3, 2, 4]);
        assert_eq!(tree.parent(4), Some(2));
        assert_eq!(tree.parent(5), None);
        assert!(tree.descendants(4).is_empty());
    }

    #[test]
    fn test_site_tree_cuts_parent_loops() {
        let tree = SiteTree::build(vec![
            (1, Some(2), "Cirque".to_string()),
            (2, Some(1), "Aiguille".to_string()),
            (3, Some(2), "Voie".to_string()),
            (4, None, "Massif".to_string()),
        ]);
        let traversed: Vec<FeatureId> = tree.traverse().into_iter().map(|(id, _)| id).collect();
        assert_eq!(traversed.len(), 4);
        assert_eq!(tree.roots(), vec![1, 4]);
        assert_eq!(tree.traverse(), vec![(1, 0), (2, 1), (3, 2), (4, 0)]);
    }
}
