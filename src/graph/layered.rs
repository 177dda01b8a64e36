use std::collections::{BTreeMap, BTreeSet};

use tracing::trace;

use super::vertex::{Vertex, VertexId};

/// A mutable directed graph that maintains, per vertex, a layer index with
/// the invariant `layer(child) > layer(parent)` for every ranking edge
/// child→parent. Layer 0 is the most-ancestral band; ranks grow toward the
/// leaves.
///
/// Edges that would close a directed cycle are kept in the adjacency but
/// demoted to back edges, which the ranking ignores; when a later removal
/// breaks the cycle the back edge is promoted to a ranking edge again.
#[derive(Debug, Default)]
pub struct LayeredGraph {
    vertices: BTreeMap<VertexId, Vertex>,
    parents_of: BTreeMap<VertexId, BTreeSet<VertexId>>,
    children_of: BTreeMap<VertexId, BTreeSet<VertexId>>,
    back_edges: BTreeSet<(VertexId, VertexId)>,
    layer_of: BTreeMap<VertexId, usize>,
    next_vertex: u32,
}

impl LayeredGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_vertex(&mut self, vertex: Vertex) -> VertexId {
        let id = VertexId(self.next_vertex);
        self.next_vertex += 1;
        self.vertices.insert(id, vertex);
        self.parents_of.insert(id, BTreeSet::new());
        self.children_of.insert(id, BTreeSet::new());
        self.layer_of.insert(id, 0);
        id
    }

    /// Removes `id`. The caller must have detached every incident edge
    /// first; a vertex removed while still wired up would leave dangling
    /// adjacency, so that is a defect, not a recoverable condition.
    pub fn remove_vertex(&mut self, id: VertexId) -> Vertex {
        assert!(
            self.parents_of.get(&id).is_some_and(BTreeSet::is_empty)
                && self.children_of.get(&id).is_some_and(BTreeSet::is_empty),
            "vertex removed while edges are still attached"
        );
        self.parents_of.remove(&id);
        self.children_of.remove(&id);
        self.layer_of.remove(&id);
        self.vertices
            .remove(&id)
            .unwrap_or_else(|| panic!("vertex {id:?} not present"))
    }

    /// Adds the edge "source's parent is target" and re-ranks `source` and
    /// its descendants. Returns every vertex whose layer index changed.
    pub fn add_edge(&mut self, source: VertexId, target: VertexId) -> BTreeSet<VertexId> {
        assert!(self.vertices.contains_key(&source), "unknown edge source");
        assert!(self.vertices.contains_key(&target), "unknown edge target");
        assert!(
            !self.parents_of[&source].contains(&target),
            "edge {source:?}->{target:?} already present"
        );
        if source == target || self.is_ancestor_of(source, target) {
            trace!(?source, ?target, "edge closes a cycle, demoting to back edge");
            self.back_edges.insert((source, target));
        }
        self.parents_of.get_mut(&source).unwrap().insert(target);
        self.children_of.get_mut(&target).unwrap().insert(source);
        let changed = self.recompute_from(source);
        self.check_invariant();
        changed
    }

    /// Removes the edge and re-ranks `source` and its descendants down to
    /// the minimum rank the remaining parents permit. Returns every vertex
    /// whose layer index changed.
    pub fn remove_edge(&mut self, source: VertexId, target: VertexId) -> BTreeSet<VertexId> {
        let removed = self
            .parents_of
            .get_mut(&source)
            .is_some_and(|parents| parents.remove(&target));
        assert!(removed, "edge {source:?}->{target:?} not present");
        self.children_of.get_mut(&target).unwrap().remove(&source);
        self.back_edges.remove(&(source, target));
        let mut changed = self.recompute_from(source);
        changed.extend(self.promote_back_edges());
        self.check_invariant();
        changed
    }

    pub fn contains(&self, id: VertexId) -> bool {
        self.vertices.contains_key(&id)
    }

    pub fn has_edge(&self, source: VertexId, target: VertexId) -> bool {
        self.parents_of
            .get(&source)
            .is_some_and(|parents| parents.contains(&target))
    }

    pub fn vertex(&self, id: VertexId) -> &Vertex {
        &self.vertices[&id]
    }

    pub fn vertex_mut(&mut self, id: VertexId) -> &mut Vertex {
        self.vertices.get_mut(&id).unwrap()
    }

    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.vertices.keys().copied()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn layer_index(&self, id: VertexId) -> usize {
        self.layer_of[&id]
    }

    /// Pins the layer of an edge-less dummy vertex. Dummy layers are
    /// dictated by the path chain they bridge, not by ranking.
    pub(crate) fn set_dummy_layer(&mut self, id: VertexId, layer: usize) {
        assert!(
            self.vertices[&id].is_dummy() && !self.has_edges(id),
            "only detached dummy vertices may have their layer pinned"
        );
        self.layer_of.insert(id, layer);
    }

    pub fn parents(&self, id: VertexId) -> impl Iterator<Item = VertexId> + '_ {
        self.parents_of[&id].iter().copied()
    }

    pub fn children(&self, id: VertexId) -> impl Iterator<Item = VertexId> + '_ {
        self.children_of[&id].iter().copied()
    }

    pub fn has_children(&self, id: VertexId) -> bool {
        !self.children_of[&id].is_empty()
    }

    pub fn has_edges(&self, id: VertexId) -> bool {
        !self.parents_of[&id].is_empty() || !self.children_of[&id].is_empty()
    }

    /// Vertices sharing at least one parent with `id`, excluding `id`.
    pub fn siblings(&self, id: VertexId) -> BTreeSet<VertexId> {
        let mut result = BTreeSet::new();
        for parent in &self.parents_of[&id] {
            result.extend(self.children_of[parent].iter().copied());
        }
        result.remove(&id);
        result
    }

    /// Everything reachable from `id` by repeatedly following child edges.
    pub fn descendants(&self, id: VertexId) -> BTreeSet<VertexId> {
        let mut result = BTreeSet::new();
        let mut work = vec![id];
        while let Some(v) = work.pop() {
            for &child in &self.children_of[&v] {
                if result.insert(child) {
                    work.push(child);
                }
            }
        }
        result
    }

    /// True when `ancestor` is reachable from `id` along ranking parent
    /// edges. Used to detect cycle-closing edges before they are added.
    fn is_ancestor_of(&self, ancestor: VertexId, id: VertexId) -> bool {
        let mut seen = BTreeSet::new();
        let mut work = vec![id];
        while let Some(v) = work.pop() {
            if v == ancestor {
                return true;
            }
            for &p in &self.parents_of[&v] {
                if !self.back_edges.contains(&(v, p)) && seen.insert(p) {
                    work.push(p);
                }
            }
        }
        false
    }

    /// Rank from current parents: 1 + max(parent layers), 0 with none.
    fn rank_from_parents(&self, id: VertexId) -> usize {
        self.parents_of[&id]
            .iter()
            .filter(|&&p| !self.back_edges.contains(&(id, p)))
            .map(|&p| self.layer_of[&p] + 1)
            .max()
            .unwrap_or(0)
    }

    /// Re-ranks `start` and, transitively, every descendant whose rank is
    /// affected. The worklist is a BTreeSet so the visit order (and hence
    /// the whole layout) is deterministic.
    fn recompute_from(&mut self, start: VertexId) -> BTreeSet<VertexId> {
        let mut changed = BTreeSet::new();
        let mut work = BTreeSet::from([start]);
        while let Some(&v) = work.iter().next() {
            work.remove(&v);
            let new_layer = self.rank_from_parents(v);
            if new_layer != self.layer_of[&v] {
                self.layer_of.insert(v, new_layer);
                changed.insert(v);
                for &child in &self.children_of[&v] {
                    if !self.back_edges.contains(&(child, v)) {
                        work.insert(child);
                    }
                }
            }
        }
        if !changed.is_empty() {
            trace!(count = changed.len(), "re-ranked vertices");
        }
        changed
    }

    /// After a removal, a back edge may no longer close a cycle; promote
    /// any such edge to a ranking edge and re-rank below it.
    fn promote_back_edges(&mut self) -> BTreeSet<VertexId> {
        let mut changed = BTreeSet::new();
        loop {
            let promoted = self
                .back_edges
                .iter()
                .copied()
                .find(|&(s, t)| s != t && !self.is_ancestor_of(s, t));
            match promoted {
                Some(edge) => {
                    self.back_edges.remove(&edge);
                    changed.extend(self.recompute_from(edge.0));
                }
                None => break,
            }
        }
        changed
    }

    /// The layering invariant is global and cheap to verify for diagram-
    /// sized graphs, so it is checked after every mutation. A violation is
    /// a defect in this module, never recoverable.
    fn check_invariant(&self) {
        for (&child, parents) in &self.parents_of {
            for &parent in parents {
                if self.back_edges.contains(&(child, parent)) {
                    continue;
                }
                assert!(
                    self.layer_of[&child] > self.layer_of[&parent],
                    "layering invariant broken: {child:?} (layer {}) -> {parent:?} (layer {})",
                    self.layer_of[&child],
                    self.layer_of[&parent],
                );
            }
        }
    }
}
