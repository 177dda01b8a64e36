pub(crate) mod compare;
mod location;

use std::collections::BTreeMap;

use tracing::trace;

use crate::graph::proper::{ProperLayoutGraph, TopologyChange};
use crate::graph::vertex::{ConnectorId, PathId, Vertex, VertexId};

use compare::ordering_key;
use location::target_location;

/// The single source of truth for *relative* order: which layer each
/// vertex is in and where it stands among its layer mates. Owns the
/// quasi-proper graph; owns no absolute coordinates.
#[derive(Debug, Default)]
pub struct RelativeLayout {
    graph: ProperLayoutGraph,
    layers: Vec<Vec<VertexId>>,
    /// Layer each placed vertex currently lives in. Indexes within a layer
    /// shift on every insert/remove, so only the layer is recorded.
    placed: BTreeMap<VertexId, usize>,
}

impl RelativeLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn graph(&self) -> &ProperLayoutGraph {
        &self.graph
    }

    pub fn layers(&self) -> &[Vec<VertexId>] {
        &self.layers
    }

    pub fn location(&self, vertex: VertexId) -> Option<(usize, usize)> {
        let layer = *self.placed.get(&vertex)?;
        let index = self.layers[layer].iter().position(|&v| v == vertex)?;
        Some((layer, index))
    }

    pub fn add_vertex(&mut self, vertex: Vertex) -> VertexId {
        let id = self.graph.add_vertex(vertex);
        self.place(id);
        id
    }

    pub fn remove_vertex(&mut self, id: VertexId) -> Vertex {
        self.unplace(id);
        self.graph.remove_vertex(id)
    }

    pub fn resize_vertex(&mut self, id: VertexId, size: crate::geometry::Size) {
        self.graph.vertex_mut(id).size = size;
    }

    pub fn add_path(&mut self, connector: ConnectorId, source: VertexId, target: VertexId) -> PathId {
        let (id, change) = self.graph.add_path(connector, source, target);
        self.reconcile(change);
        id
    }

    pub fn remove_path(&mut self, id: PathId) {
        let (_, change) = self.graph.remove_path(id);
        self.reconcile(change);
    }

    /// Applies a topology change to the layer sequences: removed dummies
    /// drop out, relocated vertices are re-placed into their new layer.
    /// Vertices whose layer did not move are left alone, which is what
    /// keeps unrelated subtrees stable across mutations.
    fn reconcile(&mut self, change: TopologyChange) {
        for dummy in &change.removed {
            self.unplace(*dummy);
        }
        let mut relocated: Vec<VertexId> = change
            .relocated
            .into_iter()
            .filter(|&v| self.graph.graph().contains(v))
            .collect();
        // Deterministic re-placement order: by new layer, then comparer.
        relocated.sort_by_key(|&v| (self.graph.graph().layer_index(v), ordering_key(&self.graph, v)));
        for v in relocated {
            let current = self.placed.get(&v).copied();
            let wanted = self.graph.graph().layer_index(v);
            if current == Some(wanted) {
                continue;
            }
            trace!(?v, from = ?current, to = wanted, "re-placing vertex");
            self.unplace(v);
            self.place(v);
        }
    }

    fn place(&mut self, vertex: VertexId) {
        let (layer, index) = target_location(&self.graph, &self.layers, vertex);
        while self.layers.len() <= layer {
            self.layers.push(Vec::new());
        }
        self.layers[layer].insert(index, vertex);
        self.placed.insert(vertex, layer);
    }

    fn unplace(&mut self, vertex: VertexId) {
        if let Some(layer) = self.placed.remove(&vertex) {
            self.layers[layer].retain(|&v| v != vertex);
            while self.layers.last().is_some_and(Vec::is_empty) {
                self.layers.pop();
            }
        }
    }
}
